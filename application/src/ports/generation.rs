//! Generation gateway port
//!
//! Defines the interface for the external text-generation capability.

use async_trait::async_trait;
use panel_domain::{ErrorCategory, ErrorClassifier};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors that can occur during generation
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Timeout")]
    Timeout,

    #[error("Context length exceeded: {0}")]
    ContextExceeded(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),
}

impl GatewayError {
    /// Typed variants map directly; free-text failures go through `classifier`.
    pub fn category_with(&self, classifier: &ErrorClassifier) -> ErrorCategory {
        match self {
            GatewayError::RateLimited(_) => ErrorCategory::RateLimit,
            GatewayError::Timeout => ErrorCategory::Timeout,
            GatewayError::ContextExceeded(_) => ErrorCategory::ContextExceeded,
            GatewayError::MalformedResponse(_) => ErrorCategory::MalformedResponse,
            GatewayError::Network(_) => ErrorCategory::NetworkError,
            GatewayError::Unauthorized(_) => ErrorCategory::AuthError,
            GatewayError::RequestFailed(text) => classifier.classify(text),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        self.category_with(&ErrorClassifier::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One entry of the message history sent with a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// `generate(systemPrompt, messageHistory, maxTokens)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub system_prompt: String,
    pub history: Vec<ChatTurn>,
    pub max_tokens: u32,
}

/// Events yielded by a streaming generation.
#[derive(Debug)]
pub enum StreamEvent {
    Delta(String),
    /// Final text; may be empty when all text arrived as deltas
    Completed(String),
    Error(GatewayError),
}

/// Handle for receiving streaming events from a generation call.
///
/// The sequence is finite and cannot be restarted; dropping the handle
/// closes the channel, which stops the producing task.
pub struct StreamHandle {
    pub receiver: mpsc::Receiver<StreamEvent>,
}

impl StreamHandle {
    pub fn new(receiver: mpsc::Receiver<StreamEvent>) -> Self {
        Self { receiver }
    }

    /// Consume the stream and collect all text into a single string.
    pub async fn collect_text(mut self) -> Result<String, GatewayError> {
        let mut full_text = String::new();
        while let Some(event) = self.receiver.recv().await {
            match event {
                StreamEvent::Delta(chunk) => full_text.push_str(&chunk),
                StreamEvent::Completed(text) => {
                    if full_text.is_empty() {
                        return Ok(text);
                    }
                    return Ok(full_text);
                }
                StreamEvent::Error(e) => return Err(e),
            }
        }
        // Channel closed without Completed: return what we have
        Ok(full_text)
    }
}

/// Gateway to the text-generation capability
///
/// Implementations (adapters) live in the infrastructure layer.
#[async_trait]
pub trait GenerationGateway: Send + Sync {
    /// Generate a complete response
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GatewayError>;

    /// Generate a streaming response.
    ///
    /// Default implementation calls `generate()` and wraps the result in a
    /// single `Completed` event.
    async fn generate_streaming(
        &self,
        request: &GenerationRequest,
    ) -> Result<StreamHandle, GatewayError> {
        let result = self.generate(request).await?;
        let (tx, rx) = mpsc::channel(1);
        // Receiver may already be gone
        let _ = tx.send(StreamEvent::Completed(result)).await;
        Ok(StreamHandle::new(rx))
    }
}
