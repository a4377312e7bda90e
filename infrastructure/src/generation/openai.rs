//! OpenAI-compatible chat completions gateway
//!
//! Works against any endpoint exposing `POST {base_url}/chat/completions`
//! with SSE streaming (OpenAI, Azure OpenAI, local servers).

use super::sse::{SseBuffer, SseEvent};
use async_trait::async_trait;
use futures::StreamExt;
use panel_application::{
    ChatRole, GatewayError, GenerationGateway, GenerationRequest, StreamEvent, StreamHandle,
};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Connection settings for [`OpenAiCompatibleGateway`].
#[derive(Debug, Clone)]
pub struct OpenAiSettings {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    /// Whole-request HTTP timeout
    pub timeout: Option<Duration>,
    pub temperature: Option<f32>,
}

impl OpenAiSettings {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            model: model.into(),
            api_key: None,
            timeout: None,
            temperature: None,
        }
    }

    pub fn with_api_key(mut self, key: Option<String>) -> Self {
        self.api_key = key;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    max_tokens: u32,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    #[serde(default)]
    choices: Vec<WireChoice>,
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    message: WireChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct WireChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

pub struct OpenAiCompatibleGateway {
    settings: OpenAiSettings,
    client: Client,
}

impl OpenAiCompatibleGateway {
    pub fn new(settings: OpenAiSettings) -> Result<Self, GatewayError> {
        let mut builder = Client::builder();
        if let Some(timeout) = settings.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| GatewayError::RequestFailed(format!("HTTP client: {}", e)))?;
        Ok(Self { settings, client })
    }

    pub fn settings(&self) -> &OpenAiSettings {
        &self.settings
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.settings.base_url.trim_end_matches('/')
        )
    }

    fn wire_request<'a>(&'a self, request: &'a GenerationRequest, stream: bool) -> WireRequest<'a> {
        let mut messages = Vec::with_capacity(request.history.len() + 1);
        if !request.system_prompt.is_empty() {
            messages.push(WireMessage {
                role: "system",
                content: &request.system_prompt,
            });
        }
        messages.extend(request.history.iter().map(|turn| WireMessage {
            role: match turn.role {
                ChatRole::User => "user",
                ChatRole::Assistant => "assistant",
            },
            content: &turn.content,
        }));
        WireRequest {
            model: &self.settings.model,
            messages,
            max_tokens: request.max_tokens,
            stream,
            temperature: self.settings.temperature,
        }
    }

    async fn send(&self, request: &GenerationRequest, stream: bool) -> Result<Response, GatewayError> {
        let mut http = self.client.post(self.completions_url());
        if let Some(key) = &self.settings.api_key {
            http = http.bearer_auth(key);
        }
        debug!(
            "POST {} (model {}, {} history turns, stream={})",
            self.completions_url(),
            self.settings.model,
            request.history.len(),
            stream
        );
        let response = http
            .json(&self.wire_request(request, stream))
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(status_error(status, &body))
    }
}

/// Map a non-success HTTP status to a typed gateway error.
fn status_error(status: StatusCode, body: &str) -> GatewayError {
    let detail = format!("HTTP {}: {}", status.as_u16(), truncate(body, 500));
    match status.as_u16() {
        401 | 403 => GatewayError::Unauthorized(detail),
        429 => GatewayError::RateLimited(detail),
        408 | 504 => GatewayError::Timeout,
        400 | 413
            if body.contains("context_length_exceeded")
                || body.contains("maximum context length") =>
        {
            GatewayError::ContextExceeded(detail)
        }
        500..=599 => GatewayError::Network(detail),
        _ => GatewayError::RequestFailed(detail),
    }
}

fn transport_error(e: reqwest::Error) -> GatewayError {
    if e.is_timeout() {
        GatewayError::Timeout
    } else if e.is_decode() {
        GatewayError::MalformedResponse(e.to_string())
    } else {
        GatewayError::Network(e.to_string())
    }
}

fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[async_trait]
impl GenerationGateway for OpenAiCompatibleGateway {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GatewayError> {
        let response = self.send(request, false).await?;
        let body: WireResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::MalformedResponse(e.to_string()))?;
        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| GatewayError::MalformedResponse("no choices in response".to_string()))
    }

    async fn generate_streaming(
        &self,
        request: &GenerationRequest,
    ) -> Result<StreamHandle, GatewayError> {
        let response = self.send(request, true).await?;
        let (tx, rx) = mpsc::channel(64);

        tokio::spawn(async move {
            let mut bytes = response.bytes_stream();
            let mut buffer = SseBuffer::default();
            loop {
                let next = tokio::select! {
                    // Handle dropped: stop reading and close the connection
                    _ = tx.closed() => return,
                    next = bytes.next() => next,
                };
                let ended = next.is_none();
                let events = match next {
                    Some(Ok(chunk)) => buffer.push(&chunk),
                    Some(Err(e)) => {
                        let _ = tx.send(StreamEvent::Error(transport_error(e))).await;
                        return;
                    }
                    None => buffer.finish().into_iter().collect(),
                };
                for event in events {
                    let forwarded = match event {
                        SseEvent::Delta(text) => StreamEvent::Delta(text),
                        SseEvent::Done => StreamEvent::Completed(String::new()),
                        SseEvent::Invalid(detail) => {
                            warn!("Unreadable stream chunk: {}", detail);
                            StreamEvent::Error(GatewayError::MalformedResponse(detail))
                        }
                    };
                    let terminal = !matches!(forwarded, StreamEvent::Delta(_));
                    if tx.send(forwarded).await.is_err() || terminal {
                        return;
                    }
                }
                if ended {
                    // Body ended without [DONE]
                    let _ = tx.send(StreamEvent::Completed(String::new())).await;
                    return;
                }
            }
        });

        Ok(StreamHandle::new(rx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use panel_application::ChatTurn;
    use panel_domain::ErrorCategory;

    fn gateway() -> OpenAiCompatibleGateway {
        OpenAiCompatibleGateway::new(
            OpenAiSettings::new("http://localhost:9/v1/", "test-model")
                .with_temperature(Some(0.3)),
        )
        .unwrap()
    }

    #[test]
    fn test_url_and_wire_request() {
        let gw = gateway();
        assert_eq!(gw.completions_url(), "http://localhost:9/v1/chat/completions");

        let request = GenerationRequest {
            system_prompt: "You are the architect.".to_string(),
            history: vec![ChatTurn::user("Topic"), ChatTurn::assistant("Earlier reply")],
            max_tokens: 256,
        };
        let json = serde_json::to_value(gw.wire_request(&request, true)).unwrap();
        assert_eq!(json["model"], "test-model");
        assert_eq!(json["stream"], true);
        assert_eq!(json["max_tokens"], 256);
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["messages"][2]["role"], "assistant");
        assert_eq!(json["messages"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_status_mapping() {
        let cases = [
            (401, "{}", ErrorCategory::AuthError),
            (403, "{}", ErrorCategory::AuthError),
            (429, "slow down", ErrorCategory::RateLimit),
            (504, "", ErrorCategory::Timeout),
            (
                400,
                r#"{"error":{"code":"context_length_exceeded"}}"#,
                ErrorCategory::ContextExceeded,
            ),
            (502, "bad gateway", ErrorCategory::NetworkError),
            (400, "invalid model", ErrorCategory::Unknown),
        ];
        for (code, body, expected) in cases {
            let status = StatusCode::from_u16(code).unwrap();
            assert_eq!(status_error(status, body).category(), expected, "{}", code);
        }
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo", 2), "hé");
        assert_eq!(truncate("abc", 10), "abc");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_network_error() {
        let gw = gateway();
        let request = GenerationRequest {
            system_prompt: String::new(),
            history: vec![ChatTurn::user("hi")],
            max_tokens: 8,
        };
        let err = gw.generate(&request).await.unwrap_err();
        assert_eq!(err.category(), ErrorCategory::NetworkError);
    }
}
