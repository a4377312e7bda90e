//! One participant's turn: request building, budget check and streaming.

use crate::config::DeliberationParams;
use crate::ports::event_sink::{DeliberationEvent, EventSink};
use crate::ports::generation::{
    ChatTurn, GatewayError, GenerationGateway, GenerationRequest, StreamEvent,
};
use crate::use_cases::recover_session::Retryable;
use async_trait::async_trait;
use panel_domain::util::estimate_tokens;
use panel_domain::{
    CompactionLevel, CompactionReport, ContextBudget, DiscussionSession, Participant,
    ParticipantId, Phase, PromptTemplate, TodoTracker, TurnNotes, WindowEntry, WorkingWindow,
};
use tracing::{debug, info};

/// Mutable state of one running deliberation, owned by the driver.
pub(super) struct SessionRun {
    pub session: DiscussionSession,
    pub tracker: TodoTracker,
    pub window: WorkingWindow,
}

impl SessionRun {
    /// Fold the window and point affected todos at the summary.
    pub fn compact(&mut self, level: CompactionLevel, keep_recent: usize) -> Option<CompactionReport> {
        let report = self.window.compact(level, keep_recent, self.tracker.items())?;
        self.tracker.reanchor(&report);
        info!(
            "Compacted {} message(s) into {} ({})",
            report.folded_sequences.len(),
            report.summary_id,
            level.as_str()
        );
        Some(report)
    }
}

/// A single generation call for one participant, retryable.
pub(super) struct Turn<'a, G: GenerationGateway + ?Sized> {
    pub gateway: &'a G,
    pub params: &'a DeliberationParams,
    pub budget: &'a ContextBudget,
    pub events: &'a dyn EventSink,
    pub run: &'a mut SessionRun,
    pub participant: &'a Participant,
    pub phase: Phase,
    pub round: usize,
    pub directive: Option<&'a str>,
    pub attempts: usize,
}

impl<G: GenerationGateway + ?Sized> Turn<'_, G> {
    fn system_prompt(&self, advisory: Option<&str>) -> String {
        PromptTemplate::participant_system(
            self.participant,
            self.phase,
            self.run.session.topic(),
            self.run.session.context(),
            TurnNotes {
                advisory,
                directive: self.directive,
            },
        )
    }

    /// Check the budget, compact if needed, and build the request.
    fn prepare(&mut self) -> GenerationRequest {
        let base = self.system_prompt(None);
        let usage = self
            .budget
            .check(estimate_tokens(&base) + self.run.window.estimated_units());
        debug!(
            "Context {}/{} units ({})",
            usage.used_units,
            usage.budget_units,
            usage.status.as_str()
        );

        if let Some(level) = CompactionLevel::for_status(usage.status)
            && let Some(keep) = self.budget.keep_recent_for(usage.status)
        {
            self.run.compact(level, keep);
        }

        let system_prompt = match usage.advisory() {
            Some(advisory) => self.system_prompt(Some(&advisory)),
            None => base,
        };

        GenerationRequest {
            system_prompt,
            history: self.history(),
            max_tokens: self.params.max_tokens,
        }
    }

    /// The working window as chat history, ending with the turn request.
    fn history(&self) -> Vec<ChatTurn> {
        let own = &self.participant.id;
        let mut turns: Vec<ChatTurn> = self
            .run
            .window
            .entries()
            .iter()
            .map(|entry| match entry {
                WindowEntry::Message(m) if m.author.participant_id() == Some(own) => {
                    ChatTurn::assistant(m.content.clone())
                }
                other => ChatTurn::user(other.render()),
            })
            .collect();
        turns.push(ChatTurn::user(PromptTemplate::participant_turn(
            self.participant,
            self.phase,
            self.round,
        )));
        turns
    }
}

#[async_trait]
impl<G: GenerationGateway + ?Sized> Retryable for Turn<'_, G> {
    type Output = String;

    async fn attempt(&mut self) -> Result<String, GatewayError> {
        self.attempts += 1;
        let request = self.prepare();
        let session_id = self.run.session.id().to_string();

        self.events.emit(
            &session_id,
            &DeliberationEvent::ParticipantStart {
                participant: self.participant.id.clone(),
                phase: self.phase,
                round: self.round,
                attempt: self.attempts,
            },
        );

        let call = stream_reply(
            self.gateway,
            &request,
            self.events,
            &session_id,
            &self.participant.id,
        );
        match self.params.call_timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| GatewayError::Timeout)?,
            None => call.await,
        }
    }

    async fn compact(&mut self) -> bool {
        let keep = self.budget.emergency_keep_recent();
        self.run.compact(CompactionLevel::Emergency, keep).is_some()
    }
}

/// Run one streaming call, forwarding chunks as `delta` events.
async fn stream_reply<G: GenerationGateway + ?Sized>(
    gateway: &G,
    request: &GenerationRequest,
    events: &dyn EventSink,
    session_id: &str,
    participant: &ParticipantId,
) -> Result<String, GatewayError> {
    let mut handle = gateway.generate_streaming(request).await?;
    let mut text = String::new();

    while let Some(event) = handle.receiver.recv().await {
        match event {
            StreamEvent::Delta(chunk) => {
                events.emit(
                    session_id,
                    &DeliberationEvent::Delta {
                        participant: participant.clone(),
                        chunk: chunk.clone(),
                    },
                );
                text.push_str(&chunk);
            }
            StreamEvent::Completed(full) => {
                // Nothing streamed: deliver the whole reply as one chunk
                if text.is_empty() && !full.is_empty() {
                    events.emit(
                        session_id,
                        &DeliberationEvent::Delta {
                            participant: participant.clone(),
                            chunk: full.clone(),
                        },
                    );
                    text = full;
                }
                break;
            }
            StreamEvent::Error(e) => return Err(e),
        }
    }

    if text.trim().is_empty() {
        return Err(GatewayError::MalformedResponse(
            "empty response from generation".to_string(),
        ));
    }
    Ok(text)
}
