//! Run Deliberation use case
//!
//! Drives one panel discussion from participant selection to the final
//! report:
//!
//! 1. Select participants and open the session with the requester's message
//! 2. Per round, every participant speaks once, in selection order
//!    - budget check (and compaction) before each generation call
//!    - failures go through [`SessionRecovery`]; an unrecovered failure aborts
//! 3. After each round: convergence check, obligation check, phase transition
//! 4. On conclusion: risk classification, report, hand-off to store/archive

mod turn;
mod types;

pub use types::{AbortedSession, DeliberationOutcome, RunDeliberationError, RunDeliberationInput};

use turn::{SessionRun, Turn};
use types::Interrupted;

use crate::config::DeliberationParams;
use crate::ports::event_sink::{DeliberationEvent, EventSink};
use crate::ports::generation::GenerationGateway;
use crate::ports::session_store::{SessionArchive, SessionSnapshot, SessionStore};
use crate::use_cases::recover_session::{Retryable, SessionRecovery};
use panel_domain::{
    AssessmentInput, Author, ConclusionReason, ContextBudget, ConvergenceContext,
    ConvergencePolicy, ConvergenceWeights, DecisionClassification, DiscussionSession,
    DomainError, KeywordRiskAssessor, NoveltyConvergence, Participant, ParticipantCatalog,
    ParticipantSelector, Phase, PhaseMachine, PromptTemplate, RepeatReason, ReportGenerator,
    SelectionRequest, SessionFailure, TodoItem, TodoSource, TodoStatus, TodoTracker, Transition,
    WorkingWindow, classify_risk,
};
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Use case for running a deliberation
pub struct RunDeliberationUseCase<G: GenerationGateway + 'static> {
    gateway: Arc<G>,
    catalog: Arc<ParticipantCatalog>,
    convergence: Arc<dyn ConvergencePolicy>,
    params: DeliberationParams,
    budget: ContextBudget,
    recovery: SessionRecovery,
    store: Option<Arc<dyn SessionStore>>,
    archive: Option<Arc<dyn SessionArchive>>,
    cancellation_token: Option<CancellationToken>,
}

impl<G: GenerationGateway + 'static> Clone for RunDeliberationUseCase<G> {
    fn clone(&self) -> Self {
        Self {
            gateway: self.gateway.clone(),
            catalog: self.catalog.clone(),
            convergence: self.convergence.clone(),
            params: self.params.clone(),
            budget: self.budget.clone(),
            recovery: self.recovery.clone(),
            store: self.store.clone(),
            archive: self.archive.clone(),
            cancellation_token: self.cancellation_token.clone(),
        }
    }
}

impl<G: GenerationGateway + 'static> RunDeliberationUseCase<G> {
    pub fn new(gateway: Arc<G>, catalog: Arc<ParticipantCatalog>) -> Self {
        Self {
            gateway,
            catalog,
            convergence: Arc::new(NoveltyConvergence::new(ConvergenceWeights::default())),
            params: DeliberationParams::default(),
            budget: ContextBudget::default(),
            recovery: SessionRecovery::default(),
            store: None,
            archive: None,
            cancellation_token: None,
        }
    }

    // ==================== Builder Methods ====================

    pub fn with_params(mut self, params: DeliberationParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_convergence(mut self, policy: Arc<dyn ConvergencePolicy>) -> Self {
        self.convergence = policy;
        self
    }

    pub fn with_budget(mut self, budget: ContextBudget) -> Self {
        self.budget = budget;
        self
    }

    pub fn with_recovery(mut self, recovery: SessionRecovery) -> Self {
        self.recovery = recovery;
        self
    }

    pub fn with_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_archive(mut self, archive: Arc<dyn SessionArchive>) -> Self {
        self.archive = Some(archive);
        self
    }

    /// Set a cancellation token for graceful interruption
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = Some(token);
        self
    }

    // ==================== Execution ====================

    /// Run a deliberation to conclusion or abort.
    pub async fn execute(
        &self,
        input: RunDeliberationInput,
        events: &dyn EventSink,
    ) -> Result<DeliberationOutcome, RunDeliberationError> {
        // Malformed explicit factors are a caller error; surface before any generation.
        if let Some(factors) = &input.risk_factors {
            classify_risk(factors).map_err(RunDeliberationError::Classification)?;
        }

        let plan = self
            .params
            .phase_plan()
            .map_err(RunDeliberationError::InvalidConfig)?;

        let roster = self.select(&input)?;

        let session_id = input
            .session_id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let mut machine = PhaseMachine::new(plan);
        let Some(first_phase) = machine.current() else {
            return Err(RunDeliberationError::InvalidConfig(DomainError::InvalidConfig(
                "phase sequence must not be empty".to_string(),
            )));
        };

        let mut run = SessionRun {
            session: DiscussionSession::new(
                &session_id,
                &input.topic,
                &input.context,
                roster.iter().map(|p| p.id.clone()).collect(),
                machine.plan().total_target_rounds(),
            ),
            tracker: TodoTracker::new(&session_id),
            window: WorkingWindow::new(),
        };

        if let Some(requirements) = &input.requirements {
            let extracted = run
                .tracker
                .extract(requirements, TodoSource::Requirement, None);
            debug!("Tracking {} requirement obligation(s)", extracted.len());
        }

        let opening = run
            .session
            .append_message(
                Author::Requester,
                first_phase,
                PromptTemplate::opening_request(&input.topic, &input.context),
            )
            .map_err(RunDeliberationError::Session)?
            .clone();
        run.window.push(opening);

        info!(
            "Starting deliberation {} on {:?} with {} participant(s)",
            session_id,
            input.topic,
            roster.len()
        );
        self.save(&run.session).await;

        match self.drive(&mut run, &roster, &mut machine, events).await {
            Ok(reason) => self.conclude(run, reason, &input, events).await,
            Err(interrupted) => Err(self.abort(run, interrupted.into_failure(), events).await),
        }
    }

    fn select(&self, input: &RunDeliberationInput) -> Result<Vec<Participant>, RunDeliberationError> {
        let mut request = SelectionRequest::new(&input.topic, &input.project_phase)
            .with_max_participants(self.params.max_participants);
        if let Some(ids) = &input.explicit_participants {
            request = request.with_explicit(ids.clone());
        }

        let selection = ParticipantSelector::new(&self.catalog)
            .select(&request)
            .map_err(RunDeliberationError::Selection)?;
        if !selection.ignored.is_empty() {
            warn!(
                "Ignoring unknown participant(s): {}",
                selection.ignored.join(", ")
            );
        }

        Ok(selection
            .participants
            .iter()
            .filter_map(|id| self.catalog.get(id).cloned())
            .collect())
    }

    /// The round loop. Returns why the deliberation concluded.
    async fn drive(
        &self,
        run: &mut SessionRun,
        roster: &[Participant],
        machine: &mut PhaseMachine,
        events: &dyn EventSink,
    ) -> Result<ConclusionReason, Interrupted> {
        let session_id = run.session.id().to_string();
        let mut directive: Option<String> = None;

        while let Some(phase) = machine.current() {
            if machine.is_phase_start() {
                run.session.enter_phase(phase)?;
                info!("Phase {} started", phase);
                events.emit(
                    &session_id,
                    &DeliberationEvent::PhaseStart {
                        phase,
                        participants: roster.len(),
                    },
                );
            }

            let round = machine.rounds_in_phase() + 1;
            let round_start = run.session.messages().len();
            for participant in roster {
                self.speak(run, participant, phase, round, directive.as_deref(), events)
                    .await?;
            }
            run.session.complete_round()?;

            let (prior, current) = run.session.messages().split_at(round_start);
            let signal = self.convergence.evaluate(&ConvergenceContext {
                phase,
                rounds_in_phase: round,
                target_rounds: machine.plan().target_for(phase),
                round_messages: current,
                prior_messages: prior,
            });
            let stop = run.tracker.check_can_stop(&session_id)?;

            directive = None;
            match machine.record_round(signal, !stop.can_stop)? {
                Transition::Repeat {
                    reason: RepeatReason::PendingObligations,
                    ..
                } => {
                    info!(
                        "Holding {} for {} open obligation(s)",
                        phase,
                        stop.incomplete.len()
                    );
                    directive = Some(stop.directive);
                }
                Transition::Repeat { reason, .. } => {
                    debug!("Repeating {} ({:?})", phase, reason);
                }
                Transition::Advance { from, to } => {
                    info!("Phase {} complete, advancing to {}", from, to);
                    events.emit(
                        &session_id,
                        &DeliberationEvent::PhaseComplete {
                            phase: from,
                            rounds: round,
                        },
                    );
                }
                Transition::Conclude { from, reason } => {
                    info!("Deliberation concluded in {} ({})", from, reason.as_str());
                    events.emit(
                        &session_id,
                        &DeliberationEvent::PhaseComplete {
                            phase: from,
                            rounds: round,
                        },
                    );
                    return Ok(reason);
                }
            }
        }

        Err(Interrupted::Invalid(DomainError::InvalidConfig(
            "deliberation stopped without concluding".to_string(),
        )))
    }

    /// One participant speaks: generate (with recovery), then append.
    async fn speak(
        &self,
        run: &mut SessionRun,
        participant: &Participant,
        phase: Phase,
        round: usize,
        directive: Option<&str>,
        events: &dyn EventSink,
    ) -> Result<(), Interrupted> {
        let turn = Turn {
            gateway: self.gateway.as_ref(),
            params: &self.params,
            budget: &self.budget,
            events,
            run: &mut *run,
            participant,
            phase,
            round,
            directive,
            attempts: 0,
        };
        let generated = cancellable(
            self.cancellation_token.as_ref(),
            self.generate_with_recovery(turn),
        )
        .await;

        let text = match generated {
            None => {
                info!("Deliberation cancelled during {}'s turn", participant.id);
                return Err(Interrupted::Failed(SessionFailure::cancelled()));
            }
            Some(Err(failure)) => return Err(Interrupted::Failed(failure)),
            Some(Ok(text)) => text,
        };

        let message = run
            .session
            .append_message(Author::Participant(participant.id.clone()), phase, text)?
            .clone();
        let sequence = message.sequence;

        for (id, status) in run.tracker.apply_resolutions(&message.content) {
            debug!("Obligation {} is now {}", id, status.as_str());
        }
        let created = run
            .tracker
            .extract(&message.content, TodoSource::GeneratedOutput, Some(sequence));
        if !created.is_empty() {
            debug!(
                "{} raised {} new obligation(s)",
                participant.id,
                created.len()
            );
        }
        run.window.push(message);

        events.emit(
            run.session.id(),
            &DeliberationEvent::ParticipantComplete {
                participant: participant.id.clone(),
                phase,
                sequence,
            },
        );
        Ok(())
    }

    /// First attempt, then recovery on failure.
    async fn generate_with_recovery(
        &self,
        mut turn: Turn<'_, G>,
    ) -> Result<String, SessionFailure> {
        let error = match turn.attempt().await {
            Ok(text) => return Ok(text),
            Err(e) => e,
        };

        let category = self.recovery.classify(&error);
        warn!(
            "Generation failed for {} ({}): {}",
            turn.participant.id, category, error
        );

        let mut result = self.recovery.recover(category, &mut turn).await;
        match result.value.take() {
            Some(text) => Ok(text),
            None => Err(result.to_failure(&error)),
        }
    }

    async fn conclude(
        &self,
        mut run: SessionRun,
        reason: ConclusionReason,
        input: &RunDeliberationInput,
        events: &dyn EventSink,
    ) -> Result<DeliberationOutcome, RunDeliberationError> {
        run.session
            .converge()
            .map_err(RunDeliberationError::Session)?;
        let todos = run.tracker.items().to_vec();

        let classification = self
            .classification(&run.session, &todos, input)
            .map_err(RunDeliberationError::Classification)?;
        let report = ReportGenerator::generate(
            &run.session,
            &todos,
            reason,
            Some(&classification),
        );

        info!(
            "Deliberation {} converged after {} round(s), risk {} ({})",
            run.session.id(),
            run.session.rounds_completed(),
            classification.level,
            classification.score
        );
        events.emit(
            run.session.id(),
            &DeliberationEvent::Converged {
                reason,
                rounds: run.session.rounds_completed(),
                risk_level: classification.level,
            },
        );

        self.hand_off(SessionSnapshot {
            session: run.session.clone(),
            todos: todos.clone(),
            report: Some(report.clone()),
            classification: Some(classification.clone()),
            failure: None,
        })
        .await;

        Ok(DeliberationOutcome {
            session: run.session,
            report,
            classification,
            todos,
        })
    }

    fn classification(
        &self,
        session: &DiscussionSession,
        todos: &[TodoItem],
        input: &RunDeliberationInput,
    ) -> Result<DecisionClassification, DomainError> {
        if let Some(factors) = &input.risk_factors {
            return classify_risk(factors);
        }
        let factors = KeywordRiskAssessor.assess(&AssessmentInput {
            topic: session.topic(),
            messages: session.messages(),
            action_items: todos
                .iter()
                .filter(|t| t.status != TodoStatus::Dropped)
                .count(),
            open_obligations: todos.iter().filter(|t| t.is_pending()).count(),
        });
        classify_risk(&factors)
    }

    async fn abort(
        &self,
        mut run: SessionRun,
        failure: SessionFailure,
        events: &dyn EventSink,
    ) -> RunDeliberationError {
        if let Err(e) = run.session.abort() {
            warn!("Could not mark session as aborted: {}", e);
        }
        warn!(
            "Deliberation {} aborted: {}",
            run.session.id(),
            failure.detail.as_deref().unwrap_or(&failure.user_message)
        );
        events.emit(
            run.session.id(),
            &DeliberationEvent::Error {
                category: failure.category(),
                message: failure.user_message.clone(),
            },
        );

        let todos = run.tracker.items().to_vec();
        self.hand_off(SessionSnapshot {
            session: run.session.clone(),
            todos: todos.clone(),
            report: None,
            classification: None,
            failure: Some(failure.clone()),
        })
        .await;

        RunDeliberationError::Aborted(Box::new(AbortedSession {
            session: run.session,
            failure,
            todos,
        }))
    }

    async fn save(&self, session: &DiscussionSession) {
        if let Some(store) = &self.store
            && let Err(e) = store.put(session).await
        {
            warn!("Failed to store session {}: {}", session.id(), e);
        }
    }

    /// Store and archive the final snapshot. Failures never change the outcome.
    async fn hand_off(&self, snapshot: SessionSnapshot) {
        self.save(&snapshot.session).await;
        if let Some(archive) = &self.archive
            && let Err(e) = archive.persist(&snapshot).await
        {
            warn!("Failed to archive session {}: {}", snapshot.session.id(), e);
        }
    }
}

/// Race `fut` against the cancellation token. `None` means cancelled.
async fn cancellable<F: Future>(token: Option<&CancellationToken>, fut: F) -> Option<F::Output> {
    match token {
        Some(token) => tokio::select! {
            biased;
            _ = token.cancelled() => None,
            out = fut => Some(out),
        },
        None => Some(fut.await),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::event_sink::NoEvents;
    use crate::ports::generation::{GatewayError, GenerationRequest, StreamEvent, StreamHandle};
    use crate::ports::session_store::StoreError;
    use async_trait::async_trait;
    use panel_domain::{
        ConvergenceSignal, ErrorCategory, FailureKind, FixedConvergence, RecoveryPolicy,
        RiskFactor, SessionStatus,
    };
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::mpsc;

    // ==================== Test Infrastructure ====================

    /// A scripted reply for the mock gateway
    enum Scripted {
        Text(&'static str),
        Error(GatewayError),
        /// Never completes
        Hang,
        /// Streamed as one delta per chunk
        Chunks(&'static [&'static str]),
        /// Streams the chunks, then stalls without completing
        Stall(&'static [&'static str]),
    }

    /// Gateway that returns scripted replies in order and records requests
    struct ScriptedGateway {
        replies: Mutex<VecDeque<Scripted>>,
        requests: Mutex<Vec<GenerationRequest>>,
    }

    impl ScriptedGateway {
        fn new(replies: Vec<Scripted>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn requests(&self) -> Vec<GenerationRequest> {
            self.requests.lock().unwrap().clone()
        }

        fn next(&self, request: &GenerationRequest) -> Option<Scripted> {
            self.requests.lock().unwrap().push(request.clone());
            self.replies.lock().unwrap().pop_front()
        }
    }

    async fn reply(next: Option<Scripted>) -> Result<String, GatewayError> {
        match next {
            Some(Scripted::Text(t)) => Ok(t.to_string()),
            Some(Scripted::Error(e)) => Err(e),
            Some(Scripted::Hang) => std::future::pending().await,
            Some(Scripted::Chunks(chunks)) | Some(Scripted::Stall(chunks)) => Ok(chunks.concat()),
            None => Ok("Nothing further to add.".to_string()),
        }
    }

    #[async_trait]
    impl GenerationGateway for ScriptedGateway {
        async fn generate(&self, request: &GenerationRequest) -> Result<String, GatewayError> {
            reply(self.next(request)).await
        }

        async fn generate_streaming(
            &self,
            request: &GenerationRequest,
        ) -> Result<StreamHandle, GatewayError> {
            let (chunks, stall) = match self.next(request) {
                Some(Scripted::Chunks(chunks)) => (chunks, false),
                Some(Scripted::Stall(chunks)) => (chunks, true),
                other => {
                    let text = reply(other).await?;
                    let (tx, rx) = mpsc::channel(1);
                    tx.send(StreamEvent::Completed(text)).await.unwrap();
                    return Ok(StreamHandle::new(rx));
                }
            };

            let (tx, rx) = mpsc::channel(chunks.len() + 1);
            tokio::spawn(async move {
                for chunk in chunks {
                    if tx.send(StreamEvent::Delta(chunk.to_string())).await.is_err() {
                        return;
                    }
                }
                if stall {
                    // Keep the sender alive so the stream never ends
                    std::future::pending::<()>().await;
                }
                let _ = tx.send(StreamEvent::Completed(String::new())).await;
            });
            Ok(StreamHandle::new(rx))
        }
    }

    /// Records every emitted event
    #[derive(Default)]
    struct RecordingSink {
        events: Mutex<Vec<DeliberationEvent>>,
    }

    impl RecordingSink {
        fn types(&self) -> Vec<&'static str> {
            self.events
                .lock()
                .unwrap()
                .iter()
                .map(|e| e.event_type())
                .collect()
        }

        fn events(&self) -> Vec<DeliberationEvent> {
            self.events.lock().unwrap().clone()
        }
    }

    impl EventSink for RecordingSink {
        fn emit(&self, _session_id: &str, event: &DeliberationEvent) {
            self.events.lock().unwrap().push(event.clone());
        }
    }

    /// Records events and cancels the run on the first streamed chunk
    struct CancelOnDelta {
        recorded: RecordingSink,
        token: CancellationToken,
    }

    impl EventSink for CancelOnDelta {
        fn emit(&self, session_id: &str, event: &DeliberationEvent) {
            self.recorded.emit(session_id, event);
            if matches!(event, DeliberationEvent::Delta { .. }) {
                self.token.cancel();
            }
        }
    }

    /// Archive that keeps every snapshot it receives
    #[derive(Default)]
    struct RecordingArchive {
        snapshots: Mutex<Vec<SessionSnapshot>>,
    }

    #[async_trait]
    impl SessionArchive for RecordingArchive {
        async fn persist(&self, snapshot: &SessionSnapshot) -> Result<(), StoreError> {
            self.snapshots.lock().unwrap().push(snapshot.clone());
            Ok(())
        }
    }

    fn use_case(gateway: Arc<ScriptedGateway>) -> RunDeliberationUseCase<ScriptedGateway> {
        RunDeliberationUseCase::new(gateway, Arc::new(ParticipantCatalog::builtin()))
            .with_recovery(SessionRecovery::new(RecoveryPolicy::without_delay(3)))
    }

    fn single_phase(phase: Phase) -> DeliberationParams {
        DeliberationParams::default().with_phases(vec![phase])
    }

    fn input(participants: &[&str]) -> RunDeliberationInput {
        RunDeliberationInput::new("Pick a message queue", "design")
            .with_participants(participants.iter().map(|p| p.to_string()).collect())
    }

    fn advance() -> Arc<dyn ConvergencePolicy> {
        Arc::new(FixedConvergence(ConvergenceSignal::Advance))
    }

    // ==================== Flow Tests ====================

    #[tokio::test]
    async fn test_full_deliberation_converges() {
        let gateway = ScriptedGateway::new(vec![]);
        let sink = RecordingSink::default();
        let outcome = use_case(gateway.clone())
            .execute(input(&["architect", "security_engineer"]), &sink)
            .await
            .unwrap();

        assert_eq!(outcome.session.status(), SessionStatus::Converged);
        assert_eq!(outcome.report.conclusion_reason, ConclusionReason::Converged);

        let sequences: Vec<u64> = outcome.session.messages().iter().map(|m| m.sequence).collect();
        assert!(sequences.windows(2).all(|w| w[0] < w[1]));
        // Opening message plus two per round
        assert_eq!(sequences.len(), 1 + 2 * outcome.session.rounds_completed());

        let types = sink.types();
        assert_eq!(types.first(), Some(&"phase_start"));
        assert_eq!(types.last(), Some(&"converged"));
        assert_eq!(types.iter().filter(|t| **t == "phase_start").count(), 5);
        assert_eq!(types.iter().filter(|t| **t == "phase_complete").count(), 5);
    }

    #[tokio::test]
    async fn test_events_are_ordered_per_message() {
        let gateway = ScriptedGateway::new(vec![]);
        let sink = RecordingSink::default();
        use_case(gateway)
            .with_params(single_phase(Phase::Opening))
            .with_convergence(advance())
            .execute(input(&["architect", "designer"]), &sink)
            .await
            .unwrap();

        assert_eq!(
            sink.types(),
            vec![
                "phase_start",
                "participant_start",
                "delta",
                "participant_complete",
                "participant_start",
                "delta",
                "participant_complete",
                "phase_complete",
                "converged",
            ]
        );
    }

    #[tokio::test]
    async fn test_streamed_chunks_stay_within_their_message() {
        let gateway = ScriptedGateway::new(vec![
            Scripted::Chunks(&["Kafka ", "scales ", "well."]),
            Scripted::Chunks(&["RabbitMQ ", "is simpler."]),
        ]);
        let sink = RecordingSink::default();
        let outcome = use_case(gateway)
            .with_params(single_phase(Phase::Opening))
            .with_convergence(advance())
            .execute(input(&["architect", "designer"]), &sink)
            .await
            .unwrap();

        assert_eq!(
            sink.types(),
            vec![
                "phase_start",
                "participant_start",
                "delta",
                "delta",
                "delta",
                "participant_complete",
                "participant_start",
                "delta",
                "delta",
                "participant_complete",
                "phase_complete",
                "converged",
            ]
        );

        // Every chunk belongs to the speaker whose turn is open
        let mut speaking = None;
        let mut streamed: Vec<String> = Vec::new();
        for event in sink.events() {
            match event {
                DeliberationEvent::ParticipantStart { participant, .. } => {
                    assert!(speaking.is_none());
                    speaking = Some(participant);
                    streamed.push(String::new());
                }
                DeliberationEvent::Delta { participant, chunk } => {
                    assert_eq!(speaking.as_ref(), Some(&participant));
                    streamed.last_mut().unwrap().push_str(&chunk);
                }
                DeliberationEvent::ParticipantComplete { participant, .. } => {
                    assert_eq!(speaking.take(), Some(participant));
                }
                _ => {}
            }
        }

        let contents: Vec<String> = outcome.session.messages()[1..]
            .iter()
            .map(|m| m.content.clone())
            .collect();
        assert_eq!(contents, vec!["Kafka scales well.", "RabbitMQ is simpler."]);
        assert_eq!(streamed, contents);
    }

    #[tokio::test]
    async fn test_cancel_mid_stream_keeps_no_partial_message() {
        let gateway = ScriptedGateway::new(vec![Scripted::Stall(&["Kafka ", "scales "])]);
        let token = CancellationToken::new();
        let sink = CancelOnDelta {
            recorded: RecordingSink::default(),
            token: token.clone(),
        };

        let err = use_case(gateway)
            .with_params(DeliberationParams::default().with_call_timeout(None))
            .with_cancellation(token)
            .execute(input(&["architect", "designer"]), &sink)
            .await
            .unwrap_err();

        assert!(err.is_cancelled());
        let aborted = err.aborted().unwrap();
        assert_eq!(aborted.failure.kind, FailureKind::Cancelled);
        assert_eq!(aborted.session.status(), SessionStatus::Aborted);
        // Only the requester's opening message
        assert_eq!(aborted.session.messages().len(), 1);

        let types = sink.recorded.types();
        assert!(types.contains(&"delta"));
        assert!(!types.contains(&"participant_complete"));
    }

    #[tokio::test]
    async fn test_round_ceiling_stops_endless_continue() {
        let gateway = ScriptedGateway::new(vec![]);
        let params = single_phase(Phase::Opening)
            .with_max_extra_rounds(100)
            .with_max_total_rounds(3);

        let outcome = use_case(gateway.clone())
            .with_params(params)
            .with_convergence(Arc::new(FixedConvergence(ConvergenceSignal::Continue)))
            .execute(input(&["architect", "designer"]), &NoEvents)
            .await
            .unwrap();

        assert_eq!(outcome.report.conclusion_reason, ConclusionReason::RoundCeiling);
        assert_eq!(outcome.session.rounds_completed(), 3);
        assert_eq!(outcome.session.messages().len(), 7);
        assert_eq!(gateway.requests().len(), 6);
    }

    #[tokio::test]
    async fn test_rate_limit_recovered_without_surfacing() {
        let gateway = ScriptedGateway::new(vec![
            Scripted::Error(GatewayError::RateLimited("429".into())),
            Scripted::Text("Kafka fits our throughput needs."),
        ]);
        let sink = RecordingSink::default();
        let outcome = use_case(gateway.clone())
            .with_params(single_phase(Phase::Opening))
            .with_convergence(advance())
            .execute(input(&["architect"]), &sink)
            .await
            .unwrap();

        assert_eq!(outcome.session.messages().len(), 2);
        assert_eq!(
            outcome.session.messages()[1].content,
            "Kafka fits our throughput needs."
        );
        assert_eq!(gateway.requests().len(), 2);

        let attempts: Vec<usize> = sink
            .events()
            .iter()
            .filter_map(|e| match e {
                DeliberationEvent::ParticipantStart { attempt, .. } => Some(*attempt),
                _ => None,
            })
            .collect();
        assert_eq!(attempts, vec![1, 2]);
        assert!(!sink.types().contains(&"error"));
    }

    #[tokio::test]
    async fn test_auth_error_aborts_without_retry() {
        let gateway = ScriptedGateway::new(vec![Scripted::Error(GatewayError::Unauthorized(
            "invalid api key".into(),
        ))]);
        let sink = RecordingSink::default();
        let err = use_case(gateway.clone())
            .execute(input(&["architect"]), &sink)
            .await
            .unwrap_err();

        let aborted = err.aborted().unwrap();
        assert_eq!(aborted.session.status(), SessionStatus::Aborted);
        assert_eq!(aborted.failure.category(), Some(ErrorCategory::AuthError));
        assert_eq!(aborted.failure.recovery.as_ref().map(|r| r.attempts), Some(0));
        // Only the requester's opening message
        assert_eq!(aborted.session.messages().len(), 1);
        assert_eq!(gateway.requests().len(), 1);
        assert_eq!(sink.types().last(), Some(&"error"));
    }

    #[tokio::test]
    async fn test_exhausted_recovery_aborts() {
        let gateway = ScriptedGateway::new(vec![
            Scripted::Error(GatewayError::Timeout),
            Scripted::Error(GatewayError::Timeout),
            Scripted::Error(GatewayError::Timeout),
            Scripted::Error(GatewayError::Timeout),
        ]);
        let err = use_case(gateway.clone())
            .execute(input(&["architect"]), &NoEvents)
            .await
            .unwrap_err();

        let aborted = err.aborted().unwrap();
        assert_eq!(aborted.failure.kind, FailureKind::Generation(ErrorCategory::Timeout));
        assert_eq!(gateway.requests().len(), 4);
        assert!(!err.is_cancelled());
    }

    #[tokio::test]
    async fn test_per_call_timeout_is_recovered() {
        let gateway = ScriptedGateway::new(vec![Scripted::Hang, Scripted::Text("Back again.")]);
        let params = single_phase(Phase::Opening).with_call_timeout(Some(Duration::from_millis(20)));
        let outcome = use_case(gateway.clone())
            .with_params(params)
            .with_convergence(advance())
            .execute(input(&["architect"]), &NoEvents)
            .await
            .unwrap();

        assert_eq!(outcome.session.messages()[1].content, "Back again.");
    }

    #[tokio::test]
    async fn test_cancellation_aborts_without_partial_message() {
        let gateway = ScriptedGateway::new(vec![Scripted::Text("First point."), Scripted::Hang]);
        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });

        let err = use_case(gateway)
            .with_params(DeliberationParams::default().with_call_timeout(None))
            .with_cancellation(token)
            .execute(input(&["architect", "designer"]), &NoEvents)
            .await
            .unwrap_err();

        assert!(err.is_cancelled());
        let aborted = err.aborted().unwrap();
        assert_eq!(aborted.session.status(), SessionStatus::Aborted);
        assert_eq!(aborted.session.messages().len(), 2);
        assert_eq!(aborted.session.rounds_completed(), 0);
    }

    #[tokio::test]
    async fn test_invalid_state_aborts_and_hands_off() {
        let archive = Arc::new(RecordingArchive::default());
        let use_case = use_case(ScriptedGateway::new(vec![])).with_archive(archive.clone());
        let run = SessionRun {
            session: DiscussionSession::new(
                "s-1",
                "Pick a message queue",
                "",
                vec![panel_domain::ParticipantId::new("architect")],
                5,
            ),
            tracker: TodoTracker::new("s-1"),
            window: WorkingWindow::new(),
        };
        let sink = RecordingSink::default();

        let interrupted = Interrupted::from(DomainError::InvalidConfig(
            "deliberation stopped without concluding".to_string(),
        ));
        let err = use_case
            .abort(run, interrupted.into_failure(), &sink)
            .await;

        let aborted = err.aborted().unwrap();
        assert_eq!(aborted.failure.kind, FailureKind::Internal);
        assert!(aborted.failure.detail.as_deref().unwrap().contains("without concluding"));
        assert_eq!(aborted.session.status(), SessionStatus::Aborted);
        assert!(!err.is_cancelled());
        assert_eq!(sink.types(), vec!["error"]);

        let snapshots = archive.snapshots.lock().unwrap();
        assert_eq!(snapshots.len(), 1);
        assert_eq!(
            snapshots[0].failure.as_ref().map(|f| f.kind),
            Some(FailureKind::Internal)
        );
    }

    #[tokio::test]
    async fn test_open_obligations_hold_conclusion() {
        let gateway = ScriptedGateway::new(vec![
            Scripted::Text("Looks fine to me."),
            Scripted::Text("DONE: Write a migration plan"),
        ]);
        let outcome = use_case(gateway.clone())
            .with_params(single_phase(Phase::Validation))
            .with_convergence(advance())
            .execute(
                input(&["architect"]).with_requirements("- Write a migration plan"),
                &NoEvents,
            )
            .await
            .unwrap();

        assert_eq!(outcome.session.rounds_completed(), 2);
        assert_eq!(outcome.todos.len(), 1);
        assert_eq!(outcome.todos[0].status, TodoStatus::Completed);
        assert!(outcome.report.open_obligations.is_empty());

        let requests = gateway.requests();
        assert!(!requests[0].system_prompt.contains("still open"));
        assert!(requests[1].system_prompt.contains("still open"));
    }

    #[tokio::test]
    async fn test_ceiling_reports_open_obligations() {
        let gateway = ScriptedGateway::new(vec![]);
        let params = single_phase(Phase::Validation).with_max_total_rounds(2);
        let outcome = use_case(gateway)
            .with_params(params)
            .with_convergence(advance())
            .execute(
                input(&["architect"]).with_requirements("- Write a migration plan"),
                &NoEvents,
            )
            .await
            .unwrap();

        assert_eq!(outcome.session.status(), SessionStatus::Converged);
        assert_eq!(outcome.report.conclusion_reason, ConclusionReason::RoundCeiling);
        assert_eq!(outcome.report.open_obligations.len(), 1);
    }

    #[tokio::test]
    async fn test_compaction_keeps_permanent_log() {
        let gateway = ScriptedGateway::new(vec![]);
        let params = DeliberationParams::default()
            .with_phases(vec![Phase::Opening, Phase::Exploration, Phase::Debate]);
        let outcome = use_case(gateway.clone())
            .with_params(params)
            .with_convergence(advance())
            .with_budget(ContextBudget::new(0))
            .execute(input(&["architect"]), &NoEvents)
            .await
            .unwrap();

        assert_eq!(outcome.session.messages().len(), 4);
        let requests = gateway.requests();
        assert_eq!(requests.len(), 3);
        assert!(requests[2].history[0].content.starts_with("[Summary of messages #1-#1]"));
        assert!(requests[2].system_prompt.contains("Only the most recent messages"));
    }

    #[tokio::test]
    async fn test_selection_errors_surface_immediately() {
        let gateway = ScriptedGateway::new(vec![]);
        let err = use_case(gateway.clone())
            .execute(input(&["nobody"]), &NoEvents)
            .await
            .unwrap_err();

        assert!(matches!(err, RunDeliberationError::Selection(_)));
        assert!(gateway.requests().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_risk_factors_rejected_before_generation() {
        let gateway = ScriptedGateway::new(vec![]);
        let err = use_case(gateway.clone())
            .execute(
                input(&["architect"]).with_risk_factors(vec![RiskFactor::new("scope", 25, "huge")]),
                &NoEvents,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, RunDeliberationError::Classification(_)));
        assert!(gateway.requests().is_empty());
    }

    #[tokio::test]
    async fn test_explicit_risk_factors_are_used() {
        let gateway = ScriptedGateway::new(vec![]);
        let outcome = use_case(gateway)
            .with_params(single_phase(Phase::Opening))
            .with_convergence(advance())
            .execute(
                input(&["architect"]).with_risk_factors(vec![
                    RiskFactor::new("irreversibility", 20, "data migration"),
                    RiskFactor::new("scope", 15, "every service"),
                ]),
                &NoEvents,
            )
            .await
            .unwrap();

        assert_eq!(outcome.classification.score, 35);
        assert_eq!(outcome.classification.level, panel_domain::RiskLevel::Notify);
    }
}
