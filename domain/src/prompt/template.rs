//! Prompt templates for deliberation participants

use crate::discussion::Phase;
use crate::participant::Participant;

/// Per-turn inputs that change between calls.
#[derive(Debug, Clone, Copy, Default)]
pub struct TurnNotes<'a> {
    /// Context budget advisory from the last check
    pub advisory: Option<&'a str>,
    /// Continuation directive while obligations are open
    pub directive: Option<&'a str>,
}

/// Templates for generating prompts at each stage
pub struct PromptTemplate;

impl PromptTemplate {
    /// System prompt for one participant in one phase
    pub fn participant_system(
        participant: &Participant,
        phase: Phase,
        topic: &str,
        context: &str,
        notes: TurnNotes<'_>,
    ) -> String {
        let mut prompt = format!(
            r#"You are the {role} ({id}) on a panel deliberating a decision with other specialists.
Speak only for your own role. Build on what others have said instead of repeating it."#,
            role = participant.display_role,
            id = participant.id,
        );

        if !participant.focus.is_empty() {
            prompt.push_str(&format!(
                "\nYour areas of focus: {}.",
                participant.focus.join(", ")
            ));
        }
        if !participant.style.is_empty() {
            prompt.push_str(&format!(
                "\nYour communication style: {}.",
                participant.style.join(", ")
            ));
        }

        prompt.push_str(&format!(
            r#"

Topic: {topic}
Current phase: {phase}
Phase goal: {goal}"#,
            topic = topic,
            phase = phase.display_name(),
            goal = phase.goal(),
        ));

        if !context.trim().is_empty() {
            prompt.push_str(&format!("\n\nBackground:\n{}", context.trim()));
        }

        prompt.push_str(
            r#"

When you commit to follow-up work, write it on its own line as `TODO: <description>`
(add `@participant_id` to name an owner). When an earlier item is finished or no
longer needed, write `DONE: <description>` or `DROPPED: <description>`."#,
        );

        if let Some(advisory) = notes.advisory {
            prompt.push_str(&format!("\n\nNote: {}", advisory));
        }
        if let Some(directive) = notes.directive {
            prompt.push_str(&format!("\n\n{}", directive));
        }

        prompt
    }

    /// Final user turn asking the participant to speak
    pub fn participant_turn(participant: &Participant, phase: Phase, round_in_phase: usize) -> String {
        format!(
            "It is your turn, {role}. This is round {round} of the {phase} phase. \
             Give your contribution in a few short paragraphs.",
            role = participant.display_role,
            round = round_in_phase,
            phase = phase.as_str(),
        )
    }

    /// The requester's opening message that starts the log
    pub fn opening_request(topic: &str, context: &str) -> String {
        if context.trim().is_empty() {
            format!("Please deliberate on: {}", topic)
        } else {
            format!("Please deliberate on: {}\n\n{}", topic, context.trim())
        }
    }
}
