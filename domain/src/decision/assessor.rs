//! Deriving risk factors from a finished deliberation.

use super::risk::{MAX_FACTOR_SCORE, RiskFactor};
use crate::discussion::entities::{Author, Message};
use crate::util::content_words;
use std::collections::HashSet;

const IRREVERSIBLE_TERMS: &[&str] = &[
    "delete",
    "drop",
    "migrate",
    "migration",
    "irreversible",
    "production",
    "deprecate",
    "shutdown",
    "rewrite",
    "purge",
];

const SECURITY_TERMS: &[&str] = &[
    "security",
    "auth",
    "authentication",
    "credential",
    "credentials",
    "secret",
    "password",
    "encryption",
    "permission",
    "permissions",
    "vulnerability",
    "pii",
];

const DISSENT_TERMS: &[&str] = &[
    "disagree",
    "object",
    "objection",
    "concern",
    "concerned",
    "oppose",
    "unconvinced",
    "reject",
];

/// Input for [`KeywordRiskAssessor::assess`].
#[derive(Debug, Clone, Copy)]
pub struct AssessmentInput<'a> {
    pub topic: &'a str,
    pub messages: &'a [Message],
    /// Todos that would become action items
    pub action_items: usize,
    /// Todos still pending at conclusion
    pub open_obligations: usize,
}

/// Keyword-based factor derivation.
///
/// Produces five factors: `irreversibility`, `security_exposure`, `scope`,
/// `open_obligations` and `dissent`.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordRiskAssessor;

impl KeywordRiskAssessor {
    pub fn assess(&self, input: &AssessmentInput<'_>) -> Vec<RiskFactor> {
        let mut words: HashSet<String> = content_words(input.topic, 3).collect();
        for message in input.messages {
            words.extend(content_words(&message.content, 3));
        }

        let participant_messages: Vec<&Message> = input
            .messages
            .iter()
            .filter(|m| matches!(m.author, Author::Participant(_)))
            .collect();
        let dissenting = participant_messages
            .iter()
            .filter(|m| content_words(&m.content, 3).any(|w| DISSENT_TERMS.contains(&w.as_str())))
            .count();
        let dissent_score = if participant_messages.is_empty() {
            0
        } else {
            (dissenting as u32 * MAX_FACTOR_SCORE).div_ceil(participant_messages.len() as u32)
        };

        vec![
            keyword_factor("irreversibility", &words, IRREVERSIBLE_TERMS),
            keyword_factor("security_exposure", &words, SECURITY_TERMS),
            RiskFactor::new(
                "scope",
                capped(input.action_items as u32 * 3),
                format!("{} action item(s)", input.action_items),
            ),
            RiskFactor::new(
                "open_obligations",
                capped(input.open_obligations as u32 * 5),
                format!("{} obligation(s) still open", input.open_obligations),
            ),
            RiskFactor::new(
                "dissent",
                dissent_score,
                format!(
                    "{} of {} contribution(s) raised objections",
                    dissenting,
                    participant_messages.len()
                ),
            ),
        ]
    }
}

fn keyword_factor(name: &str, words: &HashSet<String>, terms: &[&str]) -> RiskFactor {
    let hits: Vec<&str> = terms
        .iter()
        .copied()
        .filter(|t| words.contains(*t))
        .collect();
    let justification = if hits.is_empty() {
        "no indicators mentioned".to_string()
    } else {
        format!("mentions: {}", hits.join(", "))
    };
    RiskFactor::new(name, capped(hits.len() as u32 * 5), justification)
}

fn capped(score: u32) -> u32 {
    score.min(MAX_FACTOR_SCORE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::risk::{RiskLevel, classify};
    use crate::discussion::Phase;
    use chrono::Utc;

    fn msg(seq: u64, author: &str, content: &str) -> Message {
        Message {
            id: format!("m{}", seq),
            author: Author::Participant(author.into()),
            phase: Phase::Debate,
            content: content.to_string(),
            timestamp: Utc::now(),
            sequence: seq,
        }
    }

    fn score_of(factors: &[RiskFactor], name: &str) -> u32 {
        factors.iter().find(|f| f.name == name).unwrap().score
    }

    #[test]
    fn test_quiet_discussion_is_auto() {
        let messages = vec![msg(1, "a", "Let us rename the button label.")];
        let factors = KeywordRiskAssessor.assess(&AssessmentInput {
            topic: "Button copy",
            messages: &messages,
            action_items: 1,
            open_obligations: 0,
        });
        assert_eq!(factors.len(), 5);
        assert_eq!(classify(&factors).unwrap().level, RiskLevel::Auto);
    }

    #[test]
    fn test_risky_discussion_scores_high() {
        let messages = vec![
            msg(1, "a", "We must migrate production data and drop the legacy tables."),
            msg(2, "b", "I disagree, the password and credential store needs encryption first."),
        ];
        let factors = KeywordRiskAssessor.assess(&AssessmentInput {
            topic: "Auth database migration",
            messages: &messages,
            action_items: 4,
            open_obligations: 2,
        });

        assert_eq!(score_of(&factors, "irreversibility"), 20);
        assert_eq!(score_of(&factors, "security_exposure"), 20);
        assert_eq!(score_of(&factors, "scope"), 12);
        assert_eq!(score_of(&factors, "open_obligations"), 10);
        assert_eq!(score_of(&factors, "dissent"), 10);
        let classification = classify(&factors).unwrap();
        assert_eq!(classification.score, 72);
        assert_eq!(classification.level, RiskLevel::Confirm);
    }

    #[test]
    fn test_factors_are_always_valid() {
        let factors = KeywordRiskAssessor.assess(&AssessmentInput {
            topic: "",
            messages: &[],
            action_items: 100,
            open_obligations: 100,
        });
        assert!(classify(&factors).is_ok());
        assert_eq!(score_of(&factors, "dissent"), 0);
    }
}
