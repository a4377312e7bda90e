//! Discussion phases

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Ordered stage of a deliberation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Understand the problem, constraints and success criteria
    Opening,
    /// Generate candidate ideas and approaches
    Exploration,
    /// Challenge assumptions and weigh trade-offs
    Debate,
    /// Converge on a recommendation
    Synthesis,
    /// Check the recommendation against risks and open obligations
    Validation,
}

impl Phase {
    /// All phases in deliberation order.
    pub const ALL: [Phase; 5] = [
        Phase::Opening,
        Phase::Exploration,
        Phase::Debate,
        Phase::Synthesis,
        Phase::Validation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Opening => "opening",
            Phase::Exploration => "exploration",
            Phase::Debate => "debate",
            Phase::Synthesis => "synthesis",
            Phase::Validation => "validation",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Phase::Opening => "Opening",
            Phase::Exploration => "Exploration",
            Phase::Debate => "Debate",
            Phase::Synthesis => "Synthesis",
            Phase::Validation => "Validation",
        }
    }

    /// Goal shown to participants while this phase is in progress.
    pub fn goal(&self) -> &'static str {
        match self {
            Phase::Opening => {
                "Establish a shared understanding of the problem, its constraints and what success looks like."
            }
            Phase::Exploration => {
                "Propose candidate approaches. Favor breadth: add ideas that have not been raised yet."
            }
            Phase::Debate => {
                "Challenge the proposals on the table. Name weaknesses, risks and trade-offs explicitly."
            }
            Phase::Synthesis => {
                "Converge on one recommendation. State the decision, the reasons and the concrete next steps."
            }
            Phase::Validation => {
                "Validate the recommendation against risks and open obligations. Confirm or amend it."
            }
        }
    }

    /// Default number of rounds this phase is expected to take.
    pub fn target_rounds(&self) -> usize {
        match self {
            Phase::Opening => 1,
            Phase::Exploration => 2,
            Phase::Debate => 2,
            Phase::Synthesis => 1,
            Phase::Validation => 1,
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for Phase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "opening" | "understanding" => Ok(Phase::Opening),
            "exploration" | "ideation" => Ok(Phase::Exploration),
            "debate" | "challenge" => Ok(Phase::Debate),
            "synthesis" => Ok(Phase::Synthesis),
            "validation" => Ok(Phase::Validation),
            other => Err(format!("unknown phase '{}'", other)),
        }
    }
}
