//! Decision risk classification.
//!
//! Each factor contributes 0–20 points; the sum is clipped to 100 and
//! mapped to an approval-gate level:
//!
//! | score    | level      |
//! |----------|------------|
//! | 0–20     | `auto`     |
//! | 21–50    | `notify`   |
//! | 51–80    | `confirm`  |
//! | 81–100   | `critical` |

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

pub const MAX_FACTOR_SCORE: u32 = 20;
pub const MAX_TOTAL_SCORE: u32 = 100;

/// One weighted risk factor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskFactor {
    pub name: String,
    pub score: u32,
    pub justification: String,
}

impl RiskFactor {
    pub fn new(name: impl Into<String>, score: u32, justification: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            score,
            justification: justification.into(),
        }
    }

    fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::InvalidRiskFactor {
                name: self.name.clone(),
                reason: "factor name is empty".to_string(),
            });
        }
        if self.score > MAX_FACTOR_SCORE {
            return Err(DomainError::InvalidRiskFactor {
                name: self.name.clone(),
                reason: format!("score {} exceeds {}", self.score, MAX_FACTOR_SCORE),
            });
        }
        Ok(())
    }
}

/// Approval gate for a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    /// Apply without asking
    Auto,
    /// Apply and tell the owner
    Notify,
    /// Ask the owner first
    Confirm,
    /// Requires explicit sign-off and review
    Critical,
}

impl RiskLevel {
    pub fn from_score(score: u32) -> Self {
        match score {
            0..=20 => RiskLevel::Auto,
            21..=50 => RiskLevel::Notify,
            51..=80 => RiskLevel::Confirm,
            _ => RiskLevel::Critical,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Auto => "auto",
            RiskLevel::Notify => "notify",
            RiskLevel::Confirm => "confirm",
            RiskLevel::Critical => "critical",
        }
    }

    pub fn requires_approval(&self) -> bool {
        matches!(self, RiskLevel::Confirm | RiskLevel::Critical)
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionClassification {
    pub factors: Vec<RiskFactor>,
    pub score: u32,
    pub level: RiskLevel,
}

/// Classify a decision from its risk factors.
///
/// Pure and deterministic; safe to call repeatedly for previews.
pub fn classify(factors: &[RiskFactor]) -> Result<DecisionClassification, DomainError> {
    for factor in factors {
        factor.validate()?;
    }

    let score = factors
        .iter()
        .map(|f| f.score)
        .sum::<u32>()
        .min(MAX_TOTAL_SCORE);

    Ok(DecisionClassification {
        factors: factors.to_vec(),
        score,
        level: RiskLevel::from_score(score),
    })
}
