//! Decision risk classification and approval gates

pub mod assessor;
pub mod risk;

pub use assessor::{AssessmentInput, KeywordRiskAssessor};
pub use risk::{
    DecisionClassification, MAX_FACTOR_SCORE, MAX_TOTAL_SCORE, RiskFactor, RiskLevel, classify,
};
