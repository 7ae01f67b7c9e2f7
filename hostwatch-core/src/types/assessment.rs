use serde::{Deserialize, Serialize};
use super::RiskTier;

/// Outcome of classifying one set of signals
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub tier: RiskTier,

    /// Sum of the contributions of every rule that fired
    pub score: u32,

    /// Recommendations, highest priority first
    pub recommendations: Vec<String>,
}

impl RiskAssessment {
    /// Recommendations prefixed with their position ("1. ...")
    pub fn numbered(&self) -> Vec<String> {
        self.recommendations
            .iter()
            .enumerate()
            .map(|(i, r)| format!("{}. {}", i + 1, r))
            .collect()
    }
}
