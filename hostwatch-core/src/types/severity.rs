use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse risk classification assigned to one audit run
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl RiskTier {
    /// Label used in report text and mail subjects
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTier::Low => "LOW",
            RiskTier::Medium => "MEDIUM",
            RiskTier::High => "HIGH",
        }
    }
}

impl Default for RiskTier {
    fn default() -> Self {
        RiskTier::Low
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers_order_by_severity() {
        assert!(RiskTier::High > RiskTier::Medium);
        assert!(RiskTier::Medium > RiskTier::Low);
        assert_eq!(
            [RiskTier::Medium, RiskTier::High, RiskTier::Low].iter().max(),
            Some(&RiskTier::High)
        );
    }

    #[test]
    fn tier_serializes_uppercase() {
        let json = serde_json::to_string(&RiskTier::Medium).unwrap();
        assert_eq!(json, "\"MEDIUM\"");
        assert_eq!(RiskTier::High.to_string(), "HIGH");
    }
}
