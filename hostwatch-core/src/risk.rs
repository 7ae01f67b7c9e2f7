use crate::types::{RiskAssessment, RiskTier, Signals};
use serde::{Deserialize, Serialize};

/// Limits above which a signal contributes to the risk score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskThresholds {
    #[serde(default = "default_failed_login_high")]
    pub failed_login_high: usize,
    #[serde(default = "default_failed_login_medium")]
    pub failed_login_medium: usize,
    #[serde(default = "default_security_updates")]
    pub security_updates: usize,
    #[serde(default)]
    pub failed_services: usize,
}

const fn default_failed_login_high() -> usize {
    10
}

const fn default_failed_login_medium() -> usize {
    5
}

const fn default_security_updates() -> usize {
    5
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            failed_login_high: default_failed_login_high(),
            failed_login_medium: default_failed_login_medium(),
            security_updates: default_security_updates(),
            failed_services: 0,
        }
    }
}

/// One row of the scoring table
struct ScoreRule {
    tier: RiskTier,
    points: u32,
    fires: fn(&Signals, &RiskThresholds) -> bool,
}

/// One row of the recommendation table
struct AdviceRule {
    fires: fn(&Signals, &RiskThresholds) -> bool,
    advice: fn(&Signals) -> String,
}

const SCORE_RULES: &[ScoreRule] = &[
    ScoreRule {
        tier: RiskTier::High,
        points: 3,
        fires: many_failed_logins,
    },
    ScoreRule {
        tier: RiskTier::Medium,
        points: 2,
        fires: some_failed_logins,
    },
    ScoreRule {
        tier: RiskTier::Medium,
        points: 1,
        fires: failed_services,
    },
    ScoreRule {
        tier: RiskTier::Medium,
        points: 2,
        fires: pending_security_updates,
    },
];

/// Recommendations in priority order, gated by the same thresholds as the score
const ADVICE_RULES: &[AdviceRule] = &[
    AdviceRule {
        fires: any_failed_logins,
        advice: immediate_login_advice,
    },
    AdviceRule {
        fires: any_failed_logins,
        advice: login_hardening_advice,
    },
    AdviceRule {
        fires: failed_services,
        advice: failed_service_advice,
    },
    AdviceRule {
        fires: pending_security_updates,
        advice: update_advice,
    },
];

fn many_failed_logins(s: &Signals, t: &RiskThresholds) -> bool {
    s.failed_login_count > t.failed_login_high
}

fn some_failed_logins(s: &Signals, t: &RiskThresholds) -> bool {
    s.failed_login_count > t.failed_login_medium && s.failed_login_count <= t.failed_login_high
}

fn any_failed_logins(s: &Signals, t: &RiskThresholds) -> bool {
    s.failed_login_count > t.failed_login_medium
}

fn failed_services(s: &Signals, t: &RiskThresholds) -> bool {
    s.failed_service_count > t.failed_services
}

fn pending_security_updates(s: &Signals, t: &RiskThresholds) -> bool {
    s.pending_security_updates > t.security_updates
}

fn immediate_login_advice(s: &Signals) -> String {
    format!(
        "URGENT: {} failed login attempts recorded. Review the authentication log now and block the \
         offending source addresses (fail2ban or firewall).",
        s.failed_login_count
    )
}

fn login_hardening_advice(_: &Signals) -> String {
    "Harden authentication: disable SSH password and root logins, restrict SSH to key-based access \
     and rate-limit connection attempts."
        .to_string()
}

fn failed_service_advice(s: &Signals) -> String {
    if s.failed_service_names.is_empty() {
        format!(
            "Investigate {} failed service(s) with 'systemctl --failed' and 'journalctl -u <unit>'.",
            s.failed_service_count
        )
    } else {
        format!(
            "Investigate {} failed service(s): {}. Check 'journalctl -u <unit>' and restart or disable them.",
            s.failed_service_count,
            s.failed_service_names.join(", ")
        )
    }
}

fn update_advice(s: &Signals) -> String {
    format!(
        "Apply {} pending security updates and reboot if the kernel or core libraries changed.",
        s.pending_security_updates
    )
}

const ROUTINE_ADVICE: &str = "No immediate action required. Keep applying updates and review the next scheduled report.";

/// Fixed rule table mapping signals to a tier, a score and recommendations.
///
/// Stateless: classifying the same signals twice gives the same assessment.
#[derive(Debug, Clone, Default)]
pub struct RiskClassifier {
    thresholds: RiskThresholds,
}

impl RiskClassifier {
    pub fn new(thresholds: RiskThresholds) -> Self {
        Self { thresholds }
    }

    pub fn classify(&self, signals: &Signals) -> RiskAssessment {
        let fired: Vec<&ScoreRule> = SCORE_RULES
            .iter()
            .filter(|rule| (rule.fires)(signals, &self.thresholds))
            .collect();

        let score = fired.iter().map(|rule| rule.points).sum();
        let tier = fired.iter().map(|rule| rule.tier).max().unwrap_or(RiskTier::Low);

        let mut recommendations: Vec<String> = ADVICE_RULES
            .iter()
            .filter(|rule| (rule.fires)(signals, &self.thresholds))
            .map(|rule| (rule.advice)(signals))
            .collect();
        if recommendations.is_empty() {
            recommendations.push(ROUTINE_ADVICE.to_string());
        }

        RiskAssessment {
            tier,
            score,
            recommendations,
        }
    }
}
