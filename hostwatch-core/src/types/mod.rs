pub mod assessment;
pub mod host;
pub mod report;
pub mod severity;
pub mod signals;

pub use assessment::RiskAssessment;
pub use host::{Cadence, HostProfile, SchedulePolicy};
pub use report::*;
pub use severity::RiskTier;
pub use signals::Signals;
