use std::io;
use thiserror::Error;

/// Errors raised by the audit engine.
///
/// Probe and delivery failures are recovered close to where they happen;
/// only configuration, storage and I/O errors end the requested operation.
#[derive(Debug, Error)]
pub enum AuditError {
    /// Missing or invalid host entry, schedule or setting
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A probe command failed or its transport could not run it
    #[error("probe execution failed: {0}")]
    ProbeExecution(String),

    /// The report sink rejected or could not send a report
    #[error("report delivery failed: {0}")]
    Delivery(String),

    /// The trigger store could not be read or rewritten
    #[error("trigger store error: {0}")]
    Store(String),

    /// An archived report could not be parsed
    #[error("malformed audit report: {0}")]
    MalformedReport(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl AuditError {
    pub fn config(message: impl Into<String>) -> Self {
        AuditError::Configuration(message.into())
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, AuditError::Configuration(_))
    }
}

pub type Result<T> = std::result::Result<T, AuditError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = AuditError::config("unknown host 'db9'");
        assert_eq!(err.to_string(), "configuration error: unknown host 'db9'");
        assert!(err.is_configuration());

        let err = AuditError::Delivery("connection refused".to_string());
        assert_eq!(err.to_string(), "report delivery failed: connection refused");
        assert!(!err.is_configuration());
    }
}
