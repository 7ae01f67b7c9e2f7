use crate::config::SmtpConfig;
use crate::error::{AuditError, Result};
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport as _};

/// Destination for finished reports.
///
/// Delivery is fire-and-forget for the caller: a failure is logged as a
/// warning and the archived artifacts stay on disk.
pub trait ReportSink {
    fn deliver(&self, recipient: &str, subject: &str, body: &str) -> Result<()>;

    fn name(&self) -> &str;
}

/// Mails reports through an SMTP relay
pub struct SmtpSink {
    config: SmtpConfig,
}

impl SmtpSink {
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }

    /// Build the plain-text message for one report
    fn build_message(&self, recipient: &str, subject: &str, body: &str) -> Result<Message> {
        let from: Mailbox = self
            .config
            .from
            .parse()
            .map_err(|e| AuditError::Delivery(format!("invalid sender '{}': {}", self.config.from, e)))?;
        let to: Mailbox = recipient
            .parse()
            .map_err(|e| AuditError::Delivery(format!("invalid recipient '{}': {}", recipient, e)))?;

        Message::builder()
            .from(from)
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| AuditError::Delivery(format!("failed to build message: {}", e)))
    }

    /// Get SMTP transport
    fn get_transport(&self) -> Result<SmtpTransport> {
        let builder = if self.config.starttls {
            SmtpTransport::starttls_relay(&self.config.server)
                .map_err(|e| AuditError::Delivery(format!("invalid SMTP relay '{}': {}", self.config.server, e)))?
        } else {
            SmtpTransport::builder_dangerous(&self.config.server)
        };

        let builder = builder.port(self.config.port);
        let builder = match (&self.config.username, &self.config.password) {
            (Some(user), Some(pass)) if !user.is_empty() => {
                builder.credentials(Credentials::new(user.clone(), pass.clone()))
            }
            _ => builder,
        };

        Ok(builder.build())
    }
}

impl ReportSink for SmtpSink {
    fn deliver(&self, recipient: &str, subject: &str, body: &str) -> Result<()> {
        let message = self.build_message(recipient, subject, body)?;
        let transport = self.get_transport()?;

        transport
            .send(&message)
            .map_err(|e| AuditError::Delivery(format!("SMTP send to {} failed: {}", recipient, e)))?;

        tracing::info!(%recipient, %subject, "report delivered");
        Ok(())
    }

    fn name(&self) -> &str {
        "smtp"
    }
}

/// Sink that discards reports, for runs with delivery turned off
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl ReportSink for NullSink {
    fn deliver(&self, recipient: &str, subject: &str, _body: &str) -> Result<()> {
        tracing::debug!(%recipient, %subject, "delivery disabled, report not sent");
        Ok(())
    }

    fn name(&self) -> &str {
        "none"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sink() -> SmtpSink {
        SmtpSink::new(SmtpConfig {
            server: "smtp.example.com".to_string(),
            port: 587,
            from: "hostwatch@example.com".to_string(),
            starttls: true,
            username: Some("audit".to_string()),
            password: Some("secret".to_string()),
        })
    }

    #[test]
    fn builds_plain_text_message() {
        let message = sink()
            .build_message("ops@example.com", "[hostwatch] web1: HIGH", "Risk level: HIGH")
            .unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();

        assert!(raw.contains("To: ops@example.com"));
        assert!(raw.contains("Subject: [hostwatch] web1: HIGH"));
        assert!(raw.contains("Risk level: HIGH"));
    }

    #[test]
    fn invalid_recipient_is_delivery_error() {
        let err = sink().build_message("not an address", "s", "b").unwrap_err();
        assert!(matches!(err, AuditError::Delivery(_)));
    }

    #[test]
    fn transport_builds_without_connecting() {
        assert!(sink().get_transport().is_ok());
        assert_eq!(sink().name(), "smtp");
    }

    #[test]
    fn null_sink_accepts_everything() {
        assert!(NullSink.deliver("anyone", "subject", "body").is_ok());
    }
}
