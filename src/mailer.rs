//!
//! Password-reset delivery collaborator.
//!
//! The core depends only on a success/failure signal plus the list of
//! accepted recipients, expressed by the `ResetDelivery` trait. The real
//! implementation speaks SMTP via `lettre`; when SMTP is not configured
//! the process falls back to logging the reset link, which keeps local
//! development working without a mail relay.

use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

use crate::config::SmtpConfig;
use crate::error::AppError;

/// What the delivery collaborator reports back on success.
#[derive(Debug)]
pub struct DeliveryReceipt {
    /// Recipient addresses the transport accepted.
    pub accepted: Vec<String>,
}

/// Sends a password-reset link out-of-band. Implementations are blocking;
/// callers run them through `web::block`.
pub trait ResetDelivery: Send + Sync {
    fn send_reset(&self, to: &str, link: &str) -> Result<DeliveryReceipt, AppError>;
}

/// SMTP-backed delivery.
pub struct SmtpMailer {
    transport: SmtpTransport,
    from: String,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, AppError> {
        let transport = SmtpTransport::relay(&config.host)
            .map_err(|e| AppError::Internal(format!("Failed to create SMTP transport: {}", e)))?
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .port(config.port)
            .build();

        Ok(Self {
            transport,
            from: config.from.clone(),
        })
    }
}

impl ResetDelivery for SmtpMailer {
    fn send_reset(&self, to: &str, link: &str) -> Result<DeliveryReceipt, AppError> {
        let email = Message::builder()
            .from(
                self.from
                    .parse()
                    .map_err(|e| AppError::Internal(format!("Invalid from address: {}", e)))?,
            )
            .to(to
                .parse()
                .map_err(|e| AppError::Internal(format!("Invalid to address: {}", e)))?)
            .subject("Password reset")
            .header(ContentType::TEXT_PLAIN)
            .body(format!(
                "A password reset was requested for your account.\n\n\
                 Follow this link to choose a new password:\n{}\n\n\
                 If you did not request this, you can ignore this email.",
                link
            ))
            .map_err(|e| AppError::Internal(format!("Failed to build email: {}", e)))?;

        self.transport
            .send(&email)
            .map_err(|e| AppError::Internal(format!("Failed to send email: {}", e)))?;

        Ok(DeliveryReceipt {
            accepted: vec![to.to_string()],
        })
    }
}

/// Development fallback used when SMTP is not configured: the reset link is
/// written to the log instead of being emailed.
pub struct LogMailer;

impl ResetDelivery for LogMailer {
    fn send_reset(&self, to: &str, link: &str) -> Result<DeliveryReceipt, AppError> {
        log::info!("password reset for {}: {}", to, link);
        Ok(DeliveryReceipt {
            accepted: vec![to.to_string()],
        })
    }
}
