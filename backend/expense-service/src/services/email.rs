/// Email service for sending verification and password reset emails
use lettre::message::{header, Mailbox, Message};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{ApiError, Result};

/// Async email transport wrapper (SMTP or no-op)
#[derive(Clone)]
pub struct EmailService {
    transport: Option<Arc<AsyncSmtpTransport<Tokio1Executor>>>,
    from: Mailbox,
    client_url: String,
}

impl EmailService {
    /// Build the email service from configuration.
    ///
    /// If the SMTP host is empty, operates in no-op mode (logs only).
    /// Useful for development and testing without email infrastructure.
    pub fn new(config: &Config) -> Result<Self> {
        let from = config
            .smtp_from
            .parse::<Mailbox>()
            .map_err(|e| ApiError::Internal(format!("Invalid SMTP_FROM address: {}", e)))?;

        let transport = if config.smtp_host.trim().is_empty() {
            warn!("SMTP host not configured; email service will operate in no-op mode");
            None
        } else {
            let builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
                .map_err(|e| {
                    ApiError::Internal(format!("Failed to configure SMTP transport: {}", e))
                })?
                .port(config.smtp_port);

            let builder = if let (Some(username), Some(password)) =
                (&config.smtp_username, &config.smtp_password)
            {
                builder.credentials(Credentials::new(username.clone(), password.clone()))
            } else {
                builder
            };

            Some(Arc::new(builder.build()))
        };

        Ok(Self {
            transport,
            from,
            client_url: config.client_url.clone(),
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.transport.is_some()
    }

    /// Send the verification email with the activation link.
    pub async fn send_verification_email(
        &self,
        recipient: &str,
        name: &str,
        token: &str,
    ) -> Result<()> {
        let link = format!("{}/verify-email?token={}", self.client_url, token);
        let subject = "Verify Your Email - Expense Tracker";
        let body = format!(
            r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <h2 style="color: #333;">Welcome to Expense Tracker, {name}!</h2>
  <p>Please verify your email address to complete your registration.</p>
  <a href="{link}"
     style="background-color: #007bff; color: white; padding: 12px 24px; text-decoration: none; border-radius: 4px; display: inline-block;">
    Verify Email Address
  </a>
  <p style="margin-top: 20px; color: #666;">
    This link will expire in 1 hour. If you didn't create an account, please ignore this email.
  </p>
</div>"#
        );

        self.send_mail(recipient, subject, body).await
    }

    /// Send the password reset email with the reset link.
    pub async fn send_password_reset_email(
        &self,
        recipient: &str,
        name: &str,
        token: &str,
    ) -> Result<()> {
        let link = format!("{}/reset-password?token={}", self.client_url, token);
        let subject = "Password Reset Request - Expense Tracker";
        let body = format!(
            r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <h2 style="color: #333;">Password Reset Request</h2>
  <p>Hello {name},</p>
  <p>We received a request to reset the password for your Expense Tracker account.</p>
  <a href="{link}"
     style="background-color: #dc3545; color: white; padding: 12px 24px; text-decoration: none; border-radius: 4px; display: inline-block;">
    Reset Password
  </a>
  <p style="margin-top: 20px; color: #666;">
    This reset link will expire in 1 hour. If you didn't request a password reset, please ignore this email.
  </p>
</div>"#
        );

        self.send_mail(recipient, subject, body).await
    }

    async fn send_mail(&self, recipient: &str, subject: &str, html: String) -> Result<()> {
        let Some(transport) = &self.transport else {
            info!(recipient = %recipient, subject = %subject, "email send simulated (SMTP disabled)");
            return Ok(());
        };

        let to = recipient
            .parse::<Mailbox>()
            .map_err(|e| ApiError::Validation(format!("Invalid recipient address: {}", e)))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject)
            .header(header::ContentType::TEXT_HTML)
            .body(html)
            .map_err(|e| ApiError::Internal(format!("Failed to build email: {}", e)))?;

        transport
            .send(message)
            .await
            .map_err(|e| ApiError::Internal(format!("Failed to send email: {}", e)))?;

        info!(recipient = %recipient, subject = %subject, "email sent");
        Ok(())
    }
}
