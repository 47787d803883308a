//! Outbound notification delivery (verification, invite and reset emails).

use askama_escape::{escape, Html};
use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    Message, SmtpTransport, Transport,
};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;

use crate::config::{ResendConfig, SmtpConfig};
use crate::models::EPHEMERAL_TOKEN_TTL_MINUTES;

#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Failed to build message: {0}")]
    Build(String),

    #[error("Transport error: {0}")]
    Transport(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    EmailVerification,
    Invite,
    PasswordReset,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::EmailVerification => "email_verification",
            NotificationKind::Invite => "invite",
            NotificationKind::PasswordReset => "password_reset",
        }
    }

    /// Frontend route the emailed link points at.
    fn path(&self) -> &'static str {
        match self {
            NotificationKind::EmailVerification => "/auth/verify-email",
            NotificationKind::Invite => "/auth/accept-invite",
            NotificationKind::PasswordReset => "/auth/reset-password",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub to: String,
    pub recipient_name: String,
    pub kind: NotificationKind,
    pub link: String,
}

/// Builds the outward links embedded in emails from the configured frontend URL.
#[derive(Debug, Clone)]
pub struct LinkBuilder {
    base_url: String,
}

impl LinkBuilder {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn link(&self, kind: NotificationKind, token: &str) -> String {
        format!("{}{}?token={}", self.base_url, kind.path(), token)
    }
}

struct RenderedEmail {
    subject: &'static str,
    text: String,
    html: String,
}

fn render(notification: &Notification) -> RenderedEmail {
    let (subject, heading, intro, action) = match notification.kind {
        NotificationKind::EmailVerification => (
            "Verify your email",
            "Welcome! Please verify your email",
            "Thank you for registering. Use the link below to verify your email address.",
            "Verify Email",
        ),
        NotificationKind::Invite => (
            "You've been invited!",
            "You've been invited",
            "An administrator has created an account for you. Use the link below to choose a password and activate it.",
            "Accept Invite",
        ),
        NotificationKind::PasswordReset => (
            "Reset your password",
            "Password Reset Request",
            "We received a request to reset your password. Use the link below to set a new password.",
            "Reset Password",
        ),
    };

    let link = &notification.link;
    let name = &notification.recipient_name;
    // Names are caller-supplied; only the HTML part needs escaping
    let html_name = escape(name, Html);

    let html = format!(
        r###"<html>
    <body style="font-family: Arial, sans-serif;">
        <h2>{heading}</h2>
        <p>Hi {html_name},</p>
        <p>{intro}</p>
        <p>
            <a href="{link}" style="background-color: #2196F3; color: white; padding: 14px 20px; text-decoration: none; border-radius: 4px;">
                {action}
            </a>
        </p>
        <p style="color: #666; font-size: 12px;">
            This link will expire in {EPHEMERAL_TOKEN_TTL_MINUTES} minutes. If you didn't request this, please ignore this email.
        </p>
    </body>
</html>"###
    );

    let text = format!(
        "{heading}\n\n\
        Hi {name},\n\n\
        {intro}\n\n\
        {link}\n\n\
        This link will expire in {EPHEMERAL_TOKEN_TTL_MINUTES} minutes. If you didn't request this, please ignore this email."
    );

    RenderedEmail { subject, text, html }
}

#[async_trait]
pub trait NotificationGateway: Send + Sync {
    async fn deliver(&self, notification: &Notification) -> Result<(), NotificationError>;
}

/// SMTP delivery through `lettre`. The transport is blocking, so sends run on
/// the blocking thread pool.
#[derive(Clone)]
pub struct SmtpGateway {
    mailer: SmtpTransport,
    from: Mailbox,
}

impl SmtpGateway {
    pub fn new(config: &SmtpConfig, from: &str, timeout: Duration) -> Result<Self, NotificationError> {
        let creds = Credentials::new(config.user.clone(), config.password.expose_secret().clone());

        let mailer = SmtpTransport::starttls_relay(&config.host)
            .map_err(|e| NotificationError::Transport(e.to_string()))?
            .credentials(creds)
            .port(config.port)
            .timeout(Some(timeout))
            .build();

        let from = from
            .parse::<Mailbox>()
            .map_err(|e| NotificationError::InvalidAddress(e.to_string()))?;

        tracing::info!(host = %config.host, port = config.port, "SMTP notification gateway initialized");

        Ok(Self { mailer, from })
    }
}

#[async_trait]
impl NotificationGateway for SmtpGateway {
    async fn deliver(&self, notification: &Notification) -> Result<(), NotificationError> {
        let rendered = render(notification);
        let to = notification
            .to
            .parse::<Mailbox>()
            .map_err(|e| NotificationError::InvalidAddress(e.to_string()))?;

        let email = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(rendered.subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(rendered.text),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(rendered.html),
                    ),
            )
            .map_err(|e| NotificationError::Build(e.to_string()))?;

        // Send email in blocking thread pool to avoid blocking async runtime
        let mailer = self.mailer.clone();
        tokio::task::spawn_blocking(move || mailer.send(&email))
            .await
            .map_err(|e| NotificationError::Transport(e.to_string()))?
            .map_err(|e| NotificationError::Transport(e.to_string()))?;

        Ok(())
    }
}

#[derive(Serialize)]
struct ResendEmail<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
    text: &'a str,
}

/// Delivery through the Resend HTTP API.
#[derive(Clone)]
pub struct ResendGateway {
    client: reqwest::Client,
    api_url: String,
    api_key: SecretString,
    from: String,
}

impl ResendGateway {
    pub fn new(config: &ResendConfig, from: &str, timeout: Duration) -> Result<Self, NotificationError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NotificationError::Transport(e.to_string()))?;

        tracing::info!(api_url = %config.api_url, "Resend notification gateway initialized");

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            from: from.to_string(),
        })
    }
}

#[async_trait]
impl NotificationGateway for ResendGateway {
    async fn deliver(&self, notification: &Notification) -> Result<(), NotificationError> {
        let rendered = render(notification);
        let body = ResendEmail {
            from: &self.from,
            to: [notification.to.as_str()],
            subject: rendered.subject,
            html: &rendered.html,
            text: &rendered.text,
        };

        let response = self
            .client
            .post(format!("{}/emails", self.api_url))
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| NotificationError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(NotificationError::Transport(format!(
                "Resend API returned {}: {}",
                status, detail
            )));
        }

        Ok(())
    }
}

/// Records deliveries instead of sending them. Can be switched to fail every
/// delivery to exercise error paths.
#[derive(Clone, Default)]
pub struct MockNotificationGateway {
    sent: Arc<Mutex<Vec<Notification>>>,
    failing: Arc<AtomicBool>,
}

impl MockNotificationGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Token from the most recent link of `kind` delivered to `to`.
    pub fn last_token(&self, to: &str, kind: NotificationKind) -> Option<String> {
        self.sent()
            .into_iter()
            .rev()
            .find(|n| n.to == to && n.kind == kind)
            .and_then(|n| n.link.split("token=").nth(1).map(str::to_string))
    }
}

#[async_trait]
impl NotificationGateway for MockNotificationGateway {
    async fn deliver(&self, notification: &Notification) -> Result<(), NotificationError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(NotificationError::Transport("mock gateway set to fail".to_string()));
        }
        self.sent
            .lock()
            .map_err(|_| NotificationError::Transport("mock gateway lock poisoned".to_string()))?
            .push(notification.clone());
        Ok(())
    }
}
