//! SMTP delivery using lettre

use super::NotificationSender;
use crate::error::{NotificationError, NotificationResult};
use crate::models::{Email, SendResult};
use async_trait::async_trait;
use core_config::{ConfigError, FromEnv, env_optional, env_or_default, env_parse, env_required};
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, MultiPart, SinglePart, header::ContentType},
    transport::smtp::authentication::Credentials,
};

/// SMTP provider configuration
#[derive(Clone, Debug)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    /// `Name <address>` or a bare address.
    pub from: String,
    pub use_tls: bool,
}

impl FromEnv for SmtpConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            host: env_required("SMTP_HOST")?,
            port: env_parse("SMTP_PORT", 587)?,
            username: env_optional("SMTP_USERNAME"),
            password: env_optional("SMTP_PASSWORD"),
            from: env_or_default("EMAIL_FROM", "Todos <noreply@localhost>"),
            use_tls: env_parse("SMTP_USE_TLS", true)?,
        })
    }
}

impl SmtpConfig {
    /// Mailpit/Mailhog on localhost:1025, no auth.
    pub fn mailpit() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 1025,
            username: None,
            password: None,
            from: "Todos <noreply@localhost>".to_string(),
            use_tls: false,
        }
    }
}

pub struct SmtpSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpSender {
    pub fn new(config: SmtpConfig) -> NotificationResult<Self> {
        let from: Mailbox = config
            .from
            .parse()
            .map_err(|e| NotificationError::Config(format!("EMAIL_FROM: {e}")))?;

        let builder = if config.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
                .map_err(|e| NotificationError::Config(e.to_string()))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
        };
        let builder = builder.port(config.port);
        let transport = match (config.username, config.password) {
            (Some(user), Some(pass)) => builder.credentials(Credentials::new(user, pass)).build(),
            _ => builder.build(),
        };

        Ok(Self { transport, from })
    }

    fn build_message(&self, email: &Email) -> NotificationResult<Message> {
        let to: Mailbox = email
            .to
            .mailbox()
            .parse()
            .map_err(|e| NotificationError::InvalidAddress(format!("{}: {e}", email.to.email)))?;

        let builder = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(&email.subject);

        let message = match (&email.body_text, &email.body_html) {
            (Some(text), Some(html)) => builder.multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text.clone()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html.clone()),
                    ),
            ),
            (Some(text), None) => builder.header(ContentType::TEXT_PLAIN).body(text.clone()),
            (None, Some(html)) => builder.header(ContentType::TEXT_HTML).body(html.clone()),
            (None, None) => {
                return Err(NotificationError::Template(
                    "email must have either text or HTML body".to_string(),
                ));
            }
        };

        message.map_err(|e| NotificationError::Template(e.to_string()))
    }
}

#[async_trait]
impl NotificationSender for SmtpSender {
    async fn send(&self, email: &Email) -> NotificationResult<SendResult> {
        let message = self.build_message(email)?;

        let response = self
            .transport
            .send(message)
            .await
            .map_err(|e| NotificationError::Provider(e.to_string()))?;

        let message_id = response
            .message()
            .next()
            .map(|s| s.to_string())
            .unwrap_or_default();

        tracing::info!(to = %email.to.email, subject = %email.subject, "Email sent");

        Ok(SendResult { message_id })
    }

    async fn health_check(&self) -> NotificationResult<()> {
        match self.transport.test_connection().await {
            Ok(true) => Ok(()),
            Ok(false) => Err(NotificationError::Provider(
                "SMTP server refused the connection test".to_string(),
            )),
            Err(e) => Err(NotificationError::Provider(e.to_string())),
        }
    }

    fn name(&self) -> &'static str {
        "smtp"
    }
}
