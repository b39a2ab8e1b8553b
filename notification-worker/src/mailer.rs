//! Outgoing email delivery

use std::path::PathBuf;

use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncFileTransport, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use thiserror::Error;

/// Result type for mail delivery
pub type MailerResult<T> = Result<T, MailerError>;

/// Errors that can occur while building or sending an email
#[derive(Error, Debug)]
pub enum MailerError {
    /// Sender or recipient is not a valid mailbox
    #[error("Invalid address {address}: {reason}")]
    InvalidAddress {
        /// Offending address
        address: String,
        /// Parser message
        reason: String,
    },

    /// Message could not be assembled
    #[error("Failed to build email: {0}")]
    Build(#[from] lettre::error::Error),

    /// Transport rejected or failed to deliver the message
    #[error("Failed to send email: {0}")]
    Transport(String),

    /// Transport could not be set up
    #[error("Mail transport configuration error: {0}")]
    Config(String),
}

/// A plain-text email addressed to one recipient
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    /// Recipient address
    pub to: String,
    /// Subject line
    pub subject: String,
    /// Plain-text body
    pub body: String,
}

/// Capability to deliver a single email
#[async_trait::async_trait]
pub trait Mailer: Send + Sync {
    /// Delivers `email`
    async fn send(&self, email: &Email) -> MailerResult<()>;
}

/// How outgoing email leaves the process
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmailTransportConfig {
    /// SMTP relay with STARTTLS
    Smtp {
        /// Relay host
        host: String,
        /// Relay port
        port: u16,
        /// SMTP username
        username: String,
        /// SMTP password
        password: String,
    },
    /// One `.eml` file per message in `path`
    File {
        /// Output directory, created if missing
        path: PathBuf,
    },
}

enum Transport {
    Smtp(AsyncSmtpTransport<Tokio1Executor>),
    File(AsyncFileTransport<Tokio1Executor>),
}

/// `Mailer` backed by lettre
pub struct LettreMailer {
    transport: Transport,
    from: Mailbox,
}

fn parse_mailbox(address: &str) -> MailerResult<Mailbox> {
    address
        .parse::<Mailbox>()
        .map_err(|e| MailerError::InvalidAddress {
            address: address.to_string(),
            reason: e.to_string(),
        })
}

impl LettreMailer {
    /// Creates a mailer sending as `from` through the configured transport
    ///
    /// # Errors
    ///
    /// Returns `MailerError` if `from` is not a valid mailbox, the SMTP relay
    /// cannot be configured or the output directory cannot be created
    pub fn new(config: &EmailTransportConfig, from: &str) -> MailerResult<Self> {
        let transport = match config {
            EmailTransportConfig::Smtp {
                host,
                port,
                username,
                password,
            } => {
                let smtp = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                    .map_err(|e| MailerError::Config(format!("SMTP relay {host}: {e}")))?
                    .port(*port)
                    .credentials(Credentials::new(username.clone(), password.clone()))
                    .build();
                Transport::Smtp(smtp)
            }
            EmailTransportConfig::File { path } => {
                std::fs::create_dir_all(path).map_err(|e| {
                    MailerError::Config(format!("create {}: {e}", path.display()))
                })?;
                Transport::File(AsyncFileTransport::<Tokio1Executor>::new(path))
            }
        };

        Ok(Self {
            transport,
            from: parse_mailbox(from)?,
        })
    }

    fn message(&self, email: &Email) -> MailerResult<Message> {
        Ok(Message::builder()
            .from(self.from.clone())
            .to(parse_mailbox(&email.to)?)
            .subject(email.subject.as_str())
            .header(ContentType::TEXT_PLAIN)
            .body(email.body.clone())?)
    }
}

#[async_trait::async_trait]
impl Mailer for LettreMailer {
    async fn send(&self, email: &Email) -> MailerResult<()> {
        let message = self.message(email)?;

        match &self.transport {
            Transport::Smtp(smtp) => {
                smtp.send(message)
                    .await
                    .map_err(|e| MailerError::Transport(e.to_string()))?;
            }
            Transport::File(file) => {
                file.send(message)
                    .await
                    .map_err(|e| MailerError::Transport(e.to_string()))?;
            }
        }

        tracing::debug!("Sent email to {}", email.to);
        Ok(())
    }
}
