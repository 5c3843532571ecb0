use async_trait::async_trait;
use lettre::{
    AsyncFileTransport, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::{
    config::{AppConfig, Env},
    errors::Error,
    models::ContactRequest,
};

// 1. Mailer Contract
/// Mailer
///
/// Defines the abstract contract for relaying contact-form messages. This
/// trait allows us to swap the concrete implementation—from the real SMTP
/// client (ContactMailer) in production to the in-memory Mock (MockMailer)
/// during testing—without affecting the calling handlers.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Relays one contact-form message to the configured recipient.
    /// A single attempt, no retries; the caller decides what a failure means.
    async fn send_contact(&self, msg: &ContactRequest) -> Result<(), Error>;
}

/// MailerState
///
/// The concrete type used to share the mail transport across the application state.
pub type MailerState = Arc<dyn Mailer>;

// 2. The Real Implementation (SMTP / File)
/// ContactMailer
///
/// The concrete implementation using lettre. In production it speaks
/// STARTTLS SMTP to the configured relay; in the local environment it writes
/// each message to a file under `emails_dir`, so no mail server is needed
/// during development.
pub struct ContactMailer {
    transport: EmailTransport,
    mail_from: String,
    recipient: String,
}

enum EmailTransport {
    Smtp(AsyncSmtpTransport<Tokio1Executor>),
    File(AsyncFileTransport<Tokio1Executor>),
}

impl ContactMailer {
    /// new
    ///
    /// Constructs the transport from AppConfig. The environment decides the
    /// transport kind, mirroring the rest of the Local/Production switches.
    pub fn new(config: &AppConfig) -> Result<Self, Error> {
        let transport = match config.env {
            Env::Production => {
                let smtp = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
                    .map_err(|e| Error::Internal {
                        operation: format!("create SMTP transport: {e}"),
                    })?
                    .port(config.smtp_port)
                    .credentials(Credentials::new(
                        config.smtp_username.clone(),
                        config.smtp_password.clone(),
                    ))
                    .build();
                EmailTransport::Smtp(smtp)
            }
            Env::Local => {
                let emails_dir = Path::new(&config.emails_dir);
                if !emails_dir.exists() {
                    std::fs::create_dir_all(emails_dir).map_err(|e| Error::Internal {
                        operation: format!("create emails directory: {e}"),
                    })?;
                }
                EmailTransport::File(AsyncFileTransport::<Tokio1Executor>::new(emails_dir))
            }
        };

        Ok(Self {
            transport,
            mail_from: config.mail_from.clone(),
            recipient: config.contact_recipient.clone(),
        })
    }

    fn contact_body(msg: &ContactRequest) -> String {
        format!(
            "Name: {}\nEmail: {}\nPhone: {}\nMessage:\n{}\n",
            msg.name,
            msg.email,
            msg.phone.as_deref().unwrap_or("-"),
            msg.message
        )
    }
}

#[async_trait]
impl Mailer for ContactMailer {
    async fn send_contact(&self, msg: &ContactRequest) -> Result<(), Error> {
        let from = self.mail_from.parse::<Mailbox>().map_err(|e| Error::Internal {
            operation: format!("parse from address: {e}"),
        })?;
        let to = self.recipient.parse::<Mailbox>().map_err(|e| Error::Internal {
            operation: format!("parse recipient address: {e}"),
        })?;

        let message = Message::builder()
            .from(from)
            .to(to)
            // The visitor's address goes into Reply-To so the blog owner can
            // answer directly without exposing the relay account.
            .reply_to(msg.email.parse::<Mailbox>().map_err(|e| Error::BadRequest {
                message: format!("invalid email address: {e}"),
            })?)
            .subject(format!("New contact form message from {}", msg.name))
            .header(ContentType::TEXT_PLAIN)
            .body(Self::contact_body(msg))
            .map_err(|e| Error::Internal {
                operation: format!("build contact message: {e}"),
            })?;

        match &self.transport {
            EmailTransport::Smtp(smtp) => {
                smtp.send(message).await.map_err(|e| Error::Internal {
                    operation: format!("send SMTP email: {e}"),
                })?;
            }
            EmailTransport::File(file) => {
                file.send(message).await.map_err(|e| Error::Internal {
                    operation: format!("write email file: {e}"),
                })?;
            }
        }

        Ok(())
    }
}

// 3. The Mock Implementation (For Unit Tests)
/// MockMailer
///
/// A mock implementation of `Mailer` used exclusively for unit and
/// integration testing. Records every message it is asked to relay so tests
/// can assert on handler behavior without a network connection.
#[derive(Default)]
pub struct MockMailer {
    /// When true, all sends return a simulated transport failure.
    pub should_fail: bool,
    /// Messages successfully "sent" through this mock.
    pub sent: Mutex<Vec<ContactRequest>>,
}

impl MockMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl Mailer for MockMailer {
    async fn send_contact(&self, msg: &ContactRequest) -> Result<(), Error> {
        if self.should_fail {
            return Err(Error::Internal {
                operation: "send contact email (mock failure requested)".to_string(),
            });
        }

        self.sent
            .lock()
            .expect("mock mailer mutex poisoned")
            .push(msg.clone());
        Ok(())
    }
}
