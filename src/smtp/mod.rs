use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::{Credentials, Mechanism};
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("invalid address: {0}")]
    Address(#[from] lettre::address::AddressError),
    #[error("could not build message: {0}")]
    Build(#[from] lettre::error::Error),
    #[error("smtp error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
    #[error("{0}")]
    Provider(String),
}

/// Credentials and endpoint of the mailbox a user sends through.
#[derive(Debug, Clone)]
pub struct SenderAccount {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub body_html: String,
}

/// One authenticated outbound session. A whole batch goes through a single
/// session rather than one connection per message.
#[async_trait]
pub trait MailSession: Send {
    async fn send(&mut self, mail: &OutgoingEmail) -> Result<(), MailError>;
    async fn close(&mut self) -> Result<(), MailError>;
}

#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn connect(&self, account: &SenderAccount) -> Result<Box<dyn MailSession>, MailError>;
}

/// lettre-backed SMTP transport.
pub struct SmtpMailer;

impl SmtpMailer {
    pub fn new() -> Self {
        SmtpMailer
    }
}

impl Default for SmtpMailer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn connect(&self, account: &SenderAccount) -> Result<Box<dyn MailSession>, MailError> {
        // Trim whitespace that may sneak in from copied app passwords
        let clean_password: String = account
            .password
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        let creds = Credentials::new(account.username.trim().to_string(), clean_password);

        let tls_params = TlsParameters::new(account.host.clone())?;
        let tls = if account.port == 465 {
            Tls::Wrapper(tls_params)
        } else {
            Tls::Required(tls_params)
        };

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&account.host)?
            .port(account.port)
            .authentication(vec![Mechanism::Plain, Mechanism::Login])
            .credentials(creds)
            .tls(tls)
            .timeout(Some(Duration::from_secs(20)))
            .build();

        let from: Mailbox = account.username.trim().parse()?;

        Ok(Box::new(SmtpSession { mailer, from }))
    }
}

pub struct SmtpSession {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

#[async_trait]
impl MailSession for SmtpSession {
    async fn send(&mut self, mail: &OutgoingEmail) -> Result<(), MailError> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(mail.to.parse()?)
            .subject(mail.subject.as_str())
            .header(ContentType::TEXT_HTML)
            .body(mail.body_html.clone())?;
        self.mailer.send(message).await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), MailError> {
        // lettre's pooled transport tears the connection down on drop
        tracing::debug!(from = %self.from, "smtp session closed");
        Ok(())
    }
}
