//! Transactional email delivery.
//!
//! Two transports implement [`EmailSender`]: [`ResendSender`] posts to the
//! Resend HTTP API and [`SmtpSender`] wraps the `lettre` async SMTP
//! transport. [`EmailConfig::from_env`] picks Resend when `RESEND_API_KEY`
//! is set, SMTP when `SMTP_HOST` is set, and returns `None` otherwise.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    /// SMTP transport-level failure (authentication, connection, etc.).
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// The recipient or sender address could not be parsed.
    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The MIME message could not be assembled.
    #[error("Email build error: {0}")]
    Build(String),

    /// The Resend request failed before a response arrived.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Resend answered with a non-2xx status.
    #[error("Email API returned HTTP {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Email delivery is not configured")]
    NotConfigured,
}

// ---------------------------------------------------------------------------
// Message + trait
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
}

/// A transport able to deliver one message. Returns the provider's message id.
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<String, EmailError>;
}

// ---------------------------------------------------------------------------
// EmailConfig
// ---------------------------------------------------------------------------

/// Default SMTP port (STARTTLS).
const DEFAULT_SMTP_PORT: u16 = 587;

/// Default sender when `EMAIL_FROM` is not set.
const DEFAULT_FROM_ADDRESS: &str = "Studio <noreply@studio.local>";

#[derive(Debug, Clone)]
pub enum EmailTransport {
    Resend {
        api_key: String,
    },
    Smtp {
        host: String,
        port: u16,
        user: Option<String>,
        password: Option<String>,
    },
}

#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub transport: EmailTransport,
    /// RFC 5322 "From" mailbox.
    pub from_address: String,
}

impl EmailConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable         | Default                          |
    /// |------------------|----------------------------------|
    /// | `RESEND_API_KEY` | preferred transport when set     |
    /// | `SMTP_HOST`      | fallback transport when set      |
    /// | `SMTP_PORT`      | `587`                            |
    /// | `SMTP_USER`      | none                             |
    /// | `SMTP_PASSWORD`  | none                             |
    /// | `EMAIL_FROM`     | `Studio <noreply@studio.local>`  |
    pub fn from_env() -> Option<Self> {
        let non_empty = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());

        let transport = if let Some(api_key) = non_empty("RESEND_API_KEY") {
            EmailTransport::Resend { api_key }
        } else {
            EmailTransport::Smtp {
                host: non_empty("SMTP_HOST")?,
                port: non_empty("SMTP_PORT")
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(DEFAULT_SMTP_PORT),
                user: non_empty("SMTP_USER"),
                password: non_empty("SMTP_PASSWORD"),
            }
        };

        Some(Self {
            transport,
            from_address: non_empty("EMAIL_FROM")
                .unwrap_or_else(|| DEFAULT_FROM_ADDRESS.to_string()),
        })
    }

    /// Construct the sender for the configured transport.
    pub fn build_sender(self) -> Result<Arc<dyn EmailSender>, EmailError> {
        Ok(match self.transport {
            EmailTransport::Resend { api_key } => {
                Arc::new(ResendSender::new(api_key, self.from_address)?)
            }
            EmailTransport::Smtp {
                host,
                port,
                user,
                password,
            } => Arc::new(SmtpSender {
                host,
                port,
                credentials: user.zip(password),
                from_address: self.from_address,
            }),
        })
    }
}

// ---------------------------------------------------------------------------
// Resend
// ---------------------------------------------------------------------------

const RESEND_ENDPOINT: &str = "https://api.resend.com/emails";

/// HTTP request timeout for a single send.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct ResendSender {
    client: reqwest::Client,
    api_key: String,
    from_address: String,
    endpoint: String,
}

impl ResendSender {
    pub fn new(api_key: String, from_address: String) -> Result<Self, EmailError> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            api_key,
            from_address,
            endpoint: RESEND_ENDPOINT.to_string(),
        })
    }

    /// JSON body of a Resend `POST /emails` request.
    pub fn payload(&self, email: &OutgoingEmail) -> serde_json::Value {
        serde_json::json!({
            "from": self.from_address,
            "to": email.to,
            "subject": email.subject,
            "html": email.html,
        })
    }
}

#[derive(serde::Deserialize)]
struct ResendResponse {
    id: String,
}

#[async_trait]
impl EmailSender for ResendSender {
    async fn send(&self, email: &OutgoingEmail) -> Result<String, EmailError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&self.payload(email))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "Resend rejected email");
            return Err(EmailError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: ResendResponse = response.json().await?;
        tracing::info!(id = %body.id, recipients = email.to.len(), "Email sent via Resend");
        Ok(body.id)
    }
}

// ---------------------------------------------------------------------------
// SMTP
// ---------------------------------------------------------------------------

pub struct SmtpSender {
    host: String,
    port: u16,
    credentials: Option<(String, String)>,
    from_address: String,
}

impl SmtpSender {
    fn build_message(&self, email: &OutgoingEmail) -> Result<lettre::Message, EmailError> {
        use lettre::message::header::ContentType;

        let mut builder = lettre::Message::builder()
            .from(self.from_address.parse()?)
            .subject(email.subject.clone())
            .header(ContentType::TEXT_HTML);
        for to in &email.to {
            builder = builder.to(to.parse()?);
        }
        builder
            .body(email.html.clone())
            .map_err(|e| EmailError::Build(e.to_string()))
    }
}

#[async_trait]
impl EmailSender for SmtpSender {
    async fn send(&self, email: &OutgoingEmail) -> Result<String, EmailError> {
        use lettre::{
            transport::smtp::authentication::Credentials, AsyncSmtpTransport, AsyncTransport,
            Tokio1Executor,
        };

        let message = self.build_message(email)?;

        let mut transport_builder =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.host)?.port(self.port);
        if let Some((user, pass)) = &self.credentials {
            transport_builder =
                transport_builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        let response = transport_builder.build().send(message).await?;
        tracing::info!(host = %self.host, recipients = email.to.len(), "Email sent via SMTP");
        Ok(response.first_line().unwrap_or("queued").to_string())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
