//! Mail dispatch: builds the message and hands it to the SMTP transport.
//!
//! All protocol, TLS, and MIME work is delegated to lettre; this module only
//! maps a [`ResolvedConfig`] onto lettre's builders. Single-attempt
//! semantics: a transport failure is surfaced verbatim, never retried.

use std::path::PathBuf;
use std::time::Duration;

use lettre::message::header::{ContentType, Header, HeaderName, HeaderValue};
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::debug;

use crate::options::{AttachmentRef, Priority, Security};
use crate::resolve::ResolvedConfig;

/// Timeout applied to transport operations.
const SMTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors that can occur while dispatching a message.
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    /// Connection could not be established or verified.
    #[error("SMTP connection failed: {0}")]
    Connect(String),

    /// The server rejected the message or the transfer failed.
    #[error("Failed to send email: {0}")]
    Send(String),

    /// An address could not be parsed as a mailbox.
    #[error("Invalid address: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The message could not be assembled.
    #[error("Failed to build message: {0}")]
    Message(#[from] lettre::error::Error),

    /// An attachment file could not be read.
    #[error("Failed to read attachment {path}: {source}")]
    Attachment {
        /// Path of the attachment.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// An attachment's guessed content type was not accepted.
    #[error("Invalid attachment content type: {0}")]
    ContentType(#[from] lettre::message::header::ContentTypeErr),
}

/// Proof of delivery: the message id and the server's final reply.
#[derive(Debug, Clone)]
pub struct DeliveryReceipt {
    /// `Message-ID` header of the sent message.
    pub message_id: Option<String>,
    /// Final SMTP reply line.
    pub response: String,
}

/// An SMTP transport configured for one resolved configuration.
pub struct Mailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl Mailer {
    /// Builds the transport for `cfg` (no connection is opened yet).
    ///
    /// # Errors
    ///
    /// Returns [`SendError::Connect`] when the relay builder rejects the
    /// host.
    pub fn new(cfg: &ResolvedConfig) -> Result<Self, SendError> {
        let host = cfg.host.as_deref().unwrap_or_default();
        let builder = match cfg.security {
            Security::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(host),
            Security::StartTls => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host),
        }
        .map_err(|err| SendError::Connect(err.to_string()))?
        .port(cfg.port)
        .timeout(Some(SMTP_TIMEOUT));

        let builder = match (&cfg.user, &cfg.pass) {
            (Some(user), Some(pass)) => {
                builder.credentials(Credentials::new(user.clone(), pass.clone()))
            }
            _ => builder,
        };

        Ok(Self {
            transport: builder.build(),
        })
    }

    /// Opens a connection and checks the server answers, without sending.
    ///
    /// # Errors
    ///
    /// Returns [`SendError::Connect`] when the server is unreachable or does
    /// not accept the session.
    pub async fn verify(&self) -> Result<(), SendError> {
        match self.transport.test_connection().await {
            Ok(true) => Ok(()),
            Ok(false) => Err(SendError::Connect(
                "server did not accept the connection".to_string(),
            )),
            Err(err) => Err(SendError::Connect(err.to_string())),
        }
    }

    /// Builds and transmits the message described by `cfg`.
    ///
    /// # Errors
    ///
    /// Returns [`SendError`] on address, assembly, attachment, or transport
    /// failure. No retry is attempted.
    pub async fn dispatch(&self, cfg: &ResolvedConfig) -> Result<DeliveryReceipt, SendError> {
        let message = build_message(cfg)?;
        let message_id = message
            .headers()
            .get_raw("Message-ID")
            .map(std::borrow::ToOwned::to_owned);

        let response = self
            .transport
            .send(message)
            .await
            .map_err(|err| SendError::Send(err.to_string()))?;

        let detail = response.message().collect::<Vec<_>>().join(" ");
        let response = if detail.is_empty() {
            response.code().to_string()
        } else {
            format!("{} {detail}", response.code())
        };
        debug!(%response, "message accepted");

        Ok(DeliveryReceipt {
            message_id,
            response,
        })
    }
}

/// Assembles the lettre message from a resolved configuration.
fn build_message(cfg: &ResolvedConfig) -> Result<Message, SendError> {
    let mut builder = Message::builder()
        .from(cfg.from.as_deref().unwrap_or_default().parse::<Mailbox>()?)
        .subject(cfg.subject.clone().unwrap_or_default());

    for to in &cfg.to {
        builder = builder.to(to.parse()?);
    }
    for cc in &cfg.cc {
        builder = builder.cc(cc.parse()?);
    }
    for bcc in &cfg.bcc {
        builder = builder.bcc(bcc.parse()?);
    }
    if let Some(reply_to) = &cfg.reply_to {
        builder = builder.reply_to(reply_to.parse()?);
    }
    if let Some(priority) = cfg.priority {
        builder = builder
            .header(XPriority::from(priority))
            .header(Importance::from(priority));
    }

    if cfg.attachments.is_empty() {
        return Ok(match (&cfg.text, &cfg.html) {
            // HTML primary with the text version as plain fallback.
            (Some(text), Some(html)) => builder.multipart(
                MultiPart::alternative_plain_html(text.clone(), html.clone()),
            )?,
            (None, Some(html)) => builder.singlepart(SinglePart::html(html.clone()))?,
            (text, None) => builder.body(text.clone().unwrap_or_default())?,
        });
    }

    let mut mixed = match (&cfg.text, &cfg.html) {
        (Some(text), Some(html)) => MultiPart::mixed().multipart(
            MultiPart::alternative_plain_html(text.clone(), html.clone()),
        ),
        (None, Some(html)) => MultiPart::mixed().singlepart(SinglePart::html(html.clone())),
        (text, None) => {
            MultiPart::mixed().singlepart(SinglePart::plain(text.clone().unwrap_or_default()))
        }
    };
    for attachment in &cfg.attachments {
        mixed = mixed.singlepart(load_attachment(attachment)?);
    }

    Ok(builder.multipart(mixed)?)
}

/// Reads an attachment from disk into a MIME part with a guessed type.
fn load_attachment(attachment: &AttachmentRef) -> Result<SinglePart, SendError> {
    let content = std::fs::read(&attachment.path).map_err(|source| SendError::Attachment {
        path: attachment.path.clone(),
        source,
    })?;
    let mime = mime_guess::from_path(&attachment.path).first_or_octet_stream();
    let content_type = ContentType::parse(mime.essence_str())?;
    Ok(Attachment::new(attachment.display_name()).body(content, content_type))
}

/// `X-Priority` header (1 = highest, 5 = lowest).
#[derive(Debug, Clone)]
struct XPriority(String);

impl From<Priority> for XPriority {
    fn from(priority: Priority) -> Self {
        Self(priority.x_priority().to_string())
    }
}

impl Header for XPriority {
    fn name() -> HeaderName {
        HeaderName::new_from_ascii_str("X-Priority")
    }

    fn parse(s: &str) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        Ok(Self(s.to_string()))
    }

    fn display(&self) -> HeaderValue {
        HeaderValue::new(Self::name(), self.0.clone())
    }
}

/// `Importance` header (high, normal, low).
#[derive(Debug, Clone)]
struct Importance(String);

impl From<Priority> for Importance {
    fn from(priority: Priority) -> Self {
        Self(priority.importance().to_string())
    }
}

impl Header for Importance {
    fn name() -> HeaderName {
        HeaderName::new_from_ascii_str("Importance")
    }

    fn parse(s: &str) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        Ok(Self(s.to_string()))
    }

    fn display(&self) -> HeaderValue {
        HeaderValue::new(Self::name(), self.0.clone())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn base_config() -> ResolvedConfig {
        ResolvedConfig {
            host: Some("smtp.example.com".to_string()),
            port: 587,
            from: Some("f@x.com".to_string()),
            to: vec!["a@x.com".to_string()],
            subject: Some("Hi".to_string()),
            text: Some("Body".to_string()),
            ..ResolvedConfig::default()
        }
    }

    fn rendered(cfg: &ResolvedConfig) -> String {
        let message = build_message(cfg).unwrap();
        String::from_utf8_lossy(&message.formatted()).into_owned()
    }

    #[test]
    fn text_only_message_builds() {
        let out = rendered(&base_config());
        assert!(out.contains("Subject: Hi"));
        assert!(out.contains("Body"));
    }

    #[test]
    fn both_bodies_produce_multipart_alternative() {
        let mut cfg = base_config();
        cfg.html = Some("<p>Body</p>".to_string());
        let out = rendered(&cfg);
        assert!(out.contains("multipart/alternative"));
        assert!(out.contains("text/plain"));
        assert!(out.contains("text/html"));
    }

    #[test]
    fn recipients_and_reply_to_appear_in_headers() {
        let mut cfg = base_config();
        cfg.cc = vec!["c@x.com".to_string()];
        cfg.reply_to = Some("r@x.com".to_string());
        let out = rendered(&cfg);
        assert!(out.contains("To: a@x.com"));
        assert!(out.contains("Cc: c@x.com"));
        assert!(out.contains("Reply-To: r@x.com"));
    }

    #[test]
    fn priority_maps_to_both_headers() {
        let mut cfg = base_config();
        cfg.priority = Some(Priority::High);
        let out = rendered(&cfg);
        assert!(out.contains("X-Priority: 1 (Highest)"));
        assert!(out.contains("Importance: high"));
    }

    #[test]
    fn message_id_is_generated() {
        let message = build_message(&base_config()).unwrap();
        assert!(message.headers().get_raw("Message-ID").is_some());
    }

    #[test]
    fn invalid_recipient_is_an_address_error() {
        let mut cfg = base_config();
        cfg.to = vec!["not-an-address".to_string()];
        assert!(matches!(
            build_message(&cfg).unwrap_err(),
            SendError::Address(_)
        ));
    }

    #[test]
    fn attachment_becomes_a_mixed_part() {
        let mut file = tempfile::Builder::new()
            .suffix(".txt")
            .tempfile()
            .unwrap();
        file.write_all(b"hello").unwrap();

        let mut cfg = base_config();
        cfg.attachments = vec![AttachmentRef {
            path: file.path().to_path_buf(),
            name: Some("notes.txt".to_string()),
        }];

        let out = rendered(&cfg);
        assert!(out.contains("multipart/mixed"));
        assert!(out.contains("notes.txt"));
    }

    #[test]
    fn unreadable_attachment_names_the_path() {
        let mut cfg = base_config();
        cfg.attachments = vec![AttachmentRef::new("./definitely-missing.pdf")];
        let err = build_message(&cfg).unwrap_err();
        assert!(err.to_string().contains("./definitely-missing.pdf"));
    }

    #[tokio::test]
    async fn verify_fails_fast_against_a_closed_port() {
        let mut cfg = base_config();
        cfg.host = Some("127.0.0.1".to_string());
        cfg.port = 1;
        let mailer = Mailer::new(&cfg).unwrap();
        assert!(matches!(
            mailer.verify().await.unwrap_err(),
            SendError::Connect(_)
        ));
    }

    #[test]
    fn mailer_builds_for_both_security_modes() {
        let mut cfg = base_config();
        cfg.user = Some("u".to_string());
        cfg.pass = Some("p".to_string());
        assert!(Mailer::new(&cfg).is_ok());
        cfg.security = Security::Tls;
        cfg.port = 465;
        assert!(Mailer::new(&cfg).is_ok());
    }
}
