//! Option resolution: merges CLI flags, an account profile, and environment
//! defaults into one materialized send configuration.
//!
//! Precedence per field, highest wins:
//! 1. explicit CLI flag
//! 2. selected account profile
//! 3. environment default (transport fields only)
//! 4. structural default (port 587 only)

use tracing::debug;

use crate::config::{AccountProfile, ConfigDocument};
use crate::error::{Error, Result};
use crate::options::{AttachmentRef, EnvDefaults, Priority, RawInvocation, Security};

/// Default SMTP submission port, used when no layer supplies one.
pub const DEFAULT_SMTP_PORT: u16 = 587;

/// The single materialized configuration used to perform the send.
///
/// Transport fields stay `Option` here; completeness is the validator's
/// concern, not the resolver's.
#[derive(Debug, Clone, Default)]
pub struct ResolvedConfig {
    /// SMTP server hostname.
    pub host: Option<String>,
    /// SMTP server port.
    pub port: u16,
    /// Transport security mode.
    pub security: Security,
    /// SMTP username.
    pub user: Option<String>,
    /// SMTP password.
    pub pass: Option<String>,
    /// Sender address.
    pub from: Option<String>,
    /// Recipient addresses.
    pub to: Vec<String>,
    /// CC addresses.
    pub cc: Vec<String>,
    /// BCC addresses.
    pub bcc: Vec<String>,
    /// Reply-to address.
    pub reply_to: Option<String>,
    /// Subject line.
    pub subject: Option<String>,
    /// Plain text body.
    pub text: Option<String>,
    /// HTML body. When both bodies are present the HTML one is primary and
    /// the text one is kept as a plain-text fallback.
    pub html: Option<String>,
    /// Message priority.
    pub priority: Option<Priority>,
    /// Attachments.
    pub attachments: Vec<AttachmentRef>,
    /// Name of the account profile that was applied, if any.
    pub account: Option<String>,
}

/// Resolves the final configuration from the three input layers.
///
/// Pure function of its inputs: the environment is captured beforehand into
/// [`EnvDefaults`] and no process state is read here.
///
/// # Errors
///
/// Returns [`Error::AccountNotFound`] when a named selector (or the
/// document's `default`) has no matching entry in a present document, and
/// [`Error::InvalidPort`] when `EMAIL_PORT` is not a port number.
pub fn resolve(
    raw: &RawInvocation,
    env: &EnvDefaults,
    doc: Option<&ConfigDocument>,
) -> Result<ResolvedConfig> {
    let selected = select_account(raw, doc)?;
    if let Some((name, _)) = &selected {
        debug!(account = %name, "applying account profile");
    }
    let profile = selected.as_ref().map(|(_, profile)| *profile);

    let field = |cli: &Option<String>,
                 from_profile: Option<&String>,
                 from_env: &Option<String>| {
        cli.clone()
            .or_else(|| from_profile.cloned())
            .or_else(|| from_env.clone())
    };

    Ok(ResolvedConfig {
        host: field(&raw.host, profile.and_then(|p| p.host.as_ref()), &env.host),
        port: resolve_port(
            raw.port,
            profile.and_then(|p| p.port),
            env.port.as_deref(),
        )?,
        security: raw
            .security
            .or_else(|| {
                profile
                    .and_then(|p| p.secure)
                    .map(Security::from_secure_flag)
            })
            .unwrap_or_default(),
        user: field(&raw.user, profile.and_then(|p| p.user.as_ref()), &env.user),
        pass: field(&raw.pass, profile.and_then(|p| p.pass.as_ref()), &env.pass),
        from: field(&raw.from, profile.and_then(|p| p.from.as_ref()), &env.from),
        to: raw.to.clone(),
        cc: raw.cc.clone(),
        bcc: raw.bcc.clone(),
        reply_to: raw
            .reply_to
            .clone()
            .or_else(|| profile.and_then(|p| p.reply_to.clone())),
        subject: raw.subject.clone(),
        text: raw.text.clone(),
        html: raw.html.clone(),
        priority: raw.priority,
        attachments: raw.attachments.clone(),
        account: selected.map(|(name, _)| name),
    })
}

/// Decides whether an account profile applies to this invocation.
///
/// Explicitly named selectors always apply; the document's `default` applies
/// only when no `--host` was given on the CLI. With no document present, a
/// selector is ignored (no accounts are configured).
fn select_account<'doc>(
    raw: &RawInvocation,
    doc: Option<&'doc ConfigDocument>,
) -> Result<Option<(String, &'doc AccountProfile)>> {
    let Some(doc) = doc else {
        return Ok(None);
    };

    let name = match (&raw.account, &doc.default) {
        (Some(name), _) => name,
        (None, Some(name)) if raw.host.is_none() => name,
        _ => return Ok(None),
    };

    let profile = doc.account(name)?;
    Ok(Some((name.clone(), profile)))
}

fn resolve_port(cli: Option<u16>, profile: Option<u16>, env: Option<&str>) -> Result<u16> {
    if let Some(port) = cli.or(profile) {
        return Ok(port);
    }
    match env {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| Error::InvalidPort(raw.to_string())),
        None => Ok(DEFAULT_SMTP_PORT),
    }
}
