//! Invocation inputs: parsed CLI values and environment defaults.

use std::path::PathBuf;
use std::str::FromStr;

/// Transport security mode.
///
/// One conceptual choice behind the `--secure`/`--tls` flag pair: the two
/// are mutually exclusive and always set together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Security {
    /// Implicit TLS (connect directly with TLS, typically port 465).
    Tls,
    /// STARTTLS upgrade after plaintext connect (typically port 587).
    #[default]
    StartTls,
}

impl Security {
    /// Maps a profile's `secure` boolean onto a security mode.
    #[must_use]
    pub const fn from_secure_flag(secure: bool) -> Self {
        if secure { Self::Tls } else { Self::StartTls }
    }
}

/// Message priority level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Priority {
    /// Low priority.
    Low,
    /// Normal priority.
    #[default]
    Normal,
    /// High priority.
    High,
}

impl Priority {
    /// `X-Priority` header value.
    #[must_use]
    pub const fn x_priority(self) -> &'static str {
        match self {
            Self::Low => "5 (Lowest)",
            Self::Normal => "3 (Normal)",
            Self::High => "1 (Highest)",
        }
    }

    /// `Importance` header value.
    #[must_use]
    pub const fn importance(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
        }
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "normal" => Ok(Self::Normal),
            "high" => Ok(Self::High),
            other => Err(format!(
                "invalid priority '{other}' (expected low, normal, or high)"
            )),
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.importance())
    }
}

/// An attachment: filesystem path plus an optional display name override.
///
/// Existence is checked at validation time, not here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentRef {
    /// Path to the file to attach.
    pub path: PathBuf,
    /// Display filename override (`--attach-name`).
    pub name: Option<String>,
}

impl AttachmentRef {
    /// Creates an attachment reference with no name override.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            name: None,
        }
    }

    /// Display filename: the override if set, otherwise the path's file name.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| {
            self.path
                .file_name()
                .map_or_else(|| self.path.display().to_string(), |name| {
                    name.to_string_lossy().into_owned()
                })
        })
    }
}

/// The unprocessed set of CLI flag values, immutable once parsed.
///
/// `None` means the flag was not given; there are no placeholder defaults
/// here. The 587 port fallback is applied during resolution, so an explicit
/// `--port 587` is distinguishable from no `--port` at all.
#[derive(Debug, Clone, Default)]
pub struct RawInvocation {
    /// Recipient addresses (`--to`, repeatable).
    pub to: Vec<String>,
    /// CC addresses (`--cc`, repeatable).
    pub cc: Vec<String>,
    /// BCC addresses (`--bcc`, repeatable).
    pub bcc: Vec<String>,
    /// Subject line.
    pub subject: Option<String>,
    /// Plain text body.
    pub text: Option<String>,
    /// HTML body.
    pub html: Option<String>,
    /// Sender address.
    pub from: Option<String>,
    /// Reply-to address.
    pub reply_to: Option<String>,
    /// SMTP server hostname.
    pub host: Option<String>,
    /// SMTP server port.
    pub port: Option<u16>,
    /// SMTP username.
    pub user: Option<String>,
    /// SMTP password.
    pub pass: Option<String>,
    /// Attachments with display names already paired up.
    pub attachments: Vec<AttachmentRef>,
    /// Security mode, when `--secure` or `--tls` was given.
    pub security: Option<Security>,
    /// Message priority.
    pub priority: Option<Priority>,
    /// Named account selector (`--account`).
    pub account: Option<String>,
}

/// Environment-sourced transport defaults, captured once up front so the
/// resolver stays a pure function of its inputs.
#[derive(Debug, Clone, Default)]
pub struct EnvDefaults {
    /// `EMAIL_HOST`.
    pub host: Option<String>,
    /// `EMAIL_PORT`, unparsed.
    pub port: Option<String>,
    /// `EMAIL_USER`.
    pub user: Option<String>,
    /// `EMAIL_PASS`.
    pub pass: Option<String>,
    /// `EMAIL_FROM`.
    pub from: Option<String>,
}

impl EnvDefaults {
    /// Captures the `EMAIL_*` variables from the process environment.
    ///
    /// Empty values are treated as unset.
    #[must_use]
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|value| !value.is_empty());
        Self {
            host: var("EMAIL_HOST"),
            port: var("EMAIL_PORT"),
            user: var("EMAIL_USER"),
            pass: var("EMAIL_PASS"),
            from: var("EMAIL_FROM"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn priority_parses_case_insensitively() {
        assert_eq!("high".parse::<Priority>().unwrap(), Priority::High);
        assert_eq!("Normal".parse::<Priority>().unwrap(), Priority::Normal);
        assert_eq!("LOW".parse::<Priority>().unwrap(), Priority::Low);
        assert!("urgent".parse::<Priority>().is_err());
    }

    #[test]
    fn priority_header_values() {
        assert_eq!(Priority::High.x_priority(), "1 (Highest)");
        assert_eq!(Priority::Normal.x_priority(), "3 (Normal)");
        assert_eq!(Priority::Low.importance(), "low");
    }

    #[test]
    fn security_from_secure_flag() {
        assert_eq!(Security::from_secure_flag(true), Security::Tls);
        assert_eq!(Security::from_secure_flag(false), Security::StartTls);
    }

    #[test]
    fn default_security_is_starttls() {
        assert_eq!(Security::default(), Security::StartTls);
    }

    #[test]
    fn attachment_display_name_prefers_override() {
        let mut att = AttachmentRef::new("/tmp/report-final.pdf");
        assert_eq!(att.display_name(), "report-final.pdf");
        att.name = Some("report.pdf".to_string());
        assert_eq!(att.display_name(), "report.pdf");
    }
}
