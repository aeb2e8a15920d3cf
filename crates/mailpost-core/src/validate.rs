//! Validation of a resolved configuration.
//!
//! All checks run and all problems are collected before returning, so the
//! caller can present the complete list in one pass. The order is fixed for
//! reproducible output.

use std::path::{Path, PathBuf};

use crate::resolve::ResolvedConfig;

/// A single validation problem, in user-facing terms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Problem {
    /// No recipient was given.
    NoRecipients,
    /// No subject was given.
    NoSubject,
    /// Neither a text nor an HTML body was given.
    NoBody,
    /// No SMTP host resolved.
    NoHost,
    /// No SMTP user resolved.
    NoUser,
    /// No SMTP password resolved.
    NoPassword,
    /// No sender address resolved.
    NoFrom,
    /// An attachment path does not exist.
    AttachmentNotFound(PathBuf),
}

impl std::fmt::Display for Problem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoRecipients => f.write_str("At least one recipient (--to) is required"),
            Self::NoSubject => f.write_str("Subject (--subject) is required"),
            Self::NoBody => f.write_str("Either --text or --html is required"),
            Self::NoHost => f.write_str("SMTP host is required (--host or EMAIL_HOST env var)"),
            Self::NoUser => f.write_str("SMTP user is required (--user or EMAIL_USER env var)"),
            Self::NoPassword => {
                f.write_str("SMTP password is required (--pass or EMAIL_PASS env var)")
            }
            Self::NoFrom => {
                f.write_str("From address is required (--from or EMAIL_FROM env var)")
            }
            Self::AttachmentNotFound(path) => {
                write!(f, "Attachment not found: {}", path.display())
            }
        }
    }
}

/// Ordered list of problems; empty means the config is safe to dispatch.
pub type ValidationReport = Vec<Problem>;

/// Checks a resolved configuration for completeness and local consistency.
///
/// The existence check is injected so callers (and tests) control filesystem
/// access; production callers pass [`Path::exists`].
#[must_use]
pub fn validate<F>(cfg: &ResolvedConfig, file_exists: F) -> ValidationReport
where
    F: Fn(&Path) -> bool,
{
    let mut report = ValidationReport::new();

    if cfg.to.is_empty() {
        report.push(Problem::NoRecipients);
    }
    if cfg.subject.as_deref().is_none_or(str::is_empty) {
        report.push(Problem::NoSubject);
    }
    if cfg.text.is_none() && cfg.html.is_none() {
        report.push(Problem::NoBody);
    }
    if cfg.host.as_deref().is_none_or(str::is_empty) {
        report.push(Problem::NoHost);
    }
    if cfg.user.as_deref().is_none_or(str::is_empty) {
        report.push(Problem::NoUser);
    }
    if cfg.pass.as_deref().is_none_or(str::is_empty) {
        report.push(Problem::NoPassword);
    }
    if cfg.from.as_deref().is_none_or(str::is_empty) {
        report.push(Problem::NoFrom);
    }
    for attachment in &cfg.attachments {
        if !file_exists(&attachment.path) {
            report.push(Problem::AttachmentNotFound(attachment.path.clone()));
        }
    }

    report
}
