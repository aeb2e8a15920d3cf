//! Command-line definition and assembly of the raw invocation.
//!
//! Two flag behaviors need the argument positions clap records, not just the
//! collected values: `--attach-name` applies to the most recent `--attach`
//! before it, and the last of `--secure`/`--tls` wins. Both are derived from
//! `ArgMatches` indices here so the core resolver never sees clap.

use std::path::PathBuf;

use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser};

use mailpost_core::{AttachmentRef, Priority, RawInvocation, Security};

const EXAMPLES: &str = "\
Examples:
  # Simple email
  mailpost --to user@example.com --subject \"Hello\" --text \"Hi there\"

  # With attachment
  mailpost --to user@example.com --subject \"Report\" \\
    --html \"<p>See attached</p>\" --attach ./report.pdf

  # Multiple recipients
  mailpost --to alice@example.com --to bob@example.com \\
    --subject \"Meeting\" --text \"3pm today\"
";

/// Send emails via SMTP.
#[derive(Debug, Parser)]
#[command(name = "mailpost", version, after_help = EXAMPLES)]
pub struct Cli {
    /// Recipient email (can specify multiple)
    #[arg(long, value_name = "EMAIL")]
    pub to: Vec<String>,

    /// CC recipient (can specify multiple)
    #[arg(long, value_name = "EMAIL")]
    pub cc: Vec<String>,

    /// BCC recipient (can specify multiple)
    #[arg(long, value_name = "EMAIL")]
    pub bcc: Vec<String>,

    /// Email subject
    #[arg(long, value_name = "TEXT")]
    pub subject: Option<String>,

    /// Plain text body
    #[arg(long, value_name = "TEXT")]
    pub text: Option<String>,

    /// HTML body (takes precedence over --text)
    #[arg(long, value_name = "HTML")]
    pub html: Option<String>,

    /// Sender email (default: EMAIL_FROM env var)
    #[arg(long, value_name = "EMAIL")]
    pub from: Option<String>,

    /// Reply-to address
    #[arg(long, value_name = "EMAIL")]
    pub reply_to: Option<String>,

    /// SMTP server (default: EMAIL_HOST env var)
    #[arg(long, value_name = "HOST")]
    pub host: Option<String>,

    /// SMTP port (default: EMAIL_PORT or 587)
    #[arg(long, value_name = "PORT")]
    pub port: Option<u16>,

    /// SMTP username (default: EMAIL_USER env var)
    #[arg(long, value_name = "USER")]
    pub user: Option<String>,

    /// SMTP password (default: EMAIL_PASS env var)
    #[arg(long, value_name = "PASS")]
    pub pass: Option<String>,

    /// Attach file (can specify multiple)
    #[arg(long = "attach", value_name = "PATH")]
    pub attach: Vec<PathBuf>,

    /// Custom filename for the last attachment
    #[arg(long = "attach-name", value_name = "NAME")]
    pub attach_name: Vec<String>,

    /// Use SSL/TLS (port 465)
    #[arg(long, overrides_with = "tls")]
    pub secure: bool,

    /// Use STARTTLS (port 587, default)
    #[arg(long, overrides_with = "secure")]
    pub tls: bool,

    /// Email priority (low, normal, high)
    #[arg(long, value_name = "LEVEL")]
    pub priority: Option<Priority>,

    /// Use account from config file (e.g. gmail, qq, work)
    #[arg(long, value_name = "NAME")]
    pub account: Option<String>,

    /// Path to YAML config file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Everything main needs from the command line.
#[derive(Debug)]
pub struct Invocation {
    /// `--config`, if given.
    pub config_path: Option<PathBuf>,
    /// The resolver's input.
    pub raw: RawInvocation,
}

/// Parses `std::env::args`, exiting on usage errors or `--help`.
#[must_use]
pub fn parse() -> Invocation {
    let matches = Cli::command().get_matches();
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|err| err.exit());
    build_invocation(cli, &matches)
}

fn build_invocation(cli: Cli, matches: &ArgMatches) -> Invocation {
    let attachments = pair_attachments(
        cli.attach,
        cli.attach_name,
        &indices(matches, "attach"),
        &indices(matches, "attach_name"),
    );

    // overrides_with already dropped the earlier of the two flags.
    let security = if cli.secure {
        Some(Security::Tls)
    } else if cli.tls {
        Some(Security::StartTls)
    } else {
        None
    };

    Invocation {
        config_path: cli.config,
        raw: RawInvocation {
            to: cli.to,
            cc: cli.cc,
            bcc: cli.bcc,
            subject: cli.subject,
            text: cli.text,
            html: cli.html,
            from: cli.from,
            reply_to: cli.reply_to,
            host: cli.host,
            port: cli.port,
            user: cli.user,
            pass: cli.pass,
            attachments,
            security,
            priority: cli.priority,
            account: cli.account,
        },
    }
}

fn indices(matches: &ArgMatches, id: &str) -> Vec<usize> {
    matches
        .indices_of(id)
        .map(Iterator::collect)
        .unwrap_or_default()
}

/// Pairs `--attach-name` overrides with the most recent `--attach` before
/// each, by argument position. A name before any attachment is a silent
/// no-op (matching long-standing behavior; arguably a usability gap).
fn pair_attachments(
    paths: Vec<PathBuf>,
    names: Vec<String>,
    path_indices: &[usize],
    name_indices: &[usize],
) -> Vec<AttachmentRef> {
    let mut attachments: Vec<AttachmentRef> = paths.into_iter().map(AttachmentRef::new).collect();

    for (name, name_index) in names.into_iter().zip(name_indices) {
        let preceding = path_indices
            .iter()
            .take_while(|path_index| *path_index < name_index)
            .count();
        if let Some(attachment) = preceding.checked_sub(1).and_then(|i| attachments.get_mut(i)) {
            attachment.name = Some(name);
        }
    }

    attachments
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn invocation_from(args: &[&str]) -> Invocation {
        let matches = Cli::command()
            .try_get_matches_from(args)
            .unwrap();
        let cli = Cli::from_arg_matches(&matches).unwrap();
        build_invocation(cli, &matches)
    }

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn repeatable_flags_accumulate() {
        let invocation = invocation_from(&[
            "mailpost", "--to", "a@x.com", "--to", "b@x.com", "--cc", "c@x.com",
        ]);
        assert_eq!(invocation.raw.to, vec!["a@x.com", "b@x.com"]);
        assert_eq!(invocation.raw.cc, vec!["c@x.com"]);
    }

    #[test]
    fn attach_name_applies_to_most_recent_attach() {
        let invocation = invocation_from(&[
            "mailpost",
            "--attach",
            "./a.pdf",
            "--attach-name",
            "first.pdf",
            "--attach",
            "./b.pdf",
        ]);
        let attachments = &invocation.raw.attachments;
        assert_eq!(attachments.len(), 2);
        assert_eq!(attachments[0].name.as_deref(), Some("first.pdf"));
        assert!(attachments[1].name.is_none());
    }

    #[test]
    fn later_attach_name_overwrites_earlier_one() {
        let invocation = invocation_from(&[
            "mailpost",
            "--attach",
            "./a.pdf",
            "--attach-name",
            "first.pdf",
            "--attach-name",
            "second.pdf",
        ]);
        assert_eq!(
            invocation.raw.attachments[0].name.as_deref(),
            Some("second.pdf")
        );
    }

    #[test]
    fn attach_name_before_any_attach_is_a_no_op() {
        let invocation = invocation_from(&[
            "mailpost",
            "--attach-name",
            "orphan.pdf",
            "--attach",
            "./a.pdf",
        ]);
        assert!(invocation.raw.attachments[0].name.is_none());
    }

    #[test]
    fn last_of_secure_and_tls_wins() {
        let invocation = invocation_from(&["mailpost", "--secure", "--tls"]);
        assert_eq!(invocation.raw.security, Some(Security::StartTls));

        let invocation = invocation_from(&["mailpost", "--tls", "--secure"]);
        assert_eq!(invocation.raw.security, Some(Security::Tls));
    }

    #[test]
    fn no_tls_flag_leaves_security_unset() {
        let invocation = invocation_from(&["mailpost"]);
        assert!(invocation.raw.security.is_none());
    }

    #[test]
    fn priority_and_port_parse() {
        let invocation = invocation_from(&[
            "mailpost", "--priority", "high", "--port", "465",
        ]);
        assert_eq!(invocation.raw.priority, Some(Priority::High));
        assert_eq!(invocation.raw.port, Some(465));
    }

    #[test]
    fn port_is_unset_without_the_flag() {
        let invocation = invocation_from(&["mailpost"]);
        assert!(invocation.raw.port.is_none());
    }

    #[test]
    fn invalid_priority_is_rejected() {
        let result = Cli::command().try_get_matches_from(["mailpost", "--priority", "urgent"]);
        assert!(result.is_err());
    }
}
