//! `mailpost` - send a single email over SMTP.
//!
//! One sequential flow per invocation: parse, load the config document,
//! resolve options, validate, dispatch, report. Exit code 0 on a successful
//! send (or `--help`), 1 on any failure.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod cli;

use std::path::Path;
use std::process::ExitCode;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mailpost_core::{
    EnvDefaults, Mailer, default_document_path, load_document, resolve, validate,
};

#[tokio::main]
async fn main() -> ExitCode {
    // Diagnostics go to stderr; stdout is reserved for status lines.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mailpost=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run().await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("\n✗ {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<ExitCode> {
    let invocation = cli::parse();

    let config_path = invocation
        .config_path
        .unwrap_or_else(default_document_path);
    let document = load_document(&config_path)?;

    let env = EnvDefaults::from_env();
    let cfg = resolve(&invocation.raw, &env, document.as_ref())?;
    if let Some(account) = &cfg.account {
        println!("✓ Using account: {account}");
    }

    let report = validate(&cfg, Path::exists);
    if !report.is_empty() {
        eprintln!("Error: Missing required options\n");
        for problem in &report {
            eprintln!("  - {problem}");
        }
        eprintln!("\nRun with --help for usage information");
        return Ok(ExitCode::FAILURE);
    }

    let mailer = Mailer::new(&cfg)?;
    mailer.verify().await?;
    println!("✓ SMTP connection verified");

    let receipt = mailer.dispatch(&cfg).await?;
    println!("✓ Email sent successfully");
    if let Some(message_id) = &receipt.message_id {
        println!("  Message ID: {message_id}");
    }
    println!("  To: {}", cfg.to.join(", "));
    println!("  Subject: {}", cfg.subject.as_deref().unwrap_or_default());
    if !cfg.attachments.is_empty() {
        println!("  Attachments: {}", cfg.attachments.len());
    }

    Ok(ExitCode::SUCCESS)
}
