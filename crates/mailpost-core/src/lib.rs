//! # mailpost-core
//!
//! Core logic for the `mailpost` CLI: one-shot SMTP email sending.
//!
//! This crate provides:
//! - The config document model and loader (named account profiles in YAML)
//! - Option resolution (CLI flags over account profile over environment
//!   defaults, per field)
//! - Validation of the resolved configuration
//! - Mail dispatch through lettre
//!
//! Control flow per invocation: resolve, validate, dispatch, each exactly
//! once. No state survives the run.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod config;
mod error;
pub mod options;
pub mod resolve;
pub mod send;
pub mod validate;

pub use config::{AccountProfile, ConfigDocument, default_document_path, load_document};
pub use error::{Error, Result};
pub use options::{AttachmentRef, EnvDefaults, Priority, RawInvocation, Security};
pub use resolve::{DEFAULT_SMTP_PORT, ResolvedConfig, resolve};
pub use send::{DeliveryReceipt, Mailer, SendError};
pub use validate::{Problem, ValidationReport, validate};
