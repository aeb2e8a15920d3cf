//! Error types for the core library.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading configuration or resolving options.
#[derive(Debug, Error)]
pub enum Error {
    /// Config document could not be read (anything other than "file absent").
    #[error("Failed to load config file {path}: {source}")]
    ConfigRead {
        /// Path that was being read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Config document exists but is not valid YAML.
    #[error("Failed to load config file {path}: {source}")]
    ConfigParse {
        /// Path that was being parsed.
        path: PathBuf,
        /// Underlying parse error.
        source: serde_yaml::Error,
    },

    /// A named account selector did not match any entry in the document.
    #[error("Account '{0}' not found in config file")]
    AccountNotFound(String),

    /// A port value could not be interpreted as a TCP port number.
    #[error("Invalid port value '{0}'")]
    InvalidPort(String),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
