//! Config document model and loader.
//!
//! Named account profiles live in a YAML document with top-level `accounts`
//! and an optional `default` account name. An absent file is a valid state
//! ("no accounts configured") and is distinct from a malformed one.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};

/// A named, reusable bundle of transport settings from the config document.
///
/// Every field is optional; the resolver only consults fields the profile
/// actually defines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AccountProfile {
    /// SMTP server hostname.
    pub host: Option<String>,
    /// SMTP server port.
    #[serde(default, deserialize_with = "de_port")]
    pub port: Option<u16>,
    /// Username for authentication.
    pub user: Option<String>,
    /// Password for authentication.
    pub pass: Option<String>,
    /// Sender address.
    pub from: Option<String>,
    /// Reply-to address.
    #[serde(rename = "replyTo")]
    pub reply_to: Option<String>,
    /// Implicit TLS when true, STARTTLS when false.
    pub secure: Option<bool>,
}

/// Parsed config document: account profiles plus an optional default name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ConfigDocument {
    /// Named account profiles.
    #[serde(default)]
    pub accounts: HashMap<String, AccountProfile>,
    /// Name of the account to use when none is selected explicitly.
    pub default: Option<String>,
}

impl ConfigDocument {
    /// Looks up a profile by name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AccountNotFound`] if the document has no entry with
    /// that name.
    pub fn account(&self, name: &str) -> Result<&AccountProfile> {
        self.accounts
            .get(name)
            .ok_or_else(|| Error::AccountNotFound(name.to_string()))
    }
}

/// Loads the config document at `path`.
///
/// Returns `Ok(None)` when the file does not exist.
///
/// # Errors
///
/// Returns [`Error::ConfigRead`] for I/O failures other than "not found" and
/// [`Error::ConfigParse`] when the file is not a valid document.
pub fn load_document(path: &Path) -> Result<Option<ConfigDocument>> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no config document found");
            return Ok(None);
        }
        Err(source) => {
            return Err(Error::ConfigRead {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let document: ConfigDocument =
        serde_yaml::from_str(&contents).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;

    debug!(
        path = %path.display(),
        accounts = document.accounts.len(),
        "loaded config document"
    );
    Ok(Some(document))
}

/// Default document location: `email-config.yml` next to the install
/// directory of the running binary.
#[must_use]
pub fn default_document_path() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join("../email-config.yml")))
        .unwrap_or_else(|| PathBuf::from("email-config.yml"))
}

/// Accepts a port as either a YAML number or a quoted string.
fn de_port<'de, D>(deserializer: D) -> std::result::Result<Option<u16>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error as _;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u16),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Number(port)) => Ok(Some(port)),
        Some(Raw::Text(text)) => text
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| D::Error::custom(format!("invalid port value '{text}'"))),
    }
}
