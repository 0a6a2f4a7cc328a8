//! Mailbox credential resolution.
//!
//! A password can come from three places, checked in this order:
//!
//! 1. **Inline value** in the config file (`passwordInsecure`)
//! 2. **File** holding the secret, e.g. a mounted Docker secret (`passwordFile`)
//! 3. **Environment variable** (`passwordEnvVar`, `GMAIL_APP_PASS` by default)

use std::fs;

use secrecy::SecretString;

use crate::config::ImapSettings;

#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("No secret source configured (need an inline value, a file path, or an env var name)")]
    NoSourceProvided,

    #[error("Failed to read secret from file '{path}': {source}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Environment variable '{name}' not set")]
    EnvVarNotSet { name: String },

    #[error("Environment variable '{name}' contains invalid UTF-8")]
    EnvVarNotUnicode { name: String },
}

pub type Result<T> = std::result::Result<T, SecretError>;

/// Resolves a secret from the first configured, non-empty source.
///
/// A configured source that fails (unreadable file, unset variable) is an
/// error; later sources are not consulted.
pub fn resolve_secret(
    direct: Option<&str>,
    file_path: Option<&str>,
    env_var: Option<&str>,
) -> Result<SecretString> {
    if let Some(value) = direct.filter(|v| !v.is_empty()) {
        return Ok(SecretString::from(value.to_string()));
    }

    if let Some(path) = file_path.filter(|p| !p.is_empty()) {
        let expanded = expand_home(path);
        return fs::read_to_string(&expanded)
            .map(|content| SecretString::from(content.trim().to_string()))
            .map_err(|source| SecretError::FileReadError {
                path: expanded,
                source,
            });
    }

    if let Some(name) = env_var.filter(|n| !n.is_empty()) {
        return match std::env::var(name) {
            Ok(value) => Ok(SecretString::from(value.trim().to_string())),
            Err(std::env::VarError::NotPresent) => Err(SecretError::EnvVarNotSet {
                name: name.to_string(),
            }),
            Err(std::env::VarError::NotUnicode(_)) => Err(SecretError::EnvVarNotUnicode {
                name: name.to_string(),
            }),
        };
    }

    Err(SecretError::NoSourceProvided)
}

/// Resolves the IMAP username: the configured value, else the variable
/// named by `usernameEnvVar`.
pub fn resolve_username(settings: &ImapSettings) -> Result<String> {
    let username = settings.username.trim();
    if !username.is_empty() {
        return Ok(username.to_string());
    }

    let name = settings
        .username_env_var
        .as_deref()
        .filter(|name| !name.is_empty())
        .ok_or(SecretError::NoSourceProvided)?;
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        Ok(_) | Err(std::env::VarError::NotPresent) => Err(SecretError::EnvVarNotSet {
            name: name.to_string(),
        }),
        Err(std::env::VarError::NotUnicode(_)) => Err(SecretError::EnvVarNotUnicode {
            name: name.to_string(),
        }),
    }
}

/// Resolves the IMAP password configured in `settings`.
pub fn resolve_password(settings: &ImapSettings) -> Result<SecretString> {
    if settings.password_insecure.is_some() {
        log::warn!(
            "Using an inline IMAP password (passwordInsecure) is not recommended. \
             Consider passwordEnvVar or passwordFile instead."
        );
    }
    resolve_secret(
        settings.password_insecure.as_deref(),
        settings.password_file.as_deref(),
        settings.password_env_var.as_deref(),
    )
}

/// Expands a leading `~` or `~/` to the current user's home directory.
fn expand_home(path: &str) -> String {
    if path != "~" && !path.starts_with("~/") {
        return path.to_string();
    }
    match std::env::var_os("HOME").or_else(|| std::env::var_os("USERPROFILE")) {
        Some(home) => path.replacen('~', &home.to_string_lossy(), 1),
        None => path.to_string(),
    }
}
