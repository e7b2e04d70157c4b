// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Secret lookup for the SMTP relay credentials.
//!
//! Credentials come from a [`SecretProvider`] first and fall back to the
//! plain values in [`SmtpConfig`] when the provider has nothing.

use crate::config::{SecretProviderKind, SecretsConfig, SmtpConfig};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum SecretError {
    #[error("Secret not found: {0}")]
    NotFound(String),

    #[error("Failed to read secret {name}: {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Missing SMTP setting {0}: not in secret store or configuration")]
    Missing(&'static str),
}

/// Something that can hand out a named secret.
#[async_trait]
pub trait SecretProvider: Send + Sync {
    async fn get_secret(&self, name: &str) -> Result<String, SecretError>;
}

/// Secrets held in environment variables named after the secret.
#[derive(Debug, Default, Clone)]
pub struct EnvSecretProvider;

#[async_trait]
impl SecretProvider for EnvSecretProvider {
    async fn get_secret(&self, name: &str) -> Result<String, SecretError> {
        match std::env::var(name) {
            Ok(value) if !value.is_empty() => Ok(value),
            _ => Err(SecretError::NotFound(name.to_string())),
        }
    }
}

/// Secrets mounted as one file per secret (Docker / Kubernetes style).
#[derive(Debug, Clone)]
pub struct FileSecretProvider {
    dir: PathBuf,
}

impl FileSecretProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl SecretProvider for FileSecretProvider {
    async fn get_secret(&self, name: &str) -> Result<String, SecretError> {
        // Names are plain identifiers; refuse anything that could leave `dir`.
        if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
            return Err(SecretError::NotFound(name.to_string()));
        }
        let path = self.dir.join(name);
        match tokio::fs::read_to_string(&path).await {
            Ok(value) => {
                let value = value.trim_end_matches(['\r', '\n']).to_string();
                if value.is_empty() {
                    Err(SecretError::NotFound(name.to_string()))
                } else {
                    Ok(value)
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(SecretError::NotFound(name.to_string()))
            }
            Err(source) => Err(SecretError::Io {
                name: name.to_string(),
                source,
            }),
        }
    }
}

/// Build the provider selected in configuration.
pub fn provider_from_config(config: &SecretsConfig) -> Arc<dyn SecretProvider> {
    match config.provider {
        SecretProviderKind::Env => Arc::new(EnvSecretProvider),
        SecretProviderKind::File => Arc::new(FileSecretProvider::new(&config.dir)),
    }
}

/// Resolved relay credentials and destination.
#[derive(Clone)]
pub struct SmtpCredentials {
    pub username: String,
    pub password: String,
    pub recipient: String,
}

impl std::fmt::Debug for SmtpCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("recipient", &self.recipient)
            .finish()
    }
}

/// Resolve username, password and recipient, preferring the secret store.
pub async fn resolve_smtp_credentials(
    provider: &dyn SecretProvider,
    secrets: &SecretsConfig,
    smtp: &SmtpConfig,
) -> Result<SmtpCredentials, SecretError> {
    Ok(SmtpCredentials {
        username: resolve(
            provider,
            &secrets.username_secret,
            smtp.username.as_deref(),
            "username",
        )
        .await?,
        password: resolve(
            provider,
            &secrets.password_secret,
            smtp.password.as_deref(),
            "password",
        )
        .await?,
        recipient: resolve(
            provider,
            &secrets.recipient_secret,
            smtp.recipient.as_deref(),
            "recipient",
        )
        .await?,
    })
}

async fn resolve(
    provider: &dyn SecretProvider,
    secret_name: &str,
    fallback: Option<&str>,
    setting: &'static str,
) -> Result<String, SecretError> {
    match provider.get_secret(secret_name).await {
        Ok(value) => {
            debug!(secret = secret_name, "Loaded SMTP setting from secret store");
            Ok(value)
        }
        Err(err) => match fallback.filter(|v| !v.is_empty()) {
            Some(value) => {
                warn!(secret = secret_name, error = %err, "Secret unavailable, using configured value");
                Ok(value.to_string())
            }
            None => Err(SecretError::Missing(setting)),
        },
    }
}
