use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;
use thiserror::Error;
use tracing::*;

/// Name the API credential is stored under.
pub const API_KEY_SECRET_NAME: &str = "openai-api-key";

#[derive(Debug, Error)]
pub enum SecretError {
    #[error("Secret not found: {0}")]
    NotFound(String),

    #[error("Access denied to secret: {0}")]
    AccessDenied(String),

    #[error("Secret {name} unreadable: {reason}")]
    Unreadable { name: String, reason: String },
}

#[async_trait]
pub trait SecretProvider: Send + Sync {
    async fn secret(&self, name: &str) -> Result<String, SecretError>;
}

/// `openai-api-key` is read from `OPENAI_API_KEY`.
pub struct EnvSecretProvider;

pub fn env_var_name(secret_name: &str) -> String {
    secret_name.to_uppercase().replace(['-', '.', '/'], "_")
}

#[async_trait]
impl SecretProvider for EnvSecretProvider {
    async fn secret(&self, name: &str) -> Result<String, SecretError> {
        let var = env_var_name(name);
        match std::env::var(&var) {
            Ok(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
            Ok(_) | Err(std::env::VarError::NotPresent) => Err(SecretError::NotFound(var)),
            Err(std::env::VarError::NotUnicode(_)) => Err(SecretError::Unreadable {
                name: var,
                reason: "not valid unicode".to_string(),
            }),
        }
    }
}

/// One file per secret in a directory, like mounted container secrets.
pub struct FileSecretProvider {
    pub dir: PathBuf,
}

#[async_trait]
impl SecretProvider for FileSecretProvider {
    async fn secret(&self, name: &str) -> Result<String, SecretError> {
        let path = self.dir.join(name);
        match tokio::fs::read_to_string(&path).await {
            Ok(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
            Ok(_) => Err(SecretError::NotFound(path.display().to_string())),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(SecretError::NotFound(path.display().to_string()))
            }
            Err(e) if e.kind() == ErrorKind::PermissionDenied => {
                Err(SecretError::AccessDenied(path.display().to_string()))
            }
            Err(e) => Err(SecretError::Unreadable {
                name: path.display().to_string(),
                reason: e.to_string(),
            }),
        }
    }
}

/// Tries each provider in order. `NotFound` moves on, any other error stops the lookup.
pub struct ChainSecretProvider {
    pub providers: Vec<Box<dyn SecretProvider>>,
}

#[async_trait]
impl SecretProvider for ChainSecretProvider {
    async fn secret(&self, name: &str) -> Result<String, SecretError> {
        for provider in &self.providers {
            match provider.secret(name).await {
                Ok(value) => return Ok(value),
                Err(SecretError::NotFound(location)) => {
                    debug!("secret {} not found in {}", name, location);
                }
                Err(e) => return Err(e),
            }
        }
        Err(SecretError::NotFound(name.to_string()))
    }
}
