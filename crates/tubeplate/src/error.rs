//! Crate-level error taxonomy.
//!
//! Layer errors (`PlatformError`, `StoreError`, `CryptoError`) convert into
//! [`Error`], which is what the pipeline and job runner reason about.

use sea_orm::DbErr;
use thiserror::Error;
use uuid::Uuid;

use crate::crypto::CryptoError;
use crate::platform::PlatformError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum Error {
    /// Network failure, provider 5xx/429, or similar. Safe to retry.
    #[error("Transient failure: {message}")]
    Transient { message: String },

    /// The channel's OAuth grant is unusable; the user must reconnect.
    #[error("Credentials for channel {channel_id} are invalid; reconnect the channel")]
    CredentialInvalid { channel_id: Uuid },

    #[error("Not found: {resource}")]
    NotFound { resource: String },

    /// Malformed input or a malformed provider response.
    #[error("Validation failed: {message}")]
    Validation { message: String },

    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    /// Stored ciphertext could not be decrypted.
    #[error("Credential decryption failed: {message}")]
    Crypto { message: String },

    /// Another run holds the channel's sync lease.
    #[error("Channel {channel_id} is already being synced")]
    SyncInProgress { channel_id: Uuid },
}

impl Error {
    pub fn transient(message: impl Into<String>) -> Self {
        Self::Transient {
            message: message.into(),
        }
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Whether the failed step may succeed if retried.
    ///
    /// Database errors are retryable only when the connection itself failed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transient { .. } => true,
            Self::Database(err) => matches!(err, DbErr::Conn(_) | DbErr::ConnectionAcquire(_)),
            Self::CredentialInvalid { .. }
            | Self::NotFound { .. }
            | Self::Validation { .. }
            | Self::Crypto { .. }
            | Self::SyncInProgress { .. } => false,
        }
    }

    /// Whether the channel needs to be reconnected by its owner.
    pub fn needs_reconnect(&self) -> bool {
        matches!(self, Self::CredentialInvalid { .. })
    }
}

impl From<PlatformError> for Error {
    fn from(err: PlatformError) -> Self {
        if err.is_transient() {
            return Self::transient(err.to_string());
        }
        match err {
            PlatformError::NotFound { resource } => Self::NotFound { resource },
            PlatformError::AuthRequired => {
                Self::validation("remote API rejected a freshly validated access token")
            }
            other => Self::validation(other.to_string()),
        }
    }
}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Database(e) => Self::Database(e),
            StoreError::NotFound { context } => Self::NotFound { resource: context },
            StoreError::InvalidInput { message } => Self::Validation { message },
        }
    }
}

impl From<CryptoError> for Error {
    fn from(err: CryptoError) -> Self {
        Self::Crypto {
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
