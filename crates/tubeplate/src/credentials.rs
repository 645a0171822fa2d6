//! Credential manager: hands out usable access tokens for channels.
//!
//! Tokens are stored encrypted. A token expiring within the refresh buffer is
//! renewed through the [`TokenRefresher`]; a revoked grant marks the channel
//! invalid so nothing retries it until the owner reconnects.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use sea_orm::DatabaseConnection;
use tokio::sync::Mutex as AsyncMutex;
use uuid::Uuid;

use crate::crypto::TokenCipher;
use crate::entity::channel;
use crate::entity::token_status::TokenStatus;
use crate::error::{Error, Result};
use crate::oauth::{OAuthError, TokenRefresher, compute_expires_at, token_is_expired};
use crate::platform::VideoPlatform;
use crate::store::channel::{self as channel_store, StoredTokens};

/// Tokens expiring within this many seconds are refreshed before use.
pub const REFRESH_BUFFER_SECS: i64 = 300;

/// Issues valid access tokens and manages channel connections.
#[derive(Clone)]
pub struct CredentialManager {
    db: DatabaseConnection,
    cipher: Arc<dyn TokenCipher>,
    refresher: Arc<dyn TokenRefresher>,
    buffer_secs: i64,
    /// Serializes refreshes per channel so concurrent callers share one grant.
    refresh_locks: Arc<Mutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>>,
}

impl std::fmt::Debug for CredentialManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialManager")
            .field("buffer_secs", &self.buffer_secs)
            .finish_non_exhaustive()
    }
}

impl CredentialManager {
    pub fn new(
        db: DatabaseConnection,
        cipher: Arc<dyn TokenCipher>,
        refresher: Arc<dyn TokenRefresher>,
    ) -> Self {
        Self {
            db,
            cipher,
            refresher,
            buffer_secs: REFRESH_BUFFER_SECS,
            refresh_locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    #[must_use]
    pub fn with_buffer_secs(mut self, buffer_secs: i64) -> Self {
        self.buffer_secs = buffer_secs;
        self
    }

    /// Return a plaintext access token that is valid for at least the buffer.
    ///
    /// # Errors
    /// - [`Error::CredentialInvalid`] if the channel was already invalid, has
    ///   no refresh token, or the provider rejected the grant. The last two
    ///   cases persist `token_status = invalid`.
    /// - [`Error::Transient`] for any other refresh failure; the channel is
    ///   left untouched.
    /// - [`Error::Crypto`] if stored ciphertext cannot be decrypted.
    pub async fn get_valid_access_token(&self, channel: &channel::Model) -> Result<String> {
        if channel.token_status == TokenStatus::Invalid {
            return Err(Error::CredentialInvalid {
                channel_id: channel.id,
            });
        }
        if !token_is_expired(channel.token_expires_at, self.buffer_secs) {
            return Ok(self.cipher.decrypt(&channel.access_token)?);
        }

        let lock = self.refresh_lock(channel.id);
        let result = {
            let _guard = lock.lock().await;
            self.refresh_if_still_expired(channel).await
        };
        self.release_refresh_lock(channel.id, lock);
        result
    }

    async fn refresh_if_still_expired(&self, channel: &channel::Model) -> Result<String> {
        // Another caller may have refreshed while we waited.
        let current = channel_store::find_by_id(&self.db, channel.id)
            .await?
            .ok_or_else(|| Error::not_found(format!("channel {}", channel.id)))?;
        if current.token_status == TokenStatus::Invalid {
            return Err(Error::CredentialInvalid {
                channel_id: current.id,
            });
        }
        if !token_is_expired(current.token_expires_at, self.buffer_secs) {
            return Ok(self.cipher.decrypt(&current.access_token)?);
        }

        self.refresh(&current).await
    }

    async fn refresh(&self, channel: &channel::Model) -> Result<String> {
        let Some(encrypted_refresh) = channel.refresh_token.as_deref() else {
            tracing::warn!(channel_id = %channel.id, "no refresh token stored; marking channel invalid");
            return self.invalidate(channel.id).await;
        };
        let refresh_token = self.cipher.decrypt(encrypted_refresh)?;

        tracing::debug!(channel_id = %channel.id, "refreshing access token");
        let issued_at = Utc::now();
        let grant = match self.refresher.refresh(&refresh_token).await {
            Ok(grant) => grant,
            Err(err) if err.is_invalid_grant() => {
                tracing::warn!(channel_id = %channel.id, error = %err, "refresh grant rejected; marking channel invalid");
                return self.invalidate(channel.id).await;
            }
            Err(err) => {
                tracing::debug!(channel_id = %channel.id, error = %err, "token refresh failed");
                return Err(refresh_failure(err));
            }
        };

        let tokens = StoredTokens {
            access_token: self.cipher.encrypt(&grant.access_token)?,
            refresh_token: grant
                .refresh_token
                .as_deref()
                .map(|t| self.cipher.encrypt(t))
                .transpose()?,
            expires_at: compute_expires_at(issued_at, grant.expires_in),
        };
        channel_store::store_tokens(&self.db, channel.id, tokens).await?;

        Ok(grant.access_token)
    }

    async fn invalidate(&self, channel_id: Uuid) -> Result<String> {
        channel_store::mark_token_invalid(&self.db, channel_id).await?;
        Err(Error::CredentialInvalid { channel_id })
    }

    fn refresh_lock(&self, channel_id: Uuid) -> Arc<AsyncMutex<()>> {
        let mut locks = self
            .refresh_locks
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        Arc::clone(locks.entry(channel_id).or_default())
    }

    /// Drop the map entry once no other caller holds or awaits the lock.
    fn release_refresh_lock(&self, channel_id: Uuid, lock: Arc<AsyncMutex<()>>) {
        let mut locks = self
            .refresh_locks
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        if Arc::strong_count(&lock) == 2
            && locks.get(&channel_id).is_some_and(|held| Arc::ptr_eq(held, &lock))
        {
            locks.remove(&channel_id);
        }
    }

    /// Complete an OAuth authorization and create (or re-validate) the channel.
    ///
    /// The new access token identifies the channel through `platform`; both
    /// tokens are encrypted before they are stored.
    pub async fn connect_channel(
        &self,
        user_id: Uuid,
        code: &str,
        redirect_uri: &str,
        platform: &dyn VideoPlatform,
    ) -> Result<channel::Model> {
        let issued_at = Utc::now();
        let grant = self
            .refresher
            .exchange_code(code, redirect_uri)
            .await
            .map_err(|err| {
                if err.is_invalid_grant() {
                    Error::validation(format!("authorization code rejected: {err}"))
                } else {
                    refresh_failure(err)
                }
            })?;

        let remote = platform.get_own_channel(&grant.access_token).await?;

        let tokens = StoredTokens {
            access_token: self.cipher.encrypt(&grant.access_token)?,
            refresh_token: grant
                .refresh_token
                .as_deref()
                .map(|t| self.cipher.encrypt(t))
                .transpose()?,
            expires_at: compute_expires_at(issued_at, grant.expires_in),
        };
        let channel = channel_store::upsert_connected(&self.db, user_id, &remote, tokens).await?;
        tracing::info!(
            channel_id = %channel.id,
            remote_channel_id = %channel.remote_channel_id,
            "channel connected"
        );
        Ok(channel)
    }

    /// Remove a channel owned by `user_id` together with its videos,
    /// variables, and history.
    pub async fn disconnect_channel(&self, channel_id: Uuid, user_id: Uuid) -> Result<()> {
        let channel = channel_store::find_for_user(&self.db, channel_id, user_id).await?;
        channel_store::delete(&self.db, channel.id).await?;
        self.refresh_locks
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&channel_id);
        tracing::info!(channel_id = %channel_id, "channel disconnected");
        Ok(())
    }
}

/// Map a non-revocation token endpoint failure to a retryable error.
fn refresh_failure(err: OAuthError) -> Error {
    Error::transient(format!("token refresh failed: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_non_revocation_oauth_failure_is_transient() {
        let cases = [
            OAuthError::Timeout("deadline".into()),
            OAuthError::Http("connection reset".into()),
            OAuthError::Server { status: 503 },
            OAuthError::RateLimited,
            OAuthError::Parse("not json".into()),
            OAuthError::google("invalid_client", "bad client"),
        ];
        for err in cases {
            assert!(!err.is_invalid_grant());
            assert!(refresh_failure(err).is_retryable());
        }
    }

    #[test]
    fn revoked_descriptions_count_as_invalid_grant() {
        let err = OAuthError::from_error_response("unauthorized_client", Some("Token has been expired or revoked."));
        assert!(err.is_invalid_grant());
    }

    #[cfg(all(feature = "sqlite", feature = "migrate"))]
    mod refresh_locks {
        use async_trait::async_trait;
        use chrono::Duration;

        use super::*;
        use crate::crypto::AesGcmCipher;
        use crate::oauth::TokenGrant;
        use crate::platform::RemoteChannel;

        struct SlowRefresher;

        #[async_trait]
        impl TokenRefresher for SlowRefresher {
            async fn refresh(&self, _refresh_token: &str) -> std::result::Result<TokenGrant, OAuthError> {
                tokio::time::sleep(std::time::Duration::from_millis(20)).await;
                Ok(TokenGrant {
                    access_token: "fresh".into(),
                    expires_in: Some(3600),
                    refresh_token: None,
                    scope: None,
                    token_type: None,
                })
            }

            async fn exchange_code(
                &self,
                _code: &str,
                _redirect_uri: &str,
            ) -> std::result::Result<TokenGrant, OAuthError> {
                Err(OAuthError::Parse("unused".into()))
            }
        }

        async fn expired_channel(
            db: &DatabaseConnection,
            cipher: &AesGcmCipher,
            remote_channel_id: &str,
        ) -> channel::Model {
            let remote = RemoteChannel {
                remote_channel_id: remote_channel_id.to_string(),
                title: remote_channel_id.to_string(),
                thumbnail_url: None,
                subscriber_count: None,
                uploads_playlist_id: None,
            };
            let tokens = StoredTokens {
                access_token: cipher.encrypt("stale").unwrap(),
                refresh_token: Some(cipher.encrypt("refresh").unwrap()),
                expires_at: Some((Utc::now() - Duration::minutes(1)).fixed_offset()),
            };
            channel_store::upsert_connected(db, Uuid::new_v4(), &remote, tokens)
                .await
                .unwrap()
        }

        #[tokio::test]
        async fn refresh_locks_are_dropped_after_use() {
            let db = crate::connect_and_migrate("sqlite::memory:").await.unwrap();
            let cipher = AesGcmCipher::from_bytes(&[3u8; 32]).unwrap();
            let manager = CredentialManager::new(db.clone(), Arc::new(cipher.clone()), Arc::new(SlowRefresher));

            for i in 0..8 {
                let channel = expired_channel(&db, &cipher, &format!("UCchannel{i:02}")).await;
                let (a, b) = tokio::join!(
                    manager.get_valid_access_token(&channel),
                    manager.get_valid_access_token(&channel),
                );
                assert_eq!(a.unwrap(), "fresh");
                assert_eq!(b.unwrap(), "fresh");
            }

            assert!(manager.refresh_locks.lock().unwrap().is_empty());
        }
    }
}
