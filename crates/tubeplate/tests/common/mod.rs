//! Fixtures shared by the integration tests: an in-memory database, an
//! in-memory video platform, and a scripted token refresher.

#![allow(dead_code)]

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use sea_orm::DatabaseConnection;
use tubeplate::connect_and_migrate;
use tubeplate::credentials::CredentialManager;
use tubeplate::crypto::{AesGcmCipher, TokenCipher};
use tubeplate::entity::channel;
use tubeplate::oauth::{OAuthError, TokenGrant, TokenRefresher};
use tubeplate::platform::{
    PlatformError, RemoteChannel, RemoteVideo, Result as PlatformResult, UploadsPage,
    VideoPlatform,
};
use tubeplate::retry::RetryConfig;
use tubeplate::store::channel::{self as channel_store, StoredTokens};
use tubeplate::sync::{SyncContext, SyncOptions};
use uuid::Uuid;

pub const REMOTE_CHANNEL_ID: &str = "UCtubeplate0000000000000";
pub const ACCESS_TOKEN: &str = "ya29.stored-access";
pub const REFRESH_TOKEN: &str = "1//stored-refresh";

pub async fn setup_db() -> DatabaseConnection {
    connect_and_migrate("sqlite::memory:")
        .await
        .expect("Failed to create test database")
}

pub fn cipher() -> Arc<AesGcmCipher> {
    Arc::new(AesGcmCipher::from_bytes(&[7u8; 32]).expect("32-byte key"))
}

pub fn remote_channel() -> RemoteChannel {
    RemoteChannel {
        remote_channel_id: REMOTE_CHANNEL_ID.to_string(),
        title: "Tubeplate Test Channel".to_string(),
        thumbnail_url: Some("https://yt3.example/thumb.jpg".to_string()),
        subscriber_count: Some(1200),
        uploads_playlist_id: Some("UUtubeplate0000000000000".to_string()),
    }
}

pub fn published(day: u32) -> Option<DateTime<Utc>> {
    Utc.with_ymd_and_hms(2026, 5, day, 12, 0, 0).single()
}

pub fn remote_video(id: &str, title: &str) -> RemoteVideo {
    RemoteVideo {
        remote_video_id: id.to_string(),
        title: title.to_string(),
        description: Some(format!("original description of {id}")),
        published_at: published(1),
    }
}

/// Store a connected channel whose access token expires `expires_in` from now.
pub async fn seed_channel(
    db: &DatabaseConnection,
    user_id: Uuid,
    expires_in: ChronoDuration,
    refresh_token: Option<&str>,
) -> channel::Model {
    let cipher = cipher();
    let tokens = StoredTokens {
        access_token: cipher.encrypt(ACCESS_TOKEN).expect("encrypt access"),
        refresh_token: refresh_token.map(|t| cipher.encrypt(t).expect("encrypt refresh")),
        expires_at: Some((Utc::now() + expires_in).fixed_offset()),
    };
    channel_store::upsert_connected(db, user_id, &remote_channel(), tokens)
        .await
        .expect("seed channel")
}

pub fn credentials(db: &DatabaseConnection, refresher: Arc<FakeRefresher>) -> CredentialManager {
    CredentialManager::new(db.clone(), cipher(), refresher)
}

pub fn context(
    db: &DatabaseConnection,
    platform: FakePlatform,
    refresher: Arc<FakeRefresher>,
) -> SyncContext<FakePlatform> {
    SyncContext::new(db.clone(), credentials(db, refresher), platform).with_options(SyncOptions {
        retry: RetryConfig::none(),
        ..SyncOptions::default()
    })
}

// ─── Fake Platform ───────────────────────────────────────────────────────────

#[derive(Default)]
struct PlatformState {
    channel: Option<RemoteChannel>,
    catalog: Vec<RemoteVideo>,
    failing_updates: HashSet<String>,
    fail_listing: bool,
    fail_channel_lookup: bool,
    updates: Vec<(String, String, String)>,
    update_calls: Vec<UpdateCall>,
    page_requests: Vec<Option<String>>,
}

/// Start and end of one `update_description` call, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateCall {
    Started(String),
    Finished(String),
}

/// In-memory remote catalog with instrumentation.
#[derive(Clone)]
pub struct FakePlatform {
    state: Arc<Mutex<PlatformState>>,
    page_size: usize,
    update_delay: Duration,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl FakePlatform {
    pub fn new(catalog: Vec<RemoteVideo>) -> Self {
        let state = PlatformState {
            channel: Some(remote_channel()),
            catalog,
            ..Default::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
            page_size: 50,
            update_delay: Duration::ZERO,
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_update_delay(mut self, delay: Duration) -> Self {
        self.update_delay = delay;
        self
    }

    fn state(&self) -> std::sync::MutexGuard<'_, PlatformState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn set_catalog(&self, catalog: Vec<RemoteVideo>) {
        self.state().catalog = catalog;
    }

    pub fn fail_updates_for(&self, remote_video_id: &str) {
        self.state().failing_updates.insert(remote_video_id.to_string());
    }

    pub fn fail_listing(&self) {
        self.state().fail_listing = true;
    }

    pub fn fail_channel_lookup(&self) {
        self.state().fail_channel_lookup = true;
    }

    /// Make the token authenticate as a different channel.
    pub fn set_channel_id(&self, remote_channel_id: &str) {
        if let Some(channel) = self.state().channel.as_mut() {
            channel.remote_channel_id = remote_channel_id.to_string();
        }
    }

    /// `(access_token, remote_video_id, description)` for every successful update.
    pub fn updates(&self) -> Vec<(String, String, String)> {
        self.state().updates.clone()
    }

    pub fn update_calls(&self) -> Vec<UpdateCall> {
        self.state().update_calls.clone()
    }

    pub fn page_requests(&self) -> Vec<Option<String>> {
        self.state().page_requests.clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VideoPlatform for FakePlatform {
    async fn get_own_channel(&self, _access_token: &str) -> PlatformResult<RemoteChannel> {
        let state = self.state();
        if state.fail_channel_lookup {
            return Err(PlatformError::network("channel lookup unavailable"));
        }
        state
            .channel
            .clone()
            .ok_or_else(|| PlatformError::not_found("channel"))
    }

    async fn list_uploads_page(
        &self,
        _access_token: &str,
        _playlist_id: &str,
        page_token: Option<&str>,
    ) -> PlatformResult<UploadsPage> {
        let mut state = self.state();
        state.page_requests.push(page_token.map(str::to_string));
        if state.fail_listing {
            return Err(PlatformError::api(503, "backend error"));
        }

        let start: usize = page_token.map_or(0, |t| t.parse().unwrap_or(0));
        let end = (start + self.page_size).min(state.catalog.len());
        let videos = state.catalog[start..end].to_vec();
        let next_page_token = (end < state.catalog.len()).then(|| end.to_string());
        Ok(UploadsPage {
            videos,
            next_page_token,
        })
    }

    async fn update_description(
        &self,
        access_token: &str,
        remote_video_id: &str,
        description: &str,
    ) -> PlatformResult<()> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        self.state()
            .update_calls
            .push(UpdateCall::Started(remote_video_id.to_string()));

        if !self.update_delay.is_zero() {
            tokio::time::sleep(self.update_delay).await;
        }

        let result = {
            let mut state = self.state();
            if state.failing_updates.contains(remote_video_id) {
                Err(PlatformError::api(400, "invalidDescription"))
            } else {
                state.updates.push((
                    access_token.to_string(),
                    remote_video_id.to_string(),
                    description.to_string(),
                ));
                Ok(())
            }
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.state()
            .update_calls
            .push(UpdateCall::Finished(remote_video_id.to_string()));
        result
    }
}

// ─── Fake Refresher ──────────────────────────────────────────────────────────

/// Token refresher that replays scripted outcomes and counts calls.
#[derive(Default)]
pub struct FakeRefresher {
    outcomes: Mutex<VecDeque<Result<TokenGrant, OAuthError>>>,
    refresh_calls: AtomicUsize,
    exchange_calls: AtomicUsize,
}

impl FakeRefresher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push(&self, outcome: Result<TokenGrant, OAuthError>) {
        self.outcomes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(outcome);
    }

    pub fn push_grant(&self, access_token: &str, refresh_token: Option<&str>) {
        self.push(Ok(grant(access_token, refresh_token)));
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn exchange_calls(&self) -> usize {
        self.exchange_calls.load(Ordering::SeqCst)
    }

    fn next(&self) -> Result<TokenGrant, OAuthError> {
        self.outcomes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .unwrap_or_else(|| Err(OAuthError::Http("no scripted outcome".to_string())))
    }
}

pub fn grant(access_token: &str, refresh_token: Option<&str>) -> TokenGrant {
    TokenGrant {
        access_token: access_token.to_string(),
        expires_in: Some(3600),
        refresh_token: refresh_token.map(str::to_string),
        scope: None,
        token_type: Some("Bearer".to_string()),
    }
}

#[async_trait]
impl TokenRefresher for FakeRefresher {
    async fn refresh(&self, _refresh_token: &str) -> Result<TokenGrant, OAuthError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        self.next()
    }

    async fn exchange_code(
        &self,
        _code: &str,
        _redirect_uri: &str,
    ) -> Result<TokenGrant, OAuthError> {
        self.exchange_calls.fetch_add(1, Ordering::SeqCst);
        self.next()
    }
}
