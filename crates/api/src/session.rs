//! Server-side sessions.
//!
//! The cookie only carries an opaque id; the [`Principal`] lives in a
//! [`SessionStore`]. Two stores exist: a process-local map for a single
//! instance and Redis for several instances behind one cookie domain.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use fred::clients::Client as RedisClient;
use fred::interfaces::KeysInterface;
use fred::types::Expiration;
use reelhouse_common::{AppError, AppResult};
use reelhouse_core::Principal;
use tokio::sync::RwLock;
use tracing::debug;

/// Session persistence.
#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    /// The principal behind `id`, or `None` when unknown or expired.
    async fn load(&self, id: &str) -> AppResult<Option<Principal>>;

    /// Store `principal` under `id` for the configured lifetime.
    async fn save(&self, id: &str, principal: &Principal) -> AppResult<()>;

    /// Forget `id`. Unknown ids are not an error.
    async fn destroy(&self, id: &str) -> AppResult<()>;

    /// Drop expired sessions. Returns how many were removed.
    async fn purge_expired(&self) -> AppResult<usize>;
}

#[derive(Debug, Clone)]
struct StoredSession {
    principal: Principal,
    expires_at: DateTime<Utc>,
}

/// In-memory session store.
#[derive(Clone)]
pub struct MemorySessionStore {
    sessions: Arc<RwLock<HashMap<String, StoredSession>>>,
    ttl: chrono::Duration,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl: chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::hours(24)),
        }
    }

    /// Number of sessions held, expired ones included.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Whether no session is held.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, id: &str) -> AppResult<Option<Principal>> {
        let sessions = self.sessions.read().await;
        Ok(sessions
            .get(id)
            .filter(|session| session.expires_at > Utc::now())
            .map(|session| session.principal.clone()))
    }

    async fn save(&self, id: &str, principal: &Principal) -> AppResult<()> {
        let session = StoredSession {
            principal: principal.clone(),
            expires_at: Utc::now() + self.ttl,
        };
        self.sessions.write().await.insert(id.to_string(), session);
        Ok(())
    }

    async fn destroy(&self, id: &str) -> AppResult<()> {
        self.sessions.write().await.remove(id);
        Ok(())
    }

    async fn purge_expired(&self) -> AppResult<usize> {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| session.expires_at > now);
        Ok(before - sessions.len())
    }
}

/// Redis-backed session store. Expiry is left to Redis.
#[derive(Clone)]
pub struct RedisSessionStore {
    redis: Arc<RedisClient>,
    prefix: String,
    ttl_secs: i64,
}

impl RedisSessionStore {
    #[must_use]
    pub fn new(redis: Arc<RedisClient>, prefix: impl Into<String>, ttl: Duration) -> Self {
        Self {
            redis,
            prefix: prefix.into(),
            ttl_secs: ttl.as_secs() as i64,
        }
    }

    fn key(&self, id: &str) -> String {
        format!("{}:{id}", self.prefix)
    }
}

#[async_trait::async_trait]
impl SessionStore for RedisSessionStore {
    async fn load(&self, id: &str) -> AppResult<Option<Principal>> {
        let raw: Option<String> = self
            .redis
            .get(self.key(id))
            .await
            .map_err(|e| AppError::Session(e.to_string()))?;

        match raw {
            Some(json) => serde_json::from_str(&json)
                .map(Some)
                .map_err(|e| AppError::Session(e.to_string())),
            None => Ok(None),
        }
    }

    async fn save(&self, id: &str, principal: &Principal) -> AppResult<()> {
        let json =
            serde_json::to_string(principal).map_err(|e| AppError::Session(e.to_string()))?;

        self.redis
            .set::<(), _, _>(
                self.key(id),
                json,
                Some(Expiration::EX(self.ttl_secs)),
                None,
                false,
            )
            .await
            .map_err(|e| AppError::Session(e.to_string()))?;

        debug!(principal_id = principal.id, "Stored session in Redis");
        Ok(())
    }

    async fn destroy(&self, id: &str) -> AppResult<()> {
        self.redis
            .del::<(), _>(self.key(id))
            .await
            .map_err(|e| AppError::Session(e.to_string()))
    }

    async fn purge_expired(&self) -> AppResult<usize> {
        Ok(0)
    }
}
