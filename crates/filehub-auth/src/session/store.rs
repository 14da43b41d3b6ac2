//! In-memory session store.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use filehub_entity::user::User;

use crate::token::random_token;

/// How often expired sessions are purged in the background.
pub const REAP_INTERVAL: Duration = Duration::from_secs(3600);

/// A live login session.
#[derive(Debug, Clone)]
pub struct Session {
    /// Opaque identifier carried in the session cookie.
    pub id: String,
    /// The user this session authenticates.
    pub user: User,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// When the session stops being valid.
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Whether the session is past its expiry at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Maps session ids to sessions under a single readers-writer lock.
#[derive(Debug)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
    ttl: chrono::Duration,
}

impl SessionStore {
    /// Creates a store and starts its hourly reaper.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(ttl: Duration) -> Arc<Self> {
        Self::with_reap_interval(ttl, REAP_INTERVAL)
    }

    /// Creates a store whose reaper runs every `interval`.
    pub fn with_reap_interval(ttl: Duration, interval: Duration) -> Arc<Self> {
        let store = Arc::new(Self::detached(ttl));
        super::cleanup::spawn_reaper(Arc::downgrade(&store), interval);
        store
    }

    /// Creates a store with no background reaper.
    pub fn detached(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl: chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::days(36_500)),
        }
    }

    /// Session lifetime.
    pub fn ttl(&self) -> Duration {
        self.ttl.to_std().unwrap_or(Duration::MAX)
    }

    /// Opens a new session for `user`.
    pub async fn create(&self, user: User) -> Session {
        let now = Utc::now();
        let session = Session {
            id: random_token(),
            user,
            created_at: now,
            expires_at: now + self.ttl,
        };
        self.sessions
            .write()
            .await
            .insert(session.id.clone(), session.clone());
        session
    }

    /// Returns the session if it exists and has not expired.
    ///
    /// An expired session found here is removed.
    pub async fn get(&self, id: &str) -> Option<Session> {
        let now = Utc::now();
        {
            let sessions = self.sessions.read().await;
            match sessions.get(id) {
                None => return None,
                Some(session) if !session.is_expired_at(now) => return Some(session.clone()),
                Some(_) => {}
            }
        }

        let mut sessions = self.sessions.write().await;
        // Another writer may have extended it between the two locks.
        match sessions.get(id) {
            Some(session) if !session.is_expired_at(now) => Some(session.clone()),
            Some(_) => {
                sessions.remove(id);
                None
            }
            None => None,
        }
    }

    /// Pushes the expiry of a live session to now + ttl.
    pub async fn extend(&self, id: &str) -> Option<Session> {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(id)?;
        if session.is_expired_at(now) {
            sessions.remove(id);
            return None;
        }
        session.expires_at = now + self.ttl;
        Some(session.clone())
    }

    /// Removes a session. Destroying an unknown id is a no-op.
    pub async fn destroy(&self, id: &str) {
        self.sessions.write().await.remove(id);
    }

    /// Removes every expired session, returning how many were dropped.
    pub async fn reap(&self) -> usize {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired_at(now));
        before - sessions.len()
    }

    /// Number of stored sessions, expired or not.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Whether the store holds no sessions.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
