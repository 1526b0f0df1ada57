//! Per-upload session state.
//!
//! Each browser session gets its own roster table and calendar listing;
//! nothing roster-related is shared between sessions. Sessions expire
//! after an idle TTL and are purged whenever a new one is created.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use shiftcal_core::RosterTable;
use shiftcal_providers::CalendarInfo;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;
use uuid::Uuid;

/// Opaque session identifier (a random UUID).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// What one session has uploaded and looked up so far.
#[derive(Debug, Clone)]
pub struct Session {
    pub roster: Option<Arc<RosterTable>>,
    /// The provider's calendar listing, once fetched.
    pub calendars: Option<Vec<CalendarInfo>>,
    pub created_at: Instant,
    last_used: Instant,
}

impl Session {
    fn new(now: Instant) -> Self {
        Self {
            roster: None,
            calendars: None,
            created_at: now,
            last_used: now,
        }
    }

    /// Returns true if a calendar id was offered to this session.
    ///
    /// Sessions that never listed calendars accept any id.
    pub fn allows_calendar(&self, calendar_id: &str) -> bool {
        self.calendars
            .as_ref()
            .is_none_or(|calendars| calendars.iter().any(|c| c.id == calendar_id))
    }
}

/// All live sessions.
#[derive(Debug)]
pub struct SessionStore {
    sessions: RwLock<HashMap<SessionId, Session>>,
    ttl: Duration,
}

impl SessionStore {
    /// Default idle time before a session is dropped.
    pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Starts a new session, dropping expired ones first.
    pub async fn create(&self) -> SessionId {
        self.purge_expired().await;
        let id = SessionId::new();
        self.sessions
            .write()
            .await
            .insert(id, Session::new(Instant::now()));
        debug!(session = %id, "session created");
        id
    }

    /// Returns a snapshot of a live session and marks it used.
    pub async fn get(&self, id: SessionId) -> Option<Session> {
        self.update(id, |session| session.clone()).await
    }

    /// Runs `f` on a live session and marks it used.
    ///
    /// Returns `None` for unknown or expired sessions.
    pub async fn update<T>(&self, id: SessionId, f: impl FnOnce(&mut Session) -> T) -> Option<T> {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;

        if sessions
            .get(&id)
            .is_some_and(|s| now.duration_since(s.last_used) >= self.ttl)
        {
            sessions.remove(&id);
            debug!(session = %id, "session expired");
            return None;
        }

        let session = sessions.get_mut(&id)?;
        session.last_used = now;
        Some(f(session))
    }

    /// Stores an uploaded roster, replacing the previous one.
    pub async fn set_roster(&self, id: SessionId, roster: RosterTable) -> bool {
        self.update(id, |session| session.roster = Some(Arc::new(roster)))
            .await
            .is_some()
    }

    /// Remembers the calendars offered to the session.
    pub async fn set_calendars(&self, id: SessionId, calendars: Vec<CalendarInfo>) -> bool {
        self.update(id, |session| session.calendars = Some(calendars))
            .await
            .is_some()
    }

    /// Ends a session. Returns false if it did not exist.
    pub async fn remove(&self, id: SessionId) -> bool {
        self.sessions.write().await.remove(&id).is_some()
    }

    /// Drops every session idle for longer than the TTL.
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| now.duration_since(s.last_used) < self.ttl);
        let purged = before - sessions.len();
        if purged > 0 {
            debug!(purged, "purged expired sessions");
        }
        purged
    }

    /// Number of sessions, expired ones included until purged.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(Self::DEFAULT_TTL)
    }
}
