//! SessionService: transport-agnostic session registry and batch dispatch.
//!
//! Sessions are owned here, keyed by generated id, each behind its own
//! mutex. All mutation runs under that exclusive lock for the whole batch;
//! read endpoints take the same lock briefly for a consistent snapshot.
//! Transports (HTTP today) delegate to this service.

use std::sync::{Arc, Mutex, MutexGuard};

use dashmap::DashMap;
use serde::Serialize;
use uuid::Uuid;

use crate::party::{Party, RoleAssignment};
use crate::runner::{RunReport, run_batch};
use crate::schedule::BatchRequest;
use crate::session::{PadSession, PartyStateView, SessionError};
use crate::stats::SessionStats;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("session {0} not found")]
    SessionNotFound(Uuid),
    #[error(transparent)]
    InvalidSession(#[from] SessionError),
}

/// Handle returned on session creation.
#[derive(Debug, Clone, Serialize)]
pub struct SessionHandle {
    pub id: Uuid,
    pub created_at: String,
    pub capacity: i64,
    pub margin: i64,
    pub roles: RoleAssignment,
    pub stats: SessionStats,
}

/// Per-party state views, keyed by party label on the wire.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PartyStates {
    #[serde(rename = "A")]
    pub a: PartyStateView,
    #[serde(rename = "B")]
    pub b: PartyStateView,
    #[serde(rename = "C")]
    pub c: PartyStateView,
}

/// Per-party activity flags, keyed by party label on the wire.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PartyFlags {
    #[serde(rename = "A")]
    pub a: bool,
    #[serde(rename = "B")]
    pub b: bool,
    #[serde(rename = "C")]
    pub c: bool,
}

/// Point-in-time view of a whole session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub id: Uuid,
    pub created_at: String,
    pub capacity: i64,
    pub margin: i64,
    pub roles: RoleAssignment,
    pub parties: PartyStates,
    pub has_sent: PartyFlags,
    /// All three parties blocked simultaneously.
    pub deadlocked: bool,
    pub stats: SessionStats,
}

struct SessionEntry {
    session: Mutex<PadSession>,
    created_at: String,
}

impl SessionEntry {
    /// Lock the session, recovering from a poisoned mutex. The state
    /// machine has no partially-applied transitions to observe, so the
    /// inner value is still consistent.
    fn lock(&self) -> MutexGuard<'_, PadSession> {
        match self.session.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::warn!("session mutex poisoned - recovering");
                poisoned.into_inner()
            }
        }
    }
}

/// Registry of independently owned allocation sessions.
pub struct SessionService {
    sessions: DashMap<Uuid, Arc<SessionEntry>>,
}

impl SessionService {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    fn entry(&self, id: Uuid) -> Result<Arc<SessionEntry>, ServiceError> {
        self.sessions
            .get(&id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(ServiceError::SessionNotFound(id))
    }

    /// Create a new session. Parameter validation happens in the core.
    pub fn create(&self, capacity: i64, margin: i64) -> Result<SessionHandle, ServiceError> {
        let session = PadSession::new(capacity, margin)?;
        let id = Uuid::new_v4();
        let created_at = chrono::Utc::now().to_rfc3339();

        let handle = SessionHandle {
            id,
            created_at: created_at.clone(),
            capacity,
            margin,
            roles: session.roles(),
            stats: session.stats(),
        };

        self.sessions.insert(
            id,
            Arc::new(SessionEntry {
                session: Mutex::new(session),
                created_at,
            }),
        );

        tracing::info!(%id, capacity, margin, "session created");
        Ok(handle)
    }

    /// Run one batch against a session, holding its lock for the whole run.
    pub fn run(&self, id: Uuid, request: &BatchRequest) -> Result<RunReport, ServiceError> {
        let entry = self.entry(id)?;
        let mut session = entry.lock();
        Ok(run_batch(&mut session, request))
    }

    pub fn stats(&self, id: Uuid) -> Result<SessionStats, ServiceError> {
        let entry = self.entry(id)?;
        let session = entry.lock();
        Ok(session.stats())
    }

    pub fn snapshot(&self, id: Uuid) -> Result<SessionSnapshot, ServiceError> {
        let entry = self.entry(id)?;
        let session = entry.lock();

        Ok(SessionSnapshot {
            id,
            created_at: entry.created_at.clone(),
            capacity: session.capacity(),
            margin: session.margin(),
            roles: session.roles(),
            parties: PartyStates {
                a: session.party_state(Party::A),
                b: session.party_state(Party::B),
                c: session.party_state(Party::C),
            },
            has_sent: PartyFlags {
                a: session.has_sent(Party::A),
                b: session.has_sent(Party::B),
                c: session.has_sent(Party::C),
            },
            deadlocked: Party::ALL.iter().all(|p| !session.can_send(*p)),
            stats: session.stats(),
        })
    }

    /// Discard a session. Returns false if it did not exist.
    pub fn delete(&self, id: Uuid) -> bool {
        let removed = self.sessions.remove(&id).is_some();
        if removed {
            tracing::info!(%id, "session deleted");
        }
        removed
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

impl Default for SessionService {
    fn default() -> Self {
        Self::new()
    }
}
