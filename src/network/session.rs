//! Session Registry
//!
//! Process-wide table of live sessions and the pairing rule that assigns
//! each new connection a `(session, slot)` binding.
//!
//! Locking is two-level: the registry lock is held only for map edits, and
//! every session sits behind its own `RwLock`, so traffic on one session
//! never waits on another.

use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::game::session::{PlayerSlot, Session, SessionId};

// =============================================================================
// SESSION ENTRY
// =============================================================================

/// A registered session plus its teardown signal.
pub struct SessionEntry {
    state: RwLock<Session>,
    teardown_tx: broadcast::Sender<()>,
}

impl SessionEntry {
    fn new(id: SessionId) -> Self {
        let (teardown_tx, _) = broadcast::channel(1);
        Self {
            state: RwLock::new(Session::new(id)),
            teardown_tx,
        }
    }

    /// Shared access to the session state.
    pub async fn read(&self) -> RwLockReadGuard<'_, Session> {
        self.state.read().await
    }

    /// Exclusive access to the session state.
    pub async fn write(&self) -> RwLockWriteGuard<'_, Session> {
        self.state.write().await
    }

    /// Copy of the current state.
    pub async fn snapshot(&self) -> Session {
        self.state.read().await.clone()
    }

    fn subscribe(&self) -> broadcast::Receiver<()> {
        self.teardown_tx.subscribe()
    }
}

/// The fixed association between one connection and its session half.
#[derive(Debug)]
pub struct Binding {
    /// Session the connection belongs to.
    pub session_id: SessionId,
    /// Slot within that session.
    pub slot: PlayerSlot,
    /// Fires once when the session is removed from the registry.
    pub teardown: broadcast::Receiver<()>,
}

// =============================================================================
// SESSION REGISTRY
// =============================================================================

struct RegistryInner {
    sessions: BTreeMap<SessionId, Arc<SessionEntry>>,
    next_id: SessionId,
    /// Session opened by slot 0 and still waiting for slot 1.
    awaiting_opponent: Option<SessionId>,
    connection_count: u64,
}

impl RegistryInner {
    /// Open a session for the first player of a pair and offer it to the
    /// next arrival.
    fn open_pair(&mut self) -> (SessionId, Arc<SessionEntry>) {
        let id = self.next_id;
        self.next_id += 1;
        let entry = Arc::new(SessionEntry::new(id));
        self.sessions.insert(id, entry.clone());
        self.awaiting_opponent = Some(id);
        (id, entry)
    }
}

/// Manages all active sessions.
pub struct SessionRegistry {
    inner: RwLock<RegistryInner>,
}

impl SessionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(RegistryInner {
                sessions: BTreeMap::new(),
                next_id: 0,
                awaiting_opponent: None,
                connection_count: 0,
            }),
        }
    }

    /// Bind a newly accepted connection.
    ///
    /// Arrivals pair up in order: the first of a pair opens a session as
    /// slot 0, the next one completes it as slot 1 and marks it ready. If the
    /// waiting session was torn down in the meantime the arrival opens a
    /// fresh session instead; ids are never reused.
    pub async fn join(&self) -> Binding {
        let mut inner = self.inner.write().await;
        inner.connection_count += 1;

        if let Some(id) = inner.awaiting_opponent.take() {
            if let Some(entry) = inner.sessions.get(&id).cloned() {
                entry.write().await.mark_ready();
                return Binding {
                    session_id: id,
                    slot: PlayerSlot::Two,
                    teardown: entry.subscribe(),
                };
            }
        }

        let (id, entry) = inner.open_pair();
        Binding {
            session_id: id,
            slot: PlayerSlot::One,
            teardown: entry.subscribe(),
        }
    }

    /// Allocate a new session with the next sequential id for the first
    /// connection of a pair.
    ///
    /// The session becomes the one the next [`SessionRegistry::join`] fills
    /// as slot 1. Any earlier session still waiting is no longer offered.
    pub async fn create_session(&self) -> SessionId {
        let (id, _) = self.inner.write().await.open_pair();
        id
    }

    /// Look up a session. `None` once it has been removed.
    pub async fn get(&self, id: SessionId) -> Option<Arc<SessionEntry>> {
        self.inner.read().await.sessions.get(&id).cloned()
    }

    /// Remove a session and signal both bound handlers.
    ///
    /// Returns whether anything was removed; removing twice is a no-op.
    pub async fn remove(&self, id: SessionId) -> bool {
        let mut inner = self.inner.write().await;
        if inner.awaiting_opponent == Some(id) {
            inner.awaiting_opponent = None;
        }
        match inner.sessions.remove(&id) {
            Some(entry) => {
                let _ = entry.teardown_tx.send(());
                true
            }
            None => false,
        }
    }

    /// Number of live sessions.
    pub async fn session_count(&self) -> usize {
        self.inner.read().await.sessions.len()
    }

    /// Connections accepted since startup.
    pub async fn connection_count(&self) -> u64 {
        self.inner.read().await.connection_count
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
