use crate::error::{DialogError, DialogResult};
use crate::session::{Session, SessionId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Persistence for session transcripts.
#[async_trait]
pub trait TranscriptStore: Send + Sync {
    /// Most recent session for the caller that the store still considers open.
    async fn find_latest_open_session(&self, caller_id: &str) -> DialogResult<Option<Session>>;

    async fn load_session(&self, session_id: SessionId) -> DialogResult<Option<Session>>;

    /// Persist the session with its new turns, assigning an id on first save.
    async fn append_turns_and_save(&self, session: Session) -> DialogResult<Session>;
}

#[derive(Debug, Clone)]
struct StoredSession {
    session: Session,
    open: bool,
}

/// In-memory transcript store
pub struct InMemoryTranscriptStore {
    sessions: Arc<DashMap<SessionId, StoredSession>>,
}

impl InMemoryTranscriptStore {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
        }
    }

    /// Mark sessions idle since before `cutoff` as closed. Returns how many closed.
    pub fn close_stale_sessions(&self, cutoff: DateTime<Utc>) -> usize {
        let mut closed = 0;
        for mut entry in self.sessions.iter_mut() {
            if entry.open && entry.session.last_turn_at() < cutoff {
                entry.open = false;
                closed += 1;
            }
        }
        debug!(closed, "Closed stale sessions");
        closed
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Every session stored for a caller, oldest first.
    pub fn sessions_for(&self, caller_id: &str) -> Vec<Session> {
        let mut sessions: Vec<Session> = self
            .sessions
            .iter()
            .filter(|entry| entry.session.caller_id() == caller_id)
            .map(|entry| entry.session.clone())
            .collect();
        sessions.sort_by_key(Session::started_at);
        sessions
    }
}

impl Default for InMemoryTranscriptStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TranscriptStore for InMemoryTranscriptStore {
    async fn find_latest_open_session(&self, caller_id: &str) -> DialogResult<Option<Session>> {
        Ok(self
            .sessions
            .iter()
            .filter(|entry| entry.open && entry.session.caller_id() == caller_id)
            .max_by_key(|entry| entry.session.last_turn_at())
            .map(|entry| entry.session.clone()))
    }

    async fn load_session(&self, session_id: SessionId) -> DialogResult<Option<Session>> {
        Ok(self
            .sessions
            .get(&session_id)
            .map(|entry| entry.session.clone()))
    }

    async fn append_turns_and_save(&self, mut session: Session) -> DialogResult<Session> {
        let session_id = match session.session_id() {
            Some(id) => id,
            None => {
                let id = Uuid::new_v4();
                session.assign_id(id);
                id
            }
        };

        match self.sessions.entry(session_id) {
            dashmap::mapref::entry::Entry::Occupied(mut occupied) => {
                let stored = &occupied.get().session;
                let known = stored.turns();
                if session.persisted_turns() != known.len()
                    || session.turns().get(..known.len()) != Some(known)
                {
                    return Err(DialogError::Store(format!(
                        "session {session_id} was modified concurrently"
                    )));
                }
                session.mark_persisted();
                occupied.get_mut().session = session.clone();
            }
            dashmap::mapref::entry::Entry::Vacant(vacant) => {
                session.mark_persisted();
                vacant.insert(StoredSession {
                    session: session.clone(),
                    open: true,
                });
            }
        }

        Ok(session)
    }
}
