use crate::state::DialogState;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type SessionId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    Caller,
    System,
}

/// What a turn carries, decided when the turn is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    /// Router prompts and menu navigation.
    Chrome,
    /// Conversation worth forwarding to a free-text responder.
    Content,
    /// Written before turns were tagged.
    #[default]
    Untagged,
}

/// One message exchanged within a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub sender: Sender,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub channel: Channel,
}

impl Turn {
    pub fn caller(text: impl Into<String>, timestamp: DateTime<Utc>, channel: Channel) -> Self {
        Self {
            sender: Sender::Caller,
            text: text.into(),
            timestamp,
            channel,
        }
    }

    pub fn system(text: impl Into<String>, timestamp: DateTime<Utc>, channel: Channel) -> Self {
        Self {
            sender: Sender::System,
            text: text.into(),
            timestamp,
            channel,
        }
    }

    pub fn is_system(&self) -> bool {
        self.sender == Sender::System
    }
}

/// The ordered history of one interaction with one caller.
///
/// Turns are append-only and `last_turn_at` always equals the timestamp of
/// the newest turn (or `started_at` while the session is empty).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    session_id: Option<SessionId>,
    caller_id: String,
    started_at: DateTime<Utc>,
    last_turn_at: DateTime<Utc>,
    turns: Vec<Turn>,
    /// Absent on sessions persisted before the step was stored.
    #[serde(default)]
    current_step: Option<DialogState>,
    /// Turns the store held when this copy was loaded or last saved.
    #[serde(skip)]
    persisted_turns: usize,
}

impl Session {
    /// A session that has not been saved yet.
    pub fn new(caller_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            session_id: None,
            caller_id: caller_id.into(),
            started_at: now,
            last_turn_at: now,
            turns: Vec::new(),
            current_step: None,
            persisted_turns: 0,
        }
    }

    /// Rebuild a persisted session. `last_turn_at` is derived from `turns`.
    pub fn restore(
        session_id: SessionId,
        caller_id: impl Into<String>,
        started_at: DateTime<Utc>,
        turns: Vec<Turn>,
        current_step: Option<DialogState>,
    ) -> Self {
        let last_turn_at = turns.last().map_or(started_at, |t| t.timestamp);
        Self {
            session_id: Some(session_id),
            caller_id: caller_id.into(),
            started_at,
            last_turn_at,
            persisted_turns: turns.len(),
            turns,
            current_step,
        }
    }

    pub fn session_id(&self) -> Option<SessionId> {
        self.session_id
    }

    /// Called by a store on first save.
    pub fn assign_id(&mut self, session_id: SessionId) {
        if self.session_id.is_none() {
            self.session_id = Some(session_id);
        }
    }

    /// How many turns the store held when this copy was read.
    ///
    /// A store only accepts the save while it still holds exactly that many.
    pub fn persisted_turns(&self) -> usize {
        self.persisted_turns
    }

    /// Called by a store once every turn is durable.
    pub fn mark_persisted(&mut self) {
        self.persisted_turns = self.turns.len();
    }

    pub fn caller_id(&self) -> &str {
        &self.caller_id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn last_turn_at(&self) -> DateTime<Utc> {
        self.last_turn_at
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn current_step(&self) -> Option<&DialogState> {
        self.current_step.as_ref()
    }

    pub fn set_current_step(&mut self, step: DialogState) {
        self.current_step = Some(step);
    }

    pub fn append(&mut self, turn: Turn) {
        self.last_turn_at = turn.timestamp;
        self.turns.push(turn);
    }

    /// True when the just-arrived caller message is the only turn.
    pub fn is_first_message(&self) -> bool {
        matches!(self.turns.as_slice(), [only] if only.sender == Sender::Caller)
    }

    /// True once more than `timeout` has passed since the last turn.
    pub fn is_expired(&self, now: DateTime<Utc>, timeout: Duration) -> bool {
        now.signed_duration_since(self.last_turn_at) > timeout
    }
}
