//! PostgreSQL-backed transcript store
//!
//! Sessions live in `chat_sessions` and their turns in `chat_turns`, keyed
//! by `(session_id, seq)`. Saving locks the session row, rejects a copy
//! loaded before the last save, and inserts only the new turns.
//! The dialog step is kept as JSONB.

use crate::connection::DatabasePool;
use crate::error::{DatabaseError, DatabaseResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::{debug, info};
use uuid::Uuid;
use workflow_engine::{
    Channel, DialogResult, DialogState, Sender, Session, SessionId, TranscriptStore, Turn,
};

pub struct PostgresTranscriptStore {
    pool: PgPool,
}

impl PostgresTranscriptStore {
    pub fn new(pool: &DatabasePool) -> Self {
        Self {
            pool: pool.pool().clone(),
        }
    }

    /// Close every open session idle since before `cutoff`.
    pub async fn close_stale_sessions(&self, cutoff: DateTime<Utc>) -> DatabaseResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE chat_sessions
            SET status = 'closed'
            WHERE status = 'open' AND last_turn_at < $1
            "#,
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await?;

        info!(closed = result.rows_affected(), "Closed stale sessions");
        Ok(result.rows_affected())
    }

    async fn load(&self, session_id: Uuid) -> DatabaseResult<Option<Session>> {
        let Some(row) = sqlx::query(
            r#"
            SELECT caller_id, started_at, current_step
            FROM chat_sessions
            WHERE id = $1
            "#,
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?
        else {
            return Ok(None);
        };

        let caller_id: String = row.try_get("caller_id")?;
        let started_at: DateTime<Utc> = row.try_get("started_at")?;
        let current_step: Option<Json<DialogState>> = row.try_get("current_step")?;

        let turns = sqlx::query(
            r#"
            SELECT sender, channel, body, created_at
            FROM chat_turns
            WHERE session_id = $1
            ORDER BY seq ASC
            "#,
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(|row| {
            let sender: String = row.try_get("sender")?;
            let channel: String = row.try_get("channel")?;
            Ok(Turn {
                sender: parse_sender(&sender)?,
                text: row.try_get("body")?,
                timestamp: row.try_get("created_at")?,
                channel: parse_channel(&channel)?,
            })
        })
        .collect::<DatabaseResult<Vec<Turn>>>()?;

        Ok(Some(Session::restore(
            session_id,
            caller_id,
            started_at,
            turns,
            current_step.map(|Json(step)| step),
        )))
    }

    async fn save(&self, mut session: Session) -> DatabaseResult<Session> {
        let mut tx = self.pool.begin().await?;

        let session_id = match session.session_id() {
            Some(id) => id,
            None => {
                let id = Uuid::new_v4();
                session.assign_id(id);
                id
            }
        };

        let stored: Option<i32> = sqlx::query_scalar(
            "SELECT turn_count FROM chat_sessions WHERE id = $1 FOR UPDATE",
        )
        .bind(session_id)
        .fetch_optional(&mut *tx)
        .await?;

        let stored = match stored {
            Some(count) => usize::try_from(count)
                .map_err(|_| DatabaseError::Corrupt(format!("turn_count {count}")))?,
            None => {
                insert_session(&mut tx, session_id, &session).await?;
                0
            }
        };

        if stored != session.persisted_turns() {
            return Err(DatabaseError::Conflict(format!(
                "session {session_id} holds {stored} turns, copy was read at {}",
                session.persisted_turns()
            )));
        }
        let Some(new_turns) = session.turns().get(stored..) else {
            return Err(DatabaseError::Conflict(format!("session {session_id}")));
        };
        for (offset, turn) in new_turns.iter().enumerate() {
            let seq = i32::try_from(stored + offset)
                .map_err(|_| DatabaseError::Corrupt("turn sequence overflow".to_string()))?;
            sqlx::query(
                r#"
                INSERT INTO chat_turns (session_id, seq, sender, channel, body, created_at)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(session_id)
            .bind(seq)
            .bind(sender_str(turn.sender))
            .bind(channel_str(turn.channel))
            .bind(&turn.text)
            .bind(turn.timestamp)
            .execute(&mut *tx)
            .await?;
        }

        let turn_count = i32::try_from(session.turns().len())
            .map_err(|_| DatabaseError::Corrupt("turn count overflow".to_string()))?;
        sqlx::query(
            r#"
            UPDATE chat_sessions
            SET turn_count = $2, last_turn_at = $3, current_step = $4
            WHERE id = $1
            "#,
        )
        .bind(session_id)
        .bind(turn_count)
        .bind(session.last_turn_at())
        .bind(session.current_step().map(Json))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        debug!(%session_id, appended = new_turns.len(), "Transcript saved");
        session.mark_persisted();
        Ok(session)
    }
}

async fn insert_session(
    tx: &mut Transaction<'_, Postgres>,
    session_id: Uuid,
    session: &Session,
) -> DatabaseResult<()> {
    sqlx::query(
        r#"
        INSERT INTO chat_sessions (id, caller_id, started_at, last_turn_at, status, turn_count)
        VALUES ($1, $2, $3, $4, 'open', 0)
        "#,
    )
    .bind(session_id)
    .bind(session.caller_id())
    .bind(session.started_at())
    .bind(session.last_turn_at())
    .execute(&mut **tx)
    .await?;
    Ok(())
}

fn sender_str(sender: Sender) -> &'static str {
    match sender {
        Sender::Caller => "caller",
        Sender::System => "system",
    }
}

fn parse_sender(value: &str) -> DatabaseResult<Sender> {
    match value {
        "caller" => Ok(Sender::Caller),
        "system" => Ok(Sender::System),
        other => Err(DatabaseError::Corrupt(format!("sender {other}"))),
    }
}

fn channel_str(channel: Channel) -> &'static str {
    match channel {
        Channel::Chrome => "chrome",
        Channel::Content => "content",
        Channel::Untagged => "untagged",
    }
}

fn parse_channel(value: &str) -> DatabaseResult<Channel> {
    match value {
        "chrome" => Ok(Channel::Chrome),
        "content" => Ok(Channel::Content),
        "untagged" => Ok(Channel::Untagged),
        other => Err(DatabaseError::Corrupt(format!("channel {other}"))),
    }
}

#[async_trait]
impl TranscriptStore for PostgresTranscriptStore {
    async fn find_latest_open_session(&self, caller_id: &str) -> DialogResult<Option<Session>> {
        let id: Option<Uuid> = sqlx::query_scalar(
            r#"
            SELECT id FROM chat_sessions
            WHERE caller_id = $1 AND status = 'open'
            ORDER BY last_turn_at DESC
            LIMIT 1
            "#,
        )
        .bind(caller_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        match id {
            Some(id) => Ok(self.load(id).await?),
            None => Ok(None),
        }
    }

    async fn load_session(&self, session_id: SessionId) -> DialogResult<Option<Session>> {
        Ok(self.load(session_id).await?)
    }

    async fn append_turns_and_save(&self, session: Session) -> DialogResult<Session> {
        Ok(self.save(session).await?)
    }
}
