//! Per-turn entry point.
//!
//! One inbound turn is handled start to finish: pick or start the session,
//! resolve its step, apply the input, then append both turns and save. A
//! session idle for longer than the inactivity timeout is left untouched and
//! a new one is started instead.

use crate::error::{AssistantError, AssistantResult};
use chrono::{DateTime, Local, Utc};
use error_common::{report_error, ErrorContext};
use insurance_service::{split_lines, AuthorizationOutcome, AuthorizationService};
use logger_redacted::{global_redactor, redacted_debug};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;
use workflow_engine::{
    prompts, Channel, DialogEngine, DialogState, Session, Transition, TranscriptStore, Turn,
};

/// What the chat channel hands over for one caller message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundTurn {
    pub caller_id: String,
    pub text: String,
    /// Omitted: continue the caller's latest open session, or start one.
    #[serde(default)]
    pub session_id: Option<String>,
    /// Uploaded referral, only read in the authorization step.
    #[serde(default, skip_serializing)]
    pub document: Option<Vec<u8>>,
}

impl InboundTurn {
    pub fn new(caller_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            caller_id: caller_id.into(),
            text: text.into(),
            session_id: None,
            document: None,
        }
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_document(mut self, document: Vec<u8>) -> Self {
        self.document = Some(document);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnReply {
    pub reply_text: String,
    pub session_id: String,
}

/// The clinic assistant: dialog engine, transcript store and authorization
/// lookup behind a single `handle_turn` call.
pub struct ClinicAssistant {
    engine: DialogEngine,
    store: Arc<dyn TranscriptStore>,
    authorization: Arc<AuthorizationService>,
}

impl ClinicAssistant {
    pub fn new(
        engine: DialogEngine,
        store: Arc<dyn TranscriptStore>,
        authorization: Arc<AuthorizationService>,
    ) -> Self {
        Self {
            engine,
            store,
            authorization,
        }
    }

    pub fn engine(&self) -> &DialogEngine {
        &self.engine
    }

    pub async fn handle_turn(&self, turn: InboundTurn) -> TurnReply {
        self.handle_turn_at(turn, Utc::now()).await
    }

    /// Handle `turn` as if it arrived at `now`.
    ///
    /// Never fails: when the transcript cannot be read or saved the caller
    /// gets the apology and the main menu.
    pub async fn handle_turn_at(&self, turn: InboundTurn, now: DateTime<Utc>) -> TurnReply {
        let caller_ref = global_redactor().fingerprint(&turn.caller_id);
        let span = info_span!("turn", caller = %caller_ref);

        async {
            match self.process(&turn, now).await {
                Ok(reply) => reply,
                Err(err) => {
                    let mut context = ErrorContext::new("handle_turn").with_caller_ref(&caller_ref);
                    if let Some(id) = &turn.session_id {
                        context = context.with_session_id(id.clone());
                    }
                    report_error(&context, &err);
                    TurnReply {
                        reply_text: prompts::apology(),
                        session_id: turn.session_id.clone().unwrap_or_default(),
                    }
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn process(&self, turn: &InboundTurn, now: DateTime<Utc>) -> AssistantResult<TurnReply> {
        redacted_debug!("Inbound text: {}", turn.text);

        let mut session = self.open_session(turn, now).await?;
        let state = self.engine.resolve_state(&session);
        let prior_turns = session.turns().to_vec();
        let channel = self.engine.input_channel(&state, &turn.text);
        session.append(Turn::caller(turn.text.as_str(), now, channel));

        let transition = if session.is_first_message() {
            self.engine.welcome()
        } else if self.engine.is_reset(&turn.text) {
            self.engine.reset()
        } else if state == DialogState::Authorization {
            self.authorize(turn, &state, &prior_turns, now).await
        } else {
            self.engine.advance(&state, &turn.text, &prior_turns).await
        };

        debug!(from = %state.step(), to = %transition.next.step(), "Turn resolved");
        session.set_current_step(transition.next.clone());
        session.append(Turn::system(
            transition.reply.as_str(),
            now,
            transition.channel,
        ));

        let saved = self.store.append_turns_and_save(session).await?;
        let session_id = saved.session_id().ok_or_else(|| {
            AssistantError::Internal(anyhow::anyhow!("transcript store did not assign a session id"))
        })?;

        Ok(TurnReply {
            reply_text: transition.reply,
            session_id: session_id.to_string(),
        })
    }

    /// The session this turn continues, or a fresh one.
    async fn open_session(&self, turn: &InboundTurn, now: DateTime<Utc>) -> AssistantResult<Session> {
        let requested = turn.session_id.as_deref().and_then(|raw| {
            let parsed = Uuid::parse_str(raw.trim()).ok();
            if parsed.is_none() {
                warn!("Ignoring malformed session id");
            }
            parsed
        });
        let existing = match requested {
            Some(id) => self
                .store
                .load_session(id)
                .await?
                .filter(|session| session.caller_id() == turn.caller_id),
            None => self.store.find_latest_open_session(&turn.caller_id).await?,
        };

        match existing {
            Some(session) if !session.is_expired(now, self.engine.settings().inactivity_timeout()) => {
                debug!(session_id = ?session.session_id(), "Continuing session");
                Ok(session)
            }
            Some(session) => {
                info!(
                    session_id = ?session.session_id(),
                    last_turn_at = %session.last_turn_at(),
                    "Session expired, starting a new one"
                );
                Ok(Session::new(turn.caller_id.as_str(), now))
            }
            None => {
                info!("Starting a new session");
                Ok(Session::new(turn.caller_id.as_str(), now))
            }
        }
    }

    /// Look up the procedure in an uploaded document or pasted referral text.
    async fn authorize(
        &self,
        turn: &InboundTurn,
        state: &DialogState,
        prior_turns: &[Turn],
        now: DateTime<Utc>,
    ) -> Transition {
        let today = now.with_timezone(&Local).date_naive();
        let result = match &turn.document {
            Some(document) => self.authorization.check_document(document, today).await,
            None if !turn.text.trim().is_empty() => {
                self.authorization
                    .check_lines(&split_lines(&turn.text), today)
                    .await
            }
            None => return self.engine.advance(state, &turn.text, prior_turns).await,
        };

        match result {
            Ok(outcome) => {
                if let AuthorizationOutcome::Identified { procedure, .. } = &outcome {
                    info!(code = %procedure.code, "Authorization lookup answered");
                }
                self.engine.finish(
                    DialogState::Authorization,
                    format!("{}\n\n{}", outcome.render(), prompts::AUTHORIZATION_AGAIN),
                    Channel::Content,
                )
            }
            Err(err) => {
                report_error(
                    &ErrorContext::new("authorize").with_step(state.step().to_string()),
                    &err,
                );
                self.engine.apology()
            }
        }
    }
}
