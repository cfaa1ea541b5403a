//! Whole conversations through the orchestrator.
//!
//! Each test drives `ClinicAssistant::handle_turn_at` with in-memory
//! collaborators and a fixed clock, then checks both the replies and what
//! ended up in the transcript store.

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use clinic_assistant::*;
use insurance_service::{AuthorizationService, PlainTextExtractor};
use mockall::mock;
use procedure_matcher::{CatalogRecord, InMemoryProcedureCatalog, MatcherConfig, ProcedureMatcher};
use std::sync::Arc;
use uuid::Uuid;
use workflow_engine::*;

mock! {
    pub Store {}

    #[async_trait]
    impl TranscriptStore for Store {
        async fn find_latest_open_session(&self, caller_id: &str) -> DialogResult<Option<Session>>;
        async fn load_session(&self, session_id: SessionId) -> DialogResult<Option<Session>>;
        async fn append_turns_and_save(&self, session: Session) -> DialogResult<Session>;
    }
}

const CALLER: &str = "+55 11 98765-4321";

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap()
}

fn slot_time(day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 10, day)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}

fn create_test_directory() -> Arc<InMemorySchedulingDirectory> {
    let providers = vec![
        Provider {
            id: "p1".into(),
            name: "Dr. Ana Souza".into(),
            specialty: "Cardiology".into(),
            location: Some("Downtown".into()),
        },
        Provider {
            id: "p2".into(),
            name: "Dr. Carla Dias".into(),
            specialty: "Dermatology".into(),
            location: None,
        },
    ];
    let slots = vec![
        Slot {
            id: "s1".into(),
            provider_id: "p1".into(),
            starts_at: slot_time(21, 9),
        },
        Slot {
            id: "s2".into(),
            provider_id: "p1".into(),
            starts_at: slot_time(22, 10),
        },
    ];
    Arc::new(InMemorySchedulingDirectory::new(
        providers,
        slots,
        SlotWindow::default(),
    ))
}

fn create_test_authorization() -> Arc<AuthorizationService> {
    let catalog = InMemoryProcedureCatalog::new(
        vec![
            CatalogRecord::new("40808130")
                .with_procedure_name("Ressonância Magnética do Joelho")
                .with_chapter("Procedimentos Diagnósticos e Terapêuticos")
                .with_audit_lead_days("10"),
            CatalogRecord::new("40901122")
                .with_procedure_name("Ultrassonografia de Abdome Total")
                .with_audit_lead_days("0"),
        ],
        Default::default(),
    );
    let matcher = ProcedureMatcher::new(Arc::new(catalog), MatcherConfig::default());
    Arc::new(AuthorizationService::new(
        Arc::new(matcher),
        Arc::new(PlainTextExtractor),
    ))
}

struct Harness {
    assistant: ClinicAssistant,
    store: Arc<InMemoryTranscriptStore>,
    directory: Arc<InMemorySchedulingDirectory>,
    clock: DateTime<Utc>,
    session_id: Option<String>,
}

impl Harness {
    fn new() -> Self {
        let store = Arc::new(InMemoryTranscriptStore::new());
        let directory = create_test_directory();
        let engine = DialogEngine::new(
            directory.clone(),
            Arc::new(KeywordFaqResponder::with_default_entries()),
            DialogSettings::default(),
        );
        Self {
            assistant: ClinicAssistant::new(engine, store.clone(), create_test_authorization()),
            store,
            directory,
            clock: t0(),
            session_id: None,
        }
    }

    /// Send `text` one minute after the previous turn.
    async fn say(&mut self, text: &str) -> String {
        self.send(InboundTurn::new(CALLER, text)).await
    }

    async fn send(&mut self, turn: InboundTurn) -> String {
        self.clock += Duration::minutes(1);
        let reply = self.assistant.handle_turn_at(turn, self.clock).await;
        self.session_id = Some(reply.session_id);
        reply.reply_text
    }

    fn session(&self) -> Session {
        let id = self.session_id.as_deref().unwrap();
        self.store
            .sessions_for(CALLER)
            .into_iter()
            .find(|s| s.session_id().map(|u| u.to_string()).as_deref() == Some(id))
            .unwrap()
    }

    fn step(&self) -> DialogState {
        self.session().current_step().cloned().unwrap()
    }
}

#[tokio::test]
async fn test_first_message_gets_welcome_and_menu() {
    let mut h = Harness::new();
    let reply = h.say("2").await;

    assert!(reply.starts_with(prompts::WELCOME));
    assert!(reply.contains(prompts::MENU));
    assert_eq!(h.step(), DialogState::Menu);
    assert_eq!(h.session().turns().len(), 2);
    assert!(Uuid::parse_str(h.session_id.as_deref().unwrap()).is_ok());
}

#[tokio::test]
async fn test_menu_option_one_enters_question_mode() {
    let mut h = Harness::new();
    h.say("hello").await;

    let reply = h.say("1").await;
    assert!(reply.contains(prompts::FREE_QA_ACTIVATED));
    assert!(reply.ends_with(&prompts::reset_hint("0")));
    assert_eq!(h.step(), DialogState::FreeQa);

    let answer = h.say("What are your opening hours?").await;
    assert!(answer.contains("Monday to Friday"));
    assert_eq!(h.step(), DialogState::FreeQa);

    let turns = h.session().turns().to_vec();
    let last_two: Vec<Channel> = turns.iter().rev().take(2).map(|t| t.channel).collect();
    assert_eq!(last_two, vec![Channel::Content, Channel::Content]);
    assert!(turns.iter().take(4).all(|t| t.channel == Channel::Chrome));
}

#[tokio::test]
async fn test_reset_from_confirmation_restarts_wizard() {
    let mut h = Harness::new();
    h.say("hi").await;
    h.say("2").await;
    h.say("1").await;
    h.say("1").await;
    h.say("1").await;
    let summary = h.say("Maria Silva, (11) 98765-4321").await;
    assert!(summary.contains("CONFIRM"));
    assert!(matches!(
        h.step(),
        DialogState::Wizard(WizardState::Confirm { .. })
    ));

    let menu = h.say("0").await;
    assert_eq!(menu, prompts::menu());
    assert_eq!(h.step(), DialogState::Menu);

    let restart = h.say("2").await;
    assert!(restart.contains("available specialties"));
    assert_eq!(h.step(), DialogState::Wizard(WizardState::Specialty));
    assert!(h.directory.bookings().is_empty());
}

#[tokio::test]
async fn test_full_booking_returns_confirmation_code() {
    let mut h = Harness::new();
    h.say("hi").await;
    assert!(h.say("2").await.contains("Cardiology"));
    assert!(h.say("1").await.contains("Dr. Ana Souza (Downtown)"));
    assert!(h.say("1").await.contains("21/10/2026 09:00"));
    assert!(h.say("1").await.contains("patient's full name"));
    assert!(matches!(
        h.step(),
        DialogState::Wizard(WizardState::PatientData { .. })
    ));
    assert!(h
        .say("Maria Silva, (11) 98765-4321")
        .await
        .contains("Maria Silva"));

    let booked = h.say("confirm").await;
    assert!(booked.contains("Confirmation code: AGD-"));
    assert!(booked.contains(prompts::MENU));
    assert_eq!(h.step(), DialogState::Menu);
    assert!(!h.directory.is_available("s1"));
    assert_eq!(h.directory.bookings().len(), 1);
}

#[tokio::test]
async fn test_invalid_wizard_input_keeps_step() {
    let mut h = Harness::new();
    h.say("hi").await;
    h.say("2").await;

    let reply = h.say("9").await;
    assert!(reply.starts_with("Invalid option. Type a number between 1 and 2."));
    assert_eq!(h.step(), DialogState::Wizard(WizardState::Specialty));

    let invalid_menu = {
        h.say("0").await;
        h.say("banana").await
    };
    assert!(invalid_menu.starts_with("Invalid option."));
    assert_eq!(h.step(), DialogState::Menu);
}

#[tokio::test]
async fn test_idle_session_is_replaced() {
    let mut h = Harness::new();
    h.say("hi").await;
    h.say("2").await;
    let old_id = h.session_id.clone().unwrap();
    let old_turns = h.session().turns().len();

    h.clock += Duration::minutes(11);
    let reply = h.say("1").await;

    assert!(reply.starts_with(prompts::WELCOME));
    assert_ne!(h.session_id.as_deref(), Some(old_id.as_str()));

    let sessions = h.store.sessions_for(CALLER);
    assert_eq!(sessions.len(), 2);
    let old = sessions
        .iter()
        .find(|s| s.session_id().map(|u| u.to_string()) == Some(old_id.clone()))
        .unwrap();
    assert_eq!(old.turns().len(), old_turns);
}

#[tokio::test]
async fn test_session_continues_within_timeout() {
    let mut h = Harness::new();
    h.say("hi").await;
    let first = h.session_id.clone();

    h.clock += Duration::minutes(8);
    h.say("1").await;
    assert_eq!(h.session_id, first);
    assert_eq!(h.step(), DialogState::FreeQa);
}

#[tokio::test]
async fn test_authorization_from_pasted_text_and_document() {
    let mut h = Harness::new();
    h.say("hi").await;
    let request = h.say("3").await;
    assert!(request.contains(prompts::AUTHORIZATION_REQUEST));
    assert_eq!(h.step(), DialogState::Authorization);

    let pending = h
        .say("Clinica Exemplo\nSolicito ressonancia magnetica do joelho\nCID M23.2")
        .await;
    assert!(pending.contains("requires 10 days of audit"));
    assert!(pending.contains(prompts::AUTHORIZATION_AGAIN));
    assert!(pending.ends_with(&prompts::reset_hint("0")));
    assert_eq!(h.step(), DialogState::Authorization);

    let approved = h
        .send(
            InboundTurn::new(CALLER, "")
                .with_document(b"Pedido medico\nUltrassonografia de abdome total".to_vec()),
        )
        .await;
    assert!(approved.contains("No audit required"));

    let unknown = h.say("xyz qwv").await;
    assert!(unknown.contains(insurance_service::NO_PROCEDURE_MESSAGE));
    assert_eq!(h.step(), DialogState::Authorization);

    let content = h
        .session()
        .turns()
        .iter()
        .filter(|t| t.channel == Channel::Content)
        .count();
    assert_eq!(content, 6);

    assert_eq!(h.say("0").await, prompts::menu());
    assert_eq!(h.step(), DialogState::Menu);
}

#[tokio::test]
async fn test_legacy_transcript_resumes_from_markers() {
    let mut h = Harness::new();
    let mut legacy = Session::new(CALLER, t0());
    legacy.append(Turn::caller("oi", t0(), Channel::Untagged));
    legacy.append(Turn::system(prompts::welcome(), t0(), Channel::Untagged));
    legacy.append(Turn::caller("2", t0(), Channel::Untagged));
    legacy.append(Turn::system(
        prompts::specialty_list(&["Cardiology".to_string(), "Dermatology".to_string()]),
        t0(),
        Channel::Untagged,
    ));
    let saved = h.store.append_turns_and_save(legacy).await.unwrap();
    h.session_id = saved.session_id().map(|id| id.to_string());

    let turn = InboundTurn::new(CALLER, "1").with_session_id(h.session_id.clone().unwrap());
    let reply = h.send(turn).await;
    assert!(reply.contains("available providers for Cardiology"));
    assert_eq!(
        h.step(),
        DialogState::Wizard(WizardState::Provider {
            specialty: "Cardiology".into()
        })
    );
}

#[tokio::test]
async fn test_foreign_or_malformed_session_id_starts_new_session() {
    let mut h = Harness::new();
    h.say("hi").await;
    let mine = h.session_id.clone().unwrap();

    let stranger = h
        .assistant
        .handle_turn_at(
            InboundTurn::new("someone-else", "1").with_session_id(mine.as_str()),
            t0() + Duration::minutes(2),
        )
        .await;
    assert_ne!(stranger.session_id, mine);
    assert!(stranger.reply_text.starts_with(prompts::WELCOME));

    let malformed = h
        .assistant
        .handle_turn_at(
            InboundTurn::new("someone-else", "1").with_session_id("not-a-uuid"),
            t0() + Duration::minutes(3),
        )
        .await;
    assert_eq!(malformed.session_id, stranger.session_id);
    assert!(malformed.reply_text.contains(prompts::FREE_QA_ACTIVATED));
}

#[tokio::test]
async fn test_store_outage_yields_apology() {
    let mut store = MockStore::new();
    store
        .expect_find_latest_open_session()
        .returning(|_| Err(DialogError::Store("connection refused".into())));
    store.expect_append_turns_and_save().never();

    let engine = DialogEngine::new(
        create_test_directory(),
        Arc::new(KeywordFaqResponder::with_default_entries()),
        DialogSettings::default(),
    );
    let assistant = ClinicAssistant::new(engine, Arc::new(store), create_test_authorization());

    let reply = assistant
        .handle_turn_at(InboundTurn::new(CALLER, "hi"), t0())
        .await;
    assert_eq!(reply.reply_text, prompts::apology());
    assert!(reply.session_id.is_empty());
}

#[tokio::test]
async fn test_failed_save_yields_apology_with_request_session() {
    let existing = Uuid::new_v4();
    let mut store = MockStore::new();
    store.expect_load_session().returning(move |id| {
        let mut session = Session::restore(id, CALLER, t0(), Vec::new(), Some(DialogState::Menu));
        session.append(Turn::caller("hi", t0(), Channel::Chrome));
        session.append(Turn::system(prompts::welcome(), t0(), Channel::Chrome));
        Ok(Some(session))
    });
    store
        .expect_append_turns_and_save()
        .times(1)
        .returning(|_| Err(DialogError::Store("disk full".into())));

    let engine = DialogEngine::new(
        create_test_directory(),
        Arc::new(KeywordFaqResponder::with_default_entries()),
        DialogSettings::default(),
    );
    let assistant = ClinicAssistant::new(engine, Arc::new(store), create_test_authorization());

    let reply = assistant
        .handle_turn_at(
            InboundTurn::new(CALLER, "1").with_session_id(existing.to_string()),
            t0() + Duration::minutes(1),
        )
        .await;
    assert_eq!(reply.reply_text, prompts::apology());
    assert_eq!(reply.session_id, existing.to_string());
}
