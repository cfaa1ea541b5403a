//! Dialog engine behaviour across whole flows.
//!
//! Covers the booking wizard end to end, the global reset, step
//! monotonicity inside the wizard, transcript reconstruction, history
//! filtering for free-form questions, and collaborator failures.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, TimeZone, Utc};
use mockall::mock;
use parking_lot::Mutex;
use proptest::prelude::*;
use std::sync::Arc;
use workflow_engine::*;

mock! {
    pub Directory {}

    #[async_trait]
    impl SchedulingDirectory for Directory {
        async fn list_specialties(&self) -> DialogResult<Vec<String>>;
        async fn list_providers_by_specialty(&self, specialty: &str) -> DialogResult<Vec<Provider>>;
        async fn list_available_slots(&self, provider_id: &str) -> DialogResult<Vec<Slot>>;
        async fn commit_booking(
            &self,
            slot_id: &str,
            patient_name: &str,
            patient_phone: &str,
        ) -> DialogResult<String>;
    }
}

mock! {
    pub Responder {}

    #[async_trait]
    impl FreeTextResponder for Responder {
        async fn respond(&self, text: &str, prior_turns: &[Turn]) -> DialogResult<String>;
    }
}

/// Records the history it was given.
#[derive(Default)]
struct RecordingResponder {
    seen: Mutex<Vec<Vec<String>>>,
}

#[async_trait]
impl FreeTextResponder for RecordingResponder {
    async fn respond(&self, _text: &str, prior_turns: &[Turn]) -> DialogResult<String> {
        self.seen
            .lock()
            .push(prior_turns.iter().map(|t| t.text.clone()).collect());
        Ok("Saturdays until 1pm.".to_string())
    }
}

fn slot_time(day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 10, day)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}

fn provider(id: &str, name: &str, specialty: &str) -> Provider {
    Provider {
        id: id.into(),
        name: name.into(),
        specialty: specialty.into(),
        location: None,
    }
}

fn slot(id: &str, provider_id: &str, day: u32, hour: u32) -> Slot {
    Slot {
        id: id.into(),
        provider_id: provider_id.into(),
        starts_at: slot_time(day, hour),
    }
}

fn create_test_directory() -> Arc<InMemorySchedulingDirectory> {
    let providers = vec![
        provider("p1", "Dr. Ana Souza", "Cardiology"),
        provider("p2", "Dr. Bruno Lima", "Cardiology"),
        provider("p3", "Dr. Carla Dias", "Dermatology"),
    ];
    let slots = vec![
        slot("s1", "p1", 21, 9),
        slot("s2", "p1", 21, 14),
        slot("s3", "p2", 22, 10),
        slot("s4", "p3", 23, 8),
    ];
    Arc::new(InMemorySchedulingDirectory::new(
        providers,
        slots,
        SlotWindow::default(),
    ))
}

fn create_test_engine() -> (DialogEngine, Arc<InMemorySchedulingDirectory>) {
    let directory = create_test_directory();
    let engine = DialogEngine::new(
        directory.clone(),
        Arc::new(KeywordFaqResponder::with_default_entries()),
        DialogSettings::default(),
    );
    (engine, directory)
}

fn engine_with(directory: MockDirectory) -> DialogEngine {
    DialogEngine::new(
        Arc::new(directory),
        Arc::new(KeywordFaqResponder::with_default_entries()),
        DialogSettings::default(),
    )
}

fn confirm_state() -> DialogState {
    DialogState::Wizard(WizardState::Confirm {
        specialty: "Cardiology".into(),
        provider: provider("p1", "Dr. Ana Souza", "Cardiology"),
        slot: slot("s1", "p1", 21, 9),
        patient: PatientContact {
            name: "Maria Silva".into(),
            phone: "(11) 98765-4321".into(),
        },
    })
}

fn wizard_states() -> Vec<DialogState> {
    let ana = provider("p1", "Dr. Ana Souza", "Cardiology");
    let s1 = slot("s1", "p1", 21, 9);
    vec![
        DialogState::Wizard(WizardState::Specialty),
        DialogState::Wizard(WizardState::Provider {
            specialty: "Cardiology".into(),
        }),
        DialogState::Wizard(WizardState::Slot {
            specialty: "Cardiology".into(),
            provider: ana.clone(),
        }),
        DialogState::Wizard(WizardState::PatientData {
            specialty: "Cardiology".into(),
            provider: ana,
            slot: s1,
        }),
        confirm_state(),
    ]
}

fn all_states() -> Vec<DialogState> {
    let mut states = vec![
        DialogState::Menu,
        DialogState::FreeQa,
        DialogState::Authorization,
    ];
    states.extend(wizard_states());
    states
}

#[tokio::test]
async fn test_booking_happy_path_commits_and_returns_to_menu() {
    let (engine, directory) = create_test_engine();

    let t = engine.advance(&DialogState::Menu, "2", &[]).await;
    assert!(t.reply.contains("1. Cardiology\n2. Dermatology"));

    let t = engine.advance(&t.next, "1", &[]).await;
    assert!(t.reply.contains("available providers for Cardiology"));
    assert!(t.reply.contains("1. Dr. Ana Souza\n2. Dr. Bruno Lima"));

    let t = engine.advance(&t.next, "1", &[]).await;
    assert!(t.reply.contains("1. 21/10/2026 09:00\n2. 21/10/2026 14:00"));

    let t = engine.advance(&t.next, "2", &[]).await;
    assert_eq!(t.next.step(), DialogStep::Wizard(WizardStage::PatientData));

    let t = engine
        .advance(&t.next, "Maria Silva, (11) 98765-4321", &[])
        .await;
    assert!(t.reply.contains("Time: 21/10/2026 14:00"));
    assert!(t.reply.contains("Patient: Maria Silva ((11) 98765-4321)"));

    let t = engine.advance(&t.next, " confirm ", &[]).await;
    assert_eq!(t.next, DialogState::Menu);
    assert!(t.reply.contains("Confirmation code: AGD-"));
    assert!(t.reply.contains("Choose an option"));

    assert!(!directory.is_available("s2"));
    let bookings = directory.bookings();
    assert_eq!(bookings.len(), 1);
    assert_eq!(bookings[0].patient_name, "Maria Silva");
}

#[tokio::test]
async fn test_cancel_discards_booking() {
    let (engine, directory) = create_test_engine();
    let t = engine.advance(&confirm_state(), "cancel", &[]).await;

    assert_eq!(t.next, DialogState::Menu);
    assert!(t.reply.starts_with("Booking cancelled."));
    assert!(directory.bookings().is_empty());
    assert!(directory.is_available("s1"));
}

#[tokio::test]
async fn test_confirm_reprompts_on_other_input() {
    let (engine, _) = create_test_engine();
    let t = engine.advance(&confirm_state(), "yes please", &[]).await;

    assert_eq!(t.next, confirm_state());
    assert!(t.reply.starts_with("Please type CONFIRM or CANCEL."));
}

#[tokio::test]
async fn test_reset_from_confirm_restarts_wizard_at_specialty() {
    let (engine, _) = create_test_engine();

    let t = engine.advance(&confirm_state(), "0", &[]).await;
    assert_eq!(t.next, DialogState::Menu);
    assert_eq!(t.reply, workflow_engine::prompts::menu());

    let t = engine.advance(&t.next, "2", &[]).await;
    assert_eq!(t.next, DialogState::Wizard(WizardState::Specialty));
    assert!(t.reply.contains("available specialties"));
}

#[tokio::test]
async fn test_invalid_choice_lists_range() {
    let (engine, _) = create_test_engine();
    let state = DialogState::Wizard(WizardState::Provider {
        specialty: "Cardiology".into(),
    });
    let t = engine.advance(&state, "7", &[]).await;

    assert_eq!(t.next, state);
    assert!(t.reply.starts_with("Invalid option. Type a number between 1 and 2."));
    assert!(t.reply.contains("available providers"));
}

#[tokio::test]
async fn test_provider_without_slots_stays_at_provider() {
    let directory = InMemorySchedulingDirectory::new(
        vec![provider("p9", "Dr. Davi Reis", "Neurology")],
        vec![],
        SlotWindow::default(),
    );
    let engine = DialogEngine::new(
        Arc::new(directory),
        Arc::new(KeywordFaqResponder::with_default_entries()),
        DialogSettings::default(),
    );
    let state = DialogState::Wizard(WizardState::Provider {
        specialty: "Neurology".into(),
    });
    let t = engine.advance(&state, "1", &[]).await;

    assert_eq!(t.next, state);
    assert!(t.reply.contains("has no open slots"));
}

#[tokio::test]
async fn test_no_specialties_returns_to_menu() {
    let mut directory = MockDirectory::new();
    directory
        .expect_list_specialties()
        .returning(|| Ok(Vec::new()));
    let engine = engine_with(directory);

    let t = engine.advance(&DialogState::Menu, "2", &[]).await;
    assert_eq!(t.next, DialogState::Menu);
    assert!(t.reply.contains("no specialties are available"));
}

#[tokio::test]
async fn test_slot_taken_becomes_apology_and_menu() {
    let mut directory = MockDirectory::new();
    directory.expect_commit_booking().times(1).returning(|slot_id, _, _| {
        Err(DialogError::SlotTaken {
            slot_id: slot_id.to_string(),
        })
    });
    let engine = engine_with(directory);

    let t = engine.advance(&confirm_state(), "CONFIRM", &[]).await;
    assert_eq!(t.next, DialogState::Menu);
    assert!(t.reply.starts_with("Sorry, something went wrong"));
    assert!(t.reply.contains("Choose an option"));
}

#[tokio::test]
async fn test_directory_outage_becomes_apology() {
    let mut directory = MockDirectory::new();
    directory
        .expect_list_specialties()
        .returning(|| Err(DialogError::Scheduling("connection refused".into())));
    let engine = engine_with(directory);

    let t = engine
        .advance(&DialogState::Wizard(WizardState::Specialty), "1", &[])
        .await;
    assert_eq!(t.next, DialogState::Menu);
    assert!(t.reply.starts_with("Sorry, something went wrong"));
}

#[tokio::test]
async fn test_responder_outage_becomes_apology() {
    let mut responder = MockResponder::new();
    responder
        .expect_respond()
        .returning(|_, _| Err(DialogError::Responder("timeout".into())));
    let engine = DialogEngine::new(
        create_test_directory(),
        Arc::new(responder),
        DialogSettings::default(),
    );

    let t = engine.advance(&DialogState::FreeQa, "what time?", &[]).await;
    assert_eq!(t.next, DialogState::Menu);
    assert!(t.reply.starts_with("Sorry, something went wrong"));
}

#[tokio::test]
async fn test_free_qa_forwards_only_content_history() {
    let responder = Arc::new(RecordingResponder::default());
    let engine = DialogEngine::new(
        create_test_directory(),
        responder.clone(),
        DialogSettings::default(),
    );
    let now = Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap();
    let history = vec![
        Turn::caller("hi", now, Channel::Chrome),
        Turn::system(prompts::welcome(), now, Channel::Chrome),
        Turn::caller("1", now, Channel::Chrome),
        Turn::system(prompts::FREE_QA_ACTIVATED, now, Channel::Chrome),
        Turn::caller("what time do you open?", now, Channel::Content),
        Turn::system("We open at 7am.", now, Channel::Content),
    ];

    let t = engine.advance(&DialogState::FreeQa, "and on saturday?", &history).await;
    assert_eq!(t.next, DialogState::FreeQa);
    assert_eq!(t.channel, Channel::Content);
    assert!(t.reply.starts_with("Saturdays until 1pm."));
    assert!(t.reply.ends_with("Type 0 at any time to return to the main menu."));

    let seen = responder.seen.lock();
    assert_eq!(
        seen.as_slice(),
        &[vec![
            "what time do you open?".to_string(),
            "We open at 7am.".to_string()
        ]]
    );
}

#[test]
fn test_untagged_history_is_filtered_by_markers() {
    let (engine, _) = create_test_engine();
    let now = Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap();
    let history = vec![
        Turn::system(prompts::menu(), now, Channel::Untagged),
        Turn::caller("1", now, Channel::Untagged),
        Turn::system(prompts::FREE_QA_ACTIVATED, now, Channel::Untagged),
        Turn::caller("do you take my plan?", now, Channel::Untagged),
        Turn::system("We accept the major health plans.", now, Channel::Untagged),
    ];

    let texts: Vec<String> = engine
        .content_history(&history)
        .into_iter()
        .map(|t| t.text)
        .collect();
    assert_eq!(
        texts,
        vec!["do you take my plan?", "We accept the major health plans."]
    );
}

#[test]
fn test_content_history_keeps_most_recent_turns() {
    let settings = DialogSettings {
        free_qa_history_limit: 2,
        ..Default::default()
    };
    let engine = DialogEngine::new(
        create_test_directory(),
        Arc::new(KeywordFaqResponder::with_default_entries()),
        settings,
    );
    let now = Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap();
    let history: Vec<Turn> = (0..5)
        .map(|i| Turn::caller(format!("q{i}"), now, Channel::Content))
        .collect();

    let texts: Vec<String> = engine
        .content_history(&history)
        .into_iter()
        .map(|t| t.text)
        .collect();
    assert_eq!(texts, vec!["q3", "q4"]);
}

fn invalid_input_for(state: &DialogState) -> BoxedStrategy<String> {
    match state.wizard() {
        Some(WizardState::Confirm { .. }) => "[a-z ]{0,12}"
            .prop_filter("not a confirmation keyword", |s| {
                let s = s.trim();
                !s.eq_ignore_ascii_case("confirm") && !s.eq_ignore_ascii_case("cancel")
            })
            .boxed(),
        Some(WizardState::PatientData { .. }) => "[a-z ]{0,20}".boxed(),
        _ => prop_oneof!["[a-z ]{0,12}", (3usize..50).prop_map(|n| n.to_string())].boxed(),
    }
}

fn assert_captured_preserved(before: &DialogState, after: &DialogState) {
    let (Some(before), Some(after)) = (before.wizard(), after.wizard()) else {
        panic!("expected wizard states, got {before:?} -> {after:?}");
    };
    let (b, a) = (before.captured(), after.captured());
    for (old, new) in [
        (b.specialty, a.specialty),
        (b.provider_id, a.provider_id),
        (b.slot_id, a.slot_id),
        (b.patient_name, a.patient_name),
        (b.patient_phone, a.patient_phone),
    ] {
        if old.is_some() {
            assert_eq!(old, new);
        }
    }
}

proptest! {
    #[test]
    fn prop_reset_always_returns_to_menu(
        state in prop::sample::select(all_states()),
        padding in "[ \t]{0,3}",
    ) {
        let (engine, _) = create_test_engine();
        let input = format!("{padding}0{padding}");
        let t = tokio_test::block_on(engine.advance(&state, &input, &[]));
        prop_assert_eq!(t.next, DialogState::Menu);
        prop_assert_eq!(t.reply, prompts::menu());
    }

    #[test]
    fn prop_invalid_wizard_input_keeps_step_and_fields(
        (state, input) in prop::sample::select(wizard_states())
            .prop_flat_map(|state| {
                let input = invalid_input_for(&state);
                (Just(state), input)
            })
    ) {
        let (engine, _) = create_test_engine();
        let t = tokio_test::block_on(engine.advance(&state, &input, &[]));
        prop_assert_eq!(&t.next, &state);
    }

    #[test]
    fn prop_valid_choice_advances_one_stage(
        specialty in 1usize..=2,
        provider_choice in 1usize..=2,
        slot_choice in 1usize..=2,
    ) {
        let (engine, _) = create_test_engine();
        let mut state = DialogState::Wizard(WizardState::Specialty);
        let mut stage = WizardStage::Specialty;

        for choice in [specialty, provider_choice, slot_choice] {
            let t = tokio_test::block_on(engine.advance(&state, &choice.to_string(), &[]));
            let next_stage = match t.next.step() {
                DialogStep::Wizard(next) => next,
                other => panic!("left the wizard: {other}"),
            };
            if next_stage == stage {
                // Out of range for a shorter list, or nothing bookable downstream.
                prop_assert_eq!(&t.next, &state);
                return Ok(());
            }
            prop_assert!(next_stage > stage);
            assert_captured_preserved(&state, &t.next);
            state = t.next;
            stage = next_stage;
        }
        prop_assert_eq!(stage, WizardStage::PatientData);
    }

    #[test]
    fn prop_reconstruction_is_deterministic(
        picks in prop::collection::vec(0usize..6, 0..12),
    ) {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap();
        let pool = [
            prompts::menu(),
            prompts::FREE_QA_ACTIVATED.to_string(),
            prompts::AUTHORIZATION_REQUEST.to_string(),
            prompts::specialty_list(&["Cardiology".into()]),
            prompts::PATIENT_DATA_REQUEST.to_string(),
            "We open at 7am.".to_string(),
        ];
        let turns: Vec<Turn> = picks
            .iter()
            .filter_map(|i| pool.get(*i))
            .map(|text| Turn::system(text.clone(), now, Channel::Untagged))
            .collect();

        let reconstructor = SessionReconstructor::default();
        let first = reconstructor.reconstruct(&turns);
        let second = reconstructor.reconstruct(&turns);
        prop_assert_eq!(first, second);
        if turns.is_empty() {
            prop_assert_eq!(first, DialogStep::Menu);
        }
    }
}

#[tokio::test]
async fn test_in_memory_store_round_trip_with_step() {
    let store = InMemoryTranscriptStore::new();
    let now = Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap();
    let mut session = Session::new("caller-1", now);
    session.append(Turn::caller("2", now, Channel::Chrome));
    session.set_current_step(confirm_state());

    let saved = store.append_turns_and_save(session).await.unwrap();
    let loaded = store
        .find_latest_open_session("caller-1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(loaded.session_id(), saved.session_id());
    assert_eq!(loaded.current_step(), Some(&confirm_state()));
}
