use crate::error::{DialogError, DialogResult};
use crate::prompts;
use crate::reconstruct::SessionReconstructor;
use crate::responder::FreeTextResponder;
use crate::scheduling::SchedulingDirectory;
use crate::session::{Channel, Session, Turn};
use crate::settings::DialogSettings;
use crate::state::{DialogState, DialogStep, PatientContact, WizardStage, WizardState};
use error_common::{report_error, ErrorContext};
use logger_redacted::redacted_debug;
use std::sync::Arc;
use tracing::{debug, info};

/// Result of one step of the dialog.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub next: DialogState,
    pub reply: String,
    /// Channel of the system turn carrying `reply`.
    pub channel: Channel,
}

/// The dialog state machine.
///
/// `advance` never fails: validation problems self-loop with a corrective
/// prompt and collaborator failures turn into an apology plus the menu.
pub struct DialogEngine {
    scheduling: Arc<dyn SchedulingDirectory>,
    responder: Arc<dyn FreeTextResponder>,
    reconstructor: SessionReconstructor,
    settings: DialogSettings,
}

impl DialogEngine {
    pub fn new(
        scheduling: Arc<dyn SchedulingDirectory>,
        responder: Arc<dyn FreeTextResponder>,
        settings: DialogSettings,
    ) -> Self {
        Self {
            scheduling,
            responder,
            reconstructor: SessionReconstructor::new(settings.legacy_scan_depth),
            settings,
        }
    }

    pub fn settings(&self) -> &DialogSettings {
        &self.settings
    }

    pub fn is_reset(&self, input: &str) -> bool {
        self.settings.is_reset(input)
    }

    pub fn reset(&self) -> Transition {
        Transition {
            next: DialogState::Menu,
            reply: prompts::menu(),
            channel: Channel::Chrome,
        }
    }

    pub fn welcome(&self) -> Transition {
        Transition {
            next: DialogState::Menu,
            reply: prompts::welcome(),
            channel: Channel::Chrome,
        }
    }

    pub fn apology(&self) -> Transition {
        Transition {
            next: DialogState::Menu,
            reply: prompts::apology(),
            channel: Channel::Chrome,
        }
    }

    /// The state a session is in before the caller's new input is applied.
    ///
    /// A stored step is used as is. Otherwise the step is read back from the
    /// transcript; wizard stages past specialty selection cannot be resumed
    /// that way because their collected data is lost, so they fall back to
    /// the menu.
    pub fn resolve_state(&self, session: &Session) -> DialogState {
        if let Some(state) = session.current_step() {
            return state.clone();
        }

        let step = self.reconstructor.reconstruct(session.turns());
        match step {
            DialogStep::Menu => DialogState::Menu,
            DialogStep::FreeQa => DialogState::FreeQa,
            DialogStep::Authorization => DialogState::Authorization,
            DialogStep::Wizard(WizardStage::Specialty) => DialogState::Wizard(WizardState::Specialty),
            DialogStep::Wizard(_) => {
                let mut context = ErrorContext::new("resolve_state").with_step(step.to_string());
                if let Some(id) = session.session_id() {
                    context = context.with_session_id(id.to_string());
                }
                report_error(
                    &context,
                    &DialogError::StaleStep {
                        step: step.to_string(),
                    },
                );
                DialogState::Menu
            }
        }
    }

    /// Channel of the caller turn that carries `input` while in `state`.
    pub fn input_channel(&self, state: &DialogState, input: &str) -> Channel {
        match state {
            DialogState::FreeQa | DialogState::Authorization if !self.is_reset(input) => {
                Channel::Content
            }
            _ => Channel::Chrome,
        }
    }

    /// Turns worth forwarding to the free-text responder, oldest first.
    pub fn content_history(&self, turns: &[Turn]) -> Vec<Turn> {
        let kept: Vec<&Turn> = turns
            .iter()
            .filter(|turn| match turn.channel {
                Channel::Content => true,
                Channel::Chrome => false,
                Channel::Untagged => !self.looks_like_chrome(turn),
            })
            .collect();
        let skip = kept.len().saturating_sub(self.settings.free_qa_history_limit);
        kept.into_iter().skip(skip).cloned().collect()
    }

    fn looks_like_chrome(&self, turn: &Turn) -> bool {
        if turn.is_system() {
            prompts::classify_text(&turn.text).is_some()
        } else {
            let text = turn.text.trim();
            self.is_reset(text) || text.chars().all(|c| c.is_ascii_digit())
        }
    }

    /// Apply the caller's input to `state`.
    ///
    /// `prior_turns` is the transcript before this input; it is only read in
    /// the Q&A step.
    pub async fn advance(&self, state: &DialogState, input: &str, prior_turns: &[Turn]) -> Transition {
        if self.is_reset(input) {
            debug!(from = %state.step(), "Reset to menu");
            return self.reset();
        }

        let step = state.step();
        match self.try_advance(state, input, prior_turns).await {
            Ok(transition) => {
                debug!(from = %step, to = %transition.next.step(), "Dialog transition");
                transition
            }
            Err(err) => {
                report_error(&ErrorContext::new("advance").with_step(step.to_string()), &err);
                self.apology()
            }
        }
    }

    async fn try_advance(
        &self,
        state: &DialogState,
        input: &str,
        prior_turns: &[Turn],
    ) -> DialogResult<Transition> {
        match state {
            DialogState::Menu => self.select_from_menu(input).await,
            DialogState::FreeQa => self.answer_question(input, prior_turns).await,
            // Documents are checked by the caller of the engine; plain text
            // that reaches this point only gets the request again.
            DialogState::Authorization => Ok(self.stay(
                DialogState::Authorization,
                prompts::AUTHORIZATION_REQUEST.to_string(),
            )),
            DialogState::Wizard(wizard) => self.advance_wizard(wizard, input).await,
        }
    }

    async fn select_from_menu(&self, input: &str) -> DialogResult<Transition> {
        match input.trim() {
            "1" => Ok(self.stay(DialogState::FreeQa, prompts::FREE_QA_ACTIVATED.to_string())),
            "2" => self.start_wizard().await,
            "3" => Ok(self.stay(
                DialogState::Authorization,
                prompts::AUTHORIZATION_REQUEST.to_string(),
            )),
            _ => Ok(self.to_menu(prompts::invalid_menu_option())),
        }
    }

    async fn answer_question(&self, input: &str, prior_turns: &[Turn]) -> DialogResult<Transition> {
        let history = self.content_history(prior_turns);
        redacted_debug!("Forwarding question to responder: {}", input);
        let answer = self.responder.respond(input.trim(), &history).await?;
        Ok(self.finish(DialogState::FreeQa, answer, Channel::Content))
    }

    async fn start_wizard(&self) -> DialogResult<Transition> {
        let specialties = self.scheduling.list_specialties().await?;
        if specialties.is_empty() {
            return Ok(self.to_menu(prompts::no_specialties()));
        }
        Ok(self.stay(
            DialogState::Wizard(WizardState::Specialty),
            prompts::specialty_list(&specialties),
        ))
    }

    async fn advance_wizard(&self, wizard: &WizardState, input: &str) -> DialogResult<Transition> {
        match wizard {
            WizardState::Specialty => self.choose_specialty(input).await,
            WizardState::Provider { specialty } => self.choose_provider(specialty, input).await,
            WizardState::Slot {
                specialty,
                provider,
            } => {
                let slots = self.scheduling.list_available_slots(&provider.id).await?;
                if slots.is_empty() {
                    let providers = self.scheduling.list_providers_by_specialty(specialty).await?;
                    return Ok(self.stay(
                        DialogState::Wizard(WizardState::Provider {
                            specialty: specialty.clone(),
                        }),
                        prompts::no_slots(provider, specialty, &providers),
                    ));
                }
                match pick(&slots, input) {
                    Some(slot) => Ok(self.stay(
                        DialogState::Wizard(WizardState::PatientData {
                            specialty: specialty.clone(),
                            provider: provider.clone(),
                            slot: slot.clone(),
                        }),
                        prompts::PATIENT_DATA_REQUEST.to_string(),
                    )),
                    None => Ok(self.stay(
                        DialogState::Wizard(wizard.clone()),
                        prompts::invalid_choice(slots.len(), &prompts::slot_list(provider, &slots)),
                    )),
                }
            }
            WizardState::PatientData {
                specialty,
                provider,
                slot,
            } => match PatientContact::parse(input) {
                Ok(patient) => {
                    let summary = prompts::confirm_summary(specialty, provider, slot, &patient);
                    Ok(self.stay(
                        DialogState::Wizard(WizardState::Confirm {
                            specialty: specialty.clone(),
                            provider: provider.clone(),
                            slot: slot.clone(),
                            patient,
                        }),
                        summary,
                    ))
                }
                Err(reason) => Ok(self.stay(
                    DialogState::Wizard(wizard.clone()),
                    prompts::invalid_patient_data(&reason.to_string()),
                )),
            },
            WizardState::Confirm {
                specialty,
                provider,
                slot,
                patient,
            } => {
                let answer = input.trim();
                if answer.eq_ignore_ascii_case("CONFIRM") {
                    let code = self
                        .scheduling
                        .commit_booking(&slot.id, &patient.name, &patient.phone)
                        .await?;
                    info!(slot_id = %slot.id, code = %code, "Appointment booked");
                    Ok(self.to_menu(prompts::booked(&code)))
                } else if answer.eq_ignore_ascii_case("CANCEL") {
                    Ok(self.to_menu(prompts::cancelled()))
                } else {
                    let summary = prompts::confirm_summary(specialty, provider, slot, patient);
                    Ok(self.stay(
                        DialogState::Wizard(wizard.clone()),
                        prompts::confirm_expected(&summary),
                    ))
                }
            }
        }
    }

    async fn choose_specialty(&self, input: &str) -> DialogResult<Transition> {
        let specialties = self.scheduling.list_specialties().await?;
        if specialties.is_empty() {
            return Ok(self.to_menu(prompts::no_specialties()));
        }
        let Some(specialty) = pick(&specialties, input) else {
            return Ok(self.stay(
                DialogState::Wizard(WizardState::Specialty),
                prompts::invalid_choice(specialties.len(), &prompts::specialty_list(&specialties)),
            ));
        };

        let providers = self.scheduling.list_providers_by_specialty(specialty).await?;
        if providers.is_empty() {
            return Ok(self.stay(
                DialogState::Wizard(WizardState::Specialty),
                prompts::no_providers(specialty, &specialties),
            ));
        }
        Ok(self.stay(
            DialogState::Wizard(WizardState::Provider {
                specialty: specialty.clone(),
            }),
            prompts::provider_list(specialty, &providers),
        ))
    }

    async fn choose_provider(&self, specialty: &str, input: &str) -> DialogResult<Transition> {
        let current = DialogState::Wizard(WizardState::Provider {
            specialty: specialty.to_string(),
        });
        let providers = self.scheduling.list_providers_by_specialty(specialty).await?;
        if providers.is_empty() {
            return self.start_wizard().await;
        }
        let Some(provider) = pick(&providers, input) else {
            return Ok(self.stay(
                current,
                prompts::invalid_choice(
                    providers.len(),
                    &prompts::provider_list(specialty, &providers),
                ),
            ));
        };

        let slots = self.scheduling.list_available_slots(&provider.id).await?;
        if slots.is_empty() {
            return Ok(self.stay(current, prompts::no_slots(provider, specialty, &providers)));
        }
        Ok(self.stay(
            DialogState::Wizard(WizardState::Slot {
                specialty: specialty.to_string(),
                provider: provider.clone(),
            }),
            prompts::slot_list(provider, &slots),
        ))
    }

    /// A chrome reply that leaves the caller in `next`.
    fn stay(&self, next: DialogState, body: String) -> Transition {
        self.finish(next, body, Channel::Chrome)
    }

    fn to_menu(&self, body: String) -> Transition {
        Transition {
            next: DialogState::Menu,
            reply: body,
            channel: Channel::Chrome,
        }
    }

    /// A reply leaving the caller in `next`, followed by the reset hint
    /// unless `next` is the menu.
    pub fn finish(&self, next: DialogState, body: String, channel: Channel) -> Transition {
        let reply = match (&next, self.hint_token()) {
            (DialogState::Menu, _) | (_, None) => body,
            (_, Some(token)) => format!("{body}\n\n{}", prompts::reset_hint(token)),
        };
        Transition {
            next,
            reply,
            channel,
        }
    }

    fn hint_token(&self) -> Option<&str> {
        if !self.settings.reset_hint {
            return None;
        }
        self.settings
            .reset_tokens
            .iter()
            .map(|t| t.trim())
            .find(|t| !t.is_empty())
    }
}

/// 1-based choice from `items`.
fn pick<'a, T>(items: &'a [T], input: &str) -> Option<&'a T> {
    let choice: usize = input.trim().parse().ok()?;
    items.get(choice.checked_sub(1)?)
}
