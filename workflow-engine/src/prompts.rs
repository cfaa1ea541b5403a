//! Reply texts.
//!
//! Every prompt that opens a step contains that step's marker phrase, which
//! is how transcripts written before the step was persisted are read back.
//! Texts that only decorate a reply (the reset hint, apologies, results)
//! must not contain any marker.

use crate::scheduling::{Provider, Slot};
use crate::state::{DialogStep, PatientContact, WizardStage};
use std::fmt::Write;

/// Marker phrases, most specific first. Matching is case-insensitive.
pub const STEP_MARKERS: [(&str, DialogStep); 8] = [
    ("confirm the appointment", DialogStep::Wizard(WizardStage::Confirm)),
    ("patient's full name", DialogStep::Wizard(WizardStage::PatientData)),
    ("available times", DialogStep::Wizard(WizardStage::Slot)),
    ("available providers", DialogStep::Wizard(WizardStage::Provider)),
    ("available specialties", DialogStep::Wizard(WizardStage::Specialty)),
    ("referral document", DialogStep::Authorization),
    ("question assistant", DialogStep::FreeQa),
    ("choose an option", DialogStep::Menu),
];

pub const MENU: &str = "Choose an option:\n\
                        1 - Ask a question\n\
                        2 - Book an appointment\n\
                        3 - Check procedure authorization";

pub const WELCOME: &str = "Hello! Welcome to the clinic assistant.";

pub const FREE_QA_ACTIVATED: &str =
    "You are now talking to the question assistant. Ask anything about the clinic: \
     opening hours, units, health plans or exams.";

pub const AUTHORIZATION_REQUEST: &str =
    "Please send the referral document (PDF or image), or paste its text here. \
     I will look up the requested procedure and its audit period.";

pub const AUTHORIZATION_AGAIN: &str = "You can send another referral document to check.";

pub const PATIENT_DATA_REQUEST: &str =
    "Please send the patient's full name and phone number, separated by a comma.\n\
     Example: Maria Silva, (11) 98765-4321";

pub fn menu() -> String {
    MENU.to_string()
}

pub fn welcome() -> String {
    format!("{WELCOME}\n\n{MENU}")
}

pub fn invalid_menu_option() -> String {
    format!("Invalid option. Type 1, 2 or 3.\n\n{MENU}")
}

pub fn no_specialties() -> String {
    format!("Sorry, no specialties are available for booking right now.\n\n{MENU}")
}

pub fn booked(code: &str) -> String {
    format!("Your appointment is booked! Confirmation code: {code}\n\n{MENU}")
}

pub fn cancelled() -> String {
    format!("Booking cancelled.\n\n{MENU}")
}

pub fn apology() -> String {
    format!("Sorry, something went wrong on our side. Please try again in a moment.\n\n{MENU}")
}

pub fn reset_hint(token: &str) -> String {
    format!("Type {token} at any time to return to the main menu.")
}

pub fn specialty_list(specialties: &[String]) -> String {
    format!(
        "Here are the available specialties:\n{}\n\nType the number of the specialty.",
        numbered(specialties.iter().map(String::as_str))
    )
}

pub fn provider_list(specialty: &str, providers: &[Provider]) -> String {
    format!(
        "Here are the available providers for {specialty}:\n{}\n\nType the number of the provider.",
        numbered(providers.iter().map(Provider::label))
    )
}

pub fn slot_list(provider: &Provider, slots: &[Slot]) -> String {
    format!(
        "Here are the available times with {}:\n{}\n\nType the number of the time you prefer.",
        provider.name,
        numbered(slots.iter().map(Slot::label))
    )
}

pub fn no_providers(specialty: &str, specialties: &[String]) -> String {
    format!(
        "Sorry, there are no providers available for {specialty} right now.\n\n{}",
        specialty_list(specialties)
    )
}

pub fn no_slots(provider: &Provider, specialty: &str, providers: &[Provider]) -> String {
    format!(
        "Sorry, {} has no open slots right now.\n\n{}",
        provider.name,
        provider_list(specialty, providers)
    )
}

pub fn invalid_choice(count: usize, list: &str) -> String {
    format!("Invalid option. Type a number between 1 and {count}.\n\n{list}")
}

pub fn invalid_patient_data(reason: &str) -> String {
    format!("Sorry, I could not read that: {reason}.\n\n{PATIENT_DATA_REQUEST}")
}

pub fn confirm_summary(
    specialty: &str,
    provider: &Provider,
    slot: &Slot,
    patient: &PatientContact,
) -> String {
    format!(
        "Please review your booking:\n\
         Specialty: {specialty}\n\
         Provider: {}\n\
         Time: {}\n\
         Patient: {} ({})\n\n\
         Type CONFIRM to confirm the appointment or CANCEL to discard it.",
        provider.label(),
        slot.label(),
        patient.name,
        patient.phone
    )
}

pub fn confirm_expected(summary: &str) -> String {
    format!("Please type CONFIRM or CANCEL.\n\n{summary}")
}

/// The step whose marker appears in `text`, testing the most specific first.
pub fn classify_text(text: &str) -> Option<DialogStep> {
    let text = text.to_lowercase();
    STEP_MARKERS
        .iter()
        .find(|(marker, _)| text.contains(marker))
        .map(|(_, step)| *step)
}

fn numbered<I, S>(items: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = String::new();
    for (index, item) in items.into_iter().enumerate() {
        if index > 0 {
            out.push('\n');
        }
        let _ = write!(out, "{}. {}", index + 1, item.as_ref());
    }
    out
}
