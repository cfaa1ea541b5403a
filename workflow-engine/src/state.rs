//! Dialog states. Each wizard variant carries exactly the data collected so
//! far, so a confirmation without a phone number cannot be built.

use crate::scheduling::{Provider, Slot};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", content = "wizard", rename_all = "snake_case")]
pub enum DialogState {
    Menu,
    FreeQa,
    /// Document-based prior-authorization lookup (menu option 3).
    Authorization,
    Wizard(WizardState),
}

impl DialogState {
    pub fn step(&self) -> DialogStep {
        match self {
            Self::Menu => DialogStep::Menu,
            Self::FreeQa => DialogStep::FreeQa,
            Self::Authorization => DialogStep::Authorization,
            Self::Wizard(wizard) => DialogStep::Wizard(wizard.stage()),
        }
    }

    pub fn wizard(&self) -> Option<&WizardState> {
        match self {
            Self::Wizard(wizard) => Some(wizard),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum WizardState {
    Specialty,
    Provider {
        specialty: String,
    },
    Slot {
        specialty: String,
        provider: Provider,
    },
    PatientData {
        specialty: String,
        provider: Provider,
        slot: Slot,
    },
    Confirm {
        specialty: String,
        provider: Provider,
        slot: Slot,
        patient: PatientContact,
    },
}

/// Read-only view of what the wizard has collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CapturedFields<'a> {
    pub specialty: Option<&'a str>,
    pub provider_id: Option<&'a str>,
    pub slot_id: Option<&'a str>,
    pub patient_name: Option<&'a str>,
    pub patient_phone: Option<&'a str>,
}

impl WizardState {
    pub fn stage(&self) -> WizardStage {
        match self {
            Self::Specialty => WizardStage::Specialty,
            Self::Provider { .. } => WizardStage::Provider,
            Self::Slot { .. } => WizardStage::Slot,
            Self::PatientData { .. } => WizardStage::PatientData,
            Self::Confirm { .. } => WizardStage::Confirm,
        }
    }

    pub fn captured(&self) -> CapturedFields<'_> {
        match self {
            Self::Specialty => CapturedFields::default(),
            Self::Provider { specialty } => CapturedFields {
                specialty: Some(specialty),
                ..Default::default()
            },
            Self::Slot {
                specialty,
                provider,
            } => CapturedFields {
                specialty: Some(specialty),
                provider_id: Some(&provider.id),
                ..Default::default()
            },
            Self::PatientData {
                specialty,
                provider,
                slot,
            } => CapturedFields {
                specialty: Some(specialty),
                provider_id: Some(&provider.id),
                slot_id: Some(&slot.id),
                ..Default::default()
            },
            Self::Confirm {
                specialty,
                provider,
                slot,
                patient,
            } => CapturedFields {
                specialty: Some(specialty),
                provider_id: Some(&provider.id),
                slot_id: Some(&slot.id),
                patient_name: Some(&patient.name),
                patient_phone: Some(&patient.phone),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WizardStage {
    Specialty,
    Provider,
    Slot,
    PatientData,
    Confirm,
}

impl WizardStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Specialty => "specialty",
            Self::Provider => "provider",
            Self::Slot => "slot",
            Self::PatientData => "patient_data",
            Self::Confirm => "confirm",
        }
    }
}

/// A step without its data, as recovered from transcript markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DialogStep {
    Menu,
    FreeQa,
    Authorization,
    Wizard(WizardStage),
}

impl fmt::Display for DialogStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Menu => f.write_str("menu"),
            Self::FreeQa => f.write_str("free_qa"),
            Self::Authorization => f.write_str("authorization"),
            Self::Wizard(stage) => write!(f, "wizard.{}", stage.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientContact {
    pub name: String,
    pub phone: String,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatientDataError {
    #[error("expected the name and the phone separated by a comma")]
    MissingSeparator,

    #[error("the patient name is empty")]
    EmptyName,

    #[error("the phone number is not valid")]
    InvalidPhone,
}

impl PatientContact {
    /// Parse `"Full Name, Phone"`. The phone is whatever follows the last comma.
    pub fn parse(input: &str) -> Result<Self, PatientDataError> {
        let (name, phone) = input
            .rsplit_once(',')
            .ok_or(PatientDataError::MissingSeparator)?;
        let name = name.split_whitespace().collect::<Vec<_>>().join(" ");
        let phone = phone.trim();

        if !name.chars().any(char::is_alphabetic) {
            return Err(PatientDataError::EmptyName);
        }
        if !is_valid_phone(phone) {
            return Err(PatientDataError::InvalidPhone);
        }

        Ok(Self {
            name,
            phone: phone.to_string(),
        })
    }
}

/// 10 to 13 digits, optionally with `+`, spaces, parentheses, dots and dashes.
pub fn is_valid_phone(phone: &str) -> bool {
    let body = phone.strip_prefix('+').unwrap_or(phone);
    let well_formed = body
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '(' | ')' | '.' | '-'));
    let digits = body.chars().filter(char::is_ascii_digit).count();
    well_formed && (10..=13).contains(&digits)
}
