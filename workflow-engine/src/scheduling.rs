use crate::error::{DialogError, DialogResult};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Local, NaiveDateTime, Utc};
use dashmap::DashMap;
use itertools::Itertools;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Read;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provider {
    pub id: String,
    pub name: String,
    pub specialty: String,
    #[serde(default)]
    pub location: Option<String>,
}

impl Provider {
    pub fn label(&self) -> String {
        match &self.location {
            Some(location) if !location.trim().is_empty() => {
                format!("{} ({})", self.name, location.trim())
            }
            _ => self.name.clone(),
        }
    }
}

/// A bookable appointment time, in clinic local time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub id: String,
    pub provider_id: String,
    pub starts_at: NaiveDateTime,
}

impl Slot {
    pub fn label(&self) -> String {
        self.starts_at.format("%d/%m/%Y %H:%M").to_string()
    }
}

/// Which slots are offered: the next `days_ahead` days, at most `max_slots`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotWindow {
    #[serde(default = "default_days_ahead")]
    pub days_ahead: u32,
    #[serde(default = "default_max_slots")]
    pub max_slots: usize,
}

fn default_days_ahead() -> u32 {
    30
}

fn default_max_slots() -> usize {
    10
}

impl Default for SlotWindow {
    fn default() -> Self {
        Self {
            days_ahead: default_days_ahead(),
            max_slots: default_max_slots(),
        }
    }
}

/// `AGD-YYYYMM-NNN`, numbered per calendar month.
pub fn confirmation_code(booked_at: DateTime<Utc>, sequence: u32) -> String {
    format!("AGD-{}-{:03}", booked_at.format("%Y%m"), sequence)
}

/// Specialties, providers and slots, plus the booking commit.
#[async_trait]
pub trait SchedulingDirectory: Send + Sync {
    async fn list_specialties(&self) -> DialogResult<Vec<String>>;

    async fn list_providers_by_specialty(&self, specialty: &str) -> DialogResult<Vec<Provider>>;

    async fn list_available_slots(&self, provider_id: &str) -> DialogResult<Vec<Slot>>;

    /// Claim the slot and return a confirmation code.
    ///
    /// Fails with [`DialogError::SlotTaken`] when the slot was booked in the meantime.
    async fn commit_booking(
        &self,
        slot_id: &str,
        patient_name: &str,
        patient_phone: &str,
    ) -> DialogResult<String>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub confirmation_code: String,
    pub slot_id: String,
    pub provider_id: String,
    pub patient_name: String,
    pub patient_phone: String,
    pub booked_at: DateTime<Utc>,
}

/// JSON shape accepted by [`InMemorySchedulingDirectory::from_json_reader`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScheduleFixture {
    pub providers: Vec<Provider>,
    pub slots: Vec<Slot>,
}

/// Where the offered window starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WindowAnchor {
    Unbounded,
    Fixed(NaiveDateTime),
    /// Clinic local time at each query.
    Now,
}

#[derive(Debug, Clone)]
struct SlotEntry {
    slot: Slot,
    available: bool,
}

/// In-memory directory for tests, demos and single-process deployments.
pub struct InMemorySchedulingDirectory {
    providers: Vec<Provider>,
    slots: Arc<DashMap<String, SlotEntry>>,
    bookings: Arc<DashMap<String, Booking>>,
    monthly_sequence: Mutex<HashMap<String, u32>>,
    window: SlotWindow,
    anchor: WindowAnchor,
}

impl InMemorySchedulingDirectory {
    pub fn new(providers: Vec<Provider>, slots: Vec<Slot>, window: SlotWindow) -> Self {
        let entries = DashMap::new();
        for slot in slots {
            entries.insert(
                slot.id.clone(),
                SlotEntry {
                    slot,
                    available: true,
                },
            );
        }
        Self {
            providers,
            slots: Arc::new(entries),
            bookings: Arc::new(DashMap::new()),
            monthly_sequence: Mutex::new(HashMap::new()),
            window,
            anchor: WindowAnchor::Unbounded,
        }
    }

    pub fn from_json_reader<R: Read>(reader: R, window: SlotWindow) -> DialogResult<Self> {
        let fixture: ScheduleFixture = serde_json::from_reader(reader)?;
        Ok(Self::new(fixture.providers, fixture.slots, window))
    }

    /// Only offer slots between `start` and `start + days_ahead`.
    pub fn with_window_start(mut self, start: NaiveDateTime) -> Self {
        self.anchor = WindowAnchor::Fixed(start);
        self
    }

    /// Only offer slots in the next `days_ahead` days, counted from each query.
    pub fn anchored_to_now(mut self) -> Self {
        self.anchor = WindowAnchor::Now;
        self
    }

    pub fn bookings(&self) -> Vec<Booking> {
        self.bookings
            .iter()
            .map(|entry| entry.value().clone())
            .sorted_by(|a, b| a.confirmation_code.cmp(&b.confirmation_code))
            .collect()
    }

    pub fn is_available(&self, slot_id: &str) -> bool {
        self.slots.get(slot_id).is_some_and(|entry| entry.available)
    }

    fn window_bounds(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let start = match self.anchor {
            WindowAnchor::Unbounded => return None,
            WindowAnchor::Fixed(start) => start,
            WindowAnchor::Now => Local::now().naive_local(),
        };
        Some((start, start + Duration::days(i64::from(self.window.days_ahead))))
    }

    fn next_code(&self, booked_at: DateTime<Utc>) -> String {
        let month = booked_at.format("%Y%m").to_string();
        let mut sequence = self.monthly_sequence.lock();
        let counter = sequence.entry(month).or_insert(0);
        *counter += 1;
        confirmation_code(booked_at, *counter)
    }
}

#[async_trait]
impl SchedulingDirectory for InMemorySchedulingDirectory {
    async fn list_specialties(&self) -> DialogResult<Vec<String>> {
        Ok(self
            .providers
            .iter()
            .map(|p| p.specialty.trim().to_string())
            .filter(|s| !s.is_empty())
            .sorted()
            .dedup()
            .collect())
    }

    async fn list_providers_by_specialty(&self, specialty: &str) -> DialogResult<Vec<Provider>> {
        Ok(self
            .providers
            .iter()
            .filter(|p| p.specialty.trim().eq_ignore_ascii_case(specialty.trim()))
            .cloned()
            .sorted_by(|a, b| a.name.cmp(&b.name))
            .collect())
    }

    async fn list_available_slots(&self, provider_id: &str) -> DialogResult<Vec<Slot>> {
        let bounds = self.window_bounds();
        let slots: Vec<Slot> = self
            .slots
            .iter()
            .filter(|entry| entry.available && entry.slot.provider_id == provider_id)
            .map(|entry| entry.slot.clone())
            .filter(|slot| {
                bounds.map_or(true, |(start, end)| {
                    slot.starts_at >= start && slot.starts_at <= end
                })
            })
            .sorted_by(|a, b| a.starts_at.cmp(&b.starts_at).then(a.id.cmp(&b.id)))
            .take(self.window.max_slots)
            .collect();
        debug!(provider_id, count = slots.len(), "Listed available slots");
        Ok(slots)
    }

    async fn commit_booking(
        &self,
        slot_id: &str,
        patient_name: &str,
        patient_phone: &str,
    ) -> DialogResult<String> {
        let provider_id = {
            let mut entry = self
                .slots
                .get_mut(slot_id)
                .ok_or_else(|| DialogError::Scheduling(format!("unknown slot {slot_id}")))?;
            if !entry.available {
                return Err(DialogError::SlotTaken {
                    slot_id: slot_id.to_string(),
                });
            }
            entry.available = false;
            entry.slot.provider_id.clone()
        };

        let booked_at = Utc::now();
        let code = self.next_code(booked_at);
        self.bookings.insert(
            code.clone(),
            Booking {
                confirmation_code: code.clone(),
                slot_id: slot_id.to_string(),
                provider_id,
                patient_name: patient_name.to_string(),
                patient_phone: patient_phone.to_string(),
                booked_at,
            },
        );
        info!(slot_id, code = %code, "Booking committed");
        Ok(code)
    }
}
