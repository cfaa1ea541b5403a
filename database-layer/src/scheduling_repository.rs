use crate::connection::DatabasePool;
use crate::error::{DatabaseError, DatabaseResult};
use async_trait::async_trait;
use chrono::{Duration, Local, NaiveDateTime, Utc};
use sqlx::{PgPool, Row};
use tracing::{debug, info, warn};
use workflow_engine::{
    confirmation_code, DialogError, DialogResult, Provider, SchedulingDirectory, Slot, SlotWindow,
};

/// Scheduling directory over the `providers`, `slots` and `bookings` tables.
pub struct PostgresSchedulingDirectory {
    pool: PgPool,
    window: SlotWindow,
}

impl PostgresSchedulingDirectory {
    pub fn new(pool: &DatabasePool, window: SlotWindow) -> Self {
        Self {
            pool: pool.pool().clone(),
            window,
        }
    }

    async fn specialties(&self) -> DatabaseResult<Vec<String>> {
        let rows: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT DISTINCT btrim(specialty) AS specialty
            FROM providers
            WHERE btrim(specialty) <> ''
            ORDER BY specialty ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn providers(&self, specialty: &str) -> DatabaseResult<Vec<Provider>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, specialty, location
            FROM providers
            WHERE lower(btrim(specialty)) = lower(btrim($1))
            ORDER BY name ASC, id ASC
            "#,
        )
        .bind(specialty)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(Provider {
                    id: row.try_get("id")?,
                    name: row.try_get("name")?,
                    specialty: row.try_get("specialty")?,
                    location: row.try_get("location")?,
                })
            })
            .collect()
    }

    async fn slots(&self, provider_id: &str, start: NaiveDateTime) -> DatabaseResult<Vec<Slot>> {
        let end = start + Duration::days(i64::from(self.window.days_ahead));
        let limit = i64::try_from(self.window.max_slots).unwrap_or(i64::MAX);
        let rows = sqlx::query(
            r#"
            SELECT id, provider_id, starts_at
            FROM slots
            WHERE provider_id = $1
              AND available
              AND starts_at >= $2
              AND starts_at <= $3
            ORDER BY starts_at ASC, id ASC
            LIMIT $4
            "#,
        )
        .bind(provider_id)
        .bind(start)
        .bind(end)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(Slot {
                    id: row.try_get("id")?,
                    provider_id: row.try_get("provider_id")?,
                    starts_at: row.try_get("starts_at")?,
                })
            })
            .collect()
    }

    async fn book(
        &self,
        slot_id: &str,
        patient_name: &str,
        patient_phone: &str,
    ) -> DatabaseResult<String> {
        let mut tx = self.pool.begin().await?;

        let claimed: Option<String> = sqlx::query_scalar(
            r#"
            UPDATE slots SET available = false
            WHERE id = $1 AND available
            RETURNING provider_id
            "#,
        )
        .bind(slot_id)
        .fetch_optional(&mut *tx)
        .await?;

        if claimed.is_none() {
            let exists: Option<String> =
                sqlx::query_scalar("SELECT id FROM slots WHERE id = $1")
                    .bind(slot_id)
                    .fetch_optional(&mut *tx)
                    .await?;
            return Err(match exists {
                Some(_) => DatabaseError::SlotTaken {
                    slot_id: slot_id.to_string(),
                },
                None => DatabaseError::QueryFailed(format!("unknown slot {slot_id}")),
            });
        }

        let booked_at = Utc::now();
        let sequence: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO booking_sequences (month, last_value)
            VALUES ($1, 1)
            ON CONFLICT (month) DO UPDATE SET last_value = booking_sequences.last_value + 1
            RETURNING last_value
            "#,
        )
        .bind(booked_at.format("%Y%m").to_string())
        .fetch_one(&mut *tx)
        .await?;
        let sequence = u32::try_from(sequence)
            .map_err(|_| DatabaseError::Corrupt(format!("booking sequence {sequence}")))?;
        let code = confirmation_code(booked_at, sequence);

        sqlx::query(
            r#"
            INSERT INTO bookings (confirmation_code, slot_id, patient_name, patient_phone, booked_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&code)
        .bind(slot_id)
        .bind(patient_name)
        .bind(patient_phone)
        .bind(booked_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        info!(slot_id, code = %code, "Booking committed");
        Ok(code)
    }
}

/// Directory failures other than a lost slot surface as scheduling errors.
fn scheduling_error(err: DatabaseError) -> DialogError {
    match err {
        DatabaseError::SlotTaken { slot_id } => DialogError::SlotTaken { slot_id },
        other => {
            warn!(error = %other, "Scheduling query failed");
            DialogError::Scheduling(other.to_string())
        }
    }
}

#[async_trait]
impl SchedulingDirectory for PostgresSchedulingDirectory {
    async fn list_specialties(&self) -> DialogResult<Vec<String>> {
        self.specialties().await.map_err(scheduling_error)
    }

    async fn list_providers_by_specialty(&self, specialty: &str) -> DialogResult<Vec<Provider>> {
        self.providers(specialty).await.map_err(scheduling_error)
    }

    async fn list_available_slots(&self, provider_id: &str) -> DialogResult<Vec<Slot>> {
        let slots = self
            .slots(provider_id, Local::now().naive_local())
            .await
            .map_err(scheduling_error)?;
        debug!(provider_id, count = slots.len(), "Listed available slots");
        Ok(slots)
    }

    async fn commit_booking(
        &self,
        slot_id: &str,
        patient_name: &str,
        patient_phone: &str,
    ) -> DialogResult<String> {
        self.book(slot_id, patient_name, patient_phone)
            .await
            .map_err(scheduling_error)
    }
}
