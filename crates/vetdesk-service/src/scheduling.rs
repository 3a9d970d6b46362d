//! Appointment scheduling: validation, conflict detection, and the
//! reschedule lockout rule.
//!
//! Conflicts key on the exact scheduled instant, not an overlap window:
//! two appointments one minute apart for the same veterinarian do not
//! conflict. Cancelled appointments never occupy a slot.

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use vetdesk_core::constants::RESCHEDULE_LOCKOUT_MINUTES;
use vetdesk_core::util::time::{local_day_bounds, parse_day_filter, parse_instant};
use vetdesk_db::model::appointment::{
    Appointment, AppointmentChanges, AppointmentStatus, NewAppointment,
};
use vetdesk_db::store::RecordStore;

use crate::error::{ServiceError, ServiceResult};

/// Booking request as received from the API layer. Dates arrive as strings
/// and are parsed and normalized here.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAppointmentRequest {
    pub pet_id: Option<Uuid>,
    pub customer_id: Option<Uuid>,
    pub veterinarian_id: Option<Uuid>,
    pub appointment_date: Option<String>,
    pub appointment_type: Option<String>,
    pub status: Option<String>,
    pub notes: Option<String>,
}

/// Partial update request. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAppointmentRequest {
    pub veterinarian_id: Option<Uuid>,
    pub appointment_date: Option<String>,
    pub appointment_type: Option<String>,
    pub status: Option<String>,
    pub notes: Option<String>,
}

/// Listing filters. `date` restricts to the local calendar day containing
/// it; `status` is matched by exact name.
#[derive(Debug, Clone, Default)]
pub struct AppointmentQuery {
    pub date: Option<String>,
    pub status: Option<String>,
}

/// The scheduling core. Stateless between requests; every call performs
/// its own read-then-write sequence against the record store, whose
/// unique constraints are the true enforcement behind the probes here.
#[derive(Clone)]
pub struct Scheduler {
    store: Arc<dyn RecordStore>,
}

fn parse_status(raw: &str) -> ServiceResult<AppointmentStatus> {
    AppointmentStatus::from_name(raw).ok_or_else(|| ServiceError::Validation {
        field: "status",
        message: format!("Unknown appointment status: {raw}"),
    })
}

fn parse_date_field(raw: &str) -> ServiceResult<chrono::DateTime<Utc>> {
    parse_instant(raw).ok_or_else(|| ServiceError::Validation {
        field: "appointmentDate",
        message: format!("Invalid appointment date format: {raw}"),
    })
}

fn required<T>(value: Option<T>, field: &'static str) -> ServiceResult<T> {
    value.ok_or_else(|| ServiceError::Validation {
        field,
        message: format!("{field} is required"),
    })
}

fn clean_notes(notes: Option<String>) -> Option<String> {
    notes.filter(|n| !n.trim().is_empty())
}

impl Scheduler {
    #[must_use]
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// ## Summary
    /// Books a new appointment.
    ///
    /// Validates required fields, parses and normalizes the scheduled
    /// instant, probes for veterinarian and pet slot conflicts, and
    /// inserts on success.
    ///
    /// ## Errors
    /// - `Validation` for missing/unparseable fields
    /// - `VeterinarianSlotConflict` / `PetSlotConflict` when the instant
    ///   is already booked
    #[tracing::instrument(skip(self, request))]
    pub async fn create(&self, request: CreateAppointmentRequest) -> ServiceResult<Appointment> {
        let pet_id = required(request.pet_id, "petId")?;
        let customer_id = required(request.customer_id, "customerId")?;
        let appointment_type = required(request.appointment_type, "appointmentType")?;
        let raw_date = required(request.appointment_date, "appointmentDate")?;

        let at = parse_date_field(&raw_date)?;
        let status = match request.status.as_deref() {
            Some(raw) => parse_status(raw)?,
            None => AppointmentStatus::Pending,
        };

        if let Some(veterinarian_id) = request.veterinarian_id {
            if self
                .store
                .find_vet_slot(veterinarian_id, at, None)
                .await?
                .is_some()
            {
                return Err(ServiceError::VeterinarianSlotConflict);
            }
        }
        if self.store.find_pet_slot(pet_id, at, None).await?.is_some() {
            return Err(ServiceError::PetSlotConflict);
        }

        let created = self
            .store
            .insert_appointment(NewAppointment {
                pet_id,
                customer_id,
                veterinarian_id: request.veterinarian_id,
                appointment_date: at,
                appointment_type,
                status,
                notes: clean_notes(request.notes),
            })
            .await?;

        tracing::info!(appointment_id = %created.id, at = %created.appointment_date, "Appointment booked");
        Ok(created)
    }

    /// ## Summary
    /// Applies a partial update to an appointment.
    ///
    /// Rescheduling (changing the instant to a different value) is only
    /// allowed more than 60 minutes before the *existing* scheduled time,
    /// and re-runs the conflict probes against the new instant. Updates
    /// that leave the instant alone (status, notes) bypass the lockout.
    ///
    /// ## Errors
    /// - `NotFound` when no appointment has the id
    /// - `LockoutWindowViolation` for a too-late reschedule
    /// - `VeterinarianSlotConflict` / `PetSlotConflict` on the new instant
    #[tracing::instrument(skip(self, request))]
    pub async fn update(
        &self,
        id: Uuid,
        request: UpdateAppointmentRequest,
    ) -> ServiceResult<Appointment> {
        let existing = self
            .store
            .appointment_by_id(id)
            .await?
            .ok_or(ServiceError::NotFound("Appointment"))?;

        let mut changes = AppointmentChanges {
            veterinarian_id: request.veterinarian_id,
            appointment_type: request.appointment_type,
            notes: clean_notes(request.notes),
            ..AppointmentChanges::default()
        };
        if let Some(raw) = request.status.as_deref() {
            changes.status = Some(parse_status(raw)?);
        }

        if let Some(raw) = request.appointment_date.as_deref() {
            let at = parse_date_field(raw)?;
            if at != existing.appointment_date {
                let minutes_until = (existing.appointment_date - Utc::now()).num_minutes();
                if minutes_until < RESCHEDULE_LOCKOUT_MINUTES {
                    return Err(ServiceError::LockoutWindowViolation);
                }

                if let Some(veterinarian_id) = existing.veterinarian_id {
                    if self
                        .store
                        .find_vet_slot(veterinarian_id, at, Some(id))
                        .await?
                        .is_some()
                    {
                        return Err(ServiceError::VeterinarianSlotConflict);
                    }
                }
                if self
                    .store
                    .find_pet_slot(existing.pet_id, at, Some(id))
                    .await?
                    .is_some()
                {
                    return Err(ServiceError::PetSlotConflict);
                }

                changes.appointment_date = Some(at);
            }
        }

        let updated = self
            .store
            .update_appointment(id, changes)
            .await?
            .ok_or(ServiceError::NotFound("Appointment"))?;

        tracing::info!(appointment_id = %updated.id, "Appointment updated");
        Ok(updated)
    }

    /// Fetches one appointment.
    ///
    /// ## Errors
    /// `NotFound` when no appointment has the id.
    pub async fn get(&self, id: Uuid) -> ServiceResult<Appointment> {
        self.store
            .appointment_by_id(id)
            .await?
            .ok_or(ServiceError::NotFound("Appointment"))
    }

    /// ## Summary
    /// Lists appointments, ascending by scheduled instant.
    ///
    /// A `date` filter restricts results to the local calendar day that
    /// contains it. An unparseable `date` is logged and ignored rather
    /// than failing the request; an unknown `status` simply matches
    /// nothing.
    ///
    /// ## Errors
    /// Propagates store errors.
    pub async fn list(&self, query: AppointmentQuery) -> ServiceResult<Vec<Appointment>> {
        let range = match query.date.as_deref() {
            Some(raw) => match parse_day_filter(raw) {
                Some(day) => Some(local_day_bounds(day)),
                None => {
                    tracing::warn!(filter = raw, "Ignoring unparseable date filter");
                    None
                }
            },
            None => None,
        };

        Ok(self
            .store
            .list_appointments(range, query.status.as_deref())
            .await?)
    }
}
