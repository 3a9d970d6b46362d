use std::fmt;
use std::io::Write;

use chrono::{DateTime, Utc};
use diesel::deserialize::{self, FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::pg::{Pg, PgValue};
use diesel::prelude::*;
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::sql_types::Text;
use serde::{Deserialize, Serialize};

use crate::db::schema;

/// Appointment lifecycle state.
///
/// Maps to the `appointment.status` CHECK constraint. Cancellation is a
/// status transition, never a row delete, and a cancelled appointment no
/// longer occupies its slot.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    AsExpression,
    FromSqlRow,
    Serialize,
    Deserialize,
)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Urgent,
    Cancelled,
    Completed,
}

impl AppointmentStatus {
    /// Returns the database string representation of this status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Urgent => "urgent",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
        }
    }

    /// Parses the database/wire representation of a status.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "pending" => Some(Self::Pending),
            "confirmed" => Some(Self::Confirmed),
            "urgent" => Some(Self::Urgent),
            "cancelled" => Some(Self::Cancelled),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToSql<Text, Pg> for AppointmentStatus {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        out.write_all(self.as_str().as_bytes())?;
        Ok(IsNull::No)
    }
}

impl FromSql<Text, Pg> for AppointmentStatus {
    fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
        let name = std::str::from_utf8(bytes.as_bytes())?;
        Self::from_name(name).ok_or_else(|| "Unrecognized enum variant".into())
    }
}

/// A booked appointment.
///
/// `appointment_date` is the scheduled instant the conflict rules key on,
/// held at millisecond precision.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(table_name = schema::appointment)]
#[diesel(check_for_backend(Pg))]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: uuid::Uuid,
    pub pet_id: uuid::Uuid,
    pub customer_id: uuid::Uuid,
    pub veterinarian_id: Option<uuid::Uuid>,
    pub appointment_date: DateTime<Utc>,
    pub appointment_type: String,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for a new appointment. The store assigns the id and the
/// `created_at`/`updated_at` timestamps.
#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub pet_id: uuid::Uuid,
    pub customer_id: uuid::Uuid,
    pub veterinarian_id: Option<uuid::Uuid>,
    pub appointment_date: DateTime<Utc>,
    pub appointment_type: String,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
}

/// Partial update for an appointment. `None` fields are left unchanged;
/// the store bumps `updated_at` on every successful write.
#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = schema::appointment)]
pub struct AppointmentChanges {
    pub veterinarian_id: Option<uuid::Uuid>,
    pub appointment_date: Option<DateTime<Utc>>,
    pub appointment_type: Option<String>,
    pub status: Option<AppointmentStatus>,
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_names() {
        for status in [
            AppointmentStatus::Pending,
            AppointmentStatus::Confirmed,
            AppointmentStatus::Urgent,
            AppointmentStatus::Cancelled,
            AppointmentStatus::Completed,
        ] {
            assert_eq!(AppointmentStatus::from_name(status.as_str()), Some(status));
        }
        assert_eq!(AppointmentStatus::from_name("rescheduled"), None);
    }

    #[test]
    fn appointment_serializes_with_wire_field_names() {
        let appointment = Appointment {
            id: uuid::Uuid::nil(),
            pet_id: uuid::Uuid::nil(),
            customer_id: uuid::Uuid::nil(),
            veterinarian_id: None,
            appointment_date: chrono::Utc::now(),
            appointment_type: "checkup".to_string(),
            status: AppointmentStatus::Pending,
            notes: None,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };

        let value = serde_json::to_value(&appointment).expect("serializes");
        let object = value.as_object().expect("object");

        for key in [
            "id",
            "petId",
            "customerId",
            "veterinarianId",
            "appointmentDate",
            "appointmentType",
            "status",
            "notes",
            "createdAt",
            "updatedAt",
        ] {
            assert!(object.contains_key(key), "missing field {key}");
        }
        // Nullable fields must be present as explicit nulls
        assert!(object["veterinarianId"].is_null());
        assert!(object["notes"].is_null());
        assert_eq!(object["status"], "pending");
    }
}
