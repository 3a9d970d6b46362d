use thiserror::Error;

use vetdesk_db::error::StoreError;

/// Service layer errors.
///
/// Every variant carries a stable machine-readable kind alongside its
/// human-readable message, so the API layer and any client can dispatch on
/// the kind instead of pattern-matching message text. Validation errors
/// additionally name the offending request field.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    #[error("This veterinarian already has an appointment at this time")]
    VeterinarianSlotConflict,

    #[error("This pet already has an appointment at this time")]
    PetSlotConflict,

    #[error("Appointments can only be rescheduled more than 60 minutes before their current time")]
    LockoutWindowViolation,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error(transparent)]
    Store(StoreError),
}

impl ServiceError {
    /// The machine-readable error kind, stable across message wording.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation_error",
            Self::VeterinarianSlotConflict => "veterinarian_slot_conflict",
            Self::PetSlotConflict => "pet_slot_conflict",
            Self::LockoutWindowViolation => "lockout_window_violation",
            Self::NotFound(_) => "not_found",
            Self::Store(_) => "store_error",
        }
    }

    /// The request field a validation error points at, if any.
    #[must_use]
    pub const fn field(&self) -> Option<&'static str> {
        match self {
            Self::Validation { field, .. } => Some(field),
            _ => None,
        }
    }
}

impl From<StoreError> for ServiceError {
    /// Unique-constraint violations from the store are the backstop for the
    /// same invariants the service probes for up front, so they map onto
    /// the identical user-facing errors.
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::VetSlotTaken => Self::VeterinarianSlotConflict,
            StoreError::PetSlotTaken => Self::PetSlotConflict,
            StoreError::Duplicate(field) => Self::Validation {
                field,
                message: format!("A record with this {field} already exists"),
            },
            other => Self::Store(other),
        }
    }
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;
