use thiserror::Error;

/// Record store errors.
///
/// The slot and duplicate variants surface unique-constraint enforcement
/// from whichever backend is active; the service layer maps them onto its
/// user-facing conflict errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("veterinarian already booked at this instant")]
    VetSlotTaken,

    #[error("pet already booked at this instant")]
    PetSlotTaken,

    #[error("duplicate value for {0}")]
    Duplicate(&'static str),

    #[error("Database error: {0}")]
    DatabaseError(#[from] diesel::result::Error),

    #[error("Pool error: {0}")]
    PoolError(#[from] diesel_async::pooled_connection::bb8::RunError),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
