//! The record store seam between the scheduling service and durable storage.
//!
//! Two implementations exist: [`memory::MemoryStore`] for development and
//! tests, and [`postgres::PostgresStore`] for production. The backend is
//! chosen explicitly from configuration at startup.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::StoreResult;
use crate::model::appointment::{Appointment, AppointmentChanges, NewAppointment};
use crate::model::customer::{Customer, CustomerChanges, NewCustomer};
use crate::model::pet::{NewPet, Pet, PetChanges};
use crate::model::user::User;

pub mod memory;
pub mod postgres;

/// Query parameters for customer listings.
#[derive(Debug, Clone, Default)]
pub struct CustomerFilter {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub search: Option<String>,
    pub active: Option<bool>,
}

/// Keyed storage for clinic records.
///
/// The slot-probe methods (`find_vet_slot`, `find_pet_slot`) match on the
/// exact scheduled instant of non-cancelled appointments; `exclude` omits
/// one appointment id so an update does not conflict with itself. Both
/// implementations additionally enforce the slot invariants inside
/// `insert_appointment`/`update_appointment`, so a lost race between the
/// probe and the write still cannot double-book.
#[async_trait]
pub trait RecordStore: Send + Sync {
    // Appointments
    async fn find_vet_slot(
        &self,
        veterinarian_id: Uuid,
        at: DateTime<Utc>,
        exclude: Option<Uuid>,
    ) -> StoreResult<Option<Appointment>>;

    async fn find_pet_slot(
        &self,
        pet_id: Uuid,
        at: DateTime<Utc>,
        exclude: Option<Uuid>,
    ) -> StoreResult<Option<Appointment>>;

    async fn appointment_by_id(&self, id: Uuid) -> StoreResult<Option<Appointment>>;

    /// Lists appointments ordered ascending by scheduled instant, optionally
    /// restricted to a `[start, end)` range and/or a status name.
    async fn list_appointments(
        &self,
        range: Option<(DateTime<Utc>, DateTime<Utc>)>,
        status: Option<&str>,
    ) -> StoreResult<Vec<Appointment>>;

    async fn insert_appointment(&self, record: NewAppointment) -> StoreResult<Appointment>;

    /// Applies a partial update, bumping `updated_at`. Returns `None` when
    /// no appointment has the given id.
    async fn update_appointment(
        &self,
        id: Uuid,
        changes: AppointmentChanges,
    ) -> StoreResult<Option<Appointment>>;

    // Customers
    async fn list_customers(&self, filter: CustomerFilter) -> StoreResult<Vec<Customer>>;

    async fn customer_by_id(&self, id: Uuid) -> StoreResult<Option<Customer>>;

    async fn customer_by_email(
        &self,
        email: &str,
        exclude: Option<Uuid>,
    ) -> StoreResult<Option<Customer>>;

    async fn customer_by_phone(
        &self,
        phone: &str,
        exclude: Option<Uuid>,
    ) -> StoreResult<Option<Customer>>;

    async fn insert_customer(&self, record: NewCustomer) -> StoreResult<Customer>;

    async fn update_customer(
        &self,
        id: Uuid,
        changes: CustomerChanges,
    ) -> StoreResult<Option<Customer>>;

    // Pets
    async fn list_pets(&self, customer_id: Option<Uuid>) -> StoreResult<Vec<Pet>>;

    async fn pet_by_id(&self, id: Uuid) -> StoreResult<Option<Pet>>;

    async fn pet_by_microchip(
        &self,
        microchip: &str,
        exclude: Option<Uuid>,
    ) -> StoreResult<Option<Pet>>;

    async fn insert_pet(&self, record: NewPet) -> StoreResult<Pet>;

    async fn update_pet(&self, id: Uuid, changes: PetChanges) -> StoreResult<Option<Pet>>;

    // Users
    async fn list_users(&self, role: Option<&str>) -> StoreResult<Vec<User>>;
}
