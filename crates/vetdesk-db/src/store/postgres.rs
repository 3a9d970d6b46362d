//! Postgres-backed record store.
//!
//! The slot and duplicate invariants are enforced by partial unique
//! indexes (see the migrations); unique violations are mapped back onto
//! [`StoreError`] variants by constraint name, so a race lost between a
//! probe and the write still surfaces as a conflict, not a 500.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::result::DatabaseErrorKind;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::db::connection::{DbConnection, DbPool};
use crate::db::schema::{app_user, appointment, customer, pet};
use crate::error::{StoreError, StoreResult};
use crate::model::appointment::{
    Appointment, AppointmentChanges, AppointmentStatus, NewAppointment,
};
use crate::model::customer::{Customer, CustomerChanges, NewCustomer};
use crate::model::pet::{NewPet, Pet, PetChanges};
use crate::model::user::User;
use crate::store::{CustomerFilter, RecordStore};

pub struct PostgresStore {
    pool: DbPool,
}

impl PostgresStore {
    #[must_use]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn conn(&self) -> StoreResult<DbConnection<'_>> {
        Ok(self.pool.get().await?)
    }
}

/// Maps a unique-constraint violation onto the store error the constraint
/// exists to enforce. Anything else passes through as a database error.
fn map_write_error(err: diesel::result::Error) -> StoreError {
    if let diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info) = err
    {
        match info.constraint_name() {
            Some("appointment_vet_slot_key") => return StoreError::VetSlotTaken,
            Some("appointment_pet_slot_key") => return StoreError::PetSlotTaken,
            Some("customer_email_key") => return StoreError::Duplicate("email"),
            Some("customer_phone_key") => return StoreError::Duplicate("phone"),
            Some("pet_microchip_key") => return StoreError::Duplicate("microchip"),
            _ => {}
        }
    }
    StoreError::DatabaseError(err)
}

#[derive(Insertable)]
#[diesel(table_name = appointment)]
struct AppointmentRow {
    id: Uuid,
    pet_id: Uuid,
    customer_id: Uuid,
    veterinarian_id: Option<Uuid>,
    appointment_date: DateTime<Utc>,
    appointment_type: String,
    status: AppointmentStatus,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = customer)]
struct CustomerRow {
    id: Uuid,
    name: String,
    email: String,
    phone: String,
    address: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = pet)]
struct PetRow {
    id: Uuid,
    customer_id: Uuid,
    name: String,
    species: String,
    breed: Option<String>,
    age: Option<i32>,
    weight: Option<String>,
    gender: Option<String>,
    microchip: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[async_trait]
impl RecordStore for PostgresStore {
    async fn find_vet_slot(
        &self,
        veterinarian_id: Uuid,
        at: DateTime<Utc>,
        exclude: Option<Uuid>,
    ) -> StoreResult<Option<Appointment>> {
        let mut conn = self.conn().await?;

        let mut query = appointment::table
            .filter(appointment::veterinarian_id.eq(veterinarian_id))
            .filter(appointment::appointment_date.eq(at))
            .filter(appointment::status.ne(AppointmentStatus::Cancelled.as_str()))
            .select(Appointment::as_select())
            .into_boxed();
        if let Some(id) = exclude {
            query = query.filter(appointment::id.ne(id));
        }

        let found = query.first(&mut conn).await.optional()?;
        Ok(found)
    }

    async fn find_pet_slot(
        &self,
        pet_id: Uuid,
        at: DateTime<Utc>,
        exclude: Option<Uuid>,
    ) -> StoreResult<Option<Appointment>> {
        let mut conn = self.conn().await?;

        let mut query = appointment::table
            .filter(appointment::pet_id.eq(pet_id))
            .filter(appointment::appointment_date.eq(at))
            .filter(appointment::status.ne(AppointmentStatus::Cancelled.as_str()))
            .select(Appointment::as_select())
            .into_boxed();
        if let Some(id) = exclude {
            query = query.filter(appointment::id.ne(id));
        }

        let found = query.first(&mut conn).await.optional()?;
        Ok(found)
    }

    async fn appointment_by_id(&self, id: Uuid) -> StoreResult<Option<Appointment>> {
        let mut conn = self.conn().await?;
        let found = appointment::table
            .find(id)
            .select(Appointment::as_select())
            .first(&mut conn)
            .await
            .optional()?;
        Ok(found)
    }

    async fn list_appointments(
        &self,
        range: Option<(DateTime<Utc>, DateTime<Utc>)>,
        status: Option<&str>,
    ) -> StoreResult<Vec<Appointment>> {
        let mut conn = self.conn().await?;

        let mut query = appointment::table
            .order((appointment::appointment_date.asc(), appointment::id.asc()))
            .select(Appointment::as_select())
            .into_boxed();
        if let Some((start, end)) = range {
            query = query
                .filter(appointment::appointment_date.ge(start))
                .filter(appointment::appointment_date.lt(end));
        }
        if let Some(status) = status {
            query = query.filter(appointment::status.eq(status.to_string()));
        }

        let found = query.load(&mut conn).await?;
        Ok(found)
    }

    async fn insert_appointment(&self, record: NewAppointment) -> StoreResult<Appointment> {
        let mut conn = self.conn().await?;
        let now = Utc::now();

        let row = AppointmentRow {
            id: Uuid::now_v7(),
            pet_id: record.pet_id,
            customer_id: record.customer_id,
            veterinarian_id: record.veterinarian_id,
            appointment_date: record.appointment_date,
            appointment_type: record.appointment_type,
            status: record.status,
            notes: record.notes,
            created_at: now,
            updated_at: now,
        };

        diesel::insert_into(appointment::table)
            .values(&row)
            .returning(Appointment::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_write_error)
    }

    async fn update_appointment(
        &self,
        id: Uuid,
        changes: AppointmentChanges,
    ) -> StoreResult<Option<Appointment>> {
        let mut conn = self.conn().await?;

        let result = diesel::update(appointment::table.find(id))
            .set((&changes, appointment::updated_at.eq(Utc::now())))
            .returning(Appointment::as_returning())
            .get_result(&mut conn)
            .await;

        match result {
            Ok(updated) => Ok(Some(updated)),
            Err(diesel::result::Error::NotFound) => Ok(None),
            Err(err) => Err(map_write_error(err)),
        }
    }

    async fn list_customers(&self, filter: CustomerFilter) -> StoreResult<Vec<Customer>> {
        let mut conn = self.conn().await?;

        let mut query = customer::table
            .order((customer::created_at.asc(), customer::id.asc()))
            .select(Customer::as_select())
            .into_boxed();
        if let Some(search) = filter.search.as_deref() {
            let pattern = format!("%{search}%");
            query = query.filter(
                customer::name
                    .ilike(pattern.clone())
                    .or(customer::email.ilike(pattern.clone()))
                    .or(customer::phone.like(pattern)),
            );
        }
        if let Some(active) = filter.active {
            query = query.filter(customer::is_active.eq(active));
        }

        let found = query
            .offset(filter.offset.unwrap_or(0))
            .limit(filter.limit.unwrap_or(100))
            .load(&mut conn)
            .await?;
        Ok(found)
    }

    async fn customer_by_id(&self, id: Uuid) -> StoreResult<Option<Customer>> {
        let mut conn = self.conn().await?;
        let found = customer::table
            .find(id)
            .select(Customer::as_select())
            .first(&mut conn)
            .await
            .optional()?;
        Ok(found)
    }

    async fn customer_by_email(
        &self,
        email: &str,
        exclude: Option<Uuid>,
    ) -> StoreResult<Option<Customer>> {
        let mut conn = self.conn().await?;

        let mut query = customer::table
            .filter(customer::email.eq(email.to_string()))
            .select(Customer::as_select())
            .into_boxed();
        if let Some(id) = exclude {
            query = query.filter(customer::id.ne(id));
        }

        let found = query.first(&mut conn).await.optional()?;
        Ok(found)
    }

    async fn customer_by_phone(
        &self,
        phone: &str,
        exclude: Option<Uuid>,
    ) -> StoreResult<Option<Customer>> {
        let mut conn = self.conn().await?;

        let mut query = customer::table
            .filter(customer::phone.eq(phone.to_string()))
            .select(Customer::as_select())
            .into_boxed();
        if let Some(id) = exclude {
            query = query.filter(customer::id.ne(id));
        }

        let found = query.first(&mut conn).await.optional()?;
        Ok(found)
    }

    async fn insert_customer(&self, record: NewCustomer) -> StoreResult<Customer> {
        let mut conn = self.conn().await?;
        let now = Utc::now();

        let row = CustomerRow {
            id: Uuid::now_v7(),
            name: record.name,
            email: record.email,
            phone: record.phone,
            address: record.address,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        diesel::insert_into(customer::table)
            .values(&row)
            .returning(Customer::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_write_error)
    }

    async fn update_customer(
        &self,
        id: Uuid,
        changes: CustomerChanges,
    ) -> StoreResult<Option<Customer>> {
        let mut conn = self.conn().await?;

        let result = diesel::update(customer::table.find(id))
            .set((&changes, customer::updated_at.eq(Utc::now())))
            .returning(Customer::as_returning())
            .get_result(&mut conn)
            .await;

        match result {
            Ok(updated) => Ok(Some(updated)),
            Err(diesel::result::Error::NotFound) => Ok(None),
            Err(err) => Err(map_write_error(err)),
        }
    }

    async fn list_pets(&self, customer_id: Option<Uuid>) -> StoreResult<Vec<Pet>> {
        let mut conn = self.conn().await?;

        let mut query = pet::table
            .order((pet::created_at.asc(), pet::id.asc()))
            .select(Pet::as_select())
            .into_boxed();
        if let Some(owner) = customer_id {
            query = query.filter(pet::customer_id.eq(owner));
        }

        let found = query.load(&mut conn).await?;
        Ok(found)
    }

    async fn pet_by_id(&self, id: Uuid) -> StoreResult<Option<Pet>> {
        let mut conn = self.conn().await?;
        let found = pet::table
            .find(id)
            .select(Pet::as_select())
            .first(&mut conn)
            .await
            .optional()?;
        Ok(found)
    }

    async fn pet_by_microchip(
        &self,
        microchip: &str,
        exclude: Option<Uuid>,
    ) -> StoreResult<Option<Pet>> {
        let mut conn = self.conn().await?;

        let mut query = pet::table
            .filter(pet::microchip.eq(microchip.to_string()))
            .select(Pet::as_select())
            .into_boxed();
        if let Some(id) = exclude {
            query = query.filter(pet::id.ne(id));
        }

        let found = query.first(&mut conn).await.optional()?;
        Ok(found)
    }

    async fn insert_pet(&self, record: NewPet) -> StoreResult<Pet> {
        let mut conn = self.conn().await?;
        let now = Utc::now();

        let row = PetRow {
            id: Uuid::now_v7(),
            customer_id: record.customer_id,
            name: record.name,
            species: record.species,
            breed: record.breed,
            age: record.age,
            weight: record.weight,
            gender: record.gender,
            microchip: record.microchip,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        diesel::insert_into(pet::table)
            .values(&row)
            .returning(Pet::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_write_error)
    }

    async fn update_pet(&self, id: Uuid, changes: PetChanges) -> StoreResult<Option<Pet>> {
        let mut conn = self.conn().await?;

        let result = diesel::update(pet::table.find(id))
            .set((&changes, pet::updated_at.eq(Utc::now())))
            .returning(Pet::as_returning())
            .get_result(&mut conn)
            .await;

        match result {
            Ok(updated) => Ok(Some(updated)),
            Err(diesel::result::Error::NotFound) => Ok(None),
            Err(err) => Err(map_write_error(err)),
        }
    }

    async fn list_users(&self, role: Option<&str>) -> StoreResult<Vec<User>> {
        let mut conn = self.conn().await?;

        let mut query = app_user::table
            .order(app_user::name.asc())
            .select(User::as_select())
            .into_boxed();
        if let Some(role) = role {
            query = query.filter(app_user::role.eq(role.to_string()));
        }

        let found = query.load(&mut conn).await?;
        Ok(found)
    }
}
