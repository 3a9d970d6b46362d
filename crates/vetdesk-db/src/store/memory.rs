//! In-memory record store.
//!
//! Backs development mode and tests. All maps sit behind a single
//! `RwLock`; appointment writes take the write guard for the whole
//! check-then-insert sequence, so the slot invariants hold even under
//! concurrent requests.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::model::appointment::{
    Appointment, AppointmentChanges, AppointmentStatus, NewAppointment,
};
use crate::model::customer::{Customer, CustomerChanges, NewCustomer};
use crate::model::pet::{NewPet, Pet, PetChanges};
use crate::model::user::{ROLE_VETERINARIAN, User};
use crate::store::{CustomerFilter, RecordStore};

#[derive(Default)]
struct Inner {
    appointments: HashMap<Uuid, Appointment>,
    customers: HashMap<Uuid, Customer>,
    pets: HashMap<Uuid, Pet>,
    users: Vec<User>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

fn vet_conflict<'a>(
    appointments: impl Iterator<Item = &'a Appointment>,
    veterinarian_id: Uuid,
    at: DateTime<Utc>,
    exclude: Option<Uuid>,
) -> Option<&'a Appointment> {
    appointments.into_iter().find(|a| {
        a.veterinarian_id == Some(veterinarian_id)
            && a.appointment_date == at
            && a.status != AppointmentStatus::Cancelled
            && Some(a.id) != exclude
    })
}

fn pet_conflict<'a>(
    appointments: impl Iterator<Item = &'a Appointment>,
    pet_id: Uuid,
    at: DateTime<Utc>,
    exclude: Option<Uuid>,
) -> Option<&'a Appointment> {
    appointments.into_iter().find(|a| {
        a.pet_id == pet_id
            && a.appointment_date == at
            && a.status != AppointmentStatus::Cancelled
            && Some(a.id) != exclude
    })
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store pre-populated with demo staff, customers, and pets,
    /// matching what the web client expects to find in development mode.
    #[must_use]
    pub fn with_demo_data() -> Self {
        let store = Self::new();
        {
            let inner = store.inner.try_write();
            if let Ok(mut inner) = inner {
                let now = Utc::now();

                for (name, email) in [
                    ("Dr. Alice Nguyen", "alice@vetdesk.example"),
                    ("Dr. Ben Tran", "ben@vetdesk.example"),
                    ("Dr. Carol Le", "carol@vetdesk.example"),
                    ("Dr. Dan Pham", "dan@vetdesk.example"),
                    ("Dr. Erin Hoang", "erin@vetdesk.example"),
                ] {
                    inner.users.push(User {
                        id: Uuid::now_v7(),
                        name: name.to_string(),
                        email: email.to_string(),
                        role: ROLE_VETERINARIAN.to_string(),
                        phone: None,
                        is_active: true,
                        created_at: now,
                    });
                }
                inner.users.push(User {
                    id: Uuid::now_v7(),
                    name: "Admin".to_string(),
                    email: "admin@vetdesk.example".to_string(),
                    role: "admin".to_string(),
                    phone: None,
                    is_active: true,
                    created_at: now,
                });

                let owner = Customer {
                    id: Uuid::now_v7(),
                    name: "Jamie Park".to_string(),
                    email: "jamie@example.com".to_string(),
                    phone: "0912345678".to_string(),
                    address: Some("12 Elm Street".to_string()),
                    is_active: true,
                    created_at: now,
                    updated_at: now,
                };
                let owner_id = owner.id;
                inner.customers.insert(owner.id, owner);

                for (name, species, breed) in [
                    ("Max", "Dog", Some("Golden Retriever")),
                    ("Miu", "Cat", Some("Persian")),
                ] {
                    let pet = Pet {
                        id: Uuid::now_v7(),
                        customer_id: owner_id,
                        name: name.to_string(),
                        species: species.to_string(),
                        breed: breed.map(str::to_string),
                        age: None,
                        weight: None,
                        gender: None,
                        microchip: None,
                        is_active: true,
                        created_at: now,
                        updated_at: now,
                    };
                    inner.pets.insert(pet.id, pet);
                }
            }
        }
        store
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn find_vet_slot(
        &self,
        veterinarian_id: Uuid,
        at: DateTime<Utc>,
        exclude: Option<Uuid>,
    ) -> StoreResult<Option<Appointment>> {
        let inner = self.inner.read().await;
        Ok(vet_conflict(inner.appointments.values(), veterinarian_id, at, exclude).cloned())
    }

    async fn find_pet_slot(
        &self,
        pet_id: Uuid,
        at: DateTime<Utc>,
        exclude: Option<Uuid>,
    ) -> StoreResult<Option<Appointment>> {
        let inner = self.inner.read().await;
        Ok(pet_conflict(inner.appointments.values(), pet_id, at, exclude).cloned())
    }

    async fn appointment_by_id(&self, id: Uuid) -> StoreResult<Option<Appointment>> {
        let inner = self.inner.read().await;
        Ok(inner.appointments.get(&id).cloned())
    }

    async fn list_appointments(
        &self,
        range: Option<(DateTime<Utc>, DateTime<Utc>)>,
        status: Option<&str>,
    ) -> StoreResult<Vec<Appointment>> {
        let inner = self.inner.read().await;
        let mut matches: Vec<Appointment> = inner
            .appointments
            .values()
            .filter(|a| {
                range.is_none_or(|(start, end)| a.appointment_date >= start && a.appointment_date < end)
            })
            .filter(|a| status.is_none_or(|s| a.status.as_str() == s))
            .cloned()
            .collect();
        matches.sort_by_key(|a| (a.appointment_date, a.created_at, a.id));
        Ok(matches)
    }

    async fn insert_appointment(&self, record: NewAppointment) -> StoreResult<Appointment> {
        let mut inner = self.inner.write().await;

        if record.status != AppointmentStatus::Cancelled {
            if let Some(veterinarian_id) = record.veterinarian_id {
                if vet_conflict(
                    inner.appointments.values(),
                    veterinarian_id,
                    record.appointment_date,
                    None,
                )
                .is_some()
                {
                    return Err(StoreError::VetSlotTaken);
                }
            }
            if pet_conflict(
                inner.appointments.values(),
                record.pet_id,
                record.appointment_date,
                None,
            )
            .is_some()
            {
                return Err(StoreError::PetSlotTaken);
            }
        }

        let now = Utc::now();
        let appointment = Appointment {
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
        inner.appointments.insert(appointment.id, appointment.clone());
        Ok(appointment)
    }

    async fn update_appointment(
        &self,
        id: Uuid,
        changes: AppointmentChanges,
    ) -> StoreResult<Option<Appointment>> {
        let mut inner = self.inner.write().await;

        let Some(existing) = inner.appointments.get(&id) else {
            return Ok(None);
        };

        let mut updated = existing.clone();
        if let Some(veterinarian_id) = changes.veterinarian_id {
            updated.veterinarian_id = Some(veterinarian_id);
        }
        if let Some(at) = changes.appointment_date {
            updated.appointment_date = at;
        }
        if let Some(appointment_type) = changes.appointment_type {
            updated.appointment_type = appointment_type;
        }
        if let Some(status) = changes.status {
            updated.status = status;
        }
        if let Some(notes) = changes.notes {
            updated.notes = Some(notes);
        }

        // Re-check the slot invariants only when the keyed columns moved,
        // mirroring when the partial unique indexes would fire.
        let key_changed = updated.appointment_date != existing.appointment_date
            || updated.veterinarian_id != existing.veterinarian_id
            || updated.status != existing.status;
        if key_changed && updated.status != AppointmentStatus::Cancelled {
            if let Some(veterinarian_id) = updated.veterinarian_id {
                if vet_conflict(
                    inner.appointments.values(),
                    veterinarian_id,
                    updated.appointment_date,
                    Some(id),
                )
                .is_some()
                {
                    return Err(StoreError::VetSlotTaken);
                }
            }
            if pet_conflict(
                inner.appointments.values(),
                updated.pet_id,
                updated.appointment_date,
                Some(id),
            )
            .is_some()
            {
                return Err(StoreError::PetSlotTaken);
            }
        }

        updated.updated_at = Utc::now();
        inner.appointments.insert(id, updated.clone());
        Ok(Some(updated))
    }

    async fn list_customers(&self, filter: CustomerFilter) -> StoreResult<Vec<Customer>> {
        let inner = self.inner.read().await;
        let needle = filter.search.as_deref().map(str::to_lowercase);
        let mut matches: Vec<Customer> = inner
            .customers
            .values()
            .filter(|c| {
                needle.as_deref().is_none_or(|n| {
                    c.name.to_lowercase().contains(n)
                        || c.email.to_lowercase().contains(n)
                        || c.phone.contains(n)
                })
            })
            .filter(|c| filter.active.is_none_or(|active| c.is_active == active))
            .cloned()
            .collect();
        matches.sort_by_key(|c| (c.created_at, c.id));

        let offset = usize::try_from(filter.offset.unwrap_or(0)).unwrap_or(0);
        let limit = usize::try_from(filter.limit.unwrap_or(100)).unwrap_or(100);
        Ok(matches.into_iter().skip(offset).take(limit).collect())
    }

    async fn customer_by_id(&self, id: Uuid) -> StoreResult<Option<Customer>> {
        let inner = self.inner.read().await;
        Ok(inner.customers.get(&id).cloned())
    }

    async fn customer_by_email(
        &self,
        email: &str,
        exclude: Option<Uuid>,
    ) -> StoreResult<Option<Customer>> {
        let inner = self.inner.read().await;
        Ok(inner
            .customers
            .values()
            .find(|c| c.email == email && Some(c.id) != exclude)
            .cloned())
    }

    async fn customer_by_phone(
        &self,
        phone: &str,
        exclude: Option<Uuid>,
    ) -> StoreResult<Option<Customer>> {
        let inner = self.inner.read().await;
        Ok(inner
            .customers
            .values()
            .find(|c| c.phone == phone && Some(c.id) != exclude)
            .cloned())
    }

    async fn insert_customer(&self, record: NewCustomer) -> StoreResult<Customer> {
        let mut inner = self.inner.write().await;

        if inner.customers.values().any(|c| c.email == record.email) {
            return Err(StoreError::Duplicate("email"));
        }
        if inner.customers.values().any(|c| c.phone == record.phone) {
            return Err(StoreError::Duplicate("phone"));
        }

        let now = Utc::now();
        let customer = Customer {
            id: Uuid::now_v7(),
            name: record.name,
            email: record.email,
            phone: record.phone,
            address: record.address,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        inner.customers.insert(customer.id, customer.clone());
        Ok(customer)
    }

    async fn update_customer(
        &self,
        id: Uuid,
        changes: CustomerChanges,
    ) -> StoreResult<Option<Customer>> {
        let mut inner = self.inner.write().await;

        let Some(existing) = inner.customers.get(&id) else {
            return Ok(None);
        };

        let mut updated = existing.clone();
        if let Some(name) = changes.name {
            updated.name = name;
        }
        if let Some(email) = changes.email {
            updated.email = email;
        }
        if let Some(phone) = changes.phone {
            updated.phone = phone;
        }
        if let Some(address) = changes.address {
            updated.address = Some(address);
        }
        if let Some(is_active) = changes.is_active {
            updated.is_active = is_active;
        }

        if inner
            .customers
            .values()
            .any(|c| c.id != id && c.email == updated.email)
        {
            return Err(StoreError::Duplicate("email"));
        }
        if inner
            .customers
            .values()
            .any(|c| c.id != id && c.phone == updated.phone)
        {
            return Err(StoreError::Duplicate("phone"));
        }

        updated.updated_at = Utc::now();
        inner.customers.insert(id, updated.clone());
        Ok(Some(updated))
    }

    async fn list_pets(&self, customer_id: Option<Uuid>) -> StoreResult<Vec<Pet>> {
        let inner = self.inner.read().await;
        let mut matches: Vec<Pet> = inner
            .pets
            .values()
            .filter(|p| customer_id.is_none_or(|owner| p.customer_id == owner))
            .cloned()
            .collect();
        matches.sort_by_key(|p| (p.created_at, p.id));
        Ok(matches)
    }

    async fn pet_by_id(&self, id: Uuid) -> StoreResult<Option<Pet>> {
        let inner = self.inner.read().await;
        Ok(inner.pets.get(&id).cloned())
    }

    async fn pet_by_microchip(
        &self,
        microchip: &str,
        exclude: Option<Uuid>,
    ) -> StoreResult<Option<Pet>> {
        let inner = self.inner.read().await;
        Ok(inner
            .pets
            .values()
            .find(|p| p.microchip.as_deref() == Some(microchip) && Some(p.id) != exclude)
            .cloned())
    }

    async fn insert_pet(&self, record: NewPet) -> StoreResult<Pet> {
        let mut inner = self.inner.write().await;

        if let Some(microchip) = record.microchip.as_deref() {
            if inner
                .pets
                .values()
                .any(|p| p.microchip.as_deref() == Some(microchip))
            {
                return Err(StoreError::Duplicate("microchip"));
            }
        }

        let now = Utc::now();
        let pet = Pet {
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
        inner.pets.insert(pet.id, pet.clone());
        Ok(pet)
    }

    async fn update_pet(&self, id: Uuid, changes: PetChanges) -> StoreResult<Option<Pet>> {
        let mut inner = self.inner.write().await;

        let Some(existing) = inner.pets.get(&id) else {
            return Ok(None);
        };

        let mut updated = existing.clone();
        if let Some(name) = changes.name {
            updated.name = name;
        }
        if let Some(species) = changes.species {
            updated.species = species;
        }
        if let Some(breed) = changes.breed {
            updated.breed = Some(breed);
        }
        if let Some(age) = changes.age {
            updated.age = Some(age);
        }
        if let Some(weight) = changes.weight {
            updated.weight = Some(weight);
        }
        if let Some(gender) = changes.gender {
            updated.gender = Some(gender);
        }
        if let Some(microchip) = changes.microchip {
            updated.microchip = Some(microchip);
        }
        if let Some(is_active) = changes.is_active {
            updated.is_active = is_active;
        }

        if let Some(microchip) = updated.microchip.as_deref() {
            if inner
                .pets
                .values()
                .any(|p| p.id != id && p.microchip.as_deref() == Some(microchip))
            {
                return Err(StoreError::Duplicate("microchip"));
            }
        }

        updated.updated_at = Utc::now();
        inner.pets.insert(id, updated.clone());
        Ok(Some(updated))
    }

    async fn list_users(&self, role: Option<&str>) -> StoreResult<Vec<User>> {
        let inner = self.inner.read().await;
        Ok(inner
            .users
            .iter()
            .filter(|u| role.is_none_or(|r| u.role == r))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn booking(pet_id: Uuid, veterinarian_id: Option<Uuid>, at: DateTime<Utc>) -> NewAppointment {
        NewAppointment {
            pet_id,
            customer_id: Uuid::now_v7(),
            veterinarian_id,
            appointment_date: at,
            appointment_type: "checkup".to_string(),
            status: AppointmentStatus::Pending,
            notes: None,
        }
    }

    #[tokio::test]
    async fn insert_enforces_vet_slot_uniqueness() {
        let store = MemoryStore::new();
        let vet = Uuid::now_v7();
        let at = Utc::now();

        store
            .insert_appointment(booking(Uuid::now_v7(), Some(vet), at))
            .await
            .expect("first booking succeeds");

        let err = store
            .insert_appointment(booking(Uuid::now_v7(), Some(vet), at))
            .await
            .expect_err("second booking for same vet and instant fails");
        assert!(matches!(err, StoreError::VetSlotTaken));
    }

    #[tokio::test]
    async fn insert_enforces_pet_slot_uniqueness() {
        let store = MemoryStore::new();
        let pet = Uuid::now_v7();
        let at = Utc::now();

        store
            .insert_appointment(booking(pet, None, at))
            .await
            .expect("first booking succeeds");

        let err = store
            .insert_appointment(booking(pet, Some(Uuid::now_v7()), at))
            .await
            .expect_err("same pet cannot hold two appointments at one instant");
        assert!(matches!(err, StoreError::PetSlotTaken));
    }

    #[tokio::test]
    async fn cancelled_appointment_releases_its_slot() {
        let store = MemoryStore::new();
        let pet = Uuid::now_v7();
        let at = Utc::now();

        let first = store
            .insert_appointment(booking(pet, None, at))
            .await
            .expect("first booking succeeds");

        store
            .update_appointment(
                first.id,
                AppointmentChanges {
                    status: Some(AppointmentStatus::Cancelled),
                    ..AppointmentChanges::default()
                },
            )
            .await
            .expect("cancel succeeds")
            .expect("appointment exists");

        store
            .insert_appointment(booking(pet, None, at))
            .await
            .expect("slot is free again after cancellation");
    }

    #[tokio::test]
    async fn update_does_not_conflict_with_itself() {
        let store = MemoryStore::new();
        let vet = Uuid::now_v7();
        let at = Utc::now();

        let appointment = store
            .insert_appointment(booking(Uuid::now_v7(), Some(vet), at))
            .await
            .expect("booking succeeds");

        // Confirming without moving keeps the same slot; must not trip the
        // invariant check against its own row.
        let updated = store
            .update_appointment(
                appointment.id,
                AppointmentChanges {
                    status: Some(AppointmentStatus::Confirmed),
                    ..AppointmentChanges::default()
                },
            )
            .await
            .expect("update succeeds")
            .expect("appointment exists");
        assert_eq!(updated.status, AppointmentStatus::Confirmed);
        assert!(updated.updated_at >= appointment.updated_at);
    }

    #[tokio::test]
    async fn update_unknown_id_returns_none() {
        let store = MemoryStore::new();
        let result = store
            .update_appointment(Uuid::now_v7(), AppointmentChanges::default())
            .await
            .expect("store reachable");
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn demo_data_includes_veterinarians() {
        let store = MemoryStore::with_demo_data();
        let vets = store
            .list_users(Some(ROLE_VETERINARIAN))
            .await
            .expect("store reachable");
        assert_eq!(vets.len(), 5);

        let everyone = store.list_users(None).await.expect("store reachable");
        assert!(everyone.len() > vets.len());
    }

    #[tokio::test]
    async fn customer_search_matches_name_email_and_phone() {
        let store = MemoryStore::new();
        store
            .insert_customer(NewCustomer {
                name: "Jamie Park".to_string(),
                email: "jamie@example.com".to_string(),
                phone: "0912345678".to_string(),
                address: None,
            })
            .await
            .expect("insert succeeds");

        for needle in ["jamie", "PARK", "0912"] {
            let found = store
                .list_customers(CustomerFilter {
                    search: Some(needle.to_string()),
                    ..CustomerFilter::default()
                })
                .await
                .expect("store reachable");
            assert_eq!(found.len(), 1, "search {needle:?} should match");
        }

        let none = store
            .list_customers(CustomerFilter {
                search: Some("nobody".to_string()),
                ..CustomerFilter::default()
            })
            .await
            .expect("store reachable");
        assert!(none.is_empty());
    }
}
