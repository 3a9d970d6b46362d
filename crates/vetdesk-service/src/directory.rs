//! Customer, pet, and staff directory operations.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::Deserialize;
use uuid::Uuid;

use vetdesk_db::model::customer::{Customer, CustomerChanges, NewCustomer};
use vetdesk_db::model::pet::{NewPet, Pet, PetChanges};
use vetdesk_db::model::user::{ROLE_VETERINARIAN, User};
use vetdesk_db::store::{CustomerFilter, RecordStore};

use crate::error::{ServiceError, ServiceResult};

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email pattern"));

fn is_valid_phone(phone: &str) -> bool {
    phone.len() == 10 && phone.bytes().all(|b| b.is_ascii_digit())
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomerRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCustomerRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePetRequest {
    pub customer_id: Option<Uuid>,
    pub name: Option<String>,
    pub species: Option<String>,
    pub breed: Option<String>,
    pub age: Option<i32>,
    pub weight: Option<String>,
    pub gender: Option<String>,
    pub microchip: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePetRequest {
    pub name: Option<String>,
    pub species: Option<String>,
    pub breed: Option<String>,
    pub age: Option<i32>,
    pub weight: Option<String>,
    pub gender: Option<String>,
    pub microchip: Option<String>,
    pub is_active: Option<bool>,
}

/// Directory service for the records the scheduler books against.
#[derive(Clone)]
pub struct Directory {
    store: Arc<dyn RecordStore>,
}

fn required<T>(value: Option<T>, field: &'static str) -> ServiceResult<T> {
    value.ok_or_else(|| ServiceError::Validation {
        field,
        message: format!("{field} is required"),
    })
}

fn validate_email(email: &str) -> ServiceResult<()> {
    if EMAIL_PATTERN.is_match(email) {
        Ok(())
    } else {
        Err(ServiceError::Validation {
            field: "email",
            message: format!("Invalid email address: {email}"),
        })
    }
}

fn validate_phone(phone: &str) -> ServiceResult<()> {
    if is_valid_phone(phone) {
        Ok(())
    } else {
        Err(ServiceError::Validation {
            field: "phone",
            message: "Phone number must be exactly 10 digits".to_string(),
        })
    }
}

impl Directory {
    #[must_use]
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Lists customers matching the filter.
    ///
    /// ## Errors
    /// Propagates store errors.
    pub async fn list_customers(&self, filter: CustomerFilter) -> ServiceResult<Vec<Customer>> {
        Ok(self.store.list_customers(filter).await?)
    }

    /// Fetches one customer.
    ///
    /// ## Errors
    /// `NotFound` when no customer has the id.
    pub async fn get_customer(&self, id: Uuid) -> ServiceResult<Customer> {
        self.store
            .customer_by_id(id)
            .await?
            .ok_or(ServiceError::NotFound("Customer"))
    }

    /// ## Summary
    /// Registers a new customer.
    ///
    /// Email must look like an address, phone must be exactly 10 digits,
    /// and both must be unique across customers.
    ///
    /// ## Errors
    /// `Validation` for format and uniqueness failures.
    #[tracing::instrument(skip(self, request))]
    pub async fn create_customer(&self, request: CreateCustomerRequest) -> ServiceResult<Customer> {
        let name = required(request.name, "name")?;
        let email = required(request.email, "email")?;
        let phone = required(request.phone, "phone")?;

        validate_email(&email)?;
        validate_phone(&phone)?;

        if self.store.customer_by_email(&email, None).await?.is_some() {
            return Err(ServiceError::Validation {
                field: "email",
                message: "A customer with this email already exists".to_string(),
            });
        }
        if self.store.customer_by_phone(&phone, None).await?.is_some() {
            return Err(ServiceError::Validation {
                field: "phone",
                message: "A customer with this phone number already exists".to_string(),
            });
        }

        let created = self
            .store
            .insert_customer(NewCustomer {
                name,
                email,
                phone,
                address: request.address,
            })
            .await?;

        tracing::info!(customer_id = %created.id, "Customer registered");
        Ok(created)
    }

    /// ## Summary
    /// Applies a partial update to a customer. Changed email/phone values
    /// are re-validated and re-checked for uniqueness against everyone
    /// but this customer.
    ///
    /// ## Errors
    /// `NotFound` for an unknown id, `Validation` for bad or duplicate
    /// contact details.
    #[tracing::instrument(skip(self, request))]
    pub async fn update_customer(
        &self,
        id: Uuid,
        request: UpdateCustomerRequest,
    ) -> ServiceResult<Customer> {
        if self.store.customer_by_id(id).await?.is_none() {
            return Err(ServiceError::NotFound("Customer"));
        }

        if let Some(email) = request.email.as_deref() {
            validate_email(email)?;
            if self
                .store
                .customer_by_email(email, Some(id))
                .await?
                .is_some()
            {
                return Err(ServiceError::Validation {
                    field: "email",
                    message: "A customer with this email already exists".to_string(),
                });
            }
        }
        if let Some(phone) = request.phone.as_deref() {
            validate_phone(phone)?;
            if self
                .store
                .customer_by_phone(phone, Some(id))
                .await?
                .is_some()
            {
                return Err(ServiceError::Validation {
                    field: "phone",
                    message: "A customer with this phone number already exists".to_string(),
                });
            }
        }

        self.store
            .update_customer(
                id,
                CustomerChanges {
                    name: request.name,
                    email: request.email,
                    phone: request.phone,
                    address: request.address,
                    is_active: None,
                },
            )
            .await?
            .ok_or(ServiceError::NotFound("Customer"))
    }

    /// Activates or deactivates a customer account.
    ///
    /// ## Errors
    /// `NotFound` when no customer has the id.
    pub async fn set_customer_active(&self, id: Uuid, active: bool) -> ServiceResult<Customer> {
        self.store
            .update_customer(
                id,
                CustomerChanges {
                    is_active: Some(active),
                    ..CustomerChanges::default()
                },
            )
            .await?
            .ok_or(ServiceError::NotFound("Customer"))
    }

    /// Lists pets, optionally restricted to one owner.
    ///
    /// ## Errors
    /// Propagates store errors.
    pub async fn list_pets(&self, customer_id: Option<Uuid>) -> ServiceResult<Vec<Pet>> {
        Ok(self.store.list_pets(customer_id).await?)
    }

    /// Fetches one pet.
    ///
    /// ## Errors
    /// `NotFound` when no pet has the id.
    pub async fn get_pet(&self, id: Uuid) -> ServiceResult<Pet> {
        self.store
            .pet_by_id(id)
            .await?
            .ok_or(ServiceError::NotFound("Pet"))
    }

    /// ## Summary
    /// Registers a new pet under an existing customer. A microchip
    /// number, when given, must be unique.
    ///
    /// ## Errors
    /// `Validation` for missing fields or a duplicate microchip,
    /// `NotFound` for an unknown owner.
    #[tracing::instrument(skip(self, request))]
    pub async fn create_pet(&self, request: CreatePetRequest) -> ServiceResult<Pet> {
        let customer_id = required(request.customer_id, "customerId")?;
        let name = required(request.name, "name")?;
        let species = required(request.species, "species")?;

        if self.store.customer_by_id(customer_id).await?.is_none() {
            return Err(ServiceError::NotFound("Customer"));
        }
        if let Some(microchip) = request.microchip.as_deref() {
            if self
                .store
                .pet_by_microchip(microchip, None)
                .await?
                .is_some()
            {
                return Err(ServiceError::Validation {
                    field: "microchip",
                    message: "A pet with this microchip number already exists".to_string(),
                });
            }
        }

        let created = self
            .store
            .insert_pet(NewPet {
                customer_id,
                name,
                species,
                breed: request.breed,
                age: request.age,
                weight: request.weight,
                gender: request.gender,
                microchip: request.microchip,
            })
            .await?;

        tracing::info!(pet_id = %created.id, "Pet registered");
        Ok(created)
    }

    /// Applies a partial update to a pet.
    ///
    /// ## Errors
    /// `NotFound` for an unknown id, `Validation` for a duplicate
    /// microchip.
    #[tracing::instrument(skip(self, request))]
    pub async fn update_pet(&self, id: Uuid, request: UpdatePetRequest) -> ServiceResult<Pet> {
        if self.store.pet_by_id(id).await?.is_none() {
            return Err(ServiceError::NotFound("Pet"));
        }

        if let Some(microchip) = request.microchip.as_deref() {
            if self
                .store
                .pet_by_microchip(microchip, Some(id))
                .await?
                .is_some()
            {
                return Err(ServiceError::Validation {
                    field: "microchip",
                    message: "A pet with this microchip number already exists".to_string(),
                });
            }
        }

        self.store
            .update_pet(
                id,
                PetChanges {
                    name: request.name,
                    species: request.species,
                    breed: request.breed,
                    age: request.age,
                    weight: request.weight,
                    gender: request.gender,
                    microchip: request.microchip,
                    is_active: request.is_active,
                },
            )
            .await?
            .ok_or(ServiceError::NotFound("Pet"))
    }

    /// Lists staff accounts, optionally restricted to one role.
    ///
    /// ## Errors
    /// Propagates store errors.
    pub async fn list_users(&self, role: Option<&str>) -> ServiceResult<Vec<User>> {
        Ok(self.store.list_users(role).await?)
    }

    /// Lists the practitioners an appointment can be assigned to.
    ///
    /// ## Errors
    /// Propagates store errors.
    pub async fn list_veterinarians(&self) -> ServiceResult<Vec<User>> {
        self.list_users(Some(ROLE_VETERINARIAN)).await
    }
}
