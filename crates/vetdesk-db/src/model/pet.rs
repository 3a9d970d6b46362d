use chrono::{DateTime, Utc};
use diesel::pg::Pg;
use diesel::prelude::*;
use serde::Serialize;

use crate::db::schema;

/// A patient animal, owned by a customer.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(table_name = schema::pet)]
#[diesel(check_for_backend(Pg))]
#[serde(rename_all = "camelCase")]
pub struct Pet {
    pub id: uuid::Uuid,
    pub customer_id: uuid::Uuid,
    pub name: String,
    pub species: String,
    pub breed: Option<String>,
    pub age: Option<i32>,
    pub weight: Option<String>,
    pub gender: Option<String>,
    pub microchip: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for a new pet; the store assigns id and timestamps.
#[derive(Debug, Clone)]
pub struct NewPet {
    pub customer_id: uuid::Uuid,
    pub name: String,
    pub species: String,
    pub breed: Option<String>,
    pub age: Option<i32>,
    pub weight: Option<String>,
    pub gender: Option<String>,
    pub microchip: Option<String>,
}

/// Partial update for a pet; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = schema::pet)]
pub struct PetChanges {
    pub name: Option<String>,
    pub species: Option<String>,
    pub breed: Option<String>,
    pub age: Option<i32>,
    pub weight: Option<String>,
    pub gender: Option<String>,
    pub microchip: Option<String>,
    pub is_active: Option<bool>,
}
