mod appointments;
mod customers;
mod healthcheck;
mod pets;
mod response;
mod users;

use salvo::Router;

// Re-export route constants from core
pub use vetdesk_core::constants::{API_ROUTE_COMPONENT, API_ROUTE_PREFIX};

/// Constructs the main API router.
#[must_use]
pub fn routes() -> Router {
    Router::with_path(API_ROUTE_COMPONENT)
        .push(appointments::routes())
        .push(customers::routes())
        .push(pets::routes())
        .push(users::routes())
        .push(healthcheck::routes())
}
