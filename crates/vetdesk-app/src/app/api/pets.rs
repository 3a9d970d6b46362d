//! Pet directory endpoints.

use salvo::http::StatusCode;
use salvo::writing::Json;
use salvo::{Depot, Request, Response, Router, handler};

use vetdesk_service::directory::{CreatePetRequest, Directory, UpdatePetRequest};

use super::response::{obtain_store, parse_id, render_bad_body, render_error};

/// GET /api/pets - Lists pets, optionally for one owner via `?customerId=`.
#[handler]
async fn list_pets(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let Some(store) = obtain_store(depot, res) else {
        return;
    };

    match Directory::new(store).list_pets(req.query("customerId")).await {
        Ok(pets) => res.render(Json(pets)),
        Err(err) => render_error(res, &err),
    }
}

/// GET /api/pets/{id}
#[handler]
async fn get_pet(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let Some(store) = obtain_store(depot, res) else {
        return;
    };
    let Some(id) = parse_id(req, res, "Pet") else {
        return;
    };

    match Directory::new(store).get_pet(id).await {
        Ok(pet) => res.render(Json(pet)),
        Err(err) => render_error(res, &err),
    }
}

/// ## Summary
/// POST /api/pets - Registers a pet under an existing customer.
///
/// ## Errors
/// Returns HTTP 404 for an unknown owner, HTTP 400 for missing fields or
/// a duplicate microchip number.
#[handler]
async fn create_pet(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let Some(store) = obtain_store(depot, res) else {
        return;
    };

    let request: CreatePetRequest = match req.parse_json().await {
        Ok(r) => r,
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to parse pet registration request");
            render_bad_body(res);
            return;
        }
    };

    match Directory::new(store).create_pet(request).await {
        Ok(pet) => {
            res.status_code(StatusCode::CREATED);
            res.render(Json(pet));
        }
        Err(err) => render_error(res, &err),
    }
}

/// PATCH /api/pets/{id}
#[handler]
async fn update_pet(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let Some(store) = obtain_store(depot, res) else {
        return;
    };
    let Some(id) = parse_id(req, res, "Pet") else {
        return;
    };

    let request: UpdatePetRequest = match req.parse_json().await {
        Ok(r) => r,
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to parse pet update request");
            render_bad_body(res);
            return;
        }
    };

    match Directory::new(store).update_pet(id, request).await {
        Ok(pet) => res.render(Json(pet)),
        Err(err) => render_error(res, &err),
    }
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path("pets")
        .get(list_pets)
        .post(create_pet)
        .push(Router::with_path("{id}").get(get_pet).patch(update_pet))
}
