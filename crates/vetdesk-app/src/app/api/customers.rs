//! Customer directory endpoints.

use salvo::http::StatusCode;
use salvo::writing::Json;
use salvo::{Depot, Request, Response, Router, handler};

use vetdesk_db::store::CustomerFilter;
use vetdesk_service::directory::{CreateCustomerRequest, Directory, UpdateCustomerRequest};

use super::response::{obtain_store, parse_id, render_bad_body, render_error};

/// ## Summary
/// GET /api/customers - Lists customers. Supports `?search=` over name,
/// email, and phone, `?active=`, and `?limit=`/`?offset=` paging.
#[handler]
async fn list_customers(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let Some(store) = obtain_store(depot, res) else {
        return;
    };

    let filter = CustomerFilter {
        limit: req.query("limit"),
        offset: req.query("offset"),
        search: req.query("search"),
        active: req.query("active"),
    };

    match Directory::new(store).list_customers(filter).await {
        Ok(customers) => res.render(Json(customers)),
        Err(err) => render_error(res, &err),
    }
}

/// GET /api/customers/{id}
#[handler]
async fn get_customer(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let Some(store) = obtain_store(depot, res) else {
        return;
    };
    let Some(id) = parse_id(req, res, "Customer") else {
        return;
    };

    match Directory::new(store).get_customer(id).await {
        Ok(customer) => res.render(Json(customer)),
        Err(err) => render_error(res, &err),
    }
}

/// ## Summary
/// POST /api/customers - Registers a customer.
///
/// ## Errors
/// Returns HTTP 400 for malformed or already-registered contact details.
#[handler]
async fn create_customer(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let Some(store) = obtain_store(depot, res) else {
        return;
    };

    let request: CreateCustomerRequest = match req.parse_json().await {
        Ok(r) => r,
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to parse customer registration request");
            render_bad_body(res);
            return;
        }
    };

    match Directory::new(store).create_customer(request).await {
        Ok(customer) => {
            res.status_code(StatusCode::CREATED);
            res.render(Json(customer));
        }
        Err(err) => render_error(res, &err),
    }
}

/// PATCH /api/customers/{id}
#[handler]
async fn update_customer(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let Some(store) = obtain_store(depot, res) else {
        return;
    };
    let Some(id) = parse_id(req, res, "Customer") else {
        return;
    };

    let request: UpdateCustomerRequest = match req.parse_json().await {
        Ok(r) => r,
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to parse customer update request");
            render_bad_body(res);
            return;
        }
    };

    match Directory::new(store).update_customer(id, request).await {
        Ok(customer) => res.render(Json(customer)),
        Err(err) => render_error(res, &err),
    }
}

/// POST /api/customers/{id}/approve - Marks the account active.
#[handler]
async fn approve_customer(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    set_active(req, depot, res, true).await;
}

/// POST /api/customers/{id}/deactivate - Marks the account inactive.
#[handler]
async fn deactivate_customer(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    set_active(req, depot, res, false).await;
}

async fn set_active(req: &mut Request, depot: &mut Depot, res: &mut Response, active: bool) {
    let Some(store) = obtain_store(depot, res) else {
        return;
    };
    let Some(id) = parse_id(req, res, "Customer") else {
        return;
    };

    match Directory::new(store).set_customer_active(id, active).await {
        Ok(customer) => res.render(Json(customer)),
        Err(err) => render_error(res, &err),
    }
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path("customers")
        .get(list_customers)
        .post(create_customer)
        .push(
            Router::with_path("{id}")
                .get(get_customer)
                .patch(update_customer)
                .push(Router::with_path("approve").post(approve_customer))
                .push(Router::with_path("deactivate").post(deactivate_customer)),
        )
}
