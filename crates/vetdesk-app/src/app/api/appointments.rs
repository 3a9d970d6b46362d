//! Appointment booking endpoints.

use salvo::http::StatusCode;
use salvo::writing::Json;
use salvo::{Depot, Request, Response, Router, handler};

use vetdesk_service::scheduling::{
    AppointmentQuery, CreateAppointmentRequest, Scheduler, UpdateAppointmentRequest,
};

use super::response::{obtain_store, parse_id, render_bad_body, render_error};

/// ## Summary
/// POST /api/appointments - Books a new appointment.
///
/// ## Errors
/// Returns HTTP 400 for validation failures, slot conflicts, and lockout
/// violations, HTTP 500 for store failures.
#[handler]
async fn create_appointment(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let Some(store) = obtain_store(depot, res) else {
        return;
    };

    let request: CreateAppointmentRequest = match req.parse_json().await {
        Ok(r) => r,
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to parse appointment booking request");
            render_bad_body(res);
            return;
        }
    };

    match Scheduler::new(store).create(request).await {
        Ok(appointment) => {
            res.status_code(StatusCode::CREATED);
            res.render(Json(appointment));
        }
        Err(err) => render_error(res, &err),
    }
}

/// ## Summary
/// PATCH /api/appointments/{id} - Applies a partial update, including
/// reschedules and status transitions.
///
/// ## Errors
/// Returns HTTP 404 for an unknown id, HTTP 400 for conflicts and lockout
/// violations.
#[handler]
async fn update_appointment(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let Some(store) = obtain_store(depot, res) else {
        return;
    };
    let Some(id) = parse_id(req, res, "Appointment") else {
        return;
    };

    let request: UpdateAppointmentRequest = match req.parse_json().await {
        Ok(r) => r,
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to parse appointment update request");
            render_bad_body(res);
            return;
        }
    };

    match Scheduler::new(store).update(id, request).await {
        Ok(appointment) => res.render(Json(appointment)),
        Err(err) => render_error(res, &err),
    }
}

/// ## Summary
/// GET /api/appointments - Lists appointments ascending by scheduled
/// instant. `?date=` restricts to one local calendar day; `?status=`
/// filters by exact status name.
#[handler]
async fn list_appointments(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let Some(store) = obtain_store(depot, res) else {
        return;
    };

    let query = AppointmentQuery {
        date: req.query("date"),
        status: req.query("status"),
    };

    match Scheduler::new(store).list(query).await {
        Ok(appointments) => res.render(Json(appointments)),
        Err(err) => render_error(res, &err),
    }
}

/// GET /api/appointments/{id}
#[handler]
async fn get_appointment(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let Some(store) = obtain_store(depot, res) else {
        return;
    };
    let Some(id) = parse_id(req, res, "Appointment") else {
        return;
    };

    match Scheduler::new(store).get(id).await {
        Ok(appointment) => res.render(Json(appointment)),
        Err(err) => render_error(res, &err),
    }
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path("appointments")
        .get(list_appointments)
        .post(create_appointment)
        .push(
            Router::with_path("{id}")
                .get(get_appointment)
                .patch(update_appointment),
        )
}
