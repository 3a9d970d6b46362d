//! Staff listing endpoints.

use salvo::writing::Json;
use salvo::{Depot, Request, Response, Router, handler};

use vetdesk_service::directory::Directory;

use super::response::{obtain_store, render_error};

/// GET /api/users - Lists staff accounts, optionally filtered by `?role=`
/// (the client uses `role=veterinarian` to populate assignment pickers).
#[handler]
async fn list_users(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let Some(store) = obtain_store(depot, res) else {
        return;
    };

    let role: Option<String> = req.query("role");
    match Directory::new(store).list_users(role.as_deref()).await {
        Ok(users) => res.render(Json(users)),
        Err(err) => render_error(res, &err),
    }
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path("users").get(list_users)
}
