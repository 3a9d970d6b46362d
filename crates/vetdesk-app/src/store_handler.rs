use salvo::async_trait;
use std::sync::Arc;

use crate::error::AppResult;
use vetdesk_core::error::CoreError;
use vetdesk_db::store::RecordStore;

/// Middleware that makes the configured record store available to every
/// handler through the depot.
pub struct StoreHandler {
    pub store: Arc<dyn RecordStore>,
}

#[async_trait]
impl salvo::Handler for StoreHandler {
    async fn handle(
        &self,
        _req: &mut salvo::Request,
        depot: &mut salvo::Depot,
        _res: &mut salvo::Response,
        _ctrl: &mut salvo::FlowCtrl,
    ) {
        depot.inject(Arc::clone(&self.store));
    }
}

/// ## Summary
/// Retrieves the record store from the depot.
///
/// ## Errors
/// Returns an error if the record store is not found in the depot.
pub fn get_store_from_depot(depot: &salvo::Depot) -> AppResult<Arc<dyn RecordStore>> {
    depot
        .obtain::<Arc<dyn RecordStore>>()
        .cloned()
        .map_err(|_err| CoreError::InvariantViolation("Record store not found in depot").into())
}
