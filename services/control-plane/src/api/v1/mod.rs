//! API v1 routes.

mod instances;
mod zones;

use axum::Router;

use crate::state::AppState;

/// Create API v1 routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(zones::routes())
        .merge(instances::routes())
}
