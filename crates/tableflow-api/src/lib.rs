pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::{Router, routing::get};

use state::AppState;

/// All trigger routes, registered explicitly at startup.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/cache_pull", get(routes::cache_pull))
        .route("/update_table", get(routes::update_table))
        .route("/combine_table", get(routes::combine_table))
        .route("/publish", get(routes::publish))
        .with_state(state)
}
