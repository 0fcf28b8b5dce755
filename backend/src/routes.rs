use axum::{
    middleware,
    routing::{delete, get, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::require_basic_auth;
use crate::handlers::{complete_task, create_task, delete_task, list_tasks};
use crate::state::AppState;

/// Builds the task router. Every task route sits behind Basic auth.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/tasks/", get(list_tasks).post(create_task))
        .route("/tasks", get(list_tasks).post(create_task))
        .route("/tasks/check/:name", put(complete_task))
        .route("/tasks/:name", delete(delete_task))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_basic_auth,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
