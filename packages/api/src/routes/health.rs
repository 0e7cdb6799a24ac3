use axum::{extract::State, http::StatusCode, routing::get, Router};
use lobby_shared::services::game_service::LifecyclePolicy;

use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

/// Liveness probe. Reports which lifecycle policy the service enforces.
async fn health_check(State(state): State<AppState>) -> (StatusCode, String) {
    let policy = match state.game_service.policy() {
        LifecyclePolicy::Strict => "strict",
        LifecyclePolicy::Permissive => "permissive",
    };
    (StatusCode::OK, format!("Healthy! (lifecycle policy: {})", policy))
}
