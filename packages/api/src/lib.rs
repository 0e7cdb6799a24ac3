//! HTTP surface of the game lobby: axum routes over the shared game service.

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use state::AppState;

pub fn create_app(state: AppState, cors: CorsLayer) -> Router {
    let api = Router::new()
        .merge(routes::health::routes())
        .merge(routes::games::routes());

    Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
