use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use futures::TryStreamExt;
use lobby_shared::models::game::GameView;
use lobby_shared::models::requests::{
    CreateGameRequest, EndGameRequest, JoinGameRequest, ListGamesQuery,
};
use lobby_shared::models::responses::MessageResponse;
use lobby_shared::services::errors::game_service_errors::GameServiceError;
use tracing::{debug, warn};

use crate::{error::ApiError, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/games", post(create_game).get(list_games))
        .route("/games/{id}", get(get_game).delete(remove_game))
        .route("/games/{id}/join", post(join_game))
        .route("/games/{id}/start", patch(start_game))
        .route("/games/{id}/end", patch(end_game))
}

async fn create_game(
    State(state): State<AppState>,
    payload: Result<Json<CreateGameRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<GameView>), ApiError> {
    let Json(payload) = payload?;
    let game = state
        .game_service
        .create_game(payload.into())
        .await
        .map_err(|e| {
            debug!("Failed to create game: {}", e);
            ApiError::from(e)
        })?;

    Ok((StatusCode::CREATED, Json(game)))
}

async fn list_games(
    State(state): State<AppState>,
    query: Result<Query<ListGamesQuery>, QueryRejection>,
) -> Result<Json<Vec<GameView>>, ApiError> {
    let Query(query) = query?;
    let games: Vec<GameView> = state
        .game_service
        .list_games(query.status)
        .await?
        .try_collect()
        .await
        .map_err(|e| {
            debug!("Failed to list games: {}", e);
            ApiError::from(e)
        })?;

    Ok(Json(games))
}

async fn get_game(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
) -> Result<Json<GameView>, ApiError> {
    state
        .game_service
        .find_game(&game_id)
        .await
        .map(Json)
        .map_err(|e| {
            debug!("Failed to retrieve game {}: {}", game_id, e);
            ApiError::from(e)
        })
}

async fn join_game(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
    payload: Result<Json<JoinGameRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(payload) = payload?;
    let message = state
        .game_service
        .join_game(&game_id, payload.user_id.as_deref())
        .await
        .map_err(|e| {
            if matches!(e, GameServiceError::AlreadyInActiveGame { .. }) {
                warn!("Rejected join of game {}: {}", game_id, e);
            } else {
                debug!("Failed to join game {}: {}", game_id, e);
            }
            ApiError::from(e)
        })?;

    Ok(Json(MessageResponse::new(message)))
}

async fn start_game(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let message = state.game_service.start_game(&game_id).await.map_err(|e| {
        debug!("Failed to start game {}: {}", game_id, e);
        ApiError::from(e)
    })?;

    Ok(Json(MessageResponse::new(message)))
}

async fn end_game(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
    payload: Result<Json<EndGameRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(payload) = payload?;
    let score = payload.score.into_scoreboard().map_err(|reason| {
        warn!("Rejected legacy score for game {}", game_id);
        ApiError::from(GameServiceError::InvalidArgument(reason))
    })?;

    let message = state
        .game_service
        .end_game(&game_id, score)
        .await
        .map_err(|e| {
            debug!("Failed to end game {}: {}", game_id, e);
            ApiError::from(e)
        })?;

    Ok(Json(MessageResponse::new(message)))
}

async fn remove_game(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let message = state.game_service.remove_game(&game_id).await.map_err(|e| {
        debug!("Failed to remove game {}: {}", game_id, e);
        ApiError::from(e)
    })?;

    Ok(Json(MessageResponse::new(message)))
}
