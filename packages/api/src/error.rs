use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use lobby_shared::models::responses::ErrorResponse;
use lobby_shared::services::errors::game_service_errors::GameServiceError;

#[derive(Debug)]
pub enum ApiError {
    GameService(GameServiceError),
    /// Body or query string could not be decoded.
    MalformedRequest(String),
}

impl From<GameServiceError> for ApiError {
    fn from(error: GameServiceError) -> Self {
        ApiError::GameService(error)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::MalformedRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::MalformedRequest(rejection.body_text())
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::GameService(GameServiceError::NotFound(..)) => StatusCode::NOT_FOUND,
            ApiError::GameService(GameServiceError::InternalFault(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::GameService(_) => StatusCode::BAD_REQUEST,
            ApiError::MalformedRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn body(&self) -> ErrorResponse {
        match self {
            // Store details stay in the server log.
            ApiError::GameService(error @ GameServiceError::InternalFault(_)) => ErrorResponse {
                error: error.kind().to_string(),
                message: "Internal server error".to_string(),
            },
            ApiError::GameService(error) => ErrorResponse {
                error: error.kind().to_string(),
                message: error.to_string(),
            },
            ApiError::MalformedRequest(detail) => ErrorResponse {
                error: "InvalidArgument".to_string(),
                message: detail.clone(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}
