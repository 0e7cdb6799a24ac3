use std::fmt;

use crate::models::game::GameState;
use crate::repositories::errors::game_repository_errors::GameRepositoryError;
use crate::repositories::errors::user_repository_errors::UserDirectoryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Game,
    User,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ResourceKind::Game => write!(f, "Game"),
            ResourceKind::User => write!(f, "User"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GameServiceError {
    InvalidArgument(String),
    NotFound(ResourceKind, String),
    InvalidState {
        game_id: String,
        state: GameState,
        action: &'static str,
    },
    AlreadyMember {
        user_id: String,
        game_id: String,
    },
    AlreadyInActiveGame {
        user_id: String,
        game_id: String,
        game_name: String,
    },
    GameFull {
        game_id: String,
        max_players: u32,
    },
    DuplicateResource(String),
    /// Other writers kept changing the game; the request can be retried.
    ConcurrentModification {
        game_id: String,
    },
    /// Carries the store detail for the server log only; never shown to callers.
    InternalFault(String),
}

impl GameServiceError {
    /// Client faults are fixed by the caller changing the request.
    pub fn is_client_fault(&self) -> bool {
        !matches!(self, GameServiceError::InternalFault(_))
    }

    /// Stable, machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            GameServiceError::InvalidArgument(_) => "InvalidArgument",
            GameServiceError::NotFound(..) => "NotFound",
            GameServiceError::InvalidState { .. } => "InvalidState",
            GameServiceError::AlreadyMember { .. } => "AlreadyMember",
            GameServiceError::AlreadyInActiveGame { .. } => "AlreadyInActiveGame",
            GameServiceError::GameFull { .. } => "GameFull",
            GameServiceError::DuplicateResource(_) => "DuplicateResource",
            GameServiceError::ConcurrentModification { .. } => "ConcurrentModification",
            GameServiceError::InternalFault(_) => "InternalFault",
        }
    }

    pub(crate) fn game_not_found(game_id: &str) -> Self {
        GameServiceError::NotFound(ResourceKind::Game, game_id.to_string())
    }

    pub(crate) fn user_not_found(user_id: &str) -> Self {
        GameServiceError::NotFound(ResourceKind::User, user_id.to_string())
    }
}

impl fmt::Display for GameServiceError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            GameServiceError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            GameServiceError::NotFound(kind, id) => write!(f, "{} with id: {} not found", kind, id),
            GameServiceError::InvalidState {
                game_id,
                state,
                action,
            } => write!(f, "Game {} is {} and not {}", game_id, state, action),
            GameServiceError::AlreadyMember { user_id, game_id } => write!(
                f,
                "User {} has already joined game {}",
                user_id, game_id
            ),
            GameServiceError::AlreadyInActiveGame {
                user_id,
                game_id,
                game_name,
            } => write!(
                f,
                "User {} is already playing in active game '{}' ({})",
                user_id, game_name, game_id
            ),
            GameServiceError::GameFull {
                game_id,
                max_players,
            } => write!(
                f,
                "Game {} is full ({} players maximum)",
                game_id, max_players
            ),
            GameServiceError::DuplicateResource(detail) => write!(f, "{}", detail),
            GameServiceError::ConcurrentModification { game_id } => write!(
                f,
                "Game {} was modified concurrently, please retry",
                game_id
            ),
            GameServiceError::InternalFault(detail) => write!(f, "Internal fault: {}", detail),
        }
    }
}

impl std::error::Error for GameServiceError {}

impl From<GameRepositoryError> for GameServiceError {
    fn from(err: GameRepositoryError) -> Self {
        match err {
            GameRepositoryError::AlreadyExists(detail) => {
                GameServiceError::DuplicateResource(detail)
            }
            other => GameServiceError::InternalFault(other.to_string()),
        }
    }
}

impl From<UserDirectoryError> for GameServiceError {
    fn from(err: UserDirectoryError) -> Self {
        GameServiceError::InternalFault(err.to_string())
    }
}
