#[derive(Debug)]
pub enum GameRepositoryError {
    NotFound,
    /// A uniqueness constraint was violated; carries the store's detail.
    AlreadyExists(String),
    /// The game changed since it was read; the conditional write was refused.
    VersionConflict,
    Serialization(String),
    DynamoDb(String),
}

impl std::fmt::Display for GameRepositoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameRepositoryError::NotFound => write!(f, "Game not found"),
            GameRepositoryError::AlreadyExists(detail) => write!(f, "{}", detail),
            GameRepositoryError::VersionConflict => {
                write!(f, "Game was modified concurrently")
            }
            GameRepositoryError::Serialization(msg) => {
                write!(f, "Serialization error: {}", msg)
            }
            GameRepositoryError::DynamoDb(msg) => write!(f, "DynamoDB error: {}", msg),
        }
    }
}

impl std::error::Error for GameRepositoryError {}
