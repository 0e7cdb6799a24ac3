#[derive(Debug)]
pub enum UserDirectoryError {
    NotFound,
    Serialization(String),
    DynamoDb(String),
    Io(String),
}

impl std::fmt::Display for UserDirectoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserDirectoryError::NotFound => write!(f, "User not found"),
            UserDirectoryError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            UserDirectoryError::DynamoDb(msg) => write!(f, "DynamoDB error: {}", msg),
            UserDirectoryError::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for UserDirectoryError {}
