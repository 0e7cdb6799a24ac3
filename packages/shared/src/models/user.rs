use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user record as held by the user directory. Unknown attributes stored
/// alongside it (credentials, ratings, ...) are ignored on read.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct User {
    pub id: String,
    pub fullname: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn new(id: &str, fullname: &str, email: &str) -> Self {
        User {
            id: id.to_string(),
            fullname: fullname.to_string(),
            email: email.to_string(),
            created_at: Some(Utc::now()),
        }
    }
}

/// The only user fields ever exposed as part of a game.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct PlayerProfile {
    pub id: String,
    pub fullname: String,
    pub email: String,
}

impl From<User> for PlayerProfile {
    fn from(user: User) -> Self {
        PlayerProfile {
            id: user.id,
            fullname: user.fullname,
            email: user.email,
        }
    }
}
