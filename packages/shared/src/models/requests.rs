use serde::{Deserialize, Deserializer, Serialize};

use crate::models::game::{GameState, Scoreboard};

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGameRequest {
    pub name: String,
    pub max_players: u32,
    #[serde(default, deserialize_with = "deserialize_optional_user_id")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub state: Option<GameState>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinGameRequest {
    #[serde(default, deserialize_with = "deserialize_optional_user_id")]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EndGameRequest {
    pub score: ScoreSubmission,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ListGamesQuery {
    pub status: Option<GameState>,
}

/// Score payload as sent by clients. Older clients sent a single number for
/// the whole game; that form is still recognised so it can be refused with a
/// meaningful message instead of a generic parse failure.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ScoreSubmission {
    PerPlayer(Scoreboard),
    Legacy(f64),
}

impl ScoreSubmission {
    pub fn into_scoreboard(self) -> Result<Scoreboard, String> {
        match self {
            ScoreSubmission::PerPlayer(scores) => Ok(scores),
            ScoreSubmission::Legacy(_) => Err(
                "A single numeric score is no longer supported; send a mapping of user id to score"
                    .to_string(),
            ),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawUserId {
    Text(String),
    Number(u64),
}

/// User ids are strings, but numeric ids are accepted for older clients.
fn deserialize_optional_user_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawUserId>::deserialize(deserializer)?;
    Ok(raw.map(|raw| match raw {
        RawUserId::Text(text) => text,
        RawUserId::Number(number) => number.to_string(),
    }))
}
