use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::user::PlayerProfile;

/// Final score per player, keyed by user id.
pub type Scoreboard = BTreeMap<String, f64>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameState {
    #[default]
    Waiting,
    InProgress,
    Finished,
}

impl GameState {
    /// Waiting and in-progress games count towards a user's single active game.
    pub fn is_active(self) -> bool {
        matches!(self, GameState::Waiting | GameState::InProgress)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GameState::Waiting => "WAITING",
            GameState::InProgress => "IN_PROGRESS",
            GameState::Finished => "FINISHED",
        }
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameState {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "WAITING" => Ok(GameState::Waiting),
            "IN_PROGRESS" => Ok(GameState::InProgress),
            "FINISHED" => Ok(GameState::Finished),
            other => Err(format!("Unknown game state: {}", other)),
        }
    }
}

/// A game record as persisted by the game store. Membership is owned by the
/// game as an ordered list of user ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub id: String,
    pub name: String,
    pub max_players: u32,
    pub state: GameState,
    #[serde(default)]
    pub player_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<Scoreboard>,
    #[serde(default)]
    pub version: u64,
    pub created_at: DateTime<Utc>,
}

impl Game {
    pub fn new(name: &str, max_players: u32, state: GameState) -> Self {
        Game {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            max_players,
            state,
            player_ids: vec![],
            score: None,
            version: 0,
            created_at: Utc::now(),
        }
    }

    pub fn has_member(&self, user_id: &str) -> bool {
        self.player_ids.iter().any(|id| id == user_id)
    }

    pub fn is_full(&self) -> bool {
        self.player_ids.len() >= self.max_players as usize
    }
}

/// Partial update applied by the store. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GameUpdate {
    pub state: Option<GameState>,
    pub score: Option<Scoreboard>,
}

/// A game with its membership resolved to public player profiles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameView {
    pub id: String,
    pub name: String,
    pub max_players: u32,
    pub state: GameState,
    pub players: Vec<PlayerProfile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<Scoreboard>,
    pub created_at: DateTime<Utc>,
}

impl GameView {
    pub fn from_game(game: Game, players: Vec<PlayerProfile>) -> Self {
        GameView {
            id: game.id,
            name: game.name,
            max_players: game.max_players,
            state: game.state,
            players,
            score: game.score,
            created_at: game.created_at,
        }
    }
}
