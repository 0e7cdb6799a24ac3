use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::models::game::{Game, GameState, GameUpdate};
use crate::models::user::User;
use crate::repositories::errors::game_repository_errors::GameRepositoryError;
use crate::repositories::errors::user_repository_errors::UserDirectoryError;
use crate::repositories::game_repository::GameRepository;
use crate::repositories::user_repository::UserDirectory;

/// Process-local game store. Games are kept in insertion order and every
/// write happens under a single table lock, so membership writes are
/// serialised the same way a conditional write serialises them in DynamoDB.
#[derive(Default)]
pub struct InMemoryGameRepository {
    games: RwLock<Vec<Game>>,
}

impl InMemoryGameRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GameRepository for InMemoryGameRepository {
    async fn create_game(&self, game: &Game) -> Result<(), GameRepositoryError> {
        let mut games = self.games.write().await;
        if games.iter().any(|existing| existing.id == game.id) {
            return Err(GameRepositoryError::AlreadyExists(format!(
                "Key (id)=({}) already exists.",
                game.id
            )));
        }
        games.push(game.clone());
        Ok(())
    }

    async fn get_game(&self, game_id: &str) -> Result<Option<Game>, GameRepositoryError> {
        let games = self.games.read().await;
        Ok(games.iter().find(|game| game.id == game_id).cloned())
    }

    async fn list_games(&self, state: Option<GameState>) -> Result<Vec<Game>, GameRepositoryError> {
        let games = self.games.read().await;
        Ok(games
            .iter()
            .filter(|game| state.map_or(true, |state| game.state == state))
            .cloned()
            .collect())
    }

    async fn list_games_by_member(&self, user_id: &str) -> Result<Vec<Game>, GameRepositoryError> {
        let games = self.games.read().await;
        Ok(games
            .iter()
            .filter(|game| game.has_member(user_id))
            .cloned()
            .collect())
    }

    async fn update_game(
        &self,
        game_id: &str,
        update: GameUpdate,
        expected_version: u64,
    ) -> Result<Game, GameRepositoryError> {
        let mut games = self.games.write().await;
        let game = games
            .iter_mut()
            .find(|game| game.id == game_id)
            .ok_or(GameRepositoryError::NotFound)?;
        if game.version != expected_version {
            return Err(GameRepositoryError::VersionConflict);
        }

        if let Some(state) = update.state {
            game.state = state;
        }
        if let Some(score) = update.score {
            game.score = Some(score);
        }
        game.version += 1;

        Ok(game.clone())
    }

    async fn add_member(
        &self,
        game_id: &str,
        user_id: &str,
        expected_version: u64,
    ) -> Result<(), GameRepositoryError> {
        let mut games = self.games.write().await;
        let game = games
            .iter_mut()
            .find(|game| game.id == game_id)
            .ok_or(GameRepositoryError::VersionConflict)?;

        if game.version != expected_version || game.has_member(user_id) {
            return Err(GameRepositoryError::VersionConflict);
        }

        game.player_ids.push(user_id.to_string());
        game.version += 1;
        Ok(())
    }

    async fn delete_game(&self, game_id: &str) -> Result<(), GameRepositoryError> {
        let mut games = self.games.write().await;
        let position = games
            .iter()
            .position(|game| game.id == game_id)
            .ok_or(GameRepositoryError::NotFound)?;
        games.remove(position);
        Ok(())
    }
}

/// Fixed set of users, for local runs and tests.
#[derive(Default)]
pub struct InMemoryUserDirectory {
    users: HashMap<String, User>,
}

impl InMemoryUserDirectory {
    pub fn new(users: Vec<User>) -> Self {
        InMemoryUserDirectory {
            users: users.into_iter().map(|user| (user.id.clone(), user)).collect(),
        }
    }

    /// Loads a JSON array of users.
    pub async fn from_seed_file(path: impl AsRef<Path>) -> Result<Self, UserDirectoryError> {
        let contents = tokio::fs::read_to_string(path.as_ref())
            .await
            .map_err(|e| UserDirectoryError::Io(format!("{}: {}", path.as_ref().display(), e)))?;
        let users: Vec<User> = serde_json::from_str(&contents)
            .map_err(|e| UserDirectoryError::Serialization(e.to_string()))?;
        Ok(Self::new(users))
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_user(&self, user_id: &str) -> Result<User, UserDirectoryError> {
        self.users
            .get(user_id)
            .cloned()
            .ok_or(UserDirectoryError::NotFound)
    }
}
