use std::sync::Arc;

use lobby_shared::repositories::game_repository::{DynamoDbGameRepository, GameRepository};
use lobby_shared::repositories::in_memory::{InMemoryGameRepository, InMemoryUserDirectory};
use lobby_shared::repositories::user_repository::{DynamoDbUserDirectory, UserDirectory};
use lobby_shared::services::game_service::GameService;
use tracing::info;

use crate::config::{AppConfig, StoreBackend};

#[derive(Clone)]
pub struct AppState {
    pub game_service: Arc<GameService>,
}

impl AppState {
    pub fn new(game_service: GameService) -> Self {
        AppState {
            game_service: Arc::new(game_service),
        }
    }

    /// Wires the game service to the store selected by `config`.
    pub async fn from_config(config: &AppConfig) -> Result<Self, lambda_http::Error> {
        let (games, users): (
            Arc<dyn GameRepository + Send + Sync>,
            Arc<dyn UserDirectory + Send + Sync>,
        ) = match &config.store {
            StoreBackend::DynamoDb {
                games_table,
                users_table,
            } => {
                let aws_config = aws_config::load_from_env().await;
                let client = aws_sdk_dynamodb::Client::new(&aws_config);
                info!(
                    "Using DynamoDB tables {} (games) and {} (users)",
                    games_table, users_table
                );
                (
                    Arc::new(DynamoDbGameRepository::new(client.clone(), games_table)),
                    Arc::new(DynamoDbUserDirectory::new(client, users_table)),
                )
            }
            StoreBackend::Memory { users_seed_file } => {
                let directory = match users_seed_file {
                    Some(path) => InMemoryUserDirectory::from_seed_file(path).await?,
                    None => InMemoryUserDirectory::default(),
                };
                info!("Using in-memory store with {} seeded users", directory.len());
                (
                    Arc::new(InMemoryGameRepository::new()),
                    Arc::new(directory),
                )
            }
        };

        Ok(AppState::new(GameService::with_policy(
            games,
            users,
            config.lifecycle_policy,
        )))
    }
}
