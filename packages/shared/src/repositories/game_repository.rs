use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::operation::update_item::UpdateItemError;
use aws_sdk_dynamodb::types::{AttributeValue, ReturnValue, ReturnValuesOnConditionCheckFailure};
use aws_sdk_dynamodb::Client;
use serde_dynamo::aws_sdk_dynamodb_1::{from_item, from_items, to_attribute_value, to_item};
use tracing::debug;

use crate::models::game::{Game, GameState, GameUpdate};
use crate::repositories::errors::game_repository_errors::GameRepositoryError;

#[cfg(test)]
use mockall::automock;

#[cfg_attr(test, automock)]
#[async_trait]
pub trait GameRepository: Send + Sync {
    /// Persists a new game. Fails with `AlreadyExists` if the id is taken.
    async fn create_game(&self, game: &Game) -> Result<(), GameRepositoryError>;

    async fn get_game(&self, game_id: &str) -> Result<Option<Game>, GameRepositoryError>;

    /// All games, oldest first, optionally restricted to one state.
    async fn list_games(&self, state: Option<GameState>) -> Result<Vec<Game>, GameRepositoryError>;

    /// Every game the user is a member of, whatever its state.
    async fn list_games_by_member(&self, user_id: &str) -> Result<Vec<Game>, GameRepositoryError>;

    /// Applies `update` only if the stored version still equals
    /// `expected_version`. A missing game is `NotFound`, a moved version is
    /// `VersionConflict`.
    async fn update_game(
        &self,
        game_id: &str,
        update: GameUpdate,
        expected_version: u64,
    ) -> Result<Game, GameRepositoryError>;

    /// Appends `user_id` to the game's players only if the stored version
    /// still equals `expected_version` and the user is not yet a member.
    /// Any refusal is reported as `VersionConflict`.
    async fn add_member(
        &self,
        game_id: &str,
        user_id: &str,
        expected_version: u64,
    ) -> Result<(), GameRepositoryError>;

    async fn delete_game(&self, game_id: &str) -> Result<(), GameRepositoryError>;
}

pub struct DynamoDbGameRepository {
    pub client: Client,
    pub table_name: String,
}

impl DynamoDbGameRepository {
    pub fn new(client: Client, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }

    async fn scan_games(
        &self,
        filter_expression: Option<&str>,
        names: Option<HashMap<String, String>>,
        values: Option<HashMap<String, AttributeValue>>,
    ) -> Result<Vec<Game>, GameRepositoryError> {
        let mut games = Vec::new();
        let mut start_key: Option<HashMap<String, AttributeValue>> = None;

        loop {
            let output = self
                .client
                .scan()
                .table_name(&self.table_name)
                .consistent_read(true)
                .set_filter_expression(filter_expression.map(str::to_string))
                .set_expression_attribute_names(names.clone())
                .set_expression_attribute_values(values.clone())
                .set_exclusive_start_key(start_key.take())
                .send()
                .await
                .map_err(dynamo_error)?;

            if let Some(items) = output.items {
                let page: Vec<Game> = from_items(items)
                    .map_err(|e| GameRepositoryError::Serialization(e.to_string()))?;
                games.extend(page);
            }

            match output.last_evaluated_key {
                Some(key) if !key.is_empty() => start_key = Some(key),
                _ => break,
            }
        }

        // Scan order is hash order; listings are expected oldest first.
        games.sort_by_key(|game| game.created_at);
        debug!("Scanned {} games from {}", games.len(), self.table_name);
        Ok(games)
    }
}

#[async_trait]
impl GameRepository for DynamoDbGameRepository {
    async fn create_game(&self, game: &Game) -> Result<(), GameRepositoryError> {
        let item = to_item(game).map_err(|e| GameRepositoryError::Serialization(e.to_string()))?;

        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .condition_expression("attribute_not_exists(id)")
            .send()
            .await
            .map_err(|e| {
                let duplicate = e
                    .as_service_error()
                    .map_or(false, |se| se.is_conditional_check_failed_exception());
                if duplicate {
                    GameRepositoryError::AlreadyExists(format!(
                        "Key (id)=({}) already exists.",
                        game.id
                    ))
                } else {
                    dynamo_error(e)
                }
            })?;

        Ok(())
    }

    async fn get_game(&self, game_id: &str) -> Result<Option<Game>, GameRepositoryError> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key("id", AttributeValue::S(game_id.to_string()))
            .consistent_read(true)
            .send()
            .await
            .map_err(dynamo_error)?;

        match output.item {
            Some(item) => {
                let game: Game = from_item(item)
                    .map_err(|e| GameRepositoryError::Serialization(e.to_string()))?;
                Ok(Some(game))
            }
            None => Ok(None),
        }
    }

    async fn list_games(&self, state: Option<GameState>) -> Result<Vec<Game>, GameRepositoryError> {
        match state {
            Some(state) => {
                let names = HashMap::from([("#state".to_string(), "state".to_string())]);
                let values = HashMap::from([(
                    ":state".to_string(),
                    AttributeValue::S(state.as_str().to_string()),
                )]);
                self.scan_games(Some("#state = :state"), Some(names), Some(values))
                    .await
            }
            None => self.scan_games(None, None, None).await,
        }
    }

    async fn list_games_by_member(&self, user_id: &str) -> Result<Vec<Game>, GameRepositoryError> {
        let values = HashMap::from([(
            ":user_id".to_string(),
            AttributeValue::S(user_id.to_string()),
        )]);
        self.scan_games(Some("contains(player_ids, :user_id)"), None, Some(values))
            .await
    }

    async fn update_game(
        &self,
        game_id: &str,
        update: GameUpdate,
        expected_version: u64,
    ) -> Result<Game, GameRepositoryError> {
        let mut assignments = vec!["#version = #version + :one"];
        let mut names = HashMap::from([("#version".to_string(), "version".to_string())]);
        let mut values = HashMap::from([
            (":one".to_string(), AttributeValue::N("1".to_string())),
            (
                ":expected".to_string(),
                AttributeValue::N(expected_version.to_string()),
            ),
        ]);

        if let Some(state) = update.state {
            assignments.push("#state = :state");
            names.insert("#state".to_string(), "state".to_string());
            values.insert(
                ":state".to_string(),
                AttributeValue::S(state.as_str().to_string()),
            );
        }

        if let Some(score) = update.score {
            assignments.push("#score = :score");
            names.insert("#score".to_string(), "score".to_string());
            values.insert(
                ":score".to_string(),
                to_attribute_value(score)
                    .map_err(|e| GameRepositoryError::Serialization(e.to_string()))?,
            );
        }

        let output = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .key("id", AttributeValue::S(game_id.to_string()))
            .update_expression(format!("SET {}", assignments.join(", ")))
            .condition_expression("attribute_exists(id) AND #version = :expected")
            .set_expression_attribute_names(Some(names))
            .set_expression_attribute_values(Some(values))
            .return_values(ReturnValue::AllNew)
            // The old item comes back only when the game exists, which tells a
            // stale version apart from a deleted game.
            .return_values_on_condition_check_failure(ReturnValuesOnConditionCheckFailure::AllOld)
            .send()
            .await
            .map_err(|e| {
                let refused = match e.as_service_error() {
                    Some(UpdateItemError::ConditionalCheckFailedException(failed)) => {
                        Some(match failed.item() {
                            Some(_) => GameRepositoryError::VersionConflict,
                            None => GameRepositoryError::NotFound,
                        })
                    }
                    _ => None,
                };
                refused.unwrap_or_else(|| dynamo_error(e))
            })?;

        let attributes = output.attributes.ok_or(GameRepositoryError::NotFound)?;
        from_item(attributes).map_err(|e| GameRepositoryError::Serialization(e.to_string()))
    }

    async fn add_member(
        &self,
        game_id: &str,
        user_id: &str,
        expected_version: u64,
    ) -> Result<(), GameRepositoryError> {
        let names = HashMap::from([
            ("#players".to_string(), "player_ids".to_string()),
            ("#version".to_string(), "version".to_string()),
        ]);
        let values = HashMap::from([
            (":empty".to_string(), AttributeValue::L(vec![])),
            (
                ":new_player".to_string(),
                AttributeValue::L(vec![AttributeValue::S(user_id.to_string())]),
            ),
            (":user_id".to_string(), AttributeValue::S(user_id.to_string())),
            (
                ":expected".to_string(),
                AttributeValue::N(expected_version.to_string()),
            ),
            (":one".to_string(), AttributeValue::N("1".to_string())),
        ]);

        self.client
            .update_item()
            .table_name(&self.table_name)
            .key("id", AttributeValue::S(game_id.to_string()))
            .update_expression(
                "SET #players = list_append(if_not_exists(#players, :empty), :new_player), \
                 #version = #version + :one",
            )
            .condition_expression(
                "attribute_exists(id) AND #version = :expected AND NOT contains(#players, :user_id)",
            )
            .set_expression_attribute_names(Some(names))
            .set_expression_attribute_values(Some(values))
            .send()
            .await
            .map_err(|e| {
                let refused = e
                    .as_service_error()
                    .map_or(false, |se| se.is_conditional_check_failed_exception());
                if refused {
                    GameRepositoryError::VersionConflict
                } else {
                    dynamo_error(e)
                }
            })?;

        Ok(())
    }

    async fn delete_game(&self, game_id: &str) -> Result<(), GameRepositoryError> {
        self.client
            .delete_item()
            .table_name(&self.table_name)
            .key("id", AttributeValue::S(game_id.to_string()))
            .condition_expression("attribute_exists(id)")
            .send()
            .await
            .map_err(|e| {
                let missing = e
                    .as_service_error()
                    .map_or(false, |se| se.is_conditional_check_failed_exception());
                if missing {
                    GameRepositoryError::NotFound
                } else {
                    dynamo_error(e)
                }
            })?;

        Ok(())
    }
}

fn dynamo_error<E: std::error::Error>(error: E) -> GameRepositoryError {
    GameRepositoryError::DynamoDb(DisplayErrorContext(error).to_string())
}
