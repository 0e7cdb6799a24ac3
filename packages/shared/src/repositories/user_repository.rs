use async_trait::async_trait;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;
use serde_dynamo::aws_sdk_dynamodb_1::from_item;

use crate::models::user::User;
use crate::repositories::errors::user_repository_errors::UserDirectoryError;

#[cfg(test)]
use mockall::automock;

/// Read-only view of the user store. Games reference users by id only.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_user(&self, user_id: &str) -> Result<User, UserDirectoryError>;
}

pub struct DynamoDbUserDirectory {
    pub client: Client,
    pub table_name: String,
}

impl DynamoDbUserDirectory {
    pub fn new(client: Client, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }
}

#[async_trait]
impl UserDirectory for DynamoDbUserDirectory {
    async fn find_user(&self, user_id: &str) -> Result<User, UserDirectoryError> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key("id", AttributeValue::S(user_id.to_string()))
            .send()
            .await
            .map_err(|e| UserDirectoryError::DynamoDb(DisplayErrorContext(e).to_string()))?;

        if let Some(item) = output.item {
            let user: User =
                from_item(item).map_err(|e| UserDirectoryError::Serialization(e.to_string()))?;
            Ok(user)
        } else {
            Err(UserDirectoryError::NotFound)
        }
    }
}
