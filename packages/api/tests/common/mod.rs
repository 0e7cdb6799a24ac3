use std::sync::Arc;

use lobby_api::{create_app, state::AppState};
use lobby_shared::models::user::User;
use lobby_shared::repositories::in_memory::{InMemoryGameRepository, InMemoryUserDirectory};
use lobby_shared::services::game_service::{GameService, LifecyclePolicy};
use serde_json::Value;
use tower_http::cors::CorsLayer;

/// HTTP client bound to one spawned instance of the API.
pub struct TestClient {
    pub client: reqwest::Client,
    pub base_url: String,
}

impl TestClient {
    pub async fn get(&self, path: &str) -> reqwest::Result<reqwest::Response> {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await
    }

    pub async fn post(&self, path: &str, body: &Value) -> reqwest::Result<reqwest::Response> {
        self.client
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await
    }

    pub async fn patch(&self, path: &str, body: Option<&Value>) -> reqwest::Result<reqwest::Response> {
        let request = self.client.patch(format!("{}{}", self.base_url, path));
        match body {
            Some(body) => request.json(body).send().await,
            None => request.send().await,
        }
    }

    pub async fn delete(&self, path: &str) -> reqwest::Result<reqwest::Response> {
        self.client
            .delete(format!("{}{}", self.base_url, path))
            .send()
            .await
    }
}

pub fn seeded_users() -> Vec<User> {
    vec![
        User::new("1", "Ada Lovelace", "ada@example.com"),
        User::new("2", "Alan Turing", "alan@example.com"),
        User::new("3", "Grace Hopper", "grace@example.com"),
    ]
}

/// Serves the API on an ephemeral port backed by the in-memory store.
pub async fn spawn_app(policy: LifecyclePolicy) -> anyhow::Result<TestClient> {
    let service = GameService::with_policy(
        Arc::new(InMemoryGameRepository::new()),
        Arc::new(InMemoryUserDirectory::new(seeded_users())),
        policy,
    );
    let app = create_app(AppState::new(service), CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    Ok(TestClient {
        client: reqwest::Client::new(),
        base_url: format!("http://{}/api", addr),
    })
}
