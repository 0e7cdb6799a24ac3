mod common;

use common::{spawn_app, TestClient};
use lobby_shared::services::game_service::LifecyclePolicy;
use reqwest::StatusCode;
use serde_json::{json, Value};

async fn create_game(client: &TestClient, body: Value) -> anyhow::Result<Value> {
    let response = client.post("/games", &body).await?;
    assert_eq!(response.status(), StatusCode::CREATED);
    Ok(response.json().await?)
}

async fn join(client: &TestClient, game_id: &str, user_id: Value) -> anyhow::Result<(StatusCode, Value)> {
    let response = client
        .post(&format!("/games/{}/join", game_id), &json!({ "userId": user_id }))
        .await?;
    let status = response.status();
    Ok((status, response.json().await?))
}

fn game_id(game: &Value) -> String {
    game["id"].as_str().unwrap_or_default().to_string()
}

#[tokio::test]
async fn test_health_endpoint() -> anyhow::Result<()> {
    let client = spawn_app(LifecyclePolicy::Strict).await?;

    let response = client.get("/health").await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await?;
    assert!(body.starts_with("Healthy!"));
    assert!(body.contains("strict"));
    Ok(())
}

#[tokio::test]
async fn test_trivia_membership_scenario() -> anyhow::Result<()> {
    let client = spawn_app(LifecyclePolicy::Strict).await?;

    let game = create_game(&client, json!({ "name": "Trivia", "maxPlayers": 2 })).await?;
    assert_eq!(game["state"], "WAITING");
    assert_eq!(game["maxPlayers"], 2);
    assert_eq!(game["players"], json!([]));
    assert!(game.get("score").is_none());
    let id = game_id(&game);

    let (status, body) = join(&client, &id, json!("1")).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Ada Lovelace joined Trivia successfully");

    let (status, body) = join(&client, &id, json!("1")).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "AlreadyMember");

    let (status, _) = join(&client, &id, json!(2)).await?;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = join(&client, &id, json!("3")).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "GameFull");

    let game: Value = client.get(&format!("/games/{}", id)).await?.json().await?;
    let players = game["players"].as_array().cloned().unwrap_or_default();
    assert_eq!(players.len(), 2);
    assert_eq!(players[0]["id"], "1");
    assert_eq!(players[1]["id"], "2");
    // Only the public profile is exposed.
    let mut keys: Vec<&String> = players[0].as_object().map(|o| o.keys().collect()).unwrap_or_default();
    keys.sort();
    assert_eq!(keys, vec!["email", "fullname", "id"]);
    Ok(())
}

#[tokio::test]
async fn test_user_cannot_join_second_active_game() -> anyhow::Result<()> {
    let client = spawn_app(LifecyclePolicy::Strict).await?;

    let first = create_game(
        &client,
        json!({ "name": "Chess night", "maxPlayers": 4, "userId": 1 }),
    )
    .await?;
    assert_eq!(first["players"][0]["fullname"], "Ada Lovelace");
    let second = create_game(&client, json!({ "name": "Poker", "maxPlayers": 4 })).await?;

    let (status, body) = join(&client, &game_id(&second), json!("1")).await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "AlreadyInActiveGame");
    let message = body["message"].as_str().unwrap_or_default();
    assert!(message.contains(&game_id(&first)));
    assert!(message.contains("Chess night"));
    Ok(())
}

#[tokio::test]
async fn test_strict_lifecycle() -> anyhow::Result<()> {
    let client = spawn_app(LifecyclePolicy::Strict).await?;
    let game = create_game(&client, json!({ "name": "Trivia", "maxPlayers": 2 })).await?;
    let id = game_id(&game);
    join(&client, &id, json!("1")).await?;
    join(&client, &id, json!("2")).await?;

    // Not started yet
    let response = client
        .patch(
            &format!("/games/{}/end", id),
            Some(&json!({ "score": { "1": 10, "2": 7 } })),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await?;
    assert_eq!(body["error"], "InvalidState");

    let response = client.patch(&format!("/games/{}/start", id), None).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await?;
    assert_eq!(body["message"], "The game Trivia has been started");

    let response = client.patch(&format!("/games/{}/start", id), None).await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let (status, body) = join(&client, &id, json!("3")).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "InvalidState");

    let response = client
        .patch(
            &format!("/games/{}/end", id),
            Some(&json!({ "score": { "1": 10, "2": 7 } })),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await?;
    assert_eq!(body["message"], "Game Trivia finished");

    let game: Value = client.get(&format!("/games/{}", id)).await?.json().await?;
    assert_eq!(game["state"], "FINISHED");
    assert_eq!(game["score"]["1"].as_f64(), Some(10.0));
    assert_eq!(game["score"]["2"].as_f64(), Some(7.0));
    Ok(())
}

#[tokio::test]
async fn test_permissive_policy_ends_waiting_game() -> anyhow::Result<()> {
    let client = spawn_app(LifecyclePolicy::Permissive).await?;
    let game = create_game(&client, json!({ "name": "Trivia", "maxPlayers": 2 })).await?;
    let id = game_id(&game);

    let response = client
        .patch(
            &format!("/games/{}/end", id),
            Some(&json!({ "score": { "1": 10, "2": 7 } })),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let game: Value = client.get(&format!("/games/{}", id)).await?.json().await?;
    assert_eq!(game["state"], "FINISHED");
    assert_eq!(game["score"]["2"].as_f64(), Some(7.0));
    Ok(())
}

#[tokio::test]
async fn test_legacy_scalar_score_is_rejected() -> anyhow::Result<()> {
    let client = spawn_app(LifecyclePolicy::Permissive).await?;
    let game = create_game(&client, json!({ "name": "Trivia", "maxPlayers": 2 })).await?;

    let response = client
        .patch(
            &format!("/games/{}/end", game_id(&game)),
            Some(&json!({ "score": 42 })),
        )
        .await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await?;
    assert_eq!(body["error"], "InvalidArgument");
    assert!(body["message"]
        .as_str()
        .unwrap_or_default()
        .contains("no longer supported"));
    Ok(())
}

#[tokio::test]
async fn test_missing_resources_are_not_found() -> anyhow::Result<()> {
    let client = spawn_app(LifecyclePolicy::Strict).await?;

    let response = client.get("/games/missing").await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await?;
    assert_eq!(body["error"], "NotFound");
    assert_eq!(body["message"], "Game with id: missing not found");

    let response = client.delete("/games/missing").await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = client.patch("/games/missing/start", None).await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let game = create_game(&client, json!({ "name": "Trivia", "maxPlayers": 2 })).await?;
    let (status, body) = join(&client, &game_id(&game), json!("99")).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "User with id: 99 not found");

    let response = client
        .post(
            "/games",
            &json!({ "name": "Trivia", "maxPlayers": 2, "userId": "99" }),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn test_invalid_requests_are_bad_requests() -> anyhow::Result<()> {
    let client = spawn_app(LifecyclePolicy::Strict).await?;

    let response = client
        .post("/games", &json!({ "name": "  ", "maxPlayers": 2 }))
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await?;
    assert_eq!(body["error"], "InvalidArgument");

    let response = client
        .post("/games", &json!({ "name": "Trivia", "maxPlayers": 0 }))
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = client.post("/games", &json!({ "maxPlayers": 2 })).await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await?;
    assert_eq!(body["error"], "InvalidArgument");

    let game = create_game(&client, json!({ "name": "Trivia", "maxPlayers": 2 })).await?;
    let response = client
        .post(&format!("/games/{}/join", game_id(&game)), &json!({}))
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = client.get("/games?status=PAUSED").await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn test_list_games_with_status_filter() -> anyhow::Result<()> {
    let client = spawn_app(LifecyclePolicy::Strict).await?;
    let first = create_game(&client, json!({ "name": "First", "maxPlayers": 2 })).await?;
    create_game(&client, json!({ "name": "Second", "maxPlayers": 2 })).await?;
    client
        .patch(&format!("/games/{}/start", game_id(&first)), None)
        .await?;

    let all: Vec<Value> = client.get("/games").await?.json().await?;
    let names: Vec<&str> = all.iter().filter_map(|game| game["name"].as_str()).collect();
    assert_eq!(names, vec!["First", "Second"]);

    let started: Vec<Value> = client.get("/games?status=IN_PROGRESS").await?.json().await?;
    assert_eq!(started.len(), 1);
    assert_eq!(started[0]["name"], "First");

    let finished: Vec<Value> = client.get("/games?status=FINISHED").await?.json().await?;
    assert!(finished.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_remove_game_releases_members() -> anyhow::Result<()> {
    let client = spawn_app(LifecyclePolicy::Strict).await?;
    let first = create_game(
        &client,
        json!({ "name": "First", "maxPlayers": 2, "userId": "1" }),
    )
    .await?;
    let second = create_game(&client, json!({ "name": "Second", "maxPlayers": 2 })).await?;

    let response = client.delete(&format!("/games/{}", game_id(&first))).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await?;
    assert_eq!(body["message"], "Game deleted successfully");

    let response = client.get(&format!("/games/{}", game_id(&first))).await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let (status, _) = join(&client, &game_id(&second), json!("1")).await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}
