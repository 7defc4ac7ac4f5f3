// tests/social_tests.rs
//
// Follow/unfollow relationships, derived follow stats, and the
// follower/following listings.

use inkstream::{config::Config, routes, state::AppState};
use sqlx::postgres::PgPoolOptions;

async fn spawn_app() -> String {
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await
        .expect("Failed to connect to Postgres for testing.");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    let config = Config {
        database_url: database_url.clone(),
        jwt_secret: "social_test_secret".to_string(),
        jwt_expiration: 600,
        rust_log: "error".to_string(),
    };

    let state = AppState { pool, config };
    let app = routes::create_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    address
}

/// Register a fresh user and return (username, token).
async fn register_and_login(client: &reqwest::Client, address: &str, prefix: &str) -> (String, String) {
    let username = format!("{}_{}", prefix, &uuid::Uuid::new_v4().to_string()[..8]);
    let password = "password123";

    client
        .post(format!("{}/api/auth/register", address))
        .json(&serde_json::json!({
            "username": username,
            "email": format!("{}@example.com", username),
            "password": password
        }))
        .send()
        .await
        .expect("Register failed");

    let login: serde_json::Value = client
        .post(format!("{}/api/auth/login", address))
        .json(&serde_json::json!({"username": username, "password": password}))
        .send()
        .await
        .expect("Login failed")
        .json()
        .await
        .unwrap();

    let token = login["token"].as_str().expect("Token not found").to_string();
    (username, token)
}

#[tokio::test]
async fn follow_unfollow_round_trip() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let (alice, _token_a) = register_and_login(&client, &address, "alice").await;
    let (_bob, token_b) = register_and_login(&client, &address, "bob").await;

    // Bob follows Alice.
    let follow = client
        .post(format!("{}/api/users/{}/follow", address, alice))
        .header("Authorization", format!("Bearer {}", token_b))
        .send()
        .await
        .unwrap();
    assert_eq!(follow.status().as_u16(), 200);

    let profile: serde_json::Value = client
        .get(format!("{}/api/users/{}", address, alice))
        .header("Authorization", format!("Bearer {}", token_b))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(profile["is_following"], true);
    assert_eq!(profile["stats"]["followers_count"], 1);

    // Unfollow reverts both.
    let unfollow = client
        .delete(format!("{}/api/users/{}/follow", address, alice))
        .header("Authorization", format!("Bearer {}", token_b))
        .send()
        .await
        .unwrap();
    assert_eq!(unfollow.status().as_u16(), 200);

    let profile: serde_json::Value = client
        .get(format!("{}/api/users/{}", address, alice))
        .header("Authorization", format!("Bearer {}", token_b))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(profile["is_following"], false);
    assert_eq!(profile["stats"]["followers_count"], 0);
}

#[tokio::test]
async fn self_follow_is_rejected() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let (alice, token_a) = register_and_login(&client, &address, "alice").await;

    let response = client
        .post(format!("{}/api/users/{}/follow", address, alice))
        .header("Authorization", format!("Bearer {}", token_a))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn duplicate_follow_conflicts() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let (alice, _token_a) = register_and_login(&client, &address, "alice").await;
    let (_bob, token_b) = register_and_login(&client, &address, "bob").await;

    let first = client
        .post(format!("{}/api/users/{}/follow", address, alice))
        .header("Authorization", format!("Bearer {}", token_b))
        .send()
        .await
        .unwrap();
    assert_eq!(first.status().as_u16(), 200);

    let second = client
        .post(format!("{}/api/users/{}/follow", address, alice))
        .header("Authorization", format!("Bearer {}", token_b))
        .send()
        .await
        .unwrap();
    assert_eq!(second.status().as_u16(), 409);
}

#[tokio::test]
async fn unfollow_missing_relationship_is_idempotent() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let (alice, _token_a) = register_and_login(&client, &address, "alice").await;
    let (_bob, token_b) = register_and_login(&client, &address, "bob").await;

    // Never followed; unfollow still succeeds.
    let response = client
        .delete(format!("{}/api/users/{}/follow", address, alice))
        .header("Authorization", format!("Bearer {}", token_b))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn follow_requires_auth_and_known_user() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let (alice, _token_a) = register_and_login(&client, &address, "alice").await;
    let (_bob, token_b) = register_and_login(&client, &address, "bob").await;

    // No token: rejected in middleware.
    let unauthorized = client
        .post(format!("{}/api/users/{}/follow", address, alice))
        .send()
        .await
        .unwrap();
    assert_eq!(unauthorized.status().as_u16(), 401);

    // Unknown target username.
    let not_found = client
        .post(format!("{}/api/users/no_such_user_xyz/follow", address))
        .header("Authorization", format!("Bearer {}", token_b))
        .send()
        .await
        .unwrap();
    assert_eq!(not_found.status().as_u16(), 404);
}

#[tokio::test]
async fn follower_listings_expose_public_fields_only() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let (alice, token_a) = register_and_login(&client, &address, "alice").await;
    let (bob, token_b) = register_and_login(&client, &address, "bob").await;
    let (carol, token_c) = register_and_login(&client, &address, "carol").await;

    for token in [&token_b, &token_c] {
        client
            .post(format!("{}/api/users/{}/follow", address, alice))
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await
            .unwrap();
    }
    client
        .post(format!("{}/api/users/{}/follow", address, bob))
        .header("Authorization", format!("Bearer {}", token_a))
        .send()
        .await
        .unwrap();

    let followers: Vec<serde_json::Value> = client
        .get(format!("{}/api/users/{}/followers", address, alice))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(followers.len(), 2);
    // Newest relationship first.
    assert_eq!(followers[0]["username"], carol.as_str());
    assert_eq!(followers[1]["username"], bob.as_str());
    // Public-safe projection only.
    assert!(followers[0].get("email").is_none());
    assert!(followers[0].get("password").is_none());

    let following: Vec<serde_json::Value> = client
        .get(format!("{}/api/users/{}/following", address, alice))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(following.len(), 1);
    assert_eq!(following[0]["username"], bob.as_str());

    let profile: serde_json::Value = client
        .get(format!("{}/api/users/{}", address, alice))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(profile["stats"]["followers_count"], 2);
    assert_eq!(profile["stats"]["following_count"], 1);
    // Anonymous viewer: is_following is false by convention.
    assert_eq!(profile["is_following"], false);
}
