// tests/feed_tests.rs
//
// Feed assembly and engagement: followed-author visibility, publication
// gating, like/bookmark round trips, and comments.

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
        jwt_secret: "feed_test_secret".to_string(),
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

async fn feed(client: &reqwest::Client, address: &str, token: &str) -> Vec<serde_json::Value> {
    client
        .get(format!("{}/api/feed", address))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

#[tokio::test]
async fn feed_requires_auth() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client.get(format!("{}/api/feed", address)).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn feed_shows_published_posts_from_followed_authors_only() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let (alice, token_a) = register_and_login(&client, &address, "alice").await;
    let (_bob, token_b) = register_and_login(&client, &address, "bob").await;
    let (_carol, token_c) = register_and_login(&client, &address, "carol").await;

    // An empty follow set is an empty page, not an error.
    assert!(feed(&client, &address, &token_b).await.is_empty());

    // Bob follows Alice; Alice has only a draft so far.
    client
        .post(format!("{}/api/users/{}/follow", address, alice))
        .header("Authorization", format!("Bearer {}", token_b))
        .send()
        .await
        .unwrap();

    client
        .post(format!("{}/api/posts", address))
        .header("Authorization", format!("Bearer {}", token_a))
        .json(&serde_json::json!({"title": "Alice Draft", "content": "wip", "published": false}))
        .send()
        .await
        .unwrap();

    assert!(feed(&client, &address, &token_b).await.is_empty());

    // Alice publishes: the post appears on Bob's next fetch.
    let published: serde_json::Value = client
        .post(format!("{}/api/posts", address))
        .header("Authorization", format!("Bearer {}", token_a))
        .json(&serde_json::json!({"title": "Alice Ships", "content": "done", "published": true}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let bob_feed = feed(&client, &address, &token_b).await;
    assert_eq!(bob_feed.len(), 1);
    assert_eq!(bob_feed[0]["id"], published["id"]);
    assert_eq!(bob_feed[0]["author"]["username"], alice.as_str());

    // Carol follows nobody: still empty.
    assert!(feed(&client, &address, &token_c).await.is_empty());

    // Unfollowing removes the author's posts from the next page.
    client
        .delete(format!("{}/api/users/{}/follow", address, alice))
        .header("Authorization", format!("Bearer {}", token_b))
        .send()
        .await
        .unwrap();
    assert!(feed(&client, &address, &token_b).await.is_empty());
}

#[tokio::test]
async fn feed_pagination_is_clamped_and_ordered() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let (alice, token_a) = register_and_login(&client, &address, "alice").await;
    let (_bob, token_b) = register_and_login(&client, &address, "bob").await;

    client
        .post(format!("{}/api/users/{}/follow", address, alice))
        .header("Authorization", format!("Bearer {}", token_b))
        .send()
        .await
        .unwrap();

    for i in 1..=3 {
        client
            .post(format!("{}/api/posts", address))
            .header("Authorization", format!("Bearer {}", token_a))
            .json(&serde_json::json!({"title": format!("Feed Post {}", i), "content": "c", "published": true}))
            .send()
            .await
            .unwrap();
    }

    // Hostile limit and page values are clamped, not honored.
    let page: Vec<serde_json::Value> = client
        .get(format!("{}/api/feed?page=-5&limit=1000000", address))
        .header("Authorization", format!("Bearer {}", token_b))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(page.len(), 3);

    // Newest publication first.
    assert_eq!(page[0]["title"], "Feed Post 3");
    assert_eq!(page[2]["title"], "Feed Post 1");

    // Page size 2: second page holds the remaining post.
    let second: Vec<serde_json::Value> = client
        .get(format!("{}/api/feed?page=2&limit=2", address))
        .header("Authorization", format!("Bearer {}", token_b))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(second.len(), 1);
    assert_eq!(second[0]["title"], "Feed Post 1");
}

#[tokio::test]
async fn like_toggle_round_trip() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let (_alice, token_a) = register_and_login(&client, &address, "alice").await;
    let (_bob, token_b) = register_and_login(&client, &address, "bob").await;

    let post: serde_json::Value = client
        .post(format!("{}/api/posts", address))
        .header("Authorization", format!("Bearer {}", token_a))
        .json(&serde_json::json!({"title": "Likeable", "content": "c", "published": true}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let post_id = post["id"].as_i64().unwrap();

    let like_url = format!("{}/api/posts/{}/like", address, post_id);

    let first: serde_json::Value = client
        .post(&like_url)
        .header("Authorization", format!("Bearer {}", token_b))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(first["is_liked"], true);
    assert_eq!(first["count"], 1);

    let second: serde_json::Value = client
        .post(&like_url)
        .header("Authorization", format!("Bearer {}", token_b))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(second["is_liked"], false);
    assert_eq!(second["count"], 0);

    // Unknown post: 404.
    let missing = client
        .post(format!("{}/api/posts/999999999/like", address))
        .header("Authorization", format!("Bearer {}", token_b))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status().as_u16(), 404);
}

#[tokio::test]
async fn bookmark_toggle_round_trip() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let (_alice, token_a) = register_and_login(&client, &address, "alice").await;

    let post: serde_json::Value = client
        .post(format!("{}/api/posts", address))
        .header("Authorization", format!("Bearer {}", token_a))
        .json(&serde_json::json!({"title": "Bookmarkable", "content": "c", "published": true}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let url = format!("{}/api/posts/{}/bookmark", address, post["id"].as_i64().unwrap());

    let first: serde_json::Value = client
        .post(&url)
        .header("Authorization", format!("Bearer {}", token_a))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(first["is_bookmarked"], true);
    assert_eq!(first["count"], 1);

    let second: serde_json::Value = client
        .post(&url)
        .header("Authorization", format!("Bearer {}", token_a))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(second["is_bookmarked"], false);
    assert_eq!(second["count"], 0);
}

#[tokio::test]
async fn comment_flow() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let (_alice, token_a) = register_and_login(&client, &address, "alice").await;
    let (bob, token_b) = register_and_login(&client, &address, "bob").await;

    let post: serde_json::Value = client
        .post(format!("{}/api/posts", address))
        .header("Authorization", format!("Bearer {}", token_a))
        .json(&serde_json::json!({"title": "Discussable", "content": "c", "published": true}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let post_id = post["id"].as_i64().unwrap();
    let comments_url = format!("{}/api/posts/{}/comments", address, post_id);

    // Empty content: 400.
    let empty = client
        .post(&comments_url)
        .header("Authorization", format!("Bearer {}", token_b))
        .json(&serde_json::json!({"content": "   "}))
        .send()
        .await
        .unwrap();
    assert_eq!(empty.status().as_u16(), 400);

    let comment: serde_json::Value = client
        .post(&comments_url)
        .header("Authorization", format!("Bearer {}", token_b))
        .json(&serde_json::json!({"content": "Great read"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(comment["content"], "Great read");
    assert_eq!(comment["author"]["username"], bob.as_str());
    assert_eq!(comment["likes_count"], 0);
    assert_eq!(comment["is_liked"], false);

    // Comments may themselves be liked.
    let comment_id = comment["id"].as_i64().unwrap();
    let liked: serde_json::Value = client
        .post(format!("{}/api/comments/{}/like", address, comment_id))
        .header("Authorization", format!("Bearer {}", token_a))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(liked["is_liked"], true);
    assert_eq!(liked["count"], 1);

    // Listing reflects the like for its owner and the comment count on the post.
    let listing: Vec<serde_json::Value> = client
        .get(&comments_url)
        .header("Authorization", format!("Bearer {}", token_a))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listing.len(), 1);
    assert_eq!(listing[0]["likes_count"], 1);
    assert_eq!(listing[0]["is_liked"], true);

    let post_view: serde_json::Value = client
        .get(format!("{}/api/posts/{}", address, post_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(post_view["comments_count"], 1);
}
