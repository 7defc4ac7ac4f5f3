// src/routes.rs

use axum::{
    Router, http::Method, middleware,
    routing::{get, post, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{auth, engagement, feed, posts, profile, social, tags, users},
    state::AppState,
    utils::jwt::{auth_middleware, optional_auth_middleware},
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, users, profile, feed, posts, tags).
/// * Protected routes reject missing/invalid tokens in middleware, before
///   any handler or data lookup runs.
/// * Applies global middleware (Trace, CORS) and injects the AppState.
pub fn create_router(state: AppState) -> Router {
    let origins = [
        "http://localhost:3000".parse().unwrap(),
        "http://127.0.0.1:3000".parse().unwrap(),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));

    // Public user pages; the profile view picks up a viewer when a valid
    // token happens to be present.
    let user_routes = Router::new()
        .route("/{username}", get(users::get_profile))
        .route("/{username}/posts", get(users::list_user_posts))
        .route("/{username}/followers", get(social::list_followers))
        .route("/{username}/following", get(social::list_following))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            optional_auth_middleware,
        ))
        .merge(
            Router::new()
                .route(
                    "/{username}/follow",
                    post(social::follow_user).delete(social::unfollow_user),
                )
                .layer(middleware::from_fn_with_state(state.clone(), auth_middleware)),
        );

    let profile_routes = Router::new()
        .route("/", get(profile::get_me).put(profile::update_profile))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let feed_routes = Router::new()
        .route("/", get(feed::get_feed))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let post_routes = Router::new()
        .route("/", get(posts::list_posts))
        .route("/{id}", get(posts::get_post))
        .route("/{id}/comments", get(engagement::list_comments))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            optional_auth_middleware,
        ))
        .merge(
            Router::new()
                .route("/", post(posts::create_post))
                .route("/{id}", put(posts::update_post).delete(posts::delete_post))
                .route("/{id}/like", post(engagement::toggle_like))
                .route("/{id}/bookmark", post(engagement::toggle_bookmark))
                .route("/{id}/comments", post(engagement::create_comment))
                .layer(middleware::from_fn_with_state(state.clone(), auth_middleware)),
        );

    let comment_routes = Router::new()
        .route("/{id}/like", post(engagement::toggle_comment_like))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let tag_routes = Router::new().route("/", get(tags::list_tags)).merge(
        Router::new()
            .route("/", post(tags::create_tag))
            .layer(middleware::from_fn_with_state(state.clone(), auth_middleware)),
    );

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/users", user_routes)
        .nest("/api/profile", profile_routes)
        .nest("/api/feed", feed_routes)
        .nest("/api/posts", post_routes)
        .nest("/api/comments", comment_routes)
        .nest("/api/tags", tag_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
