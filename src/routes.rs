// src/routes.rs

use std::sync::Arc;

use axum::{
    Router, http::Method, middleware,
    routing::{get, patch, post, put},
};
use tower_governor::{GovernorLayer, governor::GovernorConfigBuilder};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{auth, category, question, quiz, suggestion, user},
    state::AppState,
    utils::jwt::{auth_middleware, staff_middleware},
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, users, quizzes, questions, categories,
///   suggestions).
/// * Applies global middleware (Trace, CORS) and rate limiting on the
///   credential endpoints.
/// * Injects global state (Database Pool + Config).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        "http://localhost:3000".parse().unwrap(),
        "http://127.0.0.1:3000".parse().unwrap(),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    // Credential endpoints are the brute-force target, so only they get
    // the rate limiter.
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(5)
            .burst_size(30)
            .finish()
            .unwrap(),
    );

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .layer(GovernorLayer::new(governor_conf))
        .merge(
            Router::new()
                .route("/me", get(auth::me))
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    auth_middleware,
                )),
        );

    let user_routes = Router::new()
        .route("/leaderboard", get(user::global_leaderboard))
        .merge(
            Router::new()
                .route("/me/stats", get(user::my_stats))
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    auth_middleware,
                )),
        )
        // Staff-only user administration.
        // Double middleware protection: Auth first, then role check.
        .merge(
            Router::new()
                .route("/", get(user::list_users).post(user::create_user))
                .route(
                    "/{username}",
                    get(user::get_user)
                        .put(user::update_user)
                        .delete(user::delete_user),
                )
                .layer(middleware::from_fn(staff_middleware))
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    auth_middleware,
                )),
        );

    let quiz_routes = Router::new()
        .route("/", get(quiz::list_quizzes))
        .route("/difficulties", get(quiz::list_difficulties))
        .route("/{id}", get(quiz::get_quiz))
        .route("/{id}/questions", get(quiz::list_quiz_questions))
        // Protected quiz routes
        .merge(
            Router::new()
                .route("/", post(quiz::create_quiz))
                .route("/{id}", put(quiz::update_quiz).delete(quiz::delete_quiz))
                .route("/{id}/submit", post(quiz::submit_quiz))
                .route("/{id}/leaderboard", get(quiz::quiz_leaderboard))
                .route("/{id}/like", post(quiz::toggle_like))
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    auth_middleware,
                )),
        );

    let question_routes = Router::new()
        .route(
            "/{id}",
            put(question::update_question).delete(question::delete_question),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let category_routes = Router::new()
        .route("/", get(category::list_categories))
        .merge(
            Router::new()
                .route("/", post(category::create_category))
                .route(
                    "/{id}",
                    put(category::update_category).delete(category::delete_category),
                )
                .layer(middleware::from_fn(staff_middleware))
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    auth_middleware,
                )),
        );

    let suggestion_routes = Router::new()
        .route("/", post(suggestion::create_suggestion))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .merge(
            Router::new()
                .route("/", get(suggestion::list_suggestions))
                .route("/{id}/status", patch(suggestion::update_suggestion_status))
                .layer(middleware::from_fn(staff_middleware))
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    auth_middleware,
                )),
        );

    let api = Router::new()
        .nest("/auth", auth_routes)
        .nest("/users", user_routes)
        .nest("/quizzes", quiz_routes)
        .nest("/questions", question_routes)
        .nest("/categories", category_routes)
        .nest("/suggestions", suggestion_routes);

    Router::new()
        .nest(&state.config.api_prefix, api)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
