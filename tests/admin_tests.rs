// tests/admin_tests.rs
//
// Staff surfaces: user administration, categories and suggestion review.

use quizify_backend::{config::Config, routes, state::AppState};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;

async fn spawn_app() -> (String, SqlitePool) {
    let db_path = std::env::temp_dir().join(format!("quizify_test_{}.sqlite3", uuid::Uuid::new_v4()));
    let database_url = format!("sqlite://{}", db_path.display());

    let connect_options = SqliteConnectOptions::from_str(&database_url)
        .expect("Invalid test database URL")
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(connect_options)
        .await
        .expect("Failed to open test database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    let config = Config {
        database_url: database_url.clone(),
        jwt_secret: "admin_test_secret".to_string(),
        jwt_expiration: 600,
        rust_log: "error".to_string(),
        port: 0,
        api_prefix: "/api".to_string(),
        admin_username: None,
        admin_password: None,
    };

    let state = AppState {
        pool: pool.clone(),
        config,
    };

    let app = routes::create_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
        )
        .await
        .unwrap();
    });

    (address, pool)
}

fn unique_name(prefix: &str) -> String {
    format!("{}_{}", prefix, &uuid::Uuid::new_v4().to_string()[..8])
}

async fn register_and_login(client: &reqwest::Client, address: &str, username: &str) -> String {
    let response = client
        .post(format!("{}/api/auth/register", address))
        .json(&serde_json::json!({
            "username": username,
            "password": "password123"
        }))
        .send()
        .await
        .expect("Register failed");
    assert_eq!(response.status().as_u16(), 201);

    login(client, address, username).await
}

async fn login(client: &reqwest::Client, address: &str, username: &str) -> String {
    let body = client
        .post(format!("{}/api/auth/login", address))
        .json(&serde_json::json!({
            "username": username,
            "password": "password123"
        }))
        .send()
        .await
        .expect("Login failed")
        .json::<serde_json::Value>()
        .await
        .unwrap();

    body["token"].as_str().expect("Token not found").to_string()
}

/// Registers a user, promotes it to the given role, and logs in again so
/// the returned token carries the promoted role.
async fn staff_token(
    client: &reqwest::Client,
    address: &str,
    pool: &SqlitePool,
    role_id: i64,
) -> String {
    let username = unique_name("staff");
    register_and_login(client, address, &username).await;

    sqlx::query("UPDATE users SET role_id = ? WHERE username = ?")
        .bind(role_id)
        .bind(&username)
        .execute(pool)
        .await
        .unwrap();

    login(client, address, &username).await
}

#[tokio::test]
async fn test_staff_surfaces_reject_regular_users() {
    let (address, _pool) = spawn_app().await;
    let client = reqwest::Client::new();

    let token = register_and_login(&client, &address, &unique_name("regular")).await;

    let list_users = client
        .get(format!("{}/api/users", address))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap();
    assert_eq!(list_users.status().as_u16(), 403);

    let create_category = client
        .post(format!("{}/api/categories", address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({ "category_name": "Nope" }))
        .send()
        .await
        .unwrap();
    assert_eq!(create_category.status().as_u16(), 403);

    let list_suggestions = client
        .get(format!("{}/api/suggestions", address))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap();
    assert_eq!(list_suggestions.status().as_u16(), 403);

    // Without any token the same surfaces are 401.
    let anonymous = client
        .get(format!("{}/api/users", address))
        .send()
        .await
        .unwrap();
    assert_eq!(anonymous.status().as_u16(), 401);
}

#[tokio::test]
async fn test_user_administration_flow() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();

    let admin = staff_token(&client, &address, &pool, 1).await;

    // Create a Verified user through the staff endpoint.
    let username = unique_name("managed");
    let created = client
        .post(format!("{}/api/users", address))
        .header("Authorization", format!("Bearer {}", admin))
        .json(&serde_json::json!({
            "username": username,
            "email": format!("{}@quizify.local", username),
            "password": "password123",
            "role_id": 3,
            "verified": false
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(created.status().as_u16(), 201);

    // Unknown role is a 404.
    let bad_role = client
        .post(format!("{}/api/users", address))
        .header("Authorization", format!("Bearer {}", admin))
        .json(&serde_json::json!({
            "username": unique_name("ghost"),
            "password": "password123",
            "role_id": 99
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(bad_role.status().as_u16(), 404);

    // Duplicate username is a 409.
    let duplicate = client
        .post(format!("{}/api/users", address))
        .header("Authorization", format!("Bearer {}", admin))
        .json(&serde_json::json!({
            "username": username,
            "password": "password123",
            "role_id": 4
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(duplicate.status().as_u16(), 409);

    // Fetch by username, joined with the role name.
    let fetched = client
        .get(format!("{}/api/users/{}", address, username))
        .header("Authorization", format!("Bearer {}", admin))
        .send()
        .await
        .unwrap()
        .json::<serde_json::Value>()
        .await
        .unwrap();
    assert_eq!(fetched["role_name"], "Verified user");
    assert_eq!(fetched["verified"], false);

    // Verifying the user writes an audit log entry.
    let updated = client
        .put(format!("{}/api/users/{}", address, username))
        .header("Authorization", format!("Bearer {}", admin))
        .json(&serde_json::json!({ "verified": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(updated.status().as_u16(), 200);

    let log_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM logs WHERE action LIKE '%verified user%'")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(log_count, 1);

    // Update with no fields at all is a 400.
    let empty_update = client
        .put(format!("{}/api/users/{}", address, username))
        .header("Authorization", format!("Bearer {}", admin))
        .json(&serde_json::json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(empty_update.status().as_u16(), 400);

    // Deleting the user works, deleting an administrator does not.
    let deleted = client
        .delete(format!("{}/api/users/{}", address, username))
        .header("Authorization", format!("Bearer {}", admin))
        .send()
        .await
        .unwrap();
    assert_eq!(deleted.status().as_u16(), 200);

    let second_admin = unique_name("admin2");
    register_and_login(&client, &address, &second_admin).await;
    sqlx::query("UPDATE users SET role_id = 1 WHERE username = ?")
        .bind(&second_admin)
        .execute(&pool)
        .await
        .unwrap();

    let admin_delete = client
        .delete(format!("{}/api/users/{}", address, second_admin))
        .header("Authorization", format!("Bearer {}", admin))
        .send()
        .await
        .unwrap();
    assert_eq!(admin_delete.status().as_u16(), 403);
}

#[tokio::test]
async fn test_user_listing_pagination_and_search() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();

    let admin = staff_token(&client, &address, &pool, 1).await;

    let needle = unique_name("needle");
    register_and_login(&client, &address, &needle).await;
    register_and_login(&client, &address, &unique_name("hay")).await;

    let page = client
        .get(format!("{}/api/users?page=1&limit=2", address))
        .header("Authorization", format!("Bearer {}", admin))
        .send()
        .await
        .unwrap()
        .json::<serde_json::Value>()
        .await
        .unwrap();

    assert_eq!(page["data"].as_array().unwrap().len(), 2);
    assert_eq!(page["total"], 3);
    assert_eq!(page["totalPages"], 2);

    let filtered = client
        .get(format!("{}/api/users?search={}", address, needle))
        .header("Authorization", format!("Bearer {}", admin))
        .send()
        .await
        .unwrap()
        .json::<serde_json::Value>()
        .await
        .unwrap();

    let data = filtered["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["username"], needle.as_str());
}

#[tokio::test]
async fn test_category_crud() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();

    // Management has the same powers as Admin here.
    let manager = staff_token(&client, &address, &pool, 2).await;

    // Empty table: 204.
    let empty = client
        .get(format!("{}/api/categories", address))
        .send()
        .await
        .unwrap();
    assert_eq!(empty.status().as_u16(), 204);

    let created = client
        .post(format!("{}/api/categories", address))
        .header("Authorization", format!("Bearer {}", manager))
        .json(&serde_json::json!({ "category_name": "  History  " }))
        .send()
        .await
        .unwrap();
    assert_eq!(created.status().as_u16(), 201);
    let created = created.json::<serde_json::Value>().await.unwrap();
    // Names are stored trimmed.
    assert_eq!(created["category_name"], "History");
    let category_id = created["category_id"].as_i64().unwrap();

    // Case-insensitive duplicate.
    let duplicate = client
        .post(format!("{}/api/categories", address))
        .header("Authorization", format!("Bearer {}", manager))
        .json(&serde_json::json!({ "category_name": "hiSTOry" }))
        .send()
        .await
        .unwrap();
    assert_eq!(duplicate.status().as_u16(), 409);

    let renamed = client
        .put(format!("{}/api/categories/{}", address, category_id))
        .header("Authorization", format!("Bearer {}", manager))
        .json(&serde_json::json!({ "category_name": "Ancient History" }))
        .send()
        .await
        .unwrap();
    assert_eq!(renamed.status().as_u16(), 200);

    let missing = client
        .put(format!("{}/api/categories/424242", address))
        .header("Authorization", format!("Bearer {}", manager))
        .json(&serde_json::json!({ "category_name": "Anything" }))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status().as_u16(), 404);

    // A category referenced by a quiz cannot be deleted.
    let quiz = serde_json::json!({
        "quiz_name": "Pyramids",
        "category_id": category_id,
        "difficulty_id": 1,
        "questions": [{
            "question_text": "Largest pyramid?",
            "question_type": "multiple",
            "answers": [
                { "answer_text": "Giza", "is_correct": true },
                { "answer_text": "Louvre", "is_correct": false }
            ]
        }]
    });
    let quiz_created = client
        .post(format!("{}/api/quizzes", address))
        .header("Authorization", format!("Bearer {}", manager))
        .json(&quiz)
        .send()
        .await
        .unwrap();
    assert_eq!(quiz_created.status().as_u16(), 201);
    let quiz_id = quiz_created.json::<serde_json::Value>().await.unwrap()["quiz_id"]
        .as_i64()
        .unwrap();

    let blocked = client
        .delete(format!("{}/api/categories/{}", address, category_id))
        .header("Authorization", format!("Bearer {}", manager))
        .send()
        .await
        .unwrap();
    assert_eq!(blocked.status().as_u16(), 409);

    // After the quiz goes away the category can be deleted.
    let quiz_deleted = client
        .delete(format!("{}/api/quizzes/{}", address, quiz_id))
        .header("Authorization", format!("Bearer {}", manager))
        .send()
        .await
        .unwrap();
    assert_eq!(quiz_deleted.status().as_u16(), 204);

    let deleted = client
        .delete(format!("{}/api/categories/{}", address, category_id))
        .header("Authorization", format!("Bearer {}", manager))
        .send()
        .await
        .unwrap();
    assert_eq!(deleted.status().as_u16(), 200);
}

#[tokio::test]
async fn test_suggestion_review_flow() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();

    let admin = staff_token(&client, &address, &pool, 1).await;
    let submitter = unique_name("dreamer");
    let submitter_token = register_and_login(&client, &address, &submitter).await;

    // Title and description are both required.
    let incomplete = client
        .post(format!("{}/api/suggestions", address))
        .header("Authorization", format!("Bearer {}", submitter_token))
        .json(&serde_json::json!({ "title": "Space quiz" }))
        .send()
        .await
        .unwrap();
    assert_eq!(incomplete.status().as_u16(), 400);

    let created = client
        .post(format!("{}/api/suggestions", address))
        .header("Authorization", format!("Bearer {}", submitter_token))
        .json(&serde_json::json!({
            "title": "Space quiz",
            "description": "Planets, moons and probes."
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(created.status().as_u16(), 201);
    let suggestion_id = created.json::<serde_json::Value>().await.unwrap()["suggestion_id"]
        .as_i64()
        .unwrap();

    let listed = client
        .get(format!("{}/api/suggestions", address))
        .header("Authorization", format!("Bearer {}", admin))
        .send()
        .await
        .unwrap()
        .json::<Vec<serde_json::Value>>()
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["status"], "pending");
    assert_eq!(listed[0]["username"], submitter.as_str());
    assert!(listed[0]["reviewer_username"].is_null());

    // Approving stamps the reviewer and timestamp.
    let approved = client
        .patch(format!("{}/api/suggestions/{}/status", address, suggestion_id))
        .header("Authorization", format!("Bearer {}", admin))
        .json(&serde_json::json!({ "status": "approved" }))
        .send()
        .await
        .unwrap();
    assert_eq!(approved.status().as_u16(), 200);

    let listed = client
        .get(format!("{}/api/suggestions", address))
        .header("Authorization", format!("Bearer {}", admin))
        .send()
        .await
        .unwrap()
        .json::<Vec<serde_json::Value>>()
        .await
        .unwrap();
    assert_eq!(listed[0]["status"], "approved");
    assert!(!listed[0]["reviewer_username"].is_null());
    assert!(!listed[0]["reviewed_at"].is_null());

    // Resetting to pending clears both reviewer fields.
    let reset = client
        .patch(format!("{}/api/suggestions/{}/status", address, suggestion_id))
        .header("Authorization", format!("Bearer {}", admin))
        .json(&serde_json::json!({ "status": "pending" }))
        .send()
        .await
        .unwrap();
    assert_eq!(reset.status().as_u16(), 200);

    let listed = client
        .get(format!("{}/api/suggestions", address))
        .header("Authorization", format!("Bearer {}", admin))
        .send()
        .await
        .unwrap()
        .json::<Vec<serde_json::Value>>()
        .await
        .unwrap();
    assert_eq!(listed[0]["status"], "pending");
    assert!(listed[0]["reviewer_username"].is_null());
    assert!(listed[0]["reviewed_at"].is_null());

    // Unknown status and unknown id.
    let bogus = client
        .patch(format!("{}/api/suggestions/{}/status", address, suggestion_id))
        .header("Authorization", format!("Bearer {}", admin))
        .json(&serde_json::json!({ "status": "maybe" }))
        .send()
        .await
        .unwrap();
    assert_eq!(bogus.status().as_u16(), 400);

    let missing = client
        .patch(format!("{}/api/suggestions/424242/status", address))
        .header("Authorization", format!("Bearer {}", admin))
        .json(&serde_json::json!({ "status": "approved" }))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status().as_u16(), 404);
}
