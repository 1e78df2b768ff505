//! Test utilities for integration testing
use crate::db::handlers::{Repository, Todos, Users};
use crate::db::models::{
    todos::{TodoCreateDBRequest, TodoDBResponse},
    users::{UserCreateDBRequest, UserDBResponse},
};
use crate::types::UserId;
use axum_test::TestServer;
use sqlx::SqlitePool;

/// The only token accepted by [`create_test_app`].
pub const TEST_TOKEN: &str = "test-token";

pub async fn create_test_app(pool: SqlitePool) -> TestServer {
    create_test_app_with_config(pool, create_test_config()).await
}

pub async fn create_test_app_with_config(pool: SqlitePool, config: crate::config::Config) -> TestServer {
    crate::Application::new_with_pool(config, Some(pool))
        .await
        .expect("Failed to create application")
        .into_test_server()
}

pub fn create_test_config() -> crate::config::Config {
    crate::config::Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        auth: crate::config::AuthConfig {
            tokens: vec![TEST_TOKEN.to_string()],
        },
        ..Default::default()
    }
}

/// Header pair carrying [`TEST_TOKEN`].
pub fn add_auth_headers() -> (String, String) {
    ("authorization".to_string(), format!("Bearer {TEST_TOKEN}"))
}

pub async fn create_test_user(pool: &SqlitePool, username: &str) -> UserDBResponse {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    let mut users_repo = Users::new(&mut conn);

    let user_create = UserCreateDBRequest {
        username: username.to_string(),
        email: format!("{username}@example.com"),
        full_name: None,
        is_active: true,
    };

    users_repo.create(&user_create).await.expect("Failed to create test user")
}

pub async fn create_test_todo(pool: &SqlitePool, title: &str, user_id: Option<UserId>) -> TodoDBResponse {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    let mut todos_repo = Todos::new(&mut conn);

    let todo_create = TodoCreateDBRequest {
        title: title.to_string(),
        description: None,
        completed: false,
        user_id,
    };

    todos_repo.create(&todo_create).await.expect("Failed to create test todo")
}
