use crate::AppState;
use crate::api::extractors::{PathParam, ValidatedJson, ValidatedQuery};
use crate::api::models::pagination::PaginatedResponse;
use crate::api::models::todos::{ListTodosQuery, TodoCreate, TodoResponse, TodoUpdate, TodoWithUserResponse};
use crate::api::models::users::UserResponse;
use crate::errors::{Error, ErrorBody, Result};
use crate::services::TodoService;
use crate::types::TodoId;
use axum::{Json, extract::State, http::StatusCode};

#[utoipa::path(
    post,
    path = "/todos/",
    tag = "todos",
    summary = "Create todo",
    request_body = TodoCreate,
    responses(
        (status = 201, description = "Todo created", body = TodoResponse),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 404, description = "User not found", body = ErrorBody),
        (status = 422, description = "Invalid request body", body = ErrorBody),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_todo(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<TodoCreate>,
) -> Result<(StatusCode, Json<TodoResponse>)> {
    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let todo = TodoService::new(&mut tx).create(input).await?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok((StatusCode::CREATED, Json(TodoResponse::from(todo))))
}

#[utoipa::path(
    get,
    path = "/todos/",
    tag = "todos",
    summary = "List todos",
    params(ListTodosQuery),
    responses(
        (status = 200, description = "One page of todos", body = PaginatedResponse<TodoResponse>),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 422, description = "Invalid pagination, filter or sort parameter", body = ErrorBody),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_todos(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<ListTodosQuery>,
) -> Result<Json<PaginatedResponse<TodoResponse>>> {
    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let page = TodoService::new(&mut tx).list(&query, false).await?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    let items = page.items.into_iter().map(|item| TodoResponse::from(item.todo)).collect();
    Ok(Json(PaginatedResponse::new(items, page.total, query.pagination)))
}

#[utoipa::path(
    get,
    path = "/todos/with-users",
    tag = "todos",
    summary = "List todos with their owners",
    description = "Same parameters as listing todos; each item embeds its owning user, or null.",
    params(ListTodosQuery),
    responses(
        (status = 200, description = "One page of todos with owners", body = PaginatedResponse<TodoWithUserResponse>),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 422, description = "Invalid pagination, filter or sort parameter", body = ErrorBody),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_todos_with_users(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<ListTodosQuery>,
) -> Result<Json<PaginatedResponse<TodoWithUserResponse>>> {
    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let page = TodoService::new(&mut tx).list(&query, true).await?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    let items = page
        .items
        .into_iter()
        .map(|item| TodoWithUserResponse {
            todo: TodoResponse::from(item.todo),
            user: item.owner.map(UserResponse::from),
        })
        .collect();
    Ok(Json(PaginatedResponse::new(items, page.total, query.pagination)))
}

#[utoipa::path(
    get,
    path = "/todos/{id}",
    tag = "todos",
    summary = "Get todo",
    params(("id" = i64, Path, description = "Todo ID")),
    responses(
        (status = 200, description = "Todo found", body = TodoResponse),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 404, description = "Todo not found", body = ErrorBody),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_todo(State(state): State<AppState>, PathParam(id): PathParam<TodoId>) -> Result<Json<TodoResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let todo = TodoService::new(&mut conn).get(id).await?;

    Ok(Json(TodoResponse::from(todo)))
}

#[utoipa::path(
    patch,
    path = "/todos/{id}",
    tag = "todos",
    summary = "Update todo",
    description = "Only the supplied fields change. An explicit null clears description or user_id.",
    params(("id" = i64, Path, description = "Todo ID")),
    request_body = TodoUpdate,
    responses(
        (status = 200, description = "Todo updated", body = TodoResponse),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 404, description = "Todo or new owner not found", body = ErrorBody),
        (status = 422, description = "Invalid request body", body = ErrorBody),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_todo(
    State(state): State<AppState>,
    PathParam(id): PathParam<TodoId>,
    ValidatedJson(input): ValidatedJson<TodoUpdate>,
) -> Result<Json<TodoResponse>> {
    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let todo = TodoService::new(&mut tx).update(id, input).await?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(Json(TodoResponse::from(todo)))
}

#[utoipa::path(
    delete,
    path = "/todos/{id}",
    tag = "todos",
    summary = "Delete todo",
    params(("id" = i64, Path, description = "Todo ID")),
    responses(
        (status = 204, description = "Todo deleted"),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 404, description = "Todo not found", body = ErrorBody),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_todo(State(state): State<AppState>, PathParam(id): PathParam<TodoId>) -> Result<StatusCode> {
    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    TodoService::new(&mut tx).delete(id).await?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use crate::api::models::pagination::PaginatedResponse;
    use crate::api::models::todos::{TodoResponse, TodoWithUserResponse};
    use crate::test_utils::{add_auth_headers, create_test_app, create_test_todo, create_test_user};
    use axum::http::StatusCode;
    use serde_json::{Value, json};
    use sqlx::SqlitePool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_todo_with_and_without_owner(pool: SqlitePool) {
        let app = create_test_app(pool.clone()).await;
        let alice = create_test_user(&pool, "alice").await;

        let (name, value) = add_auth_headers();
        let response = app
            .post("/todos/")
            .add_header(name, value)
            .json(&json!({"title": "Buy milk", "description": "semi-skimmed", "user_id": alice.id}))
            .await;
        response.assert_status(StatusCode::CREATED);
        let todo: TodoResponse = response.json();
        assert_eq!(todo.title, "Buy milk");
        assert_eq!(todo.description.as_deref(), Some("semi-skimmed"));
        assert!(!todo.completed);
        assert_eq!(todo.user_id, Some(alice.id));

        let (name, value) = add_auth_headers();
        let response = app
            .post("/todos")
            .add_header(name, value)
            .json(&json!({"title": "Loose end", "completed": true}))
            .await;
        response.assert_status(StatusCode::CREATED);
        let todo: TodoResponse = response.json();
        assert_eq!(todo.user_id, None);
        assert!(todo.completed);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_todo_for_missing_user(pool: SqlitePool) {
        let app = create_test_app(pool.clone()).await;

        let (name, value) = add_auth_headers();
        let response = app
            .post("/todos/")
            .add_header(name, value)
            .json(&json!({"title": "Orphan", "user_id": 12345}))
            .await;
        response.assert_status_not_found();
        let body: Value = response.json();
        assert_eq!(body["detail"], "User not found");

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM todos").fetch_one(&pool).await.unwrap();
        assert_eq!(count, 0);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_get_todo_and_missing(pool: SqlitePool) {
        let app = create_test_app(pool.clone()).await;
        let created = create_test_todo(&pool, "Water plants", None).await;

        let (name, value) = add_auth_headers();
        let todo: TodoResponse = app.get(&format!("/todos/{}", created.id)).add_header(name, value).await.json();
        assert_eq!(todo.id, created.id);
        assert_eq!(todo.title, "Water plants");

        let (name, value) = add_auth_headers();
        let response = app.get("/todos/999").add_header(name, value).await;
        response.assert_status_not_found();
        let body: Value = response.json();
        assert_eq!(body["detail"], "Todo not found");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_todos_filters(pool: SqlitePool) {
        let app = create_test_app(pool.clone()).await;
        let alice = create_test_user(&pool, "alice").await;
        let bob = create_test_user(&pool, "bob").await;
        create_test_todo(&pool, "a", Some(alice.id)).await;
        create_test_todo(&pool, "b", Some(alice.id)).await;
        create_test_todo(&pool, "c", Some(bob.id)).await;
        create_test_todo(&pool, "d", None).await;
        sqlx::query("UPDATE todos SET completed = 1 WHERE title IN ('b', 'c')")
            .execute(&pool)
            .await
            .unwrap();

        let (name, value) = add_auth_headers();
        let page: PaginatedResponse<TodoResponse> = app
            .get(&format!("/todos/?user_id={}&completed=true", alice.id))
            .add_header(name, value)
            .await
            .json();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].title, "b");

        let (name, value) = add_auth_headers();
        let page: PaginatedResponse<TodoResponse> = app
            .get("/todos/?sort_by=title&sort_order=desc&page_size=2")
            .add_header(name, value)
            .await
            .json();
        assert_eq!(page.total, 4);
        let titles: Vec<_> = page.items.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["d", "c"]);

        let (name, value) = add_auth_headers();
        let page: PaginatedResponse<TodoResponse> = app
            .get("/todos/?completed=false")
            .add_header(name, value)
            .await
            .json();
        assert_eq!(page.total, 2);
        assert!(page.items.iter().all(|t| !t.completed));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_todos_sorted_by_completed_groups_ties(pool: SqlitePool) {
        let app = create_test_app(pool.clone()).await;
        for title in ["one", "two", "three"] {
            create_test_todo(&pool, title, None).await;
        }
        sqlx::query("UPDATE todos SET completed = 1 WHERE title = 'two'")
            .execute(&pool)
            .await
            .unwrap();

        let (name, value) = add_auth_headers();
        let page: PaginatedResponse<TodoResponse> = app
            .get("/todos/?sort_by=completed&sort_order=desc")
            .add_header(name, value)
            .await
            .json();

        // Rows tied on the sort key may come back in any order; only the grouping is fixed.
        assert_eq!(page.items[0].title, "two");
        let mut rest: Vec<_> = page.items[1..].iter().map(|t| t.title.as_str()).collect();
        rest.sort();
        assert_eq!(rest, vec!["one", "three"]);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_todos_with_users(pool: SqlitePool) {
        let app = create_test_app(pool.clone()).await;
        let alice = create_test_user(&pool, "alice").await;
        let owned = create_test_todo(&pool, "owned", Some(alice.id)).await;
        let unowned = create_test_todo(&pool, "unowned", None).await;

        let (name, value) = add_auth_headers();
        let response = app.get("/todos/with-users").add_header(name, value).await;
        response.assert_status_ok();

        let raw: Value = response.json();
        assert!(raw["items"][1].as_object().unwrap().contains_key("user"));
        assert!(raw["items"][1]["user"].is_null());

        let page: PaginatedResponse<TodoWithUserResponse> = response.json();
        assert_eq!(page.total, 2);
        let first = page.items.iter().find(|t| t.todo.id == owned.id).unwrap();
        let owner = first.user.as_ref().unwrap();
        assert_eq!(owner.id, alice.id);
        assert_eq!(owner.username, "alice");
        let second = page.items.iter().find(|t| t.todo.id == unowned.id).unwrap();
        assert!(second.user.is_none());

        let (name, value) = add_auth_headers();
        app.get("/todos/with-users?page_size=101")
            .add_header(name, value)
            .await
            .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_todo(pool: SqlitePool) {
        let app = create_test_app(pool.clone()).await;
        let alice = create_test_user(&pool, "alice").await;
        let todo = create_test_todo(&pool, "Draft", Some(alice.id)).await;

        let (name, value) = add_auth_headers();
        let updated: TodoResponse = app
            .patch(&format!("/todos/{}", todo.id))
            .add_header(name, value)
            .json(&json!({"completed": true}))
            .await
            .json();
        assert!(updated.completed);
        assert_eq!(updated.title, "Draft");
        assert_eq!(updated.user_id, Some(alice.id));

        let (name, value) = add_auth_headers();
        let unassigned: TodoResponse = app
            .patch(&format!("/todos/{}", todo.id))
            .add_header(name, value)
            .json(&json!({"user_id": null}))
            .await
            .json();
        assert_eq!(unassigned.user_id, None);
        assert!(unassigned.completed);

        let (name, value) = add_auth_headers();
        let response = app
            .patch(&format!("/todos/{}", todo.id))
            .add_header(name, value)
            .json(&json!({"user_id": 777}))
            .await;
        response.assert_status_not_found();
        let body: Value = response.json();
        assert_eq!(body["detail"], "User not found");

        let (name, value) = add_auth_headers();
        app.patch("/todos/999")
            .add_header(name, value)
            .json(&json!({"title": "Nope"}))
            .await
            .assert_status_not_found();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_delete_todo(pool: SqlitePool) {
        let app = create_test_app(pool.clone()).await;
        let todo = create_test_todo(&pool, "Temporary", None).await;

        let (name, value) = add_auth_headers();
        app.delete(&format!("/todos/{}", todo.id))
            .add_header(name, value)
            .await
            .assert_status(StatusCode::NO_CONTENT);

        let (name, value) = add_auth_headers();
        app.delete(&format!("/todos/{}", todo.id))
            .add_header(name, value)
            .await
            .assert_status_not_found();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_todos_require_bearer_token(pool: SqlitePool) {
        let app = create_test_app(pool.clone()).await;

        app.get("/todos/").await.assert_status_unauthorized();
        app.get("/todos/with-users").await.assert_status_unauthorized();
        app.delete("/todos/1")
            .add_header("authorization", "Bearer nope")
            .await
            .assert_status_unauthorized();
    }
}
