//! Database repository for todos.

use std::collections::HashMap;

use crate::api::models::query::SortOrder;
use crate::api::models::todos::{ListTodosQuery, TodoSortField};
use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::todos::{TodoCreateDBRequest, TodoDBResponse, TodoUpdateDBRequest},
};
use crate::types::{TodoId, UserId};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteConnection};
use tracing::instrument;

const TODO_COLUMNS: &str = "id, title, description, completed, user_id";

/// Filter for listing todos
#[derive(Debug, Clone)]
pub struct TodoFilter {
    pub skip: i64,
    pub limit: i64,
    pub completed: Option<bool>,
    pub user_id: Option<UserId>,
    pub sort_by: TodoSortField,
    pub sort_order: SortOrder,
}

impl TodoFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            skip,
            limit,
            completed: None,
            user_id: None,
            sort_by: TodoSortField::default(),
            sort_order: SortOrder::default(),
        }
    }

    pub fn with_completed(mut self, completed: bool) -> Self {
        self.completed = Some(completed);
        self
    }

    pub fn with_user(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn sorted_by(mut self, sort_by: TodoSortField, sort_order: SortOrder) -> Self {
        self.sort_by = sort_by;
        self.sort_order = sort_order;
        self
    }
}

impl From<&ListTodosQuery> for TodoFilter {
    fn from(query: &ListTodosQuery) -> Self {
        let mut filter = Self::new(query.pagination.offset(), query.pagination.limit()).sorted_by(query.sort_by, query.sort_order);
        if let Some(completed) = query.completed {
            filter = filter.with_completed(completed);
        }
        if let Some(user_id) = query.user_id {
            filter = filter.with_user(user_id);
        }
        filter
    }
}

// Database entity model
#[derive(Debug, Clone, FromRow)]
struct Todo {
    pub id: TodoId,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub user_id: Option<UserId>,
}

impl From<Todo> for TodoDBResponse {
    fn from(todo: Todo) -> Self {
        Self {
            id: todo.id,
            title: todo.title,
            description: todo.description,
            completed: todo.completed,
            user_id: todo.user_id,
        }
    }
}

fn sort_column(field: TodoSortField) -> &'static str {
    match field {
        TodoSortField::Id => "id",
        TodoSortField::Title => "title",
        TodoSortField::Completed => "completed",
        TodoSortField::UserId => "user_id",
    }
}

fn push_filters(query: &mut QueryBuilder<'_, Sqlite>, filter: &TodoFilter) {
    if let Some(completed) = filter.completed {
        query.push(" AND completed = ");
        query.push_bind(completed);
    }

    if let Some(user_id) = filter.user_id {
        query.push(" AND user_id = ");
        query.push_bind(user_id);
    }
}

pub struct Todos<'c> {
    db: &'c mut SqliteConnection,
}

impl<'c> Todos<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }

    /// Remove every todo owned by `user_id`, returning how many went.
    #[instrument(skip(self), err)]
    pub async fn delete_by_user(&mut self, user_id: UserId) -> Result<u64> {
        let result = sqlx::query("DELETE FROM todos WHERE user_id = ?")
            .bind(user_id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected())
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Todos<'c> {
    type CreateRequest = TodoCreateDBRequest;
    type UpdateRequest = TodoUpdateDBRequest;
    type Response = TodoDBResponse;
    type Id = TodoId;
    type Filter = TodoFilter;

    #[instrument(skip(self, request), fields(user_id = ?request.user_id), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let todo = sqlx::query_as::<_, Todo>(&format!(
            "INSERT INTO todos (title, description, completed, user_id) VALUES (?, ?, ?, ?) RETURNING {TODO_COLUMNS}"
        ))
        .bind(&request.title)
        .bind(&request.description)
        .bind(request.completed)
        .bind(request.user_id)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(TodoDBResponse::from(todo))
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let todo = sqlx::query_as::<_, Todo>(&format!("SELECT {TODO_COLUMNS} FROM todos WHERE id = ?"))
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(todo.map(TodoDBResponse::from))
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    async fn get_bulk(&mut self, ids: Vec<TodoId>) -> Result<HashMap<TodoId, TodoDBResponse>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(format!("SELECT {TODO_COLUMNS} FROM todos WHERE id IN ("));
        let mut separated = query.separated(", ");
        for id in &ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");

        let todos = query.build_query_as::<Todo>().fetch_all(&mut *self.db).await?;

        Ok(todos.into_iter().map(|todo| (todo.id, TodoDBResponse::from(todo))).collect())
    }

    #[instrument(skip(self, filter), fields(skip = filter.skip, limit = filter.limit), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(format!("SELECT {TODO_COLUMNS} FROM todos WHERE 1=1"));
        push_filters(&mut query, filter);

        // No secondary key: ties on the sort column come back in engine order.
        query.push(format!(" ORDER BY {} {}", sort_column(filter.sort_by), filter.sort_order.as_sql()));
        query.push(" LIMIT ");
        query.push_bind(filter.limit);
        query.push(" OFFSET ");
        query.push_bind(filter.skip);

        tracing::debug!("Executing SQL: {}", query.sql());

        let todos = query.build_query_as::<Todo>().fetch_all(&mut *self.db).await?;

        Ok(todos.into_iter().map(TodoDBResponse::from).collect())
    }

    #[instrument(skip(self, filter), err)]
    async fn count(&mut self, filter: &Self::Filter) -> Result<i64> {
        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT COUNT(*) FROM todos WHERE 1=1");
        push_filters(&mut query, filter);

        let count: i64 = query.build_query_scalar().fetch_one(&mut *self.db).await?;

        Ok(count)
    }

    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM todos WHERE id = ?")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        if request.is_empty() {
            return self.get_by_id(id).await?.ok_or(DbError::NotFound);
        }

        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE todos SET ");
        let mut fields = query.separated(", ");
        if let Some(ref title) = request.title {
            fields.push("title = ").push_bind_unseparated(title.clone());
        }
        if let Some(ref description) = request.description {
            fields.push("description = ").push_bind_unseparated(description.clone());
        }
        if let Some(completed) = request.completed {
            fields.push("completed = ").push_bind_unseparated(completed);
        }
        if let Some(user_id) = request.user_id {
            fields.push("user_id = ").push_bind_unseparated(user_id);
        }

        query.push(" WHERE id = ");
        query.push_bind(id);
        query.push(format!(" RETURNING {TODO_COLUMNS}"));

        let todo = query
            .build_query_as::<Todo>()
            .fetch_optional(&mut *self.db)
            .await?
            .ok_or(DbError::NotFound)?;

        Ok(TodoDBResponse::from(todo))
    }
}
