//! Database repository for users.

use std::collections::HashMap;

use crate::api::models::query::SortOrder;
use crate::api::models::users::{ListUsersQuery, UserSortField};
use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::users::{UserCreateDBRequest, UserDBResponse, UserUpdateDBRequest},
};
use crate::types::UserId;
use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteConnection};
use tracing::instrument;

const USER_COLUMNS: &str = "id, username, email, full_name, is_active";

/// Filter for listing users
#[derive(Debug, Clone)]
pub struct UserFilter {
    pub skip: i64,
    pub limit: i64,
    pub username: Option<String>, // Case-insensitive substring match
    pub email: Option<String>,    // Case-insensitive substring match
    pub is_active: Option<bool>,
    pub sort_by: UserSortField,
    pub sort_order: SortOrder,
}

impl UserFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            skip,
            limit,
            username: None,
            email: None,
            is_active: None,
            sort_by: UserSortField::default(),
            sort_order: SortOrder::default(),
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = Some(is_active);
        self
    }

    pub fn sorted_by(mut self, sort_by: UserSortField, sort_order: SortOrder) -> Self {
        self.sort_by = sort_by;
        self.sort_order = sort_order;
        self
    }
}

impl From<&ListUsersQuery> for UserFilter {
    fn from(query: &ListUsersQuery) -> Self {
        let mut filter = Self::new(query.pagination.offset(), query.pagination.limit()).sorted_by(query.sort_by, query.sort_order);
        if let Some(username) = &query.username {
            filter = filter.with_username(username.as_str());
        }
        if let Some(email) = &query.email {
            filter = filter.with_email(email.as_str());
        }
        if let Some(is_active) = query.is_active {
            filter = filter.with_active(is_active);
        }
        filter
    }
}

// Database entity model
#[derive(Debug, Clone, FromRow)]
struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub full_name: Option<String>,
    pub is_active: bool,
}

impl From<User> for UserDBResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            full_name: user.full_name,
            is_active: user.is_active,
        }
    }
}

fn sort_column(field: UserSortField) -> &'static str {
    match field {
        UserSortField::Id => "id",
        UserSortField::Username => "username",
        UserSortField::Email => "email",
    }
}

/// Append the filter's predicates. Absent filters add nothing.
fn push_filters(query: &mut QueryBuilder<'_, Sqlite>, filter: &UserFilter) {
    // SQLite's LOWER only folds ASCII, so fold the needle the same way.
    if let Some(ref username) = filter.username {
        query.push(" AND instr(LOWER(username), ");
        query.push_bind(username.to_ascii_lowercase());
        query.push(") > 0");
    }

    if let Some(ref email) = filter.email {
        query.push(" AND instr(LOWER(email), ");
        query.push_bind(email.to_ascii_lowercase());
        query.push(") > 0");
    }

    if let Some(is_active) = filter.is_active {
        query.push(" AND is_active = ");
        query.push_bind(is_active);
    }
}

pub struct Users<'c> {
    db: &'c mut SqliteConnection,
}

impl<'c> Users<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Users<'c> {
    type CreateRequest = UserCreateDBRequest;
    type UpdateRequest = UserUpdateDBRequest;
    type Response = UserDBResponse;
    type Id = UserId;
    type Filter = UserFilter;

    #[instrument(skip(self, request), fields(username = %request.username), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (username, email, full_name, is_active) VALUES (?, ?, ?, ?) RETURNING {USER_COLUMNS}"
        ))
        .bind(&request.username)
        .bind(&request.email)
        .bind(&request.full_name)
        .bind(request.is_active)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(UserDBResponse::from(user))
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(user.map(UserDBResponse::from))
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    async fn get_bulk(&mut self, ids: Vec<UserId>) -> Result<HashMap<UserId, UserDBResponse>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(format!("SELECT {USER_COLUMNS} FROM users WHERE id IN ("));
        let mut separated = query.separated(", ");
        for id in &ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");

        let users = query.build_query_as::<User>().fetch_all(&mut *self.db).await?;

        Ok(users.into_iter().map(|user| (user.id, UserDBResponse::from(user))).collect())
    }

    #[instrument(skip(self, filter), fields(skip = filter.skip, limit = filter.limit), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(format!("SELECT {USER_COLUMNS} FROM users WHERE 1=1"));
        push_filters(&mut query, filter);

        // Only the chosen column orders the page; rows with equal keys have no defined order.
        query.push(format!(" ORDER BY {} {}", sort_column(filter.sort_by), filter.sort_order.as_sql()));
        query.push(" LIMIT ");
        query.push_bind(filter.limit);
        query.push(" OFFSET ");
        query.push_bind(filter.skip);

        tracing::debug!("Executing SQL: {}", query.sql());

        let users = query.build_query_as::<User>().fetch_all(&mut *self.db).await?;

        Ok(users.into_iter().map(UserDBResponse::from).collect())
    }

    #[instrument(skip(self, filter), err)]
    async fn count(&mut self, filter: &Self::Filter) -> Result<i64> {
        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT COUNT(*) FROM users WHERE 1=1");
        push_filters(&mut query, filter);

        let count: i64 = query.build_query_scalar().fetch_one(&mut *self.db).await?;

        Ok(count)
    }

    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
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

        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE users SET ");
        let mut fields = query.separated(", ");
        if let Some(ref username) = request.username {
            fields.push("username = ").push_bind_unseparated(username.clone());
        }
        if let Some(ref email) = request.email {
            fields.push("email = ").push_bind_unseparated(email.clone());
        }
        if let Some(ref full_name) = request.full_name {
            fields.push("full_name = ").push_bind_unseparated(full_name.clone());
        }
        if let Some(is_active) = request.is_active {
            fields.push("is_active = ").push_bind_unseparated(is_active);
        }

        query.push(" WHERE id = ");
        query.push_bind(id);
        query.push(format!(" RETURNING {USER_COLUMNS}"));

        let user = query
            .build_query_as::<User>()
            .fetch_optional(&mut *self.db)
            .await?
            .ok_or(DbError::NotFound)?;

        Ok(UserDBResponse::from(user))
    }
}
