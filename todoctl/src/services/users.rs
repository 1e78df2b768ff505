//! User business rules.

use sqlx::SqliteConnection;
use tracing::{info, instrument};

use super::Page;
use crate::api::models::users::{ListUsersQuery, UserCreate, UserUpdate};
use crate::db::errors::DbError;
use crate::db::handlers::{Repository, Todos, Users, users::UserFilter};
use crate::db::models::users::{UserCreateDBRequest, UserDBResponse, UserUpdateDBRequest};
use crate::errors::{Error, Result};
use crate::types::UserId;

const USER_CONFLICT: &str = "Username or email already exists";

/// Uniqueness failures become a fixed conflict message; the raw constraint never reaches callers.
fn map_unique_violation(err: DbError) -> Error {
    match err {
        DbError::UniqueViolation { .. } => Error::Conflict {
            message: USER_CONFLICT.to_string(),
        },
        other => Error::Database(other),
    }
}

pub struct UserService<'c> {
    db: &'c mut SqliteConnection,
}

impl<'c> UserService<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, input), fields(username = %input.username), err)]
    pub async fn create(&mut self, input: UserCreate) -> Result<UserDBResponse> {
        let request = UserCreateDBRequest::from(input);
        let user = Users::new(&mut *self.db).create(&request).await.map_err(map_unique_violation)?;

        info!(user_id = user.id, "Created user");
        Ok(user)
    }

    #[instrument(skip(self), err)]
    pub async fn get(&mut self, id: UserId) -> Result<UserDBResponse> {
        Users::new(&mut *self.db)
            .get_by_id(id)
            .await?
            .ok_or_else(|| Error::not_found("User", id))
    }

    #[instrument(skip(self, query), err)]
    pub async fn list(&mut self, query: &ListUsersQuery) -> Result<Page<UserDBResponse>> {
        let filter = UserFilter::from(query);
        let mut repo = Users::new(&mut *self.db);

        let total = repo.count(&filter).await?;
        let items = repo.list(&filter).await?;

        Ok(Page { items, total })
    }

    #[instrument(skip(self, input), err)]
    pub async fn update(&mut self, id: UserId, input: UserUpdate) -> Result<UserDBResponse> {
        self.get(id).await?;

        let request = UserUpdateDBRequest::from(input);
        Users::new(&mut *self.db)
            .update(id, &request)
            .await
            .map_err(map_unique_violation)
    }

    /// Delete a user together with every todo it owns.
    #[instrument(skip(self), err)]
    pub async fn delete(&mut self, id: UserId) -> Result<()> {
        self.get(id).await?;

        let todos_removed = Todos::new(&mut *self.db).delete_by_user(id).await?;
        if !Users::new(&mut *self.db).delete(id).await? {
            return Err(Error::not_found("User", id));
        }

        info!(user_id = id, todos_removed, "Deleted user");
        Ok(())
    }
}
