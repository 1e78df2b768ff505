//! Todo business rules.

use std::collections::BTreeSet;

use sqlx::SqliteConnection;
use tracing::{info, instrument};

use super::{Page, UserService};
use crate::api::models::todos::{ListTodosQuery, TodoCreate, TodoUpdate};
use crate::db::errors::DbError;
use crate::db::handlers::{Repository, Todos, Users, todos::TodoFilter};
use crate::db::models::todos::{TodoCreateDBRequest, TodoDBResponse, TodoUpdateDBRequest};
use crate::db::models::users::UserDBResponse;
use crate::errors::{Error, Result};
use crate::types::{TodoId, UserId};

/// A todo and, when requested, the user that owns it.
#[derive(Debug, Clone)]
pub struct TodoWithOwner {
    pub todo: TodoDBResponse,
    /// Always `None` for unowned todos, and for every row when owners were not requested
    pub owner: Option<UserDBResponse>,
}

pub struct TodoService<'c> {
    db: &'c mut SqliteConnection,
}

impl<'c> TodoService<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }

    /// Create a todo. A supplied owner must already exist.
    #[instrument(skip(self, input), fields(user_id = ?input.user_id), err)]
    pub async fn create(&mut self, input: TodoCreate) -> Result<TodoDBResponse> {
        if let Some(user_id) = input.user_id {
            UserService::new(&mut *self.db).get(user_id).await?;
        }

        let request = TodoCreateDBRequest::from(input);
        let todo = Todos::new(&mut *self.db).create(&request).await?;

        info!(todo_id = todo.id, user_id = ?todo.user_id, "Created todo item");
        Ok(todo)
    }

    #[instrument(skip(self), err)]
    pub async fn get(&mut self, id: TodoId) -> Result<TodoDBResponse> {
        Todos::new(&mut *self.db)
            .get_by_id(id)
            .await?
            .ok_or_else(|| Error::not_found("Todo", id))
    }

    /// Count and fetch one page. With `include_owner`, the owners of the page
    /// are loaded in a single extra query and attached to their todos.
    #[instrument(skip(self, query), err)]
    pub async fn list(&mut self, query: &ListTodosQuery, include_owner: bool) -> Result<Page<TodoWithOwner>> {
        let filter = TodoFilter::from(query);
        let mut repo = Todos::new(&mut *self.db);

        let total = repo.count(&filter).await?;
        let todos = repo.list(&filter).await?;

        if !include_owner {
            let items = todos.into_iter().map(|todo| TodoWithOwner { todo, owner: None }).collect();
            return Ok(Page { items, total });
        }

        let owner_ids: BTreeSet<UserId> = todos.iter().filter_map(|todo| todo.user_id).collect();
        let owners = Users::new(&mut *self.db).get_bulk(owner_ids.into_iter().collect()).await?;

        let items = todos
            .into_iter()
            .map(|todo| {
                // Several todos can share an owner, so clone rather than take.
                let owner = todo.user_id.and_then(|id| owners.get(&id).cloned());
                TodoWithOwner { todo, owner }
            })
            .collect();

        Ok(Page { items, total })
    }

    /// Apply a partial update. A changed owner is not looked up first; the
    /// foreign key rejects a missing user, which is reported as "User not found".
    #[instrument(skip(self, input), err)]
    pub async fn update(&mut self, id: TodoId, input: TodoUpdate) -> Result<TodoDBResponse> {
        self.get(id).await?;

        let new_owner = input.user_id.flatten();
        let request = TodoUpdateDBRequest::from(input);
        Todos::new(&mut *self.db).update(id, &request).await.map_err(|err| match err {
            DbError::ForeignKeyViolation { .. } => Error::not_found("User", new_owner.map_or_else(String::new, |id| id.to_string())),
            other => Error::Database(other),
        })
    }

    #[instrument(skip(self), err)]
    pub async fn delete(&mut self, id: TodoId) -> Result<()> {
        self.get(id).await?;

        if !Todos::new(&mut *self.db).delete(id).await? {
            return Err(Error::not_found("Todo", id));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::pagination::Pagination;
    use crate::api::models::users::UserCreate;
    use crate::db::schema::ensure_schema;
    use sqlx::SqlitePool;

    async fn create_user(conn: &mut SqliteConnection, username: &str) -> UserDBResponse {
        UserService::new(conn)
            .create(UserCreate {
                username: username.to_string(),
                email: format!("{username}@example.com"),
                full_name: None,
                is_active: true,
            })
            .await
            .unwrap()
    }

    fn todo(title: &str, user_id: Option<UserId>) -> TodoCreate {
        TodoCreate {
            title: title.to_string(),
            description: None,
            completed: false,
            user_id,
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_with_missing_user_persists_nothing(pool: SqlitePool) {
        ensure_schema(&pool).await.unwrap();
        let mut conn = pool.acquire().await.unwrap();
        let mut service = TodoService::new(&mut conn);

        match service.create(todo("Orphan", Some(41))).await {
            Err(Error::NotFound { resource, id }) => {
                assert_eq!(resource, "User");
                assert_eq!(id, "41");
            }
            other => panic!("expected user not found, got {other:?}"),
        }

        let page = service.list(&ListTodosQuery::default(), false).await.unwrap();
        assert_eq!(page.total, 0);
        assert!(page.items.is_empty());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_get_missing_todo(pool: SqlitePool) {
        ensure_schema(&pool).await.unwrap();
        let mut conn = pool.acquire().await.unwrap();

        match TodoService::new(&mut conn).get(7).await {
            Err(Error::NotFound { resource, .. }) => assert_eq!(resource, "Todo"),
            other => panic!("expected todo not found, got {other:?}"),
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_with_owners_attaches_owner_or_none(pool: SqlitePool) {
        ensure_schema(&pool).await.unwrap();
        let mut conn = pool.acquire().await.unwrap();
        let alice = create_user(&mut conn, "alice").await;
        let bob = create_user(&mut conn, "bob").await;

        let mut service = TodoService::new(&mut conn);
        let owned = service.create(todo("alice's", Some(alice.id))).await.unwrap();
        let shared = service.create(todo("alice's too", Some(alice.id))).await.unwrap();
        let bobs = service.create(todo("bob's", Some(bob.id))).await.unwrap();
        let loose = service.create(todo("nobody's", None)).await.unwrap();

        let page = service.list(&ListTodosQuery::default(), true).await.unwrap();
        assert_eq!(page.total, 4);

        let owner_of = |id: TodoId| {
            page.items
                .iter()
                .find(|item| item.todo.id == id)
                .and_then(|item| item.owner.as_ref().map(|u| u.username.clone()))
        };
        assert_eq!(owner_of(owned.id).as_deref(), Some("alice"));
        assert_eq!(owner_of(shared.id).as_deref(), Some("alice"));
        assert_eq!(owner_of(bobs.id).as_deref(), Some("bob"));
        assert_eq!(owner_of(loose.id), None);

        let plain = service.list(&ListTodosQuery::default(), false).await.unwrap();
        assert!(plain.items.iter().all(|item| item.owner.is_none()));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_total_is_independent_of_page(pool: SqlitePool) {
        ensure_schema(&pool).await.unwrap();
        let mut conn = pool.acquire().await.unwrap();
        let alice = create_user(&mut conn, "alice").await;

        let mut service = TodoService::new(&mut conn);
        for i in 0..7 {
            service.create(todo(&format!("todo {i}"), Some(alice.id))).await.unwrap();
        }

        let query = ListTodosQuery {
            pagination: Pagination::new(3, 3).unwrap(),
            ..Default::default()
        };
        let page = service.list(&query, true).await.unwrap();
        assert_eq!(page.total, 7);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].todo.title, "todo 6");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_reassigns_without_precheck(pool: SqlitePool) {
        ensure_schema(&pool).await.unwrap();
        let mut conn = pool.acquire().await.unwrap();
        let alice = create_user(&mut conn, "alice").await;
        let bob = create_user(&mut conn, "bob").await;

        let mut service = TodoService::new(&mut conn);
        let created = service.create(todo("Buy milk", Some(alice.id))).await.unwrap();

        let moved = service
            .update(
                created.id,
                TodoUpdate {
                    user_id: Some(Some(bob.id)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(moved.user_id, Some(bob.id));
        assert_eq!(moved.title, "Buy milk");

        match service
            .update(
                created.id,
                TodoUpdate {
                    user_id: Some(Some(404)),
                    ..Default::default()
                },
            )
            .await
        {
            Err(Error::NotFound { resource, id }) => {
                assert_eq!(resource, "User");
                assert_eq!(id, "404");
            }
            other => panic!("expected user not found, got {other:?}"),
        }
        assert_eq!(service.get(created.id).await.unwrap().user_id, Some(bob.id));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_delete_missing_todo(pool: SqlitePool) {
        ensure_schema(&pool).await.unwrap();
        let mut conn = pool.acquire().await.unwrap();
        let mut service = TodoService::new(&mut conn);

        let created = service.create(todo("Once", None)).await.unwrap();
        service.delete(created.id).await.unwrap();
        assert!(matches!(service.delete(created.id).await, Err(Error::NotFound { .. })));
    }
}
