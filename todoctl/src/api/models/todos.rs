//! API request/response models for todos.

use super::pagination::Pagination;
use super::query::SortOrder;
use super::users::UserResponse;
use crate::db::models::todos::TodoDBResponse;
use crate::types::{TodoId, UserId};
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

// Todo request models
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct TodoCreate {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub completed: bool,
    /// Owning user; must exist when supplied
    #[validate(range(min = 1))]
    pub user_id: Option<UserId>,
}

/// Partial update: absent fields are left untouched.
///
/// `description` and `user_id` distinguish "absent" from an explicit `null`,
/// which clears them.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct TodoUpdate {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    pub completed: Option<bool>,
    #[serde(default, with = "::serde_with::rust::double_option", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<i64>)]
    #[validate(range(min = 1))]
    pub user_id: Option<Option<UserId>>,
}

// Todo response models
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TodoResponse {
    pub id: TodoId,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub user_id: Option<UserId>,
}

impl From<TodoDBResponse> for TodoResponse {
    fn from(db: TodoDBResponse) -> Self {
        Self {
            id: db.id,
            title: db.title,
            description: db.description,
            completed: db.completed,
            user_id: db.user_id,
        }
    }
}

/// A todo with its owner embedded, `null` when the todo is unowned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TodoWithUserResponse {
    #[serde(flatten)]
    pub todo: TodoResponse,
    pub user: Option<UserResponse>,
}

/// Columns a todo listing may be ordered by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TodoSortField {
    #[default]
    Id,
    Title,
    Completed,
    UserId,
}

/// Query parameters for listing todos
#[serde_as]
#[derive(Debug, Clone, Default, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListTodosQuery {
    /// Pagination parameters
    #[serde(flatten)]
    #[param(inline)]
    #[validate(nested)]
    pub pagination: Pagination,

    /// Column to order by (default: id)
    #[serde(default)]
    #[param(inline)]
    pub sort_by: TodoSortField,

    /// Sort direction (default: asc)
    #[serde(default)]
    #[param(inline)]
    pub sort_order: SortOrder,

    /// Only todos with this completion state
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub completed: Option<bool>,

    /// Only todos owned by this user
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[validate(range(min = 1))]
    pub user_id: Option<UserId>,
}
