//! API request/response models for users.

use super::pagination::Pagination;
use super::query::SortOrder;
use crate::db::models::users::UserDBResponse;
use crate::types::UserId;
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

fn default_active() -> bool {
    true
}

// User request models
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct UserCreate {
    #[validate(length(min = 1, max = 50))]
    pub username: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(max = 100))]
    pub full_name: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

/// Partial update: absent fields are left untouched.
///
/// `full_name` distinguishes "absent" from an explicit `null`, which clears it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UserUpdate {
    #[validate(length(min = 1, max = 50))]
    pub username: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    #[validate(length(max = 100))]
    pub full_name: Option<Option<String>>,
    pub is_active: Option<bool>,
}

// User response models
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub full_name: Option<String>,
    pub is_active: bool,
}

impl From<UserDBResponse> for UserResponse {
    fn from(db: UserDBResponse) -> Self {
        Self {
            id: db.id,
            username: db.username,
            email: db.email,
            full_name: db.full_name,
            is_active: db.is_active,
        }
    }
}

/// Columns a user listing may be ordered by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum UserSortField {
    #[default]
    Id,
    Username,
    Email,
}

/// Query parameters for listing users
#[serde_as]
#[derive(Debug, Clone, Default, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListUsersQuery {
    /// Pagination parameters
    #[serde(flatten)]
    #[param(inline)]
    #[validate(nested)]
    pub pagination: Pagination,

    /// Column to order by (default: id)
    #[serde(default)]
    #[param(inline)]
    pub sort_by: UserSortField,

    /// Sort direction (default: asc)
    #[serde(default)]
    #[param(inline)]
    pub sort_order: SortOrder,

    /// Case-insensitive substring match on username
    #[validate(length(min = 1))]
    pub username: Option<String>,

    /// Case-insensitive substring match on email
    #[validate(length(min = 1))]
    pub email: Option<String>,

    /// Only users with this active flag
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub is_active: Option<bool>,
}
