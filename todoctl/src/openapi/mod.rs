//! OpenAPI documentation, served by Scalar at `/docs`.

use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

use crate::api;
use crate::api::models::{
    health::{HealthResponse, StatusResponse},
    query::SortOrder,
    todos::{TodoCreate, TodoResponse, TodoSortField, TodoUpdate, TodoWithUserResponse},
    users::{UserCreate, UserResponse, UserSortField, UserUpdate},
};
use crate::errors::ErrorBody;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.security_schemes.insert(
                "BearerAuth".to_string(),
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .description(Some(
                            "Include a configured token in the `Authorization` header:\n\n\
                            ```\nAuthorization: Bearer YOUR_TOKEN\n```",
                        ))
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(title = "todoctl", description = "Users and their todo items."),
    modifiers(&SecurityAddon),
    paths(
        api::handlers::health::status,
        api::handlers::health::health,
        api::handlers::users::create_user,
        api::handlers::users::list_users,
        api::handlers::users::get_user,
        api::handlers::users::update_user,
        api::handlers::users::delete_user,
        api::handlers::todos::create_todo,
        api::handlers::todos::list_todos,
        api::handlers::todos::list_todos_with_users,
        api::handlers::todos::get_todo,
        api::handlers::todos::update_todo,
        api::handlers::todos::delete_todo,
    ),
    components(schemas(
        ErrorBody,
        SortOrder,
        StatusResponse,
        HealthResponse,
        UserCreate,
        UserUpdate,
        UserResponse,
        UserSortField,
        TodoCreate,
        TodoUpdate,
        TodoResponse,
        TodoWithUserResponse,
        TodoSortField,
    )),
    tags(
        (name = "users", description = "User accounts. Deleting a user deletes the todos it owns."),
        (name = "todos", description = "Todo items, optionally owned by a user."),
        (name = "health", description = "Unauthenticated status probes."),
    )
)]
pub struct ApiDoc;
