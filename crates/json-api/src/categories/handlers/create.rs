//! Create Category Handler

use std::sync::Arc;

use salvo::{
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use emporium_app::domain::categories::{
    data::NewCategory,
    records::{CategoryRecord, CategoryUuid},
};

use crate::{categories::errors::into_status_error, extensions::*, state::State};

/// Create Category Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CreateCategoryRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Category Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CategoryResponse {
    pub uuid: Uuid,
    pub name: String,
    pub description: String,
    pub created_at: String,
}

impl From<CategoryRecord> for CategoryResponse {
    fn from(category: CategoryRecord) -> Self {
        Self {
            uuid: category.uuid.into_uuid(),
            name: category.name,
            description: category.description,
            created_at: category.created_at.to_string(),
        }
    }
}

/// Create Category Handler
#[endpoint(
    tags("admin"),
    summary = "Create Category",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::CREATED, description = "Category created"),
        (status_code = StatusCode::CONFLICT, description = "Category name already taken"),
        (status_code = StatusCode::FORBIDDEN, description = "Admin access required"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
pub(crate) async fn handler(
    json: JsonBody<CreateCategoryRequest>,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<CategoryResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    depot.admin_or_403()?;

    let request = json.into_inner();

    if request.name.trim().is_empty() {
        return Err(StatusError::bad_request().brief("Category name is required"));
    }

    let category = state
        .app
        .categories
        .create_category(NewCategory {
            uuid: CategoryUuid::new(),
            name: request.name.trim().to_string(),
            description: request.description,
        })
        .await
        .map_err(into_status_error)?;

    tracing::info!(category_uuid = %category.uuid, "created category");

    res.status_code(StatusCode::CREATED);

    Ok(Json(category.into()))
}
