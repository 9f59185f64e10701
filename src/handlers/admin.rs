//! Staff console endpoints. All routes here sit behind the admin JWT guard.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::handlers::ListQuery;
use crate::services::applications::{
    AdminApplicationPatch, ApplicationListResponse, ApplicationResponse,
};
use crate::services::catalog::{AdminItemPatch, CreateItemRequest, ItemResponse};
use crate::AppState;

/// GET /admin/applications — review queue, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/admin/applications",
    params(ListQuery),
    responses(
        (status = 200, description = "Application page", body = ApplicationListResponse),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn list_applications(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApplicationListResponse>, ServiceError> {
    let page = state
        .applications
        .admin_list_applications(query.page(), query.per_page(), query.status.as_deref())
        .await?;
    Ok(Json(page))
}

/// GET /admin/applications/:id — one application, any status.
#[utoipa::path(
    get,
    path = "/api/v1/admin/applications/{id}",
    params(("id" = Uuid, Path, description = "Application id")),
    responses(
        (status = 200, description = "Application", body = ApplicationResponse),
        (status = 404, description = "Application not found")
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn get_application(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApplicationResponse>, ServiceError> {
    let application = state
        .applications
        .get_application(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("application {} not found", id)))?;
    Ok(Json(application))
}

/// PUT /admin/applications/:id — allow-listed patch, any status.
#[utoipa::path(
    put,
    path = "/api/v1/admin/applications/{id}",
    params(("id" = Uuid, Path, description = "Application id")),
    request_body = AdminApplicationPatch,
    responses(
        (status = 200, description = "Application updated", body = ApplicationResponse),
        (status = 400, description = "Invalid patch or transition"),
        (status = 404, description = "Application not found"),
        (status = 422, description = "Insufficient stock")
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn update_application(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<AdminApplicationPatch>,
) -> Result<Json<ApplicationResponse>, ServiceError> {
    let response = state
        .applications
        .admin_update_application(id, patch)
        .await?;
    Ok(Json(response))
}

/// DELETE /admin/applications/:id — delete at any status, releasing any
/// reserved stock.
#[utoipa::path(
    delete,
    path = "/api/v1/admin/applications/{id}",
    params(("id" = Uuid, Path, description = "Application id")),
    responses(
        (status = 204, description = "Application deleted"),
        (status = 404, description = "Application not found")
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn delete_application(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    state.applications.admin_delete_application(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /admin/items — add a catalog item.
#[utoipa::path(
    post,
    path = "/api/v1/admin/items",
    request_body = CreateItemRequest,
    responses(
        (status = 201, description = "Item created", body = ItemResponse),
        (status = 400, description = "Validation failed")
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn create_item(
    State(state): State<AppState>,
    Json(request): Json<CreateItemRequest>,
) -> Result<(StatusCode, Json<ItemResponse>), ServiceError> {
    let item = state.catalog.create_item(request).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// PUT /admin/items/:id — edit a catalog item.
#[utoipa::path(
    put,
    path = "/api/v1/admin/items/{id}",
    params(("id" = Uuid, Path, description = "Item id")),
    request_body = AdminItemPatch,
    responses(
        (status = 200, description = "Item updated", body = ItemResponse),
        (status = 404, description = "Item not found"),
        (status = 409, description = "Stock reduction below reserved quantity")
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<AdminItemPatch>,
) -> Result<Json<ItemResponse>, ServiceError> {
    let item = state.catalog.update_item(id, patch).await?;
    Ok(Json(item))
}

/// DELETE /admin/items/:id — delete an item not referenced by an active
/// application.
#[utoipa::path(
    delete,
    path = "/api/v1/admin/items/{id}",
    params(("id" = Uuid, Path, description = "Item id")),
    responses(
        (status = 204, description = "Item deleted"),
        (status = 404, description = "Item not found"),
        (status = 409, description = "Item still referenced by active applications")
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn delete_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    state.catalog.delete_item(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
