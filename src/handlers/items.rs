//! Public catalog browsing endpoints.

use axum::extract::{Path, Query, State};
use axum::Json;
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::handlers::ListQuery;
use crate::services::catalog::{ItemListResponse, ItemResponse};
use crate::AppState;

/// GET /items — browse the equipment catalog.
#[utoipa::path(
    get,
    path = "/api/v1/items",
    params(ListQuery),
    responses(
        (status = 200, description = "Catalog page", body = ItemListResponse)
    ),
    tag = "items"
)]
pub async fn list_items(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ItemListResponse>, ServiceError> {
    let items = state
        .catalog
        .list_items(query.page(), query.per_page())
        .await?;
    Ok(Json(items))
}

/// GET /items/:id — one catalog item.
#[utoipa::path(
    get,
    path = "/api/v1/items/{id}",
    params(("id" = Uuid, Path, description = "Item id")),
    responses(
        (status = 200, description = "Item", body = ItemResponse),
        (status = 404, description = "Item not found")
    ),
    tag = "items"
)]
pub async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ItemResponse>, ServiceError> {
    let item = state
        .catalog
        .get_item(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("item {} not found", id)))?;
    Ok(Json(item))
}
