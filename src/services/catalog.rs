//! Equipment catalog management.
//!
//! Item creation, listing, admin edits and deletion. Stock invariants are
//! enforced here for direct catalog writes: `current_stock` tracks
//! `initial_stock` edits by the same difference, and an item referenced by a
//! PENDING or RENTED application cannot be deleted.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::db::DbPool;
use crate::entities::application_item::{self, Entity as ApplicationItemEntity};
use crate::entities::item::{self, Entity as ItemEntity};
use crate::entities::rental_application::{
    self, ApplicationStatus, Entity as RentalApplicationEntity,
};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateItemRequest {
    #[validate(length(min = 1, message = "Item name is required"))]
    pub name: String,
    #[validate(range(min = 0, message = "Initial stock cannot be negative"))]
    pub initial_stock: i32,
    pub price: Decimal,
    #[validate(length(min = 1, message = "Unit is required"))]
    pub unit: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

/// Allow-listed admin patch for an item. `current_stock` is deliberately
/// absent: free stock only moves through reservations or an `initial_stock`
/// edit, which shifts `current_stock` by the same difference.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct AdminItemPatch {
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub unit: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub initial_stock: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ItemResponse {
    pub id: Uuid,
    pub name: String,
    pub initial_stock: i32,
    pub current_stock: i32,
    pub price: Decimal,
    pub unit: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub created_at: chrono::DateTime<Utc>,
    pub updated_at: Option<chrono::DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ItemListResponse {
    pub items: Vec<ItemResponse>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

/// Service for managing the equipment catalog.
#[derive(Clone)]
pub struct ItemService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl ItemService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Creates a catalog item. A new item starts fully in stock.
    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_item(
        &self,
        request: CreateItemRequest,
    ) -> Result<ItemResponse, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;
        if request.price < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "price cannot be negative".to_string(),
            ));
        }

        let db = &*self.db_pool;
        let now = Utc::now();
        let item_id = Uuid::new_v4();

        let model = item::ActiveModel {
            id: Set(item_id),
            name: Set(request.name),
            initial_stock: Set(request.initial_stock),
            current_stock: Set(request.initial_stock),
            price: Set(request.price),
            unit: Set(request.unit),
            description: Set(request.description),
            image_url: Set(request.image_url),
            created_at: Set(now),
            updated_at: Set(Some(now)),
        };
        let inserted = model.insert(db).await?;

        info!(item_id = %item_id, "catalog item created");
        self.emit(Event::ItemCreated(item_id)).await;
        Ok(model_to_response(inserted))
    }

    /// Lists catalog items, alphabetically.
    #[instrument(skip(self))]
    pub async fn list_items(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<ItemListResponse, ServiceError> {
        if page == 0 {
            return Err(ServiceError::ValidationError(
                "Page number must be greater than 0".to_string(),
            ));
        }
        if per_page == 0 || per_page > 1000 {
            return Err(ServiceError::ValidationError(
                "Per-page must be between 1 and 1000".to_string(),
            ));
        }

        let db = &*self.db_pool;
        let paginator = ItemEntity::find()
            .order_by_asc(item::Column::Name)
            .paginate(db, per_page);
        let total = paginator.num_items().await?;
        let items = paginator
            .fetch_page(page - 1)
            .await?
            .into_iter()
            .map(model_to_response)
            .collect();

        Ok(ItemListResponse {
            items,
            total,
            page,
            per_page,
        })
    }

    /// Retrieves one item by id.
    #[instrument(skip(self))]
    pub async fn get_item(&self, item_id: Uuid) -> Result<Option<ItemResponse>, ServiceError> {
        let db = &*self.db_pool;
        Ok(ItemEntity::find_by_id(item_id)
            .one(db)
            .await?
            .map(model_to_response))
    }

    /// Admin edit of an item. Changing `initial_stock` shifts
    /// `current_stock` by the same difference; a reduction below the
    /// currently reserved quantity is rejected.
    #[instrument(skip(self, patch), fields(item_id = %item_id))]
    pub async fn update_item(
        &self,
        item_id: Uuid,
        patch: AdminItemPatch,
    ) -> Result<ItemResponse, ServiceError> {
        if let Some(name) = &patch.name {
            if name.is_empty() {
                return Err(ServiceError::ValidationError(
                    "Item name is required".to_string(),
                ));
            }
        }
        if let Some(price) = patch.price {
            if price < Decimal::ZERO {
                return Err(ServiceError::ValidationError(
                    "price cannot be negative".to_string(),
                ));
            }
        }

        let db = &*self.db_pool;
        let txn = db.begin().await?;

        let model = ItemEntity::find_by_id(item_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("item {} not found", item_id)))?;

        let mut new_current = model.current_stock;
        if let Some(new_initial) = patch.initial_stock {
            if new_initial < 0 {
                return Err(ServiceError::ValidationError(
                    "Initial stock cannot be negative".to_string(),
                ));
            }
            let reserved = model.initial_stock - model.current_stock;
            if new_initial < reserved {
                return Err(ServiceError::Conflict(format!(
                    "initial stock {} is below the {} units currently reserved",
                    new_initial, reserved
                )));
            }
            new_current = new_initial - reserved;
        }

        let mut active: item::ActiveModel = model.into();
        if let Some(name) = patch.name {
            active.name = Set(name);
        }
        if let Some(price) = patch.price {
            active.price = Set(price);
        }
        if let Some(unit) = patch.unit {
            active.unit = Set(unit);
        }
        if let Some(description) = patch.description {
            active.description = Set(Some(description));
        }
        if let Some(image_url) = patch.image_url {
            active.image_url = Set(Some(image_url));
        }
        if let Some(new_initial) = patch.initial_stock {
            active.initial_stock = Set(new_initial);
            active.current_stock = Set(new_current);
        }
        active.updated_at = Set(Some(Utc::now()));
        let updated = active.update(&txn).await?;

        txn.commit().await?;

        info!(item_id = %item_id, "catalog item updated");
        self.emit(Event::ItemUpdated(item_id)).await;
        Ok(model_to_response(updated))
    }

    /// Deletes an item unless a PENDING or RENTED application still
    /// references it.
    #[instrument(skip(self), fields(item_id = %item_id))]
    pub async fn delete_item(&self, item_id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        let txn = db.begin().await?;

        ItemEntity::find_by_id(item_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("item {} not found", item_id)))?;

        let referencing: Vec<Uuid> = ApplicationItemEntity::find()
            .filter(application_item::Column::ItemId.eq(item_id))
            .all(&txn)
            .await?
            .into_iter()
            .map(|row| row.application_id)
            .collect();
        if !referencing.is_empty() {
            let active = RentalApplicationEntity::find()
                .filter(rental_application::Column::Id.is_in(referencing))
                .filter(rental_application::Column::Status.is_in(vec![
                    ApplicationStatus::Pending.as_str(),
                    ApplicationStatus::Rented.as_str(),
                ]))
                .count(&txn)
                .await?;
            if active > 0 {
                return Err(ServiceError::Conflict(format!(
                    "item {} is referenced by {} active application(s)",
                    item_id, active
                )));
            }
        }

        ItemEntity::delete_by_id(item_id).exec(&txn).await?;
        txn.commit().await?;

        info!(item_id = %item_id, "catalog item deleted");
        self.emit(Event::ItemDeleted(item_id)).await;
        Ok(())
    }

    async fn emit(&self, event: Event) {
        if let Some(sender) = &self.event_sender {
            if let Err(e) = sender.send(event).await {
                tracing::warn!(error = %e, "failed to send domain event");
            }
        }
    }
}

fn model_to_response(model: item::Model) -> ItemResponse {
    ItemResponse {
        id: model.id,
        name: model.name,
        initial_stock: model.initial_stock,
        current_stock: model.current_stock,
        price: model.price,
        unit: model.unit,
        description: model.description,
        image_url: model.image_url,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}
