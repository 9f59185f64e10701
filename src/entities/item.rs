use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A rentable catalog item.
///
/// `current_stock` counts physically-available-to-reserve units; quantities
/// held by PENDING/RENTED applications are already excluded. The invariant
/// `0 <= current_stock <= initial_stock` holds at all times.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub initial_stock: i32,
    pub current_stock: i32,
    pub price: Decimal,
    pub unit: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::application_item::Entity")]
    ApplicationItems,
}

impl Related<super::application_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ApplicationItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
