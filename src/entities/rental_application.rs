use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of a rental application.
///
/// The forward lifecycle is PENDING -> RENTED -> RETURNED; applications may
/// also leave the ledger entirely via user cancellation (PENDING only) or
/// admin deletion (any status).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplicationStatus {
    Pending,
    Rented,
    Returned,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Rented => "rented",
            ApplicationStatus::Returned => "returned",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ApplicationStatus::Pending),
            "rented" => Some(ApplicationStatus::Rented),
            "returned" => Some(ApplicationStatus::Returned),
            _ => None,
        }
    }

    /// A reserved application holds its quantities back from item stock.
    pub fn is_reserved(&self) -> bool {
        matches!(
            self,
            ApplicationStatus::Pending | ApplicationStatus::Rented
        )
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "rental_applications")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub applicant_name: String,
    pub student_id: String,
    pub phone: String,
    pub account_info: Option<String>,
    pub rental_date: NaiveDate,
    pub return_date: NaiveDate,
    pub total_item_cost: Decimal,
    pub deposit: Decimal,
    pub total_amount: Decimal,
    // Stored as string in DB, converted to/from ApplicationStatus
    pub status: String,
    pub application_date: DateTime<Utc>,
    pub rental_staff: Option<String>,
    pub return_staff: Option<String>,
    pub actual_return_date: Option<NaiveDate>,
    pub deposit_refunded: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub version: i32,
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
