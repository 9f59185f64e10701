// Shared between the integration test binaries; not every binary uses
// every helper.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use uuid::Uuid;

use campus_rental_api::config::AppConfig;
use campus_rental_api::db::{self, DbConfig};
use campus_rental_api::services::applications::{
    ApplicantIdentity, CreateApplicationRequest, SelectedItemEntry,
};
use campus_rental_api::services::catalog::{CreateItemRequest, ItemResponse};
use campus_rental_api::AppState;

pub fn test_config() -> AppConfig {
    AppConfig::new(
        "sqlite::memory:".to_string(),
        "integration_test_jwt_secret_with_enough_length_0123456789".to_string(),
        "development".to_string(),
    )
}

/// Fresh in-memory database with migrations applied, wrapped in app state.
///
/// The pool is pinned to a single connection so the in-memory database
/// survives for the whole test.
pub async fn setup_state() -> AppState {
    let config = test_config();
    let db_config = DbConfig {
        url: config.database_url.clone(),
        max_connections: 1,
        min_connections: 1,
        idle_timeout: Duration::from_secs(86_400),
        ..Default::default()
    };
    let pool = Arc::new(
        db::establish_connection_with_config(&db_config)
            .await
            .expect("connect to in-memory database"),
    );
    db::run_migrations(&pool).await.expect("run migrations");
    AppState::new(pool, Arc::new(config), None)
}

pub async fn seed_item(state: &AppState, name: &str, stock: i32, price: Decimal) -> ItemResponse {
    state
        .catalog
        .create_item(CreateItemRequest {
            name: name.to_string(),
            initial_stock: stock,
            price,
            unit: "piece".to_string(),
            description: None,
            image_url: None,
        })
        .await
        .expect("seed catalog item")
}

pub fn identity(name: &str) -> ApplicantIdentity {
    ApplicantIdentity {
        applicant_name: name.to_string(),
        student_id: format!("2024-{}", name),
        phone: "555-0100".to_string(),
    }
}

pub fn create_request(
    who: &ApplicantIdentity,
    items: Vec<(Uuid, i32)>,
) -> CreateApplicationRequest {
    CreateApplicationRequest {
        identity: who.clone(),
        account_info: None,
        rental_date: chrono::NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        return_date: chrono::NaiveDate::from_ymd_opt(2024, 6, 8).unwrap(),
        items: items
            .into_iter()
            .map(|(item_id, quantity)| SelectedItemEntry { item_id, quantity })
            .collect(),
    }
}

pub async fn current_stock(state: &AppState, item_id: Uuid) -> i32 {
    state
        .catalog
        .get_item(item_id)
        .await
        .expect("read item")
        .expect("item exists")
        .current_stock
}
