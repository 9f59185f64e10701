//! Campus equipment rental API.
//!
//! A request/approval workflow for borrowing equipment: applicants submit
//! rental applications against a catalog of items, staff review and resolve
//! them, and a reconciliation engine keeps per-item stock consistent with
//! the set of live reservations.

pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod middleware;
pub mod migrator;
pub mod openapi;
pub mod services;
pub mod tracing;

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post, put};
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;

use crate::auth::AuthService;
use crate::config::AppConfig;
use crate::db::DbPool;
use crate::events::EventSender;
use crate::services::applications::ApplicationService;
use crate::services::catalog::ItemService;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DbPool>,
    pub config: Arc<AppConfig>,
    pub auth: Arc<AuthService>,
    pub applications: ApplicationService,
    pub catalog: ItemService,
}

impl AppState {
    pub fn new(
        db: Arc<DbPool>,
        config: Arc<AppConfig>,
        event_sender: Option<Arc<EventSender>>,
    ) -> Self {
        let auth = Arc::new(AuthService::new(
            config.jwt_secret.clone(),
            config.jwt_expiration,
            config.admin_id.clone(),
            config.admin_secret.clone(),
        ));
        let applications = ApplicationService::new(
            db.clone(),
            event_sender.clone(),
            config.deposit_amount,
        );
        let catalog = ItemService::new(db.clone(), event_sender);
        Self {
            db,
            config,
            auth,
            applications,
            catalog,
        }
    }
}

/// All /api/v1 routes. The admin sub-tree sits behind the JWT guard; the
/// applicant surface and login are open.
pub fn api_v1_routes(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route(
            "/applications",
            post(handlers::applications::create_application),
        )
        .route(
            "/applications/lookup",
            post(handlers::applications::lookup_applications),
        )
        .route(
            "/applications/:id",
            put(handlers::applications::edit_application),
        )
        .route(
            "/applications/:id/cancel",
            post(handlers::applications::cancel_application),
        )
        .route("/items", get(handlers::items::list_items))
        .route("/items/:id", get(handlers::items::get_item))
        .route("/auth/login", post(auth::login));

    let admin = Router::new()
        .route("/admin/applications", get(handlers::admin::list_applications))
        .route(
            "/admin/applications/:id",
            get(handlers::admin::get_application)
                .put(handlers::admin::update_application)
                .delete(handlers::admin::delete_application),
        )
        .route("/admin/items", post(handlers::admin::create_item))
        .route(
            "/admin/items/:id",
            put(handlers::admin::update_item).delete(handlers::admin::delete_item),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            state,
            auth::require_admin,
        ));

    Router::new().merge(public).merge(admin)
}

/// Full application router with the ambient middleware stack applied.
pub fn app_router(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .nest("/api/v1", api_v1_routes(state.clone()))
        .merge(openapi::swagger_ui())
        .layer(axum::middleware::from_fn(
            middleware::request_id_middleware,
        ))
        .layer(tracing::configure_http_tracing())
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(cors)
        .with_state(state)
}
