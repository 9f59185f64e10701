//! Application Lifecycle Controller
//!
//! Orchestrates create/edit/cancel/admin-edit/admin-delete of rental
//! applications. Every transition re-reads inventory and ledger state inside
//! one database transaction, runs the reconciliation engine, and persists
//! the ledger change together with guarded per-item stock updates, so the
//! conservation invariant holds after every commit.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};
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
use crate::services::costs::compute_costs;
use crate::services::reconciliation::{
    reconcile, ReservationState, SelectedItem, StockSnapshot,
};

/// Identity tuple a public caller presents to create, look up, edit, or
/// cancel an application. There is no account system; matching all three
/// fields is the authorization.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ApplicantIdentity {
    #[validate(length(min = 1, message = "Applicant name is required"))]
    pub applicant_name: String,
    #[validate(length(min = 1, message = "Student id is required"))]
    pub student_id: String,
    #[validate(length(min = 1, message = "Phone is required"))]
    pub phone: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct SelectedItemEntry {
    pub item_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateApplicationRequest {
    #[validate]
    #[serde(flatten)]
    pub identity: ApplicantIdentity,
    pub account_info: Option<String>,
    pub rental_date: NaiveDate,
    pub return_date: NaiveDate,
    pub items: Vec<SelectedItemEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct UserEditRequest {
    #[validate]
    #[serde(flatten)]
    pub identity: ApplicantIdentity,
    pub rental_date: NaiveDate,
    pub return_date: NaiveDate,
    pub items: Vec<SelectedItemEntry>,
}

/// Allow-listed admin patch: exactly these fields are mutable through the
/// admin path, nothing else is merged from the request body.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct AdminApplicationPatch {
    pub status: Option<String>,
    pub rental_date: Option<NaiveDate>,
    pub return_date: Option<NaiveDate>,
    pub items: Option<Vec<SelectedItemEntry>>,
    pub account_info: Option<String>,
    pub rental_staff: Option<String>,
    pub return_staff: Option<String>,
    pub actual_return_date: Option<NaiveDate>,
    pub deposit_refunded: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApplicationResponse {
    pub id: Uuid,
    pub applicant_name: String,
    pub student_id: String,
    pub phone: String,
    pub account_info: Option<String>,
    pub rental_date: NaiveDate,
    pub return_date: NaiveDate,
    pub items: Vec<SelectedItemEntry>,
    pub total_item_cost: Decimal,
    pub deposit: Decimal,
    pub total_amount: Decimal,
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

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApplicationListResponse {
    pub applications: Vec<ApplicationResponse>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

/// Service for managing rental applications and their stock reservations.
#[derive(Clone)]
pub struct ApplicationService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
    deposit: Decimal,
}

impl ApplicationService {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Option<Arc<EventSender>>,
        deposit: Decimal,
    ) -> Self {
        Self {
            db_pool,
            event_sender,
            deposit,
        }
    }

    /// Creates a new application: full reservation of the selected items,
    /// status PENDING.
    #[instrument(skip(self, request), fields(student_id = %request.identity.student_id))]
    pub async fn create_application(
        &self,
        request: CreateApplicationRequest,
    ) -> Result<ApplicationResponse, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;
        validate_dates(request.rental_date, request.return_date)?;
        validate_selection(&request.items)?;
        let selection = to_selected(&request.items);

        let db = &*self.db_pool;
        let now = Utc::now();
        let application_id = Uuid::new_v4();

        let txn = db.begin().await.map_err(begin_failed)?;

        let ids: BTreeSet<Uuid> = selection.iter().map(|s| s.item_id).collect();
        let inventory = load_inventory(&txn, &ids).await?;
        let costs = compute_costs(&selection, &price_list_of(&inventory), self.deposit)?;

        let new_state = ReservationState {
            status: ApplicationStatus::Pending,
            items: &selection,
        };
        let deltas = reconcile(None, Some(&new_state), &snapshots_of(&inventory))?;

        let model = rental_application::ActiveModel {
            id: Set(application_id),
            applicant_name: Set(request.identity.applicant_name.clone()),
            student_id: Set(request.identity.student_id.clone()),
            phone: Set(request.identity.phone.clone()),
            account_info: Set(request.account_info.clone()),
            rental_date: Set(request.rental_date),
            return_date: Set(request.return_date),
            total_item_cost: Set(costs.total_item_cost),
            deposit: Set(self.deposit),
            total_amount: Set(costs.total_amount),
            status: Set(ApplicationStatus::Pending.as_str().to_string()),
            application_date: Set(now),
            rental_staff: Set(None),
            return_staff: Set(None),
            actual_return_date: Set(None),
            deposit_refunded: Set(false),
            created_at: Set(now),
            updated_at: Set(Some(now)),
            version: Set(1),
        };

        let inserted = model.insert(&txn).await.map_err(|e| {
            error!(error = %e, application_id = %application_id, "failed to insert application");
            ServiceError::DatabaseError(e)
        })?;
        insert_item_rows(&txn, application_id, &selection).await?;
        apply_stock_deltas(&txn, &deltas).await?;

        txn.commit().await.map_err(commit_failed)?;

        info!(application_id = %application_id, "application created");
        self.emit(Event::ApplicationSubmitted(application_id)).await;

        Ok(model_to_response(inserted, selection))
    }

    /// Finds all applications matching an applicant identity tuple, newest
    /// first.
    #[instrument(skip(self, identity), fields(student_id = %identity.student_id))]
    pub async fn find_by_identity(
        &self,
        identity: &ApplicantIdentity,
    ) -> Result<Vec<ApplicationResponse>, ServiceError> {
        identity
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let db = &*self.db_pool;
        let models = RentalApplicationEntity::find()
            .filter(rental_application::Column::ApplicantName.eq(identity.applicant_name.clone()))
            .filter(rental_application::Column::StudentId.eq(identity.student_id.clone()))
            .filter(rental_application::Column::Phone.eq(identity.phone.clone()))
            .order_by_desc(rental_application::Column::ApplicationDate)
            .all(db)
            .await?;

        self.attach_items(db, models).await
    }

    /// Retrieves one application by id.
    #[instrument(skip(self))]
    pub async fn get_application(
        &self,
        application_id: Uuid,
    ) -> Result<Option<ApplicationResponse>, ServiceError> {
        let db = &*self.db_pool;
        let model = RentalApplicationEntity::find_by_id(application_id)
            .one(db)
            .await?;
        match model {
            Some(model) => {
                let items = stored_items(db, application_id).await?;
                Ok(Some(model_to_response(model, items)))
            }
            None => Ok(None),
        }
    }

    /// Applicant self-service edit of dates and items. Allowed only while
    /// the application is PENDING; quantity changes move only the net stock
    /// difference.
    #[instrument(skip(self, request), fields(application_id = %application_id))]
    pub async fn user_edit_application(
        &self,
        application_id: Uuid,
        request: UserEditRequest,
    ) -> Result<ApplicationResponse, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;
        validate_dates(request.rental_date, request.return_date)?;
        validate_selection(&request.items)?;
        let new_selection = to_selected(&request.items);

        let db = &*self.db_pool;
        let now = Utc::now();
        let txn = db.begin().await.map_err(begin_failed)?;

        let model = find_for_identity(&txn, application_id, &request.identity).await?;
        let status = stored_status(&model)?;
        if status != ApplicationStatus::Pending {
            return Err(ServiceError::InvalidTransition(format!(
                "only pending applications can be edited (current status: {})",
                model.status
            )));
        }

        let old_selection = stored_items(&txn, application_id).await?;
        let ids: BTreeSet<Uuid> = old_selection
            .iter()
            .chain(new_selection.iter())
            .map(|s| s.item_id)
            .collect();
        let inventory = load_inventory(&txn, &ids).await?;
        let costs = compute_costs(&new_selection, &price_list_of(&inventory), self.deposit)?;

        let old_state = ReservationState {
            status,
            items: &old_selection,
        };
        let new_state = ReservationState {
            status: ApplicationStatus::Pending,
            items: &new_selection,
        };
        let deltas = reconcile(Some(&old_state), Some(&new_state), &snapshots_of(&inventory))?;

        let version = model.version;
        let mut active: rental_application::ActiveModel = model.into();
        active.rental_date = Set(request.rental_date);
        active.return_date = Set(request.return_date);
        active.total_item_cost = Set(costs.total_item_cost);
        active.deposit = Set(self.deposit);
        active.total_amount = Set(costs.total_amount);
        active.updated_at = Set(Some(now));
        active.version = Set(version + 1);
        let updated = active.update(&txn).await?;

        replace_item_rows(&txn, application_id, &new_selection).await?;
        apply_stock_deltas(&txn, &deltas).await?;

        txn.commit().await.map_err(commit_failed)?;

        info!(application_id = %application_id, "application edited by applicant");
        self.emit(Event::ApplicationUpdated(application_id)).await;

        Ok(model_to_response(updated, new_selection))
    }

    /// Applicant self-service cancellation: full stock release, ledger entry
    /// removed. Allowed only while PENDING.
    #[instrument(skip(self, identity), fields(application_id = %application_id))]
    pub async fn user_cancel_application(
        &self,
        application_id: Uuid,
        identity: &ApplicantIdentity,
    ) -> Result<(), ServiceError> {
        identity
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(begin_failed)?;

        let model = find_for_identity(&txn, application_id, identity).await?;
        let status = stored_status(&model)?;
        if status != ApplicationStatus::Pending {
            return Err(ServiceError::InvalidTransition(format!(
                "only pending applications can be cancelled (current status: {})",
                model.status
            )));
        }

        self.remove_application(&txn, model, status).await?;
        txn.commit().await.map_err(commit_failed)?;

        info!(application_id = %application_id, "application cancelled by applicant");
        self.emit(Event::ApplicationCancelled(application_id)).await;
        Ok(())
    }

    /// Lists applications for the admin review queue, newest first, with an
    /// optional status filter.
    #[instrument(skip(self))]
    pub async fn admin_list_applications(
        &self,
        page: u64,
        per_page: u64,
        status_filter: Option<&str>,
    ) -> Result<ApplicationListResponse, ServiceError> {
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
        if let Some(status) = status_filter {
            if ApplicationStatus::from_str(status).is_none() {
                return Err(ServiceError::ValidationError(format!(
                    "unknown status filter: {}",
                    status
                )));
            }
        }

        let db = &*self.db_pool;
        let mut query = RentalApplicationEntity::find();
        if let Some(status) = status_filter {
            query = query.filter(rental_application::Column::Status.eq(status));
        }
        let paginator = query
            .order_by_desc(rental_application::Column::ApplicationDate)
            .paginate(db, per_page);

        let total = paginator.num_items().await?;
        let models = paginator.fetch_page(page - 1).await?;
        let applications = self.attach_items(db, models).await?;

        Ok(ApplicationListResponse {
            applications,
            total,
            page,
            per_page,
        })
    }

    /// Admin edit: any status, allow-listed fields only. Covers reservation
    /// release when leaving PENDING/RENTED and re-reservation if items are
    /// reintroduced. Transitioning to RETURNED requires an actual return
    /// date.
    #[instrument(skip(self, patch), fields(application_id = %application_id))]
    pub async fn admin_update_application(
        &self,
        application_id: Uuid,
        patch: AdminApplicationPatch,
    ) -> Result<ApplicationResponse, ServiceError> {
        let db = &*self.db_pool;
        let now = Utc::now();
        let txn = db.begin().await.map_err(begin_failed)?;

        let model = RentalApplicationEntity::find_by_id(application_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("application {} not found", application_id))
            })?;

        let old_status = stored_status(&model)?;
        let new_status = match patch.status.as_deref() {
            Some(raw) => ApplicationStatus::from_str(raw).ok_or_else(|| {
                ServiceError::ValidationError(format!("unknown status: {}", raw))
            })?,
            None => old_status,
        };

        let actual_return_date = patch.actual_return_date.or(model.actual_return_date);
        if new_status == ApplicationStatus::Returned && actual_return_date.is_none() {
            return Err(ServiceError::InvalidTransition(
                "transitioning to returned requires actual_return_date".to_string(),
            ));
        }

        let rental_date = patch.rental_date.unwrap_or(model.rental_date);
        let return_date = patch.return_date.unwrap_or(model.return_date);
        validate_dates(rental_date, return_date)?;

        if let Some(items) = &patch.items {
            validate_selection(items)?;
        }

        let old_selection = stored_items(&txn, application_id).await?;
        let new_selection: Vec<SelectedItem> = match &patch.items {
            Some(items) => to_selected(items),
            None => old_selection.clone(),
        };

        let ids: BTreeSet<Uuid> = old_selection
            .iter()
            .chain(new_selection.iter())
            .map(|s| s.item_id)
            .collect();
        let inventory = load_inventory(&txn, &ids).await?;

        // Derived money fields are recomputed from current prices whenever
        // the selection changes; they are never taken from the request.
        let costs = match &patch.items {
            Some(_) => Some(compute_costs(
                &new_selection,
                &price_list_of(&inventory),
                self.deposit,
            )?),
            None => None,
        };

        let old_state = ReservationState {
            status: old_status,
            items: &old_selection,
        };
        let new_state = ReservationState {
            status: new_status,
            items: &new_selection,
        };
        let deltas = reconcile(Some(&old_state), Some(&new_state), &snapshots_of(&inventory))?;

        let version = model.version;
        let old_status_str = model.status.clone();
        let mut active: rental_application::ActiveModel = model.into();
        active.status = Set(new_status.as_str().to_string());
        active.rental_date = Set(rental_date);
        active.return_date = Set(return_date);
        if let Some(account_info) = patch.account_info {
            active.account_info = Set(Some(account_info));
        }
        if let Some(rental_staff) = patch.rental_staff {
            active.rental_staff = Set(Some(rental_staff));
        }
        if let Some(return_staff) = patch.return_staff {
            active.return_staff = Set(Some(return_staff));
        }
        if patch.actual_return_date.is_some() {
            active.actual_return_date = Set(patch.actual_return_date);
        }
        if let Some(deposit_refunded) = patch.deposit_refunded {
            active.deposit_refunded = Set(deposit_refunded);
        }
        if let Some(costs) = costs {
            active.total_item_cost = Set(costs.total_item_cost);
            active.deposit = Set(self.deposit);
            active.total_amount = Set(costs.total_amount);
        }
        active.updated_at = Set(Some(now));
        active.version = Set(version + 1);
        let updated = active.update(&txn).await?;

        if patch.items.is_some() {
            replace_item_rows(&txn, application_id, &new_selection).await?;
        }
        apply_stock_deltas(&txn, &deltas).await?;

        txn.commit().await.map_err(commit_failed)?;

        info!(application_id = %application_id, status = %new_status.as_str(), "application updated by admin");
        if old_status != new_status {
            self.emit(Event::ApplicationStatusChanged {
                application_id,
                old_status: old_status_str,
                new_status: new_status.as_str().to_string(),
            })
            .await;
        }
        self.emit(Event::ApplicationUpdated(application_id)).await;

        Ok(model_to_response(updated, new_selection))
    }

    /// Admin deletion at any status; reserved quantities are released first.
    #[instrument(skip(self), fields(application_id = %application_id))]
    pub async fn admin_delete_application(
        &self,
        application_id: Uuid,
    ) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(begin_failed)?;

        let model = RentalApplicationEntity::find_by_id(application_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("application {} not found", application_id))
            })?;
        let status = stored_status(&model)?;

        self.remove_application(&txn, model, status).await?;
        txn.commit().await.map_err(commit_failed)?;

        info!(application_id = %application_id, "application deleted by admin");
        self.emit(Event::ApplicationDeleted(application_id)).await;
        Ok(())
    }

    /// Releases any reserved stock and removes the ledger row plus its item
    /// entries. Caller owns the transaction.
    async fn remove_application<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: rental_application::Model,
        status: ApplicationStatus,
    ) -> Result<(), ServiceError> {
        let application_id = model.id;
        let selection = stored_items(conn, application_id).await?;

        let ids: BTreeSet<Uuid> = selection.iter().map(|s| s.item_id).collect();
        let inventory = load_inventory(conn, &ids).await?;
        let old_state = ReservationState {
            status,
            items: &selection,
        };
        let deltas = reconcile(Some(&old_state), None, &snapshots_of(&inventory))?;

        ApplicationItemEntity::delete_many()
            .filter(application_item::Column::ApplicationId.eq(application_id))
            .exec(conn)
            .await?;
        RentalApplicationEntity::delete_by_id(application_id)
            .exec(conn)
            .await?;
        apply_stock_deltas(conn, &deltas).await?;
        Ok(())
    }

    async fn attach_items<C: ConnectionTrait>(
        &self,
        conn: &C,
        models: Vec<rental_application::Model>,
    ) -> Result<Vec<ApplicationResponse>, ServiceError> {
        let ids: Vec<Uuid> = models.iter().map(|m| m.id).collect();
        let mut by_application: HashMap<Uuid, Vec<SelectedItem>> = HashMap::new();
        if !ids.is_empty() {
            let rows = ApplicationItemEntity::find()
                .filter(application_item::Column::ApplicationId.is_in(ids))
                .all(conn)
                .await?;
            for row in rows {
                by_application
                    .entry(row.application_id)
                    .or_default()
                    .push(SelectedItem {
                        item_id: row.item_id,
                        quantity: row.quantity,
                    });
            }
        }

        Ok(models
            .into_iter()
            .map(|model| {
                let items = by_application.remove(&model.id).unwrap_or_default();
                model_to_response(model, items)
            })
            .collect())
    }

    async fn emit(&self, event: Event) {
        if let Some(sender) = &self.event_sender {
            if let Err(e) = sender.send(event).await {
                warn!(error = %e, "failed to send domain event");
            }
        }
    }
}

fn begin_failed(e: sea_orm::DbErr) -> ServiceError {
    error!(error = %e, "failed to start transaction");
    ServiceError::DatabaseError(e)
}

fn commit_failed(e: sea_orm::DbErr) -> ServiceError {
    error!(error = %e, "failed to commit transaction");
    ServiceError::DatabaseError(e)
}

fn to_selected(items: &[SelectedItemEntry]) -> Vec<SelectedItem> {
    items
        .iter()
        .map(|entry| SelectedItem {
            item_id: entry.item_id,
            quantity: entry.quantity,
        })
        .collect()
}

fn validate_dates(rental_date: NaiveDate, return_date: NaiveDate) -> Result<(), ServiceError> {
    if return_date < rental_date {
        return Err(ServiceError::ValidationError(
            "return date must not be before rental date".to_string(),
        ));
    }
    Ok(())
}

fn validate_selection(items: &[SelectedItemEntry]) -> Result<(), ServiceError> {
    if items.is_empty() {
        return Err(ServiceError::ValidationError(
            "at least one item must be selected".to_string(),
        ));
    }
    let mut seen = BTreeSet::new();
    for entry in items {
        if entry.quantity <= 0 {
            return Err(ServiceError::ValidationError(format!(
                "quantity for item {} must be positive",
                entry.item_id
            )));
        }
        if !seen.insert(entry.item_id) {
            return Err(ServiceError::ValidationError(format!(
                "item {} is selected more than once",
                entry.item_id
            )));
        }
    }
    Ok(())
}

fn stored_status(model: &rental_application::Model) -> Result<ApplicationStatus, ServiceError> {
    ApplicationStatus::from_str(&model.status).ok_or_else(|| {
        ServiceError::InternalError(format!(
            "application {} has unknown stored status {}",
            model.id, model.status
        ))
    })
}

async fn find_for_identity<C: ConnectionTrait>(
    conn: &C,
    application_id: Uuid,
    identity: &ApplicantIdentity,
) -> Result<rental_application::Model, ServiceError> {
    let model = RentalApplicationEntity::find_by_id(application_id)
        .one(conn)
        .await?;
    // An id that exists under a different identity is reported as not found
    // rather than leaking the application's existence.
    match model {
        Some(model)
            if model.applicant_name == identity.applicant_name
                && model.student_id == identity.student_id
                && model.phone == identity.phone =>
        {
            Ok(model)
        }
        _ => Err(ServiceError::NotFound(format!(
            "application {} not found for applicant",
            application_id
        ))),
    }
}

async fn stored_items<C: ConnectionTrait>(
    conn: &C,
    application_id: Uuid,
) -> Result<Vec<SelectedItem>, ServiceError> {
    let rows = ApplicationItemEntity::find()
        .filter(application_item::Column::ApplicationId.eq(application_id))
        .all(conn)
        .await?;
    Ok(rows
        .into_iter()
        .map(|row| SelectedItem {
            item_id: row.item_id,
            quantity: row.quantity,
        })
        .collect())
}

/// Loads current item rows for the given ids. Missing ids are tolerated
/// here; the cost calculator and the reconciliation engine both fail with
/// `NotFound` if an id they actually need is absent.
async fn load_inventory<C: ConnectionTrait>(
    conn: &C,
    ids: &BTreeSet<Uuid>,
) -> Result<HashMap<Uuid, item::Model>, ServiceError> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let models = ItemEntity::find()
        .filter(item::Column::Id.is_in(ids.iter().copied().collect::<Vec<_>>()))
        .all(conn)
        .await?;
    Ok(models.into_iter().map(|m| (m.id, m)).collect())
}

fn snapshots_of(inventory: &HashMap<Uuid, item::Model>) -> HashMap<Uuid, StockSnapshot> {
    inventory
        .iter()
        .map(|(id, model)| {
            (
                *id,
                StockSnapshot {
                    current_stock: model.current_stock,
                    initial_stock: model.initial_stock,
                },
            )
        })
        .collect()
}

fn price_list_of(inventory: &HashMap<Uuid, item::Model>) -> HashMap<Uuid, Decimal> {
    inventory
        .iter()
        .map(|(id, model)| (*id, model.price))
        .collect()
}

async fn insert_item_rows<C: ConnectionTrait>(
    conn: &C,
    application_id: Uuid,
    selection: &[SelectedItem],
) -> Result<(), ServiceError> {
    let rows: Vec<application_item::ActiveModel> = selection
        .iter()
        .map(|entry| application_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            application_id: Set(application_id),
            item_id: Set(entry.item_id),
            quantity: Set(entry.quantity),
        })
        .collect();
    ApplicationItemEntity::insert_many(rows).exec(conn).await?;
    Ok(())
}

async fn replace_item_rows<C: ConnectionTrait>(
    conn: &C,
    application_id: Uuid,
    selection: &[SelectedItem],
) -> Result<(), ServiceError> {
    ApplicationItemEntity::delete_many()
        .filter(application_item::Column::ApplicationId.eq(application_id))
        .exec(conn)
        .await?;
    insert_item_rows(conn, application_id, selection).await
}

/// Applies the engine's deltas with a per-write conditional guard, so a
/// concurrent commit between snapshot read and write can never drive stock
/// negative or past `initial_stock`.
async fn apply_stock_deltas<C: ConnectionTrait>(
    conn: &C,
    deltas: &BTreeMap<Uuid, i32>,
) -> Result<(), ServiceError> {
    for (item_id, delta) in deltas {
        if *delta < 0 {
            let needed = -delta;
            let result = ItemEntity::update_many()
                .col_expr(
                    item::Column::CurrentStock,
                    Expr::col(item::Column::CurrentStock).add(*delta),
                )
                .filter(item::Column::Id.eq(*item_id))
                .filter(item::Column::CurrentStock.gte(needed))
                .exec(conn)
                .await?;
            if result.rows_affected == 0 {
                let available = ItemEntity::find_by_id(*item_id)
                    .one(conn)
                    .await?
                    .map(|m| m.current_stock)
                    .unwrap_or(0);
                return Err(ServiceError::InsufficientStock {
                    item_id: *item_id,
                    requested: needed,
                    available,
                });
            }
        } else {
            let result = ItemEntity::update_many()
                .col_expr(
                    item::Column::CurrentStock,
                    Expr::col(item::Column::CurrentStock).add(*delta),
                )
                .filter(item::Column::Id.eq(*item_id))
                .filter(
                    Expr::col(item::Column::CurrentStock)
                        .lte(Expr::col(item::Column::InitialStock).sub(*delta)),
                )
                .exec(conn)
                .await?;
            if result.rows_affected == 0 {
                // A concurrent release already pushed the item toward its
                // initial stock; clamp rather than overshoot.
                warn!(item_id = %item_id, delta = delta, "stock release clamped to initial stock");
                ItemEntity::update_many()
                    .col_expr(
                        item::Column::CurrentStock,
                        Expr::col(item::Column::InitialStock).into(),
                    )
                    .filter(item::Column::Id.eq(*item_id))
                    .exec(conn)
                    .await?;
            }
        }
    }
    Ok(())
}

fn model_to_response(
    model: rental_application::Model,
    items: Vec<SelectedItem>,
) -> ApplicationResponse {
    ApplicationResponse {
        id: model.id,
        applicant_name: model.applicant_name,
        student_id: model.student_id,
        phone: model.phone,
        account_info: model.account_info,
        rental_date: model.rental_date,
        return_date: model.return_date,
        items: items
            .into_iter()
            .map(|entry| SelectedItemEntry {
                item_id: entry.item_id,
                quantity: entry.quantity,
            })
            .collect(),
        total_item_cost: model.total_item_cost,
        deposit: model.deposit,
        total_amount: model.total_amount,
        status: model.status,
        application_date: model.application_date,
        rental_staff: model.rental_staff,
        return_staff: model.return_staff,
        actual_return_date: model.actual_return_date,
        deposit_refunded: model.deposit_refunded,
        created_at: model.created_at,
        updated_at: model.updated_at,
        version: model.version,
    }
}
