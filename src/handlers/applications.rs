//! Public applicant-facing application endpoints.
//!
//! No login exists on this surface; lookups and mutations are authorized by
//! presenting the full applicant identity tuple.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::services::applications::{
    ApplicantIdentity, ApplicationResponse, CreateApplicationRequest, UserEditRequest,
};
use crate::AppState;

/// POST /applications — submit a new rental application.
#[utoipa::path(
    post,
    path = "/api/v1/applications",
    request_body = CreateApplicationRequest,
    responses(
        (status = 201, description = "Application created", body = ApplicationResponse),
        (status = 400, description = "Validation failed"),
        (status = 422, description = "Insufficient stock")
    ),
    tag = "applications"
)]
pub async fn create_application(
    State(state): State<AppState>,
    Json(request): Json<CreateApplicationRequest>,
) -> Result<(StatusCode, Json<ApplicationResponse>), ServiceError> {
    let response = state.applications.create_application(request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /applications/lookup — list the caller's applications.
///
/// A POST rather than a GET so the identity tuple travels in the body
/// instead of the query string and server logs.
#[utoipa::path(
    post,
    path = "/api/v1/applications/lookup",
    request_body = ApplicantIdentity,
    responses(
        (status = 200, description = "Matching applications", body = [ApplicationResponse]),
        (status = 400, description = "Validation failed")
    ),
    tag = "applications"
)]
pub async fn lookup_applications(
    State(state): State<AppState>,
    Json(identity): Json<ApplicantIdentity>,
) -> Result<Json<Vec<ApplicationResponse>>, ServiceError> {
    let applications = state.applications.find_by_identity(&identity).await?;
    Ok(Json(applications))
}

/// PUT /applications/:id — applicant edit of a pending application.
#[utoipa::path(
    put,
    path = "/api/v1/applications/{id}",
    params(("id" = Uuid, Path, description = "Application id")),
    request_body = UserEditRequest,
    responses(
        (status = 200, description = "Application updated", body = ApplicationResponse),
        (status = 400, description = "Validation failed or not editable"),
        (status = 404, description = "No application for this applicant"),
        (status = 422, description = "Insufficient stock")
    ),
    tag = "applications"
)]
pub async fn edit_application(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UserEditRequest>,
) -> Result<Json<ApplicationResponse>, ServiceError> {
    let response = state.applications.user_edit_application(id, request).await?;
    Ok(Json(response))
}

/// POST /applications/:id/cancel — applicant cancellation of a pending
/// application.
#[utoipa::path(
    post,
    path = "/api/v1/applications/{id}/cancel",
    params(("id" = Uuid, Path, description = "Application id")),
    request_body = ApplicantIdentity,
    responses(
        (status = 204, description = "Application cancelled"),
        (status = 400, description = "Not cancellable"),
        (status = 404, description = "No application for this applicant")
    ),
    tag = "applications"
)]
pub async fn cancel_application(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(identity): Json<ApplicantIdentity>,
) -> Result<StatusCode, ServiceError> {
    state
        .applications
        .user_cancel_application(id, &identity)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
