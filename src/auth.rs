//! Admin authentication.
//!
//! The public applicant surface is unauthenticated; only the staff console
//! logs in. Credentials are a single configured admin id/secret pair that is
//! exchanged for a short-lived JWT carrying an `admin` role claim.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use axum::Json;
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

use crate::errors::ServiceError;
use crate::AppState;

pub const ADMIN_ROLE: &str = "admin";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Admin id is required"))]
    pub admin_id: String,
    #[validate(length(min = 1, message = "Admin secret is required"))]
    pub admin_secret: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// Issues and validates admin tokens.
#[derive(Clone)]
pub struct AuthService {
    jwt_secret: String,
    jwt_expiration: i64,
    admin_id: String,
    admin_secret: String,
}

impl AuthService {
    pub fn new(
        jwt_secret: String,
        jwt_expiration: i64,
        admin_id: String,
        admin_secret: String,
    ) -> Self {
        Self {
            jwt_secret,
            jwt_expiration,
            admin_id,
            admin_secret,
        }
    }

    pub fn verify_credentials(&self, admin_id: &str, admin_secret: &str) -> bool {
        admin_id == self.admin_id && admin_secret == self.admin_secret
    }

    pub fn issue_admin_token(&self) -> Result<LoginResponse, ServiceError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: self.admin_id.clone(),
            role: ADMIN_ROLE.to_string(),
            iat: now,
            exp: now + self.jwt_expiration,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| ServiceError::InternalError(format!("failed to sign token: {}", e)))?;

        Ok(LoginResponse {
            access_token: token,
            token_type: "Bearer".to_string(),
            expires_in: self.jwt_expiration,
        })
    }

    pub fn validate_token(&self, token: &str) -> Result<Claims, ServiceError> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| ServiceError::Unauthorized(format!("invalid token: {}", e)))?;
        Ok(data.claims)
    }
}

/// POST /auth/login — exchange the configured admin credentials for a JWT.
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = LoginResponse),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "auth"
)]
#[instrument(skip(state, request), fields(admin_id = %request.admin_id))]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ServiceError> {
    request.validate()?;
    if !state
        .auth
        .verify_credentials(&request.admin_id, &request.admin_secret)
    {
        warn!("admin login rejected");
        return Err(ServiceError::Unauthorized(
            "invalid admin credentials".to_string(),
        ));
    }
    let response = state.auth.issue_admin_token()?;
    info!("admin login succeeded");
    Ok(Json(response))
}

/// Route-layer guard for the admin sub-router. Requires a valid bearer token
/// with the admin role; the verified claims are stored in request extensions.
pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServiceError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| ServiceError::Unauthorized("missing authorization header".to_string()))?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ServiceError::Unauthorized("expected a bearer token".to_string()))?;

    let claims = state.auth.validate_token(token)?;
    if claims.role != ADMIN_ROLE {
        return Err(ServiceError::Forbidden(
            "admin role required".to_string(),
        ));
    }

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> AuthService {
        AuthService::new(
            "test-secret-key".to_string(),
            3600,
            "staff".to_string(),
            "hunter2".to_string(),
        )
    }

    #[test]
    fn issued_token_round_trips() {
        let auth = service();
        let response = auth.issue_admin_token().unwrap();
        assert_eq!(response.token_type, "Bearer");

        let claims = auth.validate_token(&response.access_token).unwrap();
        assert_eq!(claims.sub, "staff");
        assert_eq!(claims.role, ADMIN_ROLE);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let token = service().issue_admin_token().unwrap().access_token;
        let other = AuthService::new(
            "different-secret".to_string(),
            3600,
            "staff".to_string(),
            "hunter2".to_string(),
        );
        assert!(matches!(
            other.validate_token(&token),
            Err(ServiceError::Unauthorized(_))
        ));
    }

    #[test]
    fn garbage_token_is_rejected() {
        assert!(service().validate_token("not.a.jwt").is_err());
    }

    #[test]
    fn credential_check() {
        let auth = service();
        assert!(auth.verify_credentials("staff", "hunter2"));
        assert!(!auth.verify_credentials("staff", "wrong"));
        assert!(!auth.verify_credentials("intruder", "hunter2"));
    }
}
