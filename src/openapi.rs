//! OpenAPI document and Swagger UI wiring.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::auth;
use crate::errors::ErrorResponse;
use crate::handlers;
use crate::services::applications::{
    AdminApplicationPatch, ApplicantIdentity, ApplicationListResponse, ApplicationResponse,
    CreateApplicationRequest, SelectedItemEntry, UserEditRequest,
};
use crate::services::catalog::{
    AdminItemPatch, CreateItemRequest, ItemListResponse, ItemResponse,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health,
        auth::login,
        handlers::items::list_items,
        handlers::items::get_item,
        handlers::applications::create_application,
        handlers::applications::lookup_applications,
        handlers::applications::edit_application,
        handlers::applications::cancel_application,
        handlers::admin::list_applications,
        handlers::admin::get_application,
        handlers::admin::update_application,
        handlers::admin::delete_application,
        handlers::admin::create_item,
        handlers::admin::update_item,
        handlers::admin::delete_item,
    ),
    components(schemas(
        ErrorResponse,
        auth::LoginRequest,
        auth::LoginResponse,
        ApplicantIdentity,
        SelectedItemEntry,
        CreateApplicationRequest,
        UserEditRequest,
        AdminApplicationPatch,
        ApplicationResponse,
        ApplicationListResponse,
        CreateItemRequest,
        AdminItemPatch,
        ItemResponse,
        ItemListResponse,
        handlers::health::HealthResponse,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "applications", description = "Applicant-facing rental applications"),
        (name = "items", description = "Public equipment catalog"),
        (name = "admin", description = "Staff console"),
        (name = "auth", description = "Admin authentication"),
        (name = "health", description = "Service health"),
    ),
    info(
        title = "Campus Rental API",
        description = "Equipment rental request and approval workflow with stock reservation",
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Swagger UI mounted at /swagger-ui, serving the generated document.
pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_contains_all_surfaces() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();
        assert!(paths.iter().any(|p| p.as_str() == "/api/v1/applications"));
        assert!(paths
            .iter()
            .any(|p| p.as_str() == "/api/v1/admin/applications/{id}"));
        assert!(paths.iter().any(|p| p.as_str() == "/health"));
    }

    #[test]
    fn bearer_scheme_is_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
