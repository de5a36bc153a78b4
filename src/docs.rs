// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Landing page ---
        handlers::submission::generate_image,

        // --- Auth ---
        handlers::auth::login,

        // --- Leads ---
        handlers::leads::admin_leads,
    ),
    components(
        schemas(
            // --- Submission ---
            models::submission::SubmissionRequest,
            models::submission::ContactPayload,
            models::submission::SubmissionResponse,
            models::submission::SubmissionSuccess,
            models::submission::SubmissionFailure,

            // --- Auth ---
            models::auth::LoginUserPayload,
            models::auth::AuthResponse,

            // --- Leads ---
            models::lead::LeadStatus,
            models::lead::LeadSummary,
            models::lead::LeadImages,
            models::lead::LeadStats,
            models::lead::UpdateLeadPayload,
            models::lead::DeleteLeadPayload,
        )
    ),
    tags(
        (name = "Submission", description = "Geração da foto fitness e captura de leads"),
        (name = "Auth", description = "Login do painel"),
        (name = "Leads", description = "Kanban e indicadores de leads (somente admin)")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
