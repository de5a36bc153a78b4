// src/handlers/leads.rs

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::Method,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::IntoParams;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AdminIdentity,
    models::lead::{LeadImages, LeadStats, LeadSummary, UpdateLeadPayload},
    services::lead_admin::{LeadCommand, LeadReply},
};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LeadQuery {
    /// `list` (padrão), `get-images` ou `stats`.
    pub action: Option<String>,
    pub id: Option<String>,
}

// As respostas de dados vão sempre embrulhadas em { data }.
#[derive(Serialize)]
struct DataEnvelope<T> {
    data: T,
}

impl IntoResponse for LeadReply {
    fn into_response(self) -> Response {
        match self {
            LeadReply::Leads(data) => Json(DataEnvelope { data }).into_response(),
            LeadReply::Stats(data) => Json(DataEnvelope { data }).into_response(),
            LeadReply::Images(data) => Json(DataEnvelope { data }).into_response(),
            LeadReply::Updated(data) => Json(DataEnvelope { data }).into_response(),
            LeadReply::Deleted => Json(json!({ "success": true })).into_response(),
        }
    }
}

// GET | PATCH | DELETE /api/admin-leads
//
// O portão de admin (AdminIdentity) roda antes de qualquer leitura do corpo.
#[utoipa::path(
    method(get, patch, delete),
    path = "/api/admin-leads",
    tag = "Leads",
    params(LeadQuery),
    request_body(
        content = UpdateLeadPayload,
        description = "PATCH: { id, ...campos }. DELETE: { id } (ver DeleteLeadPayload)."
    ),
    responses(
        (status = 200, description = "GET list: { data: LeadSummary[] }", body = Vec<LeadSummary>),
        (status = 200, description = "GET get-images: { data: LeadImages }", body = LeadImages),
        (status = 200, description = "GET stats: { data: LeadStats }", body = LeadStats),
        (status = 400, description = "Id ausente ou corpo inválido"),
        (status = 401, description = "Token ausente ou inválido"),
        (status = 403, description = "Usuário sem papel admin"),
        (status = 404, description = "Lead não encontrado"),
        (status = 405, description = "Método ou ação não suportados")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn admin_leads(
    State(app_state): State<AppState>,
    AdminIdentity(identity): AdminIdentity,
    method: Method,
    Query(query): Query<LeadQuery>,
    body: Bytes,
) -> Result<LeadReply, AppError> {
    let command = LeadCommand::parse(&method, query.action.as_deref(), query.id.as_deref(), &body)?;
    tracing::debug!(user_id = %identity.user_id, command = command.label(), "Comando do painel de leads");

    app_state.lead_admin_service.dispatch(command).await
}
