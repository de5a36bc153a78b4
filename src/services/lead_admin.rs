// src/services/lead_admin.rs

use std::sync::Arc;

use axum::http::Method;
use uuid::Uuid;

use crate::{
    common::{error::AppError, retry::RetryPolicy},
    db::LeadStore,
    models::lead::{
        DeleteLeadPayload, LeadImages, LeadStats, LeadSummary, LeadUpdate, UpdateLeadPayload,
    },
};

/// Máximo de leads devolvidos pela listagem do painel.
pub const LIST_LIMIT: i64 = 100;

/// Uma requisição ao painel de leads, já interpretada.
#[derive(Debug, Clone, PartialEq)]
pub enum LeadCommand {
    List,
    Stats,
    GetImages { id: Uuid },
    Update { id: Uuid, changes: LeadUpdate },
    Delete { id: Uuid },
}

impl LeadCommand {
    /// Interpreta método + `?action=` + `?id=` + corpo JSON.
    pub fn parse(
        method: &Method,
        action: Option<&str>,
        id: Option<&str>,
        body: &[u8],
    ) -> Result<Self, AppError> {
        match *method {
            Method::GET => match action.unwrap_or("list") {
                "list" => Ok(LeadCommand::List),
                "stats" => Ok(LeadCommand::Stats),
                "get-images" => Ok(LeadCommand::GetImages { id: parse_id(id)? }),
                other => {
                    tracing::debug!(action = %other, "Ação desconhecida no painel de leads");
                    Err(AppError::MethodNotAllowed)
                }
            },
            Method::PATCH => {
                let payload: UpdateLeadPayload = parse_body(body)?;
                let (id, changes) = payload.into_parts();
                let id = id.ok_or_else(missing_id)?;
                changes.validate()?;
                Ok(LeadCommand::Update { id, changes })
            }
            Method::DELETE => {
                // O id pode vir no corpo ou, na falta dele, na query string.
                let from_body = if body.iter().all(u8::is_ascii_whitespace) {
                    None
                } else {
                    parse_body::<DeleteLeadPayload>(body)?.id
                };
                let id = match from_body {
                    Some(id) => id,
                    None => parse_id(id)?,
                };
                Ok(LeadCommand::Delete { id })
            }
            _ => Err(AppError::MethodNotAllowed),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LeadCommand::List => "listar leads",
            LeadCommand::Stats => "estatísticas dos leads",
            LeadCommand::GetImages { .. } => "imagens do lead",
            LeadCommand::Update { .. } => "atualizar lead",
            LeadCommand::Delete { .. } => "excluir lead",
        }
    }
}

fn missing_id() -> AppError {
    AppError::BadRequest("Lead id is required".into())
}

fn parse_id(id: Option<&str>) -> Result<Uuid, AppError> {
    let id = id.map(str::trim).filter(|id| !id.is_empty()).ok_or_else(missing_id)?;
    Uuid::parse_str(id).map_err(|_| AppError::BadRequest(format!("Id de lead inválido: '{}'", id)))
}

fn parse_body<T: serde::de::DeserializeOwned>(body: &[u8]) -> Result<T, AppError> {
    serde_json::from_slice(body).map_err(|e| AppError::BadRequest(format!("JSON inválido: {}", e)))
}

/// O que cada comando devolve.
#[derive(Debug, Clone, PartialEq)]
pub enum LeadReply {
    Leads(Vec<LeadSummary>),
    Stats(LeadStats),
    Images(LeadImages),
    Updated(LeadSummary),
    Deleted,
}

#[derive(Clone)]
pub struct LeadAdminService {
    leads: Arc<dyn LeadStore>,
    retry: RetryPolicy,
}

impl LeadAdminService {
    pub fn new(leads: Arc<dyn LeadStore>, retry: RetryPolicy) -> Self {
        Self { leads, retry }
    }

    pub async fn dispatch(&self, command: LeadCommand) -> Result<LeadReply, AppError> {
        let leads = &self.leads;
        let label = command.label();
        let retry = |e: &AppError| e.is_transient();

        let reply = match command {
            LeadCommand::List => {
                let rows = self
                    .retry
                    .run(label, || leads.list(LIST_LIMIT), retry)
                    .await
                    .map_err(|e| e.into_inner())?;
                LeadReply::Leads(rows)
            }
            LeadCommand::Stats => {
                let stats = self
                    .retry
                    .run(label, || leads.stats(), retry)
                    .await
                    .map_err(|e| e.into_inner())?;
                LeadReply::Stats(stats)
            }
            LeadCommand::GetImages { id } => {
                let images = self
                    .retry
                    .run(label, || leads.get_images(id), retry)
                    .await
                    .map_err(|e| e.into_inner())?
                    .ok_or(AppError::LeadNotFound)?;
                LeadReply::Images(images)
            }
            LeadCommand::Update { id, changes } => {
                let changes = &changes;
                let lead = self
                    .retry
                    .run(label, || leads.update_fields(id, changes), retry)
                    .await
                    .map_err(|e| e.into_inner())?
                    .ok_or(AppError::LeadNotFound)?;
                tracing::info!(lead_id = %lead.id, status = ?lead.status, "Lead atualizado pelo painel");
                LeadReply::Updated(lead)
            }
            LeadCommand::Delete { id } => {
                let removed = self
                    .retry
                    .run(label, || leads.delete(id), retry)
                    .await
                    .map_err(|e| e.into_inner())?;
                if removed {
                    tracing::info!(lead_id = %id, "Lead excluído");
                } else {
                    tracing::info!(lead_id = %id, "Exclusão de lead inexistente ignorada");
                }
                LeadReply::Deleted
            }
        };

        Ok(reply)
    }
}
