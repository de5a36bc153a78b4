// src/models/lead.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::common::{error::AppError, serde_utils::double_option};

// --- ENUMS ---

// Mapeia o CREATE TYPE lead_status do banco.
// Não é uma máquina de estados: o admin arrasta o card para qualquer coluna.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Hash, ToSchema)]
#[sqlx(type_name = "lead_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    PhotoGenerated,
    ContactMade,
    SaleCompleted,
    SaleLost,
}

// --- LEAD ---

// Visão de listagem: sem as imagens em base64, que são enormes.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow, ToSchema)]
pub struct LeadSummary {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub phone: String,
    pub status: LeadStatus,
    pub photos_generated: i32,
    pub salesperson: Option<String>,
    pub sale_value: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow, ToSchema)]
pub struct LeadImages {
    pub reference_image: Option<String>,
    pub generated_image: Option<String>,
}

// --- GERAÇÃO ---

/// Dados gravados depois de uma geração bem-sucedida.
#[derive(Debug, Clone)]
pub struct NewGeneration {
    pub email: String,
    pub name: String,
    pub phone: String,
    pub reference_image: String,
    pub generated_image: String,
}

/// Resultado do upsert atômico por e-mail.
#[derive(Debug, Clone)]
pub enum GenerationRecord {
    Created(LeadSummary),
    Updated(LeadSummary),
    /// Outra requisição chegou ao limite antes desta.
    LimitReached { count: i32 },
}

// --- ATUALIZAÇÃO PARCIAL ---

/// Campos editáveis pelo painel. `None` = não mexer; `Some(None)` = limpar.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeadUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub status: Option<LeadStatus>,
    pub salesperson: Option<Option<String>>,
    pub sale_value: Option<Option<Decimal>>,
}

impl LeadUpdate {
    pub fn is_empty(&self) -> bool {
        *self == LeadUpdate::default()
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.is_empty() {
            return Err(AppError::BadRequest("Nenhum campo para atualizar.".into()));
        }
        if let Some(Some(value)) = self.sale_value {
            if value.is_sign_negative() {
                return Err(AppError::BadRequest("O valor da venda não pode ser negativo.".into()));
            }
        }
        if matches!(&self.name, Some(name) if name.trim().is_empty()) {
            return Err(AppError::BadRequest("O nome não pode ficar vazio.".into()));
        }
        Ok(())
    }
}

// Corpo do PATCH: { id, ...campos }
#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateLeadPayload {
    pub id: Option<Uuid>,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub status: Option<LeadStatus>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub salesperson: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<f64>)]
    pub sale_value: Option<Option<Decimal>>,
}

impl UpdateLeadPayload {
    pub fn into_parts(self) -> (Option<Uuid>, LeadUpdate) {
        let changes = LeadUpdate {
            name: self.name,
            phone: self.phone,
            status: self.status,
            salesperson: self.salesperson,
            sale_value: self.sale_value,
        };
        (self.id, changes)
    }
}

// Corpo do DELETE: { id }
#[derive(Debug, Deserialize, ToSchema)]
pub struct DeleteLeadPayload {
    pub id: Option<Uuid>,
}

// --- ESTATÍSTICAS DO PAINEL ---

// Os cards do topo do painel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, FromRow, ToSchema)]
pub struct LeadStats {
    pub photos_generated: i64,
    pub contacts_made: i64,
    pub sales_completed: i64,
    pub sales_lost: i64,
    pub revenue: Decimal,
}
