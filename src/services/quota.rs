// src/services/quota.rs

use std::sync::Arc;

use crate::{common::error::AppError, db::LeadStore};

/// Limita quantas fotos um mesmo e-mail pode gerar.
#[derive(Clone)]
pub struct QuotaGuard {
    leads: Arc<dyn LeadStore>,
    limit: i32,
}

impl QuotaGuard {
    pub fn new(leads: Arc<dyn LeadStore>, limit: i32) -> Self {
        Self { leads, limit }
    }

    pub fn limit(&self) -> i32 {
        self.limit
    }

    /// Falha com `LimitReached` se o e-mail já chegou ao limite.
    ///
    /// Se a consulta ao banco falhar, a geração é liberada (fail-open): a
    /// política é preferir disponibilidade a aplicar a cota com rigor. O
    /// upsert atômico ainda impede o contador de passar do limite.
    pub async fn check(&self, email: &str) -> Result<(), AppError> {
        match self.leads.find_by_email(email).await {
            Ok(Some(lead)) if lead.photos_generated >= self.limit => {
                tracing::info!(
                    %email,
                    photos_generated = lead.photos_generated,
                    "Limite de fotos atingido, geração recusada"
                );
                Err(AppError::LimitReached { count: lead.photos_generated })
            }
            Ok(_) => Ok(()),
            Err(e) => {
                tracing::warn!(%email, error = %e, "Falha ao consultar o lead; liberando a geração");
                Ok(())
            }
        }
    }
}
