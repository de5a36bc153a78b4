// src/services/access_gate.rs

use std::sync::Arc;

use crate::{
    common::{error::AppError, retry::RetryPolicy},
    db::{RoleStore, UserStore},
    models::auth::{AppRole, Identity},
    services::auth::AuthService,
};

/// Portão das rotas de administração: token -> identidade -> papel `admin`.
#[derive(Clone)]
pub struct AdminGate {
    auth: AuthService,
    users: Arc<dyn UserStore>,
    roles: Arc<dyn RoleStore>,
    retry: RetryPolicy,
}

impl AdminGate {
    pub fn new(
        auth: AuthService,
        users: Arc<dyn UserStore>,
        roles: Arc<dyn RoleStore>,
        retry: RetryPolicy,
    ) -> Self {
        Self { auth, users, roles, retry }
    }

    /// `bearer` é o token já sem o prefixo "Bearer ".
    pub async fn authorize(&self, bearer: Option<&str>) -> Result<Identity, AppError> {
        // 1. Sem token nem chegamos a consultar papéis
        let Some(token) = bearer.map(str::trim).filter(|token| !token.is_empty()) else {
            tracing::warn!("Acesso ao painel sem token");
            return Err(AppError::Unauthorized);
        };
        let claims = self.auth.verify_token(token)?;

        // 2 e 3. Usuário ainda existe + papel admin, repetindo as duas
        // consultas se o banco oscilar
        let user_id = claims.sub;
        let (users, roles) = (&self.users, &self.roles);
        let access = self
            .retry
            .run(
                "consulta de usuário e papel",
                || async move {
                    let Some(_) = users.find_by_id(user_id).await? else {
                        return Ok::<_, AppError>(None);
                    };
                    roles.has_role(user_id, AppRole::Admin).await.map(Some)
                },
                AppError::is_transient,
            )
            .await
            .map_err(|e| e.into_inner())?;

        match access {
            None => {
                tracing::warn!(user_id = %claims.sub, "Token de um usuário que não existe mais");
                return Err(AppError::Unauthorized);
            }
            Some(false) => {
                tracing::warn!(user_id = %claims.sub, "Usuário sem papel admin tentou acessar os leads");
                return Err(AppError::Forbidden);
            }
            Some(true) => {}
        }

        tracing::debug!(user_id = %claims.sub, "Acesso de admin liberado");
        Ok(Identity { user_id: claims.sub })
    }
}
