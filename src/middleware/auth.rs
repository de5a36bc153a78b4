// src/middleware/auth.rs

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
    RequestPartsExt,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};

use crate::{common::error::AppError, config::AppState, models::auth::Identity};

// Extrator das rotas de administração: só devolve a identidade se o token
// for válido e o usuário tiver o papel admin.
#[derive(Debug, Clone)]
pub struct AdminIdentity(pub Identity);

impl<S> FromRequestParts<S> for AdminIdentity
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);

        // Cabeçalho ausente ou fora do formato "Bearer <token>" contam como sem token.
        let bearer = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .ok();

        let identity = app_state
            .admin_gate
            .authorize(bearer.as_ref().map(|header| header.0.token()))
            .await?;

        Ok(AdminIdentity(identity))
    }
}
