// src/handlers/auth.rs

use axum::{extract::State, Json};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    models::auth::{AuthResponse, LoginUserPayload},
};

// Handler de login do painel
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginUserPayload,
    responses(
        (status = 200, description = "Login realizado", body = AuthResponse),
        (status = 400, description = "Campos inválidos"),
        (status = 401, description = "E-mail ou senha inválidos")
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    Json(payload): Json<LoginUserPayload>,
) -> Result<Json<AuthResponse>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let email = payload.email.trim().to_lowercase();
    let token = app_state.auth_service.login_user(&email, &payload.password).await?;

    Ok(Json(AuthResponse { token }))
}
