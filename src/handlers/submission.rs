// src/handlers/submission.rs

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::i18n::Locale,
    models::submission::{GeneratedImage, SubmissionRequest, SubmissionResponse},
};

// POST /api/generate-fitness-image
//
// Sempre responde 200: o sucesso ou a falha vão no corpo, com o código
// de erro em `code`. A landing page decide o que mostrar a partir dele.
#[utoipa::path(
    post,
    path = "/api/generate-fitness-image",
    tag = "Submission",
    request_body = SubmissionRequest,
    responses(
        (status = 200, description = "Imagem gerada ou envelope de erro com `code`", body = SubmissionResponse)
    ),
    params(
        ("Accept-Language" = Option<String>, Header, description = "Idioma das mensagens (pt padrão, en)")
    )
)]
pub async fn generate_image(
    State(app_state): State<AppState>,
    locale: Locale,
    payload: Result<Json<SubmissionRequest>, JsonRejection>,
) -> Json<SubmissionResponse> {
    match run_submission(&app_state, payload).await {
        Ok(image) => Json(SubmissionResponse::Success(image.into())),
        Err(err) => {
            let failure = err.to_submission_failure(&locale);
            if failure.code >= 500 {
                tracing::error!(code = failure.code, error = %err, "Falha na geração da imagem");
            } else {
                tracing::warn!(code = failure.code, error = %err, "Pedido de geração recusado");
            }
            Json(SubmissionResponse::Failure(failure))
        }
    }
}

async fn run_submission(
    app_state: &AppState,
    payload: Result<Json<SubmissionRequest>, JsonRejection>,
) -> Result<GeneratedImage, AppError> {
    let Json(request) = payload.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
    let input = request.into_input(app_state.max_image_bytes)?;

    app_state.submission_service.submit(input).await
}
