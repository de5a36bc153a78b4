// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::{
    common::messages::{self, Message},
    middleware::i18n::Locale,
    models::submission::SubmissionFailure,
};

// Erros do cliente do gateway de IA. Cada variante é um tipo de falha distinto,
// e o orquestrador decide o que é retentável a partir dela.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("AI_GATEWAY_API_KEY não configurada")]
    Config,

    #[error("Gateway de IA limitou a taxa de requisições (429)")]
    RateLimited,

    #[error("Créditos do gateway de IA esgotados (402)")]
    QuotaExhausted,

    #[error("Gateway de IA respondeu com status {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("Falha de transporte com o gateway de IA: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("O gateway de IA não retornou nenhuma imagem")]
    NoImageProduced,
}

impl TransformError {
    /// Falhas transitórias: o mesmo pedido pode dar certo numa nova tentativa.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TransformError::RateLimited
                | TransformError::Upstream { .. }
                | TransformError::Transport(_)
                | TransformError::NoImageProduced
        )
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Requisição inválida: {0}")]
    BadRequest(String),

    #[error("Arquivo enviado não é uma imagem válida")]
    InvalidImage,

    #[error("Imagem maior que {max_bytes} bytes")]
    ImageTooLarge { max_bytes: usize },

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido ou ausente")]
    Unauthorized,

    #[error("Acesso restrito a administradores")]
    Forbidden,

    #[error("Lead não encontrado")]
    LeadNotFound,

    #[error("Método não permitido")]
    MethodNotAllowed,

    #[error("Limite de fotos atingido ({count} geradas)")]
    LimitReached { count: i32 },

    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error("Falha ao gerar a imagem após {attempts} tentativas: {last}")]
    GenerationFailed { attempts: u32, last: TransformError },

    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    /// Erros de infraestrutura do banco, que valem uma nova tentativa.
    pub fn is_transient(&self) -> bool {
        matches!(self, AppError::DatabaseError(_))
    }

    /// Converte o erro no envelope do endpoint de geração. Esse endpoint sempre
    /// responde 200; o código vai no corpo.
    pub fn to_submission_failure(&self, locale: &Locale) -> SubmissionFailure {
        let (code, error, message) = match self {
            AppError::ValidationError(_) => (400, "bad_request", Message::InvalidContact),
            AppError::BadRequest(_) => (400, "bad_request", Message::MissingFields),
            AppError::InvalidImage => (400, "bad_request", Message::InvalidImage),
            AppError::ImageTooLarge { max_bytes } => {
                (400, "bad_request", Message::ImageTooLarge { max_bytes: *max_bytes })
            }
            AppError::LimitReached { count } => {
                return SubmissionFailure {
                    code: 403,
                    error: "limit_reached".to_string(),
                    message: messages::text(locale, Message::LimitReached),
                    fotos_geradas: Some(*count),
                    ..SubmissionFailure::default()
                };
            }
            AppError::Transform(TransformError::Config) => {
                (500, "config_error", Message::ConfigError)
            }
            AppError::Transform(TransformError::QuotaExhausted) => {
                (402, "Payment required", Message::QuotaExhausted)
            }
            AppError::Transform(TransformError::RateLimited)
            | AppError::GenerationFailed {
                last: TransformError::RateLimited,
                ..
            } => (429, "Rate limit exceeded", Message::RateLimited),
            AppError::Transform(_) => {
                (500, "generation_failed", Message::GenerationFailed { attempts: 1 })
            }
            AppError::GenerationFailed { attempts, .. } => {
                (500, "generation_failed", Message::GenerationFailed { attempts: *attempts })
            }
            _ => (500, "internal_error", Message::Internal),
        };

        SubmissionFailure {
            code,
            error: error.to_string(),
            message: messages::text(locale, message),
            ..SubmissionFailure::default()
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                let body = Json(json!({
                    "error": "Um ou mais campos são inválidos.",
                    "details": details,
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            AppError::BadRequest(message) => {
                return (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response();
            }
            AppError::InvalidImage => (StatusCode::BAD_REQUEST, "Arquivo enviado não é uma imagem válida."),
            AppError::ImageTooLarge { .. } => (StatusCode::PAYLOAD_TOO_LARGE, "Imagem muito grande."),
            AppError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "E-mail ou senha inválidos."),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized"),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "Forbidden - Admin access required"),
            AppError::LeadNotFound => (StatusCode::NOT_FOUND, "Lead não encontrado."),
            AppError::MethodNotAllowed => (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed"),

            // O resto (banco, JWT, gateway, etc.) vira 500 e fica registrado no log.
            ref e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}
