// src/models/submission.rs

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::common::error::AppError;

// --- ENTRADA ---

// Corpo enviado pela landing page. Tudo é opcional aqui para que a falta de um
// campo vire o nosso envelope 400, e não a rejeição padrão do extrator Json.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRequest {
    /// Foto em base64, sem o prefixo `data:`.
    pub image_data: Option<String>,
    #[schema(example = "image/jpeg")]
    pub mime_type: Option<String>,
    pub prompt: Option<String>,
    pub user_data: Option<ContactPayload>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ContactPayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: String,
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,
    #[validate(length(min = 1, message = "O telefone é obrigatório."))]
    pub phone: String,
}

/// Contato já validado, com o e-mail normalizado (chave de deduplicação).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactInfo {
    pub name: String,
    pub email: String,
    pub phone: String,
}

impl From<ContactPayload> for ContactInfo {
    fn from(payload: ContactPayload) -> Self {
        Self {
            name: payload.name.trim().to_string(),
            email: normalize_email(&payload.email),
            phone: payload.phone.trim().to_string(),
        }
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl ImageUpload {
    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.bytes)
    }

    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.to_base64())
    }
}

/// Pedido já validado, pronto para o orquestrador.
#[derive(Debug, Clone)]
pub struct SubmissionInput {
    pub image: ImageUpload,
    pub prompt: String,
    pub contact: Option<ContactInfo>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl SubmissionRequest {
    pub fn into_input(self, max_image_bytes: usize) -> Result<SubmissionInput, AppError> {
        let (Some(image_data), Some(mime_type), Some(prompt)) = (
            non_blank(self.image_data),
            non_blank(self.mime_type),
            non_blank(self.prompt),
        ) else {
            return Err(AppError::BadRequest(
                "Missing imageData, mimeType or prompt".into(),
            ));
        };

        let mime_type = mime_type.trim().to_lowercase();
        if !mime_type.starts_with("image/") {
            return Err(AppError::InvalidImage);
        }

        // Aceita também o formato data URL completo que o FileReader gera.
        let encoded = image_data
            .split_once(',')
            .map(|(_, payload)| payload)
            .unwrap_or(&image_data);
        let bytes = BASE64
            .decode(encoded.trim().as_bytes())
            .map_err(|_| AppError::InvalidImage)?;
        if bytes.is_empty() {
            return Err(AppError::InvalidImage);
        }
        if bytes.len() > max_image_bytes {
            return Err(AppError::ImageTooLarge { max_bytes: max_image_bytes });
        }

        let contact = match self.user_data {
            Some(mut payload) => {
                // Espaços em volta do e-mail são comuns em formulários móveis.
                payload.email = normalize_email(&payload.email);
                payload.validate()?;
                Some(ContactInfo::from(payload))
            }
            None => None,
        };

        Ok(SubmissionInput {
            image: ImageUpload { bytes, mime_type },
            prompt,
            contact,
        })
    }
}

// --- SAÍDA ---

/// Imagem devolvida pelo gateway, repassada sem decodificar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub data: String,
    pub mime_type: String,
}

impl GeneratedImage {
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionSuccess {
    pub success: bool,
    pub image_data: String,
    pub mime_type: String,
}

impl From<GeneratedImage> for SubmissionSuccess {
    fn from(image: GeneratedImage) -> Self {
        Self {
            success: true,
            image_data: image.data,
            mime_type: image.mime_type,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionFailure {
    pub success: bool,
    pub code: u16,
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fotos_geradas: Option<i32>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(untagged)]
pub enum SubmissionResponse {
    Success(SubmissionSuccess),
    Failure(SubmissionFailure),
}
