// src/services/image_client.rs

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde_json::{json, Value};

use crate::{
    common::error::TransformError,
    models::submission::{GeneratedImage, ImageUpload},
};

const DEFAULT_OUTPUT_MIME: &str = "image/png";

/// Costura com o modelo generativo externo.
#[async_trait]
pub trait ImageTransformer: Send + Sync {
    async fn transform(
        &self,
        image: &ImageUpload,
        prompt: &str,
    ) -> Result<GeneratedImage, TransformError>;
}

#[derive(Debug, Clone)]
pub struct GatewaySettings {
    pub url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub timeout: Duration,
}

/// Cliente do gateway de IA (API no formato chat completions com saída de imagem).
#[derive(Clone)]
pub struct GatewayImageClient {
    http: reqwest::Client,
    settings: GatewaySettings,
}

impl GatewayImageClient {
    pub fn new(settings: GatewaySettings) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(settings.timeout).build()?;
        Ok(Self { http, settings })
    }

    pub fn request_body(model: &str, image: &ImageUpload, prompt: &str) -> Value {
        json!({
            "model": model,
            "messages": [
                {
                    "role": "user",
                    "content": [
                        { "type": "text", "text": prompt },
                        { "type": "image_url", "image_url": { "url": image.to_data_uri() } },
                    ],
                }
            ],
            "modalities": ["image", "text"],
        })
    }
}

#[async_trait]
impl ImageTransformer for GatewayImageClient {
    async fn transform(
        &self,
        image: &ImageUpload,
        prompt: &str,
    ) -> Result<GeneratedImage, TransformError> {
        let Some(api_key) = self.settings.api_key.as_deref().filter(|key| !key.is_empty()) else {
            tracing::error!("AI_GATEWAY_API_KEY não configurada");
            return Err(TransformError::Config);
        };

        tracing::info!(
            model = %self.settings.model,
            input_bytes = image.bytes.len(),
            "Chamando o gateway de IA para gerar a imagem..."
        );

        let response = self
            .http
            .post(&self.settings.url)
            .header(AUTHORIZATION, format!("Bearer {api_key}"))
            .header(CONTENT_TYPE, "application/json")
            .json(&Self::request_body(&self.settings.model, image, prompt))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = truncate(&response.text().await.unwrap_or_default(), 512);
            tracing::error!(status = status.as_u16(), %body, "Erro do gateway de IA");
            return Err(classify_status(status.as_u16(), body));
        }

        let payload: Value = response.json().await?;
        extract_image(&payload)
    }
}

/// Mapeia um status HTTP de erro para o tipo de falha correspondente.
pub fn classify_status(status: u16, body: String) -> TransformError {
    match status {
        429 => TransformError::RateLimited,
        402 => TransformError::QuotaExhausted,
        _ => TransformError::Upstream { status, body },
    }
}

/// Extrai a primeira imagem inline (`data:<mime>;base64,<dados>`) da resposta.
/// URLs http não são aceitas: o payload precisa vir embutido.
pub fn extract_image(payload: &Value) -> Result<GeneratedImage, TransformError> {
    let Some(url) = payload
        .pointer("/choices/0/message/images/0/image_url/url")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|url| url.starts_with("data:"))
    else {
        tracing::warn!("Resposta do gateway sem imagem em data URL");
        return Err(TransformError::NoImageProduced);
    };

    let (meta, data) = url.split_once(',').ok_or(TransformError::NoImageProduced)?;
    if data.trim().is_empty() {
        return Err(TransformError::NoImageProduced);
    }

    let mime_type = meta
        .strip_prefix("data:")
        .and_then(|rest| rest.strip_suffix(";base64"))
        .map(str::trim)
        .filter(|mime| !mime.is_empty())
        .unwrap_or(DEFAULT_OUTPUT_MIME)
        .to_string();

    Ok(GeneratedImage {
        data: data.trim().to_string(),
        mime_type,
    })
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
