// src/middleware/i18n.rs

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};

// Idioma do visitante, lido do Accept-Language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locale(pub String);

impl Locale {
    pub fn is_english(&self) -> bool {
        self.0 == "en"
    }

    pub fn from_header(header_str: Option<&str>) -> Self {
        // A landing page é brasileira, então o padrão é português.
        let default_lang = "pt".to_string();

        let lang = header_str
            .and_then(|header_str| {
                accept_language::parse(header_str)
                    .first() // Pega o primeiro idioma (ex: "pt-BR")
                    .map(|tag_string| {
                        // "pt-BR" -> "pt", "en" -> "en"
                        tag_string
                            .split('-')
                            .next()
                            .unwrap_or(tag_string)
                            .to_lowercase()
                    })
            })
            .unwrap_or(default_lang);

        Locale(lang)
    }
}

impl<S> FromRequestParts<S> for Locale
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header_str = parts
            .headers
            .get(header::ACCEPT_LANGUAGE)
            .and_then(|header_value| header_value.to_str().ok());

        Ok(Locale::from_header(header_str))
    }
}
