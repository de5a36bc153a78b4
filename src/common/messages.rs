// src/common/messages.rs

use crate::middleware::i18n::Locale;

// Mensagens exibidas ao visitante da landing page. O público é brasileiro,
// então qualquer idioma diferente de "en" recebe o texto em português.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    MissingFields,
    InvalidImage,
    ImageTooLarge { max_bytes: usize },
    InvalidContact,
    ConfigError,
    RateLimited,
    QuotaExhausted,
    LimitReached,
    GenerationFailed { attempts: u32 },
    Internal,
}

pub fn text(locale: &Locale, message: Message) -> String {
    if locale.is_english() {
        english(message)
    } else {
        portuguese(message)
    }
}

// Tamanho legível: "10MB", "512KB" ou "900 bytes".
fn readable_size(bytes: usize) -> String {
    const MB: usize = 1024 * 1024;
    if bytes >= MB && bytes % MB == 0 {
        format!("{}MB", bytes / MB)
    } else if bytes >= 1024 && bytes % 1024 == 0 {
        format!("{}KB", bytes / 1024)
    } else {
        format!("{bytes} bytes")
    }
}

fn portuguese(message: Message) -> String {
    let text = match message {
        Message::MissingFields => "Campos obrigatórios ausentes: imageData, mimeType ou prompt.",
        Message::InvalidImage => "Por favor, selecione apenas arquivos de imagem.",
        Message::ImageTooLarge { max_bytes } => {
            return format!("Imagem muito grande. Tamanho máximo: {}.", readable_size(max_bytes));
        }
        Message::InvalidContact => "Por favor, preencha nome, e-mail válido e telefone.",
        Message::ConfigError => "Gateway de IA não configurado.",
        Message::RateLimited => "Limite de uso da API atingido. Aguarde alguns minutos.",
        Message::QuotaExhausted => "Créditos esgotados no gateway de IA. Adicione créditos para continuar.",
        Message::LimitReached => "Você já atingiu o limite de fotos geradas para este e-mail.",
        Message::GenerationFailed { attempts: 1 } => {
            "Não foi possível gerar a imagem. Tente com outra foto."
        }
        Message::GenerationFailed { attempts } => {
            return format!(
                "Não foi possível gerar a imagem após {attempts} tentativas. Tente com outra foto."
            );
        }
        Message::Internal => "Erro inesperado. Tente novamente.",
    };
    text.to_string()
}

fn english(message: Message) -> String {
    let text = match message {
        Message::MissingFields => "Missing imageData, mimeType or prompt.",
        Message::InvalidImage => "Please select an image file.",
        Message::ImageTooLarge { max_bytes } => {
            return format!("Image too large. Maximum size: {}.", readable_size(max_bytes));
        }
        Message::InvalidContact => "Please provide a name, a valid email and a phone number.",
        Message::ConfigError => "AI gateway key not configured.",
        Message::RateLimited => "API rate limit reached. Please wait a few minutes.",
        Message::QuotaExhausted => "AI gateway credits exhausted. Add credits to continue.",
        Message::LimitReached => "You have reached the photo limit for this email.",
        Message::GenerationFailed { attempts: 1 } => {
            "The image could not be generated. Try another photo."
        }
        Message::GenerationFailed { attempts } => {
            return format!(
                "The image could not be generated after {attempts} attempts. Try another photo."
            );
        }
        Message::Internal => "Unexpected error. Please try again.",
    };
    text.to_string()
}
