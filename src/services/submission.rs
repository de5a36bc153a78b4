// src/services/submission.rs

use std::sync::Arc;

use crate::{
    common::{
        error::{AppError, TransformError},
        retry::{RetryError, RetryPolicy},
    },
    db::LeadStore,
    models::{
        lead::{GenerationRecord, NewGeneration},
        submission::{ContactInfo, GeneratedImage, SubmissionInput},
    },
    services::{image_client::ImageTransformer, quota::QuotaGuard},
};

/// Orquestra cota -> gateway de IA -> gravação do lead.
#[derive(Clone)]
pub struct SubmissionService {
    quota: QuotaGuard,
    transformer: Arc<dyn ImageTransformer>,
    leads: Arc<dyn LeadStore>,
    retry: RetryPolicy,
}

impl SubmissionService {
    pub fn new(
        quota: QuotaGuard,
        transformer: Arc<dyn ImageTransformer>,
        leads: Arc<dyn LeadStore>,
        retry: RetryPolicy,
    ) -> Self {
        Self { quota, transformer, leads, retry }
    }

    pub async fn submit(&self, input: SubmissionInput) -> Result<GeneratedImage, AppError> {
        // 1. Cota por e-mail (antes de gastar crédito no gateway)
        if let Some(contact) = &input.contact {
            self.quota.check(&contact.email).await?;
        }

        // 2. Geração, com novas tentativas para falhas transitórias
        let transformer = &self.transformer;
        let image = &input.image;
        let prompt = input.prompt.as_str();
        let generated = self
            .retry
            .run(
                "gateway de IA",
                || transformer.transform(image, prompt),
                TransformError::is_retryable,
            )
            .await
            .map_err(|err| match err {
                RetryError::Aborted(e) => AppError::Transform(e),
                RetryError::Exhausted { attempts, last } => {
                    tracing::error!(attempts, error = %last, "Não foi possível gerar a imagem");
                    AppError::GenerationFailed { attempts, last }
                }
            })?;

        tracing::info!(mime_type = %generated.mime_type, "Imagem gerada com sucesso");

        // 3. Gravação do lead: melhor esforço, a imagem já está pronta
        if let Some(contact) = input.contact {
            let generation = NewGeneration {
                email: contact.email.clone(),
                name: contact.name.clone(),
                phone: contact.phone.clone(),
                reference_image: input.image.to_data_uri(),
                generated_image: generated.to_data_uri(),
            };
            self.persist_lead(contact, generation).await;
        }

        Ok(generated)
    }

    // Roda numa task separada: se o cliente abandonar a requisição, a gravação
    // termina mesmo assim. Qualquer falha só vai para o log.
    async fn persist_lead(&self, contact: ContactInfo, generation: NewGeneration) {
        let leads = Arc::clone(&self.leads);
        let limit = self.quota.limit();
        let task = tokio::spawn(async move { leads.record_generation(&generation, limit).await });

        match task.await {
            Ok(Ok(GenerationRecord::Created(lead))) => {
                tracing::info!(lead_id = %lead.id, email = %contact.email, "Novo lead criado");
            }
            Ok(Ok(GenerationRecord::Updated(lead))) => {
                tracing::info!(
                    lead_id = %lead.id,
                    photos_generated = lead.photos_generated,
                    "Lead atualizado com a nova geração"
                );
            }
            Ok(Ok(GenerationRecord::LimitReached { count })) => {
                tracing::warn!(
                    email = %contact.email,
                    count,
                    "Limite atingido por uma requisição concorrente; geração não contabilizada"
                );
            }
            Ok(Err(e)) => {
                tracing::error!(email = %contact.email, error = %e, "Falha ao gravar o lead");
            }
            Err(e) => {
                tracing::error!(email = %contact.email, error = %e, "Task de gravação do lead falhou");
            }
        }
    }
}
