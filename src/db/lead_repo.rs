// src/db/lead_repo.rs

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::lead::{GenerationRecord, LeadImages, LeadStats, LeadSummary, LeadUpdate, NewGeneration},
};

// Colunas da visão de listagem. As imagens ficam de fora de propósito:
// cada uma é um data URI de vários MB.
const SUMMARY_COLUMNS: &str = "id, email, name, phone, status, photos_generated, \
     salesperson, sale_value, created_at, updated_at";

/// Operações sobre a tabela `leads`. O servidor usa `LeadRepository` (Postgres);
/// os testes usam a versão em memória.
#[async_trait]
pub trait LeadStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<LeadSummary>, AppError>;

    /// Cria o lead ou incrementa o contador e sobrescreve as imagens, numa
    /// única operação atômica que nunca passa de `limit`.
    async fn record_generation(
        &self,
        generation: &NewGeneration,
        limit: i32,
    ) -> Result<GenerationRecord, AppError>;

    /// Mais recentes primeiro.
    async fn list(&self, limit: i64) -> Result<Vec<LeadSummary>, AppError>;

    async fn get_images(&self, id: Uuid) -> Result<Option<LeadImages>, AppError>;

    async fn update_fields(
        &self,
        id: Uuid,
        changes: &LeadUpdate,
    ) -> Result<Option<LeadSummary>, AppError>;

    /// Retorna `true` se alguma linha foi apagada.
    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;

    async fn stats(&self) -> Result<LeadStats, AppError>;
}

#[derive(Clone)]
pub struct LeadRepository {
    pool: PgPool,
}

impl LeadRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct UpsertRow {
    #[sqlx(flatten)]
    lead: LeadSummary,
    inserted: bool,
}

#[async_trait]
impl LeadStore for LeadRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<LeadSummary>, AppError> {
        let sql = format!("SELECT {SUMMARY_COLUMNS} FROM leads WHERE email = $1");
        let lead = sqlx::query_as::<_, LeadSummary>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(lead)
    }

    async fn record_generation(
        &self,
        generation: &NewGeneration,
        limit: i32,
    ) -> Result<GenerationRecord, AppError> {
        // O WHERE do DO UPDATE impede passar do limite mesmo com duas
        // requisições simultâneas para o mesmo e-mail. xmax = 0 só na inserção.
        let sql = format!(
            r#"
            INSERT INTO leads (
                email, name, phone, status, photos_generated, reference_image, generated_image
            )
            VALUES ($1, $2, $3, 'photo_generated', 1, $4, $5)
            ON CONFLICT (email) DO UPDATE SET
                photos_generated = leads.photos_generated + 1,
                reference_image = EXCLUDED.reference_image,
                generated_image = EXCLUDED.generated_image,
                updated_at = NOW()
            WHERE leads.photos_generated < $6
            RETURNING {SUMMARY_COLUMNS}, (xmax = 0) AS inserted
            "#
        );

        let row = sqlx::query_as::<_, UpsertRow>(&sql)
            .bind(&generation.email)
            .bind(&generation.name)
            .bind(&generation.phone)
            .bind(&generation.reference_image)
            .bind(&generation.generated_image)
            .bind(limit)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(UpsertRow { lead, inserted: true }) => Ok(GenerationRecord::Created(lead)),
            Some(UpsertRow { lead, inserted: false }) => Ok(GenerationRecord::Updated(lead)),
            None => {
                let count = self
                    .find_by_email(&generation.email)
                    .await?
                    .map(|lead| lead.photos_generated)
                    .unwrap_or(limit);
                Ok(GenerationRecord::LimitReached { count })
            }
        }
    }

    async fn list(&self, limit: i64) -> Result<Vec<LeadSummary>, AppError> {
        let sql = format!("SELECT {SUMMARY_COLUMNS} FROM leads ORDER BY created_at DESC LIMIT $1");
        let leads = sqlx::query_as::<_, LeadSummary>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(leads)
    }

    async fn get_images(&self, id: Uuid) -> Result<Option<LeadImages>, AppError> {
        let images = sqlx::query_as::<_, LeadImages>(
            "SELECT reference_image, generated_image FROM leads WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(images)
    }

    async fn update_fields(
        &self,
        id: Uuid,
        changes: &LeadUpdate,
    ) -> Result<Option<LeadSummary>, AppError> {
        // Campos anuláveis usam um par (flag, valor) para distinguir
        // "não mexer" de "limpar".
        let sql = format!(
            r#"
            UPDATE leads SET
                name = COALESCE($2, name),
                phone = COALESCE($3, phone),
                status = COALESCE($4, status),
                salesperson = CASE WHEN $5 THEN $6 ELSE salesperson END,
                sale_value = CASE WHEN $7 THEN $8 ELSE sale_value END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {SUMMARY_COLUMNS}
            "#
        );

        let lead = sqlx::query_as::<_, LeadSummary>(&sql)
            .bind(id)
            .bind(changes.name.as_deref())
            .bind(changes.phone.as_deref())
            .bind(changes.status)
            .bind(changes.salesperson.is_some())
            .bind(changes.salesperson.clone().flatten())
            .bind(changes.sale_value.is_some())
            .bind(changes.sale_value.flatten())
            .fetch_optional(&self.pool)
            .await?;

        Ok(lead)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM leads WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn stats(&self) -> Result<LeadStats, AppError> {
        let stats = sqlx::query_as::<_, LeadStats>(
            r#"
            SELECT
                COALESCE(SUM(photos_generated), 0)::BIGINT AS photos_generated,
                COUNT(*) FILTER (WHERE status <> 'photo_generated') AS contacts_made,
                COUNT(*) FILTER (WHERE status = 'sale_completed') AS sales_completed,
                COUNT(*) FILTER (WHERE status = 'sale_lost') AS sales_lost,
                COALESCE(SUM(sale_value) FILTER (WHERE status = 'sale_completed'), 0) AS revenue
            FROM leads
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(stats)
    }
}

// Rodam contra um Postgres de verdade: o #[sqlx::test] cria um banco
// descartável a partir de DATABASE_URL e aplica as migrações.
#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::lead::LeadStatus;
    use rust_decimal::Decimal;

    fn generation(email: &str, tag: &str) -> NewGeneration {
        NewGeneration {
            email: email.to_string(),
            name: "Ana".to_string(),
            phone: "11988887777".to_string(),
            reference_image: format!("data:image/jpeg;base64,{tag}"),
            generated_image: format!("data:image/png;base64,{tag}"),
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn upsert_creates_then_increments_then_stops_at_the_limit(pool: PgPool) {
        let repo = LeadRepository::new(pool);

        let GenerationRecord::Created(first) = repo.record_generation(&generation("a@x.com", "MQ=="), 2).await.unwrap() else {
            panic!("a primeira geração deveria criar o lead");
        };
        assert_eq!(first.photos_generated, 1);
        assert_eq!(first.status, LeadStatus::PhotoGenerated);

        let GenerationRecord::Updated(second) = repo.record_generation(&generation("a@x.com", "Mg=="), 2).await.unwrap() else {
            panic!("a segunda geração deveria atualizar o lead");
        };
        assert_eq!(second.id, first.id);
        assert_eq!(second.photos_generated, 2);
        assert!(second.updated_at > first.updated_at);

        let images = repo.get_images(first.id).await.unwrap().unwrap();
        assert_eq!(images.reference_image.as_deref(), Some("data:image/jpeg;base64,Mg=="));
        assert_eq!(images.generated_image.as_deref(), Some("data:image/png;base64,Mg=="));

        let third = repo.record_generation(&generation("a@x.com", "Mw=="), 2).await.unwrap();
        assert!(matches!(third, GenerationRecord::LimitReached { count: 2 }));

        // A recusa não mexe nas imagens nem no contador.
        let images = repo.get_images(first.id).await.unwrap().unwrap();
        assert_eq!(images.generated_image.as_deref(), Some("data:image/png;base64,Mg=="));
        assert_eq!(repo.find_by_email("a@x.com").await.unwrap().unwrap().photos_generated, 2);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn concurrent_generations_never_pass_the_limit(pool: PgPool) {
        let repo = LeadRepository::new(pool);

        let tasks: Vec<_> = (0..10)
            .map(|i| {
                let repo = repo.clone();
                tokio::spawn(async move {
                    repo.record_generation(&generation("corrida@x.com", &i.to_string()), 3).await
                })
            })
            .collect();

        let mut counted = 0;
        let mut refused = 0;
        for task in tasks {
            match task.await.unwrap().unwrap() {
                GenerationRecord::Created(_) | GenerationRecord::Updated(_) => counted += 1,
                GenerationRecord::LimitReached { count } => {
                    assert_eq!(count, 3);
                    refused += 1;
                }
            }
        }

        assert_eq!((counted, refused), (3, 7));
        let lead = repo.find_by_email("corrida@x.com").await.unwrap().unwrap();
        assert_eq!(lead.photos_generated, 3);
        assert_eq!(repo.list(100).await.unwrap().len(), 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn partial_update_sets_keeps_and_clears_nullable_fields(pool: PgPool) {
        let repo = LeadRepository::new(pool);
        let GenerationRecord::Created(lead) = repo.record_generation(&generation("b@x.com", "MQ=="), 3).await.unwrap() else {
            panic!("lead deveria ser criado");
        };

        let sold = LeadUpdate {
            status: Some(LeadStatus::SaleCompleted),
            salesperson: Some(Some("Carla".to_string())),
            sale_value: Some(Some(Decimal::new(49990, 2))),
            ..LeadUpdate::default()
        };
        let updated = repo.update_fields(lead.id, &sold).await.unwrap().unwrap();
        assert_eq!(updated.status, LeadStatus::SaleCompleted);
        assert_eq!(updated.salesperson.as_deref(), Some("Carla"));
        assert_eq!(updated.sale_value, Some(Decimal::new(49990, 2)));
        assert_eq!(updated.name, "Ana");

        // `Some(None)` limpa o vendedor; `None` deixa o valor da venda como está.
        let clear = LeadUpdate {
            salesperson: Some(None),
            ..LeadUpdate::default()
        };
        let cleared = repo.update_fields(lead.id, &clear).await.unwrap().unwrap();
        assert_eq!(cleared.salesperson, None);
        assert_eq!(cleared.sale_value, Some(Decimal::new(49990, 2)));
        assert_eq!(cleared.status, LeadStatus::SaleCompleted);

        let drop_value = LeadUpdate {
            sale_value: Some(None),
            ..LeadUpdate::default()
        };
        let without_value = repo.update_fields(lead.id, &drop_value).await.unwrap().unwrap();
        assert_eq!(without_value.sale_value, None);

        let missing = repo.update_fields(uuid::Uuid::new_v4(), &clear).await.unwrap();
        assert!(missing.is_none());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn stats_and_delete_follow_the_table(pool: PgPool) {
        let repo = LeadRepository::new(pool);
        let mut ids = Vec::new();
        for email in ["c1@x.com", "c2@x.com", "c3@x.com"] {
            if let GenerationRecord::Created(lead) = repo.record_generation(&generation(email, "MQ=="), 3).await.unwrap() {
                ids.push(lead.id);
            }
        }
        repo.record_generation(&generation("c1@x.com", "Mg=="), 3).await.unwrap();

        let sale = LeadUpdate {
            status: Some(LeadStatus::SaleCompleted),
            sale_value: Some(Some(Decimal::new(49990, 2))),
            ..LeadUpdate::default()
        };
        repo.update_fields(ids[0], &sale).await.unwrap();
        let lost = LeadUpdate {
            status: Some(LeadStatus::SaleLost),
            sale_value: Some(Some(Decimal::new(10000, 2))),
            ..LeadUpdate::default()
        };
        repo.update_fields(ids[1], &lost).await.unwrap();

        let stats = repo.stats().await.unwrap();
        assert_eq!(
            stats,
            LeadStats {
                photos_generated: 4,
                contacts_made: 2,
                sales_completed: 1,
                sales_lost: 1,
                revenue: Decimal::new(49990, 2),
            }
        );

        assert!(repo.delete(ids[2]).await.unwrap());
        assert!(!repo.delete(ids[2]).await.unwrap());
        assert_eq!(repo.list(100).await.unwrap().len(), 2);
    }
}
