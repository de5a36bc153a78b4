// src/db/role_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{common::error::AppError, models::auth::AppRole};

#[async_trait]
pub trait RoleStore: Send + Sync {
    async fn has_role(&self, user_id: Uuid, role: AppRole) -> Result<bool, AppError>;
    async fn grant_role(&self, user_id: Uuid, role: AppRole) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct RoleRepository {
    pool: PgPool,
}

impl RoleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoleStore for RoleRepository {
    async fn has_role(&self, user_id: Uuid, role: AppRole) -> Result<bool, AppError> {
        let found: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM user_roles WHERE user_id = $1 AND role = $2)",
        )
        .bind(user_id)
        .bind(role)
        .fetch_one(&self.pool)
        .await?;

        Ok(found)
    }

    // Idempotente: conceder o mesmo papel duas vezes não é erro.
    async fn grant_role(&self, user_id: Uuid, role: AppRole) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO user_roles (user_id, role) VALUES ($1, $2) ON CONFLICT (user_id, role) DO NOTHING",
        )
        .bind(user_id)
        .bind(role)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
