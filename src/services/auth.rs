// src/services/auth.rs

use std::sync::Arc;

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{RoleStore, UserStore},
    models::auth::{AppRole, Claims},
};

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    roles: Arc<dyn RoleStore>,
    jwt_secret: String,
    token_ttl: chrono::Duration,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, roles: Arc<dyn RoleStore>, jwt_secret: String) -> Self {
        Self {
            users,
            roles,
            jwt_secret,
            token_ttl: chrono::Duration::days(7),
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }

    #[cfg(test)]
    pub fn with_bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost;
        self
    }

    pub async fn login_user(&self, email: &str, password: &str) -> Result<String, AppError> {
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let password_clone = password.to_owned();
        let password_hash_clone = user.password_hash.clone();

        // Executa a verificação em um thread separado
        let is_password_valid =
            tokio::task::spawn_blocking(move || verify(&password_clone, &password_hash_clone))
                .await
                .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !is_password_valid {
            return Err(AppError::InvalidCredentials);
        }

        tracing::info!(user_id = %user.id, "Login realizado");
        self.create_token(user.id)
    }

    /// Garante que existe um administrador com este e-mail. Usado na
    /// inicialização a partir de ADMIN_BOOTSTRAP_EMAIL/PASSWORD.
    pub async fn ensure_admin(&self, email: &str, password: &str) -> Result<Uuid, AppError> {
        let user = match self.users.find_by_email(email).await? {
            Some(user) => user,
            None => {
                let password_clone = password.to_owned();
                let cost = self.bcrypt_cost;
                let hashed_password =
                    tokio::task::spawn_blocking(move || hash(&password_clone, cost))
                        .await
                        .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;

                let user = self.users.create_user(email, &hashed_password).await?;
                tracing::info!(user_id = %user.id, "👤 Administrador inicial criado");
                user
            }
        };

        self.roles.grant_role(user.id, AppRole::Admin).await?;
        Ok(user.id)
    }

    /// Só confere assinatura e expiração. Se o usuário ainda existe é
    /// problema de quem chama.
    pub fn verify_token(&self, token: &str) -> Result<Claims, AppError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|e| {
            tracing::debug!(error = %e, "Token rejeitado");
            AppError::Unauthorized
        })?;

        Ok(token_data.claims)
    }

    pub fn create_token(&self, user_id: Uuid) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + self.token_ttl;

        let claims = Claims {
            sub: user_id,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }
}
