// src/config.rs

use std::{env, str::FromStr, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    common::retry::RetryPolicy,
    db::{LeadRepository, LeadStore, RoleRepository, RoleStore, UserRepository, UserStore},
    services::{
        access_gate::AdminGate,
        auth::AuthService,
        image_client::{GatewayImageClient, GatewaySettings, ImageTransformer},
        lead_admin::LeadAdminService,
        quota::QuotaGuard,
        submission::SubmissionService,
    },
};

const DEFAULT_GATEWAY_URL: &str = "https://ai.gateway.lovable.dev/v1/chat/completions";
const DEFAULT_IMAGE_MODEL: &str = "google/gemini-2.5-flash-image";

/// Configuração lida do ambiente (e do `.env`, se existir).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub db_max_connections: u32,
    pub generation_limit: i32,
    pub max_image_bytes: usize,
    pub gateway: GatewaySettings,
    pub admin_bootstrap: Option<(String, String)>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL deve ser definida")?;
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET deve ser definido")?;

        // A chave do gateway é opcional aqui: sem ela o servidor sobe e cada
        // geração responde config_error.
        let api_key = env::var("AI_GATEWAY_API_KEY").ok().filter(|key| !key.trim().is_empty());
        if api_key.is_none() {
            tracing::warn!("⚠️ AI_GATEWAY_API_KEY não definida; a geração de imagens vai falhar");
        }

        let gateway = GatewaySettings {
            url: env::var("AI_GATEWAY_URL").unwrap_or_else(|_| DEFAULT_GATEWAY_URL.to_string()),
            api_key,
            model: env::var("AI_IMAGE_MODEL").unwrap_or_else(|_| DEFAULT_IMAGE_MODEL.to_string()),
            timeout: Duration::from_secs(env_or("AI_REQUEST_TIMEOUT_SECS", 120)?),
        };

        let admin_bootstrap = match (
            env::var("ADMIN_BOOTSTRAP_EMAIL").ok(),
            env::var("ADMIN_BOOTSTRAP_PASSWORD").ok(),
        ) {
            (Some(email), Some(password)) => Some((email, password)),
            _ => None,
        };

        Ok(Self {
            database_url,
            jwt_secret,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            db_max_connections: env_or("DB_MAX_CONNECTIONS", 5)?,
            generation_limit: env_or("GENERATION_LIMIT", 3)?,
            max_image_bytes: env_or("MAX_IMAGE_BYTES", 10 * 1024 * 1024)?,
            gateway,
            admin_bootstrap,
        })
    }

    pub async fn connect(&self) -> anyhow::Result<PgPool> {
        let db_pool = PgPoolOptions::new()
            .max_connections(self.db_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&self.database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");
        Ok(db_pool)
    }
}

fn env_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{} inválida ('{}'): {}", key, raw, e)),
        Err(_) => Ok(default),
    }
}

/// Limites e políticas de nova tentativa usados pelos serviços.
#[derive(Debug, Clone, Copy)]
pub struct Policies {
    pub generation_limit: i32,
    pub max_image_bytes: usize,
    /// Gateway de IA: 3 tentativas, 1s fixo.
    pub generation_retry: RetryPolicy,
    /// Papel do admin e operações do painel: 3 tentativas, 500ms linear.
    pub store_retry: RetryPolicy,
}

impl Policies {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            generation_limit: config.generation_limit,
            max_image_bytes: config.max_image_bytes,
            generation_retry: RetryPolicy::fixed(3, Duration::from_secs(1)),
            store_retry: RetryPolicy::linear(3, Duration::from_millis(500)),
        }
    }
}

/// As implementações concretas por trás de cada costura.
pub struct Backends {
    pub leads: Arc<dyn LeadStore>,
    pub users: Arc<dyn UserStore>,
    pub roles: Arc<dyn RoleStore>,
    pub transformer: Arc<dyn ImageTransformer>,
}

impl Backends {
    pub fn postgres(pool: PgPool, gateway: GatewaySettings) -> anyhow::Result<Self> {
        Ok(Self {
            leads: Arc::new(LeadRepository::new(pool.clone())),
            users: Arc::new(UserRepository::new(pool.clone())),
            roles: Arc::new(RoleRepository::new(pool)),
            transformer: Arc::new(GatewayImageClient::new(gateway)?),
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub submission_service: SubmissionService,
    pub lead_admin_service: LeadAdminService,
    pub auth_service: AuthService,
    pub admin_gate: AdminGate,
    pub max_image_bytes: usize,
}

impl AppState {
    // --- Monta o gráfico de dependências ---
    pub fn new(backends: Backends, jwt_secret: String, policies: Policies) -> Self {
        let Backends { leads, users, roles, transformer } = backends;

        let auth_service = AuthService::new(users.clone(), roles.clone(), jwt_secret);
        let admin_gate = AdminGate::new(auth_service.clone(), users, roles, policies.store_retry);

        let quota = QuotaGuard::new(leads.clone(), policies.generation_limit);
        let submission_service =
            SubmissionService::new(quota, transformer, leads.clone(), policies.generation_retry);
        let lead_admin_service = LeadAdminService::new(leads, policies.store_retry);

        Self {
            submission_service,
            lead_admin_service,
            auth_service,
            admin_gate,
            max_image_bytes: policies.max_image_bytes,
        }
    }
}
