//src/main.rs

use axum::{
    extract::DefaultBodyLimit,
    routing::{any, get, post},
    Router,
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;

use crate::config::{AppConfig, AppState, Backends, Policies};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    // Se a configuração ou o banco falharem, a aplicação não deve iniciar.
    let config = AppConfig::from_env()?;
    let db_pool = config.connect().await?;

    sqlx::migrate!().run(&db_pool).await?;
    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    let policies = Policies::from_config(&config);
    let backends = Backends::postgres(db_pool, config.gateway.clone())?;
    let app_state = AppState::new(backends, config.jwt_secret.clone(), policies);

    if let Some((email, password)) = &config.admin_bootstrap {
        app_state.auth_service.ensure_admin(email, password).await?;
    }

    // base64 cresce 4/3, mais a folga do resto do JSON.
    let submission_body_limit = config.max_image_bytes.div_ceil(3) * 4 + 64 * 1024;

    let app = Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route(
            "/api/generate-fitness-image",
            post(handlers::submission::generate_image)
                .layer(DefaultBodyLimit::max(submission_body_limit)),
        )
        .route("/api/auth/login", post(handlers::auth::login))
        // Qualquer método chega ao handler, que responde 405 em JSON para os não suportados.
        .route("/api/admin-leads", any(handlers::leads::admin_leads))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", docs::ApiDoc::openapi()))
        .with_state(app_state);

    let listener = TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
