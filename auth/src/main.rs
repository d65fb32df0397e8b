use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use chrono::Duration;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;

use gatehouse_auth::handlers::configure_auth_routes;
use gatehouse_auth::services::{OAuthService, PgAccountStore, ProviderRegistry, SecurityService};
use gatehouse_auth::AppState;
use gatehouse_config::AuthConfig;

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // Load environment variables
    dotenv::dotenv().ok();

    let config = AuthConfig::from_env()?;

    tracing::info!("📊 [Auth Service] Connecting to database...");
    tracing::info!(
        "🔗 [Auth Service] Database URL: {}",
        config.database_url.split('@').last().unwrap_or("hidden")
    );

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await?;
    tracing::info!("✅ [Auth Service] Database connection established");

    let accounts: Arc<PgAccountStore> = Arc::new(PgAccountStore::new(pool.clone()));
    let providers = ProviderRegistry::from_config(&config);
    let state = web::Data::new(AppState {
        accounts: accounts.clone(),
        security: SecurityService::new(
            &config.session_secret,
            Duration::hours(config.token_ttl_hours),
        ),
        oauth: OAuthService::new(
            providers.clone(),
            config.oauth_redirect_uri.clone(),
            accounts,
        ),
        providers,
    });

    let port = config.port;
    println!("🚀 [Auth Service] Starting on port {}", port);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .supports_credentials();

        App::new()
            .app_data(state.clone())
            .app_data(web::Data::new(pool.clone()))
            .wrap(cors)
            .wrap(Logger::default())
            .route("/health", web::get().to(health_check))
            .configure(configure_auth_routes)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await?;

    Ok(())
}

async fn health_check(pool: web::Data<PgPool>) -> actix_web::Result<web::Json<serde_json::Value>> {
    let db_status = match sqlx::query("SELECT 1 as test").fetch_one(pool.get_ref()).await {
        Ok(_) => "connected",
        Err(e) => {
            tracing::error!("[Auth Service] Database health check failed: {}", e);
            "disconnected"
        }
    };

    Ok(web::Json(serde_json::json!({
        "status": "healthy",
        "service": "auth-service",
        "database": db_status,
        "timestamp": chrono::Utc::now()
    })))
}
