//! Realtor service backend
//!
//! Loads configuration, prepares the database, and serves the HTTP API.

use actix_cors::Cors;
use actix_web::{http::header, middleware, web, App, HttpResponse, HttpServer};
use anyhow::Context;
use realtor_auth::{JwtService, PasswordService};
use realtor_core::traits::PaymentGateway;
use realtor_core::AppConfig;
use realtor_db::{create_pool, run_migrations};
use realtor_services::{mailer_from_config, StripeGateway};
use std::env;
use std::sync::Arc;
use tracing::info;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Health check endpoint
async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "realtor-service",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Configure API routes
fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(health_check))
            .configure(realtor_api::configure),
    );
}

/// Initialize tracing/logging
fn init_tracing() {
    let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "realtor_service={lvl},realtor_api={lvl},realtor_services={lvl},realtor_db={lvl},\
             realtor_auth={lvl},actix_web=info,sqlx=warn",
            lvl = log_level
        ))
    });

    let registry = tracing_subscriber::registry().with(env_filter);

    if env::var("LOG_FORMAT").map(|f| f == "json").unwrap_or(false) {
        registry.with(fmt::layer().json()).init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .init();
    }
}

/// Reply with the same `{error, message}` shape as `AppError` when a
/// request body or query string does not parse
fn bad_request(kind: &'static str, err: impl std::fmt::Display) -> HttpResponse {
    HttpResponse::BadRequest().json(serde_json::json!({
        "error": kind,
        "message": err.to_string(),
        "status": 400,
    }))
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    init_tracing();

    info!(
        "Starting realtor service v{}",
        env!("CARGO_PKG_VERSION")
    );

    let config = AppConfig::load().context("Failed to load configuration")?;

    let jwt_service = Arc::new(JwtService::new(
        &config.auth.jwt_secret,
        config.auth.jwt_expiration_secs,
    ));
    let password_service = Arc::new(PasswordService::new());
    info!(
        "JWT service configured with {} second token expiration",
        config.auth.jwt_expiration_secs
    );

    let gateway: Arc<dyn PaymentGateway> =
        Arc::new(StripeGateway::new(&config.stripe).context("Failed to configure Stripe")?);
    let mailer = mailer_from_config(&config.mail).context("Failed to configure mail")?;
    info!(
        currency = %config.stripe.currency,
        mail_enabled = config.mail.enabled,
        "External services configured"
    );

    info!("Connecting to database...");
    let pool = create_pool(&config.database)
        .await
        .context("Failed to create database pool")?;
    run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;

    let bind_addr = config.server_addr();
    let workers = config.server.workers;
    info!(
        "Starting HTTP server on {} with {} workers",
        bind_addr, workers
    );

    let cors_origins = config.server.cors_origins.clone();
    let billing = config.billing.clone();
    let mail = config.mail.clone();

    HttpServer::new(move || {
        let cors_origins_inner = cors_origins.clone();
        let cors = Cors::default()
            .allowed_origin_fn(move |origin, _req_head| {
                origin
                    .to_str()
                    .map(|o| cors_origins_inner.split(',').any(|allowed| allowed.trim() == o))
                    .unwrap_or(false)
            })
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                header::AUTHORIZATION,
                header::ACCEPT,
                header::CONTENT_TYPE,
            ])
            .max_age(3600);

        App::new()
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(jwt_service.clone()))
            .app_data(web::Data::new(password_service.clone()))
            .app_data(web::Data::new(gateway.clone()))
            .app_data(web::Data::new(mailer.clone()))
            .app_data(web::Data::new(billing.clone()))
            .app_data(web::Data::new(mail.clone()))
            .app_data(web::JsonConfig::default().error_handler(|err, _req| {
                let response = bad_request("invalid_body", &err);
                actix_web::error::InternalError::from_response(err, response).into()
            }))
            .app_data(web::QueryConfig::default().error_handler(|err, _req| {
                let response = bad_request("invalid_query", &err);
                actix_web::error::InternalError::from_response(err, response).into()
            }))
            .wrap(cors)
            .wrap(TracingLogger::default())
            .wrap(middleware::Compress::default())
            .wrap(middleware::NormalizePath::trim())
            .configure(configure_routes)
    })
    .workers(workers)
    .bind(&bind_addr)
    .with_context(|| format!("Failed to bind {}", bind_addr))?
    .run()
    .await?;

    Ok(())
}
