/// Expense Service - Main entry point
/// Serves the GraphQL API plus health and playground endpoints.
use std::sync::Arc;

use actix_web::{web, App, HttpResponse, HttpServer};
use async_graphql::http::GraphiQLSource;
use async_graphql_actix_web::{GraphQLRequest, GraphQLResponse};
use sqlx::postgres::PgPoolOptions;
use tracing::info;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::prelude::*;

use expense_service::config::Config;
use expense_service::db::{CredentialStore, PgStore, RecordStore};
use expense_service::middleware::identity::{IdentityContext, IdentityMiddleware};
use expense_service::schema::{build_schema, AppSchema};
use expense_service::security::lockout::LockoutPolicy;
use expense_service::security::token::SessionTokenCodec;
use expense_service::services::auth::AuthService;
use expense_service::services::email::EmailService;

async fn graphql_handler(
    schema: web::Data<AppSchema>,
    identity: IdentityContext,
    req: GraphQLRequest,
) -> GraphQLResponse {
    schema.execute(req.into_inner().data(identity)).await.into()
}

async fn playground_handler() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(GraphiQLSource::build().endpoint("/graphql").finish())
}

async fn health_handler() -> &'static str {
    "ok"
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,expense_service=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    info!(
        "Starting expense service on {}:{}",
        config.server_host, config.server_port
    );

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    info!("Database connection pool initialized");

    let store = Arc::new(PgStore::new(pool));
    let accounts: Arc<dyn CredentialStore> = store.clone();
    let records: Arc<dyn RecordStore> = store;

    let codec = SessionTokenCodec::new(config.jwt_secret.clone(), config.session_ttl());
    let lockout = LockoutPolicy::new(config.max_login_attempts, config.lock_duration());
    let mailer = EmailService::new(&config)?;
    let auth = AuthService::new(
        accounts.clone(),
        codec.clone(),
        lockout,
        mailer,
        config.bcrypt_cost,
        config.single_use_ttl(),
    );

    let schema = build_schema(auth, accounts, records);

    info!("GraphQL schema initialized");

    let bind_addr = (config.server_host.clone(), config.server_port);
    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(schema.clone()))
            .wrap(IdentityMiddleware::new(codec.clone()))
            .wrap(TracingLogger::default())
            .route("/graphql", web::post().to(graphql_handler))
            .route("/playground", web::get().to(playground_handler))
            .route("/health", web::get().to(health_handler))
    })
    .bind(bind_addr)?
    .run()
    .await?;

    Ok(())
}
