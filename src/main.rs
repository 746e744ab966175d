use actix::prelude::*;
use actix_web::middleware::{Logger, NormalizePath, TrailingSlash};
use actix_web::{web::Data, App, HttpServer};
use anyhow::Context as AnyhowContext;
use log_error::LogError;
use std::env;
use std::sync::Arc;
use subscription_service::config::Config;
use subscription_service::subscription::repository::PostgresSubscriptionRepository;
use subscription_types::subscription::repository::SubscriptionRepository;
use subscription_types::subscription::service::SubscriptionService;

#[actix_web::main]
async fn main() -> Result<(), anyhow::Error> {
    match std::fs::File::open(".env") {
        Ok(_) => envmnt::load_file(".env")?,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => {
            return Err(anyhow::anyhow!("Unable to open .env file: {err}"));
        }
    }

    let config_path = envmnt::get_or("CONFIG_PATH", "config.yaml");
    let loaded = Config::load(&config_path)?;
    let config_missing = loaded.is_none();
    let mut config = loaded.unwrap_or_default();
    config.apply_env()?;

    if let Err(env::VarError::NotPresent) = env::var("RUST_LOG") {
        env::set_var("RUST_LOG", &config.logging.level);
    }
    pretty_env_logger::formatted_timed_builder()
        .parse_default_env()
        .init();

    if config_missing {
        log::warn!("Config file {config_path} not found, using defaults");
    }

    log::info!(
        "Connecting to postgres host={} port={} user={} db={}",
        config.database.host,
        config.database.port,
        config.database.user,
        config.database.name
    );
    let (mut client, connection) = tokio_postgres::connect(
        &config.database.connection_string(),
        tokio_postgres::NoTls,
    )
    .await
    .context("Unable to connect to postgres db")?;
    tokio::spawn(async move {
        connection.await.log_error("Postgres connection error");
    });
    log::info!("Successfully connected to PostgreSQL");

    subscription_service::migrations::runner()
        .run_async(&mut client)
        .await?;

    let client = Arc::new(client);
    let subscription_repository: Arc<dyn SubscriptionRepository> =
        Arc::new(PostgresSubscriptionRepository::new(client));
    let service = SubscriptionService::new(subscription_repository).start();

    let host = config.server.host.as_str();
    let port = config.server.port;
    log::info!("Starting server on {host}:{port}");
    HttpServer::new(move || {
        App::new()
            .wrap(NormalizePath::new(TrailingSlash::Trim))
            .wrap(Logger::default())
            .app_data(Data::new(service.clone()))
            .configure(subscription_service::configure)
    })
    .bind((host, port))
    .with_context(|| format!("Failed to bind server to {host}:{port}. Is the port already in use?"))?
    .run()
    .await?;
    Ok(())
}
