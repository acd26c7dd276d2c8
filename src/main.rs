use actix_web::{web, App, HttpServer};
use clap::Parser;
use intake::api::middleware::Cors;
use intake::cli::{commands::{Cli, Commands}, run_cli};
use intake::config::{AppConfig, PersistenceOwner};
use intake::db::open_store;
use intake::llm::ProviderFactory;
use intake::relay::Relay;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    if !matches!(cli.command, Commands::Serve) {
        if let Err(e) = run_cli(cli.command, cli.config).await {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
        return Ok(());
    }

    info!("Starting intake relay...");

    let config = match AppConfig::load(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let flow = match config.resolve_flow() {
        Ok(f) => f,
        Err(e) => {
            error!("Failed to resolve flow: {}", e);
            std::process::exit(1);
        }
    };

    let provider = match ProviderFactory::create(&config.llm) {
        Some(p) => p,
        None => {
            error!("Failed to initialize LLM provider '{}' from config", config.llm.provider);
            std::process::exit(1);
        }
    };

    info!(
        "Flow '{}' with {} questions, persistence owned by {:?}",
        flow.name,
        flow.questions.len(),
        flow.persistence.owner
    );

    let owner = flow.persistence.owner;
    let mut relay = Relay::new(provider, Arc::new(flow))
        .with_model(config.llm.model.clone(), config.llm.max_tokens);

    if owner == PersistenceOwner::Relay {
        match open_store(&config.store) {
            Ok(store) => relay = relay.with_store(store),
            Err(e) => {
                error!("Failed to initialize application store: {}", e);
                std::process::exit(1);
            }
        }
    }

    let relay = web::Data::new(relay);
    let host = config.server.host.clone();
    let port = config.server.port;
    let allow_origin = config.server.cors_allow_origin.clone();

    info!("Server listening on {}:{}", host, port);

    HttpServer::new(move || {
        App::new()
            .app_data(relay.clone())
            .wrap(Cors::with_origin(&allow_origin))
            .configure(intake::api::routes::configure)
    })
    .bind((host, port))?
    .run()
    .await
}
