//! # Mediashare Binary
//!
//! The entry point that assembles the application based on compile-time features.

mod config;

use actix_web::middleware::{NormalizePath, TrailingSlash};
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use ms_api::middleware::{cors_policy, standard_middleware};
use ms_api::AppState;
use std::sync::Arc;

#[cfg(feature = "db-sqlite")]
use ms_db_sqlite::SqliteMediaRepo;

#[cfg(feature = "storage-local")]
use ms_storage_local::LocalMediaStore;

#[cfg(not(all(feature = "db-sqlite", feature = "storage-local")))]
compile_error!("mediashare needs a database backend and a media store; enable `db-sqlite` and `storage-local`");

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let settings = config::Settings::load().context("Failed to load settings")?;
    log::debug!("settings: {settings:?}");

    // 1. Initialize Database Implementation
    #[cfg(feature = "db-sqlite")]
    let repo = SqliteMediaRepo::new(&settings.database_url, settings.max_connections)
        .await
        .with_context(|| format!("Failed to init SQLite at {}", settings.database_url))?;

    // 2. Initialize Storage Implementation
    #[cfg(feature = "storage-local")]
    let store = LocalMediaStore::new(
        settings.upload_dir.clone().into(),
        settings.upload_url_prefix.clone(),
    );
    tokio::fs::create_dir_all(store.root())
        .await
        .with_context(|| format!("Failed to create upload dir {}", settings.upload_dir))?;
    let upload_root = store.root().to_path_buf();

    // 3. Wire the services over the chosen adapters
    let state = web::Data::new(AppState::new(
        Arc::new(repo),
        Arc::new(store),
        settings.max_upload_bytes,
    ));

    let upload_prefix = settings.upload_url_prefix.clone();
    log::info!(
        "Mediashare starting on http://{}:{}",
        settings.bind_addr,
        settings.port
    );

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(NormalizePath::new(TrailingSlash::Trim))
            .wrap(cors_policy())
            .wrap(standard_middleware())
            // Uploaded files are served straight from disk
            .service(actix_files::Files::new(&upload_prefix, upload_root.clone()))
            .configure(ms_api::configure_routes)
    })
    .bind((settings.bind_addr.as_str(), settings.port))
    .with_context(|| format!("Failed to bind {}:{}", settings.bind_addr, settings.port))?
    .run()
    .await?;

    Ok(())
}
