// src/main.rs
// DOCUMENTATION: Application entry point
// PURPOSE: Initialize config, load lens datasets, and start HTTP server

use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use lens_grid::config::Config;
use lens_grid::handlers;
use lens_grid::services::{start_cleanup_task, GridSettings, SampleStore, SearchClient, TileCache};
use std::io;
use std::sync::Arc;

#[actix_web::main]
async fn main() -> io::Result<()> {
    // 1. Load environment variables
    dotenv().ok();

    // 2. Initialize logging before anything can warn
    if std::env::var("RUST_LOG").is_err() {
        let log_level = std::env::var("LOG_LEVEL")
            .ok()
            .filter(|level| !level.trim().is_empty())
            .unwrap_or_else(|| "info,actix_web=info".to_string());
        std::env::set_var("RUST_LOG", log_level);
    }
    env_logger::init();

    // 3. Load configuration
    let config = Config::from_env();
    if let Err(e) = config.validate() {
        log::error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    log::info!("Starting lens-grid service...");
    log::info!("Environment: {} (log level {})", config.environment, config.log_level);
    log::info!(
        "Server Address: {}:{}",
        config.server_address,
        config.server_port
    );

    // 4. Load lens datasets
    let store = web::Data::new(SampleStore::load(&config.data_dir));
    let available = store.stats().iter().filter(|s| s.available).count();
    log::info!(
        "Loaded {} lens datasets from {}",
        available,
        config.data_dir.display()
    );

    let settings = GridSettings::from(&config);
    log::info!(
        "Grid pipeline: bin={}°, merge={}, normalization={}",
        settings.bin_size_deg,
        settings.merge_strategy,
        settings.normalization
    );

    // 5. Initialize tile cache
    let cache = Arc::new(TileCache::new(
        config.tile_cache_capacity,
        config.tile_cache_ttl_secs,
    ));
    log::info!(
        "Initialized tile cache (capacity: {}, TTL: {}s)",
        config.tile_cache_capacity,
        config.tile_cache_ttl_secs
    );

    start_cleanup_task(cache.clone(), config.tile_cache_ttl_secs);

    // 6. Search backend client (shared so the rate limit is global)
    let search_client = web::Data::new(SearchClient::new(
        config.search_backend_url.clone(),
        config.search_timeout_secs,
        config.search_rate_limit_per_sec,
    ));
    log::info!("Search backend: {}", search_client.base_url());

    // 7. Start HTTP server
    let server_addr = format!("{}:{}", config.server_address, config.server_port);
    let config_data = web::Data::new(config);

    HttpServer::new(move || {
        App::new()
            // Application state
            .app_data(store.clone())
            .app_data(web::Data::new(settings))
            .app_data(web::Data::new(cache.clone()))
            .app_data(search_client.clone())
            .app_data(config_data.clone())
            // Middleware
            .wrap(Logger::default())
            .wrap(actix_web::middleware::Compress::default())
            // Routes
            .configure(handlers::health_config)
            .configure(handlers::grid_config)
            .configure(handlers::search_config)
            .configure(handlers::admin_config)
    })
    .bind(&server_addr)?
    .run()
    .await
}
