// src/main.rs
// DOCUMENTATION: Application entry point
// PURPOSE: Initialize config, database, and start HTTP server

use actix_cors::Cors;
use actix_web::{http::header, middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use realty_listings::config::{self, Config};
use realty_listings::errors::{json_error_handler, path_error_handler, query_error_handler};
use realty_listings::handlers;
use realty_listings::services::{AuthRateLimiter, GeocodingClient, ImageHostClient};
use std::io;

#[actix_web::main]
async fn main() -> io::Result<()> {
    // 1. Load environment variables
    dotenv().ok();

    // 2. Load configuration
    let config = Config::from_env();

    // 3. Initialize logging
    if std::env::var("RUST_LOG").is_err() {
        let log_level = if !config.log_level.is_empty() {
            config.log_level.as_str()
        } else {
            "info,actix_web=info,sqlx=warn"
        };
        std::env::set_var("RUST_LOG", log_level);
    }
    env_logger::init();

    if let Err(e) = config.validate() {
        log::error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    log::info!("Starting realty-listings API...");
    log::info!("Environment: {}", config.environment);
    log::info!(
        "Server Address: {}:{}",
        config.server_address,
        config.server_port
    );

    // 4. Initialize database connection pool
    let pool = match config::init_db_pool(&config).await {
        Ok(pool) => pool,
        Err(e) => {
            log::error!("Failed to connect to database: {}", e);
            std::process::exit(1);
        }
    };

    if config.run_migrations {
        if let Err(e) = config::run_migrations(&pool).await {
            log::error!("Failed to run migrations: {}", e);
            std::process::exit(1);
        }
    }

    // 5. Outbound clients and shared limiter
    let geocoder = web::Data::new(GeocodingClient::from_config(&config));
    let image_host = web::Data::new(ImageHostClient::from_config(&config));
    let limiter = web::Data::new(AuthRateLimiter::new(config.auth_rate_limit_per_minute));

    // 6. Start HTTP server
    let server_addr = format!("{}:{}", config.server_address, config.server_port);
    let config_data = web::Data::new(config.clone());
    let pool_data = web::Data::new(pool);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&config_data.cors_origin)
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE"])
            .allowed_headers(vec![header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
            .max_age(3600);

        App::new()
            // Application state
            .app_data(pool_data.clone())
            .app_data(config_data.clone())
            .app_data(geocoder.clone())
            .app_data(image_host.clone())
            .app_data(limiter.clone())
            // Extractor errors share the JSON error envelope
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .app_data(web::QueryConfig::default().error_handler(query_error_handler))
            .app_data(web::PathConfig::default().error_handler(path_error_handler))
            // Middleware
            .wrap(cors)
            .wrap(Logger::default())
            .wrap(actix_web::middleware::Compress::default())
            // Routes
            .configure(handlers::health_config)
            .service(
                web::scope("/api/v1")
                    .configure(handlers::auth_config)
                    .configure(handlers::properties_config)
                    .configure(handlers::contacts_config)
                    .configure(handlers::inquiries_config)
                    .configure(handlers::media_config)
                    .configure(handlers::lookups_config)
                    .configure(handlers::admin_config),
            )
    })
    .bind(&server_addr)?
    .run()
    .await
}
