// src/bin/seed.rs
// DOCUMENTATION: Bootstrap data for a fresh database
// PURPOSE: Applies migrations, creates the first admin account and the
// default user types. Safe to run more than once.

use anyhow::{bail, Context};
use dotenv::dotenv;
use realty_listings::config::{self, Config};
use realty_listings::db::{NewUser, UserRepository, UserTypeRepository};
use realty_listings::models::Role;
use realty_listings::services::AuthService;
use serde_json::json;
use std::env;

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";

const DEFAULT_USER_TYPES: &[(&str, &str)] = &[
    ("buyer", "Looking to buy a property"),
    ("seller", "Looking to sell a property"),
    ("investor", "Buys properties as an investment"),
];

async fn seed_admin(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let email = env::var("SEED_ADMIN_EMAIL")
        .unwrap_or_else(|_| "admin@example.com".to_string())
        .trim()
        .to_lowercase();
    let name = env::var("SEED_ADMIN_NAME").unwrap_or_else(|_| "Administrator".to_string());
    let password = env::var("SEED_ADMIN_PASSWORD")
        .context("SEED_ADMIN_PASSWORD must be set to create the admin account")?;

    if password.len() < 8 {
        bail!("SEED_ADMIN_PASSWORD must be at least 8 characters");
    }

    if UserRepository::find_by_email(pool, &email).await?.is_some() {
        println!("{}•{} Admin {} already exists, skipping", YELLOW, RESET, email);
        return Ok(());
    }

    let password_hash = AuthService::hash_password(&password)?;
    let admin = UserRepository::create(
        pool,
        &NewUser {
            name: name.trim(),
            email: &email,
            password_hash: &password_hash,
            phone: None,
            role: Role::Admin,
            user_type_id: None,
            custom_fields: json!({}),
        },
    )
    .await?;

    println!("{}✓{} Created admin {} ({})", GREEN, RESET, admin.email, admin.id);
    Ok(())
}

async fn seed_user_types(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    for (name, description) in DEFAULT_USER_TYPES {
        if UserTypeRepository::ensure_exists(pool, name, description).await? {
            println!("{}✓{} Created user type {}", GREEN, RESET, name);
        } else {
            println!("{}•{} User type {} already exists", YELLOW, RESET, name);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = Config::from_env();
    println!("{}{}Seeding database{}", BOLD, CYAN, RESET);

    let pool = config::init_db_pool(&config)
        .await
        .context("failed to connect to the database")?;
    config::run_migrations(&pool)
        .await
        .context("failed to apply migrations")?;

    seed_user_types(&pool).await?;
    seed_admin(&pool).await?;

    println!("{}{}Done{}", BOLD, GREEN, RESET);
    Ok(())
}
