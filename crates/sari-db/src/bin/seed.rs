//! # Seed Data Generator
//!
//! Populates a local database with the demo store for development.
//!
//! ## Usage
//! ```bash
//! # Seed ./sari_dev.db (default)
//! cargo run -p sari-db --bin seed
//!
//! # Specify database path
//! cargo run -p sari-db --bin seed -- --db ./data/sari.db
//!
//! # Overwrite a database that already has data
//! cargo run -p sari-db --bin seed -- --force
//! ```
//!
//! Log verbosity follows `RUST_LOG` (default `info`).

use chrono::Utc;
use std::env;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use sari_core::demo::demo_ledger;
use sari_db::{Database, DbConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn")),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./sari_dev.db");
    let mut force = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--force" | "-f" => force = true,
            "--help" | "-h" => {
                println!("Sari Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./sari_dev.db)");
                println!("  -f, --force        Overwrite existing data");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            other => warn!(argument = %other, "Ignoring unknown argument"),
        }
        i += 1;
    }

    let db = Database::new(DbConfig::new(&db_path)).await?;
    let collections = db.collections();

    if !collections.is_empty().await? && !force {
        warn!(path = %db_path, "Database already has data; pass --force to overwrite");
        return Ok(());
    }

    let now = Utc::now();
    let document = demo_ledger(now).to_document(Some(now));
    collections.write_all(&document, now).await?;

    info!(
        path = %db_path,
        products = document.products.len(),
        sales = document.sales.len(),
        "Seed complete"
    );

    db.close().await;
    Ok(())
}
