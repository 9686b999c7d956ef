//! # Seed Data Generator
//!
//! Populates a database with example discount configurations and taxonomy
//! stamps for development.
//!
//! ## Usage
//! ```bash
//! # Seed ./tierline_dev.db
//! cargo run -p tierline-db --bin seed
//!
//! # Specify database path
//! cargo run -p tierline-db --bin seed -- --db ./data/tierline.db
//!
//! # Or through the environment
//! TIERLINE_DB_PATH=./data/tierline.db cargo run -p tierline-db --bin seed
//! ```
//!
//! ## Seeded Data
//! - Product 100: three custom bands, one of them written with a decimal comma
//! - Product 200: overlapping bands (first match wins)
//! - Product 300: a malformed slot next to a valid one
//! - Stamps for `categories` and `tags`

use chrono::Utc;
use std::env;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tierline_core::{SubjectId, TierSlot};
use tierline_db::{Database, DbConfig, VersionStore};

/// Example configurations: (product id, slots).
fn example_configs() -> Vec<(SubjectId, Vec<TierSlot>)> {
    vec![
        (
            100,
            vec![
                TierSlot::new(1, "2", "9", "5"),
                TierSlot::new(2, "10", "49", "12,5"),
                TierSlot::new(7, "50", "", "20"),
            ],
        ),
        (
            200,
            vec![
                TierSlot::new(1, "1", "100", "10"),
                TierSlot::new(2, "20", "40", "30"),
            ],
        ),
        (
            300,
            vec![
                TierSlot::new(1, "abc", "10", "5"),
                TierSlot::new(2, "11", "20", "7.5"),
            ],
        ),
    ]
}

const SAMPLE_QUANTITIES: &[u32] = &[1, 5, 10, 30, 60, 150, 900];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tierline=debug,sqlx=warn")),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    let mut db_path = env::var("TIERLINE_DB_PATH").unwrap_or_else(|_| "./tierline_dev.db".to_string());

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Tierline Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./tierline_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    info!(path = %db_path, "Seeding database");

    let db = Database::new(DbConfig::new(&db_path)).await?;
    let tiers = db.tiers();

    for (subject_id, slots) in example_configs() {
        let stored = tiers.save_slots(subject_id, &slots).await?;
        println!("✓ Product {}: {} slots stored", subject_id, stored);
    }

    let now = Utc::now().timestamp_millis();
    let versions = db.versions();
    for taxonomy in ["categories", "tags"] {
        let stamp = versions.current_or_init(taxonomy, now).await?;
        println!("✓ Taxonomy '{}' stamp {}", taxonomy, stamp);
    }

    println!();
    println!("Resolved tables:");
    for (subject_id, _) in example_configs().into_iter().chain([(999, Vec::new())]) {
        let table = tiers.load_table(subject_id).await?;
        let resolved: Vec<String> = SAMPLE_QUANTITIES
            .iter()
            .map(|q| format!("{}→{}", q, table.resolve(*q)))
            .collect();
        println!(
            "  {:>4} ({:?}): {}",
            subject_id,
            table.source(),
            resolved.join("  ")
        );
    }

    db.close().await;
    println!();
    println!("✓ Seed complete!");

    Ok(())
}
