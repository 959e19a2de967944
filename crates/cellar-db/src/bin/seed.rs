//! # Seed Data Generator
//!
//! Populates a database with a demo bar catalog, a store tolerance, and one
//! day of manual counts, so the reconciliation flow can be tried end to end.
//!
//! ## Usage
//! ```bash
//! cargo run -p cellar-db --bin cellar-seed
//! cargo run -p cellar-db --bin cellar-seed -- --db ./data/cellar.db --store bar-2
//! ```
//!
//! ## Generated Data
//! - One product per entry in [`CATALOG`], all active and on the count sheet
//!   except the ones marked as draft lines (those are off the count sheet)
//! - Tolerance of 5%
//! - Manual counts dated today for every countable product

use chrono::{Local, Utc};
use std::env;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cellar_core::{CountStatus, ManualCountEntry, Product, DEFAULT_TOLERANCE_PERCENT};
use cellar_db::{generate_id, Database, DbConfig};

/// (code, name, unit, category, counted quantity)
const CATALOG: &[(&str, &str, &str, &str, f64)] = &[
    ("GIN-HEN-700", "Hendrick's Gin 700ml", "bottle", "gin", 4.0),
    ("GIN-TAN-700", "Tanqueray 700ml", "bottle", "gin", 6.0),
    ("WHI-LAG-700", "Lagavulin 16 700ml", "bottle", "whisky", 2.5),
    ("WHI-MAK-700", "Maker's Mark 700ml", "bottle", "whisky", 3.0),
    ("RUM-DIP-700", "Diplomatico Reserva 700ml", "bottle", "rum", 1.75),
    ("VER-CAR-1L", "Carpano Antica 1L", "bottle", "vermouth", 2.0),
    ("BIT-CAM-1L", "Campari 1L", "bottle", "bitter", 3.5),
    ("BEE-LAG-30L", "House Lager 30L", "keg", "beer", 1.4),
    ("BEE-IPA-20L", "Session IPA 20L", "keg", "beer", 0.6),
    ("WIN-PRO-750", "Prosecco DOC 750ml", "bottle", "wine", 12.0),
];

/// Draft lines are poured from kegs and weighed, not counted by hand.
const DRAFT_CATEGORY: &str = "beer";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./cellar_dev.db");
    let mut store_id = String::from("bar-1");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--store" | "-s" => {
                if i + 1 < args.len() {
                    store_id = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Cellar Seed Data Generator");
                println!();
                println!("Usage: cellar-seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>     Database file path (default: ./cellar_dev.db)");
                println!("  -s, --store <ID>    Store to seed (default: bar-1)");
                println!("  -h, --help          Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Cellar Seed Data Generator");
    println!("==========================");
    println!("Database: {}", db_path);
    println!("Store:    {}", store_id);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count(&store_id).await?;
    if existing > 0 {
        println!("⚠ Store already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        return Ok(());
    }

    let now = Utc::now();
    let mut inserted = 0;

    for (code, name, unit, category, _) in CATALOG {
        let count_status = if *category == DRAFT_CATEGORY {
            CountStatus::Inactive
        } else {
            CountStatus::Active
        };

        let product = Product {
            id: generate_id(),
            store_id: store_id.clone(),
            product_code: code.to_string(),
            product_name: name.to_string(),
            unit: Some(unit.to_string()),
            category: Some(category.to_string()),
            active: true,
            count_status,
            created_at: now,
            updated_at: now,
        };

        if let Err(e) = db.products().insert(&product).await {
            eprintln!("Failed to insert {}: {}", code, e);
            continue;
        }
        inserted += 1;
    }

    println!("✓ Inserted {} products", inserted);

    db.settings()
        .set_tolerance(&store_id, DEFAULT_TOLERANCE_PERCENT)
        .await?;
    println!("✓ Tolerance set to {}%", DEFAULT_TOLERANCE_PERCENT);

    let today = Local::now().date_naive();
    let counts: Vec<ManualCountEntry> = CATALOG
        .iter()
        .filter(|(_, _, _, category, _)| *category != DRAFT_CATEGORY)
        .map(|(code, _, _, _, quantity)| ManualCountEntry {
            product_code: code.to_string(),
            quantity: *quantity,
        })
        .collect();

    let written = db
        .manual_counts()
        .upsert_many(&store_id, today, &counts, Some("seed"))
        .await?;
    println!("✓ Recorded {} manual counts for {}", written, today);

    info!(store_id = %store_id, products = inserted, counts = written, "Seed complete");

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Logs go to stderr; `RUST_LOG` overrides the default filter.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,cellar=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
