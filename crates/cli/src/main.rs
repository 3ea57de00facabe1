//! Whiskers CLI - Database migrations and maintenance tools.
//!
//! # Usage
//!
//! ```bash
//! # Run catalog and session migrations
//! whiskers-cli migrate
//!
//! # Load products from a YAML file
//! whiskers-cli seed --file crates/cli/seed/products.yaml
//!
//! # Re-derive inStock from stockCount for every product
//! whiskers-cli fix-stock
//! ```
//!
//! # Environment Variables
//!
//! - `WHISKERS_DATABASE_URL` - `PostgreSQL` connection string, falls back to
//!   `DATABASE_URL`

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "whiskers-cli")]
#[command(author, version, about = "Whiskers cat shop CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations (catalog tables and session store)
    Migrate,
    /// Insert products from a YAML file, skipping ones that already exist
    Seed {
        /// Path to the YAML product list
        #[arg(short, long, default_value = "crates/cli/seed/products.yaml")]
        file: String,
    },
    /// Recompute the stock flag of every product from its stock count
    FixStock,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { file } => commands::seed::products(&file).await?,
        Commands::FixStock => commands::fix_stock::run().await?,
    }
    Ok(())
}
