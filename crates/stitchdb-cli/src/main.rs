mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "stitchdb-cli")]
#[command(about = "StitchDB catalog reconciliation command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Import the SanMar pipe-delimited inventory feed.
    ImportSanmar {
        /// Feed file; defaults to the configured drop location.
        #[arg(long)]
        file: Option<PathBuf>,
        /// Restrict the import (and the replaced scope) to one part.
        #[arg(long)]
        style: Option<String>,
    },
    /// Import the S&S Activewear catalog through the paginated API.
    ImportSsCatalog {
        #[arg(long)]
        brand: Option<String>,
        #[arg(long)]
        category: Option<String>,
        /// Stop after this many styles.
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Import S&S Activewear per-warehouse inventory.
    ImportSsInventory {
        /// Restrict to one style part number.
        #[arg(long)]
        style: Option<String>,
    },
    /// Run a cross-supplier search and print the ranked results.
    Search {
        query: String,
        /// Restrict to styles linked to this supplier (repeatable).
        #[arg(long)]
        supplier: Vec<String>,
        /// relevance | supplier | price | stock
        #[arg(long, default_value = "relevance")]
        sort: String,
        #[arg(long)]
        in_stock_only: bool,
        #[arg(long, default_value_t = 25)]
        limit: usize,
        #[arg(long, default_value_t = 0)]
        offset: usize,
    },
    /// Resolve a product bundle for a style number or supplier part id.
    Product { identifier: String },
    /// Run pending database migrations.
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = stitchdb_core::load_app_config()?;
    let pool_config = stitchdb_db::PoolConfig::from_app_config(&config);
    let pool = stitchdb_db::connect_pool(&config.database_url, pool_config).await?;

    match cli.command {
        Commands::ImportSanmar { file, style } => {
            commands::import_sanmar(&config, &pool, file, style.as_deref()).await
        }
        Commands::ImportSsCatalog {
            brand,
            category,
            limit,
        } => commands::import_ss_catalog(&config, &pool, brand, category, limit).await,
        Commands::ImportSsInventory { style } => {
            commands::import_ss_inventory(&config, &pool, style.as_deref()).await
        }
        Commands::Search {
            query,
            supplier,
            sort,
            in_stock_only,
            limit,
            offset,
        } => {
            commands::search(
                &config,
                &pool,
                &query,
                &supplier,
                &sort,
                in_stock_only,
                limit,
                offset,
            )
            .await
        }
        Commands::Product { identifier } => commands::product(&config, &pool, &identifier).await,
        Commands::Migrate => {
            stitchdb_db::run_migrations(&pool).await?;
            println!("migrations applied");
            Ok(())
        }
    }
}
