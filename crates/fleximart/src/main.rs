use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use fleximart_core::{
    clean::{clean_customers, clean_products, clean_sales},
    db, extract, load,
    report::QualityReport,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "FlexiMart ETL pipeline", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the extract-transform-load pipeline and write the quality report
    Run(RunArgs),
    /// Run database migrations
    Migrate,
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Directory holding customers_raw.csv, products_raw.csv and sales_raw.csv
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// Where the data quality report is written
    #[arg(long, default_value = "data_quality_report.txt")]
    report: PathBuf,

    /// Also print the report counters as JSON on stdout
    #[arg(long)]
    json: bool,

    /// Clean only; skip the database load stage
    #[arg(long)]
    skip_load: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Migrate => {
            let pool = connect_pool().await?;
            db::run_migrations(&pool).await?;
            info!("Database migrations applied");
            Ok(())
        }
        Command::Run(args) => run_pipeline(args).await,
    }
}

async fn run_pipeline(args: RunArgs) -> Result<()> {
    match execute(&args).await {
        Ok(report) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
            info!(report = %args.report.display(), "ETL completed successfully");
            Ok(())
        }
        Err(err) => {
            // The failure reason is recorded in the report file before the
            // process terminates non-zero.
            let failure = QualityReport::render_failure(&format!("{err:#}"));
            if let Err(write_err) = std::fs::write(&args.report, failure) {
                warn!(error = %write_err, "Could not write failure report");
            }
            error!(error = %err, "ETL run failed");
            Err(err)
        }
    }
}

async fn execute(args: &RunArgs) -> Result<QualityReport> {
    // Connection configuration is a startup concern: fail before any
    // extract or transform work happens.
    let pool = if args.skip_load {
        None
    } else {
        Some(connect_pool().await?)
    };

    let raw = extract::extract_all(&args.data_dir)?;

    let (customers, customer_counters) = clean_customers(&raw.customers);
    let (products, product_counters) = clean_products(&raw.products);
    let (sales, sale_counters) = clean_sales(&raw.sales);

    let mut report = QualityReport {
        customers: customer_counters,
        products: product_counters,
        sales: sale_counters,
        customers_loaded: customers.len(),
        products_loaded: products.len(),
        sales_loaded: sales.len(),
        load: None,
    };

    if let Some(pool) = pool {
        db::run_migrations(&pool).await?;
        let summary = load::load_all(&pool, &customers, &products, &sales).await?;
        info!(
            orders = summary.orders_inserted,
            order_items = summary.order_items_inserted,
            "Loaded facts"
        );
        report.load = Some(summary);
    } else {
        info!("Load stage skipped");
    }

    std::fs::write(&args.report, report.render())
        .with_context(|| format!("failed to write report to {}", args.report.display()))?;

    Ok(report)
}

async fn connect_pool() -> Result<db::DbPool> {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL")
        .or_else(|_| std::env::var("FLEXIMART_DATABASE_URL"))
        .context("DATABASE_URL (or FLEXIMART_DATABASE_URL) must be set")?;
    db::connect(&database_url)
        .await
        .context("failed to connect to the target database")
}
