use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use client_core::{HttpInventoryClient, InventoryApi, InventoryController};
use shared::{
    domain::{MovementKind, ProductId},
    protocol::{ForecastQuery, NewProduct},
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod render;
mod shell;

use config::{load_settings, DEFAULT_SETTINGS_FILE};
use render::{render_forecast, render_product, render_snapshot};

#[derive(Parser, Debug)]
#[command(name = "inventory", about = "Inventory demo client")]
struct Cli {
    /// Base address of the inventory API; overrides settings file and environment.
    #[arg(long, global = true)]
    api_base: Option<String>,
    #[arg(long, global = true, default_value = DEFAULT_SETTINGS_FILE)]
    config: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum KindArg {
    In,
    Out,
}

impl From<KindArg> for MovementKind {
    fn from(value: KindArg) -> Self {
        match value {
            KindArg::In => MovementKind::In,
            KindArg::Out => MovementKind::Out,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch and print the product list.
    List,
    Show {
        product_id: i64,
    },
    Create {
        #[arg(long)]
        sku: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        unit_cost: Option<f64>,
        #[arg(long)]
        selling_price: Option<f64>,
        #[arg(long)]
        min_stock: Option<i64>,
        #[arg(long)]
        reorder_point: Option<i64>,
        #[arg(long)]
        lead_time_days: Option<i64>,
    },
    /// Record a one-unit sale.
    Sale {
        product_id: i64,
    },
    Move {
        product_id: i64,
        #[arg(long, value_enum)]
        kind: KindArg,
        #[arg(long, allow_hyphen_values = true)]
        quantity: i64,
    },
    Forecast {
        product_id: i64,
        #[arg(long, default_value_t = 7)]
        horizon: u32,
    },
    Health,
    /// Interactive session.
    Shell,
}

async fn initialize_or_warn<A: InventoryApi>(controller: &mut InventoryController<A>) {
    if let Err(err) = controller.initialize().await {
        warn!(error = %err, "initial refresh failed");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let settings = load_settings(&cli.config, cli.api_base)?;
    let client = HttpInventoryClient::new(&settings.api_base)
        .context("failed to build inventory api client")?;
    info!(api_base = %client.base_url(), "using inventory api");
    let mut controller = InventoryController::new(client);

    match cli.command {
        Command::List => {
            controller.initialize().await?;
            print!("{}", render_snapshot(controller.snapshot()));
        }
        Command::Show { product_id } => {
            let product = controller.api().get_product(ProductId(product_id)).await?;
            println!("{}", render_product(&product));
        }
        Command::Create {
            sku,
            name,
            category,
            unit_cost,
            selling_price,
            min_stock,
            reorder_point,
            lead_time_days,
        } => {
            initialize_or_warn(&mut controller).await;
            let product = controller
                .submit_product(NewProduct {
                    sku,
                    name,
                    category,
                    unit_cost,
                    selling_price,
                    min_stock,
                    reorder_point,
                    lead_time_days,
                })
                .await?;
            println!("created {}", render_product(&product));
            print!("{}", render_snapshot(controller.snapshot()));
        }
        Command::Sale { product_id } => {
            initialize_or_warn(&mut controller).await;
            let receipt = controller.record_quick_sale(ProductId(product_id)).await?;
            println!("movement {} {}", receipt.id, receipt.status);
            print!("{}", render_snapshot(controller.snapshot()));
        }
        Command::Move {
            product_id,
            kind,
            quantity,
        } => {
            initialize_or_warn(&mut controller).await;
            let receipt = controller
                .record_movement(ProductId(product_id), kind.into(), quantity)
                .await?;
            println!("movement {} {}", receipt.id, receipt.status);
            print!("{}", render_snapshot(controller.snapshot()));
        }
        Command::Forecast {
            product_id,
            horizon,
        } => {
            let forecast = controller
                .api()
                .forecast(ForecastQuery {
                    product_id: ProductId(product_id),
                    horizon,
                })
                .await?;
            print!("{}", render_forecast(&forecast));
        }
        Command::Health => {
            let health = controller.api().health().await?;
            println!("status: {}", health.status);
            if !health.is_ok() {
                anyhow::bail!("backend reported status '{}'", health.status);
            }
        }
        Command::Shell => shell::run_shell(&mut controller).await?,
    }

    Ok(())
}
