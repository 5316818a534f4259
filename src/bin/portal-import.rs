use std::path::PathBuf;

use clap::{Parser, Subcommand};
use partner_portal::{
    db::create_orm_conn,
    import::{self, orders::OrderRow, partners::PartnerRow},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "portal-import")]
#[command(about = "Import partners and historical orders from CSV files", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or update partners, their users and wallet balances
    Partners {
        /// CSV file with FIRM NAME, SD AMOUNT and PARTNER NAME columns
        csv: PathBuf,

        /// Password given to newly created partner users
        #[arg(long, env = "IMPORT_DEFAULT_PASSWORD")]
        default_password: String,
    },
    /// Import dispatched orders and their serial numbers
    Orders {
        /// CSV file with Partner, Asset, Dispatched Date and Serial Number columns
        csv: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,partner_portal=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("DATABASE_URL is not set"))?;
    let orm = create_orm_conn(&database_url).await?;

    let report = match cli.command {
        Commands::Partners {
            csv,
            default_password,
        } => {
            let rows: Vec<PartnerRow> = import::read_rows(&csv)?;
            import::partners::import_partners(&orm, rows, &default_password).await?
        }
        Commands::Orders { csv } => {
            let rows: Vec<OrderRow> = import::read_rows(&csv)?;
            import::orders::import_orders(&orm, rows).await?
        }
    };

    println!("Import finished: {report}");
    Ok(())
}
