mod report;
mod sync;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(name = "slsync-cli")]
#[command(about = "SelectLine catalog mirror command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run a catalog sync against the configured SelectLine deployment.
    Sync {
        /// Which phase(s) to run.
        #[arg(value_enum, default_value = "all")]
        target: SyncTarget,
    },
    /// Print mirror counts and anomaly checks; exits non-zero on anomalies.
    Report,
    /// Apply pending database migrations and exit.
    Migrate,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub(crate) enum SyncTarget {
    All,
    Groups,
    Articles,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Sync { target } => sync::run(target).await,
        Commands::Report => report::run().await,
        Commands::Migrate => migrate().await,
    }
}

async fn migrate() -> anyhow::Result<()> {
    let pool = slsync_db::connect_pool_from_env().await?;
    let applied = slsync_db::run_migrations(&pool).await?;
    println!("applied {applied} migration(s)");
    Ok(())
}
