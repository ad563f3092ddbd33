//! The `sync` subcommand: drives a mirror run from the command line and
//! prints the resulting report as JSON.

use slsync_client::SelectLineClient;
use slsync_sync::{PhaseReport, SyncReport};

use crate::SyncTarget;

pub(crate) async fn run(target: SyncTarget) -> anyhow::Result<()> {
    let config = slsync_core::load_app_config()?;
    let pool = slsync_db::connect_pool(
        &config.database_url,
        slsync_db::PoolConfig::from_app_config(&config),
    )
    .await?;
    slsync_db::run_migrations(&pool).await?;

    let mut client = SelectLineClient::new(config.selectline.clone())?;

    match target {
        SyncTarget::All => {
            let report = slsync_sync::sync_all(&pool, &mut client).await?;
            print_sync_report(&report)?;
        }
        SyncTarget::Groups => {
            let report = slsync_sync::sync_groups(&pool, &mut client).await?;
            print_phase_report("groups", &report)?;
        }
        SyncTarget::Articles => {
            let report = slsync_sync::sync_articles(&pool, &mut client).await?;
            print_phase_report("articles", &report)?;
        }
    }

    Ok(())
}

fn print_sync_report(report: &SyncReport) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}

fn print_phase_report(phase: &str, report: &PhaseReport) -> anyhow::Result<()> {
    let wrapped = serde_json::json!({ phase: report });
    println!("{}", serde_json::to_string_pretty(&wrapped)?);
    Ok(())
}
