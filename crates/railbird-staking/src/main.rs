// crates/railbird-staking/src/main.rs

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use railbird_common::{utils::time, EngineConfig, ManualStaker, NewStake, OFF_APP_USER_ID};
use railbird_staking::{aggregate_partners, StakeLedger};
use railbird_store::open_store;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "railbird-staking", about = "Run a scripted settlement flow")]
struct Args {
    /// Path to an engine config file (JSON); defaults to the memory backend.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = match args.config {
        Some(path) => EngineConfig::from_file(&path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => EngineConfig::default(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_new(&config.log_level)
                .with_context(|| format!("Invalid log level {:?}", config.log_level))?,
        )
        .init();

    let handles = open_store(&config.store)
        .await
        .context("Failed to open store")?;
    let ledger = StakeLedger::new(handles.stakes.clone());

    info!("Running app-to-app settlement flow");
    let stake = ledger
        .create(NewStake {
            session_id: "demo-session-1".into(),
            session_game_name: "Sunday Special".into(),
            session_stakes: "$530 buy-in".into(),
            session_date: Utc::now(),
            is_tournament_session: true,
            staker_user_id: "alice".into(),
            staked_player_user_id: "bob".into(),
            stake_percentage: 0.5,
            markup: 1.2,
            is_off_app_stake: false,
            manual_staker_display_name: None,
            invite_pending: false,
        })
        .await?;
    ledger.update_session_results(&stake.id, 1000.0, 3000.0).await?;
    ledger.mark_ready_for_settlement(&stake.id, "bob").await?;
    ledger.initiate_settlement(&stake.id, "alice").await?;
    let settled = ledger.confirm_settlement(&stake.id, "bob").await?;
    info!(
        "Settled at {}: bob transfers {} to alice",
        time::format_timestamp(&settled.last_updated_at),
        settled.settlement_amount()
    );

    info!("Running manual-stake fast path");
    handles
        .directory
        .upsert_manual_staker(ManualStaker {
            id: "demo-manual-1".into(),
            created_by_user_id: "bob".into(),
            name: "Uncle Ray".into(),
            contact_info: Some("555-0100".into()),
            notes: None,
        })
        .await?;
    let manual = ledger
        .create(NewStake {
            session_id: "demo-session-2".into(),
            session_game_name: "Daily Deepstack".into(),
            session_stakes: "$200 buy-in".into(),
            session_date: Utc::now(),
            is_tournament_session: true,
            staker_user_id: OFF_APP_USER_ID.into(),
            staked_player_user_id: "bob".into(),
            stake_percentage: 0.25,
            markup: 1.0,
            is_off_app_stake: true,
            manual_staker_display_name: Some("Uncle Ray".into()),
            invite_pending: false,
        })
        .await?;
    ledger.update_session_results(&manual.id, 200.0, 0.0).await?;
    ledger.settle_manual_stake(&manual.id, "bob").await?;

    let stakes = ledger.fetch_for_user("bob").await?;
    let directory = handles.directory.manual_stakers_for_user("bob").await?;
    for summary in aggregate_partners("bob", &stakes, &directory) {
        info!(
            "Partner {}: {} stakes, outstanding {:.2}, total {:.2}",
            summary.display_name, summary.stake_count, summary.outstanding_net, summary.total_net
        );
    }

    handles.stakes.close().await?;
    Ok(())
}
