//! # groupcast — periodic promo broadcaster for group chats
//!
//! Authenticates a Telegram bot, keeps a roster of the groups it belongs
//! to, and sends one configured message to each group on a per-group
//! cooldown.
//!
//! Usage:
//!   groupcast                      # run the loop
//!   groupcast --once --dry-run     # plan one cycle, send nothing
//!   groupcast --fresh              # forget the saved roster first

use anyhow::Result;
use clap::Parser;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use groupcast_broadcast::{BroadcastEngine, RosterStore, SharedRoster};
use groupcast_core::config::GroupcastConfig;
use groupcast_telegram::{spawn_update_stream, TelegramApi};

#[derive(Parser)]
#[command(
    name = "groupcast",
    version,
    about = "📣 groupcast — periodic promo broadcaster for group chats"
)]
struct Cli {
    /// Config file (default: <state-dir>/config.toml)
    #[arg(short, long)]
    config: Option<String>,

    /// State directory for the config file and saved roster
    #[arg(long)]
    state_dir: Option<String>,

    /// Delete the saved roster before starting
    #[arg(long)]
    fresh: bool,

    /// Run one broadcast cycle and exit
    #[arg(long)]
    once: bool,

    /// Plan cycles without sending anything
    #[arg(long)]
    dry_run: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn expand_path(p: &str) -> String {
    shellexpand::tilde(p).to_string()
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "groupcast=debug,groupcast_core=debug,groupcast_telegram=debug,groupcast_broadcast=debug"
    } else {
        "groupcast=info,groupcast_core=info,groupcast_telegram=info,groupcast_broadcast=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    // Resolve paths
    let state_dir: PathBuf = match &cli.state_dir {
        Some(dir) => PathBuf::from(expand_path(dir)),
        None => GroupcastConfig::state_dir(),
    };
    std::fs::create_dir_all(&state_dir)?;

    // Load config: file (when present), then GROUPCAST_* environment
    let mut config = match &cli.config {
        Some(path) => GroupcastConfig::load_from(Path::new(&expand_path(path)))?,
        None => GroupcastConfig::load_or_default(&state_dir.join("config.toml"))?,
    };
    config.overlay_env();
    config.validate()?;

    // --fresh: forget everything we knew about group membership
    let store = RosterStore::new(&state_dir);
    if cli.fresh {
        store.wipe()?;
        tracing::info!("🧹 removed saved roster");
    }

    // Auth gate — a bad token should fail here, not mid-loop
    let api = TelegramApi::new(&config);
    let me = api
        .get_me()
        .await
        .map_err(|e| anyhow::anyhow!("startup authentication failed: {e}"))?;
    let bot_name = me.username.clone().unwrap_or_else(|| me.first_name.clone());

    // Roster: saved groups plus any operator-configured ids
    let roster = SharedRoster::load(store);
    roster.seed(&config.roster.include).await;

    println!("📣 groupcast v{}", env!("CARGO_PKG_VERSION"));
    println!("   🤖 Bot:        @{bot_name} (token {})", api.token_preview());
    println!("   📒 Roster:     {} group(s)", roster.len().await);
    println!("   📂 State Dir:  {}", state_dir.display());
    println!("   ⏲  Cooldown:   {}s", config.timing.cooldown_secs);
    println!("   🔁 Interval:   {}s", config.timing.check_interval_secs);
    if cli.dry_run {
        println!("   📝 Mode:       dry-run (nothing will be sent)");
    }
    println!();

    // Update poller keeps the roster current while the engine runs
    let mut events = spawn_update_stream(api.clone());
    let event_roster = roster.clone();
    tokio::spawn(async move {
        while let Some(event) = events.next().await {
            event_roster.apply(event).await;
        }
    });

    // Graceful shutdown on Ctrl-C
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("received Ctrl+C, shutting down...");
                let _ = shutdown_tx.send(true);
            }
            Err(e) => tracing::error!("signal handling failed: {e}"),
        }
    });

    let mut engine = BroadcastEngine::new(api, roster, &config).dry_run(cli.dry_run);
    if cli.once {
        let report = engine.run_cycle().await?;
        tracing::info!("📤 cycle done: {report}");
    } else {
        engine.run(shutdown_rx).await;
    }

    tracing::info!("👋 groupcast stopped");
    Ok(())
}
