//! Wallet Monitor - Headless Server
//!
//! Watches registered wallets across EVM, TRON, TON and Solana networks and
//! delivers payment alerts over Telegram.

mod config;

use clap::Parser;
use config::AppConfig;
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use walletwatch_alerts::{TelegramTransport, WalletBot, WalletDb};
use walletwatch_core::{all_networks, mainnet_count};
use walletwatch_engine::{Monitor, MonitorConfig, NotificationDispatcher};
use walletwatch_feeds::{
    AdapterRegistry, CoinGeckoQuoter, FetcherConfig, PriceOracle, ProviderKeys, ResilientFetcher,
    TxLookup,
};

/// Wallet Monitor CLI
#[derive(Parser, Debug)]
#[command(name = "walletwatch")]
#[command(about = "Multi-chain wallet payment monitor", long_about = None)]
struct Args {
    /// Log level: trace, debug, info, warn, error
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Override the SQLite database path from the environment
    #[arg(long)]
    db: Option<String>,

    /// Override the poll interval in seconds
    #[arg(long)]
    poll_seconds: Option<u64>,
}

fn init_logging(level: &str) {
    let level = match level {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");
}

#[tokio::main]
async fn main() {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    init_logging(&args.log_level);

    let mut config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(1);
        }
    };
    if let Some(db) = args.db {
        config.db_path = db;
    }
    if let Some(seconds) = args.poll_seconds {
        config.poll_interval = std::time::Duration::from_secs(seconds);
    }

    info!("🚀 Wallet Monitor starting...");
    info!(
        "  Networks: {} ({} mainnets)",
        all_networks().len(),
        mainnet_count()
    );
    info!("  Poll interval: {}s", config.poll_interval.as_secs());
    info!("  Database: {}", config.db_path);
    if config.etherscan_api_key.is_none() {
        warn!("ETHERSCAN_API_KEY not set, EVM monitoring disabled");
    }
    if config.solscan_api_key.is_none() {
        warn!("SOLSCAN_API_KEY not set, Solana monitoring disabled");
    }

    let db = match WalletDb::connect(&config.database_url()).await {
        Ok(db) => db,
        Err(e) => {
            eprintln!("Failed to open wallet registry: {e}");
            std::process::exit(1);
        }
    };

    let fetcher = match ResilientFetcher::new(FetcherConfig::default()) {
        Ok(fetcher) => Arc::new(fetcher),
        Err(e) => {
            eprintln!("Failed to build HTTP client: {e}");
            std::process::exit(1);
        }
    };

    let registry = Arc::new(AdapterRegistry::new(
        fetcher.clone(),
        ProviderKeys {
            etherscan: config.etherscan_api_key.clone(),
            solscan: config.solscan_api_key.clone(),
        },
    ));
    let oracle = Arc::new(PriceOracle::new(
        Arc::new(CoinGeckoQuoter::new(fetcher.clone())),
        PriceOracle::DEFAULT_TTL,
    ));
    let lookup = Arc::new(TxLookup::new(
        fetcher,
        config.etherscan_api_key.clone(),
        config.solscan_api_key.clone(),
    ));

    let bot = Arc::new(WalletBot::new(
        &config.telegram_token,
        db.clone(),
        registry.clone(),
        lookup,
        config.poll_interval,
    ));
    let transport = Arc::new(TelegramTransport::new(bot.bot().clone()));
    let dispatcher = Arc::new(NotificationDispatcher::new(oracle, transport));

    let monitor = Monitor::new(
        Arc::new(db),
        registry,
        dispatcher,
        MonitorConfig {
            poll_interval: config.poll_interval,
            ..Default::default()
        },
    );
    let monitor_task = tokio::spawn(async move { monitor.run().await });

    info!("✅ Bot online, dispatching commands");
    bot.run().await;

    // The command dispatcher exited (ctrl-c); stop polling too.
    monitor_task.abort();
    info!("Wallet Monitor stopped");
}
