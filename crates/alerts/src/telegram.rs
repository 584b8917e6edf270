//! Telegram bot handlers.

use crate::db::WalletDb;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;
use thiserror::Error;
use tracing::info;
use walletwatch_core::{
    find_network, mainnet_count, search_networks, short, validate_address, NetworkDescriptor,
    NetworkFamily, Wallet,
};
use walletwatch_engine::{DeliveryError, MessageTransport};
use walletwatch_feeds::{extract_tx_hash, AdapterRegistry, TxLookup};

#[derive(Error, Debug)]
pub enum TelegramError {
    #[error("Telegram API error: {0}")]
    Api(#[from] teloxide::RequestError),
    #[error("Database error: {0}")]
    Db(#[from] crate::db::DbError),
}

/// Bot commands.
#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "Start the bot")]
    Start,
    #[command(description = "Add a wallet. Usage: /add ethereum 0x... cold-storage")]
    Add(String),
    #[command(description = "List your wallets")]
    Wallets,
    #[command(description = "Remove a wallet. Usage: /remove 3")]
    Remove(String),
    #[command(description = "Search supported networks. Usage: /networks polygon")]
    Networks(String),
    #[command(description = "Look up a transaction by hash or explorer link")]
    TxInfo(String),
    #[command(description = "Show monitoring statistics")]
    Stats,
    #[command(description = "Show help")]
    Help,
}

/// Delivery channel the engine pushes notifications through.
#[derive(Clone)]
pub struct TelegramTransport {
    bot: Bot,
}

impl TelegramTransport {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl MessageTransport for TelegramTransport {
    async fn send(&self, recipient: i64, text: &str) -> Result<(), DeliveryError> {
        self.bot
            .send_message(ChatId(recipient), text)
            .await
            .map_err(|e| DeliveryError::Send(e.to_string()))?;
        Ok(())
    }
}

/// Telegram bot wrapper.
pub struct WalletBot {
    bot: Bot,
    db: WalletDb,
    registry: Arc<AdapterRegistry>,
    lookup: Arc<TxLookup>,
    poll_interval: Duration,
}

impl WalletBot {
    pub fn new(
        token: &str,
        db: WalletDb,
        registry: Arc<AdapterRegistry>,
        lookup: Arc<TxLookup>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            bot: Bot::new(token),
            db,
            registry,
            lookup,
            poll_interval,
        }
    }

    /// The underlying bot handle, for building the notification transport.
    pub fn bot(&self) -> &Bot {
        &self.bot
    }

    /// Run the command dispatcher until shutdown.
    pub async fn run(self: Arc<Self>) {
        let bot = self.bot.clone();
        let handler = Update::filter_message().filter_command::<Command>().endpoint(
            move |bot: Bot, msg: Message, cmd: Command| {
                let this = Arc::clone(&self);
                async move { this.handle_command(bot, msg, cmd).await }
            },
        );

        Dispatcher::builder(bot, handler)
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;
    }

    async fn handle_command(
        &self,
        bot: Bot,
        msg: Message,
        cmd: Command,
    ) -> Result<(), TelegramError> {
        let chat_id = msg.chat.id;
        let owner_id = chat_id.0;

        match cmd {
            Command::Start => {
                let text = format!(
                    "👋 Multi-Chain Wallet Monitor\n\n\
                     I watch your wallets across {} networks and alert you on \
                     every incoming payment.\n\n\
                     /add — register a wallet\n\
                     /wallets — list your wallets\n\
                     /networks — search supported networks\n\
                     /txinfo — look up any transaction\n\
                     /stats — monitoring statistics\n\
                     /help — all commands",
                    mainnet_count(),
                );
                bot.send_message(chat_id, text).await?;
            }

            Command::Add(args) => {
                let text = match parse_add_args(&args) {
                    Err(usage) => usage.to_string(),
                    Ok((network_query, address, label)) => {
                        match resolve_network(&network_query) {
                            NetworkMatch::None => format!(
                                "❌ Unknown network \"{network_query}\".\n\
                                 Try /networks {network_query} to search."
                            ),
                            NetworkMatch::Ambiguous(candidates) => format!(
                                "Several networks match \"{network_query}\":\n{}\n\n\
                                 Use the exact key, e.g. /add {} {address}",
                                render_network_matches(&candidates),
                                candidates[0].key,
                            ),
                            NetworkMatch::One(network) => {
                                self.register_wallet(owner_id, network, &address, &label)
                                    .await?
                            }
                        }
                    }
                };
                bot.send_message(chat_id, text).await?;
            }

            Command::Wallets => {
                let wallets = self.db.wallets_for_owner(owner_id).await?;
                bot.send_message(chat_id, render_wallet_list(&wallets)).await?;
            }

            Command::Remove(args) => {
                let text = match args.trim().parse::<i64>() {
                    Err(_) => "Usage: /remove <id>\nFind the id with /wallets".to_string(),
                    Ok(wallet_id) => {
                        if self.db.remove_wallet(wallet_id, owner_id).await? {
                            info!(owner_id, wallet_id, "wallet removed");
                            "🗑 Wallet deleted.".to_string()
                        } else {
                            "❌ No wallet with that id.".to_string()
                        }
                    }
                };
                bot.send_message(chat_id, text).await?;
            }

            Command::Networks(query) => {
                let text = if query.trim().is_empty() {
                    format!(
                        "🌐 {} networks supported ({} mainnets).\n\n\
                         Search with /networks <name>, e.g. /networks arbitrum",
                        walletwatch_core::all_networks().len(),
                        mainnet_count(),
                    )
                } else {
                    let matches = search_networks(&query);
                    if matches.is_empty() {
                        format!("❌ No network matches \"{}\".", query.trim())
                    } else {
                        format!("🌐 Matching networks:\n{}", render_network_matches(&matches))
                    }
                };
                bot.send_message(chat_id, text).await?;
            }

            Command::TxInfo(args) => {
                let text = match extract_tx_hash(&args) {
                    None => "Usage: /txinfo <tx hash or explorer link>".to_string(),
                    Some(tx_hash) => self.lookup.describe(&tx_hash).await,
                };
                bot.send_message(chat_id, text).await?;
            }

            Command::Stats => {
                let yours = self.db.wallets_for_owner(owner_id).await?.len();
                let total = self.db.count_all().await?;
                let text = format!(
                    "📊 Statistics\n\n\
                     Your wallets: {yours}\n\
                     Total monitored: {total}\n\
                     Supported networks: {}\n\
                     Poll interval: {}s",
                    walletwatch_core::all_networks().len(),
                    self.poll_interval.as_secs(),
                );
                bot.send_message(chat_id, text).await?;
            }

            Command::Help => {
                bot.send_message(chat_id, Command::descriptions().to_string())
                    .await?;
            }
        }

        Ok(())
    }

    /// Validate, baseline and persist a new wallet, returning the reply text.
    async fn register_wallet(
        &self,
        owner_id: i64,
        network: &'static NetworkDescriptor,
        address: &str,
        label: &str,
    ) -> Result<String, TelegramError> {
        if !validate_address(address, network.family) {
            return Ok(format!(
                "❌ Invalid address for {}.\n\nExpected format:\n • {}",
                network.display_name,
                address_format_hint(network.family),
            ));
        }

        let baseline = match self.registry.for_network(network) {
            Some(adapter) => adapter.latest_tx(network, address).await,
            None => String::new(),
        };

        if !self
            .db
            .add_wallet(owner_id, network.key, address, label, &baseline)
            .await?
        {
            return Ok("❌ This wallet is already being monitored.".to_string());
        }

        info!(owner_id, network = network.key, address = %short(address), "wallet added");

        let mut text = format!(
            "✅ Wallet added!\n\n\
             🏷 Label: {label}\n\
             🌐 Network: {}\n\
             📍 Address: {}\n\
             💎 Native: {}\n\n",
            network.display_name,
            short(address),
            network.native_symbol,
        );
        text.push_str(if baseline.is_empty() {
            "⚠️ No baseline — will alert on ALL transactions\n"
        } else {
            "✅ Baseline set — monitoring new transactions\n"
        });
        text.push_str("\n🔔 You'll receive alerts for incoming payments!");
        Ok(text)
    }
}

enum NetworkMatch {
    One(&'static NetworkDescriptor),
    Ambiguous(Vec<&'static NetworkDescriptor>),
    None,
}

fn resolve_network(query: &str) -> NetworkMatch {
    if let Some(network) = find_network(query) {
        return NetworkMatch::One(network);
    }
    let matches = search_networks(query);
    match matches.len() {
        0 => NetworkMatch::None,
        1 => NetworkMatch::One(matches[0]),
        _ => NetworkMatch::Ambiguous(matches),
    }
}

fn parse_add_args(args: &str) -> Result<(String, String, String), &'static str> {
    const USAGE: &str = "Usage: /add <network> <address> [label]\n\
                         Example: /add ethereum 0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045 cold";

    let mut parts = args.split_whitespace();
    let (Some(network), Some(address)) = (parts.next(), parts.next()) else {
        return Err(USAGE);
    };

    let label: String = parts.collect::<Vec<_>>().join(" ");
    let label = if label.is_empty() {
        short(address)
    } else {
        label.chars().take(50).collect()
    };

    Ok((network.to_lowercase(), address.to_string(), label))
}

fn address_format_hint(family: NetworkFamily) -> &'static str {
    match family {
        NetworkFamily::Evm => "0x... (42 chars)",
        NetworkFamily::Tron => "Starts with T (34 chars)",
        NetworkFamily::Ton => "48+ chars",
        NetworkFamily::Solana => "Base58 (32-44 chars)",
    }
}

fn render_network_matches(matches: &[&'static NetworkDescriptor]) -> String {
    matches
        .iter()
        .map(|n| format!(" • {} ({})", n.display_name, n.key))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_wallet_list(wallets: &[Wallet]) -> String {
    if wallets.is_empty() {
        return "📭 No wallets added.\n\nUse /add to register one.".to_string();
    }

    let mut text = "📋 Your wallets:\n\n".to_string();
    for wallet in wallets {
        let display = find_network(&wallet.network_key)
            .map(|n| n.display_name)
            .unwrap_or(wallet.network_key.as_str());
        let native = find_network(&wallet.network_key)
            .map(|n| n.native_symbol)
            .unwrap_or("?");
        text.push_str(&format!(
            "🔹 {}\n   {} | {} | {}\n   /remove {}\n\n",
            wallet.label,
            display,
            native,
            short(&wallet.address),
            wallet.id,
        ));
    }
    text
}
