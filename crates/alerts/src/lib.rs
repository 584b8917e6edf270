//! User-facing side of the wallet monitor.
//!
//! This crate provides:
//! - SQLite-backed wallet registry
//! - Telegram bot for managing wallets and looking up transactions
//! - The delivery transport the engine uses for notifications

pub mod db;
pub mod telegram;

pub use db::{DbError, WalletDb};
pub use telegram::{TelegramTransport, WalletBot};
