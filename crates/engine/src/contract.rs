//! Seams between the engine and its storage / delivery backends.
//!
//! The monitor only needs to enumerate wallets, advance watermarks and push
//! text to an owner. Keeping those behind traits lets the engine run against
//! in-memory fakes in tests and against SQLite + Telegram in production.

use async_trait::async_trait;
use thiserror::Error;
use walletwatch_core::Wallet;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("wallet registry error: {0}")]
    Backend(String),

    #[error("wallet {0} not found")]
    NotFound(i64),
}

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("message delivery failed: {0}")]
    Send(String),
}

/// Persistent wallet registry.
#[async_trait]
pub trait WalletStore: Send + Sync {
    /// Every registered wallet, across all owners.
    async fn list_all(&self) -> Result<Vec<Wallet>, StoreError>;

    /// Persist a new watermark after notifications for a cycle went out.
    async fn update_watermark(&self, wallet_id: i64, tx_id: &str) -> Result<(), StoreError>;
}

/// Outbound notification channel.
#[async_trait]
pub trait MessageTransport: Send + Sync {
    async fn send(&self, recipient: i64, text: &str) -> Result<(), DeliveryError>;
}
