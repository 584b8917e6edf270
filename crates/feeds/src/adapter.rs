//! Per-network-family chain adapters.
//!
//! Each adapter knows one explorer API and turns its response into
//! [`TransferEvent`]s newer than a wallet's watermark. Fetching is delegated
//! to [`ResilientFetcher`]; response parsing is kept in pure functions so the
//! diff logic is testable against captured fixtures.

use crate::ResilientFetcher;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use walletwatch_core::{NetworkDescriptor, NetworkFamily, TransferEvent};

pub mod evm;
pub mod solana;
pub mod ton;
pub mod tron;

pub use evm::EvmAdapter;
pub use solana::SolanaAdapter;
pub use ton::TonAdapter;
pub use tron::TronAdapter;

/// How many recent transactions each diff request asks the provider for.
///
/// A wallet receiving more than this many inbound transfers within one poll
/// interval will miss the overflow; the watermark still lands on the newest
/// transaction so the monitor recovers on the next cycle.
pub const LOOKBACK_WINDOW: usize = 20;

/// Provider credentials shared by the adapters that need them.
#[derive(Debug, Clone, Default)]
pub struct ProviderKeys {
    pub etherscan: Option<String>,
    pub solscan: Option<String>,
}

/// One explorer integration.
#[async_trait]
pub trait ChainAdapter: Send + Sync {
    fn family(&self) -> NetworkFamily;

    /// Inbound transfers newer than `watermark`, newest first.
    ///
    /// An empty watermark means the wallet has no baseline yet and the whole
    /// lookback window counts as new. Provider failures degrade to an empty
    /// vec; the wallet is simply silent for this cycle.
    async fn diff(
        &self,
        network: &NetworkDescriptor,
        address: &str,
        watermark: &str,
    ) -> Vec<TransferEvent>;

    /// Most recent transaction id for this address, used to baseline a newly
    /// registered wallet. Empty when the provider has nothing.
    async fn latest_tx(&self, network: &NetworkDescriptor, address: &str) -> String;
}

/// Routes a network to the adapter that serves its family.
pub struct AdapterRegistry {
    adapters: HashMap<NetworkFamily, Arc<dyn ChainAdapter>>,
}

impl AdapterRegistry {
    /// Build the full production set over a shared fetcher.
    pub fn new(fetcher: Arc<ResilientFetcher>, keys: ProviderKeys) -> Self {
        let mut adapters: HashMap<NetworkFamily, Arc<dyn ChainAdapter>> = HashMap::new();
        adapters.insert(
            NetworkFamily::Evm,
            Arc::new(EvmAdapter::new(fetcher.clone(), keys.etherscan)),
        );
        adapters.insert(NetworkFamily::Tron, Arc::new(TronAdapter::new(fetcher.clone())));
        adapters.insert(NetworkFamily::Ton, Arc::new(TonAdapter::new(fetcher.clone())));
        adapters.insert(
            NetworkFamily::Solana,
            Arc::new(SolanaAdapter::new(fetcher, keys.solscan)),
        );
        Self { adapters }
    }

    /// Empty registry, populated via [`AdapterRegistry::insert`].
    pub fn empty() -> Self {
        Self {
            adapters: HashMap::new(),
        }
    }

    pub fn insert(&mut self, family: NetworkFamily, adapter: Arc<dyn ChainAdapter>) {
        self.adapters.insert(family, adapter);
    }

    pub fn for_network(&self, network: &NetworkDescriptor) -> Option<Arc<dyn ChainAdapter>> {
        self.adapters.get(&network.family).cloned()
    }
}

/// Numeric field that providers serialize as either a number or a string.
pub(crate) fn lenient_f64(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

pub(crate) fn lenient_u32(value: &Value, default: u32) -> u32 {
    match value {
        Value::Number(n) => n.as_u64().map(|n| n as u32).unwrap_or(default),
        Value::String(s) => s.parse().unwrap_or(default),
        _ => default,
    }
}
