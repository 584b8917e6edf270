//! Poll scheduler driving every registered wallet.

use crate::contract::WalletStore;
use crate::dispatch::NotificationDispatcher;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};
use walletwatch_core::{find_network, Wallet};
use walletwatch_feeds::AdapterRegistry;

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Pause between poll cycles.
    pub poll_interval: Duration,
    /// Grace period before the first cycle, so the process finishes wiring
    /// up before provider traffic starts.
    pub startup_delay: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(10),
            startup_delay: Duration::from_secs(10),
        }
    }
}

/// The monitor loop: load wallets, diff each against its chain, notify.
///
/// Each wallet is checked in its own task so one slow or failing provider
/// cannot delay the rest; the cycle waits for all of them before sleeping.
pub struct Monitor {
    store: Arc<dyn WalletStore>,
    registry: Arc<AdapterRegistry>,
    dispatcher: Arc<NotificationDispatcher>,
    config: MonitorConfig,
}

impl Monitor {
    pub fn new(
        store: Arc<dyn WalletStore>,
        registry: Arc<AdapterRegistry>,
        dispatcher: Arc<NotificationDispatcher>,
        config: MonitorConfig,
    ) -> Self {
        Self {
            store,
            registry,
            dispatcher,
            config,
        }
    }

    /// Run forever. Cancelled by dropping the task.
    pub async fn run(&self) {
        sleep(self.config.startup_delay).await;
        info!("multi-chain monitor started");

        loop {
            self.run_cycle().await;
            sleep(self.config.poll_interval).await;
        }
    }

    /// One full pass over every registered wallet.
    pub async fn run_cycle(&self) {
        let wallets = match self.store.list_all().await {
            Ok(wallets) => wallets,
            Err(e) => {
                error!(error = %e, "failed to load wallet registry");
                return;
            }
        };

        if wallets.is_empty() {
            return;
        }
        info!(count = wallets.len(), "checking wallets");

        let mut tasks = Vec::with_capacity(wallets.len());
        for wallet in wallets {
            let store = self.store.clone();
            let registry = self.registry.clone();
            let dispatcher = self.dispatcher.clone();
            tasks.push(tokio::spawn(async move {
                check_wallet(store, registry, dispatcher, wallet).await;
            }));
        }

        for task in tasks {
            if let Err(e) = task.await {
                error!(error = %e, "wallet check task failed");
            }
        }
    }
}

async fn check_wallet(
    store: Arc<dyn WalletStore>,
    registry: Arc<AdapterRegistry>,
    dispatcher: Arc<NotificationDispatcher>,
    wallet: Wallet,
) {
    let Some(network) = find_network(&wallet.network_key) else {
        warn!(
            wallet_id = wallet.id,
            network = %wallet.network_key,
            "unknown network key, skipping wallet"
        );
        return;
    };
    let Some(adapter) = registry.for_network(network) else {
        warn!(
            wallet_id = wallet.id,
            family = network.family.as_str(),
            "no adapter registered for network family"
        );
        return;
    };

    let events = adapter
        .diff(network, &wallet.address, &wallet.watermark_tx_id)
        .await;

    if let Some(watermark) = dispatcher.dispatch(&wallet, network, &events).await {
        match store.update_watermark(wallet.id, &watermark).await {
            Ok(()) => debug!(wallet_id = wallet.id, watermark = %watermark, "watermark advanced"),
            Err(e) => error!(
                wallet_id = wallet.id,
                error = %e,
                "failed to persist watermark"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{DeliveryError, MessageTransport, StoreError};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use walletwatch_core::{NetworkDescriptor, NetworkFamily, TransferEvent};
    use walletwatch_feeds::{ChainAdapter, PriceOracle, PriceQuoter};

    struct MemoryStore {
        wallets: Mutex<Vec<Wallet>>,
    }

    impl MemoryStore {
        fn new(wallets: Vec<Wallet>) -> Arc<Self> {
            Arc::new(Self {
                wallets: Mutex::new(wallets),
            })
        }

        fn watermark_of(&self, wallet_id: i64) -> String {
            self.wallets
                .lock()
                .unwrap()
                .iter()
                .find(|w| w.id == wallet_id)
                .map(|w| w.watermark_tx_id.clone())
                .unwrap_or_default()
        }
    }

    #[async_trait]
    impl WalletStore for MemoryStore {
        async fn list_all(&self) -> Result<Vec<Wallet>, StoreError> {
            Ok(self.wallets.lock().unwrap().clone())
        }

        async fn update_watermark(&self, wallet_id: i64, tx_id: &str) -> Result<(), StoreError> {
            let mut wallets = self.wallets.lock().unwrap();
            let wallet = wallets
                .iter_mut()
                .find(|w| w.id == wallet_id)
                .ok_or(StoreError::NotFound(wallet_id))?;
            wallet.watermark_tx_id = tx_id.to_string();
            Ok(())
        }
    }

    /// Adapter serving a fixed window per address, diffed like a real one.
    struct ScriptedAdapter {
        family: NetworkFamily,
        windows: HashMap<String, Vec<TransferEvent>>,
        panic_on: Option<String>,
    }

    #[async_trait]
    impl ChainAdapter for ScriptedAdapter {
        fn family(&self) -> NetworkFamily {
            self.family
        }

        async fn diff(
            &self,
            _network: &NetworkDescriptor,
            address: &str,
            watermark: &str,
        ) -> Vec<TransferEvent> {
            if self.panic_on.as_deref() == Some(address) {
                panic!("provider exploded");
            }
            let Some(window) = self.windows.get(address) else {
                return Vec::new();
            };
            window
                .iter()
                .take_while(|e| e.tx_id != watermark)
                .cloned()
                .collect()
        }

        async fn latest_tx(&self, _network: &NetworkDescriptor, address: &str) -> String {
            self.windows
                .get(address)
                .and_then(|w| w.first())
                .map(|e| e.tx_id.clone())
                .unwrap_or_default()
        }
    }

    struct RecordingTransport {
        sent: Mutex<Vec<(i64, String)>>,
    }

    #[async_trait]
    impl MessageTransport for RecordingTransport {
        async fn send(&self, recipient: i64, text: &str) -> Result<(), DeliveryError> {
            self.sent.lock().unwrap().push((recipient, text.to_string()));
            Ok(())
        }
    }

    struct FixedQuoter(f64);

    #[async_trait]
    impl PriceQuoter for FixedQuoter {
        async fn quote_usd(&self, _coin_id: &str) -> Option<f64> {
            Some(self.0)
        }
    }

    const TRON_ADDR: &str = "TR7NHqjeKQxGTCi8q8ZY4pL8otSzgjLj6t";
    const TRON_ADDR_2: &str = "TLa2f6VPqDgRE67v1736s7bJ8Ray5wYjU7";

    fn tron_wallet(id: i64, address: &str, watermark: &str) -> Wallet {
        Wallet {
            id,
            owner_id: 42,
            network_key: "tron".to_string(),
            address: address.to_string(),
            label: format!("wallet-{id}"),
            watermark_tx_id: watermark.to_string(),
        }
    }

    fn monitor(
        store: Arc<MemoryStore>,
        adapter: ScriptedAdapter,
        transport: Arc<RecordingTransport>,
    ) -> Monitor {
        let mut registry = AdapterRegistry::empty();
        registry.insert(adapter.family(), Arc::new(adapter));
        let oracle = Arc::new(PriceOracle::new(
            Arc::new(FixedQuoter(0.1)),
            PriceOracle::DEFAULT_TTL,
        ));
        Monitor::new(
            store,
            Arc::new(registry),
            Arc::new(NotificationDispatcher::new(oracle, transport)),
            MonitorConfig::default(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_cycle_notifies_and_advances_watermark() {
        // Window [h2, h1, h0] with watermark h0: two new transfers.
        let store = MemoryStore::new(vec![tron_wallet(1, TRON_ADDR, "h0")]);
        let transport = Arc::new(RecordingTransport {
            sent: Mutex::new(Vec::new()),
        });
        let adapter = ScriptedAdapter {
            family: NetworkFamily::Tron,
            windows: HashMap::from([(
                TRON_ADDR.to_string(),
                vec![
                    TransferEvent::new("h2", "TRX", 2.0),
                    TransferEvent::new("h1", "TRX", 1.0),
                    TransferEvent::new("h0", "TRX", 0.5),
                ],
            )]),
            panic_on: None,
        };

        let m = monitor(store.clone(), adapter, transport.clone());
        m.run_cycle().await;

        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent.len(), 2);
        assert!(sent[0].1.contains("TX: h1"));
        assert!(sent[1].1.contains("TX: h2"));
        drop(sent);

        assert_eq!(store.watermark_of(1), "h2");
    }

    #[tokio::test(start_paused = true)]
    async fn test_cycle_is_idempotent_without_new_transfers() {
        let store = MemoryStore::new(vec![tron_wallet(1, TRON_ADDR, "h2")]);
        let transport = Arc::new(RecordingTransport {
            sent: Mutex::new(Vec::new()),
        });
        let adapter = ScriptedAdapter {
            family: NetworkFamily::Tron,
            windows: HashMap::from([(
                TRON_ADDR.to_string(),
                vec![TransferEvent::new("h2", "TRX", 2.0)],
            )]),
            panic_on: None,
        };

        let m = monitor(store.clone(), adapter, transport.clone());
        m.run_cycle().await;
        m.run_cycle().await;

        assert!(transport.sent.lock().unwrap().is_empty());
        assert_eq!(store.watermark_of(1), "h2");
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_wallet_does_not_block_others() {
        let store = MemoryStore::new(vec![
            tron_wallet(1, TRON_ADDR, ""),
            tron_wallet(2, TRON_ADDR_2, ""),
        ]);
        let transport = Arc::new(RecordingTransport {
            sent: Mutex::new(Vec::new()),
        });
        let adapter = ScriptedAdapter {
            family: NetworkFamily::Tron,
            windows: HashMap::from([(
                TRON_ADDR_2.to_string(),
                vec![TransferEvent::new("x1", "TRX", 1.0)],
            )]),
            panic_on: Some(TRON_ADDR.to_string()),
        };

        let m = monitor(store.clone(), adapter, transport.clone());
        m.run_cycle().await;

        assert_eq!(transport.sent.lock().unwrap().len(), 1);
        assert_eq!(store.watermark_of(2), "x1");
        // The panicking wallet keeps its empty watermark for the next cycle.
        assert_eq!(store.watermark_of(1), "");
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_network_is_skipped() {
        let mut wallet = tron_wallet(1, TRON_ADDR, "");
        wallet.network_key = "atlantis".to_string();
        let store = MemoryStore::new(vec![wallet]);
        let transport = Arc::new(RecordingTransport {
            sent: Mutex::new(Vec::new()),
        });
        let adapter = ScriptedAdapter {
            family: NetworkFamily::Tron,
            windows: HashMap::new(),
            panic_on: None,
        };

        let m = monitor(store.clone(), adapter, transport.clone());
        m.run_cycle().await;

        assert!(transport.sent.lock().unwrap().is_empty());
    }
}
