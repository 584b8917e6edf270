//! USD price enrichment with a TTL cache.

use crate::ResilientFetcher;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// Source of USD quotes by price-provider coin id.
#[async_trait]
pub trait PriceQuoter: Send + Sync {
    /// Current USD price, or `None` when the provider has no answer.
    async fn quote_usd(&self, coin_id: &str) -> Option<f64>;
}

/// CoinGecko simple-price endpoint.
pub struct CoinGeckoQuoter {
    fetcher: Arc<ResilientFetcher>,
    base_url: String,
}

impl CoinGeckoQuoter {
    const BASE_URL: &'static str = "https://api.coingecko.com/api/v3";

    pub fn new(fetcher: Arc<ResilientFetcher>) -> Self {
        Self {
            fetcher,
            base_url: Self::BASE_URL.to_string(),
        }
    }
}

#[async_trait]
impl PriceQuoter for CoinGeckoQuoter {
    async fn quote_usd(&self, coin_id: &str) -> Option<f64> {
        let url = format!(
            "{}/simple/price?ids={}&vs_currencies=usd",
            self.base_url, coin_id
        );
        let js = self.fetcher.fetch(&url).await?;
        js[coin_id]["usd"].as_f64()
    }
}

/// Map an asset symbol to its CoinGecko id. Symbols the table does not know
/// fall back to the lower-cased symbol itself.
pub fn coingecko_id(symbol: &str) -> Option<&'static str> {
    let id = match symbol {
        "TRX" => "tron",
        "USDT" => "tether",
        "USDC" => "usd-coin",
        "BUSD" => "binance-usd",
        "DAI" => "dai",
        "TON" => "the-open-network",
        "BNB" => "binancecoin",
        "ETH" => "ethereum",
        "MATIC" => "matic-network",
        "WETH" => "weth",
        "WBNB" => "wbnb",
        "CAKE" => "pancakeswap-token",
        "SHIB" => "shiba-inu",
        "LINK" => "chainlink",
        "UNI" => "uniswap",
        "SOL" => "solana",
        "BTT" => "bittorrent",
        "CELO" => "celo",
        "XDAI" => "xdai",
        "MNT" => "mantle",
        "GLMR" => "moonbeam",
        "MOVR" => "moonriver",
        "APE" => "apecoin",
        "WLD" => "worldcoin",
        "S" => "sonic",
        "BERA" => "berachain",
        "MON" => "monad",
        "HYPE" => "hyperliquid",
        "SEI" => "sei",
        "XDC" => "xdc-network",
        "PLS" => "pulse",
        _ => return None,
    };
    Some(id)
}

/// Upper-case the symbol and drop any decorative suffix a provider may have
/// appended after whitespace.
fn normalize_symbol(symbol: &str) -> String {
    symbol
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_uppercase()
}

/// TTL-cached USD price lookup.
///
/// An entry older than the TTL is never returned; the requester that observes
/// staleness refreshes it synchronously. A failed fetch yields 0.0 and leaves
/// the cache untouched, so the next caller retries. Concurrent misses for the
/// same symbol may each fetch once; the cache write is atomic under the mutex
/// and the last writer wins.
pub struct PriceOracle {
    quoter: Arc<dyn PriceQuoter>,
    ttl: Duration,
    cache: Mutex<HashMap<String, (f64, Instant)>>,
}

impl PriceOracle {
    pub const DEFAULT_TTL: Duration = Duration::from_secs(60);

    pub fn new(quoter: Arc<dyn PriceQuoter>, ttl: Duration) -> Self {
        Self {
            quoter,
            ttl,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// USD price for a symbol; 0.0 means unknown.
    pub async fn price_usd(&self, symbol: &str) -> f64 {
        let symbol = normalize_symbol(symbol);
        if symbol.is_empty() {
            return 0.0;
        }

        {
            let cache = self.cache.lock().await;
            if let Some(&(price, fetched_at)) = cache.get(&symbol) {
                if fetched_at.elapsed() < self.ttl {
                    return price;
                }
            }
        }

        let coin_id = coingecko_id(&symbol)
            .map(str::to_string)
            .unwrap_or_else(|| symbol.to_lowercase());

        match self.quoter.quote_usd(&coin_id).await {
            Some(price) => {
                let mut cache = self.cache.lock().await;
                cache.insert(symbol, (price, Instant::now()));
                price
            }
            None => {
                debug!(symbol = %symbol, "price unavailable");
                0.0
            }
        }
    }
}
