//! Provider plumbing for the wallet monitor.
//!
//! This crate owns everything that talks to third-party data providers:
//!
//! - `fetch` - resilient HTTP GET with retries, backoff and pool limits
//! - `adapter/` - per-network-family transfer diffing against a watermark
//! - `price` - TTL-cached USD price lookup
//! - `lookup` - ad-hoc transaction lookup across all supported networks

pub mod adapter;
pub mod error;
pub mod fetch;
pub mod lookup;
pub mod price;

pub use adapter::{AdapterRegistry, ChainAdapter, ProviderKeys, LOOKBACK_WINDOW};
pub use error::FetchError;
pub use fetch::{FetchOutcome, FetcherConfig, ResilientFetcher};
pub use lookup::{extract_tx_hash, TxLookup};
pub use price::{CoinGeckoQuoter, PriceOracle, PriceQuoter};
