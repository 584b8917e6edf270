//! Unified adapter for every EVM chain behind the Etherscan v2 API.
//!
//! One endpoint serves all chains, selected by `chainId`. Native transfers
//! come from `txlist`, ERC-20 transfers from `tokentx`; both are queried
//! newest-first and diffed against the watermark independently.

use crate::adapter::{lenient_f64, lenient_u32, ChainAdapter, LOOKBACK_WINDOW};
use crate::ResilientFetcher;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;
use walletwatch_core::{NetworkDescriptor, NetworkFamily, TransferEvent};

const API_BASE: &str = "https://api.etherscan.io/v2/api";

pub struct EvmAdapter {
    fetcher: Arc<ResilientFetcher>,
    api_key: Option<String>,
}

impl EvmAdapter {
    pub fn new(fetcher: Arc<ResilientFetcher>, api_key: Option<String>) -> Self {
        Self { fetcher, api_key }
    }

    fn account_url(
        &self,
        chain_id: u64,
        action: &str,
        address: &str,
        offset: usize,
        api_key: &str,
    ) -> String {
        format!(
            "{API_BASE}?chainId={chain_id}&module=account&action={action}\
             &address={address}&startblock=0&endblock=99999999\
             &page=1&offset={offset}&sort=desc&apikey={api_key}"
        )
    }
}

#[async_trait]
impl ChainAdapter for EvmAdapter {
    fn family(&self) -> NetworkFamily {
        NetworkFamily::Evm
    }

    async fn diff(
        &self,
        network: &NetworkDescriptor,
        address: &str,
        watermark: &str,
    ) -> Vec<TransferEvent> {
        let (Some(api_key), Some(chain_id)) = (self.api_key.as_deref(), network.chain_id) else {
            debug!(network = network.key, "EVM adapter disabled, no API key or chain id");
            return Vec::new();
        };

        let mut events = Vec::new();

        let native_url = self.account_url(chain_id, "txlist", address, LOOKBACK_WINDOW, api_key);
        if let Some(body) = self.fetcher.fetch(&native_url).await {
            events.extend(parse_native(&body, address, watermark, network.native_symbol));
        }

        let token_url = self.account_url(chain_id, "tokentx", address, LOOKBACK_WINDOW, api_key);
        if let Some(body) = self.fetcher.fetch(&token_url).await {
            events.extend(parse_tokens(&body, address, watermark));
        }

        events
    }

    async fn latest_tx(&self, network: &NetworkDescriptor, address: &str) -> String {
        let (Some(api_key), Some(chain_id)) = (self.api_key.as_deref(), network.chain_id) else {
            return String::new();
        };

        let url = self.account_url(chain_id, "txlist", address, 1, api_key);
        let Some(body) = self.fetcher.fetch(&url).await else {
            return String::new();
        };
        parse_latest(&body)
    }
}

/// Native transfers newer than the watermark, newest first.
pub(crate) fn parse_native(
    body: &Value,
    address: &str,
    watermark: &str,
    native_symbol: &str,
) -> Vec<TransferEvent> {
    let mut events = Vec::new();
    if body["status"].as_str() != Some("1") {
        return events;
    }
    for tx in body["result"].as_array().into_iter().flatten() {
        let hash = tx["hash"].as_str().unwrap_or_default();
        if hash == watermark {
            break;
        }
        if !tx["to"]
            .as_str()
            .unwrap_or_default()
            .eq_ignore_ascii_case(address)
        {
            continue;
        }
        let amount = lenient_f64(&tx["value"]) / 1e18;
        if amount > 0.0 {
            events.push(TransferEvent::new(hash, native_symbol, amount));
        }
    }
    events
}

/// ERC-20 transfers newer than the watermark, newest first.
pub(crate) fn parse_tokens(body: &Value, address: &str, watermark: &str) -> Vec<TransferEvent> {
    let mut events = Vec::new();
    if body["status"].as_str() != Some("1") {
        return events;
    }
    for tx in body["result"].as_array().into_iter().flatten() {
        let hash = tx["hash"].as_str().unwrap_or_default();
        if hash == watermark {
            break;
        }
        if !tx["to"]
            .as_str()
            .unwrap_or_default()
            .eq_ignore_ascii_case(address)
        {
            continue;
        }
        let decimals = lenient_u32(&tx["tokenDecimal"], 18);
        let amount = lenient_f64(&tx["value"]) / 10f64.powi(decimals as i32);
        if amount > 0.0 {
            let symbol = tx["tokenSymbol"].as_str().unwrap_or("TOKEN");
            events.push(TransferEvent::new(hash, symbol, amount));
        }
    }
    events
}

fn parse_latest(body: &Value) -> String {
    if body["status"].as_str() != Some("1") {
        return String::new();
    }
    body["result"][0]["hash"]
        .as_str()
        .unwrap_or_default()
        .to_string()
}
