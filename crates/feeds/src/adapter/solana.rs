//! Solana adapter over the Solscan public API.
//!
//! Solscan authenticates through a `token` request header and has shipped two
//! response shapes over time, a bare array and `{"data": [...]}`; both are
//! accepted. Transactions that confirmed without decodable token legs are
//! still reported, with the amount marked uncertain.

use crate::adapter::{lenient_f64, ChainAdapter, LOOKBACK_WINDOW};
use crate::ResilientFetcher;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;
use walletwatch_core::{NetworkDescriptor, NetworkFamily, TransferEvent};

const API_BASE: &str = "https://public-api.solscan.io";

pub struct SolanaAdapter {
    fetcher: Arc<ResilientFetcher>,
    api_key: Option<String>,
}

impl SolanaAdapter {
    pub fn new(fetcher: Arc<ResilientFetcher>, api_key: Option<String>) -> Self {
        Self { fetcher, api_key }
    }

    fn transactions_url(address: &str, limit: usize) -> String {
        format!("{API_BASE}/account/transactions?account={address}&limit={limit}")
    }

    async fn fetch(&self, url: &str) -> Option<Value> {
        let api_key = match self.api_key.as_deref() {
            Some(key) => key,
            None => {
                debug!("Solana adapter disabled, no API key");
                return None;
            }
        };
        self.fetcher
            .fetch_with_headers(url, &[("token", api_key)])
            .await
    }
}

#[async_trait]
impl ChainAdapter for SolanaAdapter {
    fn family(&self) -> NetworkFamily {
        NetworkFamily::Solana
    }

    async fn diff(
        &self,
        _network: &NetworkDescriptor,
        address: &str,
        watermark: &str,
    ) -> Vec<TransferEvent> {
        let url = Self::transactions_url(address, LOOKBACK_WINDOW);
        match self.fetch(&url).await {
            Some(body) => parse_transfers(&body, address, watermark),
            None => Vec::new(),
        }
    }

    async fn latest_tx(&self, _network: &NetworkDescriptor, address: &str) -> String {
        let url = Self::transactions_url(address, 1);
        let Some(body) = self.fetch(&url).await else {
            return String::new();
        };
        transaction_list(&body)
            .first()
            .and_then(|tx| tx["txHash"].as_str().or_else(|| tx["txhash"].as_str()))
            .unwrap_or_default()
            .to_string()
    }
}

fn transaction_list(body: &Value) -> &[Value] {
    body.as_array()
        .or_else(|| body["data"].as_array())
        .map(Vec::as_slice)
        .unwrap_or_default()
}

/// Inbound Solana transfers newer than the watermark, newest first.
pub(crate) fn parse_transfers(body: &Value, address: &str, watermark: &str) -> Vec<TransferEvent> {
    let mut events = Vec::new();
    for tx in transaction_list(body) {
        let sig = tx["txHash"]
            .as_str()
            .or_else(|| tx["txhash"].as_str())
            .unwrap_or_default();
        if sig == watermark {
            break;
        }

        let legs = tx["tokenTransfers"].as_array();
        for leg in legs.into_iter().flatten() {
            if !leg["destination"]
                .as_str()
                .unwrap_or_default()
                .eq_ignore_ascii_case(address)
            {
                continue;
            }
            let amount = lenient_f64(&leg["amount"]);
            if amount > 0.0 {
                let symbol = leg["symbol"].as_str().unwrap_or("SOL");
                events.push(TransferEvent::new(sig, symbol, amount));
            }
        }

        // Confirmed but undecodable: native movement with no token legs.
        if legs.map(Vec::is_empty).unwrap_or(true) && tx["status"].as_i64() == Some(1) {
            events.push(TransferEvent::uncertain(sig, "SOL"));
        }
    }
    events
}
