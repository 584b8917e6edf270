//! TON adapter over tonapi.io.

use crate::adapter::{lenient_f64, ChainAdapter, LOOKBACK_WINDOW};
use crate::ResilientFetcher;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use walletwatch_core::{NetworkDescriptor, NetworkFamily, TransferEvent};

const API_BASE: &str = "https://tonapi.io/v2/blockchain";

pub struct TonAdapter {
    fetcher: Arc<ResilientFetcher>,
}

impl TonAdapter {
    pub fn new(fetcher: Arc<ResilientFetcher>) -> Self {
        Self { fetcher }
    }

    fn transactions_url(address: &str, limit: usize) -> String {
        format!("{API_BASE}/accounts/{address}/transactions?limit={limit}")
    }
}

#[async_trait]
impl ChainAdapter for TonAdapter {
    fn family(&self) -> NetworkFamily {
        NetworkFamily::Ton
    }

    async fn diff(
        &self,
        _network: &NetworkDescriptor,
        address: &str,
        watermark: &str,
    ) -> Vec<TransferEvent> {
        let url = Self::transactions_url(address, LOOKBACK_WINDOW);
        match self.fetcher.fetch(&url).await {
            Some(body) => parse_transfers(&body, watermark),
            None => Vec::new(),
        }
    }

    async fn latest_tx(&self, _network: &NetworkDescriptor, address: &str) -> String {
        let url = Self::transactions_url(address, 1);
        let Some(body) = self.fetcher.fetch(&url).await else {
            return String::new();
        };
        body["transactions"][0]["hash"]
            .as_str()
            .unwrap_or_default()
            .to_string()
    }
}

/// Inbound TON transfers newer than the watermark, newest first.
///
/// Only the incoming message of each transaction is considered; the value is
/// in nanotons.
pub(crate) fn parse_transfers(body: &Value, watermark: &str) -> Vec<TransferEvent> {
    let mut events = Vec::new();
    for tx in body["transactions"].as_array().into_iter().flatten() {
        let hash = tx["hash"].as_str().unwrap_or_default();
        if hash == watermark {
            break;
        }
        let in_msg = &tx["in_msg"];
        if !in_msg.is_object() {
            continue;
        }
        let amount = lenient_f64(&in_msg["value"]) / 1e9;
        if amount > 0.0 {
            events.push(TransferEvent::new(hash, "TON", amount));
        }
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_inbound_value_in_nanotons() {
        let body = json!({"transactions": [
            {"hash": "t2", "in_msg": {"value": 1_500_000_000u64}},
            {"hash": "t1", "in_msg": {"value": 500_000_000u64}},
        ]});

        let events = parse_transfers(&body, "t1");
        assert_eq!(events, vec![TransferEvent::new("t2", "TON", 1.5)]);
    }

    #[test]
    fn test_outbound_only_transactions_are_skipped() {
        let body = json!({"transactions": [
            {"hash": "t2"},
            {"hash": "t1", "in_msg": {"value": 0}},
        ]});

        assert!(parse_transfers(&body, "").is_empty());
    }
}
