//! TRON adapter over the Tronscan public API.

use crate::adapter::{lenient_f64, lenient_u32, ChainAdapter, LOOKBACK_WINDOW};
use crate::ResilientFetcher;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use walletwatch_core::{NetworkDescriptor, NetworkFamily, TransferEvent};

const API_BASE: &str = "https://apilist.tronscanapi.com/api";

pub struct TronAdapter {
    fetcher: Arc<ResilientFetcher>,
}

impl TronAdapter {
    pub fn new(fetcher: Arc<ResilientFetcher>) -> Self {
        Self { fetcher }
    }

    fn transactions_url(address: &str, limit: usize) -> String {
        format!("{API_BASE}/transaction?address={address}&limit={limit}")
    }
}

#[async_trait]
impl ChainAdapter for TronAdapter {
    fn family(&self) -> NetworkFamily {
        NetworkFamily::Tron
    }

    async fn diff(
        &self,
        _network: &NetworkDescriptor,
        address: &str,
        watermark: &str,
    ) -> Vec<TransferEvent> {
        let url = Self::transactions_url(address, LOOKBACK_WINDOW);
        match self.fetcher.fetch(&url).await {
            Some(body) => parse_transfers(&body, address, watermark),
            None => Vec::new(),
        }
    }

    async fn latest_tx(&self, _network: &NetworkDescriptor, address: &str) -> String {
        let url = Self::transactions_url(address, 1);
        let Some(body) = self.fetcher.fetch(&url).await else {
            return String::new();
        };
        body["data"][0]["hash"]
            .as_str()
            .unwrap_or_default()
            .to_string()
    }
}

/// Inbound TRON transfers newer than the watermark, newest first.
///
/// Plain transfers carry the amount in sun (1e-6 TRX). Contract-triggered
/// transfers (TRC-20) carry raw token units with the decimals under
/// `tokenInfo.tokenDecimal`, defaulting to 6.
pub(crate) fn parse_transfers(body: &Value, address: &str, watermark: &str) -> Vec<TransferEvent> {
    let mut events = Vec::new();
    for tx in body["data"].as_array().into_iter().flatten() {
        let hash = tx["hash"].as_str().unwrap_or_default();
        if hash == watermark {
            break;
        }
        if !tx["toAddress"]
            .as_str()
            .unwrap_or_default()
            .eq_ignore_ascii_case(address)
        {
            continue;
        }

        let symbol = tx["tokenName"].as_str().unwrap_or("TRX");
        let raw = lenient_f64(&tx["amount"]);
        let amount = if tx["trigger_info"]["parameter"].is_string()
            || tx["trigger_info"]["parameter"].is_object()
        {
            let decimals = lenient_u32(&tx["tokenInfo"]["tokenDecimal"], 6);
            raw / 10f64.powi(decimals as i32)
        } else {
            raw / 1e6
        };

        if amount > 0.0 {
            events.push(TransferEvent::new(hash, symbol, amount));
        }
    }
    events
}
