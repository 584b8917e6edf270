//! Ad-hoc transaction lookup across every supported network.
//!
//! Given a pasted hash or explorer link, figure out which network it belongs
//! to, fetch the transaction and render a human-readable summary. Detection
//! is heuristic: the hash shape narrows the candidates and the remaining
//! networks are probed in priority order.

use crate::ResilientFetcher;
use serde_json::Value;
use std::sync::Arc;
use walletwatch_core::{all_networks, short, NetworkDescriptor, NetworkFamily, BASE58_ALPHABET};

/// EVM mainnets probed first when a receipt could live on any chain.
const EVM_PRIORITY: &[&str] = &[
    "ethereum",
    "polygon",
    "arbitrum",
    "blast",
    "scroll",
    "linea",
    "opbnb",
    "sonic",
    "berachain",
    "base",
];

/// What kind of transaction id a piece of text looks like.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashKind {
    /// `0x` plus 64 hex digits.
    Evm,
    /// Bare 64 hex digits, TRON or an EVM hash missing its prefix.
    TronOrBareEvm,
    /// Long base58 string, a Solana signature.
    Solana,
    Unknown,
}

/// Pull a transaction hash out of raw text or an explorer URL.
pub fn extract_tx_hash(text: &str) -> Option<String> {
    let runs: Vec<&str> = text
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|r| !r.is_empty())
        .collect();

    // Prefixed EVM hash, possibly embedded in a longer run (explorer URLs).
    for run in &runs {
        if let Some(pos) = run.find("0x") {
            let tail = &run[pos + 2..];
            if tail.len() >= 64 && tail.bytes().take(64).all(|b| b.is_ascii_hexdigit()) {
                return Some(format!("0x{}", &tail[..64]));
            }
        }
    }

    // Bare 64-digit hex word.
    for run in &runs {
        if run.len() == 64 && run.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Some((*run).to_string());
        }
    }

    // Solana signature: base58, and long enough to not be an address.
    for run in &runs {
        if (44..=88).contains(&run.len())
            && run.len() >= 60
            && run.chars().all(|c| BASE58_ALPHABET.contains(c))
        {
            return Some((*run).to_string());
        }
    }

    None
}

pub fn detect_hash_kind(tx_hash: &str) -> HashKind {
    if tx_hash.starts_with("0x") && tx_hash.len() == 66 {
        return HashKind::Evm;
    }
    if tx_hash.len() == 64 && !tx_hash.starts_with("0x") {
        return HashKind::TronOrBareEvm;
    }
    if tx_hash.len() >= 60 {
        return HashKind::Solana;
    }
    HashKind::Unknown
}

/// Multi-network transaction resolver.
pub struct TxLookup {
    fetcher: Arc<ResilientFetcher>,
    etherscan_key: Option<String>,
    solscan_key: Option<String>,
}

impl TxLookup {
    pub fn new(
        fetcher: Arc<ResilientFetcher>,
        etherscan_key: Option<String>,
        solscan_key: Option<String>,
    ) -> Self {
        Self {
            fetcher,
            etherscan_key,
            solscan_key,
        }
    }

    /// Resolve a hash to a rendered description, probing networks in order.
    pub async fn describe(&self, tx_hash: &str) -> String {
        let mut tx_hash = tx_hash.to_string();
        let mut kind = detect_hash_kind(&tx_hash);

        if kind == HashKind::Solana && self.solscan_key.is_some() {
            if let Some(data) = self.lookup_solana(&tx_hash).await {
                if data["txhash"].is_string() || data["txHash"].is_string() {
                    return format_solana_tx(&data);
                }
            }
        }

        if kind == HashKind::TronOrBareEvm {
            if let Some(data) = self.lookup_tron(&tx_hash).await {
                if data["hash"].is_string() {
                    return format_tron_tx(&data);
                }
            }
            // Not on TRON; try the same digits as an EVM hash.
            tx_hash = format!("0x{tx_hash}");
            kind = HashKind::Evm;
        }

        if kind == HashKind::Evm && self.etherscan_key.is_some() {
            for network in evm_probe_order() {
                if let Some(receipt) = self.lookup_evm(&tx_hash, network).await {
                    return format_evm_receipt(&receipt, network);
                }
            }
        }

        if tx_hash.len() >= 60 {
            if let Some(data) = self.lookup_ton(&tx_hash).await {
                if data["hash"].is_string() {
                    return format_ton_brief(&data);
                }
            }
        }

        "❌ Transaction not found\n\n\
         Could not locate this transaction on any supported network.\n\n\
         Make sure:\n\
         • The hash or link is correct\n\
         • The transaction has been confirmed\n\
         • The network is supported"
            .to_string()
    }

    async fn lookup_evm(&self, tx_hash: &str, network: &NetworkDescriptor) -> Option<Value> {
        let api_key = self.etherscan_key.as_deref()?;
        let chain_id = network.chain_id?;
        let url = format!(
            "https://api.etherscan.io/v2/api?chainId={chain_id}\
             &module=transaction&action=gettransactionreceipt\
             &txhash={tx_hash}&apikey={api_key}"
        );
        let body = self.fetcher.fetch(&url).await?;
        if body["status"].as_str() == Some("1") && !body["result"].is_null() {
            return Some(body["result"].clone());
        }
        None
    }

    async fn lookup_tron(&self, tx_hash: &str) -> Option<Value> {
        let url = format!("https://apilist.tronscanapi.com/api/transaction/{tx_hash}");
        self.fetcher.fetch(&url).await
    }

    async fn lookup_ton(&self, tx_hash: &str) -> Option<Value> {
        let url = format!("https://tonapi.io/v2/blockchain/transactions/{tx_hash}");
        self.fetcher.fetch(&url).await
    }

    async fn lookup_solana(&self, tx_hash: &str) -> Option<Value> {
        let api_key = self.solscan_key.as_deref()?;
        let url = format!("https://public-api.solscan.io/transaction/{tx_hash}");
        self.fetcher
            .fetch_with_headers(&url, &[("token", api_key)])
            .await
    }
}

/// EVM networks in probe order: priority mainnets, remaining mainnets,
/// testnets last.
fn evm_probe_order() -> Vec<&'static NetworkDescriptor> {
    let evm: Vec<&NetworkDescriptor> = all_networks()
        .iter()
        .filter(|n| n.family == NetworkFamily::Evm)
        .collect();

    let mut ordered = Vec::with_capacity(evm.len());
    for key in EVM_PRIORITY {
        if let Some(n) = evm.iter().find(|n| n.key == *key) {
            ordered.push(*n);
        }
    }
    for &n in &evm {
        if !n.testnet && !ordered.contains(&n) {
            ordered.push(n);
        }
    }
    for &n in &evm {
        if n.testnet {
            ordered.push(n);
        }
    }
    ordered
}

fn hex_u128(value: &Value) -> u128 {
    value
        .as_str()
        .and_then(|s| u128::from_str_radix(s.trim_start_matches("0x"), 16).ok())
        .unwrap_or(0)
}

fn group_digits(n: u128) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

pub(crate) fn format_evm_receipt(receipt: &Value, network: &NetworkDescriptor) -> String {
    let status = if hex_u128(&receipt["status"]) == 1 {
        "✅ Success"
    } else {
        "❌ Failed"
    };

    let block = hex_u128(&receipt["blockNumber"]);
    let gas_used = hex_u128(&receipt["gasUsed"]);
    let gas_price = hex_u128(&receipt["effectiveGasPrice"]);
    let gas_price_gwei = gas_price as f64 / 1e9;
    let fee_native = (gas_used * gas_price) as f64 / 1e18;

    let from = receipt["from"].as_str().unwrap_or("N/A");
    let to = match receipt["to"].as_str() {
        Some(to) if !to.is_empty() => to,
        _ => "Contract Creation",
    };
    let tx_hash = receipt["transactionHash"].as_str().unwrap_or("N/A");

    let mut text = format!(
        "🔍 Transaction Details\n{}\n\
         🌐 Network: {}\n\
         📌 Status: {}\n\
         🔗 TX Hash: {}\n\
         📦 Block: #{}\n\
         📤 From: {}\n\
         📥 To: {}\n\
         ⛽ Gas Used: {}\n\
         💲 Gas Price: {:.2} Gwei\n\
         💵 Fee: {:.8} {}\n",
        "─".repeat(36),
        network.display_name,
        status,
        short(tx_hash),
        group_digits(block),
        short(from),
        short(to),
        group_digits(gas_used),
        gas_price_gwei,
        fee_native,
        network.native_symbol,
    );

    if let Some(logs) = receipt["logs"].as_array() {
        if !logs.is_empty() {
            text.push_str(&format!("\n📋 Events ({}):\n", logs.len()));
            for log in logs.iter().take(3) {
                if let Some(topic) = log["topics"][0].as_str() {
                    text.push_str(&format!(" • Event topic: {}\n", short(topic)));
                }
            }
            if logs.len() > 3 {
                text.push_str(&format!(" ... and {} more events\n", logs.len() - 3));
            }
        }
    }

    text
}

pub(crate) fn format_tron_tx(data: &Value) -> String {
    let status = if data["confirmed"].as_bool().unwrap_or(false) {
        "✅ Confirmed"
    } else {
        "⏳ Pending"
    };
    let amount = crate::adapter::lenient_f64(&data["amount"]) / 1e6;

    format!(
        "🔍 TRON Transaction Details\n{}\n\
         📌 Status: {}\n\
         🔗 TX Hash: {}\n\
         📦 Block: {}\n\
         📤 From: {}\n\
         📥 To: {}\n\
         💰 Token: {}\n\
         📊 Amount: {}\n",
        "─".repeat(36),
        status,
        short(data["hash"].as_str().unwrap_or("N/A")),
        data["blockNumber"].as_u64().map_or("N/A".to_string(), |b| b.to_string()),
        short(data["fromAddress"].as_str().unwrap_or("N/A")),
        short(data["toAddress"].as_str().unwrap_or("N/A")),
        data["tokenName"].as_str().unwrap_or("TRX"),
        amount,
    )
}

pub(crate) fn format_solana_tx(data: &Value) -> String {
    let signature = data["txhash"]
        .as_str()
        .or_else(|| data["signature"].as_str())
        .unwrap_or("N/A");
    let status = match data["status"].as_i64() {
        Some(1) => "✅ Success",
        Some(0) => "❌ Failed",
        _ => "⏳ Unknown",
    };
    let fee_sol = data["fee"].as_f64().unwrap_or(0.0) / 1e9;
    let signer = data["signers"][0].as_str().map_or("N/A".to_string(), short);

    let mut text = format!(
        "🔍 Solana Transaction Details\n{}\n\
         📌 Status: {}\n\
         🔗 Signature: {}\n\
         📦 Slot: {}\n\
         📤 Signer: {}\n\
         ⛽ Fee: {:.9} SOL\n",
        "─".repeat(36),
        status,
        short(signature),
        data["slot"].as_u64().map_or("N/A".to_string(), |s| s.to_string()),
        signer,
        fee_sol,
    );

    if let Some(legs) = data["tokenTransfers"].as_array() {
        if !legs.is_empty() {
            text.push_str(&format!("\n🪙 Token Transfers ({}):\n", legs.len()));
            for leg in legs.iter().take(4) {
                text.push_str(&format!(
                    " • {} {}\n",
                    crate::adapter::lenient_f64(&leg["amount"]),
                    leg["symbol"].as_str().unwrap_or("?"),
                ));
            }
        }
    }

    text
}

pub(crate) fn format_ton_brief(data: &Value) -> String {
    format!(
        "🔍 TON Transaction Found\n{}\n\
         🔗 Hash: {}\n\
         📦 Block: {}\n",
        "─".repeat(36),
        short(data["hash"].as_str().unwrap_or("")),
        data["block_ref"]["seqno"]
            .as_u64()
            .map_or("N/A".to_string(), |s| s.to_string()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const EVM_HASH: &str = "0x4e3a3754410177e6937ef1f84bba68ea139e8d1a2258c5f85db9f1cd715a1bdd";

    #[test]
    fn test_extract_prefixed_evm_hash() {
        assert_eq!(extract_tx_hash(EVM_HASH), Some(EVM_HASH.to_string()));
        let url = format!("https://etherscan.io/tx/{EVM_HASH}");
        assert_eq!(extract_tx_hash(&url), Some(EVM_HASH.to_string()));
    }

    #[test]
    fn test_extract_bare_hex_hash() {
        let bare = &EVM_HASH[2..];
        assert_eq!(extract_tx_hash(bare), Some(bare.to_string()));
    }

    #[test]
    fn test_extract_solana_signature() {
        let sig = "5j7s6NiJS3JAkvgkoc18WVAsiSaci2pxB2A6ueCJP4tprA2TFg9wSyTLeYouxPBJEMzJinENTkpA52YStRW5Dia7";
        assert_eq!(extract_tx_hash(sig), Some(sig.to_string()));
        // A 44-char base58 run is an address, not a signature.
        assert_eq!(
            extract_tx_hash("7fUAJdStEuGbc3sM84cKRL6yYaaSstyLSU4ve5oovLS7"),
            None
        );
    }

    #[test]
    fn test_extract_nothing() {
        assert_eq!(extract_tx_hash("hello world"), None);
    }

    #[test]
    fn test_hash_kind_detection() {
        assert_eq!(detect_hash_kind(EVM_HASH), HashKind::Evm);
        assert_eq!(detect_hash_kind(&EVM_HASH[2..]), HashKind::TronOrBareEvm);
        assert_eq!(
            detect_hash_kind(
                "5j7s6NiJS3JAkvgkoc18WVAsiSaci2pxB2A6ueCJP4tprA2TFg9wSyTLeYouxPBJEMzJinENTkpA52YStRW5Dia7"
            ),
            HashKind::Solana
        );
        assert_eq!(detect_hash_kind("abc"), HashKind::Unknown);
    }

    #[test]
    fn test_evm_probe_order_prefers_major_mainnets() {
        let order = evm_probe_order();
        assert_eq!(order[0].key, "ethereum");
        assert_eq!(order[1].key, "polygon");
        // Testnets come after every mainnet.
        let first_testnet = order.iter().position(|n| n.testnet).unwrap();
        assert!(order[first_testnet..].iter().all(|n| n.testnet));
    }

    #[test]
    fn test_format_evm_receipt() {
        let network = walletwatch_core::find_network("ethereum").unwrap();
        let receipt = json!({
            "status": "0x1",
            "blockNumber": "0x112a880",
            "gasUsed": "0x5208",
            "effectiveGasPrice": "0x3b9aca00",
            "from": "0xaaaa000000000000000000000000000000000001",
            "to": "0xbbbb000000000000000000000000000000000002",
            "transactionHash": EVM_HASH,
            "logs": [],
        });

        let text = format_evm_receipt(&receipt, network);
        assert!(text.contains("✅ Success"));
        assert!(text.contains("Block: #18,000,000"));
        assert!(text.contains("Gas Used: 21,000"));
        assert!(text.contains("Gas Price: 1.00 Gwei"));
        assert!(text.contains("Fee: 0.00002100 ETH"));
    }

    #[test]
    fn test_format_tron_tx() {
        let data = json!({
            "hash": "a".repeat(64),
            "confirmed": true,
            "blockNumber": 123,
            "fromAddress": "TFrom",
            "toAddress": "TTo",
            "amount": 1_500_000,
        });

        let text = format_tron_tx(&data);
        assert!(text.contains("✅ Confirmed"));
        assert!(text.contains("Token: TRX"));
        assert!(text.contains("Amount: 1.5"));
    }

    #[test]
    fn test_group_digits() {
        assert_eq!(group_digits(0), "0");
        assert_eq!(group_digits(999), "999");
        assert_eq!(group_digits(21_000), "21,000");
        assert_eq!(group_digits(18_000_000), "18,000,000");
    }
}
