//! Monitored wallet record and address validation.

use crate::NetworkFamily;
use serde::{Deserialize, Serialize};

/// A wallet registered for monitoring.
///
/// `(owner_id, network_key, address)` is unique in the registry.
/// `watermark_tx_id` is the transaction id most recently delivered to the
/// owner; empty means no baseline, so the next poll treats the whole provider
/// window as new.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    pub id: i64,
    pub owner_id: i64,
    pub network_key: String,
    pub address: String,
    pub label: String,
    pub watermark_tx_id: String,
}

impl Wallet {
    /// True when no transaction has ever been delivered for this wallet.
    #[inline]
    pub fn has_baseline(&self) -> bool {
        !self.watermark_tx_id.is_empty()
    }
}

pub const BASE58_ALPHABET: &str = "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// Validate an address against the format rules of a network family.
///
/// Enforced at registration; adapters re-check defensively before polling.
pub fn validate_address(address: &str, family: NetworkFamily) -> bool {
    let address = address.trim();
    match family {
        NetworkFamily::Evm => {
            address.len() == 42
                && address.starts_with("0x")
                && address[2..].chars().all(|c| c.is_ascii_hexdigit())
        }
        NetworkFamily::Tron => address.starts_with('T') && address.len() == 34,
        NetworkFamily::Ton => address.len() >= 48,
        NetworkFamily::Solana => {
            (32..=44).contains(&address.len())
                && address.chars().all(|c| BASE58_ALPHABET.contains(c))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EVM_ADDR: &str = "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045";
    const TRON_ADDR: &str = "TR7NHqjeKQxGTCi8q8ZY4pL8otSzgjLj6t";
    const SOL_ADDR: &str = "4Nd1mYQZhGyCy1rpvhoUMBHbslSZGKkEDGFx9103MBgh";

    #[test]
    fn test_validate_evm() {
        assert!(validate_address(EVM_ADDR, NetworkFamily::Evm));
        assert!(!validate_address("0x1234", NetworkFamily::Evm));
        assert!(!validate_address(&EVM_ADDR.replace("0x", "0z"), NetworkFamily::Evm));
        // Non-hex character in the body.
        assert!(!validate_address("0xZZdA6BF26964aF9D7eEd9e03E53415D37aA96045", NetworkFamily::Evm));
    }

    #[test]
    fn test_validate_tron() {
        assert!(validate_address(TRON_ADDR, NetworkFamily::Tron));
        assert!(!validate_address(&TRON_ADDR[1..], NetworkFamily::Tron));
        assert!(!validate_address(EVM_ADDR, NetworkFamily::Tron));
    }

    #[test]
    fn test_validate_ton() {
        let ton = "EQDKbjIcfM6ezt8KjKJJLshZJJSqX7XOA4ff-W72r5gqPrHF";
        assert!(ton.len() >= 48);
        assert!(validate_address(ton, NetworkFamily::Ton));
        assert!(!validate_address("short", NetworkFamily::Ton));
    }

    #[test]
    fn test_validate_solana() {
        assert!(validate_address(SOL_ADDR, NetworkFamily::Solana));
        // '0', 'O', 'I', 'l' are not in the base58 alphabet.
        assert!(!validate_address("0000000000000000000000000000000000", NetworkFamily::Solana));
        assert!(!validate_address("abc", NetworkFamily::Solana));
    }

    #[test]
    fn test_validation_trims_whitespace() {
        assert!(validate_address(&format!(" {EVM_ADDR} "), NetworkFamily::Evm));
    }

    #[test]
    fn test_wallet_baseline() {
        let mut wallet = Wallet {
            id: 1,
            owner_id: 7,
            network_key: "ethereum".to_string(),
            address: EVM_ADDR.to_string(),
            label: "cold".to_string(),
            watermark_tx_id: String::new(),
        };
        assert!(!wallet.has_baseline());
        wallet.watermark_tx_id = "0xabc".to_string();
        assert!(wallet.has_baseline());
    }
}
