//! Normalized inbound transfer events.

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// One inbound transfer observed past a wallet's watermark.
///
/// Ephemeral: produced by an adapter, consumed by the dispatcher within the
/// same poll cycle. `amount_uncertain` marks transfers that were confirmed on
/// chain but whose amount could not be decoded from the provider response
/// (Solana native movements); the dispatcher still notifies, rendering the
/// amount as unknown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferEvent {
    pub tx_id: String,
    pub symbol: CompactString,
    pub amount: f64,
    pub amount_uncertain: bool,
}

impl TransferEvent {
    /// Transfer with a decoded, non-negative amount.
    pub fn new(tx_id: impl Into<String>, symbol: &str, amount: f64) -> Self {
        Self {
            tx_id: tx_id.into(),
            symbol: CompactString::new(symbol),
            amount,
            amount_uncertain: false,
        }
    }

    /// Confirmed transfer whose amount could not be decoded.
    pub fn uncertain(tx_id: impl Into<String>, symbol: &str) -> Self {
        Self {
            tx_id: tx_id.into(),
            symbol: CompactString::new(symbol),
            amount: 0.0,
            amount_uncertain: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_transfer() {
        let t = TransferEvent::new("h1", "TRX", 1.0);
        assert_eq!(t.tx_id, "h1");
        assert_eq!(t.symbol.as_str(), "TRX");
        assert!(!t.amount_uncertain);
    }

    #[test]
    fn test_uncertain_transfer() {
        let t = TransferEvent::uncertain("sig", "SOL");
        assert_eq!(t.amount, 0.0);
        assert!(t.amount_uncertain);
    }
}
