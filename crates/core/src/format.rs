//! Display helpers shared by notifications and bot replies.

use crate::TransferEvent;

/// Shorten an address or tx id to `prefix...suffix` for chat display.
pub fn short(id: &str) -> String {
    if id.len() <= 10 {
        return id.to_string();
    }
    format!("{}...{}", &id[..6], &id[id.len() - 4..])
}

/// 8-decimal fixed-point amount, or a placeholder when undecodable.
pub fn format_amount(event: &TransferEvent) -> String {
    if event.amount > 0.0 {
        format!("{:.8}", event.amount)
    } else {
        "Check TX for details".to_string()
    }
}

/// USD value string, or an em-dash when price or amount is unknown.
pub fn format_usd(event: &TransferEvent, price: f64) -> String {
    if event.amount > 0.0 && price > 0.0 {
        format!("${:.2}", event.amount * price)
    } else {
        "—".to_string()
    }
}
