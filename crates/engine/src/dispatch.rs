//! Turns diffed transfers into user notifications.

use crate::contract::MessageTransport;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info};
use walletwatch_core::{
    format_amount, format_usd, short, NetworkDescriptor, TransferEvent, Wallet,
};
use walletwatch_feeds::PriceOracle;

/// Pause between consecutive messages to one owner, to stay under chat
/// rate limits.
const SEND_DELAY: Duration = Duration::from_millis(500);

/// Sends one message per new transfer and reports the watermark to persist.
pub struct NotificationDispatcher {
    oracle: Arc<PriceOracle>,
    transport: Arc<dyn MessageTransport>,
    send_delay: Duration,
}

impl NotificationDispatcher {
    pub fn new(oracle: Arc<PriceOracle>, transport: Arc<dyn MessageTransport>) -> Self {
        Self {
            oracle,
            transport,
            send_delay: SEND_DELAY,
        }
    }

    /// Notify the wallet owner about each event, oldest first.
    ///
    /// `events` arrive newest-first from the adapter. Returns the tx id to
    /// persist as the new watermark, which is always the newest event seen
    /// this cycle; a failed send is logged and skipped, it does not hold the
    /// watermark back. `None` when there was nothing to send.
    pub async fn dispatch(
        &self,
        wallet: &Wallet,
        network: &NetworkDescriptor,
        events: &[TransferEvent],
    ) -> Option<String> {
        let newest = events.first()?;

        info!(
            wallet_id = wallet.id,
            label = %wallet.label,
            network = network.key,
            count = events.len(),
            "new transfers found"
        );

        for event in events.iter().rev() {
            let price = self.oracle.price_usd(event.symbol.as_str()).await;
            let text = format_transfer_message(wallet, network, event, price);

            match self.transport.send(wallet.owner_id, &text).await {
                Ok(()) => info!(
                    owner = wallet.owner_id,
                    amount = event.amount,
                    symbol = %event.symbol,
                    "alert sent"
                ),
                Err(e) => error!(
                    owner = wallet.owner_id,
                    error = %e,
                    "failed to send alert"
                ),
            }

            sleep(self.send_delay).await;
        }

        Some(newest.tx_id.clone())
    }
}

/// Render one payment notification.
pub fn format_transfer_message(
    wallet: &Wallet,
    network: &NetworkDescriptor,
    event: &TransferEvent,
    price: f64,
) -> String {
    format!(
        "💸 Payment Received!\n\n\
         🏷 Wallet: {}\n\
         🌐 Network: {}\n\
         💰 Token: {}\n\
         📊 Amount: {}\n\
         💵 Value: {}\n\n\
         📍 {}\n\
         🔗 TX: {}",
        wallet.label,
        network.display_name,
        event.symbol,
        format_amount(event),
        format_usd(event, price),
        short(&wallet.address),
        short(&event.tx_id),
    )
}
