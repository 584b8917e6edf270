//! Core data types for the wallet monitor.

pub mod format;
pub mod network;
pub mod transfer;
pub mod wallet;

pub use format::*;
pub use network::*;
pub use transfer::*;
pub use wallet::*;
