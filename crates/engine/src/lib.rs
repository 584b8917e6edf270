//! Monitoring engine for the wallet watcher.
//!
//! This crate contains the poll scheduler that drives every registered wallet
//! through its chain adapter and the dispatcher that turns new transfers into
//! user notifications.

pub mod contract;
pub mod dispatch;
pub mod monitor;

pub use contract::*;
pub use dispatch::*;
pub use monitor::*;
