//! Command implementations and terminal output

pub mod connection;
pub mod currencies;
pub mod rates;
pub mod setup;
pub mod sweep;
pub mod sync;
pub mod ui;
