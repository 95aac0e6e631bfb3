//! Concrete adapter implementations for ports.

pub mod csv_history_adapter;
pub mod file_config_adapter;
pub mod sqlite_trade_store;
pub mod upstox_adapter;
pub mod web;
