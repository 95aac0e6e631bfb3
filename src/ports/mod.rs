//! Port traits decoupling the domain from the outside world.

pub mod broker_port;
pub mod config_port;
pub mod history_port;
pub mod trade_store_port;
