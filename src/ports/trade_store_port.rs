//! Trade log storage port trait.

use crate::domain::error::VolguardError;
use crate::domain::trade_log::{NewTrade, TradeRecord};

pub trait TradeStorePort {
    /// Persist a trade and return its assigned id.
    fn insert_trade(&self, trade: &NewTrade) -> Result<i64, VolguardError>;

    /// All logged trades, oldest first.
    fn list_trades(&self) -> Result<Vec<TradeRecord>, VolguardError>;
}
