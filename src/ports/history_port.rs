//! Historical close-series access port trait.

use crate::domain::error::VolguardError;
use crate::domain::series::DailyClose;

pub trait HistoryPort {
    /// All known daily closes of the underlying, ascending by date.
    fn daily_closes(&self) -> Result<Vec<DailyClose>, VolguardError>;
}
