//! Domain error types.

/// Top-level error type for volguard.
#[derive(Debug, thiserror::Error)]
pub enum VolguardError {
    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("database query error: {reason}")]
    DatabaseQuery { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("history data error in {source_name}: {reason}")]
    History { source_name: String, reason: String },

    #[error("insufficient data for {context}: have {have}, need {need}")]
    InsufficientData {
        context: String,
        have: usize,
        need: usize,
    },

    #[error("no option contracts found for {instrument}")]
    NoExpiry { instrument: String },

    #[error("empty option chain for {instrument} expiring {expiry}")]
    EmptyChain { instrument: String, expiry: String },

    #[error("unknown strategy: {name}")]
    UnknownStrategy { name: String },

    #[error("no valid legs could be built for {strategy}")]
    NoLegs { strategy: String },

    #[error("GARCH fit failed: {reason}")]
    GarchFit { reason: String },

    #[error("insufficient funds: required {required:.2}, available {available:.2}")]
    InsufficientFunds { required: f64, available: f64 },

    #[error("broker returned HTTP {status}: {body}")]
    BrokerHttp { status: u16, body: String },

    #[error("broker request failed: {reason}")]
    BrokerTransport { reason: String },

    #[error("funds and margin API is unavailable between 00:00 and 05:30")]
    FundsWindowClosed,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&VolguardError> for std::process::ExitCode {
    fn from(err: &VolguardError) -> Self {
        let code: u8 = match err {
            VolguardError::Io(_) => 1,
            VolguardError::ConfigParse { .. }
            | VolguardError::ConfigMissing { .. }
            | VolguardError::ConfigInvalid { .. } => 2,
            VolguardError::Database { .. } | VolguardError::DatabaseQuery { .. } => 3,
            VolguardError::UnknownStrategy { .. } | VolguardError::NoLegs { .. } => 4,
            VolguardError::History { .. }
            | VolguardError::InsufficientData { .. }
            | VolguardError::NoExpiry { .. }
            | VolguardError::EmptyChain { .. }
            | VolguardError::GarchFit { .. } => 5,
            VolguardError::InsufficientFunds { .. }
            | VolguardError::BrokerHttp { .. }
            | VolguardError::BrokerTransport { .. }
            | VolguardError::FundsWindowClosed => 6,
        };
        std::process::ExitCode::from(code)
    }
}
