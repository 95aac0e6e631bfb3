#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use chrono::{NaiveDate, Utc};
use serde_json::json;

use volguard::adapters::web::{AppState, build_router};
use volguard::domain::chain::{Greeks, OptionChain, OptionQuote, StrikeEntry};
use volguard::domain::error::VolguardError;
use volguard::domain::series::DailyClose;
use volguard::domain::trade_log::{NewTrade, TradeRecord};
use volguard::ports::broker_port::{
    BrokerPort, FundsAndMargin, MarginSegment, OrderReceipt, OrderRequest,
};
use volguard::ports::config_port::ConfigPort;
use volguard::ports::history_port::HistoryPort;
use volguard::ports::trade_store_port::TradeStorePort;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn quote(key: &str, ltp: f64, iv: f64, oi: i64) -> OptionQuote {
    OptionQuote {
        instrument_key: key.to_string(),
        ltp,
        close_price: ltp,
        bid_price: ltp - 0.5,
        ask_price: ltp + 0.5,
        bid_qty: 50,
        ask_qty: 50,
        volume: 10_000,
        oi,
        greeks: Greeks {
            delta: 0.5,
            gamma: 0.001,
            theta: -8.0,
            vega: 10.0,
            rho: 1.0,
            iv,
        },
    }
}

/// A 9-strike chain on a 50-point grid around `spot`.
pub fn sample_chain(spot: f64) -> OptionChain {
    let atm = (spot / 50.0).round() * 50.0;
    let strikes = (-4..=4)
        .map(|i| {
            let strike = atm + i as f64 * 50.0;
            StrikeEntry {
                strike,
                pcr: 1.0,
                call: Some(quote(
                    &format!("NSE_FO|C{}", strike as i64),
                    (120.0 - i as f64 * 25.0).max(3.0),
                    14.0 + i as f64 * 0.3,
                    100_000 + i as i64 * 5_000,
                )),
                put: Some(quote(
                    &format!("NSE_FO|P{}", strike as i64),
                    (120.0 + i as f64 * 25.0).max(3.0),
                    15.0 - i as f64 * 0.2,
                    110_000 - i as i64 * 5_000,
                )),
            }
        })
        .collect();

    OptionChain {
        instrument_key: "NSE_INDEX|Nifty 50".into(),
        spot,
        expiry: date(2024, 6, 27),
        strikes,
    }
}

/// Daily closes with alternating moves so volatility is non-zero.
pub fn sample_closes(n: usize) -> Vec<DailyClose> {
    let mut price = 22_000.0;
    (0..n)
        .map(|i| {
            price *= if i % 2 == 0 { 1.008 } else { 0.996 };
            DailyClose {
                date: date(2024, 1, 1) + chrono::Duration::days(i as i64),
                close: price,
            }
        })
        .collect()
}

pub struct MockBroker {
    pub chain: Option<OptionChain>,
    pub funds: FundsAndMargin,
    pub fail_orders: bool,
    pub placed: Mutex<Vec<OrderRequest>>,
}

impl Default for MockBroker {
    fn default() -> Self {
        Self {
            chain: Some(sample_chain(22_478.0)),
            funds: FundsAndMargin {
                equity: MarginSegment {
                    available_margin: 500_000.0,
                    used_margin: 0.0,
                },
                commodity: MarginSegment::default(),
            },
            fail_orders: false,
            placed: Mutex::new(Vec::new()),
        }
    }
}

impl MockBroker {
    pub fn without_chain() -> Self {
        Self {
            chain: None,
            ..Self::default()
        }
    }

    pub fn failing_orders() -> Self {
        Self {
            fail_orders: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl BrokerPort for MockBroker {
    async fn expiries(
        &self,
        _access_token: &str,
        instrument_key: &str,
    ) -> Result<Vec<NaiveDate>, VolguardError> {
        match &self.chain {
            Some(chain) => Ok(vec![chain.expiry]),
            None => Err(VolguardError::NoExpiry {
                instrument: instrument_key.to_string(),
            }),
        }
    }

    async fn option_chain(
        &self,
        _access_token: &str,
        instrument_key: &str,
        expiry: NaiveDate,
    ) -> Result<OptionChain, VolguardError> {
        self.chain.clone().ok_or(VolguardError::EmptyChain {
            instrument: instrument_key.to_string(),
            expiry: expiry.to_string(),
        })
    }

    async fn place_order(
        &self,
        _access_token: &str,
        order: &OrderRequest,
    ) -> Result<OrderReceipt, VolguardError> {
        if self.fail_orders {
            return Err(VolguardError::BrokerHttp {
                status: 400,
                body: "order rejected".into(),
            });
        }
        let mut placed = self.placed.lock().unwrap();
        placed.push(order.clone());
        Ok(OrderReceipt {
            order_id: format!("order-{}", placed.len()),
        })
    }

    async fn order_pnl(&self, _access_token: &str, _order_id: &str) -> Result<f64, VolguardError> {
        Ok(42.5)
    }

    async fn funds_and_margin(
        &self,
        _access_token: &str,
    ) -> Result<FundsAndMargin, VolguardError> {
        Ok(self.funds)
    }

    async fn profile(&self, _access_token: &str) -> Result<serde_json::Value, VolguardError> {
        Ok(json!({ "user_name": "Test Trader", "broker": "UPSTOX" }))
    }

    async fn positions(&self, _access_token: &str) -> Result<serde_json::Value, VolguardError> {
        Ok(json!([]))
    }

    async fn holdings(&self, _access_token: &str) -> Result<serde_json::Value, VolguardError> {
        Ok(json!([]))
    }
}

pub struct MockHistory {
    pub closes: Vec<DailyClose>,
}

impl MockHistory {
    pub fn new(closes: Vec<DailyClose>) -> Self {
        Self { closes }
    }
}

impl HistoryPort for MockHistory {
    fn daily_closes(&self) -> Result<Vec<DailyClose>, VolguardError> {
        Ok(self.closes.clone())
    }
}

#[derive(Default)]
pub struct MockTradeStore {
    pub trades: Mutex<Vec<TradeRecord>>,
}

impl TradeStorePort for MockTradeStore {
    fn insert_trade(&self, trade: &NewTrade) -> Result<i64, VolguardError> {
        let mut trades = self.trades.lock().unwrap();
        let id = trades.len() as i64 + 1;
        trades.push(TradeRecord {
            id,
            strategy: trade.strategy.clone(),
            entry_price: trade.entry_price,
            exit_price: trade.exit_price,
            pnl: trade.pnl,
            regime_score: trade.regime_score,
            timestamp: Utc::now(),
        });
        Ok(id)
    }

    fn list_trades(&self) -> Result<Vec<TradeRecord>, VolguardError> {
        Ok(self.trades.lock().unwrap().clone())
    }
}

pub struct MockConfig {
    pub api_token_hash: Option<String>,
}

impl MockConfig {
    pub fn open() -> Self {
        Self {
            api_token_hash: None,
        }
    }

    pub fn with_token_hash(hash: String) -> Self {
        Self {
            api_token_hash: Some(hash),
        }
    }
}

impl ConfigPort for MockConfig {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        match (section, key) {
            ("auth", "api_token_hash") => self.api_token_hash.clone(),
            ("upstox", "base_url") => Some("https://api.upstox.com".to_string()),
            _ => None,
        }
    }

    fn get_int(&self, _section: &str, _key: &str, default: i64) -> i64 {
        default
    }

    fn get_double(&self, _section: &str, _key: &str, default: f64) -> f64 {
        default
    }

    fn get_bool(&self, _section: &str, _key: &str, default: bool) -> bool {
        default
    }
}

/// Hash an API token the way `volguard hash-token` does.
pub fn hash_token(token: &str) -> String {
    use argon2::password_hash::SaltString;
    use argon2::{Argon2, PasswordHasher};
    use rand::rngs::OsRng;

    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(token.as_bytes(), &salt)
        .unwrap()
        .to_string()
}

pub fn test_app_with(broker: Arc<MockBroker>, config: MockConfig) -> Router {
    let state = AppState::new(
        broker,
        Arc::new(MockHistory::new(sample_closes(300))),
        Arc::new(MockTradeStore::default()),
        Arc::new(config),
    );
    build_router(state)
}

pub fn test_app() -> Router {
    test_app_with(Arc::new(MockBroker::default()), MockConfig::open())
}
