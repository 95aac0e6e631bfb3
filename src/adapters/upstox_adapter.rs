//! Upstox REST brokerage adapter.
//!
//! Implements [`BrokerPort`] over the Upstox v2 HTTP API. The caller's
//! access token is sent as a bearer header on every request; each call is
//! retried on transport failures and 5xx responses.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, error};

use crate::domain::chain::{Greeks, OptionChain, OptionQuote, StrikeEntry};
use crate::domain::error::VolguardError;
use crate::ports::broker_port::{BrokerPort, FundsAndMargin, OrderReceipt, OrderRequest};
use crate::ports::config_port::ConfigPort;

pub const DEFAULT_BASE_URL: &str = "https://api.upstox.com";

const RETRY_ATTEMPTS: usize = 3;
const RETRY_WAIT: std::time::Duration = std::time::Duration::from_secs(2);

/// The funds API is down for broker maintenance in the early morning.
const FUNDS_WINDOW_START: (u32, u32) = (0, 0);
const FUNDS_WINDOW_END: (u32, u32) = (5, 30);

pub struct UpstoxAdapter {
    client: reqwest::Client,
    base_url: String,
}

impl UpstoxAdapter {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    pub fn from_config(config: &dyn ConfigPort) -> Self {
        let base_url = config
            .get_string("upstox", "base_url")
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self::new(base_url)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_data<T: DeserializeOwned>(
        &self,
        access_token: &str,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, VolguardError> {
        with_retry(path, || async move {
            let url = self.url(path);
            debug!(%url, "upstox GET");
            let response = self
                .client
                .get(&url)
                .bearer_auth(access_token)
                .header("Accept", "application/json")
                .query(query)
                .send()
                .await
                .map_err(|e| VolguardError::BrokerTransport {
                    reason: e.to_string(),
                })?;
            parse_envelope(response).await
        })
        .await
    }

    async fn post_data<T: DeserializeOwned>(
        &self,
        access_token: &str,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<T, VolguardError> {
        with_retry(path, || async move {
            let url = self.url(path);
            debug!(%url, "upstox POST");
            let response = self
                .client
                .post(&url)
                .bearer_auth(access_token)
                .header("Accept", "application/json")
                .json(body)
                .send()
                .await
                .map_err(|e| VolguardError::BrokerTransport {
                    reason: e.to_string(),
                })?;
            parse_envelope(response).await
        })
        .await
    }
}

fn retryable(err: &VolguardError) -> bool {
    match err {
        VolguardError::BrokerTransport { .. } => true,
        VolguardError::BrokerHttp { status, .. } => *status >= 500,
        _ => false,
    }
}

async fn with_retry<T, F, Fut>(op: &str, mut call: F) -> Result<T, VolguardError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, VolguardError>>,
{
    let mut last_err = None;
    for attempt in 1..=RETRY_ATTEMPTS {
        match call().await {
            Ok(value) => return Ok(value),
            Err(err) if retryable(&err) && attempt < RETRY_ATTEMPTS => {
                error!(op, attempt, %err, "broker call failed, retrying");
                tokio::time::sleep(RETRY_WAIT).await;
                last_err = Some(err);
            }
            Err(err) => return Err(err),
        }
    }
    Err(last_err.unwrap_or(VolguardError::BrokerTransport {
        reason: "retry loop exhausted".into(),
    }))
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: Option<T>,
}

async fn parse_envelope<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, VolguardError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        error!(status = status.as_u16(), %body, "upstox error response");
        return Err(VolguardError::BrokerHttp {
            status: status.as_u16(),
            body,
        });
    }

    let envelope: Envelope<T> =
        response
            .json()
            .await
            .map_err(|e| VolguardError::BrokerTransport {
                reason: format!("invalid response body: {e}"),
            })?;
    envelope.data.ok_or(VolguardError::BrokerTransport {
        reason: "response envelope has no data".into(),
    })
}

#[derive(Debug, Deserialize)]
struct ContractDto {
    expiry: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MarketDataDto {
    ltp: f64,
    volume: i64,
    oi: f64,
    close_price: f64,
    bid_price: f64,
    ask_price: f64,
    bid_qty: i64,
    ask_qty: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GreeksDto {
    vega: f64,
    theta: f64,
    gamma: f64,
    delta: f64,
    iv: f64,
    rho: f64,
}

#[derive(Debug, Deserialize)]
struct ChainOptionDto {
    #[serde(default)]
    instrument_key: String,
    #[serde(default)]
    market_data: MarketDataDto,
    #[serde(default)]
    option_greeks: GreeksDto,
}

#[derive(Debug, Deserialize)]
struct ChainStrikeDto {
    #[serde(default)]
    strike_price: f64,
    #[serde(default)]
    underlying_spot_price: f64,
    #[serde(default)]
    pcr: f64,
    call_options: Option<ChainOptionDto>,
    put_options: Option<ChainOptionDto>,
}

impl ChainOptionDto {
    fn into_quote(self) -> OptionQuote {
        OptionQuote {
            instrument_key: self.instrument_key,
            ltp: self.market_data.ltp,
            close_price: self.market_data.close_price,
            bid_price: self.market_data.bid_price,
            ask_price: self.market_data.ask_price,
            bid_qty: self.market_data.bid_qty,
            ask_qty: self.market_data.ask_qty,
            volume: self.market_data.volume,
            oi: self.market_data.oi as i64,
            greeks: Greeks {
                delta: self.option_greeks.delta,
                gamma: self.option_greeks.gamma,
                theta: self.option_greeks.theta,
                vega: self.option_greeks.vega,
                rho: self.option_greeks.rho,
                iv: self.option_greeks.iv,
            },
        }
    }
}

fn build_chain(
    instrument_key: &str,
    expiry: NaiveDate,
    strikes: Vec<ChainStrikeDto>,
) -> Result<OptionChain, VolguardError> {
    if strikes.is_empty() {
        return Err(VolguardError::EmptyChain {
            instrument: instrument_key.to_string(),
            expiry: expiry.to_string(),
        });
    }

    let spot = strikes
        .iter()
        .map(|s| s.underlying_spot_price)
        .find(|&s| s > 0.0)
        .ok_or_else(|| VolguardError::EmptyChain {
            instrument: instrument_key.to_string(),
            expiry: expiry.to_string(),
        })?;

    let mut entries: Vec<StrikeEntry> = strikes
        .into_iter()
        .map(|dto| StrikeEntry {
            strike: dto.strike_price,
            pcr: dto.pcr,
            call: dto.call_options.map(ChainOptionDto::into_quote),
            put: dto.put_options.map(ChainOptionDto::into_quote),
        })
        .collect();
    entries.sort_by(|a, b| a.strike.total_cmp(&b.strike));

    Ok(OptionChain {
        instrument_key: instrument_key.to_string(),
        spot,
        expiry,
        strikes: entries,
    })
}

#[derive(Debug, Deserialize)]
struct OrderDataDto {
    order_id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TradeFillDto {
    quantity: i64,
    average_price: f64,
    transaction_type: String,
}

/// Signed premium flow over an order's fills: sells credit, buys debit.
fn fill_flow(fills: &[TradeFillDto]) -> f64 {
    fills
        .iter()
        .map(|f| {
            let value = f.average_price * f.quantity as f64;
            if f.transaction_type.eq_ignore_ascii_case("SELL") {
                value
            } else {
                -value
            }
        })
        .sum()
}

fn funds_window_closed(now: NaiveTime) -> bool {
    let start = NaiveTime::from_hms_opt(FUNDS_WINDOW_START.0, FUNDS_WINDOW_START.1, 0)
        .unwrap_or(NaiveTime::MIN);
    let end = NaiveTime::from_hms_opt(FUNDS_WINDOW_END.0, FUNDS_WINDOW_END.1, 0)
        .unwrap_or(NaiveTime::MIN);
    now >= start && now <= end
}

#[async_trait]
impl BrokerPort for UpstoxAdapter {
    async fn expiries(
        &self,
        access_token: &str,
        instrument_key: &str,
    ) -> Result<Vec<NaiveDate>, VolguardError> {
        let contracts: Vec<ContractDto> = self
            .get_data(
                access_token,
                "/v2/option/contract",
                &[("instrument_key", instrument_key.to_string())],
            )
            .await?;

        let mut expiries: Vec<NaiveDate> = contracts
            .iter()
            .filter_map(|c| NaiveDate::parse_from_str(&c.expiry, "%Y-%m-%d").ok())
            .collect();
        expiries.sort();
        expiries.dedup();

        if expiries.is_empty() {
            return Err(VolguardError::NoExpiry {
                instrument: instrument_key.to_string(),
            });
        }
        Ok(expiries)
    }

    async fn option_chain(
        &self,
        access_token: &str,
        instrument_key: &str,
        expiry: NaiveDate,
    ) -> Result<OptionChain, VolguardError> {
        let strikes: Vec<ChainStrikeDto> = self
            .get_data(
                access_token,
                "/v2/option/chain",
                &[
                    ("instrument_key", instrument_key.to_string()),
                    ("expiry_date", expiry.format("%Y-%m-%d").to_string()),
                ],
            )
            .await?;

        build_chain(instrument_key, expiry, strikes)
    }

    async fn place_order(
        &self,
        access_token: &str,
        order: &OrderRequest,
    ) -> Result<OrderReceipt, VolguardError> {
        if let Some(required) = order.margin_required {
            let funds = self.funds_and_margin(access_token).await?;
            let available = funds.equity.available_margin;
            if available < required {
                return Err(VolguardError::InsufficientFunds {
                    required,
                    available,
                });
            }
        }

        let payload = json!({
            "instrument_key": order.instrument_key,
            "quantity": order.quantity,
            "product": "D",
            "order_type": order.order_type,
            "transaction_type": order.action,
            "price": order.price,
            "trigger_price": order.trigger_price,
            "disclosed_quantity": order.disclosed_quantity,
            "validity": "DAY",
            "tag": order.tag,
        });

        let data: OrderDataDto = self
            .post_data(access_token, "/v2/order/place", &payload)
            .await?;
        Ok(OrderReceipt {
            order_id: data.order_id,
        })
    }

    async fn order_pnl(&self, access_token: &str, order_id: &str) -> Result<f64, VolguardError> {
        let fills: Vec<TradeFillDto> = self
            .get_data(
                access_token,
                "/v2/order/trades",
                &[("order_id", order_id.to_string())],
            )
            .await?;
        Ok(fill_flow(&fills))
    }

    async fn funds_and_margin(
        &self,
        access_token: &str,
    ) -> Result<FundsAndMargin, VolguardError> {
        if funds_window_closed(chrono::Local::now().time()) {
            return Err(VolguardError::FundsWindowClosed);
        }
        self.get_data(access_token, "/v2/user/get-funds-and-margin", &[])
            .await
    }

    async fn profile(&self, access_token: &str) -> Result<serde_json::Value, VolguardError> {
        self.get_data(access_token, "/v2/user/profile", &[]).await
    }

    async fn positions(&self, access_token: &str) -> Result<serde_json::Value, VolguardError> {
        self.get_data(access_token, "/v2/portfolio/short-term-positions", &[])
            .await
    }

    async fn holdings(&self, access_token: &str) -> Result<serde_json::Value, VolguardError> {
        self.get_data(access_token, "/v2/portfolio/long-term-holdings", &[])
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_dto_conversion_keeps_quotes_and_greeks() {
        let raw = r#"[
            {
                "strike_price": 22500.0,
                "underlying_spot_price": 22478.5,
                "pcr": 1.1,
                "call_options": {
                    "instrument_key": "NSE_FO|54321",
                    "market_data": {
                        "ltp": 131.5, "volume": 9000, "oi": 120000.0,
                        "close_price": 128.0, "bid_price": 131.0,
                        "ask_price": 132.0, "bid_qty": 50, "ask_qty": 75
                    },
                    "option_greeks": {
                        "delta": 0.52, "gamma": 0.001, "theta": -9.1,
                        "vega": 11.2, "iv": 13.8, "rho": 1.1
                    }
                },
                "put_options": {
                    "instrument_key": "NSE_FO|54322",
                    "market_data": {"ltp": 118.0, "oi": 150000.0},
                    "option_greeks": {"iv": 14.6}
                }
            }
        ]"#;
        let dtos: Vec<ChainStrikeDto> = serde_json::from_str(raw).unwrap();
        let chain = build_chain(
            "NSE_INDEX|Nifty 50",
            NaiveDate::from_ymd_opt(2024, 6, 27).unwrap(),
            dtos,
        )
        .unwrap();

        assert_eq!(chain.spot, 22_478.5);
        let entry = &chain.strikes[0];
        assert_eq!(entry.strike, 22_500.0);
        let call = entry.call.as_ref().unwrap();
        assert_eq!(call.oi, 120_000);
        assert_eq!(call.greeks.iv, 13.8);
        let put = entry.put.as_ref().unwrap();
        assert_eq!(put.ltp, 118.0);
        assert_eq!(put.greeks.iv, 14.6);
    }

    #[test]
    fn chain_without_strikes_is_empty_chain_error() {
        let err = build_chain(
            "NSE_INDEX|Nifty 50",
            NaiveDate::from_ymd_opt(2024, 6, 27).unwrap(),
            vec![],
        )
        .unwrap_err();
        assert!(matches!(err, VolguardError::EmptyChain { .. }));
    }

    #[test]
    fn chain_without_spot_is_empty_chain_error() {
        let raw = r#"[{"strike_price": 22500.0, "underlying_spot_price": 0.0}]"#;
        let dtos: Vec<ChainStrikeDto> = serde_json::from_str(raw).unwrap();
        let err = build_chain(
            "NSE_INDEX|Nifty 50",
            NaiveDate::from_ymd_opt(2024, 6, 27).unwrap(),
            dtos,
        )
        .unwrap_err();
        assert!(matches!(err, VolguardError::EmptyChain { .. }));
    }

    #[test]
    fn fill_flow_credits_sells_and_debits_buys() {
        let fills = vec![
            TradeFillDto {
                quantity: 50,
                average_price: 130.0,
                transaction_type: "SELL".into(),
            },
            TradeFillDto {
                quantity: 50,
                average_price: 40.0,
                transaction_type: "BUY".into(),
            },
        ];
        assert_eq!(fill_flow(&fills), (130.0 - 40.0) * 50.0);
    }

    #[test]
    fn funds_window_boundaries() {
        assert!(funds_window_closed(
            NaiveTime::from_hms_opt(0, 0, 0).unwrap()
        ));
        assert!(funds_window_closed(
            NaiveTime::from_hms_opt(3, 15, 0).unwrap()
        ));
        assert!(funds_window_closed(
            NaiveTime::from_hms_opt(5, 30, 0).unwrap()
        ));
        assert!(!funds_window_closed(
            NaiveTime::from_hms_opt(5, 31, 0).unwrap()
        ));
        assert!(!funds_window_closed(
            NaiveTime::from_hms_opt(14, 0, 0).unwrap()
        ));
    }

    #[test]
    fn retryable_classification() {
        assert!(retryable(&VolguardError::BrokerTransport {
            reason: "timeout".into()
        }));
        assert!(retryable(&VolguardError::BrokerHttp {
            status: 503,
            body: String::new()
        }));
        assert!(!retryable(&VolguardError::BrokerHttp {
            status: 401,
            body: String::new()
        }));
        assert!(!retryable(&VolguardError::FundsWindowClosed));
    }
}
