//! Web handler integration tests over mocked ports.

mod common;

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, Response, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use common::*;

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn json_request(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_endpoint_is_open() {
    let app = test_app();
    let response = app.oneshot(get_request("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
}

mod market_data_tests {
    use super::*;

    #[tokio::test]
    async fn option_chain_returns_snapshot() {
        let app = test_app();
        let response = app
            .oneshot(json_request(
                "/market-data/option-chain",
                json!({ "access_token": "token" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["instrument_key"], "NSE_INDEX|Nifty 50");
        assert_eq!(body["spot"], 22_478.0);
        assert_eq!(body["atm_strike"], 22_500.0);
        assert_eq!(body["expiry"], "2024-06-27");
        assert_eq!(body["iv_skew_data"].as_array().unwrap().len(), 9);
        assert!(body["straddle_price"].as_f64().unwrap() > 0.0);
        assert!(body["pcr"].as_f64().unwrap() > 0.0);
        assert!(body["realized_volatility"].as_f64().unwrap() > 0.0);
    }

    #[tokio::test]
    async fn option_chain_without_contracts_is_unprocessable() {
        let app = test_app_with(Arc::new(MockBroker::without_chain()), MockConfig::open());
        let response = app
            .oneshot(json_request(
                "/market-data/option-chain",
                json!({ "access_token": "token" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn option_chain_requires_access_token_field() {
        let app = test_app();
        let response = app
            .oneshot(json_request("/market-data/option-chain", json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}

mod volatility_tests {
    use super::*;

    #[tokio::test]
    async fn forecast_predicts_from_features() {
        let app = test_app();
        let response = app
            .oneshot(json_request(
                "/volatility/forecast",
                json!({
                    "atm_iv": 14.0,
                    "realized_vol": 12.0,
                    "ivp": 45.0,
                    "event_impact_score": 0.3,
                    "fii_dii_net_long": 1000.0,
                    "pcr": 1.05,
                    "vix": 13.0
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        let predicted = body["predicted_volatility_7d"].as_f64().unwrap();
        assert!(predicted > 2.0 && predicted < 120.0, "predicted = {predicted}");
    }

    #[tokio::test]
    async fn garch_returns_seven_points() {
        let app = test_app();
        let response = app.oneshot(get_request("/volatility/garch")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["horizon_days"], 7);
        assert_eq!(body["forecast"].as_array().unwrap().len(), 7);
    }

    #[tokio::test]
    async fn historical_defaults_to_all_periods() {
        let app = test_app();
        let response = app
            .oneshot(get_request("/volatility/historical"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert!(body["hv_7d"].is_number());
        assert!(body["hv_30d"].is_number());
        assert!(body["hv_1y"].is_number());
    }

    #[tokio::test]
    async fn historical_single_period() {
        let app = test_app();
        let response = app
            .oneshot(get_request("/volatility/historical?period=30d"))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert!(body["hv_30d"].is_number());
        assert!(body.get("hv_7d").is_none());
    }

    #[tokio::test]
    async fn historical_rejects_unknown_period() {
        let app = test_app();
        let response = app
            .oneshot(get_request("/volatility/historical?period=90d"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}

mod strategy_tests {
    use super::*;

    #[tokio::test]
    async fn suggest_classifies_regime() {
        let app = test_app();
        let response = app
            .oneshot(json_request(
                "/strategy/suggest",
                json!({
                    "ivp": 65.0,
                    "vix": 19.0,
                    "pcr": 1.0,
                    "straddle_price": 240.0,
                    "event_impact_score": 0.2,
                    "atm_iv": 18.0,
                    "realized_vol": 14.0,
                    "iv_skew_slope": 0.2
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["regime"], "HighVolatilityExpansion");
        assert!(!body["suggested_strategies"].as_array().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn execute_places_all_legs() {
        let broker = Arc::new(MockBroker::default());
        let app = test_app_with(broker.clone(), MockConfig::open());

        let response = app
            .oneshot(json_request(
                "/strategy/execute",
                json!({
                    "access_token": "token",
                    "strategy_name": "iron_fly",
                    "spot_price": 22_478.0,
                    "quantity": 50,
                    "otm_distance": 50.0,
                    "option_chain": serde_json::to_value(sample_chain(22_478.0)).unwrap()
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["order_results"].as_array().unwrap().len(), 4);
        assert_eq!(body["legs_attempted"].as_array().unwrap().len(), 4);
        assert_eq!(body["trade_pnl_simulation"], 4.0 * 42.5);
        assert_eq!(body["estimated_max_loss"], 2_500.0);
        assert_eq!(broker.placed.lock().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn execute_rejects_unknown_strategy() {
        let app = test_app();
        let response = app
            .oneshot(json_request(
                "/strategy/execute",
                json!({
                    "access_token": "token",
                    "strategy_name": "calendar_spread",
                    "spot_price": 22_478.0,
                    "quantity": 50,
                    "otm_distance": 50.0,
                    "option_chain": serde_json::to_value(sample_chain(22_478.0)).unwrap()
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test(start_paused = true)]
    async fn execute_with_rejected_orders_reports_empty_results() {
        let app = test_app_with(Arc::new(MockBroker::failing_orders()), MockConfig::open());
        let response = app
            .oneshot(json_request(
                "/strategy/execute",
                json!({
                    "access_token": "token",
                    "strategy_name": "iron_condor",
                    "spot_price": 22_478.0,
                    "quantity": 50,
                    "otm_distance": 50.0,
                    "option_chain": serde_json::to_value(sample_chain(22_478.0)).unwrap()
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert!(body["order_results"].as_array().unwrap().is_empty());
        assert_eq!(body["legs_attempted"].as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn backtest_reports_daily_history() {
        let app = test_app();
        let response = app
            .oneshot(json_request(
                "/strategy/backtest",
                json!({ "strategy_name": "iron_fly", "quantity": 50, "period": 30 }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert!(!body["pnl_history"].as_array().unwrap().is_empty());
        assert!(body["win_rate"].as_f64().unwrap() >= 0.0);
        assert!(body["max_drawdown"].as_f64().unwrap() >= 0.0);
    }
}

mod analytics_tests {
    use super::*;

    #[tokio::test]
    async fn log_trade_then_aggregate_performance() {
        let app = test_app();

        let response = app
            .clone()
            .oneshot(json_request(
                "/analytics/trades",
                json!({
                    "strategy": "iron_fly",
                    "entry_price": 210.0,
                    "exit_price": 180.0,
                    "pnl": 1500.0,
                    "regime_score": 6.0
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "success");
        assert_eq!(body["trade_id"], 1);

        let response = app
            .oneshot(get_request("/analytics/performance"))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["total_trades"], 1);
        assert_eq!(body["total_pnl"], 1500.0);
        assert_eq!(body["winning_trades"], 1);
        assert_eq!(body["losing_trades"], 0);
    }

    #[tokio::test]
    async fn performance_empty_log() {
        let app = test_app();
        let response = app
            .oneshot(get_request("/analytics/performance"))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["total_trades"], 0);
        assert_eq!(body["total_pnl"], 0.0);
    }

    #[tokio::test]
    async fn risk_check_blocks_oversized_loss() {
        let app = test_app();
        let response = app
            .oneshot(json_request(
                "/analytics/risk-check",
                json!({
                    "strategy": "iron_fly",
                    "max_loss_allowed": 5000.0,
                    "estimated_loss": 8000.0,
                    "daily_pnl": 0.0,
                    "max_daily_limit": 20000.0,
                    "iv_rv_ratio": 1.0
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["status"], "BLOCK");
        assert!(!body["alerts"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn regime_score_explains_itself() {
        let app = test_app();
        let response = app
            .oneshot(json_request(
                "/analytics/regime-score",
                json!({
                    "ivp": 80.0,
                    "pcr": 1.6,
                    "vix": 24.0,
                    "fii_net": -2500.0,
                    "event_impact": 0.9,
                    "realized_vol": 25.0,
                    "iv_skew_slope": 0.9
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["regime_score"], 18);
        assert_eq!(body["regime"], "High Volatility / Event Driven");
        assert_eq!(body["explanation"].as_array().unwrap().len(), 7);
    }

    #[tokio::test]
    async fn discipline_starts_at_one_hundred() {
        let app = test_app();
        let response = app
            .oneshot(get_request("/analytics/discipline"))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["score"], 100);
        assert!(body["violations"].as_array().unwrap().is_empty());
    }
}

mod trade_and_user_tests {
    use super::*;

    #[tokio::test]
    async fn place_order_returns_receipt() {
        let broker = Arc::new(MockBroker::default());
        let app = test_app_with(broker.clone(), MockConfig::open());
        let response = app
            .oneshot(json_request(
                "/trade/place-order",
                json!({
                    "access_token": "token",
                    "instrument_key": "NSE_FO|C22500",
                    "quantity": 50,
                    "action": "SELL"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["order_id"], "order-1");

        let placed = broker.placed.lock().unwrap();
        assert_eq!(placed.len(), 1);
        assert_eq!(placed[0].tag, "volguard");
    }

    #[tokio::test]
    async fn order_pnl_passthrough() {
        let app = test_app();
        let response = app
            .oneshot(json_request(
                "/trade/pnl",
                json!({ "access_token": "token", "order_id": "order-1" }),
            ))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["pnl"], 42.5);
    }

    #[tokio::test]
    async fn funds_margin_reports_equity() {
        let app = test_app();
        let response = app
            .oneshot(json_request(
                "/trade/funds-margin",
                json!({ "access_token": "token" }),
            ))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["equity"]["available_margin"], 500_000.0);
    }

    #[tokio::test]
    async fn user_details_combines_account_data() {
        let app = test_app();
        let response = app
            .oneshot(json_request(
                "/user/details",
                json!({ "access_token": "token" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["profile"]["user_name"], "Test Trader");
        assert!(body["funds"]["equity"]["available_margin"].is_number());
        assert!(body["positions"].is_array());
        assert!(body["holdings"].is_array());
    }
}
