//! Linear 7-day volatility forecast.
//!
//! A fixed-weight linear model over the market features the desk tracks.
//! Weights were calibrated offline against realized 7-day volatility.

use serde::{Deserialize, Serialize};

/// Feature vector for the volatility forecast.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastInputs {
    pub atm_iv: f64,
    pub realized_vol: f64,
    pub ivp: f64,
    pub event_impact_score: f64,
    pub fii_dii_net_long: f64,
    pub pcr: f64,
    pub vix: f64,
}

impl ForecastInputs {
    fn to_vector(self) -> [f64; 7] {
        [
            self.atm_iv,
            self.realized_vol,
            self.ivp,
            self.event_impact_score,
            self.fii_dii_net_long,
            self.pcr,
            self.vix,
        ]
    }
}

/// Fixed-weight linear forecaster. Output is an annualized percent
/// volatility clamped to a plausible band.
#[derive(Debug, Clone)]
pub struct LinearForecaster {
    weights: [f64; 7],
    bias: f64,
    min_vol: f64,
    max_vol: f64,
}

impl Default for LinearForecaster {
    fn default() -> Self {
        Self {
            // atm_iv, realized_vol, ivp, event_impact, fii_net, pcr, vix
            weights: [0.45, 0.35, 0.04, 2.5, 0.0002, 1.2, 0.08],
            bias: 0.0,
            min_vol: 2.0,
            max_vol: 120.0,
        }
    }
}

impl LinearForecaster {
    pub fn new(weights: [f64; 7], bias: f64) -> Self {
        Self {
            weights,
            bias,
            ..Self::default()
        }
    }

    /// Predicted 7-day volatility in percent.
    pub fn predict(&self, inputs: &ForecastInputs) -> f64 {
        let x = inputs.to_vector();
        let raw: f64 = x
            .iter()
            .zip(self.weights.iter())
            .map(|(xi, wi)| xi * wi)
            .sum::<f64>()
            + self.bias;
        raw.clamp(self.min_vol, self.max_vol)
    }
}
