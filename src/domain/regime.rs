//! Composite market regime scoring.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Indicators feeding the regime score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegimeInputs {
    pub ivp: f64,
    pub pcr: f64,
    pub vix: f64,
    pub fii_net: f64,
    pub event_impact: f64,
    pub realized_vol: f64,
    pub iv_skew_slope: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RegimeClass {
    HighVolatilityEventDriven,
    TrendFollowingModerate,
    UncertainVolatile,
    LowVolatilityRangeBound,
}

impl fmt::Display for RegimeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RegimeClass::HighVolatilityEventDriven => "High Volatility / Event Driven",
            RegimeClass::TrendFollowingModerate => "Trend-Following / Moderate Volatility",
            RegimeClass::UncertainVolatile => "Uncertain/Volatile",
            RegimeClass::LowVolatilityRangeBound => "Low Volatility / Range-Bound",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegimeAssessment {
    pub score: i32,
    pub regime: RegimeClass,
    pub explanation: Vec<String>,
}

/// Score the regime. Each triggered condition contributes points and one
/// explanation line; the total is bucketed into a [`RegimeClass`].
pub fn score_regime(inputs: &RegimeInputs) -> RegimeAssessment {
    let mut score = 0;
    let mut explanation = Vec::new();

    if inputs.ivp > 70.0 {
        score += 3;
        explanation.push("Very high IVP (>70%) indicates high option premiums.".to_string());
    } else if inputs.ivp > 50.0 {
        score += 2;
        explanation.push("High IVP (>50%) indicates elevated option premiums.".to_string());
    }

    if inputs.vix > 20.0 {
        score += 3;
        explanation.push("High VIX (>20) suggests significant market fear.".to_string());
    } else if inputs.vix > 14.0 {
        score += 2;
        explanation
            .push("Elevated VIX (>14) indicates increased volatility expectations.".to_string());
    }

    if inputs.pcr > 1.5 {
        score += 2;
        explanation.push(format!("Very bullish PCR ({}).", inputs.pcr));
    } else if inputs.pcr < 0.7 {
        score += 2;
        explanation.push(format!("Very bearish PCR ({}).", inputs.pcr));
    } else if (0.9..=1.1).contains(&inputs.pcr) {
        score += 1;
        explanation.push(format!("Neutral PCR ({}).", inputs.pcr));
    }

    if inputs.fii_net > 2_000.0 {
        score += 2;
        explanation.push("Strong FII net long positioning (>2000 Cr).".to_string());
    } else if inputs.fii_net < -1_000.0 {
        score += 2;
        explanation.push("Strong FII net short positioning (<-1000 Cr).".to_string());
    }

    if inputs.event_impact > 0.7 {
        score += 3;
        explanation.push(
            "High event impact score (>0.7) indicates significant potential market moves."
                .to_string(),
        );
    } else if inputs.event_impact > 0.4 {
        score += 1;
        explanation.push("Moderate event impact score (>0.4).".to_string());
    }

    if inputs.realized_vol > 20.0 {
        score += 3;
        explanation
            .push("Very high realized volatility (>20%) indicates sharp price swings.".to_string());
    } else if inputs.realized_vol > 15.0 {
        score += 1;
        explanation.push("High realized volatility (>15%).".to_string());
    }

    if inputs.iv_skew_slope > 0.7 {
        score += 2;
        explanation.push(
            "Steep IV skew slope (>0.7) suggests bearish sentiment (puts are expensive)."
                .to_string(),
        );
    } else if inputs.iv_skew_slope < -0.3 {
        score += 1;
        explanation.push(
            "Negative IV skew slope (<-0.3) suggests bullish sentiment (calls are expensive)."
                .to_string(),
        );
    }

    let regime = if score >= 10 {
        RegimeClass::HighVolatilityEventDriven
    } else if score >= 6 {
        RegimeClass::TrendFollowingModerate
    } else if score < 3 {
        RegimeClass::LowVolatilityRangeBound
    } else {
        RegimeClass::UncertainVolatile
    };

    RegimeAssessment {
        score,
        regime,
        explanation,
    }
}
