//! GARCH(1,1) volatility model.
//!
//! Fit by maximum likelihood with numerical gradients on percent log
//! returns. The conditional variance recursion is
//! sigma2[t] = omega + alpha * eps[t-1]^2 + beta * sigma2[t-1],
//! stationary while alpha + beta < 1.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::Serialize;

use super::error::VolguardError;
use super::series::{DailyClose, log_returns};

const VARIANCE_FLOOR: f64 = 1e-10;
const MIN_RETURNS: usize = 10;
const MAX_ITER: usize = 500;
const LEARNING_RATE: f64 = 0.001;
const GRAD_EPS: f64 = 1e-5;
const CONVERGENCE_TOL: f64 = 1e-6;

#[derive(Debug, Clone)]
pub struct GarchModel {
    pub omega: f64,
    pub alpha: f64,
    pub beta: f64,
    pub mu: f64,
    last_variance: f64,
    last_residual_sq: f64,
    unconditional_var: f64,
}

impl GarchModel {
    /// Fit on percent log returns (returns * 100).
    pub fn fit(returns: &[f64]) -> Result<Self, VolguardError> {
        if returns.len() < MIN_RETURNS {
            return Err(VolguardError::InsufficientData {
                context: "GARCH returns".into(),
                have: returns.len(),
                need: MIN_RETURNS,
            });
        }

        let n = returns.len() as f64;
        let mu = returns.iter().sum::<f64>() / n;
        let residuals: Vec<f64> = returns.iter().map(|r| r - mu).collect();
        let unconditional_var =
            residuals.iter().map(|e| e * e).sum::<f64>() / n;

        if unconditional_var <= VARIANCE_FLOOR {
            return Err(VolguardError::GarchFit {
                reason: "returns have no variance".into(),
            });
        }

        let mut omega = unconditional_var * 0.1;
        let mut alpha = 0.1;
        let mut beta = 0.8;
        let mut prev_ll = f64::NEG_INFINITY;

        for _ in 0..MAX_ITER {
            let sigma2 = conditional_variance(&residuals, omega, alpha, beta, unconditional_var);
            let ll = log_likelihood(&residuals, &sigma2);
            if (ll - prev_ll).abs() < CONVERGENCE_TOL {
                break;
            }
            prev_ll = ll;

            let grad = |o: f64, a: f64, b: f64| {
                let s2 = conditional_variance(&residuals, o, a, b, unconditional_var);
                (log_likelihood(&residuals, &s2) - ll) / GRAD_EPS
            };

            omega = (omega + LEARNING_RATE * grad(omega + GRAD_EPS, alpha, beta)).max(1e-8);
            alpha = (alpha + LEARNING_RATE * grad(omega, alpha + GRAD_EPS, beta)).clamp(0.0, 0.99);
            beta = (beta + LEARNING_RATE * grad(omega, alpha, beta + GRAD_EPS)).clamp(0.0, 0.99);

            // keep the process stationary
            let persistence = alpha + beta;
            if persistence >= 0.999 {
                let scale = 0.99 / persistence;
                alpha *= scale;
                beta *= scale;
            }
        }

        let sigma2 = conditional_variance(&residuals, omega, alpha, beta, unconditional_var);
        let last_variance = *sigma2.last().unwrap_or(&unconditional_var);
        let last_residual_sq = residuals.last().map(|e| e * e).unwrap_or(unconditional_var);

        Ok(Self {
            omega,
            alpha,
            beta,
            mu,
            last_variance,
            last_residual_sq,
            unconditional_var,
        })
    }

    pub fn persistence(&self) -> f64 {
        self.alpha + self.beta
    }

    pub fn is_stable(&self) -> bool {
        self.persistence() < 1.0
    }

    fn long_run_variance(&self) -> f64 {
        if self.is_stable() {
            self.omega / (1.0 - self.persistence())
        } else {
            self.unconditional_var
        }
    }

    /// Conditional variance forecast per step. The first step uses the last
    /// residual and variance; later steps mean-revert toward the long-run
    /// variance at rate persistence^h.
    pub fn forecast_variance(&self, horizon: usize) -> Vec<f64> {
        let long_run = self.long_run_variance();
        let mut out = Vec::with_capacity(horizon);
        let mut sigma2 = self.last_variance;
        for step in 0..horizon {
            if step == 0 {
                sigma2 = self.omega + self.alpha * self.last_residual_sq + self.beta * sigma2;
            } else {
                sigma2 = long_run + self.persistence().powi(step as i32) * (sigma2 - long_run);
            }
            out.push(sigma2.max(VARIANCE_FLOOR));
        }
        out
    }
}

fn conditional_variance(
    residuals: &[f64],
    omega: f64,
    alpha: f64,
    beta: f64,
    unconditional_var: f64,
) -> Vec<f64> {
    let mut sigma2 = vec![unconditional_var; residuals.len()];
    for t in 1..residuals.len() {
        let var = omega + alpha * residuals[t - 1].powi(2) + beta * sigma2[t - 1];
        sigma2[t] = var.max(VARIANCE_FLOOR);
    }
    sigma2
}

fn log_likelihood(residuals: &[f64], sigma2: &[f64]) -> f64 {
    let mut ll = 0.0;
    for (e, &s2) in residuals.iter().zip(sigma2) {
        if s2 > 0.0 {
            ll -= 0.5 * (s2.ln() + e * e / s2);
        }
    }
    ll - 0.5 * residuals.len() as f64 * (2.0 * std::f64::consts::PI).ln()
}

/// One forecast step: an annualized volatility for a future business day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GarchPoint {
    pub date: NaiveDate,
    pub forecast_volatility: f64,
}

fn next_business_day(mut date: NaiveDate) -> NaiveDate {
    loop {
        date += chrono::Duration::days(1);
        match date.weekday() {
            Weekday::Sat | Weekday::Sun => continue,
            _ => return date,
        }
    }
}

/// Fit GARCH(1,1) on daily closes and forecast annualized volatility for the
/// next `horizon` business days.
pub fn forecast_annualized(
    closes: &[DailyClose],
    horizon: usize,
) -> Result<Vec<GarchPoint>, VolguardError> {
    let returns: Vec<f64> = log_returns(closes).iter().map(|r| r * 100.0).collect();
    let model = GarchModel::fit(&returns)?;

    let last_date = closes
        .last()
        .map(|c| c.date)
        .ok_or_else(|| VolguardError::InsufficientData {
            context: "GARCH closes".into(),
            have: 0,
            need: MIN_RETURNS + 1,
        })?;

    let mut date = last_date;
    let points = model
        .forecast_variance(horizon)
        .iter()
        .map(|&var| {
            date = next_business_day(date);
            let vol = var.sqrt() * (252.0_f64).sqrt();
            GarchPoint {
                date,
                forecast_volatility: (vol * 100.0).round() / 100.0,
            }
        })
        .collect();

    Ok(points)
}
