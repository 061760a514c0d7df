use anyhow::{ensure, Context};
use chrono::{Datelike, Days, NaiveDate};
use serde::Deserialize;
use std::f64::consts::PI;
use std::path::Path;

use crate::domain::sales::{SalesForecastPoint, MAX_FORECAST_DAYS};
use crate::models::Forecaster;

const KIND: &str = "additive";
const YEAR_DAYS: f64 = 365.25;

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Trend {
    pub offset: f64,
    pub slope_per_day: f64,
}

/// One Fourier pair of the yearly seasonality.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct FourierTerm {
    pub a: f64,
    pub b: f64,
}

/// Additive daily sales model: linear trend + weekly effect + yearly Fourier seasonality, with a
/// residual-based uncertainty interval.
#[derive(Debug, Clone, Deserialize)]
pub struct AdditiveForecaster {
    pub kind: String,
    pub history_start: NaiveDate,
    /// Last date seen during training; forecasts start the day after.
    pub last_date: NaiveDate,
    pub trend: Trend,
    /// Monday first.
    pub weekly: Vec<f64>,
    #[serde(default)]
    pub yearly: Vec<FourierTerm>,
    pub sigma: f64,
    pub interval_width: f64,
    #[serde(default)]
    pub trend_uncertainty: f64,
}

impl AdditiveForecaster {
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read forecaster artifact {}", path.display()))?;
        Self::from_json(&text)
            .with_context(|| format!("invalid forecaster artifact {}", path.display()))
    }

    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        let model = serde_json::from_str::<Self>(text)
            .context("forecaster artifact does not match the expected schema")?;
        model.validate()?;
        Ok(model)
    }

    fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            self.kind == KIND,
            "unsupported forecaster kind '{}' (expected '{KIND}')",
            self.kind
        );
        ensure!(
            self.last_date >= self.history_start,
            "last_date {} precedes history_start {}",
            self.last_date,
            self.history_start
        );
        ensure!(
            self.last_date
                .checked_add_days(Days::new(u64::from(MAX_FORECAST_DAYS)))
                .is_some(),
            "last_date {} leaves no room for a {MAX_FORECAST_DAYS}-day horizon",
            self.last_date
        );
        ensure!(
            self.weekly.len() == 7,
            "weekly seasonality must have 7 entries (got {})",
            self.weekly.len()
        );
        ensure!(
            self.sigma.is_finite() && self.sigma >= 0.0,
            "sigma must be >= 0 (got {})",
            self.sigma
        );
        ensure!(
            self.interval_width > 0.0 && self.interval_width < 1.0,
            "interval_width must be in (0, 1) (got {})",
            self.interval_width
        );
        ensure!(
            self.trend_uncertainty.is_finite() && self.trend_uncertainty >= 0.0,
            "trend_uncertainty must be >= 0 (got {})",
            self.trend_uncertainty
        );

        let params = [self.trend.offset, self.trend.slope_per_day]
            .into_iter()
            .chain(self.weekly.iter().copied())
            .chain(self.yearly.iter().flat_map(|t| [t.a, t.b]));
        for p in params {
            ensure!(p.is_finite(), "forecaster has non-finite parameters");
        }

        Ok(())
    }

    fn yhat(&self, date: NaiveDate) -> f64 {
        let t = (date - self.history_start).num_days() as f64;
        let weekday = date.weekday().num_days_from_monday() as usize;

        let yearly: f64 = self
            .yearly
            .iter()
            .enumerate()
            .map(|(i, term)| {
                let w = 2.0 * PI * (i + 1) as f64 * t / YEAR_DAYS;
                term.a * w.cos() + term.b * w.sin()
            })
            .sum();

        self.trend.offset + self.trend.slope_per_day * t + self.weekly[weekday] + yearly
    }

    fn half_width(&self, step: u32) -> f64 {
        z_score(self.interval_width)
            * self.sigma
            * (1.0 + self.trend_uncertainty * f64::from(step)).sqrt()
    }
}

impl Forecaster for AdditiveForecaster {
    fn last_date(&self) -> NaiveDate {
        self.last_date
    }

    /// `validate` guarantees every date up to `MAX_FORECAST_DAYS` steps ahead exists.
    fn forecast(&self, days: u32) -> Vec<SalesForecastPoint> {
        (1..=days)
            .filter_map(|step| {
                let date = self.last_date.checked_add_days(Days::new(u64::from(step)))?;
                let yhat = self.yhat(date);
                let half = self.half_width(step);
                Some(SalesForecastPoint {
                    date,
                    sales_forecast: yhat,
                    lower_bound: yhat - half,
                    upper_bound: yhat + half,
                })
            })
            .collect()
    }
}

/// Two-sided normal quantile for common interval widths.
fn z_score(interval_width: f64) -> f64 {
    match interval_width {
        x if x >= 0.99 => 2.576,
        x if x >= 0.95 => 1.96,
        x if x >= 0.90 => 1.645,
        x if x >= 0.80 => 1.282,
        x if x >= 0.50 => 0.674,
        _ => 0.253,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn flat_model(sigma: f64) -> AdditiveForecaster {
        AdditiveForecaster::from_json(
            &json!({
                "kind": "additive",
                "history_start": "2024-01-01",
                "last_date": "2024-12-31",
                "trend": {"offset": 10.0, "slope_per_day": 0.0},
                "weekly": [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
                "sigma": sigma,
                "interval_width": 0.95,
            })
            .to_string(),
        )
        .unwrap()
    }

    #[test]
    fn starts_the_day_after_training_and_is_contiguous() {
        let m = flat_model(1.0);
        let points = m.forecast(3);
        let dates: Vec<String> = points.iter().map(|p| p.date.to_string()).collect();
        assert_eq!(dates, vec!["2025-01-01", "2025-01-02", "2025-01-03"]);
    }

    #[test]
    fn rejects_last_date_without_a_full_horizon() {
        let mut m = flat_model(1.0);
        m.last_date = NaiveDate::MAX - Days::new(10);
        let err = m.validate().unwrap_err();
        assert!(err.to_string().contains("horizon"), "{err:#}");

        m.last_date = NaiveDate::MAX - Days::new(u64::from(MAX_FORECAST_DAYS));
        assert!(m.validate().is_ok());
        assert_eq!(m.forecast(MAX_FORECAST_DAYS).len(), MAX_FORECAST_DAYS as usize);
    }

    #[test]
    fn flat_model_has_symmetric_interval() {
        let m = flat_model(2.0);
        for p in m.forecast(5) {
            assert!((p.sales_forecast - 10.0).abs() < 1e-9);
            assert!((p.upper_bound - 10.0 - 1.96 * 2.0).abs() < 1e-9);
            assert!((10.0 - p.lower_bound - 1.96 * 2.0).abs() < 1e-9);
        }
    }

    #[test]
    fn weekly_effect_follows_weekday() {
        let mut m = flat_model(0.0);
        m.weekly = vec![0.0, 0.0, 5.0, 0.0, 0.0, 0.0, 0.0];
        // 2025-01-01 is a Wednesday.
        let points = m.forecast(2);
        assert!((points[0].sales_forecast - 15.0).abs() < 1e-9);
        assert!((points[1].sales_forecast - 10.0).abs() < 1e-9);
    }

    #[test]
    fn interval_widens_with_trend_uncertainty() {
        let mut m = flat_model(1.0);
        m.trend_uncertainty = 0.1;
        let points = m.forecast(10);
        let w0 = points[0].upper_bound - points[0].lower_bound;
        let w9 = points[9].upper_bound - points[9].lower_bound;
        assert!(w9 > w0);
    }

    #[test]
    fn rejects_malformed_artifacts() {
        let short_weekly = json!({
            "kind": "additive",
            "history_start": "2024-01-01",
            "last_date": "2024-12-31",
            "trend": {"offset": 10.0, "slope_per_day": 0.0},
            "weekly": [0.0, 0.0],
            "sigma": 1.0,
            "interval_width": 0.8,
        });
        assert!(AdditiveForecaster::from_json(&short_weekly.to_string()).is_err());

        let reversed = json!({
            "kind": "additive",
            "history_start": "2025-01-01",
            "last_date": "2024-12-31",
            "trend": {"offset": 10.0, "slope_per_day": 0.0},
            "weekly": [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            "sigma": 1.0,
            "interval_width": 0.8,
        });
        assert!(AdditiveForecaster::from_json(&reversed.to_string()).is_err());

        assert!(AdditiveForecaster::from_json("not json").is_err());
    }
}
