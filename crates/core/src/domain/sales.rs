use chrono::NaiveDate;
use serde::Serialize;

/// Largest forecast horizon accepted by `/api/predict/sales`.
pub const MAX_FORECAST_DAYS: u32 = 365;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SalesForecastRequest {
    pub days: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesForecastPoint {
    pub date: NaiveDate,
    pub sales_forecast: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
}

impl SalesForecastPoint {
    /// Sales cannot be negative; clamp at zero and round to cents. Both steps are monotone, so
    /// `lower_bound <= sales_forecast <= upper_bound` survives.
    pub fn shaped(self) -> Self {
        Self {
            date: self.date,
            sales_forecast: round_to(self.sales_forecast.max(0.0), 2),
            lower_bound: round_to(self.lower_bound.max(0.0), 2),
            upper_bound: round_to(self.upper_bound.max(0.0), 2),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SalesForecastResponse {
    pub status: &'static str,
    pub days_predicted: u32,
    pub predictions: Vec<SalesForecastPoint>,
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
