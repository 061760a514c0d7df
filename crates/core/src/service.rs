use serde_json::Value;
use std::sync::Arc;

use crate::domain::contract::{ContractPrediction, ContractResponse};
use crate::domain::health::HealthStatus;
use crate::domain::sales::SalesForecastResponse;
use crate::error::PredictionError;
use crate::models::ModelStore;
use crate::validate::{validate_contract_request, validate_sales_request};

/// Validation -> model call -> response shaping for both prediction endpoints.
#[derive(Debug, Clone)]
pub struct PredictionService {
    store: Arc<ModelStore>,
}

impl PredictionService {
    pub fn new(store: Arc<ModelStore>) -> Self {
        Self { store }
    }

    pub fn health(&self) -> HealthStatus {
        HealthStatus::from_models(self.store.status())
    }

    pub fn predict_sales(&self, payload: &Value) -> Result<SalesForecastResponse, PredictionError> {
        let req = validate_sales_request(payload)?;
        let predictions: Vec<_> = self
            .store
            .forecast(req.days)?
            .into_iter()
            .map(|p| p.shaped())
            .collect();

        tracing::debug!(days = req.days, points = predictions.len(), "sales forecast served");

        Ok(SalesForecastResponse {
            status: "success",
            days_predicted: req.days,
            predictions,
        })
    }

    pub fn predict_contract(&self, payload: &Value) -> Result<ContractResponse, PredictionError> {
        let req = validate_contract_request(payload)?;
        let probability = self.store.classify(&req)?;
        let prediction = ContractPrediction::from_probability(probability);

        tracing::debug!(
            probability = prediction.probability,
            will_contract = prediction.will_contract,
            confidence = ?prediction.confidence,
            "contract prediction served"
        );

        Ok(ContractResponse {
            status: "success",
            prediction,
            client_summary: req.summary(),
        })
    }
}
