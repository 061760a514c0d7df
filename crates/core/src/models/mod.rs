//! Model Store: the two pre-trained artifacts, loaded once and shared read-only.

pub mod classifier;
pub mod features;
pub mod forecaster;

use chrono::NaiveDate;
use std::path::PathBuf;
use std::sync::Arc;

use crate::domain::contract::ContractRequest;
use crate::domain::health::ModelsStatus;
use crate::domain::sales::SalesForecastPoint;
use crate::error::{ModelKind, PredictionError};
use classifier::LogisticPipeline;
use features::FeatureVector;
use forecaster::AdditiveForecaster;

/// Daily sales forecaster. Implementations must be deterministic in `days`.
pub trait Forecaster: Send + Sync {
    fn last_date(&self) -> NaiveDate;

    /// One point per day for `days` days starting the day after `last_date()`.
    fn forecast(&self, days: u32) -> Vec<SalesForecastPoint>;
}

/// Binary contract classifier returning the positive-class probability.
pub trait Classifier: Send + Sync {
    fn predict_proba(&self, features: &FeatureVector) -> Result<f64, PredictionError>;
}

#[derive(Debug, Clone)]
pub struct ModelPaths {
    pub sales_forecast: PathBuf,
    pub contract_prediction: PathBuf,
}

#[derive(Clone, Default)]
pub struct ModelStore {
    forecaster: Option<Arc<dyn Forecaster>>,
    classifier: Option<Arc<dyn Classifier>>,
}

impl std::fmt::Debug for ModelStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelStore")
            .field("status", &self.status())
            .finish()
    }
}

impl ModelStore {
    /// Loads both artifacts independently. A failure is logged and leaves that model
    /// unavailable; it never aborts startup.
    pub fn load(paths: &ModelPaths) -> Self {
        let forecaster = match AdditiveForecaster::from_path(&paths.sales_forecast) {
            Ok(m) => {
                let forecaster: Arc<dyn Forecaster> = Arc::new(m);
                tracing::info!(
                    path = %paths.sales_forecast.display(),
                    last_date = %forecaster.last_date(),
                    "sales forecast model loaded"
                );
                Some(forecaster)
            }
            Err(e) => {
                let error = format!("{e:#}");
                tracing::warn!(
                    path = %paths.sales_forecast.display(),
                    error = %error,
                    "sales forecast model unavailable"
                );
                None
            }
        };

        let classifier = match LogisticPipeline::from_path(&paths.contract_prediction) {
            Ok(m) => {
                tracing::info!(
                    path = %paths.contract_prediction.display(),
                    numeric = m.numeric.len(),
                    categorical = m.categorical.len(),
                    "contract classification pipeline loaded"
                );
                Some(Arc::new(m) as Arc<dyn Classifier>)
            }
            Err(e) => {
                let error = format!("{e:#}");
                tracing::warn!(
                    path = %paths.contract_prediction.display(),
                    error = %error,
                    "contract classification pipeline unavailable"
                );
                None
            }
        };

        Self {
            forecaster,
            classifier,
        }
    }

    /// Builds a store from already-constructed models (test doubles included).
    pub fn from_parts(
        forecaster: Option<Arc<dyn Forecaster>>,
        classifier: Option<Arc<dyn Classifier>>,
    ) -> Self {
        Self {
            forecaster,
            classifier,
        }
    }

    pub fn status(&self) -> ModelsStatus {
        ModelsStatus {
            sales_forecast: self.forecaster.is_some(),
            contract_prediction: self.classifier.is_some(),
        }
    }

    pub fn forecast(&self, days: u32) -> Result<Vec<SalesForecastPoint>, PredictionError> {
        let forecaster = self
            .forecaster
            .as_ref()
            .ok_or(PredictionError::ModelUnavailable(ModelKind::SalesForecast))?;
        Ok(forecaster.forecast(days))
    }

    pub fn classify(&self, features: &ContractRequest) -> Result<f64, PredictionError> {
        let classifier = self
            .classifier
            .as_ref()
            .ok_or(PredictionError::ModelUnavailable(ModelKind::ContractPrediction))?;
        let vector = FeatureVector::from_request(features);
        let probability = classifier.predict_proba(&vector)?;
        if !(0.0..=1.0).contains(&probability) {
            return Err(PredictionError::FeatureShape(format!(
                "classifier returned a probability outside [0, 1]: {probability}"
            )));
        }
        Ok(probability)
    }
}
