use anyhow::{ensure, Context};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::PredictionError;
use crate::models::features::{FeatureVector, LEAKAGE_FEATURE};
use crate::models::Classifier;

const KIND: &str = "logistic_regression";

/// Standardized numeric input: `coef * (x - mean) / scale`.
#[derive(Debug, Clone, Deserialize)]
pub struct NumericTerm {
    pub name: String,
    pub mean: f64,
    pub scale: f64,
    pub coef: f64,
}

/// One-hot encoded input. Categories missing from `coefs` contribute nothing.
#[derive(Debug, Clone, Deserialize)]
pub struct CategoricalTerm {
    pub name: String,
    pub coefs: BTreeMap<String, f64>,
}

/// Logistic-regression pipeline exported from training (scaler + one-hot encoder + model).
#[derive(Debug, Clone, Deserialize)]
pub struct LogisticPipeline {
    pub kind: String,
    pub intercept: f64,
    #[serde(default)]
    pub numeric: Vec<NumericTerm>,
    #[serde(default)]
    pub categorical: Vec<CategoricalTerm>,
}

impl LogisticPipeline {
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read classifier artifact {}", path.display()))?;
        Self::from_json(&text)
            .with_context(|| format!("invalid classifier artifact {}", path.display()))
    }

    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        let pipeline = serde_json::from_str::<Self>(text)
            .context("classifier artifact does not match the expected schema")?;
        pipeline.validate()?;
        Ok(pipeline)
    }

    fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            self.kind == KIND,
            "unsupported classifier kind '{}' (expected '{KIND}')",
            self.kind
        );
        ensure!(self.intercept.is_finite(), "intercept must be finite");
        ensure!(
            !self.numeric.is_empty() || !self.categorical.is_empty(),
            "classifier has no input features"
        );

        for term in &self.numeric {
            ensure!(
                term.name != LEAKAGE_FEATURE,
                "classifier must not use the '{LEAKAGE_FEATURE}' feature"
            );
            ensure!(
                term.mean.is_finite() && term.coef.is_finite(),
                "numeric feature '{}' has non-finite parameters",
                term.name
            );
            ensure!(
                term.scale.is_finite() && term.scale > 0.0,
                "numeric feature '{}' must have a positive scale (got {})",
                term.name,
                term.scale
            );
        }

        for term in &self.categorical {
            ensure!(
                term.name != LEAKAGE_FEATURE,
                "classifier must not use the '{LEAKAGE_FEATURE}' feature"
            );
            ensure!(
                term.coefs.values().all(|c| c.is_finite()),
                "categorical feature '{}' has non-finite coefficients",
                term.name
            );
        }

        Ok(())
    }

    fn logit(&self, features: &FeatureVector) -> Result<f64, PredictionError> {
        let mut z = self.intercept;

        for term in &self.numeric {
            let x = features.numeric.get(term.name.as_str()).ok_or_else(|| {
                PredictionError::FeatureShape(format!("missing numeric feature '{}'", term.name))
            })?;
            z += term.coef * (x - term.mean) / term.scale;
        }

        for term in &self.categorical {
            let category = features.categorical.get(term.name.as_str()).ok_or_else(|| {
                PredictionError::FeatureShape(format!(
                    "missing categorical feature '{}'",
                    term.name
                ))
            })?;
            z += term.coefs.get(*category).copied().unwrap_or(0.0);
        }

        Ok(z)
    }
}

impl Classifier for LogisticPipeline {
    fn predict_proba(&self, features: &FeatureVector) -> Result<f64, PredictionError> {
        let z = self.logit(features)?;
        Ok(1.0 / (1.0 + (-z).exp()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn features() -> FeatureVector {
        FeatureVector {
            numeric: BTreeMap::from([("age", 40.0), ("balance", 0.0)]),
            categorical: BTreeMap::from([("job", "student"), ("month", "may")]),
        }
    }

    #[test]
    fn zero_logit_is_even_odds() {
        let p = LogisticPipeline::from_json(
            &json!({
                "kind": "logistic_regression",
                "intercept": 0.0,
                "numeric": [{"name": "age", "mean": 40.0, "scale": 10.0, "coef": 1.0}],
            })
            .to_string(),
        )
        .unwrap();
        assert!((p.predict_proba(&features()).unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn combines_numeric_and_one_hot_terms() {
        let p = LogisticPipeline::from_json(
            &json!({
                "kind": "logistic_regression",
                "intercept": -1.0,
                "numeric": [{"name": "age", "mean": 30.0, "scale": 10.0, "coef": 0.5}],
                "categorical": [
                    {"name": "job", "coefs": {"student": 1.5}},
                    {"name": "month", "coefs": {"mar": 2.0}}
                ],
            })
            .to_string(),
        )
        .unwrap();
        // -1.0 + 0.5 * 1.0 + 1.5 + 0.0 (unseen month)
        let expected = 1.0 / (1.0 + (-1.0f64).exp());
        assert!((p.predict_proba(&features()).unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn missing_feature_is_a_shape_error() {
        let p = LogisticPipeline::from_json(
            &json!({
                "kind": "logistic_regression",
                "intercept": 0.0,
                "categorical": [{"name": "poutcome", "coefs": {"success": 2.0}}],
            })
            .to_string(),
        )
        .unwrap();
        let err = p.predict_proba(&features()).unwrap_err();
        assert!(matches!(err, PredictionError::FeatureShape(_)));
    }

    #[test]
    fn rejects_duration_feature() {
        let err = LogisticPipeline::from_json(
            &json!({
                "kind": "logistic_regression",
                "intercept": 0.0,
                "numeric": [{"name": "duration", "mean": 258.0, "scale": 257.0, "coef": 4.1}],
            })
            .to_string(),
        )
        .unwrap_err();
        assert!(format!("{err:#}").contains("duration"));
    }

    #[test]
    fn rejects_zero_scale_and_wrong_kind() {
        let zero_scale = json!({
            "kind": "logistic_regression",
            "intercept": 0.0,
            "numeric": [{"name": "age", "mean": 40.0, "scale": 0.0, "coef": 1.0}],
        });
        assert!(LogisticPipeline::from_json(&zero_scale.to_string()).is_err());

        let wrong_kind = json!({"kind": "random_forest", "intercept": 0.0});
        assert!(LogisticPipeline::from_json(&wrong_kind.to_string()).is_err());
    }
}
