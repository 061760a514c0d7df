use serde::Serialize;
use std::fmt;

/// One rejected input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub field: String,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid field '{}': {}", self.field, self.reason)
    }
}

impl std::error::Error for ValidationError {}

/// Every field error found in a payload, in field order. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    pub(crate) fn from_vec(errors: Vec<ValidationError>) -> Option<Self> {
        if errors.is_empty() {
            None
        } else {
            Some(Self(errors))
        }
    }

    pub fn first(&self) -> &ValidationError {
        &self.0[0]
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.0
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|e| e.field.as_str())
    }
}

impl From<ValidationError> for ValidationErrors {
    fn from(err: ValidationError) -> Self {
        Self(vec![err])
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        f.write_str(&parts.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    SalesForecast,
    ContractPrediction,
}

impl ModelKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ModelKind::SalesForecast => "sales_forecast",
            ModelKind::ContractPrediction => "contract_prediction",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PredictionError {
    /// Client input was malformed or out of range.
    Validation(ValidationErrors),
    /// The artifact for this endpoint did not load at startup.
    ModelUnavailable(ModelKind),
    /// The validated request could not be turned into the classifier's feature vector.
    FeatureShape(String),
}

impl fmt::Display for PredictionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredictionError::Validation(errors) => write!(f, "{errors}"),
            PredictionError::ModelUnavailable(kind) => write!(f, "model unavailable: {kind}"),
            PredictionError::FeatureShape(detail) => write!(f, "feature shape error: {detail}"),
        }
    }
}

impl std::error::Error for PredictionError {}

impl From<ValidationErrors> for PredictionError {
    fn from(errors: ValidationErrors) -> Self {
        PredictionError::Validation(errors)
    }
}

impl From<ValidationError> for PredictionError {
    fn from(err: ValidationError) -> Self {
        PredictionError::Validation(err.into())
    }
}
