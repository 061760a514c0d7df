use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModelsStatus {
    pub sales_forecast: bool,
    pub contract_prediction: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub models: ModelsStatus,
}

impl HealthStatus {
    pub fn from_models(models: ModelsStatus) -> Self {
        Self {
            status: "healthy",
            models,
        }
    }
}
