pub mod domain;
pub mod error;
pub mod models;
pub mod service;
pub mod validate;

pub mod config {
    use anyhow::Context;
    use std::path::PathBuf;

    use crate::models::ModelPaths;

    const DEFAULT_MODELS_DIR: &str = "models";
    const DEFAULT_SALES_MODEL_FILE: &str = "future_sales.json";
    const DEFAULT_CONTRACT_MODEL_FILE: &str = "best_pipeline.json";
    const DEFAULT_PORT: u16 = 8000;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub models_dir: PathBuf,
        pub sales_model_file: String,
        pub contract_model_file: String,
        pub port: u16,
        pub sentry_dsn: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            let port = match std::env::var("PORT") {
                Ok(s) => s
                    .trim()
                    .parse::<u16>()
                    .with_context(|| format!("PORT must be a valid port number (got {s:?})"))?,
                Err(_) => DEFAULT_PORT,
            };

            Ok(Self {
                models_dir: non_empty_var("MODELS_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_MODELS_DIR)),
                sales_model_file: non_empty_var("SALES_MODEL_FILE")
                    .unwrap_or_else(|| DEFAULT_SALES_MODEL_FILE.to_string()),
                contract_model_file: non_empty_var("CONTRACT_MODEL_FILE")
                    .unwrap_or_else(|| DEFAULT_CONTRACT_MODEL_FILE.to_string()),
                port,
                sentry_dsn: non_empty_var("SENTRY_DSN"),
            })
        }

        pub fn model_paths(&self) -> ModelPaths {
            ModelPaths {
                sales_forecast: self.models_dir.join(&self.sales_model_file),
                contract_prediction: self.models_dir.join(&self.contract_model_file),
            }
        }
    }

    fn non_empty_var(key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|s| !s.trim().is_empty())
    }

}
