use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use predictor_core::error::PredictionError;
use predictor_core::models::ModelStore;
use predictor_core::service::PredictionService;

#[derive(Debug, Parser)]
#[command(name = "predictor_cli")]
struct Args {
    /// Directory holding the model artifacts. Overrides MODELS_DIR.
    #[arg(long)]
    models_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Load both artifacts and fail if either is unusable.
    Check,

    /// Print the sales forecast for the next N days.
    Sales {
        #[arg(long, allow_negative_numbers = true)]
        days: i64,
    },

    /// Score one client record read from a JSON file ("-" for stdin).
    Contract {
        #[arg(long)]
        input: String,
    },
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let mut settings = predictor_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();
    if let Some(dir) = args.models_dir {
        settings.models_dir = dir;
    }

    let store = ModelStore::load(&settings.model_paths());

    match args.command {
        Command::Check => {
            let status = store.status();
            tracing::info!(
                models_dir = %settings.models_dir.display(),
                sales_forecast = status.sales_forecast,
                contract_prediction = status.contract_prediction,
                "model check"
            );
            anyhow::ensure!(
                status.sales_forecast && status.contract_prediction,
                "one or more model artifacts are unavailable in {}",
                settings.models_dir.display()
            );
        }
        Command::Sales { days } => {
            let service = PredictionService::new(Arc::new(store));
            let res = service
                .predict_sales(&serde_json::json!({ "days": days }))
                .map_err(report)?;
            println!("{}", serde_json::to_string_pretty(&res)?);
        }
        Command::Contract { input } => {
            let payload = read_payload(&input)?;
            let service = PredictionService::new(Arc::new(store));
            let res = service.predict_contract(&payload).map_err(report)?;
            println!("{}", serde_json::to_string_pretty(&res)?);
        }
    }

    Ok(())
}

fn read_payload(input: &str) -> anyhow::Result<Value> {
    let text = if input == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read payload from stdin")?;
        buf
    } else {
        std::fs::read_to_string(input).with_context(|| format!("failed to read {input}"))?
    };
    parse_payload(&text)
}

fn parse_payload(text: &str) -> anyhow::Result<Value> {
    serde_json::from_str(text).context("payload is not valid JSON")
}

fn report(err: PredictionError) -> anyhow::Error {
    let err = anyhow::Error::new(err);
    if let Some(PredictionError::FeatureShape(_)) = err.downcast_ref::<PredictionError>() {
        sentry_anyhow::capture_anyhow(&err);
    }
    err
}

fn init_sentry(settings: &predictor_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_subcommands() {
        let args = Args::try_parse_from(["predictor_cli", "sales", "--days", "14"]).unwrap();
        assert!(matches!(args.command, Command::Sales { days: 14 }));

        let args = Args::try_parse_from([
            "predictor_cli",
            "--models-dir",
            "/srv/models",
            "contract",
            "--input",
            "-",
        ])
        .unwrap();
        assert_eq!(args.models_dir, Some(PathBuf::from("/srv/models")));
        assert!(matches!(args.command, Command::Contract { ref input } if input == "-"));
    }

    #[test]
    fn out_of_range_days_reach_the_validator() {
        let args = Args::try_parse_from(["predictor_cli", "sales", "--days", "-1"]).unwrap();
        assert!(matches!(args.command, Command::Sales { days: -1 }));
    }

    #[test]
    fn rejects_invalid_json_payload() {
        assert!(parse_payload("{\"age\": 35").is_err());
        assert_eq!(parse_payload("{\"age\": 35}").unwrap()["age"], 35);
    }

    #[test]
    fn report_keeps_the_validation_message() {
        let err = report(PredictionError::from(
            predictor_core::error::ValidationError::new("days", "must be between 1 and 365"),
        ));
        assert!(err.to_string().contains("days"));
    }
}
