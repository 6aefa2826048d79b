use anyhow::Context;
use clap::{Parser, Subcommand};
use disease_risk_predictor::{
    config::Config,
    metrics,
    ml::{DiseaseId, FormInput, InferenceService, ModelRegistry},
};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "risk-predictor")]
#[command(about = "Disease risk predictor", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file layered over the built-in defaults
    #[arg(short, long, env = "RISK_PREDICTOR_CONFIG")]
    config: Option<PathBuf>,

    /// Model artifact, overriding the configured path
    #[arg(short, long)]
    artifact: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Predict the risk label for one request
    Predict {
        /// Disease name: diabetes, heart, kidney
        #[arg(short, long)]
        disease: String,

        /// Comma separated values in field order
        #[arg(short, long, value_delimiter = ',', allow_negative_numbers = true)]
        values: Option<Vec<f64>>,

        /// Named field value, e.g. -f sex=Male (unset fields use defaults)
        #[arg(short = 'f', long = "field", value_name = "NAME=VALUE")]
        fields: Vec<String>,

        /// Print Prometheus metrics after the prediction
        #[arg(long)]
        show_metrics: bool,
    },

    /// Show the input fields for a disease
    Fields {
        #[arg(short, long)]
        disease: String,
    },

    /// Summarize the loaded artifact
    Inspect,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("Failed to load configuration")?;
    if let Some(artifact) = &cli.artifact {
        config.models.artifact_path = artifact.display().to_string();
    }

    init_tracing(&config);

    if config.observability.metrics_enabled {
        metrics::init_inference_metrics();
    }

    let registry = ModelRegistry::load_with_format(
        config.models.artifact_path(),
        config.models.format,
    )?;
    let service = InferenceService::new(Arc::new(registry))
        .with_range_policy(config.validation.range_policy)
        .with_metrics(config.observability.metrics_enabled);

    match cli.command {
        Commands::Predict {
            disease,
            values,
            fields,
            show_metrics,
        } => {
            let disease: DiseaseId = disease.parse()?;
            let spec = service.spec_for(disease)?;

            let values = match values {
                Some(values) if fields.is_empty() => values,
                Some(_) => anyhow::bail!("--values and --field cannot be combined"),
                None => {
                    let mut form = FormInput::new(spec);
                    for pair in &fields {
                        form.set_pair(pair)?;
                    }
                    form.into_values()
                }
            };

            let verdict = service.predict(disease, &values)?;
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    "disease": verdict.disease.to_string(),
                    "label": verdict.label.to_string(),
                    "raw_score": verdict.raw_score,
                    "inputs": values,
                }))?
            );

            if show_metrics && config.observability.metrics_enabled {
                print!("{}", metrics::gather_metrics());
            }
        }

        Commands::Fields { disease } => {
            let disease: DiseaseId = disease.parse()?;
            let spec = service.spec_for(disease)?;
            println!("{}", serde_json::to_string_pretty(spec)?);
        }

        Commands::Inspect => {
            let registry = service.registry();
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    "source": registry.source().display().to_string(),
                    "metadata": registry.metadata(),
                    "bundles": registry.summary(),
                    "range_policy": service.range_policy(),
                }))?
            );
        }
    }

    Ok(())
}

fn init_tracing(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "disease_risk_predictor={0},risk_predictor={0}",
            config.observability.log_level
        )
        .into()
    });

    // Logs go to stderr so stdout stays machine readable
    if config.observability.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
