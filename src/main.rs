use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use docauth_normalizer::model::{Config, NormalizedOutcome, RawResponse};
use docauth_normalizer::request::RequestExecutor;
use docauth_normalizer::service::acuant::get_results_request;
use docauth_normalizer::service::true_id::true_id_request;
use docauth_normalizer::service::{AcuantNormalizer, TrueIdNormalizer, tracing_notifier};

#[derive(Parser)]
#[command(
    name = "docauth-normalize",
    about = "Normalize identity-document verification vendor responses"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Normalize a saved vendor response body
    Normalize {
        vendor: Vendor,
        /// Path to the JSON response body
        file: PathBuf,
        /// The call was made with the selfie (liveness) workflow
        #[arg(long)]
        liveness: bool,
    },
    /// Fetch and normalize AssureID results for a document instance
    Results { instance_id: String },
    /// Submit a TrueID request payload and normalize the answer
    TrueId {
        /// Path to the JSON request payload
        payload: PathBuf,
        #[arg(long)]
        liveness: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Vendor {
    Acuant,
    TrueId,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (ignore if missing)
    let _ = dotenvy::dotenv();

    // Logs go to stderr; stdout carries the outcome
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let notifier = tracing_notifier();

    let outcome: NormalizedOutcome = match cli.command {
        Command::Normalize {
            vendor,
            file,
            liveness,
        } => {
            let body = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let response = RawResponse {
                status: 200,
                body,
                elapsed: Duration::ZERO,
            };
            match vendor {
                Vendor::Acuant => AcuantNormalizer::new(notifier).normalize(&response),
                Vendor::TrueId => TrueIdNormalizer::new(notifier).normalize(&response, liveness),
            }
        }
        Command::Results { instance_id } => {
            let config = Config::from_env()?;
            let acuant = config
                .acuant
                .context("No acuant section in the configuration")?;
            let request = get_results_request(&acuant, &instance_id)?;

            let executor = RequestExecutor::new(Some(acuant.timeout()), notifier.clone())?;
            let normalizer = AcuantNormalizer::new(notifier);
            executor
                .fetch(&request, |response| normalizer.normalize(&response))
                .await
        }
        Command::TrueId { payload, liveness } => {
            let config = Config::from_env()?;
            let lexis_nexis = config
                .lexis_nexis
                .context("No lexis_nexis section in the configuration")?;
            let body = std::fs::read(&payload)
                .with_context(|| format!("Failed to read {}", payload.display()))?;
            let request = true_id_request(&lexis_nexis, liveness, body)?;

            let executor = RequestExecutor::new(Some(lexis_nexis.timeout()), notifier.clone())?;
            let normalizer = TrueIdNormalizer::new(notifier);
            executor
                .fetch(&request, |response| normalizer.normalize(&response, liveness))
                .await
        }
    };

    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}
