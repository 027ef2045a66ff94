use std::path::PathBuf;

use analytics_client::{report, AppConfig, HttpTrainingService, Session, TrainingService};
use anyhow::{Context, Result};
use artifacts::ProblemType;
use clap::{Parser, Subcommand};
use tracing::info;
use workflow::Outcome;

#[derive(Parser)]
#[command(name = "analytics-client", version, about = "Upload a CSV, train a model on the training service, inspect and query it")]
struct Cli {
    /// Overrides ANALYTICS_API_URL.
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Checks that the training service is up.
    Health,
    /// Upload -> train -> visualize, then predict if any --feature is given.
    Run {
        #[arg(long)]
        file: PathBuf,
        #[arg(long)]
        target: String,
        #[arg(long, default_value = "regression")]
        problem_type: ProblemType,
        /// name=value, repeatable.
        #[arg(long = "feature", value_parser = parse_feature)]
        features: Vec<(String, String)>,
    },
}

fn parse_feature(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.to_string()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("expected name=value, got {raw:?}"))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let mut cfg = AppConfig::from_env()?;
    if let Some(url) = cli.api_url {
        cfg = cfg.with_api_url(url)?;
    }
    let service = HttpTrainingService::new(&cfg).context("Failed to build HTTP client")?;
    info!(base_url = %service.info().base_url, "training service configured");

    let session = Session::new(service, cfg.max_upload_bytes);
    match cli.command {
        Command::Health => {
            let health = session
                .check_health()
                .await
                .context("Training service health check failed")?;
            println!("{} at {}", health.status, health.timestamp);
        }
        Command::Run {
            file,
            target,
            problem_type,
            features,
        } => run(&session, &file, &target, problem_type, features).await?,
    }
    Ok(())
}

async fn run<S: TrainingService>(
    session: &Session<S>,
    file: &std::path::Path,
    target: &str,
    problem_type: ProblemType,
    features: Vec<(String, String)>,
) -> Result<()> {
    let uploaded = session
        .upload_file(file)
        .await
        .with_context(|| format!("Upload of {} failed", file.display()))?;
    print_outcome(&uploaded);
    if let Some(d) = session.snapshot().await.dataset {
        println!("{}", report::dataset(&d));
    }

    let trained = session
        .train(target, problem_type)
        .await
        .context("Training failed")?;
    print_outcome(&trained);
    println!("{}\n", report::steps(&session.steps().await));

    let charts = session.charts().await.context("Failed to build charts")?;
    println!("{}", report::charts(&charts));

    if !features.is_empty() {
        match session.predict(features).await.context("Prediction failed")? {
            Some(shown) => println!("{}", report::prediction(&shown)),
            None => println!("Prediction superseded"),
        }
    }
    Ok(())
}

fn print_outcome(outcome: &Outcome) {
    match outcome {
        Outcome::Applied(n) => println!("{}", report::notice(n)),
        Outcome::Stale => println!("Response superseded"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_feature() {
        assert_eq!(parse_feature("rooms=3").unwrap(), ("rooms".to_string(), "3".to_string()));
        assert_eq!(parse_feature("note=a=b").unwrap(), ("note".to_string(), "a=b".to_string()));
        assert!(parse_feature("rooms").is_err());
        assert!(parse_feature("=3").is_err());
    }

    #[test]
    fn test_cli_parses_run() {
        let cli = Cli::try_parse_from([
            "analytics-client",
            "run",
            "--file",
            "houses.csv",
            "--target",
            "price",
            "--problem-type",
            "classification",
            "--feature",
            "rooms=3",
            "--feature",
            "area=80",
        ])
        .unwrap();
        match cli.command {
            Command::Run { problem_type, features, .. } => {
                assert_eq!(problem_type, ProblemType::Classification);
                assert_eq!(features.len(), 2);
            }
            Command::Health => panic!("expected run"),
        }
    }
}
