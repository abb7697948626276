use std::io::Read;

use anyhow::Context;

use hr_onboarding::config::AppConfig;
use hr_onboarding::llm::{LlmGateway, create_provider};
use hr_onboarding::onboarding::{OnboardingPipeline, OnboardingRecord};
use hr_onboarding::store::{ResultStore, WorkflowStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = AppConfig::from_env().context("Failed to load configuration")?;

    let source = std::env::args().nth(1);
    let record = read_record(source.as_deref())?;

    eprintln!("HR Onboarding v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Model: {}", config.llm.model);
    eprintln!("   Data: {}", config.data_dir.display());

    let llm = create_provider(&config.llm).context("Failed to create LLM provider")?;
    let gateway = LlmGateway::new(llm, config.gateway.clone());
    let pipeline = OnboardingPipeline::new(gateway, config.pipeline.clone());

    let outcome = pipeline
        .run(&record)
        .await
        .context("Onboarding record rejected")?;
    let result = outcome.to_result();

    if result.is_success() {
        let employee_id = record
            .id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let store = WorkflowStore::new(&config.data_dir);
        let path = store
            .save(&result, &employee_id)
            .await
            .context("Failed to save workflow result")?;
        eprintln!("   Saved: {}", path.display());
    }

    println!("{}", serde_json::to_string_pretty(&result)?);

    if !result.is_success() {
        std::process::exit(1);
    }
    Ok(())
}

/// Read the record JSON from a file path, or from stdin when no path (or
/// `-`) is given.
fn read_record(source: Option<&str>) -> anyhow::Result<OnboardingRecord> {
    let raw = match source {
        Some(path) if path != "-" => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read record from {path}"))?,
        _ => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read record from stdin")?;
            buf
        }
    };
    serde_json::from_str(&raw).context("Record is not valid JSON")
}
