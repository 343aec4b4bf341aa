use anyhow::Context;
use clap::Subcommand;
use serde_json::Value;

use crate::cli::utils::output_success;
use crate::cli::OutputFormat;

const DEFAULT_URL: &str = "http://localhost:5001";

#[derive(Subcommand)]
pub enum ServerCommands {
    #[command(about = "Check server health status from the API /api/health endpoint")]
    Health {
        #[arg(long, help = "Server base URL (defaults to STUDY_API_URL or localhost:5001)")]
        url: Option<String>,
    },
}

pub async fn handle(cmd: ServerCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        ServerCommands::Health { url } => {
            let base = url
                .or_else(|| std::env::var("STUDY_API_URL").ok())
                .unwrap_or_else(|| DEFAULT_URL.to_string());
            let endpoint = format!("{}/api/health", base.trim_end_matches('/'));

            let response = reqwest::get(&endpoint)
                .await
                .with_context(|| format!("could not reach {}", endpoint))?;
            let status = response.status();
            let body: Value = response.json().await.context("health response was not JSON")?;

            if !status.is_success() {
                anyhow::bail!("server unhealthy ({}): {}", status, body);
            }

            let message = format!(
                "Server at {} is {} (database: {})",
                base,
                body["status"].as_str().unwrap_or("unknown"),
                body["database"].as_str().unwrap_or("unknown"),
            );
            output_success(&output_format, &message, Some(body))
        }
    }
}
