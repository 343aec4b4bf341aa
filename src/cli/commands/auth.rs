use anyhow::Context;
use clap::Subcommand;
use serde::Deserialize;
use serde_json::json;

use crate::auth::{generate_jwt, Claims};
use crate::cli::utils::{output_success, output_value, require_env};
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum AuthCommands {
    #[command(about = "Sign in with email and password against the identity provider")]
    Login {
        #[arg(long, help = "Account email")]
        email: String,
        #[arg(long, help = "Account password")]
        password: String,
    },

    #[command(about = "Sign a development token with the local JWT secret")]
    Mint {
        #[arg(long, help = "Subject (the user's authId)")]
        sub: String,
        #[arg(long, help = "Email claim")]
        email: Option<String>,
        #[arg(long, default_value_t = 1, help = "Lifetime in hours")]
        hours: i64,
    },
}

#[derive(Deserialize)]
struct PasswordGrant {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

pub async fn handle(cmd: AuthCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        AuthCommands::Login { email, password } => login(&email, &password, output_format).await,
        AuthCommands::Mint { sub, email, hours } => {
            let secret = require_env("SUPABASE_JWT_SECRET")?;
            let token = generate_jwt(&Claims::new(sub, email, hours), &secret)?;
            output_value(&output_format, "access_token", &token)
        }
    }
}

async fn login(email: &str, password: &str, output_format: OutputFormat) -> anyhow::Result<()> {
    let base = require_env("SUPABASE_URL")?;
    let anon_key = require_env("SUPABASE_ANON_KEY")?;
    let url = format!("{}/auth/v1/token?grant_type=password", base.trim_end_matches('/'));

    tracing::debug!("Requesting password grant from {}", url);
    let response = reqwest::Client::new()
        .post(&url)
        .header("apikey", &anon_key)
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await
        .context("identity provider unreachable")?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        anyhow::bail!("sign-in failed ({}): {}", status, body);
    }

    let grant: PasswordGrant = response.json().await.context("unexpected sign-in response")?;
    match output_format {
        OutputFormat::Json => output_success(
            &output_format,
            "Signed in",
            Some(json!({ "access_token": grant.access_token, "expires_in": grant.expires_in })),
        ),
        OutputFormat::Text => output_value(&output_format, "access_token", &grant.access_token),
    }
}
