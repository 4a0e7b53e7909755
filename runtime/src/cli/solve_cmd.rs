//! One-shot chain solve from the command line.

use super::build_solver;
use crate::config::RuntimeConfig;
use anyhow::{bail, Context, Result};

/// Solve the chain at `url` and print the session report as JSON.
///
/// Exits non-zero when the session fails, after printing the report.
pub async fn run(
    config: RuntimeConfig,
    url: &str,
    email: Option<String>,
    secret: Option<String>,
    no_browser: bool,
) -> Result<()> {
    let email = email
        .or_else(|| config.email.clone())
        .context("no email given (use --email or QUIZ_EMAIL)")?;
    let secret = secret
        .or_else(|| config.secret.clone())
        .context("no secret given (use --secret or QUIZ_SECRET)")?;

    let solver = build_solver(&config, !no_browser).await;
    let report = solver.solve(&email, &secret, url).await;

    println!("{}", serde_json::to_string_pretty(&report.to_json())?);
    if !report.is_success() {
        bail!("session failed after {} round(s)", report.trail.len());
    }
    Ok(())
}
