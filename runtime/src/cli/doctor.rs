//! Environment readiness check.

use crate::config::RuntimeConfig;
use crate::renderer::chromium::find_chromium;
use anyhow::Result;

/// Check Chromium availability, the shared secret and the refiner key.
pub async fn run(config: &RuntimeConfig) -> Result<()> {
    println!("Quizchain Doctor");
    println!("================");
    println!();

    let os = std::env::consts::OS;
    let arch = std::env::consts::ARCH;
    println!("OS:   {os}");
    println!("Arch: {arch}");
    println!();

    let chromium_path = find_chromium(config.chromium_path.as_deref());
    match &chromium_path {
        Some(path) => println!("[OK] Chromium found: {}", path.display()),
        None => println!(
            "[!!] Chromium NOT found. Pages will be fetched without running JavaScript."
        ),
    }

    match &config.secret {
        Some(_) => println!("[OK] QUIZ_SECRET is set"),
        None => println!("[!!] QUIZ_SECRET is not set. `quizchain serve` will refuse to start."),
    }

    match &config.refiner {
        Some(refiner) => println!(
            "[OK] Answer refiner: {} via {}",
            refiner.model, refiner.base_url
        ),
        None => println!("[--] OPENAI_API_KEY not set, answer refiner disabled"),
    }

    match &config.keepalive {
        Some(k) => println!("[OK] Keepalive: {} every {}s", k.url, k.interval.as_secs()),
        None => println!("[--] Keepalive disabled"),
    }

    println!();
    println!(
        "Time budget: {}s, render timeout: {}s",
        config.engine.time_budget.as_secs(),
        config.engine.render_timeout.as_secs()
    );
    println!();

    if config.secret.is_some() {
        println!("Status: READY");
    } else {
        println!("Status: NOT READY");
        println!("  Set QUIZ_SECRET before running `quizchain serve`.");
    }

    Ok(())
}
