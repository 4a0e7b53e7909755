// Copyright 2026 Quizchain Contributors
// SPDX-License-Identifier: MIT

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use quizchain_runtime::cli::{self, LogFormat};
use quizchain_runtime::config::RuntimeConfig;

#[derive(Parser)]
#[command(
    name = "quizchain",
    about = "Quizchain — solves chained web quizzes against a deadline",
    version,
    after_help = "Run 'quizchain <command> --help' for details on each command."
)]
struct Cli {
    /// Log output format
    #[arg(long, value_enum, default_value = "pretty", global = true)]
    log_format: LogFormat,

    /// Enable verbose/debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the REST API
    Serve {
        /// Port to listen on (defaults to PORT or 8000)
        #[arg(long)]
        port: Option<u16>,
        /// Skip Chromium and fetch pages over plain HTTP
        #[arg(long)]
        no_browser: bool,
    },
    /// Solve one chain and print the session report
    Solve {
        /// Start URL of the chain
        #[arg(long)]
        url: String,
        /// Identity sent with every submission
        #[arg(long, env = "QUIZ_EMAIL")]
        email: Option<String>,
        /// Shared secret sent with every submission
        #[arg(long, env = "QUIZ_SECRET", hide_env_values = true)]
        secret: Option<String>,
        /// Skip Chromium and fetch pages over plain HTTP
        #[arg(long)]
        no_browser: bool,
    },
    /// Check environment and diagnose issues
    Doctor,
    /// Generate shell completion scripts
    Completions {
        /// Shell type (bash, zsh, fish, powershell)
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = RuntimeConfig::from_env();

    if !matches!(cli.command, Commands::Completions { .. }) {
        cli::init_tracing(cli.log_format, cli.verbose);
    }

    let result = match cli.command {
        Commands::Serve { port, no_browser } => cli::serve::run(config, port, no_browser).await,
        Commands::Solve {
            url,
            email,
            secret,
            no_browser,
        } => cli::solve_cmd::run(config, &url, email, secret, no_browser).await,
        Commands::Doctor => cli::doctor::run(&config).await,
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "quizchain", &mut std::io::stdout());
            Ok(())
        }
    };

    // Consistent exit codes: 0=success, 1=error
    if let Err(e) = &result {
        eprintln!("  Error: {e:#}");
        std::process::exit(1);
    }

    result
}
