use anyhow::Result;
use clap::Parser;
use gmail_todo_digest::cli::{self, Cli, Commands};
use gmail_todo_digest::config::Config;
use gmail_todo_digest::error::DigestError;
use std::process;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Exit with a code per error kind
    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        let code = e
            .downcast_ref::<DigestError>()
            .map(DigestError::exit_code)
            .unwrap_or(1);
        process::exit(code);
    }
}

async fn run() -> Result<()> {
    // Install default crypto provider for rustls
    // On non-Windows platforms, use aws-lc-rs; on Windows, use ring
    #[cfg(not(windows))]
    rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install default crypto provider"))?;

    #[cfg(windows)]
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install default crypto provider"))?;

    let cli = Cli::parse();

    // Initialize tracing with level based on verbose flag
    let filter = if cli.verbose {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("gmail_todo_digest=debug,info"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Run { dry_run } => {
            if dry_run {
                println!("Running in DRY RUN mode - the digest will be printed, not sent");
            }
            cli::run(&cli, dry_run).await?;
            Ok(())
        }

        Commands::Status => {
            cli::status(&cli).await?;
            Ok(())
        }

        Commands::InitConfig { ref output, force } => {
            if output.exists() && !force {
                return Err(DigestError::ConfigError(format!(
                    "Configuration file already exists at {:?}. Use --force to overwrite.",
                    output
                ))
                .into());
            }

            Config::create_example(output).await?;

            println!("Created example configuration file at: {:?}", output);
            println!("\nKey settings to review:");
            println!("  - mail.recipient: where the digest is sent");
            println!("  - mail.lookback_hours: how far back to scan");
            println!("  - summarizer.model: completion model identifier");
            Ok(())
        }
    }
}
