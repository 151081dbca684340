use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use dealwatch_cli::commands::{self, RunOptions};

#[derive(Debug, Parser)]
#[command(name = "dealwatch")]
#[command(about = "Poll retail pages and feeds, notify once per sale transition")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Poll every configured target once (the default)
    Run {
        /// Compute and print notifications without sending or saving state
        #[arg(long)]
        dry_run: bool,

        /// Poll only the target with this id
        #[arg(long)]
        target: Option<String>,

        /// Exit non-zero when any target ends in ERROR
        #[arg(long)]
        strict: bool,
    },
    /// Check the targets file and list each entry's state file
    Validate,
    /// Print the persisted state of one target as JSON
    State {
        /// Target id as written in the targets file
        id: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let config = dealwatch_core::load_app_config()?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Run {
        dry_run: false,
        target: None,
        strict: false,
    });

    match command {
        Commands::Run {
            dry_run,
            target,
            strict,
        } => {
            let options = RunOptions {
                dry_run: dry_run || config.dry_run,
                target,
            };
            let ctx = commands::build_context(&config, options.dry_run)?;
            let reports = commands::run(&ctx, &config.targets_path, &options).await?;

            for report in &reports {
                println!("{}", report.render());
            }

            let errors = reports.iter().filter(|r| r.outcome.is_error()).count();
            if errors > 0 {
                tracing::warn!(errors, total = reports.len(), "some targets failed");
                if strict {
                    return Ok(ExitCode::FAILURE);
                }
            }
        }
        Commands::Validate => {
            let (text, invalid) = commands::validate(&config.targets_path)?;
            println!("{text}");
            if invalid > 0 {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::State { id } => {
            println!("{}", commands::show_state(&config.state_dir, &id)?);
        }
    }

    Ok(ExitCode::SUCCESS)
}
