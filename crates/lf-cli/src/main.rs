//! Landfall CLI - apply versioned SQL scripts exactly once

use anyhow::{Context, Result};
use clap::Parser;
use lf_migrate::MigrationRunner;

mod cli;
mod context;

use cli::Cli;
use context::RunContext;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let cwd = std::env::current_dir().context("Failed to read the current directory")?;
    let ctx = RunContext::resolve(&cli, &cwd)?;
    let connector = context::connector_for(&ctx.connection)?;
    let runner = MigrationRunner::new(&ctx.scripts_dir).with_history_table(&ctx.history_table);

    if ctx.options.preview {
        log::info!("Preview mode: every transaction will be rolled back");
    }

    let outcome = match &cli.script {
        Some(name) => runner.run_one(connector.as_ref(), &ctx.options, name).await,
        None => runner.run_all(connector.as_ref(), &ctx.options).await,
    };

    match outcome {
        Ok(report) => {
            log::debug!(
                "{} applied, {} skipped",
                report.applied_count(),
                report.skipped_count()
            );
            Ok(())
        }
        Err(failure) => {
            if ctx.options.output {
                for result in &failure.completed {
                    if !result.message.is_empty() {
                        println!("{}", result.message);
                    }
                }
            }
            log::debug!("{}", failure);
            Err(failure.error).context("Migration failed")
        }
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}
