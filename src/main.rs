use backup_merger::commands::merge::{error_hint, format_decision_trace, format_summary};
use backup_merger::config::Cli;
use backup_merger::Config;
use clap::Parser;
use std::process::ExitCode;

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let json = cli.json;

    // Settings-file problems surface here through anyhow
    let config = Config::try_from(cli)?;

    let summary = match backup_merger::commands::run(&config) {
        Ok(summary) => summary,
        Err(err) => {
            // Already logged by the run
            if let Some(hint) = error_hint(&err) {
                eprintln!("{} {}", console::style("Try:").yellow(), hint);
            }
            return Ok(if err.is_validation_error() {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            });
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        if summary.dry_run || summary.needs_attention() {
            println!("{}", format_decision_trace(&summary.report));
        }
        println!("{}", format_summary(&summary));
    }

    Ok(if summary.needs_attention() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
