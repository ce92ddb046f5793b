use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;

use behaviour_editor::*;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = EditorConfig::from_cli(&cli).context("Failed to load configuration")?;
    logging::init(&config).context("Failed to initialize logging")?;
    logging::log_config(&config);

    match &cli.command {
        Command::Inspect { file } => {
            let summary = commands::inspect(&config, file)?;
            inspect::print_summary(&summary);
        }
        Command::Replay { file, script, out } => {
            let report = commands::replay(&config, file, script, out.as_deref())?;
            logging::log_status("Executed", report.executed, true);
            logging::log_status("Undone", report.undone, true);
            logging::log_status("Redone", report.redone, true);
        }
        Command::Schema => {
            println!("{}", commands::json_schema()?);
        }
        Command::New { file, name } => {
            let document = commands::new_document(&config, file, name.as_deref())?;
            println!(
                "{} {} {}",
                "Created".green().bold(),
                document.metadata.name,
                format!("({})", file.display()).dimmed()
            );
        }
    }

    Ok(())
}
