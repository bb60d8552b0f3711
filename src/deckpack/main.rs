use clap::Parser;
use colored::*;
use deckpack::card::Card;
use deckpack::config::PackConfig;
use deckpack::error::{DeckError, Result};
use deckpack::guid::{derive_guid, GuidMethod};
use deckpack::manifest::Manifest;
use deckpack::package::BuildReport;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

mod args;
use args::{Cli, Commands};

const CONFIG_DIR_ENV: &str = "DECKPACK_CONFIG_DIR";

fn main() {
    if let Err(e) = run() {
        eprintln!("{} {}", "Error:".red(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Build {
            manifest,
            output,
            timestamp,
            no_html_check,
        } => {
            let config_dir = resolve_config_dir(cli.config_dir)?;
            handle_build(&config_dir, &manifest, output, timestamp, no_html_check)
        }
        Commands::Inspect { manifest } => handle_inspect(&manifest),
        Commands::Guid {
            legacy,
            model_id,
            fields,
        } => handle_guid(legacy, model_id, fields),
        Commands::Config { key, value } => {
            let config_dir = resolve_config_dir(cli.config_dir)?;
            handle_config(&config_dir, key, value)
        }
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

/// `--config-dir`, then `$DECKPACK_CONFIG_DIR`, then the platform config dir.
fn resolve_config_dir(flag: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(dir) = flag {
        return Ok(dir);
    }
    if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV) {
        return Ok(PathBuf::from(dir));
    }
    ProjectDirs::from("com", "deckpack", "deckpack")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or_else(|| DeckError::Config("Could not determine config dir".into()))
}

fn handle_build(
    config_dir: &Path,
    manifest_path: &Path,
    output: Option<PathBuf>,
    timestamp: Option<f64>,
    no_html_check: bool,
) -> Result<()> {
    let mut config = PackConfig::load(config_dir)?;
    if no_html_check {
        config.check_html = false;
    }

    let output = output.unwrap_or_else(|| manifest_path.with_extension("apkg"));
    let package = Manifest::load(manifest_path)?.into_package()?;
    let report = package.write_to_file(&output, &config, timestamp)?;

    print_report(&output, &report);
    Ok(())
}

fn print_report(output: &Path, report: &BuildReport) {
    println!(
        "{} {}",
        "Wrote".green(),
        output.display().to_string().bold()
    );
    println!(
        "  {} decks, {} models, {} notes, {} cards, {} media files",
        report.decks, report.models, report.notes, report.cards, report.media
    );
    if !report.warnings.is_empty() {
        println!(
            "{}",
            format!(
                "  {} field(s) contained invalid HTML (see warnings above)",
                report.warnings.len()
            )
            .yellow()
        );
    }
}

fn format_cards(cards: &[Card]) -> String {
    if cards.is_empty() {
        return "none".dimmed().to_string();
    }
    cards
        .iter()
        .map(|card| {
            if card.suspend {
                format!("{} (suspended)", card.ord)
            } else {
                card.ord.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn handle_inspect(manifest_path: &Path) -> Result<()> {
    let package = Manifest::load(manifest_path)?.into_package()?;

    for deck in package.decks() {
        println!(
            "{} {}",
            deck.require_id()?.to_string().yellow(),
            deck.require_name()?.bold()
        );

        for (id, model) in deck.collect_models()? {
            let requirements = serde_json::to_string(model.requirements()?)?;
            println!("  model {} {}: req {}", id, model.name(), requirements.dimmed());
        }

        for (index, note) in deck.notes().iter().enumerate() {
            note.validate()?;
            println!(
                "  note {} guid {} cards [{}]",
                index,
                note.guid()?.cyan(),
                format_cards(note.cards()?)
            );
        }
    }
    Ok(())
}

fn handle_guid(legacy: bool, model_id: Option<i64>, fields: Vec<String>) -> Result<()> {
    let method = if legacy {
        GuidMethod::Legacy
    } else {
        GuidMethod::Current
    };
    println!("{}", derive_guid(&fields, model_id, method)?);
    Ok(())
}

fn handle_config(config_dir: &Path, key: Option<String>, value: Option<String>) -> Result<()> {
    let mut config = PackConfig::load(config_dir)?;

    match (key, value) {
        (None, _) => {
            for key in PackConfig::KEYS {
                println!("{} = {}", key, config.get(key).unwrap_or_default());
            }
        }
        (Some(key), None) => match config.get(&key) {
            Some(value) => println!("{}", value),
            None => return Err(DeckError::Config(format!("Unknown config key: {}", key))),
        },
        (Some(key), Some(value)) => {
            config.set(&key, &value)?;
            config.save(config_dir)?;
            println!("{}", format!("{} set to {}", key, value).green());
        }
    }
    Ok(())
}
