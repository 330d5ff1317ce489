use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::Colorize;
use schemaform::{
    config::EditorConfig,
    data::{PropertyType, RootType},
    run,
};

/// Check, format and edit position schemas from the command line.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Editor configuration file (TOML).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate schema files.
    Check {
        /// Schema files to check.
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Print a schema in canonical form.
    Fmt {
        /// Schema file.
        file: PathBuf,
        /// Single-line output.
        #[arg(long)]
        compact: bool,
        /// Rewrite the file in place.
        #[arg(short, long)]
        write: bool,
    },
    /// List the property rows of a schema.
    Items {
        /// Schema file.
        file: PathBuf,
    },
    /// Apply an edit script to a schema.
    Edit {
        /// Schema file; created if missing.
        file: PathBuf,
        /// JSON array of edit intents.
        #[arg(short, long)]
        script: PathBuf,
        /// Write the result back instead of printing it.
        #[arg(short, long)]
        write: bool,
    },
    /// Print the JSON Schema of the edit script format.
    ScriptSchema,
    /// Print the JSON Schema of the configuration file.
    ConfigSchema,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let config = match &cli.config {
        Some(path) => EditorConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => EditorConfig::default(),
    };

    match cli.command {
        Command::Check { files } => {
            let reports = run::check_files(&files, &config)?;
            let mut failed = 0;
            for report in &reports {
                match &report.result {
                    Ok(_) => println!("{} {}", "ok".green().bold(), report.path.display()),
                    Err(e) => {
                        failed += 1;
                        println!("{} {}: {e}", "error".red().bold(), report.path.display());
                    }
                }
            }
            if failed > 0 {
                anyhow::bail!("{failed} of {} schema files are invalid", reports.len());
            }
        }
        Command::Fmt {
            file,
            compact,
            write,
        } => {
            let config = EditorConfig {
                pretty: !compact && config.pretty,
                ..config
            };
            let text = run::format_file(&file, &config)?;
            if write {
                run::write_schema(&file, &text, &config)?;
            } else {
                println!("{text}");
            }
        }
        Command::Items { file } => {
            let (top, items) = run::load_items(&file, &config)?;
            if let Some(title) = &top.title {
                println!("{}", title.bold());
            }
            if top.schema_type == RootType::Array {
                println!("array of {}", top.array_item_type);
            }
            for item in &items {
                let ty = match item.property_type {
                    PropertyType::Array => {
                        format!("array<{}>", item.array_item_type)
                    }
                    other => other.to_string(),
                };
                let mark = if item.required { "*" } else { " " };
                println!(
                    "{:>4} {mark} {:<24} {:<16} {}",
                    item.id.to_string().dimmed(),
                    item.name,
                    ty.cyan(),
                    item.description.as_deref().unwrap_or_default()
                );
            }
        }
        Command::Edit {
            file,
            script,
            write,
        } => {
            let schema = run::run_script(&file, &script, &config)?;
            let text = config.codec().stringify(Some(&schema), config.pretty);
            if write {
                if let Some(backup) = run::write_schema(&file, &text, &config)? {
                    println!("backup saved to {}", backup.display());
                }
                println!("{} {}", "saved".green().bold(), file.display());
            } else {
                println!("{text}");
            }
        }
        Command::ScriptSchema => println!("{}", run::script_schema()?),
        Command::ConfigSchema => println!("{}", run::config_schema()?),
    }

    Ok(())
}
