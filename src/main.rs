// SPDX-License-Identifier: PMPL-1.0-or-later
//! Altbot CLI - Image Alt-Text Compliance Gate

use altbot::config::{self, Config};
use altbot::library::{self, LibraryFilter};
use altbot::report::{generate_report, render_counts, render_page, OutputFormat};
use altbot::scanner::Scanner;
use altbot::{Actor, Classifier, InlineEditor, JsonFileStore, Pathway, SaveGate, SaveRequest};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Decorative-aware image alt-text compliance gate
#[derive(Parser)]
#[command(name = "altbot")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Metadata store (overrides the configured path)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    format: FormatArg,

    /// Enable verbose logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Audit every content file in a directory
    Check {
        dir: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Audit a single content file
    Analyze { file: PathBuf },

    /// Run the save gate against a content file
    Gate {
        file: PathBuf,

        /// Save pathway to emulate
        #[arg(long, default_value = "rest")]
        pathway: PathwayArg,

        /// Post id reported in logs and decisions
        #[arg(long, default_value_t = 0)]
        post_id: u64,
    },

    /// List media library images by classification
    Library {
        /// all, decorative, non_decorative_with_alt or non_decorative_no_alt
        #[arg(long, default_value = "all")]
        filter: String,

        #[arg(long, default_value_t = 1)]
        page: usize,
    },

    /// Count media library images per classification
    Counts,

    /// Set the alt text of an image
    SetAlt { id: u64, alt_text: String },

    /// Mark an image decorative (or clear the flag with --off)
    Decorative {
        id: u64,

        #[arg(long)]
        off: bool,
    },

    /// Write a default configuration file
    InitConfig,

    /// Show the effective configuration
    ShowConfig,
}

/// Output format CLI argument
#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Text,
    Json,
    Sarif,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => OutputFormat::Text,
            FormatArg::Json => OutputFormat::Json,
            FormatArg::Sarif => OutputFormat::Sarif,
        }
    }
}

/// Save pathway CLI argument
#[derive(Debug, Clone, Copy, ValueEnum)]
enum PathwayArg {
    Classic,
    Rest,
}

impl From<PathwayArg> for Pathway {
    fn from(arg: PathwayArg) -> Self {
        match arg {
            PathwayArg::Classic => Pathway::Classic,
            PathwayArg::Rest => Pathway::Rest,
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("altbot=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("altbot=warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// The local operator runs with full edit rights
fn cli_actor() -> Actor {
    let login = std::env::var("USER").unwrap_or_else(|_| "cli".to_string());
    Actor::editor(&login)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config_path = cli.config.clone().unwrap_or_else(config::default_config_path);
    let mut config = config::load_config(&config_path)?;
    if let Some(store) = cli.store.clone() {
        config.store_path = store;
    }
    let format: OutputFormat = cli.format.into();

    match cli.command {
        Commands::Check { dir, output } => {
            let store = JsonFileStore::open(&config.store_path)?;
            let scanner = Scanner::new(Classifier::new(config.alt_source), &store)
                .with_extensions(&config.scan_extensions);
            let findings = scanner.scan_directory(&dir)?;
            write_output(&generate_report(&findings, format), output.as_deref())?;

            if findings.blocks_save() {
                std::process::exit(1);
            }
        }

        Commands::Analyze { file } => {
            let store = JsonFileStore::open(&config.store_path)?;
            let scanner = Scanner::new(Classifier::new(config.alt_source), &store);
            let findings = scanner.scan_file(&file)?;
            println!("{}", generate_report(&findings, format));

            if findings.blocks_save() {
                std::process::exit(1);
            }
        }

        Commands::Gate { file, pathway, post_id } => {
            let store = JsonFileStore::open(&config.store_path)?;
            let content = std::fs::read_to_string(&file)?;
            let gate = SaveGate::new(store, config.alt_source);
            let decision = gate.check(pathway.into(), &cli_actor(), &SaveRequest::new(post_id, content));

            match format {
                OutputFormat::Text => match decision.message() {
                    Some(message) => println!("BLOCKED: {}", message),
                    None => println!("ALLOWED"),
                },
                _ => println!("{}", serde_json::to_string_pretty(&decision)?),
            }

            if !decision.is_allowed() {
                std::process::exit(1);
            }
        }

        Commands::Library { filter, page } => {
            let store = JsonFileStore::open(&config.store_path)?;
            let filter: LibraryFilter = filter.parse()?;
            let page = library::list(&store, filter, page, config.per_page)?;
            print!("{}", render_page(&page, format));
        }

        Commands::Counts => {
            let store = JsonFileStore::open(&config.store_path)?;
            print!("{}", render_counts(&library::counts(&store)?, format));
        }

        Commands::SetAlt { id, alt_text } => {
            let editor = InlineEditor::new(JsonFileStore::open(&config.store_path)?);
            let response = editor.respond_alt_text(&cli_actor(), id, &alt_text);
            println!("{}", serde_json::to_string_pretty(&response)?);

            if !response.success {
                std::process::exit(1);
            }
        }

        Commands::Decorative { id, off } => {
            let editor = InlineEditor::new(JsonFileStore::open(&config.store_path)?);
            let record = editor.set_decorative(&cli_actor(), id, !off)?;
            println!("Image {} is now {}", record.id, record.classification());
        }

        Commands::InitConfig => {
            config::write_default_config(&config_path)?;
            eprintln!("Configuration written to {}", config_path.display());
        }

        Commands::ShowConfig => {
            show_config(&config_path, &config)?;
        }
    }

    Ok(())
}

fn show_config(path: &Path, config: &Config) -> anyhow::Result<()> {
    println!("# {}", path.display());
    println!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

/// Write output to file or stdout
fn write_output(content: &str, path: Option<&Path>) -> anyhow::Result<()> {
    match path {
        Some(p) => {
            std::fs::write(p, content)?;
            eprintln!("Report written to {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
