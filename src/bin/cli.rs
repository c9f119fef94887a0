// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Polyframe Viewer CLI

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use polyframe_viewer::cli::{Reporter, Runner};
use polyframe_viewer::{io, ViewerConfig};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "polyframe-view")]
#[command(about = "Polyframe Viewer - model ingestion, auto-orientation and framing", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Viewer configuration file (TOML)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run models through the load pipeline and report their placement
    Orient {
        /// Model file(s)
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Print raw mesh statistics without placing the model
    Inspect {
        /// Model file
        file: PathBuf,
    },

    /// List supported model formats
    Formats,

    /// Print the effective configuration as TOML
    Config,

    /// Show version information
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(cli.config.as_deref())?;

    match &cli.command {
        Commands::Orient { files } => orient_command(files, config, cli.json, cli.verbose)?,
        Commands::Inspect { file } => inspect_command(file, config, cli.json)?,
        Commands::Formats => formats_command(cli.json)?,
        Commands::Config => {
            print!("{}", toml::to_string_pretty(&config).context("Failed to serialize config")?);
        }
        Commands::Version => {
            println!("Polyframe Viewer v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "polyframe_viewer=debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<ViewerConfig> {
    match path {
        Some(path) => {
            let mut config = ViewerConfig::from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?;
            config.apply_env_overrides();
            config.validate()?;
            Ok(config)
        }
        None => ViewerConfig::load().context("Failed to load viewer.toml"),
    }
}

fn orient_command(files: &[PathBuf], config: ViewerConfig, json: bool, verbose: bool) -> Result<()> {
    let runner = Runner::new(config);

    let progress = if files.len() > 1 && !json {
        let pb = ProgressBar::new(files.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
                .context("Invalid progress template")?
                .progress_chars("#>-"),
        );
        Some(pb)
    } else {
        None
    };

    let mut reports = Vec::new();
    let mut failures = 0usize;

    for file in files {
        if let Some(ref pb) = progress {
            pb.set_message(format!("Orienting {}", file.display()));
        }

        match runner.orient(file) {
            Ok(report) => reports.push(report),
            Err(e) => {
                failures += 1;
                if json {
                    eprintln!("{}: {:#}", file.display(), e);
                } else {
                    Reporter::report_error(&format!("{:#}", e));
                }
            }
        }

        if let Some(ref pb) = progress {
            pb.inc(1);
        }
    }

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for report in &reports {
            Reporter::report_orientation(report);
        }
        if verbose || files.len() > 1 {
            println!(
                "\n  {} {}   {} {}",
                "Oriented:".bright_black(),
                reports.len().to_string().green(),
                "Failed:".bright_black(),
                if failures > 0 {
                    failures.to_string().red()
                } else {
                    failures.to_string().green()
                }
            );
        }
    }

    if failures > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn inspect_command(file: &Path, config: ViewerConfig, json: bool) -> Result<()> {
    let report = Runner::new(config).inspect(file)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        Reporter::report_inspection(&report);
    }
    Ok(())
}

fn formats_command(json: bool) -> Result<()> {
    let extensions = io::supported_extensions();
    if json {
        println!("{}", serde_json::to_string(&extensions)?);
    } else {
        Reporter::report_info("Supported model formats:");
        for extension in extensions {
            println!("  .{}", extension);
        }
    }
    Ok(())
}
