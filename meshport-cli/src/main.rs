use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use meshport_core::export::{ExporterInfo, ExporterRegistry, ObjExporter};
use meshport_core::import::{ImporterInfo, ImporterRegistry};
use meshport_core::{Config, Converter, DETECTION_HEADER_LEN};
use meshport_fbx::FbxImporter;
use serde::Serialize;
use std::io::Read;
use std::path::{Path, PathBuf};

mod commands;
mod ui;

use commands::convert::ConvertCommand;
use ui::{info, success, warning};

/// Meshport CLI - scene file conversion
#[derive(Parser)]
#[command(
    name = "meshport",
    version = env!("CARGO_PKG_VERSION"),
    about = "Convert binary FBX scenes to Wavefront OBJ with naming-convention material reassignment",
    long_about = None,
    arg_required_else_help = true
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a scene file
    Convert(ConvertCommand),

    /// Show version and registered reader/writer plugins
    Info {
        /// List registered importers
        #[arg(long)]
        importers: bool,

        /// List registered exporters
        #[arg(long)]
        exporters: bool,

        /// Emit machine-readable JSON
        #[arg(long)]
        json: bool,
    },

    /// Test file format detection
    Detect {
        /// File to analyze
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    colored::control::set_override(!cli.no_color);

    init_logging(cli.verbose)?;

    match &cli.command {
        Commands::Convert(cmd) => {
            let converter = build_converter(cmd.writer.clone());
            cmd.execute(&converter)
        }
        Commands::Info {
            importers,
            exporters,
            json,
        } => show_system_info(&build_converter(None), *importers, *exporters, *json),
        Commands::Detect { file } => detect_format(&build_converter(None), file),
    }
}

fn init_logging(verbose: bool) -> Result<()> {
    let level = if verbose { "debug" } else { "info" };

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "meshport_core={},meshport_fbx={},meshport_cli={}",
            level, level, level
        ))
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    Ok(())
}

fn build_converter(writer: Option<String>) -> Converter {
    let mut importers = ImporterRegistry::new();
    importers.register(Box::new(FbxImporter::new()));

    let mut exporters = ExporterRegistry::new();
    exporters.register(Box::new(ObjExporter::new()));

    let mut config = Config::default();
    if let Some(description) = writer {
        config.writer_description = description;
    }

    Converter::with_config(importers, exporters, config)
}

#[derive(Serialize)]
struct SystemInfo {
    version: &'static str,
    importers: Vec<ImporterInfo>,
    exporters: Vec<ExporterInfo>,
}

fn show_system_info(
    converter: &Converter,
    show_importers: bool,
    show_exporters: bool,
    json: bool,
) -> Result<()> {
    let info = SystemInfo {
        version: meshport_core::VERSION,
        importers: converter.importers().list(),
        exporters: converter.exporters().list(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("{}", "Meshport System Information".bright_blue().bold());
    println!("Version: {}", info.version.bright_green());
    println!("Registered Importers: {}", info.importers.len());
    println!("Registered Exporters: {}", info.exporters.len());
    println!("Default Writer: {}", converter.config().writer_description);

    if show_importers {
        println!("\n{}", "Registered Importers:".bright_yellow().bold());
        for reader in &info.importers {
            println!(
                "  {} {} v{} (.{})",
                "✓".bright_green(),
                reader.name,
                reader.version,
                reader.extensions.join(", .")
            );
        }
    }

    if show_exporters {
        println!("\n{}", "Registered Exporters:".bright_yellow().bold());
        for writer in &info.exporters {
            println!(
                "  {} {} (.{})",
                "✓".bright_green(),
                writer.description,
                writer.extensions.join(", .")
            );
        }
    }

    Ok(())
}

fn detect_format(converter: &Converter, file_path: &Path) -> Result<()> {
    if !file_path.exists() {
        return Err(anyhow::anyhow!(
            "File does not exist: {}",
            file_path.display()
        ));
    }

    info(&format!("Analyzing file: {}", file_path.display()));

    let mut header = vec![0u8; DETECTION_HEADER_LEN];
    let mut file = std::fs::File::open(file_path).context("Failed to read file")?;
    let read = file.read(&mut header).context("Failed to read file")?;
    header.truncate(read);

    println!("{}", "Format Detection Results:".bright_blue().bold());

    match converter.importers().find(file_path, &header) {
        Some(importer) => {
            success(&format!("{} format detected", importer.name()));
            println!("  Reader version: {}", importer.version());
        }
        None => {
            warning("No supported format detected");
            println!("  File size: {} bytes", file.metadata()?.len());
            println!(
                "  Header (first 16 bytes): {:02x?}",
                &header[..header.len().min(16)]
            );
        }
    }

    Ok(())
}
