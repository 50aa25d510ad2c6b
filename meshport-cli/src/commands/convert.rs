use crate::ui::{format_duration, format_file_size, info, print_table, progress_bar, progress_styles, success, warning};
use anyhow::{Context, Result};
use clap::Args;
use meshport_core::Converter;
use std::path::PathBuf;

/// Convert a scene file to the configured output format
#[derive(Args)]
pub struct ConvertCommand {
    /// Input scene file
    pub input: PathBuf,

    /// Output file path
    pub output: PathBuf,

    /// Writer description to export with (defaults to the OBJ writer)
    #[arg(long)]
    pub writer: Option<String>,
}

impl ConvertCommand {
    pub fn execute(&self, converter: &Converter) -> Result<()> {
        info(&format!("Converting: {}", self.input.display()));

        if let Some(parent) = self.output.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .context("Failed to create output directory")?;
            }
        }

        let pb = progress_bar(0);
        pb.set_style(progress_styles::spinner());
        pb.set_message("Importing scene...");

        let result = converter
            .convert_file(&self.input, &self.output)
            .context("Conversion failed")?;

        pb.finish_and_clear();

        for message in &result.warnings {
            warning(message);
        }

        let mut rows = vec![
            ("Input".to_string(), result.input.display().to_string()),
            ("Output".to_string(), result.output.display().to_string()),
            ("Nodes".to_string(), result.nodes_visited.to_string()),
            ("Meshes".to_string(), result.meshes_exported.to_string()),
            ("Written".to_string(), format_file_size(result.bytes_written)),
            ("Duration".to_string(), format_duration(result.duration_ms)),
        ];

        let mut by_preset: Vec<_> = result.materials_assigned.iter().collect();
        by_preset.sort_by(|a, b| a.0.cmp(b.0));
        for (preset, count) in by_preset {
            rows.push((format!("Material: {}", preset), count.to_string()));
        }

        print_table("Conversion Summary:", &rows);
        success("Conversion completed successfully!");
        Ok(())
    }
}
