//! CLI commands for data export

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::{Subcommand, ValueEnum};

use crate::error::{ShopError, ShopResult};
use crate::export::{
    export_estimates_csv, export_full_json, export_full_yaml, export_invoices_csv,
    read_json_export, read_yaml_export, FullExport,
};
use crate::storage::Storage;

/// Full export formats
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ExportFormat {
    /// JSON (machine-readable)
    Json,
    /// YAML (human-readable)
    Yaml,
}

/// Export subcommands
#[derive(Subcommand, Debug)]
pub enum ExportCommands {
    /// Export every record to a file
    All {
        /// Output file path
        output: PathBuf,
        #[arg(short, long, value_enum, default_value = "json")]
        format: ExportFormat,
        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },
    /// Export estimates to CSV
    Estimates { output: PathBuf },
    /// Export invoices to CSV
    Invoices { output: PathBuf },
    /// Check that a full export parses and its references are intact
    Verify {
        /// JSON or YAML export file
        input: PathBuf,
    },
    /// Show what an export would contain
    Info,
}

/// Handle export commands
pub fn handle_export_command(storage: &Storage, cmd: ExportCommands) -> ShopResult<()> {
    match cmd {
        ExportCommands::All {
            output,
            format,
            pretty,
        } => {
            let mut writer = create_output(&output)?;
            match format {
                ExportFormat::Json => export_full_json(storage, &mut writer, pretty)?,
                ExportFormat::Yaml => export_full_yaml(storage, &mut writer)?,
            }
            writer.flush()?;
            println!("Full database exported to: {}", output.display());
        }

        ExportCommands::Estimates { output } => {
            let mut writer = create_output(&output)?;
            export_estimates_csv(storage, &mut writer)?;
            writer.flush()?;
            println!(
                "Exported {} estimates to: {}",
                storage.estimates.count()?,
                output.display()
            );
        }

        ExportCommands::Invoices { output } => {
            let mut writer = create_output(&output)?;
            export_invoices_csv(storage, &mut writer)?;
            writer.flush()?;
            println!(
                "Exported {} invoices to: {}",
                storage.invoices.count()?,
                output.display()
            );
        }

        ExportCommands::Verify { input } => {
            let contents = fs::read_to_string(&input)?;
            let export = if is_yaml(&input) {
                read_yaml_export(&contents)?
            } else {
                read_json_export(&contents)?
            };
            println!("Export is valid (schema {})", export.schema_version);
            print_summary(&export);
        }

        ExportCommands::Info => {
            let export = FullExport::from_storage(storage)?;
            println!("Export Information");
            println!("==================");
            println!("Schema Version: {}", export.schema_version);
            println!("App Version:    {}", export.app_version);
            println!();
            print_summary(&export);
        }
    }

    Ok(())
}

fn create_output(path: &Path) -> ShopResult<BufWriter<File>> {
    let file = File::create(path).map_err(|e| {
        ShopError::Export(format!("Failed to create file {}: {}", path.display(), e))
    })?;
    Ok(BufWriter::new(file))
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .map_or(false, |ext| ext == "yaml" || ext == "yml")
}

fn print_summary(export: &FullExport) {
    let meta = &export.metadata;
    println!("Data Summary:");
    println!("  Estimates:     {}", meta.estimate_count);
    println!("  Workorders:    {}", meta.workorder_count);
    println!("  Invoices:      {}", meta.invoice_count);
    println!("  Bundles:       {}", meta.bundle_count);
    println!("  Public links:  {}", meta.public_link_count);
    println!("  Outstanding:   {}", meta.outstanding_balance);
}
