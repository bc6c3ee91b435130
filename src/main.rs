use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use shopfloor::cli::{
    handle_audit_command, handle_backup_command, handle_bundle_command, handle_estimate_command,
    handle_export_command, handle_invoice_command, handle_job_command, handle_link_command,
    handle_portal_command, handle_workorder_command, AuditCommands, BackupCommands,
    BundleCommands, EstimateCommands, ExportCommands, InvoiceCommands, JobCommands, LinkCommands,
    PortalCommands, WorkorderCommands,
};
use shopfloor::config::{paths::ShopPaths, settings::Settings};
use shopfloor::storage::{initialize_storage, Storage};

#[derive(Parser)]
#[command(
    name = "shopfloor",
    version,
    about = "Repair-shop estimates, workorders and invoices from the command line",
    long_about = "shopfloor tracks auto-repair work from the first estimate, through \
                  customer approval and the workorder, to the paid invoice."
)]
struct Cli {
    /// Log debug output to stderr
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Set up the data directory
    Init {
        /// Shop name printed on customer-facing output
        #[arg(long)]
        shop_name: Option<String>,
        /// Sales tax rate in basis points (825 = 8.25%)
        #[arg(long)]
        tax_rate_bps: Option<u32>,
    },

    /// Show current configuration and paths
    Config,

    /// Estimate management
    #[command(subcommand, alias = "est")]
    Estimate(EstimateCommands),

    /// Jobs and items on an estimate
    #[command(subcommand)]
    Job(JobCommands),

    /// Preset line-item bundles
    #[command(subcommand)]
    Bundle(BundleCommands),

    /// Customer approval links
    #[command(subcommand)]
    Link(LinkCommands),

    /// Customer actions through an approval link
    #[command(subcommand)]
    Portal(PortalCommands),

    /// Workorder management
    #[command(subcommand, alias = "wo")]
    Workorder(WorkorderCommands),

    /// Invoices and payments
    #[command(subcommand, alias = "inv")]
    Invoice(InvoiceCommands),

    /// Backup and restore
    #[command(subcommand)]
    Backup(BackupCommands),

    /// Export data
    #[command(subcommand)]
    Export(ExportCommands),

    /// Audit log
    #[command(subcommand)]
    Audit(AuditCommands),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(default_level.into()))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let paths = ShopPaths::new()?;
    let mut settings = Settings::load_or_create(&paths)?;

    if let Some(Commands::Init {
        shop_name,
        tax_rate_bps,
    }) = &cli.command
    {
        if let Some(name) = shop_name {
            settings.shop_name = name.clone();
        }
        if let Some(bps) = tax_rate_bps {
            settings.tax_rate_bps = *bps;
        }
        settings.validate()?;

        println!("Initializing shopfloor at: {}", paths.base_dir().display());
        initialize_storage(&paths, &settings)?;
        settings.save(&paths)?;
        println!("Initialization complete!");
        println!();
        println!("  Shop:      {}", settings.shop_name);
        println!("  Tax rate:  {}", settings.tax_rate_display());
        println!();
        println!("Create your first estimate with 'shopfloor estimate create'.");
        return Ok(());
    }

    if !paths.is_initialized() {
        debug!(path = %paths.base_dir().display(), "first run; initializing storage");
        initialize_storage(&paths, &settings)?;
    }

    let mut storage = Storage::new(paths.clone())?;
    storage.load_all()?;

    match cli.command {
        Some(Commands::Init { .. }) => {}
        Some(Commands::Config) => {
            println!("shopfloor Configuration");
            println!("=======================");
            println!("Base directory:   {}", paths.base_dir().display());
            println!("Data directory:   {}", paths.data_dir().display());
            println!("Backup directory: {}", paths.backup_dir().display());
            println!("Audit log:        {}", paths.audit_log().display());
            println!();
            println!("Settings:");
            println!("  Shop name:          {}", settings.shop_name);
            println!("  Currency symbol:    {}", settings.currency_symbol);
            println!("  Tax rate:           {}", settings.tax_rate_display());
            println!("  Estimate validity:  {} days", settings.estimate_validity_days);
            println!("  Link lifetime:      {} hours", settings.public_link_ttl_hours);
            println!("  Invoice terms:      {} days", settings.invoice_due_days);
            println!(
                "  Number prefixes:    {} / {} / {}",
                settings.prefixes.estimate, settings.prefixes.workorder, settings.prefixes.invoice
            );
            println!(
                "  Backup retention:   {} daily, {} monthly",
                settings.backup_retention.daily_count, settings.backup_retention.monthly_count
            );
        }
        Some(Commands::Estimate(cmd)) => handle_estimate_command(&storage, &settings, cmd)?,
        Some(Commands::Job(cmd)) => handle_job_command(&storage, &settings, cmd)?,
        Some(Commands::Bundle(cmd)) => handle_bundle_command(&storage, &settings, cmd)?,
        Some(Commands::Link(cmd)) => handle_link_command(&storage, &settings, cmd)?,
        Some(Commands::Portal(cmd)) => handle_portal_command(&storage, &settings, cmd)?,
        Some(Commands::Workorder(cmd)) => handle_workorder_command(&storage, &settings, cmd)?,
        Some(Commands::Invoice(cmd)) => handle_invoice_command(&storage, &settings, cmd)?,
        Some(Commands::Backup(cmd)) => handle_backup_command(&paths, &settings, cmd)?,
        Some(Commands::Export(cmd)) => handle_export_command(&storage, cmd)?,
        Some(Commands::Audit(cmd)) => handle_audit_command(&storage, cmd)?,
        None => {
            println!("shopfloor - repair shop estimates, workorders and invoices");
            println!();
            println!("Run 'shopfloor --help' for usage information.");
        }
    }

    Ok(())
}
