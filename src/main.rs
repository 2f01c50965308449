use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use audit_trail::audit::{RequestContext, StaticIdentity};
use audit_trail::cli::{handle_entity_command, handle_log_command, EntityCommands, LogArgs};
use audit_trail::config::{AuditPaths, Settings};
use audit_trail::storage::init::needs_initialization;
use audit_trail::storage::{initialize_storage, Storage};

#[derive(Parser)]
#[command(
    name = "audit-trail",
    version,
    about = "Snapshot-diff audit trail for persisted entities",
    long_about = "audit-trail records every create, edit and delete of an entity as an \
                  audit header plus one delta per changed field, grouped by the \
                  request that made the change."
)]
struct Cli {
    /// Id of the acting user or process
    #[arg(long, global = true, env = "AUDIT_TRAIL_SOURCE_ID")]
    source_id: Option<String>,

    /// Description of the acting user or process
    #[arg(long, global = true, env = "AUDIT_TRAIL_SOURCE_DESCRIPTION")]
    source_description: Option<String>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Entity management commands (audited)
    #[command(subcommand)]
    Entity(EntityCommands),

    /// Show the audit log
    Log(LogArgs),

    /// Initialize data directory and default settings
    Init,

    /// Show current configuration and paths
    Config,
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Initialize paths and settings
    let paths = AuditPaths::new()?;
    let settings = Settings::load_or_create(&paths)?;

    // Initialize storage
    let mut storage = Storage::new(paths.clone())?;
    storage.load_all()?;

    // One CLI invocation is one request
    let ctx = RequestContext::new()
        .with_identity(StaticIdentity::new(cli.source_id, cli.source_description));

    if !storage.is_initialized() && !matches!(cli.command, Some(Commands::Init) | None) {
        tracing::warn!(
            base_dir = %paths.base_dir().display(),
            "not initialized, run 'audit-trail init' to write default settings"
        );
    }

    match cli.command {
        Some(Commands::Entity(cmd)) => {
            handle_entity_command(&storage, &settings, &ctx, cmd)?;
        }
        Some(Commands::Log(args)) => {
            handle_log_command(&storage, args)?;
        }
        Some(Commands::Init) => {
            if !needs_initialization(&paths) && storage.is_initialized() {
                println!("Already initialized at: {}", paths.base_dir().display());
                return Ok(());
            }
            println!("Initializing audit-trail at: {}", paths.base_dir().display());
            initialize_storage(&paths)?;
            settings.save(&paths)?;
            println!("Initialization complete!");
            println!();
            println!("Declare entity types in {}", paths.settings_file().display());
            println!("Run 'audit-trail entity create <TYPE> --set name=value' to record a change.");
        }
        Some(Commands::Config) => {
            println!("audit-trail Configuration");
            println!("=========================");
            println!("Base directory: {}", paths.base_dir().display());
            println!("Settings file:  {}", paths.settings_file().display());
            println!("Entities file:  {}", paths.entities_file().display());
            println!("Audit file:     {}", paths.audits_file().display());
            println!();
            println!("Settings:");
            println!("  Comparison:        {:?}", settings.comparison);
            println!("  Ignored fields:    {}", settings.default_ignore.join(", "));
            println!("  Audit undeclared:  {}", settings.audit_undeclared);
            for entity in &settings.entities {
                println!(
                    "  {:<18} audited={} habtm=[{}] ignore=[{}]",
                    format!("{}:", entity.name),
                    entity.audited,
                    entity.habtm.join(", "),
                    entity.ignore.join(", ")
                );
            }
        }
        None => {
            println!("audit-trail - Snapshot-diff audit trail");
            println!();
            println!("Run 'audit-trail --help' for usage information.");
        }
    }

    Ok(())
}
