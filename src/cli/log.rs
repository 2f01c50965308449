//! Audit log CLI command
//!
//! Lists recorded audit headers with their deltas, as text or as a JSON or
//! YAML export.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use clap::{Args, ValueEnum};

use crate::display::format_audit_log;
use crate::error::{AuditError, AuditResult};
use crate::export::{export_audit_log_json, export_audit_log_yaml};
use crate::models::{AuditEvent, CorrelationId};
use crate::services::AuditLogService;
use crate::storage::{AuditFilter, Storage};

/// Output format options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON export
    Json,
    /// YAML export
    Yaml,
}

/// Arguments of the `log` command
#[derive(Args, Debug, Default)]
pub struct LogArgs {
    /// Only entries of this entity type
    #[arg(short, long)]
    pub model: Option<String>,

    /// Only entries of this entity id
    #[arg(short, long)]
    pub entity_id: Option<String>,

    /// Only entries of this request (correlation id)
    #[arg(short, long)]
    pub request_id: Option<String>,

    /// Only entries of this event (create, edit, delete)
    #[arg(long)]
    pub event: Option<String>,

    /// Show only the most recent N entries
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: LogFormat,

    /// Write to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl LogArgs {
    /// Build the store filter from the arguments
    pub fn filter(&self) -> AuditResult<AuditFilter> {
        let mut filter = AuditFilter::default();

        if let Some(model) = &self.model {
            filter = filter.model(model.as_str());
        }
        if let Some(entity_id) = &self.entity_id {
            filter = filter.entity_id(entity_id.as_str());
        }
        if let Some(request_id) = &self.request_id {
            let request_id = CorrelationId::parse(request_id).map_err(|e| {
                AuditError::Validation(format!("Invalid request id '{}': {}", request_id, e))
            })?;
            filter = filter.request_id(request_id);
        }
        if let Some(event) = &self.event {
            let event: AuditEvent = event.parse().map_err(AuditError::Validation)?;
            filter = filter.event(event);
        }
        if let Some(limit) = self.limit {
            filter = filter.limit(limit);
        }

        Ok(filter)
    }
}

/// Handle the `log` command
pub fn handle_log_command(storage: &Storage, args: LogArgs) -> AuditResult<()> {
    let filter = args.filter()?;
    let entries = AuditLogService::new(storage).entries(&filter)?;
    let count = entries.len();

    let mut writer: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(File::create(path).map_err(|e| {
            AuditError::Export(format!("Failed to create {}: {}", path.display(), e))
        })?)),
        None => Box::new(io::stdout().lock()),
    };

    match args.format {
        LogFormat::Text => write!(writer, "{}", format_audit_log(&entries))
            .map_err(|e| AuditError::Export(e.to_string()))?,
        LogFormat::Json => export_audit_log_json(entries, &mut writer, true)?,
        LogFormat::Yaml => export_audit_log_yaml(entries, &mut writer)?,
    }
    writer.flush().map_err(|e| AuditError::Export(e.to_string()))?;

    if let Some(path) = &args.output {
        println!("Exported {} entries to {}", count, path.display());
    }

    Ok(())
}
