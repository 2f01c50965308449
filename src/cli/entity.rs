//! Entity CLI commands
//!
//! Implements audited create, update, delete and show of entity records.

use std::collections::BTreeMap;

use clap::Subcommand;
use serde_json::{Map, Value};

use crate::audit::RequestContext;
use crate::config::Settings;
use crate::display::format_entity;
use crate::error::{AuditError, AuditResult};
use crate::services::{EntityChange, EntityPatch, EntityService};
use crate::storage::Storage;

/// Entity subcommands
#[derive(Subcommand)]
pub enum EntityCommands {
    /// Create an entity
    Create {
        /// Entity type
        entity_type: String,
        /// Primary key (next numeric id when omitted)
        #[arg(long)]
        id: Option<String>,
        /// Field assignment, `name=value` (value parsed as JSON when valid)
        #[arg(short, long = "set", value_name = "FIELD=VALUE")]
        set: Vec<String>,
        /// Many-to-many links, `relation=1,2,3`
        #[arg(short, long = "link", value_name = "RELATION=IDS")]
        link: Vec<String>,
    },
    /// Update an entity
    Update {
        /// Entity type
        entity_type: String,
        /// Primary key
        id: String,
        /// Field assignment, `name=value` (value parsed as JSON when valid)
        #[arg(short, long = "set", value_name = "FIELD=VALUE")]
        set: Vec<String>,
        /// Field to remove
        #[arg(short, long = "unset", value_name = "FIELD")]
        unset: Vec<String>,
        /// Many-to-many links, `relation=1,2,3` (empty list clears)
        #[arg(short, long = "link", value_name = "RELATION=IDS")]
        link: Vec<String>,
    },
    /// Delete an entity
    Delete {
        /// Entity type
        entity_type: String,
        /// Primary key
        id: String,
    },
    /// Show an entity
    Show {
        /// Entity type
        entity_type: String,
        /// Primary key
        id: String,
    },
    /// List entities of a type
    List {
        /// Entity type
        entity_type: String,
    },
}

/// Handle an entity command
pub fn handle_entity_command(
    storage: &Storage,
    settings: &Settings,
    ctx: &RequestContext,
    cmd: EntityCommands,
) -> AuditResult<()> {
    let service = EntityService::new(storage, settings, ctx);

    match cmd {
        EntityCommands::Create {
            entity_type,
            id,
            set,
            link,
        } => {
            let change = service.create(
                &entity_type,
                id.as_deref(),
                parse_assignments(&set)?,
                parse_links(&link)?,
            )?;
            println!("Created {} #{}", entity_type, change.record.id);
            print_audit(&change);
        }

        EntityCommands::Update {
            entity_type,
            id,
            set,
            unset,
            link,
        } => {
            let patch = EntityPatch {
                set: parse_assignments(&set)?,
                unset,
                link: parse_links(&link)?,
            };
            if patch.is_empty() {
                println!("Nothing to update. Use --set, --unset or --link.");
                return Ok(());
            }

            let change = service.update(&entity_type, &id, patch)?;
            println!("Updated {} #{}", entity_type, change.record.id);
            print_audit(&change);
        }

        EntityCommands::Delete { entity_type, id } => {
            let change = service.delete(&entity_type, &id)?;
            println!("Deleted {} #{}", entity_type, change.record.id);
            print_audit(&change);
        }

        EntityCommands::Show { entity_type, id } => {
            let record = service
                .get(&entity_type, &id)?
                .ok_or_else(|| AuditError::entity_not_found(entity_type.as_str(), id.as_str()))?;
            print!("{}", format_entity(&entity_type, &record));
        }

        EntityCommands::List { entity_type } => {
            let records = service.list(&entity_type)?;
            if records.is_empty() {
                println!("No {} entities found.", entity_type);
                return Ok(());
            }
            for record in &records {
                print!("{}", format_entity(&entity_type, record));
            }
            println!("\nTotal: {} entities", records.len());
        }
    }

    Ok(())
}

fn print_audit(change: &EntityChange) {
    match change.header_id {
        Some(header_id) => println!("Audit: {}", header_id),
        None => println!("Audit: no changes recorded"),
    }
}

/// Parse `name=value` pairs into an ordered field map
///
/// Values that parse as JSON keep their type; anything else is a string.
pub fn parse_assignments(assignments: &[String]) -> AuditResult<Map<String, Value>> {
    let mut fields = Map::new();
    for assignment in assignments {
        let (name, raw) = split_pair(assignment)?;
        let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        fields.insert(name.to_string(), value);
    }
    Ok(fields)
}

/// Parse `relation=1,2,3` pairs
pub fn parse_links(links: &[String]) -> AuditResult<BTreeMap<String, Vec<String>>> {
    let mut relations = BTreeMap::new();
    for link in links {
        let (relation, raw) = split_pair(link)?;
        let ids = raw
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(String::from)
            .collect();
        relations.insert(relation.to_string(), ids);
    }
    Ok(relations)
}

fn split_pair(pair: &str) -> AuditResult<(&str, &str)> {
    match pair.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => Ok((name.trim(), value)),
        _ => Err(AuditError::Validation(format!(
            "Expected NAME=VALUE, got '{}'",
            pair
        ))),
    }
}
