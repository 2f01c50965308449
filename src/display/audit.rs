//! Audit log display formatting
//!
//! Formats audit headers and their deltas for terminal output.

use crate::audit::format_value;
use crate::models::{AuditEvent, AuditLogEntry};

/// Format one header line plus an indented line per delta
pub fn format_audit_entry(entry: &AuditLogEntry) -> String {
    let header = &entry.header;
    let icon = match header.event {
        AuditEvent::Create => "+",
        AuditEvent::Edit => "~",
        AuditEvent::Delete => "-",
    };

    let mut output = format!(
        "{} {} {:<6} {} #{}",
        header.created.format("%Y-%m-%d %H:%M:%S"),
        icon,
        header.event.to_string(),
        header.model,
        header.entity_id,
    );

    match (&header.source_id, &header.description) {
        (Some(id), Some(description)) => output.push_str(&format!(" by {} ({})", description, id)),
        (Some(id), None) => output.push_str(&format!(" by {}", id)),
        (None, Some(description)) => output.push_str(&format!(" by {}", description)),
        (None, None) => {}
    }
    output.push_str(&format!("  [{}]\n", header.id));

    for delta in &entry.deltas {
        output.push_str(&format!(
            "    {}: {} -> {}\n",
            delta.property_name,
            format_value(&delta.old_value),
            format_value(&delta.new_value)
        ));
    }

    output
}

/// Format a list of entries, grouped by request
pub fn format_audit_log(entries: &[AuditLogEntry]) -> String {
    if entries.is_empty() {
        return "No audit entries found.\n".to_string();
    }

    let mut output = String::new();
    let mut current_request = None;

    for entry in entries {
        if current_request != Some(entry.header.request_id) {
            if current_request.is_some() {
                output.push('\n');
            }
            output.push_str(&format!("Request {}\n", entry.header.request_id));
            current_request = Some(entry.header.request_id);
        }
        output.push_str(&format_audit_entry(entry));
    }

    let delta_count: usize = entries.iter().map(|e| e.deltas.len()).sum();
    output.push_str(&format!(
        "\nTotal: {} entries, {} changes\n",
        entries.len(),
        delta_count
    ));

    output
}
