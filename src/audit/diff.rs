//! Delta computation
//!
//! Compares a fresh snapshot against the one captured before a save and
//! produces the ordered list of changed fields.

use serde_json::Value;

use crate::models::{value_to_string, AuditConfig, Comparison, FieldChange, Snapshot};

use super::hooks::AuditHooks;

/// Which diffing rules apply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffMode {
    /// Entity was just inserted: every non-empty field is reported
    Create,
    /// Entity was updated: only fields that changed are reported
    Edit,
}

/// Compute the changed fields between two snapshots
///
/// Fields are visited in the order of `new`. Ignored and virtual fields are
/// skipped. In edit mode a field missing from `old` is never reported.
pub fn compute_deltas(
    old: Option<&Snapshot>,
    new: &Snapshot,
    config: &AuditConfig,
    hooks: &dyn AuditHooks,
    mode: DiffMode,
) -> Vec<FieldChange> {
    let mut changes = Vec::new();

    for (field, new_value) in new.iter() {
        if config.is_ignored(field) || hooks.is_virtual_field(field) {
            continue;
        }

        match mode {
            DiffMode::Create => {
                if !is_blank(new_value, config.comparison) {
                    changes.push(FieldChange::new(field.as_str(), "", value_to_string(new_value)));
                }
            }
            DiffMode::Edit => {
                let Some(old_value) = old.and_then(|o| o.get(field)) else {
                    continue;
                };
                if values_differ(old_value, new_value, config.comparison) {
                    changes.push(FieldChange::new(
                        field.as_str(),
                        value_to_string(old_value),
                        value_to_string(new_value),
                    ));
                }
            }
        }
    }

    changes
}

/// Whether a value counts as empty at creation time
///
/// Strict mode treats only missing text (`null`, `""`) as empty. Loose mode
/// also treats `"0"`, `0` and `false` as empty.
pub fn is_blank(value: &Value, comparison: Comparison) -> bool {
    match comparison {
        Comparison::Strict => value_to_string(value).is_empty(),
        Comparison::Loose => is_loosely_empty(value),
    }
}

/// Whether two values count as different under the given comparison
pub fn values_differ(old: &Value, new: &Value, comparison: Comparison) -> bool {
    let (old_text, new_text) = (value_to_string(old), value_to_string(new));
    match comparison {
        Comparison::Strict => old_text != new_text,
        Comparison::Loose => !loosely_equal(old, &old_text, new, &new_text),
    }
}

fn is_loosely_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty() || s == "0",
        Value::Array(a) => a.is_empty(),
        Value::Object(_) => false,
    }
}

fn loosely_equal(old: &Value, old_text: &str, new: &Value, new_text: &str) -> bool {
    if old_text == new_text {
        return true;
    }
    if let (Ok(a), Ok(b)) = (old_text.trim().parse::<f64>(), new_text.trim().parse::<f64>()) {
        return a == b;
    }
    is_loosely_empty(old) && is_loosely_empty(new)
}

/// Render changes as `field: "old" -> "new"` joined by commas
pub fn summarize(changes: &[FieldChange]) -> Option<String> {
    if changes.is_empty() {
        return None;
    }
    Some(
        changes
            .iter()
            .map(|c| {
                format!(
                    "{}: {} -> {}",
                    c.field,
                    format_value(&c.old_value),
                    format_value(&c.new_value)
                )
            })
            .collect::<Vec<_>>()
            .join(", "),
    )
}

/// Format a stored value for human-readable display
pub(crate) fn format_value(value: &str) -> String {
    if value.is_empty() {
        return "(empty)".to_string();
    }
    // Truncate long strings
    if value.chars().count() > 50 {
        let head: String = value.chars().take(47).collect();
        format!("\"{}...\"", head)
    } else {
        format!("\"{}\"", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::hooks::NoHooks;
    use serde_json::json;

    fn snapshot(value: Value) -> Snapshot {
        match value {
            Value::Object(map) => Snapshot::new(map),
            _ => panic!("expected object"),
        }
    }

    struct VirtualFullName;

    impl AuditHooks for VirtualFullName {
        fn is_virtual_field(&self, field: &str) -> bool {
            field == "full_name"
        }
    }

    #[test]
    fn test_create_reports_non_empty_fields() {
        let new = snapshot(json!({"name": "Alice", "email": "", "nickname": null, "age": 0}));
        let changes = compute_deltas(None, &new, &AuditConfig::default(), &NoHooks, DiffMode::Create);

        assert_eq!(
            changes,
            vec![
                FieldChange::new("name", "", "Alice"),
                FieldChange::new("age", "", "0"),
            ]
        );
    }

    #[test]
    fn test_create_skips_ignored_and_virtual() {
        let new = snapshot(json!({
            "name": "Alice",
            "age": 0,
            "full_name": "Alice Smith",
            "created": "2024-01-01"
        }));
        let config = AuditConfig::default().ignoring(["age"]);
        let changes = compute_deltas(None, &new, &config, &VirtualFullName, DiffMode::Create);

        assert_eq!(changes, vec![FieldChange::new("name", "", "Alice")]);
    }

    #[test]
    fn test_loose_create_treats_zero_as_empty() {
        let new = snapshot(json!({"count": 0, "flag": false, "code": "0", "name": "x"}));
        let config = AuditConfig::default().with_comparison(Comparison::Loose);
        let changes = compute_deltas(None, &new, &config, &NoHooks, DiffMode::Create);
        assert_eq!(changes, vec![FieldChange::new("name", "", "x")]);
    }

    #[test]
    fn test_edit_reports_changed_fields_in_new_order() {
        let old = snapshot(json!({"name": "Alice", "city": "Paris", "zip": "75001"}));
        let new = snapshot(json!({"zip": "10115", "name": "Alice", "city": "Berlin"}));
        let changes = compute_deltas(Some(&old), &new, &AuditConfig::default(), &NoHooks, DiffMode::Edit);

        assert_eq!(
            changes,
            vec![
                FieldChange::new("zip", "75001", "10115"),
                FieldChange::new("city", "Paris", "Berlin"),
            ]
        );
    }

    #[test]
    fn test_edit_ignores_fields_missing_from_old() {
        let old = snapshot(json!({"name": "Alice"}));
        let new = snapshot(json!({"name": "Alice", "added_column": "value"}));
        let changes = compute_deltas(Some(&old), &new, &AuditConfig::default(), &NoHooks, DiffMode::Edit);
        assert!(changes.is_empty());
    }

    #[test]
    fn test_edit_without_old_snapshot_reports_nothing() {
        let new = snapshot(json!({"name": "Alice"}));
        let changes = compute_deltas(None, &new, &AuditConfig::default(), &NoHooks, DiffMode::Edit);
        assert!(changes.is_empty());
    }

    #[test]
    fn test_edit_skips_ignored_and_virtual() {
        let old = snapshot(json!({"name": "A", "modified": "t1", "full_name": "A X"}));
        let new = snapshot(json!({"name": "B", "modified": "t2", "full_name": "B X"}));
        let changes = compute_deltas(Some(&old), &new, &AuditConfig::default(), &VirtualFullName, DiffMode::Edit);
        assert_eq!(changes, vec![FieldChange::new("name", "A", "B")]);
    }

    #[test]
    fn test_edit_detects_relation_change() {
        let old = snapshot(json!({"name": "Alice", "tags": "1,2"}));
        let new = snapshot(json!({"name": "Alice", "tags": "1,2,3"}));
        let changes = compute_deltas(Some(&old), &new, &AuditConfig::default(), &NoHooks, DiffMode::Edit);
        assert_eq!(changes, vec![FieldChange::new("tags", "1,2", "1,2,3")]);
    }

    #[test]
    fn test_strict_comparison() {
        assert!(values_differ(&json!(0), &json!(""), Comparison::Strict));
        assert!(values_differ(&json!("1.0"), &json!("1"), Comparison::Strict));
        assert!(!values_differ(&json!(5), &json!("5"), Comparison::Strict));
        assert!(!values_differ(&json!(null), &json!(""), Comparison::Strict));
    }

    #[test]
    fn test_loose_comparison() {
        assert!(!values_differ(&json!(0), &json!(""), Comparison::Loose));
        assert!(!values_differ(&json!("0"), &json!(null), Comparison::Loose));
        assert!(!values_differ(&json!("1.0"), &json!("1"), Comparison::Loose));
        assert!(values_differ(&json!("1"), &json!("2"), Comparison::Loose));
        assert!(values_differ(&json!("abc"), &json!(""), Comparison::Loose));
    }

    #[test]
    fn test_summarize() {
        let changes = vec![
            FieldChange::new("name", "Alice", "Bob"),
            FieldChange::new("email", "", "b@example.com"),
        ];
        assert_eq!(
            summarize(&changes).unwrap(),
            "name: \"Alice\" -> \"Bob\", email: (empty) -> \"b@example.com\""
        );
        assert!(summarize(&[]).is_none());
    }

    #[test]
    fn test_long_value_truncation() {
        let long = "a".repeat(100);
        let formatted = format_value(&long);
        assert!(formatted.ends_with("...\""));
        assert_eq!(formatted.chars().count(), 52);
    }
}
