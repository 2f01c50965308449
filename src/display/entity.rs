//! Entity display formatting

use crate::models::{value_to_string, EntityRecord};

/// Format an entity's fields and relations for display
pub fn format_entity(entity_type: &str, record: &EntityRecord) -> String {
    let mut output = format!("{} #{}\n", entity_type, record.id);

    let width = record
        .fields
        .keys()
        .chain(record.relations.keys())
        .map(|k| k.len())
        .max()
        .unwrap_or(0);

    for (name, value) in &record.fields {
        output.push_str(&format!(
            "  {:<width$}  {}\n",
            name,
            value_to_string(value),
            width = width
        ));
    }

    for (relation, ids) in &record.relations {
        let ids = if ids.is_empty() {
            "(none)".to_string()
        } else {
            ids.join(", ")
        };
        output.push_str(&format!("  {:<width$}  [{}]\n", relation, ids, width = width));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_entity() {
        let record = EntityRecord::new("3")
            .with_field("name", "Alice")
            .with_field("age", 30)
            .with_relation("tags", ["1", "2"]);

        let text = format_entity("Person", &record);
        assert!(text.starts_with("Person #3\n"));
        assert!(text.contains("  name  Alice\n"));
        assert!(text.contains("  age   30\n"));
        assert!(text.contains("  tags  [1, 2]\n"));
    }
}
