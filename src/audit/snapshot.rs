//! Snapshot reading
//!
//! Loads an entity's current persisted state and reduces tracked
//! many-to-many relations to sorted comma-joined id lists.

use std::cmp::Ordering;

use serde_json::Value;

use crate::error::AuditResult;
use crate::models::{AuditConfig, EntityRecord, Snapshot};
use crate::storage::{EntityStore, FetchQuery};

/// Read the snapshot used for save auditing
///
/// Returns `Ok(None)` when the entity does not exist (deleted or hidden by
/// another process); that is an expected outcome, not an error.
pub fn read_snapshot<S>(
    store: &S,
    entity_type: &str,
    entity_id: &str,
    config: &AuditConfig,
) -> AuditResult<Option<Snapshot>>
where
    S: EntityStore + ?Sized,
{
    let query = FetchQuery::with_relations(config.habtm.iter().cloned());
    let Some(record) = store.fetch_one(entity_type, entity_id, &query)? else {
        tracing::debug!(entity_type, entity_id, "snapshot read found no entity");
        return Ok(None);
    };

    Ok(Some(build_snapshot(record, &config.habtm)))
}

/// Read the snapshot captured before a delete: plain fields, no relations
pub fn read_for_delete<S>(
    store: &S,
    entity_type: &str,
    entity_id: &str,
) -> AuditResult<Option<Snapshot>>
where
    S: EntityStore + ?Sized,
{
    let record = store.fetch_one(entity_type, entity_id, &FetchQuery::default())?;
    Ok(record.map(|r| build_snapshot(r, &[])))
}

/// Fold a fetched record into a snapshot
///
/// Each tracked relation present on the record becomes a pseudo-field
/// holding its sorted id list.
pub fn build_snapshot(record: EntityRecord, habtm: &[String]) -> Snapshot {
    let EntityRecord {
        mut fields,
        mut relations,
        ..
    } = record;

    for relation in habtm {
        if let Some(ids) = relations.remove(relation) {
            fields.insert(relation.clone(), Value::String(join_related_ids(ids)));
        }
    }

    Snapshot::new(fields)
}

/// Sort related ids ascending and join them with `,`
///
/// Ids compare numerically when every id is an integer, otherwise as text.
/// Duplicates are kept.
pub fn join_related_ids(mut ids: Vec<String>) -> String {
    if ids.iter().all(|id| id.parse::<i64>().is_ok()) {
        ids.sort_by(|a, b| compare_numeric(a, b));
    } else {
        ids.sort();
    }
    ids.join(",")
}

fn compare_numeric(a: &str, b: &str) -> Ordering {
    match (a.parse::<i64>(), b.parse::<i64>()) {
        (Ok(a), Ok(b)) => a.cmp(&b),
        _ => a.cmp(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::EntityRepository;
    use serde_json::json;
    use tempfile::TempDir;

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_join_sorts_numerically() {
        assert_eq!(join_related_ids(ids(&["3", "1", "2"])), "1,2,3");
        assert_eq!(join_related_ids(ids(&["10", "9", "100"])), "9,10,100");
    }

    #[test]
    fn test_join_keeps_duplicates() {
        assert_eq!(join_related_ids(ids(&["2", "1", "2"])), "1,2,2");
    }

    #[test]
    fn test_join_falls_back_to_text_order() {
        assert_eq!(join_related_ids(ids(&["b", "a", "10"])), "10,a,b");
        assert_eq!(join_related_ids(Vec::new()), "");
    }

    #[test]
    fn test_build_snapshot_adds_pseudo_fields_after_fields() {
        let record = EntityRecord::new("1")
            .with_field("name", "Alice")
            .with_relation("tags", ["3", "1", "2"])
            .with_relation("teams", ["5"]);

        let snap = build_snapshot(record, &["tags".to_string()]);
        let keys: Vec<_> = snap.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["name", "tags"]);
        assert_eq!(snap.get("tags"), Some(&json!("1,2,3")));
    }

    #[test]
    fn test_read_snapshot_missing_entity_is_absent() {
        let temp = TempDir::new().unwrap();
        let repo = EntityRepository::new(temp.path().join("entities.json"));
        struct Repo(EntityRepository);
        impl EntityStore for Repo {
            fn fetch_one(
                &self,
                entity_type: &str,
                id: &str,
                query: &FetchQuery,
            ) -> AuditResult<Option<EntityRecord>> {
                assert!(query.bypass_cache);
                self.0.fetch(entity_type, id, query)
            }
            fn save(&self, entity_type: &str, record: EntityRecord) -> AuditResult<bool> {
                self.0.upsert(entity_type, record)
            }
            fn remove(&self, entity_type: &str, id: &str) -> AuditResult<bool> {
                self.0.delete(entity_type, id)
            }
        }
        let store = Repo(repo);

        let config = AuditConfig::default();
        assert!(read_snapshot(&store, "Person", "1", &config).unwrap().is_none());

        store
            .save(
                "Person",
                EntityRecord::new("1")
                    .with_field("name", "Alice")
                    .with_relation("tags", ["2", "1"]),
            )
            .unwrap();

        let config = config.with_habtm(["tags"]);
        let snap = read_snapshot(&store, "Person", "1", &config).unwrap().unwrap();
        assert_eq!(snap.get("name"), Some(&json!("Alice")));
        assert_eq!(snap.get("tags"), Some(&json!("1,2")));

        let for_delete = read_for_delete(&store, "Person", "1").unwrap().unwrap();
        assert!(!for_delete.contains("tags"));
    }
}
