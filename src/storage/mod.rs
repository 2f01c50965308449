//! Storage layer for audit-trail
//!
//! The audit engine only needs two capabilities from the host's persistence:
//! fetching an entity by primary key ([`EntityStore`]) and appending audit
//! rows ([`AuditStore`]). [`Storage`] implements both on top of JSON files
//! with atomic writes.

pub mod audits;
pub mod entities;
pub mod file_io;
pub mod init;

pub use audits::AuditRepository;
pub use entities::EntityRepository;
pub use file_io::{read_json, write_json_atomic};
pub use init::initialize_storage;

use crate::config::paths::AuditPaths;
use crate::error::AuditError;
use crate::models::{
    AuditDelta, AuditEvent, AuditHeader, CorrelationId, DeltaId, EntityRecord, HeaderId,
    NewAuditDelta, NewAuditHeader,
};

/// Options for a fetch-by-id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchQuery {
    /// Many-to-many relations to include; nothing else is joined
    pub relations: Vec<String>,
    /// Skip any result cache the store keeps
    pub bypass_cache: bool,
}

impl Default for FetchQuery {
    fn default() -> Self {
        Self {
            relations: Vec::new(),
            bypass_cache: true,
        }
    }
}

impl FetchQuery {
    pub fn with_relations<I, S>(relations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            relations: relations.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }
}

/// Filter for reading back the audit trail
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditFilter {
    pub model: Option<String>,
    pub entity_id: Option<String>,
    pub request_id: Option<CorrelationId>,
    pub event: Option<AuditEvent>,
    /// Keep only the most recent N matches
    pub limit: Option<usize>,
}

impl AuditFilter {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn entity_id(mut self, entity_id: impl Into<String>) -> Self {
        self.entity_id = Some(entity_id.into());
        self
    }

    pub fn request_id(mut self, request_id: CorrelationId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    pub fn event(mut self, event: AuditEvent) -> Self {
        self.event = Some(event);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether a header passes every set criterion
    pub fn matches(&self, header: &AuditHeader) -> bool {
        self.model.as_ref().map_or(true, |m| &header.model == m)
            && self.entity_id.as_ref().map_or(true, |e| &header.entity_id == e)
            && self.request_id.map_or(true, |r| header.request_id == r)
            && self.event.map_or(true, |e| header.event == e)
    }
}

/// Host persistence for audited entities
///
/// A fetch issued right after a write must observe that write.
pub trait EntityStore {
    /// Fetch one entity by primary key; `None` when it does not exist
    fn fetch_one(
        &self,
        entity_type: &str,
        id: &str,
        query: &FetchQuery,
    ) -> Result<Option<EntityRecord>, AuditError>;

    /// Insert or update an entity, returning true when it was inserted
    fn save(&self, entity_type: &str, record: EntityRecord) -> Result<bool, AuditError>;

    /// Delete an entity, returning true when it existed
    fn remove(&self, entity_type: &str, id: &str) -> Result<bool, AuditError>;
}

/// Append-only persistence for audit headers and deltas
pub trait AuditStore {
    fn insert_header(&self, header: NewAuditHeader) -> Result<HeaderId, AuditError>;

    fn insert_delta(&self, delta: NewAuditDelta) -> Result<DeltaId, AuditError>;

    fn headers(&self, filter: &AuditFilter) -> Result<Vec<AuditHeader>, AuditError>;

    fn deltas_for(&self, audit_id: HeaderId) -> Result<Vec<AuditDelta>, AuditError>;
}

/// A store able to both read entities and write the audit trail
pub trait AuditBackend: EntityStore + AuditStore {}

impl<T: EntityStore + AuditStore + ?Sized> AuditBackend for T {}

/// Main storage coordinator that provides access to all repositories
pub struct Storage {
    paths: AuditPaths,
    pub entities: EntityRepository,
    pub audits: AuditRepository,
}

impl Storage {
    /// Create a new Storage instance
    pub fn new(paths: AuditPaths) -> Result<Self, AuditError> {
        paths.ensure_directories()?;

        Ok(Self {
            entities: EntityRepository::new(paths.entities_file()),
            audits: AuditRepository::new(paths.audits_file()),
            paths,
        })
    }

    /// Get the paths configuration
    pub fn paths(&self) -> &AuditPaths {
        &self.paths
    }

    /// Load all data from disk
    pub fn load_all(&mut self) -> Result<(), AuditError> {
        self.entities.load()?;
        self.audits.load()?;
        Ok(())
    }

    /// Save all data to disk
    pub fn save_all(&self) -> Result<(), AuditError> {
        self.entities.save()?;
        self.audits.save()?;
        Ok(())
    }

    /// Check if storage has been initialized
    pub fn is_initialized(&self) -> bool {
        self.paths.settings_file().exists()
    }
}

impl EntityStore for Storage {
    fn fetch_one(
        &self,
        entity_type: &str,
        id: &str,
        query: &FetchQuery,
    ) -> Result<Option<EntityRecord>, AuditError> {
        self.entities.fetch(entity_type, id, query)
    }

    fn save(&self, entity_type: &str, record: EntityRecord) -> Result<bool, AuditError> {
        self.entities.upsert(entity_type, record)
    }

    fn remove(&self, entity_type: &str, id: &str) -> Result<bool, AuditError> {
        self.entities.delete(entity_type, id)
    }
}

impl AuditStore for Storage {
    fn insert_header(&self, header: NewAuditHeader) -> Result<HeaderId, AuditError> {
        self.audits.insert_header(header)
    }

    fn insert_delta(&self, delta: NewAuditDelta) -> Result<DeltaId, AuditError> {
        self.audits.insert_delta(delta)
    }

    fn headers(&self, filter: &AuditFilter) -> Result<Vec<AuditHeader>, AuditError> {
        self.audits.headers(filter)
    }

    fn deltas_for(&self, audit_id: HeaderId) -> Result<Vec<AuditDelta>, AuditError> {
        self.audits.deltas_for(audit_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_storage_creation() {
        let temp_dir = TempDir::new().unwrap();
        let paths = AuditPaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::new(paths).unwrap();

        assert!(temp_dir.path().join("data").exists());
        assert!(!storage.is_initialized());
    }

    #[test]
    fn test_storage_round_trip_through_traits() {
        let temp_dir = TempDir::new().unwrap();
        let paths = AuditPaths::with_base_dir(temp_dir.path().to_path_buf());
        let mut storage = Storage::new(paths.clone()).unwrap();

        let store: &dyn AuditBackend = &storage;
        store
            .save("Person", EntityRecord::new("1").with_field("name", "Alice"))
            .unwrap();
        store
            .insert_header(NewAuditHeader {
                event: AuditEvent::Create,
                model: "Person".into(),
                entity_id: "1".into(),
                request_id: CorrelationId::new(),
                json_object: r#"{"Person":{"name":"Alice"}}"#.into(),
                source_id: None,
                description: None,
            })
            .unwrap();
        storage.save_all().unwrap();

        storage = Storage::new(paths).unwrap();
        storage.load_all().unwrap();
        assert!(storage
            .fetch_one("Person", "1", &FetchQuery::default())
            .unwrap()
            .is_some());
        assert_eq!(storage.headers(&AuditFilter::default()).unwrap().len(), 1);
    }

    #[test]
    fn test_fetch_query_defaults_to_bypassing_cache() {
        assert!(FetchQuery::default().bypass_cache);
        let query = FetchQuery::with_relations(["tags"]);
        assert!(query.bypass_cache);
        assert_eq!(query.relations, vec!["tags".to_string()]);
    }

    #[test]
    fn test_filter_matches() {
        let header = AuditHeader::from_new(
            HeaderId::new(1),
            NewAuditHeader {
                event: AuditEvent::Edit,
                model: "Person".into(),
                entity_id: "7".into(),
                request_id: CorrelationId::new(),
                json_object: "{}".into(),
                source_id: None,
                description: None,
            },
            chrono::Utc::now(),
        );

        assert!(AuditFilter::default().matches(&header));
        assert!(AuditFilter::default().model("Person").entity_id("7").matches(&header));
        assert!(!AuditFilter::default().entity_id("8").matches(&header));
        assert!(!AuditFilter::default().event(AuditEvent::Delete).matches(&header));
    }
}
