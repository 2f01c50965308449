//! Request context and identity
//!
//! Every logical request (one CLI invocation, one web request, one batch job)
//! gets its own [`RequestContext`]. The context lazily generates the
//! correlation id shared by all audit records of that request and resolves
//! the acting source through an [`IdentitySource`].

use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::models::{CorrelationId, Source};

/// Resolves who is performing the current operation
pub trait IdentitySource {
    /// The acting user or process, if known
    fn current_source(&self) -> Option<Source>;
}

/// Identity fixed at construction time
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticIdentity {
    source: Option<Source>,
}

impl StaticIdentity {
    pub fn new(id: Option<String>, description: Option<String>) -> Self {
        let source = Source::new(id, description);
        Self {
            source: (!source.is_empty()).then_some(source),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }
}

impl IdentitySource for StaticIdentity {
    fn current_source(&self) -> Option<Source> {
        self.source.clone()
    }
}

/// Per-request state passed explicitly into every audited operation
#[derive(Default)]
pub struct RequestContext {
    correlation_id: OnceLock<CorrelationId>,
    identity: Option<Arc<dyn IdentitySource + Send + Sync>>,
}

impl RequestContext {
    /// Create a context whose correlation id is generated on first use
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context bound to a known correlation id
    pub fn with_correlation_id(id: CorrelationId) -> Self {
        let ctx = Self::default();
        let _ = ctx.correlation_id.set(id);
        ctx
    }

    /// Attach the identity source for this request
    pub fn with_identity(mut self, identity: impl IdentitySource + Send + Sync + 'static) -> Self {
        self.identity = Some(Arc::new(identity));
        self
    }

    /// The request's correlation id, generated once and stable afterwards
    pub fn correlation_id(&self) -> CorrelationId {
        *self.correlation_id.get_or_init(|| {
            let id = CorrelationId::new();
            tracing::debug!(request_id = %id, "generated correlation id");
            id
        })
    }

    /// Forget the correlation id so the next call generates a fresh one
    pub fn reset(&mut self) {
        self.correlation_id = OnceLock::new();
    }

    /// The acting source, if an identity source is attached and knows it
    pub fn current_source(&self) -> Option<Source> {
        self.identity.as_ref().and_then(|i| i.current_source())
    }
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("correlation_id", &self.correlation_id.get())
            .field("has_identity", &self.identity.is_some())
            .finish()
    }
}
