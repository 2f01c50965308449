//! Strongly-typed ID wrappers for audit records
//!
//! Header and delta ids are sequence numbers handed out by the audit store on
//! insert. Correlation ids are random UUIDs grouping every record written
//! during one logical request.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Macro to generate sequence-number ID newtype wrappers
macro_rules! define_seq_id {
    ($name:ident, $display_prefix:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Create an ID from a raw sequence number
            pub fn new(value: u64) -> Self {
                Self(value)
            }

            /// Get the underlying sequence number
            pub fn value(&self) -> u64 {
                self.0
            }

            /// The id following this one
            pub fn next(&self) -> Self {
                Self(self.0 + 1)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}{}", $display_prefix, self.0)
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }

        impl FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.strip_prefix($display_prefix).unwrap_or(s);
                Ok(Self(s.parse()?))
            }
        }
    };
}

define_seq_id!(HeaderId, "aud-");
define_seq_id!(DeltaId, "dlt-");

/// Correlation id grouping all audit records of one logical request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(Uuid);

impl CorrelationId {
    /// Generate a new random correlation id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Parse a correlation id from its string form
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for CorrelationId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl FromStr for CorrelationId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_id_display() {
        let id = HeaderId::new(12);
        assert_eq!(id.to_string(), "aud-12");
        assert_eq!(id.value(), 12);
    }

    #[test]
    fn test_seq_id_next() {
        assert_eq!(DeltaId::new(1).next(), DeltaId::new(2));
    }

    #[test]
    fn test_seq_id_parse_with_and_without_prefix() {
        assert_eq!("aud-7".parse::<HeaderId>().unwrap(), HeaderId::new(7));
        assert_eq!("7".parse::<HeaderId>().unwrap(), HeaderId::new(7));
        assert!("aud-x".parse::<HeaderId>().is_err());
    }

    #[test]
    fn test_correlation_id_is_non_empty() {
        let id = CorrelationId::new();
        assert!(!id.as_uuid().is_nil());
        assert_eq!(id.to_string().len(), 36);
    }

    #[test]
    fn test_correlation_id_parse() {
        let uuid_str = "550e8400-e29b-41d4-a716-446655440000";
        let id = CorrelationId::parse(uuid_str).unwrap();
        assert_eq!(id.to_string(), uuid_str);
    }

    #[test]
    fn test_id_serialization() {
        let id = HeaderId::new(3);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "3");
        let back: HeaderId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
