//! String-backed identifiers.
//!
//! Stored documents carry ids minted by older builds (short random strings),
//! so ids are opaque strings rather than parsed UUIDs. Fresh ids are UUIDv4.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Mint a fresh opaque id.
pub fn fresh_id() -> String {
    Uuid::new_v4().simple().to_string()
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new() -> Self {
                Self(fresh_id())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

string_id!(
    /// Document identifier
    DocumentId
);
string_id!(
    /// Element identifier, unique within one document
    ElementId
);
string_id!(
    /// Snapshot identifier
    SnapshotId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_ids_are_distinct_and_non_empty() {
        let a = ElementId::new();
        let b = ElementId::new();
        assert_ne!(a, b);
        assert!(!a.as_str().is_empty());
    }

    #[test]
    fn legacy_ids_round_trip_as_plain_strings() {
        let id: ElementId = serde_json::from_str("\"k3j9x0a2b\"").unwrap();
        assert_eq!(id.as_str(), "k3j9x0a2b");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"k3j9x0a2b\"");
    }
}
