//! Company identity and the per-run fetch cache

use std::collections::HashMap;

use crate::domain::slug::derive_slug;
use crate::domain::value_objects::FetchedValue;

/// Cache / dedup key: the registration number plus the derived slug.
///
/// Two rows with the same identity point at the same Endole page.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity {
    record_id: String,
    slug: String,
}

impl Identity {
    pub fn new(record_id: &str, slug: impl Into<String>) -> Self {
        Self {
            record_id: record_id.trim().to_string(),
            slug: slug.into(),
        }
    }

    /// Identity for a registration number and a raw display name.
    pub fn from_row(record_id: &str, display_name: &str) -> Self {
        Self::new(record_id, derive_slug(display_name))
    }

    pub fn record_id(&self) -> &str {
        &self.record_id
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.record_id, self.slug)
    }
}

/// In-memory memo of fetched values, scoped to one run.
///
/// Grows monotonically; never evicted and never persisted.
#[derive(Debug, Default)]
pub struct IdentityCache {
    entries: HashMap<Identity, FetchedValue>,
}

impl IdentityCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, identity: &Identity) -> Option<&FetchedValue> {
        self.entries.get(identity)
    }

    pub fn put(&mut self, identity: Identity, value: FetchedValue) {
        self.entries.insert(identity, value);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
