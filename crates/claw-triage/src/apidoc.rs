//! Documentation references for failing resource fields.

use crate::store::GroupVersion;
use std::collections::HashMap;

/// Field documentation gathered from API schemas.
///
/// Entries are keyed by group/version, kind and dotted field path. The table
/// is optional: without an entry, [`ApiReference::doc_for`] still produces a
/// stable pointer to the field.
#[derive(Debug, Clone, Default)]
pub struct ApiDocs {
    fields: HashMap<String, String>,
}

impl ApiDocs {
    /// Creates an empty documentation table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds documentation for a field.
    #[must_use]
    pub fn with_field_doc(
        mut self,
        api: &GroupVersion,
        kind: &str,
        path: &str,
        description: impl Into<String>,
    ) -> Self {
        self.fields
            .insert(Self::field_key(api, kind, path), description.into());
        self
    }

    /// Looks up documentation for a field.
    #[must_use]
    pub fn lookup(&self, api: &GroupVersion, kind: &str, path: &str) -> Option<&str> {
        self.fields
            .get(&Self::field_key(api, kind, path))
            .map(String::as_str)
    }

    /// Returns the number of documented fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if no fields are documented.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn field_key(api: &GroupVersion, kind: &str, path: &str) -> String {
        format!("{api}/{kind}/{path}")
    }
}

/// Binds a resource kind to its API group for documentation lookups.
#[derive(Debug, Clone, Copy)]
pub struct ApiReference<'a> {
    /// Resource kind.
    pub kind: &'a str,
    /// API group the kind belongs to.
    pub api: &'a GroupVersion,
    /// Documentation table, if any.
    pub docs: &'a ApiDocs,
}

impl ApiReference<'_> {
    /// Returns a non-empty documentation reference for a field path.
    ///
    /// The reference is `"<kind>.<path> (<group/version>)"`, followed by the
    /// schema description when one is known.
    #[must_use]
    pub fn doc_for(&self, path: &str) -> String {
        let pointer = format!("{}.{path} ({})", self.kind, self.api);
        match self.docs.lookup(self.api, self.kind, path) {
            Some(description) if !description.is_empty() => format!("{pointer}: {description}"),
            _ => pointer,
        }
    }
}
