//! Available-fields catalog
//!
//! The catalog enumerates which customer and metric attributes a rule condition
//! may reference. It is reference data supplied by the server; conditions are
//! validated against it at write time and checked again during evaluation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Field type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Boolean,
    Date,
    /// JSON-valued column; dotted paths below it are allowed
    Json,
}

/// Catalog entry for a single field path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Human readable label shown in the rule form
    pub label: String,

    /// Field type
    #[serde(rename = "type")]
    pub field_type: FieldType,
}

impl FieldDescriptor {
    pub fn new(label: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            label: label.into(),
            field_type,
        }
    }
}

/// `{ [fieldPath]: { label, type } }`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldCatalog {
    fields: BTreeMap<String, FieldDescriptor>,
}

impl FieldCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field
    pub fn with_field(
        mut self,
        path: impl Into<String>,
        label: impl Into<String>,
        field_type: FieldType,
    ) -> Self {
        self.insert(path, FieldDescriptor::new(label, field_type));
        self
    }

    /// Insert or replace a field
    pub fn insert(&mut self, path: impl Into<String>, descriptor: FieldDescriptor) {
        self.fields.insert(path.into(), descriptor);
    }

    /// Get a field by exact path
    pub fn get(&self, path: &str) -> Option<&FieldDescriptor> {
        self.fields.get(path)
    }

    /// Whether a condition may reference `path`.
    ///
    /// Exact catalog entries are allowed, as is any dotted path whose prefix
    /// names a `json` field (`campaign_stats.lastSentDate`).
    pub fn allows(&self, path: &str) -> bool {
        let path = path.trim();
        if path.is_empty() {
            return false;
        }
        if self.fields.contains_key(path) {
            return true;
        }

        let mut end = path.len();
        while let Some(pos) = path[..end].rfind('.') {
            let prefix = &path[..pos];
            if let Some(descriptor) = self.fields.get(prefix) {
                return descriptor.field_type == FieldType::Json;
            }
            end = pos;
        }
        false
    }

    /// Resolve the declared type of `path`, if the catalog knows it
    pub fn field_type(&self, path: &str) -> Option<FieldType> {
        self.fields.get(path.trim()).map(|d| d.field_type)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate over catalog entries in path order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldDescriptor)> {
        self.fields.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> FieldCatalog {
        FieldCatalog::new()
            .with_field("nps_score", "NPS Score", FieldType::Number)
            .with_field("name", "Customer Name", FieldType::String)
            .with_field("campaign_stats", "Campaign Stats", FieldType::Json)
    }

    #[test]
    fn test_allows_exact_path() {
        let catalog = catalog();
        assert!(catalog.allows("nps_score"));
        assert!(catalog.allows(" name "));
        assert!(!catalog.allows("nps"));
        assert!(!catalog.allows(""));
    }

    #[test]
    fn test_allows_nested_json_path() {
        let catalog = catalog();
        assert!(catalog.allows("campaign_stats.lastSentDate"));
        assert!(catalog.allows("campaign_stats.totals.opened"));
        assert!(!catalog.allows("name.first"));
        assert!(!catalog.allows("unknown.field"));
    }

    #[test]
    fn test_serde_shape() {
        let json = serde_json::to_value(catalog()).unwrap();
        assert_eq!(
            json["nps_score"],
            serde_json::json!({ "label": "NPS Score", "type": "number" })
        );

        let parsed: FieldCatalog = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.len(), 3);
        assert_eq!(parsed.field_type("campaign_stats"), Some(FieldType::Json));
    }
}
