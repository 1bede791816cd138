//! Search entry structure, tantivy schema and document conversion

use crate::models::ExtensionSnapshot;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tantivy::schema::{Schema, Value, FAST, INDEXED, STORED, STRING, TEXT};
use tantivy::TantivyDocument;

/// Searchable projection of an active extension.
///
/// One entry exists per active extension at any indexed point in time; the
/// `relevance` field is computed, never authoritative, and is refreshed on
/// every index write (engine backend) or every query (fallback backend).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchEntry {
    /// Stable extension id
    pub id: i64,

    /// Fully qualified identifier, `namespace.name`
    pub extension_id: String,

    /// Publishing namespace
    pub namespace: String,

    /// Extension name
    pub name: String,

    /// Display name
    pub display_name: Option<String>,

    /// Short description
    pub description: Option<String>,

    /// Free-form tags
    pub tags: Vec<String>,

    /// Marketplace categories
    pub categories: Vec<String>,

    /// Average review rating, absent when unreviewed
    pub average_rating: Option<f64>,

    /// Total download count
    pub download_count: i64,

    /// Latest version publishing timestamp
    pub timestamp: DateTime<Utc>,

    /// Composite relevance score (computed)
    pub relevance: f64,
}

impl SearchEntry {
    /// Build an entry from a registry snapshot and a computed relevance
    pub fn from_snapshot(ext: &ExtensionSnapshot, relevance: f64) -> Self {
        Self {
            id: ext.id,
            extension_id: ext.extension_id(),
            namespace: ext.namespace.clone(),
            name: ext.name.clone(),
            display_name: ext.display_name.clone(),
            description: ext.description.clone(),
            tags: ext.tags.clone(),
            categories: ext.categories.clone(),
            average_rating: ext.average_rating,
            download_count: ext.download_count,
            timestamp: ext.timestamp,
            relevance,
        }
    }

    /// An entry with nothing but an id, used as the decoding base
    pub fn empty(id: i64) -> Self {
        Self {
            id,
            extension_id: String::new(),
            namespace: String::new(),
            name: String::new(),
            display_name: None,
            description: None,
            tags: Vec::new(),
            categories: Vec::new(),
            average_rating: None,
            download_count: 0,
            timestamp: DateTime::<Utc>::UNIX_EPOCH,
            relevance: 0.0,
        }
    }

    /// Convert to a tantivy document
    pub fn to_tantivy_doc(&self, schema: &Schema) -> TantivyDocument {
        let mut doc = TantivyDocument::new();

        if let Ok(field) = schema.get_field("id") {
            doc.add_i64(field, self.id);
        }
        if let Ok(field) = schema.get_field("extension_id") {
            doc.add_text(field, &self.extension_id);
        }
        if let Ok(field) = schema.get_field("namespace") {
            doc.add_text(field, &self.namespace);
        }
        if let Ok(field) = schema.get_field("name") {
            doc.add_text(field, &self.name);
        }
        if let Some(ref display_name) = self.display_name {
            if let Ok(field) = schema.get_field("display_name") {
                doc.add_text(field, display_name);
            }
        }
        if let Some(ref description) = self.description {
            if let Ok(field) = schema.get_field("description") {
                doc.add_text(field, description);
            }
        }
        if let Ok(field) = schema.get_field("tags") {
            for tag in &self.tags {
                doc.add_text(field, tag);
            }
        }
        if let Ok(field) = schema.get_field("categories") {
            for category in &self.categories {
                doc.add_text(field, category);
            }
        }
        if let Some(average_rating) = self.average_rating {
            if let Ok(field) = schema.get_field("average_rating") {
                doc.add_f64(field, average_rating);
            }
        }
        if let Ok(field) = schema.get_field("download_count") {
            doc.add_i64(field, self.download_count);
        }
        if let Ok(field) = schema.get_field("timestamp") {
            doc.add_date(
                field,
                tantivy::DateTime::from_timestamp_secs(self.timestamp.timestamp()),
            );
        }
        if let Ok(field) = schema.get_field("relevance") {
            doc.add_f64(field, self.relevance);
        }

        doc
    }

    /// Rebuild an entry from a stored tantivy document.
    ///
    /// Fields absent from the document decode to their neutral value (zero,
    /// `None`, empty), matching the sort semantics for missing values.
    pub fn from_tantivy_doc(doc: &TantivyDocument, schema: &Schema) -> Self {
        let id = get_i64(doc, schema, "id").unwrap_or(0);
        let mut entry = Self::empty(id);

        if let Some(extension_id) = get_text(doc, schema, "extension_id") {
            entry.extension_id = extension_id;
        }
        if let Some(namespace) = get_text(doc, schema, "namespace") {
            entry.namespace = namespace;
        }
        if let Some(name) = get_text(doc, schema, "name") {
            entry.name = name;
        }
        entry.display_name = get_text(doc, schema, "display_name");
        entry.description = get_text(doc, schema, "description");
        entry.tags = get_text_values(doc, schema, "tags");
        entry.categories = get_text_values(doc, schema, "categories");
        entry.average_rating = get_f64(doc, schema, "average_rating");
        entry.download_count = get_i64(doc, schema, "download_count").unwrap_or(0);
        entry.relevance = get_f64(doc, schema, "relevance").unwrap_or(0.0);
        if let Some(timestamp) = get_date(doc, schema, "timestamp") {
            entry.timestamp = timestamp;
        }

        entry
    }
}

fn get_text(doc: &TantivyDocument, schema: &Schema, field_name: &str) -> Option<String> {
    schema.get_field(field_name).ok().and_then(|field| {
        doc.get_first(field)
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
    })
}

fn get_text_values(doc: &TantivyDocument, schema: &Schema, field_name: &str) -> Vec<String> {
    schema
        .get_field(field_name)
        .ok()
        .map(|field| {
            doc.get_all(field)
                .filter_map(|v| v.as_str())
                .map(|s| s.to_string())
                .collect()
        })
        .unwrap_or_default()
}

fn get_i64(doc: &TantivyDocument, schema: &Schema, field_name: &str) -> Option<i64> {
    schema
        .get_field(field_name)
        .ok()
        .and_then(|field| doc.get_first(field).and_then(|v| v.as_i64()))
}

fn get_f64(doc: &TantivyDocument, schema: &Schema, field_name: &str) -> Option<f64> {
    schema
        .get_field(field_name)
        .ok()
        .and_then(|field| doc.get_first(field).and_then(|v| v.as_f64()))
}

fn get_date(doc: &TantivyDocument, schema: &Schema, field_name: &str) -> Option<DateTime<Utc>> {
    schema.get_field(field_name).ok().and_then(|field| {
        doc.get_first(field)
            .and_then(|v| v.as_datetime())
            .and_then(|dt| DateTime::from_timestamp(dt.into_timestamp_secs(), 0))
    })
}

/// Build the tantivy schema for extension entries
pub fn build_extension_schema() -> Schema {
    let mut schema_builder = Schema::builder();

    // Stable id - used as the delete term for upserts
    schema_builder.add_i64_field("id", INDEXED | STORED | FAST);

    // Fully qualified id - raw token for exact keyword matching
    schema_builder.add_text_field("extension_id", STRING | STORED);

    // Full-text fields
    schema_builder.add_text_field("namespace", TEXT | STORED);
    schema_builder.add_text_field("name", TEXT | STORED);
    schema_builder.add_text_field("display_name", TEXT | STORED);
    schema_builder.add_text_field("description", TEXT | STORED);

    // Multi-valued text fields
    schema_builder.add_text_field("tags", TEXT | STORED);
    schema_builder.add_text_field("categories", TEXT | STORED);

    // Sortable numeric fields
    schema_builder.add_f64_field("average_rating", STORED | FAST);
    schema_builder.add_i64_field("download_count", STORED | FAST);
    schema_builder.add_f64_field("relevance", STORED | FAST);
    schema_builder.add_date_field("timestamp", INDEXED | STORED | FAST);

    schema_builder.build()
}
