use crate::types::{MaskedField, RayleighError, RayleighResult};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Labeled collection of 2D fields produced by a sensor reader
pub trait Dataset {
    /// Sensor identifier, e.g. "viirs"
    fn source_name(&self) -> &str;

    /// Platform identifier, e.g. "goes-16"
    fn platform_name(&self) -> &str;

    fn start_datetime(&self) -> DateTime<Utc>;

    /// Named field, or `None` when the dataset does not carry it
    fn field(&self, name: &str) -> Option<&MaskedField>;

    fn contains(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    fn field_names(&self) -> Vec<String>;
}

/// In-memory dataset
#[derive(Debug, Clone)]
pub struct LabeledDataset {
    source_name: String,
    platform_name: String,
    start_datetime: DateTime<Utc>,
    fields: HashMap<String, MaskedField>,
}

impl LabeledDataset {
    pub fn new(
        source_name: impl Into<String>,
        platform_name: impl Into<String>,
        start_datetime: DateTime<Utc>,
    ) -> Self {
        Self {
            source_name: source_name.into(),
            platform_name: platform_name.into(),
            start_datetime,
            fields: HashMap::new(),
        }
    }

    /// Builder-style field insertion
    pub fn with_field(mut self, name: impl Into<String>, field: MaskedField) -> Self {
        self.insert(name, field);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, field: MaskedField) -> Option<MaskedField> {
        self.fields.insert(name.into(), field)
    }

    pub fn remove(&mut self, name: &str) -> Option<MaskedField> {
        self.fields.remove(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Dataset for LabeledDataset {
    fn source_name(&self) -> &str {
        &self.source_name
    }

    fn platform_name(&self) -> &str {
        &self.platform_name
    }

    fn start_datetime(&self) -> DateTime<Utc> {
        self.start_datetime
    }

    fn field(&self, name: &str) -> Option<&MaskedField> {
        self.fields.get(name)
    }

    fn field_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.fields.keys().cloned().collect();
        names.sort();
        names
    }
}

/// Parse a `start_datetime` attribute. Accepts RFC 3339 and the naive
/// `YYYY-MM-DD HH:MM:SS` / `YYYY-MM-DDTHH:MM:SS` forms, the latter taken as UTC.
pub fn parse_start_datetime(value: &str) -> RayleighResult<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(value, format) {
            return Ok(naive.and_utc());
        }
    }

    Err(RayleighError::Metadata(format!(
        "Invalid start_datetime: {}",
        value
    )))
}
