use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub name: String,
}

/// Curation metadata of one dataset. Always replaced wholesale by a fresh
/// fetch, never patched locally.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetMetadata {
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub content: String,
    pub labels: Vec<String>,
    #[serde(default)]
    pub invalid_records: BTreeSet<String>,
    #[serde(default)]
    pub invalid_fonts: BTreeSet<String>,
    #[serde(default)]
    pub completed_labels: BTreeSet<String>,
}

impl DatasetMetadata {
    pub fn is_record_invalid(&self, hash: &str) -> bool {
        self.invalid_records.contains(hash)
    }

    pub fn is_font_invalid(&self, font: &str) -> bool {
        self.invalid_fonts.contains(font)
    }

    /// Either flag alone is enough.
    pub fn is_invalid(&self, record: &Record) -> bool {
        self.is_record_invalid(&record.hash) || self.is_font_invalid(&record.font)
    }

    pub fn is_completed(&self, label: &str) -> bool {
        self.completed_labels.contains(label)
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }
}

/// Envelope of `GET /api/datasets/{name}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetInfo {
    pub name: String,
    pub metadata: DatasetMetadata,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Record {
    pub hash: String,
    pub char: String,
    pub font: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelRecordSet {
    pub dataset: String,
    pub label: String,
    pub records: Vec<Record>,
}

impl LabelRecordSet {
    pub fn hashes(&self) -> Vec<String> {
        let mut seen = BTreeSet::new();
        self.records
            .iter()
            .filter(|r| seen.insert(r.hash.as_str()))
            .map(|r| r.hash.clone())
            .collect()
    }
}

/// Base64 image payload keyed by record hash.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageData {
    pub hash: String,
    pub data: String,
}

/// Acknowledgement of a mutation. The server is not consistent about the
/// body shape so everything besides `message` is kept raw.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DatasetList {
    pub datasets: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ImageList {
    pub images: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LegacyImage {
    pub image: String,
}
