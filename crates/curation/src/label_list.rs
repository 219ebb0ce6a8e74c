use dataset_api::DatasetMetadata;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LabelEntry {
    pub label: String,
    pub active: bool,
    pub completed: bool,
}

/// Label buttons of the active dataset.
///
/// The view only remembers which label is active; labels and completion
/// flags are read from the metadata on every render.
#[derive(Debug, Default)]
pub struct LabelListView {
    active: Option<String>,
}

impl LabelListView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `label` the only active entry. Returns the previously active one.
    pub fn activate(&mut self, label: &str) -> Option<String> {
        self.active.replace(label.to_string())
    }

    pub fn set_active(&mut self, label: Option<&str>) {
        self.active = label.map(str::to_string);
    }

    pub fn clear(&mut self) {
        self.active = None;
    }

    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn render(&self, metadata: Option<&DatasetMetadata>) -> Vec<LabelEntry> {
        let Some(meta) = metadata else {
            return vec![];
        };
        meta.labels
            .iter()
            .map(|label| LabelEntry {
                label: label.clone(),
                active: self.active.as_deref() == Some(label.as_str()),
                completed: meta.is_completed(label),
            })
            .collect()
    }
}
