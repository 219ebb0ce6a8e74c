use std::collections::HashMap;
use std::sync::Arc;

use dataset_api::{ApiError, DatasetInfo, DatasetMetadata, DecodedImage, ImageData, LabelRecordSet, Result};

/// Issued when a metadata fetch starts; the response is only applied if the
/// ticket is still current when it arrives.
#[derive(Clone, Debug)]
pub struct DatasetTicket {
    pub name: String,
    epoch: u64,
    seq: u64,
}

#[derive(Clone, Debug)]
pub struct LabelTicket {
    pub dataset: String,
    pub label: String,
    dataset_epoch: u64,
    label_epoch: u64,
}

/// Everything fetched for one label selection.
#[derive(Debug)]
pub struct LabelPayload {
    pub records: LabelRecordSet,
    pub images: Vec<ImageData>,
    pub decoded: Vec<DecodedImage>,
}

/// The single owner of the curation state. Views read from it, nothing
/// else writes to it.
///
/// Every transition is split into `begin_*`, which hands out a ticket, and
/// `commit_*`, which applies a response only if its ticket still matches the
/// current selection. Responses of superseded selections are dropped.
#[derive(Debug, Default)]
pub struct DatasetState {
    selected: Option<String>,
    active_dataset: Option<DatasetInfo>,
    active_label: Option<LabelRecordSet>,
    active_images: Vec<ImageData>,
    decoded: HashMap<String, Arc<DecodedImage>>,

    dataset_epoch: u64,
    label_epoch: u64,
    // metadata responses: last issued / last applied
    issued_seq: u64,
    applied_seq: u64,
}

impl DatasetState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_select_dataset(&mut self, name: &str) -> DatasetTicket {
        self.dataset_epoch += 1;
        self.invalidate_label();
        self.selected = Some(name.to_string());
        self.next_dataset_ticket(name.to_string())
    }

    /// Re-fetch the selected dataset's metadata without touching the label.
    pub fn begin_refresh(&mut self) -> Result<DatasetTicket> {
        let name = self
            .selected
            .clone()
            .ok_or(ApiError::Precondition("no dataset selected"))?;
        Ok(self.next_dataset_ticket(name))
    }

    fn next_dataset_ticket(&mut self, name: String) -> DatasetTicket {
        self.issued_seq += 1;
        DatasetTicket { name, epoch: self.dataset_epoch, seq: self.issued_seq }
    }

    /// Returns false when the response is stale and was dropped.
    pub fn commit_dataset(&mut self, ticket: &DatasetTicket, info: DatasetInfo) -> bool {
        if ticket.epoch != self.dataset_epoch || ticket.seq <= self.applied_seq {
            return false;
        }
        if info.name != ticket.name {
            return false;
        }

        let switching = self.active_name() != Some(ticket.name.as_str());
        if switching {
            // labels in flight were issued for the previous dataset
            self.invalidate_label();
        }
        self.applied_seq = ticket.seq;
        self.active_dataset = Some(info);
        true
    }

    /// A failed dataset selection falls back to whatever is still active.
    pub fn abandon_dataset(&mut self, ticket: &DatasetTicket) {
        if ticket.epoch == self.dataset_epoch {
            self.selected = self.active_dataset.as_ref().map(|d| d.name.clone());
        }
    }

    pub fn begin_select_label(&mut self, label: &str) -> Result<LabelTicket> {
        let info = self
            .active_dataset
            .as_ref()
            .ok_or(ApiError::Precondition("no active dataset"))?;
        if self.selected.as_deref() != Some(info.name.as_str()) {
            return Err(ApiError::Precondition("dataset is still loading"));
        }
        if !info.metadata.has_label(label) {
            return Err(ApiError::Precondition("label is not part of the active dataset"));
        }

        let dataset = info.name.clone();
        self.label_epoch += 1;
        Ok(LabelTicket {
            dataset,
            label: label.to_string(),
            dataset_epoch: self.dataset_epoch,
            label_epoch: self.label_epoch,
        })
    }

    pub fn is_current(&self, ticket: &LabelTicket) -> bool {
        ticket.dataset_epoch == self.dataset_epoch
            && ticket.label_epoch == self.label_epoch
            && self.active_name() == Some(ticket.dataset.as_str())
    }

    /// Returns false when the response is stale and was dropped.
    pub fn commit_label(&mut self, ticket: &LabelTicket, payload: LabelPayload) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        let records = payload.records;
        if records.dataset != ticket.dataset || records.label != ticket.label {
            return false;
        }

        self.active_label = Some(records);
        self.active_images = payload.images;
        self.decoded = payload
            .decoded
            .into_iter()
            .map(|img| (img.hash.clone(), Arc::new(img)))
            .collect();
        true
    }

    fn invalidate_label(&mut self) {
        self.label_epoch += 1;
        self.active_label = None;
        self.active_images.clear();
        self.decoded.clear();
    }

    pub fn selected_name(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn active_name(&self) -> Option<&str> {
        self.active_dataset.as_ref().map(|d| d.name.as_str())
    }

    pub fn active_dataset(&self) -> Option<&DatasetInfo> {
        self.active_dataset.as_ref()
    }

    pub fn metadata(&self) -> Option<&DatasetMetadata> {
        self.active_dataset.as_ref().map(|d| &d.metadata)
    }

    pub fn active_label(&self) -> Option<&LabelRecordSet> {
        self.active_label.as_ref()
    }

    pub fn active_images(&self) -> &[ImageData] {
        &self.active_images
    }

    pub fn decoded(&self) -> &HashMap<String, Arc<DecodedImage>> {
        &self.decoded
    }

    /// An active label always belongs to the active dataset.
    pub fn is_consistent(&self) -> bool {
        match (&self.active_label, &self.active_dataset) {
            (None, _) => true,
            (Some(l), Some(d)) => l.dataset == d.name && d.metadata.has_label(&l.label),
            (Some(_), None) => false,
        }
    }
}
