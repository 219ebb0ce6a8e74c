use std::sync::{Mutex, MutexGuard, PoisonError};

use dataset_api::{
    decode_all, ApiError, DatasetApi, DatasetMetadata, DatasetSummary, LabelRecordSet, Result,
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::image_grid::{duplicate_hashes, missing_hashes, ImageGridView, RecordBinding, Tile};
use crate::label_list::{LabelEntry, LabelListView};
use crate::loading::LoadingIndicator;
use crate::log::{LogEntry, SessionLog};
use crate::overlay::{InspectionOverlay, Mutation, OpenOverlay, OverlayAction, Point, Size, Toggle};
use crate::state::{DatasetState, DatasetTicket, LabelPayload, LabelTicket};

#[derive(Clone, Debug)]
pub struct SessionConfig {
    pub viewport: Size,
    pub menu: Size,
    pub log_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            viewport: Size::new(1280, 720),
            menu: Size::new(220, 96),
            log_capacity: 500,
        }
    }
}

/// How a navigation ended when it did not fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    /// A newer selection took over; the response was dropped.
    Superseded,
}

/// Snapshot of the open overlay, ready to draw.
#[derive(Clone, Debug)]
pub struct OverlayView {
    pub overlay: OpenOverlay,
    pub actions: [OverlayAction; 2],
}

struct Inner {
    datasets: Vec<DatasetSummary>,
    state: DatasetState,
    labels: LabelListView,
    grid: ImageGridView,
    overlay: InspectionOverlay,
    log: SessionLog,
    dataset_nav: CancellationToken,
    label_nav: CancellationToken,
}

impl Inner {
    /// Cancel the running navigation of a lane and open a fresh one.
    fn restart(token: &mut CancellationToken) -> CancellationToken {
        token.cancel();
        *token = CancellationToken::new();
        token.clone()
    }

    fn report(&mut self, what: &str, e: &ApiError) {
        error!(error = %e, "{what} failed");
        self.log.error(format!("{what} failed: {e}"));
    }
}

/// Drives dataset -> label -> image navigation and curation against a
/// [`DatasetApi`].
///
/// All state lives behind one lock that is never held across an await.
/// Each navigation is a sequential chain tagged with a ticket; a newer
/// selection cancels the older chain and any response that still arrives
/// for it is discarded.
pub struct CurationSession<A: DatasetApi> {
    api: A,
    loading: LoadingIndicator,
    inner: Mutex<Inner>,
}

impl<A: DatasetApi> CurationSession<A> {
    pub fn new(api: A, cfg: SessionConfig) -> Self {
        Self {
            api,
            loading: LoadingIndicator::new(),
            inner: Mutex::new(Inner {
                datasets: vec![],
                state: DatasetState::new(),
                labels: LabelListView::new(),
                grid: ImageGridView::new(),
                overlay: InspectionOverlay::new(cfg.viewport, cfg.menu),
                log: SessionLog::new(cfg.log_capacity),
                dataset_nav: CancellationToken::new(),
                label_nav: CancellationToken::new(),
            }),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn loading(&self) -> &LoadingIndicator {
        &self.loading
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ---- navigation ----

    /// List datasets and, if nothing is selected yet, open the first one.
    pub async fn load_datasets(&self) -> Result<Vec<DatasetSummary>> {
        let res = {
            let _loading = self.loading.begin();
            self.api.list_datasets().await
        };

        let (datasets, first) = {
            let mut inner = self.lock();
            let datasets = match res {
                Ok(d) => d,
                Err(e) => {
                    inner.report("listing datasets", &e);
                    return Err(e);
                }
            };
            info!(count = datasets.len(), "datasets listed");
            inner.log.info(format!("{} dataset(s) available", datasets.len()));
            inner.datasets = datasets.clone();

            let first = match inner.state.selected_name() {
                None => datasets.first().map(|d| d.name.clone()),
                Some(_) => None,
            };
            (datasets, first)
        };

        if let Some(name) = first {
            self.select_dataset(&name).await?;
        }
        Ok(datasets)
    }

    pub async fn select_dataset(&self, name: &str) -> Result<Outcome> {
        let (ticket, cancel) = {
            let mut inner = self.lock();
            let inner = &mut *inner;
            Inner::restart(&mut inner.label_nav);
            let cancel = Inner::restart(&mut inner.dataset_nav);

            let ticket = inner.state.begin_select_dataset(name);
            inner.labels.clear();
            inner.grid.clear();
            inner.overlay.close();
            inner.log.info(format!("Loading dataset {name}"));
            (ticket, cancel)
        };
        info!(dataset = %name, "selecting dataset");

        let res = {
            let _loading = self.loading.begin();
            tokio::select! {
                _ = cancel.cancelled() => None,
                r = self.api.get_dataset_metadata(name) => Some(r),
            }
        };

        let mut inner = self.lock();
        match res {
            None => Ok(Outcome::Superseded),
            Some(Ok(info)) => Ok(Self::apply_metadata(&mut inner, &ticket, info)),
            Some(Err(e)) => {
                inner.state.abandon_dataset(&ticket);
                inner.report(&format!("loading dataset {name}"), &e);
                Err(e)
            }
        }
    }

    /// Re-read the current dataset's metadata, leaving label and images as
    /// they are. Used after every mutation.
    pub async fn refresh_metadata(&self) -> Result<Outcome> {
        let ticket = self.lock().state.begin_refresh()?;

        let res = {
            let _loading = self.loading.begin();
            self.api.get_dataset_metadata(&ticket.name).await
        };

        let mut inner = self.lock();
        match res {
            Ok(info) => Ok(Self::apply_metadata(&mut inner, &ticket, info)),
            Err(e) => {
                inner.report(&format!("refreshing dataset {}", ticket.name), &e);
                Err(e)
            }
        }
    }

    fn apply_metadata(
        inner: &mut Inner,
        ticket: &DatasetTicket,
        info: dataset_api::DatasetInfo,
    ) -> Outcome {
        let labels = info.metadata.labels.len();
        if !inner.state.commit_dataset(ticket, info) {
            info!(dataset = %ticket.name, "dropping stale metadata response");
            return Outcome::Superseded;
        }
        inner.log.info(format!("Dataset {} loaded ({labels} labels)", ticket.name));
        Outcome::Applied
    }

    pub async fn select_label(&self, label: &str) -> Result<Outcome> {
        let (ticket, cancel) = {
            let mut inner = self.lock();
            let inner = &mut *inner;
            let ticket = inner.state.begin_select_label(label)?;
            let cancel = Inner::restart(&mut inner.label_nav);

            inner.labels.activate(label);
            inner.grid.clear();
            inner.overlay.close();
            inner.log.info(format!("Loading label {label}"));
            (ticket, cancel)
        };
        info!(dataset = %ticket.dataset, label = %label, "selecting label");

        let res = {
            let _loading = self.loading.begin();
            tokio::select! {
                _ = cancel.cancelled() => None,
                r = self.fetch_label(&ticket) => Some(r),
            }
        };

        let mut inner = self.lock();
        match res {
            None => Ok(Outcome::Superseded),
            Some(Ok(payload)) => Ok(Self::apply_label(&mut inner, &ticket, payload)),
            Some(Err(e)) => {
                if inner.state.is_current(&ticket) {
                    let committed = inner.state.active_label().map(|l| l.label.clone());
                    inner.labels.set_active(committed.as_deref());
                }
                inner.report(&format!("loading label {label}"), &e);
                Err(e)
            }
        }
    }

    /// records -> images -> decode, each step waiting on the previous one.
    async fn fetch_label(&self, ticket: &LabelTicket) -> Result<LabelPayload> {
        let records: LabelRecordSet = self
            .api
            .get_label_records(&ticket.dataset, &ticket.label)
            .await?;
        if records.label != ticket.label || records.dataset != ticket.dataset {
            return Err(ApiError::Decode(format!(
                "asked for {}/{}, got {}/{}",
                ticket.dataset, ticket.label, records.dataset, records.label
            )));
        }

        let hashes = records.hashes();
        let images = if hashes.is_empty() {
            vec![]
        } else {
            self.api.get_images(&ticket.dataset, &hashes).await?
        };
        let decoded = decode_all(&images)?;

        Ok(LabelPayload { records, images, decoded })
    }

    fn apply_label(inner: &mut Inner, ticket: &LabelTicket, payload: LabelPayload) -> Outcome {
        if !inner.state.commit_label(ticket, payload) {
            info!(label = %ticket.label, "dropping stale label response");
            return Outcome::Superseded;
        }

        let (count, missing, dupes) = match inner.state.active_label() {
            Some(set) => {
                let decoded = inner.state.decoded();
                let missing = missing_hashes(&set.records, decoded);
                let dupes = duplicate_hashes(&set.records, decoded).len();
                (set.records.len(), missing, dupes)
            }
            None => (0, vec![], 0),
        };

        for hash in &missing {
            warn!(label = %ticket.label, hash = %hash, "no image returned, showing placeholder");
            inner.log.warn(format!("No image for {hash}"));
        }
        if dupes > 0 {
            inner.log.warn(format!("{dupes} record(s) share an identical image"));
        }
        inner.log.info(format!("Label {} loaded ({count} records)", ticket.label));
        Outcome::Applied
    }

    // ---- inspection overlay ----

    /// Highlight a tile and open the overlay at the pointer.
    pub fn select_image(&self, hash: &str, pointer: Point) -> Result<OverlayView> {
        let mut inner = self.lock();
        let inner = &mut *inner;

        let binding = inner
            .state
            .active_label()
            .and_then(|set| set.records.iter().find(|r| r.hash == hash))
            .map(RecordBinding::from)
            .ok_or(ApiError::Precondition("image is not part of the active label"))?;
        let metadata = inner
            .state
            .metadata()
            .ok_or(ApiError::Precondition("no active dataset"))?;

        inner.grid.highlight(hash);
        let overlay = inner.overlay.open(binding, pointer).clone();
        let actions = overlay.actions(metadata);
        Ok(OverlayView { overlay, actions })
    }

    /// Returns true when the key closed the overlay.
    pub fn press_key(&self, key: &str) -> bool {
        self.lock().overlay.on_key(key)
    }

    /// Returns true when the click closed the overlay.
    pub fn click(&self, pointer: Point) -> bool {
        self.lock().overlay.on_click(pointer)
    }

    /// Apply one overlay toggle, then pull fresh metadata.
    pub async fn choose(&self, toggle: Toggle) -> Result<Outcome> {
        let (dataset, mutation) = {
            let mut inner = self.lock();
            let inner = &mut *inner;
            let name = inner
                .state
                .active_name()
                .ok_or(ApiError::Precondition("no active dataset"))?
                .to_string();
            let metadata = inner
                .state
                .metadata()
                .ok_or(ApiError::Precondition("no active dataset"))?;
            let mutation = inner
                .overlay
                .choose(toggle, metadata)
                .ok_or(ApiError::Precondition("overlay is not open"))?;
            (name, mutation)
        };

        self.mutate(&dataset, &mutation).await?;
        self.refresh_metadata().await
    }

    async fn mutate(&self, dataset: &str, m: &Mutation) -> Result<()> {
        let state = if m.valid { "valid" } else { "invalid" };
        info!(dataset = %dataset, target = %m.target, toggle = ?m.toggle, valid = m.valid, "marking");

        let res = {
            let _loading = self.loading.begin();
            match m.toggle {
                Toggle::Record => self.api.set_record_validity(dataset, &m.target, m.valid).await,
                Toggle::Font => self.api.set_font_validity(dataset, &m.target, m.valid).await,
            }
        };

        let mut inner = self.lock();
        match res {
            Ok(ack) => {
                let msg = ack
                    .message
                    .unwrap_or_else(|| format!("Marked {} as {state}", m.target));
                inner.log.info(msg);
                Ok(())
            }
            Err(e) => {
                inner.report(&format!("marking {} as {state}", m.target), &e);
                Err(e)
            }
        }
    }

    /// Flip the "completed" flag of the active label.
    pub async fn toggle_label_completed(&self) -> Result<Outcome> {
        let (dataset, label, completed) = {
            let inner = self.lock();
            let set = inner
                .state
                .active_label()
                .ok_or(ApiError::Precondition("no active label"))?;
            let completed = inner
                .state
                .metadata()
                .is_some_and(|m| m.is_completed(&set.label));
            (set.dataset.clone(), set.label.clone(), completed)
        };

        let res = {
            let _loading = self.loading.begin();
            self.api.set_label_completion(&dataset, &label, !completed).await
        };
        match res {
            Ok(_) => {
                let verb = if completed { "incomplete" } else { "complete" };
                self.lock().log.info(format!("Marked label {label} as {verb}"));
            }
            Err(e) => {
                self.lock().report(&format!("updating label {label}"), &e);
                return Err(e);
            }
        }
        self.refresh_metadata().await
    }

    // ---- log panel ----

    pub fn toggle_log(&self) -> bool {
        self.lock().log.toggle()
    }

    pub fn is_log_visible(&self) -> bool {
        self.lock().log.is_visible()
    }

    pub fn log_entries(&self) -> Vec<LogEntry> {
        self.lock().log.entries().cloned().collect()
    }

    // ---- snapshots ----

    pub fn is_loading(&self) -> bool {
        self.loading.is_visible()
    }

    pub fn datasets(&self) -> Vec<DatasetSummary> {
        self.lock().datasets.clone()
    }

    pub fn active_dataset_name(&self) -> Option<String> {
        self.lock().state.active_name().map(str::to_string)
    }

    pub fn metadata(&self) -> Option<DatasetMetadata> {
        self.lock().state.metadata().cloned()
    }

    pub fn active_label(&self) -> Option<LabelRecordSet> {
        self.lock().state.active_label().cloned()
    }

    pub fn label_entries(&self) -> Vec<LabelEntry> {
        let inner = self.lock();
        inner.labels.render(inner.state.metadata())
    }

    pub fn tiles(&self) -> Vec<Tile> {
        let inner = self.lock();
        match (inner.state.active_label(), inner.state.metadata()) {
            (Some(set), Some(meta)) => inner.grid.render(&set.records, inner.state.decoded(), meta),
            _ => vec![],
        }
    }

    pub fn overlay(&self) -> Option<OverlayView> {
        let inner = self.lock();
        let overlay = inner.overlay.current()?.clone();
        let actions = overlay.actions(inner.state.metadata()?);
        Some(OverlayView { overlay, actions })
    }

    /// True when the active label belongs to the active dataset.
    pub fn is_consistent(&self) -> bool {
        self.lock().state.is_consistent()
    }
}
