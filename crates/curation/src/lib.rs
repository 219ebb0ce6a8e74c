//! Curation client: dataset/label/image navigation, the views derived from
//! it, and the inspection overlay used to flag records and fonts.

pub mod image_grid;
pub mod label_list;
pub mod loading;
pub mod log;
pub mod overlay;
pub mod session;
pub mod state;

pub use image_grid::{ImageGridView, RecordBinding, Tile, TileContent};
pub use label_list::{LabelEntry, LabelListView};
pub use loading::{LoadingGuard, LoadingIndicator};
pub use log::{LogEntry, LogLevel, SessionLog};
pub use overlay::{clamp_position, InspectionOverlay, Mutation, OverlayAction, Point, Size, Toggle, CANCEL_KEY};
pub use session::{CurationSession, Outcome, OverlayView, SessionConfig};
pub use state::DatasetState;
