//! Archiver engine: page boundary, capture loop and freeze pipeline.
mod controller;
mod fetch;
mod freeze;
mod locate;
mod page;
mod save;
mod scroll;
mod settings;
mod stability;
mod types;

pub use controller::{ControllerHandle, RunController};
pub use fetch::{FetchSettings, MediaFetcher, MediaPayload, ReqwestFetcher};
pub use freeze::{prepare_for_save, PrepareOptions, PREPARE_CONCURRENCY, SETTLE_DELAY};
pub use locate::{census, locate, locate_videos, VideoCard};
pub use page::{MutationEvent, Page, ScriptedPage, ScrollMetrics, VideoSwap};
pub use save::{
    archive_filename, ensure_output_dir, save_archive, AtomicFileWriter, PageSerializer,
    SaveError, SnapshotCapture, PREPARE_FAILSAFE,
};
pub use scroll::{
    ScrollPolicy, StepDecision, GIVE_UP_AFTER, NUDGE_PX, SCROLL_STEP_FRACTION, STUCK_AFTER,
};
pub use settings::{ArchiverSettings, DefaultSettings, SettingsStore};
pub use stability::{StabilityGate, WATCHED_ATTRIBUTES};
pub use types::{EngineError, FailureKind, FetchError, Notice, PrepareStats};
