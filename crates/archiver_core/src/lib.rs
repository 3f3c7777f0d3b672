//! Archiver core: pure capture state machine and media-selection helpers.
mod effect;
mod ledger;
mod media;
mod msg;
mod state;
mod update;

pub use effect::Effect;
pub use ledger::{Candidate, CaptureItem, CaptureLedger, CommitOutcome, MediaKind};
pub use media::{
    absolutize, is_placeholder, pick_best_from_srcset, preferred_video_source, SrcsetChoice,
    VideoSource, PLACEHOLDER_MIN_BYTES, QUALITY_WIDTH_FRACTION,
};
pub use msg::{Msg, ScrollEndReason};
pub use state::{Phase, RunConfig, RunState, ScrollStyleSnapshot, StateNotice, StatsNotice};
pub use update::update;
