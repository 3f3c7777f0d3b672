use std::collections::HashMap;

use crate::media::{is_placeholder, QUALITY_WIDTH_FRACTION};

/// Structural classification of a discovered media unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
    BackgroundImage,
}

/// A media candidate as reported by the locator: identity, best-known source
/// and the width hints used by the quality gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Canonical absolute URL of the item's detail link; the dedup identity.
    pub detail_key: String,
    pub kind: MediaKind,
    /// Best resolved absolute source URL at discovery time.
    pub url: String,
    /// Intrinsic pixel width of the chosen source, when the srcset names one.
    pub intrinsic_width: Option<u32>,
    /// Rendered display width of the element, when the markup names one.
    pub display_width: Option<u32>,
}

/// One committed media unit. Immutable once accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureItem {
    pub detail_key: String,
    pub media_kind: MediaKind,
    pub source_url: String,
    /// Monotonic run-clock timestamp in milliseconds.
    pub accepted_at: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    Accepted,
    /// The detail key was already committed this run.
    Duplicate,
    /// The run already holds `max_items` accepted items.
    CapReached,
    /// Resolved source is an inline placeholder below the size threshold.
    Placeholder,
    /// Resolved width falls short of the rendered width by more than the
    /// allowed fraction (an upscaled substitute, not the real asset).
    LowQuality,
}

/// Bounded, deduplicated record of all items accepted during one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureLedger {
    items: HashMap<String, CaptureItem>,
    max_items: usize,
}

impl CaptureLedger {
    pub fn new(max_items: usize) -> Self {
        Self {
            items: HashMap::new(),
            max_items,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn at_cap(&self) -> bool {
        self.items.len() >= self.max_items
    }

    pub fn contains(&self, detail_key: &str) -> bool {
        self.items.contains_key(detail_key)
    }

    pub fn items(&self) -> impl Iterator<Item = &CaptureItem> {
        self.items.values()
    }

    /// Attempts to commit a settled candidate. Re-discovery of a committed
    /// key is a no-op; the cap, placeholder and quality gates all reject
    /// without mutating the ledger.
    pub fn try_commit(&mut self, candidate: &Candidate, accepted_at: u64) -> CommitOutcome {
        if self.items.contains_key(&candidate.detail_key) {
            return CommitOutcome::Duplicate;
        }
        if self.at_cap() {
            return CommitOutcome::CapReached;
        }
        if is_placeholder(&candidate.url) {
            return CommitOutcome::Placeholder;
        }
        if let (Some(intrinsic), Some(display)) =
            (candidate.intrinsic_width, candidate.display_width)
        {
            if (intrinsic as f64) < QUALITY_WIDTH_FRACTION * display as f64 {
                return CommitOutcome::LowQuality;
            }
        }
        self.items.insert(
            candidate.detail_key.clone(),
            CaptureItem {
                detail_key: candidate.detail_key.clone(),
                media_kind: candidate.kind,
                source_url: candidate.url.clone(),
                accepted_at,
            },
        );
        CommitOutcome::Accepted
    }
}
