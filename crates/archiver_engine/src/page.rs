use std::sync::Mutex;

use archiver_core::{preferred_video_source, ScrollStyleSnapshot};
use tokio::sync::mpsc;
use url::Url;

use crate::locate;

/// Current geometry of the scrolling container.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollMetrics {
    pub position: f64,
    pub viewport: f64,
    pub extent: f64,
}

impl ScrollMetrics {
    pub fn at_bottom(&self) -> bool {
        self.position + self.viewport >= self.extent - 1.0
    }
}

/// One observed DOM change. Attribute mutations carry the mutated attribute
/// name and the detail key of the nearest gallery anchor; subtree churn
/// carries neither.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationEvent {
    pub target_key: Option<String>,
    pub attribute: Option<String>,
}

/// A video swap applied during the freeze step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoSwap {
    pub detail_key: String,
    pub data_url: String,
    pub poster_data_url: Option<String>,
}

/// The live-document collaborator. The engine only ever talks to the page
/// through this seam, so tests and the headless harness substitute a
/// synthetic document for a real browser bridge.
pub trait Page: Send + Sync {
    /// Serialization of the current document.
    fn html(&self) -> String;
    fn base_url(&self) -> Url;

    fn scroll_metrics(&self) -> ScrollMetrics;
    fn scroll_by(&self, delta: f64);
    fn scroll_to_top(&self);

    fn read_root_styles(&self) -> ScrollStyleSnapshot;
    /// Override root styles so programmatic scrolling works.
    fn apply_scroll_styles(&self);
    fn restore_root_styles(&self, snapshot: &ScrollStyleSnapshot);

    /// New receiver for this page's mutation stream.
    fn subscribe_mutations(&self) -> mpsc::UnboundedReceiver<MutationEvent>;

    /// Replace a live video's source with an embedded payload (freeze step).
    fn swap_video_source(&self, detail_key: &str, data_url: &str, poster_data_url: Option<&str>);
    /// Drop staged capture artifacts after a non-freeze stop.
    fn discard_staging(&self);
}

const SCROLL_OVERRIDE_STYLE: &str = "height: auto; overflow-y: auto";

/// In-memory page backed by an HTML string, with a scripted scroll model and
/// mutation feed. Serves both the test suite and the headless harness.
pub struct ScriptedPage {
    inner: Mutex<Inner>,
    base: Url,
}

struct Inner {
    html: String,
    /// Document as it was before the first freeze swap; restored when
    /// staging is discarded.
    staged_from: Option<String>,
    position: f64,
    viewport: f64,
    extent: f64,
    root_style: String,
    body_style: String,
    subscribers: Vec<mpsc::UnboundedSender<MutationEvent>>,
    swaps: Vec<VideoSwap>,
    staging_discarded: bool,
}

impl ScriptedPage {
    pub fn new(html: impl Into<String>, base: Url) -> Self {
        Self {
            inner: Mutex::new(Inner {
                html: html.into(),
                staged_from: None,
                position: 0.0,
                viewport: 900.0,
                extent: 900.0,
                root_style: String::new(),
                body_style: String::new(),
                subscribers: Vec::new(),
                swaps: Vec::new(),
                staging_discarded: false,
            }),
            base,
        }
    }

    pub fn with_extent(self, viewport: f64, extent: f64) -> Self {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.viewport = viewport;
            inner.extent = extent;
        }
        self
    }

    /// Replace the document and notify observers of subtree churn.
    pub fn replace_html(&self, html: impl Into<String>) {
        let mut inner = self.inner.lock().unwrap();
        inner.html = html.into();
        inner.staged_from = None;
        Self::broadcast(
            &mut inner,
            MutationEvent {
                target_key: None,
                attribute: None,
            },
        );
    }

    /// Report an attribute mutation on the element under `detail_key`.
    pub fn emit_attribute_mutation(&self, detail_key: &str, attribute: &str) {
        let mut inner = self.inner.lock().unwrap();
        Self::broadcast(
            &mut inner,
            MutationEvent {
                target_key: Some(detail_key.to_string()),
                attribute: Some(attribute.to_string()),
            },
        );
    }

    /// Grow the scrollable extent, as lazy loading does.
    pub fn extend_to(&self, extent: f64) {
        self.inner.lock().unwrap().extent = extent;
    }

    pub fn scroll_position(&self) -> f64 {
        self.inner.lock().unwrap().position
    }

    pub fn root_style(&self) -> String {
        self.inner.lock().unwrap().root_style.clone()
    }

    pub fn swaps(&self) -> Vec<VideoSwap> {
        self.inner.lock().unwrap().swaps.clone()
    }

    pub fn staging_discarded(&self) -> bool {
        self.inner.lock().unwrap().staging_discarded
    }

    fn broadcast(inner: &mut Inner, event: MutationEvent) {
        inner.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

impl Page for ScriptedPage {
    fn html(&self) -> String {
        self.inner.lock().unwrap().html.clone()
    }

    fn base_url(&self) -> Url {
        self.base.clone()
    }

    fn scroll_metrics(&self) -> ScrollMetrics {
        let inner = self.inner.lock().unwrap();
        ScrollMetrics {
            position: inner.position,
            viewport: inner.viewport,
            extent: inner.extent,
        }
    }

    fn scroll_by(&self, delta: f64) {
        let mut inner = self.inner.lock().unwrap();
        let max = (inner.extent - inner.viewport).max(0.0);
        inner.position = (inner.position + delta).clamp(0.0, max);
    }

    fn scroll_to_top(&self) {
        self.inner.lock().unwrap().position = 0.0;
    }

    fn read_root_styles(&self) -> ScrollStyleSnapshot {
        let inner = self.inner.lock().unwrap();
        ScrollStyleSnapshot {
            root_style: inner.root_style.clone(),
            body_style: inner.body_style.clone(),
        }
    }

    fn apply_scroll_styles(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.root_style = SCROLL_OVERRIDE_STYLE.to_string();
        inner.body_style = SCROLL_OVERRIDE_STYLE.to_string();
    }

    fn restore_root_styles(&self, snapshot: &ScrollStyleSnapshot) {
        let mut inner = self.inner.lock().unwrap();
        inner.root_style = snapshot.root_style.clone();
        inner.body_style = snapshot.body_style.clone();
    }

    fn subscribe_mutations(&self) -> mpsc::UnboundedReceiver<MutationEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner.lock().unwrap().subscribers.push(tx);
        rx
    }

    fn swap_video_source(&self, detail_key: &str, data_url: &str, poster_data_url: Option<&str>) {
        let mut inner = self.inner.lock().unwrap();

        // Rewrite the stored document so a later serialization carries the
        // embedded payload, the way a live DOM swap would.
        let cards = locate::locate_videos(&inner.html, &self.base);
        let index = cards.iter().position(|card| match &card.detail_key {
            Some(key) => key == detail_key,
            None => {
                preferred_video_source(&card.sources, card.current_src.as_deref()).as_deref()
                    == Some(detail_key)
            }
        });
        if let Some(index) = index {
            if inner.staged_from.is_none() {
                inner.staged_from = Some(inner.html.clone());
            }
            if let Some(rewritten) =
                replace_nth_video(&inner.html, index, data_url, poster_data_url)
            {
                inner.html = rewritten;
            }
        }

        inner.swaps.push(VideoSwap {
            detail_key: detail_key.to_string(),
            data_url: data_url.to_string(),
            poster_data_url: poster_data_url.map(ToOwned::to_owned),
        });
    }

    fn discard_staging(&self) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(pristine) = inner.staged_from.take() {
            inner.html = pristine;
        }
        inner.swaps.clear();
        inner.staging_discarded = true;
    }
}

/// Replaces the `index`-th `<video>` element with a frozen one pointing at
/// the embedded payload. Returns `None` when the document holds fewer videos.
fn replace_nth_video(
    html: &str,
    index: usize,
    data_url: &str,
    poster_data_url: Option<&str>,
) -> Option<String> {
    let lower = html.to_ascii_lowercase();
    let mut from = 0;
    let mut start = 0;
    for _ in 0..=index {
        let at = lower[from..].find("<video")?;
        start = from + at;
        from = start + "<video".len();
    }
    let open_end = start + lower[start..].find('>')? + 1;
    let end = match lower[start..].find("</video>") {
        Some(at) => start + at + "</video>".len(),
        None => open_end,
    };

    let poster = poster_data_url
        .map(|p| format!(" poster=\"{p}\""))
        .unwrap_or_default();
    let mut out = String::with_capacity(html.len() + data_url.len());
    out.push_str(&html[..start]);
    out.push_str(&format!("<video src=\"{data_url}\"{poster}></video>"));
    out.push_str(&html[end..]);
    Some(out)
}
