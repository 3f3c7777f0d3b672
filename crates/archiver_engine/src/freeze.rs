use std::sync::Arc;
use std::time::Duration;

use archiver_core::preferred_video_source;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use futures_util::{stream, StreamExt};
use log::{debug, info, warn};

use crate::fetch::{MediaFetcher, MediaPayload};
use crate::locate::{self, VideoCard};
use crate::page::Page;
use crate::types::{EngineError, PrepareStats};

/// Simultaneous inlining fetches; bounds network pressure without
/// serializing the whole pass.
pub const PREPARE_CONCURRENCY: usize = 3;
/// Paint settle before the external capture primitive reads the page.
pub const SETTLE_DELAY: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy)]
pub struct PrepareOptions {
    pub concurrency: usize,
    pub settle_delay: Duration,
}

impl Default for PrepareOptions {
    fn default() -> Self {
        Self {
            concurrency: PREPARE_CONCURRENCY,
            settle_delay: SETTLE_DELAY,
        }
    }
}

/// Transforms the live page into a snapshot-ready state: every gallery video
/// gets its byte stream fetched and re-attached as an embedded payload, since
/// the capture primitive only embeds resources that are already local.
///
/// Individual fetch failures are counted and skipped; one broken video never
/// aborts the rest of the pass.
pub async fn prepare_for_save(
    page: Arc<dyn Page>,
    fetcher: Arc<dyn MediaFetcher>,
    opts: PrepareOptions,
) -> PrepareStats {
    let cards = locate::locate_videos(&page.html(), &page.base_url());
    let total = cards.len();
    debug!("prepare: {total} video cards to inline");

    let results: Vec<Result<(), EngineError>> = stream::iter(cards)
        .map(|card| {
            let page = page.clone();
            let fetcher = fetcher.clone();
            async move { inline_one(page.as_ref(), fetcher.as_ref(), card).await }
        })
        .buffer_unordered(opts.concurrency.max(1))
        .collect()
        .await;

    let inlined = results.iter().filter(|r| r.is_ok()).count();
    let failed = total - inlined;
    for err in results.iter().filter_map(|r| r.as_ref().err()) {
        warn!("prepare: video inline skipped: {err}");
    }

    // The capture primitive serializes rendered state, so give the swapped
    // elements one paint before reporting done.
    tokio::time::sleep(opts.settle_delay).await;
    info!("prepare: inlined {inlined}/{total} videos ({failed} failed)");

    PrepareStats {
        total,
        inlined,
        failed,
    }
}

async fn inline_one(
    page: &dyn Page,
    fetcher: &dyn MediaFetcher,
    card: VideoCard,
) -> Result<(), EngineError> {
    let source = preferred_video_source(&card.sources, card.current_src.as_deref())
        .ok_or_else(|| EngineError::MissingSource(describe(&card)))?;
    let payload = fetcher.fetch_media(&source).await?;
    let data_url = to_data_url(&payload, "video/mp4");

    // Poster inlining is best-effort; a missing poster does not fail the card.
    let poster_data_url = match &card.poster {
        Some(poster) => fetcher
            .fetch_media(poster)
            .await
            .ok()
            .map(|p| to_data_url(&p, "image/jpeg")),
        None => None,
    };

    let key = card.detail_key.as_deref().unwrap_or(&source);
    page.swap_video_source(key, &data_url, poster_data_url.as_deref());
    Ok(())
}

fn to_data_url(payload: &MediaPayload, fallback_mime: &str) -> String {
    let mime = payload.mime.as_deref().unwrap_or(fallback_mime);
    format!("data:{mime};base64,{}", STANDARD.encode(&payload.bytes))
}

fn describe(card: &VideoCard) -> String {
    card.detail_key
        .clone()
        .or_else(|| card.poster.clone())
        .unwrap_or_else(|| "<anonymous video>".to_string())
}
