use archiver_core::{
    absolutize, is_placeholder, pick_best_from_srcset, preferred_video_source, Candidate,
    MediaKind, VideoSource,
};
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Site-structural pattern: the anchor linking to an item's detail page.
const DETAIL_ANCHOR: &str = r#"a[href*="/images/"]"#;
const NEARBY_ANCHOR_DEPTH: usize = 6;

/// A `<video>` gallery card as the freeze step needs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoCard {
    /// Detail key of the nearest gallery anchor; falls back to the source URL.
    pub detail_key: Option<String>,
    pub sources: Vec<VideoSource>,
    pub poster: Option<String>,
    pub current_src: Option<String>,
}

/// Stateless query over the current document: every qualifying media element,
/// with its best resolved source. Placeholder sources are withheld so a later
/// scan re-discovers the element once its final asset is in place.
pub fn locate(html: &str, base: &Url) -> Vec<Candidate> {
    let doc = Html::parse_document(html);
    let (Some(anchor_sel), Some(img_sel), Some(video_sel)) = (
        sel(DETAIL_ANCHOR),
        sel("img"),
        sel("video"),
    ) else {
        return Vec::new();
    };

    let mut out = Vec::new();
    for anchor in doc.select(&anchor_sel) {
        let Some(detail_key) = anchor.value().attr("href").and_then(|h| absolutize(h, base))
        else {
            continue;
        };

        let mut found_media = false;
        for img in anchor.select(&img_sel) {
            found_media = true;
            if let Some(candidate) = image_candidate(&detail_key, img, base) {
                out.push(candidate);
            }
        }
        for video in anchor.select(&video_sel) {
            found_media = true;
            if let Some(candidate) = video_candidate(&detail_key, video, base) {
                out.push(candidate);
            }
        }

        // Anchors that carry the artwork as a CSS background have no media
        // children of their own.
        if !found_media {
            if let Some(url) = anchor
                .value()
                .attr("style")
                .and_then(parse_background_url)
                .and_then(|raw| absolutize(&raw, base))
            {
                out.push(Candidate {
                    detail_key: detail_key.clone(),
                    kind: MediaKind::BackgroundImage,
                    url,
                    intrinsic_width: None,
                    display_width: None,
                });
            }
        }
    }

    out.retain(|c| !is_placeholder(&c.url));
    out
}

/// Every media URL currently known on the page, for the run's `total` census.
pub fn census(html: &str, base: &Url) -> Vec<String> {
    let doc = Html::parse_document(html);
    let Some(img_sel) = sel("img") else {
        return Vec::new();
    };
    doc.select(&img_sel)
        .filter_map(|img| best_image_source(img, base).map(|(url, _)| url))
        .collect()
}

/// Every `<video>` gallery card, for the freeze step.
pub fn locate_videos(html: &str, base: &Url) -> Vec<VideoCard> {
    let doc = Html::parse_document(html);
    let (Some(video_sel), Some(source_sel), Some(anchor_sel)) =
        (sel("video"), sel("source"), sel(DETAIL_ANCHOR))
    else {
        return Vec::new();
    };

    doc.select(&video_sel)
        .map(|video| {
            let sources = video
                .select(&source_sel)
                .filter_map(|source| {
                    let url = source.value().attr("src").and_then(|s| absolutize(s, base))?;
                    Some(VideoSource {
                        url,
                        mime: source.value().attr("type").map(str::to_lowercase),
                    })
                })
                .collect();
            VideoCard {
                detail_key: nearby_detail_anchor(video, &anchor_sel, base),
                sources,
                poster: video.value().attr("poster").and_then(|p| absolutize(p, base)),
                current_src: video.value().attr("src").and_then(|s| absolutize(s, base)),
            }
        })
        .collect()
}

fn image_candidate(detail_key: &str, img: ElementRef<'_>, base: &Url) -> Option<Candidate> {
    let (url, intrinsic_width) = best_image_source(img, base)?;
    Some(Candidate {
        detail_key: detail_key.to_string(),
        kind: MediaKind::Image,
        url,
        intrinsic_width,
        display_width: display_width(img),
    })
}

fn video_candidate(detail_key: &str, video: ElementRef<'_>, base: &Url) -> Option<Candidate> {
    let source_sel = sel("source")?;
    let sources: Vec<VideoSource> = video
        .select(&source_sel)
        .filter_map(|source| {
            let url = source.value().attr("src").and_then(|s| absolutize(s, base))?;
            Some(VideoSource {
                url,
                mime: source.value().attr("type").map(str::to_lowercase),
            })
        })
        .collect();
    let current = video.value().attr("src").and_then(|s| absolutize(s, base));
    let url = preferred_video_source(&sources, current.as_deref())?;
    Some(Candidate {
        detail_key: detail_key.to_string(),
        kind: MediaKind::Video,
        url,
        intrinsic_width: None,
        display_width: display_width(video),
    })
}

/// Best source for an `<img>`: highest-resolution srcset entry, else src.
fn best_image_source(img: ElementRef<'_>, base: &Url) -> Option<(String, Option<u32>)> {
    if let Some(choice) = img
        .value()
        .attr("srcset")
        .and_then(|ss| pick_best_from_srcset(ss, base))
    {
        return Some((choice.url, choice.width));
    }
    img.value()
        .attr("src")
        .and_then(|src| absolutize(src, base))
        .map(|url| (url, None))
}

fn display_width(el: ElementRef<'_>) -> Option<u32> {
    if let Some(width) = el.value().attr("width").and_then(|w| w.parse().ok()) {
        return Some(width);
    }
    el.value().attr("style").and_then(parse_style_width)
}

fn parse_style_width(style: &str) -> Option<u32> {
    style.split(';').find_map(|decl| {
        let (name, value) = decl.split_once(':')?;
        if name.trim() != "width" {
            return None;
        }
        value.trim().strip_suffix("px")?.trim().parse().ok()
    })
}

fn parse_background_url(style: &str) -> Option<String> {
    let idx = style.find("background-image")?;
    let rest = &style[idx..];
    let start = rest.find("url(")? + 4;
    let end = rest[start..].find(')')? + start;
    let raw = rest[start..end].trim().trim_matches(['"', '\''].as_ref());
    if raw.is_empty() {
        None
    } else {
        Some(raw.to_string())
    }
}

/// Walks up from a standalone element looking for the gallery anchor that
/// owns its card, mirroring how the cards nest detail links beside media.
fn nearby_detail_anchor(
    el: ElementRef<'_>,
    anchor_sel: &Selector,
    base: &Url,
) -> Option<String> {
    let mut node = Some(el);
    for _ in 0..NEARBY_ANCHOR_DEPTH {
        let current = node?;
        if anchor_sel.matches(&current) {
            return current.value().attr("href").and_then(|h| absolutize(h, base));
        }
        if let Some(anchor) = current.select(anchor_sel).next() {
            return anchor.value().attr("href").and_then(|h| absolutize(h, base));
        }
        node = current.parent().and_then(ElementRef::wrap);
    }
    None
}

fn sel(selector: &str) -> Option<Selector> {
    Selector::parse(selector).ok()
}
