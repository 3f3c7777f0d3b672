use url::Url;

/// Inline `data:` payloads smaller than this are blur placeholders, not content.
pub const PLACEHOLDER_MIN_BYTES: usize = 1024;

/// A committed source must resolve at least this fraction of the rendered width.
pub const QUALITY_WIDTH_FRACTION: f64 = 0.8;

/// One srcset entry chosen as the best available source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SrcsetChoice {
    pub url: String,
    /// Intrinsic width in pixels, known only for `w` descriptors.
    pub width: Option<u32>,
}

/// Picks the highest-resolution entry of a srcset attribute value.
///
/// Descriptors (`100w`, `2x`) are compared by their numeric value; entries
/// without a descriptor weigh zero. Returns `None` for an empty srcset so the
/// caller can fall back to the currently resolved src.
pub fn pick_best_from_srcset(srcset: &str, base: &Url) -> Option<SrcsetChoice> {
    let mut best: Option<(u32, SrcsetChoice)> = None;
    for token in srcset.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        let mut parts = token.split_whitespace();
        let raw_url = parts.next()?;
        let descriptor = parts.next();
        let (weight, width) = match descriptor {
            Some(d) => match parse_descriptor(d) {
                Some((value, is_width)) => (value, is_width.then_some(value)),
                None => (0, None),
            },
            None => (0, None),
        };
        let Some(abs) = absolutize(raw_url, base) else {
            continue;
        };
        let choice = SrcsetChoice { url: abs, width };
        match &best {
            Some((best_weight, _)) if *best_weight >= weight => {}
            _ => best = Some((weight, choice)),
        }
    }
    best.map(|(_, choice)| choice)
}

fn parse_descriptor(descriptor: &str) -> Option<(u32, bool)> {
    let is_width = descriptor.ends_with('w');
    if !is_width && !descriptor.ends_with('x') {
        return None;
    }
    let digits = &descriptor[..descriptor.len() - 1];
    digits.parse::<u32>().ok().map(|value| (value, is_width))
}

/// One `<source>` entry under a `<video>` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoSource {
    pub url: String,
    pub mime: Option<String>,
}

/// Chooses a video source by container preference: webm before mp4, by MIME
/// type first and file extension second, falling back to the currently
/// playing source.
pub fn preferred_video_source(sources: &[VideoSource], current: Option<&str>) -> Option<String> {
    let by_mime = |wanted: &str| {
        sources
            .iter()
            .find(|s| s.mime.as_deref().is_some_and(|m| m.eq_ignore_ascii_case(wanted)))
            .map(|s| s.url.clone())
    };
    let by_ext = |ext: &str| {
        sources
            .iter()
            .find(|s| has_extension(&s.url, ext))
            .map(|s| s.url.clone())
    };
    by_mime("video/webm")
        .or_else(|| by_ext("webm"))
        .or_else(|| by_mime("video/mp4"))
        .or_else(|| by_ext("mp4"))
        .or_else(|| current.map(ToOwned::to_owned))
}

fn has_extension(raw: &str, ext: &str) -> bool {
    let path = raw.split(['?', '#']).next().unwrap_or(raw);
    path.rsplit('.')
        .next()
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
        && path.contains('.')
}

/// Whether a resolved source is an inline placeholder rather than final
/// content: a `data:` URL whose decoded payload is under
/// [`PLACEHOLDER_MIN_BYTES`].
pub fn is_placeholder(url: &str) -> bool {
    let Some(rest) = url.strip_prefix("data:") else {
        return false;
    };
    let Some((meta, payload)) = rest.split_once(',') else {
        return true;
    };
    let decoded_len = if meta.ends_with(";base64") {
        // 4 base64 chars encode 3 bytes; padding only shrinks the estimate.
        let padding = payload.bytes().rev().take_while(|b| *b == b'=').count();
        (payload.len() / 4 * 3).saturating_sub(padding.min(2))
    } else {
        payload.len()
    };
    decoded_len < PLACEHOLDER_MIN_BYTES
}

/// Resolves an href against the document base, rejecting empty, fragment-only
/// and scripting links.
pub fn absolutize(href: &str, base: &Url) -> Option<String> {
    let trimmed = href.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lower = trimmed.to_ascii_lowercase();
    if lower.starts_with('#') || lower.starts_with('?') || lower.starts_with("javascript:") {
        return None;
    }
    if let Ok(url) = Url::parse(trimmed) {
        return Some(url.into());
    }
    base.join(trimmed).ok().map(Into::into)
}
