use std::fs;
use std::future::Future;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};
use log::{info, warn};
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::page::Page;
use crate::types::{EngineError, PrepareStats};

/// If the prepare handshake never answers, capture the page as-is rather
/// than hang the save forever.
pub const PREPARE_FAILSAFE: Duration = Duration::from_millis(4500);
/// Small settle so the frozen DOM is the one captured.
const CAPTURE_SETTLE: Duration = Duration::from_millis(150);

const FALLBACK_TITLE: &str = "gallery-archive";

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("output directory missing or not writable: {0}")]
    OutputDir(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("snapshot capture failed: {0}")]
    Capture(String),
}

/// The host's opaque page-serialization primitive. Its only obligation is to
/// return the rendered document as one self-contained artifact; the save path
/// never retries it.
pub trait SnapshotCapture: Send + Sync {
    fn capture(&self) -> Result<Vec<u8>, EngineError>;
}

/// Capture impl for headless use: serializes the page boundary's current HTML.
pub struct PageSerializer {
    page: Arc<dyn Page>,
}

impl PageSerializer {
    pub fn new(page: Arc<dyn Page>) -> Self {
        Self { page }
    }
}

impl SnapshotCapture for PageSerializer {
    fn capture(&self) -> Result<Vec<u8>, EngineError> {
        Ok(self.page.html().into_bytes())
    }
}

/// Full save flow: bounded prepare handshake, settle, capture, atomic write.
/// A failed or timed-out prepare degrades to capturing the page as-is.
pub async fn save_archive<F>(
    prepare: F,
    capture: &dyn SnapshotCapture,
    writer: &AtomicFileWriter,
    title: Option<&str>,
) -> Result<PathBuf, SaveError>
where
    F: Future<Output = Result<PrepareStats, EngineError>>,
{
    match tokio::time::timeout(PREPARE_FAILSAFE, prepare).await {
        Ok(Ok(stats)) => info!(
            "save: prepare done ({} of {} inlined, {} failed)",
            stats.inlined, stats.total, stats.failed
        ),
        Ok(Err(err)) => warn!("save: prepare failed, capturing as-is: {err}"),
        Err(_) => warn!("save: prepare timed out, capturing as-is"),
    }
    tokio::time::sleep(CAPTURE_SETTLE).await;

    let artifact = capture
        .capture()
        .map_err(|err| SaveError::Capture(err.to_string()))?;
    let filename = archive_filename(title, Local::now());
    writer.write(&filename, &artifact)
}

/// Windows-safe timestamped filename: `{sanitized_title}-{stamp}.html`.
pub fn archive_filename(title: Option<&str>, when: DateTime<Local>) -> String {
    let sanitized = sanitize_title(title.unwrap_or(FALLBACK_TITLE));
    let stamp = when.format("%Y-%m-%d_%H%M%S");
    format!("{sanitized}-{stamp}.html")
}

fn sanitize_title(input: &str) -> String {
    let cleaned: String = input
        .chars()
        .map(|c| if is_forbidden(c) { ' ' } else { c })
        .collect();
    let mut compacted = String::with_capacity(cleaned.len());
    let mut prev_space = true;
    for c in cleaned.chars() {
        if c.is_whitespace() {
            if !prev_space {
                compacted.push(' ');
            }
            prev_space = true;
        } else {
            compacted.push(c);
            prev_space = false;
        }
    }
    let mut final_name = compacted.trim().to_string();
    if final_name.len() > 80 {
        final_name.truncate(80);
        final_name = final_name.trim_end().to_string();
    }
    if final_name.is_empty() {
        final_name = FALLBACK_TITLE.to_string();
    }
    if is_reserved_windows_name(&final_name) {
        final_name.push('_');
    }
    final_name
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}'
    )
}

fn is_reserved_windows_name(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
        "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(name))
}

/// Ensure output directory exists; create if missing.
pub fn ensure_output_dir(dir: &Path) -> Result<(), SaveError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| SaveError::OutputDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(SaveError::OutputDir("path is not a directory".into()));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| SaveError::OutputDir(e.to_string()))?;
    }
    // Basic writability probe: try creating a temp file.
    NamedTempFile::new_in(dir).map_err(|e| SaveError::OutputDir(e.to_string()))?;
    Ok(())
}

/// Atomically write content to `{dir}/{filename}` by writing a temp file then renaming.
pub struct AtomicFileWriter {
    dir: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn write(&self, filename: &str, content: &[u8]) -> Result<PathBuf, SaveError> {
        ensure_output_dir(&self.dir)?;

        let target = self.dir.join(filename);
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(content)?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;

        // Replace existing file if present to keep determinism.
        if target.exists() {
            fs::remove_file(&target)?;
        }
        tmp.persist(&target).map_err(|e| SaveError::Io(e.error))?;
        Ok(target)
    }
}
