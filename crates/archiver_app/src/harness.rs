use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use archiver_engine::{
    ensure_output_dir, save_archive, AtomicFileWriter, FetchSettings, Notice, PageSerializer,
    ReqwestFetcher, RunController, ScriptedPage,
};
use archiver_logging::archiver_info;
use url::Url;

use crate::settings_file::FileSettings;

/// The scripted page models a fixed document, so give the scroll driver a few
/// screens of travel: the stability window has to elapse before the driver
/// reaches the bottom and ends the run.
const VIEWPORT: f64 = 900.0;
const SCREENS: f64 = 4.0;

/// Runs one full archive pass over a saved gallery document: scroll, collect,
/// freeze, save. Returns the path of the written archive.
pub async fn run(input: &Path, output_dir: &Path, base_url: Option<&str>) -> Result<()> {
    ensure_output_dir(output_dir).context("output directory")?;

    let html = std::fs::read_to_string(input)
        .with_context(|| format!("reading gallery document {input:?}"))?;
    let base = match base_url {
        Some(raw) => Url::parse(raw).context("base url")?,
        None => Url::from_file_path(
            input
                .canonicalize()
                .with_context(|| format!("resolving {input:?}"))?,
        )
        .map_err(|_| anyhow::anyhow!("input path is not an absolute file path"))?,
    };

    let page = Arc::new(ScriptedPage::new(html, base).with_extent(VIEWPORT, VIEWPORT * SCREENS));
    let mut handle = RunController::spawn(
        page.clone(),
        Arc::new(FileSettings::new(output_dir)),
        Arc::new(ReqwestFetcher::new(FetchSettings::default())),
    );

    handle.start();
    while let Some(notice) = handle.next_notice().await {
        match notice {
            Notice::Stats(stats) => archiver_info!(
                "progress: {} captured, {} seen, {} of {} known",
                stats.captured,
                stats.seen,
                stats.deduped,
                stats.total
            ),
            Notice::State(state) if !state.running => {
                archiver_info!(
                    "run finished: {} of at most {} items",
                    state.captured,
                    state.max_items
                );
                break;
            }
            Notice::State(_) => {}
        }
    }

    // Freeze-stop: restore the page styles but keep staged capture artifacts
    // for the save.
    handle.stop(true);

    let writer = AtomicFileWriter::new(output_dir.to_path_buf());
    let capture = PageSerializer::new(page);
    let title = input.file_stem().and_then(|s| s.to_str());
    let path = save_archive(handle.prepare_for_save(), &capture, &writer, title)
        .await
        .context("saving archive")?;
    archiver_info!("archive written to {:?}", path);
    Ok(())
}
