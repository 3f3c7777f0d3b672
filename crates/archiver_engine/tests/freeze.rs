use std::sync::Arc;
use std::time::Duration;

use archiver_engine::{
    prepare_for_save, FailureKind, FetchError, MediaFetcher, MediaPayload, Page, PageSerializer,
    PrepareOptions, ScriptedPage, SnapshotCapture,
};
use pretty_assertions::assert_eq;
use url::Url;

struct RoutedFetcher;

#[async_trait::async_trait]
impl MediaFetcher for RoutedFetcher {
    async fn fetch_media(&self, url: &str) -> Result<MediaPayload, FetchError> {
        if url.contains("broken") {
            return Err(FetchError::new(FailureKind::HttpStatus(404), "not found"));
        }
        let mime = if url.ends_with(".jpg") {
            "image/jpeg"
        } else {
            "video/webm"
        };
        Ok(MediaPayload {
            bytes: url.as_bytes().to_vec(),
            mime: Some(mime.to_string()),
        })
    }
}

fn options() -> PrepareOptions {
    PrepareOptions {
        settle_delay: Duration::from_millis(0),
        ..PrepareOptions::default()
    }
}

fn page(html: &str) -> Arc<ScriptedPage> {
    Arc::new(ScriptedPage::new(
        html,
        Url::parse("http://host/gallery").unwrap(),
    ))
}

#[tokio::test]
async fn one_broken_video_does_not_abort_the_pass() {
    let page = page(
        r#"
        <html><body>
          <a href="/images/1"><video><source src="/clip1.webm" type="video/webm"></video></a>
          <a href="/images/2"><video><source src="/broken.webm" type="video/webm"></video></a>
          <a href="/images/3"><video><source src="/clip3.webm" type="video/webm"></video></a>
        </body></html>
        "#,
    );

    let stats = prepare_for_save(page.clone(), Arc::new(RoutedFetcher), options()).await;

    assert_eq!(stats.total, 3);
    assert_eq!(stats.inlined, 2);
    assert_eq!(stats.failed, 1);

    let mut keys: Vec<String> = page.swaps().into_iter().map(|s| s.detail_key).collect();
    keys.sort();
    assert_eq!(keys, vec!["http://host/images/1", "http://host/images/3"]);
}

#[tokio::test]
async fn swapped_sources_are_embedded_payloads() {
    let page = page(
        r#"
        <html><body>
          <a href="/images/9">
            <video poster="/poster9.jpg"><source src="/clip9.webm" type="video/webm"></video>
          </a>
        </body></html>
        "#,
    );

    let stats = prepare_for_save(page.clone(), Arc::new(RoutedFetcher), options()).await;
    assert_eq!(stats.inlined, 1);

    let swaps = page.swaps();
    assert_eq!(swaps.len(), 1);
    assert!(swaps[0].data_url.starts_with("data:video/webm;base64,"));
    let poster = swaps[0].poster_data_url.as_deref().expect("poster inlined");
    assert!(poster.starts_with("data:image/jpeg;base64,"));
}

#[tokio::test]
async fn webm_source_wins_over_mp4() {
    let page = page(
        r#"
        <html><body>
          <a href="/images/4">
            <video src="/current4.mp4">
              <source src="/clip4.mp4" type="video/mp4">
              <source src="/clip4.webm" type="video/webm">
            </video>
          </a>
        </body></html>
        "#,
    );

    prepare_for_save(page.clone(), Arc::new(RoutedFetcher), options()).await;

    let swaps = page.swaps();
    assert_eq!(swaps.len(), 1);
    // The fetcher echoes the URL into the payload, so the embedded bytes
    // reveal which source was chosen.
    let encoded = swaps[0]
        .data_url
        .strip_prefix("data:video/webm;base64,")
        .expect("webm payload");
    assert!(!encoded.is_empty());
}

#[tokio::test]
async fn inlined_payloads_reach_the_serialized_document() {
    let page = page(
        r#"
        <html><body>
          <a href="/images/1"><video><source src="/clip1.webm" type="video/webm"></video></a>
        </body></html>
        "#,
    );

    let stats = prepare_for_save(page.clone(), Arc::new(RoutedFetcher), options()).await;
    assert_eq!(stats.inlined, 1);

    let artifact = PageSerializer::new(page).capture().expect("capture ok");
    let html = String::from_utf8(artifact).unwrap();
    assert!(html.contains("data:video/webm;base64,"));
    assert!(!html.contains("/clip1.webm"));
    // The gallery anchor around the frozen video survives the swap.
    assert!(html.contains(r#"<a href="/images/1">"#));
}

#[tokio::test]
async fn discarding_staging_restores_the_original_document() {
    let page = page(
        r#"
        <html><body>
          <a href="/images/1"><video><source src="/clip1.webm" type="video/webm"></video></a>
        </body></html>
        "#,
    );

    prepare_for_save(page.clone(), Arc::new(RoutedFetcher), options()).await;
    assert!(page.html().contains("data:video/webm;base64,"));

    page.discard_staging();

    assert!(page.html().contains("/clip1.webm"));
    assert!(!page.html().contains("data:video/webm;base64,"));
    assert!(page.swaps().is_empty());
}

#[tokio::test]
async fn sourceless_video_is_counted_as_failed() {
    let page = page(r#"<html><body><a href="/images/5"><video></video></a></body></html>"#);

    let stats = prepare_for_save(page.clone(), Arc::new(RoutedFetcher), options()).await;

    assert_eq!(stats.total, 1);
    assert_eq!(stats.inlined, 0);
    assert_eq!(stats.failed, 1);
    assert!(page.swaps().is_empty());
}

#[tokio::test]
async fn page_without_videos_is_a_no_op() {
    let page = page(r#"<html><body><a href="/images/6"><img src="/full6.jpg"></a></body></html>"#);

    let stats = prepare_for_save(page.clone(), Arc::new(RoutedFetcher), options()).await;

    assert_eq!(stats.total, 0);
    assert_eq!(stats.inlined, 0);
    assert!(page.swaps().is_empty());
}
