use std::time::Duration;

use archiver_engine::{FailureKind, FetchSettings, MediaFetcher, ReqwestFetcher};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn fetcher_returns_media_bytes_and_mime() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/clip.webm"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"webm-bytes".to_vec(), "video/webm"))
        .mount(&server)
        .await;

    let fetcher = ReqwestFetcher::new(FetchSettings::default());
    let url = format!("{}/clip.webm", server.uri());

    let payload = fetcher.fetch_media(&url).await.expect("fetch ok");
    assert_eq!(payload.bytes, b"webm-bytes");
    assert_eq!(payload.mime.as_deref(), Some("video/webm"));
}

#[tokio::test]
async fn fetcher_fails_on_http_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing.mp4"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let fetcher = ReqwestFetcher::new(FetchSettings::default());
    let url = format!("{}/missing.mp4", server.uri());

    let err = fetcher.fetch_media(&url).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(404));
}

#[tokio::test]
async fn fetcher_times_out_on_slow_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow.mp4"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(250))
                .set_body_raw(b"mp4".to_vec(), "video/mp4"),
        )
        .mount(&server)
        .await;

    let settings = FetchSettings {
        request_timeout: Duration::from_millis(50),
        ..FetchSettings::default()
    };
    let fetcher = ReqwestFetcher::new(settings);
    let url = format!("{}/slow.mp4", server.uri());

    let err = fetcher.fetch_media(&url).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::Timeout);
}

#[tokio::test]
async fn fetcher_rejects_too_large_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/large.mp4"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "video/mp4")
                .insert_header("Content-Length", "11")
                .set_body_string("01234567890"),
        )
        .mount(&server)
        .await;

    let settings = FetchSettings {
        max_bytes: 10,
        ..FetchSettings::default()
    };
    let fetcher = ReqwestFetcher::new(settings);
    let url = format!("{}/large.mp4", server.uri());

    let err = fetcher.fetch_media(&url).await.unwrap_err();
    assert_eq!(
        err.kind,
        FailureKind::TooLarge {
            max_bytes: 10,
            actual: Some(11)
        }
    );
}

#[tokio::test]
async fn fetcher_stops_redirect_loops_and_reports_the_count() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/loop.mp4"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/loop.mp4"))
        .mount(&server)
        .await;

    let settings = FetchSettings {
        redirect_limit: 3,
        ..FetchSettings::default()
    };
    let fetcher = ReqwestFetcher::new(settings);
    let url = format!("{}/loop.mp4", server.uri());

    let err = fetcher.fetch_media(&url).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::RedirectLimitExceeded);
    assert_eq!(err.message, "stopped after 3 redirects");
}

#[tokio::test]
async fn fetcher_rejects_non_media_content_type() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw("<html>not media</html>", "text/html"),
        )
        .mount(&server)
        .await;

    let fetcher = ReqwestFetcher::new(FetchSettings::default());
    let url = format!("{}/page", server.uri());

    let err = fetcher.fetch_media(&url).await.unwrap_err();
    assert_eq!(
        err.kind,
        FailureKind::UnsupportedContentType {
            content_type: "text/html".to_string()
        }
    );
}

#[tokio::test]
async fn fetcher_rejects_invalid_url() {
    let fetcher = ReqwestFetcher::new(FetchSettings::default());
    let err = fetcher.fetch_media("not a url").await.unwrap_err();
    assert_eq!(err.kind, FailureKind::InvalidUrl);
}
