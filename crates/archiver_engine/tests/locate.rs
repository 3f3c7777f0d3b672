use archiver_core::MediaKind;
use archiver_engine::{census, locate, locate_videos};
use pretty_assertions::assert_eq;
use url::Url;

const GALLERY: &str = r#"
<html><body>
  <div class="gallery">
    <a href="/images/1">
      <img src="/thumb1.jpg" srcset="/small1.jpg 100w, /big1.jpg 1000w" width="400">
    </a>
    <a href="/images/2" style="width: 300px; background-image: url('/bg2.jpg')"></a>
    <a href="/images/3">
      <video poster="/poster3.jpg" src="/fallback3.mp4">
        <source src="/clip3.mp4" type="video/mp4">
        <source src="/clip3.webm" type="video/webm">
      </video>
    </a>
    <a href="/images/4"><img src="data:image/png;base64,AAAA"></a>
    <img src="/unlinked.jpg">
  </div>
</body></html>
"#;

fn base() -> Url {
    Url::parse("http://host/gallery").unwrap()
}

#[test]
fn finds_anchor_images_with_best_srcset_entry() {
    let candidates = locate(GALLERY, &base());
    let img = candidates
        .iter()
        .find(|c| c.detail_key == "http://host/images/1")
        .expect("image candidate");

    assert_eq!(img.kind, MediaKind::Image);
    assert_eq!(img.url, "http://host/big1.jpg");
    assert_eq!(img.intrinsic_width, Some(1000));
    assert_eq!(img.display_width, Some(400));
}

#[test]
fn finds_background_image_anchors() {
    let candidates = locate(GALLERY, &base());
    let bg = candidates
        .iter()
        .find(|c| c.detail_key == "http://host/images/2")
        .expect("background candidate");

    assert_eq!(bg.kind, MediaKind::BackgroundImage);
    assert_eq!(bg.url, "http://host/bg2.jpg");
}

#[test]
fn prefers_webm_video_source() {
    let candidates = locate(GALLERY, &base());
    let video = candidates
        .iter()
        .find(|c| c.detail_key == "http://host/images/3")
        .expect("video candidate");

    assert_eq!(video.kind, MediaKind::Video);
    assert_eq!(video.url, "http://host/clip3.webm");
}

#[test]
fn withholds_placeholder_sources() {
    let candidates = locate(GALLERY, &base());
    assert!(candidates
        .iter()
        .all(|c| c.detail_key != "http://host/images/4"));
}

#[test]
fn census_counts_every_image_on_the_page() {
    let urls = census(GALLERY, &base());
    assert_eq!(urls.len(), 3);
    assert!(urls.contains(&"http://host/big1.jpg".to_string()));
    assert!(urls.contains(&"http://host/unlinked.jpg".to_string()));
}

#[test]
fn video_cards_resolve_their_detail_anchor_and_poster() {
    let cards = locate_videos(GALLERY, &base());
    assert_eq!(cards.len(), 1);

    let card = &cards[0];
    assert_eq!(card.detail_key.as_deref(), Some("http://host/images/3"));
    assert_eq!(card.poster.as_deref(), Some("http://host/poster3.jpg"));
    assert_eq!(card.current_src.as_deref(), Some("http://host/fallback3.mp4"));
    assert_eq!(card.sources.len(), 2);
}

#[test]
fn standalone_video_finds_a_nearby_anchor() {
    let html = r#"
      <div class="card">
        <div><video src="/solo.webm"></video></div>
        <a href="/images/9">view</a>
      </div>
    "#;
    let cards = locate_videos(html, &base());
    assert_eq!(cards.len(), 1);
    assert_eq!(cards[0].detail_key.as_deref(), Some("http://host/images/9"));
}

#[test]
fn deeply_nested_video_walks_up_to_its_anchor() {
    let html = r#"
      <div class="grid">
        <div class="card">
          <div class="media"><div class="frame"><video src="/deep.webm"></video></div></div>
          <a href="/images/12">view</a>
        </div>
      </div>
    "#;
    let cards = locate_videos(html, &base());
    assert_eq!(cards.len(), 1);
    assert_eq!(cards[0].detail_key.as_deref(), Some("http://host/images/12"));
}

#[test]
fn anchor_beyond_the_walk_depth_is_not_claimed() {
    let html = r#"
      <div><div><div><div><div><div><div>
        <video src="/far.webm"></video>
      </div></div></div></div></div></div></div>
      <a href="/images/13">view</a>
    "#;
    let cards = locate_videos(html, &base());
    assert_eq!(cards.len(), 1);
    assert_eq!(cards[0].detail_key, None);
}

#[test]
fn empty_page_yields_nothing() {
    assert!(locate("<html><body></body></html>", &base()).is_empty());
    assert!(locate_videos("<html><body></body></html>", &base()).is_empty());
}
