//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and drive the real
//! reqwest client and HTML parser through complete crawl runs.

use chrono::{DateTime, TimeZone, Utc};
use std::sync::Arc;
use tallr::config::{Config, CrawlerConfig, HttpConfig};
use tallr::crawler::{crawl, run_crawl, Coordinator, HtmlPageParser, ReqwestClient};
use tallr::{CrawlError, FetchError};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Publish times used by the fixtures, newest first
const NEWEST: i64 = 1_714_600_000_000;
const MIDDLE: i64 = 1_714_500_000_000;
const OLDER: i64 = 1_714_400_000_000;
const OLDEST: i64 = 1_714_300_000_000;

fn at(millis: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(millis).unwrap()
}

fn listing_page(entries: &[(&str, i64)], next: Option<&str>) -> String {
    let mut html = String::from("<html><body><section>");
    for (href, millis) in entries {
        html.push_str(&format!(
            r#"<div class="fc-item"><a data-link-name="article" href="{}">Episode</a><time data-timestamp="{}"></time></div>"#,
            href, millis
        ));
    }
    html.push_str("</section>");
    if let Some(next) = next {
        html.push_str(&format!(
            r#"<div class="pagination"><a rel="next" href="{}">Older</a></div>"#,
            next
        ));
    }
    html.push_str("</body></html>");
    html
}

fn detail_page(title: &str, millis: i64, media_url: &str) -> String {
    format!(
        r#"<html><head>
<meta property="article:tag" content="Politics,  Podcasts ">
</head><body><div id="article">
<meta itemprop="description" content=" {title} in depth ">
<h1 itemprop="headline">{title} – podcast</h1>
<time itemprop="datePublished" data-timestamp="{millis}"></time>
<figure id="audio-component-container" data-media-id="gu-audio-{millis}" data-duration="1825" data-download-url="{media_url}"></figure>
</div></body></html>"#
    )
}

async fn mount_get(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

async fn mount_media(server: &MockServer, route: &str) {
    Mock::given(method("HEAD"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).insert_header("content-type", "audio/mpeg"))
        .mount(server)
        .await;
}

/// Mounts a two-page series: three episodes on page 1, one older on page 2
async fn mount_series(server: &MockServer) {
    let base = server.uri();

    mount_get(
        server,
        "/series/daily",
        listing_page(
            &[("/ep/newest", NEWEST), ("/ep/middle", MIDDLE), ("/ep/older", OLDER)],
            Some("/series/daily/page/2"),
        ),
    )
    .await;
    mount_get(
        server,
        "/series/daily/page/2",
        listing_page(&[("/ep/oldest", OLDEST)], None),
    )
    .await;

    for (slug, millis) in [("newest", NEWEST), ("middle", MIDDLE), ("older", OLDER), ("oldest", OLDEST)] {
        mount_get(
            server,
            &format!("/ep/{}", slug),
            detail_page(slug, millis, &format!("{}/media/{}.mp3", base, slug)),
        )
        .await;
        mount_media(server, &format!("/media/{}.mp3", slug)).await;
    }
}

fn coordinator() -> Coordinator {
    let client = ReqwestClient::new(&HttpConfig::default()).expect("client builds");
    Coordinator::new(Arc::new(client), Arc::new(HtmlPageParser::new()))
}

#[tokio::test]
async fn test_incremental_runs() {
    let server = MockServer::start().await;
    mount_series(&server).await;
    let source = format!("{}/series/daily", server.uri());
    let coordinator = coordinator();

    let first = run_crawl(&coordinator, &source, 5, 3, at(OLDEST), CancellationToken::new()).await;

    assert!(first.errors.is_none(), "unexpected errors: {:?}", first.errors);
    let guids: Vec<&str> = first.items.iter().map(|i| i.guid.as_str()).collect();
    assert_eq!(
        guids,
        vec![NEWEST.to_string(), MIDDLE.to_string(), OLDER.to_string()]
    );
    assert_eq!(first.cached_until, at(NEWEST));

    let newest = &first.items[0];
    assert_eq!(newest.title, "newest");
    assert_eq!(newest.description, "newest in depth");
    assert_eq!(newest.keywords, "Politics, Podcasts");
    assert_eq!(newest.duration_hms(), "00:30:25");
    let enclosure = newest.enclosure.as_ref().expect("probe succeeded");
    assert_eq!(enclosure.url, format!("{}/media/newest.mp3", server.uri()));
    assert_eq!(enclosure.mime_type, "audio/mpeg");

    let second = run_crawl(
        &coordinator,
        &source,
        5,
        3,
        first.cached_until,
        CancellationToken::new(),
    )
    .await;

    assert!(second.items.is_empty());
    assert!(second.errors.is_none());
    assert_eq!(second.cached_until, first.cached_until);
}

#[tokio::test]
async fn test_crawl_from_config() {
    let server = MockServer::start().await;
    mount_series(&server).await;

    let mut crawler = CrawlerConfig::new(format!("{}/series/daily", server.uri()));
    crawler.page_limit = 1;
    crawler.concurrency = 2;
    let config = Config {
        crawler,
        http: HttpConfig::default(),
    };

    let outcome = crawl(&config, CancellationToken::new()).await.unwrap();

    assert_eq!(outcome.items.len(), 3);
    assert!(outcome.items.iter().all(|i| i.guid != OLDEST.to_string()));
    assert_eq!(outcome.cached_until, at(NEWEST));
}

#[tokio::test]
async fn test_failed_probe_drops_enclosure_only() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_get(
        &server,
        "/series/daily",
        listing_page(&[("/ep/broken-media", NEWEST)], None),
    )
    .await;
    mount_get(
        &server,
        "/ep/broken-media",
        detail_page("broken", NEWEST, &format!("{}/media/broken.mp3", base)),
    )
    .await;
    Mock::given(method("HEAD"))
        .and(path("/media/broken.mp3"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let source = format!("{}/series/daily", base);
    let outcome = run_crawl(&coordinator(), &source, 1, 1, at(0), CancellationToken::new()).await;

    assert!(outcome.errors.is_none());
    assert_eq!(outcome.items.len(), 1);
    assert_eq!(outcome.items[0].title, "broken");
    assert!(outcome.items[0].enclosure.is_none());
}

#[tokio::test]
async fn test_missing_detail_page_is_recorded() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_get(
        &server,
        "/series/daily",
        listing_page(&[("/ep/gone", NEWEST), ("/ep/here", MIDDLE)], None),
    )
    .await;
    mount_get(
        &server,
        "/ep/here",
        detail_page("here", MIDDLE, &format!("{}/media/here.mp3", base)),
    )
    .await;
    mount_media(&server, "/media/here.mp3").await;

    let source = format!("{}/series/daily", base);
    let outcome = run_crawl(&coordinator(), &source, 1, 2, at(0), CancellationToken::new()).await;

    assert_eq!(outcome.items.len(), 1);
    assert_eq!(outcome.cached_until, at(MIDDLE));

    let errors: Vec<CrawlError> = outcome.errors.expect("one detail page failed").into_iter().collect();
    assert_eq!(
        errors,
        vec![CrawlError::Fetch(FetchError::Status {
            url: format!("{}/ep/gone", base),
            status: 404,
        })]
    );
}

#[tokio::test]
async fn test_unreachable_source() {
    let source = "http://127.0.0.1:9/series/daily";
    let outcome = run_crawl(&coordinator(), source, 3, 2, at(0), CancellationToken::new()).await;

    assert!(outcome.items.is_empty());
    assert_eq!(outcome.cached_until, at(0));
    assert_eq!(outcome.errors.map(|e| e.len()), Some(1));
}
