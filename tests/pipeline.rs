use std::sync::Arc;

use httpmock::prelude::*;
use skt_scraper::finder::{MetadataOutcome, SearchOutcome};
use skt_scraper::{Episode, LookupRequest, MediaKind, ScraperConfig, StreamFinder};

fn finder_for(server: &MockServer) -> StreamFinder {
    let config = ScraperConfig {
        metadata_base_url: server.url("/imdb"),
        host_base_url: server.base_url(),
        ..ScraperConfig::default()
    };
    StreamFinder::from_config(Arc::new(config)).unwrap()
}

fn movie(imdb_id: &str) -> LookupRequest {
    LookupRequest {
        imdb_id: imdb_id.to_string(),
        kind: MediaKind::Movie,
        episode: None,
    }
}

fn mock_title_page(server: &MockServer, imdb_id: &str, body: &'static str) {
    let path = format!("/imdb/title/{imdb_id}/");
    server.mock(|when, then| {
        when.method(GET).path(path);
        then.status(200).header("content-type", "text/html").body(body);
    });
}

#[tokio::test]
async fn second_query_wins_and_third_is_never_tried() {
    let server = MockServer::start();
    mock_title_page(
        &server,
        "tt0167116",
        r#"<title>Pelíšky (1999) - IMDb</title><script type="application/ld+json">{"name":"Cosy Dens"}</script>"#,
    );
    let first = server.mock(|when, then| {
        when.method(GET).path("/search/videos").query_param("search_query", "Pelíšky");
        then.status(200).body("<p>No videos found</p>");
    });
    let second = server.mock(|when, then| {
        when.method(GET).path("/search/videos").query_param("search_query", "Pelisky");
        then.status(200).body(r#"<a href="/video/42/pelisky-1999">Pelíšky (1999)</a>"#);
    });
    let third = server.mock(|when, then| {
        when.method(GET).path("/search/videos").query_param("search_query", "Cosy Dens");
        then.status(200).body(r#"<a href="/video/43/cosy-dens">Cosy Dens</a>"#);
    });
    let detail = server.mock(|when, then| {
        when.method(GET).path("/video/42");
        then.status(200).body(
            r#"<html><head><title>Pelíšky (1999) CZ</title></head><body><video>
                <source src="/media//videos/42_hd.mp4" label="720p">
                <source src="/media/videos/42.mkv" label="480p">
            </video></body></html>"#,
        );
    });
    let other_detail = server.mock(|when, then| {
        when.method(GET).path("/video/43");
        then.status(200).body("<title>x</title>");
    });

    let report = finder_for(&server).run(&movie("tt0167116")).await;

    first.assert_hits(1);
    second.assert_hits(1);
    third.assert_hits(0);
    detail.assert_hits(1);
    other_detail.assert_hits(0);

    assert_eq!(report.queries, vec!["Pelíšky", "Pelisky", "Cosy Dens"]);
    assert_eq!(report.attempts.len(), 2);
    assert_eq!(report.attempts[0].outcome, SearchOutcome::NoResults);
    assert_eq!(report.streams.len(), 1);

    let stream = &report.streams[0];
    assert_eq!(stream.url, format!("{}/media/videos/42_hd.mp4", server.base_url()));
    assert_eq!(stream.name, "SKTonline 🟦 HD (720p)");
    assert_eq!(stream.title, "Pelíšky (1999) CZ\n⚙️SKTonline\n🇨🇿");
    assert!(report.streams.iter().all(|s| !s.url.ends_with(".mkv")));
}

#[tokio::test]
async fn unknown_imdb_id_yields_no_streams_and_no_searches() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/imdb/title/tt9999999/");
        then.status(404);
    });
    let search = server.mock(|when, then| {
        when.method(GET).path("/search/videos");
        then.status(200).body("");
    });

    let report = finder_for(&server).run(&movie("tt9999999")).await;

    assert_eq!(report.metadata, MetadataOutcome::NotFound);
    assert!(report.streams.is_empty());
    search.assert_hits(0);
}

#[tokio::test]
async fn failing_host_degrades_to_empty_result() {
    let server = MockServer::start();
    mock_title_page(&server, "tt0078748", "<title>Alien (1979) - IMDb</title>");
    let search = server.mock(|when, then| {
        when.method(GET).path("/search/videos");
        then.status(502);
    });

    let finder = finder_for(&server);
    let report = finder.run(&movie("tt0078748")).await;

    search.assert_hits(1);
    assert_eq!(report.queries, vec!["Alien"]);
    assert!(matches!(report.attempts[0].outcome, SearchOutcome::Failed { .. }));
    assert_eq!(report.failures(), 1);
    assert!(report.streams.is_empty());
}

#[tokio::test]
async fn series_lookup_searches_tagged_queries() {
    let server = MockServer::start();
    mock_title_page(&server, "tt0903747", "<title>Breaking Bad (TV Series 2008–2013) - IMDb</title>");
    let tagged = server.mock(|when, then| {
        when.method(GET)
            .path("/search/videos")
            .query_param("search_query", "Breaking Bad S01E02");
        then.status(200).body(r#"<a href="/video/7/bb-s01e02">BB</a>"#);
    });
    server.mock(|when, then| {
        when.method(GET).path("/video/7");
        then.status(200)
            .body(r#"<title>Breaking Bad S01E02 EN</title><video><source src="https://cdn.example/bb.mp4" label="SD"></video>"#);
    });

    let request = LookupRequest {
        imdb_id: "tt0903747".to_string(),
        kind: MediaKind::Series,
        episode: Episode::from_parts(Some(1), Some(2)),
    };
    let streams = finder_for(&server).find_streams(&request).await;

    tagged.assert_hits(1);
    assert_eq!(streams.len(), 1);
    assert_eq!(streams[0].url, "https://cdn.example/bb.mp4");
    assert_eq!(streams[0].name, "SKTonline 🟨 SD (480p)");
    assert_eq!(streams[0].title, "Breaking Bad S01E02 EN\n⚙️SKTonline\n🇬🇧");
}
