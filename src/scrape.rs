use tracing::{info, warn};

use crate::fetch::{CategoryClient, FetchError};
use crate::parser::{self, slug::slugify, streams::StreamRecord};

/// Scrape one category's directory page into stream records.
///
/// Missing or unreadable page state gives an empty list; only transport
/// failures are errors. Records without a game are filled in with
/// `category_name`.
pub async fn scrape_category(
    client: &CategoryClient,
    category_name: &str,
    max_streams: usize,
) -> Result<Vec<StreamRecord>, FetchError> {
    let slug = slugify(category_name);
    if slug.is_empty() {
        warn!("Category '{}' has no usable slug, skipping", category_name);
        return Ok(Vec::new());
    }
    info!("Scraping category '{}' (slug: '{}')", category_name, slug);

    let html = client.fetch_category_html(&slug).await?;
    let mut streams = parser::process_page(&html, max_streams);

    if streams.is_empty() {
        warn!(
            "No streams parsed for category '{}' (slug '{}')",
            category_name, slug
        );
    }

    for stream in &mut streams {
        if stream.game_name.as_deref().map_or(true, str::is_empty) {
            stream.game_name = Some(category_name.to_string());
        }
    }

    Ok(streams)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::HttpSettings;
    use httpmock::prelude::*;

    fn client_for(server: &MockServer) -> CategoryClient {
        CategoryClient::new(&HttpSettings {
            base_url: server.base_url(),
            ..HttpSettings::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn scrapes_and_backfills_game_name() {
        let html = std::fs::read_to_string("tests/fixtures/directory_page.html").unwrap();
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/directory/category/just-chatting");
                then.status(200).body(&html);
            })
            .await;

        let records = scrape_category(&client_for(&server), "Just Chatting", 10)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.game_name.is_some()));
        assert_eq!(records[2].game_name.as_deref(), Some("Just Chatting"));
    }

    #[tokio::test]
    async fn blank_game_name_is_backfilled() {
        let html = r#"<script id="__NEXT_DATA__" type="application/json">
            {"streams": [
                {"login": "a", "title": "one", "viewCount": 1, "game": ""},
                {"login": "b", "title": "two", "viewCount": 2, "game": "Minecraft"}
            ]}
            </script>"#;
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/directory/category/art");
                then.status(200).body(html);
            })
            .await;

        let records = scrape_category(&client_for(&server), "Art", 10).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].game_name.as_deref(), Some("Art"));
        assert_eq!(records[1].game_name.as_deref(), Some("Minecraft"));
    }

    #[tokio::test]
    async fn missing_state_is_empty_not_error() {
        let html = std::fs::read_to_string("tests/fixtures/no_next_data.html").unwrap();
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/directory/category/fortnite");
                then.status(200).body(&html);
            })
            .await;

        let records = scrape_category(&client_for(&server), "Fortnite", 10)
            .await
            .unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn transport_failure_propagates() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/directory/category/fortnite");
                then.status(503);
            })
            .await;

        let result = scrape_category(&client_for(&server), "Fortnite", 10).await;
        assert!(matches!(result, Err(FetchError::Http { .. })));
    }

    #[tokio::test]
    async fn symbol_only_category_skips_request() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET);
                then.status(200);
            })
            .await;

        let records = scrape_category(&client_for(&server), "™®", 10).await.unwrap();
        assert!(records.is_empty());
        assert_eq!(mock.calls_async().await, 0);
    }
}
