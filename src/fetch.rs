use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tracing::{debug, error};

use crate::settings::HttpSettings;

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (compatible; TwitchCategoryScraper/1.0; +https://bitbash.dev)";
pub const DEFAULT_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("invalid header {name:?}: {reason}")]
    InvalidHeader { name: String, reason: String },
    #[error("HTTP error while fetching {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Default request headers with the configured ones laid over them.
pub fn merged_headers(overrides: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    let mut headers = BTreeMap::new();
    headers.insert("User-Agent".to_string(), DEFAULT_USER_AGENT.to_string());
    headers.insert("Accept-Language".to_string(), DEFAULT_ACCEPT_LANGUAGE.to_string());
    for (name, value) in overrides {
        headers.retain(|k, _| !k.eq_ignore_ascii_case(name));
        headers.insert(name.clone(), value.clone());
    }
    headers
}

fn header_map(headers: &BTreeMap<String, String>) -> Result<HeaderMap, FetchError> {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|e| FetchError::InvalidHeader {
                name: name.clone(),
                reason: e.to_string(),
            })?;
        let header_value = HeaderValue::from_str(value).map_err(|e| FetchError::InvalidHeader {
            name: name.clone(),
            reason: e.to_string(),
        })?;
        map.insert(header_name, header_value);
    }
    Ok(map)
}

/// HTTP client for category directory pages.
pub struct CategoryClient {
    client: reqwest::Client,
    base_url: String,
}

impl CategoryClient {
    pub fn new(settings: &HttpSettings) -> Result<Self, FetchError> {
        let headers = header_map(&merged_headers(&settings.headers))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .default_headers(headers)
            .build()
            .map_err(|e| FetchError::Http {
                url: settings.base_url.clone(),
                source: e,
            })?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn category_url(&self, slug: &str) -> String {
        format!("{}/directory/category/{}", self.base_url, slug)
    }

    /// GET the directory page for `slug`. Non-2xx responses are errors.
    pub async fn fetch_category_html(&self, slug: &str) -> Result<String, FetchError> {
        let url = self.category_url(slug);
        debug!("Fetching category page: {}", url);

        let result = async {
            self.client
                .get(&url)
                .send()
                .await?
                .error_for_status()?
                .text()
                .await
        }
        .await;

        result.map_err(|e| {
            error!("HTTP error while fetching {}: {}", url, e);
            FetchError::Http { url, source: e }
        })
    }
}
