use scraper::{Html, Selector};
use serde_json::Value;
use tracing::{error, warn};

const NEXT_DATA_SELECTOR: &str = r#"script[id="__NEXT_DATA__"]"#;

/// Decode the `__NEXT_DATA__` state blob embedded in a directory page.
///
/// Returns `None` when the script is missing, empty or not valid JSON. Those
/// cases are logged here and never surface as errors.
pub fn extract_next_data(html: &str) -> Option<Value> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(NEXT_DATA_SELECTOR).ok()?;

    let Some(script) = document.select(&selector).next() else {
        warn!("Could not locate __NEXT_DATA__ script in page HTML");
        return None;
    };

    let text: String = script.text().collect();
    if text.trim().is_empty() {
        warn!("__NEXT_DATA__ script is present but empty");
        return None;
    }

    match serde_json::from_str(&text) {
        Ok(data) => Some(data),
        Err(e) => {
            error!("Failed to decode __NEXT_DATA__ JSON: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_payload() {
        let html = r#"<html><head>
            <script id="__NEXT_DATA__" type="application/json">{"props":{"pageProps":{"n":1}}}</script>
            </head></html>"#;
        let data = extract_next_data(html).unwrap();
        assert_eq!(data["props"]["pageProps"]["n"], 1);
    }

    #[test]
    fn ignores_other_scripts() {
        let html = r#"<script id="other">{"a":1}</script>
            <script id="__NEXT_DATA__">{"b":2}</script>"#;
        let data = extract_next_data(html).unwrap();
        assert!(data.get("a").is_none());
        assert_eq!(data["b"], 2);
    }

    #[test]
    fn missing_script() {
        assert!(extract_next_data("<html><body>No state here</body></html>").is_none());
    }

    #[test]
    fn empty_script() {
        assert!(extract_next_data(r#"<script id="__NEXT_DATA__">   </script>"#).is_none());
    }

    #[test]
    fn malformed_json() {
        let html = r#"<script id="__NEXT_DATA__">{"props": [1, 2</script>"#;
        assert!(extract_next_data(html).is_none());
    }
}
