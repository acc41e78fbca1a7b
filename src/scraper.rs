use reqwest::{Client, ClientBuilder};
use scraper::Html;
use std::time::Duration;
use once_cell::sync::Lazy;
use crate::error::{AppError, Result};

/// Character budget for the cached website snapshot.
pub const SNAPSHOT_MAX_CHARS: usize = 8000;

const FETCH_TIMEOUT: Duration = Duration::from_secs(6);

// Some institutional sites refuse requests without a browser-like identity.
const BROWSER_USER_AGENT: &str = "Mozilla/5.0";

// Create a static client to reuse connections
static CLIENT: Lazy<Client> = Lazy::new(|| {
    ClientBuilder::new()
        .timeout(FETCH_TIMEOUT)
        .connect_timeout(Duration::from_secs(5))
        .user_agent(BROWSER_USER_AGENT)
        .build()
        .expect("Failed to build HTTP client")
});

/// Fetches a page and reduces it to collapsed, truncated visible text.
pub async fn fetch_page_text(url: &str) -> Result<String> {
    let response = CLIENT.get(url).send().await?;
    if !response.status().is_success() {
        return Err(AppError::Fetch(format!(
            "{url} returned status {}",
            response.status()
        )));
    }
    let html = response.text().await?;
    Ok(page_text(&html))
}

pub fn page_text(html: &str) -> String {
    let extracted = extract_text(html);
    collapse_and_truncate(&extracted, SNAPSHOT_MAX_CHARS)
}

/// Collects the text nodes of a document, skipping script, style and
/// noscript content.
pub fn extract_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let root = document.root_element();

    let mut out = String::new();
    for node in root.descendants() {
        if let Some(text) = node.value().as_text() {
            let skipped = node.ancestors().any(|ancestor| {
                ancestor
                    .value()
                    .as_element()
                    .map_or(false, |el| matches!(el.name(), "script" | "style" | "noscript"))
            });
            if !skipped {
                out.push_str(text);
                out.push(' ');
            }
        }
    }
    out
}

/// Collapses all runs of whitespace to single spaces and truncates to a
/// character count (not bytes, so multi-byte text stays intact).
pub fn collapse_and_truncate(text: &str, max_chars: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    match collapsed.char_indices().nth(max_chars) {
        Some((idx, _)) => collapsed[..idx].to_string(),
        None => collapsed,
    }
}
