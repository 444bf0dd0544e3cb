// src/web/client.rs
use crate::utils::error::AcquireError;
use reqwest::header;
use scraper::{Html, Selector};
use std::collections::BTreeSet;
use std::time::Duration;

// Some institutional portals reject requests without a browser-like agent.
const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";
// Be polite to listing servers between consecutive downloads.
const REQUEST_DELAY_MS: u64 = 150;

/// Creates a reqwest client configured for listing/document fetches.
fn build_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(15))
        .build()
}

/// Scrapes a listing page for links to report documents with the given
/// extension (case-insensitive). Relative links are resolved against the
/// listing URL; duplicates are removed and the result sorted for stable
/// batch ordering.
pub async fn discover_document_links(
    listing_url: &str,
    extension: &str,
) -> Result<Vec<String>, AcquireError> {
    if !listing_url.starts_with("http://") && !listing_url.starts_with("https://") {
        return Err(AcquireError::InvalidUrl(listing_url.to_string()));
    }
    let base = reqwest::Url::parse(listing_url)
        .map_err(|_| AcquireError::InvalidUrl(listing_url.to_string()))?;

    let client = build_client()?;
    tracing::info!("Scraping listing page: {}", listing_url);

    let response = client
        .get(listing_url)
        .header(header::ACCEPT, "text/html,*/*")
        .send()
        .await?;
    let status = response.status();
    if !status.is_success() {
        tracing::error!("HTTP error status: {} for listing URL: {}", status, listing_url);
        return Err(AcquireError::Http(status));
    }
    let body = response.text().await?;

    let document = Html::parse_document(&body);
    // `a[href]` is a valid selector; parse cannot fail.
    let selector = Selector::parse("a[href]").expect("Failed to parse anchor selector");

    let extension = extension.to_lowercase();
    let mut links = BTreeSet::new();
    for element in document.select(&selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        if !href.to_lowercase().ends_with(&extension) {
            continue;
        }
        if let Ok(absolute) = base.join(href) {
            links.insert(absolute.to_string());
        }
    }

    tracing::info!("Found {} document link(s) on listing page", links.len());
    Ok(links.into_iter().collect())
}

/// Downloads one report document. Includes basic rate limiting between
/// consecutive calls in a batch.
pub async fn download_document(url: &str) -> Result<Vec<u8>, AcquireError> {
    let client = build_client()?;

    tracing::info!("Downloading document from: {}", url);
    tokio::time::sleep(Duration::from_millis(REQUEST_DELAY_MS)).await;

    let response = client.get(url).send().await?;

    let status = response.status();
    if !status.is_success() {
        tracing::error!("HTTP error status: {} for URL: {}", status, url);
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(AcquireError::DocumentNotFound(url.to_string()));
        }
        return Err(AcquireError::Http(status));
    }

    let body = response.bytes().await?;
    tracing::debug!("Downloaded {} bytes from {}", body.len(), url);
    Ok(body.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_non_http_listing_url_is_rejected() {
        let err = discover_document_links("ftp://example.org/reports", ".json")
            .await
            .unwrap_err();
        assert!(matches!(err, AcquireError::InvalidUrl(_)));
    }
}
