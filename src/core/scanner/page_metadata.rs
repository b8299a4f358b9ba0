// src/core/scanner/page_metadata.rs

use async_trait::async_trait;
use once_cell::sync::Lazy;
use reqwest::StatusCode;
use scraper::{Html, Selector};
use tracing::{debug, error, info};

use super::{PageMetadata, PageMetadataFetcher};
use crate::error::EnrichmentError;

static TITLE_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("head title").unwrap());
static LINK_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("head link[rel]").unwrap());

const ICON_REL: &str = "shortcut icon";

// Landing pages are only parsed for 200, 201 and 202; anything from 203 up is
// treated as a failed fetch.
const FIRST_REJECTED_STATUS: u16 = 203;

/// Fetches a site's landing page over HTTPS and reads title and favicon from its `head`.
pub struct HtmlMetadataFetcher {
    client: reqwest::Client,
}

impl HtmlMetadataFetcher {
    /// Creates a fetcher on top of the shared HTTP client.
    ///
    /// # Arguments
    /// * `client` - The `reqwest::Client` built by `build_http_client`; its
    ///   timeout bounds each landing page request.
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageMetadataFetcher for HtmlMetadataFetcher {
    /// Fetches `https://<host>` and reads title and favicon from its `head`.
    ///
    /// # Arguments
    /// * `host` - The normalized host of the site.
    ///
    /// # Returns
    /// The parsed `PageMetadata`, or `EnrichmentError::PageFetch` when the
    /// request fails, the page answers with an error status, or the body
    /// cannot be read. The snapshot builder turns any error into sentinels.
    async fn fetch(&self, host: &str) -> Result<PageMetadata, EnrichmentError> {
        info!(site = host, "Fetching page metadata.");
        let url = format!("https://{}", host);

        let response = self.client.get(&url).send().await.map_err(|e| {
            error!(url = %url, error = %e, "HTTP request failed for page metadata.");
            EnrichmentError::PageFetch(format!("HTTP request failed: {}", e))
        })?;
        let status = response.status();
        debug!(status = %status, "Received landing page response.");
        // An error page has a head of its own; its title is not the site's.
        check_landing_status(status).inspect_err(|e| {
            error!(url = %url, error = %e, "Landing page answered with an error status.");
        })?;

        let body = response.text().await.map_err(|e| {
            error!(error = %e, "Failed to read landing page body.");
            EnrichmentError::PageFetch(format!("Failed to read response body: {}", e))
        })?;
        debug!(bytes = %body.len(), "Read landing page body.");

        Ok(parse_head(&body))
    }
}

/// Decides whether a landing page response is worth parsing.
///
/// # Arguments
/// * `status` - The final status, after redirects have been followed.
///
/// # Returns
/// `Ok(())` for 200 through 202, `EnrichmentError::PageFetch` otherwise.
pub fn check_landing_status(status: StatusCode) -> Result<(), EnrichmentError> {
    if status.is_success() && status.as_u16() < FIRST_REJECTED_STATUS {
        Ok(())
    } else {
        Err(EnrichmentError::PageFetch(format!("landing page answered {}", status)))
    }
}

/// Extracts title and favicon link from an HTML document.
///
/// The title is the trimmed text of the first `<title>` in `head`; an empty
/// title counts as missing. The logo is the `href` of the first `<link>` whose
/// `rel` equals `shortcut icon`, compared case-insensitively.
pub fn parse_head(html: &str) -> PageMetadata {
    let document = Html::parse_document(html);

    let title = document
        .select(&TITLE_SELECTOR)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty());

    let logo = document
        .select(&LINK_SELECTOR)
        .find(|el| {
            el.value()
                .attr("rel")
                .is_some_and(|rel| rel.eq_ignore_ascii_case(ICON_REL))
        })
        .and_then(|el| el.value().attr("href"))
        .map(str::to_string);

    PageMetadata { title, logo }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_statuses_are_parsed() {
        for status in [StatusCode::OK, StatusCode::CREATED, StatusCode::ACCEPTED] {
            assert!(check_landing_status(status).is_ok(), "{status}");
        }
    }

    #[test]
    fn error_pages_are_failed_fetches() {
        for status in [
            StatusCode::NON_AUTHORITATIVE_INFORMATION,
            StatusCode::NO_CONTENT,
            StatusCode::NOT_MODIFIED,
            StatusCode::NOT_FOUND,
            StatusCode::SERVICE_UNAVAILABLE,
        ] {
            let result = check_landing_status(status);
            assert!(matches!(result, Err(EnrichmentError::PageFetch(_))), "{status}");
        }
    }

    #[test]
    fn reads_title_and_shortcut_icon() {
        let html = r#"<!doctype html>
            <html><head>
              <title>  Example Domain </title>
              <link rel="stylesheet" href="/site.css">
              <link rel="Shortcut Icon" href="/favicon.ico">
              <link rel="shortcut icon" href="/other.ico">
            </head><body><title>not this one</title></body></html>"#;
        let meta = parse_head(html);
        assert_eq!(meta.title.as_deref(), Some("Example Domain"));
        assert_eq!(meta.logo.as_deref(), Some("/favicon.ico"));
    }

    #[test]
    fn plain_icon_rel_is_not_a_logo() {
        let html = r#"<html><head><link rel="icon" href="/favicon.png"></head></html>"#;
        assert_eq!(parse_head(html).logo, None);
    }

    #[test]
    fn missing_head_content_yields_nothing() {
        let meta = parse_head("<html><body><p>hello</p></body></html>");
        assert_eq!(meta, PageMetadata::default());
    }

    #[test]
    fn blank_title_counts_as_missing() {
        let meta = parse_head("<html><head><title>   </title></head></html>");
        assert_eq!(meta.title, None);
    }
}
