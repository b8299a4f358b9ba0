// src/core/scanner/whois.rs

use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

use super::{WhoisInfo, WhoisResolver};
use crate::error::EnrichmentError;

pub const DEFAULT_WHOIS_SERVER: &str = "whois.iana.org";
const WHOIS_PORT: u16 = 43;

static RE_ORGNAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)orgname").unwrap());
static RE_COUNTRY: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)country").unwrap());
static RE_REFERRAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?im)^\s*(?:refer|whois)\s*:\s*(?:whois://)?([A-Za-z0-9.\-]+)").unwrap());

/// WHOIS client speaking the plain port-43 protocol.
///
/// The bootstrap server is asked first; if it points at a registry with a
/// `refer:` or `whois:` line, that registry is asked once more and its answer
/// is the one parsed.
pub struct WhoisClient {
    bootstrap_server: String,
    timeout: Duration,
}

impl WhoisClient {
    /// # Arguments
    /// * `bootstrap_server` - First server asked, usually `whois.iana.org`.
    /// * `timeout` - Bound on each connect-write-read exchange. A lookup that
    ///   follows a referral may take up to twice this.
    pub fn new(bootstrap_server: &str, timeout: Duration) -> Self {
        Self {
            bootstrap_server: bootstrap_server.to_string(),
            timeout,
        }
    }

    async fn query(&self, server: &str, query: &str) -> Result<String, EnrichmentError> {
        debug!(server, query, "Sending WHOIS query.");
        let exchange = async {
            let mut stream = TcpStream::connect((server, WHOIS_PORT)).await?;
            stream.write_all(format!("{}\r\n", query).as_bytes()).await?;
            let mut raw = Vec::new();
            stream.read_to_end(&mut raw).await?;
            Ok::<_, std::io::Error>(raw)
        };

        let raw = tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| EnrichmentError::Timeout(self.timeout.as_secs()))?
            .map_err(|e| EnrichmentError::Whois(format!("{}: {}", server, e)))?;

        Ok(String::from_utf8_lossy(&raw).into_owned())
    }
}

#[async_trait]
impl WhoisResolver for WhoisClient {
    async fn lookup(&self, ip: &str) -> Result<WhoisInfo, EnrichmentError> {
        let mut text = self.query(&self.bootstrap_server, ip).await?;

        if let Some(referral) = find_referral(&text) {
            if !referral.eq_ignore_ascii_case(&self.bootstrap_server) {
                debug!(ip, referral = %referral, "Following WHOIS referral.");
                text = self.query(&referral, ip).await?;
            }
        }

        let info = parse_whois(&text);
        if info.owner.is_none() && info.country.is_none() {
            warn!(ip, "WHOIS answer had no owner or country lines.");
        } else {
            info!(ip, owner = ?info.owner, country = ?info.country, "WHOIS lookup finished.");
        }
        Ok(info)
    }
}

/// The registry a bootstrap answer points to, if any.
pub fn find_referral(text: &str) -> Option<String> {
    RE_REFERRAL
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Pulls owner and country out of free-form WHOIS text.
///
/// Any line mentioning `orgname` or `country` (case-insensitive) is split on
/// `:` and the second field taken; a later matching line overrides an earlier
/// one. Lines with no value after the colon are skipped.
pub fn parse_whois(text: &str) -> WhoisInfo {
    let mut info = WhoisInfo::default();

    for line in text.lines() {
        if RE_ORGNAME.is_match(line) {
            if let Some(value) = field_value(line) {
                info.owner = Some(value);
            }
        }
        if RE_COUNTRY.is_match(line) {
            if let Some(value) = field_value(line) {
                info.country = Some(value);
            }
        }
    }

    info
}

fn field_value(line: &str) -> Option<String> {
    line.split(':')
        .nth(1)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
