// src/config.rs

use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;

use crate::core::diff_engine::DEFAULT_STALENESS_WINDOW_SECS;
use crate::core::scanner::ssl_labs::DEFAULT_SCAN_API_URL;
use crate::core::scanner::whois::DEFAULT_WHOIS_SERVER;
use crate::logging::get_data_dir;

pub const DEFAULT_LISTEN: &str = "0.0.0.0:8090";
pub const DEFAULT_USER_AGENT: &str = "VanguardRS/0.1";
const DATABASE_FILE: &str = "posture.db";

/// Runtime settings, read from flags with environment fallbacks.
#[derive(Debug, Clone, Parser)]
#[command(name = "vanguard-posture", version, about = "Website TLS and ownership posture service")]
pub struct Config {
    /// Address the HTTP server binds to.
    #[arg(long, env = "VANGUARD_LISTEN", default_value = DEFAULT_LISTEN)]
    pub listen: SocketAddr,

    /// SQLite URL for the history store, or `memory`. Defaults to a file in the data directory.
    #[arg(long, env = "VANGUARD_DATABASE_URL")]
    pub database_url: Option<String>,

    /// Base URL of the SSL Labs compatible scan API.
    #[arg(long, env = "VANGUARD_SCAN_API_URL", default_value = DEFAULT_SCAN_API_URL)]
    pub scan_api_url: String,

    /// Ask the scan provider for a cached assessment instead of a new one.
    #[arg(long, env = "VANGUARD_SCAN_FROM_CACHE")]
    pub scan_from_cache: bool,

    /// Extra attempts for transient scan provider failures.
    #[arg(long, env = "VANGUARD_SCAN_RETRIES", default_value_t = 1)]
    pub scan_retries: u32,

    /// WHOIS server queried first; referrals are followed from there.
    #[arg(long, env = "VANGUARD_WHOIS_SERVER", default_value = DEFAULT_WHOIS_SERVER)]
    pub whois_server: String,

    /// Timeout for scan provider and page requests, in seconds.
    #[arg(long, env = "VANGUARD_HTTP_TIMEOUT", default_value_t = 20)]
    pub http_timeout_secs: u64,

    /// Timeout for one WHOIS exchange, in seconds.
    #[arg(long, env = "VANGUARD_WHOIS_TIMEOUT", default_value_t = 10)]
    pub whois_timeout_secs: u64,

    /// Seconds a stored baseline stays fresh before the next query refreshes it.
    #[arg(long, env = "VANGUARD_STALENESS_WINDOW", default_value_t = DEFAULT_STALENESS_WINDOW_SECS)]
    pub staleness_window_secs: i64,

    #[arg(long, env = "VANGUARD_USER_AGENT", default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// Also write logs to a file in the data directory.
    #[arg(long, env = "VANGUARD_LOG_FILE")]
    pub log_to_file: bool,
}

impl Config {
    pub fn database_url(&self) -> String {
        self.database_url.clone().unwrap_or_else(|| {
            format!("sqlite://{}", get_data_dir().join(DATABASE_FILE).display())
        })
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn whois_timeout(&self) -> Duration {
        Duration::from_secs(self.whois_timeout_secs)
    }

    /// Upper bound for one enrichment step: a WHOIS lookup may take a
    /// bootstrap query plus one referral.
    pub fn enrichment_timeout(&self) -> Duration {
        self.http_timeout().max(self.whois_timeout() * 2)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: ([0, 0, 0, 0], 8090).into(),
            database_url: None,
            scan_api_url: DEFAULT_SCAN_API_URL.to_string(),
            scan_from_cache: false,
            scan_retries: 1,
            whois_server: DEFAULT_WHOIS_SERVER.to_string(),
            http_timeout_secs: 20,
            whois_timeout_secs: 10,
            staleness_window_secs: DEFAULT_STALENESS_WINDOW_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            log_to_file: false,
        }
    }
}
