// src/lib.rs

//! Website posture service: combines a third-party TLS assessment, WHOIS
//! ownership per server, and page metadata into one view per site, and keeps a
//! time-bounded history so repeated queries report what changed.

pub mod api;
pub mod config;
pub mod core;
pub mod error;
pub mod logging;
pub mod store;
