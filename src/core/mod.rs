// src/core/mod.rs

/// Data structures shared by the builder, the diff engine, and the HTTP layer:
/// `Server`, `Snapshot`, `HistoryRecord`, and `ResponseRecord`.
pub mod models;

/// Adapter interfaces for the scan provider, WHOIS, and page metadata, with
/// their production implementations.
pub mod scanner;

/// The policy that reduces endpoint grades to one site grade.
pub mod grade;

/// Composition of scan and enrichment results into a `Snapshot`.
pub mod snapshot;

/// Staleness-gated reconciliation of snapshots against stored history.
pub mod diff_engine;

pub mod target;
