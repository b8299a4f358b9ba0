// src/core/diff_engine.rs

//! Staleness-gated reconciliation of a fresh snapshot against a site's history.
//!
//! Each call lands in exactly one of three cases:
//!
//! 1. **First observation**: no row yet. A row is inserted with both baselines
//!    equal to the snapshot; the response reports no change.
//! 2. **Stale**: the row was last refreshed more than the staleness window ago.
//!    The stored "current" baseline becomes "previous", the snapshot becomes
//!    "current", and the change flag compares the snapshot with the old current
//!    server set.
//! 3. **Fresh**: inside the window nothing is written. The response reports the
//!    stored previous grade, and the change flag compares the snapshot with the
//!    stored *previous* server set, not the current one.
//!
//! The write in cases 1 and 2 is conditional. A concurrent caller that got
//! there first makes the write miss; the loser re-reads the row and, since the
//! winner just refreshed it, answers from case 3. Two callers racing on the
//! same stale row therefore never both shift the baselines.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::core::models::{HistoryRecord, ResponseRecord, Snapshot};
use crate::error::PostureError;
use crate::store::RecordStore;

/// Seconds after a refresh during which a site's baselines stay fixed.
pub const DEFAULT_STALENESS_WINDOW_SECS: i64 = 3600;

// A lost race is followed by a re-read that sees a fresh row.
const MAX_ATTEMPTS: usize = 4;

pub struct DiffEngine {
    store: Arc<dyn RecordStore>,
    staleness_window: i64,
}

impl DiffEngine {
    pub fn new(store: Arc<dyn RecordStore>, staleness_window: i64) -> Self {
        Self {
            store,
            staleness_window,
        }
    }

    /// Reconciles `snapshot` against the history of `url` using the wall clock.
    pub async fn reconcile(&self, snapshot: Snapshot, url: &str) -> Result<ResponseRecord, PostureError> {
        self.reconcile_at(snapshot, url, Utc::now().timestamp()).await
    }

    /// Reconciles as if the current time were `now` (unix seconds).
    ///
    /// # Arguments
    /// * `snapshot` - The fresh view of the site, moved into the response.
    /// * `url` - History key, the normalized host.
    /// * `now` - Unix seconds used for the staleness check and any write.
    ///
    /// # Returns
    /// The `ResponseRecord` with `previous_ssl_grade` and `servers_changed`
    /// filled from history. `PostureError::StoreUnavailable` if the store
    /// fails, or if the row keeps changing under this call.
    pub async fn reconcile_at(
        &self,
        snapshot: Snapshot,
        url: &str,
        now: i64,
    ) -> Result<ResponseRecord, PostureError> {
        let fresh_blob = snapshot.server_set_blob()?;

        for attempt in 1..=MAX_ATTEMPTS {
            let Some(stored) = self.store.get(url).await? else {
                let record = HistoryRecord::first_observation(url, &snapshot, now)?;
                if self.store.insert_if_absent(&record).await? {
                    info!(url, grade = %snapshot.ssl_grade, "First observation recorded.");
                    let previous = snapshot.ssl_grade.clone();
                    return Ok(ResponseRecord::from_snapshot(snapshot, previous, false));
                }
                warn!(url, attempt, "Lost first-insert race, re-reading history.");
                continue;
            };

            if self.is_stale(&stored, now) {
                let refreshed = stored.refreshed(&snapshot, now)?;
                if self
                    .store
                    .replace_if_unchanged(&refreshed, stored.last_refreshed_at)
                    .await?
                {
                    let servers_changed = fresh_blob != stored.current_server_set_blob;
                    info!(
                        url,
                        previous_grade = %stored.current_grade,
                        grade = %snapshot.ssl_grade,
                        servers_changed,
                        "Stale history refreshed."
                    );
                    return Ok(ResponseRecord::from_snapshot(
                        snapshot,
                        stored.current_grade,
                        servers_changed,
                    ));
                }
                warn!(url, attempt, "Lost refresh race, re-reading history.");
                continue;
            }

            let servers_changed = fresh_blob != stored.previous_server_set_blob;
            debug!(
                url,
                age = now - stored.last_refreshed_at,
                servers_changed,
                "History still fresh, nothing written."
            );
            return Ok(ResponseRecord::from_snapshot(
                snapshot,
                stored.previous_grade,
                servers_changed,
            ));
        }

        Err(PostureError::StoreUnavailable(format!(
            "history for {} kept changing during {} attempts",
            url, MAX_ATTEMPTS
        )))
    }

    fn is_stale(&self, record: &HistoryRecord, now: i64) -> bool {
        now - record.last_refreshed_at > self.staleness_window
    }
}
