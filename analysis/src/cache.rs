//! Single-slot memoization of provider output.
//!
//! The appliance holds exactly one live game, so the cache is one record, not
//! a map: the last computed report plus the fingerprint it belongs to. Any
//! position mutation must call [`AnalysisCache::invalidate`] before the next
//! read.

use cozy_chess::Board;
use tokio::sync::Mutex;

use crate::{AnalysisError, AnalysisProvider, AnalysisReport};

#[derive(Debug, Clone)]
struct CacheRecord {
    fingerprint: String,
    report: AnalysisReport,
}

/// Memoizes `provider.analyse` keyed on a position fingerprint.
#[derive(Default)]
pub struct AnalysisCache {
    slot: Mutex<Option<CacheRecord>>,
}

impl AnalysisCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached report when `fingerprint` matches the stored record;
    /// otherwise invoke the provider, store its result under `fingerprint`,
    /// and return it.
    ///
    /// The slot lock is held across the miss computation, so concurrent
    /// misses for the same fingerprint invoke the provider once and can never
    /// leave a record whose fingerprint differs from the query that stored
    /// it. Provider failures are not cached; the next read retries.
    pub async fn fetch(
        &self,
        fingerprint: &str,
        board: &Board,
        provider: &dyn AnalysisProvider,
    ) -> Result<AnalysisReport, AnalysisError> {
        let mut slot = self.slot.lock().await;

        if let Some(record) = slot.as_ref() {
            if record.fingerprint == fingerprint {
                tracing::debug!(fingerprint, "analysis cache hit");
                return Ok(record.report.clone());
            }
        }

        tracing::debug!(fingerprint, "analysis cache miss");
        let report = provider.analyse(board).await?;
        *slot = Some(CacheRecord {
            fingerprint: fingerprint.to_string(),
            report: report.clone(),
        });
        Ok(report)
    }

    /// Drop the stored record. Called after every accepted move or undo.
    pub async fn invalidate(&self) {
        *self.slot.lock().await = None;
    }
}
