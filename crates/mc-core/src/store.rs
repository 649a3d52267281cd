//! Shared store of loaded sources and detector results.
//!
//! The store is an explicit handle passed to whoever needs it; wrap it in
//! an `Arc` to share it between worker threads. Appends take the write
//! lock one at a time. Readers clone whole records under the read lock,
//! so a snapshot may be stale but never holds a half-written record.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use mc_common::{Error, Result, ResultId, SourceId};
use serde::Serialize;
use tracing::debug;

use crate::detect::{DetectorKind, ErrorSeries};
use crate::logging::{event_names, Stage};
use crate::table::TimeSeriesTable;

/// A registered sample table.
#[derive(Debug, Clone)]
pub struct SourceRecord {
    pub id: SourceId,
    pub table: Arc<TimeSeriesTable>,
    pub registered_at: DateTime<Utc>,
}

/// One completed detector run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRecord {
    pub id: ResultId,
    pub source_id: SourceId,
    pub kind: DetectorKind,
    pub series: ErrorSeries,
    /// Options and fit parameters of the run.
    pub params: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Anomaly counts of the latest result of each kind for one source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceSummary {
    pub source_id: SourceId,
    pub rows: usize,
    pub anomalous: BTreeMap<DetectorKind, usize>,
}

#[derive(Debug, Default)]
struct StoreState {
    sources: BTreeMap<SourceId, SourceRecord>,
    results: Vec<ResultRecord>,
}

/// Thread-safe store keyed by source id.
#[derive(Debug, Default)]
pub struct ResultStore {
    state: RwLock<StoreState>,
    next_result: AtomicU64,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, StoreState>> {
        self.state
            .read()
            .map_err(|e| Error::Worker(format!("result store lock poisoned: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, StoreState>> {
        self.state
            .write()
            .map_err(|e| Error::Worker(format!("result store lock poisoned: {}", e)))
    }

    /// Register a sample table and return its new id.
    pub fn register_source(&self, table: impl Into<Arc<TimeSeriesTable>>) -> Result<SourceId> {
        let table = table.into();
        let mut state = self.write()?;
        let mut id = SourceId::new();
        while state.sources.contains_key(&id) {
            id = SourceId::new();
        }
        debug!(
            event = event_names::STORE_SOURCE_REGISTERED,
            stage = %Stage::Store,
            source_id = %id,
            rows = table.len(),
            "source registered"
        );
        state.sources.insert(
            id.clone(),
            SourceRecord {
                id: id.clone(),
                table,
                registered_at: Utc::now(),
            },
        );
        Ok(id)
    }

    /// Record a completed run for a registered source.
    pub fn append_result(
        &self,
        source_id: &SourceId,
        kind: DetectorKind,
        series: ErrorSeries,
        params: serde_json::Value,
    ) -> Result<ResultId> {
        let mut state = self.write()?;
        if !state.sources.contains_key(source_id) {
            return Err(Error::InvalidArgument(format!("unknown source {}", source_id)));
        }
        let id = ResultId(self.next_result.fetch_add(1, Ordering::Relaxed) + 1);
        debug!(
            event = event_names::STORE_RESULT_APPENDED,
            stage = %Stage::Store,
            source_id = %source_id,
            result_id = %id,
            kind = %kind,
            points = series.len(),
            "result appended"
        );
        state.results.push(ResultRecord {
            id,
            source_id: source_id.clone(),
            kind,
            series,
            params,
            created_at: Utc::now(),
        });
        Ok(id)
    }

    /// Most recently appended result of `kind` for `source_id`.
    pub fn get_latest(&self, source_id: &SourceId, kind: DetectorKind) -> Result<Option<ResultRecord>> {
        let state = self.read()?;
        Ok(state
            .results
            .iter()
            .rev()
            .find(|r| &r.source_id == source_id && r.kind == kind)
            .cloned())
    }

    /// Snapshot of every result in append order.
    pub fn records(&self) -> Result<Vec<ResultRecord>> {
        Ok(self.read()?.results.clone())
    }

    pub fn source(&self, id: &SourceId) -> Result<Option<SourceRecord>> {
        Ok(self.read()?.sources.get(id).cloned())
    }

    pub fn source_ids(&self) -> Result<Vec<SourceId>> {
        Ok(self.read()?.sources.keys().cloned().collect())
    }

    /// Per-source anomaly counts from the latest result of each kind.
    pub fn summary(&self) -> Result<Vec<SourceSummary>> {
        let state = self.read()?;
        let mut summaries: BTreeMap<&SourceId, SourceSummary> = state
            .sources
            .values()
            .map(|s| {
                (
                    &s.id,
                    SourceSummary {
                        source_id: s.id.clone(),
                        rows: s.table.len(),
                        anomalous: BTreeMap::new(),
                    },
                )
            })
            .collect();
        // later results overwrite earlier ones of the same kind
        for record in &state.results {
            if let Some(summary) = summaries.get_mut(&record.source_id) {
                summary
                    .anomalous
                    .insert(record.kind, record.series.anomalous_count());
            }
        }
        Ok(summaries.into_values().collect())
    }
}
