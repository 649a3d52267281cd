//! Isolated detector runs and batched dispatch.
//!
//! Every detector run happens on its own named worker thread over an
//! `Arc`-shared immutable table. The caller blocks on a one-shot channel
//! until the worker hands back its result; a worker that dies without
//! answering surfaces as [`Error::Worker`]. There is no cancellation.

use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

use mc_common::{Error, Result, ResultId, SourceId};
use mc_config::AnalysisConfig;
use tracing::{info, instrument};

use crate::detect::{self, DetectorKind, Report};
use crate::logging::{event_names, Stage};
use crate::store::ResultStore;
use crate::table::TimeSeriesTable;

/// Default number of concurrent detector workers.
pub const DEFAULT_MAX_WORKERS: usize = 4;

/// One detector invocation.
#[derive(Debug, Clone)]
pub struct DetectorJob {
    pub kind: DetectorKind,
    pub table: Arc<TimeSeriesTable>,
    pub config: Arc<AnalysisConfig>,
}

/// Run `job` on a dedicated worker thread and wait for its report.
pub fn run_isolated(job: DetectorJob) -> Result<Report> {
    let kind = job.kind;
    let (tx, rx) = mpsc::sync_channel(1);
    let handle = thread::Builder::new()
        .name(format!("mc-detect-{}", kind))
        .spawn(move || {
            let result = detect::run(job.kind, &job.table, &job.config);
            // the receiver only disappears if the caller is gone
            let _ = tx.send(result);
        })?;

    let received = rx.recv();
    if handle.join().is_err() {
        return Err(Error::Worker(format!("{} worker panicked", kind)));
    }
    received.map_err(|_| Error::Worker(format!("{} worker exited without a result", kind)))?
}

/// Outcome of one job of a batch.
#[derive(Debug)]
pub struct BatchOutcome {
    pub source_id: SourceId,
    pub kind: DetectorKind,
    pub result: Result<ResultId>,
}

/// Runs detectors for many sources, `max_workers` at a time.
#[derive(Debug, Clone)]
pub struct BatchRunner {
    pub max_workers: usize,
}

impl Default for BatchRunner {
    fn default() -> Self {
        BatchRunner {
            max_workers: DEFAULT_MAX_WORKERS,
        }
    }
}

impl BatchRunner {
    pub fn new(max_workers: usize) -> Self {
        BatchRunner {
            max_workers: max_workers.max(1),
        }
    }

    /// Run every `kind` over every source and append each report to `store`.
    ///
    /// Outcomes come back in job order: sources outermost, kinds innermost.
    #[instrument(skip_all, fields(sources = sources.len(), kinds = kinds.len()))]
    pub fn run(
        &self,
        store: &ResultStore,
        sources: &[SourceId],
        kinds: &[DetectorKind],
        config: &AnalysisConfig,
    ) -> Result<Vec<BatchOutcome>> {
        let config = Arc::new(config.clone());
        let mut jobs = Vec::with_capacity(sources.len() * kinds.len());
        for source_id in sources {
            let source = store
                .source(source_id)?
                .ok_or_else(|| Error::InvalidArgument(format!("unknown source {}", source_id)))?;
            for &kind in kinds {
                jobs.push((
                    source_id.clone(),
                    DetectorJob {
                        kind,
                        table: Arc::clone(&source.table),
                        config: Arc::clone(&config),
                    },
                ));
            }
        }

        info!(
            event = event_names::DETECT_STARTED,
            stage = %Stage::Detect,
            jobs = jobs.len(),
            max_workers = self.max_workers,
            "running detector batch"
        );

        let outcomes = jobs
            .chunks(self.max_workers.max(1))
            .flat_map(|chunk| {
                thread::scope(|s| {
                    let handles: Vec<_> = chunk
                        .iter()
                        .map(|(source_id, job)| {
                            let source_id = source_id.clone();
                            let job = job.clone();
                            s.spawn(move || {
                                let kind = job.kind;
                                let config = Arc::clone(&job.config);
                                let result = run_isolated(job).and_then(|report| {
                                    store.append_result(
                                        &source_id,
                                        kind,
                                        report.error().clone(),
                                        params(kind, &config, &report),
                                    )
                                });
                                BatchOutcome {
                                    source_id,
                                    kind,
                                    result,
                                }
                            })
                        })
                        .collect();

                    handles
                        .into_iter()
                        .zip(chunk)
                        .map(|(h, (source_id, job))| {
                            h.join().unwrap_or_else(|_| BatchOutcome {
                                source_id: source_id.clone(),
                                kind: job.kind,
                                result: Err(Error::Worker("batch thread panicked".to_string())),
                            })
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        Ok(outcomes)
    }
}

/// Options of the run merged with the report's own parameters.
fn params(kind: DetectorKind, config: &AnalysisConfig, report: &Report) -> serde_json::Value {
    let mut value = detect::options_for(kind, config);
    if let (serde_json::Value::Object(map), serde_json::Value::Object(extra)) = (&mut value, report.params()) {
        map.extend(extra);
    }
    value
}
