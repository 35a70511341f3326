//! Batch dispatcher
//!
//! Runs the per-address pipeline (dedupe check, geocode, normalize, append)
//! over a fixed pool of workers fed from a channel. Every address is an
//! independent task; one failing row never affects another.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, info, warn, Instrument};

use crate::db::repository::AddressRepository;
use crate::services::geocoding::Geocoder;
use crate::services::normalizer::normalize;
use crate::types::{CleanedAddressRecord, GeocodeResult, RawAddress};

/// Outcome of processing one address
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    /// Target already holds the key; the geocoder was not called
    AlreadyProcessed,
    /// Matched and appended
    Saved,
    /// Matched but the append failed
    SaveFailed,
    /// Geocoder failed; a failure record was written (best-effort)
    GeocodeFailed { reason: String },
}

impl TaskOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TaskOutcome::AlreadyProcessed | TaskOutcome::Saved)
    }
}

impl fmt::Display for TaskOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskOutcome::AlreadyProcessed => write!(f, "Success: address has already been validated"),
            TaskOutcome::Saved => write!(f, "Success"),
            TaskOutcome::SaveFailed => write!(f, "Failure: could not save clean address"),
            TaskOutcome::GeocodeFailed { reason } => {
                write!(f, "Failure: did not retrieve clean address ({})", reason)
            }
        }
    }
}

/// Per-kind counts of a finished batch. Logged only; never changes the exit status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub saved: usize,
    pub already_processed: usize,
    pub save_failed: usize,
    pub geocode_failed: usize,
}

impl BatchSummary {
    fn record(&mut self, outcome: &TaskOutcome) {
        self.total += 1;
        match outcome {
            TaskOutcome::AlreadyProcessed => self.already_processed += 1,
            TaskOutcome::Saved => self.saved += 1,
            TaskOutcome::SaveFailed => self.save_failed += 1,
            TaskOutcome::GeocodeFailed { .. } => self.geocode_failed += 1,
        }
    }
}

/// Comma-joined line1, line2, city, state, zip with empty fields dropped
pub fn build_address_string(address: &RawAddress) -> String {
    [
        address.address_line_1.trim(),
        address.address_line_2.trim(),
        address.city.trim(),
        address.state.trim(),
        address.zip.trim(),
    ]
    .into_iter()
    .filter(|part| !part.is_empty())
    .collect::<Vec<_>>()
    .join(",")
}

/// Shared, read-only dependencies of every task
pub struct Dispatcher {
    repository: Arc<dyn AddressRepository>,
    geocoder: Arc<dyn Geocoder>,
    workers: usize,
}

impl Dispatcher {
    pub fn new(
        repository: Arc<dyn AddressRepository>,
        geocoder: Arc<dyn Geocoder>,
        workers: usize,
    ) -> Self {
        Self {
            repository,
            geocoder,
            workers: workers.max(1),
        }
    }

    /// Clean and save a single address.
    ///
    /// The membership check and the insert are separate statements, so two
    /// overlapping runs can both write the same key.
    pub async fn process_address(&self, address: &RawAddress) -> TaskOutcome {
        let address_string = build_address_string(address);

        if self.repository.is_processed(address.key).await {
            return TaskOutcome::AlreadyProcessed;
        }

        match self.geocoder.geocode(&address_string).await {
            GeocodeResult::Matched {
                result,
                status,
                match_count,
            } => {
                let normalized = normalize(&result.address_components);
                let record = CleanedAddressRecord::matched(
                    address,
                    &result,
                    &normalized,
                    &status,
                    match_count,
                    Utc::now(),
                );

                if self.repository.append_record(&record).await {
                    TaskOutcome::Saved
                } else {
                    TaskOutcome::SaveFailed
                }
            }
            GeocodeResult::Failed { reason } => {
                let record = CleanedAddressRecord::failed(address, &reason, Utc::now());
                if !self.repository.append_record(&record).await {
                    warn!("Could not record geocoding failure for address {}", address.key);
                }
                TaskOutcome::GeocodeFailed { reason }
            }
        }
    }

    /// Process every address on the worker pool and wait for all of them
    pub async fn run_batch(self: Arc<Self>, addresses: Vec<RawAddress>) -> BatchSummary {
        let total = addresses.len();
        // Never more workers than addresses
        let workers = self.workers.min(total).max(1);
        info!(
            "Dispatching {} addresses to {} workers using {} geocoder",
            total,
            workers,
            self.geocoder.name()
        );

        let (task_tx, task_rx) = mpsc::channel::<RawAddress>(workers * 2);
        let task_rx = Arc::new(Mutex::new(task_rx));
        let (outcome_tx, mut outcome_rx) = mpsc::unbounded_channel::<(i64, TaskOutcome)>();

        let mut handles = Vec::with_capacity(workers);
        for worker_id in 0..workers {
            let dispatcher = Arc::clone(&self);
            let task_rx = Arc::clone(&task_rx);
            let outcome_tx = outcome_tx.clone();

            handles.push(tokio::spawn(async move {
                loop {
                    // Lock is released before the task runs
                    let next = task_rx.lock().await.recv().await;
                    let Some(address) = next else { break };

                    let outcome = dispatcher.process_address(&address).await;
                    if outcome_tx.send((address.key, outcome)).is_err() {
                        break;
                    }
                }
                debug!("Worker {} finished", worker_id);
            }
            .in_current_span()));
        }
        drop(outcome_tx);

        for address in addresses {
            if task_tx.send(address).await.is_err() {
                error!("All workers stopped before the batch was queued");
                break;
            }
        }
        drop(task_tx);

        let mut summary = BatchSummary::default();
        while let Some((key, outcome)) = outcome_rx.recv().await {
            if outcome.is_success() {
                info!("Address {}: {}", key, outcome);
            } else {
                warn!("Address {}: {}", key, outcome);
            }
            summary.record(&outcome);
        }

        for handle in handles {
            if let Err(e) = handle.await {
                error!("Worker task failed: {}", e);
            }
        }

        info!(
            "Batch finished: {}/{} saved, {} already processed, {} geocode failures, {} save failures",
            summary.saved,
            total,
            summary.already_processed,
            summary.geocode_failed,
            summary.save_failed
        );

        summary
    }
}
