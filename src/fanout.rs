// File: fanout.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use crate::comparer::{ComparisonConfig, FactorComparer};
use crate::factor::Change;
use crate::rawresponse::ResponseModel;
use futures::future::join_all;
use log::{debug, info, warn};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

/// A candidate that differs from the baseline. `index` is the candidate's
/// position in the input, since results arrive in completion order.
#[derive(Debug, Clone)]
pub struct FanOutResult {
    pub index: usize,
    pub candidate: Arc<ResponseModel>,
    pub changes: Vec<Change>,
}

struct WorkUnit {
    index: usize,
    baseline: Arc<ResponseModel>,
    candidate: Arc<ResponseModel>,
    config: Arc<ComparisonConfig>,
}

/// Compares one baseline against many candidates on a pool of workers.
#[derive(Debug, Clone)]
pub struct FanOutComparer {
    concurrency: usize,
    config: ComparisonConfig,
}

impl FanOutComparer {
    /// One worker per logical core, default comparison config.
    pub fn new() -> Self {
        Self {
            concurrency: num_cpus::get().max(1),
            config: ComparisonConfig::default(),
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_config(mut self, config: ComparisonConfig) -> Self {
        self.config = config;
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn config(&self) -> &ComparisonConfig {
        &self.config
    }

    /// Returns the candidates with at least one change.
    ///
    /// Once `cancel` fires, workers and the collector stop at their next
    /// dequeue and whatever was collected so far is returned. Comparisons
    /// already running are not interrupted.
    pub async fn compare(
        &self,
        baseline: Arc<ResponseModel>,
        candidates: Vec<Arc<ResponseModel>>,
        cancel: CancellationToken,
    ) -> Vec<FanOutResult> {
        if candidates.is_empty() {
            return Vec::new();
        }

        let total = candidates.len();
        let config = Arc::new(self.config.clone());
        let (work_tx, work_rx) = mpsc::channel::<WorkUnit>(total);
        for (index, candidate) in candidates.into_iter().enumerate() {
            let unit = WorkUnit {
                index,
                baseline: Arc::clone(&baseline),
                candidate,
                config: Arc::clone(&config),
            };
            if work_tx.send(unit).await.is_err() {
                break;
            }
        }
        drop(work_tx);
        let work_rx = Arc::new(Mutex::new(work_rx));

        let (result_tx, result_rx) = mpsc::unbounded_channel::<FanOutResult>();
        let collector = tokio::spawn(collect(result_rx, cancel.clone()));

        debug!(
            "Comparing {} candidates with {} workers",
            total, self.concurrency
        );
        let workers: Vec<_> = (0..self.concurrency)
            .map(|id| {
                tokio::spawn(worker(
                    id,
                    Arc::clone(&work_rx),
                    result_tx.clone(),
                    cancel.clone(),
                ))
            })
            .collect();
        drop(result_tx);

        for joined in join_all(workers).await {
            if let Err(e) = joined {
                warn!("Comparison worker failed: {}", e);
            }
        }

        let results = match collector.await {
            Ok(results) => results,
            Err(e) => {
                warn!("Result collector failed: {}", e);
                Vec::new()
            }
        };
        if cancel.is_cancelled() {
            info!(
                "Comparison cancelled with {} of {} candidates reported",
                results.len(),
                total
            );
        } else {
            debug!("{} of {} candidates differ from baseline", results.len(), total);
        }
        results
    }
}

impl Default for FanOutComparer {
    fn default() -> Self {
        Self::new()
    }
}

async fn worker(
    id: usize,
    queue: Arc<Mutex<mpsc::Receiver<WorkUnit>>>,
    results: mpsc::UnboundedSender<FanOutResult>,
    cancel: CancellationToken,
) {
    loop {
        let unit = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            unit = next_unit(&queue) => unit,
        };
        let Some(unit) = unit else {
            break;
        };

        match FactorComparer::compare(Some(&unit.baseline), Some(&unit.candidate), &unit.config) {
            Ok(changes) if !changes.is_empty() => {
                let result = FanOutResult {
                    index: unit.index,
                    candidate: unit.candidate,
                    changes,
                };
                if results.send(result).is_err() {
                    break;
                }
            }
            Ok(_) => {}
            Err(e) => debug!("Worker {} skipped candidate {}: {}", id, unit.index, e),
        }
    }
}

async fn next_unit(queue: &Mutex<mpsc::Receiver<WorkUnit>>) -> Option<WorkUnit> {
    queue.lock().await.recv().await
}

async fn collect(
    mut results: mpsc::UnboundedReceiver<FanOutResult>,
    cancel: CancellationToken,
) -> Vec<FanOutResult> {
    let mut collected = Vec::new();
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            received = results.recv() => match received {
                Some(result) => collected.push(result),
                None => break,
            },
        }
    }
    collected
}
