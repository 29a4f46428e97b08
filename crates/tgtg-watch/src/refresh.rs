//! The refresh loop: fetch ∥ load previous → aggregate → diff → persist →
//! dispatch → sleep.

use std::time::Duration;

use async_trait::async_trait;
use tgtg_client::{ClientError, Discovery};
use tgtg_core::{aggregate, newly_available, DiscoverResults};
use tgtg_notify::Notifier;
use tokio::task::JoinHandle;

use crate::store::SnapshotStore;

/// Anything that can produce the next discovery payload.
#[async_trait]
pub trait DiscoverySource: Send {
    async fn fetch(&mut self) -> Result<DiscoverResults, ClientError>;
}

#[async_trait]
impl DiscoverySource for Discovery {
    async fn fetch(&mut self) -> Result<DiscoverResults, ClientError> {
        Discovery::fetch(self).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    pub items: usize,
    pub available: usize,
    pub transitions: usize,
    pub cold_start: bool,
}

pub struct Cycle {
    pub report: CycleReport,
    /// Background task enqueueing this cycle's notifications. The loop drops
    /// it; tests await it.
    pub dispatch: JoinHandle<()>,
}

/// Runs one cycle. The only error is a failed fetch; nothing is persisted
/// or notified in that case.
///
/// # Errors
///
/// Returns the [`ClientError`] from the discovery source.
pub async fn run_cycle<S>(
    source: &mut S,
    store: &SnapshotStore,
    notifier: &Notifier,
) -> Result<Cycle, ClientError>
where
    S: DiscoverySource + ?Sized,
{
    let (fetched, previous) = tokio::join!(source.fetch(), store.load());
    let current = aggregate(&fetched?);

    let cold_start = previous.is_none();
    let transitions = match &previous {
        Some(previous) => newly_available(previous, &current),
        None => Vec::new(),
    };

    if let Err(e) = store.save(&current).await {
        tracing::warn!(error = %e, "failed to persist snapshot");
    }

    let report = CycleReport {
        items: current.len(),
        available: current.available_count(),
        transitions: transitions.len(),
        cold_start,
    };

    let notifier = notifier.clone();
    let dispatch = tokio::spawn(async move {
        for item in &transitions {
            notifier.notify(item);
        }
    });

    Ok(Cycle { report, dispatch })
}

/// Repeats [`run_cycle`] every `period` until the upstream payload can no
/// longer be decoded.
///
/// # Errors
///
/// Returns the contract-breaking [`ClientError`] that stopped the loop.
/// Every other fetch failure is logged and retried next cycle.
pub async fn run_forever<S>(
    source: &mut S,
    store: &SnapshotStore,
    notifier: &Notifier,
    period: Duration,
) -> Result<(), ClientError>
where
    S: DiscoverySource + ?Sized,
{
    loop {
        tracing::info!("Refreshing results...");
        match run_cycle(source, store, notifier).await {
            Ok(cycle) => {
                let CycleReport {
                    items,
                    available,
                    transitions,
                    cold_start,
                } = cycle.report;
                tracing::info!(items, available, transitions, cold_start, "refresh complete");
                // Dispatch is fire-and-forget; the task finishes on its own.
                drop(cycle.dispatch);
            }
            Err(e) if e.is_contract_break() => {
                tracing::error!(error = %e, "discovery payload could not be decoded; stopping");
                return Err(e);
            }
            Err(e) => {
                tracing::error!(error = %e, "refresh failed");
            }
        }

        tracing::info!("Sleeping for {} minutes...", period.as_secs() / 60);
        tokio::time::sleep(period).await;
    }
}
