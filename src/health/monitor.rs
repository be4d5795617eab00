//! Periodic health sampling.
//!
//! # Responsibilities
//! - Sample system health on a fixed interval
//! - Publish per-provider health gauges
//! - Log when the overall status changes

use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time;

use crate::health::aggregator::{HealthAggregator, HealthStatus};
use crate::observability::metrics;

pub struct HealthMonitor {
    aggregator: HealthAggregator,
    interval: Duration,
}

impl HealthMonitor {
    pub fn new(aggregator: HealthAggregator, interval: Duration) -> Self {
        Self {
            aggregator,
            interval,
        }
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(interval_secs = self.interval.as_secs(), "AI health monitor starting");

        let mut ticker = time::interval(self.interval);
        let mut last: Option<HealthStatus> = None;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    last = Some(self.sample(last));
                }
                _ = shutdown.recv() => {
                    tracing::info!("AI health monitor received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    /// Take one sample; returns the overall status.
    pub fn sample(&self, previous: Option<HealthStatus>) -> HealthStatus {
        let report = self.aggregator.system_health();
        for (provider, status) in &report.per_provider {
            metrics::record_provider_health(*provider, *status);
        }

        match (previous, report.overall) {
            (Some(prev), now) if prev == now => {
                tracing::debug!(overall = now.as_str(), "AI health unchanged");
            }
            (_, HealthStatus::Healthy) => {
                tracing::info!(overall = "healthy", "AI health status");
            }
            (_, now) => {
                tracing::warn!(
                    overall = now.as_str(),
                    providers = ?report.per_provider,
                    "AI health status"
                );
            }
        }
        report.overall
    }
}
