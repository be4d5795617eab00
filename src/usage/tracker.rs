//! Usage sinks.
//!
//! # Responsibilities
//! - Retain the most recent attempt records in arrival order
//! - Maintain per-provider totals over every record ever seen
//!
//! # Design Decisions
//! - The record log is a bounded ring: the oldest record is evicted once
//!   `retention` is reached, totals keep counting

use dashmap::DashMap;
use serde::Serialize;
use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use thiserror::Error;
use uuid::Uuid;

use crate::provider::ProviderId;
use crate::usage::types::{AttemptOutcome, AttemptRecord};

/// Records kept by `UsageTracker::new`.
pub const DEFAULT_RETENTION: usize = 10_000;

/// Failure to persist a usage record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UsageError {
    #[error("usage sink unavailable: {0}")]
    Unavailable(String),
}

/// Destination for attempt records.
pub trait UsageSink: Send + Sync {
    fn record(&self, record: AttemptRecord) -> Result<(), UsageError>;
}

/// Sink used when usage tracking is disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopUsageSink;

impl UsageSink for NoopUsageSink {
    fn record(&self, _record: AttemptRecord) -> Result<(), UsageError> {
        Ok(())
    }
}

/// Aggregated usage for one provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProviderUsage {
    pub attempts: u64,
    pub successes: u64,
    pub failures: u64,
    /// Attempts skipped by the breaker or the limiter.
    pub skipped: u64,
    pub total_tokens: u64,
    pub estimated_cost: f64,
}

/// Usage totals across providers.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UsageSummary {
    /// Every record seen, including evicted ones.
    pub total_records: usize,
    /// Records still held in the log.
    pub retained_records: usize,
    pub providers: BTreeMap<ProviderId, ProviderUsage>,
}

/// In-memory usage log keeping the most recent `retention` records.
#[derive(Debug)]
pub struct UsageTracker {
    records: Mutex<VecDeque<AttemptRecord>>,
    totals: DashMap<ProviderId, ProviderUsage>,
    recorded: AtomicUsize,
    retention: usize,
}

impl UsageTracker {
    pub fn new() -> Self {
        Self::with_retention(DEFAULT_RETENTION)
    }

    /// Keep at most `retention` records; totals are unaffected.
    pub fn with_retention(retention: usize) -> Self {
        Self {
            records: Mutex::new(VecDeque::with_capacity(retention.min(1024))),
            totals: DashMap::new(),
            recorded: AtomicUsize::new(0),
            retention,
        }
    }

    pub fn retention(&self) -> usize {
        self.retention
    }

    /// Retained records, oldest first.
    pub fn records(&self) -> Vec<AttemptRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    /// Retained records of one logical request, in attempt order.
    pub fn records_for(&self, request_id: Uuid) -> Vec<AttemptRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|r| r.request_id == request_id)
            .cloned()
            .collect()
    }

    /// Number of retained records.
    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn summary(&self) -> UsageSummary {
        UsageSummary {
            total_records: self.recorded.load(Ordering::Relaxed),
            retained_records: self.len(),
            providers: self
                .totals
                .iter()
                .map(|entry| (*entry.key(), entry.value().clone()))
                .collect(),
        }
    }
}

impl Default for UsageTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl UsageSink for UsageTracker {
    fn record(&self, record: AttemptRecord) -> Result<(), UsageError> {
        {
            let mut totals = self.totals.entry(record.provider).or_default();
            totals.attempts += 1;
            match record.outcome {
                AttemptOutcome::Success => totals.successes += 1,
                AttemptOutcome::Throttled | AttemptOutcome::Unavailable => totals.skipped += 1,
                _ => totals.failures += 1,
            }
            if let Some(tokens) = record.tokens {
                totals.total_tokens += u64::from(tokens.total());
            }
            if let Some(cost) = record.estimated_cost {
                totals.estimated_cost += cost;
            }
        }
        self.recorded.fetch_add(1, Ordering::Relaxed);

        if self.retention == 0 {
            return Ok(());
        }
        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        if records.len() >= self.retention {
            records.pop_front();
        }
        records.push_back(record);
        Ok(())
    }
}
