//! Per-provider concurrency limiting.
//!
//! # Responsibilities
//! - Bound the number of in-flight adapter calls per provider
//! - Hand out tickets that release their slot when dropped
//!
//! # Design Decisions
//! - Fail fast: a saturated limiter throttles instead of queueing
//! - Lock-free compare-and-swap on a single counter

use std::ops::Deref;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::provider::ProviderId;

/// In-flight call limit for one provider.
#[derive(Debug)]
pub struct ConcurrencyLimiter {
    provider: ProviderId,
    max_concurrent: usize,
    in_flight: AtomicUsize,
}

impl ConcurrencyLimiter {
    pub fn new(provider: ProviderId, max_concurrent: usize) -> Self {
        Self {
            provider,
            max_concurrent,
            in_flight: AtomicUsize::new(0),
        }
    }

    /// Try to take a slot. Returns `None` if the limit is already reached.
    pub fn try_acquire(self: &Arc<Self>) -> Option<ConcurrencyTicket> {
        let mut prev = self.in_flight.load(Ordering::Relaxed);
        loop {
            if prev >= self.max_concurrent {
                return None;
            }
            match self.in_flight.compare_exchange_weak(
                prev,
                prev + 1,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(x) => prev = x,
            }
        }
        Some(ConcurrencyTicket {
            limiter: self.clone(),
        })
    }

    pub fn provider(&self) -> ProviderId {
        self.provider
    }

    /// Number of tickets currently held.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// True when no further ticket can be acquired right now.
    pub fn is_saturated(&self) -> bool {
        self.in_flight() >= self.max_concurrent
    }

    fn release(&self) {
        self.in_flight.fetch_sub(1, Ordering::AcqRel);
    }
}

/// One acquired slot. Dropping it releases the slot exactly once.
#[derive(Debug)]
pub struct ConcurrencyTicket {
    limiter: Arc<ConcurrencyLimiter>,
}

impl Deref for ConcurrencyTicket {
    type Target = ConcurrencyLimiter;
    fn deref(&self) -> &Self::Target {
        &self.limiter
    }
}

impl Drop for ConcurrencyTicket {
    fn drop(&mut self) {
        self.limiter.release();
    }
}
