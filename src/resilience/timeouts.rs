//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap every adapter call with its provider's deadline
//! - Cancel the call cleanly on timeout (the future is dropped)
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - A dispatcher-side timeout is reported exactly like an adapter-side one

use std::future::Future;
use std::time::Duration;

use crate::provider::AdapterError;

/// Run `call`, converting an elapsed deadline into `AdapterError::Timeout`.
pub async fn call_with_timeout<F, T>(timeout: Duration, call: F) -> Result<T, AdapterError>
where
    F: Future<Output = Result<T, AdapterError>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(AdapterError::Timeout),
    }
}
