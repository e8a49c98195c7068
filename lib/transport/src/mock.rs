//! A scripted transport for tests.

use crate::call::{ApiCall, ApiResponse, Transport};
use crate::error::TransportError;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

type Handler = dyn Fn(&ApiCall, usize) -> Result<ApiResponse, TransportError> + Send + Sync;

/// A transport that answers every call with a caller-supplied function.
///
/// The function receives the call and its zero-based arrival index. Every
/// call is recorded, and the peak number of concurrent calls is tracked.
pub struct MockTransport {
    handler: Box<Handler>,
    latency: Duration,
    calls: Mutex<Vec<ApiCall>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl MockTransport {
    /// Creates a mock that answers with `handler`.
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&ApiCall, usize) -> Result<ApiResponse, TransportError> + Send + Sync + 'static,
    {
        Self {
            handler: Box::new(handler),
            latency: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
        }
    }

    /// Creates a mock that answers every call with the same response.
    #[must_use]
    pub fn always(response: ApiResponse) -> Self {
        Self::new(move |_, _| Ok(response.clone()))
    }

    /// Delays every answer, so overlapping calls become observable.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Returns every call received so far, in arrival order.
    pub fn calls(&self) -> Vec<ApiCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the number of calls received so far.
    pub fn call_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns the largest number of calls that were in flight at once.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn perform(&self, call: &ApiCall) -> Result<ApiResponse, TransportError> {
        let index = {
            let mut calls = self.calls.lock().unwrap_or_else(PoisonError::into_inner);
            calls.push(call.clone());
            calls.len() - 1
        };

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(current, Ordering::SeqCst);

        if self.latency.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(self.latency).await;
        }

        let result = (self.handler)(call, index);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}
