//! Bounded concurrent dispatch.
//!
//! Every orchestrator funnels its calls through [`dispatch_bounded`], so the
//! concurrency limit and the abort-on-fatal rule live in one place.

use crate::error::FgaError;
use futures::stream::{self, StreamExt};
use std::future::Future;

/// Runs `task` over every item with at most `limit` futures in flight.
///
/// Results come back in input order regardless of completion order. The
/// first `Err` stops dispatch and is returned; futures still in flight are
/// dropped. Tasks report recoverable failures inside `T`.
pub(crate) async fn dispatch_bounded<I, T, F, Fut>(
    items: Vec<I>,
    limit: usize,
    task: F,
) -> Result<Vec<T>, FgaError>
where
    F: Fn(I) -> Fut,
    Fut: Future<Output = Result<T, FgaError>>,
{
    let total = items.len();
    let mut slots: Vec<Option<T>> = std::iter::repeat_with(|| None).take(total).collect();

    let mut pending = stream::iter(items.into_iter().enumerate())
        .map(|(index, item)| {
            let fut = task(item);
            async move { (index, fut.await) }
        })
        .buffer_unordered(limit.max(1));

    while let Some((index, outcome)) = pending.next().await {
        slots[index] = Some(outcome?);
    }

    Ok(slots.into_iter().flatten().collect())
}
