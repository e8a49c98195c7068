//! Batch sizing and correlation tracking.
//!
//! Both run synchronously before any request is dispatched, so a bad batch is
//! rejected as a whole without partial side effects.

use crate::error::ValidationError;
use crate::id::CorrelationId;
use std::collections::HashSet;

/// Splits `items` into consecutive groups of `size`, preserving order.
///
/// The last group may be shorter. An empty input yields no groups.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidChunkSize`] if `size` is zero.
pub fn chunk<T: Clone>(items: &[T], size: usize) -> Result<Vec<Vec<T>>, ValidationError> {
    if size == 0 {
        return Err(ValidationError::InvalidChunkSize { size });
    }
    Ok(items.chunks(size).map(<[T]>::to_vec).collect())
}

/// Tracks the correlation ids of one batch submission.
///
/// Create one tracker per submission; ids are only unique within it.
#[derive(Debug, Default)]
pub struct CorrelationTracker {
    seen: HashSet<CorrelationId>,
}

impl CorrelationTracker {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the declared id, or a freshly generated one, after recording it.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::DuplicateCorrelationId`] if the id was
    /// already recorded in this submission.
    pub fn ensure(
        &mut self,
        declared: Option<CorrelationId>,
    ) -> Result<CorrelationId, ValidationError> {
        let id = declared.unwrap_or_else(CorrelationId::generate);
        if !self.seen.insert(id.clone()) {
            return Err(ValidationError::DuplicateCorrelationId { id });
        }
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_preserves_order_and_sizes() {
        let items: Vec<u32> = (1..=7).collect();
        for size in 1..=9 {
            let groups = chunk(&items, size).unwrap();
            let flattened: Vec<u32> = groups.iter().flatten().copied().collect();
            assert_eq!(flattened, items, "size {size}");

            let (last, rest) = groups.split_last().unwrap();
            assert!(rest.iter().all(|g| g.len() == size), "size {size}");
            assert!(!last.is_empty() && last.len() <= size, "size {size}");
        }
    }

    #[test]
    fn chunk_of_empty_is_empty() {
        let empty: Vec<u32> = Vec::new();
        assert!(chunk(&empty, 3).unwrap().is_empty());
    }

    #[test]
    fn chunk_rejects_zero() {
        let err = chunk(&[1, 2, 3], 0).unwrap_err();
        assert_eq!(err, ValidationError::InvalidChunkSize { size: 0 });
    }

    #[test]
    fn tracker_keeps_declared_ids() {
        let mut tracker = CorrelationTracker::new();
        let id = tracker.ensure(Some(CorrelationId::from("a"))).unwrap();
        assert_eq!(id.as_str(), "a");
        assert!(tracker.ensure(Some(CorrelationId::from("a"))).is_err());
    }

    #[test]
    fn tracker_generates_missing_ids() {
        let mut tracker = CorrelationTracker::new();
        let first = tracker.ensure(None).unwrap();
        let second = tracker.ensure(None).unwrap();
        assert_ne!(first, second);
        assert!(tracker.ensure(Some(first)).is_err());
    }

    #[test]
    fn tracker_rejects_duplicates() {
        let mut tracker = CorrelationTracker::new();
        tracker.ensure(Some(CorrelationId::from("dup"))).unwrap();
        let err = tracker.ensure(Some(CorrelationId::from("dup"))).unwrap_err();
        assert_eq!(
            err,
            ValidationError::DuplicateCorrelationId {
                id: CorrelationId::from("dup")
            }
        );
    }
}
