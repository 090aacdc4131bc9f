// Message Source Port
// Abstraction over wherever messages come from (database, broker, API, ...)

use async_trait::async_trait;
use thiserror::Error;

/// Failure pulling messages from the source.
///
/// The replenisher catches these, logs them and ends the cycle; the next
/// scheduled cycle proceeds independently.
#[derive(Error, Debug)]
#[error("{message}")]
pub struct SourceError {
    message: String,
}

impl SourceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Where the queue pulls its work from.
///
/// `get_list` may return fewer messages than requested; an empty vec means
/// "nothing available right now".
#[async_trait]
pub trait MessageSource<M>: Send + Sync {
    async fn get_list(&self, count: usize) -> Result<Vec<M>, SourceError>;
}

// Lets callers hand the builder a shared source and keep observing it.
#[async_trait]
impl<M, T> MessageSource<M> for std::sync::Arc<T>
where
    M: Send + 'static,
    T: MessageSource<M> + ?Sized,
{
    async fn get_list(&self, count: usize) -> Result<Vec<M>, SourceError> {
        (**self).get_list(count).await
    }
}

/// Adapter turning a plain closure into a [`MessageSource`].
pub struct FnMessageSource<F> {
    source: F,
}

impl<F> FnMessageSource<F> {
    pub fn new(source: F) -> Self {
        Self { source }
    }
}

#[async_trait]
impl<M, F> MessageSource<M> for FnMessageSource<F>
where
    M: Send + 'static,
    F: Fn(usize) -> Vec<M> + Send + Sync,
{
    async fn get_list(&self, count: usize) -> Result<Vec<M>, SourceError> {
        Ok((self.source)(count))
    }
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Serves pre-baked batches in order, then empty batches forever.
    /// Records how many times `get_list` was called and with what counts.
    pub struct BatchSource<M> {
        batches: Mutex<std::collections::VecDeque<Vec<M>>>,
        requested: Mutex<Vec<usize>>,
    }

    impl<M> BatchSource<M> {
        pub fn new(batches: Vec<Vec<M>>) -> Self {
            Self {
                batches: Mutex::new(batches.into_iter().collect()),
                requested: Mutex::new(Vec::new()),
            }
        }

        /// Counts requested per call, in call order
        pub fn requested(&self) -> Vec<usize> {
            self.requested.lock().unwrap().clone()
        }

        pub fn call_count(&self) -> usize {
            self.requested.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl<M: Send + 'static> MessageSource<M> for BatchSource<M> {
        async fn get_list(&self, count: usize) -> Result<Vec<M>, SourceError> {
            self.requested.lock().unwrap().push(count);
            Ok(self
                .batches
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_default())
        }
    }

    /// Unbounded increasing integer sequence; honors the requested count.
    #[derive(Default)]
    pub struct CounterSource {
        next: AtomicUsize,
    }

    impl CounterSource {
        pub fn new() -> Self {
            Self::default()
        }

        /// Total messages produced so far
        pub fn produced(&self) -> usize {
            self.next.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl MessageSource<usize> for CounterSource {
        async fn get_list(&self, count: usize) -> Result<Vec<usize>, SourceError> {
            let start = self.next.fetch_add(count, Ordering::SeqCst);
            Ok((start..start + count).collect())
        }
    }

    /// Always fails; optionally records call counts.
    #[derive(Default)]
    pub struct FailingSource {
        calls: AtomicUsize,
    }

    impl FailingSource {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl<M: Send + 'static> MessageSource<M> for FailingSource {
        async fn get_list(&self, _count: usize) -> Result<Vec<M>, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(SourceError::new("source unavailable"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mocks::*;
    use super::*;

    #[tokio::test]
    async fn fn_source_forwards_count() {
        let source = FnMessageSource::new(|count| vec![0u32; count]);
        let batch = source.get_list(3).await.unwrap();
        assert_eq!(batch.len(), 3);
    }

    #[tokio::test]
    async fn batch_source_drains_then_serves_empty() {
        let source = BatchSource::new(vec![vec![1, 2], vec![3]]);
        assert_eq!(source.get_list(10).await.unwrap(), vec![1, 2]);
        assert_eq!(source.get_list(10).await.unwrap(), vec![3]);
        assert!(source.get_list(10).await.unwrap().is_empty());
        assert_eq!(source.requested(), vec![10, 10, 10]);
    }

    #[tokio::test]
    async fn counter_source_is_strictly_increasing() {
        let source = CounterSource::new();
        let a = source.get_list(4).await.unwrap();
        let b = source.get_list(2).await.unwrap();
        assert_eq!(a, vec![0, 1, 2, 3]);
        assert_eq!(b, vec![4, 5]);
        assert_eq!(source.produced(), 6);
    }
}
