// Queue assembly.
//
// The builder accumulates the full configuration, `build()` validates it
// and constructs the engine in one shot; nothing is mutable after that and
// no task is spawned before validation has passed.

use std::sync::Arc;
use std::time::Duration;

use crate::application::engine::QueueEngine;
use crate::application::queue::QueueCore;
use crate::application::replenish::{PullReplenisher, ReplenishPolicy};
use crate::domain::{MessageContext, QueueSettings};
use crate::error::{QueueError, Result};
use crate::port::{
    FnMessageHandler, FnMessageSource, HandlerError, KeySelector, MessageComparer, MessageHandler,
    MessageSource,
};

/// Assembles a [`QueueEngine`].
///
/// With a source the engine is pull-style: a scheduled policy refills the
/// buffer from the source and an explicit key selector is required. Without
/// one it is push-style: the caller enqueues, the high-water mark becomes
/// the hard capacity bound, and keys default to generated ids.
pub struct QueueBuilder<M> {
    settings: QueueSettings,
    source: Option<(Arc<dyn MessageSource<M>>, Duration)>,
    handler: Option<Arc<dyn MessageHandler<M>>>,
    key_selector: Option<KeySelector<M>>,
    comparer: Option<MessageComparer<M>>,
}

impl<M> QueueBuilder<M>
where
    M: Clone + Send + Sync + 'static,
{
    pub fn new(settings: QueueSettings) -> Self {
        Self {
            settings,
            source: None,
            handler: None,
            key_selector: None,
            comparer: None,
        }
    }

    /// Pull from `source` every `poll_interval`.
    pub fn source(mut self, source: impl MessageSource<M> + 'static, poll_interval: Duration) -> Self {
        self.source = Some((Arc::new(source), poll_interval));
        self
    }

    /// Closure variant of [`QueueBuilder::source`].
    pub fn source_fn<F>(self, source: F, poll_interval: Duration) -> Self
    where
        F: Fn(usize) -> Vec<M> + Send + Sync + 'static,
    {
        self.source(FnMessageSource::new(source), poll_interval)
    }

    pub fn handler(mut self, handler: impl MessageHandler<M> + 'static) -> Self {
        self.handler = Some(Arc::new(handler));
        self
    }

    /// Closure variant of [`QueueBuilder::handler`].
    pub fn handler_fn<F>(self, handler: F) -> Self
    where
        F: Fn(MessageContext<M>) -> std::result::Result<(), HandlerError> + Send + Sync + 'static,
    {
        self.handler(FnMessageHandler::new(handler))
    }

    pub fn key_selector(mut self, key_selector: KeySelector<M>) -> Self {
        self.key_selector = Some(key_selector);
        self
    }

    /// Drop pulled candidates that compare equal to anything already queued
    /// or in flight.
    pub fn distinct_by<F>(mut self, comparer: F) -> Self
    where
        F: Fn(&M, &M) -> bool + Send + Sync + 'static,
    {
        self.comparer = Some(Arc::new(comparer));
        self
    }

    /// Validate the configuration and construct the engine.
    ///
    /// Fails fast - before any task is spawned - on zero settings, a
    /// missing handler, or a pull configuration without a key selector.
    pub fn build(self) -> Result<QueueEngine<M>> {
        self.settings.validate()?;
        let handler = self
            .handler
            .ok_or_else(|| QueueError::Config("message handler is required".to_string()))?;

        match self.source {
            Some((source, poll_interval)) => {
                let key_selector = self.key_selector.ok_or_else(|| {
                    QueueError::Config(
                        "pull queues require a key selector; use KeySelector::from_fn, \
                         ::identity or ::generated"
                            .to_string(),
                    )
                })?;
                // Pull buffers are unbounded: the policy already sizes its
                // batches against the high-water mark
                let core = Arc::new(QueueCore::new(None));
                let policy: Arc<dyn ReplenishPolicy> = Arc::new(PullReplenisher::new(
                    Arc::clone(&core),
                    source,
                    key_selector.clone(),
                    self.comparer,
                    self.settings.clone(),
                ));
                Ok(QueueEngine::new(
                    self.settings,
                    core,
                    handler,
                    key_selector,
                    Some((policy, poll_interval)),
                ))
            }
            None => {
                let key_selector = self.key_selector.unwrap_or_else(KeySelector::generated);
                let core = Arc::new(QueueCore::new(Some(self.settings.max_queued)));
                Ok(QueueEngine::new(
                    self.settings,
                    core,
                    handler,
                    key_selector,
                    None,
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MessageId;
    use crate::port::message_handler::mocks::RecordingHandler;
    use crate::port::message_source::mocks::CounterSource;

    fn keyed() -> KeySelector<usize> {
        KeySelector::from_fn(|n: &usize| MessageId::new(n.to_string()))
    }

    #[test]
    fn build_rejects_zero_settings() {
        let err = QueueBuilder::<usize>::new(QueueSettings::new(0, 10, 2))
            .handler(RecordingHandler::new())
            .build()
            .unwrap_err();
        assert!(matches!(err, QueueError::Domain(_)));
    }

    #[test]
    fn build_rejects_missing_handler() {
        let err = QueueBuilder::<usize>::new(QueueSettings::new(2, 10, 2))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("handler"));
    }

    #[test]
    fn pull_build_rejects_missing_key_selector() {
        let err = QueueBuilder::<usize>::new(QueueSettings::new(2, 10, 2))
            .source(CounterSource::new(), Duration::from_millis(10))
            .handler(RecordingHandler::new())
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("key selector"));
    }

    #[test]
    fn pull_build_succeeds_with_full_configuration() {
        let engine = QueueBuilder::new(QueueSettings::new(2, 10, 2))
            .source(CounterSource::new(), Duration::from_millis(10))
            .handler(RecordingHandler::new())
            .key_selector(keyed())
            .distinct_by(|a: &usize, b: &usize| a == b)
            .build()
            .unwrap();
        assert_eq!(engine.settings().worker_count, 2);
    }

    #[test]
    fn push_build_defaults_to_generated_keys() {
        let engine = QueueBuilder::<usize>::new(QueueSettings::new(1, 5, 1))
            .handler(RecordingHandler::new())
            .build()
            .unwrap();
        assert_eq!(engine.settings().max_queued, 5);
    }
}
