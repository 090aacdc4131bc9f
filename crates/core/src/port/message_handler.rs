// Message Handler Port
// The application's processing logic, invoked once per dequeued message

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::MessageContext;

/// Failure processing a single message.
///
/// The worker logs these (with the failing message's id) and moves on; the
/// message is not retried or requeued.
#[derive(Error, Debug)]
#[error("{message}")]
pub struct HandlerError {
    message: String,
}

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Processes one message. Success is `Ok(())`; anything else is logged by
/// the worker and the message is dropped.
#[async_trait]
pub trait MessageHandler<M>: Send + Sync {
    async fn handle(&self, context: MessageContext<M>) -> Result<(), HandlerError>;
}

// Lets callers hand the builder a shared handler and keep observing it.
#[async_trait]
impl<M, T> MessageHandler<M> for std::sync::Arc<T>
where
    M: Send + 'static,
    T: MessageHandler<M> + ?Sized,
{
    async fn handle(&self, context: MessageContext<M>) -> Result<(), HandlerError> {
        (**self).handle(context).await
    }
}

/// Adapter turning a plain closure into a [`MessageHandler`].
pub struct FnMessageHandler<F> {
    handler: F,
}

impl<F> FnMessageHandler<F> {
    pub fn new(handler: F) -> Self {
        Self { handler }
    }
}

#[async_trait]
impl<M, F> MessageHandler<M> for FnMessageHandler<F>
where
    M: Send + 'static,
    F: Fn(MessageContext<M>) -> Result<(), HandlerError> + Send + Sync,
{
    async fn handle(&self, context: MessageContext<M>) -> Result<(), HandlerError> {
        (self.handler)(context)
    }
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::domain::MessageId;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Records every handled message id, with an optional artificial delay.
    pub struct RecordingHandler {
        handled: Mutex<Vec<MessageId>>,
        delay: Option<Duration>,
    }

    impl RecordingHandler {
        pub fn new() -> Self {
            Self {
                handled: Mutex::new(Vec::new()),
                delay: None,
            }
        }

        pub fn with_delay(delay: Duration) -> Self {
            Self {
                handled: Mutex::new(Vec::new()),
                delay: Some(delay),
            }
        }

        pub fn handled(&self) -> Vec<MessageId> {
            self.handled.lock().unwrap().clone()
        }

        pub fn handled_count(&self) -> usize {
            self.handled.lock().unwrap().len()
        }
    }

    impl Default for RecordingHandler {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl<M: Send + 'static> MessageHandler<M> for RecordingHandler {
        async fn handle(&self, context: MessageContext<M>) -> Result<(), HandlerError> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.handled.lock().unwrap().push(context.message_id().clone());
            Ok(())
        }
    }

    /// Fails every message, recording the ids it saw.
    pub struct FailingHandler {
        seen: Mutex<Vec<MessageId>>,
    }

    impl FailingHandler {
        pub fn new() -> Self {
            Self {
                seen: Mutex::new(Vec::new()),
            }
        }

        pub fn seen(&self) -> Vec<MessageId> {
            self.seen.lock().unwrap().clone()
        }

        pub fn seen_count(&self) -> usize {
            self.seen.lock().unwrap().len()
        }
    }

    impl Default for FailingHandler {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl<M: Send + 'static> MessageHandler<M> for FailingHandler {
        async fn handle(&self, context: MessageContext<M>) -> Result<(), HandlerError> {
            self.seen.lock().unwrap().push(context.message_id().clone());
            Err(HandlerError::new("handler rejected message"))
        }
    }

    /// Panics on every message. Used to prove worker panic isolation.
    pub struct PanickingHandler;

    #[async_trait]
    impl<M: Send + 'static> MessageHandler<M> for PanickingHandler {
        async fn handle(&self, context: MessageContext<M>) -> Result<(), HandlerError> {
            panic!("handler panic for message {}", context.message_id());
        }
    }

    /// Blocks every message until `release` is called; lets tests hold
    /// messages in the in-flight registry deterministically.
    pub struct GatedHandler {
        gate: Arc<tokio::sync::Notify>,
        released: Arc<AtomicBool>,
        handled: Mutex<Vec<MessageId>>,
    }

    impl GatedHandler {
        pub fn new() -> Self {
            Self {
                gate: Arc::new(tokio::sync::Notify::new()),
                released: Arc::new(AtomicBool::new(false)),
                handled: Mutex::new(Vec::new()),
            }
        }

        /// Let all current and future messages through
        pub fn release(&self) {
            self.released.store(true, Ordering::SeqCst);
            self.gate.notify_waiters();
        }

        pub fn handled(&self) -> Vec<MessageId> {
            self.handled.lock().unwrap().clone()
        }

        pub fn handled_count(&self) -> usize {
            self.handled.lock().unwrap().len()
        }
    }

    impl Default for GatedHandler {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl<M: Send + 'static> MessageHandler<M> for GatedHandler {
        async fn handle(&self, context: MessageContext<M>) -> Result<(), HandlerError> {
            while !self.released.load(Ordering::SeqCst) {
                let open = self.gate.notified();
                if self.released.load(Ordering::SeqCst) {
                    break;
                }
                open.await;
            }
            self.handled.lock().unwrap().push(context.message_id().clone());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mocks::*;
    use super::*;
    use crate::domain::MessageId;

    #[tokio::test]
    async fn fn_handler_runs_closure() {
        let handler = FnMessageHandler::new(|ctx: MessageContext<u32>| {
            if *ctx.message() == 0 {
                Err(HandlerError::new("zero is not a message"))
            } else {
                Ok(())
            }
        });
        assert!(handler
            .handle(MessageContext::new(MessageId::new("a"), 1))
            .await
            .is_ok());
        assert!(handler
            .handle(MessageContext::new(MessageId::new("b"), 0))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn recording_handler_keeps_order() {
        let handler = RecordingHandler::new();
        for name in ["m1", "m2", "m3"] {
            MessageHandler::<u8>::handle(&handler, MessageContext::new(MessageId::new(name), 0))
                .await
                .unwrap();
        }
        let ids: Vec<String> = handler.handled().iter().map(|i| i.to_string()).collect();
        assert_eq!(ids, vec!["m1", "m2", "m3"]);
    }

    #[tokio::test]
    async fn gated_handler_blocks_until_released() {
        use std::sync::Arc;
        let handler = Arc::new(GatedHandler::new());
        let h = Arc::clone(&handler);
        let join = tokio::spawn(async move {
            MessageHandler::<u8>::handle(&*h, MessageContext::new(MessageId::new("g1"), 0)).await
        });

        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert_eq!(handler.handled_count(), 0, "still gated");

        handler.release();
        join.await.unwrap().unwrap();
        assert_eq!(handler.handled_count(), 1);
    }
}
