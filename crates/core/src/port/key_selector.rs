// Key derivation strategies
// Chosen once at queue construction; there is no runtime type inspection.

use std::sync::Arc;

use crate::domain::MessageId;

/// Messages that carry their own identity.
pub trait Identified {
    fn message_id(&self) -> MessageId;
}

/// Derives a stable [`MessageId`] for a message.
///
/// Three strategies:
/// - [`KeySelector::identity`] for identity-bearing message types,
/// - [`KeySelector::from_fn`] for a caller-supplied derivation,
/// - [`KeySelector::generated`] for a fresh unique id per message
///   (push queues with no natural identity).
pub struct KeySelector<M> {
    select: Arc<dyn Fn(&M) -> MessageId + Send + Sync>,
}

impl<M> Clone for KeySelector<M> {
    fn clone(&self) -> Self {
        Self {
            select: Arc::clone(&self.select),
        }
    }
}

impl<M> KeySelector<M> {
    pub fn from_fn<F>(select: F) -> Self
    where
        F: Fn(&M) -> MessageId + Send + Sync + 'static,
    {
        Self {
            select: Arc::new(select),
        }
    }

    pub fn identity() -> Self
    where
        M: Identified,
    {
        Self::from_fn(|message: &M| message.message_id())
    }

    pub fn generated() -> Self {
        Self::from_fn(|_| MessageId::generate())
    }

    pub fn select(&self, message: &M) -> MessageId {
        (self.select)(message)
    }
}

impl<M> std::fmt::Debug for KeySelector<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("KeySelector")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Order {
        number: u64,
    }

    impl Identified for Order {
        fn message_id(&self) -> MessageId {
            MessageId::new(format!("order-{}", self.number))
        }
    }

    #[test]
    fn identity_uses_the_message_own_id() {
        let selector = KeySelector::<Order>::identity();
        let id = selector.select(&Order { number: 9 });
        assert_eq!(id.as_str(), "order-9");
    }

    #[test]
    fn from_fn_is_stable_for_equal_input() {
        let selector = KeySelector::from_fn(|n: &u32| MessageId::new(n.to_string()));
        assert_eq!(selector.select(&5), selector.select(&5));
        assert_ne!(selector.select(&5), selector.select(&6));
    }

    #[test]
    fn generated_is_fresh_every_time() {
        let selector = KeySelector::<u32>::generated();
        assert_ne!(selector.select(&5), selector.select(&5));
    }
}
