// Message domain model

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque message identity token.
///
/// Equality is by underlying value; once created the id never changes.
/// Ids come from the application (identity-bearing messages), from a
/// caller-supplied key function, or from [`MessageId::generate`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MessageId(String);

impl MessageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh unique id (uuid v4, hyphen-less)
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// An `{id, message}` pair as buffered by the queue.
///
/// Owned exclusively by the queue core from enqueue until a worker removes
/// it from the in-flight registry.
#[derive(Debug, Clone)]
pub struct QueueEntry<M> {
    pub id: MessageId,
    pub message: M,
}

impl<M> QueueEntry<M> {
    pub fn new(id: MessageId, message: M) -> Self {
        Self { id, message }
    }
}

/// Read-only view of a message handed to the handler.
#[derive(Debug, Clone)]
pub struct MessageContext<M> {
    id: MessageId,
    message: M,
}

impl<M> MessageContext<M> {
    pub fn new(id: MessageId, message: M) -> Self {
        Self { id, message }
    }

    pub fn message_id(&self) -> &MessageId {
        &self.id
    }

    pub fn message(&self) -> &M {
        &self.message
    }

    /// Consume the context, yielding the message
    pub fn into_message(self) -> M {
        self.message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_id_equality_is_by_value() {
        assert_eq!(MessageId::new("abc"), MessageId::new("abc"));
        assert_ne!(MessageId::new("abc"), MessageId::new("abd"));
    }

    #[test]
    fn generated_ids_are_unique() {
        let a = MessageId::generate();
        let b = MessageId::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 32, "uuid simple format is 32 hex chars");
    }

    #[test]
    fn display_matches_underlying_value() {
        let id = MessageId::new("order-42");
        assert_eq!(id.to_string(), "order-42");
    }

    #[test]
    fn context_exposes_message_and_id() {
        let ctx = MessageContext::new(MessageId::new("m1"), 7u32);
        assert_eq!(ctx.message_id().as_str(), "m1");
        assert_eq!(*ctx.message(), 7);
        assert_eq!(ctx.into_message(), 7);
    }
}
