//! Broadcast bus for outward events.

use serde::Serialize;
use serde_json::Value;
use tokio::sync::broadcast;

/// Topic of the event emitted for every new block.
pub const NEW_BLOCK_TOPIC: &str = "chain.newBlock";

/// Event delivered to subscribers such as a UI.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChainEvent {
    pub topic: &'static str,
    /// Opaque block payload as pushed by the node.
    pub block: Value,
}

impl ChainEvent {
    pub fn new_block(block: Value) -> Self {
        Self {
            topic: NEW_BLOCK_TOPIC,
            block,
        }
    }
}

/// Fan-out of [`ChainEvent`]s to any number of subscribers.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ChainEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChainEvent> {
        self.tx.subscribe()
    }

    /// Publish an event; returns how many subscribers will see it.
    pub fn emit(&self, event: ChainEvent) -> usize {
        self.tx.send(event).unwrap_or(0)
    }
}
