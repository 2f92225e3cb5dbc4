//! Topic-based event bus implementation.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast;

use super::types::{DebugEvent, DialogueEvent, DiscoveryEvent, MotionEvent, WorldEvent};

/// Topics for event routing
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Topic {
    /// Inventory, tags, scene changes, sequences
    World,
    /// Dialogue lifecycle and typewriter progress
    Dialogue,
    /// Walk starts and arrivals
    Motion,
    /// Clue discovery effect phases
    Discovery,
    /// Debug log lines
    Debug,
}

impl Topic {
    pub const ALL: [Topic; 5] = [
        Topic::World,
        Topic::Dialogue,
        Topic::Motion,
        Topic::Discovery,
        Topic::Debug,
    ];
}

/// Event wrapper that carries the topic and typed event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    World(WorldEvent),
    Dialogue(DialogueEvent),
    Motion(MotionEvent),
    Discovery(DiscoveryEvent),
    Debug(DebugEvent),
}

impl Event {
    pub fn topic(&self) -> Topic {
        match self {
            Event::World(_) => Topic::World,
            Event::Dialogue(_) => Topic::Dialogue,
            Event::Motion(_) => Topic::Motion,
            Event::Discovery(_) => Topic::Discovery,
            Event::Debug(_) => Topic::Debug,
        }
    }
}

/// Topic-based event bus
///
/// Allows consumers to subscribe to specific topics and only receive
/// events they care about. Channels are created up front for every topic.
pub struct EventBus {
    channels: Arc<HashMap<Topic, broadcast::Sender<Event>>>,
}

impl EventBus {
    /// Creates a new event bus with default capacity for each topic
    pub fn new() -> Self {
        Self::with_capacity(256)
    }

    /// Creates a new event bus with specified capacity per topic
    pub fn with_capacity(capacity: usize) -> Self {
        let channels = Topic::ALL
            .iter()
            .map(|&topic| (topic, broadcast::channel(capacity.max(1)).0))
            .collect();

        Self {
            channels: Arc::new(channels),
        }
    }

    /// Publish an event to its corresponding topic
    pub fn publish(&self, event: impl Into<Event>) {
        let event = event.into();
        let topic = event.topic();

        if let Some(tx) = self.channels.get(&topic)
            && tx.send(event).is_err()
        {
            // No subscribers for this topic - this is normal, not an error
            tracing::trace!("No subscribers for topic {:?}", topic);
        }
    }

    /// Subscribe to a specific topic
    ///
    /// Returns a receiver that will only receive events for that topic.
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        match self.channels.get(&topic) {
            Some(tx) => tx.subscribe(),
            // Unreachable with the fixed topic set; a closed receiver is harmless.
            None => broadcast::channel(1).1,
        }
    }

    /// Subscribe to multiple topics
    ///
    /// Returns receivers for each requested topic.
    pub fn subscribe_multiple(&self, topics: &[Topic]) -> HashMap<Topic, broadcast::Receiver<Event>> {
        topics
            .iter()
            .map(|&topic| (topic, self.subscribe(topic)))
            .collect()
    }
}

impl Clone for EventBus {
    fn clone(&self) -> Self {
        Self {
            channels: Arc::clone(&self.channels),
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
