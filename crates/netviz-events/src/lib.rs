use crossbeam_channel::{Receiver, Sender, unbounded};
use netviz_core::{Attributes, EdgeId, VertexId};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    // ========================================================================
    // Selection (consumed by the info panel)
    // ========================================================================
    /// A vertex was picked; carries its full attribute mapping.
    VertexSelected {
        id: VertexId,
        attributes: Attributes,
    },
    /// An edge was picked; carries its full attribute mapping.
    EdgeSelected {
        id: EdgeId,
        source: VertexId,
        target: VertexId,
        attributes: Attributes,
    },

    // ========================================================================
    // Analysis results
    // ========================================================================
    ShortestPathFound {
        from: VertexId,
        to: VertexId,
        hops: usize,
    },
    /// Shortest-path query between vertices with no connecting path.
    NotConnected {
        from: VertexId,
        to: VertexId,
    },
    BottlenecksDetected {
        edges: Vec<EdgeId>,
    },

    // ========================================================================
    // Graph lifecycle
    // ========================================================================
    GraphLoaded {
        path: Option<PathBuf>,
        vertex_count: usize,
        edge_count: usize,
    },
    VertexAdded {
        id: VertexId,
    },
    VertexDeleted {
        id: VertexId,
    },
    EdgeAdded {
        id: EdgeId,
    },
    EdgeDeleted {
        id: EdgeId,
    },

    // Notifications
    ShowError {
        message: String,
    },
}

#[derive(Clone)]
pub struct EventBus {
    tx: Sender<Event>,
    rx: Receiver<Event>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx }
    }

    pub fn sender(&self) -> Sender<Event> {
        self.tx.clone()
    }

    pub fn receiver(&self) -> Receiver<Event> {
        self.rx.clone()
    }

    pub fn publish(&self, event: Event) {
        tracing::trace!(?event, "publishing canvas event");
        let _ = self.tx.send(event);
    }

    /// Dispatch all pending events to a listener.
    /// This is useful for processing events in the UI loop.
    pub fn dispatch_to<L: EventListener>(&self, listener: &mut L) {
        while let Ok(event) = self.rx.try_recv() {
            listener.handle_event(&event);
        }
    }

    /// Drain pending events without a listener.
    pub fn drain(&self) -> Vec<Event> {
        self.rx.try_iter().collect()
    }
}

/// Trait for components that respond to events.
/// Implement this to receive events from the EventBus.
pub trait EventListener {
    fn handle_event(&mut self, event: &Event);
}

#[cfg(test)]
mod tests {
    use super::*;
    use netviz_core::AttrValue;

    #[test]
    fn test_event_bus_publish_receive() {
        let bus = EventBus::new();
        let sender = bus.sender();
        let receiver = bus.receiver();

        let mut attributes = Attributes::new();
        attributes.insert("degree".into(), AttrValue::Int(3));
        let event = Event::VertexSelected {
            id: VertexId(7),
            attributes,
        };

        sender.send(event.clone()).unwrap();

        match receiver.recv().unwrap() {
            Event::VertexSelected { id, attributes } => {
                assert_eq!(id, VertexId(7));
                assert_eq!(attributes.get("degree"), Some(&AttrValue::Int(3)));
            }
            other => panic!("Expected VertexSelected event, got {:?}", other),
        }
    }

    struct Recorder {
        seen: Vec<Event>,
    }

    impl EventListener for Recorder {
        fn handle_event(&mut self, event: &Event) {
            self.seen.push(event.clone());
        }
    }

    #[test]
    fn test_dispatch_to_listener_drains_queue() {
        let bus = EventBus::new();
        bus.publish(Event::EdgeDeleted { id: EdgeId(1) });
        bus.publish(Event::NotConnected {
            from: VertexId(1),
            to: VertexId(2),
        });

        let mut recorder = Recorder { seen: Vec::new() };
        bus.dispatch_to(&mut recorder);

        assert_eq!(recorder.seen.len(), 2);
        assert!(bus.drain().is_empty());
    }

    #[test]
    fn test_event_serialization() {
        let event = Event::ShortestPathFound {
            from: VertexId(1),
            to: VertexId(4),
            hops: 3,
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
