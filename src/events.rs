//! Registry notifications and the sinks that receive them.
//!
//! Notifications of a call are delivered only after the call has committed,
//! in the order the call produced them.

use crate::access::Role;
use crate::types::{Address, AgentUuid, TagId};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum RegistryEvent {
    AgentRegistered {
        uuid: AgentUuid,
        name: String,
        base_url: String,
        description: String,
        version: u64,
        onchain_address: Address,
    },
    AgentUpdated {
        uuid: AgentUuid,
        name: String,
        base_url: String,
        description: String,
        version: u64,
        onchain_address: Address,
    },
    AgentTagSet {
        id: TagId,
        text: String,
    },
    AgentTagUpdated {
        uuid: AgentUuid,
        id: TagId,
        text: String,
        active: bool,
    },
    RoleGranted {
        role: Role,
        account: Address,
        sender: Address,
    },
    RoleRevoked {
        role: Role,
        account: Address,
        sender: Address,
    },
    Initialized {
        admin: Address,
    },
    Upgraded {
        implementation: Address,
    },
}

impl RegistryEvent {
    pub fn name(&self) -> &'static str {
        match self {
            RegistryEvent::AgentRegistered { .. } => "AgentRegistered",
            RegistryEvent::AgentUpdated { .. } => "AgentUpdated",
            RegistryEvent::AgentTagSet { .. } => "AgentTagSet",
            RegistryEvent::AgentTagUpdated { .. } => "AgentTagUpdated",
            RegistryEvent::RoleGranted { .. } => "RoleGranted",
            RegistryEvent::RoleRevoked { .. } => "RoleRevoked",
            RegistryEvent::Initialized { .. } => "Initialized",
            RegistryEvent::Upgraded { .. } => "Upgraded",
        }
    }
}

/// Receiver of committed notifications
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &RegistryEvent);
}

/// Writes every notification as a structured tracing event
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn emit(&self, event: &RegistryEvent) {
        let Some(payload) = encode_payload(event.name(), event) else {
            return;
        };
        tracing::info!(
            target: "identity_registry::events",
            event = event.name(),
            payload = %payload,
            "Registry notification"
        );
    }
}

/// JSON payload of a notification; a serialization failure is logged and
/// yields None.
fn encode_payload<T: Serialize>(name: &str, value: &T) -> Option<String> {
    match serde_json::to_string(value) {
        Ok(payload) => Some(payload),
        Err(err) => {
            tracing::warn!(
                target: "identity_registry::events",
                event = name,
                error = %err,
                "Failed to serialize notification payload"
            );
            None
        }
    }
}

/// Keeps notifications in memory until drained
#[derive(Debug, Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<RegistryEvent>>,
}

impl RecordingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<RegistryEvent> {
        self.events.lock().clone()
    }

    pub fn take(&self) -> Vec<RegistryEvent> {
        std::mem::take(&mut *self.events.lock())
    }
}

impl EventSink for RecordingEventSink {
    fn emit(&self, event: &RegistryEvent) {
        self.events.lock().push(event.clone());
    }
}

/// Forwards each notification to every inner sink in order
#[derive(Default, Clone)]
pub struct FanoutEventSink {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl FanoutEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sinks.push(sink);
        self
    }
}

impl EventSink for FanoutEventSink {
    fn emit(&self, event: &RegistryEvent) {
        for sink in &self.sinks {
            sink.emit(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_sink_take_drains() {
        let sink = RecordingEventSink::new();
        sink.emit(&RegistryEvent::AgentTagSet {
            id: 1,
            text: "one".to_string(),
        });
        assert_eq!(sink.events().len(), 1);
        assert_eq!(sink.take().len(), 1);
        assert!(sink.events().is_empty());
    }

    #[test]
    fn test_fanout_reaches_every_sink() {
        let a = Arc::new(RecordingEventSink::new());
        let b = Arc::new(RecordingEventSink::new());
        let fanout = FanoutEventSink::new().with(a.clone()).with(b.clone());
        fanout.emit(&RegistryEvent::Initialized {
            admin: Address::from_low_u8(1),
        });
        assert_eq!(a.events(), b.events());
        assert_eq!(a.events().len(), 1);
    }

    struct Unserializable;

    impl Serialize for Unserializable {
        fn serialize<S: serde::Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("refused"))
        }
    }

    #[test]
    fn test_encode_payload() {
        let event = RegistryEvent::Initialized {
            admin: Address::from_low_u8(1),
        };
        let payload = encode_payload(event.name(), &event).unwrap();
        assert!(payload.contains("\"event\":\"Initialized\""));
        assert!(encode_payload("Broken", &Unserializable).is_none());
    }

    #[test]
    fn test_event_json_is_tagged() {
        let event = RegistryEvent::AgentTagUpdated {
            uuid: AgentUuid::from_u128(1),
            id: 2,
            text: "TagTwo".to_string(),
            active: true,
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["event"], "AgentTagUpdated");
        assert_eq!(value["text"], "TagTwo");
        assert_eq!(value["active"], true);
        assert_eq!(event.name(), "AgentTagUpdated");
    }
}
