//! Generated conversation events
//!
//! Events are immutable once minted. Their JSON shape is what the text
//! generator produces and what travels inside a responder history line.

use crate::EventId;
use serde::{Deserialize, Serialize};

/// Category tag of an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Ordinary chit-chat between actors
    #[default]
    Chat,
    /// Reaction to something that happened in the world
    Event,
    /// Inner monologue, nobody addressed
    Thought,
    /// Line typed by the human player
    User,
    /// Anything the generator could not classify
    Other,
}

/// A generated event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Identity, equal on every participant
    pub id: EventId,
    /// Event this one answers; [`EventId::ROOT`] for a root event
    #[serde(default)]
    pub parent_id: EventId,
    /// Category tag
    #[serde(default)]
    pub kind: EventKind,
    /// Speaker's display name
    #[serde(default)]
    pub name: String,
    /// Free-form payload text
    #[serde(default)]
    pub text: String,
    /// Optional interaction keyword attached by the generator
    #[serde(rename = "act", default, skip_serializing_if = "Option::is_none")]
    pub interaction: Option<String>,
    /// Optional addressee name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

impl Event {
    /// Create a root event
    pub fn new(id: EventId, kind: EventKind, name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id,
            parent_id: EventId::ROOT,
            kind,
            name: name.into(),
            text: text.into(),
            interaction: None,
            target: None,
        }
    }

    /// Attach a parent event
    pub fn replying_to(mut self, parent: EventId) -> Self {
        self.parent_id = parent;
        self
    }

    /// Attach an addressee
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Attach an interaction keyword
    pub fn with_interaction(mut self, interaction: impl Into<String>) -> Self {
        self.interaction = Some(interaction.into());
        self
    }

    /// Whether this event answers another one
    pub fn is_reply(&self) -> bool {
        !self.parent_id.is_root()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply() {
        let root = Event::new(EventId::random(), EventKind::Chat, "Ada", "Hello");
        assert!(!root.is_reply());

        let reply = Event::new(EventId::random(), EventKind::Chat, "Bob", "Hi").replying_to(root.id);
        assert!(reply.is_reply());
        assert_eq!(reply.parent_id, root.id);
    }

    #[test]
    fn test_json_shape() {
        let event = Event::new(EventId::from_bytes([2; 16]), EventKind::Thought, "Ada", "Hm.")
            .with_interaction("Chat");
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["kind"], "thought");
        assert_eq!(json["act"], "Chat");
        assert_eq!(json["parentId"], EventId::ROOT.to_string());
        assert!(json.get("target").is_none());
    }

    #[test]
    fn test_json_defaults() {
        let id = EventId::from_bytes([3; 16]);
        let event: Event = serde_json::from_str(&format!(r#"{{"id":"{}","text":"hey"}}"#, id)).unwrap();
        assert_eq!(event.id, id);
        assert_eq!(event.kind, EventKind::Chat);
        assert!(!event.is_reply());
        assert_eq!(event.name, "");
    }
}
