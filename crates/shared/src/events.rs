//! Event types published by the slot manager and the gallery controller.

use serde::{Deserialize, Serialize};

/// Slot lifecycle notifications for whatever renders the results grid
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlotEvent {
    /// A new batch replaced the previous one
    BatchStarted { slot_ids: Vec<String> },
    /// A slot (re)entered loading
    SlotLoading { slot_id: String },
    SlotSucceeded { slot_id: String },
    SlotFailed { slot_id: String, error: String },
    /// A completion arrived for a discarded slot or a superseded attempt
    StaleResultDropped { slot_id: String },
}

impl SlotEvent {
    pub fn slot_id(&self) -> Option<&str> {
        match self {
            SlotEvent::BatchStarted { .. } => None,
            SlotEvent::SlotLoading { slot_id } => Some(slot_id),
            SlotEvent::SlotSucceeded { slot_id } => Some(slot_id),
            SlotEvent::SlotFailed { slot_id, .. } => Some(slot_id),
            SlotEvent::StaleResultDropped { slot_id } => Some(slot_id),
        }
    }
}

/// Gallery change notifications; receivers refresh their view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GalleryEvent {
    Saved { id: String },
    Removed { id: String },
    /// Removed because its image could not be rendered
    CorruptRemoved { id: String },
}

impl GalleryEvent {
    pub fn id(&self) -> &str {
        match self {
            GalleryEvent::Saved { id } => id,
            GalleryEvent::Removed { id } => id,
            GalleryEvent::CorruptRemoved { id } => id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_event_ids() {
        let started = SlotEvent::BatchStarted {
            slot_ids: vec!["a".into()],
        };
        assert_eq!(started.slot_id(), None);

        let failed = SlotEvent::SlotFailed {
            slot_id: "b".into(),
            error: "quota".into(),
        };
        assert_eq!(failed.slot_id(), Some("b"));
    }

    #[test]
    fn test_gallery_event_id() {
        let event = GalleryEvent::CorruptRemoved { id: "x".into() };
        assert_eq!(event.id(), "x");
    }
}
