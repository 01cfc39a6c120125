//! Speech and signal delivery
//!
//! Speech and named events fan out to any number of subscribers in
//! subscription order; nobody listening to speech is fine. Focus and
//! defocus are different: the stage has to be somewhere, so each is a
//! single slot that must be filled before the signal is raised.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DialogError, DialogResult};

/// Signals that require exactly one subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FocusSignal {
    /// A conversation wants the stage
    Focus,
    /// A conversation gives the stage back
    Defocus,
}

impl std::fmt::Display for FocusSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FocusSignal::Focus => f.write_str("focus"),
            FocusSignal::Defocus => f.write_str("defocus"),
        }
    }
}

/// A line of dialog on its way to presentation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Speech {
    /// Conversation the line came from
    pub conversation: Option<String>,

    /// Node the line came from
    pub node: Option<String>,

    /// Speaker attribution
    pub who: String,

    /// The line itself
    pub text: String,

    /// When the line was emitted
    pub at: DateTime<Utc>,

    /// Presentation hints and custom properties
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Speech {
    /// Create a line of speech
    pub fn new(who: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            conversation: None,
            node: None,
            who: who.into(),
            text: text.into(),
            at: Utc::now(),
            metadata: HashMap::new(),
        }
    }

    /// Attribute the line to its source node
    pub fn with_source(
        mut self,
        conversation: impl Into<String>,
        node: impl Into<String>,
    ) -> Self {
        self.conversation = Some(conversation.into());
        self.node = Some(node.into());
        self
    }

    /// Attach a metadata property
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

/// Subscription handle for signal callbacks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriberId(pub Uuid);

impl SubscriberId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

/// Callback receiving emitted speech
pub type SpeechSubscriber = Box<dyn FnMut(&Speech) + Send>;

/// Callback receiving named events
pub type EventSubscriber = Box<dyn FnMut(&str) + Send>;

/// Callback receiving focus or defocus, with the conversation name
pub type FocusSubscriber = Box<dyn FnMut(&str) + Send>;

/// Delivery fan-out for speech, events, and focus signals
#[derive(Default)]
pub struct SignalHub {
    speech: Vec<(SubscriberId, SpeechSubscriber)>,
    events: Vec<(SubscriberId, EventSubscriber)>,
    focus: Option<FocusSubscriber>,
    defocus: Option<FocusSubscriber>,
}

impl SignalHub {
    /// Create a hub with no subscribers
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to emitted speech
    pub fn subscribe_speech(&mut self, subscriber: SpeechSubscriber) -> SubscriberId {
        let id = SubscriberId::new();
        self.speech.push((id, subscriber));
        id
    }

    /// Drop a speech subscription, reporting whether it existed
    pub fn unsubscribe_speech(&mut self, id: SubscriberId) -> bool {
        let before = self.speech.len();
        self.speech.retain(|(subscriber, _)| *subscriber != id);
        self.speech.len() < before
    }

    /// Subscribe to named events
    pub fn subscribe_events(&mut self, subscriber: EventSubscriber) -> SubscriberId {
        let id = SubscriberId::new();
        self.events.push((id, subscriber));
        id
    }

    /// Drop an event subscription, reporting whether it existed
    pub fn unsubscribe_events(&mut self, id: SubscriberId) -> bool {
        let before = self.events.len();
        self.events.retain(|(subscriber, _)| *subscriber != id);
        self.events.len() < before
    }

    /// Install the focus subscriber, replacing any previous one
    pub fn set_focus_subscriber(&mut self, subscriber: FocusSubscriber) {
        self.focus = Some(subscriber);
    }

    /// Install the defocus subscriber, replacing any previous one
    pub fn set_defocus_subscriber(&mut self, subscriber: FocusSubscriber) {
        self.defocus = Some(subscriber);
    }

    /// Deliver a line to every speech subscriber
    ///
    /// Nobody listening is not a fault; the line is logged and dropped.
    pub fn emit_speech(&mut self, speech: &Speech) {
        if self.speech.is_empty() {
            debug!(who = %speech.who, text = %speech.text, "speech emitted with no subscribers");
            return;
        }

        for (_, subscriber) in &mut self.speech {
            subscriber(speech);
        }
    }

    /// Deliver a named event to the generic subscribers, returning how many
    pub fn emit_event(&mut self, name: &str) -> usize {
        for (_, subscriber) in &mut self.events {
            subscriber(name);
        }
        self.events.len()
    }

    /// Raise the focus signal
    pub fn notify_focus(&mut self, conversation: &str) -> DialogResult<()> {
        match &mut self.focus {
            Some(subscriber) => {
                subscriber(conversation);
                Ok(())
            }
            None => Err(DialogError::MissingRequiredSubscriber {
                signal: FocusSignal::Focus,
            }),
        }
    }

    /// Raise the defocus signal
    pub fn notify_defocus(&mut self, conversation: &str) -> DialogResult<()> {
        match &mut self.defocus {
            Some(subscriber) => {
                subscriber(conversation);
                Ok(())
            }
            None => Err(DialogError::MissingRequiredSubscriber {
                signal: FocusSignal::Defocus,
            }),
        }
    }

    /// Number of speech subscribers
    pub fn speech_subscriber_count(&self) -> usize {
        self.speech.len()
    }

    /// Number of generic event subscribers
    pub fn event_subscriber_count(&self) -> usize {
        self.events.len()
    }

    /// Whether a focus subscriber is installed
    pub fn has_focus_subscriber(&self) -> bool {
        self.focus.is_some()
    }

    /// Whether a defocus subscriber is installed
    pub fn has_defocus_subscriber(&self) -> bool {
        self.defocus.is_some()
    }
}
