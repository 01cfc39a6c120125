//! Built-in node kinds
//!
//! Three reference kinds cover the shapes most conversations are made of:
//! an entry marker that starts the chain, a timed line of speech, and a
//! listener that waits for a named event. Hosts register further kinds
//! through the kind registry.

use serde::{Deserialize, Serialize};

use crate::nodes::{DialogNode, ListeningState, NodeCommand, NodeCore};
use crate::signals::Speech;

/// Payload for [`EntryNode`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntryPayload {
    /// Node activated when the entry hands off
    #[serde(default)]
    pub next: Option<String>,
}

/// Conversation start marker
///
/// Starting a conversation activates its entry node. The entry stays on
/// for one tick, then hands off to `next`, or ends the conversation when
/// there is nothing to hand off to.
#[derive(Debug)]
pub struct EntryNode {
    core: NodeCore,
    next: Option<String>,
}

impl EntryNode {
    /// Kind tag this node registers under
    pub const KIND: &'static str = "entry";

    /// Build from a core and payload
    pub fn new(core: NodeCore, payload: EntryPayload) -> Self {
        Self {
            core,
            next: payload.next,
        }
    }
}

impl DialogNode for EntryNode {
    fn core(&self) -> &NodeCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut NodeCore {
        &mut self.core
    }

    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn is_entry(&self) -> bool {
        true
    }

    fn activate(&mut self) -> Vec<NodeCommand> {
        self.core.is_on = true;
        Vec::new()
    }

    fn tick(&mut self, _dt: f32) -> Vec<NodeCommand> {
        self.core.is_on = false;
        match &self.next {
            Some(next) => vec![NodeCommand::Activate(next.clone())],
            None => vec![NodeCommand::EndConversation],
        }
    }
}

/// Payload for [`LineNode`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinePayload {
    /// Speaker attribution
    #[serde(default)]
    pub who: String,

    /// The line itself
    #[serde(default)]
    pub text: String,

    /// Seconds the line stays up before handing off
    #[serde(default)]
    pub duration: f32,

    /// Node activated once the line has run its course
    #[serde(default)]
    pub next: Option<String>,
}

/// A spoken line with a dwell time
///
/// Activation emits the line as speech and starts the clock. Once
/// `duration` seconds have accumulated the node hands off to `next`, or
/// ends the conversation. A zero duration hands off on the first tick.
#[derive(Debug)]
pub struct LineNode {
    core: NodeCore,
    who: String,
    text: String,
    duration: f32,
    next: Option<String>,
    elapsed: f32,
}

impl LineNode {
    /// Kind tag this node registers under
    pub const KIND: &'static str = "line";

    /// Build from a core and payload
    pub fn new(core: NodeCore, payload: LinePayload) -> Self {
        Self {
            core,
            who: payload.who,
            text: payload.text,
            duration: payload.duration,
            next: payload.next,
            elapsed: 0.0,
        }
    }
}

impl DialogNode for LineNode {
    fn core(&self) -> &NodeCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut NodeCore {
        &mut self.core
    }

    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn activate(&mut self) -> Vec<NodeCommand> {
        self.core.is_on = true;
        self.elapsed = 0.0;
        let speech = Speech::new(&self.who, &self.text)
            .with_source(&self.core.conversation, &self.core.name);
        vec![NodeCommand::Speak(speech)]
    }

    fn tick(&mut self, dt: f32) -> Vec<NodeCommand> {
        self.elapsed += dt;
        if self.elapsed < self.duration {
            return Vec::new();
        }

        self.core.is_on = false;
        match &self.next {
            Some(next) => vec![NodeCommand::Activate(next.clone())],
            None => vec![NodeCommand::EndConversation],
        }
    }
}

/// Payload for [`ListenNode`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListenPayload {
    /// Event name to react to
    #[serde(default)]
    pub event: String,

    /// Scope grouping for bulk cancellation
    #[serde(default)]
    pub scope: Option<String>,

    /// Node activated when the event fires
    #[serde(default)]
    pub then: Option<String>,

    /// Arm at creation instead of waiting for activation
    #[serde(default)]
    pub armed: bool,
}

/// Waits for a named event
///
/// Reacts at most once per arming: the event disarms the node before
/// anything else happens. With a `then` target the node hands off and
/// turns itself off; without one it stays as it was, dormant.
#[derive(Debug)]
pub struct ListenNode {
    core: NodeCore,
    listening: ListeningState,
    then: Option<String>,
}

impl ListenNode {
    /// Kind tag this node registers under
    pub const KIND: &'static str = "listen";

    /// Build from a core and payload
    pub fn new(core: NodeCore, payload: ListenPayload) -> Self {
        let mut listening = ListeningState::new(payload.event, payload.scope);
        if payload.armed {
            listening.arm();
        }

        Self {
            core,
            listening,
            then: payload.then,
        }
    }
}

impl DialogNode for ListenNode {
    fn core(&self) -> &NodeCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut NodeCore {
        &mut self.core
    }

    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn listening(&self) -> Option<&ListeningState> {
        Some(&self.listening)
    }

    fn listening_mut(&mut self) -> Option<&mut ListeningState> {
        Some(&mut self.listening)
    }

    fn activate(&mut self) -> Vec<NodeCommand> {
        self.core.is_on = true;
        self.listening.arm();
        Vec::new()
    }

    fn deactivate(&mut self) {
        self.core.is_on = false;
        self.listening.disarm();
    }

    fn on_event(&mut self) -> Vec<NodeCommand> {
        self.listening.disarm();
        match &self.then {
            Some(then) => {
                self.core.is_on = false;
                vec![NodeCommand::Activate(then.clone())]
            }
            None => Vec::new(),
        }
    }
}
