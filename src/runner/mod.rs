//! Engine facade
//!
//! [`DialogRunner`] owns the node store, the backing table, the
//! registries, and the signal hub. Hosts create nodes from blueprints,
//! drive conversations through the lifecycle operations, advance time
//! with `update`, and register the expressions and functions their
//! scripts refer to.

mod lifecycle;
mod update;

use tracing::{debug, info, warn};

use crate::callables::{CallableRegistry, Expression};
use crate::error::DialogResult;
use crate::listeners::ListenerRegistry;
use crate::loader::ScriptLoader;
use crate::nodes::factory::{NodeBlueprint, NodeConstructor, NodeKindRegistry};
use crate::nodes::{Language, NodeCore};
use crate::signals::{SignalHub, Speech, SubscriberId};
use crate::store::{MemoryNodeTable, NodeStore, NodeTable, RowId};

/// Name of the built-in conversation-activity expression
pub const IS_ACTIVE: &str = "IsActive";

/// Conversation reserved for scripts run as functions
pub const COMMAND_CONVERSATION: &str = "__command__";

/// The dialog engine
pub struct DialogRunner {
    nodes: NodeStore,
    table: Box<dyn NodeTable>,
    kinds: NodeKindRegistry,
    listeners: ListenerRegistry,
    callables: CallableRegistry,
    hub: SignalHub,
    language: Language,
}

impl Default for DialogRunner {
    fn default() -> Self {
        Self::new(Box::new(MemoryNodeTable::new()))
    }
}

impl DialogRunner {
    /// Create a runner over a backing table
    ///
    /// The built-in node kinds and the `IsActive` expression come
    /// pre-registered.
    pub fn new(table: Box<dyn NodeTable>) -> Self {
        let mut callables = CallableRegistry::new();
        callables.register_expression(IS_ACTIVE, Expression::IsActive);

        Self {
            nodes: NodeStore::new(),
            table,
            kinds: NodeKindRegistry::with_builtin_kinds(),
            listeners: ListenerRegistry::new(),
            callables,
            hub: SignalHub::new(),
            language: Language::default(),
        }
    }

    /// Builder-style language override
    pub fn with_language(mut self, language: impl Into<Language>) -> Self {
        self.language = language.into();
        self
    }

    /// Set the language scoping every later lookup
    pub fn set_language(&mut self, language: impl Into<Language>) {
        self.language = language.into();
        debug!(language = %self.language, "language switched");
    }

    /// Language currently scoping lookups
    pub fn language(&self) -> &Language {
        &self.language
    }

    /// Live node read access
    pub fn nodes(&self) -> &NodeStore {
        &self.nodes
    }

    /// Listener bookkeeping read access
    pub fn listeners(&self) -> &ListenerRegistry {
        &self.listeners
    }

    /// Backing table read access
    pub fn table(&self) -> &dyn NodeTable {
        self.table.as_ref()
    }

    /// Register a node kind constructor
    pub fn register_node_kind(&mut self, kind: impl Into<String>, constructor: NodeConstructor) {
        self.kinds.register(kind, constructor);
    }

    /// Create a node from a blueprint, returning its backing row
    ///
    /// The row is created first and removed again if construction or
    /// insertion fails. A node that reports a listening state is
    /// registered with the listener bookkeeping here, once.
    pub fn create_node(&mut self, blueprint: NodeBlueprint) -> DialogResult<RowId> {
        let row = self.table.create_row(&blueprint.kind);
        let core = NodeCore::new(
            blueprint.conversation,
            blueprint.name,
            blueprint.language,
            row,
        );

        let node = match self.kinds.construct(core, &blueprint.kind, &blueprint.payload) {
            Ok(node) => node,
            Err(error) => {
                self.table.remove_row(row);
                return Err(error);
            }
        };

        let conversation = node.core().conversation.clone();
        let name = node.core().name.clone();
        let listener = node.listening().map(|listening| listening.handle);

        if let Err(error) = self.nodes.insert(node) {
            self.table.remove_row(row);
            return Err(error);
        }

        if let Some(handle) = listener {
            self.listeners.register(conversation.clone(), handle, row);
        }

        debug!(conversation = %conversation, node = %name, row = %row, "node created");
        Ok(row)
    }

    /// Create a batch of nodes, stopping at the first failure
    pub fn bootstrap(
        &mut self,
        blueprints: impl IntoIterator<Item = NodeBlueprint>,
    ) -> DialogResult<Vec<RowId>> {
        let mut rows = Vec::new();
        for blueprint in blueprints {
            rows.push(self.create_node(blueprint)?);
        }
        Ok(rows)
    }

    /// Register a boolean expression under a name
    pub fn register_expression(
        &mut self,
        name: impl Into<String>,
        expression: impl FnMut(&[String]) -> bool + Send + 'static,
    ) {
        self.callables
            .register_expression(name, Expression::Host(Box::new(expression)));
    }

    /// Register a void function under a name
    pub fn register_function(
        &mut self,
        name: impl Into<String>,
        function: impl FnMut(&[String]) + Send + 'static,
    ) {
        self.callables.register_function(name, Box::new(function));
    }

    /// Evaluate a registered expression
    ///
    /// `IsActive` takes the conversation as its first argument and
    /// answers whether that conversation has an active node for the
    /// current language. A missing argument reads as false.
    pub fn evaluate_expression(&mut self, name: &str, args: &[String]) -> DialogResult<bool> {
        match self.callables.expression_mut(name)? {
            Expression::Host(expression) => Ok(expression(args)),
            Expression::IsActive => {
                let Some(conversation) = args.first() else {
                    warn!("IsActive evaluated without a conversation argument");
                    return Ok(false);
                };
                Ok(self
                    .nodes
                    .active_in_conversation(conversation, &self.language)
                    .is_some())
            }
        }
    }

    /// Invoke a registered function
    pub fn call_function(&mut self, name: &str, args: &[String]) -> DialogResult<()> {
        self.callables.call_function(name, args)
    }

    /// Registered expression names, in first-registration order
    pub fn expression_names(&self) -> String {
        self.callables.expression_names()
    }

    /// Registered function names, in first-registration order
    pub fn function_names(&self) -> String {
        self.callables.function_names()
    }

    /// Subscribe to emitted speech
    pub fn subscribe_speech(
        &mut self,
        subscriber: impl FnMut(&Speech) + Send + 'static,
    ) -> SubscriberId {
        self.hub.subscribe_speech(Box::new(subscriber))
    }

    /// Drop a speech subscription, reporting whether it existed
    pub fn unsubscribe_speech(&mut self, id: SubscriberId) -> bool {
        self.hub.unsubscribe_speech(id)
    }

    /// Subscribe to named events
    pub fn subscribe_events(
        &mut self,
        subscriber: impl FnMut(&str) + Send + 'static,
    ) -> SubscriberId {
        self.hub.subscribe_events(Box::new(subscriber))
    }

    /// Drop an event subscription, reporting whether it existed
    pub fn unsubscribe_events(&mut self, id: SubscriberId) -> bool {
        self.hub.unsubscribe_events(id)
    }

    /// Install the focus subscriber, replacing any previous one
    pub fn set_focus_subscriber(&mut self, subscriber: impl FnMut(&str) + Send + 'static) {
        self.hub.set_focus_subscriber(Box::new(subscriber));
    }

    /// Install the defocus subscriber, replacing any previous one
    pub fn set_defocus_subscriber(&mut self, subscriber: impl FnMut(&str) + Send + 'static) {
        self.hub.set_defocus_subscriber(Box::new(subscriber));
    }

    /// Run a script source as a one-shot function
    ///
    /// The loader populates the reserved command conversation from the
    /// source; the conversation is then started like any other.
    /// Leftovers from an earlier call are removed first.
    pub fn run_string_as_function(
        &mut self,
        loader: &dyn ScriptLoader,
        source: &str,
    ) -> DialogResult<()> {
        if self.nodes.has_conversation(COMMAND_CONVERSATION) {
            self.remove_conversation(COMMAND_CONVERSATION)?;
        }

        loader.load(source, COMMAND_CONVERSATION, self)?;
        info!(bytes = source.len(), "command script loaded");
        self.start_conversation(COMMAND_CONVERSATION)
    }
}
