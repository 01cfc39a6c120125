//! Host-registered expressions and functions
//!
//! Scripts refer to host behavior by name: expressions answer a boolean,
//! functions run for their side effects. Both registries overwrite on
//! re-registration and remember first-registration order so listings
//! come out the same on every run.

use std::collections::HashMap;

use tracing::debug;

use crate::error::{DialogError, DialogResult};

/// Which registry a callable belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallableKind {
    /// Boolean expression
    Expression,
    /// Void function
    Function,
}

impl std::fmt::Display for CallableKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CallableKind::Expression => f.write_str("expression"),
            CallableKind::Function => f.write_str("function"),
        }
    }
}

/// Host closure evaluating to a boolean
pub type HostExpression = Box<dyn FnMut(&[String]) -> bool + Send>;

/// Host closure invoked for its side effects
pub type HostFunction = Box<dyn FnMut(&[String]) + Send>;

/// A registered expression
///
/// `IsActive` is a marker the runner answers from its own state; every
/// other expression is a host closure.
pub enum Expression {
    /// Host-supplied closure
    Host(HostExpression),
    /// Built-in conversation-activity check
    IsActive,
}

/// Name-keyed expressions and functions
#[derive(Default)]
pub struct CallableRegistry {
    expressions: HashMap<String, Expression>,
    expression_order: Vec<String>,
    functions: HashMap<String, HostFunction>,
    function_order: Vec<String>,
}

impl CallableRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an expression, replacing any previous one under the name
    pub fn register_expression(&mut self, name: impl Into<String>, expression: Expression) {
        let name = name.into();
        if !self.expressions.contains_key(&name) {
            self.expression_order.push(name.clone());
        }
        debug!(name = %name, "expression registered");
        self.expressions.insert(name, expression);
    }

    /// Register a function, replacing any previous one under the name
    pub fn register_function(&mut self, name: impl Into<String>, function: HostFunction) {
        let name = name.into();
        if !self.functions.contains_key(&name) {
            self.function_order.push(name.clone());
        }
        debug!(name = %name, "function registered");
        self.functions.insert(name, function);
    }

    /// Look up an expression for evaluation
    pub fn expression_mut(&mut self, name: &str) -> DialogResult<&mut Expression> {
        self.expressions
            .get_mut(name)
            .ok_or_else(|| DialogError::UnregisteredCallable {
                kind: CallableKind::Expression,
                name: name.to_string(),
            })
    }

    /// Invoke a function with its arguments
    pub fn call_function(&mut self, name: &str, args: &[String]) -> DialogResult<()> {
        let function =
            self.functions
                .get_mut(name)
                .ok_or_else(|| DialogError::UnregisteredCallable {
                    kind: CallableKind::Function,
                    name: name.to_string(),
                })?;

        function(args);
        Ok(())
    }

    /// Registered expression names, in first-registration order
    pub fn expression_names(&self) -> String {
        self.expression_order.join(", ")
    }

    /// Registered function names, in first-registration order
    pub fn function_names(&self) -> String {
        self.function_order.join(", ")
    }

    /// Whether an expression is registered under the name
    pub fn has_expression(&self, name: &str) -> bool {
        self.expressions.contains_key(name)
    }

    /// Whether a function is registered under the name
    pub fn has_function(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }
}
