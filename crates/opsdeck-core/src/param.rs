//! Per-command parameter declarations and the setter seam.
//!
//! Each command declares its parameters once, as data: what to ask, in which
//! order, and (optionally) a setter that can resolve the value by querying a
//! directory. Setters are pure lookups — they never mutate external state.

use crate::context::CommandContext;
use crate::error::Result;
use crate::prompt::Choice;
use crate::session::Session;
use async_trait::async_trait;
use regex::Regex;
use std::fmt;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// ParameterSetter
// ---------------------------------------------------------------------------

/// What a setter learned about one parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetterOutcome {
    /// Resolved deterministically; no turn is consumed.
    Value(String),
    /// Candidates for the user to pick from. Zero candidates is an error at
    /// the resolver, never an empty menu; exactly one is auto-applied.
    Choices(Vec<Choice>),
}

#[async_trait]
pub trait ParameterSetter: Send + Sync {
    async fn resolve(&self, ctx: &CommandContext, session: &Session) -> Result<SetterOutcome>;
}

// ---------------------------------------------------------------------------
// ParameterSpec
// ---------------------------------------------------------------------------

/// Identity fields a parameter can be mapped from instead of being asked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextSource {
    User,
    Channel,
}

#[derive(Clone)]
pub struct Validation {
    pub pattern: Regex,
    pub hint: String,
}

/// One required input of a command. Immutable once declared.
#[derive(Clone)]
pub struct ParameterSpec {
    pub name: String,
    /// Text shown when this parameter has to be asked for.
    pub prompt: String,
    /// Lower values are asked first; ties break by declaration order.
    pub order: u32,
    /// Mapped from the invoking identity rather than asked.
    pub context: Option<ContextSource>,
    pub validation: Option<Validation>,
    pub setter: Option<Arc<dyn ParameterSetter>>,
}

impl ParameterSpec {
    pub fn new(name: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prompt: prompt.into(),
            order: 0,
            context: None,
            validation: None,
            setter: None,
        }
    }

    pub fn order(mut self, order: u32) -> Self {
        self.order = order;
        self
    }

    pub fn from_context(mut self, source: ContextSource) -> Self {
        self.context = Some(source);
        self
    }

    pub fn setter(mut self, setter: Arc<dyn ParameterSetter>) -> Self {
        self.setter = Some(setter);
        self
    }

    pub fn validated(mut self, pattern: &str, hint: impl Into<String>) -> Result<Self> {
        let pattern = Regex::new(pattern).map_err(|e| crate::OpsError::AmbiguousState(
            format!("invalid validation pattern for '{}': {e}", self.name),
        ))?;
        self.validation = Some(Validation {
            pattern,
            hint: hint.into(),
        });
        Ok(self)
    }

    /// Check a user-supplied value against this parameter's validation rule.
    pub fn validate(&self, value: &str) -> Result<()> {
        if let Some(validation) = &self.validation {
            if !validation.pattern.is_match(value) {
                return Err(crate::OpsError::InvalidParameter {
                    name: self.name.clone(),
                    reason: validation.hint.clone(),
                });
            }
        }
        Ok(())
    }
}

impl fmt::Debug for ParameterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParameterSpec")
            .field("name", &self.name)
            .field("order", &self.order)
            .field("context", &self.context)
            .field("has_setter", &self.setter.is_some())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// CommandSpec
// ---------------------------------------------------------------------------

/// A command's identity plus its full parameter declaration.
#[derive(Clone)]
pub struct CommandSpec {
    pub id: String,
    pub description: String,
    params: Vec<ParameterSpec>,
}

impl CommandSpec {
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            params: Vec::new(),
        }
    }

    pub fn param(mut self, spec: ParameterSpec) -> Self {
        self.params.push(spec);
        self
    }

    /// Parameters in resolution order: ascending `order`, declaration order
    /// within equal values (the sort is stable).
    pub fn ordered_params(&self) -> Vec<&ParameterSpec> {
        let mut params: Vec<&ParameterSpec> = self.params.iter().collect();
        params.sort_by_key(|p| p.order);
        params
    }

    pub fn params(&self) -> &[ParameterSpec] {
        &self.params
    }

    pub fn find(&self, name: &str) -> Option<&ParameterSpec> {
        self.params.iter().find(|p| p.name == name)
    }
}

impl fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandSpec")
            .field("id", &self.id)
            .field("params", &self.params)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
