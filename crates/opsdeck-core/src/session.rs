//! The per-invocation record of which parameters are known.
//!
//! A Session has no lifetime of its own: it is rebuilt on every turn from the
//! literal contents of the inbound request — identity-mapped parameters plus
//! whatever the user answered, all of which travelled inside the previous
//! prompt's payload. Unset is the *absence* of a key; the empty string is a
//! perfectly valid value and must never be treated as "ask again".

use crate::context::CommandContext;
use crate::error::Result;
use crate::param::{CommandSpec, ContextSource};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub command: String,
    values: BTreeMap<String, String>,
}

impl Session {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            values: BTreeMap::new(),
        }
    }

    /// Rebuild the Session for one turn: validate and absorb every inbound
    /// value the command declares, then map identity-derived parameters from
    /// the context. Inbound values the command never declared are dropped.
    pub fn hydrate(spec: &CommandSpec, ctx: &CommandContext) -> Result<Self> {
        let mut session = Session::new(spec.id.clone());

        for param in spec.params() {
            if let Some(value) = ctx.values.get(&param.name) {
                param.validate(value)?;
                session.set(&param.name, value.clone());
            }
        }

        for param in spec.params() {
            if session.is_set(&param.name) {
                continue;
            }
            match param.context {
                Some(ContextSource::User) => session.set(&param.name, ctx.user.clone()),
                Some(ContextSource::Channel) => session.set(&param.name, ctx.channel.clone()),
                None => {}
            }
        }

        Ok(session)
    }

    pub fn is_set(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Fetch a parameter the resolver has guaranteed to be present.
    /// Missing means the invariant broke, not user error.
    pub fn require(&self, name: &str) -> Result<&str> {
        self.get(name).ok_or_else(|| {
            crate::OpsError::AmbiguousState(format!(
                "command '{}' ran with parameter '{name}' unset",
                self.command
            ))
        })
    }

    pub fn set(&mut self, name: &str, value: String) {
        self.values.insert(name.to_string(), value);
    }

    /// Everything known so far, for round-tripping inside a prompt payload.
    pub fn values(&self) -> &BTreeMap<String, String> {
        &self.values
    }
}
