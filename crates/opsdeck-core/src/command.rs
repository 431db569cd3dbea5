//! Command registry and top-level dispatch.
//!
//! Commands register explicitly under their identity — a tagged map built
//! once at startup and read-only afterwards. `dispatch` is the single
//! top-level handler per invocation: it rebuilds the session from the inbound
//! turn, drives the resolver, runs the body once everything is known, and
//! converts any error into exactly one user-visible outcome. Nothing here
//! retries automatically.

use crate::context::CommandContext;
use crate::error::{OpsError, Result};
use crate::param::CommandSpec;
use crate::prompt::PromptPayload;
use crate::render::ProgressRenderer;
use crate::resolver::{resolve_next, Decision};
use crate::session::Session;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info};

// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

#[async_trait]
pub trait Command: Send + Sync {
    fn spec(&self) -> &CommandSpec;

    /// The command body. Runs exactly once per invocation, only after every
    /// declared parameter is resolved. Returns the success message shown to
    /// the user.
    async fn run(
        &self,
        ctx: &CommandContext,
        session: &Session,
        renderer: &dyn ProgressRenderer,
    ) -> Result<String>;
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct Registry {
    commands: HashMap<String, Arc<dyn Command>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, command: Arc<dyn Command>) -> Result<()> {
        let id = command.spec().id.clone();
        if self.commands.contains_key(&id) {
            return Err(OpsError::AmbiguousState(format!(
                "command '{id}' registered twice"
            )));
        }
        self.commands.insert(id, command);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<&Arc<dyn Command>> {
        self.commands
            .get(id)
            .ok_or_else(|| OpsError::UnknownCommand(id.to_string()))
    }

    /// Registered command ids with descriptions, sorted for stable listings.
    pub fn describe(&self) -> Vec<(String, String)> {
        let mut out: Vec<(String, String)> = self
            .commands
            .values()
            .map(|c| (c.spec().id.clone(), c.spec().description.clone()))
            .collect();
        out.sort();
        out
    }
}

// ---------------------------------------------------------------------------
// Reply / Outcome
// ---------------------------------------------------------------------------

/// What one conversational turn produces.
#[derive(Debug)]
pub enum Reply {
    /// Ask the user one question; state travels in the payload.
    Prompt(PromptPayload),
    /// The invocation finished, successfully or not.
    Done(Outcome),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub command: String,
    pub success: bool,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Handle one inbound turn. Every error — resolution or command body — is
/// caught here and becomes a single failed outcome; the invocation is never
/// reported twice and never crashes the process.
pub async fn dispatch(
    registry: &Registry,
    ctx: &CommandContext,
    renderer: &dyn ProgressRenderer,
) -> Reply {
    match dispatch_inner(registry, ctx, renderer).await {
        Ok(reply) => reply,
        Err(e) => {
            error!(command = %ctx.command, user = %ctx.user, "invocation failed: {e}");
            Reply::Done(Outcome {
                command: ctx.command.clone(),
                success: false,
                message: user_message(&e),
            })
        }
    }
}

async fn dispatch_inner(
    registry: &Registry,
    ctx: &CommandContext,
    renderer: &dyn ProgressRenderer,
) -> Result<Reply> {
    let command = registry.get(&ctx.command)?;
    let session = Session::hydrate(command.spec(), ctx)?;

    match resolve_next(command.spec(), session, ctx).await? {
        Decision::Prompt(payload) => Ok(Reply::Prompt(payload)),
        Decision::Proceed(session) => {
            info!(command = %ctx.command, user = %ctx.user, "all parameters resolved, running command");
            let message = command.run(ctx, &session, renderer).await?;
            Ok(Reply::Done(Outcome {
                command: ctx.command.clone(),
                success: true,
                message,
            }))
        }
    }
}

/// Guided messages for the user, never stack traces.
fn user_message(e: &OpsError) -> String {
    match e {
        OpsError::NoCandidates { parameter, detail } => format!(
            "There is nothing to select for '{parameter}' ({detail}). \
             Check that you have access to at least one option and try again."
        ),
        OpsError::Provisioning { task, detail } => {
            format!("Provisioning stopped at '{task}': {detail}")
        }
        OpsError::InvalidParameter { name, reason } => {
            format!("The value given for '{name}' is not valid: {reason}")
        }
        OpsError::UnknownCommand(id) => format!("'{id}' is not a known command."),
        other => format!("The command could not be completed: {other}"),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
