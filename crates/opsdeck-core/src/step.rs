//! The provisioning step seam: what a task actually does.
//!
//! Steps are opaque to the runner. Because independent invocations may
//! provision overlapping resources concurrently and the core provides no
//! cross-invocation locking, a step must tolerate the resource it creates
//! already existing.

use crate::context::CommandContext;
use crate::error::Result;
use crate::session::Session;
use async_trait::async_trait;
use std::collections::BTreeMap;

/// Everything a step gets to see: the invoking identity and the fully
/// resolved parameter values of its command.
#[derive(Debug, Clone)]
pub struct StepContext {
    pub user: String,
    pub channel: String,
    pub params: BTreeMap<String, String>,
}

impl StepContext {
    pub fn new(
        user: impl Into<String>,
        channel: impl Into<String>,
        params: BTreeMap<String, String>,
    ) -> Self {
        Self {
            user: user.into(),
            channel: channel.into(),
            params,
        }
    }

    /// The context a command body hands its task list: invoking identity plus
    /// the fully resolved parameter values.
    pub fn for_invocation(ctx: &CommandContext, session: &Session) -> Self {
        Self {
            user: ctx.user.clone(),
            channel: ctx.channel.clone(),
            params: session.values().clone(),
        }
    }
}

#[async_trait]
pub trait ProvisioningStep: Send + Sync {
    async fn run(&self, ctx: &StepContext) -> Result<()>;
}
