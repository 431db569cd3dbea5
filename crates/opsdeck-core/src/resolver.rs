//! The conversational state machine.
//!
//! Given a session rebuilt from the inbound turn, decide the single next
//! thing to do: ask the user for exactly one more parameter, or declare the
//! command ready to run. A setter that resolves a value deterministically
//! (including the single-candidate case) never consumes a turn — the user is
//! never asked to confirm an unambiguous value.

use crate::context::CommandContext;
use crate::error::{OpsError, Result};
use crate::param::{CommandSpec, ParameterSpec, SetterOutcome};
use crate::prompt::{PromptBody, PromptPayload};
use crate::session::Session;
use tracing::debug;

#[derive(Debug)]
pub enum Decision {
    /// Ask for one parameter; this turn is over and all state travels in the
    /// payload.
    Prompt(PromptPayload),
    /// Every parameter is known; run the command body exactly once.
    Proceed(Session),
}

pub async fn resolve_next(
    spec: &CommandSpec,
    mut session: Session,
    ctx: &CommandContext,
) -> Result<Decision> {
    for param in spec.ordered_params() {
        if session.is_set(&param.name) {
            continue;
        }

        if let Some(setter) = &param.setter {
            match setter.resolve(ctx, &session).await? {
                SetterOutcome::Value(value) => {
                    debug!(parameter = %param.name, "setter resolved value deterministically");
                    session.set(&param.name, value);
                    continue;
                }
                SetterOutcome::Choices(choices) if choices.is_empty() => {
                    return Err(OpsError::NoCandidates {
                        parameter: param.name.clone(),
                        detail: param.prompt.clone(),
                    });
                }
                SetterOutcome::Choices(mut choices) if choices.len() == 1 => {
                    let only = choices.remove(0);
                    debug!(parameter = %param.name, value = %only.value, "single candidate auto-applied");
                    session.set(&param.name, only.value);
                    continue;
                }
                SetterOutcome::Choices(choices) => {
                    return prompt(spec, &session, param, PromptBody::Select { choices })
                        .map(Decision::Prompt);
                }
            }
        }

        // No setter: the value has to be typed in.
        let hint = param.validation.as_ref().map(|v| v.hint.clone());
        return prompt(spec, &session, param, PromptBody::FreeText { hint })
            .map(Decision::Prompt);
    }

    Ok(Decision::Proceed(session))
}

fn prompt(
    spec: &CommandSpec,
    session: &Session,
    param: &ParameterSpec,
    body: PromptBody,
) -> Result<PromptPayload> {
    // Guarded invariant: prompting for a parameter the session already holds
    // would loop forever feeding back the same answer.
    if session.is_set(&param.name) {
        return Err(OpsError::AmbiguousState(format!(
            "parameter '{}' is both resolved and about to be prompted for",
            param.name
        )));
    }

    Ok(PromptPayload {
        text: param.prompt.clone(),
        parameter: param.name.clone(),
        body,
        callback: spec.id.clone(),
        carried: session.values().clone(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
