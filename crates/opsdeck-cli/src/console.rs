//! Terminal rendering and the interactive conversation loop.
//!
//! The console stands in for the chat surface: prompts are printed, answers
//! are read from stdin, and the carried payload of each prompt is fed back
//! into the next turn exactly as a chat client would round-trip it.

use anyhow::{bail, Context as _};
use async_trait::async_trait;
use opsdeck_core::command::{dispatch, Outcome, Registry, Reply};
use opsdeck_core::context::CommandContext;
use opsdeck_core::prompt::PromptBody;
use opsdeck_core::render::{MessageHandle, ProgressRenderer};
use opsdeck_core::task::{TaskListSnapshot, TaskStatus};
use std::io::{self, BufRead, Write};

// ---------------------------------------------------------------------------
// ConsoleRenderer
// ---------------------------------------------------------------------------

/// Renders task-list progress to stdout. A terminal cannot edit a sent
/// message in place, so every update reprints the whole list; the last
/// printed block is the current state.
pub struct ConsoleRenderer;

fn glyph(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Pending => "·",
        TaskStatus::Running => "▸",
        TaskStatus::Succeeded => "✓",
        TaskStatus::Failed => "✗",
    }
}

fn print_snapshot(snapshot: &TaskListSnapshot) {
    println!("{} [{}]", snapshot.title, snapshot.aggregate);
    for entry in &snapshot.entries {
        let pad = "  ".repeat(usize::from(entry.indent) + 1);
        if entry.is_header {
            println!("{pad}{} *{}*", glyph(entry.status), entry.label);
        } else {
            println!("{pad}{} {}", glyph(entry.status), entry.label);
        }
    }
    println!();
}

#[async_trait]
impl ProgressRenderer for ConsoleRenderer {
    async fn send(&self, snapshot: &TaskListSnapshot) -> opsdeck_core::Result<MessageHandle> {
        print_snapshot(snapshot);
        Ok(MessageHandle::new("console"))
    }

    async fn update(
        &self,
        _handle: &MessageHandle,
        snapshot: &TaskListSnapshot,
    ) -> opsdeck_core::Result<()> {
        print_snapshot(snapshot);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Conversation loop
// ---------------------------------------------------------------------------

/// Drive one command to completion, prompting on stdin for every parameter
/// the resolver cannot fill in itself.
pub async fn converse(registry: &Registry, mut ctx: CommandContext) -> anyhow::Result<Outcome> {
    let renderer = ConsoleRenderer;

    loop {
        match dispatch(registry, &ctx, &renderer).await {
            Reply::Done(outcome) => return Ok(outcome),
            Reply::Prompt(payload) => {
                println!("{}", payload.text);
                match &payload.body {
                    PromptBody::Select { choices } => {
                        for (i, choice) in choices.iter().enumerate() {
                            println!("  {}. {}", i + 1, choice.label);
                        }
                        let answer = read_line(&format!("{}> ", payload.parameter))?;
                        // A number picks from the menu; anything else is
                        // taken as a literal value.
                        let value = match answer.parse::<usize>() {
                            Ok(n) if n >= 1 && n <= choices.len() => {
                                choices[n - 1].value.clone()
                            }
                            _ => answer,
                        };
                        ctx = ctx.next_turn(payload.answered(value));
                    }
                    PromptBody::FreeText { hint } => {
                        if let Some(hint) = hint {
                            println!("  ({hint})");
                        }
                        let answer = read_line(&format!("{}> ", payload.parameter))?;
                        ctx = ctx.next_turn(payload.answered(answer));
                    }
                }
            }
        }
    }
}

fn read_line(prompt: &str) -> anyhow::Result<String> {
    print!("{prompt}");
    io::stdout().flush().context("flushing prompt")?;

    let mut line = String::new();
    let read = io::stdin()
        .lock()
        .read_line(&mut line)
        .context("reading answer")?;
    if read == 0 {
        bail!("input closed before the conversation finished");
    }
    Ok(line.trim().to_string())
}
