//! Tasks, task lists, and the snapshots handed to a progress renderer.
//!
//! A task list is owned by exactly one command invocation and never shared.
//! Header tasks are purely presentational grouping: a header governs every
//! task after it until the next header of equal or higher level (lower level
//! number = higher in the hierarchy).

use crate::error::{OpsError, Result};
use crate::step::ProvisioningStep;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// TaskStatus / TaskKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Succeeded | TaskStatus::Failed)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Running => "running",
            TaskStatus::Succeeded => "succeeded",
            TaskStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    Step,
    Header { level: u8 },
}

// ---------------------------------------------------------------------------
// Task
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub label: String,
    pub kind: TaskKind,
    pub status: TaskStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    fn new(base: &str, label: String, kind: TaskKind) -> Self {
        Self {
            id: unique_task_id(base),
            label,
            kind,
            status: TaskStatus::Pending,
            started_at: None,
            completed_at: None,
        }
    }
}

/// Ids only need to be unique within one list, but a uuid suffix keeps them
/// unique across lists too, which makes log lines unambiguous.
fn unique_task_id(base: &str) -> TaskId {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    TaskId(format!("{base}-{}", &suffix[..8]))
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// The serializable view of a task list's current state, rendered by the
/// progress channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskListSnapshot {
    pub title: String,
    pub entries: Vec<TaskSnapshot>,
    pub aggregate: TaskStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSnapshot {
    pub label: String,
    pub status: TaskStatus,
    pub is_header: bool,
    pub indent: u8,
}

// ---------------------------------------------------------------------------
// TaskList
// ---------------------------------------------------------------------------

struct Entry {
    task: Task,
    step: Option<Box<dyn ProvisioningStep>>,
}

pub struct TaskList {
    title: String,
    entries: Vec<Entry>,
}

impl TaskList {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            entries: Vec::new(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Add a top-level header (level 0).
    pub fn add_header(&mut self, label: impl Into<String>) -> TaskId {
        self.add_header_at(label, 0)
    }

    pub fn add_header_at(&mut self, label: impl Into<String>, level: u8) -> TaskId {
        let task = Task::new("header", label.into(), TaskKind::Header { level });
        let id = task.id.clone();
        self.entries.push(Entry { task, step: None });
        id
    }

    pub fn add_step(
        &mut self,
        label: impl Into<String>,
        step: impl ProvisioningStep + 'static,
    ) -> TaskId {
        let task = Task::new("task", label.into(), TaskKind::Step);
        let id = task.id.clone();
        self.entries.push(Entry {
            task,
            step: Some(Box::new(step)),
        });
        id
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn task(&self, index: usize) -> &Task {
        &self.entries[index].task
    }

    pub fn task_by_id(&self, id: &TaskId) -> Result<&Task> {
        self.entries
            .iter()
            .map(|e| &e.task)
            .find(|t| &t.id == id)
            .ok_or_else(|| OpsError::TaskNotFound(id.to_string()))
    }

    pub(crate) fn step(&self, index: usize) -> Option<&dyn ProvisioningStep> {
        self.entries[index].step.as_deref()
    }

    /// Transition a task. Terminal statuses are never overwritten — callers
    /// drive strictly forward.
    pub(crate) fn set_status(&mut self, index: usize, status: TaskStatus) {
        let task = &mut self.entries[index].task;
        debug_assert!(!task.status.is_terminal(), "task {} regressed", task.id);
        match status {
            TaskStatus::Running => task.started_at = Some(Utc::now()),
            TaskStatus::Succeeded | TaskStatus::Failed => task.completed_at = Some(Utc::now()),
            TaskStatus::Pending => {}
        }
        task.status = status;
    }

    /// Derived status of the whole list: Failed beats everything, Succeeded
    /// requires every task to have succeeded, anything else is Running.
    pub fn aggregate(&self) -> TaskStatus {
        let tasks = self.entries.iter().map(|e| &e.task);
        if tasks.clone().any(|t| t.status == TaskStatus::Failed) {
            TaskStatus::Failed
        } else if self
            .entries
            .iter()
            .all(|e| e.task.status == TaskStatus::Succeeded)
        {
            TaskStatus::Succeeded
        } else {
            TaskStatus::Running
        }
    }

    pub fn snapshot(&self) -> TaskListSnapshot {
        let entries = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, e)| {
                let (is_header, indent) = match e.task.kind {
                    TaskKind::Header { level } => (true, level),
                    TaskKind::Step => (false, self.governing_headers(i).len() as u8),
                };
                TaskSnapshot {
                    label: e.task.label.clone(),
                    status: e.task.status,
                    is_header,
                    indent,
                }
            })
            .collect();
        TaskListSnapshot {
            title: self.title.clone(),
            entries,
            aggregate: self.aggregate(),
        }
    }

    /// Headers governing the task at `index`, innermost first.
    pub(crate) fn governing_headers(&self, index: usize) -> Vec<usize> {
        let mut governing = Vec::new();
        let mut ceiling: Option<u8> = None;
        for j in (0..index).rev() {
            if let TaskKind::Header { level } = self.entries[j].task.kind {
                let governs = match ceiling {
                    None => true,
                    Some(c) => level < c,
                };
                if governs {
                    governing.push(j);
                    ceiling = Some(level);
                    if level == 0 {
                        break;
                    }
                }
            }
        }
        governing
    }

    /// True once every step task inside the header's group has succeeded.
    /// A header with no nested steps is vacuously complete.
    pub(crate) fn group_complete(&self, header: usize) -> bool {
        let level = match self.entries[header].task.kind {
            TaskKind::Header { level } => level,
            TaskKind::Step => return false,
        };
        for entry in &self.entries[header + 1..] {
            match entry.task.kind {
                TaskKind::Header { level: l } if l <= level => break,
                TaskKind::Header { .. } => {}
                TaskKind::Step => {
                    if entry.task.status != TaskStatus::Succeeded {
                        return false;
                    }
                }
            }
        }
        true
    }
}

impl fmt::Debug for TaskList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskList")
            .field("title", &self.title)
            .field(
                "tasks",
                &self.entries.iter().map(|e| &e.task).collect::<Vec<_>>(),
            )
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
