//! Sequential task-list execution.
//!
//! Tasks run strictly in list order, one at a time; task N starts only after
//! task N−1 reached a terminal status. The first failure marks the task (and
//! its governing headers) Failed and stops the list — remaining tasks are
//! never started, and nothing already done is rolled back (rollback belongs
//! to the individual step, not the runner).
//!
//! Rendering is best-effort: a renderer error is logged and swallowed, never
//! aborting the list. There is deliberately no timeout or cancellation path —
//! a step that never completes stalls its list.

use crate::error::{OpsError, Result};
use crate::render::{MessageHandle, ProgressRenderer};
use crate::step::StepContext;
use crate::task::{TaskKind, TaskList, TaskStatus};
use tracing::{debug, error, warn};

/// Run every task in `list` against `ctx`, driving `renderer` after each
/// status change. Returns the first step failure, if any.
pub async fn execute(
    list: &mut TaskList,
    ctx: &StepContext,
    renderer: &dyn ProgressRenderer,
) -> Result<()> {
    let handle = match renderer.send(&list.snapshot()).await {
        Ok(handle) => Some(handle),
        Err(e) => {
            warn!(title = list.title(), "progress message could not be sent: {e}");
            None
        }
    };

    for index in 0..list.len() {
        match list.task(index).kind {
            TaskKind::Header { .. } => {
                // Headers transition together with the leaves they govern.
                // The only header reached in Pending state with a complete
                // group is one that governs no steps at all.
                if list.task(index).status == TaskStatus::Pending && list.group_complete(index) {
                    list.set_status(index, TaskStatus::Succeeded);
                    notify(renderer, &handle, list).await;
                }
            }
            TaskKind::Step => run_step(list, index, ctx, renderer, &handle).await?,
        }
    }

    Ok(())
}

async fn run_step(
    list: &mut TaskList,
    index: usize,
    ctx: &StepContext,
    renderer: &dyn ProgressRenderer,
    handle: &Option<MessageHandle>,
) -> Result<()> {
    let governing = list.governing_headers(index);

    for &h in &governing {
        if list.task(h).status == TaskStatus::Pending {
            list.set_status(h, TaskStatus::Running);
        }
    }
    list.set_status(index, TaskStatus::Running);
    debug!(task = %list.task(index).id, label = %list.task(index).label, "task started");
    notify(renderer, handle, list).await;

    let step = list.step(index).ok_or_else(|| {
        OpsError::AmbiguousState(format!("step task '{}' has no work attached", list.task(index).id))
    })?;

    match step.run(ctx).await {
        Ok(()) => {
            list.set_status(index, TaskStatus::Succeeded);
            for &h in &governing {
                if !list.task(h).status.is_terminal() && list.group_complete(h) {
                    list.set_status(h, TaskStatus::Succeeded);
                }
            }
            notify(renderer, handle, list).await;
            Ok(())
        }
        Err(e) => {
            let label = list.task(index).label.clone();
            error!(task = %list.task(index).id, label = %label, "task failed: {e}");
            list.set_status(index, TaskStatus::Failed);
            for &h in &governing {
                if !list.task(h).status.is_terminal() {
                    list.set_status(h, TaskStatus::Failed);
                }
            }
            notify(renderer, handle, list).await;
            Err(OpsError::Provisioning {
                task: label,
                detail: e.to_string(),
            })
        }
    }
}

/// Push the current snapshot through the renderer, swallowing failures.
/// Without a handle there is no message to edit, so updates are skipped.
async fn notify(renderer: &dyn ProgressRenderer, handle: &Option<MessageHandle>, list: &TaskList) {
    if let Some(handle) = handle {
        if let Err(e) = renderer.update(handle, &list.snapshot()).await {
            warn!(title = list.title(), "progress update dropped: {e}");
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::MessageHandle;
    use crate::step::ProvisioningStep;
    use crate::task::TaskListSnapshot;
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    struct RecordingRenderer {
        sends: Mutex<Vec<TaskListSnapshot>>,
        updates: Mutex<Vec<TaskListSnapshot>>,
    }

    impl RecordingRenderer {
        fn new() -> Self {
            Self {
                sends: Mutex::new(Vec::new()),
                updates: Mutex::new(Vec::new()),
            }
        }

        fn updates(&self) -> Vec<TaskListSnapshot> {
            self.updates.lock().unwrap().clone()
        }

        fn send_count(&self) -> usize {
            self.sends.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ProgressRenderer for RecordingRenderer {
        async fn send(&self, snapshot: &TaskListSnapshot) -> Result<MessageHandle> {
            self.sends.lock().unwrap().push(snapshot.clone());
            Ok(MessageHandle::new("m1"))
        }

        async fn update(
            &self,
            _handle: &MessageHandle,
            snapshot: &TaskListSnapshot,
        ) -> Result<()> {
            self.updates.lock().unwrap().push(snapshot.clone());
            Ok(())
        }
    }

    /// Renderer whose channel is down entirely.
    struct DeadRenderer;

    #[async_trait]
    impl ProgressRenderer for DeadRenderer {
        async fn send(&self, _snapshot: &TaskListSnapshot) -> Result<MessageHandle> {
            Err(OpsError::Render("channel unreachable".into()))
        }

        async fn update(
            &self,
            _handle: &MessageHandle,
            _snapshot: &TaskListSnapshot,
        ) -> Result<()> {
            Err(OpsError::Render("channel unreachable".into()))
        }
    }

    struct OkStep;

    #[async_trait]
    impl ProvisioningStep for OkStep {
        async fn run(&self, _ctx: &StepContext) -> Result<()> {
            Ok(())
        }
    }

    struct FailStep(&'static str);

    #[async_trait]
    impl ProvisioningStep for FailStep {
        async fn run(&self, _ctx: &StepContext) -> Result<()> {
            Err(OpsError::Service(self.0.to_string()))
        }
    }

    fn ctx() -> StepContext {
        StepContext::new("U1", "C1", BTreeMap::new())
    }

    #[tokio::test]
    async fn all_success_updates_once_per_status_change() {
        let mut list = TaskList::new("t");
        list.add_step("A", OkStep);
        list.add_step("B", OkStep);

        let renderer = RecordingRenderer::new();
        execute(&mut list, &ctx(), &renderer).await.unwrap();

        assert_eq!(renderer.send_count(), 1);
        let updates = renderer.updates();
        // A running, A succeeded, B running, B succeeded (+ aggregate).
        assert_eq!(updates.len(), 4);
        assert_eq!(updates[0].entries[0].status, TaskStatus::Running);
        assert_eq!(updates[1].entries[0].status, TaskStatus::Succeeded);
        assert_eq!(updates[3].aggregate, TaskStatus::Succeeded);
        // The aggregate reaches a terminal status exactly once, in the final
        // snapshot — never earlier, never oscillating.
        for earlier in &updates[..3] {
            assert_eq!(earlier.aggregate, TaskStatus::Running);
        }
    }

    #[tokio::test]
    async fn failure_stops_the_list_and_reports_the_task() {
        let mut list = TaskList::new("t");
        list.add_step("A", OkStep);
        list.add_step("B", FailStep("disk full"));
        list.add_step("C", OkStep);

        let renderer = RecordingRenderer::new();
        let err = execute(&mut list, &ctx(), &renderer).await.unwrap_err();

        match err {
            OpsError::Provisioning { task, detail } => {
                assert_eq!(task, "B");
                assert!(detail.contains("disk full"));
            }
            other => panic!("unexpected error: {other}"),
        }

        assert_eq!(list.task(0).status, TaskStatus::Succeeded);
        assert_eq!(list.task(1).status, TaskStatus::Failed);
        assert_eq!(list.task(2).status, TaskStatus::Pending); // never started

        let updates = renderer.updates();
        // A running, A succeeded, B running, B failed (+ aggregate failed).
        assert_eq!(updates.len(), 4);
        assert_eq!(updates[3].aggregate, TaskStatus::Failed);
        assert_eq!(updates[3].entries[2].status, TaskStatus::Pending);
    }

    #[tokio::test]
    async fn statuses_never_regress_across_snapshots() {
        let mut list = TaskList::new("t");
        list.add_step("A", OkStep);
        list.add_step("B", FailStep("boom"));

        let renderer = RecordingRenderer::new();
        let _ = execute(&mut list, &ctx(), &renderer).await;

        fn rank(s: TaskStatus) -> u8 {
            match s {
                TaskStatus::Pending => 0,
                TaskStatus::Running => 1,
                TaskStatus::Succeeded | TaskStatus::Failed => 2,
            }
        }
        let updates = renderer.updates();
        for pair in updates.windows(2) {
            for (before, after) in pair[0].entries.iter().zip(&pair[1].entries) {
                assert!(rank(after.status) >= rank(before.status));
            }
        }
    }

    #[tokio::test]
    async fn headers_transition_with_their_group() {
        let mut list = TaskList::new("t");
        list.add_header("Configure access"); // 0
        list.add_step("keys", OkStep); // 1
        list.add_step("permissions", OkStep); // 2

        let renderer = RecordingRenderer::new();
        execute(&mut list, &ctx(), &renderer).await.unwrap();

        let updates = renderer.updates();
        // Header transitions ride along with leaf updates: still 4.
        assert_eq!(updates.len(), 4);
        assert_eq!(updates[0].entries[0].status, TaskStatus::Running);
        assert_eq!(updates[1].entries[0].status, TaskStatus::Running); // one leaf left
        assert_eq!(updates[3].entries[0].status, TaskStatus::Succeeded);
    }

    #[tokio::test]
    async fn nested_failure_fails_governing_headers() {
        let mut list = TaskList::new("t");
        list.add_header("outer"); // 0
        list.add_header_at("inner", 1); // 1
        list.add_step("leaf", FailStep("nope")); // 2

        let renderer = RecordingRenderer::new();
        let err = execute(&mut list, &ctx(), &renderer).await;
        assert!(err.is_err());
        assert_eq!(list.task(0).status, TaskStatus::Failed);
        assert_eq!(list.task(1).status, TaskStatus::Failed);
    }

    #[tokio::test]
    async fn empty_header_group_succeeds_on_its_own() {
        let mut list = TaskList::new("t");
        list.add_header("announcement only");

        let renderer = RecordingRenderer::new();
        execute(&mut list, &ctx(), &renderer).await.unwrap();
        assert_eq!(list.task(0).status, TaskStatus::Succeeded);
        assert_eq!(renderer.updates().len(), 1);
    }

    #[tokio::test]
    async fn dead_renderer_does_not_abort_execution() {
        let mut list = TaskList::new("t");
        list.add_step("A", OkStep);

        execute(&mut list, &ctx(), &DeadRenderer).await.unwrap();
        assert_eq!(list.task(0).status, TaskStatus::Succeeded);
    }
}
