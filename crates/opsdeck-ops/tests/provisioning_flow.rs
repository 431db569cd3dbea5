//! End-to-end conversational flows over in-memory services: dispatch a turn,
//! answer the prompt, feed the carried payload back, and watch the task list
//! run.

use async_trait::async_trait;
use opsdeck_core::command::{dispatch, Registry, Reply};
use opsdeck_core::config::OpsConfig;
use opsdeck_core::context::CommandContext;
use opsdeck_core::prompt::{PromptBody, PromptPayload};
use opsdeck_core::render::{MessageHandle, ProgressRenderer};
use opsdeck_core::task::{TaskListSnapshot, TaskStatus};
use opsdeck_core::Result;
use opsdeck_ops::commands::registry;
use opsdeck_ops::memory::{services, InMemoryDirectory};
use opsdeck_ops::model::{Member, Project, SourceProject, Team};
use std::sync::{Arc, Mutex};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

#[derive(Default)]
struct RecordingRenderer {
    sends: Mutex<usize>,
    updates: Mutex<Vec<TaskListSnapshot>>,
}

impl RecordingRenderer {
    fn updates(&self) -> Vec<TaskListSnapshot> {
        self.updates.lock().unwrap().clone()
    }

    fn send_count(&self) -> usize {
        *self.sends.lock().unwrap()
    }
}

#[async_trait]
impl ProgressRenderer for RecordingRenderer {
    async fn send(&self, _snapshot: &TaskListSnapshot) -> Result<MessageHandle> {
        *self.sends.lock().unwrap() += 1;
        Ok(MessageHandle::new("m1"))
    }

    async fn update(&self, _handle: &MessageHandle, snapshot: &TaskListSnapshot) -> Result<()> {
        self.updates.lock().unwrap().push(snapshot.clone());
        Ok(())
    }
}

fn member(chat_user: &str) -> Member {
    Member {
        member_id: format!("member-{chat_user}"),
        name: "Ann".to_string(),
        chat_user_id: chat_user.to_string(),
    }
}

fn team(name: &str, channel: Option<&str>, user: &str) -> Team {
    Team {
        team_id: format!("id-{name}"),
        name: name.to_string(),
        description: String::new(),
        cloud: "community".to_string(),
        channel: channel.map(str::to_string),
        owners: vec![user.to_string()],
        members: Vec::new(),
    }
}

fn project(name: &str, team: &str, source: Option<&str>) -> Project {
    Project {
        project_id: format!("id-{name}"),
        name: name.to_string(),
        description: String::new(),
        team_name: team.to_string(),
        source_project: source.map(|key| SourceProject {
            key: key.to_string(),
            name: name.to_string(),
        }),
    }
}

fn built_registry(directory: Arc<InMemoryDirectory>) -> Registry {
    registry(&OpsConfig::default(), &services(directory)).unwrap()
}

fn expect_prompt(reply: Reply) -> PromptPayload {
    match reply {
        Reply::Prompt(payload) => payload,
        other => panic!("expected prompt, got {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// create-project
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_project_conversation_provisions_everything() {
    let directory = Arc::new(
        InMemoryDirectory::new()
            .with_member(member("U1"))
            .with_team(team("alpha", Some("C1"), "U1")),
    );
    let registry = built_registry(directory.clone());
    let renderer = RecordingRenderer::default();

    // Turn 1: the channel is team-mapped, so the team resolves silently and
    // the first question is the project name.
    let ctx = CommandContext::new("create-project", "U1", "C1");
    let payload = expect_prompt(dispatch(&registry, &ctx, &renderer).await);
    assert_eq!(payload.parameter, "projectName");
    assert!(matches!(payload.body, PromptBody::FreeText { .. }));
    assert_eq!(
        payload.carried.get("teamName").map(String::as_str),
        Some("alpha")
    );

    // Turn 2: answer the name, get asked for the description.
    let ctx = ctx.next_turn(payload.answered("web portal"));
    let payload = expect_prompt(dispatch(&registry, &ctx, &renderer).await);
    assert_eq!(payload.parameter, "description");

    // Turn 3: everything known — the task list runs.
    let ctx = ctx.next_turn(payload.answered("customer-facing portal"));
    let outcome = match dispatch(&registry, &ctx, &renderer).await {
        Reply::Done(outcome) => outcome,
        other => panic!("expected done, got {other:?}"),
    };
    assert!(outcome.success, "unexpected failure: {}", outcome.message);
    assert!(outcome.message.contains("*web portal*"));

    // The provisioning actually happened.
    let created = directory.project("web portal").expect("project missing");
    assert_eq!(created.team_name, "alpha");
    assert!(created.source_project.is_some());
    let envs: Vec<String> = directory
        .environments()
        .into_iter()
        .map(|(_, env)| env)
        .collect();
    assert_eq!(envs, vec!["dev", "sit", "uat"]);

    // One message, edited in place: 7 step tasks, two updates each.
    assert_eq!(renderer.send_count(), 1);
    let updates = renderer.updates();
    assert_eq!(updates.len(), 14);
    assert_eq!(updates.last().unwrap().aggregate, TaskStatus::Succeeded);
}

#[tokio::test]
async fn create_project_failure_stops_and_reports_the_step() {
    let directory = Arc::new(
        InMemoryDirectory::new()
            .with_member(member("U1"))
            .with_team(team("alpha", Some("C1"), "U1")),
    );
    directory.fail_environment("sit");
    let registry = built_registry(directory.clone());
    let renderer = RecordingRenderer::default();

    let ctx = CommandContext::new("create-project", "U1", "C1")
        .with_value("projectName", "web portal")
        .with_value("description", "portal");

    let outcome = match dispatch(&registry, &ctx, &renderer).await {
        Reply::Done(outcome) => outcome,
        other => panic!("expected done, got {other:?}"),
    };
    assert!(!outcome.success);
    assert!(outcome.message.contains("Create Integration environment"));
    assert!(outcome.message.contains("quota exceeded"));

    // Nothing past the failing task ran.
    let envs: Vec<String> = directory
        .environments()
        .into_iter()
        .map(|(_, env)| env)
        .collect();
    assert_eq!(envs, vec!["dev"]);

    let updates = renderer.updates();
    let last = updates.last().unwrap();
    assert_eq!(last.aggregate, TaskStatus::Failed);
    // The trailing environment task was never started.
    assert_eq!(last.entries.last().unwrap().status, TaskStatus::Pending);
}

// ---------------------------------------------------------------------------
// provision-prod
// ---------------------------------------------------------------------------

#[tokio::test]
async fn provision_prod_two_select_turns_then_runs() {
    let directory = Arc::new(
        InMemoryDirectory::new()
            .with_member(member("U1"))
            .with_team(team("alpha", None, "U1"))
            .with_team(team("beta", None, "U1"))
            .with_project(project("web", "alpha", Some("WEB")))
            .with_project(project("api", "alpha", Some("API"))),
    );
    let registry = built_registry(directory.clone());
    let renderer = RecordingRenderer::default();

    // Turn 1: two teams to choose from.
    let ctx = CommandContext::new("provision-prod", "U1", "C-unmapped");
    let payload = expect_prompt(dispatch(&registry, &ctx, &renderer).await);
    assert_eq!(payload.parameter, "teamName");
    match &payload.body {
        PromptBody::Select { choices } => assert_eq!(choices.len(), 2),
        other => panic!("expected select, got {other:?}"),
    }

    // Turn 2: two projects to choose from, team carried forward.
    let ctx = ctx.next_turn(payload.answered("alpha"));
    let payload = expect_prompt(dispatch(&registry, &ctx, &renderer).await);
    assert_eq!(payload.parameter, "projectName");
    assert_eq!(
        payload.carried.get("teamName").map(String::as_str),
        Some("alpha")
    );

    // Turn 3: run.
    let ctx = ctx.next_turn(payload.answered("web"));
    let outcome = match dispatch(&registry, &ctx, &renderer).await {
        Reply::Done(outcome) => outcome,
        other => panic!("expected done, got {other:?}"),
    };
    assert!(outcome.success, "unexpected failure: {}", outcome.message);

    assert_eq!(
        directory.prod_requests(),
        vec![("member-U1".to_string(), "id-web".to_string())]
    );
    assert_eq!(
        directory.environments(),
        vec![("web".to_string(), "prod".to_string())]
    );
}

#[tokio::test]
async fn provision_prod_with_no_teams_is_a_guided_failure() {
    let directory = Arc::new(InMemoryDirectory::new().with_member(member("U1")));
    let registry = built_registry(directory);
    let renderer = RecordingRenderer::default();

    let ctx = CommandContext::new("provision-prod", "U1", "C-unmapped");
    match dispatch(&registry, &ctx, &renderer).await {
        Reply::Done(outcome) => {
            assert!(!outcome.success);
            assert!(outcome.message.contains("teamName"));
        }
        other => panic!("expected done, got {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// link-repository
// ---------------------------------------------------------------------------

#[tokio::test]
async fn link_repository_selects_from_source_repos() {
    let directory = Arc::new(
        InMemoryDirectory::new()
            .with_member(member("U1"))
            .with_team(team("alpha", Some("C1"), "U1"))
            .with_project(project("web", "alpha", Some("WEB")))
            .with_repositories(
                "WEB",
                vec![
                    opsdeck_ops::model::Repository {
                        slug: "web-api".to_string(),
                        name: "Web API".to_string(),
                    },
                    opsdeck_ops::model::Repository {
                        slug: "web-ui".to_string(),
                        name: "Web UI".to_string(),
                    },
                ],
            ),
    );
    let registry = built_registry(directory.clone());
    let renderer = RecordingRenderer::default();

    // Team from channel, single project auto-applied: the first actual
    // question is the repository.
    let ctx = CommandContext::new("link-repository", "U1", "C1");
    let payload = expect_prompt(dispatch(&registry, &ctx, &renderer).await);
    assert_eq!(payload.parameter, "repositorySlug");
    assert_eq!(
        payload.carried.get("projectName").map(String::as_str),
        Some("web")
    );

    let ctx = ctx.next_turn(payload.answered("web-ui"));
    let outcome = match dispatch(&registry, &ctx, &renderer).await {
        Reply::Done(outcome) => outcome,
        other => panic!("expected done, got {other:?}"),
    };
    assert!(outcome.success, "unexpected failure: {}", outcome.message);
    assert_eq!(
        directory.links(),
        vec![("web".to_string(), "web-ui".to_string())]
    );
}
