//! Parameter setters: the pure lookups behind recursive resolution.
//!
//! Each setter answers one question — "what could this parameter be?" — by
//! querying a directory. They never mutate anything. The resolver applies
//! the zero/one/many rules on top of what they return.

use crate::directory::{ProjectDirectory, RepoDirectory, TeamDirectory};
use async_trait::async_trait;
use opsdeck_core::context::CommandContext;
use opsdeck_core::param::{ParameterSetter, SetterOutcome};
use opsdeck_core::prompt::Choice;
use opsdeck_core::session::Session;
use opsdeck_core::{OpsError, Result};
use std::sync::Arc;
use tracing::debug;

// ---------------------------------------------------------------------------
// CloudSetter
// ---------------------------------------------------------------------------

/// Clouds come from configuration, not a directory. A single configured
/// cloud resolves without the user ever seeing the question.
pub struct CloudSetter {
    clouds: Vec<String>,
}

impl CloudSetter {
    pub fn new(clouds: Vec<String>) -> Self {
        Self { clouds }
    }
}

#[async_trait]
impl ParameterSetter for CloudSetter {
    async fn resolve(&self, _ctx: &CommandContext, _session: &Session) -> Result<SetterOutcome> {
        Ok(SetterOutcome::Choices(
            self.clouds.iter().map(Choice::plain).collect(),
        ))
    }
}

// ---------------------------------------------------------------------------
// TeamNameSetter
// ---------------------------------------------------------------------------

/// Resolves the acting team: a team-mapped channel short-circuits the
/// question entirely; otherwise the user picks from their own teams.
pub struct TeamNameSetter {
    teams: Arc<dyn TeamDirectory>,
}

impl TeamNameSetter {
    pub fn new(teams: Arc<dyn TeamDirectory>) -> Self {
        Self { teams }
    }
}

#[async_trait]
impl ParameterSetter for TeamNameSetter {
    async fn resolve(&self, ctx: &CommandContext, _session: &Session) -> Result<SetterOutcome> {
        if let Some(team) = self.teams.team_for_channel(&ctx.channel).await? {
            debug!(channel = %ctx.channel, team = %team.name, "channel is team-mapped");
            return Ok(SetterOutcome::Value(team.name));
        }

        let teams = self.teams.teams_for_member(&ctx.user).await?;
        Ok(SetterOutcome::Choices(
            teams.into_iter().map(|t| Choice::plain(t.name)).collect(),
        ))
    }
}

// ---------------------------------------------------------------------------
// ProjectNameSetter
// ---------------------------------------------------------------------------

/// Lists the projects of the already-resolved team. Declared with a higher
/// order than the team parameter, so the team is always known by the time
/// this runs.
pub struct ProjectNameSetter {
    projects: Arc<dyn ProjectDirectory>,
}

impl ProjectNameSetter {
    pub fn new(projects: Arc<dyn ProjectDirectory>) -> Self {
        Self { projects }
    }
}

#[async_trait]
impl ParameterSetter for ProjectNameSetter {
    async fn resolve(&self, _ctx: &CommandContext, session: &Session) -> Result<SetterOutcome> {
        let team_name = session.require("teamName")?;
        let projects = self.projects.projects_for_team(team_name).await?;
        Ok(SetterOutcome::Choices(
            projects
                .into_iter()
                .map(|p| Choice::plain(p.name))
                .collect(),
        ))
    }
}

// ---------------------------------------------------------------------------
// RepositorySlugSetter
// ---------------------------------------------------------------------------

/// Lists the repositories of the resolved project's source project. A
/// project without a linked source project cannot offer repositories — that
/// is user guidance, not an empty menu.
pub struct RepositorySlugSetter {
    projects: Arc<dyn ProjectDirectory>,
    repos: Arc<dyn RepoDirectory>,
    command_prefix: String,
}

impl RepositorySlugSetter {
    pub fn new(
        projects: Arc<dyn ProjectDirectory>,
        repos: Arc<dyn RepoDirectory>,
        command_prefix: impl Into<String>,
    ) -> Self {
        Self {
            projects,
            repos,
            command_prefix: command_prefix.into(),
        }
    }
}

#[async_trait]
impl ParameterSetter for RepositorySlugSetter {
    async fn resolve(&self, _ctx: &CommandContext, session: &Session) -> Result<SetterOutcome> {
        let project_name = session.require("projectName")?;
        let project = self
            .projects
            .project_by_name(project_name)
            .await?
            .ok_or_else(|| OpsError::Service(format!("project '{project_name}' not found")))?;

        let source = project.source_project.ok_or_else(|| {
            OpsError::Service(format!(
                "project '{project_name}' has no associated source project; \
                 run `{} create project` to provision one first",
                self.command_prefix
            ))
        })?;

        let repos = self.repos.repositories_for_source_project(&source.key).await?;
        debug!(project = %project_name, source = %source.key, count = repos.len(), "listed repositories");
        Ok(SetterOutcome::Choices(
            repos
                .into_iter()
                .map(|r| Choice::new(r.slug, r.name))
                .collect(),
        ))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryDirectory;
    use crate::model::{Project, Repository, SourceProject, Team};

    fn team(name: &str, channel: Option<&str>, member: &str) -> Team {
        Team {
            team_id: format!("id-{name}"),
            name: name.to_string(),
            description: String::new(),
            cloud: "community".to_string(),
            channel: channel.map(str::to_string),
            owners: vec![member.to_string()],
            members: Vec::new(),
        }
    }

    fn ctx() -> CommandContext {
        CommandContext::new("link-repository", "U1", "C1")
    }

    #[tokio::test]
    async fn channel_mapped_team_short_circuits() {
        let directory =
            Arc::new(InMemoryDirectory::new().with_team(team("alpha", Some("C1"), "U1")));
        let setter = TeamNameSetter::new(directory);

        let outcome = setter.resolve(&ctx(), &Session::new("x")).await.unwrap();
        assert_eq!(outcome, SetterOutcome::Value("alpha".to_string()));
    }

    #[tokio::test]
    async fn unmapped_channel_lists_member_teams() {
        let directory = Arc::new(
            InMemoryDirectory::new()
                .with_team(team("alpha", None, "U1"))
                .with_team(team("beta", None, "U1"))
                .with_team(team("other", None, "U2")),
        );
        let setter = TeamNameSetter::new(directory);

        match setter.resolve(&ctx(), &Session::new("x")).await.unwrap() {
            SetterOutcome::Choices(choices) => {
                let names: Vec<&str> = choices.iter().map(|c| c.value.as_str()).collect();
                assert_eq!(names, vec!["alpha", "beta"]);
            }
            other => panic!("expected choices, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn project_setter_requires_resolved_team() {
        let directory = Arc::new(InMemoryDirectory::new());
        let setter = ProjectNameSetter::new(directory);

        let err = setter.resolve(&ctx(), &Session::new("x")).await.unwrap_err();
        assert!(matches!(err, OpsError::AmbiguousState(_)));
    }

    #[tokio::test]
    async fn repository_setter_guides_when_source_project_missing() {
        let directory = Arc::new(InMemoryDirectory::new().with_project(Project {
            project_id: "p1".to_string(),
            name: "web".to_string(),
            description: String::new(),
            team_name: "alpha".to_string(),
            source_project: None,
        }));
        let setter = RepositorySlugSetter::new(directory.clone(), directory, "ops");

        let mut session = Session::new("link-repository");
        session.set("projectName", "web".to_string());

        let err = setter.resolve(&ctx(), &session).await.unwrap_err();
        assert!(err.to_string().contains("no associated source project"));
    }

    #[tokio::test]
    async fn repository_setter_lists_source_repos() {
        let directory = Arc::new(
            InMemoryDirectory::new()
                .with_project(Project {
                    project_id: "p1".to_string(),
                    name: "web".to_string(),
                    description: String::new(),
                    team_name: "alpha".to_string(),
                    source_project: Some(SourceProject {
                        key: "WEB".to_string(),
                        name: "web".to_string(),
                    }),
                })
                .with_repositories(
                    "WEB",
                    vec![
                        Repository {
                            slug: "web-api".to_string(),
                            name: "Web API".to_string(),
                        },
                        Repository {
                            slug: "web-ui".to_string(),
                            name: "Web UI".to_string(),
                        },
                    ],
                ),
        );
        let setter = RepositorySlugSetter::new(directory.clone(), directory, "ops");

        let mut session = Session::new("link-repository");
        session.set("projectName", "web".to_string());

        match setter.resolve(&ctx(), &session).await.unwrap() {
            SetterOutcome::Choices(choices) => {
                assert_eq!(choices[0].value, "web-api");
                assert_eq!(choices[0].label, "Web API");
                assert_eq!(choices.len(), 2);
            }
            other => panic!("expected choices, got {other:?}"),
        }
    }
}
