use crate::directory::OpsServices;
use crate::setters::{ProjectNameSetter, RepositorySlugSetter, TeamNameSetter};
use crate::steps::{AddAccessKeys, AddUserPermissions, LinkRepository as LinkRepositoryStep};
use async_trait::async_trait;
use opsdeck_core::command::Command;
use opsdeck_core::config::OpsConfig;
use opsdeck_core::context::CommandContext;
use opsdeck_core::param::{CommandSpec, ParameterSpec};
use opsdeck_core::render::ProgressRenderer;
use opsdeck_core::runner;
use opsdeck_core::session::Session;
use opsdeck_core::step::StepContext;
use opsdeck_core::task::TaskList;
use opsdeck_core::{OpsError, Result};
use std::sync::Arc;
use tracing::info;

/// Attach one of a project's source repositories to the project and wire up
/// access for the owning team.
pub struct LinkRepository {
    spec: CommandSpec,
    services: OpsServices,
}

impl LinkRepository {
    pub fn new(config: &OpsConfig, services: OpsServices) -> Self {
        let spec = CommandSpec::new("link-repository", "Link a source repository to a project")
            .param(
                ParameterSpec::new("teamName", "Please select the team that owns the project")
                    .order(0)
                    .setter(Arc::new(TeamNameSetter::new(services.teams.clone()))),
            )
            .param(
                ParameterSpec::new("projectName", "Please select the project to link into")
                    .order(1)
                    .setter(Arc::new(ProjectNameSetter::new(services.projects.clone()))),
            )
            .param(
                ParameterSpec::new("repositorySlug", "Please select the repository to link")
                    .order(2)
                    .setter(Arc::new(RepositorySlugSetter::new(
                        services.projects.clone(),
                        services.repos.clone(),
                        config.command_prefix.clone(),
                    ))),
            );

        Self { spec, services }
    }
}

#[async_trait]
impl Command for LinkRepository {
    fn spec(&self) -> &CommandSpec {
        &self.spec
    }

    async fn run(
        &self,
        ctx: &CommandContext,
        session: &Session,
        renderer: &dyn ProgressRenderer,
    ) -> Result<String> {
        let team_name = session.require("teamName")?;
        let project_name = session.require("projectName")?;
        let slug = session.require("repositorySlug")?;
        info!(user = %ctx.user, project = %project_name, slug = %slug, "linking repository");

        let team = self
            .services
            .teams
            .team_by_name(team_name)
            .await?
            .ok_or_else(|| OpsError::Service(format!("team '{team_name}' not found")))?;
        let project = self
            .services
            .projects
            .project_by_name(project_name)
            .await?
            .ok_or_else(|| OpsError::Service(format!("project '{project_name}' not found")))?;
        let source = project.source_project.ok_or_else(|| {
            OpsError::Service(format!(
                "project '{project_name}' has no associated source project"
            ))
        })?;

        let provisioner = &self.services.provisioner;

        let mut list = TaskList::new(format!("Link repository {slug}"));
        list.add_header(format!("Link repository {slug} to {project_name}"));
        list.add_step(
            "Link repository to project",
            LinkRepositoryStep::new(provisioner.clone(), project_name, slug),
        );
        list.add_step(
            "Add access keys to source project",
            AddAccessKeys::new(provisioner.clone(), &source.key),
        );
        list.add_step(
            "Add user permissions to source project",
            AddUserPermissions::new(
                provisioner.clone(),
                &source.key,
                team.owners.clone(),
                team.members.clone(),
            ),
        );

        runner::execute(&mut list, &StepContext::for_invocation(ctx, session), renderer).await?;

        Ok(format!(
            "Repository *{slug}* is now linked to project *{project_name}*."
        ))
    }
}
