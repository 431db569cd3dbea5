use crate::directory::OpsServices;
use crate::model::{source_key_for, NewProject};
use crate::setters::TeamNameSetter;
use crate::steps::{
    AddAccessKeys, AddUserPermissions, CreateEnvironment, CreateProjectRecord,
    CreateSourceProject,
};
use async_trait::async_trait;
use opsdeck_core::command::Command;
use opsdeck_core::config::{EnvironmentConfig, OpsConfig};
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

/// Provision a new project for a team: the project record, its source
/// project with access configured, and the non-production environments.
pub struct CreateProject {
    spec: CommandSpec,
    services: OpsServices,
    environments: Vec<EnvironmentConfig>,
}

impl CreateProject {
    pub fn new(config: &OpsConfig, services: OpsServices) -> Result<Self> {
        let spec = CommandSpec::new("create-project", "Provision a new project for a team")
            .param(
                ParameterSpec::new(
                    "teamName",
                    "Please select a team to own the new project",
                )
                .order(0)
                .setter(Arc::new(TeamNameSetter::new(services.teams.clone()))),
            )
            .param(
                ParameterSpec::new("projectName", "Enter a name for the project")
                    .order(1)
                    .validated(r"^[a-z][a-z0-9 -]{0,31}$", "lowercase, starting with a letter, at most 32 characters")?,
            )
            .param(
                ParameterSpec::new("description", "Enter a description for the project").order(2),
            );

        Ok(Self {
            spec,
            services,
            environments: config.nonprod_environments().cloned().collect(),
        })
    }
}

#[async_trait]
impl Command for CreateProject {
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
        info!(user = %ctx.user, team = %team_name, project = %project_name, "provisioning project");

        let member = self
            .services
            .members
            .member_for_chat_user(&ctx.user)
            .await?
            .ok_or_else(|| {
                OpsError::Service("no member profile found for your chat user".to_string())
            })?;
        let team = self
            .services
            .teams
            .team_by_name(team_name)
            .await?
            .ok_or_else(|| OpsError::Service(format!("team '{team_name}' not found")))?;

        let provisioner = &self.services.provisioner;
        let source_key = source_key_for(project_name);

        let mut list = TaskList::new(format!("Provision project {project_name}"));
        list.add_header(format!(
            "Create project {project_name} for team {team_name}"
        ));
        list.add_step(
            "Create project record",
            CreateProjectRecord::new(
                provisioner.clone(),
                NewProject {
                    name: project_name.to_string(),
                    description: session.require("description")?.to_string(),
                    team_name: team.name.clone(),
                    created_by: member.member_id.clone(),
                },
            ),
        );
        list.add_step(
            "Create source project",
            CreateSourceProject::new(provisioner.clone(), project_name, &source_key),
        );

        list.add_header("Configure repository access");
        list.add_step(
            "Add access keys to source project",
            AddAccessKeys::new(provisioner.clone(), &source_key),
        );
        list.add_step(
            "Add user permissions to source project",
            AddUserPermissions::new(
                provisioner.clone(),
                &source_key,
                team.owners.clone(),
                team.members.clone(),
            ),
        );

        list.add_header("Create environments");
        for env in &self.environments {
            list.add_step(
                format!("Create {} environment", env.label),
                CreateEnvironment::new(provisioner.clone(), project_name, &env.id),
            );
        }

        runner::execute(&mut list, &StepContext::for_invocation(ctx, session), renderer).await?;

        Ok(format!(
            "Project *{project_name}* has been provisioned for team *{team_name}*."
        ))
    }
}
