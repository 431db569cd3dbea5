use crate::directory::OpsServices;
use crate::setters::{ProjectNameSetter, TeamNameSetter};
use crate::steps::{CreateEnvironment, RequestProd};
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

/// Create the production environments for an existing project.
pub struct ProvisionProd {
    spec: CommandSpec,
    services: OpsServices,
    environments: Vec<EnvironmentConfig>,
}

impl ProvisionProd {
    pub fn new(config: &OpsConfig, services: OpsServices) -> Self {
        let spec = CommandSpec::new(
            "provision-prod",
            "Create the production environments for a project",
        )
        .param(
            ParameterSpec::new(
                "teamName",
                "Please select a team associated with the project you wish to provision",
            )
            .order(0)
            .setter(Arc::new(TeamNameSetter::new(services.teams.clone()))),
        )
        .param(
            ParameterSpec::new(
                "projectName",
                "Please select the project you wish to provision the production environments for",
            )
            .order(1)
            .setter(Arc::new(ProjectNameSetter::new(services.projects.clone()))),
        );

        Self {
            spec,
            services,
            environments: config.prod_environments().cloned().collect(),
        }
    }
}

#[async_trait]
impl Command for ProvisionProd {
    fn spec(&self) -> &CommandSpec {
        &self.spec
    }

    async fn run(
        &self,
        ctx: &CommandContext,
        session: &Session,
        renderer: &dyn ProgressRenderer,
    ) -> Result<String> {
        let project_name = session.require("projectName")?;
        info!(user = %ctx.user, project = %project_name, "requesting production environments");

        let member = self
            .services
            .members
            .member_for_chat_user(&ctx.user)
            .await?
            .ok_or_else(|| {
                OpsError::Service("no member profile found for your chat user".to_string())
            })?;
        let project = self
            .services
            .projects
            .project_by_name(project_name)
            .await?
            .ok_or_else(|| OpsError::Service(format!("project '{project_name}' not found")))?;

        let provisioner = &self.services.provisioner;

        let mut list = TaskList::new(format!("Production environments for {project_name}"));
        list.add_header(format!(
            "Provision production environments for {project_name}"
        ));
        list.add_step(
            "Submit production request",
            RequestProd::new(provisioner.clone(), member.member_id, project.project_id),
        );
        for env in &self.environments {
            list.add_step(
                format!("Create {} environment", env.label),
                CreateEnvironment::new(provisioner.clone(), project_name, &env.id),
            );
        }

        runner::execute(&mut list, &StepContext::for_invocation(ctx, session), renderer).await?;

        Ok(format!(
            "Production environments for *{project_name}* have been provisioned."
        ))
    }
}
