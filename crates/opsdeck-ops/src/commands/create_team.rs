use crate::directory::OpsServices;
use crate::model::NewTeam;
use crate::setters::CloudSetter;
use async_trait::async_trait;
use opsdeck_core::command::Command;
use opsdeck_core::config::OpsConfig;
use opsdeck_core::context::CommandContext;
use opsdeck_core::param::{CommandSpec, ParameterSpec};
use opsdeck_core::render::ProgressRenderer;
use opsdeck_core::session::Session;
use opsdeck_core::{OpsError, Result};
use std::sync::Arc;
use tracing::info;

/// Create a new team on one of the configured clouds. With a single cloud
/// configured, the user is only ever asked for name and description.
pub struct CreateTeam {
    spec: CommandSpec,
    services: OpsServices,
    command_prefix: String,
}

impl CreateTeam {
    pub fn new(config: &OpsConfig, services: OpsServices) -> Result<Self> {
        let spec = CommandSpec::new("create-team", "Create a new team")
            .param(
                ParameterSpec::new("cloud", "Please select the cloud for the new team")
                    .order(0)
                    .setter(Arc::new(CloudSetter::new(config.clouds.clone()))),
            )
            .param(
                ParameterSpec::new("teamName", "Enter a name for the team")
                    .order(1)
                    .validated(r"^.{1,22}$", "between 1 and 22 characters")?,
            )
            .param(ParameterSpec::new("description", "Enter a description for the team").order(2));

        Ok(Self {
            spec,
            services,
            command_prefix: config.command_prefix.clone(),
        })
    }
}

#[async_trait]
impl Command for CreateTeam {
    fn spec(&self) -> &CommandSpec {
        &self.spec
    }

    async fn run(
        &self,
        ctx: &CommandContext,
        session: &Session,
        _renderer: &dyn ProgressRenderer,
    ) -> Result<String> {
        info!(user = %ctx.user, "creating team");

        let member = self
            .services
            .members
            .member_for_chat_user(&ctx.user)
            .await?
            .ok_or_else(|| {
                OpsError::Service(format!(
                    "no member profile found for your chat user; \
                     run `{} onboard me` first",
                    self.command_prefix
                ))
            })?;

        let team = self
            .services
            .provisioner
            .create_team(&NewTeam {
                name: session.require("teamName")?.to_string(),
                description: session.require("description")?.to_string(),
                cloud: session.require("cloud")?.to_string(),
                created_by: member.member_id,
            })
            .await?;

        Ok(format!(
            "Team *{}* has been created on the {} cloud.",
            team.name, team.cloud
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{services, InMemoryDirectory};
    use crate::model::Member;
    use opsdeck_core::command::{dispatch, Registry, Reply};
    use opsdeck_core::render::MessageHandle;
    use opsdeck_core::task::TaskListSnapshot;

    struct NullRenderer;

    #[async_trait]
    impl ProgressRenderer for NullRenderer {
        async fn send(&self, _: &TaskListSnapshot) -> Result<MessageHandle> {
            Ok(MessageHandle::new("m"))
        }
        async fn update(&self, _: &MessageHandle, _: &TaskListSnapshot) -> Result<()> {
            Ok(())
        }
    }

    fn registry_with(directory: Arc<InMemoryDirectory>) -> Registry {
        let mut registry = Registry::new();
        registry
            .register(Arc::new(
                CreateTeam::new(&OpsConfig::default(), services(directory)).unwrap(),
            ))
            .unwrap();
        registry
    }

    fn full_ctx() -> CommandContext {
        CommandContext::new("create-team", "U1", "C1")
            .with_value("teamName", "alpha")
            .with_value("description", "the alpha team")
    }

    #[tokio::test]
    async fn creates_team_without_asking_for_the_only_cloud() {
        let directory = Arc::new(InMemoryDirectory::new().with_member(Member {
            member_id: "m1".to_string(),
            name: "Ann".to_string(),
            chat_user_id: "U1".to_string(),
        }));
        let registry = registry_with(directory);

        // cloud resolves from config (single candidate) without a prompt.
        match dispatch(&registry, &full_ctx(), &NullRenderer).await {
            Reply::Done(outcome) => {
                assert!(outcome.success);
                assert!(outcome.message.contains("*alpha*"));
                assert!(outcome.message.contains("community"));
            }
            other => panic!("expected done, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_member_profile_guides_onboarding() {
        let registry = registry_with(Arc::new(InMemoryDirectory::new()));

        match dispatch(&registry, &full_ctx(), &NullRenderer).await {
            Reply::Done(outcome) => {
                assert!(!outcome.success);
                assert!(outcome.message.contains("onboard me"));
            }
            other => panic!("expected done, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn duplicate_team_name_is_reported() {
        let directory = Arc::new(InMemoryDirectory::new().with_member(Member {
            member_id: "m1".to_string(),
            name: "Ann".to_string(),
            chat_user_id: "U1".to_string(),
        }));
        let registry = registry_with(directory);

        match dispatch(&registry, &full_ctx(), &NullRenderer).await {
            Reply::Done(outcome) => assert!(outcome.success),
            other => panic!("expected done, got {other:?}"),
        }
        match dispatch(&registry, &full_ctx(), &NullRenderer).await {
            Reply::Done(outcome) => {
                assert!(!outcome.success);
                assert!(outcome.message.contains("already in use"));
            }
            other => panic!("expected done, got {other:?}"),
        }
    }
}
