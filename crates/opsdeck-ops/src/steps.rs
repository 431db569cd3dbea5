//! Provisioning steps: the units of work a task list strings together.
//!
//! Each step captures the values it needs at task-list construction time and
//! talks to external systems only through the `Provisioner`. Steps must be
//! safely repeatable: another invocation may have provisioned the same
//! resource moments earlier.

use crate::directory::Provisioner;
use crate::model::NewProject;
use async_trait::async_trait;
use opsdeck_core::step::{ProvisioningStep, StepContext};
use opsdeck_core::Result;
use std::sync::Arc;
use tracing::info;

pub struct CreateProjectRecord {
    provisioner: Arc<dyn Provisioner>,
    project: NewProject,
}

impl CreateProjectRecord {
    pub fn new(provisioner: Arc<dyn Provisioner>, project: NewProject) -> Self {
        Self {
            provisioner,
            project,
        }
    }
}

#[async_trait]
impl ProvisioningStep for CreateProjectRecord {
    async fn run(&self, _ctx: &StepContext) -> Result<()> {
        let project = self.provisioner.create_project(&self.project).await?;
        info!(project = %project.name, team = %project.team_name, "project record created");
        Ok(())
    }
}

pub struct CreateSourceProject {
    provisioner: Arc<dyn Provisioner>,
    project_name: String,
    source_key: String,
}

impl CreateSourceProject {
    pub fn new(
        provisioner: Arc<dyn Provisioner>,
        project_name: impl Into<String>,
        source_key: impl Into<String>,
    ) -> Self {
        Self {
            provisioner,
            project_name: project_name.into(),
            source_key: source_key.into(),
        }
    }
}

#[async_trait]
impl ProvisioningStep for CreateSourceProject {
    async fn run(&self, _ctx: &StepContext) -> Result<()> {
        let source = self
            .provisioner
            .create_source_project(&self.project_name, &self.source_key)
            .await?;
        info!(project = %self.project_name, key = %source.key, "source project ready");
        Ok(())
    }
}

pub struct AddAccessKeys {
    provisioner: Arc<dyn Provisioner>,
    source_key: String,
}

impl AddAccessKeys {
    pub fn new(provisioner: Arc<dyn Provisioner>, source_key: impl Into<String>) -> Self {
        Self {
            provisioner,
            source_key: source_key.into(),
        }
    }
}

#[async_trait]
impl ProvisioningStep for AddAccessKeys {
    async fn run(&self, _ctx: &StepContext) -> Result<()> {
        self.provisioner.add_access_keys(&self.source_key).await
    }
}

pub struct AddUserPermissions {
    provisioner: Arc<dyn Provisioner>,
    source_key: String,
    owners: Vec<String>,
    members: Vec<String>,
}

impl AddUserPermissions {
    pub fn new(
        provisioner: Arc<dyn Provisioner>,
        source_key: impl Into<String>,
        owners: Vec<String>,
        members: Vec<String>,
    ) -> Self {
        Self {
            provisioner,
            source_key: source_key.into(),
            owners,
            members,
        }
    }
}

#[async_trait]
impl ProvisioningStep for AddUserPermissions {
    async fn run(&self, _ctx: &StepContext) -> Result<()> {
        self.provisioner
            .add_user_permissions(&self.source_key, &self.owners, &self.members)
            .await
    }
}

pub struct CreateEnvironment {
    provisioner: Arc<dyn Provisioner>,
    project_name: String,
    environment_id: String,
}

impl CreateEnvironment {
    pub fn new(
        provisioner: Arc<dyn Provisioner>,
        project_name: impl Into<String>,
        environment_id: impl Into<String>,
    ) -> Self {
        Self {
            provisioner,
            project_name: project_name.into(),
            environment_id: environment_id.into(),
        }
    }
}

#[async_trait]
impl ProvisioningStep for CreateEnvironment {
    async fn run(&self, _ctx: &StepContext) -> Result<()> {
        self.provisioner
            .create_environment(&self.project_name, &self.environment_id)
            .await?;
        info!(project = %self.project_name, environment = %self.environment_id, "environment created");
        Ok(())
    }
}

pub struct RequestProd {
    provisioner: Arc<dyn Provisioner>,
    member_id: String,
    project_id: String,
}

impl RequestProd {
    pub fn new(
        provisioner: Arc<dyn Provisioner>,
        member_id: impl Into<String>,
        project_id: impl Into<String>,
    ) -> Self {
        Self {
            provisioner,
            member_id: member_id.into(),
            project_id: project_id.into(),
        }
    }
}

#[async_trait]
impl ProvisioningStep for RequestProd {
    async fn run(&self, _ctx: &StepContext) -> Result<()> {
        self.provisioner
            .request_prod(&self.member_id, &self.project_id)
            .await
    }
}

pub struct LinkRepository {
    provisioner: Arc<dyn Provisioner>,
    project_name: String,
    slug: String,
}

impl LinkRepository {
    pub fn new(
        provisioner: Arc<dyn Provisioner>,
        project_name: impl Into<String>,
        slug: impl Into<String>,
    ) -> Self {
        Self {
            provisioner,
            project_name: project_name.into(),
            slug: slug.into(),
        }
    }
}

#[async_trait]
impl ProvisioningStep for LinkRepository {
    async fn run(&self, _ctx: &StepContext) -> Result<()> {
        self.provisioner
            .link_repository(&self.project_name, &self.slug)
            .await?;
        info!(project = %self.project_name, slug = %self.slug, "repository linked");
        Ok(())
    }
}
