//! Narrow service interfaces the engine's surroundings are reached through.
//!
//! The read-only directory traits are what parameter setters query: pure
//! lookups, retried only by the user re-invoking the command. The
//! `Provisioner` is what provisioning steps and command bodies mutate through.
//! Keeping reads and writes on separate traits keeps the setter side honest.

use crate::model::{Member, NewProject, NewTeam, Project, Repository, SourceProject, Team};
use async_trait::async_trait;
use opsdeck_core::Result;
use std::sync::Arc;

#[async_trait]
pub trait TeamDirectory: Send + Sync {
    /// The team bound to a chat channel, if the channel is team-mapped.
    async fn team_for_channel(&self, channel: &str) -> Result<Option<Team>>;

    /// Teams the given chat user belongs to.
    async fn teams_for_member(&self, chat_user_id: &str) -> Result<Vec<Team>>;

    async fn team_by_name(&self, name: &str) -> Result<Option<Team>>;
}

#[async_trait]
pub trait ProjectDirectory: Send + Sync {
    async fn projects_for_team(&self, team_name: &str) -> Result<Vec<Project>>;

    async fn project_by_name(&self, name: &str) -> Result<Option<Project>>;
}

#[async_trait]
pub trait MemberDirectory: Send + Sync {
    async fn member_for_chat_user(&self, chat_user_id: &str) -> Result<Option<Member>>;
}

#[async_trait]
pub trait RepoDirectory: Send + Sync {
    async fn repositories_for_source_project(&self, key: &str) -> Result<Vec<Repository>>;
}

/// Mutating operations. Each must tolerate its resource already existing:
/// two users may provision overlapping infrastructure concurrently and the
/// core provides no cross-invocation locking.
#[async_trait]
pub trait Provisioner: Send + Sync {
    async fn create_team(&self, team: &NewTeam) -> Result<Team>;

    async fn create_project(&self, project: &NewProject) -> Result<Project>;

    async fn create_source_project(&self, project_name: &str, key: &str)
        -> Result<SourceProject>;

    async fn add_access_keys(&self, source_key: &str) -> Result<()>;

    async fn add_user_permissions(
        &self,
        source_key: &str,
        owners: &[String],
        members: &[String],
    ) -> Result<()>;

    async fn create_environment(&self, project_name: &str, environment_id: &str) -> Result<()>;

    async fn request_prod(&self, member_id: &str, project_id: &str) -> Result<()>;

    async fn link_repository(&self, project_name: &str, slug: &str) -> Result<()>;
}

/// The full set of service handles a command needs, wired once at startup.
#[derive(Clone)]
pub struct OpsServices {
    pub teams: Arc<dyn TeamDirectory>,
    pub projects: Arc<dyn ProjectDirectory>,
    pub members: Arc<dyn MemberDirectory>,
    pub repos: Arc<dyn RepoDirectory>,
    pub provisioner: Arc<dyn Provisioner>,
}
