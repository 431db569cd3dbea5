//! In-memory implementation of every service interface.
//!
//! Backs the test suites and the CLI's offline demo mode. State lives behind
//! one mutex; lookups clone out, so nothing holds the lock across an await.

use crate::directory::{
    MemberDirectory, ProjectDirectory, Provisioner, RepoDirectory, TeamDirectory,
};
use crate::model::{Member, NewProject, NewTeam, Project, Repository, SourceProject, Team};
use crate::directory::OpsServices;
use async_trait::async_trait;
use opsdeck_core::{OpsError, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct State {
    teams: Vec<Team>,
    projects: Vec<Project>,
    members: Vec<Member>,
    repositories: HashMap<String, Vec<Repository>>,
    environments: Vec<(String, String)>,
    prod_requests: Vec<(String, String)>,
    links: Vec<(String, String)>,
    /// Environment id that fails on creation, for failure-path tests.
    fail_environment: Option<String>,
}

#[derive(Default)]
pub struct InMemoryDirectory {
    state: Mutex<State>,
}

/// Wire one in-memory directory behind every service handle.
pub fn services(directory: Arc<InMemoryDirectory>) -> OpsServices {
    OpsServices {
        teams: directory.clone(),
        projects: directory.clone(),
        members: directory.clone(),
        repos: directory.clone(),
        provisioner: directory,
    }
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_member(self, member: Member) -> Self {
        self.state.lock().unwrap().members.push(member);
        self
    }

    pub fn with_team(self, team: Team) -> Self {
        self.state.lock().unwrap().teams.push(team);
        self
    }

    pub fn with_project(self, project: Project) -> Self {
        self.state.lock().unwrap().projects.push(project);
        self
    }

    pub fn with_repositories(self, source_key: &str, repos: Vec<Repository>) -> Self {
        self.state
            .lock()
            .unwrap()
            .repositories
            .insert(source_key.to_string(), repos);
        self
    }

    /// Make `create_environment` fail for the given environment id.
    pub fn fail_environment(&self, environment_id: &str) {
        self.state.lock().unwrap().fail_environment = Some(environment_id.to_string());
    }

    pub fn environments(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().environments.clone()
    }

    pub fn prod_requests(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().prod_requests.clone()
    }

    pub fn links(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().links.clone()
    }

    pub fn project(&self, name: &str) -> Option<Project> {
        self.state
            .lock()
            .unwrap()
            .projects
            .iter()
            .find(|p| p.name == name)
            .cloned()
    }
}

#[async_trait]
impl TeamDirectory for InMemoryDirectory {
    async fn team_for_channel(&self, channel: &str) -> Result<Option<Team>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .teams
            .iter()
            .find(|t| t.channel.as_deref() == Some(channel))
            .cloned())
    }

    async fn teams_for_member(&self, chat_user_id: &str) -> Result<Vec<Team>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .teams
            .iter()
            .filter(|t| {
                t.members.iter().any(|m| m == chat_user_id)
                    || t.owners.iter().any(|o| o == chat_user_id)
            })
            .cloned()
            .collect())
    }

    async fn team_by_name(&self, name: &str) -> Result<Option<Team>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .teams
            .iter()
            .find(|t| t.name == name)
            .cloned())
    }
}

#[async_trait]
impl ProjectDirectory for InMemoryDirectory {
    async fn projects_for_team(&self, team_name: &str) -> Result<Vec<Project>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .projects
            .iter()
            .filter(|p| p.team_name == team_name)
            .cloned()
            .collect())
    }

    async fn project_by_name(&self, name: &str) -> Result<Option<Project>> {
        Ok(self.project(name))
    }
}

#[async_trait]
impl MemberDirectory for InMemoryDirectory {
    async fn member_for_chat_user(&self, chat_user_id: &str) -> Result<Option<Member>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .members
            .iter()
            .find(|m| m.chat_user_id == chat_user_id)
            .cloned())
    }
}

#[async_trait]
impl RepoDirectory for InMemoryDirectory {
    async fn repositories_for_source_project(&self, key: &str) -> Result<Vec<Repository>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .repositories
            .get(key)
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl Provisioner for InMemoryDirectory {
    async fn create_team(&self, team: &NewTeam) -> Result<Team> {
        let mut state = self.state.lock().unwrap();
        if state.teams.iter().any(|t| t.name == team.name) {
            return Err(OpsError::Service(format!(
                "the team name '{}' is already in use; retry with a different name",
                team.name
            )));
        }
        let created = Team {
            team_id: format!("team-{}", state.teams.len() + 1),
            name: team.name.clone(),
            description: team.description.clone(),
            cloud: team.cloud.clone(),
            channel: None,
            owners: vec![team.created_by.clone()],
            members: Vec::new(),
        };
        state.teams.push(created.clone());
        Ok(created)
    }

    async fn create_project(&self, project: &NewProject) -> Result<Project> {
        let mut state = self.state.lock().unwrap();
        // Already existing is fine: provisioning must be safely repeatable.
        if let Some(existing) = state.projects.iter().find(|p| p.name == project.name) {
            return Ok(existing.clone());
        }
        let created = Project {
            project_id: format!("project-{}", state.projects.len() + 1),
            name: project.name.clone(),
            description: project.description.clone(),
            team_name: project.team_name.clone(),
            source_project: None,
        };
        state.projects.push(created.clone());
        Ok(created)
    }

    async fn create_source_project(
        &self,
        project_name: &str,
        key: &str,
    ) -> Result<SourceProject> {
        let source = SourceProject {
            key: key.to_string(),
            name: project_name.to_string(),
        };
        let mut state = self.state.lock().unwrap();
        if let Some(project) = state.projects.iter_mut().find(|p| p.name == project_name) {
            project.source_project = Some(source.clone());
        }
        state.repositories.entry(key.to_string()).or_default();
        Ok(source)
    }

    async fn add_access_keys(&self, _source_key: &str) -> Result<()> {
        Ok(())
    }

    async fn add_user_permissions(
        &self,
        _source_key: &str,
        _owners: &[String],
        _members: &[String],
    ) -> Result<()> {
        Ok(())
    }

    async fn create_environment(&self, project_name: &str, environment_id: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_environment.as_deref() == Some(environment_id) {
            return Err(OpsError::Service(format!(
                "quota exceeded creating environment '{environment_id}'"
            )));
        }
        let entry = (project_name.to_string(), environment_id.to_string());
        if !state.environments.contains(&entry) {
            state.environments.push(entry);
        }
        Ok(())
    }

    async fn request_prod(&self, member_id: &str, project_id: &str) -> Result<()> {
        self.state
            .lock()
            .unwrap()
            .prod_requests
            .push((member_id.to_string(), project_id.to_string()));
        Ok(())
    }

    async fn link_repository(&self, project_name: &str, slug: &str) -> Result<()> {
        self.state
            .lock()
            .unwrap()
            .links
            .push((project_name.to_string(), slug.to_string()));
        Ok(())
    }
}
