//! REST-backed implementation of the directory and provisioner interfaces.
//!
//! One client serves all five traits; paths hang off `services.base_url`.
//! Directory reads are plain GETs; provisioning writes are POST/PUT and are
//! idempotent on the server side (re-creating an existing resource is a
//! no-op there, except team names, which are reserved).

use crate::directory::{
    MemberDirectory, ProjectDirectory, Provisioner, RepoDirectory, TeamDirectory,
};
use crate::model::{Member, NewProject, NewTeam, Project, Repository, SourceProject, Team};
use async_trait::async_trait;
use opsdeck_core::config::ServiceConfig;
use opsdeck_core::{OpsError, Result};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

pub struct HttpDirectory {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpDirectory {
    pub fn new(config: &ServiceConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut builder = self
            .client
            .request(method, format!("{}{path}", self.base_url));
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    async fn send(&self, builder: RequestBuilder) -> Result<reqwest::Response> {
        let response = builder
            .send()
            .await
            .map_err(|e| OpsError::Service(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(OpsError::Service(format!(
                "service responded {status} for {}",
                response.url().path()
            )));
        }
        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.send(self.request(Method::GET, path)).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| OpsError::Service(format!("invalid response body: {e}")))
    }

    async fn write<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<reqwest::Response> {
        self.send(self.request(method, path).json(body)).await
    }
}

#[async_trait]
impl TeamDirectory for HttpDirectory {
    async fn team_for_channel(&self, channel: &str) -> Result<Option<Team>> {
        let teams: Vec<Team> = self.get_json(&format!("/teams?channel={channel}")).await?;
        Ok(teams.into_iter().next())
    }

    async fn teams_for_member(&self, chat_user_id: &str) -> Result<Vec<Team>> {
        self.get_json(&format!("/teams?member={chat_user_id}")).await
    }

    async fn team_by_name(&self, name: &str) -> Result<Option<Team>> {
        let teams: Vec<Team> = self.get_json(&format!("/teams?name={name}")).await?;
        Ok(teams.into_iter().next())
    }
}

#[async_trait]
impl ProjectDirectory for HttpDirectory {
    async fn projects_for_team(&self, team_name: &str) -> Result<Vec<Project>> {
        self.get_json(&format!("/projects?team={team_name}")).await
    }

    async fn project_by_name(&self, name: &str) -> Result<Option<Project>> {
        let projects: Vec<Project> = self.get_json(&format!("/projects?name={name}")).await?;
        Ok(projects.into_iter().next())
    }
}

#[async_trait]
impl MemberDirectory for HttpDirectory {
    async fn member_for_chat_user(&self, chat_user_id: &str) -> Result<Option<Member>> {
        let members: Vec<Member> = self
            .get_json(&format!("/members?chatUser={chat_user_id}"))
            .await?;
        Ok(members.into_iter().next())
    }
}

#[async_trait]
impl RepoDirectory for HttpDirectory {
    async fn repositories_for_source_project(&self, key: &str) -> Result<Vec<Repository>> {
        self.get_json(&format!("/source-projects/{key}/repositories"))
            .await
    }
}

#[async_trait]
impl Provisioner for HttpDirectory {
    async fn create_team(&self, team: &NewTeam) -> Result<Team> {
        let response = self
            .request(Method::POST, "/teams")
            .json(team)
            .send()
            .await
            .map_err(|e| OpsError::Service(e.to_string()))?;

        // A reserved name is user error, not a service fault — surface it
        // with enough guidance to retry differently.
        if response.status() == StatusCode::CONFLICT {
            return Err(OpsError::Service(format!(
                "the team name '{}' is already in use; retry with a different name",
                team.name
            )));
        }
        if !response.status().is_success() {
            return Err(OpsError::Service(format!(
                "service responded {} creating team '{}'",
                response.status(),
                team.name
            )));
        }
        response
            .json::<Team>()
            .await
            .map_err(|e| OpsError::Service(format!("invalid response body: {e}")))
    }

    async fn create_project(&self, project: &NewProject) -> Result<Project> {
        let response = self.write(Method::POST, "/projects", project).await?;
        response
            .json::<Project>()
            .await
            .map_err(|e| OpsError::Service(format!("invalid response body: {e}")))
    }

    async fn create_source_project(
        &self,
        project_name: &str,
        key: &str,
    ) -> Result<SourceProject> {
        let body = SourceProject {
            key: key.to_string(),
            name: project_name.to_string(),
        };
        let response = self
            .write(
                Method::POST,
                &format!("/projects/{project_name}/source-project"),
                &body,
            )
            .await?;
        response
            .json::<SourceProject>()
            .await
            .map_err(|e| OpsError::Service(format!("invalid response body: {e}")))
    }

    async fn add_access_keys(&self, source_key: &str) -> Result<()> {
        self.write(
            Method::PUT,
            &format!("/source-projects/{source_key}/access-keys"),
            &serde_json::json!({}),
        )
        .await?;
        Ok(())
    }

    async fn add_user_permissions(
        &self,
        source_key: &str,
        owners: &[String],
        members: &[String],
    ) -> Result<()> {
        self.write(
            Method::PUT,
            &format!("/source-projects/{source_key}/permissions"),
            &serde_json::json!({ "owners": owners, "members": members }),
        )
        .await?;
        Ok(())
    }

    async fn create_environment(&self, project_name: &str, environment_id: &str) -> Result<()> {
        self.write(
            Method::PUT,
            &format!("/projects/{project_name}/environments/{environment_id}"),
            &serde_json::json!({}),
        )
        .await?;
        Ok(())
    }

    async fn request_prod(&self, member_id: &str, project_id: &str) -> Result<()> {
        self.write(
            Method::POST,
            "/prod-requests",
            &serde_json::json!({ "memberId": member_id, "projectId": project_id }),
        )
        .await?;
        Ok(())
    }

    async fn link_repository(&self, project_name: &str, slug: &str) -> Result<()> {
        self.write(
            Method::PUT,
            &format!("/projects/{project_name}/repository"),
            &serde_json::json!({ "slug": slug }),
        )
        .await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
