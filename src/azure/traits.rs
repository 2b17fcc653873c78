//! Traits for Azure Repos git operations.
//!
//! These traits abstract the SDK calls the backend makes, so the
//! normalization logic in [`AzureReposClient`](super::AzureReposClient) can be
//! tested against mocks. Every method returns an already-classified
//! [`VcsError`]; SDK error types never leave this module.

use async_trait::async_trait;
use azure_devops_rust_api::git;
use azure_devops_rust_api::git::models as git_models;
use chrono::{DateTime, Utc};

use crate::error::{VcsError, VcsResult};
use crate::models::CommitInfo;

/// A pull request as returned by the provider, before branch normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PullRequestRecord {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub source_ref_name: String,
    pub target_ref_name: String,
}

/// A single comment inside a thread.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThreadComment {
    pub id: i64,
    pub author: String,
    pub content: String,
}

/// A pull request comment thread, comments in thread order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentThread {
    pub id: i32,
    pub published: Option<DateTime<Utc>>,
    pub comments: Vec<ThreadComment>,
}

/// Trait for repository and ref operations.
#[async_trait]
pub trait RepositoryOperations: Send + Sync {
    /// Lists repository names of a project.
    async fn list_repositories(&self, organization: &str, project: &str)
    -> VcsResult<Vec<String>>;

    /// Lists fully qualified branch refs (`refs/heads/...`) of a repository.
    async fn list_branch_refs(
        &self,
        organization: &str,
        repository: &str,
        project: &str,
    ) -> VcsResult<Vec<String>>;
}

/// Trait for pull request operations.
#[allow(clippy::too_many_arguments)]
#[async_trait]
pub trait PullRequestOperations: Send + Sync {
    /// Creates a pull request between two fully qualified refs.
    async fn create_pull_request(
        &self,
        organization: &str,
        repository: &str,
        project: &str,
        source_ref: &str,
        target_ref: &str,
        title: &str,
        description: &str,
    ) -> VcsResult<()>;

    /// Fetches one page of active pull requests.
    async fn get_active_pull_requests(
        &self,
        organization: &str,
        repository: &str,
        project: &str,
        top: i32,
        skip: i32,
    ) -> VcsResult<Vec<PullRequestRecord>>;
}

/// Trait for pull request thread operations.
#[async_trait]
pub trait ThreadOperations: Send + Sync {
    /// Opens a new active thread holding a single comment.
    async fn create_thread(
        &self,
        organization: &str,
        repository: &str,
        pull_request_id: i32,
        project: &str,
        content: &str,
    ) -> VcsResult<()>;

    /// Lists every thread of a pull request.
    async fn list_threads(
        &self,
        organization: &str,
        repository: &str,
        pull_request_id: i32,
        project: &str,
    ) -> VcsResult<Vec<CommentThread>>;
}

/// Trait for commit operations.
#[async_trait]
pub trait CommitOperations: Send + Sync {
    /// Lists the newest `top` commits reachable from `branch`, newest first.
    async fn get_branch_commits(
        &self,
        organization: &str,
        repository: &str,
        project: &str,
        branch: &str,
        top: i32,
    ) -> VcsResult<Vec<CommitInfo>>;
}

/// Combined trait for all git operations the backend needs.
pub trait GitOperations:
    RepositoryOperations + PullRequestOperations + ThreadOperations + CommitOperations + Send + Sync
{
}

impl<T> GitOperations for T where
    T: RepositoryOperations
        + PullRequestOperations
        + ThreadOperations
        + CommitOperations
        + Send
        + Sync
{
}

/// Maps an SDK failure onto the error taxonomy.
///
/// Failures without an HTTP status are told apart by their source chain. A
/// body that is not JSON is the sign-in page served for a rejected PAT, which
/// the SDK reports as a decode failure of a `203` response. Only I/O and
/// connect failures mean the provider was never reached.
fn classify<E>(status: Option<u16>, err: &E, context: &str) -> VcsError
where
    E: std::error::Error + 'static,
{
    let message = format!("{context}: {err}");
    if let Some(status) = status {
        return VcsError::from_status(status, message);
    }

    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(cause) = source {
        if cause.is::<serde_json::Error>() {
            return VcsError::Auth {
                message: format!(
                    "{message} (response was not JSON, credentials were likely not accepted)"
                ),
            };
        }
        if let Some(transport) = cause.downcast_ref::<reqwest::Error>() {
            if transport.is_timeout() {
                return VcsError::Transient { message };
            }
            if transport.is_connect() {
                return VcsError::Connection { message };
            }
        }
        if cause.is::<std::io::Error>() {
            return VcsError::Connection { message };
        }
        source = cause.source();
    }

    VcsError::Transient { message }
}

/// Real implementation wrapping azure_devops_rust_api::git::Client.
#[derive(Clone)]
pub struct RealGitOperations {
    client: git::Client,
}

impl RealGitOperations {
    /// Creates a new RealGitOperations wrapper.
    pub fn new(client: git::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RepositoryOperations for RealGitOperations {
    async fn list_repositories(
        &self,
        organization: &str,
        project: &str,
    ) -> VcsResult<Vec<String>> {
        let response = self
            .client
            .repositories_client()
            .list(organization, project)
            .await
            .map_err(|e| {
                classify(
                    e.http_status().map(u16::from),
                    &e,
                    &format!("failed to list repositories of project {project}"),
                )
            })?;
        Ok(response.value.into_iter().map(|repo| repo.name).collect())
    }

    async fn list_branch_refs(
        &self,
        organization: &str,
        repository: &str,
        project: &str,
    ) -> VcsResult<Vec<String>> {
        let response = self
            .client
            .refs_client()
            .list(organization, repository, project)
            .filter("heads/")
            .await
            .map_err(|e| {
                classify(
                    e.http_status().map(u16::from),
                    &e,
                    &format!("failed to list branches of repository {repository}"),
                )
            })?;
        Ok(response
            .value
            .into_iter()
            .map(|reference| reference.name)
            .collect())
    }
}

#[async_trait]
impl PullRequestOperations for RealGitOperations {
    async fn create_pull_request(
        &self,
        organization: &str,
        repository: &str,
        project: &str,
        source_ref: &str,
        target_ref: &str,
        title: &str,
        description: &str,
    ) -> VcsResult<()> {
        let mut options = git_models::GitPullRequestCreateOptions::new(
            source_ref.to_string(),
            target_ref.to_string(),
            title.to_string(),
        );
        options.description = Some(description.to_string());

        self.client
            .pull_requests_client()
            .create(organization, repository, project, options)
            .await
            .map_err(|e| {
                classify(
                    e.http_status().map(u16::from),
                    &e,
                    &format!("failed to create pull request {source_ref} -> {target_ref}"),
                )
            })?;
        Ok(())
    }

    async fn get_active_pull_requests(
        &self,
        organization: &str,
        repository: &str,
        project: &str,
        top: i32,
        skip: i32,
    ) -> VcsResult<Vec<PullRequestRecord>> {
        let response = self
            .client
            .pull_requests_client()
            .get_pull_requests(organization, repository, project)
            .search_criteria_status("active")
            .top(top)
            .skip(skip)
            .await
            .map_err(|e| {
                classify(
                    e.http_status().map(u16::from),
                    &e,
                    &format!("failed to fetch open pull requests of {repository}"),
                )
            })?;
        Ok(response
            .value
            .into_iter()
            .map(PullRequestRecord::from)
            .collect())
    }
}

#[async_trait]
impl ThreadOperations for RealGitOperations {
    async fn create_thread(
        &self,
        organization: &str,
        repository: &str,
        pull_request_id: i32,
        project: &str,
        content: &str,
    ) -> VcsResult<()> {
        let thread = git_models::GitPullRequestCommentThread {
            comment_thread: git_models::CommentThread {
                comments: vec![git_models::Comment {
                    content: Some(content.to_string()),
                    ..Default::default()
                }],
                status: Some(git_models::comment_thread::Status::Active),
                ..Default::default()
            },
            ..Default::default()
        };

        self.client
            .pull_request_threads_client()
            .create(organization, thread, repository, pull_request_id, project)
            .await
            .map_err(|e| {
                classify(
                    e.http_status().map(u16::from),
                    &e,
                    &format!("failed to comment on pull request {pull_request_id}"),
                )
            })?;
        Ok(())
    }

    async fn list_threads(
        &self,
        organization: &str,
        repository: &str,
        pull_request_id: i32,
        project: &str,
    ) -> VcsResult<Vec<CommentThread>> {
        let response = self
            .client
            .pull_request_threads_client()
            .list(organization, repository, pull_request_id, project)
            .await
            .map_err(|e| {
                classify(
                    e.http_status().map(u16::from),
                    &e,
                    &format!("failed to list threads of pull request {pull_request_id}"),
                )
            })?;
        Ok(response
            .value
            .into_iter()
            .map(CommentThread::from)
            .collect())
    }
}

#[async_trait]
impl CommitOperations for RealGitOperations {
    async fn get_branch_commits(
        &self,
        organization: &str,
        repository: &str,
        project: &str,
        branch: &str,
        top: i32,
    ) -> VcsResult<Vec<CommitInfo>> {
        let response = self
            .client
            .commits_client()
            .get_commits(organization, repository, project)
            .search_criteria_item_version_version(branch)
            .search_criteria_item_version_version_type("branch")
            .search_criteria_top(top)
            .await
            .map_err(|e| {
                classify(
                    e.http_status().map(u16::from),
                    &e,
                    &format!("failed to fetch commits of branch {branch}"),
                )
            })?;
        Ok(response.value.into_iter().map(CommitInfo::from).collect())
    }
}
