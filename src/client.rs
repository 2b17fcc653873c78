//! The provider-agnostic VCS client contract.
//!
//! [`VcsClient`] is the only surface callers program against. Every backend
//! implements every method; operations a provider cannot perform return
//! [`VcsError::Unsupported`] so callers can detect the gap by error kind.
//!
//! ## Example
//!
//! ```rust,no_run
//! use tokio_util::sync::CancellationToken;
//! use vcsclient::{ClientBuilder, models::VcsProvider};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ClientBuilder::new(VcsProvider::AzureRepos)
//!     .api_endpoint("https://dev.azure.com/my-org/")
//!     .token("my-pat")
//!     .project("my-project")
//!     .build()?;
//!
//! let cancel = CancellationToken::new();
//! let branches = client.list_branches(&cancel, "", "my-repo").await?;
//! println!("Found {} branches", branches.len());
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use secrecy::SecretString;
use std::collections::HashMap;
use std::future::Future;
use std::path::Path;
use tokio_util::sync::CancellationToken;

use crate::azure::AzureReposClient;
use crate::error::{VcsError, VcsResult};
use crate::models::{
    CommentInfo, CommitInfo, CommitStatus, LabelInfo, Permission, PullRequestInfo,
    RepositoryInfo, VcsInfo, VcsProvider, WebhookEvent,
};

/// Uniform operations over a VCS hosting provider.
///
/// Every method takes a cancellation token; cancelling it aborts in-flight
/// network I/O and yields [`VcsError::Canceled`]. Implementations hold no
/// mutable shared state and are safe to call concurrently.
#[allow(clippy::too_many_arguments)]
#[async_trait]
pub trait VcsClient: Send + Sync {
    /// Verifies the credentials and that the endpoint is reachable.
    async fn test_connection(&self, cancel: &CancellationToken) -> VcsResult<()>;

    /// Lists repository names, keyed by project/owner.
    async fn list_repositories(
        &self,
        cancel: &CancellationToken,
    ) -> VcsResult<HashMap<String, Vec<String>>>;

    /// Lists branch names of a repository, without the `refs/heads/` prefix.
    async fn list_branches(
        &self,
        cancel: &CancellationToken,
        owner: &str,
        repository: &str,
    ) -> VcsResult<Vec<String>>;

    /// Extracts a snapshot of `branch` into the existing directory `destination`.
    ///
    /// On failure nothing new is left behind in `destination`.
    async fn download_repository(
        &self,
        cancel: &CancellationToken,
        owner: &str,
        repository: &str,
        branch: &str,
        destination: &Path,
    ) -> VcsResult<()>;

    /// Opens a pull request. Not idempotent.
    async fn create_pull_request(
        &self,
        cancel: &CancellationToken,
        owner: &str,
        repository: &str,
        source_branch: &str,
        target_branch: &str,
        title: &str,
        description: &str,
    ) -> VcsResult<()>;

    async fn add_pull_request_comment(
        &self,
        cancel: &CancellationToken,
        owner: &str,
        repository: &str,
        content: &str,
        pull_request_id: i64,
    ) -> VcsResult<()>;

    /// Lists pull request comments, oldest first.
    async fn list_pull_request_comments(
        &self,
        cancel: &CancellationToken,
        owner: &str,
        repository: &str,
        pull_request_id: i64,
    ) -> VcsResult<Vec<CommentInfo>>;

    /// Lists pull requests in the provider's open/active state.
    async fn list_open_pull_requests(
        &self,
        cancel: &CancellationToken,
        owner: &str,
        repository: &str,
    ) -> VcsResult<Vec<PullRequestInfo>>;

    /// Returns the head commit of `branch`, or the zero value if it has none.
    async fn get_latest_commit(
        &self,
        cancel: &CancellationToken,
        owner: &str,
        repository: &str,
        branch: &str,
    ) -> VcsResult<CommitInfo>;

    async fn get_commit_by_sha(
        &self,
        cancel: &CancellationToken,
        owner: &str,
        repository: &str,
        sha: &str,
    ) -> VcsResult<CommitInfo>;

    async fn get_repository_info(
        &self,
        cancel: &CancellationToken,
        owner: &str,
        repository: &str,
    ) -> VcsResult<RepositoryInfo>;

    async fn create_label(
        &self,
        cancel: &CancellationToken,
        owner: &str,
        repository: &str,
        label: LabelInfo,
    ) -> VcsResult<()>;

    /// Returns `None` when no label with `name` exists.
    async fn get_label(
        &self,
        cancel: &CancellationToken,
        owner: &str,
        repository: &str,
        name: &str,
    ) -> VcsResult<Option<LabelInfo>>;

    async fn list_pull_request_labels(
        &self,
        cancel: &CancellationToken,
        owner: &str,
        repository: &str,
        pull_request_id: i64,
    ) -> VcsResult<Vec<String>>;

    async fn unlabel_pull_request(
        &self,
        cancel: &CancellationToken,
        owner: &str,
        repository: &str,
        name: &str,
        pull_request_id: i64,
    ) -> VcsResult<()>;

    /// Uploads SARIF results and returns the provider's upload id.
    async fn upload_code_scanning(
        &self,
        cancel: &CancellationToken,
        owner: &str,
        repository: &str,
        branch: &str,
        scan_results: &str,
    ) -> VcsResult<String>;

    /// Creates a webhook and returns `(webhook_id, token)`.
    async fn create_webhook(
        &self,
        cancel: &CancellationToken,
        owner: &str,
        repository: &str,
        branch: &str,
        payload_url: &str,
        events: &[WebhookEvent],
    ) -> VcsResult<(String, String)>;

    async fn update_webhook(
        &self,
        cancel: &CancellationToken,
        owner: &str,
        repository: &str,
        branch: &str,
        payload_url: &str,
        token: &str,
        webhook_id: &str,
        events: &[WebhookEvent],
    ) -> VcsResult<()>;

    async fn delete_webhook(
        &self,
        cancel: &CancellationToken,
        owner: &str,
        repository: &str,
        webhook_id: &str,
    ) -> VcsResult<()>;

    async fn set_commit_status(
        &self,
        cancel: &CancellationToken,
        status: CommitStatus,
        owner: &str,
        repository: &str,
        reference: &str,
        title: &str,
        description: &str,
        details_url: &str,
    ) -> VcsResult<()>;

    async fn add_ssh_key_to_repository(
        &self,
        cancel: &CancellationToken,
        owner: &str,
        repository: &str,
        key_name: &str,
        public_key: &str,
        permission: Permission,
    ) -> VcsResult<()>;
}

/// Runs `operation` until it completes or `cancel` fires.
///
/// Cancellation wins when both are ready, so an already-cancelled token never
/// starts a request.
pub async fn run_cancellable<T, F>(cancel: &CancellationToken, operation: F) -> VcsResult<T>
where
    F: Future<Output = VcsResult<T>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(VcsError::Canceled),
        result = operation => result,
    }
}

/// Builds a boxed [`VcsClient`] for a provider from connection fields.
///
/// Building performs no network I/O.
#[derive(Debug, Clone)]
pub struct ClientBuilder {
    provider: VcsProvider,
    api_endpoint: String,
    token: Option<SecretString>,
    project: String,
    username: Option<String>,
}

impl ClientBuilder {
    pub fn new(provider: VcsProvider) -> Self {
        Self {
            provider,
            api_endpoint: String::new(),
            token: None,
            project: String::new(),
            username: None,
        }
    }

    pub fn api_endpoint(mut self, api_endpoint: impl Into<String>) -> Self {
        self.api_endpoint = api_endpoint.into();
        self
    }

    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(SecretString::from(token.into()));
        self
    }

    pub fn secret_token(mut self, token: SecretString) -> Self {
        self.token = Some(token);
        self
    }

    pub fn project(mut self, project: impl Into<String>) -> Self {
        self.project = project.into();
        self
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Builds the client.
    ///
    /// Fails with [`VcsError::Validation`] on a missing endpoint or token,
    /// and with [`VcsError::Unsupported`] for providers without a backend in
    /// this crate.
    pub fn build(self) -> VcsResult<Box<dyn VcsClient>> {
        if self.api_endpoint.trim().is_empty() {
            return Err(VcsError::validation("API endpoint must not be empty"));
        }
        let token = self
            .token
            .ok_or_else(|| VcsError::validation("an access token is required"))?;
        let info = VcsInfo {
            api_endpoint: self.api_endpoint,
            token,
            project: self.project,
            username: self.username,
        };

        match self.provider {
            VcsProvider::AzureRepos => Ok(Box::new(AzureReposClient::new(info)?)),
            other => Err(VcsError::unsupported("building a client", other)),
        }
    }
}
