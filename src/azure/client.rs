//! Azure Repos backend of the [`VcsClient`] contract.
//!
//! SDK calls go through [`GitOperations`]; the archive download and the
//! connection check use raw HTTP. The backend applies the Azure-specific
//! normalizations:
//!
//! - branch names gain `refs/heads/` on the way in and lose it on the way out
//! - pull request threads are flattened into one [`CommentInfo`] per thread
//! - the latest commit timestamp is the committer time

use async_trait::async_trait;
use azure_devops_rust_api::{Credential, git};
use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::http::{AzureEndpoint, AzureHttpClient};
use super::traits::{CommentThread, GitOperations, PullRequestRecord, RealGitOperations};
use crate::client::{VcsClient, run_cancellable};
use crate::error::{VcsError, VcsResult};
use crate::models::{
    BranchInfo, CommentInfo, CommitInfo, CommitStatus, LabelInfo, Permission, PullRequestInfo,
    RepositoryInfo, VcsInfo, VcsProvider, WebhookEvent,
};
use crate::utils::{add_branch_prefix, extract_zip_into, strip_branch_prefix};

/// Page size used when listing pull requests.
const PULL_REQUEST_PAGE_SIZE: i32 = 100;
/// Upper bound on page requests for a single listing.
const MAX_PAGE_REQUESTS: usize = 100;

const CLOUD_HOST: &str = "dev.azure.com";

/// Azure Repos client.
///
/// Construction performs no network I/O. The client holds only immutable
/// state and can be shared between tasks.
///
/// # Example
///
/// ```rust,no_run
/// use tokio_util::sync::CancellationToken;
/// use vcsclient::{AzureReposClient, VcsClient, models::VcsInfo};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let client = AzureReposClient::new(VcsInfo::new(
///     "https://dev.azure.com/my-org/",
///     "my-pat",
///     "my-project",
/// ))?;
///
/// let cancel = CancellationToken::new();
/// let prs = client.list_open_pull_requests(&cancel, "", "my-repo").await?;
/// println!("Found {} open pull requests", prs.len());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct AzureReposClient {
    info: VcsInfo,
    endpoint: AzureEndpoint,
    git: Arc<dyn GitOperations>,
    http: AzureHttpClient,
}

impl AzureReposClient {
    /// Creates a client backed by the Azure DevOps SDK.
    pub fn new(info: VcsInfo) -> VcsResult<Self> {
        let endpoint = AzureEndpoint::parse(&info.api_endpoint)?;
        let credential = Credential::from_pat(info.token.expose_secret().to_string());

        let mut builder = git::ClientBuilder::new(credential);
        if endpoint.base().host_str() != Some(CLOUD_HOST) {
            builder = builder.endpoint(endpoint.base().clone());
        }
        let git = Arc::new(RealGitOperations::new(builder.build()));

        Ok(Self::with_operations(info, endpoint, git))
    }

    /// Creates a client over an explicit [`GitOperations`] implementation.
    pub fn with_operations(
        info: VcsInfo,
        endpoint: AzureEndpoint,
        git: Arc<dyn GitOperations>,
    ) -> Self {
        let http = AzureHttpClient::new(&info.token);
        Self {
            info,
            endpoint,
            git,
            http,
        }
    }

    /// Returns the project the client operates in.
    pub fn project(&self) -> &str {
        &self.info.project
    }

    /// Returns the organization (or collection) name.
    pub fn organization(&self) -> &str {
        self.endpoint.organization()
    }

    fn unsupported<T>(operation: &str) -> VcsResult<T> {
        Err(VcsError::unsupported(operation, VcsProvider::AzureRepos))
    }

    fn pull_request_id(id: i64) -> VcsResult<i32> {
        i32::try_from(id)
            .map_err(|_| VcsError::validation(format!("pull request id {id} is out of range")))
    }

    fn to_pull_request_info(record: PullRequestRecord, repository: &str) -> PullRequestInfo {
        PullRequestInfo {
            id: i64::from(record.id),
            title: record.title,
            body: record.description,
            source: BranchInfo {
                name: strip_branch_prefix(&record.source_ref_name).to_string(),
                repository: repository.to_string(),
            },
            target: BranchInfo {
                name: strip_branch_prefix(&record.target_ref_name).to_string(),
                repository: repository.to_string(),
            },
        }
    }
}

/// Flattens pull request threads into comments, oldest thread first.
///
/// Each thread becomes one [`CommentInfo`] whose id is the thread id and
/// whose content holds every comment of the thread, one line each.
pub fn flatten_threads(threads: Vec<CommentThread>) -> Vec<CommentInfo> {
    let mut comments: Vec<CommentInfo> = threads
        .into_iter()
        .map(|thread| {
            let content = thread
                .comments
                .iter()
                .map(|c| format!("Author: {}, Id: {}, Content:{}\n", c.author, c.id, c.content))
                .collect::<String>();
            CommentInfo {
                id: i64::from(thread.id),
                created: thread.published.unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
                content,
            }
        })
        .collect();
    comments.sort_by_key(|comment| comment.created);
    comments
}

#[async_trait]
impl VcsClient for AzureReposClient {
    async fn test_connection(&self, cancel: &CancellationToken) -> VcsResult<()> {
        let url = self.endpoint.resource_areas_url();
        debug!(url = %url, "testing connection");
        run_cancellable(cancel, self.http.get_resource_areas(url)).await
    }

    async fn list_repositories(
        &self,
        cancel: &CancellationToken,
    ) -> VcsResult<HashMap<String, Vec<String>>> {
        let names = run_cancellable(
            cancel,
            self.git
                .list_repositories(self.organization(), &self.info.project),
        )
        .await?;

        let mut repositories = HashMap::new();
        if !names.is_empty() {
            repositories.insert(self.info.project.clone(), names);
        }
        Ok(repositories)
    }

    async fn list_branches(
        &self,
        cancel: &CancellationToken,
        _owner: &str,
        repository: &str,
    ) -> VcsResult<Vec<String>> {
        let refs = run_cancellable(
            cancel,
            self.git
                .list_branch_refs(self.organization(), repository, &self.info.project),
        )
        .await?;
        Ok(refs
            .iter()
            .map(|reference| strip_branch_prefix(reference).to_string())
            .collect())
    }

    async fn download_repository(
        &self,
        cancel: &CancellationToken,
        _owner: &str,
        repository: &str,
        branch: &str,
        destination: &Path,
    ) -> VcsResult<()> {
        if !destination.is_dir() {
            return Err(VcsError::validation(format!(
                "destination {} is not an existing directory",
                destination.display()
            )));
        }

        let url = self
            .endpoint
            .archive_url(&self.info.project, repository, strip_branch_prefix(branch));
        debug!(url = %url, "download url");
        let archive = run_cancellable(cancel, self.http.download_archive(url)).await?;
        info!(
            repository,
            bytes = archive.len(),
            "downloaded successfully, starting with repository extraction"
        );

        // Extraction runs to completion once started.
        if cancel.is_cancelled() {
            return Err(VcsError::Canceled);
        }
        let target = destination.to_path_buf();
        let placed = tokio::task::spawn_blocking(move || extract_zip_into(&archive, &target))
            .await
            .map_err(|e| VcsError::Transient {
                message: format!("repository extraction did not complete: {e}"),
            })??;

        info!(repository, entries = placed, "extracted repository successfully");
        Ok(())
    }

    async fn create_pull_request(
        &self,
        cancel: &CancellationToken,
        _owner: &str,
        repository: &str,
        source_branch: &str,
        target_branch: &str,
        title: &str,
        description: &str,
    ) -> VcsResult<()> {
        if source_branch.trim().is_empty() || target_branch.trim().is_empty() {
            return Err(VcsError::validation(
                "source and target branches must not be empty",
            ));
        }
        let source_ref = add_branch_prefix(source_branch.trim());
        let target_ref = add_branch_prefix(target_branch.trim());
        if source_ref == target_ref {
            return Err(VcsError::validation(format!(
                "source and target branch are both '{}'",
                strip_branch_prefix(&source_ref)
            )));
        }

        debug!(title, source = %source_ref, target = %target_ref, "creating new pull request");
        run_cancellable(
            cancel,
            self.git.create_pull_request(
                self.organization(),
                repository,
                &self.info.project,
                &source_ref,
                &target_ref,
                title,
                description,
            ),
        )
        .await
    }

    async fn add_pull_request_comment(
        &self,
        cancel: &CancellationToken,
        _owner: &str,
        repository: &str,
        content: &str,
        pull_request_id: i64,
    ) -> VcsResult<()> {
        let id = Self::pull_request_id(pull_request_id)?;
        // A new comment is always a new thread holding that single comment.
        run_cancellable(
            cancel,
            self.git
                .create_thread(self.organization(), repository, id, &self.info.project, content),
        )
        .await
    }

    async fn list_pull_request_comments(
        &self,
        cancel: &CancellationToken,
        _owner: &str,
        repository: &str,
        pull_request_id: i64,
    ) -> VcsResult<Vec<CommentInfo>> {
        let id = Self::pull_request_id(pull_request_id)?;
        let threads = run_cancellable(
            cancel,
            self.git
                .list_threads(self.organization(), repository, id, &self.info.project),
        )
        .await?;
        Ok(flatten_threads(threads))
    }

    async fn list_open_pull_requests(
        &self,
        cancel: &CancellationToken,
        _owner: &str,
        repository: &str,
    ) -> VcsResult<Vec<PullRequestInfo>> {
        debug!(repository, "fetching open pull requests");
        let mut pull_requests = Vec::new();
        let mut skip = 0;

        for _ in 0..MAX_PAGE_REQUESTS {
            let page = run_cancellable(
                cancel,
                self.git.get_active_pull_requests(
                    self.organization(),
                    repository,
                    &self.info.project,
                    PULL_REQUEST_PAGE_SIZE,
                    skip,
                ),
            )
            .await?;

            let fetched = page.len();
            pull_requests.extend(
                page.into_iter()
                    .map(|record| Self::to_pull_request_info(record, repository)),
            );
            if fetched < PULL_REQUEST_PAGE_SIZE as usize {
                return Ok(pull_requests);
            }
            skip += PULL_REQUEST_PAGE_SIZE;
        }

        Err(VcsError::Transient {
            message: format!(
                "exceeded maximum number of requests ({MAX_PAGE_REQUESTS}) while fetching pull requests, retrieved {} so far",
                pull_requests.len()
            ),
        })
    }

    async fn get_latest_commit(
        &self,
        cancel: &CancellationToken,
        _owner: &str,
        repository: &str,
        branch: &str,
    ) -> VcsResult<CommitInfo> {
        let commits = run_cancellable(
            cancel,
            self.git.get_branch_commits(
                self.organization(),
                repository,
                &self.info.project,
                strip_branch_prefix(branch),
                1,
            ),
        )
        .await?;
        // Commits are returned newest first.
        Ok(commits.into_iter().next().unwrap_or_default())
    }

    async fn get_commit_by_sha(
        &self,
        _cancel: &CancellationToken,
        _owner: &str,
        _repository: &str,
        _sha: &str,
    ) -> VcsResult<CommitInfo> {
        Self::unsupported("get commit by sha")
    }

    async fn get_repository_info(
        &self,
        _cancel: &CancellationToken,
        _owner: &str,
        _repository: &str,
    ) -> VcsResult<RepositoryInfo> {
        Self::unsupported("get repository info")
    }

    async fn create_label(
        &self,
        _cancel: &CancellationToken,
        _owner: &str,
        _repository: &str,
        _label: LabelInfo,
    ) -> VcsResult<()> {
        Self::unsupported("create label")
    }

    async fn get_label(
        &self,
        _cancel: &CancellationToken,
        _owner: &str,
        _repository: &str,
        _name: &str,
    ) -> VcsResult<Option<LabelInfo>> {
        Self::unsupported("get label")
    }

    async fn list_pull_request_labels(
        &self,
        _cancel: &CancellationToken,
        _owner: &str,
        _repository: &str,
        _pull_request_id: i64,
    ) -> VcsResult<Vec<String>> {
        Self::unsupported("list pull request labels")
    }

    async fn unlabel_pull_request(
        &self,
        _cancel: &CancellationToken,
        _owner: &str,
        _repository: &str,
        _name: &str,
        _pull_request_id: i64,
    ) -> VcsResult<()> {
        Self::unsupported("unlabel pull request")
    }

    async fn upload_code_scanning(
        &self,
        _cancel: &CancellationToken,
        _owner: &str,
        _repository: &str,
        _branch: &str,
        _scan_results: &str,
    ) -> VcsResult<String> {
        Self::unsupported("upload code scanning")
    }

    async fn create_webhook(
        &self,
        _cancel: &CancellationToken,
        _owner: &str,
        _repository: &str,
        _branch: &str,
        _payload_url: &str,
        _events: &[WebhookEvent],
    ) -> VcsResult<(String, String)> {
        Self::unsupported("create webhook")
    }

    async fn update_webhook(
        &self,
        _cancel: &CancellationToken,
        _owner: &str,
        _repository: &str,
        _branch: &str,
        _payload_url: &str,
        _token: &str,
        _webhook_id: &str,
        _events: &[WebhookEvent],
    ) -> VcsResult<()> {
        Self::unsupported("update webhook")
    }

    async fn delete_webhook(
        &self,
        _cancel: &CancellationToken,
        _owner: &str,
        _repository: &str,
        _webhook_id: &str,
    ) -> VcsResult<()> {
        Self::unsupported("delete webhook")
    }

    async fn set_commit_status(
        &self,
        _cancel: &CancellationToken,
        _status: CommitStatus,
        _owner: &str,
        _repository: &str,
        _reference: &str,
        _title: &str,
        _description: &str,
        _details_url: &str,
    ) -> VcsResult<()> {
        Self::unsupported("set commit status")
    }

    async fn add_ssh_key_to_repository(
        &self,
        _cancel: &CancellationToken,
        _owner: &str,
        _repository: &str,
        _key_name: &str,
        _public_key: &str,
        _permission: Permission,
    ) -> VcsResult<()> {
        Self::unsupported("add ssh key to repository")
    }
}
