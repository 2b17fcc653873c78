//! Provider-agnostic data shapes returned by [`VcsClient`](crate::client::VcsClient).
//!
//! Every value here is a request-scoped snapshot: backends build a fresh value
//! per call and never mutate it afterwards. Fields a provider does not supply
//! stay zero-valued.

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported VCS hosting providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VcsProvider {
    #[serde(rename = "github")]
    GitHub,
    #[serde(rename = "gitlab")]
    GitLab,
    BitbucketServer,
    BitbucketCloud,
    AzureRepos,
}

impl VcsProvider {
    /// Identifier used in configuration files, env vars and CLI flags.
    #[must_use]
    pub fn as_config_str(&self) -> &'static str {
        match self {
            Self::GitHub => "github",
            Self::GitLab => "gitlab",
            Self::BitbucketServer => "bitbucket-server",
            Self::BitbucketCloud => "bitbucket-cloud",
            Self::AzureRepos => "azure-repos",
        }
    }
}

impl fmt::Display for VcsProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::GitHub => "GitHub",
            Self::GitLab => "GitLab",
            Self::BitbucketServer => "Bitbucket Server",
            Self::BitbucketCloud => "Bitbucket Cloud",
            Self::AzureRepos => "Azure Repos",
        };
        f.write_str(name)
    }
}

impl FromStr for VcsProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "github" => Ok(Self::GitHub),
            "gitlab" => Ok(Self::GitLab),
            "bitbucket-server" | "bitbucketserver" => Ok(Self::BitbucketServer),
            "bitbucket-cloud" | "bitbucketcloud" => Ok(Self::BitbucketCloud),
            "azure-repos" | "azurerepos" | "azure" => Ok(Self::AzureRepos),
            other => Err(format!("unknown VCS provider '{other}'")),
        }
    }
}

/// Connection descriptor every backend is constructed from.
#[derive(Clone)]
pub struct VcsInfo {
    /// Provider API endpoint, e.g. `https://dev.azure.com/my-org/`.
    pub api_endpoint: String,
    /// Access token; for Azure Repos a Personal Access Token.
    pub token: SecretString,
    /// Project (or owner) the client operates in.
    pub project: String,
    /// Username, for providers that authenticate with one.
    pub username: Option<String>,
}

impl VcsInfo {
    pub fn new(
        api_endpoint: impl Into<String>,
        token: impl Into<String>,
        project: impl Into<String>,
    ) -> Self {
        Self {
            api_endpoint: api_endpoint.into(),
            token: SecretString::from(token.into()),
            project: project.into(),
            username: None,
        }
    }
}

impl fmt::Debug for VcsInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VcsInfo")
            .field("api_endpoint", &self.api_endpoint)
            .field("token", &"[REDACTED]")
            .field("project", &self.project)
            .field("username", &self.username)
            .finish()
    }
}

/// URLs a repository can be cloned from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloneInfo {
    pub http: String,
    pub ssh: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepositoryVisibility {
    Public,
    Internal,
    #[default]
    Private,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryInfo {
    pub clone_info: CloneInfo,
    pub visibility: RepositoryVisibility,
}

/// A branch within a repository. `name` carries no `refs/heads/` prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchInfo {
    pub name: String,
    pub repository: String,
}

/// A commit snapshot.
///
/// `timestamp` is the committer time in unix seconds. The zero value
/// (`CommitInfo::default()`) is returned for branches without commits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitInfo {
    pub hash: String,
    pub author_name: String,
    pub committer_name: String,
    pub url: String,
    pub timestamp: i64,
    pub message: String,
    pub parent_hashes: Vec<String>,
}

impl CommitInfo {
    /// Whether this is the zero value returned for an empty branch.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestInfo {
    /// Provider-native identifier, unique within the provider only.
    pub id: i64,
    pub title: String,
    pub body: String,
    pub source: BranchInfo,
    pub target: BranchInfo,
}

/// A pull request comment.
///
/// Providers that group comments into threads (Azure Repos) return one
/// `CommentInfo` per thread: `id` is the thread id and `content` joins every
/// comment of the thread, one line each, in thread order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentInfo {
    pub id: i64,
    pub created: DateTime<Utc>,
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelInfo {
    pub name: String,
    pub description: String,
    pub color: String,
}

/// State reported against a commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommitStatus {
    #[serde(rename = "success")]
    Pass,
    #[serde(rename = "failure")]
    Fail,
    #[serde(rename = "pending")]
    InProgress,
    #[serde(rename = "error")]
    Error,
}

/// Access level of a repository deploy key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Permission {
    #[default]
    Read,
    ReadWrite,
}

/// Events a webhook can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WebhookEvent {
    PrOpened,
    PrEdited,
    PrMerged,
    PrRejected,
    Push,
    TagPushed,
    TagRemoved,
}
