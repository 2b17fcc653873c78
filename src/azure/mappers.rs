//! Model mapping utilities for converting azure_devops_rust_api types into our types.
//!
//! The SDK models are auto-generated and mostly optional; these conversions
//! pick the fields the uniform interface needs and zero-fill the rest.

use azure_devops_rust_api::git::models as git_models;
use chrono::{DateTime, Utc};

use super::traits::{CommentThread, PullRequestRecord, ThreadComment};
use crate::models::CommitInfo;

/// Converts an SDK timestamp into a UTC `chrono` timestamp.
#[must_use]
pub fn to_utc(timestamp: time::OffsetDateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(timestamp.unix_timestamp(), timestamp.nanosecond())
}

/// Convert azure_devops_rust_api GitPullRequest to a PullRequestRecord.
impl From<git_models::GitPullRequest> for PullRequestRecord {
    fn from(pr: git_models::GitPullRequest) -> Self {
        PullRequestRecord {
            id: pr.pull_request_id,
            title: pr.title.unwrap_or_default(),
            description: pr.description.unwrap_or_default(),
            source_ref_name: pr.source_ref_name,
            target_ref_name: pr.target_ref_name,
        }
    }
}

/// Convert azure_devops_rust_api GitPullRequestCommentThread to a CommentThread.
impl From<git_models::GitPullRequestCommentThread> for CommentThread {
    fn from(thread: git_models::GitPullRequestCommentThread) -> Self {
        let thread = thread.comment_thread;
        CommentThread {
            id: thread.id.unwrap_or_default(),
            published: thread.published_date.and_then(to_utc),
            comments: thread
                .comments
                .into_iter()
                .map(|comment| ThreadComment {
                    id: comment.id.unwrap_or_default(),
                    author: comment
                        .author
                        .and_then(|author| author.graph_subject_base.display_name)
                        .unwrap_or_default(),
                    content: comment.content.unwrap_or_default(),
                })
                .collect(),
        }
    }
}

/// Convert azure_devops_rust_api GitCommitRef to CommitInfo.
///
/// The timestamp is taken from the committer, not the author.
impl From<git_models::GitCommitRef> for CommitInfo {
    fn from(commit: git_models::GitCommitRef) -> Self {
        let (committer_name, timestamp) = commit
            .committer
            .map(|committer| {
                (
                    committer.name.unwrap_or_default(),
                    committer
                        .date
                        .map(|date| date.unix_timestamp())
                        .unwrap_or_default(),
                )
            })
            .unwrap_or_default();

        CommitInfo {
            hash: commit.commit_id.unwrap_or_default(),
            author_name: commit
                .author
                .and_then(|author| author.name)
                .unwrap_or_default(),
            committer_name,
            url: commit.url.unwrap_or_default(),
            timestamp,
            message: commit.comment.unwrap_or_default(),
            parent_hashes: commit.parents,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Helper to create a minimal TeamProjectReference for testing
    fn create_test_project_ref() -> git_models::TeamProjectReference {
        git_models::TeamProjectReference {
            abbreviation: None,
            default_team_image_url: None,
            description: None,
            id: None,
            last_update_time: None,
            name: "test-project".to_string(),
            revision: None,
            state: None,
            url: None,
            visibility: git_models::team_project_reference::Visibility::Private,
        }
    }

    /// Helper to create a minimal GitRepository for testing
    fn create_test_repository() -> git_models::GitRepository {
        git_models::GitRepository {
            links: None,
            default_branch: None,
            id: "test-repo-id".to_string(),
            is_disabled: None,
            is_fork: None,
            is_in_maintenance: None,
            name: "test-repo".to_string(),
            parent_repository: None,
            project: create_test_project_ref(),
            remote_url: None,
            size: None,
            ssh_url: None,
            url: "https://test.url".to_string(),
            valid_remote_urls: vec![],
            web_url: None,
        }
    }

    fn create_test_identity() -> git_models::IdentityRef {
        git_models::IdentityRef {
            graph_subject_base: git_models::GraphSubjectBase {
                descriptor: None,
                display_name: Some("Jane Doe".to_string()),
                url: None,
                links: None,
            },
            directory_alias: None,
            id: String::new(),
            image_url: None,
            inactive: None,
            is_aad_identity: None,
            is_container: None,
            is_deleted_in_origin: None,
            profile_url: None,
            unique_name: None,
        }
    }

    /// Helper to create a GitPullRequest for testing
    fn create_test_git_pull_request(
        id: i32,
        title: Option<String>,
        description: Option<String>,
    ) -> git_models::GitPullRequest {
        git_models::GitPullRequest {
            links: None,
            artifact_id: None,
            auto_complete_set_by: None,
            closed_by: None,
            closed_date: None,
            code_review_id: None,
            commits: vec![],
            completion_options: None,
            completion_queue_time: None,
            created_by: create_test_identity(),
            creation_date: time::OffsetDateTime::now_utc(),
            description,
            fork_source: None,
            has_multiple_merge_bases: None,
            is_draft: false,
            labels: vec![],
            last_merge_commit: None,
            last_merge_source_commit: None,
            last_merge_target_commit: None,
            merge_failure_message: None,
            merge_failure_type: None,
            merge_id: None,
            merge_options: None,
            merge_status: None,
            pull_request_id: id,
            remote_url: None,
            repository: create_test_repository(),
            reviewers: vec![],
            source_ref_name: "refs/heads/feature".to_string(),
            status: git_models::git_pull_request::Status::Active,
            supports_iterations: None,
            target_ref_name: "refs/heads/main".to_string(),
            title,
            url: "https://test.url".to_string(),
            work_item_refs: vec![],
        }
    }

    fn create_test_commit_ref(
        committer_date: Option<time::OffsetDateTime>,
        author_date: Option<time::OffsetDateTime>,
    ) -> git_models::GitCommitRef {
        git_models::GitCommitRef {
            commit_id: Some("abc123".to_string()),
            url: Some("https://dev.azure.com/org/proj/_apis/git/commits/abc123".to_string()),
            author: Some(git_models::GitUserDate {
                date: author_date,
                email: None,
                image_url: None,
                name: Some("Author".to_string()),
            }),
            change_counts: None,
            changes: vec![],
            comment: Some("Fix the thing".to_string()),
            comment_truncated: None,
            commit_too_many_changes: None,
            committer: Some(git_models::GitUserDate {
                date: committer_date,
                email: None,
                image_url: None,
                name: Some("Committer".to_string()),
            }),
            links: None,
            parents: vec!["p1".to_string(), "p2".to_string()],
            push: None,
            remote_url: None,
            statuses: vec![],
            work_items: vec![],
        }
    }

    /// # GitPullRequest to PullRequestRecord Conversion
    ///
    /// Tests conversion of a populated pull request.
    ///
    /// ## Test Scenario
    /// - Creates a GitPullRequest with title and description
    /// - Converts it to a PullRequestRecord
    ///
    /// ## Expected Outcome
    /// - Id, title, description and full ref names are carried over
    #[test]
    fn test_record_from_git_pull_request() {
        let pr = create_test_git_pull_request(
            42,
            Some("Add feature".to_string()),
            Some("Long description".to_string()),
        );

        let record = PullRequestRecord::from(pr);

        assert_eq!(record.id, 42);
        assert_eq!(record.title, "Add feature");
        assert_eq!(record.description, "Long description");
        assert_eq!(record.source_ref_name, "refs/heads/feature");
        assert_eq!(record.target_ref_name, "refs/heads/main");
    }

    /// # GitPullRequest Conversion - Minimal
    ///
    /// Tests conversion with missing optional fields.
    ///
    /// ## Test Scenario
    /// - Creates a GitPullRequest without title or description
    ///
    /// ## Expected Outcome
    /// - Missing fields become empty strings
    #[test]
    fn test_record_from_git_pull_request_minimal() {
        let record = PullRequestRecord::from(create_test_git_pull_request(1, None, None));

        assert_eq!(record.title, "");
        assert_eq!(record.description, "");
    }

    /// # GitCommitRef to CommitInfo Conversion
    ///
    /// Tests that the committer date, not the author date, is used.
    ///
    /// ## Test Scenario
    /// - Author and committer dates differ
    ///
    /// ## Expected Outcome
    /// - Timestamp equals the committer date
    /// - Parents keep their order
    #[test]
    fn test_commit_info_uses_committer_time() {
        let author_date = time::OffsetDateTime::from_unix_timestamp(1_600_000_000).unwrap();
        let committer_date = time::OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();

        let info =
            CommitInfo::from(create_test_commit_ref(Some(committer_date), Some(author_date)));

        assert_eq!(info.hash, "abc123");
        assert_eq!(info.author_name, "Author");
        assert_eq!(info.committer_name, "Committer");
        assert_eq!(info.timestamp, 1_700_000_000);
        assert_eq!(info.message, "Fix the thing");
        assert_eq!(info.parent_hashes, vec!["p1", "p2"]);
    }

    /// # GitCommitRef Without Dates
    ///
    /// Tests zero-filling when the provider omits the committer date.
    ///
    /// ## Test Scenario
    /// - Committer date missing
    ///
    /// ## Expected Outcome
    /// - Timestamp is zero, other fields still populated
    #[test]
    fn test_commit_info_missing_date() {
        let info = CommitInfo::from(create_test_commit_ref(None, None));
        assert_eq!(info.timestamp, 0);
        assert_eq!(info.committer_name, "Committer");
    }

    fn create_test_thread(
        published: Option<time::OffsetDateTime>,
    ) -> git_models::GitPullRequestCommentThread {
        git_models::GitPullRequestCommentThread {
            comment_thread: git_models::CommentThread {
                id: Some(12),
                published_date: published,
                comments: vec![
                    git_models::Comment {
                        id: Some(1),
                        author: Some(create_test_identity()),
                        content: Some("Please rename".to_string()),
                        ..Default::default()
                    },
                    git_models::Comment {
                        id: Some(2),
                        author: None,
                        content: None,
                        ..Default::default()
                    },
                ],
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// # GitPullRequestCommentThread to CommentThread Conversion
    ///
    /// Tests that thread id, publish date and comment authors are extracted.
    ///
    /// ## Test Scenario
    /// - Thread with a published date and two comments, the second without
    ///   author or content
    ///
    /// ## Expected Outcome
    /// - Author is the identity display name
    /// - Missing author and content become empty strings
    /// - Comments keep their order
    #[test]
    fn test_comment_thread_from_git_thread() {
        let published = time::OffsetDateTime::from_unix_timestamp(1_650_000_000).unwrap();

        let thread = CommentThread::from(create_test_thread(Some(published)));

        assert_eq!(thread.id, 12);
        assert_eq!(thread.published.unwrap().timestamp(), 1_650_000_000);
        assert_eq!(
            thread.comments,
            vec![
                ThreadComment {
                    id: 1,
                    author: "Jane Doe".to_string(),
                    content: "Please rename".to_string(),
                },
                ThreadComment {
                    id: 2,
                    author: String::new(),
                    content: String::new(),
                },
            ]
        );
    }

    /// # GitPullRequestCommentThread Without Publish Date
    ///
    /// Tests that a missing publish date is kept as absent.
    ///
    /// ## Test Scenario
    /// - Thread without a published date
    ///
    /// ## Expected Outcome
    /// - `published` is None, comments still converted
    #[test]
    fn test_comment_thread_missing_published_date() {
        let thread = CommentThread::from(create_test_thread(None));

        assert!(thread.published.is_none());
        assert_eq!(thread.comments.len(), 2);
    }

    /// # Timestamp Conversion
    ///
    /// Tests conversion from time::OffsetDateTime to chrono.
    ///
    /// ## Test Scenario
    /// - Converts a known unix timestamp
    ///
    /// ## Expected Outcome
    /// - Same instant in UTC
    #[test]
    fn test_to_utc() {
        let odt = time::OffsetDateTime::from_unix_timestamp(1_650_000_000).unwrap();
        let utc = to_utc(odt).unwrap();
        assert_eq!(utc.timestamp(), 1_650_000_000);
    }
}
