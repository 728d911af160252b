//! Repository host gateway.
//!
//! [`RepositoryHost`] is everything the orchestrator needs from a hosted git service.
//! The GitHub REST implementation lives in [`github`]; tests use the in-memory host.

use crate::error::Result;

pub mod factory;
pub mod github;
#[cfg(test)]
pub mod memory;

pub use factory::HostFactory;

/// A repository on the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoHandle {
    pub owner: String,
    pub name: String,
    pub default_branch: String,
}

impl RepoHandle {
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

/// Result of looking up a branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefState {
    Exists(String),
    Absent,
}

/// File content at a revision plus the version id used as a commit precondition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileContents {
    pub content: String,
    pub version_id: String,
}

#[derive(Debug, Clone)]
pub struct FileCommit<'a> {
    pub path: &'a str,
    pub content: &'a str,
    pub message: &'a str,
    pub branch: &'a str,
    /// Version id the file must still have; a mismatch is a conflict.
    pub precondition: &'a str,
}

#[derive(Debug, Clone)]
pub struct PullRequestDraft<'a> {
    pub title: &'a str,
    pub body: &'a str,
    pub base: &'a str,
    /// Head branch, qualified as `owner:branch` when it lives in another repository.
    pub head: &'a str,
    pub draft: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequest {
    pub number: u64,
    pub url: String,
}

/// The identity the host client acts as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostUser {
    pub login: String,
    pub display_name: String,
    pub email: String,
}

pub trait RepositoryHost: Send + Sync {
    fn get_repository(&self, full_name: &str) -> Result<RepoHandle>;

    /// Fork `repo` for the acting identity; an existing fork is returned as-is.
    fn fork(&self, repo: &RepoHandle) -> Result<RepoHandle>;

    fn get_ref(&self, repo: &RepoHandle, branch: &str) -> Result<RefState>;

    fn create_ref(&self, repo: &RepoHandle, branch: &str, sha: &str) -> Result<()>;

    /// Move `branch` to `sha`, discarding whatever it pointed at before.
    fn update_ref(&self, repo: &RepoHandle, branch: &str, sha: &str) -> Result<()>;

    fn get_file(&self, repo: &RepoHandle, path: &str, at_ref: &str) -> Result<FileContents>;

    /// Commit new file content; returns the new commit sha.
    fn commit_file(&self, repo: &RepoHandle, commit: &FileCommit<'_>) -> Result<String>;

    fn open_pull_request(
        &self,
        repo: &RepoHandle,
        request: &PullRequestDraft<'_>,
    ) -> Result<PullRequest>;

    fn current_user(&self) -> Result<HostUser>;
}
