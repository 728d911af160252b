//! In-memory repository host for orchestrator tests.
//!
//! Keeps repositories, branches and files in memory, records every call, and can be
//! told to fail a chosen operation.

use crate::error::{Result, UpdaterError};
use crate::host::{
    FileCommit, FileContents, HostUser, PullRequest, PullRequestDraft, RefState, RepoHandle,
    RepositoryHost,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    GetRepository(String),
    Fork(String),
    GetRef { repo: String, branch: String },
    CreateRef { repo: String, branch: String, sha: String },
    UpdateRef { repo: String, branch: String, sha: String },
    GetFile { repo: String, path: String, at_ref: String },
    CommitFile { repo: String, path: String, branch: String, precondition: String },
    OpenPullRequest { repo: String, head: String, base: String, draft: bool },
    CurrentUser,
}

/// Operation that returns an injected HTTP 500.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailOn {
    CreateRef,
    CommitFile,
    OpenPullRequest,
}

#[derive(Debug, Clone)]
struct StoredFile {
    content: String,
    version_id: String,
}

#[derive(Debug, Default)]
struct MemoryState {
    repos: HashMap<String, RepoHandle>,
    /// `repo full name -> branch -> sha`
    refs: HashMap<String, HashMap<String, String>>,
    /// `(repo full name, commit sha, path) -> file`
    files: HashMap<(String, String, String), StoredFile>,
    user: Option<HostUser>,
    next_commit: u64,
    next_pull: u64,
    fail_on: Option<FailOn>,
    operations: Vec<Operation>,
    pull_requests: Vec<(String, String)>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryHost {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryHost {
    pub fn new(user_login: &str) -> Self {
        let host = Self::default();
        {
            let mut state = host.lock();
            state.user = Some(HostUser {
                login: user_login.to_string(),
                display_name: "Manifest Bot".to_string(),
                email: "bot@example.com".to_string(),
            });
            state.next_pull = 1;
        }
        host
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap()
    }

    /// Add an upstream repository whose `branch` holds `path` with `content`.
    pub fn add_repository(&self, full_name: &str, branch: &str, path: &str, content: &str) -> String {
        let (owner, name) = full_name.split_once('/').unwrap();
        let mut state = self.lock();
        state.repos.insert(
            full_name.to_string(),
            RepoHandle {
                owner: owner.to_string(),
                name: name.to_string(),
                default_branch: branch.to_string(),
            },
        );
        let sha = state.new_commit_sha();
        state
            .refs
            .entry(full_name.to_string())
            .or_default()
            .insert(branch.to_string(), sha.clone());
        state.files.insert(
            (full_name.to_string(), sha.clone(), path.to_string()),
            StoredFile {
                content: content.to_string(),
                version_id: format!("blob-{sha}"),
            },
        );
        sha
    }

    /// Point `branch` of `full_name` at `sha`, creating the repository entry if needed.
    pub fn set_branch(&self, full_name: &str, branch: &str, sha: &str) {
        self.lock()
            .refs
            .entry(full_name.to_string())
            .or_default()
            .insert(branch.to_string(), sha.to_string());
    }

    pub fn branch(&self, full_name: &str, branch: &str) -> Option<String> {
        self.lock()
            .refs
            .get(full_name)
            .and_then(|refs| refs.get(branch))
            .cloned()
    }

    pub fn file_at(&self, full_name: &str, sha: &str, path: &str) -> Option<String> {
        self.lock()
            .files
            .get(&(full_name.to_string(), sha.to_string(), path.to_string()))
            .map(|file| file.content.clone())
    }

    /// Replace the file behind the caller's back, as a concurrent edit would.
    pub fn touch_file(&self, full_name: &str, sha: &str, path: &str, version_id: &str) {
        let mut state = self.lock();
        if let Some(file) = state
            .files
            .get_mut(&(full_name.to_string(), sha.to_string(), path.to_string()))
        {
            file.version_id = version_id.to_string();
        }
    }

    pub fn fail_on(&self, fail_on: FailOn) {
        self.lock().fail_on = Some(fail_on);
    }

    pub fn operations(&self) -> Vec<Operation> {
        self.lock().operations.clone()
    }

    pub fn pull_requests(&self) -> Vec<(String, String)> {
        self.lock().pull_requests.clone()
    }
}

impl MemoryState {
    fn new_commit_sha(&mut self) -> String {
        self.next_commit += 1;
        format!("{:040x}", self.next_commit)
    }

    fn repo(&self, full_name: &str) -> Result<&RepoHandle> {
        self.repos
            .get(full_name)
            .ok_or_else(|| UpdaterError::NotFound(format!("repository {full_name}")))
    }

    fn injected(&self, op: FailOn) -> Result<()> {
        match self.fail_on {
            Some(fail) if fail == op => Err(UpdaterError::Host {
                status: 500,
                message: format!("injected failure for {op:?}"),
            }),
            _ => Ok(()),
        }
    }
}

impl RepositoryHost for MemoryHost {
    fn get_repository(&self, full_name: &str) -> Result<RepoHandle> {
        let mut state = self.lock();
        state
            .operations
            .push(Operation::GetRepository(full_name.to_string()));
        state.repo(full_name).cloned()
    }

    fn fork(&self, repo: &RepoHandle) -> Result<RepoHandle> {
        let mut state = self.lock();
        state.operations.push(Operation::Fork(repo.full_name()));
        let login = state.user.as_ref().map(|u| u.login.clone()).unwrap_or_default();
        let fork = RepoHandle {
            owner: login,
            name: repo.name.clone(),
            default_branch: repo.default_branch.clone(),
        };

        if !state.repos.contains_key(&fork.full_name()) {
            let upstream_refs = state.refs.get(&repo.full_name()).cloned().unwrap_or_default();
            let upstream_files: Vec<_> = state
                .files
                .iter()
                .filter(|((name, _, _), _)| *name == repo.full_name())
                .map(|((_, sha, path), file)| ((fork.full_name(), sha.clone(), path.clone()), file.clone()))
                .collect();
            state.files.extend(upstream_files);
            state.refs.insert(fork.full_name(), upstream_refs);
            state.repos.insert(fork.full_name(), fork.clone());
        }

        Ok(fork)
    }

    fn get_ref(&self, repo: &RepoHandle, branch: &str) -> Result<RefState> {
        let mut state = self.lock();
        state.operations.push(Operation::GetRef {
            repo: repo.full_name(),
            branch: branch.to_string(),
        });
        state.repo(&repo.full_name())?;
        Ok(state
            .refs
            .get(&repo.full_name())
            .and_then(|refs| refs.get(branch))
            .map(|sha| RefState::Exists(sha.clone()))
            .unwrap_or(RefState::Absent))
    }

    fn create_ref(&self, repo: &RepoHandle, branch: &str, sha: &str) -> Result<()> {
        let mut state = self.lock();
        state.operations.push(Operation::CreateRef {
            repo: repo.full_name(),
            branch: branch.to_string(),
            sha: sha.to_string(),
        });
        state.injected(FailOn::CreateRef)?;
        let refs = state.refs.entry(repo.full_name()).or_default();
        if refs.contains_key(branch) {
            return Err(UpdaterError::Conflict(format!(
                "Reference refs/heads/{branch} already exists"
            )));
        }
        refs.insert(branch.to_string(), sha.to_string());
        Ok(())
    }

    fn update_ref(&self, repo: &RepoHandle, branch: &str, sha: &str) -> Result<()> {
        let mut state = self.lock();
        state.operations.push(Operation::UpdateRef {
            repo: repo.full_name(),
            branch: branch.to_string(),
            sha: sha.to_string(),
        });
        match state.refs.get_mut(&repo.full_name()).and_then(|refs| refs.get_mut(branch)) {
            Some(current) => {
                *current = sha.to_string();
                Ok(())
            }
            None => Err(UpdaterError::NotFound(format!("ref heads/{branch}"))),
        }
    }

    fn get_file(&self, repo: &RepoHandle, path: &str, at_ref: &str) -> Result<FileContents> {
        let mut state = self.lock();
        state.operations.push(Operation::GetFile {
            repo: repo.full_name(),
            path: path.to_string(),
            at_ref: at_ref.to_string(),
        });
        state
            .files
            .get(&(repo.full_name(), at_ref.to_string(), path.to_string()))
            .map(|file| FileContents {
                content: file.content.clone(),
                version_id: file.version_id.clone(),
            })
            .ok_or_else(|| UpdaterError::NotFound(format!("{path}@{at_ref}")))
    }

    fn commit_file(&self, repo: &RepoHandle, commit: &FileCommit<'_>) -> Result<String> {
        let mut state = self.lock();
        state.operations.push(Operation::CommitFile {
            repo: repo.full_name(),
            path: commit.path.to_string(),
            branch: commit.branch.to_string(),
            precondition: commit.precondition.to_string(),
        });
        state.injected(FailOn::CommitFile)?;

        let full_name = repo.full_name();
        let parent = state
            .refs
            .get(&full_name)
            .and_then(|refs| refs.get(commit.branch))
            .cloned()
            .ok_or_else(|| UpdaterError::NotFound(format!("ref heads/{}", commit.branch)))?;
        let current = state
            .files
            .get(&(full_name.clone(), parent.clone(), commit.path.to_string()))
            .ok_or_else(|| UpdaterError::NotFound(commit.path.to_string()))?;
        if current.version_id != commit.precondition {
            return Err(UpdaterError::Conflict(format!(
                "{} does not match {}",
                commit.path, commit.precondition
            )));
        }

        let sha = state.new_commit_sha();
        let carried: Vec<_> = state
            .files
            .iter()
            .filter(|((name, at, _), _)| *name == full_name && *at == parent)
            .map(|((name, _, path), file)| ((name.clone(), sha.clone(), path.clone()), file.clone()))
            .collect();
        state.files.extend(carried);
        state.files.insert(
            (full_name.clone(), sha.clone(), commit.path.to_string()),
            StoredFile {
                content: commit.content.to_string(),
                version_id: format!("blob-{sha}"),
            },
        );
        if let Some(refs) = state.refs.get_mut(&full_name) {
            refs.insert(commit.branch.to_string(), sha.clone());
        }
        Ok(sha)
    }

    fn open_pull_request(
        &self,
        repo: &RepoHandle,
        request: &PullRequestDraft<'_>,
    ) -> Result<PullRequest> {
        let mut state = self.lock();
        state.operations.push(Operation::OpenPullRequest {
            repo: repo.full_name(),
            head: request.head.to_string(),
            base: request.base.to_string(),
            draft: request.draft,
        });
        state.injected(FailOn::OpenPullRequest)?;

        let number = state.next_pull;
        state.next_pull += 1;
        state
            .pull_requests
            .push((request.title.to_string(), request.body.to_string()));
        Ok(PullRequest {
            number,
            url: format!("https://example.com/{}/pull/{number}", repo.full_name()),
        })
    }

    fn current_user(&self) -> Result<HostUser> {
        let mut state = self.lock();
        state.operations.push(Operation::CurrentUser);
        state
            .user
            .clone()
            .ok_or_else(|| UpdaterError::Host {
                status: 401,
                message: "Bad credentials".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_precondition_is_a_conflict() {
        let host = MemoryHost::new("bot");
        let base = host.add_repository("zephyr/manifest", "main", "west.yml", "manifest: {}\n");
        let repo = host.get_repository("zephyr/manifest").unwrap();
        let read = host.get_file(&repo, "west.yml", &base).unwrap();
        host.touch_file("zephyr/manifest", &base, "west.yml", "blob-concurrent");

        let err = host
            .commit_file(
                &repo,
                &FileCommit {
                    path: "west.yml",
                    content: "manifest: {}\n",
                    message: "edit",
                    branch: "main",
                    precondition: &read.version_id,
                },
            )
            .unwrap_err();
        assert!(matches!(err, UpdaterError::Conflict(_)));
        assert_eq!(host.branch("zephyr/manifest", "main"), Some(base));
    }

    #[test]
    fn fork_is_returned_as_is_when_it_exists() {
        let host = MemoryHost::new("bot");
        host.add_repository("zephyr/manifest", "main", "west.yml", "manifest: {}\n");
        let upstream = host.get_repository("zephyr/manifest").unwrap();

        let first = host.fork(&upstream).unwrap();
        host.set_branch(&first.full_name(), "main", "moved");
        let second = host.fork(&upstream).unwrap();

        assert_eq!(first, second);
        assert_eq!(host.branch("bot/manifest", "main").as_deref(), Some("moved"));
    }
}
