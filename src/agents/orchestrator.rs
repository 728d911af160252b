use crate::agents::revision_patcher::{PatchReport, RevisionPatcher, RevisionSpec};
use crate::agents::version_control::{BranchNamer, CommitMessage};
use crate::error::{Result, UpdaterError};
use crate::host::{FileCommit, PullRequest, PullRequestDraft, RefState, RepoHandle, RepositoryHost};
use crate::manifest::{ManifestDocument, ModuleReference};
use jiff::Timestamp;
use std::fmt;

/// States of a single manifest update run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateState {
    Start,
    ForkReady,
    SourceBranchSynced,
    ManifestFetched,
    ManifestPatched,
    WorkBranchCreated,
    Committed,
    PrOpened,
    Skipped,
    Done,
}

impl fmt::Display for UpdateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UpdateState::Start => "START",
            UpdateState::ForkReady => "FORK_READY",
            UpdateState::SourceBranchSynced => "SOURCE_BRANCH_SYNCED",
            UpdateState::ManifestFetched => "MANIFEST_FETCHED",
            UpdateState::ManifestPatched => "MANIFEST_PATCHED",
            UpdateState::WorkBranchCreated => "WORK_BRANCH_CREATED",
            UpdateState::Committed => "COMMITTED",
            UpdateState::PrOpened => "PR_OPENED",
            UpdateState::Skipped => "SKIPPED",
            UpdateState::Done => "DONE",
        };
        f.write_str(name)
    }
}

/// Everything a run needs to know, resolved from the command line.
#[derive(Debug, Clone)]
pub struct UpdateRequest {
    pub module: ModuleReference,
    pub manifest_repo: String,
    pub manifest_file: String,
    pub target_branch: Option<String>,
    pub pull_number: u64,
    pub draft: bool,
    pub dry_run: bool,
    /// Treat a manifest without matching projects as an error.
    pub strict: bool,
}

#[derive(Debug, Clone)]
pub struct UpdateOutcome {
    pub states: Vec<UpdateState>,
    pub fork: String,
    pub target_branch: String,
    pub base_sha: String,
    pub work_branch: String,
    pub commit_sha: String,
    pub report: PatchReport,
    pub pull_request: Option<PullRequest>,
}

/// Visited states; errors are tagged with the last one reached.
struct Progress {
    states: Vec<UpdateState>,
}

impl Progress {
    fn new() -> Self {
        Self {
            states: vec![UpdateState::Start],
        }
    }

    fn current(&self) -> UpdateState {
        self.states.last().copied().unwrap_or(UpdateState::Start)
    }

    fn advance(&mut self, next: UpdateState) {
        tracing::debug!(from = %self.current(), to = %next, "state transition");
        self.states.push(next);
    }

    fn check<T>(&self, result: Result<T>) -> Result<T> {
        result.map_err(|e| e.at(self.current()))
    }
}

/// Sequences host calls to land a manifest revision bump as a pull request.
pub struct UpdateOrchestrator<'a> {
    host: &'a dyn RepositoryHost,
}

impl<'a> UpdateOrchestrator<'a> {
    pub fn new(host: &'a dyn RepositoryHost) -> Self {
        Self { host }
    }

    pub fn run(&self, request: &UpdateRequest, now: Timestamp) -> Result<UpdateOutcome> {
        let mut progress = Progress::new();
        let identity = request.module.to_string();

        let upstream = progress.check(self.host.get_repository(&request.manifest_repo))?;
        let fork = progress.check(self.host.fork(&upstream))?;
        tracing::info!(upstream = %upstream.full_name(), fork = %fork.full_name(), "fork ready");
        progress.advance(UpdateState::ForkReady);

        let target_branch = request
            .target_branch
            .clone()
            .unwrap_or_else(|| upstream.default_branch.clone());
        let base_sha = progress.check(self.sync_base_branch(&upstream, &fork, &target_branch))?;
        progress.advance(UpdateState::SourceBranchSynced);

        let file = progress.check(self.host.get_file(&fork, &request.manifest_file, &base_sha))?;
        progress.advance(UpdateState::ManifestFetched);

        let mut doc = progress.check(ManifestDocument::parse(&file.content))?;
        let revision = RevisionSpec::pull_request(request.pull_number);
        let report = progress.check(RevisionPatcher::patch(&mut doc, &request.module, &revision))?;
        if report.is_empty() {
            if request.strict {
                return Err(UpdaterError::Manifest(format!(
                    "No project in {} resolves to {identity}",
                    request.manifest_file
                ))
                .at(progress.current()));
            }
            tracing::warn!(module = %identity, "no manifest project matches; committing unchanged manifest");
        }
        tracing::debug!(modified = doc.is_modified(), "serializing manifest");
        let content = progress.check(doc.serialize())?;
        progress.advance(UpdateState::ManifestPatched);

        let work_branch = BranchNamer::generate(&identity, now);
        tracing::info!(branch = %work_branch, base = %base_sha, "creating work branch");
        progress.check(self.host.create_ref(&fork, &work_branch, &base_sha))?;
        progress.advance(UpdateState::WorkBranchCreated);

        let author = progress.check(self.host.current_user())?;
        let message = CommitMessage::for_module(&identity, request.pull_number, &author);
        let commit_message = message.message();
        let commit = FileCommit {
            path: &request.manifest_file,
            content: &content,
            message: &commit_message,
            branch: &work_branch,
            precondition: &file.version_id,
        };
        let commit_sha = progress.check(self.host.commit_file(&fork, &commit))?;
        progress.check(self.host.update_ref(&fork, &work_branch, &commit_sha))?;
        progress.advance(UpdateState::Committed);

        let pull_request = if request.dry_run {
            tracing::info!(branch = %work_branch, "dry run, skipping pull request creation");
            progress.advance(UpdateState::Skipped);
            None
        } else {
            let head = if fork.owner == upstream.owner {
                work_branch.clone()
            } else {
                format!("{}:{}", fork.owner, work_branch)
            };
            let draft = PullRequestDraft {
                title: &message.title,
                body: &message.body,
                base: &target_branch,
                head: &head,
                draft: request.draft,
            };
            let pull = progress.check(self.host.open_pull_request(&upstream, &draft))?;
            tracing::info!(url = %pull.url, "opened pull request");
            progress.advance(UpdateState::PrOpened);
            Some(pull)
        };
        progress.advance(UpdateState::Done);

        Ok(UpdateOutcome {
            states: progress.states,
            fork: fork.full_name(),
            target_branch,
            base_sha,
            work_branch,
            commit_sha,
            report,
            pull_request,
        })
    }

    /// Force `branch` in the fork to the commit it has upstream; returns that commit.
    pub fn sync_base_branch(
        &self,
        upstream: &RepoHandle,
        fork: &RepoHandle,
        branch: &str,
    ) -> Result<String> {
        let sha = match self.host.get_ref(upstream, branch)? {
            RefState::Exists(sha) => sha,
            RefState::Absent => {
                return Err(UpdaterError::NotFound(format!(
                    "Branch '{branch}' not found in {}",
                    upstream.full_name()
                )));
            }
        };

        match self.host.get_ref(fork, branch)? {
            RefState::Exists(current) if current == sha => {
                tracing::debug!(branch, sha = %sha, "fork branch already in sync");
            }
            RefState::Exists(current) => {
                tracing::info!(branch, from = %current, to = %sha, "resetting fork branch to upstream");
                self.host.update_ref(fork, branch, &sha)?;
            }
            RefState::Absent => {
                tracing::info!(branch, sha = %sha, "creating fork branch from upstream");
                self.host.create_ref(fork, branch, &sha)?;
            }
        }

        Ok(sha)
    }
}
