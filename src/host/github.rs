use crate::error::{Result, UpdaterError};
use crate::host::{
    FileCommit, FileContents, HostUser, PullRequest, PullRequestDraft, RefState, RepoHandle,
    RepositoryHost,
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use reqwest::Method;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::ACCEPT;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::fmt;
use std::thread;
use std::time::Duration;
use url::Url;

const USER_AGENT: &str = concat!("west-bump/", env!("CARGO_PKG_VERSION"));
const API_VERSION: &str = "2022-11-28";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const FORK_READY_ATTEMPTS: u32 = 10;
const FORK_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// GitHub REST client
pub struct GitHubHost {
    client: Client,
    token: String,
    api_base: Url,
}

impl fmt::Debug for GitHubHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitHubHost")
            .field("api_base", &self.api_base.as_str())
            .finish_non_exhaustive()
    }
}

impl GitHubHost {
    pub fn new(token: String, api_base: Url) -> Result<Self> {
        if api_base.cannot_be_a_base() {
            return Err(UpdaterError::Usage(format!(
                "GitHub API URL '{api_base}' cannot be used as a base URL"
            )));
        }

        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| UpdaterError::Transport(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            token,
            api_base,
        })
    }

    fn endpoint<'s>(&self, segments: impl IntoIterator<Item = &'s str>) -> Url {
        let mut url = self.api_base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty();
            for segment in segments {
                path.extend(segment.split('/'));
            }
        }
        url
    }

    fn repo_endpoint<'s>(
        &self,
        repo: &'s RepoHandle,
        segments: impl IntoIterator<Item = &'s str>,
    ) -> Url {
        self.endpoint(
            ["repos", repo.owner.as_str(), repo.name.as_str()]
                .into_iter()
                .chain(segments),
        )
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        tracing::debug!(%method, %url, "GitHub request");
        self.client
            .request(method, url)
            .bearer_auth(&self.token)
            .header(ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
    }

    /// Send without interpreting the status code.
    fn send_raw(&self, builder: RequestBuilder, context: &str) -> Result<Response> {
        let response = builder
            .send()
            .map_err(|e| UpdaterError::Transport(format!("{context}: {e}")))?;
        tracing::debug!(status = %response.status(), context, "GitHub response");
        Ok(response)
    }

    fn send(&self, builder: RequestBuilder, context: &str) -> Result<Response> {
        let response = self.send_raw(builder, context)?;
        Self::ensure_success(response, context)
    }

    fn ensure_success(response: Response, context: &str) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response
            .text()
            .ok()
            .and_then(|body| serde_json::from_str::<ApiErrorBody>(&body).ok())
            .map(|body| body.message)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").to_string());

        Err(classify_status(status.as_u16(), context, &message))
    }

    fn decode<T: DeserializeOwned>(response: Response, context: &str) -> Result<T> {
        let body = response
            .text()
            .map_err(|e| UpdaterError::Transport(format!("{context}: {e}")))?;
        Ok(serde_json::from_str(&body)?)
    }

    fn fetch_repository(&self, owner: &str, name: &str) -> Result<Response> {
        let url = self.endpoint(["repos", owner, name]);
        self.send_raw(self.request(Method::GET, url), &format!("get repository {owner}/{name}"))
    }

    fn wait_for_fork(&self, fork: RepoHandle) -> Result<RepoHandle> {
        let context = format!("get fork {}", fork.full_name());
        for attempt in 1..=FORK_READY_ATTEMPTS {
            let response = self.fetch_repository(&fork.owner, &fork.name)?;
            if response.status().as_u16() != 404 {
                let payload: RepoPayload =
                    Self::decode(Self::ensure_success(response, &context)?, &context)?;
                return Ok(payload.into());
            }
            tracing::debug!(attempt, fork = %fork.full_name(), "fork not ready yet");
            thread::sleep(FORK_POLL_INTERVAL);
        }

        Err(UpdaterError::NotFound(format!(
            "Fork {} did not become available after {} attempts",
            fork.full_name(),
            FORK_READY_ATTEMPTS
        )))
    }
}

impl RepositoryHost for GitHubHost {
    fn get_repository(&self, full_name: &str) -> Result<RepoHandle> {
        let (owner, name) = full_name
            .split_once('/')
            .filter(|(owner, name)| !owner.is_empty() && !name.is_empty() && !name.contains('/'))
            .ok_or_else(|| {
                UpdaterError::Usage(format!(
                    "Repository '{full_name}' must have the form <owner>/<name>"
                ))
            })?;

        let context = format!("get repository {full_name}");
        let response = Self::ensure_success(self.fetch_repository(owner, name)?, &context)?;
        let payload: RepoPayload = Self::decode(response, &context)?;
        Ok(payload.into())
    }

    fn fork(&self, repo: &RepoHandle) -> Result<RepoHandle> {
        let context = format!("fork {}", repo.full_name());
        let url = self.repo_endpoint(repo, ["forks"]);
        let response = self.send(self.request(Method::POST, url).json(&json!({})), &context)?;
        let payload: RepoPayload = Self::decode(response, &context)?;
        self.wait_for_fork(payload.into())
    }

    fn get_ref(&self, repo: &RepoHandle, branch: &str) -> Result<RefState> {
        let context = format!("get ref heads/{branch} in {}", repo.full_name());
        let url = self.repo_endpoint(repo, ["git", "ref", "heads", branch]);
        let response = self.send_raw(self.request(Method::GET, url), &context)?;
        if response.status().as_u16() == 404 {
            return Ok(RefState::Absent);
        }

        let payload: RefPayload = Self::decode(Self::ensure_success(response, &context)?, &context)?;
        Ok(RefState::Exists(payload.object.sha))
    }

    fn create_ref(&self, repo: &RepoHandle, branch: &str, sha: &str) -> Result<()> {
        let context = format!("create ref heads/{branch} in {}", repo.full_name());
        let url = self.repo_endpoint(repo, ["git", "refs"]);
        let body = json!({ "ref": format!("refs/heads/{branch}"), "sha": sha });
        self.send(self.request(Method::POST, url).json(&body), &context)?;
        Ok(())
    }

    fn update_ref(&self, repo: &RepoHandle, branch: &str, sha: &str) -> Result<()> {
        let context = format!("update ref heads/{branch} in {}", repo.full_name());
        let url = self.repo_endpoint(repo, ["git", "refs", "heads", branch]);
        let body = json!({ "sha": sha, "force": true });
        self.send(self.request(Method::PATCH, url).json(&body), &context)?;
        Ok(())
    }

    fn get_file(&self, repo: &RepoHandle, path: &str, at_ref: &str) -> Result<FileContents> {
        let context = format!("get {path}@{at_ref} in {}", repo.full_name());
        let mut url = self.repo_endpoint(repo, ["contents", path]);
        url.query_pairs_mut().append_pair("ref", at_ref);

        let response = self.send(self.request(Method::GET, url), &context)?;
        let payload: ContentPayload = Self::decode(response, &context)?;
        decode_content(payload, path)
    }

    fn commit_file(&self, repo: &RepoHandle, commit: &FileCommit<'_>) -> Result<String> {
        let context = format!(
            "commit {} to {} in {}",
            commit.path,
            commit.branch,
            repo.full_name()
        );
        let url = self.repo_endpoint(repo, ["contents", commit.path]);
        let body = json!({
            "message": commit.message,
            "content": STANDARD.encode(commit.content),
            "sha": commit.precondition,
            "branch": commit.branch,
        });

        let response = self.send(self.request(Method::PUT, url).json(&body), &context)?;
        let payload: CommitPayload = Self::decode(response, &context)?;
        Ok(payload.commit.sha)
    }

    fn open_pull_request(
        &self,
        repo: &RepoHandle,
        request: &PullRequestDraft<'_>,
    ) -> Result<PullRequest> {
        let context = format!("open pull request in {}", repo.full_name());
        let url = self.repo_endpoint(repo, ["pulls"]);
        let body = json!({
            "title": request.title,
            "body": request.body,
            "head": request.head,
            "base": request.base,
            "draft": request.draft,
        });

        let response = self.send(self.request(Method::POST, url).json(&body), &context)?;
        let payload: PullPayload = Self::decode(response, &context)?;
        Ok(PullRequest {
            number: payload.number,
            url: payload.html_url,
        })
    }

    fn current_user(&self) -> Result<HostUser> {
        let url = self.endpoint(["user"]);
        let response = self.send(self.request(Method::GET, url), "get current user")?;
        let payload: UserPayload = Self::decode(response, "get current user")?;
        Ok(payload.into())
    }
}

/// Map a failed HTTP status onto the crate's error taxonomy.
fn classify_status(status: u16, context: &str, message: &str) -> UpdaterError {
    match status {
        404 => UpdaterError::NotFound(format!("{context}: {message}")),
        409 => UpdaterError::Conflict(format!("{context}: {message}")),
        422 if message.to_ascii_lowercase().contains("already exists") => {
            UpdaterError::Conflict(format!("{context}: {message}"))
        }
        _ => UpdaterError::Host {
            status,
            message: format!("{context}: {message}"),
        },
    }
}

fn decode_content(payload: ContentPayload, path: &str) -> Result<FileContents> {
    if payload.kind != "file" {
        return Err(UpdaterError::NotFound(format!(
            "'{path}' is a {} not a file",
            payload.kind
        )));
    }

    let encoded = match (payload.encoding.as_deref(), payload.content) {
        (Some("base64"), Some(content)) => content,
        (encoding, _) => {
            return Err(UpdaterError::Manifest(format!(
                "'{path}' was returned with unsupported encoding {encoding:?}; the file may be too large"
            )));
        }
    };

    let compact: String = encoded.split_whitespace().collect();
    let bytes = STANDARD
        .decode(compact)
        .map_err(|e| UpdaterError::Manifest(format!("'{path}' is not valid base64: {e}")))?;
    let content = String::from_utf8(bytes)
        .map_err(|e| UpdaterError::Manifest(format!("'{path}' is not valid UTF-8: {e}")))?;

    Ok(FileContents {
        content,
        version_id: payload.sha,
    })
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

#[derive(Debug, Deserialize)]
struct RepoPayload {
    name: String,
    owner: OwnerPayload,
    default_branch: String,
}

#[derive(Debug, Deserialize)]
struct OwnerPayload {
    login: String,
}

impl From<RepoPayload> for RepoHandle {
    fn from(payload: RepoPayload) -> Self {
        RepoHandle {
            owner: payload.owner.login,
            name: payload.name,
            default_branch: payload.default_branch,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RefPayload {
    object: ObjectPayload,
}

#[derive(Debug, Deserialize)]
struct ObjectPayload {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct ContentPayload {
    #[serde(rename = "type")]
    kind: String,
    sha: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CommitPayload {
    commit: ObjectPayload,
}

#[derive(Debug, Deserialize)]
struct PullPayload {
    number: u64,
    html_url: String,
}

#[derive(Debug, Deserialize)]
struct UserPayload {
    id: u64,
    login: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

impl From<UserPayload> for HostUser {
    fn from(payload: UserPayload) -> Self {
        let display_name = payload
            .name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| payload.login.clone());
        let email = payload
            .email
            .filter(|email| !email.trim().is_empty())
            .unwrap_or_else(|| format!("{}+{}@users.noreply.github.com", payload.id, payload.login));

        HostUser {
            login: payload.login,
            display_name,
            email,
        }
    }
}
