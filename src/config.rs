use crate::agents::UpdateRequest;
use crate::cli::Cli;
use crate::error::{Result, UpdaterError};
use crate::manifest::ModuleReference;
use crate::utils::PathValidator;
use std::fmt;
use url::Url;

pub const TOKEN_ENV: &str = "GITHUB_TOKEN";
pub const API_URL_ENV: &str = "GITHUB_API_URL";
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// Run configuration assembled from the command line and the environment.
pub struct UpdaterConfig {
    pub request: UpdateRequest,
    pub token: String,
    pub api_base: Url,
}

impl fmt::Debug for UpdaterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdaterConfig")
            .field("request", &self.request)
            .field("token", &format_args!("…{}", self.token_hint()))
            .field("api_base", &self.api_base.as_str())
            .finish()
    }
}

impl UpdaterConfig {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        Self::from_cli_with(cli, |key| std::env::var(key).ok())
    }

    /// Like [`from_cli`](Self::from_cli) with an injectable environment lookup.
    pub fn from_cli_with(cli: &Cli, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let module: ModuleReference = cli.module_path.parse()?;
        let manifest_repo = PathValidator::validate_repo_identity(&cli.manifest_repo_path)?;
        let manifest_file = PathValidator::validate_repo_path(&cli.manifest_file)?;

        let target_branch = match cli.branch.as_deref().map(str::trim) {
            Some("") => {
                return Err(UpdaterError::Usage("Target branch must not be empty".to_string()));
            }
            other => other.map(str::to_string),
        };

        let token = lookup(TOKEN_ENV)
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| {
                UpdaterError::Usage(format!(
                    "Specify GitHub API token using {TOKEN_ENV} environment variable"
                ))
            })?;

        let api_base = Self::parse_api_base(
            lookup(API_URL_ENV)
                .filter(|value| !value.trim().is_empty())
                .as_deref()
                .unwrap_or(DEFAULT_API_BASE),
        )?;

        Ok(Self {
            request: UpdateRequest {
                module,
                manifest_repo,
                manifest_file,
                target_branch,
                pull_number: cli.module_pull_nr,
                draft: cli.draft_pr,
                dry_run: cli.dry_run,
                strict: cli.strict,
            },
            token,
            api_base,
        })
    }

    /// Last four characters of the token, for diagnostics.
    pub fn token_hint(&self) -> String {
        let chars: Vec<char> = self.token.chars().collect();
        chars[chars.len().saturating_sub(4)..].iter().collect()
    }

    fn parse_api_base(raw: &str) -> Result<Url> {
        let parsed = Url::parse(raw.trim())
            .map_err(|e| UpdaterError::Usage(format!("Invalid GitHub API URL '{raw}': {e}")))?;

        match parsed.scheme() {
            "https" | "http" => Ok(parsed),
            scheme => Err(UpdaterError::Usage(format!(
                "Unsupported GitHub API URL scheme: {scheme}"
            ))),
        }
    }
}
