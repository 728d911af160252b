use crate::config::UpdaterConfig;
use crate::error::Result;
use crate::host::RepositoryHost;
use crate::host::github::GitHubHost;
use std::sync::Arc;

pub struct HostFactory;

impl HostFactory {
    /// Build the host client once; it is passed to the orchestrator explicitly.
    pub fn create(config: &UpdaterConfig) -> Result<Arc<dyn RepositoryHost>> {
        let client = GitHubHost::new(config.token.clone(), config.api_base.clone())?;
        Ok(Arc::new(client))
    }
}
