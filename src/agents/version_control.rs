use crate::host::HostUser;
use jiff::Timestamp;

/// Names the work branch that carries the manifest commit.
pub struct BranchNamer;

impl BranchNamer {
    /// `update-<module with '/' as '_'>-rev_<UTC YYYYMMDDHHMM>`.
    ///
    /// Reruns for the same module within one minute produce the same name.
    pub fn generate(module_identity: &str, now: Timestamp) -> String {
        let module = module_identity.replace('/', "_");
        let stamp = now.strftime("%Y%m%d%H%M");
        format!("update-{module}-rev_{stamp}")
    }
}

/// Commit title and body for a manifest revision bump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitMessage {
    pub title: String,
    pub body: String,
}

impl CommitMessage {
    pub fn for_module(module_identity: &str, pull_number: u64, author: &HostUser) -> Self {
        let title = format!("manifest: Auto update of {module_identity} revision");
        let body = format!(
            "This commit is automatically created as result of\n\
             Pull request #{pull_number} to {module_identity}.\n\
             \n\
             Signed-off-by: {} <{}>\n",
            author.display_name, author.email
        );
        Self { title, body }
    }

    /// Full commit message: title, blank line, body.
    pub fn message(&self) -> String {
        format!("{}\n\n{}", self.title, self.body)
    }
}
