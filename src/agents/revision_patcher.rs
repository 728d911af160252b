use crate::error::Result;
use crate::manifest::{ManifestDocument, ModuleReference, Project};
use std::fmt;

/// Revision written into matching projects: the head ref of a pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevisionSpec {
    pull_number: u64,
}

impl RevisionSpec {
    pub fn pull_request(pull_number: u64) -> Self {
        Self { pull_number }
    }
}

impl fmt::Display for RevisionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pull/{}/head", self.pull_number)
    }
}

/// One project entry rewritten by the patcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchedProject {
    pub name: String,
    pub old_revision: Option<String>,
    pub new_revision: String,
}

#[derive(Debug, Clone, Default)]
pub struct PatchReport {
    pub patched: Vec<PatchedProject>,
}

impl PatchReport {
    pub fn count(&self) -> usize {
        self.patched.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patched.is_empty()
    }
}

/// Rewrites the revision of every project that resolves to a module reference.
pub struct RevisionPatcher;

impl RevisionPatcher {
    /// Patch all matching projects in `doc`; zero matches leave it untouched.
    pub fn patch(
        doc: &mut ManifestDocument,
        module: &ModuleReference,
        revision: &RevisionSpec,
    ) -> Result<PatchReport> {
        let default_remote = doc.manifest().default_remote_base().map(str::to_string);
        tracing::debug!(
            remote = %module.remote_name,
            repo = %module.repo_name,
            default_remote = ?default_remote,
            "resolving manifest projects"
        );

        let matches: Vec<(usize, String, Option<String>)> = doc
            .manifest()
            .projects
            .iter()
            .enumerate()
            .filter(|(_, project)| Self::matches(project, default_remote.as_deref(), module))
            .map(|(idx, project)| (idx, project.name.clone(), project.revision_text()))
            .collect();

        let new_revision = revision.to_string();
        let mut report = PatchReport::default();
        for (idx, name, old_revision) in matches {
            doc.set_revision(idx, &new_revision)?;
            tracing::debug!(project = %name, old = ?old_revision, new = %new_revision, "patched revision");
            report.patched.push(PatchedProject {
                name,
                old_revision,
                new_revision: new_revision.clone(),
            });
        }

        Ok(report)
    }

    /// An explicit `remote` always wins; the default remote only applies when it is absent.
    fn matches(project: &Project, default_remote: Option<&str>, module: &ModuleReference) -> bool {
        let remote = project.remote.as_deref().or(default_remote);
        remote == Some(module.remote_name.as_str()) && project.repo_name() == module.repo_name
    }
}
