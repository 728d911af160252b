//! West manifest model.
//!
//! A [`ManifestDocument`] pairs the typed view of a manifest with the original text.
//! Only revisions can be changed, and serializing replays the original text with
//! those changes written in place, so comments, key order and quoting survive.

mod layout;

use crate::error::{Result, UpdaterError};
use layout::ManifestLayout;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Deserialize)]
struct ManifestFile {
    manifest: Manifest,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub defaults: Option<Defaults>,
    #[serde(default)]
    pub remotes: Vec<Remote>,
    #[serde(default)]
    pub projects: Vec<Project>,
    /// Keys this model does not interpret (`self`, `group-filter`, ...).
    #[serde(flatten)]
    pub extra: serde_yaml::Mapping,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Defaults {
    #[serde(default)]
    pub remote: Option<String>,
    #[serde(flatten)]
    pub extra: serde_yaml::Mapping,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Remote {
    pub name: String,
    #[serde(rename = "url-base", default)]
    pub url_base: Option<String>,
    #[serde(flatten)]
    pub extra: serde_yaml::Mapping,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Project {
    pub name: String,
    #[serde(rename = "repo-path", default)]
    pub repo_path: Option<String>,
    #[serde(default)]
    pub remote: Option<String>,
    #[serde(default)]
    pub revision: Option<serde_yaml::Value>,
    #[serde(flatten)]
    pub extra: serde_yaml::Mapping,
}

impl Project {
    /// Repository name used for matching: `repo-path` when set, otherwise `name`.
    pub fn repo_name(&self) -> &str {
        self.repo_path.as_deref().unwrap_or(&self.name)
    }

    /// The revision rendered as text, if the entry has a scalar revision.
    pub fn revision_text(&self) -> Option<String> {
        match self.revision.as_ref()? {
            serde_yaml::Value::String(s) => Some(s.clone()),
            serde_yaml::Value::Number(n) => Some(n.to_string()),
            serde_yaml::Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

impl Manifest {
    /// Base name of the default remote: the last path segment of its `url-base`.
    ///
    /// `None` when there is no `defaults.remote`, no remote of that name, or the
    /// remote has no `url-base`.
    pub fn default_remote_base(&self) -> Option<&str> {
        let alias = self.defaults.as_ref()?.remote.as_deref()?;
        let remote = self.remotes.iter().find(|remote| remote.name == alias)?;
        let url_base = remote.url_base.as_deref()?.trim_end_matches('/');
        url_base.rsplit('/').next()
    }
}

/// `remote/repo` identity of the module whose revision is being bumped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleReference {
    pub remote_name: String,
    pub repo_name: String,
}

impl FromStr for ModuleReference {
    type Err = UpdaterError;

    fn from_str(identity: &str) -> Result<Self> {
        let mut parts = identity.split('/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(remote), Some(repo), None) if !remote.is_empty() && !repo.is_empty() => {
                Ok(Self {
                    remote_name: remote.to_string(),
                    repo_name: repo.to_string(),
                })
            }
            _ => Err(UpdaterError::Usage(format!(
                "Module path '{identity}' must have the form <remote>/<repo>"
            ))),
        }
    }
}

impl fmt::Display for ModuleReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.remote_name, self.repo_name)
    }
}

/// A parsed manifest that remembers its original text.
#[derive(Debug, Clone)]
pub struct ManifestDocument {
    source: String,
    manifest: Manifest,
    layout: ManifestLayout,
    revisions: BTreeMap<usize, String>,
}

impl ManifestDocument {
    pub fn parse(raw: &str) -> Result<Self> {
        let file: ManifestFile = serde_yaml::from_str(raw)
            .map_err(|e| UpdaterError::Manifest(format!("Failed to parse manifest: {e}")))?;

        let layout = ManifestLayout::scan(raw)?;
        layout.ensure_matches(&file.manifest.projects)?;

        Ok(Self {
            source: raw.to_string(),
            manifest: file.manifest,
            layout,
            revisions: BTreeMap::new(),
        })
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Point the project at `index` to `revision`.
    pub fn set_revision(&mut self, index: usize, revision: &str) -> Result<()> {
        let project = self.manifest.projects.get_mut(index).ok_or_else(|| {
            UpdaterError::Manifest(format!("No project at index {index} in manifest"))
        })?;
        project.revision = Some(serde_yaml::Value::String(revision.to_string()));
        self.revisions.insert(index, revision.to_string());
        Ok(())
    }

    pub fn is_modified(&self) -> bool {
        !self.revisions.is_empty()
    }

    /// Render the original text with the changed revisions written in.
    ///
    /// The result is parsed again and must equal the in-memory manifest, so an edit
    /// that would change anything besides the patched revisions is an error.
    pub fn serialize(&self) -> Result<String> {
        if !self.is_modified() {
            return Ok(self.source.clone());
        }

        let rendered = self.layout.render(&self.source, &self.revisions);
        self.verify(&rendered)?;
        Ok(rendered)
    }

    fn verify(&self, rendered: &str) -> Result<()> {
        let reparsed: ManifestFile = serde_yaml::from_str(rendered).map_err(|e| {
            UpdaterError::Manifest(format!("Patched manifest no longer parses: {e}"))
        })?;

        if reparsed.manifest.projects.len() != self.manifest.projects.len() {
            return Err(UpdaterError::Manifest(format!(
                "Patched manifest has {} projects instead of {}",
                reparsed.manifest.projects.len(),
                self.manifest.projects.len()
            )));
        }

        let changed = self
            .manifest
            .projects
            .iter()
            .zip(&reparsed.manifest.projects)
            .find(|(expected, actual)| expected != actual);
        if let Some((expected, actual)) = changed {
            return Err(UpdaterError::Manifest(format!(
                "Patching project '{}' would write revision {:?} instead of {:?}; unsupported layout",
                expected.name,
                actual.revision_text(),
                expected.revision_text()
            )));
        }

        if reparsed.manifest != self.manifest {
            return Err(UpdaterError::Manifest(
                "Patching would change manifest content outside the projects list".to_string(),
            ));
        }

        Ok(())
    }
}
