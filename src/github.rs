//! GitHub CLI collaborator.
//!
//! The PR diff and labels go through `gh`, which carries authentication
//! and remote resolution for us. Fetching the diff is the one fatal
//! boundary in the tool: without it there is nothing to check.

use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

use crate::cmd::Cmd;

#[derive(Error, Debug)]
pub enum GhError {
    /// The PR diff could not be obtained. Fatal: aborts before any
    /// extraction begins.
    #[error("failed to fetch the PR diff: {0}")]
    SourceFetch(String),
    #[error("failed to label the PR: {0}")]
    Label(String),
    #[error("failed to run gh: {0}")]
    Io(#[from] std::io::Error),
}

/// Metadata of the pull request under review, from `gh pr view`.
#[derive(Debug, Clone, Deserialize)]
pub struct PrInfo {
    pub number: u64,
    pub title: String,
    pub url: String,
}

/// Handle to the GitHub CLI.
#[derive(Debug, Clone)]
pub struct GhCli {
    gh: PathBuf,
}

impl GhCli {
    pub fn new(gh: impl Into<PathBuf>) -> Self {
        Self { gh: gh.into() }
    }

    /// The full diff of the current branch's pull request.
    ///
    /// Anything on stderr counts as failure, even on a zero exit.
    pub fn pr_diff(&self) -> Result<String, GhError> {
        let out = Cmd::new(&self.gh).args(["pr", "diff"]).quiet().capture()?;
        if !out.success || !out.stderr.is_empty() {
            return Err(GhError::SourceFetch(out.error_text().to_string()));
        }
        Ok(out.stdout)
    }

    /// Number, title, and URL of the PR under review. Soft-optional:
    /// used only to headline the output.
    pub fn pr_info(&self) -> Option<PrInfo> {
        let out = Cmd::new(&self.gh)
            .args(["pr", "view", "--json", "number,title,url"])
            .quiet()
            .capture()
            .ok()?;
        if !out.success {
            return None;
        }
        serde_json::from_str(&out.stdout).ok()
    }

    /// Add a label to the PR, e.g. after all specs built cleanly.
    pub fn add_label(&self, label: &str) -> Result<(), GhError> {
        let out = Cmd::new(&self.gh)
            .args(["pr", "edit", "--add-label", label])
            .capture()?;
        if !out.success {
            return Err(GhError::Label(out.error_text().to_string()));
        }
        Ok(())
    }
}

impl Default for GhCli {
    fn default() -> Self {
        Self::new("gh")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pr_info_json_shape() {
        let info: PrInfo = serde_json::from_str(
            r#"{"number": 42, "title": "wget: add v2.4.1", "url": "https://github.com/spack/spack/pull/42"}"#,
        )
        .unwrap();
        assert_eq!(info.number, 42);
        assert_eq!(info.title, "wget: add v2.4.1");
        assert_eq!(info.url, "https://github.com/spack/spack/pull/42");
    }
}
