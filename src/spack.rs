//! Spack collaborator.
//!
//! Thin, sequential wrappers around the spack binary: one blocking child
//! process per call, no state of its own. Build and fetch commands stream
//! their output straight to the terminal; queries capture it.

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::cmd::Cmd;
use crate::expand::VersionSource;
use crate::spec::Spec;

/// Fetch flags for download-only checks: re-fetch everything, deprecated
/// versions included.
pub const FETCH_FLAGS: &[&str] = &["--fresh", "--fresh-roots", "--deprecated"];

/// Recipes that are impractical to build on a typical review host.
/// composable-kernel takes many hours without a fast GPU.
pub const INSTALL_SKIP: &[&str] = &["composable-kernel"];

/// Noise token stripped from `spack find` listings before they are shown.
const FIND_NOISE: &str = " build_system=python_pip";

/// Handle to a spack installation.
#[derive(Debug, Clone)]
pub struct SpackCli {
    spack: PathBuf,
}

impl SpackCli {
    pub fn new(spack: impl Into<PathBuf>) -> Self {
        Self { spack: spack.into() }
    }

    fn cmd<I, S>(&self, args: I) -> Cmd
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Cmd::new(&self.spack).args(args)
    }

    fn run_context(&self) -> String {
        format!("failed to run {}", self.spack.display())
    }

    /// Download-only check for one spec. Returns the exit code; the
    /// fetch output streams to the terminal.
    pub fn fetch(&self, spec: &Spec) -> Result<i32> {
        self.cmd(["fetch"])
            .args(FETCH_FLAGS.iter().copied())
            .arg(spec.to_string())
            .stream()
            .context(self.run_context())
    }

    fn install_cmd(&self, spec: &Spec) -> Cmd {
        self.cmd(["install", "-v", "--fail-fast", "--deprecated"])
            .arg(spec.to_string())
    }

    /// Build one spec. Returns whether the install succeeded; the build
    /// log streams to the terminal.
    pub fn install(&self, spec: &Spec) -> Result<bool> {
        let code = self.install_cmd(spec).stream().context(self.run_context())?;
        Ok(code == 0)
    }

    /// The install command line for a spec, for failure reports.
    pub fn install_command_line(&self, spec: &Spec) -> String {
        self.install_cmd(spec).command_line()
    }

    /// Which of the given specs are already installed, with the `spack
    /// find` listing captured for each.
    pub fn find_installed<'a, I>(&self, specs: I) -> Result<(Vec<Spec>, Vec<String>)>
    where
        I: IntoIterator<Item = &'a Spec>,
    {
        let mut installed = Vec::new();
        let mut findings = Vec::new();

        for spec in specs {
            let out = self
                .cmd(["find", "--no-groups", "-v", "-I"])
                .arg(spec.to_string())
                .capture()
                .context(self.run_context())?;
            if out.success {
                installed.push(spec.clone());
                findings.push(out.stdout.replace(FIND_NOISE, ""));
            }
        }

        Ok((installed, findings))
    }

    /// `spack find -v` listing of the given specs, for the report footer.
    /// A failing find is not fatal; its error text is reported instead.
    pub fn find_report(&self, specs: &[Spec]) -> Result<String> {
        let out = self
            .cmd(["find", "-v"])
            .args(specs.iter().map(Spec::to_string))
            .capture()
            .context(self.run_context())?;
        if out.success {
            Ok(out.stdout)
        } else {
            Ok(out.error_text().to_string())
        }
    }

    /// Uninstall a spec and everything depending on it. A failed
    /// uninstall is fatal to the run.
    pub fn uninstall(&self, spec: &Spec) -> Result<()> {
        let code = self
            .cmd(["uninstall", "-ya", "--dependents"])
            .arg(spec.to_string())
            .stream()
            .context(self.run_context())?;
        if code != 0 {
            anyhow::bail!("spack uninstall {} failed with exit code {}", spec, code);
        }
        Ok(())
    }
}

impl VersionSource for SpackCli {
    /// Parse the output of `spack versions --safe`:
    ///
    /// ```text
    /// ==> Safe versions (already checksummed):
    ///   master  2.4.1  2.3  2.2  2.1  2.0  1.3
    /// ```
    fn safe_versions(&self, recipe: &str) -> Result<Vec<String>> {
        let out = self
            .cmd(["versions", "--safe"])
            .arg(recipe)
            .capture()
            .context(self.run_context())?;
        if !out.success {
            anyhow::bail!("spack versions --safe {} failed: {}", recipe, out.error_text());
        }
        Ok(parse_safe_versions(&out.stdout))
    }
}

/// Version tokens from `spack versions --safe` output, banner lines
/// skipped.
fn parse_safe_versions(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .filter(|line| !line.starts_with("==>"))
        .flat_map(str::split_whitespace)
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_safe_versions() {
        let stdout = "==> Safe versions (already checksummed):\n  master  2.4.1  2.3  2.2  2.1  2.0  1.3";
        assert_eq!(
            parse_safe_versions(stdout),
            vec!["master", "2.4.1", "2.3", "2.2", "2.1", "2.0", "1.3"]
        );
    }

    #[test]
    fn test_parse_safe_versions_multiline() {
        let stdout = "==> Safe versions (already checksummed):\n  3.0  2.9\n  2.8  2.7";
        assert_eq!(parse_safe_versions(stdout), vec!["3.0", "2.9", "2.8", "2.7"]);
    }

    #[test]
    fn test_parse_safe_versions_empty() {
        assert!(parse_safe_versions("").is_empty());
        assert!(parse_safe_versions("==> Safe versions (already checksummed):").is_empty());
    }

    #[test]
    fn test_install_command_line() {
        let spack = SpackCli::new("bin/spack");
        assert_eq!(
            spack.install_command_line(&Spec::with_version("wget", "2.4.1")),
            "bin/spack install -v --fail-fast --deprecated wget@2.4.1"
        );
    }
}
