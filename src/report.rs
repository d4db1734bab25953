//! OS identification and build report rendering.
//!
//! The report is markdown meant for cut-and-paste into a PR comment:
//! which specs passed and failed on which host, plus a `spack find -v`
//! listing of everything that ended up installed.

use std::fmt::Write as _;

use crate::spec::Spec;

/// Passed/Failed lists shorter than this render on a single line.
const ONE_LINE_LIMIT: usize = 80;

/// Host identification from /etc/os-release.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OsInfo {
    pub pretty_name: String,
    pub name: String,
    pub version_id: String,
}

impl OsInfo {
    /// Read and parse /etc/os-release. Missing or unreadable files yield
    /// empty fields; the report just omits the host description then.
    pub fn detect() -> Self {
        match std::fs::read_to_string("/etc/os-release") {
            Ok(contents) => Self::parse(&contents),
            Err(_) => Self::default(),
        }
    }

    pub fn parse(os_release: &str) -> Self {
        let mut info = Self::default();
        for line in os_release.lines() {
            if let Some(value) = line.strip_prefix("PRETTY_NAME=") {
                info.pretty_name = unquote(value);
            } else if let Some(value) = line.strip_prefix("VERSION_ID=") {
                info.version_id = unquote(value);
            } else if let Some(value) = line.strip_prefix("NAME=") {
                info.name = unquote(value);
            }
        }
        info
    }

    /// " on Ubuntu 24.04.1 LTS", or empty when unknown.
    pub fn about_build_host(&self) -> String {
        if self.pretty_name.is_empty() {
            String::new()
        } else {
            format!(" on {}", self.pretty_name)
        }
    }

    /// PR label applied when every spec passes, e.g. "Built on Ubuntu 24.04".
    pub fn success_label(&self) -> String {
        format!("Built on {} {}", self.name, self.version_id)
    }
}

fn unquote(value: &str) -> String {
    value.trim().trim_matches('"').to_string()
}

/// Everything the final report needs.
#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    pub os: OsInfo,
    /// Specs that were already installed before the run.
    pub installed: Vec<Spec>,
    pub passed: Vec<Spec>,
    pub failed: Vec<Spec>,
    /// Captured `spack find -v` listing of installed + passed specs.
    pub find_output: String,
}

impl BuildReport {
    pub fn all_passed(&self) -> bool {
        self.failed.is_empty() && !(self.passed.is_empty() && self.installed.is_empty())
    }

    /// Render the markdown report.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Build results{}:", self.os.about_build_host());
        out.push_str("```py\n");

        let done: Vec<String> = self
            .installed
            .iter()
            .chain(&self.passed)
            .map(Spec::to_string)
            .collect();
        if !done.is_empty() {
            let joined = done.join(" ");
            if joined.len() < ONE_LINE_LIMIT {
                let _ = writeln!(out, "Passed: {}", joined);
            } else {
                let _ = writeln!(out, "Passed:\n{}", done.join("\n"));
            }
        }
        if !self.failed.is_empty() {
            let failed: Vec<String> = self.failed.iter().map(Spec::to_string).collect();
            let _ = writeln!(out, "\nFailed: {}", failed.join(" "));
        }

        let _ = writeln!(out, "spack find -v:");
        let _ = writeln!(out, "{}", self.find_output);
        out.push_str("```\n");
        let _ = writeln!(out, "Generated by:\n{}", env!("CARGO_PKG_REPOSITORY"));
        out
    }
}
