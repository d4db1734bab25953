//! End-to-end tests for the extract → expand → check pipeline, driven
//! against fake spack and gh executables.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use spack_pr_check::github::{GhCli, GhError};
use spack_pr_check::spack::SpackCli;
use spack_pr_check::{Spec, VersionSource, expand_specs, extract_specs};
use tempfile::TempDir;

/// Write an executable shell script into the test directory.
fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}")).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// A spack stand-in with safe versions for every recipe, nothing
/// installed, and installs that fail for specs naming "fails".
const FAKE_SPACK: &str = r#"
cmd="$1"; shift
for arg in "$@"; do last="$arg"; done
case "$cmd" in
  versions)
    echo "==> Safe versions (already checksummed):"
    echo "  develop  2.4.1  2.3  2.2  2.1"
    ;;
  fetch)
    case "$last" in *broken*) exit 3 ;; esac
    ;;
  install)
    case "$last" in *fails*) echo "build error" >&2; exit 1 ;; esac
    echo "installed $last"
    ;;
  find)
    exit 1
    ;;
  uninstall)
    case "$last" in *stuck*) exit 2 ;; esac
    ;;
esac
"#;

const SAMPLE_DIFF: &str = "\
diff --git a/var/spack/repos/builtin/packages/wget/package.py b/var/spack/repos/builtin/packages/wget/package.py
--- a/var/spack/repos/builtin/packages/wget/package.py
+++ b/var/spack/repos/builtin/packages/wget/package.py
@@ -10,6 +10,7 @@
     homepage = \"https://www.gnu.org/software/wget/\"
+    version(\"2.4.1\", sha256=\"0123abcd\")
diff --git a/var/spack/repos/builtin/packages/zlib/package.py b/var/spack/repos/builtin/packages/zlib/package.py
--- a/var/spack/repos/builtin/packages/zlib/package.py
+++ b/var/spack/repos/builtin/packages/zlib/package.py
@@ -3,4 +3,5 @@
+    maintainers(\"someone\")
";

// ==================== Extractor + Expander ====================

#[test]
fn test_extract_then_expand_against_fake_spack() {
    let dir = TempDir::new().unwrap();
    let spack = SpackCli::new(write_script(dir.path(), "spack", FAKE_SPACK));

    let mut specs = extract_specs(SAMPLE_DIFF);
    assert_eq!(specs.to_strings(), vec!["wget@2.4.1", "zlib"]);

    // wget@2.4.1 already carries a version; only zlib expands, and the
    // develop channel entry is filtered out before the cap applies.
    expand_specs(&mut specs, 3, &spack);
    assert_eq!(
        specs.to_strings(),
        vec!["wget@2.4.1", "zlib@2.4.1", "zlib@2.3", "zlib@2.2"]
    );
}

#[test]
fn test_safe_versions_query() {
    let dir = TempDir::new().unwrap();
    let spack = SpackCli::new(write_script(dir.path(), "spack", FAKE_SPACK));

    let versions = spack.safe_versions("wget").unwrap();
    assert_eq!(versions, vec!["develop", "2.4.1", "2.3", "2.2", "2.1"]);
}

#[test]
fn test_safe_versions_query_failure_is_error() {
    let dir = TempDir::new().unwrap();
    let spack = SpackCli::new(write_script(dir.path(), "spack", "exit 1"));
    assert!(spack.safe_versions("wget").is_err());
}

#[test]
fn test_expand_survives_failing_spack() {
    let dir = TempDir::new().unwrap();
    let spack = SpackCli::new(write_script(dir.path(), "spack", "exit 1"));

    let mut specs = extract_specs(SAMPLE_DIFF);
    expand_specs(&mut specs, 3, &spack);
    // Soft failure: nothing dropped, nothing added.
    assert_eq!(specs.to_strings(), vec!["wget@2.4.1", "zlib"]);
}

// ==================== Build / Fetch / Uninstall ====================

#[test]
fn test_install_pass_and_fail() {
    let dir = TempDir::new().unwrap();
    let spack = SpackCli::new(write_script(dir.path(), "spack", FAKE_SPACK));

    assert!(spack.install(&Spec::with_version("wget", "2.4.1")).unwrap());
    assert!(!spack.install(&Spec::bare("proj-fails")).unwrap());
}

#[test]
fn test_fetch_exit_codes() {
    let dir = TempDir::new().unwrap();
    let spack = SpackCli::new(write_script(dir.path(), "spack", FAKE_SPACK));

    assert_eq!(spack.fetch(&Spec::bare("wget")).unwrap(), 0);
    assert_eq!(spack.fetch(&Spec::bare("broken-pkg")).unwrap(), 3);
}

#[test]
fn test_missing_spack_binary_is_fatal() {
    let spack = SpackCli::new("/nonexistent/spack");
    assert!(spack.install(&Spec::bare("wget")).is_err());
}

#[test]
fn test_find_installed_empty_when_nothing_installed() {
    let dir = TempDir::new().unwrap();
    let spack = SpackCli::new(write_script(dir.path(), "spack", FAKE_SPACK));

    let specs = extract_specs(SAMPLE_DIFF);
    let (installed, findings) = spack.find_installed(&specs).unwrap();
    assert!(installed.is_empty());
    assert!(findings.is_empty());
}

#[test]
fn test_find_installed_captures_listing() {
    let dir = TempDir::new().unwrap();
    let script = r#"
case "$1" in
  find) echo "zlib@1.3 build_system=python_pip arch=linux" ;;
esac
"#;
    let spack = SpackCli::new(write_script(dir.path(), "spack", script));

    let specs = [Spec::bare("zlib")];
    let (installed, findings) = spack.find_installed(&specs).unwrap();
    assert_eq!(installed, vec![Spec::bare("zlib")]);
    // The python_pip noise token is stripped from listings.
    assert_eq!(findings, vec!["zlib@1.3 arch=linux"]);
}

#[test]
fn test_uninstall_failure_is_fatal() {
    let dir = TempDir::new().unwrap();
    let spack = SpackCli::new(write_script(dir.path(), "spack", FAKE_SPACK));

    assert!(spack.uninstall(&Spec::bare("wget")).is_ok());
    let err = spack.uninstall(&Spec::bare("stuck-pkg")).unwrap_err();
    assert!(err.to_string().contains("exit code 2"));
}

// ==================== GitHub CLI Boundary ====================

#[test]
fn test_pr_diff_success() {
    let dir = TempDir::new().unwrap();
    let gh = GhCli::new(write_script(
        dir.path(),
        "gh",
        "echo 'diff --git a/x b/x'",
    ));

    let diff = gh.pr_diff().unwrap();
    assert_eq!(diff, "diff --git a/x b/x");
}

#[test]
fn test_pr_diff_nonzero_exit_is_fatal() {
    let dir = TempDir::new().unwrap();
    let gh = GhCli::new(write_script(
        dir.path(),
        "gh",
        "echo 'no pull requests found' >&2; exit 1",
    ));

    match gh.pr_diff() {
        Err(GhError::SourceFetch(msg)) => assert!(msg.contains("no pull requests found")),
        other => panic!("expected SourceFetch error, got {other:?}"),
    }
}

#[test]
fn test_pr_diff_stderr_is_fatal_even_on_success_exit() {
    let dir = TempDir::new().unwrap();
    let gh = GhCli::new(write_script(
        dir.path(),
        "gh",
        "echo 'partial diff'; echo 'warning: truncated' >&2; exit 0",
    ));

    assert!(matches!(gh.pr_diff(), Err(GhError::SourceFetch(_))));
}

#[test]
fn test_pr_info_parses_gh_json() {
    let dir = TempDir::new().unwrap();
    let gh = GhCli::new(write_script(
        dir.path(),
        "gh",
        r#"echo '{"number": 7, "title": "wget: add v2.4.1", "url": "https://example.invalid/pull/7"}'"#,
    ));

    let info = gh.pr_info().unwrap();
    assert_eq!(info.number, 7);
    assert_eq!(info.title, "wget: add v2.4.1");
}

#[test]
fn test_pr_info_soft_fails() {
    let dir = TempDir::new().unwrap();
    let gh = GhCli::new(write_script(dir.path(), "gh", "exit 1"));
    assert!(gh.pr_info().is_none());

    let gh = GhCli::new("/nonexistent/gh");
    assert!(gh.pr_info().is_none());
}
