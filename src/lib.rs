//! Build and validate Spack recipes changed in a pull request.
//!
//! For reviewing spack PRs: fetch the PR diff, derive the build specs the
//! change touches, and run `spack install` (or download-only checks) over
//! them, ending in a markdown report ready for a PR comment.
//!
//! # Pipeline
//!
//! ```text
//! gh pr diff ──> diff::extract_specs ──> SpecSet
//!                                           │ (optional)
//!                              expand::expand_specs ── spack versions --safe
//!                                           │
//!                    spack fetch / find / uninstall / install
//!                                           │
//!                                   report::BuildReport
//! ```
//!
//! The extractor walks the diff once: every changed `package.py` yields a
//! bare recipe spec, added `version(...)` and `variant(...)` declarations
//! narrow it to `recipe@version` / `recipe+variant` entries. Expansion
//! then multiplies version-less entries into a bounded set of known-good
//! historical versions, so a recipe edit gets build coverage beyond the
//! versions the PR itself adds.
//!
//! Everything runs single-threaded and sequential; spack and gh are the
//! only collaborators and each call is one blocking child process.

pub mod cmd;
pub mod diff;
pub mod expand;
pub mod github;
pub mod output;
pub mod report;
pub mod spack;
pub mod spec;

pub use diff::extract_specs;
pub use expand::{VersionSource, expand_specs};
pub use spec::{Spec, SpecSet};
