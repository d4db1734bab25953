//! Safe-version expansion.
//!
//! Multiplies each version-less spec into a bounded set of historically
//! checksummed versions, as reported by the build tool. Expansion is
//! best-effort enrichment: a recipe whose version query errors or comes
//! back empty keeps its original entry, so no recipe silently disappears
//! from the final set.

use anyhow::Result;

use crate::spec::SpecSet;

/// Version labels that name a development channel rather than a release.
/// These routinely fail to build and are filtered before truncation.
pub const UNSAFE_CHANNELS: &[&str] = &["master", "develop", "main"];

/// The safe-version query seam.
///
/// Implementations return a recipe's known-good versions in the order the
/// build tool reports them, most trusted first. The caller does not
/// re-sort. An error is treated as "no versions available".
pub trait VersionSource {
    fn safe_versions(&self, recipe: &str) -> Result<Vec<String>>;
}

/// Expand every version-less spec into up to `max_versions` versioned
/// specs, in source order.
///
/// Expanded entries keep their variants: `foo+mpi` becomes `foo+mpi@X`
/// for each safe version `X` of `foo`. The replaced entry is removed and
/// the versioned specs are appended at the end of the collection.
///
/// Callers wanting "no expansion" must not call this with a zero cap: a
/// recipe with known safe versions still has its bare entry removed, and
/// truncation to zero then appends nothing in its place.
pub fn expand_specs(specs: &mut SpecSet, max_versions: usize, source: &dyn VersionSource) {
    let snapshot: Vec<_> = specs.iter().cloned().collect();

    for spec in snapshot {
        if spec.version.is_some() {
            continue;
        }
        let versions = match source.safe_versions(&spec.recipe) {
            Ok(versions) => versions,
            Err(_) => continue,
        };
        let safe: Vec<_> = versions
            .into_iter()
            .filter(|v| !UNSAFE_CHANNELS.contains(&v.as_str()))
            .collect();
        if safe.is_empty() {
            continue;
        }

        specs.remove(&spec);
        for version in safe.into_iter().take(max_versions) {
            specs.append(spec.clone().and_version(version));
        }
    }
}
