//! Diff spec extraction.
//!
//! Scans the unified diff of a pull request and derives the specs the
//! change affects or introduces: every touched `package.py` yields a bare
//! recipe spec, every added `version("...")` declaration narrows it to
//! `recipe@version`, and every added `variant("...")` declaration yields
//! `recipe+variant` plus a combination with each version already seen in
//! the same file block.
//!
//! The scanner is a single forward pass. Each line is classified into a
//! typed [`LineEvent`]; per-file state lives in a context that is reset
//! wholesale at every file boundary, while the accumulated [`SpecSet`]
//! survives across blocks. Lines that match no pattern are inert, never
//! an error: diff content is free-form source code and most of it is
//! irrelevant.

use crate::spec::{Spec, SpecSet};

/// Path fragment that marks a changed file as a package recipe.
pub const PACKAGE_PATH_MARKER: &str = "var/spack/repos/builtin/packages/";

const PACKAGE_FILE: &str = "package.py";

/// One recognized line category in the diff stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineEvent<'a> {
    /// `diff --git ...` — start of a new per-file block.
    FileBoundary,
    /// An added line (leading `+`).
    Addition(AdditionEvent<'a>),
    /// Context, removal, or header lines. Skipped entirely.
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AdditionEvent<'a> {
    /// `+++ b/<path>` — the new path of the current file block.
    NewPath(&'a str),
    /// A line that is exactly `version(`, value on the following line.
    VersionOpener,
    /// `version("X", ...)` with the version on the same line.
    VersionDecl(&'a str),
    /// `variant("name", ...)`.
    VariantDecl(&'a str),
    /// Any other added line; carries the body for quoted-token scans.
    Plain(&'a str),
}

impl<'a> AdditionEvent<'a> {
    /// First quoted token on the line, if any. Used when the previous
    /// line opened a version declaration and this line carries the value.
    fn quoted_token(&self) -> Option<&'a str> {
        match *self {
            AdditionEvent::VersionDecl(value) | AdditionEvent::VariantDecl(value) => Some(value),
            AdditionEvent::Plain(body) => first_quoted(body),
            AdditionEvent::NewPath(_) | AdditionEvent::VersionOpener => None,
        }
    }
}

/// Per-file-block parse state. Reset at every file boundary; the spec
/// collection itself accumulates across the whole diff.
#[derive(Debug, Default)]
struct ParseContext {
    current_recipe: Option<String>,
    pending_versions: Vec<String>,
    pending_variants: Vec<String>,
    awaiting_version_value: bool,
}

impl ParseContext {
    fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Extract the ordered spec collection from a unified diff.
pub fn extract_specs(diff: &str) -> SpecSet {
    let mut specs = SpecSet::new();
    let mut ctx = ParseContext::default();

    for line in diff.lines() {
        match classify(line) {
            LineEvent::FileBoundary => ctx.reset(),
            LineEvent::Other => {}
            LineEvent::Addition(AdditionEvent::NewPath(path)) => {
                if let Some(recipe) = recipe_from_path(path) {
                    ctx.current_recipe = Some(recipe.to_string());
                    specs.insert(Spec::bare(recipe));
                }
            }
            LineEvent::Addition(event) => {
                let Some(recipe) = ctx.current_recipe.clone() else {
                    continue;
                };

                // A pending opener claims the next added line: its first
                // quoted token is the version value, whatever else the
                // line looks like.
                if ctx.awaiting_version_value {
                    ctx.awaiting_version_value = false;
                    if let Some(version) = event.quoted_token() {
                        record_version(&mut specs, &mut ctx, &recipe, version);
                    }
                    continue;
                }

                match event {
                    AdditionEvent::VersionOpener => ctx.awaiting_version_value = true,
                    AdditionEvent::VersionDecl(version) => {
                        record_version(&mut specs, &mut ctx, &recipe, version);
                    }
                    AdditionEvent::VariantDecl(name) => {
                        ctx.pending_variants.push(name.to_string());
                        specs.insert(Spec::with_variant(&recipe, name));
                        // A new variant is assumed valid for every version
                        // already observed in this file block. Variants do
                        // not combine with each other.
                        for version in &ctx.pending_versions {
                            specs.insert(Spec::with_variant(&recipe, name).and_version(version));
                        }
                    }
                    AdditionEvent::Plain(_) | AdditionEvent::NewPath(_) => {}
                }
            }
        }
    }

    specs
}

fn record_version(specs: &mut SpecSet, ctx: &mut ParseContext, recipe: &str, version: &str) {
    ctx.pending_versions.push(version.to_string());
    specs.insert(Spec::with_version(recipe, version));
}

fn classify(line: &str) -> LineEvent<'_> {
    if line.starts_with("diff --git") {
        return LineEvent::FileBoundary;
    }
    if let Some(path) = line.strip_prefix("+++ b/") {
        return LineEvent::Addition(AdditionEvent::NewPath(path));
    }
    let Some(body) = line.strip_prefix('+') else {
        return LineEvent::Other;
    };
    if body.trim() == "version(" {
        return LineEvent::Addition(AdditionEvent::VersionOpener);
    }
    if let Some(version) = declaration_value(body, "version(\"") {
        return LineEvent::Addition(AdditionEvent::VersionDecl(version));
    }
    if let Some(name) = declaration_value(body, "variant(\"") {
        return LineEvent::Addition(AdditionEvent::VariantDecl(name));
    }
    LineEvent::Addition(AdditionEvent::Plain(body))
}

/// Extract the first argument of a `name("value", ...` declaration. The
/// closing quote must be followed by `, ` — a bare `name("value")` call
/// declares nothing we care about.
fn declaration_value<'a>(body: &'a str, opener: &str) -> Option<&'a str> {
    let (_, rest) = body.split_once(opener)?;
    let (value, after) = rest.split_once('"')?;
    if value.is_empty() || !after.starts_with(", ") {
        return None;
    }
    Some(value)
}

/// First `"quoted"` token on a line.
fn first_quoted(body: &str) -> Option<&str> {
    let (_, rest) = body.split_once('"')?;
    let (value, _) = rest.split_once('"')?;
    if value.is_empty() { None } else { Some(value) }
}

/// Recipe name from a changed-file path, when the path is a package
/// definition: `var/spack/repos/builtin/packages/<recipe>/package.py`.
fn recipe_from_path(path: &str) -> Option<&str> {
    let (_, rest) = path.split_once(PACKAGE_PATH_MARKER)?;
    let recipe = rest.strip_suffix(PACKAGE_FILE)?.strip_suffix('/')?;
    if recipe.is_empty() || recipe.contains('/') {
        return None;
    }
    Some(recipe)
}
