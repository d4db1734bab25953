//! Build spec data model.
//!
//! A [`Spec`] names a package recipe plus optional variants and a version,
//! rendered as `recipe+variant@version`. A [`SpecSet`] keeps specs in the
//! order they were first seen and upholds the overriding-insert rule: a
//! spec carrying a version or variant supersedes a previously inserted
//! bare entry for the same recipe.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SpecError {
    #[error("empty spec")]
    Empty,
    #[error("invalid spec syntax: {0}")]
    InvalidSyntax(String),
}

/// A build specification: recipe name, optional variants, optional version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spec {
    pub recipe: String,
    pub variants: Vec<String>,
    pub version: Option<String>,
}

impl Spec {
    /// A spec naming just a recipe, no version or variants.
    pub fn bare(recipe: impl Into<String>) -> Self {
        Self {
            recipe: recipe.into(),
            variants: Vec::new(),
            version: None,
        }
    }

    pub fn with_version(recipe: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            recipe: recipe.into(),
            variants: Vec::new(),
            version: Some(version.into()),
        }
    }

    pub fn with_variant(recipe: impl Into<String>, variant: impl Into<String>) -> Self {
        Self {
            recipe: recipe.into(),
            variants: vec![variant.into()],
            version: None,
        }
    }

    /// Attach a version to an existing spec.
    pub fn and_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// No version and no variants.
    pub fn is_bare(&self) -> bool {
        self.variants.is_empty() && self.version.is_none()
    }

    /// Two specs target the same recipe, regardless of version/variants.
    pub fn same_recipe(&self, other: &Spec) -> bool {
        self.recipe == other.recipe
    }
}

impl fmt::Display for Spec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.recipe)?;
        for variant in &self.variants {
            write!(f, "+{}", variant)?;
        }
        if let Some(ref version) = self.version {
            write!(f, "@{}", version)?;
        }
        Ok(())
    }
}

impl FromStr for Spec {
    type Err = SpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(SpecError::Empty);
        }

        // Version comes last, variants before it: recipe+v1+v2@version
        let (head, version) = match s.split_once('@') {
            Some((head, version)) => {
                if version.is_empty() {
                    return Err(SpecError::InvalidSyntax(s.to_string()));
                }
                (head, Some(version.to_string()))
            }
            None => (s, None),
        };

        let mut parts = head.split('+');
        let recipe = parts.next().unwrap_or_default();
        if recipe.is_empty() {
            return Err(SpecError::InvalidSyntax(s.to_string()));
        }

        let mut variants = Vec::new();
        for variant in parts {
            if variant.is_empty() {
                return Err(SpecError::InvalidSyntax(s.to_string()));
            }
            variants.push(variant.to_string());
        }

        Ok(Spec {
            recipe: recipe.to_string(),
            variants,
            version,
        })
    }
}

/// An ordered, deduplicated collection of specs.
///
/// Insertion order is preserved; the set is never re-sorted. Two insert
/// flavors exist: [`SpecSet::insert`] applies the overriding rule (a
/// versioned or variant spec replaces a bare entry for its recipe, and a
/// bare entry is dropped when the recipe is already represented), while
/// [`SpecSet::append`] only deduplicates exact matches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecSet {
    specs: Vec<Spec>,
}

impl SpecSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overriding insert.
    ///
    /// A bare spec is a no-op when any spec for the same recipe is already
    /// present. A specific spec removes a previously held bare entry for
    /// its recipe and is appended unless it is an exact duplicate.
    pub fn insert(&mut self, spec: Spec) {
        if self.specs.contains(&spec) {
            return;
        }
        if spec.is_bare() {
            if self.specs.iter().any(|s| s.same_recipe(&spec)) {
                return;
            }
        } else {
            self.specs.retain(|s| !(s.is_bare() && s.same_recipe(&spec)));
        }
        self.specs.push(spec);
    }

    /// Append without the overriding rule; exact duplicates are dropped.
    pub fn append(&mut self, spec: Spec) {
        if !self.specs.contains(&spec) {
            self.specs.push(spec);
        }
    }

    /// Remove an exact entry. Returns whether it was present.
    pub fn remove(&mut self, spec: &Spec) -> bool {
        match self.specs.iter().position(|s| s == spec) {
            Some(idx) => {
                self.specs.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, spec: &Spec) -> bool {
        self.specs.contains(spec)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Spec> {
        self.specs.iter()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Textual forms, in collection order.
    pub fn to_strings(&self) -> Vec<String> {
        self.specs.iter().map(Spec::to_string).collect()
    }
}

impl<'a> IntoIterator for &'a SpecSet {
    type Item = &'a Spec;
    type IntoIter = std::slice::Iter<'a, Spec>;

    fn into_iter(self) -> Self::IntoIter {
        self.specs.iter()
    }
}

impl IntoIterator for SpecSet {
    type Item = Spec;
    type IntoIter = std::vec::IntoIter<Spec>;

    fn into_iter(self) -> Self::IntoIter {
        self.specs.into_iter()
    }
}

impl FromIterator<Spec> for SpecSet {
    fn from_iter<I: IntoIterator<Item = Spec>>(iter: I) -> Self {
        let mut set = SpecSet::new();
        for spec in iter {
            set.insert(spec);
        }
        set
    }
}
