//! Genome and mutant data types
//!
//! A `Genome` owns the parsed representation of one subject file together
//! with a fingerprint (size + modification time) used for cache
//! invalidation: any operation that consults the tree first re-stats the
//! file and reparses when the on-disk bytes changed, so stale cached trees
//! are never reused silently.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::debug;

use crate::catalog::MutationOp;
use crate::error::{MutationError, Result};
use crate::location::LocationIndex;
use crate::walker::{apply_mutation, discover_locations};

/// Size + modification time of a source file at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fingerprint {
    pub size: u64,
    pub modified: SystemTime,
}

impl Fingerprint {
    pub fn of(path: &Path) -> Result<Self> {
        let meta = fs::metadata(path).map_err(|e| MutationError::ReadError {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;
        let modified = meta.modified().map_err(|e| MutationError::ReadError {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;
        Ok(Fingerprint {
            size: meta.len(),
            modified,
        })
    }
}

/// One subject file: parsed tree, fingerprint, memoized location set.
pub struct Genome {
    path: PathBuf,
    tree: syn::File,
    fingerprint: Fingerprint,
    cached_locations: Option<BTreeSet<LocationIndex>>,
}

impl Genome {
    /// Parse the file at `path`. Fails with `NotFound` when the path does
    /// not exist.
    pub fn load(path: &Path) -> Result<Genome> {
        if !path.exists() {
            return Err(MutationError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let fingerprint = Fingerprint::of(path)?;
        let tree = parse_tree(path)?;
        Ok(Genome {
            path: path.to_path_buf(),
            tree,
            fingerprint,
            cached_locations: None,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn fingerprint(&self) -> Fingerprint {
        self.fingerprint
    }

    /// Reparse when the file changed on disk since the tree was built.
    fn refresh(&mut self) -> Result<()> {
        let current = Fingerprint::of(&self.path)?;
        if current != self.fingerprint {
            debug!(path = %self.path.display(), "source fingerprint changed, reparsing");
            self.tree = parse_tree(&self.path)?;
            self.fingerprint = current;
            self.cached_locations = None;
        }
        Ok(())
    }

    /// All mutable sites in the file, memoized per fingerprint.
    pub fn locations(&mut self) -> Result<&BTreeSet<LocationIndex>> {
        self.refresh()?;
        let tree = &mut self.tree;
        Ok(self
            .cached_locations
            .get_or_insert_with(|| discover_locations(tree)))
    }

    /// Apply a single mutation to a copy of the tree and serialize it.
    /// The genome's own tree is left untouched.
    pub fn mutate(&mut self, target: &LocationIndex, op: MutationOp) -> Result<Mutant> {
        self.refresh()?;
        let mut tree = self.tree.clone();
        apply_mutation(&mut tree, target, op)?;
        Ok(Mutant {
            source_file: self.path.clone(),
            target: *target,
            op,
            mutated_source: prettyplease::unparse(&tree),
            fingerprint: self.fingerprint,
        })
    }
}

fn parse_tree(path: &Path) -> Result<syn::File> {
    let source = fs::read_to_string(path).map_err(|e| MutationError::ReadError {
        path: path.to_path_buf(),
        error: e.to_string(),
    })?;
    syn::parse_file(&source).map_err(|e| MutationError::ParseError {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}

/// An immutable record of one mutation: which file, which site, which
/// replacement operator, and the concrete mutated source text. Refers back
/// to its genome by path and fingerprint rather than by reference.
#[derive(Debug, Clone)]
pub struct Mutant {
    pub source_file: PathBuf,
    pub target: LocationIndex,
    pub op: MutationOp,
    pub mutated_source: String,
    pub fingerprint: Fingerprint,
}

impl Mutant {
    pub fn description(&self) -> String {
        format!(
            "{} -> {} at {}:{}",
            self.target.op,
            self.op,
            self.source_file.display(),
            self.target.position()
        )
    }
}
