//! Target selection
//!
//! Narrows the discovered location set by category include/exclude codes
//! and optional coverage data, then draws a seeded deterministic sample so
//! runs with equal seeds pick equal targets.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::seq::index;

use crate::catalog::validate_codes;
use crate::error::Result;
use crate::location::LocationIndex;

/// Covered (executed) line numbers per source file, 1-based. Supplied by
/// an external coverage reader; paths must match the genome's source path.
pub type CoverageMap = HashMap<PathBuf, BTreeSet<usize>>;

/// Category and coverage filters applied before sampling.
#[derive(Debug, Default, Clone)]
pub struct TargetFilter {
    /// Category codes to keep; empty means all categories.
    pub include: Vec<String>,
    /// Category codes to drop.
    pub exclude: Vec<String>,
    /// When present, locations on lines with no coverage are dropped. A
    /// file absent from the map has no covered lines.
    pub coverage: Option<CoverageMap>,
}

impl TargetFilter {
    /// Fail fast on category codes that name no catalog entry.
    pub fn validate(&self) -> Result<()> {
        validate_codes(&self.include)?;
        validate_codes(&self.exclude)
    }

    /// Filtered locations in scan (source) order.
    pub fn apply(
        &self,
        source_file: &Path,
        locations: &BTreeSet<LocationIndex>,
    ) -> Vec<LocationIndex> {
        locations
            .iter()
            .copied()
            .filter(|loc| self.allows_category(loc))
            .filter(|loc| self.is_covered(source_file, loc))
            .collect()
    }

    fn allows_category(&self, loc: &LocationIndex) -> bool {
        let code = loc.kind.code();
        if !self.include.is_empty() && !self.include.iter().any(|c| c == code) {
            return false;
        }
        !self.exclude.iter().any(|c| c == code)
    }

    fn is_covered(&self, source_file: &Path, loc: &LocationIndex) -> bool {
        match &self.coverage {
            Some(map) => map
                .get(source_file)
                .is_some_and(|lines| lines.contains(&loc.line)),
            None => true,
        }
    }
}

/// Draw up to `sample_size` targets with the run's seeded generator,
/// preserving source order. `None` keeps everything.
pub fn sample_targets(
    targets: Vec<LocationIndex>,
    sample_size: Option<usize>,
    rng: &mut StdRng,
) -> Vec<LocationIndex> {
    let Some(k) = sample_size else {
        return targets;
    };
    if k >= targets.len() {
        return targets;
    }
    let mut chosen: Vec<usize> = index::sample(rng, targets.len(), k).into_iter().collect();
    chosen.sort_unstable();
    chosen.into_iter().map(|i| targets[i]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{MutationOp, NodeKind};
    use pretty_assertions::assert_eq;
    use rand::SeedableRng;

    fn loc(kind: NodeKind, line: usize, op: MutationOp) -> LocationIndex {
        LocationIndex {
            kind,
            line,
            column: 0,
            end_line: line,
            end_column: 8,
            op,
        }
    }

    fn fixture() -> BTreeSet<LocationIndex> {
        [
            loc(NodeKind::BinOp, 1, MutationOp::Add),
            loc(NodeKind::Compare, 2, MutationOp::Eq),
            loc(NodeKind::If, 3, MutationOp::IfStatement),
            loc(NodeKind::BoolOp, 4, MutationOp::And),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn empty_include_means_all_categories() {
        let filter = TargetFilter::default();
        assert_eq!(filter.apply(Path::new("s.rs"), &fixture()).len(), 4);
    }

    #[test]
    fn include_and_exclude_narrow_by_code() {
        let filter = TargetFilter {
            include: vec!["bn".into(), "cp".into()],
            exclude: vec!["cp".into()],
            coverage: None,
        };
        let kept = filter.apply(Path::new("s.rs"), &fixture());
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].kind, NodeKind::BinOp);
    }

    #[test]
    fn unknown_codes_fail_validation() {
        let filter = TargetFilter {
            include: vec!["nope".into()],
            ..Default::default()
        };
        assert!(filter.validate().is_err());
    }

    #[test]
    fn coverage_drops_unexecuted_lines() {
        let mut map = CoverageMap::new();
        map.insert(PathBuf::from("s.rs"), [1, 3].into_iter().collect());
        let filter = TargetFilter {
            coverage: Some(map),
            ..Default::default()
        };
        let kept = filter.apply(Path::new("s.rs"), &fixture());
        let lines: Vec<usize> = kept.iter().map(|l| l.line).collect();
        assert_eq!(lines, vec![1, 3]);
    }

    #[test]
    fn file_absent_from_coverage_has_no_targets() {
        let filter = TargetFilter {
            coverage: Some(CoverageMap::new()),
            ..Default::default()
        };
        assert!(filter.apply(Path::new("s.rs"), &fixture()).is_empty());
    }

    #[test]
    fn sampling_is_deterministic_per_seed() {
        let targets: Vec<LocationIndex> =
            (1..=20).map(|i| loc(NodeKind::BinOp, i, MutationOp::Add)).collect();

        let mut rng_a = StdRng::seed_from_u64(42);
        let mut rng_b = StdRng::seed_from_u64(42);
        let a = sample_targets(targets.clone(), Some(5), &mut rng_a);
        let b = sample_targets(targets.clone(), Some(5), &mut rng_b);
        assert_eq!(a, b);
        assert_eq!(a.len(), 5);

        // source order is preserved within the sample
        let lines: Vec<usize> = a.iter().map(|l| l.line).collect();
        let mut sorted = lines.clone();
        sorted.sort_unstable();
        assert_eq!(lines, sorted);
    }

    #[test]
    fn oversized_sample_keeps_everything() {
        let targets: Vec<LocationIndex> =
            (1..=3).map(|i| loc(NodeKind::BinOp, i, MutationOp::Add)).collect();
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(sample_targets(targets.clone(), Some(10), &mut rng), targets);
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(sample_targets(targets.clone(), None, &mut rng), targets);
    }
}
