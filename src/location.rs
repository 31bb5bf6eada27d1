//! Stable identity for mutable sites
//!
//! A `LocationIndex` pins one mutable site by node kind, source span, and
//! the operator currently at that site. The current operator is part of the
//! identity, so the index doubles as "current state" and as the lookup key
//! when targeting a mutation.

use proc_macro2::Span;

use crate::catalog::{MutationOp, NodeKind};

/// Identity of one mutable site within a parsed file.
///
/// Lines are 1-based and columns 0-based, following proc-macro2's
/// `LineColumn`. End positions disambiguate nested sites that share a
/// start position, e.g. both operators of `b + 11 - 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LocationIndex {
    pub kind: NodeKind,
    pub line: usize,
    pub column: usize,
    pub end_line: usize,
    pub end_column: usize,
    pub op: MutationOp,
}

impl LocationIndex {
    /// Build an index from a node's span and its current operator.
    pub fn from_span(kind: NodeKind, span: Span, op: MutationOp) -> Self {
        let start = span.start();
        let end = span.end();
        LocationIndex {
            kind,
            line: start.line,
            column: start.column,
            end_line: end.line,
            end_column: end.column,
            op,
        }
    }

    /// `line:column` display form for reports.
    pub fn position(&self) -> String {
        format!("{}:{}", self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn identity_includes_operator_tag() {
        let a = LocationIndex {
            kind: NodeKind::BinOp,
            line: 3,
            column: 4,
            end_line: 3,
            end_column: 9,
            op: MutationOp::Add,
        };
        let b = LocationIndex { op: MutationOp::Sub, ..a };
        assert_ne!(a, b);
        assert_eq!(a, LocationIndex { ..a });
    }

    #[test]
    fn ordering_is_positional_within_a_kind() {
        let early = LocationIndex {
            kind: NodeKind::BinOp,
            line: 1,
            column: 0,
            end_line: 1,
            end_column: 5,
            op: MutationOp::Add,
        };
        let late = LocationIndex { line: 2, ..early };
        assert!(early < late);
    }
}
