//! Static catalog of mutation categories
//!
//! Every supported mutation operator belongs to exactly one category of
//! mutually substitutable operators. The catalog is fixed at compile time;
//! `operators_for` derives the candidate replacements for a discovered
//! location from it.

use std::collections::BTreeSet;
use std::fmt;

use crate::error::{MutationError, Result};
use crate::location::LocationIndex;

/// Syntax-tree node kinds that can host a mutation.
///
/// Binary operators are split into arithmetic, bitwise-comparison, and
/// bitwise-shift kinds because only operators within the same bucket are
/// sensible substitutes for each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NodeKind {
    AugAssign,
    BinOp,
    BinOpBitCmp,
    BinOpBitShift,
    BoolOp,
    Compare,
    If,
    Index,
    Singleton,
    SliceSwap,
}

impl NodeKind {
    /// Short category code used for include/exclude filtering.
    pub fn code(&self) -> &'static str {
        match self {
            NodeKind::AugAssign => "aa",
            NodeKind::BinOp => "bn",
            NodeKind::BinOpBitCmp => "bc",
            NodeKind::BinOpBitShift => "bs",
            NodeKind::BoolOp => "bl",
            NodeKind::Compare => "cp",
            NodeKind::If => "if",
            NodeKind::Index => "ix",
            NodeKind::Singleton => "nc",
            NodeKind::SliceSwap => "su",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// One mutation operator tag.
///
/// Concrete operators carry their surface syntax; compound constructs
/// (augmented assignment, if-test shapes, index sign buckets, slice bound
/// forms) use synthetic tags, since their replacement is a structural
/// rewrite rather than a token swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MutationOp {
    // binary arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    // bitwise comparison
    BitAnd,
    BitOr,
    BitXor,
    // bitwise shift
    Shl,
    Shr,
    // boolean connectives
    And,
    Or,
    // comparisons
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    // augmented assignment
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    // if-statement test shapes; `IfStatement` is the un-mutated general
    // form and is never offered as a replacement
    IfTrue,
    IfFalse,
    IfStatement,
    // literal index sign buckets, replaced by 0 / 1 / -1
    IndexZero,
    IndexPos,
    IndexNeg,
    // named singleton constants
    True,
    False,
    None,
    // slice bound forms: the tag names which bound is missing
    SliceUnboundLower,
    SliceUnboundUpper,
}

impl MutationOp {
    /// Human-readable surface form for reports and logs.
    pub fn symbol(&self) -> &'static str {
        match self {
            MutationOp::Add => "+",
            MutationOp::Sub => "-",
            MutationOp::Mul => "*",
            MutationOp::Div => "/",
            MutationOp::Rem => "%",
            MutationOp::BitAnd => "&",
            MutationOp::BitOr => "|",
            MutationOp::BitXor => "^",
            MutationOp::Shl => "<<",
            MutationOp::Shr => ">>",
            MutationOp::And => "&&",
            MutationOp::Or => "||",
            MutationOp::Eq => "==",
            MutationOp::Ne => "!=",
            MutationOp::Lt => "<",
            MutationOp::Le => "<=",
            MutationOp::Gt => ">",
            MutationOp::Ge => ">=",
            MutationOp::AddAssign => "+=",
            MutationOp::SubAssign => "-=",
            MutationOp::MulAssign => "*=",
            MutationOp::DivAssign => "/=",
            MutationOp::IfTrue => "if true",
            MutationOp::IfFalse => "if false",
            MutationOp::IfStatement => "if <expr>",
            MutationOp::IndexZero => "[0]",
            MutationOp::IndexPos => "[1]",
            MutationOp::IndexNeg => "[-1]",
            MutationOp::True => "true",
            MutationOp::False => "false",
            MutationOp::None => "None",
            MutationOp::SliceUnboundLower => "[..n]",
            MutationOp::SliceUnboundUpper => "[n..]",
        }
    }
}

impl fmt::Display for MutationOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A closed group of mutually substitutable operators
#[derive(Debug, Clone, Copy)]
pub struct OperatorCategory {
    pub name: &'static str,
    pub desc: &'static str,
    pub code: &'static str,
    pub operators: &'static [MutationOp],
}

static CATALOG: [OperatorCategory; 10] = [
    OperatorCategory {
        name: "AugAssign",
        desc: "Augmented assignment, e.g. += -= *= /=",
        code: "aa",
        operators: &[
            MutationOp::AddAssign,
            MutationOp::SubAssign,
            MutationOp::MulAssign,
            MutationOp::DivAssign,
        ],
    },
    OperatorCategory {
        name: "BinOp",
        desc: "Binary arithmetic, e.g. + - * / %",
        code: "bn",
        operators: &[
            MutationOp::Add,
            MutationOp::Sub,
            MutationOp::Mul,
            MutationOp::Div,
            MutationOp::Rem,
        ],
    },
    OperatorCategory {
        name: "BinOp Bit Comparison",
        desc: "Bitwise comparison, e.g. x & y, x | y, x ^ y",
        code: "bc",
        operators: &[MutationOp::BitAnd, MutationOp::BitOr, MutationOp::BitXor],
    },
    OperatorCategory {
        name: "BinOp Bit Shifts",
        desc: "Bitwise shifts, e.g. << >>",
        code: "bs",
        operators: &[MutationOp::Shl, MutationOp::Shr],
    },
    OperatorCategory {
        name: "BoolOp",
        desc: "Boolean connectives, e.g. && ||",
        code: "bl",
        operators: &[MutationOp::And, MutationOp::Or],
    },
    OperatorCategory {
        name: "Compare",
        desc: "Comparison operators, e.g. == != < <= > >=",
        code: "cp",
        operators: &[
            MutationOp::Eq,
            MutationOp::Ne,
            MutationOp::Lt,
            MutationOp::Le,
            MutationOp::Gt,
            MutationOp::Ge,
        ],
    },
    OperatorCategory {
        name: "If",
        desc: "If-statement tests: original expression, true, false",
        code: "if",
        operators: &[MutationOp::IfTrue, MutationOp::IfFalse, MutationOp::IfStatement],
    },
    OperatorCategory {
        name: "Index",
        desc: "Literal index values, e.g. x[-1], x[0], x[1]",
        code: "ix",
        operators: &[MutationOp::IndexZero, MutationOp::IndexPos, MutationOp::IndexNeg],
    },
    OperatorCategory {
        name: "Singleton",
        desc: "Named singleton constants: true, false, None",
        code: "nc",
        operators: &[MutationOp::True, MutationOp::False, MutationOp::None],
    },
    OperatorCategory {
        name: "Slice Unbounded Swap",
        desc: "Swap which slice bound is unbound, x[n..] to x[..n] and back",
        code: "su",
        operators: &[MutationOp::SliceUnboundLower, MutationOp::SliceUnboundUpper],
    },
];

/// All compatible operator sets, in fixed catalog order.
pub fn compatible_operator_sets() -> &'static [OperatorCategory] {
    &CATALOG
}

/// Candidate replacement operators for a discovered location.
///
/// Scans the catalog in order and returns the first category containing
/// the location's current operator, minus the current operator itself and
/// minus the synthetic `IfStatement` default, which describes an
/// un-mutated shape rather than a valid replacement. Empty when the
/// operator belongs to no category.
pub fn operators_for(target: &LocationIndex) -> BTreeSet<MutationOp> {
    for category in &CATALOG {
        if category.operators.contains(&target.op) {
            let mut ops: BTreeSet<MutationOp> = category.operators.iter().copied().collect();
            ops.remove(&target.op);
            ops.remove(&MutationOp::IfStatement);
            return ops;
        }
    }
    BTreeSet::new()
}

/// Category code for an operator, used in per-category reporting.
pub fn category_for_op(op: MutationOp) -> &'static str {
    for category in &CATALOG {
        if category.operators.contains(&op) {
            return category.code;
        }
    }
    // every MutationOp variant appears in the catalog
    unreachable!("operator missing from catalog: {op:?}")
}

/// Reject category codes that do not name a catalog entry.
pub fn validate_codes(codes: &[String]) -> Result<()> {
    for code in codes {
        if !CATALOG.iter().any(|c| c.code == code) {
            return Err(MutationError::ConfigError {
                message: format!(
                    "unknown category code '{}', valid codes: {}",
                    code,
                    CATALOG.iter().map(|c| c.code).collect::<Vec<_>>().join(", ")
                ),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::LocationIndex;
    use pretty_assertions::assert_eq;

    fn loc(kind: NodeKind, op: MutationOp) -> LocationIndex {
        LocationIndex {
            kind,
            line: 1,
            column: 0,
            end_line: 1,
            end_column: 5,
            op,
        }
    }

    #[test]
    fn categories_partition_the_operator_space() {
        let mut seen = BTreeSet::new();
        for category in compatible_operator_sets() {
            for op in category.operators {
                assert!(seen.insert(*op), "{op:?} appears in more than one category");
            }
        }
    }

    #[test]
    fn category_codes_are_unique() {
        let codes: BTreeSet<_> = compatible_operator_sets().iter().map(|c| c.code).collect();
        assert_eq!(codes.len(), compatible_operator_sets().len());
    }

    #[test]
    fn operators_for_never_returns_current_operator() {
        for category in compatible_operator_sets() {
            for op in category.operators {
                let ops = operators_for(&loc(NodeKind::BinOp, *op));
                assert!(!ops.contains(op), "{op:?} offered as its own mutation");
                assert!(!ops.contains(&MutationOp::IfStatement));
            }
        }
    }

    #[test]
    fn operators_for_binop_add() {
        let ops = operators_for(&loc(NodeKind::BinOp, MutationOp::Add));
        let expected: BTreeSet<_> = [
            MutationOp::Sub,
            MutationOp::Mul,
            MutationOp::Div,
            MutationOp::Rem,
        ]
        .into_iter()
        .collect();
        assert_eq!(ops, expected);
    }

    #[test]
    fn if_statement_is_a_source_but_never_a_target() {
        let from_statement = operators_for(&loc(NodeKind::If, MutationOp::IfStatement));
        let expected: BTreeSet<_> = [MutationOp::IfTrue, MutationOp::IfFalse].into_iter().collect();
        assert_eq!(from_statement, expected);

        let from_true = operators_for(&loc(NodeKind::If, MutationOp::IfTrue));
        let expected: BTreeSet<_> = [MutationOp::IfFalse].into_iter().collect();
        assert_eq!(from_true, expected);
    }

    #[test]
    fn slice_swap_offers_exactly_the_other_bound() {
        let ops = operators_for(&loc(NodeKind::SliceSwap, MutationOp::SliceUnboundLower));
        let expected: BTreeSet<_> = [MutationOp::SliceUnboundUpper].into_iter().collect();
        assert_eq!(ops, expected);
    }

    #[test]
    fn validate_codes_rejects_unknown() {
        assert!(validate_codes(&["bn".to_string(), "cp".to_string()]).is_ok());
        assert!(validate_codes(&["zz".to_string()]).is_err());
    }
}
