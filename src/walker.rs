//! Syntax indexer and mutation transformer
//!
//! One structural walker serves two modes: *read-only* discovery of every
//! mutable site, and *targeted* application of exactly one mutation. The
//! walker recurses into children before evaluating the current node, so
//! nested sites are discovered regardless of mutation order. Replacement
//! tokens reuse the original node's spans, keeping line/column reporting
//! accurate across a mutate-then-rescan cycle.
//!
//! Unsupported sub-forms (compound assignment operators outside the known
//! four, inclusive ranges, non-literal subscripts) are never errors: they
//! are logged at debug level and left unmodified, and no location is
//! recorded for them.

use std::collections::BTreeSet;

use proc_macro2::Span;
use quote::ToTokens;
use syn::spanned::Spanned;
use syn::visit_mut::{self, VisitMut};
use syn::{
    BinOp, Expr, ExprLit, ExprPath, ExprUnary, Ident, Lit, LitBool, LitInt, RangeLimits, Token,
    UnOp,
};
use tracing::debug;

use crate::catalog::{MutationOp, NodeKind};
use crate::error::{MutationError, Result};
use crate::location::LocationIndex;

/// AST walker for site discovery and single-mutation application.
///
/// In read-only mode no transformation is ever applied; the `locations`
/// set still fills with every site that could be transformed, which lets
/// the same type serve as inspector and mutator.
pub struct MutationWalker {
    target: Option<LocationIndex>,
    mutation: Option<MutationOp>,
    readonly: bool,
    applied: bool,
    pub locations: BTreeSet<LocationIndex>,
}

impl MutationWalker {
    /// Walker that only records locations.
    pub fn readonly() -> Self {
        MutationWalker {
            target: None,
            mutation: None,
            readonly: true,
            applied: false,
            locations: BTreeSet::new(),
        }
    }

    /// Walker that rewrites exactly the node matching `target`.
    pub fn targeted(target: LocationIndex, mutation: MutationOp) -> Self {
        MutationWalker {
            target: Some(target),
            mutation: Some(mutation),
            readonly: false,
            applied: false,
            locations: BTreeSet::new(),
        }
    }

    /// Whether a mutation was applied during the walk.
    pub fn applied(&self) -> bool {
        self.applied
    }

    /// The mutation to apply at `idx`, when this walker is targeted at it
    /// and has not applied anything yet.
    fn pending_mutation(&self, idx: &LocationIndex) -> Option<MutationOp> {
        if self.readonly || self.applied || self.target.as_ref() != Some(idx) {
            return Option::None;
        }
        self.mutation
    }

    fn handle_binary(&mut self, binary: &mut syn::ExprBinary) {
        let Some((kind, current)) = classify_bin_op(&binary.op) else {
            debug!(
                op = %binary.op.to_token_stream(),
                "unsupported compound assignment, node left unmodified"
            );
            return;
        };

        let idx = LocationIndex::from_span(kind, binary.span(), current);
        self.locations.insert(idx);

        if let Some(mutation) = self.pending_mutation(&idx) {
            if let Some(new_op) = bin_op_with_span(mutation, binary.op.span()) {
                debug!(target = ?idx, %mutation, "mutating binary operator");
                binary.op = new_op;
                self.applied = true;
            }
        }
    }

    fn handle_if(&mut self, expr_if: &mut syn::ExprIf) {
        let current = match &*expr_if.cond {
            Expr::Lit(ExprLit { lit: Lit::Bool(b), .. }) => {
                if b.value {
                    MutationOp::IfTrue
                } else {
                    MutationOp::IfFalse
                }
            }
            _ => MutationOp::IfStatement,
        };

        let idx = LocationIndex::from_span(NodeKind::If, expr_if.span(), current);
        self.locations.insert(idx);

        if let Some(mutation) = self.pending_mutation(&idx) {
            if matches!(mutation, MutationOp::IfTrue | MutationOp::IfFalse) {
                debug!(target = ?idx, %mutation, "mutating if-statement test");
                let span = expr_if.cond.span();
                expr_if.cond = Box::new(Expr::Lit(ExprLit {
                    attrs: Vec::new(),
                    lit: Lit::Bool(LitBool::new(mutation == MutationOp::IfTrue, span)),
                }));
                self.applied = true;
            }
        }
    }

    /// Literal integer subscripts (`x[0]`, `x[1]`, `x[-1]`) and half-open
    /// range subscripts (`x[..n]`, `x[n..]`). All other subscripts are not
    /// mutation sites.
    fn handle_index(&mut self, index_expr: &mut syn::ExprIndex) {
        let outer_span = index_expr.span();

        match &mut *index_expr.index {
            Expr::Lit(ExprLit { lit: Lit::Int(int), .. }) => {
                let span = int.span();
                let current = match int.base10_parse::<u128>() {
                    Ok(0) => MutationOp::IndexZero,
                    Ok(_) => MutationOp::IndexPos,
                    Err(_) => {
                        debug!(lit = %int, "unparseable index literal, node left unmodified");
                        return;
                    }
                };
                let idx = LocationIndex::from_span(NodeKind::Index, span, current);
                self.locations.insert(idx);

                if let Some(mutation) = self.pending_mutation(&idx) {
                    if let Some(replacement) = index_literal(mutation, span) {
                        debug!(target = ?idx, %mutation, "mutating index literal");
                        *index_expr.index = replacement;
                        self.applied = true;
                    }
                }
            }
            Expr::Unary(ExprUnary { op: UnOp::Neg(_), expr: operand, .. })
                if matches!(&**operand, Expr::Lit(ExprLit { lit: Lit::Int(_), .. })) =>
            {
                let span = index_expr.index.span();
                let idx = LocationIndex::from_span(NodeKind::Index, span, MutationOp::IndexNeg);
                self.locations.insert(idx);

                if let Some(mutation) = self.pending_mutation(&idx) {
                    if let Some(replacement) = index_literal(mutation, span) {
                        debug!(target = ?idx, %mutation, "mutating index literal");
                        *index_expr.index = replacement;
                        self.applied = true;
                    }
                }
            }
            Expr::Range(range) => {
                if matches!(range.limits, RangeLimits::Closed(_)) {
                    debug!("inclusive range subscript, node left unmodified");
                    return;
                }
                // only half-unbounded slices are targets; x[a..b] and x[..]
                // are left alone and the step-free swap keeps the existing
                // bound value
                let current = match (&range.start, &range.end) {
                    (None, Some(_)) => MutationOp::SliceUnboundLower,
                    (Some(_), None) => MutationOp::SliceUnboundUpper,
                    _ => return,
                };
                let idx = LocationIndex::from_span(NodeKind::SliceSwap, outer_span, current);
                self.locations.insert(idx);

                if let Some(mutation) = self.pending_mutation(&idx) {
                    match mutation {
                        MutationOp::SliceUnboundUpper if current == MutationOp::SliceUnboundLower => {
                            debug!(target = ?idx, %mutation, "swapping slice bound");
                            range.start = range.end.take();
                            self.applied = true;
                        }
                        MutationOp::SliceUnboundLower if current == MutationOp::SliceUnboundUpper => {
                            debug!(target = ?idx, %mutation, "swapping slice bound");
                            range.end = range.start.take();
                            self.applied = true;
                        }
                        _ => {}
                    }
                }
            }
            _ => {}
        }
    }
}

impl VisitMut for MutationWalker {
    fn visit_expr_mut(&mut self, expr: &mut Expr) {
        // deepest-first: index every child before the current node
        visit_mut::visit_expr_mut(self, expr);

        match expr {
            Expr::Binary(binary) => self.handle_binary(binary),
            Expr::If(expr_if) => self.handle_if(expr_if),
            Expr::Index(index_expr) => self.handle_index(index_expr),
            Expr::Lit(ExprLit { lit: Lit::Bool(b), .. }) => {
                let span = b.span();
                let current = if b.value { MutationOp::True } else { MutationOp::False };
                let idx = LocationIndex::from_span(NodeKind::Singleton, span, current);
                self.locations.insert(idx);

                if let Some(mutation) = self.pending_mutation(&idx) {
                    if let Some(replacement) = singleton_expr(mutation, span) {
                        debug!(target = ?idx, %mutation, "mutating singleton constant");
                        *expr = replacement;
                        self.applied = true;
                    }
                }
            }
            Expr::Path(ExprPath { qself: Option::None, path, .. }) if path.is_ident("None") => {
                let span = path.span();
                let idx = LocationIndex::from_span(NodeKind::Singleton, span, MutationOp::None);
                self.locations.insert(idx);

                if let Some(mutation) = self.pending_mutation(&idx) {
                    if let Some(replacement) = singleton_expr(mutation, span) {
                        debug!(target = ?idx, %mutation, "mutating singleton constant");
                        *expr = replacement;
                        self.applied = true;
                    }
                }
            }
            _ => {}
        }
    }
}

/// Run the walker in read-only mode and return the discovered sites.
pub fn discover_locations(file: &mut syn::File) -> BTreeSet<LocationIndex> {
    let mut walker = MutationWalker::readonly();
    walker.visit_file_mut(file);
    walker.locations
}

/// Rewrite exactly the node identified by `target`, leaving every other
/// node structurally and positionally identical.
pub fn apply_mutation(
    file: &mut syn::File,
    target: &LocationIndex,
    mutation: MutationOp,
) -> Result<()> {
    let mut walker = MutationWalker::targeted(*target, mutation);
    walker.visit_file_mut(file);
    if walker.applied() {
        Ok(())
    } else {
        Err(MutationError::TargetNotFound { target: *target })
    }
}

/// Bucket a syn binary operator into its node kind and operator tag.
///
/// Compound-assignment operators outside add/sub/mul/div are unsupported
/// and yield `None`.
fn classify_bin_op(op: &BinOp) -> Option<(NodeKind, MutationOp)> {
    let pair = match op {
        BinOp::Add(_) => (NodeKind::BinOp, MutationOp::Add),
        BinOp::Sub(_) => (NodeKind::BinOp, MutationOp::Sub),
        BinOp::Mul(_) => (NodeKind::BinOp, MutationOp::Mul),
        BinOp::Div(_) => (NodeKind::BinOp, MutationOp::Div),
        BinOp::Rem(_) => (NodeKind::BinOp, MutationOp::Rem),
        BinOp::BitAnd(_) => (NodeKind::BinOpBitCmp, MutationOp::BitAnd),
        BinOp::BitOr(_) => (NodeKind::BinOpBitCmp, MutationOp::BitOr),
        BinOp::BitXor(_) => (NodeKind::BinOpBitCmp, MutationOp::BitXor),
        BinOp::Shl(_) => (NodeKind::BinOpBitShift, MutationOp::Shl),
        BinOp::Shr(_) => (NodeKind::BinOpBitShift, MutationOp::Shr),
        BinOp::And(_) => (NodeKind::BoolOp, MutationOp::And),
        BinOp::Or(_) => (NodeKind::BoolOp, MutationOp::Or),
        BinOp::Eq(_) => (NodeKind::Compare, MutationOp::Eq),
        BinOp::Ne(_) => (NodeKind::Compare, MutationOp::Ne),
        BinOp::Lt(_) => (NodeKind::Compare, MutationOp::Lt),
        BinOp::Le(_) => (NodeKind::Compare, MutationOp::Le),
        BinOp::Gt(_) => (NodeKind::Compare, MutationOp::Gt),
        BinOp::Ge(_) => (NodeKind::Compare, MutationOp::Ge),
        BinOp::AddAssign(_) => (NodeKind::AugAssign, MutationOp::AddAssign),
        BinOp::SubAssign(_) => (NodeKind::AugAssign, MutationOp::SubAssign),
        BinOp::MulAssign(_) => (NodeKind::AugAssign, MutationOp::MulAssign),
        BinOp::DivAssign(_) => (NodeKind::AugAssign, MutationOp::DivAssign),
        _ => return None,
    };
    Some(pair)
}

/// Construct the replacement operator token carrying the original span.
fn bin_op_with_span(op: MutationOp, span: Span) -> Option<BinOp> {
    let new_op = match op {
        MutationOp::Add => BinOp::Add(Token![+](span)),
        MutationOp::Sub => BinOp::Sub(Token![-](span)),
        MutationOp::Mul => BinOp::Mul(Token![*](span)),
        MutationOp::Div => BinOp::Div(Token![/](span)),
        MutationOp::Rem => BinOp::Rem(Token![%](span)),
        MutationOp::BitAnd => BinOp::BitAnd(Token![&](span)),
        MutationOp::BitOr => BinOp::BitOr(Token![|](span)),
        MutationOp::BitXor => BinOp::BitXor(Token![^](span)),
        MutationOp::Shl => BinOp::Shl(Token![<<](span)),
        MutationOp::Shr => BinOp::Shr(Token![>>](span)),
        MutationOp::And => BinOp::And(Token![&&](span)),
        MutationOp::Or => BinOp::Or(Token![||](span)),
        MutationOp::Eq => BinOp::Eq(Token![==](span)),
        MutationOp::Ne => BinOp::Ne(Token![!=](span)),
        MutationOp::Lt => BinOp::Lt(Token![<](span)),
        MutationOp::Le => BinOp::Le(Token![<=](span)),
        MutationOp::Gt => BinOp::Gt(Token![>](span)),
        MutationOp::Ge => BinOp::Ge(Token![>=](span)),
        MutationOp::AddAssign => BinOp::AddAssign(Token![+=](span)),
        MutationOp::SubAssign => BinOp::SubAssign(Token![-=](span)),
        MutationOp::MulAssign => BinOp::MulAssign(Token![*=](span)),
        MutationOp::DivAssign => BinOp::DivAssign(Token![/=](span)),
        _ => return None,
    };
    Some(new_op)
}

/// Canonical replacement for an index-sign bucket: `0`, `1`, or `-1`.
fn index_literal(op: MutationOp, span: Span) -> Option<Expr> {
    let int_lit = |digits: &str| {
        Expr::Lit(ExprLit {
            attrs: Vec::new(),
            lit: Lit::Int(LitInt::new(digits, span)),
        })
    };
    match op {
        MutationOp::IndexZero => Some(int_lit("0")),
        MutationOp::IndexPos => Some(int_lit("1")),
        MutationOp::IndexNeg => Some(Expr::Unary(ExprUnary {
            attrs: Vec::new(),
            op: UnOp::Neg(Token![-](span)),
            expr: Box::new(int_lit("1")),
        })),
        _ => Option::None,
    }
}

/// Replacement expression for a singleton constant mutation.
fn singleton_expr(op: MutationOp, span: Span) -> Option<Expr> {
    match op {
        MutationOp::True | MutationOp::False => Some(Expr::Lit(ExprLit {
            attrs: Vec::new(),
            lit: Lit::Bool(LitBool::new(op == MutationOp::True, span)),
        })),
        MutationOp::None => Some(Expr::Path(ExprPath {
            attrs: Vec::new(),
            qself: Option::None,
            path: syn::Path::from(Ident::new("None", span)),
        })),
        _ => Option::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::operators_for;
    use pretty_assertions::assert_eq;

    fn parse(src: &str) -> syn::File {
        syn::parse_file(src).unwrap()
    }

    fn scan(src: &str) -> BTreeSet<LocationIndex> {
        discover_locations(&mut parse(src))
    }

    fn ops_of_kind(locs: &BTreeSet<LocationIndex>, kind: NodeKind) -> Vec<MutationOp> {
        locs.iter().filter(|l| l.kind == kind).map(|l| l.op).collect()
    }

    #[test]
    fn readonly_scan_is_side_effect_free() {
        let mut file = parse("fn f(a: i32, b: i32) -> i32 { if a > b { a + b } else { a - b } }");
        let before = prettyplease::unparse(&file);
        discover_locations(&mut file);
        let after = prettyplease::unparse(&file);
        assert_eq!(before, after);
    }

    #[test]
    fn nested_binops_share_a_start_but_not_an_end() {
        // both operators of `b + 11 - 1` start at `b`
        let locs = scan("fn f(b: i32) -> i32 { b + 11 - 1 }");
        let binops: Vec<_> = locs.iter().filter(|l| l.kind == NodeKind::BinOp).collect();
        assert_eq!(binops.len(), 2);
        assert_eq!(binops[0].line, binops[1].line);
        assert_eq!(binops[0].column, binops[1].column);
        assert_ne!(binops[0].end_column, binops[1].end_column);
    }

    #[test]
    fn mutating_one_binop_leaves_the_other_untouched() {
        let mut file = parse("fn f(b: i32) -> i32 { b + 11 - 1 }");
        let locs = discover_locations(&mut file);
        let add = *locs
            .iter()
            .find(|l| l.kind == NodeKind::BinOp && l.op == MutationOp::Add)
            .unwrap();
        let sub = *locs
            .iter()
            .find(|l| l.kind == NodeKind::BinOp && l.op == MutationOp::Sub)
            .unwrap();

        apply_mutation(&mut file, &add, MutationOp::Mul).unwrap();

        let rescanned = discover_locations(&mut file);
        assert_eq!(rescanned.len(), locs.len());
        assert!(rescanned.contains(&LocationIndex { op: MutationOp::Mul, ..add }));
        assert!(rescanned.contains(&sub));
        assert!(!rescanned.contains(&add));
        assert!(prettyplease::unparse(&file).contains("b * 11 - 1"));
    }

    #[test]
    fn if_statement_is_indexed_and_mutated_to_literal_true() {
        let mut file = parse("fn f(a: i32, b: i32) {\n    if a == b {}\n}");
        let locs = discover_locations(&mut file);
        let if_site = *locs
            .iter()
            .find(|l| l.kind == NodeKind::If && l.op == MutationOp::IfStatement)
            .unwrap();
        assert!(locs
            .iter()
            .any(|l| l.kind == NodeKind::Compare && l.op == MutationOp::Eq));

        apply_mutation(&mut file, &if_site, MutationOp::IfTrue).unwrap();

        let rescanned = discover_locations(&mut file);
        let mutated = LocationIndex { op: MutationOp::IfTrue, ..if_site };
        assert!(rescanned.contains(&mutated));
        assert!(!rescanned.contains(&if_site));

        // a literal-true test offers only the false form: neither itself
        // nor the general statement default are valid replacements
        let candidates = operators_for(&mutated);
        let expected: BTreeSet<_> = [MutationOp::IfFalse].into_iter().collect();
        assert_eq!(candidates, expected);
        assert!(prettyplease::unparse(&file).contains("if true"));
    }

    #[test]
    fn boolean_operator_swap() {
        let mut file = parse("fn f(a: bool, b: bool) -> bool { a && b }");
        let locs = discover_locations(&mut file);
        let and = *locs
            .iter()
            .find(|l| l.kind == NodeKind::BoolOp && l.op == MutationOp::And)
            .unwrap();
        apply_mutation(&mut file, &and, MutationOp::Or).unwrap();
        assert!(prettyplease::unparse(&file).contains("a || b"));
    }

    #[test]
    fn unknown_compound_assignment_is_skipped() {
        let locs = scan("fn f(mut x: i32) { x += 1; x %= 2; }");
        assert_eq!(ops_of_kind(&locs, NodeKind::AugAssign), vec![MutationOp::AddAssign]);
    }

    #[test]
    fn aug_assign_swap() {
        let mut file = parse("fn f(mut x: i32) { x += 2; }");
        let locs = discover_locations(&mut file);
        let add = *locs
            .iter()
            .find(|l| l.kind == NodeKind::AugAssign && l.op == MutationOp::AddAssign)
            .unwrap();
        apply_mutation(&mut file, &add, MutationOp::DivAssign).unwrap();
        assert!(prettyplease::unparse(&file).contains("x /= 2"));
    }

    #[test]
    fn binary_operators_split_into_three_buckets() {
        let locs = scan("fn f(a: u32, b: u32) -> u32 { (a + b) ^ (a << b) }");
        assert_eq!(ops_of_kind(&locs, NodeKind::BinOp), vec![MutationOp::Add]);
        assert_eq!(ops_of_kind(&locs, NodeKind::BinOpBitCmp), vec![MutationOp::BitXor]);
        assert_eq!(ops_of_kind(&locs, NodeKind::BinOpBitShift), vec![MutationOp::Shl]);
    }

    #[test]
    fn index_literals_bucket_by_sign() {
        let locs = scan("fn f(v: &[i32]) -> i32 { v[0] + v[5] }");
        let mut ix = ops_of_kind(&locs, NodeKind::Index);
        ix.sort();
        assert_eq!(ix, vec![MutationOp::IndexZero, MutationOp::IndexPos]);
    }

    #[test]
    fn index_mutation_uses_canonical_representative() {
        let mut file = parse("fn f(v: &[i32]) -> i32 { v[5] }");
        let locs = discover_locations(&mut file);
        let pos = *locs
            .iter()
            .find(|l| l.kind == NodeKind::Index && l.op == MutationOp::IndexPos)
            .unwrap();
        apply_mutation(&mut file, &pos, MutationOp::IndexNeg).unwrap();
        let source = prettyplease::unparse(&file);
        assert!(source.contains("v[-1]"), "got: {source}");
    }

    #[test]
    fn singletons_cover_bools_and_bare_none() {
        let locs = scan(
            "fn f(x: bool) -> Option<i32> { let _s = \"abc\"; let _n = 42; if x { return None; } Some(3) }",
        );
        let mut nc = ops_of_kind(&locs, NodeKind::Singleton);
        nc.sort();
        // string and numeric literals are never singleton sites
        assert_eq!(nc, vec![MutationOp::None]);
    }

    #[test]
    fn singleton_true_can_become_none() {
        let mut file = parse("fn f() -> bool { true }");
        let locs = discover_locations(&mut file);
        let site = *locs
            .iter()
            .find(|l| l.kind == NodeKind::Singleton && l.op == MutationOp::True)
            .unwrap();
        apply_mutation(&mut file, &site, MutationOp::None).unwrap();
        assert!(prettyplease::unparse(&file).contains("None"));
    }

    #[test]
    fn only_half_unbounded_slices_are_sites() {
        let locs = scan("fn f(v: &[i32]) { let _ = &v[..2]; let _ = &v[1..3]; let _ = &v[..]; let _ = &v[..=2]; }");
        assert_eq!(
            ops_of_kind(&locs, NodeKind::SliceSwap),
            vec![MutationOp::SliceUnboundLower]
        );
    }

    #[test]
    fn slice_bound_swap_keeps_the_bound_value() {
        let mut file = parse("fn f(v: &[i32]) -> &[i32] { &v[..2] }");
        let locs = discover_locations(&mut file);
        let site = *locs
            .iter()
            .find(|l| l.kind == NodeKind::SliceSwap && l.op == MutationOp::SliceUnboundLower)
            .unwrap();
        apply_mutation(&mut file, &site, MutationOp::SliceUnboundUpper).unwrap();
        assert!(prettyplease::unparse(&file).contains("v[2..]"));

        let mut file = parse("fn f(v: &[i32]) -> &[i32] { &v[1..] }");
        let locs = discover_locations(&mut file);
        let site = *locs
            .iter()
            .find(|l| l.kind == NodeKind::SliceSwap && l.op == MutationOp::SliceUnboundUpper)
            .unwrap();
        apply_mutation(&mut file, &site, MutationOp::SliceUnboundLower).unwrap();
        assert!(prettyplease::unparse(&file).contains("v[..1]"));
    }

    #[test]
    fn missing_target_is_an_error() {
        let mut file = parse("fn f() {}");
        let bogus = LocationIndex {
            kind: NodeKind::BinOp,
            line: 99,
            column: 0,
            end_line: 99,
            end_column: 4,
            op: MutationOp::Add,
        };
        let result = apply_mutation(&mut file, &bogus, MutationOp::Sub);
        assert!(matches!(result, Err(MutationError::TargetNotFound { .. })));
    }

    #[test]
    fn discovery_is_idempotent() {
        let src = "fn f(a: i32, b: i32) -> i32 { if a < b { a + b } else { b - a } }";
        assert_eq!(scan(src), scan(src));
    }
}
