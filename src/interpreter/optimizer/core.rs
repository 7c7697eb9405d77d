use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use log::trace;

use crate::{
    ast::{Node, NodeRef},
    interpreter::{
        optimizer::{identity::simplify, stats::OptimizeStats},
        value::core::Numeric,
    },
};

/// Rewrites `node` bottom-up until a pass changes nothing.
///
/// Each pass folds constants, applies algebraic identities, folds pure calls,
/// constructors, read-only members, conversions and conditionals, and makes
/// deep-equal subtrees share one node. A rewrite that fails, such as folding
/// `1/0`, leaves its node untouched so the error surfaces at evaluation.
///
/// # Returns
/// The optimized root and what the passes did. The counts are also added to
/// the process-wide totals, see [`super::cumulative`].
///
/// # Example
/// ```
/// use exprc::{Evaluator, TypeFlags, interpreter::optimizer::optimize};
///
/// let evaluator = Evaluator::<i64>::new(TypeFlags::NUMERIC).unwrap();
/// let raw = evaluator.compile_with("2*3+4", &[], false).unwrap();
/// let (optimized, stats) = optimize(raw.node());
/// assert_eq!(optimized.as_constant(), Some(&10));
/// assert_eq!(stats.removed, 4);
/// ```
#[must_use]
pub fn optimize<T: Numeric>(node: &NodeRef<T>) -> (NodeRef<T>, OptimizeStats) {
    let mut stats = OptimizeStats::default();
    let mut current = node.clone();
    loop {
        let mut pass = Pass::default();
        let next = pass.visit(&current);
        stats.passes += 1;
        stats.removed += pass.removed;
        stats.merged += pass.merged;
        trace!("optimizer pass {}: {} rewrite(s), {} removed, {} merged",
               stats.passes,
               pass.rewrites,
               pass.removed,
               pass.merged);
        current = next;
        if pass.rewrites == 0 {
            break;
        }
    }
    stats.publish();
    (current, stats)
}

/// State of one bottom-up pass.
struct Pass<T> {
    /// Nodes produced so far, for structural sharing.
    seen:     HashSet<NodeRef<T>>,
    /// Results for nodes already visited, keyed by the original node.
    visited:  HashMap<*const Node<T>, NodeRef<T>>,
    rewrites: usize,
    removed:  usize,
    merged:   usize,
}

impl<T> Default for Pass<T> {
    fn default() -> Self {
        Self { seen:     HashSet::new(),
               visited:  HashMap::new(),
               rewrites: 0,
               removed:  0,
               merged:   0, }
    }
}

impl<T: Numeric> Pass<T> {
    fn visit(&mut self, node: &NodeRef<T>) -> NodeRef<T> {
        if let Some(done) = self.visited.get(&Arc::as_ptr(node)) {
            return done.clone();
        }
        let rebuilt = self.visit_children(node);
        let result = match rewrite(&rebuilt) {
            Some(replacement) => {
                self.rewrites += 1;
                self.removed += rebuilt.count().saturating_sub(replacement.count());
                replacement
            },
            None => rebuilt,
        };
        let shared = self.share(result);
        self.visited.insert(Arc::as_ptr(node), shared.clone());
        shared
    }

    /// Returns an equal node produced earlier in this pass, or records
    /// `node` as the one to share.
    fn share(&mut self, node: NodeRef<T>) -> NodeRef<T> {
        if let Some(existing) = self.seen.get(&node) {
            if !Arc::ptr_eq(existing, &node) {
                self.merged += 1;
            }
            return existing.clone();
        }
        self.seen.insert(node.clone());
        node
    }

    fn visit_all(&mut self, nodes: &[NodeRef<T>]) -> (Vec<NodeRef<T>>, bool) {
        let visited: Vec<NodeRef<T>> = nodes.iter().map(|n| self.visit(n)).collect();
        let changed = visited.iter().zip(nodes).any(|(a, b)| !Arc::ptr_eq(a, b));
        (visited, changed)
    }

    /// Visits the children of `node`, rebuilding it only if one of them
    /// changed.
    fn visit_children(&mut self, node: &NodeRef<T>) -> NodeRef<T> {
        let rebuilt = match node.as_ref() {
            Node::Constant(_) | Node::Parameter(_) | Node::Member(_) => None,
            Node::Unary { op, operand, span } => {
                let new = self.visit(operand);
                (!Arc::ptr_eq(&new, operand)).then(|| Node::Unary { op:      *op,
                                                                     operand: new,
                                                                     span:    *span, })
            },
            Node::Convert { conversion, operand, span } => {
                let new = self.visit(operand);
                (!Arc::ptr_eq(&new, operand)).then(|| Node::Convert { conversion: *conversion,
                                                                       operand:    new,
                                                                       span:       *span, })
            },
            Node::Binary { op, left, right, span } => {
                let (l, r) = (self.visit(left), self.visit(right));
                (!Arc::ptr_eq(&l, left) || !Arc::ptr_eq(&r, right)).then(|| Node::Binary { op:    *op,
                                                                                          left:  l,
                                                                                          right: r,
                                                                                          span:  *span, })
            },
            Node::Call { function, args, span } => {
                let (args, changed) = self.visit_all(args);
                changed.then(|| Node::Call { function: function.clone(),
                                             args,
                                             span: *span })
            },
            Node::Construct { constructor, args, span } => {
                let (args, changed) = self.visit_all(args);
                changed.then(|| Node::Construct { constructor: constructor.clone(),
                                                  args,
                                                  span: *span })
            },
            Node::Conditional { condition,
                                then,
                                otherwise, } => {
                let (args, changed) = self.visit_all(&[condition.clone(), then.clone(), otherwise.clone()]);
                match (changed, <[NodeRef<T>; 3]>::try_from(args)) {
                    (true, Ok([condition, then, otherwise])) => Some(Node::Conditional { condition,
                                                                                         then,
                                                                                         otherwise }),
                    _ => None,
                }
            },
        };
        rebuilt.map_or_else(|| node.clone(), Arc::new)
    }
}

/// Applies the first rewrite rule that fires on `node`, whose children are
/// already optimized.
fn rewrite<T: Numeric>(node: &NodeRef<T>) -> Option<NodeRef<T>> {
    match node.as_ref() {
        Node::Unary { op, operand, .. } => {
            let value = operand.as_constant()?;
            op.apply(value).ok().map(Node::constant)
        },
        Node::Binary { op, left, right, span } => match (left.as_constant(), right.as_constant()) {
            (Some(a), Some(b)) => op.apply(a, b).ok().map(Node::constant),
            _ => simplify(*op, left, right, *span),
        },
        Node::Call { function, args, .. } if function.pure => {
            let values = constants(args)?;
            function.call(&values).ok().map(Node::constant)
        },
        Node::Construct { constructor, args, .. } => {
            let values = constants(args)?;
            constructor.construct(&values).ok().map(Node::constant)
        },
        Node::Member(member) if member.is_read_only() => member.read().ok().map(Node::constant),
        Node::Convert { conversion, operand, .. } => {
            if conversion.is_noop::<T>() {
                return Some(operand.clone());
            }
            let value = operand.as_constant()?;
            conversion.apply(value).ok().map(Node::constant)
        },
        Node::Conditional { condition,
                            then,
                            otherwise, } => {
            let value = condition.as_constant()?;
            Some(if value.is_truthy() { then.clone() } else { otherwise.clone() })
        },
        _ => None,
    }
}

/// The values of `nodes` if every one is a constant.
fn constants<T: Numeric>(nodes: &[NodeRef<T>]) -> Option<Vec<T>> {
    nodes.iter().map(|n| n.as_constant().cloned()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ast::{BinaryOperator, Conversion},
        util::span::Span,
    };

    fn binary(op: BinaryOperator, left: NodeRef<i64>, right: NodeRef<i64>) -> NodeRef<i64> {
        Arc::new(Node::Binary { op,
                                left,
                                right,
                                span: Span::default() })
    }

    fn x() -> NodeRef<i64> {
        Arc::new(Node::Parameter(0))
    }

    #[test]
    fn equal_subtrees_are_shared() {
        let tree = binary(BinaryOperator::Add,
                          binary(BinaryOperator::Mul, x(), x()),
                          binary(BinaryOperator::Mul, x(), x()));
        let (optimized, stats) = optimize(&tree);
        let Node::Binary { left, right, .. } = optimized.as_ref() else {
            panic!("expected a binary node");
        };
        assert!(Arc::ptr_eq(left, right));
        assert_eq!(stats.merged, 4);
        assert_eq!(stats.passes, 1);
    }

    #[test]
    fn failed_folds_are_left_in_place() {
        let tree = binary(BinaryOperator::Div, Node::constant(1), Node::constant(0));
        let (optimized, stats) = optimize(&tree);
        assert_eq!(optimized, tree);
        assert_eq!(stats.removed, 0);
    }

    #[test]
    fn integral_conversion_of_an_integer_is_elided() {
        let tree = Arc::new(Node::Convert { conversion: Conversion::Integral,
                                            operand:    x(),
                                            span:       Span::new(0, 5), });
        assert_eq!(optimize(&tree).0, x());
    }

    #[test]
    fn rewrites_cascade_bottom_up() {
        // (x * 1) + (0 * 5): both sides simplify first, then x + 0 becomes x.
        let tree = binary(BinaryOperator::Add,
                          binary(BinaryOperator::Mul, x(), Node::constant(1)),
                          binary(BinaryOperator::Mul, Node::constant(0), Node::constant(5)));
        let (optimized, stats) = optimize(&tree);
        assert_eq!(optimized, x());
        assert_eq!(stats.passes, 2);
        assert_eq!(stats.removed, 6);
    }
}
