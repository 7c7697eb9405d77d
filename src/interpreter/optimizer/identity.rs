use std::sync::Arc;

use crate::{
    ast::{BinaryOperator, Node, NodeRef, UnaryOperator},
    interpreter::value::core::Numeric,
    util::span::Span,
};

/// Simplifies a binary node whose operands include exactly one constant.
///
/// # Returns
/// The replacement node, or `None` when no identity applies.
pub fn simplify<T: Numeric>(op: BinaryOperator,
                            left: &NodeRef<T>,
                            right: &NodeRef<T>,
                            span: Span)
                            -> Option<NodeRef<T>> {
    use BinaryOperator::{Add, BitAnd, BitOr, BitXor, Div, Mul, Shl, Shr, Sub};

    let negate = |operand: &NodeRef<T>| {
        Some(Arc::new(Node::Unary { op: UnaryOperator::Negate,
                                    operand: operand.clone(),
                                    span }))
    };

    match (left.as_constant(), right.as_constant()) {
        (Some(constant), None) => {
            if constant.is_zero() {
                match op {
                    Add | BitOr | BitXor => Some(right.clone()),
                    Mul | BitAnd | Shl | Shr => Some(left.clone()),
                    Sub => negate(right),
                    _ => None,
                }
            } else if constant.is_one() && op == Mul {
                Some(right.clone())
            } else if T::SIGNED && constant.is_minus_one() && op == Mul {
                negate(right)
            } else {
                None
            }
        },
        (None, Some(constant)) => {
            if constant.is_zero() {
                match op {
                    Add | Sub | BitOr | BitXor | Shl | Shr => Some(left.clone()),
                    Mul | BitAnd => Some(right.clone()),
                    _ => None,
                }
            } else if constant.is_one() && matches!(op, Mul | Div) {
                Some(left.clone())
            } else if T::SIGNED && constant.is_minus_one() && matches!(op, Mul | Div) {
                negate(left)
            } else {
                None
            }
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn x() -> NodeRef<i64> {
        Arc::new(Node::Parameter(0))
    }

    fn c(value: i64) -> NodeRef<i64> {
        Node::constant(value)
    }

    fn simplified(op: BinaryOperator, left: &NodeRef<i64>, right: &NodeRef<i64>) -> Option<NodeRef<i64>> {
        simplify(op, left, right, Span::default())
    }

    #[test]
    fn zero_on_the_left() {
        assert_eq!(simplified(BinaryOperator::Add, &c(0), &x()), Some(x()));
        assert_eq!(simplified(BinaryOperator::Shl, &c(0), &x()), Some(c(0)));
        assert_eq!(simplified(BinaryOperator::Sub, &c(0), &x()),
                   Some(Arc::new(Node::Unary { op:      UnaryOperator::Negate,
                                               operand: x(),
                                               span:    Span::default(), })));
        assert_eq!(simplified(BinaryOperator::Div, &c(0), &x()), None);
    }

    #[test]
    fn zero_on_the_right() {
        assert_eq!(simplified(BinaryOperator::Sub, &x(), &c(0)), Some(x()));
        assert_eq!(simplified(BinaryOperator::BitAnd, &x(), &c(0)), Some(c(0)));
        assert_eq!(simplified(BinaryOperator::Rem, &x(), &c(0)), None);
    }

    #[test]
    fn one_and_minus_one() {
        assert_eq!(simplified(BinaryOperator::Mul, &c(1), &x()), Some(x()));
        assert_eq!(simplified(BinaryOperator::Div, &c(1), &x()), None);
        assert_eq!(simplified(BinaryOperator::Div, &x(), &c(-1)),
                   Some(Arc::new(Node::Unary { op:      UnaryOperator::Negate,
                                               operand: x(),
                                               span:    Span::default(), })));
    }

    #[test]
    fn minus_one_needs_a_signed_type() {
        let x = Arc::new(Node::<u64>::Parameter(0));
        let max = Node::constant(u64::MAX);
        assert_eq!(simplify(BinaryOperator::Mul, &x, &max, Span::default()), None);
    }
}
