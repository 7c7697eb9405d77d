use std::{collections::HashMap, sync::Arc};

use crate::{
    ast::{Node, NodeRef},
    error::{EvalError, EvalResult},
    interpreter::value::core::Numeric,
};

/// A compiled node: evaluates the subtree for one set of inputs.
pub type Program<T> = Arc<dyn Fn(&[T]) -> EvalResult<T> + Send + Sync>;

/// Turns a node graph into nested closures.
///
/// A node shared by several parents is compiled once and its closure is
/// shared as well.
#[must_use]
pub fn compile<T: Numeric>(node: &NodeRef<T>) -> Program<T> {
    Compiler { memo: HashMap::new() }.compile(node)
}

struct Compiler<T> {
    memo: HashMap<*const Node<T>, Program<T>>,
}

impl<T: Numeric> Compiler<T> {
    fn compile(&mut self, node: &NodeRef<T>) -> Program<T> {
        if let Some(program) = self.memo.get(&Arc::as_ptr(node)) {
            return program.clone();
        }
        let program = self.build(node);
        self.memo.insert(Arc::as_ptr(node), program.clone());
        program
    }

    fn compile_all(&mut self, nodes: &[NodeRef<T>]) -> Vec<Program<T>> {
        nodes.iter().map(|n| self.compile(n)).collect()
    }

    fn build(&mut self, node: &NodeRef<T>) -> Program<T> {
        match node.as_ref() {
            Node::Constant(value) => {
                let value = value.clone();
                Arc::new(move |_: &[T]| Ok(value.clone()))
            },
            Node::Parameter(index) => {
                let index = *index;
                Arc::new(move |inputs: &[T]| {
                    inputs.get(index)
                          .cloned()
                          .ok_or_else(|| EvalError::malformed(format!("no input value for parameter {index}")))
                })
            },
            Node::Unary { op, operand, span } => {
                let (op, span, operand) = (*op, *span, self.compile(operand));
                Arc::new(move |inputs: &[T]| op.apply(&operand(inputs)?).map_err(|e| e.at(span)))
            },
            Node::Binary { op, left, right, span } => {
                let (op, span) = (*op, *span);
                let (left, right) = (self.compile(left), self.compile(right));
                Arc::new(move |inputs: &[T]| {
                    let a = left(inputs)?;
                    let b = right(inputs)?;
                    op.apply(&a, &b).map_err(|e| e.at(span))
                })
            },
            Node::Call { function, args, span } => {
                let (function, span, args) = (function.clone(), *span, self.compile_all(args));
                Arc::new(move |inputs: &[T]| {
                    let values = evaluate_all(&args, inputs)?;
                    function.call(&values).map_err(|e| e.at(span))
                })
            },
            Node::Construct { constructor, args, span } => {
                let (constructor, span, args) = (constructor.clone(), *span, self.compile_all(args));
                Arc::new(move |inputs: &[T]| {
                    let values = evaluate_all(&args, inputs)?;
                    constructor.construct(&values).map_err(|e| e.at(span))
                })
            },
            Node::Conditional { condition,
                                then,
                                otherwise, } => {
                let condition = self.compile(condition);
                let (then, otherwise) = (self.compile(then), self.compile(otherwise));
                Arc::new(move |inputs: &[T]| {
                    if condition(inputs)?.is_truthy() {
                        then(inputs)
                    } else {
                        otherwise(inputs)
                    }
                })
            },
            Node::Member(member) => {
                let member = member.clone();
                Arc::new(move |_: &[T]| member.read())
            },
            Node::Convert { conversion, operand, span } => {
                let (conversion, span, operand) = (*conversion, *span, self.compile(operand));
                Arc::new(move |inputs: &[T]| conversion.apply(&operand(inputs)?).map_err(|e| e.at(span)))
            },
        }
    }
}

fn evaluate_all<T>(programs: &[Program<T>], inputs: &[T]) -> EvalResult<Vec<T>> {
    programs.iter().map(|p| p(inputs)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ast::BinaryOperator, util::span::Span};

    #[test]
    fn shared_nodes_compile_once() {
        let x = Arc::new(Node::<i64>::Parameter(0));
        let square = Arc::new(Node::Binary { op:    BinaryOperator::Mul,
                                             left:  x.clone(),
                                             right: x,
                                             span:  Span::new(1, 2), });
        let sum = Arc::new(Node::Binary { op:    BinaryOperator::Add,
                                          left:  square.clone(),
                                          right: square,
                                          span:  Span::new(5, 6), });
        let mut compiler = Compiler { memo: HashMap::new() };
        let program = compiler.compile(&sum);
        assert_eq!(compiler.memo.len(), 3);
        assert_eq!(program(&[3]), Ok(18));
    }

    #[test]
    fn errors_carry_the_operator_span() {
        let div = Arc::new(Node::Binary { op:    BinaryOperator::Div,
                                          left:  Node::constant(1_i64),
                                          right: Arc::new(Node::Parameter(0)),
                                          span:  Span::new(1, 2), });
        let err = compile(&div)(&[0]).unwrap_err();
        assert_eq!(err.span(), Some(Span::new(1, 2)));
        assert_eq!(err.root(), &EvalError::DivisionByZero);
    }
}
