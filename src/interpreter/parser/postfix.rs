use crate::error::EvalError;

/// A token that can be folded from RPN.
pub trait Postfix {
    /// Returns `true` if the token builds a node without consuming operands.
    fn is_operand(&self) -> bool;
}

/// Folds an RPN token stream into a single node.
///
/// Operand tokens are built with `build(token, None)`. Operator and function
/// tokens are built with the operand stack, from which they pop their
/// operands before the result is pushed back.
///
/// # Parameters
/// - `tokens`: The RPN stream. An `Err` item stops the fold and is returned
///   as is.
/// - `build`: Builds one node from a token.
/// - `diagnose`: Receives every error raised by `build` together with the
///   token that raised it, and returns the error to propagate.
///
/// # Returns
/// The only node left on the stack.
///
/// # Errors
/// Any error from the stream or from `build`, and [`EvalError::Malformed`]
/// if the stream leaves zero or several nodes.
///
/// # Example
/// ```
/// use exprc::{error::EvalError, interpreter::parser::postfix::{Postfix, fold}};
///
/// enum Rpn { Num(i64), Add }
///
/// impl Postfix for Rpn {
///     fn is_operand(&self) -> bool {
///         matches!(self, Rpn::Num(_))
///     }
/// }
///
/// let tokens = [Rpn::Num(2), Rpn::Num(3), Rpn::Add].into_iter().map(Ok);
/// let sum = fold(tokens,
///                |token, stack: Option<&mut Vec<i64>>| match (token, stack) {
///                    (Rpn::Num(n), _) => Ok(*n),
///                    (Rpn::Add, Some(stack)) => {
///                        let (b, a) = (stack.pop().unwrap(), stack.pop().unwrap());
///                        Ok(a + b)
///                    },
///                    (Rpn::Add, None) => unreachable!(),
///                },
///                |_, e: EvalError| e);
/// assert_eq!(sum, Ok(5));
/// ```
pub fn fold<Tok, N, E, I, B, D>(tokens: I, mut build: B, mut diagnose: D) -> Result<N, E>
    where Tok: Postfix,
          E: From<EvalError>,
          I: IntoIterator<Item = Result<Tok, E>>,
          B: FnMut(&Tok, Option<&mut Vec<N>>) -> Result<N, E>,
          D: FnMut(&Tok, E) -> E
{
    let mut stack = Vec::new();
    for token in tokens {
        let token = token?;
        let built = if token.is_operand() {
            build(&token, None)
        } else {
            build(&token, Some(&mut stack))
        };
        match built {
            Ok(node) => stack.push(node),
            Err(e) => return Err(diagnose(&token, e)),
        }
    }

    match stack.len() {
        1 => stack.pop().ok_or_else(|| EvalError::malformed("empty operand stack").into()),
        0 => Err(EvalError::malformed("the expression is empty").into()),
        n => Err(EvalError::malformed(format!("{n} values are left without an operator to combine them")).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Num(i64);

    impl Postfix for Num {
        fn is_operand(&self) -> bool {
            true
        }
    }

    fn build(token: &Num, _: Option<&mut Vec<i64>>) -> Result<i64, EvalError> {
        Ok(token.0)
    }

    #[test]
    fn leftover_operands_are_malformed() {
        let result = fold([Num(1), Num(2)].into_iter().map(Ok), build, |_, e| e);
        assert!(matches!(result, Err(EvalError::Malformed { .. })));
    }

    #[test]
    fn empty_stream_is_malformed() {
        let result = fold(std::iter::empty::<Result<Num, EvalError>>(), build, |_, e| e);
        assert!(matches!(result, Err(EvalError::Malformed { .. })));
    }

    #[test]
    fn diagnose_sees_the_failing_token() {
        let result = fold([Num(7)].into_iter().map(Ok),
                          |_, _: Option<&mut Vec<i64>>| Err(EvalError::Overflow),
                          |token: &Num, e| EvalError::Extension { name:    token.0.to_string(),
                                                                  details: e.to_string(), });
        assert_eq!(result,
                   Err(EvalError::Extension { name:    "7".to_string(),
                                              details: "arithmetic overflow".to_string(), }));
    }
}
