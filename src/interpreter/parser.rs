/// Generic RPN folding.
///
/// Folds a postfix token stream into a single result with an explicit
/// operand stack. The fold knows nothing about tokens or nodes beyond the
/// [`postfix::Postfix`] classification, so it serves any token and node
/// type.
pub mod postfix;
/// Operator-precedence parsing.
///
/// This module turns the lexer's infix token stream into RPN with the
/// shunting-yard algorithm. It resolves precedence and associativity,
/// switches operators to their unary form where an operand is expected,
/// counts function arguments, and reports syntax errors such as mismatched
/// parentheses or misplaced separators.
pub mod shunting_yard;
