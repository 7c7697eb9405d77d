/// The evaluator module compiles expressions into callables.
///
/// The evaluator owns a grammar built from type flags and extension sources,
/// and turns expression strings into [`evaluator::core::CompiledExpression`]
/// values that can be invoked any number of times.
///
/// # Responsibilities
/// - Builds the grammar once and registers extensions.
/// - Binds parameter names, lexes, parses and builds one node graph per
///   expression.
/// - Compiles the node graph into closures, optimizing it first when enabled.
pub mod evaluator;
/// The grammar module holds the operator and identifier tables.
///
/// A grammar maps each leading character to the operators and identifiers
/// that can start with it, enforces unique names, and validates the free
/// parameters of each compilation.
pub mod grammar;
/// The lexer module tokenizes expression text.
///
/// The lexer walks the source once, skipping whitespace and matching
/// operators, identifiers, parameters and literals in that order. Unknown
/// names and symbols are reported with the exact span they cover.
pub mod lexer;
/// Numeric literal shapes.
///
/// A small `logos` scanner that recognizes integer, real and hexadecimal
/// literals for the default value-readers.
pub mod literal;
/// The optimizer module shrinks node graphs.
///
/// A bottom-up rewriter repeated until a pass changes nothing. It folds
/// constants, removes algebraic identities and shares equal subtrees.
pub mod optimizer;
/// The parser module turns tokens into a node graph.
///
/// The shunting-yard adapter reorders infix tokens into RPN, and the postfix
/// fold builds one node from the RPN stream.
///
/// # Responsibilities
/// - Resolves precedence, associativity and unary operators.
/// - Counts function arguments and checks parentheses and separators.
/// - Reports syntax errors with the span of the offending token.
pub mod parser;
/// Tokens and the templates they are produced from.
pub mod token;
/// The value module defines the numeric types expressions compute with.
///
/// This module declares the [`value::core::Numeric`] trait and implements it
/// for `f64`, `i64`, `u64` and `BigRational`, together with the type flags
/// that select which operators a grammar offers.
///
/// # Responsibilities
/// - Defines checked arithmetic for every bundled type.
/// - Reads literals for each type.
/// - Declares which flags each type supports.
pub mod value;
