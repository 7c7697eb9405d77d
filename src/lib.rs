//! # exprc
//!
//! exprc compiles infix arithmetic expressions into reusable evaluators.
//! An expression such as `2*(x+1)^2` is lexed, parsed with the shunting-yard
//! algorithm, built into an immutable node graph, optionally optimized, and
//! wrapped in a callable that takes one value per declared parameter.
//! Grammars are generic over the numeric type: `f64`, exact decimals
//! (`BigRational`), `i64` and `u64` are bundled.

#![warn(
    clippy::redundant_clone,
    clippy::needless_pass_by_value,
    clippy::similar_names,
    clippy::large_enum_variant,
    clippy::string_lit_as_bytes,
    clippy::match_same_arms,
    clippy::cargo,
    clippy::nursery,
    clippy::perf,
    clippy::style,
    clippy::suspicious,
    clippy::correctness,
    clippy::complexity,
    clippy::pedantic,
    //missing_docs,
)]
#![allow(clippy::missing_errors_doc)]

/// Defines the compiled node graph.
///
/// This module declares the `Node` enum that compiled expressions are made
/// of, the operators it applies, and the extension functions, constructors
/// and members it can reference. Nodes are immutable and reference-counted
/// so equal subtrees can be shared.
///
/// # Responsibilities
/// - Defines the node variants and their structural equality and hashing.
/// - Applies operators and conversions through the numeric type's checked
///   arithmetic.
/// - Renders a node graph back to infix text.
pub mod ast;
/// Provides unified error types for compiling and evaluating.
///
/// This module defines every error raised while building a grammar, lexing,
/// parsing, building nodes or evaluating a compiled expression. Errors carry
/// the span of the offending input so they can be rendered with a caret line
/// under the expression.
///
/// # Responsibilities
/// - Defines error types for all failure modes (grammar, parse, evaluation).
/// - Attaches source spans and detailed messages for context.
/// - Supports integration with standard error handling traits.
pub mod error;
/// Orchestrates compilation from text to callable.
///
/// This module ties together the grammar, the lexer, the parser, the
/// optimizer and the numeric types to provide the public compilation API.
///
/// # Responsibilities
/// - Coordinates all core components: grammar, lexer, parser, builder,
///   optimizer and closure compiler.
/// - Provides the `Evaluator` entry point.
/// - Manages the flow of data and errors between phases.
pub mod interpreter;
/// A minimal stderr logger for the command-line tool.
///
/// The library only emits records through the `log` facade; installing this
/// logger is left to binaries.
pub mod logging;
/// General helpers for source text.
///
/// This module provides character classification, case-aware name matching,
/// spans and caret rendering used by the lexer and by error reporting.
pub mod util;

pub use error::{CompileResult, Error, EvalError, GrammarError, ParseError, ParseErrorKind};
pub use interpreter::{
    evaluator::{
        builtin,
        core::{CompiledExpression, Evaluator, EvaluatorBuilder},
        extensions::Extensions,
    },
    value::{
        core::{LiteralContext, Numeric},
        flags::TypeFlags,
    },
};

/// Compiles and evaluates a parameterless expression with `T`'s default
/// flags.
///
/// # Errors
/// Returns an error if the expression cannot be compiled or its evaluation
/// fails.
///
/// # Examples
/// ```
/// use exprc::evaluate;
///
/// assert_eq!(evaluate::<f64>("2 + 3 * 4").unwrap(), 14.0);
/// assert_eq!(evaluate::<i64>("(2 + 3) * 4").unwrap(), 20);
///
/// // Unknown names are reported, not guessed.
/// assert!(evaluate::<f64>("2 + y").is_err());
/// ```
pub fn evaluate<T: Numeric>(expression: &str) -> CompileResult<T> {
    let evaluator = Evaluator::<T>::standard()?;
    Ok(evaluator.compile(expression, &[])?.call(&[])?)
}
