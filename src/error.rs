/// Lexing and parsing errors.
///
/// Defines the structured error raised while turning an expression string
/// into tokens and RPN: unknown identifiers and operators, invalid literals,
/// mismatched parentheses and misplaced separators. It carries the original
/// expression so callers can render a caret under the offending span.
pub mod parse_error;
/// Grammar configuration errors.
///
/// Raised while an evaluator is constructed or while parameter names are
/// bound: conflicting type flags, duplicate registrations, and parameter names
/// that collide with reserved names.
pub mod grammar_error;
/// Evaluation errors.
///
/// Raised by a build action while folding RPN, or by the numeric type's own
/// arithmetic when a compiled expression runs: overflow, division by zero,
/// domain errors and arity mismatches.
pub mod eval_error;

pub use eval_error::{EvalError, EvalResult};
pub use grammar_error::GrammarError;
pub use parse_error::{ParseError, ParseErrorKind, ParseResult};

use thiserror::Error;

/// Any error produced while compiling or running an expression.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// The expression could not be tokenized or parsed.
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// The evaluator or the parameter list is misconfigured.
    #[error(transparent)]
    Grammar(#[from] GrammarError),
    /// A build action or the numeric type's arithmetic failed.
    #[error(transparent)]
    Eval(#[from] EvalError),
}

/// Result of compiling an expression.
pub type CompileResult<T> = Result<T, Error>;

impl Error {
    /// Renders the error for an end user.
    ///
    /// Parse errors and span-annotated evaluation errors are followed by the
    /// expression with a caret line under the offending span. `expression`
    /// is only consulted for evaluation errors, since parse errors carry their
    /// own copy of the source.
    #[must_use]
    pub fn render(&self, expression: &str) -> String {
        match self {
            Self::Parse(e) => format!("{e}\n{}", e.render()),
            Self::Eval(e) => e.render(expression),
            Self::Grammar(e) => e.to_string(),
        }
    }
}
