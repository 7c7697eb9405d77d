use thiserror::Error;

use crate::util::{chars::caret_line, span::Span};

/// Result type used by build actions and compiled expressions.
pub type EvalResult<T> = Result<T, EvalError>;

/// Errors raised while building nodes or evaluating a compiled expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    /// Integer division or remainder by zero.
    #[error("division by zero")]
    DivisionByZero,
    /// The result does not fit the numeric type.
    #[error("arithmetic overflow")]
    Overflow,
    /// An operand is outside the domain of the operation.
    #[error("{details}")]
    Domain {
        /// Why the operand was rejected.
        details: String,
    },
    /// The numeric type has no implementation for an operator.
    #[error("operator '{operator}' is not supported by {type_name}")]
    Unsupported {
        /// The operator symbol.
        operator:  &'static str,
        /// Name of the numeric type.
        type_name: &'static str,
    },
    /// A placeholder for an unknown identifier was built.
    #[error("unknown identifier '{name}'")]
    UnknownIdentifier {
        /// The identifier text.
        name: String,
    },
    /// A function was called with the wrong number of arguments.
    #[error("'{name}' expects {expected} argument(s) but was given {found}")]
    ArgumentCount {
        /// The function name.
        name:     String,
        /// Declared arity.
        expected: usize,
        /// Arguments supplied.
        found:    usize,
    },
    /// A compiled expression was invoked with the wrong number of inputs.
    #[error("expected {expected} input value(s) but was given {found}")]
    InputCount {
        /// Declared parameter count.
        expected: usize,
        /// Values supplied.
        found:    usize,
    },
    /// The RPN stream does not describe a single expression.
    #[error("malformed expression: {details}")]
    Malformed {
        /// What is structurally wrong.
        details: String,
    },
    /// An extension function or property reported a failure.
    #[error("{name}: {details}")]
    Extension {
        /// The extension name.
        name:    String,
        /// The reported failure.
        details: String,
    },
    /// Another evaluation error, located at the token that produced it.
    #[error("{source} at {span}")]
    At {
        /// Where the failing operation appears in the expression.
        span:   Span,
        /// The underlying error.
        source: Box<EvalError>,
    },
}

impl EvalError {
    /// Shorthand for [`EvalError::Domain`].
    pub fn domain(details: impl Into<String>) -> Self {
        Self::Domain { details: details.into() }
    }

    /// Shorthand for [`EvalError::Malformed`].
    pub fn malformed(details: impl Into<String>) -> Self {
        Self::Malformed { details: details.into() }
    }

    /// Attaches a span, keeping the innermost one if already located.
    #[must_use]
    pub fn at(self, span: Span) -> Self {
        match self {
            Self::At { .. } => self,
            other => Self::At { span,
                                source: Box::new(other) },
        }
    }

    /// The span this error is located at, if any.
    #[must_use]
    pub const fn span(&self) -> Option<Span> {
        match self {
            Self::At { span, .. } => Some(*span),
            _ => None,
        }
    }

    /// The error without location information.
    #[must_use]
    pub fn root(&self) -> &Self {
        match self {
            Self::At { source, .. } => source.root(),
            other => other,
        }
    }

    /// Renders the message, followed by a caret line when the error is
    /// located.
    #[must_use]
    pub fn render(&self, expression: &str) -> String {
        match self.span() {
            Some(span) => format!("{self}\n{}", caret_line(expression, span.start, Some(span.end))),
            None => self.to_string(),
        }
    }
}
