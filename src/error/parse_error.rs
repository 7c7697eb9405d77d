use std::fmt;

use crate::util::{chars::caret_line, span::Span};

/// Result type used by the lexer and the parser.
pub type ParseResult<T> = Result<T, ParseError>;

/// What went wrong while lexing or parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseErrorKind {
    /// An identifier that is neither a built-in, an extension nor a declared
    /// parameter.
    UnknownIdentifier,
    /// A run of characters that matches no registered operator.
    UnknownOperator,
    /// The value-reader recognized a literal it cannot represent.
    InvalidLiteral,
    /// An opening parenthesis was never closed.
    MismatchedParentheses,
    /// A closing parenthesis has no matching opening one.
    MismatchedClosingParenthesis,
    /// An argument separator outside of a function call.
    MisplacedSeparator,
    /// A binary operator is missing its left operand.
    MissingOperand,
    /// A prefix-only operator follows an operand.
    UnexpectedOperator,
    /// A function name is not followed by its argument list.
    ExpectedArguments,
    /// An empty argument or an empty pair of parentheses.
    EmptyGroup,
}

impl ParseErrorKind {
    /// Returns `true` for errors raised by the lexer, `false` for syntax
    /// errors raised by the parser.
    #[must_use]
    pub const fn is_lexical(self) -> bool {
        matches!(self,
                 Self::UnknownIdentifier | Self::UnknownOperator | Self::InvalidLiteral)
    }
}

/// A lexing or syntax error located in the original expression.
///
/// Callers that present diagnostics to users catch this type specifically and
/// print [`ParseError::render`] beneath the message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// The error category.
    pub kind:       ParseErrorKind,
    /// The full expression text being compiled.
    pub expression: String,
    /// Byte offset where the offending input starts.
    pub start:      usize,
    /// Byte offset one past the offending input, when known.
    pub end:        Option<usize>,
    /// Human-readable description.
    pub message:    String,
}

impl ParseError {
    /// Creates an error spanning `span` of `expression`.
    #[must_use]
    pub fn new(kind: ParseErrorKind,
               expression: &str,
               span: Span,
               message: impl Into<String>)
               -> Self {
        Self { kind,
               expression: expression.to_string(),
               start: span.start,
               end: Some(span.end),
               message: message.into() }
    }

    /// Creates an error located at a single offset, typically end of input.
    #[must_use]
    pub fn at(kind: ParseErrorKind, expression: &str, offset: usize, message: impl Into<String>) -> Self {
        Self { kind,
               expression: expression.to_string(),
               start: offset,
               end: None,
               message: message.into() }
    }

    /// Returns `true` if the lexer raised this error.
    #[must_use]
    pub const fn is_lexical(&self) -> bool {
        self.kind.is_lexical()
    }

    /// Returns `true` if the parser raised this error.
    #[must_use]
    pub const fn is_syntax(&self) -> bool {
        !self.kind.is_lexical()
    }

    /// The offending span; zero-width when no end offset is known.
    #[must_use]
    pub fn span(&self) -> Span {
        Span::new(self.start, self.end.unwrap_or(self.start))
    }

    /// The offending source text.
    #[must_use]
    pub fn offending_text(&self) -> &str {
        self.span().slice(&self.expression)
    }

    /// Prints the expression followed by a caret line under the offending
    /// span.
    ///
    /// # Example
    /// ```
    /// use exprc::{Evaluator, TypeFlags, Error};
    ///
    /// let evaluator = Evaluator::<f64>::new(TypeFlags::NUMERIC).unwrap();
    /// let Err(Error::Parse(e)) = evaluator.compile("1 + foo * 2", &[]) else { panic!() };
    /// assert_eq!(e.render(), "1 + foo * 2\n    ^^^");
    /// ```
    #[must_use]
    pub fn render(&self) -> String {
        caret_line(&self.expression, self.start, self.end)
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.end {
            Some(end) if end > self.start + 1 => {
                write!(f, "{} at offsets {}..{}", self.message, self.start, end)
            },
            _ => write!(f, "{} at offset {}", self.message, self.start),
        }
    }
}

impl std::error::Error for ParseError {}
