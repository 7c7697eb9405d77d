use crate::{
    error::{ParseError, ParseErrorKind, ParseResult},
    interpreter::{
        grammar::{Grammar, Parameters},
        token::{Action, Template, Token},
        value::core::Numeric,
    },
    util::{
        chars::{is_identifier_continue, is_identifier_start, is_operator_continue, scan_run},
        span::Span,
    },
};

/// Lazily splits an expression into tokens.
///
/// At each non-whitespace character the lexer tries, in order, the grammar's
/// operators, its identifiers, the declared parameters and finally the
/// value-reader. The iterator is finite and stops after the first error.
pub struct Lexer<'a, T> {
    grammar:       &'a Grammar<T>,
    parameters:    &'a Parameters,
    source:        &'a str,
    position:      usize,
    allow_unknown: bool,
    failed:        bool,
}

impl<'a, T: Numeric> Lexer<'a, T> {
    /// Creates a lexer over `source`.
    ///
    /// # Parameters
    /// - `grammar`: Operators and identifiers to recognize.
    /// - `parameters`: Free parameters declared for this compilation.
    /// - `source`: The expression text.
    /// - `allow_unknown`: Emit a placeholder operand for unknown identifiers
    ///   instead of failing.
    #[must_use]
    pub const fn new(grammar: &'a Grammar<T>,
                     parameters: &'a Parameters,
                     source: &'a str,
                     allow_unknown: bool)
                     -> Self {
        Self { grammar,
               parameters,
               source,
               position: 0,
               allow_unknown,
               failed: false }
    }

    fn skip_whitespace(&mut self) {
        self.position = self.source[self.position..].char_indices()
                                                    .find(|&(_, c)| !self.grammar.is_whitespace(c))
                                                    .map_or(self.source.len(), |(offset, _)| self.position + offset);
    }

    fn error(&mut self, kind: ParseErrorKind, span: Span, message: String) -> ParseError {
        self.failed = true;
        ParseError::new(kind, self.source, span, message)
    }

    fn scan(&mut self, start: usize, first: char) -> ParseResult<Token<T>> {
        let found = self.grammar
                        .match_operator(self.source, start)
                        .or_else(|| self.grammar.match_identifier(self.source, start));
        if let Some((template, end)) = found {
            return Ok(Token::new(template, Span::new(start, end)));
        }

        if let Some((index, end)) = self.parameters.match_at(self.source, start) {
            let name = &self.source[start..end];
            return Ok(Token::new(Template::operand(name, Action::Parameter(index)), Span::new(start, end)));
        }

        match self.grammar.read_value(self.source, start) {
            Ok(Some((value, end))) if end > start => {
                let Some(text) = self.source.get(start..end) else {
                    let stop = scan_run(self.source, start, |c| is_identifier_continue(c) || c == '.');
                    let message = format!("value reader returned end offset {end}, which is not a character boundary \
                                           within the expression");
                    return Err(self.error(ParseErrorKind::InvalidLiteral, Span::new(start, stop), message));
                };
                return Ok(Token::new(Template::operand(text, Action::Literal(value)), Span::new(start, end)));
            },
            Ok(_) => {},
            Err(message) => {
                let end = scan_run(self.source, start, |c| is_identifier_continue(c) || c == '.');
                return Err(self.error(ParseErrorKind::InvalidLiteral, Span::new(start, end), message));
            },
        }

        if is_identifier_start(first) {
            let end = scan_run(self.source, start, is_identifier_continue);
            let name = &self.source[start..end];
            if self.allow_unknown {
                let template = Template::operand(name, Action::Unknown(name.to_string()));
                return Ok(Token::new(template, Span::new(start, end)));
            }
            let message = format!("unknown identifier '{name}'");
            return Err(self.error(ParseErrorKind::UnknownIdentifier, Span::new(start, end), message));
        }

        let end = scan_run(self.source, start, is_operator_continue);
        let message = format!("unknown operator '{}'", &self.source[start..end]);
        Err(self.error(ParseErrorKind::UnknownOperator, Span::new(start, end), message))
    }
}

impl<T: Numeric> Iterator for Lexer<'_, T> {
    type Item = ParseResult<Token<T>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        self.skip_whitespace();
        let first = self.source[self.position..].chars().next()?;
        let start = self.position;
        let token = self.scan(start, first);
        if let Ok(token) = &token {
            self.position = token.span.end;
        }
        Some(token)
    }
}
