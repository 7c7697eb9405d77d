use std::collections::VecDeque;

use crate::{
    error::{ParseError, ParseErrorKind, ParseResult},
    interpreter::{
        token::{Token, TokenClass},
        value::core::Numeric,
    },
    util::span::Span,
};

/// Bookkeeping for one open parenthesis.
#[derive(Debug, Clone, Copy)]
struct Frame {
    /// Whether the parenthesis opens a function's argument list.
    call:       bool,
    /// Number of separators seen directly inside it.
    separators: usize,
    /// Whether no token has been seen inside it yet.
    empty:      bool,
}

/// Reorders an infix token stream into RPN.
///
/// The adapter is lazy: it pulls tokens from the lexer only as RPN tokens
/// are requested, and stops after the first error. Function tokens leave it
/// with [`Token::argc`] set to the number of arguments between their
/// parentheses.
///
/// # Example
/// ```
/// use exprc::{Evaluator, TypeFlags};
///
/// let evaluator = Evaluator::<f64>::new(TypeFlags::NUMERIC).unwrap();
/// let rpn: Vec<String> = evaluator.rpn("2 + 3 * -x", &["x"])
///                                 .unwrap()
///                                 .into_iter()
///                                 .map(|t| t.text)
///                                 .collect();
/// assert_eq!(rpn, ["2", "3", "x", "-", "*", "+"]);
/// ```
pub struct ShuntingYard<'a, T, I> {
    source:       &'a str,
    input:        I,
    stack:        Vec<Token<T>>,
    frames:       Vec<Frame>,
    output:       VecDeque<Token<T>>,
    previous:     Option<TokenClass>,
    pending_call: Option<Span>,
    finished:     bool,
}

impl<'a, T, I> ShuntingYard<'a, T, I>
    where T: Numeric,
          I: Iterator<Item = ParseResult<Token<T>>>
{
    /// Wraps a token stream lexed from `source`.
    pub const fn new(source: &'a str, input: I) -> Self {
        Self { source,
               input,
               stack: Vec::new(),
               frames: Vec::new(),
               output: VecDeque::new(),
               previous: None,
               pending_call: None,
               finished: false }
    }

    /// Whether the next token must be an operand, as at the start of input
    /// or after `(`, `,`, a function name or an operator.
    fn expects_operand(&self) -> bool {
        match self.previous {
            None => true,
            Some(class) => !matches!(class, TokenClass::Operand | TokenClass::CloseParen),
        }
    }

    fn error(&self, kind: ParseErrorKind, span: Span, message: impl Into<String>) -> ParseError {
        ParseError::new(kind, self.source, span, message)
    }

    fn mark_content(&mut self) {
        if let Some(frame) = self.frames.last_mut() {
            frame.empty = false;
        }
    }

    /// Moves stacked tokens to the output until an open parenthesis is on
    /// top. Returns `false` if the stack ran out first.
    fn pop_until_paren(&mut self) -> bool {
        while let Some(top) = self.stack.last() {
            if top.class() == TokenClass::OpenParen {
                return true;
            }
            if let Some(token) = self.stack.pop() {
                self.output.push_back(token);
            }
        }
        false
    }

    /// Reports an operator that is missing its right operand, or an empty
    /// argument, when a separator or a closing parenthesis arrives while an
    /// operand is expected.
    fn check_operand_before(&self, token: &Token<T>) -> ParseResult<()> {
        match self.previous {
            Some(class) if class.is_operator() => {
                Err(self.error(ParseErrorKind::MissingOperand,
                               token.span,
                               format!("expected an operand before '{}'", token.name())))
            },
            Some(TokenClass::ArgSeparator) => {
                Err(self.error(ParseErrorKind::EmptyGroup, token.span, "empty function argument"))
            },
            _ => Ok(()),
        }
    }

    fn push_operator(&mut self, token: Token<T>) -> ParseResult<()> {
        let token = if self.expects_operand() {
            if token.is_prefix() {
                token
            } else {
                let (span, name) = (token.span, token.name().to_string());
                token.into_unary().ok_or_else(|| {
                                       self.error(ParseErrorKind::MissingOperand,
                                                  span,
                                                  format!("operator '{name}' is missing its left operand"))
                                   })?
            }
        } else if token.is_prefix() {
            return Err(self.error(ParseErrorKind::UnexpectedOperator,
                                  token.span,
                                  format!("prefix operator '{}' cannot follow an operand", token.name())));
        } else {
            token
        };

        let right_assoc = token.class() == TokenClass::RightAssocOperator;
        while let Some(top) = self.stack.last() {
            let pops = top.class().is_operator()
                       && if right_assoc {
                           top.precedence() > token.precedence()
                       } else {
                           top.precedence() >= token.precedence()
                       };
            if !pops {
                break;
            }
            if let Some(top) = self.stack.pop() {
                self.output.push_back(top);
            }
        }
        self.mark_content();
        self.previous = Some(token.class());
        self.stack.push(token);
        Ok(())
    }

    fn separator(&mut self, token: &Token<T>) -> ParseResult<()> {
        if !self.frames.last().is_some_and(|f| f.call) {
            return Err(self.error(ParseErrorKind::MisplacedSeparator,
                                  token.span,
                                  "misplaced argument separator"));
        }
        if self.previous == Some(TokenClass::OpenParen) {
            return Err(self.error(ParseErrorKind::EmptyGroup, token.span, "empty function argument"));
        }
        self.check_operand_before(token)?;
        self.pop_until_paren();
        if let Some(frame) = self.frames.last_mut() {
            frame.separators += 1;
        }
        self.previous = Some(TokenClass::ArgSeparator);
        Ok(())
    }

    fn close(&mut self, token: &Token<T>) -> ParseResult<()> {
        self.check_operand_before(token)?;
        if !self.pop_until_paren() {
            return Err(self.error(ParseErrorKind::MismatchedClosingParenthesis,
                                  token.span,
                                  "mismatched closing parenthesis"));
        }
        self.stack.pop();
        let frame = self.frames.pop().unwrap_or(Frame { call:       false,
                                                         separators: 0,
                                                         empty:      false, });
        if frame.call {
            if let Some(mut function) = self.stack.pop() {
                function.argc = Some(if frame.empty { 0 } else { frame.separators + 1 });
                self.output.push_back(function);
            }
        } else if frame.empty {
            return Err(self.error(ParseErrorKind::EmptyGroup, token.span, "empty parentheses"));
        }
        self.previous = Some(TokenClass::CloseParen);
        Ok(())
    }

    /// Routes one infix token.
    fn accept(&mut self, token: Token<T>) -> ParseResult<()> {
        if let Some(span) = self.pending_call
           && token.class() != TokenClass::OpenParen
        {
            return Err(self.error(ParseErrorKind::ExpectedArguments,
                                  span,
                                  format!("expected '(' after function '{}'", span.slice(self.source))));
        }

        match token.class() {
            TokenClass::Operand => {
                self.mark_content();
                self.previous = Some(TokenClass::Operand);
                self.output.push_back(token);
            },
            TokenClass::Function => {
                self.mark_content();
                self.pending_call = Some(token.span);
                self.previous = Some(TokenClass::Function);
                self.stack.push(token);
            },
            TokenClass::LeftAssocOperator | TokenClass::RightAssocOperator => self.push_operator(token)?,
            TokenClass::OpenParen => {
                self.mark_content();
                self.frames.push(Frame { call:       self.pending_call.take().is_some(),
                                         separators: 0,
                                         empty:      true, });
                self.previous = Some(TokenClass::OpenParen);
                self.stack.push(token);
            },
            TokenClass::CloseParen => self.close(&token)?,
            TokenClass::ArgSeparator => self.separator(&token)?,
        }
        Ok(())
    }

    /// Drains the operator stack at end of input.
    fn finish(&mut self) -> ParseResult<()> {
        let end = self.source.len();
        if let Some(span) = self.pending_call {
            return Err(self.error(ParseErrorKind::ExpectedArguments,
                                  span,
                                  format!("expected '(' after function '{}'", span.slice(self.source))));
        }
        if let Some(class) = self.previous
           && class.is_operator()
        {
            return Err(ParseError::at(ParseErrorKind::MissingOperand,
                                      self.source,
                                      end,
                                      "expected an operand at end of input"));
        }
        while let Some(token) = self.stack.pop() {
            if token.class() == TokenClass::OpenParen {
                return Err(self.error(ParseErrorKind::MismatchedParentheses,
                                      token.span,
                                      "mismatched parentheses"));
            }
            self.output.push_back(token);
        }
        Ok(())
    }
}

impl<T, I> Iterator for ShuntingYard<'_, T, I>
    where T: Numeric,
          I: Iterator<Item = ParseResult<Token<T>>>
{
    type Item = ParseResult<Token<T>>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(token) = self.output.pop_front() {
                return Some(Ok(token));
            }
            if self.finished {
                return None;
            }
            let step = match self.input.next() {
                Some(Ok(token)) => self.accept(token),
                Some(Err(e)) => Err(e),
                None => {
                    self.finished = true;
                    self.finish()
                },
            };
            if let Err(e) = step {
                self.finished = true;
                self.output.clear();
                return Some(Err(e));
            }
        }
    }
}
