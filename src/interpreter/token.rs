use std::{fmt, sync::Arc};

use crate::{
    ast::{BinaryOperator, Constructor, Conversion, Function, Member, Node, NodeRef, UnaryOperator},
    error::{EvalError, EvalResult},
    interpreter::{parser::postfix::Postfix, value::core::Numeric},
    util::span::Span,
};

/// The syntactic role of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenClass {
    /// A literal, constant, member, parameter or placeholder.
    Operand,
    /// An operator grouping left to right.
    LeftAssocOperator,
    /// An operator grouping right to left, including prefix operators.
    RightAssocOperator,
    /// A name that must be followed by a parenthesized argument list.
    Function,
    OpenParen,
    CloseParen,
    /// `,` between function arguments.
    ArgSeparator,
}

impl TokenClass {
    /// Returns `true` for both operator classes.
    #[must_use]
    pub const fn is_operator(self) -> bool {
        matches!(self, Self::LeftAssocOperator | Self::RightAssocOperator)
    }
}

impl fmt::Display for TokenClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Operand => "operand",
            Self::LeftAssocOperator => "left-assoc operator",
            Self::RightAssocOperator => "right-assoc operator",
            Self::Function => "function",
            Self::OpenParen => "open paren",
            Self::CloseParen => "close paren",
            Self::ArgSeparator => "separator",
        };
        f.write_str(name)
    }
}

/// What a token builds once the parser has placed it in RPN order.
#[derive(Debug, Clone)]
pub enum Action<T> {
    /// A literal read by the value-reader.
    Literal(T),
    /// An extension constant, already wrapped in a shared node.
    Bound(NodeRef<T>),
    /// A declared parameter, by input slot.
    Parameter(usize),
    Member(Arc<Member<T>>),
    Unary(UnaryOperator),
    Binary(BinaryOperator),
    Convert(Conversion),
    Call(Arc<Function<T>>),
    Construct(Arc<Constructor<T>>),
    /// `if(condition, then, otherwise)`.
    Conditional,
    /// An identifier accepted only because unknown names are allowed; fails
    /// when built.
    Unknown(String),
    /// Parentheses and separators, which the parser consumes.
    Punctuation,
}

/// A registered matcher: the name the lexer looks for and everything a token
/// produced from it needs.
#[derive(Debug)]
pub struct Template<T> {
    pub name:       String,
    pub class:      TokenClass,
    pub precedence: u8,
    pub action:     Action<T>,
    /// The form used when the token appears where an operand was expected,
    /// such as unary minus for `-`.
    pub unary:      Option<Arc<Template<T>>>,
}

impl<T> Template<T> {
    #[must_use]
    pub fn punctuation(name: &str, class: TokenClass) -> Arc<Self> {
        Arc::new(Self { name: name.to_string(),
                        class,
                        precedence: 0,
                        action: Action::Punctuation,
                        unary: None })
    }

    /// A binary operator with an optional unary form.
    #[must_use]
    pub fn binary(name: &str,
                  op: BinaryOperator,
                  precedence: u8,
                  right_assoc: bool,
                  unary: Option<Arc<Self>>)
                  -> Arc<Self> {
        let class = if right_assoc {
            TokenClass::RightAssocOperator
        } else {
            TokenClass::LeftAssocOperator
        };
        Arc::new(Self { name: name.to_string(),
                        class,
                        precedence,
                        action: Action::Binary(op),
                        unary })
    }

    /// A prefix operator. Prefix operators group right to left.
    #[must_use]
    pub fn prefix(name: &str, action: Action<T>, precedence: u8) -> Arc<Self> {
        Arc::new(Self { name: name.to_string(),
                        class: TokenClass::RightAssocOperator,
                        precedence,
                        action,
                        unary: None })
    }

    #[must_use]
    pub fn function(name: &str, action: Action<T>) -> Arc<Self> {
        Arc::new(Self { name: name.to_string(),
                        class: TokenClass::Function,
                        precedence: 0,
                        action,
                        unary: None })
    }

    #[must_use]
    pub fn operand(name: &str, action: Action<T>) -> Arc<Self> {
        Arc::new(Self { name: name.to_string(),
                        class: TokenClass::Operand,
                        precedence: 0,
                        action,
                        unary: None })
    }

    /// Returns `true` for operators that only take a right operand.
    #[must_use]
    pub const fn is_prefix(&self) -> bool {
        self.class.is_operator() && matches!(self.action, Action::Unary(_) | Action::Convert(_))
    }
}

/// A token located in the expression text.
#[derive(Debug, Clone)]
pub struct Token<T> {
    pub span:     Span,
    pub template: Arc<Template<T>>,
    /// Number of arguments between the parentheses of a function call, set by
    /// the parser when the call is closed.
    pub argc:     Option<usize>,
}

impl<T: Numeric> Token<T> {
    #[must_use]
    pub const fn new(template: Arc<Template<T>>, span: Span) -> Self {
        Self { span,
               template,
               argc: None }
    }

    #[must_use]
    pub fn class(&self) -> TokenClass {
        self.template.class
    }

    #[must_use]
    pub fn precedence(&self) -> u8 {
        self.template.precedence
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.template.name
    }

    #[must_use]
    pub fn is_prefix(&self) -> bool {
        self.template.is_prefix()
    }

    /// Switches to the unary form, if the token has one.
    #[must_use]
    pub fn into_unary(self) -> Option<Self> {
        let unary = self.template.unary.clone()?;
        Some(Self { template: unary,
                    ..self })
    }

    /// Builds the node for this token.
    ///
    /// Operand tokens are built without a stack. Operators and functions take
    /// their operands from the top of `stack`.
    ///
    /// # Errors
    /// - [`EvalError::UnknownIdentifier`] when building a placeholder.
    /// - [`EvalError::ArgumentCount`] when a call has the wrong number of
    ///   arguments.
    /// - [`EvalError::Malformed`] when the stack holds too few operands.
    pub fn build(&self, stack: Option<&mut Vec<NodeRef<T>>>) -> EvalResult<NodeRef<T>> {
        let span = self.span;
        match &self.template.action {
            Action::Literal(value) => Ok(Node::constant(value.clone())),
            Action::Bound(node) => Ok(node.clone()),
            Action::Parameter(index) => Ok(Arc::new(Node::Parameter(*index))),
            Action::Member(member) => Ok(Arc::new(Node::Member(member.clone()))),
            Action::Unknown(name) => Err(EvalError::UnknownIdentifier { name: name.clone() }),
            Action::Punctuation => Err(EvalError::malformed(format!("unexpected '{}'", self.name()))),
            Action::Unary(op) => {
                let [operand] = self.operands(stack, 1)?.try_into().map_err(|_| self.missing())?;
                Ok(Arc::new(Node::Unary { op: *op,
                                          operand,
                                          span }))
            },
            Action::Convert(conversion) => {
                let [operand] = self.operands(stack, 1)?.try_into().map_err(|_| self.missing())?;
                Ok(Arc::new(Node::Convert { conversion: *conversion,
                                            operand,
                                            span }))
            },
            Action::Binary(op) => {
                let [left, right] = self.operands(stack, 2)?.try_into().map_err(|_| self.missing())?;
                Ok(Arc::new(Node::Binary { op: *op,
                                           left,
                                           right,
                                           span }))
            },
            Action::Conditional => {
                let [condition, then, otherwise] =
                    self.operands(stack, 3)?.try_into().map_err(|_| self.missing())?;
                Ok(Arc::new(Node::Conditional { condition,
                                                then,
                                                otherwise }))
            },
            Action::Call(function) => {
                let args = self.operands(stack, function.arity)?;
                Ok(Arc::new(Node::Call { function: function.clone(),
                                         args,
                                         span }))
            },
            Action::Construct(constructor) => {
                let args = self.operands(stack, constructor.arity)?;
                Ok(Arc::new(Node::Construct { constructor: constructor.clone(),
                                              args,
                                              span }))
            },
        }
    }

    /// Pops `arity` operands in source order, checking the argument count of
    /// function tokens first.
    fn operands(&self, stack: Option<&mut Vec<NodeRef<T>>>, arity: usize) -> EvalResult<Vec<NodeRef<T>>> {
        if let Some(found) = self.argc
           && found != arity
        {
            return Err(EvalError::ArgumentCount { name: self.name().to_string(),
                                                  expected: arity,
                                                  found });
        }
        let stack = stack.ok_or_else(|| self.missing())?;
        if stack.len() < arity {
            return Err(self.missing());
        }
        Ok(stack.split_off(stack.len() - arity))
    }

    fn missing(&self) -> EvalError {
        EvalError::malformed(format!("'{}' is missing an operand", self.name()))
    }
}

impl<T: Numeric> Postfix for Token<T> {
    fn is_operand(&self) -> bool {
        self.class() == TokenClass::Operand
    }
}

/// A token as reported by [`crate::Evaluator::tokenize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenInfo {
    pub class: TokenClass,
    /// Byte offset of the first character.
    pub start: usize,
    /// Byte offset one past the last character.
    pub end:   usize,
    /// The token text.
    pub text:  String,
}

impl fmt::Display for TokenInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>4}..{:<4} {:<22} {}", self.start, self.end, self.class.to_string(), self.text)
    }
}
