use std::{
    fmt,
    hash::{Hash, Hasher},
    sync::{Arc, RwLock},
};

use crate::{
    error::{EvalError, EvalResult},
    interpreter::value::core::Numeric,
    util::span::Span,
};

/// Shared pointer to a compiled node.
pub type NodeRef<T> = Arc<Node<T>>;

/// Body of an extension function or constructor.
pub type NativeFn<T> = Arc<dyn Fn(&[T]) -> EvalResult<T> + Send + Sync>;

/// Operators taking two operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Rem,
    /// `^` in decimal grammars.
    Pow,
    /// `<<`
    Shl,
    /// `>>`
    Shr,
    /// `|`
    BitOr,
    /// `&`
    BitAnd,
    /// `^` in integer grammars.
    BitXor,
}

impl BinaryOperator {
    /// Applies the operator using `T`'s checked arithmetic.
    ///
    /// # Example
    /// ```
    /// use exprc::ast::BinaryOperator;
    ///
    /// assert_eq!(BinaryOperator::Shl.apply(&3_i64, &2), Ok(12));
    /// assert!(BinaryOperator::Div.apply(&1_i64, &0).is_err());
    /// ```
    pub fn apply<T: Numeric>(self, left: &T, right: &T) -> EvalResult<T> {
        match self {
            Self::Add => left.try_add(right),
            Self::Sub => left.try_sub(right),
            Self::Mul => left.try_mul(right),
            Self::Div => left.try_div(right),
            Self::Rem => left.try_rem(right),
            Self::Pow => left.try_pow(right),
            Self::Shl => left.try_shl(right),
            Self::Shr => left.try_shr(right),
            Self::BitOr => left.try_bit_or(right),
            Self::BitAnd => left.try_bit_and(right),
            Self::BitXor => left.try_bit_xor(right),
        }
    }

    /// The conventional source spelling.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Rem => "%",
            Self::Pow | Self::BitXor => "^",
            Self::Shl => "<<",
            Self::Shr => ">>",
            Self::BitOr => "|",
            Self::BitAnd => "&",
        }
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Operators taking one operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    /// Arithmetic negation, `-x`.
    Negate,
    /// One's complement, `~x` or `!x`.
    Not,
}

impl UnaryOperator {
    /// Applies the operator using `T`'s checked arithmetic.
    pub fn apply<T: Numeric>(self, operand: &T) -> EvalResult<T> {
        match self {
            Self::Negate => operand.try_neg(),
            Self::Not => operand.try_not(),
        }
    }

    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Negate => "-",
            Self::Not => "~",
        }
    }
}

/// Conversions between representations of the same numeric type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Conversion {
    /// Leaves the value unchanged; produced by unary `+`.
    Identity,
    /// Rounds toward zero; produced by `trunc(x)`.
    Integral,
}

impl Conversion {
    pub fn apply<T: Numeric>(self, operand: &T) -> EvalResult<T> {
        match self {
            Self::Identity => Ok(operand.clone()),
            Self::Integral => operand.try_truncate(),
        }
    }

    /// Returns `true` if the conversion never changes a value of `T`.
    #[must_use]
    pub const fn is_noop<T: Numeric>(self) -> bool {
        match self {
            Self::Identity => true,
            Self::Integral => T::INTEGRAL,
        }
    }
}

/// A named function registered by an extension.
pub struct Function<T> {
    /// Name as written in expressions.
    pub name:  String,
    /// Number of arguments.
    pub arity: usize,
    /// Whether a call with constant arguments may be evaluated once at
    /// compile time.
    pub pure:  bool,
    body:      NativeFn<T>,
}

impl<T> Function<T> {
    pub fn new(name: impl Into<String>, arity: usize, pure: bool, body: NativeFn<T>) -> Self {
        Self { name: name.into(),
               arity,
               pure,
               body }
    }

    /// Invokes the function, checking the argument count.
    pub fn call(&self, args: &[T]) -> EvalResult<T> {
        if args.len() != self.arity {
            return Err(EvalError::ArgumentCount { name:     self.name.clone(),
                                                  expected: self.arity,
                                                  found:    args.len(), });
        }
        (self.body)(args)
    }
}

impl<T> fmt::Debug for Function<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
         .field("name", &self.name)
         .field("arity", &self.arity)
         .field("pure", &self.pure)
         .finish_non_exhaustive()
    }
}

/// A named constructor registered by an extension.
///
/// Constructors build a value from its parts, such as `frac(1, 3)`. They are
/// always side-effect free, so a construction from constants folds.
pub struct Constructor<T> {
    pub name:  String,
    pub arity: usize,
    body:      NativeFn<T>,
}

impl<T> Constructor<T> {
    pub fn new(name: impl Into<String>, arity: usize, body: NativeFn<T>) -> Self {
        Self { name: name.into(),
               arity,
               body }
    }

    /// Invokes the constructor, checking the argument count.
    pub fn construct(&self, args: &[T]) -> EvalResult<T> {
        if args.len() != self.arity {
            return Err(EvalError::ArgumentCount { name:     self.name.clone(),
                                                  expected: self.arity,
                                                  found:    args.len(), });
        }
        (self.body)(args)
    }
}

impl<T> fmt::Debug for Constructor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constructor")
         .field("name", &self.name)
         .field("arity", &self.arity)
         .finish_non_exhaustive()
    }
}

/// Where a member reads its value from.
pub enum MemberSource<T> {
    /// A read-only computed property; assumed stable for the evaluator's
    /// lifetime.
    Property(Arc<dyn Fn() -> T + Send + Sync>),
    /// A mutable binding shared with the host, read on every evaluation.
    Variable(Arc<RwLock<T>>),
}

/// A named value bound by an extension.
pub struct Member<T> {
    pub name: String,
    source:   MemberSource<T>,
}

impl<T: Clone> Member<T> {
    pub fn new(name: impl Into<String>, source: MemberSource<T>) -> Self {
        Self { name: name.into(),
               source }
    }

    /// Returns `true` if the value cannot change after registration.
    #[must_use]
    pub const fn is_read_only(&self) -> bool {
        matches!(self.source, MemberSource::Property(_))
    }

    /// Reads the current value.
    pub fn read(&self) -> EvalResult<T> {
        match &self.source {
            MemberSource::Property(get) => Ok(get()),
            MemberSource::Variable(cell) => {
                cell.read()
                    .map(|value| value.clone())
                    .map_err(|_| EvalError::Extension { name:    self.name.clone(),
                                                        details: "variable lock is poisoned".to_string(), })
            },
        }
    }
}

impl<T> fmt::Debug for Member<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.source {
            MemberSource::Property(_) => "property",
            MemberSource::Variable(_) => "variable",
        };
        f.debug_struct("Member")
         .field("name", &self.name)
         .field("kind", &kind)
         .finish()
    }
}

/// A node of a compiled expression.
///
/// Nodes are immutable and referenced through [`NodeRef`], so equal
/// subexpressions can share one instance. Equality and hashing are
/// structural; spans are ignored and functions, constructors and members
/// compare by identity.
#[derive(Debug)]
pub enum Node<T> {
    /// A literal or folded value.
    Constant(T),
    /// The input slot of a declared parameter.
    Parameter(usize),
    Unary {
        op:      UnaryOperator,
        operand: NodeRef<T>,
        span:    Span,
    },
    Binary {
        op:    BinaryOperator,
        left:  NodeRef<T>,
        right: NodeRef<T>,
        span:  Span,
    },
    Call {
        function: Arc<Function<T>>,
        args:     Vec<NodeRef<T>>,
        span:     Span,
    },
    Construct {
        constructor: Arc<Constructor<T>>,
        args:        Vec<NodeRef<T>>,
        span:        Span,
    },
    /// `if(condition, then, otherwise)`; only the selected branch runs.
    Conditional {
        condition: NodeRef<T>,
        then:      NodeRef<T>,
        otherwise: NodeRef<T>,
    },
    /// A read of an extension property or variable.
    Member(Arc<Member<T>>),
    Convert {
        conversion: Conversion,
        operand:    NodeRef<T>,
        span:       Span,
    },
}

impl<T: Numeric> Node<T> {
    #[must_use]
    pub fn constant(value: T) -> NodeRef<T> {
        Arc::new(Self::Constant(value))
    }

    /// The value of a constant node.
    #[must_use]
    pub const fn as_constant(&self) -> Option<&T> {
        match self {
            Self::Constant(value) => Some(value),
            _ => None,
        }
    }

    /// The direct children, in evaluation order.
    #[must_use]
    pub fn children(&self) -> Vec<&NodeRef<T>> {
        match self {
            Self::Constant(_) | Self::Parameter(_) | Self::Member(_) => Vec::new(),
            Self::Unary { operand, .. } | Self::Convert { operand, .. } => vec![operand],
            Self::Binary { left, right, .. } => vec![left, right],
            Self::Call { args, .. } | Self::Construct { args, .. } => args.iter().collect(),
            Self::Conditional { condition,
                                then,
                                otherwise, } => vec![condition, then, otherwise],
        }
    }

    /// Number of nodes in the tree, counting shared nodes once per use.
    #[must_use]
    pub fn count(&self) -> usize {
        1 + self.children().into_iter().map(|c| c.count()).sum::<usize>()
    }

    /// Renders the tree as a fully parenthesized infix expression, naming
    /// parameters with `names`.
    ///
    /// # Example
    /// ```
    /// use exprc::{Evaluator, TypeFlags};
    ///
    /// let evaluator = Evaluator::<i64>::new(TypeFlags::NUMERIC).unwrap();
    /// let compiled = evaluator.compile_with("x*y+3*4", &["x", "y"], false).unwrap();
    /// assert_eq!(compiled.node().render(&["x", "y"]), "((x * y) + (3 * 4))");
    /// ```
    #[must_use]
    pub fn render<S: AsRef<str>>(&self, names: &[S]) -> String {
        match self {
            Self::Constant(value) => value.to_string(),
            Self::Parameter(index) => {
                names.get(*index)
                     .map_or_else(|| format!("${index}"), |n| n.as_ref().to_string())
            },
            Self::Unary { op, operand, .. } => format!("{}{}", op.symbol(), operand.render(names)),
            Self::Binary { op, left, right, .. } => {
                format!("({} {op} {})", left.render(names), right.render(names))
            },
            Self::Call { function, args, .. } => render_call(&function.name, args, names),
            Self::Construct { constructor, args, .. } => render_call(&constructor.name, args, names),
            Self::Conditional { condition,
                                then,
                                otherwise, } => {
                format!("if({}, {}, {})",
                        condition.render(names),
                        then.render(names),
                        otherwise.render(names))
            },
            Self::Member(member) => member.name.clone(),
            Self::Convert { conversion, operand, .. } => match conversion {
                Conversion::Identity => format!("+{}", operand.render(names)),
                Conversion::Integral => format!("trunc({})", operand.render(names)),
            },
        }
    }
}

fn render_call<T: Numeric, S: AsRef<str>>(name: &str, args: &[NodeRef<T>], names: &[S]) -> String {
    let args: Vec<String> = args.iter().map(|a| a.render(names)).collect();
    format!("{name}({})", args.join(", "))
}

impl<T: Numeric> PartialEq for Node<T> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Constant(a), Self::Constant(b)) => a.same_value(b),
            (Self::Parameter(a), Self::Parameter(b)) => a == b,
            (Self::Unary { op: a, operand: x, .. }, Self::Unary { op: b, operand: y, .. }) => a == b && x == y,
            (Self::Binary { op: a,
                            left: l1,
                            right: r1,
                            .. },
             Self::Binary { op: b,
                            left: l2,
                            right: r2,
                            .. }) => a == b && l1 == l2 && r1 == r2,
            (Self::Call { function: f, args: a, .. }, Self::Call { function: g, args: b, .. }) => {
                Arc::ptr_eq(f, g) && a == b
            },
            (Self::Construct { constructor: f,
                               args: a,
                               .. },
             Self::Construct { constructor: g,
                               args: b,
                               .. }) => Arc::ptr_eq(f, g) && a == b,
            (Self::Conditional { condition: c1,
                                 then: t1,
                                 otherwise: o1, },
             Self::Conditional { condition: c2,
                                 then: t2,
                                 otherwise: o2, }) => c1 == c2 && t1 == t2 && o1 == o2,
            (Self::Member(a), Self::Member(b)) => Arc::ptr_eq(a, b),
            (Self::Convert { conversion: a,
                             operand: x,
                             .. },
             Self::Convert { conversion: b,
                             operand: y,
                             .. }) => a == b && x == y,
            _ => false,
        }
    }
}

impl<T: Numeric> Eq for Node<T> {}

impl<T: Numeric> Hash for Node<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::Constant(value) => value.hash_value(state),
            Self::Parameter(index) => index.hash(state),
            Self::Unary { op, operand, .. } => {
                op.hash(state);
                operand.hash(state);
            },
            Self::Binary { op, left, right, .. } => {
                op.hash(state);
                left.hash(state);
                right.hash(state);
            },
            Self::Call { function, args, .. } => {
                Arc::as_ptr(function).hash(state);
                args.hash(state);
            },
            Self::Construct { constructor, args, .. } => {
                Arc::as_ptr(constructor).hash(state);
                args.hash(state);
            },
            Self::Conditional { condition,
                                then,
                                otherwise, } => {
                condition.hash(state);
                then.hash(state);
                otherwise.hash(state);
            },
            Self::Member(member) => Arc::as_ptr(member).hash(state),
            Self::Convert { conversion, operand, .. } => {
                conversion.hash(state);
                operand.hash(state);
            },
        }
    }
}
