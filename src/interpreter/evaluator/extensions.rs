use std::sync::{Arc, RwLock};

use log::debug;

use crate::{
    ast::{Constructor, Function, Member, MemberSource, NativeFn, Node},
    error::{EvalResult, GrammarError},
    interpreter::{
        grammar::Grammar,
        token::{Action, Template},
        value::core::Numeric,
    },
};

/// One registered name, before it is placed in a grammar.
enum Entry<T> {
    Function {
        name:  String,
        arity: usize,
        pure:  bool,
        body:  NativeFn<T>,
    },
    Constant {
        name:  String,
        value: T,
    },
    Constructor {
        name:  String,
        arity: usize,
        body:  NativeFn<T>,
    },
    Member {
        name:   String,
        source: MemberSource<T>,
    },
}

impl<T> Entry<T> {
    fn name(&self) -> &str {
        match self {
            Self::Function { name, .. }
            | Self::Constant { name, .. }
            | Self::Constructor { name, .. }
            | Self::Member { name, .. } => name,
        }
    }
}

/// A named source of functions, constants, constructors and members.
///
/// Sources are handed to [`crate::EvaluatorBuilder::extension`] in order.
/// When two sources register the same name, the first one wins.
///
/// # Example
/// ```
/// use exprc::{Evaluator, Extensions, TypeFlags};
///
/// let geometry = Extensions::new("geometry").constant("Pi", std::f64::consts::PI)
///                                           .function("square", 1, |args| Ok(args[0] * args[0]));
/// let evaluator = Evaluator::builder(TypeFlags::NUMERIC).extension(geometry)
///                                                       .build()
///                                                       .unwrap();
/// let area = evaluator.compile("Pi * square(r)", &["r"]).unwrap();
/// assert!((area.call(&[2.0]).unwrap() - 4.0 * std::f64::consts::PI).abs() < 1e-12);
/// ```
pub struct Extensions<T> {
    source:  String,
    prefix:  Option<String>,
    entries: Vec<Entry<T>>,
}

impl<T: Numeric> Extensions<T> {
    /// Creates an empty source. `source` only names it in log messages.
    #[must_use]
    pub fn new(source: impl Into<String>) -> Self {
        Self { source:  source.into(),
               prefix:  None,
               entries: Vec::new(), }
    }

    /// Registers every name of this source as `prefix.name`.
    #[must_use]
    pub fn prefixed(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Adds a pure function. Calls with constant arguments are evaluated once
    /// at compile time.
    #[must_use]
    pub fn function<F>(self, name: &str, arity: usize, body: F) -> Self
        where F: Fn(&[T]) -> EvalResult<T> + Send + Sync + 'static
    {
        self.push_function(name, arity, true, Arc::new(body))
    }

    /// Adds a function whose result may change between calls, such as one
    /// reading host state. It is never folded.
    #[must_use]
    pub fn impure_function<F>(self, name: &str, arity: usize, body: F) -> Self
        where F: Fn(&[T]) -> EvalResult<T> + Send + Sync + 'static
    {
        self.push_function(name, arity, false, Arc::new(body))
    }

    fn push_function(mut self, name: &str, arity: usize, pure: bool, body: NativeFn<T>) -> Self {
        self.entries.push(Entry::Function { name: name.to_string(),
                                            arity,
                                            pure,
                                            body });
        self
    }

    #[must_use]
    pub fn constant(mut self, name: &str, value: T) -> Self {
        self.entries.push(Entry::Constant { name: name.to_string(),
                                            value });
        self
    }

    /// Adds a constructor that builds a value from its parts.
    #[must_use]
    pub fn constructor<F>(mut self, name: &str, arity: usize, body: F) -> Self
        where F: Fn(&[T]) -> EvalResult<T> + Send + Sync + 'static
    {
        self.entries.push(Entry::Constructor { name: name.to_string(),
                                               arity,
                                               body: Arc::new(body) });
        self
    }

    /// Adds a read-only computed value. It is read once when an optimized
    /// expression is compiled.
    #[must_use]
    pub fn property<F>(mut self, name: &str, getter: F) -> Self
        where F: Fn() -> T + Send + Sync + 'static
    {
        self.entries.push(Entry::Member { name:   name.to_string(),
                                          source: MemberSource::Property(Arc::new(getter)), });
        self
    }

    /// Adds a value shared with the host. It is read on every evaluation, so
    /// writes through `cell` are seen by expressions compiled earlier.
    #[must_use]
    pub fn variable(mut self, name: &str, cell: Arc<RwLock<T>>) -> Self {
        self.entries.push(Entry::Member { name:   name.to_string(),
                                          source: MemberSource::Variable(cell), });
        self
    }

    /// Adds every entry of `other` after the entries of `self`.
    #[must_use]
    pub fn merge(mut self, other: Self) -> Self {
        self.entries.extend(other.entries);
        self
    }

    /// Places every entry in `grammar`, skipping names that are already
    /// registered.
    ///
    /// # Returns
    /// The number of entries registered.
    ///
    /// # Errors
    /// [`GrammarError::InvalidName`] if an entry name is not an identifier.
    pub(crate) fn register(self, grammar: &mut Grammar<T>) -> Result<usize, GrammarError> {
        let mut registered = 0;
        for entry in self.entries {
            let name = match &self.prefix {
                Some(prefix) => format!("{prefix}.{}", entry.name()),
                None => entry.name().to_string(),
            };
            if grammar.is_reserved(&name) {
                debug!("extension '{}' skips '{name}': the name is already registered", self.source);
                continue;
            }
            let template = match entry {
                Entry::Function { arity, pure, body, .. } => {
                    let function = Arc::new(Function::new(name.as_str(), arity, pure, body));
                    Template::function(&name, Action::Call(function))
                },
                Entry::Constructor { arity, body, .. } => {
                    let constructor = Arc::new(Constructor::new(name.as_str(), arity, body));
                    Template::function(&name, Action::Construct(constructor))
                },
                Entry::Constant { value, .. } => Template::operand(&name, Action::Bound(Node::constant(value))),
                Entry::Member { source, .. } => {
                    let member = Arc::new(Member::new(name.as_str(), source));
                    Template::operand(&name, Action::Member(member))
                },
            };
            grammar.register_identifier(template)?;
            registered += 1;
        }
        debug!("extension '{}' registered {registered} name(s)", self.source);
        Ok(registered)
    }
}
