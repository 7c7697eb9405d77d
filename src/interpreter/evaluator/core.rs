use std::{collections::BTreeSet, fmt, sync::Arc};

use log::{debug, trace};

use crate::{
    ast::NodeRef,
    error::{CompileResult, Error, EvalError, EvalResult, GrammarError},
    interpreter::{
        evaluator::{
            compile::{Program, compile},
            extensions::Extensions,
        },
        grammar::{Grammar, Parameters, ValueReader, default_reader},
        lexer::Lexer,
        optimizer::{OptimizeStats, optimize},
        parser::{postfix::fold, shunting_yard::ShuntingYard},
        token::{Token, TokenInfo},
        value::{
            core::{LiteralContext, Numeric},
            flags::TypeFlags,
        },
    },
};

/// Configures an [`Evaluator`].
///
/// ```
/// use exprc::{Evaluator, TypeFlags, builtin};
///
/// let evaluator = Evaluator::builder(TypeFlags::NUMERIC | TypeFlags::DECIMAL).extension(builtin::float_math())
///                                                                            .whitespace([';'])
///                                                                            .build()
///                                                                            .unwrap();
/// let compiled = evaluator.compile("sqrt(x);*;2", &["x"]).unwrap();
/// assert_eq!(compiled.call(&[16.0]), Ok(8.0));
/// ```
pub struct EvaluatorBuilder<T> {
    flags:         TypeFlags,
    extensions:    Vec<Extensions<T>>,
    whitespace:    Vec<char>,
    allow_unknown: bool,
    optimize:      bool,
    reader:        Option<ValueReader<T>>,
}

impl<T: Numeric> EvaluatorBuilder<T> {
    #[must_use]
    pub const fn new(flags: TypeFlags) -> Self {
        Self { flags,
               extensions: Vec::new(),
               whitespace: Vec::new(),
               allow_unknown: false,
               optimize: true,
               reader: None }
    }

    /// Appends an extension source. Earlier sources win name conflicts.
    #[must_use]
    pub fn extension(mut self, extension: Extensions<T>) -> Self {
        self.extensions.push(extension);
        self
    }

    /// Characters the lexer skips in addition to Unicode whitespace.
    #[must_use]
    pub fn whitespace(mut self, chars: impl IntoIterator<Item = char>) -> Self {
        self.whitespace.extend(chars);
        self
    }

    /// Accept unknown identifiers while lexing; they fail only if built.
    #[must_use]
    pub fn allow_unknown(mut self, allow: bool) -> Self {
        self.allow_unknown = allow;
        self
    }

    /// Whether [`Evaluator::compile`] runs the optimizer. Defaults to `true`.
    #[must_use]
    pub fn optimize(mut self, optimize: bool) -> Self {
        self.optimize = optimize;
        self
    }

    /// Replaces the literal reader of `T`.
    #[must_use]
    pub fn value_reader<F>(mut self, reader: F) -> Self
        where F: Fn(&str, usize, &LiteralContext) -> Result<Option<(T, usize)>, String> + Send + Sync + 'static
    {
        self.reader = Some(Arc::new(reader));
        self
    }

    /// Builds the grammar and registers every extension.
    ///
    /// # Errors
    /// - [`GrammarError::ConflictingFlags`] or
    ///   [`GrammarError::UnsupportedFlags`] for bad flags.
    /// - [`GrammarError::InvalidName`] for an extension name that is not an
    ///   identifier.
    pub fn build(self) -> Result<Evaluator<T>, GrammarError> {
        let reader = self.reader.unwrap_or_else(default_reader);
        let mut grammar = Grammar::new(self.flags, reader, self.whitespace)?;
        for extension in self.extensions {
            extension.register(&mut grammar)?;
        }
        Ok(Evaluator { grammar,
                       allow_unknown: self.allow_unknown,
                       optimize: self.optimize })
    }
}

/// Compiles expressions over the numeric type `T`.
///
/// The grammar and the extension registry are built once, when the evaluator
/// is constructed. Each call to [`Evaluator::compile`] lexes, parses and
/// builds one expression and returns a [`CompiledExpression`] that can be
/// called any number of times from any thread.
///
/// # Example
/// ```
/// use exprc::{Evaluator, TypeFlags};
///
/// let evaluator = Evaluator::<i64>::new(TypeFlags::NUMERIC | TypeFlags::INTEGER).unwrap();
/// let hypot2 = evaluator.compile("x*x + y*y", &["x", "y"]).unwrap();
/// assert_eq!(hypot2.call(&[3, 4]), Ok(25));
/// assert_eq!(evaluator.compile("5 & 3", &[]).unwrap().call(&[]), Ok(1));
/// ```
pub struct Evaluator<T> {
    grammar:       Grammar<T>,
    allow_unknown: bool,
    optimize:      bool,
}

impl<T: Numeric> Evaluator<T> {
    /// Creates an evaluator with the given flags and no extensions.
    ///
    /// # Errors
    /// See [`EvaluatorBuilder::build`].
    pub fn new(flags: TypeFlags) -> Result<Self, GrammarError> {
        EvaluatorBuilder::new(flags).build()
    }

    /// Creates an evaluator with the flags `T` declares as its default.
    ///
    /// # Errors
    /// See [`EvaluatorBuilder::build`].
    pub fn standard() -> Result<Self, GrammarError> {
        Self::new(T::DEFAULT_FLAGS)
    }

    #[must_use]
    pub const fn builder(flags: TypeFlags) -> EvaluatorBuilder<T> {
        EvaluatorBuilder::new(flags)
    }

    #[must_use]
    pub const fn flags(&self) -> TypeFlags {
        self.grammar.flags()
    }

    /// Compiles `expression` with free parameters `parameters`, optimizing
    /// unless the evaluator was built with optimization off.
    ///
    /// # Parameters
    /// - `expression`: Infix source text.
    /// - `parameters`: Free parameter names. The compiled expression takes
    ///   one input per name, in this order.
    ///
    /// # Errors
    /// - [`Error::Grammar`] if a parameter name is invalid, reserved or
    ///   repeated.
    /// - [`Error::Parse`] for lexical and syntax errors.
    /// - [`Error::Eval`] if a node cannot be built, such as a call with the
    ///   wrong number of arguments.
    pub fn compile(&self, expression: &str, parameters: &[&str]) -> CompileResult<CompiledExpression<T>> {
        self.compile_with(expression, parameters, self.optimize)
    }

    /// Compiles `expression`, choosing explicitly whether to optimize.
    ///
    /// # Errors
    /// See [`Evaluator::compile`].
    pub fn compile_with(&self,
                        expression: &str,
                        parameters: &[&str],
                        optimize_tree: bool)
                        -> CompileResult<CompiledExpression<T>> {
        let parameters = self.grammar.bind_parameters(parameters)?;
        let node = self.build_tree(expression, &parameters)?;

        let (node, stats) = if optimize_tree {
            let (optimized, stats) = optimize(&node);
            (optimized, Some(stats))
        } else {
            (node, None)
        };
        debug!("compiled '{expression}' into {} node(s)", node.count());

        Ok(CompiledExpression { expression: expression.to_string(),
                                parameters: parameters.into_names(),
                                program: compile(&node),
                                node,
                                stats })
    }

    fn build_tree(&self, expression: &str, parameters: &Parameters) -> CompileResult<NodeRef<T>> {
        let lexer = Lexer::new(&self.grammar, parameters, expression, self.allow_unknown);
        let rpn = ShuntingYard::new(expression, lexer).map(|token| token.map_err(Error::from));
        fold(rpn,
             |token, stack| token.build(stack).map_err(Error::from),
             |token, error| {
                 trace!("building '{}' at {} failed: {error}", token.name(), token.span);
                 match error {
                     Error::Eval(e) => Error::Eval(e.at(token.span)),
                     other => other,
                 }
             })
    }

    /// Splits `expression` into tokens without parsing it.
    ///
    /// # Errors
    /// [`Error::Grammar`] for bad parameter names and [`Error::Parse`] for
    /// lexical errors.
    ///
    /// # Example
    /// ```
    /// use exprc::{Evaluator, TypeFlags, interpreter::token::TokenClass};
    ///
    /// let evaluator = Evaluator::<f64>::new(TypeFlags::NUMERIC).unwrap();
    /// let tokens = evaluator.tokenize("2*(x+1)", &["x"]).unwrap();
    /// assert_eq!(tokens.len(), 7);
    /// assert_eq!(tokens[2].class, TokenClass::OpenParen);
    /// assert_eq!((tokens[3].start, tokens[3].end, tokens[3].text.as_str()), (3, 4, "x"));
    /// ```
    pub fn tokenize(&self, expression: &str, parameters: &[&str]) -> CompileResult<Vec<TokenInfo>> {
        let parameters = self.grammar.bind_parameters(parameters)?;
        let lexer = Lexer::new(&self.grammar, &parameters, expression, self.allow_unknown);
        Ok(lexer.map(|token| token.map(|t| info(expression, &t)))
                .collect::<Result<_, _>>()?)
    }

    /// Lexes and parses `expression`, returning the tokens in RPN order.
    ///
    /// # Errors
    /// See [`Evaluator::tokenize`]; syntax errors are reported as well.
    pub fn rpn(&self, expression: &str, parameters: &[&str]) -> CompileResult<Vec<TokenInfo>> {
        let parameters = self.grammar.bind_parameters(parameters)?;
        let lexer = Lexer::new(&self.grammar, &parameters, expression, self.allow_unknown);
        Ok(ShuntingYard::new(expression, lexer).map(|token| token.map(|t| info(expression, &t)))
                                               .collect::<Result<_, _>>()?)
    }

    /// Operator spellings the grammar recognizes, punctuation included.
    #[must_use]
    pub const fn operator_names(&self) -> &BTreeSet<String> {
        self.grammar.operator_names()
    }

    /// Built-in and extension identifiers the grammar recognizes.
    #[must_use]
    pub const fn identifier_names(&self) -> &BTreeSet<String> {
        self.grammar.identifier_names()
    }
}

impl<T> fmt::Debug for Evaluator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Evaluator")
         .field("grammar", &self.grammar)
         .field("allow_unknown", &self.allow_unknown)
         .field("optimize", &self.optimize)
         .finish()
    }
}

fn info<T: Numeric>(expression: &str, token: &Token<T>) -> TokenInfo {
    TokenInfo { class: token.class(),
                start: token.span.start,
                end:   token.span.end,
                text:  token.span.slice(expression).to_string(), }
}

/// A compiled, reusable expression.
///
/// Holds the final node graph and the closures compiled from it. It is
/// immutable, `Send` and `Sync`.
#[derive(Clone)]
pub struct CompiledExpression<T> {
    expression: String,
    parameters: Vec<String>,
    node:       NodeRef<T>,
    program:    Program<T>,
    stats:      Option<OptimizeStats>,
}

impl<T: Numeric> CompiledExpression<T> {
    /// Evaluates the expression.
    ///
    /// # Parameters
    /// - `inputs`: One value per declared parameter, in declaration order.
    ///
    /// # Errors
    /// - [`EvalError::InputCount`] if `inputs` has the wrong length.
    /// - Any error raised by `T`'s arithmetic or by an extension, located at
    ///   the operator or call that raised it.
    pub fn call(&self, inputs: &[T]) -> EvalResult<T> {
        if inputs.len() != self.parameters.len() {
            return Err(EvalError::InputCount { expected: self.parameters.len(),
                                               found:    inputs.len(), });
        }
        (self.program)(inputs)
    }

    /// The source text.
    #[must_use]
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// The declared parameter names, in input order.
    #[must_use]
    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    /// The root of the compiled node graph.
    #[must_use]
    pub const fn node(&self) -> &NodeRef<T> {
        &self.node
    }

    /// What the optimizer did, if it ran.
    #[must_use]
    pub const fn stats(&self) -> Option<OptimizeStats> {
        self.stats
    }

    /// The node graph as infix text.
    #[must_use]
    pub fn render(&self) -> String {
        self.node.render(&self.parameters)
    }
}

impl<T: Numeric> fmt::Debug for CompiledExpression<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledExpression")
         .field("expression", &self.expression)
         .field("parameters", &self.parameters)
         .field("node", &self.node)
         .finish_non_exhaustive()
    }
}
