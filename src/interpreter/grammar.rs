use std::{
    collections::{BTreeSet, HashMap, HashSet},
    fmt,
    sync::Arc,
};

use log::debug;

use crate::{
    ast::{BinaryOperator, Conversion, UnaryOperator},
    error::GrammarError,
    interpreter::{
        token::{Action, Template, TokenClass},
        value::{
            core::{LiteralContext, Numeric},
            flags::TypeFlags,
        },
    },
    util::chars::{case_variants, is_identifier_continue, is_identifier_start, match_at},
};

/// Reads a literal at an offset of the source text.
///
/// Returns the value and the offset just past it, `None` if no literal starts
/// there, or a message if a literal starts there but cannot be represented.
pub type ValueReader<T> =
    Arc<dyn Fn(&str, usize, &LiteralContext) -> Result<Option<(T, usize)>, String> + Send + Sync>;

/// The value-reader of `T` itself.
#[must_use]
pub fn default_reader<T: Numeric>() -> ValueReader<T> {
    Arc::new(|text: &str, offset: usize, context: &LiteralContext| T::read_literal(text, offset, context))
}

type Dispatch<T> = HashMap<char, Vec<Arc<Template<T>>>>;

/// Precedence of unary `+ - ~ !`.
pub const UNARY_PRECEDENCE: u8 = 40;

/// The operators and identifiers an evaluator recognizes.
///
/// Names are looked up through maps keyed by their leading character.
/// Case-insensitive grammars key each name under both letter cases of that
/// character. A grammar is immutable once the evaluator owning it is built.
pub struct Grammar<T> {
    flags:            TypeFlags,
    operators:        Dispatch<T>,
    identifiers:      Dispatch<T>,
    reserved:         HashSet<String>,
    operator_names:   BTreeSet<String>,
    identifier_names: BTreeSet<String>,
    whitespace:       Vec<char>,
    reader:           ValueReader<T>,
}

impl<T: Numeric> Grammar<T> {
    /// Builds the grammar selected by `flags`.
    ///
    /// # Errors
    /// - [`GrammarError::ConflictingFlags`] if both `DECIMAL` and `INTEGER`
    ///   are set.
    /// - [`GrammarError::UnsupportedFlags`] if `T` cannot honor a flag.
    pub fn new(flags: TypeFlags, reader: ValueReader<T>, whitespace: Vec<char>) -> Result<Self, GrammarError> {
        if flags.contains(TypeFlags::DECIMAL | TypeFlags::INTEGER) {
            return Err(GrammarError::ConflictingFlags { flags });
        }
        let requested = flags.difference(TypeFlags::CASE_SENSITIVE);
        if !T::SUPPORTED.contains(requested) {
            return Err(GrammarError::UnsupportedFlags { type_name: T::NAME,
                                                        requested,
                                                        supported: T::SUPPORTED, });
        }

        let mut grammar = Self { flags,
                                 operators: HashMap::new(),
                                 identifiers: HashMap::new(),
                                 reserved: HashSet::new(),
                                 operator_names: BTreeSet::new(),
                                 identifier_names: BTreeSet::new(),
                                 whitespace,
                                 reader };

        grammar.register_punctuation()?;
        if flags.contains(TypeFlags::NUMERIC) {
            grammar.register_numeric()?;
        }
        if flags.contains(TypeFlags::DECIMAL) {
            grammar.register_decimal()?;
        }
        if flags.contains(TypeFlags::INTEGER) {
            grammar.register_integer()?;
        }
        grammar.register_intrinsics()?;

        debug!("built {} grammar with flags {flags}: {} operators, {} identifiers",
               T::NAME,
               grammar.operator_names.len(),
               grammar.identifier_names.len());
        Ok(grammar)
    }

    fn register_punctuation(&mut self) -> Result<(), GrammarError> {
        self.register_operator(Template::punctuation("(", TokenClass::OpenParen))?;
        self.register_operator(Template::punctuation(")", TokenClass::CloseParen))?;
        self.register_operator(Template::punctuation(",", TokenClass::ArgSeparator))
    }

    fn register_numeric(&mut self) -> Result<(), GrammarError> {
        let plus = Template::prefix("+", Action::Convert(Conversion::Identity), UNARY_PRECEDENCE);
        let minus = Template::prefix("-", Action::Unary(UnaryOperator::Negate), UNARY_PRECEDENCE);

        self.register_operator(Template::binary("+", BinaryOperator::Add, 10, false, Some(plus)))?;
        self.register_operator(Template::binary("-", BinaryOperator::Sub, 10, false, Some(minus)))?;
        self.register_operator(Template::binary("*", BinaryOperator::Mul, 20, false, None))?;
        self.register_operator(Template::binary("/", BinaryOperator::Div, 20, false, None))?;
        self.register_operator(Template::binary("%", BinaryOperator::Rem, 20, false, None))
    }

    fn register_decimal(&mut self) -> Result<(), GrammarError> {
        self.register_operator(Template::binary("^", BinaryOperator::Pow, 30, true, None))?;
        self.register_operator(Template::binary("<<", BinaryOperator::Shl, 5, false, None))?;
        self.register_operator(Template::binary(">>", BinaryOperator::Shr, 5, false, None))
    }

    fn register_integer(&mut self) -> Result<(), GrammarError> {
        self.register_operator(Template::binary("<<", BinaryOperator::Shl, 5, false, None))?;
        self.register_operator(Template::binary(">>", BinaryOperator::Shr, 5, false, None))?;
        self.register_operator(Template::binary("|", BinaryOperator::BitOr, 1, false, None))?;
        self.register_operator(Template::binary("&", BinaryOperator::BitAnd, 1, false, None))?;
        self.register_operator(Template::binary("^", BinaryOperator::BitXor, 1, false, None))?;
        self.register_operator(Template::prefix("~", Action::Unary(UnaryOperator::Not), UNARY_PRECEDENCE))?;
        self.register_operator(Template::prefix("!", Action::Unary(UnaryOperator::Not), UNARY_PRECEDENCE))
    }

    fn register_intrinsics(&mut self) -> Result<(), GrammarError> {
        self.register_identifier(Template::function("if", Action::Conditional))?;
        self.register_identifier(Template::function("trunc", Action::Convert(Conversion::Integral)))
    }

    #[must_use]
    pub const fn flags(&self) -> TypeFlags {
        self.flags
    }

    #[must_use]
    pub const fn case_sensitive(&self) -> bool {
        self.flags.contains(TypeFlags::CASE_SENSITIVE)
    }

    /// The key a name is reserved under; folded to lower case unless the
    /// grammar is case-sensitive.
    fn key(&self, name: &str) -> String {
        if self.case_sensitive() {
            name.to_string()
        } else {
            name.to_lowercase()
        }
    }

    /// Returns `true` if `name` is already registered as an operator or an
    /// identifier.
    #[must_use]
    pub fn is_reserved(&self, name: &str) -> bool {
        self.reserved.contains(&self.key(name))
    }

    fn reserve(&mut self, name: &str) -> Result<(), GrammarError> {
        if !self.reserved.insert(self.key(name)) {
            return Err(GrammarError::DuplicateName { name: name.to_string() });
        }
        Ok(())
    }

    fn dispatch_keys(&self, name: &str) -> Vec<char> {
        let Some(first) = name.chars().next() else {
            return Vec::new();
        };
        if self.case_sensitive() {
            vec![first]
        } else {
            case_variants(first)
        }
    }

    /// Registers an operator or punctuation template.
    ///
    /// # Errors
    /// [`GrammarError::DuplicateName`] if the name is already registered.
    pub fn register_operator(&mut self, template: Arc<Template<T>>) -> Result<(), GrammarError> {
        self.reserve(&template.name)?;
        for key in self.dispatch_keys(&template.name) {
            self.operators.entry(key).or_default().push(template.clone());
        }
        self.operator_names.insert(template.name.clone());
        Ok(())
    }

    /// Registers a named function, constant, constructor or member.
    ///
    /// # Errors
    /// - [`GrammarError::InvalidName`] if the name is not made of
    ///   `.`-separated identifiers.
    /// - [`GrammarError::DuplicateName`] if the name is already registered.
    pub fn register_identifier(&mut self, template: Arc<Template<T>>) -> Result<(), GrammarError> {
        if !is_qualified_name(&template.name) {
            return Err(GrammarError::InvalidName { name: template.name.clone() });
        }
        self.reserve(&template.name)?;
        for key in self.dispatch_keys(&template.name) {
            self.identifiers.entry(key).or_default().push(template.clone());
        }
        self.identifier_names.insert(template.name.clone());
        Ok(())
    }

    /// Matches the longest operator starting at `at`.
    ///
    /// A shorter operator never matches where a longer registered one does,
    /// so `<<` is never read as two `<`.
    #[must_use]
    pub fn match_operator(&self, source: &str, at: usize) -> Option<(Arc<Template<T>>, usize)> {
        let first = source[at..].chars().next()?;
        let case_sensitive = self.case_sensitive();
        self.operators
            .get(&first)?
            .iter()
            .filter_map(|t| match_at(source, at, &t.name, case_sensitive).map(|end| (t.clone(), end)))
            .max_by_key(|(_, end)| *end)
    }

    /// Matches a built-in or extension identifier starting at `at`.
    ///
    /// The match must not be followed by an identifier character, so `pi2`
    /// does not match `pi`.
    #[must_use]
    pub fn match_identifier(&self, source: &str, at: usize) -> Option<(Arc<Template<T>>, usize)> {
        let first = source[at..].chars().next()?;
        let case_sensitive = self.case_sensitive();
        self.identifiers
            .get(&first)?
            .iter()
            .filter_map(|t| {
                match_at(source, at, &t.name, case_sensitive).filter(|&end| ends_word(source, end))
                                                             .map(|end| (t.clone(), end))
            })
            .max_by_key(|(_, end)| *end)
    }

    /// Returns `true` if the lexer skips `c`.
    #[must_use]
    pub fn is_whitespace(&self, c: char) -> bool {
        c.is_whitespace() || self.whitespace.contains(&c)
    }

    /// Runs the value-reader at `offset`.
    pub fn read_value(&self, source: &str, offset: usize) -> Result<Option<(T, usize)>, String> {
        let context = LiteralContext { flags: self.flags };
        (self.reader)(source, offset, &context)
    }

    /// Registered operator spellings, including punctuation.
    #[must_use]
    pub const fn operator_names(&self) -> &BTreeSet<String> {
        &self.operator_names
    }

    /// Registered identifier names, including extension names.
    #[must_use]
    pub const fn identifier_names(&self) -> &BTreeSet<String> {
        &self.identifier_names
    }

    /// Validates the free parameters of one compilation and binds each to
    /// its input slot.
    ///
    /// # Errors
    /// - [`GrammarError::InvalidName`] if a name is not an identifier.
    /// - [`GrammarError::ReservedName`] if a name is already registered.
    /// - [`GrammarError::DuplicateParameter`] if a name appears twice.
    pub fn bind_parameters(&self, names: &[&str]) -> Result<Parameters, GrammarError> {
        let mut seen = HashSet::new();
        for name in names {
            if !is_identifier(name) {
                return Err(GrammarError::InvalidName { name: (*name).to_string() });
            }
            if self.is_reserved(name) {
                return Err(GrammarError::ReservedName { name: (*name).to_string() });
            }
            if !seen.insert(self.key(name)) {
                return Err(GrammarError::DuplicateParameter { name: (*name).to_string() });
            }
        }
        Ok(Parameters { names:          names.iter().map(|n| (*n).to_string()).collect(),
                        case_sensitive: self.case_sensitive(), })
    }
}

impl<T> fmt::Debug for Grammar<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grammar")
         .field("flags", &self.flags)
         .field("operators", &self.operator_names)
         .field("identifiers", &self.identifier_names)
         .finish_non_exhaustive()
    }
}

/// The declared free parameters of one compilation, in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameters {
    names:          Vec<String>,
    case_sensitive: bool,
}

impl Parameters {
    /// Matches a parameter name starting at `at`.
    ///
    /// # Returns
    /// The parameter's input slot and the offset just past its name.
    #[must_use]
    pub fn match_at(&self, source: &str, at: usize) -> Option<(usize, usize)> {
        self.names
            .iter()
            .enumerate()
            .filter_map(|(index, name)| {
                match_at(source, at, name, self.case_sensitive).filter(|&end| ends_word(source, end))
                                                               .map(|end| (index, end))
            })
            .max_by_key(|(_, end)| *end)
    }

    pub(crate) fn into_names(self) -> Vec<String> {
        self.names
    }
}

fn ends_word(source: &str, end: usize) -> bool {
    source[end..].chars().next().is_none_or(|c| !is_identifier_continue(c))
}

/// Returns `true` if `name` is a plain identifier.
#[must_use]
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(is_identifier_start) && chars.all(is_identifier_continue)
}

/// Returns `true` if `name` is one or more identifiers joined by `.`, as in
/// `Math.Pi`.
#[must_use]
pub fn is_qualified_name(name: &str) -> bool {
    name.split('.').all(is_identifier)
}
