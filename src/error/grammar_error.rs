use thiserror::Error;

use crate::interpreter::value::flags::TypeFlags;

/// Errors raised while building a grammar or binding parameter names.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarError {
    /// `DECIMAL` and `INTEGER` were both requested.
    #[error("type flags {flags} are mutually exclusive: DECIMAL and INTEGER cannot be combined")]
    ConflictingFlags {
        /// The requested flags.
        flags: TypeFlags,
    },
    /// The numeric type cannot honor one of the requested flags.
    #[error("{type_name} does not support type flags {requested} (supported: {supported})")]
    UnsupportedFlags {
        /// Name of the numeric type.
        type_name: &'static str,
        /// The requested flags.
        requested: TypeFlags,
        /// The flags the type supports.
        supported: TypeFlags,
    },
    /// An operator or identifier was registered twice.
    #[error("'{name}' is already registered in this grammar")]
    DuplicateName {
        /// The offending name.
        name: String,
    },
    /// A declared parameter collides with an operator or identifier.
    #[error("parameter '{name}' collides with a reserved name")]
    ReservedName {
        /// The offending name.
        name: String,
    },
    /// The same parameter was declared twice.
    #[error("parameter '{name}' is declared more than once")]
    DuplicateParameter {
        /// The offending name.
        name: String,
    },
    /// A name is not a valid identifier.
    #[error("'{name}' is not a valid identifier")]
    InvalidName {
        /// The offending name.
        name: String,
    },
}
