/// The bundled extension sets.
///
/// Ready-made function and constant sources for the bundled numeric types:
/// common helpers for any type, the `f64` math library, and exact decimal
/// helpers.
pub mod builtin;

/// Closure compilation.
///
/// Turns an immutable node graph into nested boxed closures, compiling each
/// shared node once.
pub mod compile;

/// The evaluator façade and its configuration.
///
/// Wires the grammar, the lexer, the parser, the postfix builder and the
/// optimizer together, and wraps the result in a reusable callable.
pub mod core;

/// The extension registry.
///
/// Collects named functions, constants, constructors and members from a
/// source and places them in a grammar. The first registration of a name
/// wins.
pub mod extensions;
