/// Character classification and source-text helpers.
///
/// This module centralizes the rules the lexer uses to decide where
/// identifiers and operators start and stop, how names are compared in
/// case-insensitive grammars, and how an offending span is drawn under an
/// expression for diagnostics.
pub mod chars;
/// Source spans.
///
/// A span is a half-open byte range into the expression text. Tokens carry
/// one, and errors use it to point back at the offending input.
pub mod span;
