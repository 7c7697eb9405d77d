use logos::Logos;

/// The lexical shape of a numeric literal.
///
/// Default value-readers scan the text at the current offset with this lexer
/// and then convert the matched slice into their own numeric type.
#[derive(Logos, Debug, PartialEq, Eq, Clone, Copy)]
pub enum LiteralShape {
    /// Hexadecimal integer literal such as `0xFF`.
    #[regex(r"0[xX][0-9a-fA-F]+")]
    Hex,
    /// Real literal such as `3.14`, `.5`, `2.0` or `2.1e-10`.
    #[regex(r"[0-9]+\.[0-9]+([eE][+-]?[0-9]+)?")]
    #[regex(r"\.[0-9]+([eE][+-]?[0-9]+)?")]
    #[regex(r"[0-9]+[eE][+-]?[0-9]+")]
    Real,
    /// Decimal integer literal such as `42`.
    #[regex(r"[0-9]+")]
    Integer,
}

/// A literal found at some offset of an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScannedLiteral<'s> {
    /// What kind of literal was matched.
    pub shape: LiteralShape,
    /// The literal text.
    pub text:  &'s str,
    /// Byte offset one past the literal.
    pub end:   usize,
}

/// Scans a numeric literal starting exactly at `offset`.
///
/// # Returns
/// `None` when the text at `offset` does not begin with a literal.
///
/// # Example
/// ```
/// use exprc::interpreter::literal::{LiteralShape, scan_literal};
///
/// let lit = scan_literal("x+2.5e3*y", 2).unwrap();
/// assert_eq!(lit.shape, LiteralShape::Real);
/// assert_eq!(lit.text, "2.5e3");
/// assert_eq!(lit.end, 7);
///
/// assert!(scan_literal("x+2", 0).is_none());
/// ```
#[must_use]
pub fn scan_literal(source: &str, offset: usize) -> Option<ScannedLiteral<'_>> {
    let rest = source.get(offset..)?;
    let mut lexer = LiteralShape::lexer(rest);
    let shape = lexer.next()?.ok()?;
    let span = lexer.span();
    if span.start != 0 {
        return None;
    }
    Some(ScannedLiteral { shape,
                          text: lexer.slice(),
                          end: offset + span.end })
}
