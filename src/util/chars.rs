/// Returns `true` if `c` may begin an identifier.
#[must_use]
pub fn is_identifier_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

/// Returns `true` if `c` may continue an identifier.
///
/// A name match followed by such a character is not maximal, so `xy` never
/// lexes as the parameter `x` followed by something else.
#[must_use]
pub fn is_identifier_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Returns `true` if `c` belongs to a run of operator-like characters.
///
/// Used only to size the span of an unknown-operator error, so grouping
/// characters are excluded and a stray `)` is never swallowed into it.
#[must_use]
pub fn is_operator_continue(c: char) -> bool {
    !c.is_whitespace() && !is_identifier_continue(c) && !matches!(c, '(' | ')' | ',')
}

/// Compares two characters, folding case when `case_sensitive` is false.
#[must_use]
pub fn chars_equal(a: char, b: char, case_sensitive: bool) -> bool {
    a == b || (!case_sensitive && a.to_lowercase().eq(b.to_lowercase()))
}

/// Tries to match `name` at byte offset `at` of `text`.
///
/// # Returns
/// The byte offset just past the match, or `None` if `text` does not spell
/// `name` at `at`.
///
/// # Example
/// ```
/// use exprc::util::chars::match_at;
///
/// assert_eq!(match_at("2*PI", 2, "pi", false), Some(4));
/// assert_eq!(match_at("2*PI", 2, "pi", true), None);
/// ```
#[must_use]
pub fn match_at(text: &str, at: usize, name: &str, case_sensitive: bool) -> Option<usize> {
    let rest = text.get(at..)?;
    let mut source = rest.char_indices();
    for expected in name.chars() {
        let (_, found) = source.next()?;
        if !chars_equal(found, expected, case_sensitive) {
            return None;
        }
    }
    Some(source.next().map_or(text.len(), |(offset, _)| at + offset))
}

/// Both letter-case variants of a leading character.
///
/// Case-insensitive grammars register a name under each of them so the
/// dispatch lookup stays a single map access.
#[must_use]
pub fn case_variants(c: char) -> Vec<char> {
    let mut variants = vec![c];
    for other in c.to_lowercase().chain(c.to_uppercase()) {
        if !variants.contains(&other) {
            variants.push(other);
        }
    }
    variants
}

/// Byte offset where the run of characters starting at `start` ends.
///
/// The character at `start` always belongs to the run; the run continues
/// while `keep` accepts the following characters.
#[must_use]
pub fn scan_run(text: &str, start: usize, keep: impl Fn(char) -> bool) -> usize {
    let mut chars = text[start..].char_indices();
    chars.next();
    chars.find(|&(_, c)| !keep(c))
         .map_or(text.len(), |(offset, _)| start + offset)
}

/// Draws `expression` followed by a caret line under `start..end`.
///
/// Offsets are byte offsets; the caret line is padded by characters so it
/// lines up for non-ASCII input.
///
/// # Example
/// ```
/// use exprc::util::chars::caret_line;
///
/// assert_eq!(caret_line("2 + foo", 4, Some(7)), "2 + foo\n    ^^^");
/// assert_eq!(caret_line("(2", 2, None), "(2\n  ^");
/// ```
#[must_use]
pub fn caret_line(expression: &str, start: usize, end: Option<usize>) -> String {
    let start = start.min(expression.len());
    let end = end.unwrap_or(start).clamp(start, expression.len());
    let pad = expression.get(..start).map_or(start, |s| s.chars().count());
    let width = expression.get(start..end).map_or(1, |s| s.chars().count()).max(1);
    format!("{expression}\n{}{}", " ".repeat(pad), "^".repeat(width))
}
