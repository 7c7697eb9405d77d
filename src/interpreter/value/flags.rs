use std::{fmt, ops::BitOr};

/// Selects which operators a grammar registers.
///
/// Flags combine with `|`:
///
/// ```
/// use exprc::TypeFlags;
///
/// let flags = TypeFlags::NUMERIC | TypeFlags::INTEGER;
/// assert!(flags.contains(TypeFlags::INTEGER));
/// assert!(!flags.contains(TypeFlags::DECIMAL));
/// assert_eq!(flags.to_string(), "NUMERIC | INTEGER");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TypeFlags(u8);

impl TypeFlags {
    /// No flags.
    pub const EMPTY: Self = Self(0);
    /// `+ - * / %` and unary `+ -`.
    pub const NUMERIC: Self = Self(1);
    /// Power `^` and algebraic shifts `<< >>`.
    pub const DECIMAL: Self = Self(1 << 1);
    /// Bit shifts, `| & ^` and one's complement `~ !`.
    pub const INTEGER: Self = Self(1 << 2);
    /// Names are matched case-sensitively.
    pub const CASE_SENSITIVE: Self = Self(1 << 3);

    const NAMES: [(Self, &'static str); 4] = [(Self::NUMERIC, "NUMERIC"),
                                              (Self::DECIMAL, "DECIMAL"),
                                              (Self::INTEGER, "INTEGER"),
                                              (Self::CASE_SENSITIVE, "CASE_SENSITIVE")];

    /// Returns `true` if every flag in `other` is set.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Flags set in either `self` or `other`.
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Flags set in `self` but not in `other`.
    #[must_use]
    pub const fn difference(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for TypeFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl fmt::Display for TypeFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "EMPTY");
        }
        let names: Vec<&str> = Self::NAMES.iter()
                                          .filter(|(flag, _)| self.contains(*flag))
                                          .map(|(_, name)| *name)
                                          .collect();
        write!(f, "{}", names.join(" | "))
    }
}
