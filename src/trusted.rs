use std::borrow::Cow;
use std::fmt;

#[cfg(feature = "legacy-conversions")]
pub mod legacy_conversions;

/// A string that was written as a literal in the program source.
///
/// `FixedLiteral` has no public constructor. It is produced by the
/// [`literal!`](crate::literal) macro, which only accepts a single string
/// literal token. It exists so that [`TrustedSql::from_literal`] can state
/// its requirement in its signature.
///
/// # Examples
///
/// ```
/// use safesql::{literal, FixedLiteral, TrustedSql};
///
/// const SELECT_NOTES: FixedLiteral = literal!("SELECT * FROM notes");
/// let query = TrustedSql::from_literal(SELECT_NOTES);
/// assert_eq!(query.len(), 19);
/// ```
///
/// Runtime strings are rejected when the program is compiled:
///
/// ```compile_fail
/// use safesql::literal;
///
/// let table = String::from("notes");
/// let text = format!("SELECT * FROM {}", table);
/// let lit = literal!(text); // Error: expected a literal
/// ```
///
/// ```compile_fail
/// use safesql::FixedLiteral;
///
/// let lit = FixedLiteral("SELECT 1"); // Error: field is private
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FixedLiteral(&'static str);

impl FixedLiteral {
    // Only reachable through `__private::fixed_literal`, which only the macros call.
    pub(crate) const fn from_macro(text: &'static str) -> Self {
        Self(text)
    }
}

/// SQL statement text that is safe to hand to the database verbatim.
///
/// Every `TrustedSql` value holds text that came from one of:
/// - a [`FixedLiteral`] (via [`sql!`](crate::sql) or [`TrustedSql::from_literal`])
/// - an integer formatted as decimal digits ([`TrustedSql::from_int`])
/// - the `legacy_conversions` escape hatch, when that feature is enabled
///
/// The text is never validated; trust comes entirely from how the value was
/// built. There is no accessor returning the text as a `&str` or `String`,
/// and no `Display`, `Deref`, `AsRef` or `From` conversion. Only [`Db`](crate::Db)
/// reads it.
///
/// # Examples
///
/// ```
/// use safesql::{sql, TrustedSql};
///
/// let query = sql!("SELECT * FROM notes WHERE id = ?");
/// let limit = TrustedSql::from_int(10);
/// # let _ = (query, limit);
/// ```
///
/// Direct construction does not compile:
///
/// ```compile_fail
/// use safesql::TrustedSql;
///
/// let forged = TrustedSql { text: "DROP TABLE notes".into() }; // Error: private field
/// ```
///
/// ```compile_fail
/// use safesql::TrustedSql;
///
/// let user_input = String::from("1; DROP TABLE notes");
/// let forged: TrustedSql = user_input.into(); // Error: no From<String>
/// ```
// BREAKING CHANGE WARNING: `text` MUST stay private to this module.
// Making it visible lets any caller splice runtime strings into statements (CWE-89).
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct TrustedSql {
    text: Cow<'static, str>,
}

impl TrustedSql {
    /// Wraps a program literal as trusted SQL.
    pub const fn from_literal(text: FixedLiteral) -> Self {
        Self {
            text: Cow::Borrowed(text.0),
        }
    }

    /// Formats an integer as a decimal numeral.
    ///
    /// The output contains only ASCII digits and, for negative values, a
    /// single leading `-`. It can be spliced into SQL as a numeric literal.
    ///
    /// # Examples
    ///
    /// ```
    /// use safesql::TrustedSql;
    ///
    /// let a = TrustedSql::from_int(-42i32);
    /// let b = TrustedSql::from_int(42u8);
    /// assert_ne!(a, b);
    /// ```
    pub fn from_int<I: SqlInteger>(value: I) -> Self {
        Self {
            text: Cow::Owned(value.to_decimal()),
        }
    }

    /// Returns the length of the statement text in bytes.
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Returns `true` if the statement text is empty.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Statement text for the execution wrapper.
    ///
    /// BREAKING CHANGE WARNING: Do NOT make this `pub`. Exposing the text lets
    /// callers build new statements from trusted fragments plus runtime data.
    pub(crate) fn as_sql(&self) -> &str {
        &self.text
    }
}

impl fmt::Debug for TrustedSql {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TrustedSql").field(&self.text).finish()
    }
}

mod sealed {
    pub trait Sealed {}
}

/// Primitive integers accepted by [`TrustedSql::from_int`].
///
/// This trait is sealed: only the built-in integer types implement it.
pub trait SqlInteger: sealed::Sealed + Copy {
    #[doc(hidden)]
    fn to_decimal(self) -> String;
}

macro_rules! impl_sql_integer {
    ($($ty:ty),* $(,)?) => {
        $(
            impl sealed::Sealed for $ty {}

            impl SqlInteger for $ty {
                fn to_decimal(self) -> String {
                    // Integer `Display` is plain decimal: no grouping, no `+`.
                    self.to_string()
                }
            }
        )*
    };
}

impl_sql_integer!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

/// Builds a [`FixedLiteral`] from a string literal.
///
/// Only a single string literal token is accepted:
///
/// ```
/// use safesql::literal;
///
/// let lit = literal!("SELECT 1");
/// # let _ = lit;
/// ```
///
/// ```compile_fail
/// use safesql::literal;
///
/// let lit = literal!(42); // Error: mismatched types, expected `&str`
/// ```
#[macro_export]
macro_rules! literal {
    ($text:literal) => {{
        const TEXT: &'static str = $text;
        $crate::__private::fixed_literal(TEXT)
    }};
}

/// Builds a [`TrustedSql`] from a string literal.
///
/// Shorthand for `TrustedSql::from_literal(literal!("..."))`.
///
/// ```
/// use safesql::sql;
///
/// let query = sql!("DELETE FROM notes WHERE id = ?");
/// # let _ = query;
/// ```
///
/// Runtime strings do not compile:
///
/// ```compile_fail
/// use safesql::sql;
///
/// let id = "1 OR 1=1";
/// let query = sql!(concat!("DELETE FROM notes WHERE id = ", id)); // Error
/// ```
#[macro_export]
macro_rules! sql {
    ($text:literal) => {
        $crate::TrustedSql::from_literal($crate::literal!($text))
    };
}
