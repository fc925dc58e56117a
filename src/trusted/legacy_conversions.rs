//! Conversions that bypass the literal-only guarantee of [`TrustedSql`].
//!
//! This module only exists when the `legacy-conversions` cargo feature is
//! enabled. Enabling it is the explicit trust decision: it shows up in the
//! dependent crate's `Cargo.toml`, and every call site names
//! [`riskily_assume_trusted_sql`], which the `enforcement_pack` dylint library
//! reports.
//!
//! Intended for migrations, schema tooling, and statements loaded from files
//! shipped alongside the program. Never pass request data through here.
//!
//! ```toml
//! [dependencies]
//! safesql = { version = "0.1", features = ["legacy-conversions"] }
//! ```

use std::borrow::Cow;
use std::panic::Location;

use super::TrustedSql;

/// Treats an arbitrary runtime string as trusted SQL.
///
/// No validation is performed. The caller vouches that `text` contains no
/// attacker-controlled content.
///
/// # Examples
///
/// ```
/// use safesql::legacy_conversions::riskily_assume_trusted_sql;
///
/// let migration = std::fs::read_to_string("/nonexistent/001_init.sql")
///     .unwrap_or_else(|_| "CREATE TABLE t(id INTEGER)".to_string());
/// let statement = riskily_assume_trusted_sql(migration);
/// assert!(!statement.is_empty());
/// ```
#[track_caller]
pub fn riskily_assume_trusted_sql(text: impl Into<String>) -> TrustedSql {
    let caller = Location::caller();
    tracing::debug!(
        file = caller.file(),
        line = caller.line(),
        "assuming runtime string is trusted SQL"
    );

    TrustedSql {
        text: Cow::Owned(text.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runtime_string_is_kept_verbatim() {
        let table = "notes";
        let statement = riskily_assume_trusted_sql(format!("SELECT count(*) FROM {}", table));

        assert_eq!(statement.as_sql(), "SELECT count(*) FROM notes");
    }

    #[test]
    fn matches_literal_with_same_text() {
        let risky = riskily_assume_trusted_sql("SELECT 1");
        let literal = crate::sql!("SELECT 1");

        assert_eq!(risky, literal);
    }
}
