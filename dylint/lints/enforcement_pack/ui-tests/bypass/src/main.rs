// Test cases for RAW_LITERAL_CONSTRUCTION, RISKY_TRUSTED_SQL and NO_PRINTLN

use safesql::__private::fixed_literal;
use safesql::__private as hidden;
use safesql::legacy_conversions::riskily_assume_trusted_sql;
use safesql::{sql, TrustedSql};

fn bad_private_path(user_input: String) -> TrustedSql {
    let text: &'static str = Box::leak(user_input.into_boxed_str());
    TrustedSql::from_literal(safesql::__private::fixed_literal(text))
}

fn bad_imported_constructor(user_input: String) -> TrustedSql {
    TrustedSql::from_literal(fixed_literal(Box::leak(user_input.into_boxed_str())))
}

fn bad_renamed_module(user_input: String) -> TrustedSql {
    TrustedSql::from_literal(hidden::fixed_literal(Box::leak(user_input.into_boxed_str())))
}

fn risky_migration(path: &str) -> TrustedSql {
    riskily_assume_trusted_sql(std::fs::read_to_string(path).unwrap_or_default())
}

fn bad_dbg() {
    let params = safesql::params!["Salutations"];
    dbg!(params);
}

// Good: the macro expansion is not reported
fn good_macro() -> TrustedSql {
    sql!("SELECT * FROM notes WHERE id = ?")
}

fn main() {
    let _ = bad_private_path("1 OR 1=1".to_string());
    let _ = bad_imported_constructor("SELECT 1; -- injected".to_string());
    let _ = bad_renamed_module("SELECT 2".to_string());
    let _ = risky_migration("/nonexistent/001_init.sql");
    bad_dbg();
    let _ = good_macro();
}
