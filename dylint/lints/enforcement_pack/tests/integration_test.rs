//! Integration tests for enforcement_pack lints.
//!
//! These tests run `cargo dylint` on the safesql crate and on the
//! `ui-tests/bypass` crate, and verify the output. This approach tests the
//! lints as they're actually used in practice.

use std::process::Command;

fn cargo_dylint(args: &[&str]) -> std::process::Output {
    Command::new("cargo")
        .arg("dylint")
        .args(args)
        .current_dir(concat!(env!("CARGO_MANIFEST_DIR"), "/../../.."))
        .output()
        .expect("Failed to run cargo dylint")
}

#[test]
fn test_safesql_passes_its_own_lints() {
    let output = cargo_dylint(&["--lib", "enforcement_pack", "--", "--manifest-path", "Cargo.toml"]);

    let stderr = String::from_utf8_lossy(&output.stderr);

    // Library code reaches `__private` only through macro expansion
    assert!(
        output.status.success(),
        "dylint should pass on main codebase, got: {}",
        stderr
    );
    assert!(
        !stderr.contains("raw_literal_construction"),
        "macro expansion must not be reported, got: {}",
        stderr
    );
}

#[test]
fn test_bypass_crate_is_rejected() {
    let manifest = concat!(env!("CARGO_MANIFEST_DIR"), "/ui-tests/bypass/Cargo.toml");
    let output = cargo_dylint(&["--lib", "enforcement_pack", "--", "--manifest-path", manifest]);

    let stderr = String::from_utf8_lossy(&output.stderr);

    // RAW_LITERAL_CONSTRUCTION is deny-level, so the check fails
    assert!(!output.status.success(), "bypass crate should not pass, got: {}", stderr);

    for line in [
        // imports that leave a bare `fixed_literal` at the call site
        "use safesql::__private::fixed_literal;",
        "use safesql::__private as hidden;",
        // fully qualified call
        "TrustedSql::from_literal(safesql::__private::fixed_literal(text))",
        // escape hatch call
        "riskily_assume_trusted_sql(std::fs::read_to_string(path)",
        "dbg!(params);",
    ] {
        assert!(stderr.contains(line), "expected a diagnostic at `{}`, got: {}", line, stderr);
    }

    for lint in ["raw_literal_construction", "risky_trusted_sql", "no_println"] {
        assert!(stderr.contains(lint), "{} should fire, got: {}", lint, stderr);
    }

    // `sql!` expands to the `__private` path but is never reported
    assert!(
        !stderr.contains("sql!(\"SELECT * FROM notes WHERE id = ?\")"),
        "macro expansion must not be reported, got: {}",
        stderr
    );
}

#[test]
fn test_lints_are_registered() {
    let output = cargo_dylint(&["list", "--lib", "enforcement_pack"]);

    let stdout = String::from_utf8_lossy(&output.stdout);

    for lint in [
        "enforcement_pack::raw_literal_construction",
        "enforcement_pack::risky_trusted_sql",
        "enforcement_pack::no_println",
    ] {
        assert!(stdout.contains(lint), "{} should be registered", lint);
    }
    assert!(
        stdout.contains("deny"),
        "raw_literal_construction should be at deny level"
    );
    assert!(
        stdout.contains("warn"),
        "risky_trusted_sql should be at warn level"
    );
}
