//! The escape hatch, exercised the way a migration runner would use it.

#![cfg(all(feature = "legacy-conversions", feature = "sqlite"))]

use safesql::legacy_conversions::riskily_assume_trusted_sql;
use safesql::{authorizer_fn, check_capability, sql, Ctx, Db, RequestMeta, SqliteDriver};

const MIGRATIONS: [&str; 2] = [
    "CREATE TABLE notes(id INTEGER PRIMARY KEY AUTOINCREMENT, title TEXT, content TEXT)",
    "CREATE INDEX notes_title ON notes(title)",
];

fn migrator() -> Ctx {
    let (ctx, ok) = check_capability(
        &Ctx::new(RequestMeta::new("migrate").with_principal("svc-migrate", "Migrations")),
        &authorizer_fn(|principal, _| principal.is_some_and(|p| p.id.starts_with("svc-"))),
        "write",
    );
    assert!(ok);
    ctx
}

#[test]
fn runtime_statements_run_once_trusted() {
    let db = Db::<SqliteDriver>::open(":memory:").unwrap();
    let ctx = migrator();

    for migration in MIGRATIONS.iter().map(|m| m.to_string()) {
        db.execute(&ctx, &riskily_assume_trusted_sql(migration), &[])
            .unwrap();
    }

    let rows = db
        .query(
            &ctx,
            &sql!("SELECT name FROM sqlite_master WHERE type = 'index' AND name = 'notes_title'"),
            &[],
        )
        .unwrap();
    assert_eq!(rows.len(), 1);
}

#[test]
fn escape_hatch_does_not_skip_authorization() {
    let db = Db::<SqliteDriver>::open(":memory:").unwrap();
    let unchecked = Ctx::new(RequestMeta::new("migrate"));

    let err = db
        .execute(&unchecked, &riskily_assume_trusted_sql(MIGRATIONS[0]), &[])
        .unwrap_err();

    assert!(err.is_unauthorized());
}
