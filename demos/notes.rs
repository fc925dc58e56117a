//! Notes store demonstration.
//!
//! This example walks through the request flow of a small notes application:
//! 1. Check a capability and get a granted context
//! 2. Run statements built with `sql!` and bound parameters
//! 3. Watch an unchecked delete get refused
//! 4. Cancel a request before it reaches the database
//!
//! Run with: `cargo run --example notes`

use safesql::{
    authorizer_fn, capabilities, check_capability, params, sql, Authorizer, Ctx, Db,
    RequestMeta, SqliteDriver, SqliteError,
};

fn main() -> Result<(), safesql::Error<SqliteError>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    println!("=== Notes Store Example ===\n");

    let db = Db::<SqliteDriver>::open(":memory:").map_err(safesql::Error::Driver)?;
    let authorizer = authorizer_fn(|principal, capability| match principal.map(|p| p.id.as_str()) {
        Some("alice") => true,
        Some("bob") => capability == capabilities::READ,
        _ => false,
    });

    // Scenario 1: Authorized writes
    println!("--- Scenario 1: Authorized Write ---");
    let ctx = checked(&authorizer, "alice", capabilities::WRITE);
    db.execute(
        &ctx,
        &sql!("CREATE TABLE notes(id INTEGER PRIMARY KEY AUTOINCREMENT, title TEXT, content TEXT)"),
        &[],
    )?;
    let inserted = db.execute(
        &ctx,
        &sql!("INSERT INTO notes(title, content) VALUES(?,?)"),
        &params!["Salutations", "Hello, World!"],
    )?;
    println!("✓ Inserted note {:?}", inserted.last_insert_id);

    // Scenario 2: Hostile input is bound, not spliced
    println!("\n--- Scenario 2: Hostile Input ---");
    let hostile = "'); DROP TABLE notes; --";
    db.execute(
        &ctx,
        &sql!("INSERT INTO notes(title, content) VALUES(?,?)"),
        &params![hostile, "body"],
    )?;
    println!("✓ Stored {:?} as data", hostile);

    // Scenario 3: Reads
    println!("\n--- Scenario 3: Read ---");
    let ctx = checked(&authorizer, "bob", capabilities::READ);
    let rows = db.query(&ctx, &sql!("SELECT id, title FROM notes ORDER BY id"), &[])?;
    for row in &rows {
        let id: i64 = row.get(0).unwrap_or_default();
        let title: String = row.get(1).unwrap_or_default();
        println!("  {} | {}", id, title);
    }

    // Scenario 4: Delete without a check
    println!("\n--- Scenario 4: Unchecked Delete ---");
    let unchecked = Ctx::new(RequestMeta::new("req-bob-delete").with_principal("bob", "Bob"));
    match db.execute(&unchecked, &sql!("DELETE FROM notes WHERE id = ?"), &params![1]) {
        Ok(_) => println!("✗ Delete ran without a check"),
        Err(e) => println!("✓ Refused: {}", e),
    }

    // Scenario 5: Denied capability
    println!("\n--- Scenario 5: Denied Delete ---");
    let (ctx, ok) = check_capability(&unchecked, &authorizer, capabilities::DELETE);
    println!("Authorizer said: {}", ok);
    match db.execute(&ctx, &sql!("DELETE FROM notes WHERE id = ?"), &params![1]) {
        Ok(_) => println!("✗ Delete ran after denial"),
        Err(e) => println!("✓ Refused: {}", e),
    }

    // Scenario 6: Malformed id from a form
    println!("\n--- Scenario 6: Malformed Id ---");
    match "1 OR 1=1".parse::<i64>() {
        Ok(id) => println!("✗ Parsed {}", id),
        Err(e) => println!("✓ Rejected before any statement: {}", e),
    }

    // Scenario 7: Cancelled request
    println!("\n--- Scenario 7: Cancelled Request ---");
    let ctx = checked(&authorizer, "alice", capabilities::READ);
    ctx.cancellation().token().cancel();
    match db.query(&ctx, &sql!("SELECT * FROM notes"), &[]) {
        Ok(_) => println!("✗ Query ran after cancellation"),
        Err(e) => println!("✓ Driver reported: {}", e),
    }

    let ctx = checked(&authorizer, "alice", capabilities::READ);
    let count: i64 = db
        .query(&ctx, &sql!("SELECT count(*) FROM notes"), &[])?
        .first()
        .and_then(|row| row.get(0).ok())
        .unwrap_or_default();
    println!("\n=== {} notes remain ===", count);

    Ok(())
}

fn checked(authorizer: &impl Authorizer, user: &str, capability: &str) -> Ctx {
    let meta = RequestMeta::new(format!("req-{}-{}", user, capability)).with_principal(user, user);
    let request = Ctx::new(meta);
    let (ctx, ok) = check_capability(&request, authorizer, capability);
    println!("{} granted {}: {}", user, capability, ok);
    ctx
}
