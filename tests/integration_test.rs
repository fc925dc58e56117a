use safesql::{
    authorizer_fn, check_capability, literal, sql, Ctx, FixedLiteral, RequestMeta, TrustedSql,
    ViolationKind,
};

#[test]
fn trusted_sql_only_from_literals_and_integers() {
    const BY_ID: FixedLiteral = literal!("SELECT * FROM notes WHERE id = ?");

    let a = TrustedSql::from_literal(BY_ID);
    let b = sql!("SELECT * FROM notes WHERE id = ?");
    assert_eq!(a, b);

    // Runtime strings cannot become TrustedSql.
    // Uncommenting any of these would fail to compile:
    // let user_input = String::from("1 OR 1=1");
    // let _ = sql!(user_input);
    // let _: TrustedSql = user_input.into();
    // let _ = TrustedSql { text: user_input.into() };
}

#[test]
fn debug_shows_statement_text() {
    let query = sql!("SELECT 1");

    assert_eq!(format!("{:?}", query), r#"TrustedSql("SELECT 1")"#);
    assert_eq!(format!("{:?}", TrustedSql::from_int(-5)), r#"TrustedSql("-5")"#);
}

#[test]
fn grant_cannot_be_forged() {
    // Grant has no public constructor and a private field.
    // Uncommenting this would fail to compile:
    // let fake = Grant { capabilities: vec!["delete".to_string()] };

    let ctx = Ctx::new(RequestMeta::new("req-1"));
    assert!(!ctx.is_authorized());
    assert_eq!(ctx.grant().unwrap_err().kind, ViolationKind::MissingGrant);
}

#[test]
fn authorize_reports_denied_capability() {
    let authorizer = authorizer_fn(|_, capability| capability == "read");
    let request = Ctx::new(RequestMeta::new("req-1"));

    let err = request.authorize(&authorizer, "delete").unwrap_err();

    assert_eq!(
        err.kind,
        ViolationKind::Unauthorized {
            capability: "delete".to_string()
        }
    );
    assert_eq!(err.to_string(), "Unauthorized for 'delete': capability denied by authorizer");
}

#[test]
fn check_capability_accumulates_grants() {
    let authorizer = authorizer_fn(|principal, _| principal.is_some());
    let request = Ctx::new(RequestMeta::new("req-1").with_principal("user-1", "Alice"));

    let (ctx, ok) = check_capability(&request, &authorizer, "read");
    assert!(ok);
    let (ctx, ok) = check_capability(&ctx, &authorizer, "write");
    assert!(ok);

    assert_eq!(ctx.capabilities(), ["read", "write"]);
    assert!(!request.is_authorized());
}
