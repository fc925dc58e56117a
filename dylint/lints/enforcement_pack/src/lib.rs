//! Enforcement pack: Custom lints for safesql invariants.
//!
//! `TrustedSql` can only be built from literals because the macros are the
//! only sanctioned route to the literal constructor. The compiler cannot stop
//! a caller from naming the hidden macro-support path directly, nor flag uses
//! of the escape hatch; these lints close that gap.
//!
//! ## Implemented Lints
//!
//! - `RAW_LITERAL_CONSTRUCTION`: Forbids naming `safesql::__private` outside
//!   of macro expansion, in expressions and in `use` items.
//! - `RISKY_TRUSTED_SQL`: Reports every call to `riskily_assume_trusted_sql`
//!   so escape-hatch uses show up in review.
//! - `NO_PRINTLN`: Forbids println!, eprintln!, and dbg! macros so library
//!   output goes through `tracing` and never echoes statement parameters.

#![feature(rustc_private)]
#![warn(unused_extern_crates)]

extern crate rustc_ast;
extern crate rustc_lint;
extern crate rustc_session;
extern crate rustc_span;

use rustc_ast::{Expr, ExprKind, Item, ItemKind, MacCall, Path, UseTree, UseTreeKind};
use rustc_lint::{EarlyContext, EarlyLintPass, LintContext};
use rustc_session::{declare_lint_pass, declare_tool_lint};
use rustc_span::Span;

declare_tool_lint! {
    /// **What it does:** Forbids naming the `__private` macro-support module
    /// of safesql by hand.
    ///
    /// **Why is this bad?** `__private::fixed_literal` accepts any
    /// `&'static str`, including leaked runtime strings. Only `sql!` and
    /// `literal!` may call it, because they accept a single literal token.
    ///
    /// **Known problems:** A caller's own macro that forwards to `__private`
    /// is expanded code and is not reported.
    ///
    /// **Example:**
    /// ```rust,ignore
    /// // Bad - bypasses the literal-only macro
    /// let text: &'static str = Box::leak(user_input.into_boxed_str());
    /// let sql = TrustedSql::from_literal(safesql::__private::fixed_literal(text));
    ///
    /// // Good
    /// let sql = sql!("SELECT * FROM notes WHERE id = ?");
    /// ```
    pub enforcement_pack::RAW_LITERAL_CONSTRUCTION,
    Deny,
    "direct use of safesql's macro-support path; use sql! or literal! instead"
}

declare_tool_lint! {
    /// **What it does:** Reports calls to
    /// `safesql::legacy_conversions::riskily_assume_trusted_sql`.
    ///
    /// **Why is this bad?** The escape hatch turns any runtime string into
    /// trusted SQL. Each call site needs a reviewer to confirm the text
    /// cannot carry request data.
    ///
    /// **Known problems:** Matches on the function name only.
    ///
    /// **Example:**
    /// ```rust,ignore
    /// // Reported
    /// let stmt = riskily_assume_trusted_sql(std::fs::read_to_string(path)?);
    /// ```
    pub enforcement_pack::RISKY_TRUSTED_SQL,
    Warn,
    "runtime string converted to TrustedSql through the escape hatch"
}

declare_tool_lint! {
    /// **What it does:** Forbids use of `println!`, `eprintln!`, and `dbg!` macros in library code.
    ///
    /// **Why is this bad?** These macros bypass structured logging:
    /// - They write directly to stdout/stderr, bypassing `tracing` subscribers
    /// - `dbg!` on a parameter list prints bound values that logs never carry
    ///
    /// **Known problems:** None.
    ///
    /// **Example:**
    /// ```rust,ignore
    /// // Bad
    /// println!("running {:?} with {:?}", sql, params);
    ///
    /// // Good
    /// tracing::debug!(params = params.len(), "forwarding to driver");
    /// ```
    pub enforcement_pack::NO_PRINTLN,
    Deny,
    "use of println!, eprintln!, or dbg! macros; use tracing instead"
}

declare_lint_pass!(SafesqlPass => [RAW_LITERAL_CONSTRUCTION, RISKY_TRUSTED_SQL, NO_PRINTLN]);

impl EarlyLintPass for SafesqlPass {
    fn check_expr(&mut self, cx: &EarlyContext<'_>, expr: &Expr) {
        match &expr.kind {
            ExprKind::Path(_, path) => check_path(cx, path, expr.span),
            ExprKind::MacCall(mac) => check_macro(cx, mac, expr.span),
            _ => {}
        }
    }

    fn check_item(&mut self, cx: &EarlyContext<'_>, item: &Item) {
        if let ItemKind::Use(tree) = &item.kind {
            if !item.span.from_expansion() {
                check_use_tree(cx, tree);
            }
        }
    }
}

// `use safesql::__private::fixed_literal;` leaves only `fixed_literal` at the
// call site, so the import itself has to be reported.
fn check_use_tree(cx: &EarlyContext<'_>, tree: &UseTree) {
    if has_private_segment(&tree.prefix) {
        report_raw_literal(cx, tree.span);
        return;
    }
    if let UseTreeKind::Nested { items, .. } = &tree.kind {
        for (nested, _) in items.iter() {
            check_use_tree(cx, nested);
        }
    }
}

fn has_private_segment(path: &Path) -> bool {
    path.segments.iter().any(|s| s.ident.name.as_str() == "__private")
}

fn report_raw_literal(cx: &EarlyContext<'_>, span: Span) {
    cx.span_lint(RAW_LITERAL_CONSTRUCTION, span, |diag| {
        diag.help("build statements with `safesql::sql!` or `safesql::literal!`");
        diag.note("`__private::fixed_literal` accepts strings that are not literals");
    });
}

fn check_path(cx: &EarlyContext<'_>, path: &Path, span: Span) {
    // `sql!` and `literal!` expand to the `__private` path; that is allowed.
    if !span.from_expansion() && has_private_segment(path) {
        report_raw_literal(cx, span);
    }

    let last = path.segments.last().map(|s| s.ident.name);
    if last.is_some_and(|n| n.as_str() == "riskily_assume_trusted_sql") {
        cx.span_lint(RISKY_TRUSTED_SQL, span, |diag| {
            diag.note("the argument is trusted without validation; it must not carry request data");
        });
    }
}

fn check_macro(cx: &EarlyContext<'_>, mac: &MacCall, span: Span) {
    let path = &mac.path;

    // Check if this is a single-segment macro call (println, eprintln, dbg)
    if path.segments.len() != 1 {
        return;
    }

    let (help, note) = match path.segments[0].ident.name.as_str() {
        "println" => ("use `tracing::info!`", "`println!` bypasses the tracing subscriber"),
        "eprintln" => ("use `tracing::error!`", "`eprintln!` bypasses the tracing subscriber"),
        "dbg" => ("use `tracing::debug!`", "`dbg!` may print bound parameter values"),
        _ => return,
    };

    cx.span_lint(NO_PRINTLN, span, |diag| {
        diag.help(help);
        diag.note(note);
    });
}

#[unsafe(no_mangle)]
#[allow(unsafe_code)]
pub extern "C" fn register_lints(_sess: &rustc_session::Session, lint_store: &mut rustc_lint::LintStore) {
    lint_store.register_lints(&[&RAW_LITERAL_CONSTRUCTION, &RISKY_TRUSTED_SQL, &NO_PRINTLN]);
    lint_store.register_early_pass(|| Box::new(SafesqlPass));
}

#[unsafe(no_mangle)]
pub fn dylint_version() -> *mut std::os::raw::c_char {
    std::ffi::CString::new(dylint_linting::DYLINT_VERSION)
        .expect("version string contains null byte")
        .into_raw()
}
