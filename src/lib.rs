//! Injection-safe, authorization-gated SQL execution.
//!
//! This crate removes two bug classes at the API level:
//! - **SQL injection**: every statement handed to the database is a
//!   [`TrustedSql`], which can only be built from string literals written in
//!   the program source, from integers, or through an opt-in escape hatch
//! - **Unchecked access**: [`Db::query`] and [`Db::execute`] refuse to run
//!   unless the request context carries a [`Grant`] minted by an
//!   authorization check
//!
//! # Core Types
//!
//! - [`TrustedSql`]: Opaque statement text, built with [`sql!`] or [`TrustedSql::from_int`]
//! - [`Ctx`]: Request-scoped context carrying cancellation and, after a check, a [`Grant`]
//! - [`Authorizer`]: The application's yes/no policy decision
//! - [`Db`]: Wrapper around a [`Driver`] exposing only gated operations
//!
//! # Examples
//!
//! ```
//! use safesql::{authorizer_fn, check_capability, params, sql, Ctx, Db, RequestMeta, SqliteDriver};
//!
//! let db = Db::<SqliteDriver>::open(":memory:").unwrap();
//! let authorizer = authorizer_fn(|principal, _capability| principal.is_some());
//!
//! let request = Ctx::new(RequestMeta::new("req-1").with_principal("user-1", "Alice"));
//! let (ctx, ok) = check_capability(&request, &authorizer, "write");
//! assert!(ok);
//!
//! db.execute(&ctx, &sql!("CREATE TABLE notes(id INTEGER PRIMARY KEY, title TEXT)"), &[])
//!     .unwrap();
//! db.execute(&ctx, &sql!("INSERT INTO notes(title) VALUES(?)"), &params!["Salutations"])
//!     .unwrap();
//!
//! // A context that never went through a check is refused.
//! let unchecked = Ctx::new(RequestMeta::new("req-2"));
//! let err = db.query(&unchecked, &sql!("SELECT * FROM notes"), &[]).unwrap_err();
//! assert!(err.is_unauthorized());
//! ```
//!
//! # Guarantee Boundaries
//!
//! [`sql!`] and [`literal!`] only accept a single string-literal token, so
//! runtime strings, `format!` output and concatenations are rejected at
//! compile time. The macros reach the literal constructor through a
//! `#[doc(hidden)]` path that a determined caller could still name; the
//! `enforcement_pack` dylint library denies such use outside macro expansion.
//!
//! The escape hatch lives in `safesql::legacy_conversions` and only exists
//! when a dependent crate enables the `legacy-conversions` feature.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod capability;
mod context;
mod db;
mod error;
mod gate;
mod policy;
mod request;
#[cfg(feature = "sqlite")]
mod sqlite;
mod trusted;
mod value;

#[cfg(test)]
mod test_utils;

pub use capability::Grant;
pub use context::{Cancellation, Ctx};
pub use db::{Connect, Db, Driver};
pub use error::{Error, Violation, ViolationKind};
pub use gate::{check_capability, PolicyGate};
pub use policy::{
    authorizer_fn, capabilities, Authenticated, Authorizer, Capability, FnAuthorizer, PolicyReq,
};
pub use request::{Principal, RequestMeta};
#[cfg(feature = "sqlite")]
pub use sqlite::{SqliteConfig, SqliteDriver, SqliteError};
#[cfg(feature = "legacy-conversions")]
#[cfg_attr(docsrs, doc(cfg(feature = "legacy-conversions")))]
pub use trusted::legacy_conversions;
pub use trusted::{FixedLiteral, SqlInteger, TrustedSql};
pub use value::{ColumnError, ExecResult, FromValue, Row, Rows, Value};

/// Re-exported so callers can attach their own cancellation scope to a [`Ctx`].
pub use tokio_util::sync::CancellationToken;

// Macro support. Not part of the public API.
#[doc(hidden)]
pub mod __private {
    use crate::trusted::FixedLiteral;

    #[doc(hidden)]
    pub const fn fixed_literal(text: &'static str) -> FixedLiteral {
        FixedLiteral::from_macro(text)
    }
}
