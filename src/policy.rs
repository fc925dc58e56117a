use std::fmt;

use crate::request::Principal;

/// Well-known capability names.
///
/// The crate does not interpret these; they are shared vocabulary between
/// applications and their [`Authorizer`].
pub mod capabilities {
    /// Read rows.
    pub const READ: &str = "read";
    /// Insert or update rows, or change the schema.
    pub const WRITE: &str = "write";
    /// Delete rows.
    pub const DELETE: &str = "delete";
}

/// The authorization decision made by the application.
///
/// The crate never computes a decision itself. It trusts the boolean returned
/// here completely, and mints a [`Grant`](crate::Grant) only when it is `true`.
///
/// # Examples
///
/// ```
/// use safesql::{Authorizer, Principal};
///
/// struct AdminsOnly;
///
/// impl Authorizer for AdminsOnly {
///     fn is_allowed(&self, principal: Option<&Principal>, _capability: &str) -> bool {
///         principal.is_some_and(|p| p.id.starts_with("admin-"))
///     }
/// }
/// ```
pub trait Authorizer: Send + Sync {
    /// Returns `true` if `principal` may exercise `capability`.
    fn is_allowed(&self, principal: Option<&Principal>, capability: &str) -> bool;
}

impl<A: Authorizer + ?Sized> Authorizer for &A {
    fn is_allowed(&self, principal: Option<&Principal>, capability: &str) -> bool {
        (**self).is_allowed(principal, capability)
    }
}

impl<A: Authorizer + ?Sized> Authorizer for Box<A> {
    fn is_allowed(&self, principal: Option<&Principal>, capability: &str) -> bool {
        (**self).is_allowed(principal, capability)
    }
}

impl<A: Authorizer + ?Sized> Authorizer for std::sync::Arc<A> {
    fn is_allowed(&self, principal: Option<&Principal>, capability: &str) -> bool {
        (**self).is_allowed(principal, capability)
    }
}

/// An [`Authorizer`] backed by a closure. Created with [`authorizer_fn`].
#[derive(Clone, Copy)]
pub struct FnAuthorizer<F> {
    decide: F,
}

impl<F> fmt::Debug for FnAuthorizer<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnAuthorizer").finish_non_exhaustive()
    }
}

impl<F> Authorizer for FnAuthorizer<F>
where
    F: Fn(Option<&Principal>, &str) -> bool + Send + Sync,
{
    fn is_allowed(&self, principal: Option<&Principal>, capability: &str) -> bool {
        (self.decide)(principal, capability)
    }
}

/// Wraps a closure as an [`Authorizer`].
///
/// # Examples
///
/// ```
/// use safesql::{authorizer_fn, Authorizer};
///
/// let read_only = authorizer_fn(|principal, capability| principal.is_some() && capability == "read");
/// assert!(!read_only.is_allowed(None, "read"));
/// ```
pub fn authorizer_fn<F>(decide: F) -> FnAuthorizer<F>
where
    F: Fn(Option<&Principal>, &str) -> bool + Send + Sync,
{
    FnAuthorizer { decide }
}

/// A policy requirement that must be satisfied.
///
/// Requirements are evaluated during [`PolicyGate::build`](crate::PolicyGate::build).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyReq {
    /// Requires an authenticated principal
    Authenticated,
    /// Requires the authorizer to allow a capability
    Capability {
        /// Capability name passed to the authorizer
        name: &'static str,
    },
}

/// Policy requiring authentication.
///
/// Use this to require that a principal is present in the request metadata.
#[derive(Debug, Clone, Copy)]
pub struct Authenticated;

/// Policy requiring a named capability.
///
/// Use this to require that the authorizer allows the principal a particular
/// capability (e.g., "read", "write", "delete").
#[derive(Debug, Clone, Copy)]
pub struct Capability {
    name: &'static str,
}

impl Capability {
    /// Creates a requirement for the given capability.
    pub fn named(name: &'static str) -> Self {
        Self { name }
    }
}

impl From<Authenticated> for PolicyReq {
    fn from(_: Authenticated) -> Self {
        PolicyReq::Authenticated
    }
}

impl From<Capability> for PolicyReq {
    fn from(cap: Capability) -> Self {
        PolicyReq::Capability { name: cap.name }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closure_authorizer_sees_principal_and_capability() {
        let authorizer = authorizer_fn(|principal, capability| {
            principal.is_some_and(|p| p.id == "user-1") && capability == capabilities::READ
        });
        let alice = Principal {
            id: "user-1".to_string(),
            name: "Alice".to_string(),
        };

        assert!(authorizer.is_allowed(Some(&alice), "read"));
        assert!(!authorizer.is_allowed(Some(&alice), "write"));
        assert!(!authorizer.is_allowed(None, "read"));
    }

    #[test]
    fn references_and_boxes_delegate() {
        let deny = authorizer_fn(|_, _| false);
        let boxed: Box<dyn Authorizer> = Box::new(authorizer_fn(|_, _| true));

        assert!(!(&deny).is_allowed(None, "read"));
        assert!(boxed.is_allowed(None, "read"));
    }

    #[test]
    fn requirements_convert() {
        assert_eq!(PolicyReq::from(Authenticated), PolicyReq::Authenticated);
        assert_eq!(
            PolicyReq::from(Capability::named("delete")),
            PolicyReq::Capability { name: "delete" }
        );
    }
}
