use crate::{
    context::Ctx,
    error::{Violation, ViolationKind},
    policy::{Authorizer, PolicyReq},
    request::RequestMeta,
};

/// Runs the authorization check for one capability.
///
/// Asks `authorizer` whether the context's principal may exercise
/// `capability`. On `true`, returns a derived context carrying a
/// [`Grant`](crate::Grant) that covers it, plus `true`. On `false`, returns a
/// derived context with no grant at all, plus `false`; it fails closed if the
/// caller ignores the boolean.
///
/// This is the only producer of granted contexts. The decision is taken from
/// the authorizer as-is.
///
/// # Examples
///
/// ```
/// use safesql::{authorizer_fn, check_capability, Ctx, RequestMeta};
///
/// let authorizer = authorizer_fn(|_, capability| capability == "read");
/// let request = Ctx::new(RequestMeta::new("req-1"));
///
/// let (ctx, ok) = check_capability(&request, &authorizer, "read");
/// assert!(ok && ctx.is_authorized());
///
/// let (ctx, ok) = check_capability(&request, &authorizer, "delete");
/// assert!(!ok && !ctx.is_authorized());
/// ```
pub fn check_capability<A: Authorizer + ?Sized>(
    ctx: &Ctx,
    authorizer: &A,
    capability: &str,
) -> (Ctx, bool) {
    if authorizer.is_allowed(ctx.principal(), capability) {
        tracing::debug!(
            request_id = %ctx.request_id(),
            capability,
            "capability granted"
        );
        (ctx.granted(capability), true)
    } else {
        tracing::warn!(
            request_id = %ctx.request_id(),
            principal = ctx.principal().map(|p| p.id.as_str()),
            capability,
            "capability denied"
        );
        (ctx.denied(), false)
    }
}

/// Builder for checking several requirements at once.
///
/// `PolicyGate` collects requirements and evaluates them in order against an
/// [`Authorizer`], producing a granted [`Ctx`] only if all of them pass.
///
/// # Examples
///
/// ```
/// use safesql::{authorizer_fn, Authenticated, Capability, PolicyGate, RequestMeta};
///
/// let authorizer = authorizer_fn(|principal, _| principal.is_some());
/// let meta = RequestMeta::new("req-123").with_principal("user-1", "Alice");
///
/// let ctx = PolicyGate::new(meta)
///     .require(Authenticated)
///     .require(Capability::named("read"))
///     .require(Capability::named("write"))
///     .build(&authorizer)
///     .expect("policies should pass");
///
/// assert_eq!(ctx.capabilities(), ["read", "write"]);
/// ```
pub struct PolicyGate {
    ctx: Ctx,
    requirements: Vec<PolicyReq>,
}

impl PolicyGate {
    /// Creates a new policy gate with the given request metadata.
    pub fn new(meta: RequestMeta) -> Self {
        Self::for_ctx(Ctx::new(meta))
    }

    /// Creates a gate for an existing context, keeping its cancellation scope.
    pub fn for_ctx(ctx: Ctx) -> Self {
        Self {
            ctx,
            requirements: Vec::new(),
        }
    }

    /// Adds a policy requirement to the gate, deduplicating identical requirements.
    ///
    /// Returns the updated gate to allow method chaining.
    pub fn require(mut self, policy: impl Into<PolicyReq>) -> Self {
        let req = policy.into();

        if !self.requirements.contains(&req) {
            self.requirements.push(req);
        }

        self
    }

    /// Evaluates every requirement and returns the granted context.
    ///
    /// A gate with no capability requirement produces a context without a
    /// grant, which [`Db`](crate::Db) will refuse.
    ///
    /// # Errors
    ///
    /// Returns the `Violation` for the first requirement that fails:
    /// [`ViolationKind::Unauthenticated`] when a principal is required and
    /// missing, [`ViolationKind::Unauthorized`] when a capability is denied.
    pub fn build<A: Authorizer + ?Sized>(self, authorizer: &A) -> Result<Ctx, Violation> {
        let mut ctx = self.ctx;

        for req in &self.requirements {
            match req {
                PolicyReq::Authenticated => {
                    if ctx.principal().is_none() {
                        tracing::warn!(request_id = %ctx.request_id(), "authentication required");
                        return Err(Violation::new(
                            ViolationKind::Unauthenticated,
                            "Authentication required",
                        ));
                    }
                }
                PolicyReq::Capability { name } => {
                    let (next, ok) = check_capability(&ctx, authorizer, name);
                    if !ok {
                        return Err(Violation::new(
                            ViolationKind::Unauthorized {
                                capability: (*name).to_string(),
                            },
                            "capability denied by authorizer",
                        ));
                    }
                    ctx = next;
                }
            }
        }

        Ok(ctx)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::policy::{authorizer_fn, Authenticated, Capability};

    fn alice() -> RequestMeta {
        RequestMeta::new("req-1").with_principal("user-1", "Alice")
    }

    #[test]
    fn allowed_check_grants_capability() {
        let authorizer = authorizer_fn(|_, _| true);
        let request = Ctx::new(alice());

        let (ctx, ok) = check_capability(&request, &authorizer, "write");

        assert!(ok);
        assert_eq!(ctx.capabilities(), ["write"]);
        assert!(!request.is_authorized());
    }

    #[test]
    fn denied_check_fails_closed() {
        let authorizer = authorizer_fn(|_, capability| capability == "read");
        let (read_ctx, _) = check_capability(&Ctx::new(alice()), &authorizer, "read");

        let (ctx, ok) = check_capability(&read_ctx, &authorizer, "delete");

        assert!(!ok);
        assert!(!ctx.is_authorized());
    }

    #[test]
    fn authorizer_receives_principal() {
        let authorizer = authorizer_fn(|principal, _| principal.is_some_and(|p| p.id == "user-1"));

        assert!(check_capability(&Ctx::new(alice()), &authorizer, "read").1);
        assert!(!check_capability(&Ctx::new(RequestMeta::new("anon")), &authorizer, "read").1);
    }

    #[test]
    fn gate_requires_principal() {
        let authorizer = authorizer_fn(|_, _| true);

        let result = PolicyGate::new(RequestMeta::new("req-anon"))
            .require(Authenticated)
            .require(Capability::named("read"))
            .build(&authorizer);

        assert_eq!(result.unwrap_err().kind, ViolationKind::Unauthenticated);
    }

    #[test]
    fn gate_reports_first_denied_capability() {
        let authorizer = authorizer_fn(|_, capability| capability != "delete");

        let result = PolicyGate::new(alice())
            .require(Capability::named("read"))
            .require(Capability::named("delete"))
            .build(&authorizer);

        assert_eq!(
            result.unwrap_err().kind,
            ViolationKind::Unauthorized {
                capability: "delete".to_string()
            }
        );
    }

    #[test]
    fn gate_deduplicates_requirements() {
        let calls = AtomicUsize::new(0);
        let authorizer = authorizer_fn(|_, _| {
            calls.fetch_add(1, Ordering::SeqCst);
            true
        });

        let ctx = PolicyGate::new(alice())
            .require(Capability::named("read"))
            .require(Capability::named("read"))
            .build(&authorizer)
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(ctx.capabilities(), ["read"]);
    }

    #[test]
    fn gate_without_capabilities_grants_nothing() {
        let authorizer = authorizer_fn(|_, _| true);

        let ctx = PolicyGate::new(alice())
            .require(Authenticated)
            .build(&authorizer)
            .unwrap();

        assert!(!ctx.is_authorized());
    }

    #[test]
    fn gate_keeps_cancellation_scope() {
        let authorizer = authorizer_fn(|_, _| true);
        let request = Ctx::new(alice());

        let ctx = PolicyGate::for_ctx(request.clone())
            .require(Capability::named("read"))
            .build(&authorizer)
            .unwrap();
        request.cancellation().token().cancel();

        assert!(ctx.cancellation().is_cancelled());
    }
}
