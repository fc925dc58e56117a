use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use crate::capability::Grant;
use crate::error::{Violation, ViolationKind};
use crate::policy::Authorizer;
use crate::request::{Principal, RequestMeta};

/// Cancellation scope of a request: a token plus an optional deadline.
///
/// [`Db`](crate::Db) hands this to the driver unchanged so that in-flight
/// statements can be aborted when the caller gives up.
#[derive(Debug, Clone, Default)]
pub struct Cancellation {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Cancellation {
    /// Creates a scope with a fresh token and no deadline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a scope observing the caller's token.
    pub fn with_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// The underlying token.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// The deadline, if one was set.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left until the deadline. `None` when there is no deadline.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Returns `true` once the token has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Returns `true` once the deadline has passed.
    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Returns `true` if the operation should stop: cancelled or expired.
    pub fn is_done(&self) -> bool {
        self.is_cancelled() || self.is_expired()
    }
}

/// Request-scoped execution context.
///
/// A `Ctx` starts out without a [`Grant`]. The only way to obtain one that
/// carries a grant is an authorization check:
///
/// ```text
/// Ctx::new(meta) --check_capability(ok = true)--> Ctx { grant: Some(..) }
/// ```
///
/// [`Db`](crate::Db) refuses every call whose context has no grant. Each
/// check returns a new context; the input context is never modified.
///
/// A context belongs to one request. Do not cache it or reuse it across
/// requests.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use safesql::{authorizer_fn, Ctx, RequestMeta};
///
/// let authorizer = authorizer_fn(|principal, capability| principal.is_some() && capability == "read");
///
/// let request = Ctx::new(RequestMeta::new("req-1").with_principal("user-1", "Alice"))
///     .with_timeout(Duration::from_secs(5));
/// assert!(!request.is_authorized());
///
/// let ctx = request.authorize(&authorizer, "read").expect("read is allowed");
/// assert!(ctx.is_authorized());
/// assert!(request.authorize(&authorizer, "delete").is_err());
/// ```
#[derive(Debug, Clone)]
pub struct Ctx {
    request_id: String,
    principal: Option<Principal>,
    scope: Cancellation,
    grant: Option<Grant>,
}

impl Ctx {
    /// Creates a context for an incoming request. It carries no grant.
    pub fn new(meta: RequestMeta) -> Self {
        Self {
            request_id: meta.request_id,
            principal: meta.principal,
            scope: Cancellation::new(),
            grant: None,
        }
    }

    /// Observes the caller's cancellation token instead of a fresh one.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.scope.token = token;
        self
    }

    /// Sets a deadline. An earlier deadline already present is kept.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.scope.deadline = Some(match self.scope.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        });
        self
    }

    /// Sets a deadline `timeout` from now.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Returns the request ID for this context.
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Returns the principal if present.
    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    /// Returns the cancellation scope passed to the driver.
    pub fn cancellation(&self) -> &Cancellation {
        &self.scope
    }

    /// Returns `true` if an authorization check succeeded on this context.
    pub fn is_authorized(&self) -> bool {
        self.grant.is_some()
    }

    /// Capabilities granted to this context. Empty when unchecked.
    pub fn capabilities(&self) -> &[String] {
        match &self.grant {
            Some(grant) => grant.capabilities(),
            None => &[],
        }
    }

    /// Returns the grant, proving a check happened.
    ///
    /// # Errors
    ///
    /// Returns `Err(Violation)` with [`ViolationKind::MissingGrant`] if no
    /// check succeeded on this context.
    pub fn grant(&self) -> Result<&Grant, Violation> {
        self.grant.as_ref().ok_or_else(|| {
            Violation::new(
                ViolationKind::MissingGrant,
                "no authorization check succeeded on this context",
            )
        })
    }

    /// Checks `capability` and returns the derived context on success.
    ///
    /// Convenience over [`check_capability`](crate::check_capability) for
    /// callers that want a `Result`.
    ///
    /// # Errors
    ///
    /// Returns `Err(Violation)` with [`ViolationKind::Unauthorized`] if the
    /// authorizer denies the capability.
    pub fn authorize<A: Authorizer + ?Sized>(
        &self,
        authorizer: &A,
        capability: &str,
    ) -> Result<Ctx, Violation> {
        match crate::gate::check_capability(self, authorizer, capability) {
            (ctx, true) => Ok(ctx),
            (_, false) => Err(Violation::new(
                ViolationKind::Unauthorized {
                    capability: capability.to_string(),
                },
                "capability denied by authorizer",
            )),
        }
    }

    /// Derives a context whose grant additionally covers `capability`.
    pub(crate) fn granted(&self, capability: &str) -> Self {
        let grant = match &self.grant {
            Some(existing) => existing.extend(capability),
            None => Grant::new(capability),
        };
        Self {
            grant: Some(grant),
            ..self.clone()
        }
    }

    /// Derives a context with every grant removed.
    pub(crate) fn denied(&self) -> Self {
        Self {
            grant: None,
            ..self.clone()
        }
    }
}
