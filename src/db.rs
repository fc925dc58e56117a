use crate::{
    capability::Grant,
    context::{Cancellation, Ctx},
    error::Error,
    trusted::TrustedSql,
    value::{ExecResult, Rows, Value},
};

/// A database driver wrapped by [`Db`].
///
/// Drivers sit on the far side of the trust boundary: they receive the
/// statement text as `&str`, and are responsible for their own connection
/// handling and thread safety. Application code reaches a driver only
/// through [`Db`], which checks authorization first.
///
/// Implementations should stop early when `scope` is done, and abort
/// in-flight work if `scope` becomes done while it runs.
pub trait Driver: Send + Sync {
    /// Driver name, used in logs and by [`Db::driver_name`].
    const NAME: &'static str;

    /// Error reported by the driver. Passed to callers untranslated.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Runs a statement that returns rows.
    fn query(&self, scope: &Cancellation, sql: &str, params: &[Value])
        -> Result<Rows, Self::Error>;

    /// Runs a statement that does not return rows.
    fn execute(
        &self,
        scope: &Cancellation,
        sql: &str,
        params: &[Value],
    ) -> Result<ExecResult, Self::Error>;
}

/// A driver that can be opened from a data-source string.
pub trait Connect: Driver + Sized {
    /// Opens a connection (or pool) for `data_source`.
    fn connect(data_source: &str) -> Result<Self, Self::Error>;
}

/// Handle to one logical database.
///
/// `Db` exposes only [`query`](Self::query) and [`execute`](Self::execute).
/// Both take a [`TrustedSql`] and a [`Ctx`], and refuse to call the driver
/// unless the context carries a [`Grant`]. There is no way to run a plain
/// string and no accessor for the wrapped driver.
///
/// `Db` adds no locking of its own; share it across threads by reference or
/// `Arc` when the driver is thread safe.
///
/// # Examples
///
/// ```
/// use safesql::{authorizer_fn, check_capability, sql, Ctx, Db, RequestMeta, SqliteDriver};
///
/// let db = Db::<SqliteDriver>::open(":memory:").unwrap();
/// let (ctx, _) = check_capability(
///     &Ctx::new(RequestMeta::new("req-1")),
///     &authorizer_fn(|_, _| true),
///     "read",
/// );
///
/// let rows = db.query(&ctx, &sql!("SELECT 1 + 1"), &[]).unwrap();
/// assert_eq!(rows.first().unwrap().get::<i64>(0).unwrap(), 2);
/// ```
///
/// Plain strings are rejected by the compiler:
///
/// ```compile_fail
/// # use safesql::{Ctx, Db, RequestMeta, SqliteDriver};
/// # let db = Db::<SqliteDriver>::open(":memory:").unwrap();
/// # let ctx = Ctx::new(RequestMeta::new("req-1"));
/// let id = "1 OR 1=1";
/// db.query(&ctx, &format!("SELECT * FROM notes WHERE id = {}", id), &[]);
/// ```
#[derive(Debug)]
pub struct Db<D> {
    driver: D,
}

impl<D: Driver> Db<D> {
    /// Wraps an already-connected driver.
    pub fn new(driver: D) -> Self {
        Self { driver }
    }

    /// Connects the driver `D` to `data_source`.
    ///
    /// # Errors
    ///
    /// Returns the driver's error if the connection cannot be opened.
    pub fn open(data_source: &str) -> Result<Self, D::Error>
    where
        D: Connect,
    {
        let driver = D::connect(data_source)?;
        tracing::debug!(driver = D::NAME, "database opened");
        Ok(Self::new(driver))
    }

    /// Name of the wrapped driver.
    pub fn driver_name(&self) -> &'static str {
        D::NAME
    }

    /// Runs a statement that returns rows.
    ///
    /// `params` are bound by the driver; they are never spliced into the
    /// statement text. The context's cancellation scope is handed to the
    /// driver.
    ///
    /// # Errors
    ///
    /// - [`Error::Unauthorized`] if `ctx` carries no grant. The driver is not called.
    /// - [`Error::Driver`] with the driver's own error otherwise.
    pub fn query(
        &self,
        ctx: &Ctx,
        sql: &TrustedSql,
        params: &[Value],
    ) -> Result<Rows, Error<D::Error>> {
        let grant = self.guard(ctx, "query")?;
        self.trace_forward(ctx, grant, "query", sql, params);

        self.driver
            .query(ctx.cancellation(), sql.as_sql(), params)
            .map_err(Error::Driver)
    }

    /// Runs a statement that does not return rows.
    ///
    /// # Errors
    ///
    /// - [`Error::Unauthorized`] if `ctx` carries no grant. The driver is not called.
    /// - [`Error::Driver`] with the driver's own error otherwise.
    pub fn execute(
        &self,
        ctx: &Ctx,
        sql: &TrustedSql,
        params: &[Value],
    ) -> Result<ExecResult, Error<D::Error>> {
        let grant = self.guard(ctx, "execute")?;
        self.trace_forward(ctx, grant, "execute", sql, params);

        self.driver
            .execute(ctx.cancellation(), sql.as_sql(), params)
            .map_err(Error::Driver)
    }

    fn guard<'c>(&self, ctx: &'c Ctx, operation: &'static str) -> Result<&'c Grant, Error<D::Error>> {
        ctx.grant().map_err(|violation| {
            tracing::warn!(
                request_id = %ctx.request_id(),
                driver = D::NAME,
                operation,
                "refusing database call without authorization check"
            );
            Error::Unauthorized(violation)
        })
    }

    fn trace_forward(
        &self,
        ctx: &Ctx,
        grant: &Grant,
        operation: &'static str,
        sql: &TrustedSql,
        params: &[Value],
    ) {
        tracing::debug!(
            request_id = %ctx.request_id(),
            driver = D::NAME,
            operation,
            capabilities = ?grant.capabilities(),
            params = params.len(),
            "forwarding to driver"
        );
        // Statement text is trusted; parameter values are never logged.
        tracing::trace!(request_id = %ctx.request_id(), sql = sql.as_sql());
    }
}
