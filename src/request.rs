/// Metadata about an incoming request or operation.
///
/// Contains the request identifier and optional principal (authenticated user/service).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestMeta {
    /// Unique identifier for this request
    pub request_id: String,
    /// Authenticated principal, if any
    pub principal: Option<Principal>,
}

impl RequestMeta {
    /// Creates metadata for an anonymous request.
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            principal: None,
        }
    }

    /// Attaches an authenticated principal.
    pub fn with_principal(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.principal = Some(Principal {
            id: id.into(),
            name: name.into(),
        });
        self
    }
}

/// An authenticated user or service principal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    /// Unique identifier for this principal
    pub id: String,
    /// Display name
    pub name: String,
}
