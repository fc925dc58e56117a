/// Proof that an authorization check succeeded for this request.
///
/// A `Grant` is what [`Db`](crate::Db) looks for before touching the driver.
/// It records which capabilities were granted, but the execution wrapper only
/// checks that a grant is present.
///
/// It cannot be constructed outside this crate; [`check_capability`](crate::check_capability)
/// is the only producer.
///
/// # Examples
///
/// ```compile_fail
/// # use safesql::Grant;
/// // This does not compile - Grant cannot be constructed publicly:
/// let grant = Grant { capabilities: vec!["write".to_string()] };
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grant {
    // BREAKING CHANGE WARNING: This field MUST remain private.
    // A public field allows forging grants via struct literal and skipping the check.
    capabilities: Vec<String>,
}

impl Grant {
    /// Creates a grant for one capability.
    ///
    /// This is `pub(crate)` so only the authorization check can mint grants.
    pub(crate) fn new(capability: &str) -> Self {
        Self {
            capabilities: vec![capability.to_string()],
        }
    }

    /// Returns a grant that additionally covers `capability`.
    pub(crate) fn extend(&self, capability: &str) -> Self {
        let mut capabilities = self.capabilities.clone();
        if !capabilities.iter().any(|c| c == capability) {
            capabilities.push(capability.to_string());
        }
        Self { capabilities }
    }

    /// Capabilities covered by this grant, in the order they were checked.
    pub fn capabilities(&self) -> &[String] {
        &self.capabilities
    }

    /// Returns `true` if `capability` was granted.
    pub fn covers(&self, capability: &str) -> bool {
        self.capabilities.iter().any(|c| c == capability)
    }
}
