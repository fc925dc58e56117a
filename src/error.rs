use std::fmt;

use thiserror::Error as ThisError;

/// Errors returned by the gated operations on [`Db`](crate::Db).
///
/// Authorization failures and driver failures are separate variants so
/// callers can tell "you may not do this" from "the database rejected this".
/// Driver errors are carried untouched.
#[derive(Debug, ThisError)]
pub enum Error<E> {
    /// The context carried no grant; the driver was not called.
    #[error("unauthorized: {0}")]
    Unauthorized(#[from] Violation),
    /// The driver reported an error.
    #[error(transparent)]
    Driver(E),
}

impl<E> Error<E> {
    /// Returns `true` for a missing-authorization failure.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Error::Unauthorized(_))
    }

    /// Returns the driver error, if this is one.
    pub fn driver_error(&self) -> Option<&E> {
        match self {
            Error::Driver(err) => Some(err),
            Error::Unauthorized(_) => None,
        }
    }

    /// Returns the authorization violation, if this is one.
    pub fn violation(&self) -> Option<&Violation> {
        match self {
            Error::Unauthorized(v) => Some(v),
            Error::Driver(_) => None,
        }
    }
}

/// A policy violation with details about what failed.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
#[error("{kind}: {message}")]
pub struct Violation {
    /// The kind of violation that occurred
    pub kind: ViolationKind,
    /// Human-readable message explaining the violation
    pub message: String,
}

impl Violation {
    /// Creates a new violation.
    pub fn new(kind: ViolationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// The kind of policy violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViolationKind {
    /// Authentication is required but missing
    Unauthenticated,
    /// The authorizer denied a capability
    Unauthorized {
        /// The capability that was denied
        capability: String,
    },
    /// A database call was attempted with a context that passed no check
    MissingGrant,
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViolationKind::Unauthenticated => write!(f, "Unauthenticated"),
            ViolationKind::Unauthorized { capability } => {
                write!(f, "Unauthorized for '{}'", capability)
            }
            ViolationKind::MissingGrant => write!(f, "Missing authorization check"),
        }
    }
}
