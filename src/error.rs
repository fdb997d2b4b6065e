//! Error types for the resource resolution engine.

use std::fmt;

/// Resource resolution errors
///
/// Represents the error conditions that can surface while constructing
/// resources, resolving them through a provider chain, or draining a
/// context.
///
/// # Examples
///
/// ```rust
/// use rewire::{Container, DiError, Provider, Resource};
///
/// let missing: Resource<String> = Resource::new("missing", "app").unwrap();
/// let container = Container::new();
/// let err = container
///     .context(&[], |cx| cx.resolve(&missing).map(|_| ()))
///     .unwrap_err();
/// match err {
///     DiError::NotProvided { canonical_name } => {
///         assert_eq!(canonical_name, "app.missing");
///     }
///     other => panic!("unexpected error: {}", other),
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiError {
    /// Resource name contains the reserved `.` separator
    InvalidName {
        /// The rejected name
        name: String,
    },
    /// No implementation found in the provider chain nor as a default
    NotProvided {
        /// Canonical name of the unprovided resource
        canonical_name: String,
    },
    /// The resolved value's concrete type does not match the requested token
    TypeMismatch {
        /// Canonical name of the resource that was resolved
        canonical_name: String,
        /// Type the caller's token expected
        expected: &'static str,
    },
    /// A resource transitively depends on itself, or a container parent
    /// chain loops (includes the canonical-name path)
    Circular {
        /// Resolution path, ending with the repeated name
        path: Vec<String>,
    },
    /// Maximum resolution depth exceeded
    DepthExceeded(usize),
    /// A release hook failed while a context was draining
    Teardown {
        /// Canonical name of the resource whose release failed
        canonical_name: String,
        /// Rendered error from the release hook
        message: String,
    },
}

impl DiError {
    pub(crate) fn not_provided(canonical_name: &str) -> Self {
        DiError::NotProvided {
            canonical_name: canonical_name.to_string(),
        }
    }
}

impl fmt::Display for DiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiError::InvalidName { name } => {
                write!(f, "Resource name cannot contain a dot: {:?}", name)
            }
            DiError::NotProvided { canonical_name } => {
                write!(f, "Resource not provided to this context: {}", canonical_name)
            }
            DiError::TypeMismatch { canonical_name, expected } => {
                write!(f, "Type mismatch for {}: expected {}", canonical_name, expected)
            }
            DiError::Circular { path } => {
                write!(f, "Circular dependency: {}", path.join(" -> "))
            }
            DiError::DepthExceeded(depth) => write!(f, "Max depth {} exceeded", depth),
            DiError::Teardown { canonical_name, message } => {
                write!(f, "Teardown failed for {}: {}", canonical_name, message)
            }
        }
    }
}

impl std::error::Error for DiError {}

/// Result type for resolution operations
///
/// A convenience alias for `Result<T, DiError>` used throughout rewire.
pub type DiResult<T> = Result<T, DiError>;
