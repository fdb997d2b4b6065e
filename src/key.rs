//! Erased resource identity used for registry and pool lookups.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, RwLock};

use crate::error::{DiError, DiResult};
use crate::implementation::Implementation;

pub(crate) type DefaultSlot = Arc<RwLock<Option<Arc<dyn Implementation>>>>;

/// Key for resource storage and lookup.
///
/// A key is the type-erased identity of a [`Resource`](crate::Resource):
/// its `name`, its `namespace`, and the derived canonical name
/// `namespace + "." + name`. Equality, hashing and ordering consider only
/// the canonical name, so two independently constructed resources carrying
/// the same canonical name are interchangeable registry keys.
///
/// The key also carries the resource's default-implementation slot, shared
/// between all clones of the originating resource, so the intrinsic
/// fallback stays reachable after type erasure.
///
/// # Examples
///
/// ```rust
/// use rewire::Key;
///
/// let key = Key::new("config", "app").unwrap();
/// assert_eq!(key.name(), "config");
/// assert_eq!(key.namespace(), "app");
/// assert_eq!(key.canonical_name(), "app.config");
///
/// // Names must not contain the canonical separator.
/// assert!(Key::new("a.b", "app").is_err());
/// ```
#[derive(Clone)]
pub struct Key {
    name: Arc<str>,
    namespace: Arc<str>,
    canonical: Arc<str>,
    default: DefaultSlot,
}

impl Key {
    /// Creates a key from a name and namespace.
    ///
    /// Fails with [`DiError::InvalidName`] if `name` contains a `.`
    /// character; the namespace is free-form.
    pub fn new(name: &str, namespace: &str) -> DiResult<Self> {
        if name.contains('.') {
            return Err(DiError::InvalidName { name: name.to_string() });
        }
        Ok(Self::new_unchecked(name, namespace))
    }

    pub(crate) fn new_unchecked(name: &str, namespace: &str) -> Self {
        let canonical = format!("{}.{}", namespace, name);
        Key {
            name: name.into(),
            namespace: namespace.into(),
            canonical: canonical.into(),
            default: Arc::new(RwLock::new(None)),
        }
    }

    /// The resource's bare name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The resource's namespace.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Canonical name of the resource: `<namespace>.<name>`.
    pub fn canonical_name(&self) -> &str {
        &self.canonical
    }

    pub(crate) fn canonical_shared(&self) -> Arc<str> {
        self.canonical.clone()
    }

    pub(crate) fn default_implementation(&self) -> Option<Arc<dyn Implementation>> {
        self.default.read().unwrap().clone()
    }

    pub(crate) fn set_default_implementation(&self, implementation: Arc<dyn Implementation>) {
        *self.default.write().unwrap() = Some(implementation);
    }
}

impl PartialEq for Key {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.canonical == other.canonical
    }
}

impl Eq for Key {}

impl PartialOrd for Key {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Key {
    #[inline]
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.canonical.cmp(&other.canonical)
    }
}

impl Hash for Key {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical.hash(state);
    }
}

// Keys print as their canonical name; the default slot is opaque.
impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Key").field(&self.canonical).finish()
    }
}
