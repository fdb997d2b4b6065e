//! Resource tokens: named, namespaced handles for injectable capabilities.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::context::Context;
use crate::error::DiResult;
use crate::implementation::{
    ConstantImplementation, ContextualImplementation, Deps, Implementation, Managed,
    PlainImplementation,
};
use crate::key::Key;

/// Erased view of a resource token.
///
/// Anything carrying a [`Key`] qualifies; used where heterogeneous resource
/// lists are needed, such as preload lists and [`Deps`] bindings.
pub trait ResourceIdentity: Send + Sync {
    /// The erased identity of this resource.
    fn key(&self) -> &Key;

    /// Canonical name of the resource: `<namespace>.<name>`.
    fn canonical_name(&self) -> &str {
        self.key().canonical_name()
    }
}

/// A declarative resource token.
///
/// A resource names a requestable capability; the type parameter records
/// what a successful resolution yields. Identity is structural on the
/// canonical name, so independently constructed tokens with equal names
/// refer to the same logical resource. The namespace is conventionally the
/// defining module's path.
///
/// # Examples
///
/// ```rust
/// use rewire::{Container, Provider, Resource};
///
/// let config_dir: Resource<String> = Resource::new("config_dir", "app").unwrap();
/// assert_eq!(config_dir.canonical_name(), "app.config_dir");
///
/// let container = Container::new();
/// container.provide_constant(&config_dir, "/etc/app".to_string());
///
/// container
///     .context(&[], |cx| {
///         assert_eq!(*cx.resolve(&config_dir)?, "/etc/app");
///         Ok(())
///     })
///     .unwrap();
/// ```
pub struct Resource<T> {
    key: Key,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Resource<T> {
    fn clone(&self) -> Self {
        Resource { key: self.key.clone(), _marker: PhantomData }
    }
}

impl<T> Resource<T> {
    /// Creates a resource token.
    ///
    /// Fails with [`DiError::InvalidName`](crate::DiError::InvalidName) if
    /// `name` contains a `.` character.
    pub fn new(name: &str, namespace: &str) -> DiResult<Self> {
        Ok(Resource { key: Key::new(name, namespace)?, _marker: PhantomData })
    }

    pub(crate) fn from_key(key: Key) -> Self {
        Resource { key, _marker: PhantomData }
    }

    /// The resource's bare name.
    pub fn name(&self) -> &str {
        self.key.name()
    }

    /// The resource's namespace.
    pub fn namespace(&self) -> &str {
        self.key.namespace()
    }

    /// Canonical name of the resource: `<namespace>.<name>`.
    pub fn canonical_name(&self) -> &str {
        self.key.canonical_name()
    }
}

impl<T: Send + Sync + 'static> Resource<T> {
    /// Installs the intrinsic fallback implementation, used only when no
    /// container in the lookup chain provides this resource.
    ///
    /// Clones of this token share the slot; installing replaces any
    /// previous default.
    pub fn set_default_implementation<I: Implementation + 'static>(&self, implementation: I) {
        self.key.set_default_implementation(Arc::new(implementation));
    }

    /// Sets the default implementation to a plain factory.
    ///
    /// ```rust
    /// use rewire::{Container, Deps, Provider, Resource};
    ///
    /// let greeting: Resource<String> = Resource::new("greeting", "app").unwrap();
    /// greeting.default_plain(Deps::new(), |_cx| Ok("hello".to_string()));
    ///
    /// // An empty container still resolves it through the default.
    /// Container::new()
    ///     .context(&[], |cx| {
    ///         assert_eq!(*cx.resolve(&greeting)?, "hello");
    ///         Ok(())
    ///     })
    ///     .unwrap();
    /// ```
    pub fn default_plain<F>(&self, deps: Deps, factory: F)
    where
        F: Fn(&Context) -> DiResult<T> + Send + Sync + 'static,
    {
        self.set_default_implementation(PlainImplementation::new(deps, factory));
    }

    /// Sets the default implementation to a contextual factory whose value
    /// carries a release hook.
    pub fn default_contextual<F>(&self, deps: Deps, factory: F)
    where
        F: Fn(&Context) -> DiResult<Managed<T>> + Send + Sync + 'static,
    {
        self.set_default_implementation(ContextualImplementation::new(deps, factory));
    }

    /// Sets the default implementation to a constant.
    pub fn default_constant(&self, value: T) {
        self.key.set_default_implementation(Arc::new(ConstantImplementation::new(value)));
    }
}

impl<T> ResourceIdentity for Resource<T> {
    fn key(&self) -> &Key {
        &self.key
    }
}

impl<T> fmt::Debug for Resource<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Resource").field(&self.canonical_name()).finish()
    }
}
