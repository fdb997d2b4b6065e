//! Dependency injection container: an inheritable registry of
//! resource-to-implementation bindings.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use crate::context::Context;
use crate::error::{DiError, DiResult};
use crate::implementation::{
    ConstantImplementation, ContextualImplementation, Deps, Implementation, Managed,
    PlainImplementation,
};
use crate::key::Key;
use crate::provider::ProviderCore;
use crate::resource::{Resource, ResourceIdentity};

/// Registry mapping resources to implementations, with parent fallback.
///
/// Containers are cheap clonable handles over shared state: clones see the
/// same bindings. A child container inherits everything from its parent and
/// may shadow individual bindings; lookups prefer the nearest registration.
///
/// # Examples
///
/// ```rust
/// use rewire::{Container, Deps, Provider, Resource};
///
/// let config_dir: Resource<String> = Resource::new("config_dir", "app").unwrap();
/// let db_path: Resource<String> = Resource::new("db_path", "app").unwrap();
///
/// let base = Container::new();
/// base.provide_constant(&config_dir, "/etc/app".to_string());
/// let dir_dep = config_dir.clone();
/// base.plain(&db_path, Deps::new().arg(&config_dir), move |cx| {
///     Ok(format!("{}/database.yml", cx.resolve(&dir_dep)?))
/// });
///
/// // A dev container shadows only the directory.
/// let dev = base.child();
/// dev.provide_constant(&config_dir, "./config".to_string());
///
/// base.context(&[], |cx| {
///     assert_eq!(*cx.resolve(&db_path)?, "/etc/app/database.yml");
///     Ok(())
/// })
/// .unwrap();
/// dev.context(&[], |cx| {
///     assert_eq!(*cx.resolve(&db_path)?, "./config/database.yml");
///     Ok(())
/// })
/// .unwrap();
/// ```
#[derive(Clone)]
pub struct Container {
    inner: Arc<ContainerInner>,
}

struct ContainerInner {
    parent: Option<Container>,
    bindings: Mutex<HashMap<Key, Arc<dyn Implementation>>>,
}

impl Container {
    /// Creates an empty root container.
    pub fn new() -> Self {
        Container {
            inner: Arc::new(ContainerInner {
                parent: None,
                bindings: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Creates a child container inheriting this container's bindings.
    pub fn child(&self) -> Self {
        Container {
            inner: Arc::new(ContainerInner {
                parent: Some(self.clone()),
                bindings: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Provides an implementation for a resource.
    ///
    /// Unconditionally overwrites any existing binding for the resource in
    /// this container. Lookups always reflect the latest registration.
    pub fn provide<T, I>(&self, resource: &Resource<T>, implementation: I)
    where
        I: Implementation + 'static,
    {
        self.inner
            .bindings
            .lock()
            .unwrap()
            .insert(resource.key().clone(), Arc::new(implementation));
    }

    /// Provides a resource with a plain factory.
    ///
    /// Declared dependencies are resolved through the requesting context,
    /// in order, before the factory runs; the produced value needs no
    /// release.
    pub fn plain<T, F>(&self, resource: &Resource<T>, deps: Deps, factory: F)
    where
        T: Send + Sync + 'static,
        F: Fn(&Context) -> DiResult<T> + Send + Sync + 'static,
    {
        self.provide(resource, PlainImplementation::new(deps, factory));
    }

    /// Provides a resource with a contextual factory whose [`Managed`]
    /// value may carry a release hook, run when the owning scope drains.
    pub fn contextual<T, F>(&self, resource: &Resource<T>, deps: Deps, factory: F)
    where
        T: Send + Sync + 'static,
        F: Fn(&Context) -> DiResult<Managed<T>> + Send + Sync + 'static,
    {
        self.provide(resource, ContextualImplementation::new(deps, factory));
    }

    /// Provides a resource with a constant value.
    ///
    /// Every resolution, in every context, yields the same shared instance.
    pub fn provide_constant<T>(&self, resource: &Resource<T>, value: T)
    where
        T: Send + Sync + 'static,
    {
        self.provide(resource, ConstantImplementation::new(value));
    }

    /// Finds the implementation satisfying a resource key.
    ///
    /// Precedence is deterministic: local binding, then ancestors nearest
    /// first, then the resource's intrinsic default, otherwise
    /// [`DiError::NotProvided`]. A looping parent chain is reported as
    /// [`DiError::Circular`] instead of recursing forever.
    pub fn find_implementation(&self, key: &Key) -> DiResult<Arc<dyn Implementation>> {
        let mut visited: Vec<usize> = Vec::new();
        let mut current = self.clone();
        loop {
            let id = Arc::as_ptr(&current.inner) as usize;
            if visited.contains(&id) {
                return Err(DiError::Circular {
                    path: vec![key.canonical_name().to_string()],
                });
            }
            visited.push(id);

            if let Some(found) = current.inner.bindings.lock().unwrap().get(key) {
                return Ok(found.clone());
            }
            let next = current.inner.parent.clone();
            match next {
                Some(parent) => current = parent,
                None => break,
            }
        }
        if let Some(default) = key.default_implementation() {
            return Ok(default);
        }
        Err(DiError::not_provided(key.canonical_name()))
    }

    /// Opens a resolution scope bound to this container.
    ///
    /// A fresh root [`Context`] is created, every resource in `preload` is
    /// eagerly resolved, and the closure runs with the context. On exit the
    /// context drains unconditionally, releasing everything it created in
    /// reverse acquisition order. The closure's error takes precedence over
    /// a drain failure from the same exit.
    ///
    /// ```rust
    /// use rewire::{Container, Provider, Resource};
    ///
    /// let greeting: Resource<&'static str> = Resource::new("greeting", "app").unwrap();
    /// let container = Container::new();
    /// container.provide_constant(&greeting, "hello");
    ///
    /// let got = container
    ///     .context(&[&greeting], |cx| Ok(*cx.resolve(&greeting)?))
    ///     .unwrap();
    /// assert_eq!(got, "hello");
    /// ```
    pub fn context<R, F>(&self, preload: &[&dyn ResourceIdentity], f: F) -> DiResult<R>
    where
        F: FnOnce(&Context) -> DiResult<R>,
    {
        let cx = Context::root(self.clone());
        let result = (|| {
            for resource in preload {
                cx.resolve_erased(resource.key())?;
            }
            f(&cx)
        })();
        let drained = cx.drain();
        match result {
            Err(e) => Err(e),
            Ok(value) => drained.map(|()| value),
        }
    }
}

impl Default for Container {
    fn default() -> Self {
        Container::new()
    }
}

impl ProviderCore for Container {
    /// One-shot resolution through an ephemeral root context.
    ///
    /// The context drains before the value is returned, so release hooks of
    /// everything acquired along the way have already run. Suitable for
    /// release-free resource graphs (constants, plain factories); use
    /// [`Container::context`] whenever a resource owns a release hook.
    fn resolve_erased(&self, key: &Key) -> DiResult<Arc<dyn Any + Send + Sync>> {
        self.context(&[], |cx| cx.resolve_erased(key))
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bindings = self.inner.bindings.lock().unwrap().len();
        f.debug_struct("Container")
            .field("bindings", &bindings)
            .field("has_parent", &self.inner.parent.is_some())
            .finish()
    }
}
