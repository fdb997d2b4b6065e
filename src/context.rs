//! Resolution scopes with memoized acquisition and ordered teardown.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::builtins;
use crate::container::Container;
use crate::error::{DiError, DiResult};
use crate::implementation::{
    AnyArc, ConstantImplementation, ContextualImplementation, Deps, Implementation, Managed,
    PlainImplementation, Release,
};
use crate::internal::resolution_guard;
use crate::key::Key;
use crate::provider::ProviderCore;
use crate::resource::{Resource, ResourceIdentity};

/// One acquired resource held by a context.
struct PoolEntry {
    key: Key,
    value: AnyArc,
    release: Release,
}

/// A resolution scope.
///
/// A context resolves resources against its container and memoizes every
/// acquisition in an ordered pool: the first resolution of a resource
/// reifies it, subsequent resolutions return the cached instance. When the
/// scope closes the context drains, running release hooks in reverse
/// acquisition order.
///
/// Contexts form a tree. A child scope opened with [`Context::child`]
/// resolves its own bindings locally and delegates everything else to its
/// parent, which then owns the cached instance; draining the child never
/// releases what the parent holds.
///
/// Contexts are clonable handles over shared state; a clone observes the
/// same pool. Handles are handed to factories and closures by reference,
/// and the scope closes when the enclosing [`Container::context`] or
/// [`Context::child`] closure returns.
#[derive(Clone)]
pub struct Context {
    inner: Arc<ContextInner>,
}

struct ContextInner {
    container: Container,
    parent: Option<Context>,
    bindings: Mutex<HashMap<Key, Arc<dyn Implementation>>>,
    pool: Mutex<Vec<PoolEntry>>,
    children: Mutex<Vec<Context>>,
    drained: AtomicBool,
}

impl Context {
    pub(crate) fn root(container: Container) -> Self {
        Context {
            inner: Arc::new(ContextInner {
                container,
                parent: None,
                bindings: Mutex::new(HashMap::new()),
                pool: Mutex::new(Vec::new()),
                children: Mutex::new(Vec::new()),
                drained: AtomicBool::new(false),
            }),
        }
    }

    /// The container this context resolves against.
    pub fn container(&self) -> &Container {
        &self.inner.container
    }

    /// True once this context has drained.
    pub fn is_drained(&self) -> bool {
        self.inner.drained.load(Ordering::SeqCst)
    }

    /// True when `other` is a handle to this same context.
    pub fn is_same(&self, other: &Context) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Stable identity of this context while it is alive.
    pub(crate) fn ptr_id(&self) -> usize {
        Arc::as_ptr(&self.inner) as usize
    }

    /// Binds an implementation for a resource in this context only.
    ///
    /// Context bindings shadow the container for this scope and its
    /// descendants; sibling and parent scopes are unaffected. A binding
    /// installed after the resource was already resolved here does not
    /// evict the pooled instance.
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

    /// Binds a plain factory for a resource in this context only.
    pub fn plain<T, F>(&self, resource: &Resource<T>, deps: Deps, factory: F)
    where
        T: Send + Sync + 'static,
        F: Fn(&Context) -> DiResult<T> + Send + Sync + 'static,
    {
        self.provide(resource, PlainImplementation::new(deps, factory));
    }

    /// Binds a contextual factory for a resource in this context only.
    pub fn contextual<T, F>(&self, resource: &Resource<T>, deps: Deps, factory: F)
    where
        T: Send + Sync + 'static,
        F: Fn(&Context) -> DiResult<Managed<T>> + Send + Sync + 'static,
    {
        self.provide(resource, ContextualImplementation::new(deps, factory));
    }

    /// Binds a constant value for a resource in this context only.
    pub fn provide_constant<T>(&self, resource: &Resource<T>, value: T)
    where
        T: Send + Sync + 'static,
    {
        self.provide(resource, ConstantImplementation::new(value));
    }

    /// Opens a child scope.
    ///
    /// The child shares this context's container, resolves unshadowed
    /// resources through this context, and drains when the closure returns,
    /// releasing only what the child itself reified. The closure's error
    /// takes precedence over a drain failure from the same exit.
    ///
    /// ```rust
    /// use rewire::{Container, Deps, Provider, Resource};
    ///
    /// let id: Resource<u32> = Resource::new("id", "app").unwrap();
    /// let container = Container::new();
    /// container.provide_constant(&id, 7u32);
    ///
    /// container
    ///     .context(&[], |cx| {
    ///         let outer = cx.resolve(&id)?;
    ///         cx.child(&[], |child| {
    ///             // Unshadowed resources come from the parent's pool.
    ///             assert!(std::sync::Arc::ptr_eq(&outer, &child.resolve(&id)?));
    ///             Ok(())
    ///         })
    ///     })
    ///     .unwrap();
    /// ```
    pub fn child<R, F>(&self, preload: &[&dyn ResourceIdentity], f: F) -> DiResult<R>
    where
        F: FnOnce(&Context) -> DiResult<R>,
    {
        assert!(!self.is_drained(), "cannot open a child of a drained context");
        let child = Context {
            inner: Arc::new(ContextInner {
                container: self.inner.container.clone(),
                parent: Some(self.clone()),
                bindings: Mutex::new(HashMap::new()),
                pool: Mutex::new(Vec::new()),
                children: Mutex::new(Vec::new()),
                drained: AtomicBool::new(false),
            }),
        };
        self.inner.children.lock().unwrap().push(child.clone());

        let result = (|| {
            for resource in preload {
                child.resolve_erased(resource.key())?;
            }
            f(&child)
        })();
        let drained = child.drain();
        self.inner
            .children
            .lock()
            .unwrap()
            .retain(|c| !c.is_same(&child));
        match result {
            Err(e) => Err(e),
            Ok(value) => drained.map(|()| value),
        }
    }

    /// Drains this context: children first, most recently opened first,
    /// then the context's own pool in reverse acquisition order.
    ///
    /// Each entry leaves the pool before its release hook runs, so a hook
    /// observing the context sees the resource already gone. The first
    /// failure is recorded and handed to every remaining hook, which runs
    /// regardless; that first failure is returned once the pass completes.
    /// Draining twice is a no-op, but resolving through a drained handle
    /// afterwards panics.
    pub fn drain(&self) -> DiResult<()> {
        if self.inner.drained.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let mut first_err: Option<DiError> = None;

        let mut children = std::mem::take(&mut *self.inner.children.lock().unwrap());
        while let Some(child) = children.pop() {
            if let Err(e) = child.drain() {
                first_err.get_or_insert(e);
            }
        }

        loop {
            let entry = match self.inner.pool.lock().unwrap().pop() {
                Some(entry) => entry,
                None => break,
            };
            if let Err(e) = entry.release.run(first_err.as_ref()) {
                first_err.get_or_insert(DiError::Teardown {
                    canonical_name: entry.key.canonical_name().to_string(),
                    message: e.to_string(),
                });
            }
        }

        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Nearest context in the parent chain carrying its own binding for
    /// `key`; the root when none does.
    pub(crate) fn owner_of(&self, key: &Key) -> Context {
        let mut current = self.clone();
        loop {
            if current.inner.bindings.lock().unwrap().contains_key(key) {
                return current;
            }
            let next = current.inner.parent.clone();
            match next {
                Some(parent) => current = parent,
                None => return current,
            }
        }
    }

    fn lookup_pool(&self, key: &Key) -> Option<AnyArc> {
        self.inner
            .pool
            .lock()
            .unwrap()
            .iter()
            .find(|entry| entry.key == *key)
            .map(|entry| entry.value.clone())
    }

    fn reify_into_pool(&self, key: &Key, implementation: &dyn Implementation) -> DiResult<AnyArc> {
        let scoped = implementation.reify(key, self)?;
        let value = scoped.value.clone();
        self.inner.pool.lock().unwrap().push(PoolEntry {
            key: key.clone(),
            value: scoped.value,
            release: scoped.release,
        });
        Ok(value)
    }

    // Resolution chain past the entry guard: pool, own bindings, parent
    // context, container. The guard is held once per logical resolution,
    // so delegation along the parent chain re-enters here directly.
    pub(crate) fn resolve_inner(&self, key: &Key) -> DiResult<AnyArc> {
        if let Some(hit) = self.lookup_pool(key) {
            return Ok(hit);
        }
        let own = self.inner.bindings.lock().unwrap().get(key).cloned();
        if let Some(implementation) = own {
            return self.reify_into_pool(key, implementation.as_ref());
        }
        if let Some(parent) = &self.inner.parent {
            return parent.resolve_inner(key);
        }
        let implementation = self.inner.container.find_implementation(key)?;
        self.reify_into_pool(key, implementation.as_ref())
    }
}

impl ProviderCore for Context {
    fn resolve_erased(&self, key: &Key) -> DiResult<Arc<dyn Any + Send + Sync>> {
        assert!(!self.is_drained(), "cannot resolve on a drained context");
        if builtins::is_current_context(key) {
            // Never pooled: pooling the handle would cycle the Arc.
            return Ok(Arc::new(self.clone()));
        }
        let _guard = resolution_guard(key.canonical_shared())?;
        self.resolve_inner(key)
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pooled = self.inner.pool.lock().unwrap().len();
        f.debug_struct("Context")
            .field("pooled", &pooled)
            .field("drained", &self.is_drained())
            .field("has_parent", &self.inner.parent.is_some())
            .finish()
    }
}
