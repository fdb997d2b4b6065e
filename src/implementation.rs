//! Implementation strategies: how a resource's value gets produced.
//!
//! An [`Implementation`] turns a resource token into a live value, given a
//! provider to resolve its own dependencies. The three base strategies are
//! a constant holder, a plain factory, and a contextual factory whose value
//! carries a release hook that runs when the owning context drains.

use std::any::Any;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::context::Context;
use crate::error::{DiError, DiResult};
use crate::key::Key;
use crate::provider::ProviderCore;
use crate::resource::ResourceIdentity;

// Type-erased Arc for storage
pub(crate) type AnyArc = Arc<dyn Any + Send + Sync>;

/// Boxed error returned by release hooks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Release hook invoked when the owning context drains. The argument is the
/// first teardown failure observed so far in the same drain pass, if any.
pub(crate) type ReleaseHook =
    Box<dyn FnOnce(Option<&DiError>) -> Result<(), BoxError> + Send>;

pub(crate) enum Release {
    Noop,
    Hook(ReleaseHook),
}

impl Release {
    pub(crate) fn run(self, fault: Option<&DiError>) -> Result<(), BoxError> {
        match self {
            Release::Noop => Ok(()),
            Release::Hook(hook) => hook(fault),
        }
    }
}

/// A reified resource: the live (type-erased) value plus its release handle.
///
/// This is what [`Implementation::reify`] returns. Most code never builds
/// one directly; the factory implementations in this module and the typed
/// [`Managed`] builder cover the common cases. Implementing
/// [`Implementation`] by hand is the escape hatch:
///
/// ```rust
/// use rewire::{Context, DiResult, Implementation, Key, ScopedValue};
///
/// struct Fixed;
///
/// impl Implementation for Fixed {
///     fn reify(&self, _resource: &Key, _provider: &Context) -> DiResult<ScopedValue> {
///         Ok(ScopedValue::new("always this".to_string()))
///     }
/// }
/// ```
pub struct ScopedValue {
    pub(crate) value: AnyArc,
    pub(crate) release: Release,
}

impl ScopedValue {
    /// Wraps a value whose release is a no-op.
    pub fn new<T: Send + Sync + 'static>(value: T) -> Self {
        ScopedValue { value: Arc::new(value), release: Release::Noop }
    }

    /// Wraps a value together with a release hook.
    ///
    /// The hook runs exactly once, in reverse acquisition order relative to
    /// the other resources of the owning context. Its argument is the first
    /// failure already raised during the same drain pass, letting the
    /// resource observe downstream teardown trouble before it lets go.
    pub fn with_release<T, F>(value: T, hook: F) -> Self
    where
        T: Send + Sync + 'static,
        F: FnOnce(Option<&DiError>) -> Result<(), BoxError> + Send + 'static,
    {
        ScopedValue {
            value: Arc::new(value),
            release: Release::Hook(Box::new(hook)),
        }
    }

    /// Wraps an already-erased value whose release is a no-op.
    pub fn from_arc(value: Arc<dyn Any + Send + Sync>) -> Self {
        ScopedValue { value, release: Release::Noop }
    }

    pub(crate) fn from_arc_with_release(
        value: Arc<dyn Any + Send + Sync>,
        release: Release,
    ) -> Self {
        ScopedValue { value, release }
    }
}

/// Typed value-plus-release builder returned by contextual factories.
///
/// # Examples
///
/// ```rust
/// use rewire::{Container, Deps, Managed, Provider, Resource};
/// use std::sync::{Arc, Mutex};
///
/// struct Conn;
///
/// let db: Resource<Conn> = Resource::new("db", "app").unwrap();
/// let open = Arc::new(Mutex::new(0));
///
/// let container = Container::new();
/// let open_factory = open.clone();
/// container.contextual(&db, Deps::new(), move |_cx| {
///     *open_factory.lock().unwrap() += 1;
///     let open_release = open_factory.clone();
///     Ok(Managed::new(Conn).on_release(move |_fault| {
///         *open_release.lock().unwrap() -= 1;
///         Ok(())
///     }))
/// });
///
/// container
///     .context(&[], |cx| {
///         let _conn = cx.resolve(&db)?;
///         assert_eq!(*open.lock().unwrap(), 1);
///         Ok(())
///     })
///     .unwrap();
/// assert_eq!(*open.lock().unwrap(), 0); // released on scope exit
/// ```
pub struct Managed<T> {
    value: T,
    release: Option<ReleaseHook>,
}

impl<T> Managed<T> {
    /// Wraps a value with no release hook.
    pub fn new(value: T) -> Self {
        Managed { value, release: None }
    }

    /// Attaches the release hook; replaces any previous one.
    pub fn on_release<F>(mut self, hook: F) -> Self
    where
        F: FnOnce(Option<&DiError>) -> Result<(), BoxError> + Send + 'static,
    {
        self.release = Some(Box::new(hook));
        self
    }
}

impl<T: Send + Sync + 'static> Managed<T> {
    pub(crate) fn into_scoped(self) -> ScopedValue {
        let release = match self.release {
            Some(hook) => Release::Hook(hook),
            None => Release::Noop,
        };
        ScopedValue { value: Arc::new(self.value), release }
    }
}

/// Strategy that produces a resource's value.
///
/// `reify` resolves the strategy's own dependencies through `provider` and
/// returns the live value with its release handle. A given implementation
/// may be reified any number of times; each call is an independent
/// acquisition unless a sharing wrapper says otherwise.
pub trait Implementation: Send + Sync {
    /// Reifies the resource against the given provider.
    fn reify(&self, resource: &Key, provider: &Context) -> DiResult<ScopedValue>;
}

impl<I: Implementation + ?Sized> Implementation for Arc<I> {
    fn reify(&self, resource: &Key, provider: &Context) -> DiResult<ScopedValue> {
        (**self).reify(resource, provider)
    }
}

/// Ordered dependency declaration for factory implementations.
///
/// Declared dependencies are resolved through the provider before the
/// factory runs: positional bindings in declared order, then named bindings
/// in insertion order (the order among named bindings carries no
/// semantics). Because resolution is memoized per context, the factory's
/// own `resolve` calls for the same tokens are cache hits, so the declared
/// order alone fixes acquisition order, and with it teardown order.
///
/// # Examples
///
/// ```rust
/// use rewire::{Deps, Resource};
///
/// let pool: Resource<String> = Resource::new("pool", "db").unwrap();
/// let config: Resource<u32> = Resource::new("config", "db").unwrap();
///
/// let deps = Deps::new().arg(&pool).named("config", &config);
/// assert_eq!(deps.len(), 2);
/// ```
#[derive(Default, Clone)]
pub struct Deps {
    positional: Vec<Key>,
    named: Vec<(String, Key)>,
}

impl Deps {
    /// An empty dependency list.
    pub fn new() -> Self {
        Deps::default()
    }

    /// Appends a positional dependency.
    pub fn arg(mut self, resource: &dyn ResourceIdentity) -> Self {
        self.positional.push(resource.key().clone());
        self
    }

    /// Appends a named dependency.
    pub fn named(mut self, slot: &str, resource: &dyn ResourceIdentity) -> Self {
        self.named.push((slot.to_string(), resource.key().clone()));
        self
    }

    /// Number of declared dependencies.
    pub fn len(&self) -> usize {
        self.positional.len() + self.named.len()
    }

    /// True when no dependencies are declared.
    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.named.is_empty()
    }

    pub(crate) fn resolve_all(&self, provider: &Context) -> DiResult<()> {
        for key in &self.positional {
            provider.resolve_erased(key)?;
        }
        for (_slot, key) in &self.named {
            provider.resolve_erased(key)?;
        }
        Ok(())
    }
}

/// Implementation holding a single constant value.
///
/// Ignores the provider; every reification yields the same `Arc`, and
/// release is a no-op.
pub struct ConstantImplementation {
    value: AnyArc,
}

impl ConstantImplementation {
    /// Wraps the constant.
    pub fn new<T: Send + Sync + 'static>(value: T) -> Self {
        ConstantImplementation { value: Arc::new(value) }
    }
}

impl Implementation for ConstantImplementation {
    fn reify(&self, _resource: &Key, _provider: &Context) -> DiResult<ScopedValue> {
        Ok(ScopedValue::from_arc(self.value.clone()))
    }
}

/// Factory implementation whose value carries a release hook.
///
/// The factory returns a [`Managed`] value; its release hook is forwarded
/// unchanged to the owning context's pool.
pub struct ContextualImplementation<T, F> {
    deps: Deps,
    factory: F,
    _marker: PhantomData<fn() -> T>,
}

impl<T, F> ContextualImplementation<T, F>
where
    T: Send + Sync + 'static,
    F: Fn(&Context) -> DiResult<Managed<T>> + Send + Sync,
{
    /// Builds the implementation from a dependency list and a factory.
    pub fn new(deps: Deps, factory: F) -> Self {
        ContextualImplementation { deps, factory, _marker: PhantomData }
    }
}

impl<T, F> Implementation for ContextualImplementation<T, F>
where
    T: Send + Sync + 'static,
    F: Fn(&Context) -> DiResult<Managed<T>> + Send + Sync,
{
    fn reify(&self, _resource: &Key, provider: &Context) -> DiResult<ScopedValue> {
        self.deps.resolve_all(provider)?;
        let managed = (self.factory)(provider)?;
        Ok(managed.into_scoped())
    }
}

/// Factory implementation producing a plain value; release is a no-op.
pub struct PlainImplementation<T, F> {
    deps: Deps,
    factory: F,
    _marker: PhantomData<fn() -> T>,
}

impl<T, F> PlainImplementation<T, F>
where
    T: Send + Sync + 'static,
    F: Fn(&Context) -> DiResult<T> + Send + Sync,
{
    /// Builds the implementation from a dependency list and a factory.
    pub fn new(deps: Deps, factory: F) -> Self {
        PlainImplementation { deps, factory, _marker: PhantomData }
    }
}

impl<T, F> Implementation for PlainImplementation<T, F>
where
    T: Send + Sync + 'static,
    F: Fn(&Context) -> DiResult<T> + Send + Sync,
{
    fn reify(&self, _resource: &Key, provider: &Context) -> DiResult<ScopedValue> {
        self.deps.resolve_all(provider)?;
        let value = (self.factory)(provider)?;
        Ok(ScopedValue::new(value))
    }
}
