//! Sharing wrappers: reference-counted reuse of one implementation across
//! several resources or scopes.
//!
//! A [`SharedImplementation`] keeps one live instance per context, no
//! matter how many resource tokens it is bound to; the instance is entered
//! on the first acquisition and released when the last pool entry in that
//! context lets go. A [`GloballySharedImplementation`] goes further and
//! keeps a single instance across all scopes, alive from the first
//! acquisition anywhere until the last release anywhere.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::context::Context;
use crate::error::{DiError, DiResult};
use crate::implementation::{AnyArc, BoxError, Implementation, Release, ScopedValue};
use crate::key::Key;

/// Reference counter pairing a live value with its pending release.
///
/// The count moves 0 to 1 on install and back to 0 on the final release,
/// which is when the stored release hook runs. Releasing at count zero is a
/// bug in the caller and panics.
#[derive(Default)]
pub struct RefCounter {
    count: usize,
    value: Option<AnyArc>,
    release: Option<Release>,
}

impl RefCounter {
    /// A counter with no live value.
    pub fn new() -> Self {
        RefCounter::default()
    }

    /// Current number of outstanding acquisitions.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Records another acquisition of the already-live value, or returns
    /// `None` when nothing is installed yet.
    pub(crate) fn hit(&mut self) -> Option<AnyArc> {
        if self.count == 0 {
            return None;
        }
        self.count += 1;
        self.value.clone()
    }

    /// Installs a freshly reified value as the first acquisition.
    pub(crate) fn install(&mut self, scoped: ScopedValue) -> AnyArc {
        self.count += 1;
        let value = scoped.value.clone();
        self.value = Some(scoped.value);
        self.release = Some(scoped.release);
        value
    }

    /// Drops one acquisition; at zero the stored release hook runs with
    /// `fault` and the value is let go.
    ///
    /// # Panics
    ///
    /// Panics when the count is already zero.
    pub(crate) fn release(&mut self, fault: Option<&DiError>) -> Result<(), BoxError> {
        assert!(self.count > 0, "release without a matching acquisition");
        self.count -= 1;
        if self.count > 0 {
            return Ok(());
        }
        self.value = None;
        match self.release.take() {
            Some(release) => release.run(fault),
            None => Ok(()),
        }
    }
}

/// Wraps an implementation so each context holds at most one live instance.
///
/// Useful when one implementation backs several resource tokens: every
/// token resolved in a context yields the same instance, entered once, and
/// the underlying release runs only when the context drains its last
/// holding entry.
///
/// The wrapper is cheaply clonable; clones share the counters, so binding
/// clones to different resources keeps them counted together.
///
/// # Examples
///
/// ```rust
/// use rewire::{shared, Container, Deps, PlainImplementation, Provider, Resource};
///
/// let a: Resource<String> = Resource::new("a", "app").unwrap();
/// let b: Resource<String> = Resource::new("b", "app").unwrap();
///
/// let engine = shared(PlainImplementation::new(Deps::new(), |_cx| {
///     Ok("engine".to_string())
/// }));
///
/// let container = Container::new();
/// container.provide(&a, engine.clone());
/// container.provide(&b, engine);
///
/// container
///     .context(&[], |cx| {
///         // Both tokens resolve to the one shared instance.
///         assert!(std::sync::Arc::ptr_eq(&cx.resolve(&a)?, &cx.resolve(&b)?));
///         Ok(())
///     })
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct SharedImplementation {
    inner: Arc<dyn Implementation>,
    counters: Arc<Mutex<HashMap<usize, RefCounter>>>,
}

impl SharedImplementation {
    /// Wraps `inner` with per-context reference counting.
    pub fn new<I: Implementation + 'static>(inner: I) -> Self {
        SharedImplementation {
            inner: Arc::new(inner),
            counters: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl Implementation for SharedImplementation {
    fn reify(&self, resource: &Key, provider: &Context) -> DiResult<ScopedValue> {
        let id = provider.ptr_id();
        let hit = self
            .counters
            .lock()
            .unwrap()
            .entry(id)
            .or_default()
            .hit();
        // Reify outside the lock so the underlying factory may resolve
        // other shared resources through the same wrapper set.
        let value = match hit {
            Some(value) => value,
            None => match self.inner.reify(resource, provider) {
                Ok(scoped) => self
                    .counters
                    .lock()
                    .unwrap()
                    .entry(id)
                    .or_default()
                    .install(scoped),
                Err(e) => {
                    // Nothing was installed; drop the empty counter so the
                    // map does not accumulate entries for failed contexts.
                    let mut map = self.counters.lock().unwrap();
                    if map.get(&id).map_or(false, |c| c.count() == 0) {
                        map.remove(&id);
                    }
                    return Err(e);
                }
            },
        };
        let counters = self.counters.clone();
        let release = Release::Hook(Box::new(move |fault| {
            let mut map = counters.lock().unwrap();
            let counter = map
                .get_mut(&id)
                .expect("release without a matching acquisition");
            let result = counter.release(fault);
            if counter.count() == 0 {
                map.remove(&id);
            }
            result
        }));
        Ok(ScopedValue::from_arc_with_release(value, release))
    }
}

/// Wraps an implementation so one live instance spans every scope.
///
/// The instance is reified lazily against the context that owns the
/// resource's binding, enters on the first acquisition anywhere, and
/// releases only when the last holding context drains. Because the owner is
/// found by walking the binding chain, dependencies of a globally shared
/// resource must be reachable from the owning scope; bindings private to a
/// deeper child are not visible to it.
#[derive(Clone)]
pub struct GloballySharedImplementation {
    inner: Arc<dyn Implementation>,
    slot: Arc<Mutex<RefCounter>>,
}

impl GloballySharedImplementation {
    /// Wraps `inner` with global reference counting.
    pub fn new<I: Implementation + 'static>(inner: I) -> Self {
        GloballySharedImplementation {
            inner: Arc::new(inner),
            slot: Arc::new(Mutex::new(RefCounter::new())),
        }
    }
}

impl Implementation for GloballySharedImplementation {
    fn reify(&self, resource: &Key, provider: &Context) -> DiResult<ScopedValue> {
        let owner = provider.owner_of(resource);
        let hit = self.slot.lock().unwrap().hit();
        let value = match hit {
            Some(value) => value,
            None => {
                let scoped = self.inner.reify(resource, &owner)?;
                self.slot.lock().unwrap().install(scoped)
            }
        };
        let slot = self.slot.clone();
        let release = Release::Hook(Box::new(move |fault| slot.lock().unwrap().release(fault)));
        Ok(ScopedValue::from_arc_with_release(value, release))
    }
}

/// Wraps an implementation for per-context sharing.
pub fn shared<I: Implementation + 'static>(inner: I) -> SharedImplementation {
    SharedImplementation::new(inner)
}

/// Wraps an implementation for cross-scope sharing.
pub fn globally_shared<I: Implementation + 'static>(inner: I) -> GloballySharedImplementation {
    GloballySharedImplementation::new(inner)
}
