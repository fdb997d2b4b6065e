//! Provider traits: the resolution capability seam.
//!
//! [`ProviderCore`] is the object-safe erased surface; [`Provider`] layers
//! the typed generic API on top. Both [`Container`](crate::Container) and
//! [`Context`](crate::Context) satisfy the seam.

use std::any::Any;
use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::key::Key;
use crate::resource::{Resource, ResourceIdentity};

/// Core object-safe resolution surface.
///
/// Most users should use [`Provider`] instead, which provides the typed
/// generic method built on top of this trait.
pub trait ProviderCore: Send + Sync {
    /// Resolves a resource key to its type-erased value.
    fn resolve_erased(&self, key: &Key) -> DiResult<Arc<dyn Any + Send + Sync>>;
}

/// Typed resolution interface.
///
/// Anything exposing `resolve(resource) -> value` qualifies as a provider;
/// contexts resolve within their scope, containers perform one-shot
/// resolution through an ephemeral context.
///
/// # Examples
///
/// ```rust
/// use rewire::{Container, Provider, Resource};
///
/// let port: Resource<u16> = Resource::new("port", "app").unwrap();
/// let container = Container::new();
/// container.provide_constant(&port, 8080u16);
///
/// container
///     .context(&[], |cx| {
///         assert_eq!(*cx.resolve(&port)?, 8080);
///         Ok(())
///     })
///     .unwrap();
/// ```
pub trait Provider: ProviderCore {
    /// Resolves a resource to its value.
    ///
    /// The value is shared behind an `Arc`; within one context, repeated
    /// calls for the same resource return the same instance until the
    /// context drains.
    ///
    /// # Errors
    ///
    /// [`DiError::NotProvided`] when no implementation is found anywhere in
    /// the provider chain nor as a default; [`DiError::TypeMismatch`] when
    /// the registered implementation produced a different concrete type
    /// than this token promises.
    fn resolve<T: Send + Sync + 'static>(&self, resource: &Resource<T>) -> DiResult<Arc<T>>
    where
        Self: Sized,
    {
        let value = self.resolve_erased(resource.key())?;
        value.downcast::<T>().map_err(|_| DiError::TypeMismatch {
            canonical_name: resource.canonical_name().to_string(),
            expected: std::any::type_name::<T>(),
        })
    }
}

impl<P: ProviderCore + ?Sized> Provider for P {}
