//! # rewire
//!
//! A lightweight dependency injection runtime built around three ideas:
//!
//! - **Resources** are declarative tokens. A [`Resource<T>`] names a
//!   capability (`namespace.name`) and records the type a resolution
//!   yields; it says nothing about how the value is made.
//! - **Containers** bind resources to [`Implementation`]s. A [`Container`]
//!   is an inheritable registry: children shadow selectively and fall back
//!   to their parent, so a test or dev profile overrides only what it must.
//! - **Contexts** resolve. A [`Context`] memoizes every acquisition in an
//!   ordered pool and, when its scope closes, drains in reverse acquisition
//!   order so dependents release before their dependencies.
//!
//! ## Quick start
//!
//! ```rust
//! use rewire::{Container, Deps, Provider, Resource};
//!
//! let config_dir: Resource<String> = Resource::new("config_dir", "app").unwrap();
//! let db_path: Resource<String> = Resource::new("db_path", "app").unwrap();
//!
//! let container = Container::new();
//! container.provide_constant(&config_dir, "/etc/app".to_string());
//! let dir = config_dir.clone();
//! container.plain(&db_path, Deps::new().arg(&config_dir), move |cx| {
//!     Ok(format!("{}/database.yml", cx.resolve(&dir)?))
//! });
//!
//! container
//!     .context(&[], |cx| {
//!         assert_eq!(*cx.resolve(&db_path)?, "/etc/app/database.yml");
//!         Ok(())
//!     })
//!     .unwrap();
//! ```
//!
//! Resources holding things that need teardown use a contextual factory:
//! the factory returns a [`Managed`] value whose release hook runs when the
//! owning scope drains. Scopes nest with [`Context::child`]; a child
//! releases only what it reified itself, while anything delegated to the
//! parent stays alive for the parent's full lifetime. Sharing wrappers
//! ([`shared`], [`globally_shared`]) let one implementation back several
//! tokens, entered once and released with the last holder.
//!
//! Resolution is fail-fast and explicit: missing bindings, type mismatches,
//! and dependency cycles all surface as [`DiError`] values rather than
//! panics.

#![warn(missing_docs)]

mod container;
mod context;
mod error;
mod implementation;
mod internal;
mod key;
mod provider;
mod resource;
mod shared;

pub mod builtins;

pub use container::Container;
pub use context::Context;
pub use error::{DiError, DiResult};
pub use implementation::{
    BoxError, ConstantImplementation, ContextualImplementation, Deps, Implementation, Managed,
    PlainImplementation, ScopedValue,
};
pub use key::Key;
pub use provider::{Provider, ProviderCore};
pub use resource::{Resource, ResourceIdentity};
pub use shared::{
    globally_shared, shared, GloballySharedImplementation, RefCounter, SharedImplementation,
};
