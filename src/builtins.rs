//! Built-in resources provided by the runtime itself.

use once_cell::sync::Lazy;

use crate::context::Context;
use crate::key::Key;
use crate::resource::Resource;

const NAMESPACE: &str = "rewire.builtins";

static CONTEXT: Lazy<Resource<Context>> =
    Lazy::new(|| Resource::from_key(Key::new_unchecked("context", NAMESPACE)));

/// The current-context resource.
///
/// Resolving it yields a handle to the resolving context itself, letting a
/// factory reach its scope explicitly instead of through the provider
/// argument. The handle is never pooled and never released.
///
/// # Examples
///
/// ```rust
/// use rewire::{builtins, Container, Provider};
///
/// Container::new()
///     .context(&[], |cx| {
///         let current = cx.resolve(&builtins::context())?;
///         assert!(current.is_same(cx));
///         Ok(())
///     })
///     .unwrap();
/// ```
pub fn context() -> Resource<Context> {
    CONTEXT.clone()
}

pub(crate) fn is_current_context(key: &Key) -> bool {
    key.canonical_name() == CONTEXT.canonical_name()
}
