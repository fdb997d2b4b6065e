//! Internal implementation details not part of the public API.

mod cycle;

pub(crate) use cycle::resolution_guard;
