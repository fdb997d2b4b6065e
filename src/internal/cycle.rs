//! Cyclic dependency detection infrastructure.

use std::cell::RefCell;
use std::sync::Arc;

use crate::error::{DiError, DiResult};

const MAX_DEPTH: usize = 1024;

// Thread-local resolution stack; resolution on a given context tree is
// single-threaded, so the stack mirrors the in-flight resolve calls.
thread_local! {
    static RESOLUTION_TLS: RefCell<Vec<Arc<str>>> = RefCell::new(Vec::new());
}

/// Guard keeping one resolve frame on the thread-local stack.
pub(crate) struct StackGuard {
    _private: (),
}

/// Pushes `name` onto the resolution stack, failing if it is already
/// present (a cycle) or the stack is at the depth cap. The frame pops when
/// the returned guard drops.
pub(crate) fn resolution_guard(name: Arc<str>) -> DiResult<StackGuard> {
    RESOLUTION_TLS.with(|tls| {
        let mut stack = tls.borrow_mut();

        // Cycle detection BEFORE pushing the new name
        if stack.iter().any(|n| **n == *name) {
            let mut path: Vec<String> = stack.iter().map(|n| n.to_string()).collect();
            path.push(name.to_string());
            return Err(DiError::Circular { path });
        }

        if stack.len() >= MAX_DEPTH {
            return Err(DiError::DepthExceeded(stack.len()));
        }

        stack.push(name);
        Ok(StackGuard { _private: () })
    })
}

impl Drop for StackGuard {
    fn drop(&mut self) {
        RESOLUTION_TLS.with(|tls| {
            tls.borrow_mut().pop();
        });
    }
}
