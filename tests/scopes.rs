use rewire::{Container, Deps, DiError, Provider, Resource};
use std::sync::{Arc, Mutex};

#[test]
fn test_child_delegates_unshadowed_to_parent() {
    let item: Resource<String> = Resource::new("item", "app").unwrap();
    let counter = Arc::new(Mutex::new(0));
    let counter_clone = counter.clone();

    let container = Container::new();
    container.plain(&item, Deps::new(), move |_| {
        let mut c = counter_clone.lock().unwrap();
        *c += 1;
        Ok(format!("instance-{}", *c))
    });

    container
        .context(&[], |cx| {
            let outer = cx.resolve(&item)?;
            cx.child(&[], |child| {
                // The parent owns the instance; the child sees the same one.
                let inner = child.resolve(&item)?;
                assert!(Arc::ptr_eq(&outer, &inner));
                Ok(())
            })?;
            // Still cached after the child drained.
            let again = cx.resolve(&item)?;
            assert!(Arc::ptr_eq(&outer, &again));
            Ok(())
        })
        .unwrap();
    assert_eq!(*counter.lock().unwrap(), 1);
}

#[test]
fn test_child_drain_leaves_parent_entries_alive() {
    let item: Resource<u32> = Resource::new("item", "app").unwrap();
    let live = Arc::new(Mutex::new(0));
    let live_factory = live.clone();

    let container = Container::new();
    container.contextual(&item, Deps::new(), move |_| {
        *live_factory.lock().unwrap() += 1;
        let live_release = live_factory.clone();
        Ok(rewire::Managed::new(1u32).on_release(move |_| {
            *live_release.lock().unwrap() -= 1;
            Ok(())
        }))
    });

    container
        .context(&[], |cx| {
            let _outer = cx.resolve(&item)?;
            cx.child(&[], |child| {
                let _inner = child.resolve(&item)?;
                assert_eq!(*live.lock().unwrap(), 1);
                Ok(())
            })?;
            // Child drained, but it never owned the entry.
            assert_eq!(*live.lock().unwrap(), 1);
            Ok(())
        })
        .unwrap();
    assert_eq!(*live.lock().unwrap(), 0);
}

#[test]
fn test_context_binding_shadows_for_scope_and_descendants() {
    let name: Resource<String> = Resource::new("name", "app").unwrap();

    let container = Container::new();
    container.provide_constant(&name, "base".to_string());

    container
        .context(&[], |cx| {
            cx.child(&[], |child| {
                child.provide_constant(&name, "shadowed".to_string());
                assert_eq!(*child.resolve(&name)?, "shadowed");
                child.child(&[], |grandchild| {
                    // Descendants inherit the shadow.
                    assert_eq!(*grandchild.resolve(&name)?, "shadowed");
                    Ok(())
                })
            })?;
            // The parent never saw the shadow.
            assert_eq!(*cx.resolve(&name)?, "base");
            Ok(())
        })
        .unwrap();
}

#[test]
fn test_sibling_scopes_are_isolated() {
    let item: Resource<u32> = Resource::new("item", "app").unwrap();
    let counter = Arc::new(Mutex::new(0u32));
    let counter_clone = counter.clone();

    let container = Container::new();
    container.plain(&item, Deps::new(), move |_| {
        let mut c = counter_clone.lock().unwrap();
        *c += 1;
        Ok(*c)
    });

    container
        .context(&[], |cx| {
            // Each sibling shadows the resource, so each reifies its own.
            let first = cx.child(&[], |child| {
                child.plain(&item, Deps::new(), |_| Ok(100u32));
                Ok(*child.resolve(&item)?)
            })?;
            let second = cx.child(&[], |child| {
                child.plain(&item, Deps::new(), |_| Ok(200u32));
                Ok(*child.resolve(&item)?)
            })?;
            assert_eq!(first, 100);
            assert_eq!(second, 200);
            Ok(())
        })
        .unwrap();
}

#[test]
fn test_circular_dependency_detected() {
    let a: Resource<u32> = Resource::new("a", "cyc").unwrap();
    let b: Resource<u32> = Resource::new("b", "cyc").unwrap();

    let container = Container::new();
    let b_dep = b.clone();
    container.plain(&a, Deps::new(), move |cx| Ok(*cx.resolve(&b_dep)? + 1));
    let a_dep = a.clone();
    container.plain(&b, Deps::new(), move |cx| Ok(*cx.resolve(&a_dep)? + 1));

    let err = container
        .context(&[], |cx| cx.resolve(&a).map(|_| ()))
        .unwrap_err();
    match err {
        DiError::Circular { path } => {
            assert_eq!(path, vec!["cyc.a", "cyc.b", "cyc.a"]);
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_self_dependency_detected() {
    let a: Resource<u32> = Resource::new("a", "cyc").unwrap();

    let container = Container::new();
    let a_dep = a.clone();
    container.plain(&a, Deps::new(), move |cx| Ok(*cx.resolve(&a_dep)? + 1));

    let err = container
        .context(&[], |cx| cx.resolve(&a).map(|_| ()))
        .unwrap_err();
    assert!(matches!(err, DiError::Circular { .. }));
}

#[test]
fn test_resolution_recovers_after_cycle_error() {
    let a: Resource<u32> = Resource::new("a", "cyc").unwrap();
    let ok: Resource<u32> = Resource::new("ok", "cyc").unwrap();

    let container = Container::new();
    let a_dep = a.clone();
    container.plain(&a, Deps::new(), move |cx| Ok(*cx.resolve(&a_dep)? + 1));
    container.provide_constant(&ok, 7u32);

    container
        .context(&[], |cx| {
            assert!(cx.resolve(&a).is_err());
            // The failed resolution left no frames behind.
            assert_eq!(*cx.resolve(&ok)?, 7);
            assert!(cx.resolve(&a).is_err());
            Ok(())
        })
        .unwrap();
}

#[test]
fn test_scope_closure_returns_value() {
    let value: Resource<u32> = Resource::new("value", "app").unwrap();
    let container = Container::new();
    container.provide_constant(&value, 3u32);

    let tripled = container
        .context(&[], |cx| {
            let v = cx.resolve(&value)?;
            cx.child(&[], |child| Ok(*child.resolve(&value)? * *v))
        })
        .unwrap();
    assert_eq!(tripled, 9);
}

#[test]
fn test_context_is_drained_after_scope_exit() {
    let container = Container::new();
    let escaped = container
        .context(&[], |cx| Ok(cx.clone()))
        .unwrap();
    assert!(escaped.is_drained());
    // Draining again is a no-op.
    escaped.drain().unwrap();
}

#[test]
#[should_panic(expected = "cannot resolve on a drained context")]
fn test_resolving_on_drained_context_panics() {
    let value: Resource<u32> = Resource::new("value", "app").unwrap();
    let container = Container::new();
    container.provide_constant(&value, 1u32);

    let escaped = container.context(&[], |cx| Ok(cx.clone())).unwrap();
    let _ = escaped.resolve(&value);
}

#[test]
fn test_resolution_depth_is_capped() {
    let container = Container::new();
    let resources: Vec<Resource<u64>> = (0..1100)
        .map(|i| Resource::new(&format!("link{}", i), "deep").unwrap())
        .collect();

    container.provide_constant(&resources[0], 0u64);
    for i in 1..resources.len() {
        let prev = resources[i - 1].clone();
        container.plain(&resources[i], Deps::new(), move |cx| {
            Ok(*cx.resolve(&prev)? + 1)
        });
    }

    let tail = resources.last().unwrap();
    let err = container
        .context(&[], |cx| cx.resolve(tail).map(|_| ()))
        .unwrap_err();
    assert_eq!(err, DiError::DepthExceeded(1024));

    // A chain that fits under the cap still resolves.
    assert_eq!(*container.resolve(&resources[1000]).unwrap(), 1000);
}
