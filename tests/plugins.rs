//! Plugin lifecycle integration tests

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::response::IntoResponse;
use tokio::sync::Notify;
use tower::ServiceExt;

use hammer::plugins::{Activation, factory_fn};
use hammer::{
    Error, FactorySet, HelperDecl, HelperSource, HostEvent, Plugin, RouteDecl, RouteSource,
    handler_fn, helper_fn,
};

mod common;
use common::{host_over, write_plugin, write_plugin_manifest};

/// Plugin serving fixed route and helper declarations
#[derive(Default)]
struct StaticPlugin {
    routes: Vec<RouteDecl>,
    helpers: Vec<HelperDecl>,
}

impl Plugin for StaticPlugin {
    fn routes(&self) -> Option<RouteSource> {
        if self.routes.is_empty() {
            None
        } else {
            Some(RouteSource::Static(self.routes.clone()))
        }
    }

    fn helpers(&self) -> Option<HelperSource> {
        if self.helpers.is_empty() {
            None
        } else {
            Some(HelperSource::Static(self.helpers.clone()))
        }
    }
}

fn ping_route() -> RouteDecl {
    RouteDecl::new(
        Method::GET,
        "/ping",
        handler_fn(|_req| async { "pong".into_response() }),
    )
}

#[tokio::test]
async fn unique_plugins_all_activate_exactly_once() {
    let dir = tempfile::tempdir().unwrap();
    write_plugin(dir.path(), "auth", "auth");
    write_plugin(dir.path(), "blog", "blog");
    write_plugin(dir.path(), "wiki", "wiki");

    let mut factories = FactorySet::new();
    for name in ["auth", "blog", "wiki"] {
        factories.register(
            name,
            factory_fn(|_| Activation::Ready(Arc::new(StaticPlugin::default()))),
        );
    }

    let host = host_over(dir.path(), factories);
    host.manager.initialize().await.unwrap();

    let mut names = host.manager.names().await;
    names.sort();
    assert_eq!(names, vec!["auth", "blog", "wiki"]);
    assert_eq!(host.manager.len().await, 3);
}

#[tokio::test]
async fn colliding_names_leave_exactly_one() {
    let dir = tempfile::tempdir().unwrap();
    // Two folders both declaring the name "dup"
    write_plugin(dir.path(), "dup-a", "dup");
    write_plugin(dir.path(), "dup-b", "dup");

    let mut factories = FactorySet::new();
    factories.register(
        "dup",
        factory_fn(|_| Activation::Ready(Arc::new(StaticPlugin::default()))),
    );

    let host = host_over(dir.path(), factories);
    let err = host.manager.initialize().await.unwrap_err();

    // The loser fails the batch; which folder wins depends on completion order
    match err {
        Error::PluginBatch { failures } => assert_eq!(failures.len(), 1),
        other => panic!("expected batch failure, got {other}"),
    }
    assert_eq!(host.manager.len().await, 1);
    assert!(host.manager.get("dup").await.is_some());
}

#[tokio::test]
async fn nameless_manifest_touches_no_registry() {
    let dir = tempfile::tempdir().unwrap();
    write_plugin_manifest(
        dir.path(),
        "anon",
        r#"{"main":"entry.json","hammer":">=0.1.0"}"#,
        true,
    );

    let host = host_over(dir.path(), FactorySet::new());
    let err = host.manager.initialize().await.unwrap_err();

    assert!(matches!(err, Error::PluginBatch { .. }));
    assert!(host.manager.is_empty().await);
    assert!(host.routes.is_empty().await);
    assert!(host.helpers.is_empty().await);
}

#[tokio::test]
async fn missing_main_fails_without_collection_entry() {
    let dir = tempfile::tempdir().unwrap();
    write_plugin_manifest(
        dir.path(),
        "bodiless",
        r#"{"name":"bodiless","main":"entry.json","hammer":">=0.1.0"}"#,
        false,
    );

    let host = host_over(dir.path(), FactorySet::new());
    let err = host
        .manager
        .activate_one(dir.path().join("bodiless"), false)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        hammer::ActivationError::MissingMainFile { .. }
    ));
    assert!(host.manager.is_empty().await);
}

#[tokio::test]
async fn route_lands_under_default_base() {
    let dir = tempfile::tempdir().unwrap();
    write_plugin(dir.path(), "auth", "auth");

    let mut factories = FactorySet::new();
    factories.register(
        "auth",
        factory_fn(|_| {
            Activation::Ready(Arc::new(StaticPlugin {
                routes: vec![ping_route()],
                ..StaticPlugin::default()
            }))
        }),
    );

    let host = host_over(dir.path(), factories);
    host.manager.initialize().await.unwrap();

    // Default base is /hammer/
    let router = host.routes.to_router().await;
    let response = router
        .oneshot(
            Request::builder()
                .uri("/hammer/ping")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&body[..], b"pong");
}

#[tokio::test]
async fn no_base_url_route_is_literal() {
    let dir = tempfile::tempdir().unwrap();
    write_plugin(dir.path(), "raw", "raw");

    let mut factories = FactorySet::new();
    factories.register(
        "raw",
        factory_fn(|_| {
            Activation::Ready(Arc::new(StaticPlugin {
                routes: vec![ping_route().without_base()],
                ..StaticPlugin::default()
            }))
        }),
    );

    let host = host_over(dir.path(), factories);
    host.manager.initialize().await.unwrap();

    let entries = host.routes.entries().await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].url, "/ping");
}

#[tokio::test]
async fn per_route_base_overrides_global_base() {
    let dir = tempfile::tempdir().unwrap();
    write_plugin(dir.path(), "custom", "custom");

    let mut factories = FactorySet::new();
    factories.register(
        "custom",
        factory_fn(|_| {
            Activation::Ready(Arc::new(StaticPlugin {
                routes: vec![
                    RouteDecl::new(
                        Method::GET,
                        "/y",
                        handler_fn(|_req| async { "ok".into_response() }),
                    )
                    .with_base_url("/x"),
                ],
                ..StaticPlugin::default()
            }))
        }),
    );

    let host = host_over(dir.path(), factories);
    host.manager.initialize().await.unwrap();

    let entries = host.routes.entries().await;
    assert_eq!(entries.len(), 1);
    // Joined with no duplicate slashes
    assert_eq!(entries[0].url, "/x/y");
}

#[tokio::test]
async fn helper_is_retrievable_under_name_and_alias() {
    let dir = tempfile::tempdir().unwrap();
    write_plugin(dir.path(), "fmt", "fmt");

    let mut factories = FactorySet::new();
    factories.register(
        "fmt",
        factory_fn(|_| {
            Activation::Ready(Arc::new(StaticPlugin {
                helpers: vec![
                    HelperDecl::new(
                        "foo",
                        helper_fn(|_| async { Ok(serde_json::json!("rendered")) }),
                    )
                    .with_aliases(["bar"]),
                ],
                ..StaticPlugin::default()
            }))
        }),
    );

    let host = host_over(dir.path(), factories);
    host.manager.initialize().await.unwrap();

    assert!(host.helpers.contains("foo").await);
    assert!(host.helpers.contains("bar").await);
    assert_eq!(
        host.helpers.call("bar", &[]).await.unwrap(),
        serde_json::json!("rendered")
    );
}

#[tokio::test]
async fn lazy_route_source_registers_like_static() {
    let dir = tempfile::tempdir().unwrap();
    write_plugin(dir.path(), "lazy", "lazy");

    struct LazyPlugin;
    impl Plugin for LazyPlugin {
        fn routes(&self) -> Option<RouteSource> {
            Some(RouteSource::Lazy(Box::new(|| vec![ping_route()])))
        }
    }

    let mut factories = FactorySet::new();
    factories.register("lazy", factory_fn(|_| Activation::Ready(Arc::new(LazyPlugin))));

    let host = host_over(dir.path(), factories);
    host.manager.initialize().await.unwrap();

    let entries = host.routes.entries().await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].url, "/hammer/ping");
}

#[tokio::test]
async fn rejecting_plugin_fails_batch_but_survivors_keep_routes() {
    let dir = tempfile::tempdir().unwrap();
    write_plugin(dir.path(), "good", "good");
    write_plugin(dir.path(), "doomed", "doomed");

    let mut factories = FactorySet::new();
    factories.register(
        "good",
        factory_fn(|_| {
            Activation::Ready(Arc::new(StaticPlugin {
                routes: vec![ping_route()],
                ..StaticPlugin::default()
            }))
        }),
    );
    factories.register(
        "doomed",
        factory_fn(|_| {
            Activation::Deferred(Box::pin(async {
                tokio::task::yield_now().await;
                Err(anyhow::anyhow!("never came up"))
            }))
        }),
    );

    let host = host_over(dir.path(), factories);
    let err = host.manager.initialize().await.unwrap_err();
    assert!(matches!(err, Error::PluginBatch { .. }));

    // Partial side effects persist despite the aggregate failure
    assert!(host.manager.get("good").await.is_some());
    assert!(host.manager.get("doomed").await.is_none());
    let entries = host.routes.entries().await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].url, "/hammer/ping");
}

#[tokio::test]
async fn deferred_plugins_activate_concurrently() {
    let dir = tempfile::tempdir().unwrap();
    write_plugin(dir.path(), "slow-a", "slow-a");
    write_plugin(dir.path(), "slow-b", "slow-b");

    let mut factories = FactorySet::new();
    for name in ["slow-a", "slow-b"] {
        factories.register(
            name,
            factory_fn(|_| {
                Activation::Deferred(Box::pin(async {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    Ok(Arc::new(StaticPlugin::default()) as Arc<dyn Plugin>)
                }))
            }),
        );
    }

    let host = host_over(dir.path(), factories);
    host.manager.initialize().await.unwrap();
    assert_eq!(host.manager.len().await, 2);
}

#[tokio::test]
async fn ready_event_carries_final_collection() {
    let dir = tempfile::tempdir().unwrap();
    write_plugin(dir.path(), "auth", "auth");

    let mut factories = FactorySet::new();
    factories.register(
        "auth",
        factory_fn(|_| Activation::Ready(Arc::new(StaticPlugin::default()))),
    );

    let host = host_over(dir.path(), factories);
    let mut events = host.bus.subscribe();
    host.manager.initialize().await.unwrap();

    let event = events.recv().await.unwrap();
    assert_eq!(
        event,
        HostEvent::PluginsRunning {
            plugins: vec!["auth".to_string()],
        }
    );
}

#[tokio::test]
async fn initialize_hooks_fire_without_blocking_readiness() {
    let dir = tempfile::tempdir().unwrap();
    write_plugin(dir.path(), "hooked", "hooked");
    write_plugin(dir.path(), "grumpy", "grumpy");

    struct HookedPlugin {
        ran: Arc<AtomicBool>,
        notify: Arc<Notify>,
    }

    #[async_trait::async_trait]
    impl Plugin for HookedPlugin {
        async fn initialize(&self) -> anyhow::Result<()> {
            self.ran.store(true, Ordering::SeqCst);
            self.notify.notify_one();
            Ok(())
        }
    }

    struct GrumpyPlugin;

    #[async_trait::async_trait]
    impl Plugin for GrumpyPlugin {
        async fn initialize(&self) -> anyhow::Result<()> {
            Err(anyhow::anyhow!("refusing to warm up"))
        }
    }

    let ran = Arc::new(AtomicBool::new(false));
    let notify = Arc::new(Notify::new());

    let mut factories = FactorySet::new();
    let (ran_clone, notify_clone) = (ran.clone(), notify.clone());
    factories.register(
        "hooked",
        factory_fn(move |_| {
            Activation::Ready(Arc::new(HookedPlugin {
                ran: ran_clone.clone(),
                notify: notify_clone.clone(),
            }))
        }),
    );
    factories.register("grumpy", factory_fn(|_| Activation::Ready(Arc::new(GrumpyPlugin))));

    let host = host_over(dir.path(), factories);
    // A hook that errors does not fail initialize()
    host.manager.initialize().await.unwrap();

    tokio::time::timeout(Duration::from_secs(1), notify.notified())
        .await
        .expect("initialize hook never ran");
    assert!(ran.load(Ordering::SeqCst));
}

#[tokio::test]
async fn deactivate_runs_hook_and_keeps_routes() {
    let dir = tempfile::tempdir().unwrap();
    write_plugin(dir.path(), "closable", "closable");

    struct ClosablePlugin {
        closed: Arc<AtomicBool>,
    }

    #[async_trait::async_trait]
    impl Plugin for ClosablePlugin {
        fn routes(&self) -> Option<RouteSource> {
            Some(RouteSource::Static(vec![ping_route()]))
        }

        async fn deactivate(&self) -> anyhow::Result<()> {
            self.closed.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    let closed = Arc::new(AtomicBool::new(false));
    let closed_clone = closed.clone();

    let mut factories = FactorySet::new();
    factories.register(
        "closable",
        factory_fn(move |_| {
            Activation::Ready(Arc::new(ClosablePlugin {
                closed: closed_clone.clone(),
            }))
        }),
    );

    let host = host_over(dir.path(), factories);
    host.manager.initialize().await.unwrap();
    assert_eq!(host.routes.len().await, 1);

    host.manager.deactivate("closable").await.unwrap();
    assert!(closed.load(Ordering::SeqCst));
    assert!(host.manager.is_empty().await);

    // Documented limitation: registered routes are not retracted
    assert_eq!(host.routes.len().await, 1);
}

#[tokio::test]
async fn failing_deactivate_hook_keeps_the_plugin() {
    let dir = tempfile::tempdir().unwrap();
    write_plugin(dir.path(), "stubborn", "stubborn");

    struct StubbornPlugin;

    #[async_trait::async_trait]
    impl Plugin for StubbornPlugin {
        async fn deactivate(&self) -> anyhow::Result<()> {
            Err(anyhow::anyhow!("refusing to die"))
        }
    }

    let mut factories = FactorySet::new();
    factories.register(
        "stubborn",
        factory_fn(|_| Activation::Ready(Arc::new(StubbornPlugin))),
    );

    let host = host_over(dir.path(), factories);
    host.manager.initialize().await.unwrap();

    let err = host.manager.deactivate("stubborn").await.unwrap_err();
    assert!(matches!(err, Error::PluginHook { .. }));
    assert!(host.manager.get("stubborn").await.is_some());
}

#[tokio::test]
async fn unregistered_entry_point_is_not_constructible() {
    let dir = tempfile::tempdir().unwrap();
    write_plugin(dir.path(), "ghost", "ghost");

    let host = host_over(dir.path(), FactorySet::new());
    let err = host.manager.initialize().await.unwrap_err();

    match err {
        Error::PluginBatch { failures } => {
            assert_eq!(failures.len(), 1);
            assert!(matches!(
                failures[0].error,
                hammer::ActivationError::EntryNotConstructible { .. }
            ));
        }
        other => panic!("expected batch failure, got {other}"),
    }
}
