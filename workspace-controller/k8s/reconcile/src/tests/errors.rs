use super::*;
use crate::Error;
use workspace_controller_core::{InvalidName, Step, Tier};
use workspace_controller_k8s_api::{
    quantity::ParseError, Namespace, ObjectMeta, ResourceQuota,
};

#[tokio::test]
async fn malformed_quantity_fails_at_the_quota() {
    let mut spec = spec();
    spec.resources.memory = "lots".to_string();
    let reconciler = reconciler_with("test", spec);

    assert_eq!(
        reconciler.reconcile("test").await.expect("pass"),
        Outcome::Created(Step::EnsureNamespace)
    );
    for _ in 0..2 {
        match reconciler.reconcile("test").await {
            Err(Error::Quantity {
                resource, value, source,
            }) => {
                assert_eq!(resource, "memory");
                assert_eq!(value, "lots");
                assert_eq!(source, ParseError::NotANumber);
            }
            res => panic!("unexpected result: {res:?}"),
        }
    }
    assert!(reconciler
        .store()
        .object::<ResourceQuota>(&quota_id())
        .is_none());
    assert_eq!(reconciler.store().take_writes().len(), 1);
}

#[tokio::test]
async fn malformed_quantity_fails_drift_correction() {
    let reconciler = converged().await;
    reconciler
        .store()
        .mutate::<Workspace>(&ResourceId::cluster("test"), |ws| {
            ws.spec.resources.cpu = "1Zi".to_string();
        });

    let res = reconciler.reconcile("test").await;
    assert!(
        matches!(res, Err(Error::Quantity { resource: "cpu", .. })),
        "{res:?}"
    );
    assert_eq!(reconciler.store().take_writes(), vec![]);
}

#[tokio::test]
async fn failed_create_is_retried_by_the_next_pass() {
    let reconciler = reconciler_with("test", spec());
    let store = reconciler.store();
    reconciler.reconcile("test").await.expect("pass");
    store.take_writes();

    store.fail_next::<ResourceQuota>(Op::Create);
    let res = reconciler.reconcile("test").await;
    assert!(
        matches!(
            res,
            Err(Error::Store {
                op: Op::Create,
                source: StoreError::Kube(_),
                ..
            })
        ),
        "{res:?}"
    );
    assert_eq!(store.take_writes(), vec![]);

    assert_eq!(
        reconciler.reconcile("test").await.expect("pass"),
        Outcome::Created(Step::EnsureQuota)
    );
}

#[tokio::test]
async fn failed_update_aborts_the_pass() {
    let reconciler = converged().await;
    let store = reconciler.store();

    store.mutate::<Namespace>(&ns_id(), |ns| ns.metadata.labels = None);
    store.mutate::<ResourceQuota>(&quota_id(), |q| q.metadata.labels = None);
    store.fail_next::<Namespace>(Op::Update);

    let res = reconciler.reconcile("test").await;
    assert!(
        matches!(res, Err(Error::Store { op: Op::Update, .. })),
        "{res:?}"
    );
    // Nothing after the failed write ran.
    assert_eq!(store.take_writes(), vec![]);

    assert_eq!(
        reconciler.reconcile("test").await.expect("pass"),
        Outcome::Converged { updates: 2 }
    );
}

#[tokio::test]
async fn failed_workspace_read_is_an_error() {
    let reconciler = reconciler_with("test", spec());
    reconciler.store().fail_next::<Workspace>(Op::Get);

    let res = reconciler.reconcile("test").await;
    assert!(
        matches!(res, Err(Error::Store { op: Op::Get, .. })),
        "{res:?}"
    );
    assert_eq!(reconciler.store().take_writes(), vec![]);
}

#[tokio::test]
async fn invalid_names_are_rejected_before_writing() {
    for (name, err) in [
        ("", InvalidName::Empty),
        ("Test", InvalidName::BadChar),
        ("test-", InvalidName::BadEdge),
    ] {
        let mut spec = spec();
        spec.name = name.to_string();
        let reconciler = reconciler_with("test", spec);

        match reconciler.reconcile("test").await {
            Err(Error::InvalidName { source, .. }) => assert_eq!(source, err, "{name:?}"),
            res => panic!("{name:?}: unexpected result: {res:?}"),
        }
        assert_eq!(reconciler.store().take_writes(), vec![], "{name:?}");
    }
}

#[tokio::test]
async fn multiple_subjects_are_rejected() {
    for (users, tier) in [
        (
            Users {
                admin: Some("a,b".to_string()),
                ..Users::default()
            },
            Tier::Admin,
        ),
        (
            Users {
                editor: Some(" b".to_string()),
                ..Users::default()
            },
            Tier::Editor,
        ),
        (
            Users {
                viewer: Some(String::new()),
                ..Users::default()
            },
            Tier::Viewer,
        ),
    ] {
        let mut spec = spec();
        spec.users = users;
        let reconciler = reconciler_with("test", spec);

        let res = reconciler.reconcile("test").await;
        assert!(
            matches!(res, Err(Error::InvalidSubject { tier: t, .. }) if t == tier),
            "{tier}: {res:?}"
        );
        assert_eq!(reconciler.store().take_writes(), vec![]);
    }
}

#[tokio::test]
async fn resources_owned_by_another_workspace_are_not_touched() {
    let reconciler = reconciler_with("test", spec());
    let store = reconciler.store();
    store.put(Namespace {
        metadata: ObjectMeta {
            name: Some("test".to_string()),
            annotations: Some(convert_args!(btreemap!(
                "environment.tf.operator.com/workspace" => "other",
            ))),
            ..Default::default()
        },
        ..Default::default()
    });

    for _ in 0..2 {
        match reconciler.reconcile("test").await {
            Err(Error::Claimed { kind, id, owner }) => {
                assert_eq!(kind, "Namespace");
                assert_eq!(id, ns_id());
                assert_eq!(owner, "other");
            }
            res => panic!("unexpected result: {res:?}"),
        }
    }
    assert_eq!(store.take_writes(), vec![]);
}

#[tokio::test]
async fn unowned_resources_are_adopted() {
    let reconciler = reconciler_with("test", spec());
    let store = reconciler.store();
    store.put(Namespace {
        metadata: ObjectMeta {
            name: Some("test".to_string()),
            ..Default::default()
        },
        ..Default::default()
    });

    let outcomes = converge(&reconciler, "test").await;
    assert_eq!(outcomes[0], Outcome::Created(Step::EnsureQuota));
    // Labels and annotations on the adopted namespace.
    assert_eq!(outcomes.last(), Some(&Outcome::Converged { updates: 2 }));

    let ns = store.object::<Namespace>(&ns_id()).expect("namespace");
    assert_eq!(ns.metadata.annotations, Some(owned(spec().annotations)));
}

#[tokio::test]
async fn metrics_count_passes_and_writes() {
    let mut registry = prometheus_client::registry::Registry::default();
    let metrics = ReconcileMetrics::register(&mut registry);
    let store = FakeStore::default();
    store.put(Workspace::new("test", spec()));
    let reconciler = Reconciler::new(store, metrics);

    converge(&reconciler, "test").await;
    reconciler.store().fail_next::<Workspace>(Op::Get);
    reconciler.reconcile("test").await.expect_err("pass must fail");

    let mut text = String::new();
    prometheus_client::encoding::text::encode(&mut text, &registry).expect("metrics must encode");
    for line in [
        r#"passes_total{outcome="created"} 8"#,
        r#"passes_total{outcome="converged"} 1"#,
        r#"passes_total{outcome="error"} 1"#,
        r#"writes_total{kind="Role",op="create"} 3"#,
    ] {
        assert!(text.contains(line), "missing {line:?} in:\n{text}");
    }
}
