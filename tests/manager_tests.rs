/// Version lifecycle tests
///
/// Exercises the manager invariants end to end against the in-memory SQLite
/// store: single-current, name uniqueness, the online edit lock and the
/// caller-scoped flow listing.

mod common;

use common::{current_count, env, grant_read, seed_flow, seed_version, ADMIN, OUTSIDER, OWNER};
use flowver::access::Caller;
use flowver::error::FlowError;
use flowver::flow::types::{FlowCreate, FlowStatus, FlowVersionCreate, FlowVersionPatch};
use serde_json::json;

fn caller(user_id: i64) -> Caller {
    Caller { user_id }
}

#[tokio::test]
async fn created_flows_start_as_drafts_owned_by_the_caller() {
    let env = env().await;
    let flow = env
        .manager
        .create_flow(
            &caller(OWNER),
            FlowCreate {
                name: "fresh".to_string(),
                description: String::new(),
            },
        )
        .await
        .expect("create flow");

    assert_eq!(flow.status, FlowStatus::Draft);
    assert_eq!(flow.user_id, OWNER);
    assert!(!flow.id.is_empty());

    let page = env
        .manager
        .list_flows(&caller(OWNER), None, None, 1, 10)
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert!(page.data[0].write);
}

#[tokio::test]
async fn switching_current_preserves_single_current_invariant() {
    let env = env().await;
    seed_flow(&env, "f1", OWNER, FlowStatus::Draft).await;
    let v1 = seed_version(&env, "f1", "v1", true, json!({})).await;
    let v2 = seed_version(&env, "f1", "v2", false, json!({})).await;

    assert_eq!(current_count(&env, "f1").await, 1);

    env.manager
        .set_current_version(&caller(OWNER), "f1", v2.id)
        .await
        .expect("switch current");

    assert_eq!(current_count(&env, "f1").await, 1);
    let v2 = env.manager.get_version(v2.id).await.unwrap();
    let v1 = env.manager.get_version(v1.id).await.unwrap();
    assert!(v2.is_current);
    assert!(!v1.is_current);
}

#[tokio::test]
async fn setting_the_already_current_version_is_a_successful_noop() {
    let env = env().await;
    seed_flow(&env, "f1", OWNER, FlowStatus::Draft).await;
    let v1 = seed_version(&env, "f1", "v1", true, json!({})).await;

    env.manager
        .set_current_version(&caller(OWNER), "f1", v1.id)
        .await
        .expect("no-op switch");

    assert_eq!(current_count(&env, "f1").await, 1);
}

#[tokio::test]
async fn set_current_rejects_versions_of_another_flow() {
    let env = env().await;
    seed_flow(&env, "f1", OWNER, FlowStatus::Draft).await;
    seed_flow(&env, "f2", OWNER, FlowStatus::Draft).await;
    seed_version(&env, "f1", "v1", true, json!({})).await;
    let stranger = seed_version(&env, "f2", "v1", true, json!({})).await;

    let err = env
        .manager
        .set_current_version(&caller(OWNER), "f1", stranger.id)
        .await
        .unwrap_err();
    assert!(matches!(err, FlowError::NotFound(_)));
    assert_eq!(current_count(&env, "f1").await, 1);
}

#[tokio::test]
async fn current_version_cannot_be_deleted_even_by_admins() {
    let env = env().await;
    seed_flow(&env, "f1", OWNER, FlowStatus::Draft).await;
    let v1 = seed_version(&env, "f1", "v1", true, json!({})).await;

    let err = env
        .manager
        .delete_version(&caller(ADMIN), v1.id)
        .await
        .unwrap_err();
    assert!(matches!(err, FlowError::CurrentVersionConflict(id) if id == v1.id));
}

#[tokio::test]
async fn non_current_versions_are_deletable_by_writers_only() {
    let env = env().await;
    seed_flow(&env, "f1", OWNER, FlowStatus::Draft).await;
    seed_version(&env, "f1", "v1", true, json!({})).await;
    let v2 = seed_version(&env, "f1", "v2", false, json!({})).await;

    let err = env
        .manager
        .delete_version(&caller(OUTSIDER), v2.id)
        .await
        .unwrap_err();
    assert!(matches!(err, FlowError::Unauthorized(_)));

    env.manager
        .delete_version(&caller(OWNER), v2.id)
        .await
        .expect("owner delete");

    let err = env.manager.get_version(v2.id).await.unwrap_err();
    assert!(matches!(err, FlowError::NotFound(_)));
}

#[tokio::test]
async fn delete_of_missing_version_reports_not_found() {
    let env = env().await;
    let err = env
        .manager
        .delete_version(&caller(ADMIN), 424242)
        .await
        .unwrap_err();
    assert!(matches!(err, FlowError::NotFound(_)));
}

#[tokio::test]
async fn online_flows_lock_edits_of_current_and_version_switching() {
    let env = env().await;
    seed_flow(&env, "f1", OWNER, FlowStatus::Online).await;
    let v1 = seed_version(&env, "f1", "v1", true, json!({})).await;
    let v2 = seed_version(&env, "f1", "v2", false, json!({})).await;

    let err = env
        .manager
        .update_version(
            &caller(OWNER),
            v1.id,
            FlowVersionPatch {
                description: Some("edit".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, FlowError::OnlineEditLocked(_)));

    let err = env
        .manager
        .set_current_version(&caller(OWNER), "f1", v2.id)
        .await
        .unwrap_err();
    assert!(matches!(err, FlowError::OnlineEditLocked(_)));

    // The non-current version of an online flow stays editable
    env.manager
        .update_version(
            &caller(OWNER),
            v2.id,
            FlowVersionPatch {
                description: Some("edit".to_string()),
                ..Default::default()
            },
        )
        .await
        .expect("edit non-current");
}

#[tokio::test]
async fn draft_flows_allow_the_same_operations() {
    let env = env().await;
    seed_flow(&env, "f1", OWNER, FlowStatus::Draft).await;
    let v1 = seed_version(&env, "f1", "v1", true, json!({})).await;
    let v2 = seed_version(&env, "f1", "v2", false, json!({})).await;

    env.manager
        .update_version(
            &caller(OWNER),
            v1.id,
            FlowVersionPatch {
                description: Some("edit".to_string()),
                ..Default::default()
            },
        )
        .await
        .expect("edit current of draft flow");

    env.manager
        .set_current_version(&caller(OWNER), "f1", v2.id)
        .await
        .expect("switch on draft flow");
}

#[tokio::test]
async fn create_version_enforces_name_uniqueness_within_the_flow() {
    let env = env().await;
    seed_flow(&env, "f1", OWNER, FlowStatus::Draft).await;
    seed_flow(&env, "f2", OWNER, FlowStatus::Draft).await;
    seed_version(&env, "f1", "v1", true, json!({})).await;

    let err = env
        .manager
        .create_version(
            &caller(OWNER),
            "f1",
            FlowVersionCreate {
                name: "v1".to_string(),
                description: String::new(),
                data: json!({}),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, FlowError::NameExists(name) if name == "v1"));

    // The same name is fine on a different flow
    let created = env
        .manager
        .create_version(
            &caller(OWNER),
            "f2",
            FlowVersionCreate {
                name: "v1".to_string(),
                description: String::new(),
                data: json!({}),
            },
        )
        .await
        .expect("create on other flow");
    assert!(!created.is_current);
}

#[tokio::test]
async fn create_version_rejects_cyclic_graph_payloads() {
    let env = env().await;
    seed_flow(&env, "f1", OWNER, FlowStatus::Draft).await;

    let err = env
        .manager
        .create_version(
            &caller(OWNER),
            "f1",
            FlowVersionCreate {
                name: "cyclic".to_string(),
                description: String::new(),
                data: json!({
                    "nodes": [{"id": "a"}, {"id": "b"}],
                    "edges": [{"from": "a", "to": "b"}, {"from": "b", "to": "a"}]
                }),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, FlowError::InvalidGraph(_)));
}

#[tokio::test]
async fn update_applies_only_the_provided_fields() {
    let env = env().await;
    seed_flow(&env, "f1", OWNER, FlowStatus::Draft).await;
    let v1 = seed_version(&env, "f1", "v1", false, json!({"tag": "original"})).await;
    seed_version(&env, "f1", "cur", true, json!({})).await;

    let updated = env
        .manager
        .update_version(
            &caller(OWNER),
            v1.id,
            FlowVersionPatch {
                description: Some("described".to_string()),
                ..Default::default()
            },
        )
        .await
        .expect("patch description");

    assert_eq!(updated.name, "v1");
    assert_eq!(updated.description, "described");
    assert_eq!(updated.data, json!({"tag": "original"}));
}

#[tokio::test]
async fn registry_serves_the_switched_current_version() {
    let env = env().await;
    seed_flow(&env, "f1", OWNER, FlowStatus::Draft).await;
    let v1 = seed_version(&env, "f1", "v1", true, json!({})).await;
    let v2 = seed_version(&env, "f1", "v2", false, json!({})).await;

    env.registry.init_from_store().await.unwrap();
    assert_eq!(env.manager.current_version("f1").await.unwrap().id, v1.id);

    env.manager
        .set_current_version(&caller(OWNER), "f1", v2.id)
        .await
        .unwrap();

    assert_eq!(env.manager.current_version("f1").await.unwrap().id, v2.id);
}

#[tokio::test]
async fn list_flows_scopes_visibility_and_totals_per_caller() {
    let env = env().await;
    seed_flow(&env, "owned-a", OWNER, FlowStatus::Draft).await;
    seed_flow(&env, "owned-b", OWNER, FlowStatus::Online).await;
    seed_flow(&env, "admins", ADMIN, FlowStatus::Draft).await;
    seed_version(&env, "owned-a", "v1", true, json!({})).await;
    grant_read(&env, "owned-b").await;

    // Administrator sees everything, all writable
    let page = env
        .manager
        .list_flows(&caller(ADMIN), None, None, 1, 10)
        .await
        .unwrap();
    assert_eq!(page.total, 3);
    assert_eq!(page.data.len(), 3);
    assert!(page.data.iter().all(|listing| listing.write));

    // Owner sees both owned flows, annotated with display name and versions
    let page = env
        .manager
        .list_flows(&caller(OWNER), None, None, 1, 10)
        .await
        .unwrap();
    assert_eq!(page.total, 2);
    let owned_a = page
        .data
        .iter()
        .find(|listing| listing.flow.id == "owned-a")
        .expect("owned-a listed");
    assert_eq!(owned_a.user_name, "owen");
    assert!(owned_a.write);
    assert_eq!(owned_a.version_list.len(), 1);

    // Outsider sees only the granted flow, read-only
    let page = env
        .manager
        .list_flows(&caller(OUTSIDER), None, None, 1, 10)
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.data[0].flow.id, "owned-b");
    assert!(!page.data[0].write);
}

#[tokio::test]
async fn list_flows_total_matches_the_filter_not_the_page() {
    let env = env().await;
    for index in 0..5 {
        seed_flow(&env, &format!("bulk-{}", index), OWNER, FlowStatus::Draft).await;
    }
    seed_flow(&env, "other", OWNER, FlowStatus::Online).await;

    let page = env
        .manager
        .list_flows(&caller(OWNER), Some("bulk".to_string()), None, 1, 2)
        .await
        .unwrap();
    assert_eq!(page.data.len(), 2);
    assert_eq!(page.total, 5);

    let page = env
        .manager
        .list_flows(
            &caller(OWNER),
            None,
            Some(FlowStatus::Online),
            1,
            10,
        )
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.data[0].flow.id, "other");
}
