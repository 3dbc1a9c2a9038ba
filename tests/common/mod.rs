/// Shared fixtures for integration tests
///
/// Builds the full component stack on an in-memory SQLite database and seeds
/// a small cast of users: an administrator, a flow owner and an outsider
/// with no grants of their own.

use flowver::access::{SqliteAccessControl, ADMIN_ROLE_ID};
use flowver::flow::manager::FlowVersionManager;
use flowver::flow::registry::CurrentVersionRegistry;
use flowver::flow::store::{NewFlowVersion, SqliteVersionStore, VersionStore};
use flowver::flow::types::{Flow, FlowStatus, FlowVersion};
use serde_json::Value;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::sync::Arc;

pub const ADMIN: i64 = 1;
pub const OWNER: i64 = 2;
pub const OUTSIDER: i64 = 3;

/// Role granting OUTSIDER read visibility on selected flows
pub const READER_ROLE_ID: i64 = 5;

pub struct TestEnv {
    pub pool: SqlitePool,
    pub store: Arc<SqliteVersionStore>,
    pub access: Arc<SqliteAccessControl>,
    pub registry: Arc<CurrentVersionRegistry<SqliteVersionStore>>,
    pub manager: FlowVersionManager<SqliteVersionStore, SqliteAccessControl>,
}

pub async fn env() -> TestEnv {
    // A single connection keeps every query on the same in-memory database
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite");

    let store = Arc::new(SqliteVersionStore::new(pool.clone()));
    store.init_schema().await.expect("flow schema");

    let access = Arc::new(SqliteAccessControl::new(pool.clone()));
    access.init_schema().await.expect("access schema");

    for (user_id, user_name) in [(ADMIN, "alice"), (OWNER, "owen"), (OUTSIDER, "oscar")] {
        sqlx::query("INSERT INTO users (user_id, user_name) VALUES (?, ?)")
            .bind(user_id)
            .bind(user_name)
            .execute(&pool)
            .await
            .expect("seed user");
    }
    sqlx::query("INSERT INTO user_roles (user_id, role_id) VALUES (?, ?)")
        .bind(ADMIN)
        .bind(ADMIN_ROLE_ID)
        .execute(&pool)
        .await
        .expect("seed admin role");

    let registry = Arc::new(CurrentVersionRegistry::new(Arc::clone(&store)));
    registry.init_from_store().await.expect("registry init");

    let manager = FlowVersionManager::new(
        Arc::clone(&store),
        Arc::clone(&access),
        Arc::clone(&registry),
    );

    TestEnv {
        pool,
        store,
        access,
        registry,
        manager,
    }
}

pub async fn seed_flow(env: &TestEnv, flow_id: &str, owner: i64, status: FlowStatus) -> Flow {
    let now = chrono::Utc::now().to_rfc3339();
    let flow = Flow {
        id: flow_id.to_string(),
        name: format!("{} flow", flow_id),
        description: String::new(),
        user_id: owner,
        status,
        create_time: now.clone(),
        update_time: now,
    };
    env.store.create_flow(&flow).await.expect("seed flow");
    flow
}

pub async fn seed_version(
    env: &TestEnv,
    flow_id: &str,
    name: &str,
    is_current: bool,
    data: Value,
) -> FlowVersion {
    env.store
        .create_version(NewFlowVersion {
            flow_id: flow_id.to_string(),
            name: name.to_string(),
            description: String::new(),
            data,
            is_current,
            user_id: OWNER,
        })
        .await
        .expect("seed version")
}

/// Grant OUTSIDER read visibility on a flow through the reader role
pub async fn grant_read(env: &TestEnv, flow_id: &str) {
    sqlx::query("INSERT OR IGNORE INTO user_roles (user_id, role_id) VALUES (?, ?)")
        .bind(OUTSIDER)
        .bind(READER_ROLE_ID)
        .execute(&env.pool)
        .await
        .expect("seed reader role");
    sqlx::query("INSERT INTO role_access (role_id, flow_id, access_kind) VALUES (?, ?, 2)")
        .bind(READER_ROLE_ID)
        .bind(flow_id)
        .execute(&env.pool)
        .await
        .expect("seed grant");
}

/// Number of versions of the flow currently flagged as current
pub async fn current_count(env: &TestEnv, flow_id: &str) -> usize {
    env.store
        .list_versions_by_flow(flow_id)
        .await
        .expect("list versions")
        .iter()
        .filter(|version| version.is_current)
        .count()
}
