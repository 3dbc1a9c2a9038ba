/// Access control boundary for flow operations
///
/// Authentication itself happens outside this crate; callers arrive as a
/// `Caller` carrying a user id. This module answers three questions about
/// that user: is it an administrator, may it write a given flow, and which
/// extra flows have been granted to it through its roles.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{sqlite::SqlitePool, Row};
use std::collections::HashMap;

/// Role id that marks administrators
pub const ADMIN_ROLE_ID: i64 = 1;

/// Authenticated caller identity
#[derive(Debug, Clone, Copy)]
pub struct Caller {
    pub user_id: i64,
}

/// Kind of access being checked against a flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessKind {
    FlowRead,
    FlowWrite,
}

impl AccessKind {
    /// Integer encoding used by the role_access table
    pub fn as_i64(self) -> i64 {
        match self {
            AccessKind::FlowRead => 2,
            AccessKind::FlowWrite => 3,
        }
    }
}

/// Role-based access checks consumed by the version manager
#[async_trait]
pub trait AccessControl: Send + Sync {
    /// Whether the user holds the administrator role
    async fn is_admin(&self, user_id: i64) -> Result<bool>;

    /// Whether the user may access the resource; admins and owners always may
    async fn access_check(
        &self,
        user_id: i64,
        owner_id: i64,
        resource_id: &str,
        kind: AccessKind,
    ) -> Result<bool>;

    /// Flow ids granted to the user's roles for read visibility
    async fn granted_flow_ids(&self, user_id: i64) -> Result<Vec<String>>;

    /// Display names for a set of users, keyed by user id
    async fn user_names(&self, user_ids: &[i64]) -> Result<HashMap<i64, String>>;
}

/// SQLite-backed access control
///
/// Uses three tables: users (display names), user_roles (role membership)
/// and role_access (per-role flow grants).
#[derive(Debug, Clone)]
pub struct SqliteAccessControl {
    pool: SqlitePool,
}

impl SqliteAccessControl {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Initialize the access control schema
    ///
    /// Safe to call multiple times (uses IF NOT EXISTS).
    pub async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                user_id INTEGER PRIMARY KEY,
                user_name TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS user_roles (
                user_id INTEGER NOT NULL,
                role_id INTEGER NOT NULL,
                PRIMARY KEY (user_id, role_id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS role_access (
                role_id INTEGER NOT NULL,
                flow_id TEXT NOT NULL,
                access_kind INTEGER NOT NULL,
                PRIMARY KEY (role_id, flow_id, access_kind)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl AccessControl for SqliteAccessControl {
    async fn is_admin(&self, user_id: i64) -> Result<bool> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM user_roles WHERE user_id = ? AND role_id = ?")
            .bind(user_id)
            .bind(ADMIN_ROLE_ID)
            .fetch_one(&self.pool)
            .await?;

        Ok(row.get::<i64, _>("n") > 0)
    }

    async fn access_check(
        &self,
        user_id: i64,
        owner_id: i64,
        resource_id: &str,
        kind: AccessKind,
    ) -> Result<bool> {
        if user_id == owner_id || self.is_admin(user_id).await? {
            return Ok(true);
        }

        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS n
            FROM user_roles ur
            JOIN role_access ra ON ra.role_id = ur.role_id
            WHERE ur.user_id = ? AND ra.flow_id = ? AND ra.access_kind = ?
            "#,
        )
        .bind(user_id)
        .bind(resource_id)
        .bind(kind.as_i64())
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get::<i64, _>("n") > 0)
    }

    async fn granted_flow_ids(&self, user_id: i64) -> Result<Vec<String>> {
        let rows = sqlx::query(
            r#"
            SELECT DISTINCT ra.flow_id
            FROM user_roles ur
            JOIN role_access ra ON ra.role_id = ur.role_id
            WHERE ur.user_id = ? AND ra.access_kind = ?
            "#,
        )
        .bind(user_id)
        .bind(AccessKind::FlowRead.as_i64())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(|row| row.get("flow_id")).collect())
    }

    async fn user_names(&self, user_ids: &[i64]) -> Result<HashMap<i64, String>> {
        if user_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut builder: sqlx::QueryBuilder<'_, sqlx::Sqlite> =
            sqlx::QueryBuilder::new("SELECT user_id, user_name FROM users WHERE user_id IN (");
        let mut ids = builder.separated(", ");
        for user_id in user_ids {
            ids.push_bind(*user_id);
        }
        builder.push(")");

        let rows = builder.build().fetch_all(&self.pool).await?;
        Ok(rows
            .iter()
            .map(|row| (row.get("user_id"), row.get("user_name")))
            .collect())
    }
}
