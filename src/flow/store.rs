/// SQLite persistence layer for flows and flow versions
///
/// The `VersionStore` trait is the storage boundary consumed by the version
/// manager and the comparison orchestrator. The shipped implementation keeps
/// flow rows and version rows in SQLite, with the graph payload stored as a
/// JSON column while lookup fields stay indexed.

use crate::flow::types::{Flow, FlowStatus, FlowVersion};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::{sqlite::SqlitePool, QueryBuilder, Row, Sqlite};
use std::collections::HashMap;

/// Which flows a listing query may see
#[derive(Debug, Clone)]
pub enum FlowVisibility {
    /// Administrators see every flow
    All,
    /// Regular callers see owned flows plus explicitly granted ones
    Scoped { user_id: i64, granted: Vec<String> },
}

/// Filter predicate shared by the flow listing and its total count
#[derive(Debug, Clone)]
pub struct FlowFilter {
    /// Substring match on the flow name
    pub name: Option<String>,
    /// Exact match on the lifecycle status
    pub status: Option<FlowStatus>,
    pub visibility: FlowVisibility,
}

/// Fields for inserting a new version row
#[derive(Debug, Clone)]
pub struct NewFlowVersion {
    pub flow_id: String,
    pub name: String,
    pub description: String,
    pub data: Value,
    pub is_current: bool,
    pub user_id: i64,
}

/// Storage boundary for flow and version records
///
/// `set_current_version` must swap the current flag in a single transaction
/// so the single-current invariant holds under concurrent callers.
#[async_trait]
pub trait VersionStore: Send + Sync {
    async fn get_flow(&self, flow_id: &str) -> Result<Option<Flow>>;
    async fn create_flow(&self, flow: &Flow) -> Result<()>;
    async fn get_version(&self, version_id: i64) -> Result<Option<FlowVersion>>;
    async fn get_version_by_name(&self, flow_id: &str, name: &str) -> Result<Option<FlowVersion>>;
    async fn list_versions_by_flow(&self, flow_id: &str) -> Result<Vec<FlowVersion>>;
    async fn list_versions_by_flows(&self, flow_ids: &[String]) -> Result<Vec<FlowVersion>>;
    async fn list_versions_by_ids(&self, version_ids: &[i64]) -> Result<Vec<FlowVersion>>;
    async fn list_current_versions(&self) -> Result<Vec<FlowVersion>>;
    async fn create_version(&self, record: NewFlowVersion) -> Result<FlowVersion>;
    async fn update_version(&self, version: &FlowVersion) -> Result<()>;
    async fn delete_version(&self, version_id: i64) -> Result<bool>;
    async fn set_current_version(&self, flow_id: &str, new_current: i64) -> Result<()>;
    async fn list_flows(&self, filter: &FlowFilter, page: u32, page_size: u32) -> Result<Vec<Flow>>;
    async fn count_flows(&self, filter: &FlowFilter) -> Result<i64>;
}

/// SQLite-backed version store
#[derive(Debug, Clone)]
pub struct SqliteVersionStore {
    /// SQLite connection pool shared with the rest of the application
    pool: SqlitePool,
}

impl SqliteVersionStore {
    /// Create new store instance with database connection
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Initialize the flow storage schema
    ///
    /// Safe to call multiple times (uses IF NOT EXISTS).
    pub async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS flows (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                user_id INTEGER NOT NULL,
                status INTEGER NOT NULL DEFAULT 1,
                create_time TEXT NOT NULL,
                update_time TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS flow_versions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                flow_id TEXT NOT NULL,
                name TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                data JSON NOT NULL,
                is_current INTEGER NOT NULL DEFAULT 0,
                user_id INTEGER NOT NULL,
                create_time TEXT NOT NULL,
                update_time TEXT NOT NULL,
                UNIQUE(flow_id, name)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // Index on flow_id for version listings
        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_flow_versions_flow
            ON flow_versions(flow_id)
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    fn version_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<FlowVersion> {
        let data_json: String = row.get("data");
        Ok(FlowVersion {
            id: row.get("id"),
            flow_id: row.get("flow_id"),
            name: row.get("name"),
            description: row.get("description"),
            data: serde_json::from_str(&data_json)?,
            is_current: row.get::<i64, _>("is_current") != 0,
            user_id: row.get("user_id"),
            create_time: row.get("create_time"),
            update_time: row.get("update_time"),
        })
    }

    fn flow_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Flow> {
        Ok(Flow {
            id: row.get("id"),
            name: row.get("name"),
            description: row.get("description"),
            user_id: row.get("user_id"),
            status: FlowStatus::from_i64(row.get("status"))?,
            create_time: row.get("create_time"),
            update_time: row.get("update_time"),
        })
    }

    /// Append the shared filter predicate used by both the listing page and
    /// its total count, so the two can never disagree
    fn push_filter(builder: &mut QueryBuilder<'_, Sqlite>, filter: &FlowFilter) {
        if let Some(name) = &filter.name {
            builder.push(" AND name LIKE ");
            builder.push_bind(format!("%{}%", name));
        }
        if let Some(status) = filter.status {
            builder.push(" AND status = ");
            builder.push_bind(status.as_i64());
        }
        if let FlowVisibility::Scoped { user_id, granted } = &filter.visibility {
            builder.push(" AND (user_id = ");
            builder.push_bind(*user_id);
            if !granted.is_empty() {
                builder.push(" OR id IN (");
                let mut ids = builder.separated(", ");
                for flow_id in granted {
                    ids.push_bind(flow_id.clone());
                }
                builder.push(")");
            }
            builder.push(")");
        }
    }
}

#[async_trait]
impl VersionStore for SqliteVersionStore {
    async fn get_flow(&self, flow_id: &str) -> Result<Option<Flow>> {
        let row = sqlx::query("SELECT * FROM flows WHERE id = ?")
            .bind(flow_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| Self::flow_from_row(&row)).transpose()
    }

    async fn create_flow(&self, flow: &Flow) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO flows (id, name, description, user_id, status, create_time, update_time)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&flow.id)
        .bind(&flow.name)
        .bind(&flow.description)
        .bind(flow.user_id)
        .bind(flow.status.as_i64())
        .bind(&flow.create_time)
        .bind(&flow.update_time)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_version(&self, version_id: i64) -> Result<Option<FlowVersion>> {
        let row = sqlx::query("SELECT * FROM flow_versions WHERE id = ?")
            .bind(version_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| Self::version_from_row(&row)).transpose()
    }

    async fn get_version_by_name(&self, flow_id: &str, name: &str) -> Result<Option<FlowVersion>> {
        let row = sqlx::query("SELECT * FROM flow_versions WHERE flow_id = ? AND name = ?")
            .bind(flow_id)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| Self::version_from_row(&row)).transpose()
    }

    async fn list_versions_by_flow(&self, flow_id: &str) -> Result<Vec<FlowVersion>> {
        let rows = sqlx::query("SELECT * FROM flow_versions WHERE flow_id = ? ORDER BY id")
            .bind(flow_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(Self::version_from_row).collect()
    }

    async fn list_versions_by_flows(&self, flow_ids: &[String]) -> Result<Vec<FlowVersion>> {
        if flow_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder: QueryBuilder<'_, Sqlite> =
            QueryBuilder::new("SELECT * FROM flow_versions WHERE flow_id IN (");
        let mut ids = builder.separated(", ");
        for flow_id in flow_ids {
            ids.push_bind(flow_id.clone());
        }
        builder.push(") ORDER BY id");

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(Self::version_from_row).collect()
    }

    async fn list_versions_by_ids(&self, version_ids: &[i64]) -> Result<Vec<FlowVersion>> {
        if version_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder: QueryBuilder<'_, Sqlite> =
            QueryBuilder::new("SELECT * FROM flow_versions WHERE id IN (");
        let mut ids = builder.separated(", ");
        for version_id in version_ids {
            ids.push_bind(*version_id);
        }
        builder.push(") ORDER BY id");

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(Self::version_from_row).collect()
    }

    async fn list_current_versions(&self) -> Result<Vec<FlowVersion>> {
        let rows = sqlx::query("SELECT * FROM flow_versions WHERE is_current = 1")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(Self::version_from_row).collect()
    }

    async fn create_version(&self, record: NewFlowVersion) -> Result<FlowVersion> {
        let now = chrono::Utc::now().to_rfc3339();
        let data_json = serde_json::to_string(&record.data)?;

        let result = sqlx::query(
            r#"
            INSERT INTO flow_versions (flow_id, name, description, data, is_current, user_id, create_time, update_time)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.flow_id)
        .bind(&record.name)
        .bind(&record.description)
        .bind(&data_json)
        .bind(record.is_current as i64)
        .bind(record.user_id)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        let version_id = result.last_insert_rowid();
        self.get_version(version_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("version {} vanished after insert", version_id))
    }

    async fn update_version(&self, version: &FlowVersion) -> Result<()> {
        let now = chrono::Utc::now().to_rfc3339();
        let data_json = serde_json::to_string(&version.data)?;

        sqlx::query(
            r#"
            UPDATE flow_versions
            SET name = ?, description = ?, data = ?, update_time = ?
            WHERE id = ?
            "#,
        )
        .bind(&version.name)
        .bind(&version.description)
        .bind(&data_json)
        .bind(&now)
        .bind(version.id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete_version(&self, version_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM flow_versions WHERE id = ?")
            .bind(version_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Transactional current-version swap
    ///
    /// Both updates commit atomically; a crash between them cannot leave a
    /// flow with zero or two current versions.
    async fn set_current_version(&self, flow_id: &str, new_current: i64) -> Result<()> {
        let now = chrono::Utc::now().to_rfc3339();
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE flow_versions SET is_current = 0, update_time = ? WHERE flow_id = ? AND is_current = 1")
            .bind(&now)
            .bind(flow_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE flow_versions SET is_current = 1, update_time = ? WHERE id = ? AND flow_id = ?")
            .bind(&now)
            .bind(new_current)
            .bind(flow_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn list_flows(&self, filter: &FlowFilter, page: u32, page_size: u32) -> Result<Vec<Flow>> {
        let offset = page.saturating_sub(1) as i64 * page_size as i64;

        let mut builder: QueryBuilder<'_, Sqlite> =
            QueryBuilder::new("SELECT * FROM flows WHERE 1 = 1");
        Self::push_filter(&mut builder, filter);
        builder.push(" ORDER BY update_time DESC LIMIT ");
        builder.push_bind(page_size as i64);
        builder.push(" OFFSET ");
        builder.push_bind(offset);

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(Self::flow_from_row).collect()
    }

    async fn count_flows(&self, filter: &FlowFilter) -> Result<i64> {
        let mut builder: QueryBuilder<'_, Sqlite> =
            QueryBuilder::new("SELECT COUNT(*) AS total FROM flows WHERE 1 = 1");
        Self::push_filter(&mut builder, filter);

        let row = builder.build().fetch_one(&self.pool).await?;
        Ok(row.get("total"))
    }
}

/// Group version rows by owning flow for the flow listing
pub fn group_by_flow(versions: Vec<FlowVersion>) -> HashMap<String, Vec<FlowVersion>> {
    let mut grouped: HashMap<String, Vec<FlowVersion>> = HashMap::new();
    for version in versions {
        grouped.entry(version.flow_id.clone()).or_default().push(version);
    }
    grouped
}
