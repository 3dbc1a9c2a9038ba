/// Version lifecycle manager
///
/// Enforces the lifecycle invariants on top of the version store: version
/// names stay unique within a flow, exactly one version per flow is current,
/// the current version cannot be deleted, and online flows lock both
/// structural edits and version switching. Every precondition failure is
/// resolved locally into a typed `FlowError`; nothing here panics.

use crate::access::{AccessControl, AccessKind, Caller};
use crate::error::{FlowError, Result};
use crate::flow::registry::CurrentVersionRegistry;
use crate::flow::store::{group_by_flow, FlowFilter, FlowVisibility, NewFlowVersion, VersionStore};
use crate::flow::types::{
    Flow, FlowCreate, FlowListing, FlowPage, FlowStatus, FlowVersion, FlowVersionCreate,
    FlowVersionPatch, FlowVersionSummary,
};
use crate::runtime::graph;
use std::sync::Arc;

/// High-level manager wired from the store, access control and the
/// current-version registry
pub struct FlowVersionManager<S, A> {
    store: Arc<S>,
    access: Arc<A>,
    registry: Arc<CurrentVersionRegistry<S>>,
}

impl<S, A> FlowVersionManager<S, A>
where
    S: VersionStore,
    A: AccessControl,
{
    pub fn new(store: Arc<S>, access: Arc<A>, registry: Arc<CurrentVersionRegistry<S>>) -> Self {
        Self {
            store,
            access,
            registry,
        }
    }

    /// Create a new draft flow owned by the caller
    pub async fn create_flow(&self, caller: &Caller, create: FlowCreate) -> Result<Flow> {
        let flow = Flow::new(create.name, create.description, caller.user_id);
        self.store.create_flow(&flow).await?;
        tracing::info!("created flow {} ({})", flow.id, flow.name);
        Ok(flow)
    }

    /// All versions of a flow, ordered by id
    pub async fn list_versions(&self, flow_id: &str) -> Result<Vec<FlowVersionSummary>> {
        let versions = self.store.list_versions_by_flow(flow_id).await?;
        Ok(versions.iter().map(FlowVersionSummary::from).collect())
    }

    /// Full version record by id
    pub async fn get_version(&self, version_id: i64) -> Result<FlowVersion> {
        self.store
            .get_version(version_id)
            .await?
            .ok_or_else(|| FlowError::NotFound(format!("version {}", version_id)))
    }

    /// Delete a version; the current version is never deletable
    pub async fn delete_version(&self, caller: &Caller, version_id: i64) -> Result<()> {
        let version = self
            .store
            .get_version(version_id)
            .await?
            .ok_or_else(|| FlowError::NotFound(format!("version {}", version_id)))?;

        let flow = self.get_owning_flow(&version).await?;
        self.check_write(caller, &flow).await?;

        if version.is_current {
            return Err(FlowError::CurrentVersionConflict(version_id));
        }

        self.store.delete_version(version_id).await?;
        tracing::info!("deleted version {} of flow {}", version_id, flow.id);
        Ok(())
    }

    /// Switch the flow's current version
    ///
    /// Already-current targets succeed as a no-op; the actual flip is one
    /// transactional step in the store.
    pub async fn set_current_version(
        &self,
        caller: &Caller,
        flow_id: &str,
        version_id: i64,
    ) -> Result<()> {
        let flow = self
            .store
            .get_flow(flow_id)
            .await?
            .ok_or_else(|| FlowError::NotFound(format!("flow {}", flow_id)))?;

        self.check_write(caller, &flow).await?;

        // Online flows serve the current version; switching is locked
        if flow.status == FlowStatus::Online {
            return Err(FlowError::OnlineEditLocked(flow_id.to_string()));
        }

        let version = self
            .store
            .get_version(version_id)
            .await?
            .filter(|version| version.flow_id == flow_id)
            .ok_or_else(|| FlowError::NotFound(format!("version {}", version_id)))?;

        if version.is_current {
            return Ok(());
        }

        self.store.set_current_version(flow_id, version_id).await?;
        self.registry.reload_flow(flow_id).await?;
        tracing::info!("flow {} current version switched to {}", flow_id, version_id);
        Ok(())
    }

    /// Create a new, non-current version of a flow
    pub async fn create_version(
        &self,
        caller: &Caller,
        flow_id: &str,
        create: FlowVersionCreate,
    ) -> Result<FlowVersion> {
        let flow = self
            .store
            .get_flow(flow_id)
            .await?
            .ok_or_else(|| FlowError::NotFound(format!("flow {}", flow_id)))?;

        self.check_write(caller, &flow).await?;

        if self
            .store
            .get_version_by_name(flow_id, &create.name)
            .await?
            .is_some()
        {
            return Err(FlowError::NameExists(create.name));
        }

        graph::validate_payload(&create.data)
            .map_err(|e| FlowError::InvalidGraph(e.to_string()))?;

        let version = self
            .store
            .create_version(NewFlowVersion {
                flow_id: flow_id.to_string(),
                name: create.name,
                description: create.description,
                data: create.data,
                is_current: false,
                user_id: caller.user_id,
            })
            .await?;

        tracing::info!("created version {} ({}) of flow {}", version.id, version.name, flow_id);
        Ok(version)
    }

    /// Apply a partial update to a version; absent fields stay unchanged
    pub async fn update_version(
        &self,
        caller: &Caller,
        version_id: i64,
        patch: FlowVersionPatch,
    ) -> Result<FlowVersion> {
        let mut version = self
            .store
            .get_version(version_id)
            .await?
            .ok_or_else(|| FlowError::NotFound(format!("version {}", version_id)))?;

        let flow = self.get_owning_flow(&version).await?;
        self.check_write(caller, &flow).await?;

        // The current version of an online flow is what production runs
        if version.is_current && flow.status == FlowStatus::Online {
            return Err(FlowError::OnlineEditLocked(flow.id));
        }

        if let Some(data) = &patch.data {
            graph::validate_payload(data).map_err(|e| FlowError::InvalidGraph(e.to_string()))?;
        }

        if let Some(name) = patch.name {
            version.name = name;
        }
        if let Some(description) = patch.description {
            version.description = description;
        }
        if let Some(data) = patch.data {
            version.data = data;
        }

        self.store.update_version(&version).await?;

        if version.is_current {
            self.registry.reload_flow(&flow.id).await?;
        }

        tracing::info!("updated version {} of flow {}", version_id, flow.id);
        Ok(version)
    }

    /// Paged flow listing scoped to what the caller may see
    ///
    /// Administrators see everything; other callers see owned flows plus
    /// flows granted through their roles. The total count runs under the
    /// exact same predicate as the page.
    pub async fn list_flows(
        &self,
        caller: &Caller,
        name: Option<String>,
        status: Option<FlowStatus>,
        page: u32,
        page_size: u32,
    ) -> Result<FlowPage> {
        let is_admin = self.access.is_admin(caller.user_id).await?;
        let visibility = if is_admin {
            FlowVisibility::All
        } else {
            FlowVisibility::Scoped {
                user_id: caller.user_id,
                granted: self.access.granted_flow_ids(caller.user_id).await?,
            }
        };

        let filter = FlowFilter {
            name,
            status,
            visibility,
        };
        let flows = self.store.list_flows(&filter, page, page_size).await?;
        let total = self.store.count_flows(&filter).await?;

        let user_ids: Vec<i64> = flows.iter().map(|flow| flow.user_id).collect();
        let user_names = self.access.user_names(&user_ids).await?;

        let flow_ids: Vec<String> = flows.iter().map(|flow| flow.id.clone()).collect();
        let versions = self.store.list_versions_by_flows(&flow_ids).await?;
        let mut versions_by_flow = group_by_flow(versions);

        let data = flows
            .into_iter()
            .map(|flow| {
                let user_name = user_names
                    .get(&flow.user_id)
                    .cloned()
                    .unwrap_or_else(|| flow.user_id.to_string());
                let write = is_admin || flow.user_id == caller.user_id;
                let version_list = versions_by_flow
                    .remove(&flow.id)
                    .unwrap_or_default()
                    .iter()
                    .map(FlowVersionSummary::from)
                    .collect();
                FlowListing {
                    flow,
                    user_name,
                    write,
                    version_list,
                }
            })
            .collect();

        Ok(FlowPage { data, total })
    }

    /// Current version of a flow from the registry hot path
    pub async fn current_version(&self, flow_id: &str) -> Result<Arc<FlowVersion>> {
        self.registry
            .get(flow_id)
            .ok_or_else(|| FlowError::NotFound(format!("current version of flow {}", flow_id)))
    }

    async fn get_owning_flow(&self, version: &FlowVersion) -> Result<Flow> {
        self.store
            .get_flow(&version.flow_id)
            .await?
            .ok_or_else(|| FlowError::NotFound(format!("flow {}", version.flow_id)))
    }

    async fn check_write(&self, caller: &Caller, flow: &Flow) -> Result<()> {
        let allowed = self
            .access
            .access_check(caller.user_id, flow.user_id, &flow.id, AccessKind::FlowWrite)
            .await?;
        if allowed {
            Ok(())
        } else {
            Err(FlowError::Unauthorized(format!(
                "no write access to flow {}",
                flow.id
            )))
        }
    }
}
