/// Current-version registry using ArcSwap
///
/// Production execution always runs a flow's current version. This registry
/// keeps every current version in memory behind an atomic pointer so the hot
/// read path never touches the store; the manager reloads the affected flow
/// after any mutation that changes the current-version picture.

use crate::flow::store::VersionStore;
use crate::flow::types::FlowVersion;
use anyhow::Result;
use arc_swap::ArcSwap;
use std::{collections::HashMap, sync::Arc};

/// Lock-free cache of flow id -> current version
///
/// Each update swaps the entire map pointer, so concurrent readers keep
/// whatever snapshot they loaded and never block a writer.
#[derive(Debug)]
pub struct CurrentVersionRegistry<S> {
    /// Thread-safe atomic pointer to the current-version map
    current: ArcSwap<HashMap<String, Arc<FlowVersion>>>,

    /// Reference to persistent storage for reload operations
    store: Arc<S>,
}

impl<S: VersionStore> CurrentVersionRegistry<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            current: ArcSwap::new(Arc::new(HashMap::new())),
            store,
        }
    }

    /// Populate the registry from storage at startup
    pub async fn init_from_store(&self) -> Result<()> {
        let versions = self.store.list_current_versions().await?;
        let map: HashMap<String, Arc<FlowVersion>> = versions
            .into_iter()
            .map(|version| (version.flow_id.clone(), Arc::new(version)))
            .collect();

        self.current.store(Arc::new(map));
        tracing::info!(
            "initialized current-version registry with {} flows",
            self.current.load().len()
        );
        Ok(())
    }

    /// Reload one flow's current version after a mutation
    ///
    /// A flow without any current version (e.g. deleted) is evicted.
    pub async fn reload_flow(&self, flow_id: &str) -> Result<()> {
        let versions = self.store.list_versions_by_flow(flow_id).await?;
        let current = versions.into_iter().find(|version| version.is_current);

        let snapshot = self.current.load();
        let mut next = (**snapshot).clone();
        match current {
            Some(version) => {
                next.insert(flow_id.to_string(), Arc::new(version));
            }
            None => {
                next.remove(flow_id);
            }
        }

        self.current.store(Arc::new(next));
        tracing::debug!("reloaded current version for flow {}", flow_id);
        Ok(())
    }

    /// Get a flow's current version (lock-free read)
    pub fn get(&self, flow_id: &str) -> Option<Arc<FlowVersion>> {
        self.current.load().get(flow_id).cloned()
    }
}
