//! Access inherited from containers.
//!
//! Every asset except a collection inherits view access from the collections
//! that contain it, and a metric also inherits from the dashboards it is
//! placed on. Inheritance is one hop: a container is judged only on its own
//! grants, never on its own containers.

use access_cache::CascadeKey;
use access_protocol::AssetType;
use tracing::instrument;
use uuid::Uuid;

use crate::engine::AccessControl;
use crate::error::Result;
use crate::validation::parse_id;

impl AccessControl {
    /// Can the user reach the asset through a container they can view?
    #[instrument(skip(self))]
    pub async fn has_cascading_access(
        &self,
        user_id: &str,
        asset_id: &str,
        asset_type: AssetType,
    ) -> Result<bool> {
        let user_id = parse_id("user_id", user_id)?;
        let asset_id = parse_id("asset_id", asset_id)?;
        self.cascading_access(user_id, asset_id, asset_type).await
    }

    /// Cascading check on parsed ids, through the cascading store.
    pub async fn cascading_access(
        &self,
        user_id: Uuid,
        asset_id: Uuid,
        asset_type: AssetType,
    ) -> Result<bool> {
        if !asset_type.inherits_from_collections() {
            return Ok(false);
        }

        let key = CascadeKey::new(user_id, asset_id, asset_type);
        if let Some(reachable) = self.cache.get_cascading(&key) {
            return Ok(reachable);
        }

        let generation = self.cache.generation();
        let reachable = self
            .reachable_through_containers(user_id, asset_id, asset_type)
            .await?;
        self.cache.set_cascading_if_current(key, reachable, generation);

        tracing::debug!(%user_id, %asset_id, %asset_type, reachable, "Resolved cascading access");
        Ok(reachable)
    }

    async fn reachable_through_containers(
        &self,
        user_id: Uuid,
        asset_id: Uuid,
        asset_type: AssetType,
    ) -> Result<bool> {
        let mut containers: Vec<(Uuid, AssetType)> = self
            .repository
            .find_collections_containing(asset_id, asset_type)
            .await?
            .into_iter()
            .map(|id| (id, AssetType::Collection))
            .collect();

        if asset_type.inherits_from_dashboards() {
            containers.extend(
                self.repository
                    .find_dashboards_containing_metric(asset_id)
                    .await?
                    .into_iter()
                    .map(|id| (id, AssetType::DashboardFile)),
            );
        }

        for (container_id, container_type) in containers {
            if self
                .resolve_container(user_id, container_id, container_type)
                .await?
            {
                tracing::trace!(%container_id, %container_type, "Container grants view");
                return Ok(true);
            }
        }
        Ok(false)
    }
}
