//! Change events and the invalidations they trigger.
//!
//! Events come from whatever administrative flow mutated storage (a grant
//! endpoint, a pub/sub listener). Applying the same event twice is harmless.

use access_protocol::{AssetType, IdentityType};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::AccessControl;

/// A change to stored access state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AccessEvent {
    /// A permission row was created, updated or revoked.
    PermissionChanged {
        identity_id: Uuid,
        identity_type: IdentityType,
        asset_id: Uuid,
        asset_type: AssetType,
    },
    /// An asset was added to or removed from a collection.
    CollectionMembershipChanged {
        collection_id: Uuid,
        asset_id: Uuid,
        asset_type: AssetType,
    },
    /// A metric was placed on or taken off a dashboard.
    DashboardMetricChanged { dashboard_id: Uuid, metric_id: Uuid },
    AssetDeleted { asset_id: Uuid, asset_type: AssetType },
    AssetRestored { asset_id: Uuid, asset_type: AssetType },
    /// A user's organization role changed, or they joined or left.
    OrganizationRoleChanged { user_id: Uuid, organization_id: Uuid },
}

impl AccessControl {
    /// Purges every cache entry the event can make stale. Returns the number
    /// of removed entries.
    pub fn apply_event(&self, event: &AccessEvent) -> usize {
        let cache = &self.cache;
        let removed = match *event {
            AccessEvent::PermissionChanged {
                identity_id,
                identity_type,
                asset_id,
                asset_type,
            } => {
                // Team and organization grants reach users we cannot enumerate
                let own = match identity_type {
                    IdentityType::User => cache.invalidate_user_asset(identity_id, asset_id, asset_type),
                    IdentityType::Team | IdentityType::Organization => {
                        cache.invalidate_asset(asset_id, asset_type)
                    }
                };
                own + cache.invalidate_on_permission_change(
                    identity_id,
                    identity_type,
                    asset_id,
                    asset_type,
                )
            }
            AccessEvent::CollectionMembershipChanged {
                asset_id,
                asset_type,
                ..
            } => cache.invalidate_asset(asset_id, asset_type),
            AccessEvent::DashboardMetricChanged { metric_id, .. } => {
                cache.invalidate_asset(metric_id, AssetType::MetricFile)
            }
            AccessEvent::AssetDeleted {
                asset_id,
                asset_type,
            }
            | AccessEvent::AssetRestored {
                asset_id,
                asset_type,
            } => {
                cache.invalidate_asset(asset_id, asset_type) + cache.invalidate_dependents(asset_type)
            }
            AccessEvent::OrganizationRoleChanged { user_id, .. } => cache.invalidate_user(user_id),
        };

        tracing::debug!(?event, removed, "Applied access event");
        removed
    }
}
