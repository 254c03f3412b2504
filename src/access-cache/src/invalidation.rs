//! Invalidation rules.
//!
//! Every method advances the cache generation before removing entries, so a
//! resolution already in flight cannot write back a result computed from the
//! state being invalidated. All methods are idempotent and safe to call
//! concurrently from several event sources.

use access_protocol::{AssetType, IdentityType};
use uuid::Uuid;

use crate::cache::PermissionCache;

impl PermissionCache {
    /// Removes every entry, in both stores, for the asset, across all users
    /// and required roles. Returns the number of removed entries.
    pub fn invalidate_asset(&self, asset_id: Uuid, asset_type: AssetType) -> usize {
        self.advance_generation();
        let removed = self
            .permissions
            .remove_where(|key, _| key.is_asset(asset_id, asset_type))
            + self
                .cascading
                .remove_where(|key, _| key.is_asset(asset_id, asset_type));

        tracing::debug!(%asset_id, %asset_type, removed, "Invalidated asset");
        removed
    }

    /// Removes every entry, in both stores, belonging to the user.
    pub fn invalidate_user(&self, user_id: Uuid) -> usize {
        self.advance_generation();
        let removed = self.permissions.remove_where(|key, _| key.user_id == user_id)
            + self.cascading.remove_where(|key, _| key.user_id == user_id);

        tracing::debug!(%user_id, removed, "Invalidated user");
        removed
    }

    /// Removes the user's entries for one asset: every required role in the
    /// permission store and the matching cascading entry.
    pub fn invalidate_user_asset(&self, user_id: Uuid, asset_id: Uuid, asset_type: AssetType) -> usize {
        self.advance_generation();
        let removed = self
            .permissions
            .remove_where(|key, _| key.user_id == user_id && key.is_asset(asset_id, asset_type))
            + self
                .cascading
                .remove_where(|key, _| key.user_id == user_id && key.is_asset(asset_id, asset_type));

        tracing::debug!(%user_id, %asset_id, %asset_type, removed, "Invalidated user asset");
        removed
    }

    /// Cascade rule applied when a permission on `asset_id` changes. The
    /// caller is expected to invalidate the asset's own entries alongside.
    pub fn invalidate_on_permission_change(
        &self,
        identity_id: Uuid,
        identity_type: IdentityType,
        asset_id: Uuid,
        asset_type: AssetType,
    ) -> usize {
        let removed = self.invalidate_dependents(asset_type);

        tracing::debug!(
            %identity_id,
            %identity_type,
            %asset_id,
            %asset_type,
            removed,
            "Applied permission change cascade"
        );
        removed
    }

    /// Removes entries of assets that may inherit access from an asset of
    /// `asset_type`.
    ///
    /// - `collection`: every cascading entry, plus every derived permission
    ///   entry (denials and collection grants), since containment is not
    ///   indexed here.
    /// - `dashboard_file`: cascading and derived permission entries of
    ///   `metric_file` assets only. Dashboard entries stay.
    /// - anything else: nothing.
    pub fn invalidate_dependents(&self, asset_type: AssetType) -> usize {
        match asset_type {
            AssetType::Collection => {
                self.invalidate_all_cascading() + self.invalidate_derived_permissions(None)
            }
            AssetType::DashboardFile => {
                self.invalidate_cascading_for_type(AssetType::MetricFile)
                    + self.invalidate_derived_permissions(Some(AssetType::MetricFile))
            }
            _ => 0,
        }
    }

    /// Removes every cascading entry.
    pub fn invalidate_all_cascading(&self) -> usize {
        self.advance_generation();
        let removed = self.cascading.clear();
        tracing::info!(removed, "Invalidated all cascading entries");
        removed
    }

    /// Removes the cascading entries of one asset type.
    pub fn invalidate_cascading_for_type(&self, asset_type: AssetType) -> usize {
        self.advance_generation();
        let removed = self
            .cascading
            .remove_where(|key, _| key.asset_type == asset_type);
        tracing::info!(%asset_type, removed, "Invalidated cascading entries for type");
        removed
    }

    /// Removes permission entries whose outcome depends on container state,
    /// optionally restricted to one asset type.
    fn invalidate_derived_permissions(&self, asset_type: Option<AssetType>) -> usize {
        self.advance_generation();
        self.permissions.remove_where(|key, result| {
            result.is_derived() && asset_type.is_none_or(|ty| key.asset_type == ty)
        })
    }
}
