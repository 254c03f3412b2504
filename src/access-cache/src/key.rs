//! Cache keys.

use access_protocol::{AssetType, Role};
use uuid::Uuid;

/// Key of the permission store: one entry per required role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PermissionKey {
    pub user_id: Uuid,
    pub asset_id: Uuid,
    pub asset_type: AssetType,
    pub required_role: Role,
}

impl PermissionKey {
    pub fn new(user_id: Uuid, asset_id: Uuid, asset_type: AssetType, required_role: Role) -> Self {
        Self {
            user_id,
            asset_id,
            asset_type,
            required_role,
        }
    }

    /// The cascading key for the same user and asset.
    pub fn cascade_key(&self) -> CascadeKey {
        CascadeKey::new(self.user_id, self.asset_id, self.asset_type)
    }

    pub(crate) fn is_asset(&self, asset_id: Uuid, asset_type: AssetType) -> bool {
        self.asset_id == asset_id && self.asset_type == asset_type
    }
}

/// Key of the cascading store. Cascading access is boolean, so there is no
/// role component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CascadeKey {
    pub user_id: Uuid,
    pub asset_id: Uuid,
    pub asset_type: AssetType,
}

impl CascadeKey {
    pub fn new(user_id: Uuid, asset_id: Uuid, asset_type: AssetType) -> Self {
        Self {
            user_id,
            asset_id,
            asset_type,
        }
    }

    pub(crate) fn is_asset(&self, asset_id: Uuid, asset_type: AssetType) -> bool {
        self.asset_id == asset_id && self.asset_type == asset_type
    }
}
