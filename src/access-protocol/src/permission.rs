//! Permission rows and resolution results.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::Display;
use uuid::Uuid;

use crate::asset::AssetType;
use crate::error::ParseEnumError;
use crate::identity::IdentityType;
use crate::role::Role;

/// A stored grant of `role` on an asset to an identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetPermission {
    pub identity_id: Uuid,
    pub identity_type: IdentityType,
    pub asset_id: Uuid,
    pub asset_type: AssetType,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl AssetPermission {
    /// A live grant to a user, created now.
    pub fn for_user(user_id: Uuid, asset_id: Uuid, asset_type: AssetType, role: Role) -> Self {
        Self {
            identity_id: user_id,
            identity_type: IdentityType::User,
            asset_id,
            asset_type,
            role,
            created_at: Utc::now(),
            deleted_at: None,
        }
    }

    /// Rows with `deleted_at` set are treated as absent.
    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }
}

/// Why access was granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AccessPath {
    /// A permission row on the asset itself.
    Direct,
    /// The user created the asset.
    Creator,
    /// Workspace admin of the asset's organization.
    Admin,
    /// Inherited from a containing collection (or dashboard, for metrics).
    Collection,
}

impl FromStr for AccessPath {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "direct" => Ok(AccessPath::Direct),
            "creator" => Ok(AccessPath::Creator),
            "admin" => Ok(AccessPath::Admin),
            "collection" => Ok(AccessPath::Collection),
            _ => Err(ParseEnumError::new("access path", s)),
        }
    }
}

/// Outcome of a permission check. Denial is a value, never an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetPermissionResult {
    pub has_access: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_role: Option<Role>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_path: Option<AccessPath>,
}

impl AssetPermissionResult {
    pub const fn denied() -> Self {
        Self {
            has_access: false,
            effective_role: None,
            access_path: None,
        }
    }

    pub const fn direct(role: Role) -> Self {
        Self {
            has_access: true,
            effective_role: Some(role),
            access_path: Some(AccessPath::Direct),
        }
    }

    pub const fn creator() -> Self {
        Self {
            has_access: true,
            effective_role: Some(Role::Owner),
            access_path: Some(AccessPath::Creator),
        }
    }

    pub const fn admin() -> Self {
        Self {
            has_access: true,
            effective_role: Some(Role::Owner),
            access_path: Some(AccessPath::Admin),
        }
    }

    /// Inherited access carries no role: container roles and asset roles are
    /// only comparable at view level.
    pub const fn collection() -> Self {
        Self {
            has_access: true,
            effective_role: None,
            access_path: Some(AccessPath::Collection),
        }
    }

    /// True for results whose validity depends on container state rather
    /// than on the asset's own grants: denials and inherited grants.
    pub fn is_derived(&self) -> bool {
        !self.has_access || self.access_path == Some(AccessPath::Collection)
    }
}
