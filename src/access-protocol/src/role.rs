//! Asset roles and organization roles.

use std::cmp::Ordering;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum_macros::Display;

use crate::error::ParseEnumError;

/// Role held on a single asset.
///
/// Roles are totally ordered by [`Role::rank`]:
/// `can_view < can_filter < can_edit < full_access < owner`.
/// Ordering goes through the rank table, never through the names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    CanView,
    CanFilter,
    CanEdit,
    FullAccess,
    Owner,
}

impl Role {
    /// Every role, lowest rank first.
    pub const ALL: [Role; 5] = [
        Role::CanView,
        Role::CanFilter,
        Role::CanEdit,
        Role::FullAccess,
        Role::Owner,
    ];

    /// Numeric rank of the role. Higher ranks include every lower one.
    pub const fn rank(self) -> u8 {
        match self {
            Role::CanView => 1,
            Role::CanFilter => 2,
            Role::CanEdit => 3,
            Role::FullAccess => 4,
            Role::Owner => 5,
        }
    }

    /// Whether holding `self` is enough for an operation requiring `required`.
    pub const fn satisfies(self, required: Role) -> bool {
        self.rank() >= required.rank()
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Role::CanView => "can_view",
            Role::CanFilter => "can_filter",
            Role::CanEdit => "can_edit",
            Role::FullAccess => "full_access",
            Role::Owner => "owner",
        }
    }
}

impl PartialOrd for Role {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Role {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl FromStr for Role {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| ParseEnumError::new("role", s))
    }
}

/// Role held within an organization.
///
/// `WorkspaceAdmin` bypasses asset permissions for every asset of the
/// organization. `DataAdmin` only bypasses dataset permissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OrgRole {
    WorkspaceAdmin,
    DataAdmin,
    Querier,
    Viewer,
}

impl OrgRole {
    pub const fn as_str(self) -> &'static str {
        match self {
            OrgRole::WorkspaceAdmin => "workspace_admin",
            OrgRole::DataAdmin => "data_admin",
            OrgRole::Querier => "querier",
            OrgRole::Viewer => "viewer",
        }
    }

    /// Owner-level access to every asset of the organization.
    pub const fn is_workspace_admin(self) -> bool {
        matches!(self, OrgRole::WorkspaceAdmin)
    }

    /// Unrestricted access to the organization's datasets.
    pub const fn bypasses_dataset_permissions(self) -> bool {
        matches!(self, OrgRole::WorkspaceAdmin | OrgRole::DataAdmin)
    }
}

impl FromStr for OrgRole {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            OrgRole::WorkspaceAdmin,
            OrgRole::DataAdmin,
            OrgRole::Querier,
            OrgRole::Viewer,
        ]
        .into_iter()
        .find(|role| role.as_str() == s)
        .ok_or_else(|| ParseEnumError::new("organization role", s))
    }
}
