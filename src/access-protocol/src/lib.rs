//! Access Protocol - Domain types for asset permission resolution.
//!
//! These types are shared between the permission cache and the resolution
//! engine. They are deliberately plain data: storage owns the records, the
//! engine only reads them.

pub mod asset;
pub mod error;
pub mod identity;
pub mod permission;
pub mod role;

// Re-exports
pub use asset::{AssetMeta, AssetType, CollectionMembership, DashboardMetric, Dataset};
pub use error::ParseEnumError;
pub use identity::{Identity, IdentityType, OrganizationMembership};
pub use permission::{AccessPath, AssetPermission, AssetPermissionResult};
pub use role::{OrgRole, Role};
