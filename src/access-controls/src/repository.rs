//! Storage port consumed by the engine.
//!
//! The engine never talks to a database itself. Everything it knows about
//! grants, memberships and asset lifecycle comes through this trait, which is
//! implemented once against the real store and by [`InMemoryRepository`]
//! for tests and fixtures.
//!
//! [`InMemoryRepository`]: crate::InMemoryRepository

use access_protocol::{AssetMeta, AssetPermission, AssetType, Dataset, OrgRole, OrganizationMembership};
use async_trait::async_trait;
use uuid::Uuid;

use crate::error::RepositoryResult;

/// Read-only lookups the access engine depends on.
///
/// Implementations must not retry internally; failures are surfaced to the
/// caller unchanged.
#[async_trait]
pub trait AccessRepository: Send + Sync {
    /// The strongest permission row held by `identity_id` on the asset, if
    /// any. Team and organization grants that apply to a user are folded in
    /// by the implementation. Soft-deleted rows may be returned and are
    /// ignored by the engine.
    async fn find_direct_permission(
        &self,
        identity_id: Uuid,
        asset_id: Uuid,
        asset_type: AssetType,
    ) -> RepositoryResult<Option<AssetPermission>>;

    /// Ids of every collection containing the asset.
    async fn find_collections_containing(
        &self,
        asset_id: Uuid,
        asset_type: AssetType,
    ) -> RepositoryResult<Vec<Uuid>>;

    /// Ids of every dashboard that contains the metric.
    async fn find_dashboards_containing_metric(&self, metric_id: Uuid) -> RepositoryResult<Vec<Uuid>> {
        let _ = metric_id;
        Ok(Vec::new())
    }

    /// The user's role in the organization, if they belong to it.
    async fn find_org_role(
        &self,
        user_id: Uuid,
        organization_id: Uuid,
    ) -> RepositoryResult<Option<OrgRole>>;

    /// The organization the user belongs to.
    async fn find_user_organization(
        &self,
        user_id: Uuid,
    ) -> RepositoryResult<Option<OrganizationMembership>>;

    /// Ownership and lifecycle of the asset; `None` when it does not exist.
    async fn find_asset_meta(
        &self,
        asset_id: Uuid,
        asset_type: AssetType,
    ) -> RepositoryResult<Option<AssetMeta>>;

    /// One page of the organization's non-deleted datasets, in a stable
    /// order.
    async fn find_datasets_by_org(
        &self,
        organization_id: Uuid,
        page: u32,
        page_size: u32,
    ) -> RepositoryResult<Vec<Dataset>>;
}
