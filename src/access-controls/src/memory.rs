//! In-memory [`AccessRepository`] backed by maps.
//!
//! Used by the test-suite and by the `access-check` binary, which loads a
//! JSON fixture into it. Every port method is counted, and a failure can be
//! injected to exercise error propagation.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use access_protocol::{
    AssetMeta, AssetPermission, AssetType, CollectionMembership, DashboardMetric, Dataset, OrgRole,
    OrganizationMembership,
};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{RepositoryError, RepositoryResult};
use crate::repository::AccessRepository;

/// An asset and its metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRecord {
    pub id: Uuid,
    pub asset_type: AssetType,
    #[serde(flatten)]
    pub meta: AssetMeta,
}

/// A dataset together with its creator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetRecord {
    #[serde(flatten)]
    pub dataset: Dataset,
    pub created_by: Uuid,
}

/// A user's membership in a team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TeamMember {
    pub team_id: Uuid,
    pub user_id: Uuid,
}

/// Serializable snapshot of everything the repository stores.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryFixture {
    #[serde(default)]
    pub assets: Vec<AssetRecord>,
    #[serde(default)]
    pub datasets: Vec<DatasetRecord>,
    #[serde(default)]
    pub permissions: Vec<AssetPermission>,
    #[serde(default)]
    pub collections: Vec<CollectionMembership>,
    #[serde(default)]
    pub dashboard_metrics: Vec<DashboardMetric>,
    #[serde(default)]
    pub memberships: Vec<OrganizationMembership>,
    #[serde(default)]
    pub team_members: Vec<TeamMember>,
}

type GrantKey = (Uuid, Uuid, AssetType);

#[derive(Debug, Default)]
struct State {
    assets: HashMap<(Uuid, AssetType), AssetMeta>,
    /// Insertion order is the listing order.
    datasets: Vec<Dataset>,
    /// `(identity, asset, asset type)` -> row.
    permissions: HashMap<GrantKey, AssetPermission>,
    collections: HashSet<CollectionMembership>,
    dashboard_metrics: HashSet<DashboardMetric>,
    /// One organization per user.
    memberships: HashMap<Uuid, OrganizationMembership>,
    team_members: HashSet<TeamMember>,
}

impl State {
    fn load(fixture: RepositoryFixture) -> Self {
        let mut state = State::default();
        for record in fixture.assets {
            state.assets.insert((record.id, record.asset_type), record.meta);
        }
        for record in fixture.datasets {
            state.insert_dataset(record.dataset, record.created_by);
        }
        for row in fixture.permissions {
            state.permissions.insert(grant_key(&row), row);
        }
        state.collections.extend(fixture.collections);
        state.dashboard_metrics.extend(fixture.dashboard_metrics);
        for membership in fixture.memberships {
            state.memberships.insert(membership.user_id, membership);
        }
        state.team_members.extend(fixture.team_members);
        state
    }

    fn insert_dataset(&mut self, dataset: Dataset, created_by: Uuid) {
        let meta = AssetMeta {
            created_by,
            organization_id: dataset.organization_id,
            deleted_at: dataset.deleted_at,
        };
        self.assets.insert((dataset.id, AssetType::Dataset), meta);
        self.datasets.retain(|existing| existing.id != dataset.id);
        self.datasets.push(dataset);
    }

    /// Identities whose grants apply to the user: the user, their teams and
    /// their organization.
    fn identities_of(&self, user_id: Uuid) -> Vec<Uuid> {
        let mut identities = vec![user_id];
        identities.extend(
            self.team_members
                .iter()
                .filter(|member| member.user_id == user_id)
                .map(|member| member.team_id),
        );
        if let Some(membership) = self.memberships.get(&user_id) {
            identities.push(membership.organization_id);
        }
        identities
    }
}

fn grant_key(row: &AssetPermission) -> GrantKey {
    (row.identity_id, row.asset_id, row.asset_type)
}

/// Map-backed repository.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    state: RwLock<State>,
    calls: Mutex<HashMap<&'static str, usize>>,
    failure: Mutex<Option<String>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fixture(fixture: RepositoryFixture) -> Self {
        Self {
            state: RwLock::new(State::load(fixture)),
            ..Self::default()
        }
    }

    /// Parse a JSON [`RepositoryFixture`].
    pub fn from_json_str(json: &str) -> RepositoryResult<Self> {
        let fixture: RepositoryFixture = serde_json::from_str(json)
            .map_err(|e| RepositoryError::invalid_record("fixture", e.to_string()))?;
        Ok(Self::from_fixture(fixture))
    }

    /// Read and parse a JSON [`RepositoryFixture`] file.
    pub fn from_json_file(path: impl AsRef<Path>) -> RepositoryResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| RepositoryError::unavailable(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&json)
    }

    pub async fn insert_asset(&self, asset_id: Uuid, asset_type: AssetType, meta: AssetMeta) {
        self.state.write().await.assets.insert((asset_id, asset_type), meta);
    }

    pub async fn add_dataset(&self, dataset: Dataset, created_by: Uuid) {
        self.state.write().await.insert_dataset(dataset, created_by);
    }

    /// Insert or replace a permission row.
    pub async fn grant(&self, permission: AssetPermission) {
        self.state
            .write()
            .await
            .permissions
            .insert(grant_key(&permission), permission);
    }

    /// Soft-delete the identity's row on the asset. Returns whether a live row
    /// existed.
    pub async fn revoke(&self, identity_id: Uuid, asset_id: Uuid, asset_type: AssetType) -> bool {
        let mut state = self.state.write().await;
        match state.permissions.get_mut(&(identity_id, asset_id, asset_type)) {
            Some(row) if row.is_active() => {
                row.deleted_at = Some(Utc::now());
                true
            }
            _ => false,
        }
    }

    pub async fn add_to_collection(&self, collection_id: Uuid, asset_id: Uuid, asset_type: AssetType) {
        self.state.write().await.collections.insert(CollectionMembership {
            collection_id,
            asset_id,
            asset_type,
        });
    }

    pub async fn remove_from_collection(
        &self,
        collection_id: Uuid,
        asset_id: Uuid,
        asset_type: AssetType,
    ) -> bool {
        self.state.write().await.collections.remove(&CollectionMembership {
            collection_id,
            asset_id,
            asset_type,
        })
    }

    pub async fn add_metric_to_dashboard(&self, dashboard_id: Uuid, metric_id: Uuid) {
        self.state
            .write()
            .await
            .dashboard_metrics
            .insert(DashboardMetric {
                dashboard_id,
                metric_id,
            });
    }

    pub async fn add_team_member(&self, team_id: Uuid, user_id: Uuid) {
        self.state
            .write()
            .await
            .team_members
            .insert(TeamMember { team_id, user_id });
    }

    /// Put the user in an organization, replacing any previous membership.
    pub async fn set_membership(&self, user_id: Uuid, organization_id: Uuid, role: OrgRole) {
        self.state.write().await.memberships.insert(
            user_id,
            OrganizationMembership {
                user_id,
                organization_id,
                role,
            },
        );
    }

    pub async fn remove_membership(&self, user_id: Uuid) -> bool {
        self.state.write().await.memberships.remove(&user_id).is_some()
    }

    /// Mark the asset as deleted. Returns whether the asset exists.
    pub async fn soft_delete(&self, asset_id: Uuid, asset_type: AssetType) -> bool {
        self.set_deleted(asset_id, asset_type, true).await
    }

    /// Clear the asset's deletion mark. Returns whether the asset exists.
    pub async fn restore(&self, asset_id: Uuid, asset_type: AssetType) -> bool {
        self.set_deleted(asset_id, asset_type, false).await
    }

    async fn set_deleted(&self, asset_id: Uuid, asset_type: AssetType, deleted: bool) -> bool {
        let deleted_at = deleted.then(Utc::now);
        let mut state = self.state.write().await;

        if asset_type == AssetType::Dataset
            && let Some(dataset) = state.datasets.iter_mut().find(|d| d.id == asset_id)
        {
            dataset.deleted_at = deleted_at;
        }
        match state.assets.get_mut(&(asset_id, asset_type)) {
            Some(meta) => {
                meta.deleted_at = deleted_at;
                true
            }
            None => false,
        }
    }

    /// Make every subsequent port call fail with [`RepositoryError::Unavailable`].
    pub fn fail_with(&self, message: impl Into<String>) {
        *self.failure.lock() = Some(message.into());
    }

    pub fn recover(&self) {
        *self.failure.lock() = None;
    }

    /// Number of times the named port method was called, failed calls
    /// included.
    pub fn call_count(&self, method: &str) -> usize {
        self.calls.lock().get(method).copied().unwrap_or(0)
    }

    /// Total port calls across all methods.
    pub fn total_calls(&self) -> usize {
        self.calls.lock().values().sum()
    }

    pub fn reset_calls(&self) {
        self.calls.lock().clear();
    }

    /// Snapshot the current contents as a fixture.
    pub async fn snapshot(&self) -> RepositoryFixture {
        let state = self.state.read().await;
        let datasets: Vec<DatasetRecord> = state
            .datasets
            .iter()
            .filter_map(|dataset| {
                state
                    .assets
                    .get(&(dataset.id, AssetType::Dataset))
                    .map(|meta| DatasetRecord {
                        dataset: dataset.clone(),
                        created_by: meta.created_by,
                    })
            })
            .collect();

        RepositoryFixture {
            assets: state
                .assets
                .iter()
                .filter(|((_, asset_type), _)| *asset_type != AssetType::Dataset)
                .map(|((id, asset_type), meta)| AssetRecord {
                    id: *id,
                    asset_type: *asset_type,
                    meta: meta.clone(),
                })
                .collect(),
            datasets,
            permissions: state.permissions.values().cloned().collect(),
            collections: state.collections.iter().copied().collect(),
            dashboard_metrics: state.dashboard_metrics.iter().copied().collect(),
            memberships: state.memberships.values().copied().collect(),
            team_members: state.team_members.iter().copied().collect(),
        }
    }

    fn record(&self, method: &'static str) -> RepositoryResult<()> {
        *self.calls.lock().entry(method).or_insert(0) += 1;
        match self.failure.lock().as_ref() {
            Some(message) => Err(RepositoryError::unavailable(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl AccessRepository for InMemoryRepository {
    async fn find_direct_permission(
        &self,
        identity_id: Uuid,
        asset_id: Uuid,
        asset_type: AssetType,
    ) -> RepositoryResult<Option<AssetPermission>> {
        self.record("find_direct_permission")?;
        let state = self.state.read().await;

        let strongest = state
            .identities_of(identity_id)
            .into_iter()
            .filter_map(|identity| state.permissions.get(&(identity, asset_id, asset_type)))
            .filter(|row| row.is_active())
            .max_by_key(|row| row.role)
            .cloned();

        // A revoked row of the identity itself is still reported
        Ok(strongest.or_else(|| {
            state
                .permissions
                .get(&(identity_id, asset_id, asset_type))
                .cloned()
        }))
    }

    async fn find_collections_containing(
        &self,
        asset_id: Uuid,
        asset_type: AssetType,
    ) -> RepositoryResult<Vec<Uuid>> {
        self.record("find_collections_containing")?;
        let state = self.state.read().await;
        Ok(state
            .collections
            .iter()
            .filter(|m| m.asset_id == asset_id && m.asset_type == asset_type)
            .map(|m| m.collection_id)
            .collect())
    }

    async fn find_dashboards_containing_metric(&self, metric_id: Uuid) -> RepositoryResult<Vec<Uuid>> {
        self.record("find_dashboards_containing_metric")?;
        let state = self.state.read().await;
        Ok(state
            .dashboard_metrics
            .iter()
            .filter(|m| m.metric_id == metric_id)
            .map(|m| m.dashboard_id)
            .collect())
    }

    async fn find_org_role(
        &self,
        user_id: Uuid,
        organization_id: Uuid,
    ) -> RepositoryResult<Option<OrgRole>> {
        self.record("find_org_role")?;
        let state = self.state.read().await;
        Ok(state
            .memberships
            .get(&user_id)
            .filter(|m| m.organization_id == organization_id)
            .map(|m| m.role))
    }

    async fn find_user_organization(
        &self,
        user_id: Uuid,
    ) -> RepositoryResult<Option<OrganizationMembership>> {
        self.record("find_user_organization")?;
        Ok(self.state.read().await.memberships.get(&user_id).copied())
    }

    async fn find_asset_meta(
        &self,
        asset_id: Uuid,
        asset_type: AssetType,
    ) -> RepositoryResult<Option<AssetMeta>> {
        self.record("find_asset_meta")?;
        Ok(self
            .state
            .read()
            .await
            .assets
            .get(&(asset_id, asset_type))
            .cloned())
    }

    async fn find_datasets_by_org(
        &self,
        organization_id: Uuid,
        page: u32,
        page_size: u32,
    ) -> RepositoryResult<Vec<Dataset>> {
        self.record("find_datasets_by_org")?;
        let state = self.state.read().await;
        let skip = page as usize * page_size as usize;
        Ok(state
            .datasets
            .iter()
            .filter(|d| d.organization_id == organization_id && !d.is_deleted())
            .skip(skip)
            .take(page_size as usize)
            .cloned()
            .collect())
    }
}
