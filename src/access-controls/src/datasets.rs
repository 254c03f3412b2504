//! Dataset access helpers.

use access_protocol::{AssetType, Dataset, Role};
use futures::future::try_join_all;
use tracing::instrument;
use uuid::Uuid;

use crate::engine::AccessControl;
use crate::error::Result;
use crate::validation::{parse_id, parse_ids, validate_pagination};

impl AccessControl {
    /// One page of the datasets the user may view in their organization.
    ///
    /// Workspace and data admins page through every non-deleted dataset of
    /// the organization. Everyone else pages through the subset reachable by
    /// a direct or inherited grant. A user without an organization gets an
    /// empty list.
    #[instrument(skip(self))]
    pub async fn get_permissioned_datasets(
        &self,
        user_id: &str,
        page: i64,
        page_size: i64,
    ) -> Result<Vec<Dataset>> {
        let user_id = parse_id("user_id", user_id)?;
        let (page, page_size) = validate_pagination(page, page_size)?;

        let Some(membership) = self.repository.find_user_organization(user_id).await? else {
            tracing::debug!(%user_id, "User has no organization");
            return Ok(Vec::new());
        };

        if membership.role.bypasses_dataset_permissions() {
            return Ok(self
                .repository
                .find_datasets_by_org(membership.organization_id, page, page_size)
                .await?);
        }

        let skip = page as usize * page_size as usize;
        let wanted = skip + page_size as usize;
        let batch_size = self.config.dataset_scan_batch;

        let mut accessible = Vec::new();
        let mut batch_page = 0;
        loop {
            let batch = self
                .repository
                .find_datasets_by_org(membership.organization_id, batch_page, batch_size)
                .await?;
            let exhausted = batch.len() < batch_size as usize;

            let checks = try_join_all(
                batch
                    .iter()
                    .map(|dataset| self.dataset_access(user_id, dataset.id)),
            )
            .await?;
            accessible.extend(
                batch
                    .into_iter()
                    .zip(checks)
                    .filter_map(|(dataset, allowed)| allowed.then_some(dataset)),
            );

            if exhausted || accessible.len() >= wanted {
                break;
            }
            batch_page += 1;
        }

        tracing::debug!(
            %user_id,
            scanned_batches = batch_page + 1,
            found = accessible.len(),
            "Scanned datasets"
        );
        Ok(accessible.into_iter().skip(skip).take(page_size as usize).collect())
    }

    /// Can the user view the dataset? A soft-deleted dataset is never
    /// accessible.
    #[instrument(skip(self))]
    pub async fn has_dataset_access(&self, user_id: &str, dataset_id: &str) -> Result<bool> {
        let user_id = parse_id("user_id", user_id)?;
        let dataset_id = parse_id("dataset_id", dataset_id)?;
        self.dataset_access(user_id, dataset_id).await
    }

    /// Can the user view every listed dataset?
    ///
    /// An empty list is `false`. All ids are validated before the first
    /// lookup.
    #[instrument(skip(self, dataset_ids), fields(count = dataset_ids.len()))]
    pub async fn has_all_datasets_access<S: AsRef<str>>(
        &self,
        user_id: &str,
        dataset_ids: &[S],
    ) -> Result<bool> {
        if dataset_ids.is_empty() {
            return Ok(false);
        }
        let user_id = parse_id("user_id", user_id)?;
        let dataset_ids = parse_ids("dataset_id", dataset_ids)?;

        let checks = try_join_all(
            dataset_ids
                .into_iter()
                .map(|dataset_id| self.dataset_access(user_id, dataset_id)),
        )
        .await?;
        Ok(checks.into_iter().all(|allowed| allowed))
    }

    pub async fn dataset_access(&self, user_id: Uuid, dataset_id: Uuid) -> Result<bool> {
        let result = self
            .resolve(user_id, dataset_id, AssetType::Dataset, Role::CanView)
            .await?;
        Ok(result.has_access)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AccessConfig, InMemoryRepository};
    use access_protocol::{AssetPermission, OrgRole};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    struct Setup {
        repo: Arc<InMemoryRepository>,
        access: AccessControl,
        org: Uuid,
        creator: Uuid,
        user: Uuid,
        datasets: Vec<Uuid>,
    }

    /// Six datasets `d0`..`d5` in one organization, none granted to `user`.
    async fn setup(batch: u32) -> Setup {
        let repo = Arc::new(InMemoryRepository::new());
        let config = AccessConfig::builder().dataset_scan_batch(batch).build().unwrap();
        let access = AccessControl::new(repo.clone(), config);
        let (org, creator, user) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        repo.set_membership(user, org, OrgRole::Querier).await;

        let mut datasets = Vec::new();
        for i in 0..6 {
            let dataset = Dataset {
                id: Uuid::new_v4(),
                name: format!("d{i}"),
                organization_id: org,
                deleted_at: None,
            };
            datasets.push(dataset.id);
            repo.add_dataset(dataset, creator).await;
        }
        Setup {
            repo,
            access,
            org,
            creator,
            user,
            datasets,
        }
    }

    impl Setup {
        async fn grant(&self, index: usize) {
            self.repo
                .grant(AssetPermission::for_user(
                    self.user,
                    self.datasets[index],
                    AssetType::Dataset,
                    Role::CanView,
                ))
                .await;
        }
    }

    fn names(datasets: Vec<Dataset>) -> Vec<String> {
        datasets.into_iter().map(|d| d.name).collect()
    }

    #[tokio::test]
    async fn test_pagination_validation() {
        let s = setup(500).await;
        let user = s.user.to_string();

        for (page, size) in [(-1, 10), (0, 0), (0, 1001)] {
            let err = s
                .access
                .get_permissioned_datasets(&user, page, size)
                .await
                .unwrap_err();
            assert!(err.is_validation(), "page={page} size={size}");
        }
        assert!(
            s.access
                .get_permissioned_datasets("not-a-user", 0, 10)
                .await
                .unwrap_err()
                .is_validation()
        );
        assert_eq!(s.repo.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_user_without_organization() {
        let s = setup(500).await;
        let stranger = Uuid::new_v4().to_string();
        let datasets = s.access.get_permissioned_datasets(&stranger, 0, 10).await.unwrap();
        assert!(datasets.is_empty());
    }

    #[tokio::test]
    async fn test_admins_page_through_everything() {
        let s = setup(500).await;
        s.repo.soft_delete(s.datasets[0], AssetType::Dataset).await;

        for role in [OrgRole::WorkspaceAdmin, OrgRole::DataAdmin] {
            s.repo.set_membership(s.user, s.org, role).await;
            let user = s.user.to_string();
            let first = s.access.get_permissioned_datasets(&user, 0, 3).await.unwrap();
            let second = s.access.get_permissioned_datasets(&user, 1, 3).await.unwrap();
            assert_eq!(names(first), vec!["d1", "d2", "d3"]);
            assert_eq!(names(second), vec!["d4", "d5"]);
        }
    }

    #[tokio::test]
    async fn test_non_admin_sees_granted_datasets_across_batches() {
        let s = setup(2).await;
        for index in [1, 3, 4, 5] {
            s.grant(index).await;
        }
        let user = s.user.to_string();

        let first = s.access.get_permissioned_datasets(&user, 0, 2).await.unwrap();
        let second = s.access.get_permissioned_datasets(&user, 1, 2).await.unwrap();
        let third = s.access.get_permissioned_datasets(&user, 2, 2).await.unwrap();

        assert_eq!(names(first), vec!["d1", "d3"]);
        assert_eq!(names(second), vec!["d4", "d5"]);
        assert!(third.is_empty());
    }

    #[tokio::test]
    async fn test_scan_stops_once_page_is_filled() {
        let s = setup(2).await;
        for index in 0..6 {
            s.grant(index).await;
        }
        let user = s.user.to_string();

        let first = s.access.get_permissioned_datasets(&user, 0, 2).await.unwrap();
        assert_eq!(names(first), vec!["d0", "d1"]);
        assert_eq!(s.repo.call_count("find_datasets_by_org"), 1);
    }

    #[tokio::test]
    async fn test_creator_sees_own_dataset() {
        let s = setup(500).await;
        s.repo.set_membership(s.creator, s.org, OrgRole::Viewer).await;
        let creator = s.creator.to_string();
        let all = s.access.get_permissioned_datasets(&creator, 0, 100).await.unwrap();
        assert_eq!(all.len(), 6);
    }

    #[tokio::test]
    async fn test_has_dataset_access() {
        let s = setup(500).await;
        s.grant(0).await;
        let user = s.user.to_string();
        let granted = s.datasets[0].to_string();
        let other = s.datasets[1].to_string();

        assert!(s.access.has_dataset_access(&user, &granted).await.unwrap());
        assert!(!s.access.has_dataset_access(&user, &other).await.unwrap());
        assert!(
            s.access
                .has_dataset_access(&user, "dataset-1")
                .await
                .unwrap_err()
                .is_validation()
        );
    }

    #[tokio::test]
    async fn test_deleted_dataset_denied_despite_grant() {
        let s = setup(500).await;
        s.grant(2).await;
        s.repo.soft_delete(s.datasets[2], AssetType::Dataset).await;

        let user = s.user.to_string();
        let id = s.datasets[2].to_string();
        assert!(!s.access.has_dataset_access(&user, &id).await.unwrap());
    }

    #[tokio::test]
    async fn test_has_all_datasets_access() {
        let s = setup(500).await;
        s.grant(0).await;
        s.grant(1).await;
        let user = s.user.to_string();
        let ids: Vec<String> = s.datasets.iter().map(Uuid::to_string).collect();

        let empty: [&str; 0] = [];
        assert!(!s.access.has_all_datasets_access(&user, &empty).await.unwrap());
        assert!(s.access.has_all_datasets_access(&user, &ids[..2]).await.unwrap());
        assert!(!s.access.has_all_datasets_access(&user, &ids[..3]).await.unwrap());

        let missing = vec![ids[0].clone(), Uuid::new_v4().to_string()];
        assert!(!s.access.has_all_datasets_access(&user, &missing).await.unwrap());
    }

    #[tokio::test]
    async fn test_has_all_datasets_validates_first() {
        let s = setup(500).await;
        let user = s.user.to_string();
        let ids = vec![s.datasets[0].to_string(), "bogus".to_string()];

        let err = s
            .access
            .has_all_datasets_access(&user, &ids)
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(s.repo.total_calls(), 0);
    }
}
