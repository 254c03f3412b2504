//! Permission resolution for a single asset.
//!
//! Order of evaluation:
//!
//! 1. missing or soft-deleted asset: denied, whatever the grants
//! 2. workspace admin of the asset's organization (data admin, for
//!    datasets): `owner` via `admin`
//! 3. creator: `owner` via `creator`
//! 4. cached result
//! 5. direct grant of sufficient rank
//! 6. for view-level checks, inheritance through a container
//!
//! Steps 1 to 3 are re-derived on every call and never cached. Steps 5 and 6
//! are written through to the cache.

use access_cache::PermissionKey;
use access_protocol::{AccessPath, AssetMeta, AssetPermissionResult, AssetType, Role};
use futures::future::try_join_all;
use tracing::instrument;
use uuid::Uuid;

use crate::engine::AccessControl;
use crate::error::Result;
use crate::validation::parse_id;

/// Whether the organization-role bypass applies to a check.
///
/// Containers are judged with [`OrgBypass::Skip`]: the cascading store must
/// never hold an answer that depends on an organization role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OrgBypass {
    Apply,
    Skip,
}

/// Outcome of the checks that only look at the asset itself.
pub(crate) enum Decision {
    Final(AssetPermissionResult),
    /// No own grant is sufficient; inheritance may still apply.
    Undecided,
}

impl AccessControl {
    /// Can `user_id` act on the asset with at least `required_role`?
    ///
    /// Fails with a validation error, before any repository call, when an id
    /// is not a UUID. Denial is returned as `has_access: false`.
    ///
    /// Only a `can_view` requirement can be met through a containing
    /// collection or dashboard. Anything stronger needs a direct grant, the
    /// creator or an admin role.
    #[instrument(skip(self))]
    pub async fn resolve_access(
        &self,
        user_id: &str,
        asset_id: &str,
        asset_type: AssetType,
        required_role: Role,
    ) -> Result<AssetPermissionResult> {
        let user_id = parse_id("user_id", user_id)?;
        let asset_id = parse_id("asset_id", asset_id)?;
        self.resolve(user_id, asset_id, asset_type, required_role).await
    }

    /// Resolves several assets for one user concurrently. Every id is
    /// validated before the first lookup; results keep the input order.
    #[instrument(skip(self, assets), fields(count = assets.len()))]
    pub async fn resolve_access_many<S: AsRef<str>>(
        &self,
        user_id: &str,
        assets: &[(S, AssetType)],
        required_role: Role,
    ) -> Result<Vec<AssetPermissionResult>> {
        let user_id = parse_id("user_id", user_id)?;
        let parsed = assets
            .iter()
            .map(|(id, asset_type)| Ok((parse_id("asset_id", id.as_ref())?, *asset_type)))
            .collect::<Result<Vec<_>>>()?;

        try_join_all(
            parsed
                .into_iter()
                .map(|(asset_id, asset_type)| self.resolve(user_id, asset_id, asset_type, required_role)),
        )
        .await
    }

    /// Resolution on parsed ids.
    pub async fn resolve(
        &self,
        user_id: Uuid,
        asset_id: Uuid,
        asset_type: AssetType,
        required_role: Role,
    ) -> Result<AssetPermissionResult> {
        let generation = self.cache.generation();
        let meta = self.repository.find_asset_meta(asset_id, asset_type).await?;
        self.resolve_with_meta(user_id, asset_id, asset_type, required_role, meta.as_ref(), generation)
            .await
    }

    async fn resolve_with_meta(
        &self,
        user_id: Uuid,
        asset_id: Uuid,
        asset_type: AssetType,
        required_role: Role,
        meta: Option<&AssetMeta>,
        generation: u64,
    ) -> Result<AssetPermissionResult> {
        let decision = self
            .resolve_own_grants(
                user_id,
                asset_id,
                asset_type,
                required_role,
                meta,
                OrgBypass::Apply,
                generation,
            )
            .await?;
        if let Decision::Final(result) = decision {
            return Ok(result);
        }

        let inherited = required_role == Role::CanView
            && self.cascading_access(user_id, asset_id, asset_type).await?;
        let result = if inherited {
            AssetPermissionResult::collection()
        } else {
            AssetPermissionResult::denied()
        };

        let key = PermissionKey::new(user_id, asset_id, asset_type, required_role);
        self.cache.set_permission_if_current(key, result, generation);

        tracing::debug!(
            %user_id,
            %asset_id,
            %asset_type,
            %required_role,
            has_access = result.has_access,
            "Resolved through inheritance"
        );
        Ok(result)
    }

    /// Can the user view a container (collection or dashboard) on its own
    /// merits? Never follows inheritance, which bounds cascading to one hop.
    /// Organization roles are ignored; admins are handled on the asset itself.
    pub(crate) async fn resolve_container(
        &self,
        user_id: Uuid,
        container_id: Uuid,
        container_type: AssetType,
    ) -> Result<bool> {
        let generation = self.cache.generation();
        let meta = self
            .repository
            .find_asset_meta(container_id, container_type)
            .await?;

        let decision = self
            .resolve_own_grants(
                user_id,
                container_id,
                container_type,
                Role::CanView,
                meta.as_ref(),
                OrgBypass::Skip,
                generation,
            )
            .await?;

        Ok(match decision {
            Decision::Final(result) => {
                result.has_access && result.access_path != Some(AccessPath::Collection)
            }
            Decision::Undecided => false,
        })
    }

    /// Deletion, admin and creator shortcuts, the cache, then the direct
    /// grant. A sufficient direct grant is cached. The admin shortcut is only
    /// taken under [`OrgBypass::Apply`].
    pub(crate) async fn resolve_own_grants(
        &self,
        user_id: Uuid,
        asset_id: Uuid,
        asset_type: AssetType,
        required_role: Role,
        meta: Option<&AssetMeta>,
        bypass: OrgBypass,
        generation: u64,
    ) -> Result<Decision> {
        let Some(meta) = meta.filter(|meta| !meta.is_deleted()) else {
            tracing::debug!(%user_id, %asset_id, %asset_type, "Asset missing or deleted");
            return Ok(Decision::Final(AssetPermissionResult::denied()));
        };

        let org_role = match bypass {
            OrgBypass::Apply => {
                self.repository
                    .find_org_role(user_id, meta.organization_id)
                    .await?
            }
            OrgBypass::Skip => None,
        };
        if let Some(org_role) = org_role
            && (org_role.is_workspace_admin()
                || (asset_type == AssetType::Dataset && org_role.bypasses_dataset_permissions()))
        {
            tracing::debug!(%user_id, %asset_id, %asset_type, %org_role, "Admin bypass");
            return Ok(Decision::Final(AssetPermissionResult::admin()));
        }

        if meta.created_by == user_id {
            tracing::debug!(%user_id, %asset_id, %asset_type, "Creator bypass");
            return Ok(Decision::Final(AssetPermissionResult::creator()));
        }

        let key = PermissionKey::new(user_id, asset_id, asset_type, required_role);
        if let Some(cached) = self.cache.get_permission(&key) {
            return Ok(Decision::Final(cached));
        }

        let grant = self
            .repository
            .find_direct_permission(user_id, asset_id, asset_type)
            .await?
            .filter(|row| row.is_active());

        match grant {
            Some(row) if row.role.satisfies(required_role) => {
                let result = AssetPermissionResult::direct(row.role);
                self.cache.set_permission_if_current(key, result, generation);
                tracing::debug!(
                    %user_id,
                    %asset_id,
                    %asset_type,
                    %required_role,
                    role = %row.role,
                    "Direct grant"
                );
                Ok(Decision::Final(result))
            }
            _ => Ok(Decision::Undecided),
        }
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
        owner: Uuid,
        user: Uuid,
    }

    async fn setup() -> Setup {
        let repo = Arc::new(InMemoryRepository::new());
        let access = AccessControl::new(repo.clone(), AccessConfig::default());
        let (org, owner, user) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        repo.set_membership(owner, org, OrgRole::Querier).await;
        repo.set_membership(user, org, OrgRole::Viewer).await;
        Setup {
            repo,
            access,
            org,
            owner,
            user,
        }
    }

    impl Setup {
        async fn asset(&self, asset_type: AssetType) -> Uuid {
            let id = Uuid::new_v4();
            self.repo
                .insert_asset(id, asset_type, AssetMeta::new(self.owner, self.org))
                .await;
            id
        }

        async fn grant(&self, asset: Uuid, asset_type: AssetType, role: Role) {
            self.repo
                .grant(AssetPermission::for_user(self.user, asset, asset_type, role))
                .await;
        }
    }

    #[tokio::test]
    async fn test_malformed_ids_fail_before_io() {
        let s = setup().await;
        let asset = Uuid::new_v4().to_string();

        let err = s
            .access
            .resolve_access("nope", &asset, AssetType::Chat, Role::CanView)
            .await
            .unwrap_err();
        assert!(err.is_validation());

        let err = s
            .access
            .resolve_access(&s.user.to_string(), "1234", AssetType::Chat, Role::CanView)
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(s.repo.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_direct_grant_rank() {
        let s = setup().await;
        let dash = s.asset(AssetType::DashboardFile).await;
        s.grant(dash, AssetType::DashboardFile, Role::CanFilter).await;

        for (required, expected) in [
            (Role::CanView, true),
            (Role::CanFilter, true),
            (Role::CanEdit, false),
            (Role::FullAccess, false),
            (Role::Owner, false),
        ] {
            let result = s
                .access
                .resolve(s.user, dash, AssetType::DashboardFile, required)
                .await
                .unwrap();
            assert_eq!(result.has_access, expected, "{required}");
            if expected {
                assert_eq!(result, AssetPermissionResult::direct(Role::CanFilter));
            }
        }
    }

    #[tokio::test]
    async fn test_creator_and_admin_bypass() {
        let s = setup().await;
        let report = s.asset(AssetType::ReportFile).await;

        let result = s
            .access
            .resolve(s.owner, report, AssetType::ReportFile, Role::Owner)
            .await
            .unwrap();
        assert_eq!(result, AssetPermissionResult::creator());

        let admin = Uuid::new_v4();
        s.repo.set_membership(admin, s.org, OrgRole::WorkspaceAdmin).await;
        let result = s
            .access
            .resolve(admin, report, AssetType::ReportFile, Role::Owner)
            .await
            .unwrap();
        assert_eq!(result, AssetPermissionResult::admin());

        // Bypass results are never cached
        assert!(s.access.cache().is_empty());
    }

    #[tokio::test]
    async fn test_admin_of_another_org_has_no_bypass() {
        let s = setup().await;
        let chat = s.asset(AssetType::Chat).await;
        let outsider = Uuid::new_v4();
        s.repo
            .set_membership(outsider, Uuid::new_v4(), OrgRole::WorkspaceAdmin)
            .await;

        let result = s
            .access
            .resolve(outsider, chat, AssetType::Chat, Role::CanView)
            .await
            .unwrap();
        assert!(!result.has_access);
    }

    #[tokio::test]
    async fn test_admin_demotion_takes_effect_immediately() {
        let s = setup().await;
        let chat = s.asset(AssetType::Chat).await;
        s.repo.set_membership(s.user, s.org, OrgRole::WorkspaceAdmin).await;

        let before = s
            .access
            .resolve(s.user, chat, AssetType::Chat, Role::CanEdit)
            .await
            .unwrap();
        assert!(before.has_access);

        s.repo.set_membership(s.user, s.org, OrgRole::Viewer).await;
        let after = s
            .access
            .resolve(s.user, chat, AssetType::Chat, Role::CanEdit)
            .await
            .unwrap();
        assert!(!after.has_access);
    }

    #[tokio::test]
    async fn test_admin_demotion_is_not_remembered_through_collections() {
        let s = setup().await;
        let chat = s.asset(AssetType::Chat).await;
        let coll = s.asset(AssetType::Collection).await;
        s.repo.add_to_collection(coll, chat, AssetType::Chat).await;
        s.repo.set_membership(s.user, s.org, OrgRole::WorkspaceAdmin).await;

        let as_admin = s
            .access
            .resolve(s.user, chat, AssetType::Chat, Role::CanView)
            .await
            .unwrap();
        assert_eq!(as_admin, AssetPermissionResult::admin());

        // An admin role on the organization does not make the collection a
        // source of inherited access
        assert!(!s.access.cascading_access(s.user, chat, AssetType::Chat).await.unwrap());
        assert!(
            !s.access
                .resolve_container(s.user, coll, AssetType::Collection)
                .await
                .unwrap()
        );

        // Demoted without any event reaching the cache
        s.repo.set_membership(s.user, s.org, OrgRole::Viewer).await;
        let after = s
            .access
            .resolve(s.user, chat, AssetType::Chat, Role::CanView)
            .await
            .unwrap();
        assert_eq!(after, AssetPermissionResult::denied());
    }

    #[tokio::test]
    async fn test_data_admin_bypass_is_limited_to_datasets() {
        let s = setup().await;
        let dataset = s.asset(AssetType::Dataset).await;
        let chat = s.asset(AssetType::Chat).await;
        s.repo.set_membership(s.user, s.org, OrgRole::DataAdmin).await;

        let on_dataset = s
            .access
            .resolve(s.user, dataset, AssetType::Dataset, Role::CanView)
            .await
            .unwrap();
        assert_eq!(on_dataset, AssetPermissionResult::admin());

        let on_chat = s
            .access
            .resolve(s.user, chat, AssetType::Chat, Role::CanView)
            .await
            .unwrap();
        assert!(!on_chat.has_access);
    }

    #[tokio::test]
    async fn test_deleted_asset_denies_everyone() {
        let s = setup().await;
        let chat = s.asset(AssetType::Chat).await;
        s.grant(chat, AssetType::Chat, Role::Owner).await;
        s.repo.soft_delete(chat, AssetType::Chat).await;

        for user in [s.user, s.owner] {
            let result = s
                .access
                .resolve(user, chat, AssetType::Chat, Role::CanView)
                .await
                .unwrap();
            assert_eq!(result, AssetPermissionResult::denied());
        }

        let missing = s
            .access
            .resolve(s.user, Uuid::new_v4(), AssetType::Chat, Role::CanView)
            .await
            .unwrap();
        assert!(!missing.has_access);
    }

    #[tokio::test]
    async fn test_revoked_grant_is_ignored() {
        let s = setup().await;
        let metric = s.asset(AssetType::MetricFile).await;
        s.grant(metric, AssetType::MetricFile, Role::CanEdit).await;
        s.repo.revoke(s.user, metric, AssetType::MetricFile).await;

        let result = s
            .access
            .resolve(s.user, metric, AssetType::MetricFile, Role::CanView)
            .await
            .unwrap();
        assert!(!result.has_access);
    }

    #[tokio::test]
    async fn test_results_are_written_through() {
        let s = setup().await;
        let dash = s.asset(AssetType::DashboardFile).await;
        s.grant(dash, AssetType::DashboardFile, Role::CanView).await;

        let first = s
            .access
            .resolve(s.user, dash, AssetType::DashboardFile, Role::CanView)
            .await
            .unwrap();
        let lookups = s.repo.call_count("find_direct_permission");

        let second = s
            .access
            .resolve(s.user, dash, AssetType::DashboardFile, Role::CanView)
            .await
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(s.repo.call_count("find_direct_permission"), lookups);
        assert_eq!(s.access.cache().stats().permission.hits, 1);

        // A denial is cached too
        let denied = s
            .access
            .resolve(s.user, dash, AssetType::DashboardFile, Role::Owner)
            .await
            .unwrap();
        assert!(!denied.has_access);
        let key = PermissionKey::new(s.user, dash, AssetType::DashboardFile, Role::Owner);
        assert_eq!(s.access.cache().peek_permission(&key), Some(denied));
    }

    #[tokio::test]
    async fn test_inheritance_only_answers_view() {
        let s = setup().await;
        let chat = s.asset(AssetType::Chat).await;
        let coll = s.asset(AssetType::Collection).await;
        s.repo.add_to_collection(coll, chat, AssetType::Chat).await;
        s.grant(coll, AssetType::Collection, Role::FullAccess).await;

        let view = s
            .access
            .resolve(s.user, chat, AssetType::Chat, Role::CanView)
            .await
            .unwrap();
        assert_eq!(view, AssetPermissionResult::collection());
        assert_eq!(view.effective_role, None);

        let edit = s
            .access
            .resolve(s.user, chat, AssetType::Chat, Role::CanEdit)
            .await
            .unwrap();
        assert!(!edit.has_access);
    }

    #[tokio::test]
    async fn test_resolve_access_many() {
        let s = setup().await;
        let granted = s.asset(AssetType::Chat).await;
        let other = s.asset(AssetType::MetricFile).await;
        s.grant(granted, AssetType::Chat, Role::CanView).await;

        let user = s.user.to_string();
        let results = s
            .access
            .resolve_access_many(
                &user,
                &[
                    (granted.to_string(), AssetType::Chat),
                    (other.to_string(), AssetType::MetricFile),
                ],
                Role::CanView,
            )
            .await
            .unwrap();
        assert_eq!(
            results,
            vec![
                AssetPermissionResult::direct(Role::CanView),
                AssetPermissionResult::denied()
            ]
        );

        s.repo.reset_calls();
        let err = s
            .access
            .resolve_access_many(
                &user,
                &[(granted.to_string(), AssetType::Chat), ("bad".to_string(), AssetType::Chat)],
                Role::CanView,
            )
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(s.repo.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_repository_errors_propagate() {
        let s = setup().await;
        let chat = s.asset(AssetType::Chat).await;
        s.repo.fail_with("timeout");

        let err = s
            .access
            .resolve(s.user, chat, AssetType::Chat, Role::CanView)
            .await
            .unwrap_err();
        assert!(err.is_repository());
        assert_eq!(s.repo.call_count("find_asset_meta"), 1);
        assert!(s.access.cache().is_empty());
    }
}
