//! Chat access helpers.
//!
//! Unlike the resolver, malformed ids are not an error here: they simply
//! resolve to "no access".

use access_protocol::{AssetPermissionResult, AssetType};
use futures::TryFutureExt;
use tracing::instrument;

use crate::engine::AccessControl;
use crate::error::{AccessError, Result};
use crate::validation::parse_id;

impl AccessControl {
    /// Full result of a view check on a chat, reporting which path granted
    /// access.
    ///
    /// The direct grant, the collection check and the admin lookup are all
    /// started together. When several hold, the path is reported in the
    /// order creator, admin, direct, collection.
    #[instrument(skip(self))]
    pub async fn check_chat_access(&self, user_id: &str, chat_id: &str) -> Result<AssetPermissionResult> {
        let (Ok(user_id), Ok(chat_id)) = (parse_id("user_id", user_id), parse_id("chat_id", chat_id))
        else {
            tracing::debug!("Malformed id in chat access check");
            return Ok(AssetPermissionResult::denied());
        };

        let meta = self
            .repository
            .find_asset_meta(chat_id, AssetType::Chat)
            .await?;
        let Some(meta) = meta.filter(|meta| !meta.is_deleted()) else {
            tracing::debug!(%user_id, %chat_id, "Chat missing or deleted");
            return Ok(AssetPermissionResult::denied());
        };

        let (direct, reachable, org_role) = tokio::try_join!(
            self.repository
                .find_direct_permission(user_id, chat_id, AssetType::Chat)
                .err_into::<AccessError>(),
            self.cascading_access(user_id, chat_id, AssetType::Chat),
            self.repository
                .find_org_role(user_id, meta.organization_id)
                .err_into::<AccessError>(),
        )?;

        let result = if meta.created_by == user_id {
            AssetPermissionResult::creator()
        } else if org_role.is_some_and(|role| role.is_workspace_admin()) {
            AssetPermissionResult::admin()
        } else if let Some(row) = direct.filter(|row| row.is_active()) {
            AssetPermissionResult::direct(row.role)
        } else if reachable {
            AssetPermissionResult::collection()
        } else {
            AssetPermissionResult::denied()
        };

        tracing::debug!(
            %user_id,
            %chat_id,
            has_access = result.has_access,
            access_path = ?result.access_path,
            "Checked chat access"
        );
        Ok(result)
    }

    /// Boolean view of [`AccessControl::check_chat_access`].
    pub async fn can_user_access_chat(&self, user_id: &str, chat_id: &str) -> Result<bool> {
        Ok(self.check_chat_access(user_id, chat_id).await?.has_access)
    }
}
