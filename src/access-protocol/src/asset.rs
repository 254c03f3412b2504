//! Asset kinds and the asset records the engine reads from storage.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::Display;
use uuid::Uuid;

use crate::error::ParseEnumError;

/// Kind of permission-bearing asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AssetType {
    Chat,
    DashboardFile,
    MetricFile,
    ReportFile,
    Collection,
    Dataset,
}

impl AssetType {
    pub const ALL: [AssetType; 6] = [
        AssetType::Chat,
        AssetType::DashboardFile,
        AssetType::MetricFile,
        AssetType::ReportFile,
        AssetType::Collection,
        AssetType::Dataset,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            AssetType::Chat => "chat",
            AssetType::DashboardFile => "dashboard_file",
            AssetType::MetricFile => "metric_file",
            AssetType::ReportFile => "report_file",
            AssetType::Collection => "collection",
            AssetType::Dataset => "dataset",
        }
    }

    /// Collections never inherit access from other collections.
    pub const fn inherits_from_collections(self) -> bool {
        !matches!(self, AssetType::Collection)
    }

    /// Metrics additionally inherit view access from the dashboards that
    /// contain them.
    pub const fn inherits_from_dashboards(self) -> bool {
        matches!(self, AssetType::MetricFile)
    }
}

impl FromStr for AssetType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AssetType::ALL
            .into_iter()
            .find(|ty| ty.as_str() == s)
            .ok_or_else(|| ParseEnumError::new("asset type", s))
    }
}

/// Ownership and lifecycle facts about a single asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetMeta {
    pub created_by: Uuid,
    pub organization_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl AssetMeta {
    pub fn new(created_by: Uuid, organization_id: Uuid) -> Self {
        Self {
            created_by,
            organization_id,
            deleted_at: None,
        }
    }

    /// Mark the asset as soft-deleted at `at`.
    pub fn deleted(mut self, at: DateTime<Utc>) -> Self {
        self.deleted_at = Some(at);
        self
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// A dataset row as listed for an organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    pub id: Uuid,
    pub name: String,
    pub organization_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Dataset {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// An asset placed in a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CollectionMembership {
    pub collection_id: Uuid,
    pub asset_id: Uuid,
    pub asset_type: AssetType,
}

/// A metric placed on a dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DashboardMetric {
    pub dashboard_id: Uuid,
    pub metric_id: Uuid,
}
