//! Access Controls - Asset permission resolution.
//!
//! Decides whether a user may act on an asset (chat, dashboard, metric,
//! report, collection, dataset) at a given [`Role`], combining:
//!
//! - workspace-admin bypass (and data-admin bypass for datasets),
//! - creator ownership,
//! - direct permission rows,
//! - view access inherited from containing collections, and from dashboards
//!   for metrics.
//!
//! Decisions go through a shared [`PermissionCache`]. Storage changes are fed
//! back as [`AccessEvent`]s so the cache never serves a decision made before
//! the change.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use access_controls::{AccessConfig, AccessControl, InMemoryRepository};
//! use access_protocol::{AssetMeta, AssetPermission, AssetType, Role};
//! use uuid::Uuid;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> access_controls::Result<()> {
//! let repo = Arc::new(InMemoryRepository::new());
//! let (user, owner, org, dashboard) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
//! repo.insert_asset(dashboard, AssetType::DashboardFile, AssetMeta::new(owner, org)).await;
//! repo.grant(AssetPermission::for_user(user, dashboard, AssetType::DashboardFile, Role::CanView)).await;
//!
//! let access = AccessControl::new(repo, AccessConfig::default());
//! let user = user.to_string();
//! let dashboard = dashboard.to_string();
//!
//! let view = access.resolve_access(&user, &dashboard, AssetType::DashboardFile, Role::CanView).await?;
//! assert!(view.has_access);
//!
//! let edit = access.resolve_access(&user, &dashboard, AssetType::DashboardFile, Role::CanEdit).await?;
//! assert!(!edit.has_access);
//! # Ok(())
//! # }
//! ```
//!
//! [`Role`]: access_protocol::Role
//! [`PermissionCache`]: access_cache::PermissionCache

pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod logging;
pub mod memory;
pub mod repository;
pub mod validation;

mod cascade;
mod chats;
mod datasets;
mod resolver;

pub use config::{AccessConfig, AccessConfigBuilder};
pub use engine::AccessControl;
pub use error::{AccessError, ConfigError, RepositoryError, RepositoryResult, Result, ValidationError};
pub use events::AccessEvent;
pub use memory::{AssetRecord, DatasetRecord, InMemoryRepository, RepositoryFixture, TeamMember};
pub use repository::AccessRepository;
pub use validation::{MAX_PAGE_SIZE, parse_id, parse_ids, validate_pagination};
