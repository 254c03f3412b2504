//! Principals that permissions are granted to.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum_macros::Display;
use uuid::Uuid;

use crate::error::ParseEnumError;
use crate::role::OrgRole;

/// Kind of principal a grant is issued to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum IdentityType {
    User,
    Team,
    Organization,
}

impl IdentityType {
    pub const fn as_str(self) -> &'static str {
        match self {
            IdentityType::User => "user",
            IdentityType::Team => "team",
            IdentityType::Organization => "organization",
        }
    }
}

impl FromStr for IdentityType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(IdentityType::User),
            "team" => Ok(IdentityType::Team),
            "organization" => Ok(IdentityType::Organization),
            _ => Err(ParseEnumError::new("identity type", s)),
        }
    }
}

/// A principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub identity_type: IdentityType,
}

impl Identity {
    pub fn user(id: Uuid) -> Self {
        Self {
            id,
            identity_type: IdentityType::User,
        }
    }

    pub fn team(id: Uuid) -> Self {
        Self {
            id,
            identity_type: IdentityType::Team,
        }
    }

    pub fn organization(id: Uuid) -> Self {
        Self {
            id,
            identity_type: IdentityType::Organization,
        }
    }

    pub fn is_user(&self) -> bool {
        self.identity_type == IdentityType::User
    }
}

/// A user's membership in an organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationMembership {
    pub user_id: Uuid,
    pub organization_id: Uuid,
    pub role: OrgRole,
}
