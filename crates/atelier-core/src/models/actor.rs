use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use uuid::Uuid;

/// User role as known to the authentication system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "text", rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Regular,
    Elevated,
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Role::Regular => write!(f, "regular"),
            Role::Elevated => write!(f, "elevated"),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "regular" => Ok(Role::Regular),
            "elevated" => Ok(Role::Elevated),
            other => Err(format!("Unknown role: {}", other)),
        }
    }
}

/// Fine-grained permission granted on top of roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Edit content items authored by someone else, including items in moderation
    EditOthers,
}

impl FromStr for Capability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "edit_others" => Ok(Capability::EditOthers),
            other => Err(format!("Unknown capability: {}", other)),
        }
    }
}

/// The authenticated caller of a request.
///
/// Resolved once by the authentication layer and passed explicitly into every
/// pipeline entry point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: Uuid,
    pub roles: Vec<Role>,
    #[serde(default)]
    pub capabilities: Vec<Capability>,
}

impl Actor {
    pub fn new(id: Uuid, roles: Vec<Role>, capabilities: Vec<Capability>) -> Self {
        Self {
            id,
            roles,
            capabilities,
        }
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn can(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    pub fn is_elevated(&self) -> bool {
        self.has_role(Role::Elevated)
    }

    /// Roles this actor may grant when adding new collaborators
    pub fn grantable_roles(&self) -> Vec<Role> {
        if self.is_elevated() {
            vec![Role::Regular, Role::Elevated]
        } else {
            vec![Role::Regular]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grantable_roles_depend_on_elevation() {
        let regular = Actor::new(Uuid::new_v4(), vec![Role::Regular], vec![]);
        assert_eq!(regular.grantable_roles(), vec![Role::Regular]);

        let elevated = Actor::new(Uuid::new_v4(), vec![Role::Elevated], vec![]);
        assert_eq!(
            elevated.grantable_roles(),
            vec![Role::Regular, Role::Elevated]
        );
    }

    #[test]
    fn test_capabilities() {
        let editor = Actor::new(Uuid::new_v4(), vec![], vec![Capability::EditOthers]);
        assert!(editor.can(Capability::EditOthers));
        assert!(!editor.is_elevated());
    }
}
