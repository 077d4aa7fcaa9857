//! Account roles.

use serde::{Deserialize, Serialize};

/// The single role an account holds for its whole lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "user_role", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Manages accounts and stores.
    Admin,
    /// Browses stores and submits ratings.
    User,
    /// Owns exactly one store and views the ratings it receives.
    StoreOwner,
}

impl Role {
    /// All roles, in declaration order.
    pub const ALL: [Self; 3] = [Self::Admin, Self::User, Self::StoreOwner];

    /// Returns the wire/database name of the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::User => "user",
            Self::StoreOwner => "store_owner",
        }
    }

    /// Whether an administrator may create an account with this role
    /// directly. Store owners only come into existence alongside their store.
    #[must_use]
    pub const fn is_directly_provisionable(self) -> bool {
        matches!(self, Self::Admin | Self::User)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "user" => Ok(Self::User),
            "store_owner" => Ok(Self::StoreOwner),
            _ => Err(format!("invalid role: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_role_display_matches_from_str() {
        for role in Role::ALL {
            assert_eq!(role.to_string().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn test_role_serde_is_snake_case() {
        let json = serde_json::to_string(&Role::StoreOwner).unwrap();
        assert_eq!(json, "\"store_owner\"");

        let parsed: Role = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(parsed, Role::Admin);
    }

    #[test]
    fn test_invalid_role() {
        assert!("owner".parse::<Role>().is_err());
    }

    #[test]
    fn test_store_owner_not_directly_provisionable() {
        assert!(Role::Admin.is_directly_provisionable());
        assert!(Role::User.is_directly_provisionable());
        assert!(!Role::StoreOwner.is_directly_provisionable());
    }
}
