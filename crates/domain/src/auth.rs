//! Caller identity and the role checks the order service applies.

use common::{MerchantId, UserId};
use serde::{Deserialize, Serialize};

use crate::order::Money;

/// Authority level of a caller, from least to most privileged.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    #[default]
    NoAuthority,
    Moderator,
    Admin,
    SuperAdmin,
    OpAdmin,
}

impl Role {
    /// Returns the wire name of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::NoAuthority => "NO_AUTHORITY",
            Role::Moderator => "MODERATOR",
            Role::Admin => "ADMIN",
            Role::SuperAdmin => "SUPER_ADMIN",
            Role::OpAdmin => "OP_ADMIN",
        }
    }

    /// Parses a role name. Unknown names carry no authority.
    pub fn from_name(name: &str) -> Self {
        match name {
            "MODERATOR" => Role::Moderator,
            "ADMIN" => Role::Admin,
            "SUPER_ADMIN" => Role::SuperAdmin,
            "OP_ADMIN" => Role::OpAdmin,
            _ => Role::NoAuthority,
        }
    }

    pub fn is_moderator(&self) -> bool {
        *self >= Role::Moderator
    }

    pub fn is_admin(&self) -> bool {
        *self >= Role::Admin
    }

    pub fn is_super_admin(&self) -> bool {
        *self >= Role::SuperAdmin
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Role::from_name(s))
    }
}

/// Craftsman attributes of a user working for a merchant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CraftsmanProfile {
    pub merchant_id: MerchantId,
    pub hourly_rate: Money,
}

/// Verified identity of the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: UserId,
    pub role: Role,
    #[serde(default)]
    pub craftsman: Option<CraftsmanProfile>,
}

impl Claims {
    /// Creates claims without a craftsman profile.
    pub fn new(user_id: UserId, role: Role) -> Self {
        Self {
            user_id,
            role,
            craftsman: None,
        }
    }

    /// Attaches a craftsman profile for the given merchant.
    pub fn with_craftsman(mut self, merchant_id: MerchantId, hourly_rate: Money) -> Self {
        self.craftsman = Some(CraftsmanProfile {
            merchant_id,
            hourly_rate,
        });
        self
    }

    pub fn is_craftsman(&self) -> bool {
        self.craftsman.is_some()
    }

    /// Returns the merchant the caller crafts for, if any.
    pub fn merchant_id(&self) -> Option<MerchantId> {
        self.craftsman.as_ref().map(|c| c.merchant_id)
    }
}

/// Returns true if the caller may read orders.
pub fn can_read(claims: Option<&Claims>) -> bool {
    claims.is_some_and(|c| c.role.is_moderator())
}

/// Returns true if the caller may create or modify orders.
pub fn can_write(claims: Option<&Claims>) -> bool {
    claims.is_some_and(|c| c.role.is_admin() && c.is_craftsman())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(role: Role, craftsman: bool) -> Claims {
        let claims = Claims::new(UserId::new(), role);
        if craftsman {
            claims.with_craftsman(MerchantId::new(), Money::from_units(25))
        } else {
            claims
        }
    }

    #[test]
    fn test_role_ordering() {
        assert!(Role::NoAuthority < Role::Moderator);
        assert!(Role::Moderator < Role::Admin);
        assert!(Role::Admin < Role::SuperAdmin);
        assert!(Role::SuperAdmin < Role::OpAdmin);
    }

    #[test]
    fn test_rank_predicates() {
        assert!(!Role::NoAuthority.is_moderator());
        assert!(Role::Moderator.is_moderator());
        assert!(!Role::Moderator.is_admin());
        assert!(Role::OpAdmin.is_admin());
        assert!(Role::OpAdmin.is_super_admin());
        assert!(!Role::Admin.is_super_admin());
    }

    #[test]
    fn test_role_names() {
        for role in [
            Role::NoAuthority,
            Role::Moderator,
            Role::Admin,
            Role::SuperAdmin,
            Role::OpAdmin,
        ] {
            assert_eq!(Role::from_name(role.as_str()), role);
        }
        assert_eq!("ROOT".parse::<Role>().unwrap(), Role::NoAuthority);
        assert_eq!(
            serde_json::to_string(&Role::SuperAdmin).unwrap(),
            "\"SUPER_ADMIN\""
        );
    }

    #[test]
    fn test_write_requires_admin_craftsman() {
        assert!(!can_write(None));
        assert!(!can_write(Some(&claims(Role::Moderator, true))));
        assert!(!can_write(Some(&claims(Role::Admin, false))));
        assert!(can_write(Some(&claims(Role::Admin, true))));
        assert!(can_write(Some(&claims(Role::OpAdmin, true))));
    }

    #[test]
    fn test_read_requires_moderator() {
        assert!(!can_read(None));
        assert!(!can_read(Some(&claims(Role::NoAuthority, true))));
        assert!(can_read(Some(&claims(Role::Moderator, false))));
        assert!(can_read(Some(&claims(Role::SuperAdmin, false))));
    }

    #[test]
    fn test_merchant_from_profile() {
        let merchant = MerchantId::new();
        let claims = Claims::new(UserId::new(), Role::Admin)
            .with_craftsman(merchant, Money::from_units(40));
        assert_eq!(claims.merchant_id(), Some(merchant));
        assert!(claims.is_craftsman());
    }
}
