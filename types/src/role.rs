use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Coarse capability bucket. A user may hold several; the first one held is
/// their primary role.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Role {
    #[serde(rename = "Super Admin")]
    SuperAdmin,
    Admin,
    Manager,
    #[default]
    Employee,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::SuperAdmin, Role::Admin, Role::Manager, Role::Employee];

    /// Stored and compared name.
    pub fn name(self) -> &'static str {
        match self {
            Role::SuperAdmin => "Super Admin",
            Role::Admin => "Admin",
            Role::Manager => "Manager",
            Role::Employee => "Employee",
        }
    }

    /// Human-facing label, used in tables and exports.
    pub fn label(self) -> &'static str {
        match self {
            Role::Admin => "Administrator",
            other => other.name(),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.name() == s)
            .ok_or_else(|| ValidationError::UnknownRole(s.to_string()))
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.name().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_parse_back() {
        for role in Role::ALL {
            assert_eq!(role.name().parse::<Role>(), Ok(role));
        }
    }

    #[test]
    fn unknown_names_are_rejected() {
        assert_eq!(
            "super admin".parse::<Role>(),
            Err(ValidationError::UnknownRole("super admin".into()))
        );
    }

    #[test]
    fn serde_uses_display_names() {
        let json = serde_json::to_string(&Role::SuperAdmin).unwrap();
        assert_eq!(json, r#""Super Admin""#);
        assert_eq!(
            serde_json::from_str::<Role>(r#""Manager""#).unwrap(),
            Role::Manager
        );
    }

    #[test]
    fn admin_has_a_longer_label() {
        assert_eq!(Role::Admin.label(), "Administrator");
        assert_eq!(Role::Employee.label(), "Employee");
    }
}
