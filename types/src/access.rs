//! Role and permission gating.
//!
//! An [`AccessRequirement`] has two optional dimensions. Within a dimension
//! any listed value is enough; across dimensions both must hold. A dimension
//! that is absent (or empty) is not checked, so an empty requirement lets
//! everyone through. Callers that want a restriction have to spell it out.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::Viewer;

/// Permission names granted through roles.
pub mod permissions {
    pub const USERS_VIEW: &str = "users.view";
    pub const USERS_CREATE: &str = "users.create";
    pub const USERS_EDIT: &str = "users.edit";
    pub const USERS_DELETE: &str = "users.delete";
    pub const REPORTS_VIEW: &str = "reports.view";
    pub const REPORTS_EXPORT: &str = "reports.export";
    pub const INSIGHTS_VIEW: &str = "insights.view";
}

/// A set of accepted values. Satisfied by holding any one of them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnyOf(BTreeSet<String>);

impl AnyOf {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    fn is_met_by<'a>(&self, held: impl IntoIterator<Item = &'a str>) -> bool {
        held.into_iter().any(|value| self.0.contains(value))
    }
}

impl<S: Into<String>> FromIterator<S> for AnyOf {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessRequirement {
    pub role: Option<AnyOf>,
    pub permission: Option<AnyOf>,
}

impl AccessRequirement {
    /// No restriction.
    pub fn open() -> Self {
        Self::default()
    }

    pub fn role(role: impl Into<String>) -> Self {
        Self::any_role([role])
    }

    pub fn any_role<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            role: Some(roles.into_iter().collect()),
            permission: None,
        }
    }

    pub fn permission(permission: impl Into<String>) -> Self {
        Self::any_permission([permission])
    }

    pub fn any_permission<I, S>(permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            role: None,
            permission: Some(permissions.into_iter().collect()),
        }
    }

    pub fn and_permission(self, permission: impl Into<String>) -> Self {
        self.and_any_permission([permission])
    }

    pub fn and_any_permission<I, S>(self, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            permission: Some(permissions.into_iter().collect()),
            ..self
        }
    }

    pub fn is_open(&self) -> bool {
        self.role.as_ref().is_none_or(AnyOf::is_empty)
            && self.permission.as_ref().is_none_or(AnyOf::is_empty)
    }

    /// Pure and cheap; fine to call on every render.
    pub fn evaluate(&self, viewer: &Viewer) -> bool {
        let role_ok = match &self.role {
            Some(roles) if !roles.is_empty() => {
                roles.is_met_by(viewer.roles.iter().map(String::as_str))
            }
            _ => true,
        };

        let permission_ok = match &self.permission {
            Some(permissions) if !permissions.is_empty() => {
                permissions.is_met_by(viewer.permissions.iter().map(String::as_str))
            }
            _ => true,
        };

        role_ok && permission_ok
    }
}

/// Evaluate against a possibly missing viewer. Without one, nothing but an
/// open requirement passes.
pub fn evaluate(viewer: Option<&Viewer>, requirement: &AccessRequirement) -> bool {
    match viewer {
        Some(viewer) => requirement.evaluate(viewer),
        None => requirement.evaluate(&Viewer::anonymous()),
    }
}

/// The gates the dashboard is built around. Shared by the client, which
/// hides what fails, and the server, which refuses it.
pub mod gates {
    use super::{AccessRequirement, permissions::*};
    use crate::Role;

    pub fn view_users() -> AccessRequirement {
        AccessRequirement::permission(USERS_VIEW)
    }

    pub fn create_users() -> AccessRequirement {
        AccessRequirement::permission(USERS_CREATE)
    }

    pub fn edit_users() -> AccessRequirement {
        AccessRequirement::permission(USERS_EDIT)
    }

    pub fn delete_users() -> AccessRequirement {
        AccessRequirement::permission(USERS_DELETE)
    }

    /// Needed on top of the user gates to grant, edit, or remove a Super Admin.
    pub fn manage_super_admins() -> AccessRequirement {
        AccessRequirement::role(Role::SuperAdmin)
    }

    pub fn view_reports() -> AccessRequirement {
        AccessRequirement::any_role([Role::SuperAdmin, Role::Admin, Role::Manager])
            .and_permission(REPORTS_VIEW)
    }

    pub fn export_reports() -> AccessRequirement {
        AccessRequirement::permission(REPORTS_EXPORT)
    }

    pub fn view_insights() -> AccessRequirement {
        AccessRequirement::any_role([Role::SuperAdmin, Role::Admin]).and_permission(INSIGHTS_VIEW)
    }
}
