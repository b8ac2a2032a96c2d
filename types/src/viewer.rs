use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// The authenticated actor behind a request, as shipped to the client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewer {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    /// Ordered; the first entry is the primary role.
    pub roles: Vec<String>,
    pub permissions: BTreeSet<String>,
}

impl Viewer {
    /// Stand-in for a request with no role data. Holds nothing, so every
    /// restricted region stays hidden.
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn primary_role(&self) -> Option<&str> {
        self.roles.first().map(String::as_str)
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }

    pub fn initial(&self) -> String {
        self.name
            .chars()
            .next()
            .unwrap_or('?')
            .to_uppercase()
            .to_string()
    }
}
