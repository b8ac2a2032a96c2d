use serde::{Deserialize, Serialize};
use types::{Result, Viewer};

use crate::storage::Database;

/// Who the identity provider says signed in. Kept in the session row; roles
/// and permissions are looked up fresh on every request. `email` is only set
/// when the provider has verified it, since it links to the user record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub subject: String,
    pub username: String,
    pub display_name: String,
    pub email: Option<String>,
}

impl Identity {
    /// Resolve against the record store. An identity with no matching user
    /// record becomes a viewer without roles, which the gates keep out of
    /// everything restricted.
    pub async fn resolve(&self, db: &Database) -> Result<Viewer> {
        let record = match &self.email {
            Some(email) => db.find_user_by_email(email).await?,
            None => None,
        };

        let (id, roles) = match record {
            Some(record) => (record.id.to_string(), record.roles),
            None => {
                tracing::debug!(subject = %self.subject, "no user record for identity");
                (self.subject.clone(), Vec::new())
            }
        };

        let permissions = db.permissions_for(&roles).await?;

        Ok(Viewer {
            id,
            name: self.display_name.clone(),
            email: self.email.clone(),
            roles: roles.iter().map(|r| r.name().to_string()).collect(),
            permissions,
        })
    }
}
