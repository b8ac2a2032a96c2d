use jiff::{Timestamp, civil::Date, tz::TimeZone};
use serde::{Deserialize, Serialize};

use crate::{Role, ValidationError};

/// A user as held by the record store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: i64,
    pub name: String,
    pub email: String,
    /// Ordered; the first entry is the primary role.
    pub roles: Vec<Role>,
    pub created_at: Timestamp,
}

impl UserRecord {
    pub fn primary_role(&self) -> Option<Role> {
        self.roles.first().copied()
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// Calendar date of creation, in UTC.
    pub fn created_on(&self) -> Date {
        self.created_at.to_zoned(TimeZone::UTC).date()
    }
}

/// The add/edit form of the users table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserForm {
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl UserForm {
    /// Trim and lower-case, then check. Returns the form as it should be stored.
    pub fn validated(self) -> Result<Self, ValidationError> {
        let name = self.name.trim().to_string();
        let email = self.email.trim().to_lowercase();

        if name.is_empty() {
            return Err(ValidationError::Required("name"));
        }
        if email.is_empty() {
            return Err(ValidationError::Required("email"));
        }
        if !looks_like_email(&email) {
            return Err(ValidationError::InvalidEmail(email));
        }

        Ok(Self {
            name,
            email,
            role: self.role,
        })
    }
}

fn looks_like_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    !local.is_empty()
        && !domain.contains('@')
        && !email.chars().any(char::is_whitespace)
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
}

/// Search box and role dropdown over the users table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserQuery {
    pub search: String,
    pub role: Option<Role>,
}

impl UserQuery {
    pub fn matches(&self, user: &UserRecord) -> bool {
        let needle = self.search.trim().to_lowercase();
        let search_ok = needle.is_empty()
            || user.name.to_lowercase().contains(&needle)
            || user.email.to_lowercase().contains(&needle);

        let role_ok = self.role.is_none_or(|role| user.primary_role() == Some(role));

        search_ok && role_ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(name: &str, email: &str, roles: &[Role]) -> UserRecord {
        UserRecord {
            id: 1,
            name: name.into(),
            email: email.into(),
            roles: roles.to_vec(),
            created_at: "2024-02-10T12:00:00Z".parse().unwrap(),
        }
    }

    #[test]
    fn form_is_normalized() {
        let form = UserForm {
            name: "  Ada Lovelace ".into(),
            email: " Ada@Example.COM ".into(),
            role: Role::Manager,
        }
        .validated()
        .unwrap();

        assert_eq!(form.name, "Ada Lovelace");
        assert_eq!(form.email, "ada@example.com");
        assert_eq!(form.role, Role::Manager);
    }

    #[test]
    fn form_rejects_blank_name() {
        let form = UserForm {
            name: "   ".into(),
            email: "a@b.co".into(),
            role: Role::Employee,
        };
        assert_eq!(form.validated(), Err(ValidationError::Required("name")));
    }

    #[test]
    fn form_rejects_malformed_emails() {
        for email in ["ada", "ada@", "@example.com", "ada@example", "a@b@c.com", "a b@c.com"] {
            let form = UserForm {
                name: "Ada".into(),
                email: email.into(),
                role: Role::Employee,
            };
            assert!(
                matches!(form.validated(), Err(ValidationError::InvalidEmail(_))),
                "{email} should be rejected"
            );
        }
    }

    #[test]
    fn query_searches_name_and_email() {
        let ada = user("Ada Lovelace", "ada@example.com", &[Role::Admin]);
        let by_name = UserQuery {
            search: "LOVE".into(),
            role: None,
        };
        let by_email = UserQuery {
            search: "example.com".into(),
            role: None,
        };
        let miss = UserQuery {
            search: "grace".into(),
            role: None,
        };
        assert!(by_name.matches(&ada));
        assert!(by_email.matches(&ada));
        assert!(!miss.matches(&ada));
    }

    #[test]
    fn query_role_uses_primary_role() {
        let ada = user("Ada", "ada@example.com", &[Role::Admin, Role::Manager]);
        let admins = UserQuery {
            search: String::new(),
            role: Some(Role::Admin),
        };
        let managers = UserQuery {
            search: String::new(),
            role: Some(Role::Manager),
        };
        assert!(admins.matches(&ada));
        assert!(!managers.matches(&ada));
    }

    #[test]
    fn created_on_is_utc() {
        let mut late = user("Ada", "ada@example.com", &[]);
        late.created_at = "2024-02-29T23:30:00-05:00".parse().unwrap();
        assert_eq!(late.created_on(), jiff::civil::date(2024, 3, 1));
    }
}
