use jiff::Timestamp;
use types::{Result, Role, UserForm};

use super::Database;

const DEMO_USERS: [(&str, &str, Role); 4] = [
    ("Super Admin User", "superadmin@example.com", Role::SuperAdmin),
    ("Admin User", "admin@example.com", Role::Admin),
    ("Manager User", "manager@example.com", Role::Manager),
    ("Employee User", "employee@example.com", Role::Employee),
];

/// One user per role, only into an empty store.
pub async fn demo_users(db: &Database) -> Result<()> {
    if db.count_users().await? > 0 {
        return Ok(());
    }

    let now = Timestamp::now();
    for (name, email, role) in DEMO_USERS {
        let form = UserForm {
            name: name.into(),
            email: email.into(),
            role,
        }
        .validated()?;

        db.create_user(&form, now).await?;
    }

    tracing::info!(count = DEMO_USERS.len(), "seeded demo users");
    Ok(())
}
