use std::collections::{BTreeSet, HashMap};

use jiff::Timestamp;
use jiff_sqlx::{Timestamp as SqlxTimestamp, ToSqlx};
use types::{Result, Role, UserForm, UserRecord, ValidationError, err};

use super::Database;

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    name: String,
    email: String,
    created_at: SqlxTimestamp,
}

#[derive(sqlx::FromRow)]
struct RoleRow {
    user_id: i64,
    role: String,
}

impl UserRow {
    fn into_record(self, roles: Vec<Role>) -> UserRecord {
        UserRecord {
            id: self.id,
            name: self.name,
            email: self.email,
            roles,
            created_at: self.created_at.to_jiff(),
        }
    }
}

/// Roles we don't know are skipped rather than failing the whole read.
fn parse_role(user_id: i64, name: &str) -> Option<Role> {
    match name.parse() {
        Ok(role) => Some(role),
        Err(error) => {
            tracing::warn!(user_id, %error, "ignoring stored role");
            None
        }
    }
}

fn unique_email(error: sqlx::Error, email: &str) -> types::Error {
    let taken = error
        .as_database_error()
        .is_some_and(|db| db.is_unique_violation());

    if taken {
        ValidationError::EmailTaken(email.to_string()).into()
    } else {
        error.into()
    }
}

impl Database {
    /// Every user with roles, newest first.
    pub async fn list_users(&self) -> Result<Vec<UserRecord>> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, email, created_at
            FROM users
            ORDER BY id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let role_rows = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT user_id, role
            FROM user_roles
            ORDER BY user_id, position, role
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut roles: HashMap<i64, Vec<Role>> = HashMap::new();
        for row in role_rows {
            if let Some(role) = parse_role(row.user_id, &row.role) {
                roles.entry(row.user_id).or_default().push(role);
            }
        }

        let mut users: Vec<UserRecord> = rows
            .into_iter()
            .map(|row| {
                let user_roles = roles.remove(&row.id).unwrap_or_default();
                row.into_record(user_roles)
            })
            .collect();

        users.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(users)
    }

    pub async fn find_user(&self, id: i64) -> Result<Option<UserRecord>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, email, created_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let roles = self.roles_of(row.id).await?;
                Ok(Some(row.into_record(roles)))
            }
            None => Ok(None),
        }
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, email, created_at
            FROM users
            WHERE email = ?
            "#,
        )
        .bind(email.trim().to_lowercase())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let roles = self.roles_of(row.id).await?;
                Ok(Some(row.into_record(roles)))
            }
            None => Ok(None),
        }
    }

    async fn roles_of(&self, user_id: i64) -> Result<Vec<Role>> {
        let rows = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT user_id, role
            FROM user_roles
            WHERE user_id = ?
            ORDER BY position, role
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .filter_map(|row| parse_role(row.user_id, &row.role))
            .collect())
    }

    /// Union of the grants of every role given.
    pub async fn permissions_for(&self, roles: &[Role]) -> Result<BTreeSet<String>> {
        let mut permissions = BTreeSet::new();

        for role in roles {
            let granted: Vec<String> = sqlx::query_scalar(
                r#"
                SELECT permission
                FROM role_permissions
                WHERE role = ?
                "#,
            )
            .bind(role.name())
            .fetch_all(&self.pool)
            .await?;

            permissions.extend(granted);
        }

        Ok(permissions)
    }

    pub async fn count_users(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }

    /// `form` must already be validated.
    pub async fn create_user(&self, form: &UserForm, created_at: Timestamp) -> Result<UserRecord> {
        let mut tx = self.pool.begin().await?;

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO users (name, email, created_at)
            VALUES (?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(&form.name)
        .bind(&form.email)
        .bind(created_at.to_sqlx())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| unique_email(e, &form.email))?;

        sqlx::query(
            r#"
            INSERT INTO user_roles (user_id, role, position)
            VALUES (?, ?, 0)
            "#,
        )
        .bind(id)
        .bind(form.role.name())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(UserRecord {
            id,
            name: form.name.clone(),
            email: form.email.clone(),
            roles: vec![form.role],
            created_at,
        })
    }

    /// Replaces name, email and the role assignments. `form` must already be
    /// validated.
    pub async fn update_user(&self, id: i64, form: &UserForm) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE users
            SET name = ?, email = ?
            WHERE id = ?
            "#,
        )
        .bind(&form.name)
        .bind(&form.email)
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| unique_email(e, &form.email))?;

        if result.rows_affected() == 0 {
            return Err(err!("user {} not found", id));
        }

        sqlx::query("DELETE FROM user_roles WHERE user_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO user_roles (user_id, role, position)
            VALUES (?, ?, 0)
            "#,
        )
        .bind(id)
        .bind(form.role.name())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn delete_user(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(err!("user {} not found", id));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::testing::memory_db;

    fn form(name: &str, email: &str, role: Role) -> UserForm {
        UserForm {
            name: name.into(),
            email: email.into(),
            role,
        }
    }

    fn at(ts: &str) -> Timestamp {
        ts.parse().unwrap()
    }

    async fn role_rows(db: &Database, user_id: i64) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM user_roles WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&db.pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn duplicate_email_is_a_validation_error() {
        let db = memory_db().await;
        let now = at("2024-01-01T00:00:00Z");
        db.create_user(&form("Ada", "ada@example.com", Role::Admin), now)
            .await
            .unwrap();

        let error = db
            .create_user(&form("Other Ada", "ada@example.com", Role::Employee), now)
            .await
            .unwrap_err();
        assert!(matches!(
            error.validation(),
            Some(ValidationError::EmailTaken(email)) if email == "ada@example.com"
        ));
        assert_eq!(db.count_users().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn update_to_a_taken_email_is_rejected() {
        let db = memory_db().await;
        let now = at("2024-01-01T00:00:00Z");
        db.create_user(&form("Ada", "ada@example.com", Role::Admin), now)
            .await
            .unwrap();
        let bob = db
            .create_user(&form("Bob", "bob@example.com", Role::Employee), now)
            .await
            .unwrap();

        let error = db
            .update_user(bob.id, &form("Bob", "ada@example.com", Role::Employee))
            .await
            .unwrap_err();
        assert!(matches!(error.validation(), Some(ValidationError::EmailTaken(_))));
    }

    #[tokio::test]
    async fn roles_are_ordered_by_position() {
        let db = memory_db().await;
        let user = db
            .create_user(
                &form("Mia", "mia@example.com", Role::Manager),
                at("2024-01-01T00:00:00Z"),
            )
            .await
            .unwrap();

        sqlx::query("INSERT INTO user_roles (user_id, role, position) VALUES (?, 'Admin', 1)")
            .bind(user.id)
            .execute(&db.pool)
            .await
            .unwrap();

        let found = db.find_user(user.id).await.unwrap().unwrap();
        assert_eq!(found.roles, [Role::Manager, Role::Admin]);
        assert_eq!(found.primary_role(), Some(Role::Manager));

        let listed = db.list_users().await.unwrap();
        assert_eq!(listed[0].roles, [Role::Manager, Role::Admin]);
    }

    #[tokio::test]
    async fn update_replaces_the_role_set() {
        let db = memory_db().await;
        let user = db
            .create_user(
                &form("Eve", "eve@example.com", Role::Employee),
                at("2024-01-01T00:00:00Z"),
            )
            .await
            .unwrap();
        sqlx::query("INSERT INTO user_roles (user_id, role, position) VALUES (?, 'Admin', 1)")
            .bind(user.id)
            .execute(&db.pool)
            .await
            .unwrap();

        db.update_user(user.id, &form("Eve Ng", "eve.ng@example.com", Role::Manager))
            .await
            .unwrap();

        let found = db.find_user(user.id).await.unwrap().unwrap();
        assert_eq!(found.name, "Eve Ng");
        assert_eq!(found.email, "eve.ng@example.com");
        assert_eq!(found.roles, [Role::Manager]);
        assert_eq!(role_rows(&db, user.id).await, 1);
    }

    #[tokio::test]
    async fn updating_a_missing_user_fails() {
        let db = memory_db().await;
        let result = db
            .update_user(42, &form("Nobody", "nobody@example.com", Role::Employee))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn delete_cascades_to_roles() {
        let db = memory_db().await;
        let user = db
            .create_user(
                &form("Tom", "tom@example.com", Role::Admin),
                at("2024-01-01T00:00:00Z"),
            )
            .await
            .unwrap();
        assert_eq!(role_rows(&db, user.id).await, 1);

        db.delete_user(user.id).await.unwrap();

        assert_eq!(role_rows(&db, user.id).await, 0);
        assert!(db.find_user(user.id).await.unwrap().is_none());
        assert!(db.delete_user(user.id).await.is_err());
    }

    #[tokio::test]
    async fn lookup_by_email_ignores_case_and_padding() {
        let db = memory_db().await;
        let user = db
            .create_user(
                &form("Ada", "ada@example.com", Role::Admin),
                at("2024-01-01T00:00:00Z"),
            )
            .await
            .unwrap();

        let found = db.find_user_by_email(" ADA@example.com ").await.unwrap();
        assert_eq!(found.map(|u| u.id), Some(user.id));
        assert!(db.find_user_by_email("bob@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn users_are_listed_newest_first() {
        let db = memory_db().await;
        let older = db
            .create_user(
                &form("Old", "old@example.com", Role::Employee),
                at("2023-06-01T00:00:00Z"),
            )
            .await
            .unwrap();
        let newer = db
            .create_user(
                &form("New", "new@example.com", Role::Employee),
                at("2024-06-01T00:00:00Z"),
            )
            .await
            .unwrap();

        let ids: Vec<i64> = db.list_users().await.unwrap().iter().map(|u| u.id).collect();
        assert_eq!(ids, [newer.id, older.id]);
    }

    #[tokio::test]
    async fn permissions_are_the_union_of_role_grants() {
        let db = memory_db().await;

        assert!(db.permissions_for(&[Role::Employee]).await.unwrap().is_empty());
        assert_eq!(db.permissions_for(&[Role::Manager]).await.unwrap().len(), 3);

        let admin = db.permissions_for(&[Role::Admin]).await.unwrap();
        let both = db
            .permissions_for(&[Role::Manager, Role::Admin])
            .await
            .unwrap();
        assert_eq!(admin.len(), 7);
        assert_eq!(both, admin);
    }
}
