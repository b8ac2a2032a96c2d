use jiff::Timestamp;
use types::Result;

use super::Database;

impl Database {
    /// `user_id` is `None` for identities without a user record.
    pub async fn record_login(&self, user_id: Option<i64>, at: Timestamp) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO logins (user_id, logged_in_at)
            VALUES (?, ?)
            "#,
        )
        .bind(user_id)
        .bind(at.as_second())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Login times at or after `since`, to the second.
    pub async fn logins_since(&self, since: Timestamp) -> Result<Vec<Timestamp>> {
        let seconds: Vec<i64> = sqlx::query_scalar(
            r#"
            SELECT logged_in_at
            FROM logins
            WHERE logged_in_at >= ?
            ORDER BY logged_in_at
            "#,
        )
        .bind(since.as_second())
        .fetch_all(&self.pool)
        .await?;

        seconds
            .into_iter()
            .map(|s| -> Result<Timestamp> { Ok(Timestamp::from_second(s)?) })
            .collect()
    }
}
