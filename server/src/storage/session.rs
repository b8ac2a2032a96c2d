use jiff::{SignedDuration, Timestamp};
use types::Result;
use uuid::Uuid;

use crate::{identity::Identity, storage::POOL, uuid_v7::UuidV7Ext};

#[derive(sqlx::FromRow)]
struct SessionRow {
    id: Uuid,
    identity: String,
}

#[derive(Debug)]
pub struct Session {
    id: Uuid,
    identity: Identity,
}

impl Session {
    pub fn new(identity: Identity) -> Self {
        let id = Uuid::now_v7();

        Self { id, identity }
    }

    pub async fn create(identity: Identity) -> Result<Self> {
        let session = Self::new(identity);
        session.insert().await?;
        Ok(session)
    }

    pub async fn find(id: Uuid) -> Result<Option<Self>> {
        let id_bytes = id.as_bytes().as_slice();

        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT id, identity
            FROM sessions
            WHERE id = ?
            "#,
        )
        .bind(id_bytes)
        .fetch_optional(&*POOL)
        .await?;

        row.map(|row| -> Result<Self> {
            Ok(Self {
                id: row.id,
                identity: serde_json::from_str(&row.identity)?,
            })
        })
        .transpose()
    }

    /// Find session by signed token (cookie value).
    pub async fn find_token(token: &str) -> Result<Option<Self>> {
        let uuid = Uuid::from_token(token)?;
        Self::find(uuid).await
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Sessions live for `ttl` from the moment their id was minted.
    pub fn is_expired(&self, ttl: SignedDuration) -> Result<bool> {
        let created = self.id.jiff_timestamp()?;
        Ok(Timestamp::now() >= created.checked_add(ttl)?)
    }

    pub fn as_token(&self) -> Result<String> {
        self.id.as_token()
    }

    pub async fn insert(&self) -> Result<()> {
        let id = self.id.as_bytes().as_slice();
        let identity = serde_json::to_string(&self.identity)?;

        sqlx::query(
            r#"
            INSERT INTO sessions (id, identity)
            VALUES (?, ?)
            "#,
        )
        .bind(id)
        .bind(identity)
        .execute(&*POOL)
        .await?;

        Ok(())
    }

    pub async fn delete(&self) -> Result<()> {
        let id = self.id.as_bytes().as_slice();

        sqlx::query(
            r#"
            DELETE FROM sessions
            WHERE id = ?
            "#,
        )
        .bind(id)
        .execute(&*POOL)
        .await?;

        Ok(())
    }

    pub async fn delete_token(token: &str) -> Result<()> {
        if let Some(session) = Self::find_token(token).await? {
            session.delete().await?;
        }
        Ok(())
    }
}
