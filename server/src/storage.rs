use dioxus::fullstack::Lazy;
use secrecy::ExposeSecret;
use sqlx::SqlitePool;
use sqlx::sqlite::SqliteConnectOptions;
use types::Result;

use crate::CONFIG;
pub use session::Session;

mod logins;
pub mod seed;
mod session;
mod users;

static POOL: Lazy<SqlitePool> = Lazy::new(|| async {
    let db_path = CONFIG.data_dir.join("db.sqlite");

    let options = SqliteConnectOptions::new()
        .filename(&db_path)
        .pragma("key", CONFIG.db_secret.expose_secret().to_owned())
        .foreign_keys(true)
        .create_if_missing(true);

    SqlitePool::connect_with(options).await
});

/// The sqlite record store: users, their roles, role grants, login events.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// The store opened from configuration.
    pub fn shared() -> Self {
        Self::new(SqlitePool::clone(&POOL))
    }

    pub async fn migrate(&self) -> Result<()> {
        Ok(sqlx::migrate!("../migrations").run(&self.pool).await?)
    }
}
