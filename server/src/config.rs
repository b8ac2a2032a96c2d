use std::{ops::RangeInclusive, path::PathBuf, sync::LazyLock};

use secrecy::SecretString;
use serde::Deserialize;
use types::{Result, err};
use url::Url;

/// Ten years of monthly buckets is plenty.
const ACTIVITY_MONTHS: RangeInclusive<usize> = 1..=120;

pub static CONFIG: LazyLock<Config> = LazyLock::new(|| {
    Config::load().unwrap_or_else(|error| panic!("failed to load configuration: {error:?}"))
});

#[derive(Clone, Deserialize)]
pub struct Config {
    pub data_dir: PathBuf,
    pub db_secret: SecretString,
    pub signing_secret: SecretString,

    /// Public base URL of this dashboard; the OAuth redirect hangs off it.
    pub app_url: Url,
    pub oidc_authorize_url: Url,
    pub oidc_token_url: Url,
    pub oidc_userinfo_url: Url,
    pub oauth_client_id: String,
    pub oauth_client_secret: SecretString,

    pub cookie_secure: bool,
    pub session_ttl_hours: u32,

    pub report_row_limit: usize,
    pub activity_months: usize,
    /// When unset, the built-in recommendations are served.
    pub insights_url: Option<Url>,

    pub seed_demo_users: bool,
}

impl Config {
    /// `roster.toml` in the working directory if present, then `ROSTER_*`
    /// environment variables on top.
    pub fn load() -> Result<Self> {
        let builder = Self::defaults()?
            .add_source(config::File::with_name("roster").required(false))
            .add_source(config::Environment::with_prefix("ROSTER").try_parsing(true));

        Self::build(builder)
    }

    fn defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>> {
        Ok(config::Config::builder()
            .set_default("data_dir", ".")?
            .set_default("cookie_secure", true)?
            .set_default("session_ttl_hours", 12)?
            .set_default("report_row_limit", 500)?
            .set_default("activity_months", 8)?
            .set_default("seed_demo_users", true)?)
    }

    fn build(builder: config::ConfigBuilder<config::builder::DefaultState>) -> Result<Self> {
        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if !ACTIVITY_MONTHS.contains(&self.activity_months) {
            return Err(err!(
                "activity_months must be between {} and {}, got {}",
                ACTIVITY_MONTHS.start(),
                ACTIVITY_MONTHS.end(),
                self.activity_months
            ));
        }
        if self.report_row_limit == 0 {
            return Err(err!("report_row_limit must be at least 1"));
        }
        Ok(())
    }
}
