use base64::{Engine, prelude::BASE64_URL_SAFE_NO_PAD};
use hmac::{Hmac, Mac};
use jiff::Timestamp;
use secrecy::ExposeSecret;
use sha2::Sha256;
use types::{Result, err};
use uuid::Uuid;

use crate::CONFIG;

type HmacSha256 = Hmac<Sha256>;

/// Signed, URL-safe tokens for v7 UUIDs, and the creation time they carry.
pub trait UuidV7Ext: Sized {
    fn from_token(token: &str) -> Result<Self>;
    fn as_token(&self) -> Result<String>;

    fn jiff_timestamp(&self) -> Result<Timestamp>;
}

impl UuidV7Ext for Uuid {
    fn from_token(token: &str) -> Result<Self> {
        verify(token, CONFIG.signing_secret.expose_secret().as_bytes())
    }

    fn as_token(&self) -> Result<String> {
        sign(self, CONFIG.signing_secret.expose_secret().as_bytes())
    }

    fn jiff_timestamp(&self) -> Result<Timestamp> {
        let ts = self
            .get_timestamp()
            .ok_or_else(|| err!("uuid {} carries no timestamp", self))?;

        let (seconds, nanos) = ts.to_unix();
        Ok(Timestamp::new(seconds as i64, nanos as i32)?)
    }
}

fn sign(id: &Uuid, key: &[u8]) -> Result<String> {
    let id_str = id.simple().to_string();
    let mut mac = HmacSha256::new_from_slice(key).map_err(|_| err!("invalid signing key"))?;
    mac.update(id_str.as_bytes());
    let signature = BASE64_URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
    Ok(format!("{}.{}", id_str, signature))
}

fn verify(token: &str, key: &[u8]) -> Result<Uuid> {
    let Some((uuid_simple, signature_b64)) = token.split_once('.') else {
        return Err(err!("invalid token format"));
    };

    let mut mac = HmacSha256::new_from_slice(key).map_err(|_| err!("invalid signing key"))?;
    mac.update(uuid_simple.as_bytes());
    let signature = BASE64_URL_SAFE_NO_PAD.decode(signature_b64)?;
    mac.verify_slice(&signature)
        .map_err(|_| err!("token signature mismatch"))?;

    Ok(Uuid::parse_str(uuid_simple)?)
}
