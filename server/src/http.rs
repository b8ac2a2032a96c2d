use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use types::Result;

pub trait ReqwestExt {
    async fn try_send<T: DeserializeOwned>(self) -> Result<T>;
}

impl ReqwestExt for RequestBuilder {
    async fn try_send<T: DeserializeOwned>(self) -> Result<T> {
        let response = self.send().await?.error_for_status()?;
        let body = response.bytes().await?;

        match serde_json::from_slice(&body) {
            Ok(r) => Ok(r),
            Err(error) => {
                // NOTE: Bodies can hold user data, so only their size is logged.
                tracing::debug!(%error, len = body.len(), "failed to parse response");
                Err(error.into())
            }
        }
    }
}
