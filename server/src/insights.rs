//! Sources of the short recommendations on the insights page.

use std::{future::Future, time::Duration};

use reqwest::Client;
use serde::Deserialize;
use types::{Result, SummaryView};
use url::Url;

use crate::http::ReqwestExt;

pub trait InsightSource {
    /// Zero or more short, human-readable recommendations.
    fn produce_insights(&self, summary: &SummaryView)
    -> impl Future<Output = Result<Vec<String>>> + Send;
}

/// The stock recommendations, independent of the data.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticInsights;

impl StaticInsights {
    pub const INSIGHTS: [&str; 3] = [
        "Consider increasing manager headcount to maintain a comfortable 1:5 ratio with employees based on current growth trajectory.",
        "Login inactivity spikes on weekends. Consider gamifying weekend log-ins to boost engagement.",
        "A large proportion of users were created recently, suggesting successful onboarding but you must monitor 30-day retention.",
    ];
}

impl InsightSource for StaticInsights {
    async fn produce_insights(&self, _summary: &SummaryView) -> Result<Vec<String>> {
        Ok(Self::INSIGHTS.iter().map(|s| s.to_string()).collect())
    }
}

/// Posts the dashboard summary to an external text-generation service and
/// expects `{"insights": ["..."]}` back.
#[derive(Clone)]
pub struct RemoteInsights {
    client: Client,
    url: Url,
}

impl RemoteInsights {
    /// Upper bound on a whole generation request, connect included.
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

    pub fn new(url: Url) -> Result<Self> {
        Self::with_timeout(url, Self::REQUEST_TIMEOUT)
    }

    pub fn with_timeout(url: Url, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()?;

        Ok(Self { client, url })
    }
}

#[derive(Deserialize)]
struct InsightsResponse {
    insights: Vec<String>,
}

impl InsightSource for RemoteInsights {
    async fn produce_insights(&self, summary: &SummaryView) -> Result<Vec<String>> {
        let response: InsightsResponse = self
            .client
            .post(self.url.clone())
            .json(summary)
            .try_send()
            .await?;

        Ok(response
            .insights
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect())
    }
}

/// Whichever source the configuration selects.
#[derive(Clone)]
pub enum ConfiguredInsights {
    Static(StaticInsights),
    Remote(RemoteInsights),
}

impl ConfiguredInsights {
    pub fn from_url(url: Option<&Url>) -> Result<Self> {
        Ok(match url {
            Some(url) => Self::Remote(RemoteInsights::new(url.clone())?),
            None => Self::Static(StaticInsights),
        })
    }
}

impl InsightSource for ConfiguredInsights {
    async fn produce_insights(&self, summary: &SummaryView) -> Result<Vec<String>> {
        match self {
            Self::Static(source) => source.produce_insights(summary).await,
            Self::Remote(source) => source.produce_insights(summary).await,
        }
    }
}
