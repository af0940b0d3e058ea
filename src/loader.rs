use std::path::PathBuf;
use std::time::Duration;

use reqwest::Client;
use thiserror::Error;
use tracing::debug;

use crate::model::FeedDocument;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The feed document could not be obtained. Network failures, non-success
/// responses and malformed bodies all end up here.
#[derive(Debug, Error)]
#[error("feed unavailable from {location}: {source}")]
pub struct FeedUnavailable {
    pub location: String,
    #[source]
    source: BoxError,
}

impl FeedUnavailable {
    fn new(location: &FeedLocation, source: impl Into<BoxError>) -> Self {
        Self {
            location: location.to_string(),
            source: source.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedLocation {
    Url(String),
    Path(PathBuf),
}

impl FeedLocation {
    pub fn parse(location: &str) -> Self {
        if location.starts_with("http://") || location.starts_with("https://") {
            FeedLocation::Url(location.to_string())
        } else {
            FeedLocation::Path(PathBuf::from(location))
        }
    }
}

impl std::fmt::Display for FeedLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeedLocation::Url(url) => f.write_str(url),
            FeedLocation::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

pub struct FeedLoader {
    client: Client,
    location: FeedLocation,
}

impl FeedLoader {
    pub fn new(location: FeedLocation, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("NewsDigest/1.0")
            .build()?;

        Ok(Self { client, location })
    }

    pub fn location(&self) -> &FeedLocation {
        &self.location
    }

    pub async fn load(&self) -> Result<FeedDocument, FeedUnavailable> {
        let bytes = match &self.location {
            FeedLocation::Url(url) => self
                .fetch(url)
                .await
                .map_err(|e| FeedUnavailable::new(&self.location, e))?,
            FeedLocation::Path(path) => tokio::fs::read(path)
                .await
                .map_err(|e| FeedUnavailable::new(&self.location, e))?,
        };
        debug!("Read {} bytes from {}", bytes.len(), self.location);

        serde_json::from_slice(&bytes).map_err(|e| FeedUnavailable::new(&self.location, e))
    }

    async fn fetch(&self, url: &str) -> reqwest::Result<Vec<u8>> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }
}
