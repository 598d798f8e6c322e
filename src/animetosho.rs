use reqwest::Client;

use crate::error::Error;
use crate::releases::{Feed, Release};

pub const FEED_BASE: &str = "https://feed.animetosho.org";

#[derive(Debug, Clone)]
pub struct AnimeTosho {
    feed_base: String,
    client: Client,
}

impl AnimeTosho {
    pub fn with_feed_base(client: Client, feed_base: impl Into<String>) -> Self {
        Self {
            feed_base: feed_base.into(),
            client,
        }
    }
}

impl Feed for AnimeTosho {
    async fn search(&self, query: &str) -> Result<Vec<Release>, Error> {
        let response = self
            .client
            .get(format!("{}/json", self.feed_base))
            .query(&[("q", query)])
            .send()
            .await
            .map_err(Error::Network)?;

        let body = response.bytes().await.map_err(Error::Network)?;
        let releases: Vec<Release> = serde_json::from_slice(&body).map_err(Error::Parse)?;
        tracing::debug!(query = %query, count = releases.len(), "feed search");
        Ok(releases)
    }
}
