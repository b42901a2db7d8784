use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use std::time::Duration;

use super::{Download, Transport};
use anyhow::Result;

/// User-Agent sent with every request.
const USER_AGENT: &str = concat!(
    "Ferrum/",
    env!("CARGO_PKG_VERSION"),
    " (https://github.com/whamer100/ferrum)"
);

/// reqwest-backed transport.
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Build a client whose connect and read phases give up after `timeout`.
    ///
    /// The timeout bounds each stall, not the whole transfer, so large
    /// archives on slow links still complete.
    pub fn new(timeout: Duration) -> reqwest::Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(timeout)
            .read_timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn head(&self, url: &str) -> Result<u16> {
        let resp = self.client.head(url).send().await?;
        Ok(resp.status().as_u16())
    }

    async fn get(&self, url: &str) -> Result<Download> {
        let resp = self.client.get(url).send().await?.error_for_status()?;
        let total = resp.content_length();
        let body = resp
            .bytes_stream()
            .map(|chunk| chunk.map_err(anyhow::Error::from))
            .boxed();
        Ok(Download { total, body })
    }
}
