mod http;
mod local;

pub use http::HttpTransport;
pub use local::LocalFileReader;

use anyhow::{Result, bail};
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::BoxStream;

/// Trait for random access reading from a data source
#[async_trait]
pub trait ReadAt: Send + Sync {
    /// Read data at the specified offset into the buffer
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize>;

    /// Get the total size of the data source
    fn size(&self) -> u64;

    /// Fill the whole buffer starting at `offset`, failing on a short read.
    async fn read_exact_at(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        let mut filled = 0;
        while filled < buf.len() {
            let n = self.read_at(offset + filled as u64, &mut buf[filled..]).await?;
            if n == 0 {
                bail!(
                    "Unexpected end of data at offset {} ({} of {} bytes read)",
                    offset + filled as u64,
                    filled,
                    buf.len()
                );
            }
            filled += n;
        }
        Ok(())
    }
}

/// A response body being streamed from a remote source.
pub struct Download {
    /// Total size announced by the server, if any.
    pub total: Option<u64>,
    pub body: BoxStream<'static, Result<Bytes>>,
}

/// Blocking-in-spirit HTTP boundary used by the fetch processor.
///
/// One request is in flight at a time; implementations only need to answer
/// a status pre-check and stream a body.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue a HEAD request and return the status code.
    async fn head(&self, url: &str) -> Result<u16>;

    /// Issue a GET request and return the body as a stream of chunks.
    async fn get(&self, url: &str) -> Result<Download>;
}
