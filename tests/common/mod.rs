use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::StreamExt;
use zip::write::SimpleFileOptions;

use ferrum::io::{Download, Transport};

/// How a served body is streamed back.
#[derive(Clone, Copy)]
enum Delivery {
    /// All chunks, with the length announced.
    Sized,
    /// All chunks, no announced length.
    Unsized,
    /// The chunks, then a connection error.
    Broken,
}

/// In-memory transport that records every request it receives.
#[derive(Default)]
pub struct MockTransport {
    files: HashMap<String, (Vec<u8>, Delivery)>,
    requests: Mutex<Vec<String>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn serve(mut self, url: &str, body: Vec<u8>) -> Self {
        self.files.insert(url.to_string(), (body, Delivery::Sized));
        self
    }

    /// Serve `body` without a content length.
    pub fn serve_unsized(mut self, url: &str, body: Vec<u8>) -> Self {
        self.files.insert(url.to_string(), (body, Delivery::Unsized));
        self
    }

    /// Send `prefix`, then drop the connection mid-stream.
    pub fn serve_broken(mut self, url: &str, prefix: Vec<u8>) -> Self {
        self.files.insert(url.to_string(), (prefix, Delivery::Broken));
        self
    }

    /// Requests made so far, as `"HEAD <url>"` / `"GET <url>"`.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn head(&self, url: &str) -> Result<u16> {
        self.requests.lock().unwrap().push(format!("HEAD {url}"));
        Ok(if self.files.contains_key(url) { 200 } else { 404 })
    }

    async fn get(&self, url: &str) -> Result<Download> {
        self.requests.lock().unwrap().push(format!("GET {url}"));
        let Some((body, delivery)) = self.files.get(url) else {
            anyhow::bail!("404 Not Found for {url}");
        };
        let mut chunks: Vec<Result<Bytes>> = body
            .chunks(1024)
            .map(|c| Ok(Bytes::copy_from_slice(c)))
            .collect();
        let total = match delivery {
            Delivery::Sized => Some(body.len() as u64),
            Delivery::Unsized => None,
            Delivery::Broken => {
                chunks.push(Err(anyhow::anyhow!("connection reset")));
                Some(body.len() as u64 * 4)
            }
        };
        Ok(Download {
            total,
            body: futures_util::stream::iter(chunks).boxed(),
        })
    }
}

/// Build an in-memory zip archive.
pub fn zip_bytes(members: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    for (name, data) in members {
        let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
        writer.start_file(*name, options).unwrap();
        writer.write_all(data).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

pub fn write_catalog(dir: &Path, file_name: &str, json: &str) {
    std::fs::write(dir.join(file_name), json).unwrap();
}
