//! Dataset retrieval from local files or HTTP.

mod basic;
mod client;

pub use basic::BasicClient;
pub use client::HttpClient;

use std::io::Read;
use std::time::Instant;

use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use tracing::{debug, warn};

pub async fn fetch_bytes<C: HttpClient>(client: &C, url: &str) -> Result<Vec<u8>> {
    let req = reqwest::Request::new(reqwest::Method::GET, url.parse()?);

    let resp = client.execute(req).await?.error_for_status()?;
    Ok(resp.bytes().await?.to_vec())
}

/// Reads `source` from disk, or downloads it when it is an `http(s)` URL.
///
/// Sources ending in `.gz` are decompressed.
#[tracing::instrument(skip(client))]
pub async fn read_source<C: HttpClient>(client: &C, source: &str) -> Result<Vec<u8>> {
    let start = Instant::now();

    let bytes = if source.starts_with("http://") || source.starts_with("https://") {
        fetch_bytes(client, source)
            .await
            .with_context(|| format!("failed to download {source}"))?
    } else {
        tokio::fs::read(source)
            .await
            .with_context(|| format!("failed to read {source}"))?
    };

    let elapsed = start.elapsed();
    if elapsed.as_secs() > 15 {
        warn!(elapsed_secs = elapsed.as_secs(), "Dataset fetch was slow");
    }

    let bytes = if source.ends_with(".gz") {
        gunzip(&bytes).with_context(|| format!("failed to decompress {source}"))?
    } else {
        bytes
    };

    debug!(bytes = bytes.len(), "Dataset loaded");
    Ok(bytes)
}

fn gunzip(bytes: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut out = Vec::new();
    GzDecoder::new(bytes).read_to_end(&mut out)?;
    Ok(out)
}
