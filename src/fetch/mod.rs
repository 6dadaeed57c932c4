// src/fetch/mod.rs

use anyhow::{anyhow, Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, REFERER, USER_AGENT};
use reqwest::Client;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;
use url::Url;

/// INDEC's FTP mirror rejects requests without a browser User-Agent and
/// referer, answering an HTML block page instead.
static BROWSER_UA: &str = "Mozilla/5.0";
static INDEC_REFERER: &str = "https://www.indec.gob.ar/";
static ACCEPT_DATA: &str = "text/csv,application/vnd.ms-excel,application/octet-stream,*/*";

const MAX_RETRIES: usize = 3;
const RETRY_DELAY: Duration = Duration::from_secs(1);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Client configured for the statistical-office mirrors.
pub fn build_client() -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_UA));
    headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_DATA));
    headers.insert(REFERER, HeaderValue::from_static(INDEC_REFERER));

    Client::builder()
        .default_headers(headers)
        .timeout(REQUEST_TIMEOUT)
        .build()
        .context("building HTTP client")
}

/// Blocked or proxied mirrors return an HTML page with a 200 status; that is
/// never valid data here.
pub fn looks_like_html(bytes: &[u8]) -> bool {
    let head = String::from_utf8_lossy(&bytes[..bytes.len().min(200)])
        .trim_start()
        .to_lowercase();
    head.starts_with("<!doctype html") || head.starts_with("<html")
}

/// Download one source file, returning its raw bytes. Transient transport
/// errors are retried a bounded number of times; HTTP error statuses and
/// HTML-instead-of-data payloads fail immediately.
pub async fn download_bytes(client: &Client, url_str: &str) -> Result<Vec<u8>> {
    let url = Url::parse(url_str).with_context(|| format!("parsing source URL {}", url_str))?;

    let mut attempt = 0;
    let bytes = loop {
        attempt += 1;

        match client.get(url.as_str()).send().await {
            Ok(resp) if resp.status().is_success() => match resp.bytes().await {
                Ok(bytes) => break bytes,
                Err(_) if attempt < MAX_RETRIES => {
                    warn!(url = %url, attempt, "body read failed, retrying");
                    sleep(RETRY_DELAY).await;
                    continue;
                }
                Err(e) => return Err(e).with_context(|| format!("reading body from {}", url)),
            },
            Ok(resp) => return Err(anyhow!("HTTP error {} from {}", resp.status(), url)),
            Err(_) if attempt < MAX_RETRIES => {
                warn!(url = %url, attempt, "request failed, retrying");
                sleep(RETRY_DELAY).await;
                continue;
            }
            Err(e) => return Err(e).with_context(|| format!("GET {}", url)),
        }
    };

    if looks_like_html(&bytes) {
        anyhow::bail!(
            "{} returned HTML instead of data (status was OK; likely blocked or proxied)",
            url
        );
    }

    Ok(bytes.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn html_payloads_are_recognized() {
        assert!(looks_like_html(b"<!DOCTYPE html><html><body>denied"));
        assert!(looks_like_html(b"  \n<html lang=\"es\">"));
        assert!(!looks_like_html(b"periodo;apertura;indice\n2023-01-01;ng;100,0"));
        assert!(!looks_like_html(b""));
    }

    #[test]
    fn client_builds_with_default_headers() {
        assert!(build_client().is_ok());
    }
}
