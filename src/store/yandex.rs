//! Yandex Disk REST client.
//!
//! Talks to the `/v1/disk/resources` API with an OAuth token. Listings are
//! paged with `limit`/`offset`; uploads and downloads go through the one-shot
//! `href` the API hands out for each file. File bodies are streamed in chunks
//! in both directions.

use crate::error::StoreError;
use crate::namespace::join_remote;
use crate::store::{ItemKind, RemoteItem, RemoteStore};
use crate::types::{Fingerprint, HashAlgorithm};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::{self, Stream};
use reqwest::header::CONTENT_LENGTH;
use reqwest::{Body, Client, Response, StatusCode};
use serde::Deserialize;
use std::io;
use std::path::Path;
use std::time::Duration;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{debug, trace};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const PAGE_LIMIT: usize = 1000;
const MAX_RETRY_AFTER: Duration = Duration::from_secs(60);
const UPLOAD_CHUNK_SIZE: usize = 256 * 1024;

#[derive(Debug, Deserialize)]
struct ResourceDto {
    name: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    size: Option<u64>,
    #[serde(default)]
    sha256: Option<String>,
    #[serde(default)]
    modified: Option<DateTime<Utc>>,
    #[serde(default, rename = "_embedded")]
    embedded: Option<EmbeddedDto>,
}

#[derive(Debug, Deserialize)]
struct EmbeddedDto {
    #[serde(default)]
    items: Vec<ResourceDto>,
    #[serde(default)]
    total: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct LinkDto {
    href: String,
}

impl ResourceDto {
    fn into_item(self, path: String) -> RemoteItem {
        let kind = if self.kind == "dir" {
            ItemKind::Directory
        } else {
            ItemKind::File
        };
        let fingerprint = match kind {
            ItemKind::File => self
                .sha256
                .map(|digest| Fingerprint::content_hash(HashAlgorithm::Sha256, digest)),
            ItemKind::Directory => None,
        };
        RemoteItem {
            name: self.name,
            path,
            kind,
            size: self.size.unwrap_or(0),
            fingerprint,
            modified_at: self.modified,
        }
    }
}

/// Yandex Disk client.
pub struct YandexDiskStore {
    client: Client,
    token: String,
    endpoint: String,
    timeout: Duration,
}

impl YandexDiskStore {
    pub fn new(
        token: impl Into<String>,
        endpoint: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Transport(format!("Failed to create HTTP client: {}", e)))?;
        let endpoint: String = endpoint.into();
        Ok(Self {
            client,
            token: token.into(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    fn resources_url(&self, suffix: &str) -> String {
        format!("{}/resources{}", self.endpoint, suffix)
    }

    fn auth_header(&self) -> String {
        format!("OAuth {}", self.token)
    }

    fn map_http_error(&self, error: reqwest::Error) -> StoreError {
        if error.is_timeout() {
            StoreError::Timeout(self.timeout)
        } else if error.is_connect() {
            StoreError::Transport(format!("Connection error: {}", error))
        } else {
            StoreError::Transport(format!("HTTP error: {}", error))
        }
    }

    async fn get_link(&self, suffix: &str, query: &[(&str, &str)]) -> Result<String, StoreError> {
        let response = self
            .client
            .get(self.resources_url(suffix))
            .header("Authorization", self.auth_header())
            .query(query)
            .send()
            .await
            .map_err(|e| self.map_http_error(e))?;
        let response = check_status(response, query_path(query)).await?;
        let link: LinkDto = response
            .json()
            .await
            .map_err(|e| StoreError::Transport(format!("Failed to parse link response: {}", e)))?;
        Ok(link.href)
    }

    async fn get_resource(&self, path: &str, limit: usize, offset: usize) -> Result<ResourceDto, StoreError> {
        let api_path = api_path(path);
        let limit = limit.to_string();
        let offset = offset.to_string();
        let response = self
            .client
            .get(self.resources_url(""))
            .header("Authorization", self.auth_header())
            .query(&[
                ("path", api_path.as_str()),
                ("limit", limit.as_str()),
                ("offset", offset.as_str()),
            ])
            .send()
            .await
            .map_err(|e| self.map_http_error(e))?;
        let response = check_status(response, path).await?;
        response
            .json()
            .await
            .map_err(|e| StoreError::Transport(format!("Failed to parse resource {}: {}", path, e)))
    }
}

/// The API wants a trailing slash on the bare namespace root (`app:/`).
fn api_path(path: &str) -> String {
    if path.ends_with(':') {
        format!("{}/", path)
    } else {
        path.to_string()
    }
}

fn query_path<'a>(query: &[(&str, &'a str)]) -> &'a str {
    query
        .iter()
        .find(|(key, _)| *key == "path")
        .map(|(_, value)| *value)
        .unwrap_or("")
}

fn parse_retry_after(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get("Retry-After")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(|secs| Duration::from_secs(secs).min(MAX_RETRY_AFTER))
}

/// Map a non-success HTTP status onto the store error taxonomy.
fn status_error(status: StatusCode, retry_after: Option<Duration>, path: &str, body: &str) -> StoreError {
    match status.as_u16() {
        404 => StoreError::NotFound(path.to_string()),
        429 => StoreError::RateLimited { retry_after },
        code if code >= 500 => StoreError::Transport(format!("{} returned {}: {}", path, status, body)),
        _ => StoreError::Rejected(format!("{} returned {}: {}", path, status, body)),
    }
}

async fn check_status(response: Response, path: &str) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let retry_after = parse_retry_after(&response);
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    Err(status_error(status, retry_after, path, &body))
}

#[async_trait]
impl RemoteStore for YandexDiskStore {
    fn name(&self) -> &str {
        "yandex-disk"
    }

    fn native_hash(&self) -> Option<HashAlgorithm> {
        Some(HashAlgorithm::Sha256)
    }

    async fn list(&self, path: &str) -> Result<Vec<RemoteItem>, StoreError> {
        let mut items = Vec::new();
        let mut offset = 0;
        loop {
            let resource = self.get_resource(path, PAGE_LIMIT, offset).await?;
            if resource.kind != "dir" {
                return Err(StoreError::Rejected(format!("{} is not a directory", path)));
            }
            let Some(embedded) = resource.embedded else {
                break;
            };
            let page_len = embedded.items.len();
            let total = embedded.total;
            for child in embedded.items {
                // Listings report provider-absolute paths; keep the caller's address space.
                let child_path = join_remote(path, &child.name);
                items.push(child.into_item(child_path));
            }
            trace!(path, fetched = items.len(), ?total, "Listed page");
            if page_len < PAGE_LIMIT || total.is_some_and(|total| items.len() >= total) {
                break;
            }
            offset += page_len;
        }
        Ok(items)
    }

    async fn stat(&self, path: &str) -> Result<RemoteItem, StoreError> {
        let resource = self.get_resource(path, 0, 0).await?;
        Ok(resource.into_item(path.to_string()))
    }

    async fn create_dir(&self, path: &str) -> Result<(), StoreError> {
        let api_path = api_path(path);
        let response = self
            .client
            .put(self.resources_url(""))
            .header("Authorization", self.auth_header())
            .query(&[("path", api_path.as_str())])
            .send()
            .await
            .map_err(|e| self.map_http_error(e))?;

        if response.status() == StatusCode::CONFLICT {
            // 409 covers both "already exists" and "parent missing".
            return match self.stat(path).await {
                Ok(item) if item.is_dir() => Ok(()),
                Ok(_) => Err(StoreError::Rejected(format!("{} exists and is a file", path))),
                Err(StoreError::NotFound(_)) => Err(StoreError::Rejected(format!(
                    "parent directory of {} does not exist",
                    path
                ))),
                Err(e) => Err(e),
            };
        }
        check_status(response, path).await?;
        debug!(path, "Created remote directory");
        Ok(())
    }

    async fn upload(&self, local_file: &Path, remote_path: &str) -> Result<(), StoreError> {
        let href = self
            .get_link("/upload", &[("path", remote_path), ("overwrite", "true")])
            .await?;
        let file = File::open(local_file).await?;
        let size = file.metadata().await?.len();
        let response = self
            .client
            .put(&href)
            .header(CONTENT_LENGTH, size)
            .body(Body::wrap_stream(file_chunks(file, UPLOAD_CHUNK_SIZE)))
            .send()
            .await
            .map_err(|e| self.map_http_error(e))?;
        check_status(response, remote_path).await?;
        Ok(())
    }

    async fn download(&self, remote_path: &str, local_file: &Path) -> Result<(), StoreError> {
        let href = self.get_link("/download", &[("path", remote_path)]).await?;
        let response = self
            .client
            .get(&href)
            .send()
            .await
            .map_err(|e| self.map_http_error(e))?;
        let mut response = check_status(response, remote_path).await?;
        let mut file = File::create(local_file).await?;
        let mut written = 0u64;
        while let Some(chunk) = response.chunk().await.map_err(|e| self.map_http_error(e))? {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        trace!(path = remote_path, bytes = written, "Downloaded");
        Ok(())
    }
}

/// Read `file` front to back in pieces of at most `chunk_size` bytes.
fn file_chunks(file: File, chunk_size: usize) -> impl Stream<Item = io::Result<Vec<u8>>> {
    stream::try_unfold(file, move |mut file| async move {
        let mut buffer = vec![0u8; chunk_size];
        let read = file.read(&mut buffer).await?;
        if read == 0 {
            return Ok(None);
        }
        buffer.truncate(read);
        Ok(Some((buffer, file)))
    })
}
