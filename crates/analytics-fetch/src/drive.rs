//! Retrieval from a Google Drive folder.
//!
//! Lists every non-trashed file in the folder, orders them by creation time
//! and downloads each one. A file that fails to download or decode is logged
//! and skipped; only a failed listing aborts the run.

use analytics_core::error::{AnalyticsError, Result};
use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::{info, warn};

use crate::credentials::{ServiceAccountKey, DRIVE_READONLY_SCOPE};
use crate::http::{check_status, transport};
use crate::retriever::{FetchedBlob, Retriever};

pub const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";

const LIST_FIELDS: &str = "nextPageToken, files(id, name, mimeType, size, createdTime)";

/// File metadata as returned by `files.list`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    /// RFC 3339 creation time; sorts lexically.
    #[serde(default)]
    pub created_time: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
    #[serde(default)]
    next_page_token: Option<String>,
}

/// The two Drive operations the folder retriever needs.
pub trait DriveApi {
    /// All non-trashed files directly inside `folder_id`, across every page.
    fn list_folder(&self, folder_id: &str) -> Result<Vec<DriveFile>>;

    /// The full content of `file` as UTF-8 text.
    fn download(&self, file: &DriveFile) -> Result<String>;
}

// ── DriveClient ───────────────────────────────────────────────────────────────

/// Blocking Drive v3 REST client authorised with a bearer token.
pub struct DriveClient {
    http: Client,
    token: String,
    base_url: String,
}

impl DriveClient {
    /// Exchange `key` for a read-only Drive token and build a client.
    pub fn connect(key: &ServiceAccountKey) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("site-analytics/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(transport)?;
        let token = key.fetch_access_token(&http, DRIVE_READONLY_SCOPE)?;
        Ok(Self::with_token(http, token, DRIVE_API_BASE))
    }

    pub fn with_token(http: Client, token: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            http,
            token: token.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

impl DriveApi for DriveClient {
    fn list_folder(&self, folder_id: &str) -> Result<Vec<DriveFile>> {
        let query = format!("'{}' in parents and trashed = false", folder_id.replace('\'', "\\'"));
        let url = format!("{}/files", self.base_url);

        let mut files = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut request = self
                .http
                .get(&url)
                .bearer_auth(&self.token)
                .query(&[("q", query.as_str()), ("fields", LIST_FIELDS)]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let page: FileList = check_status(request.send().map_err(transport)?)?
                .json()
                .map_err(transport)?;
            files.extend(page.files);

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }
        Ok(files)
    }

    fn download(&self, file: &DriveFile) -> Result<String> {
        let url = format!("{}/files/{}", self.base_url, file.id);
        let resp = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .query(&[("alt", "media")])
            .send()
            .map_err(transport)?;
        let bytes = check_status(resp)?.bytes().map_err(transport)?;

        String::from_utf8(bytes.to_vec()).map_err(|e| {
            AnalyticsError::Other(anyhow::anyhow!("{} is not valid UTF-8: {}", file.name, e))
        })
    }
}

// ── DriveRetriever ────────────────────────────────────────────────────────────

/// Folder source: one blob per Drive file, oldest first.
pub struct DriveRetriever<A: DriveApi> {
    api: A,
    folder_id: String,
}

impl<A: DriveApi> DriveRetriever<A> {
    pub fn new(api: A, folder_id: impl Into<String>) -> Self {
        Self {
            api,
            folder_id: folder_id.into(),
        }
    }
}

/// Stable sort by creation time; a missing time sorts first.
pub fn sort_by_created(files: &mut [DriveFile]) {
    files.sort_by(|a, b| {
        a.created_time
            .as_deref()
            .unwrap_or("")
            .cmp(b.created_time.as_deref().unwrap_or(""))
    });
}

impl<A: DriveApi> Retriever for DriveRetriever<A> {
    fn name(&self) -> &'static str {
        "drive"
    }

    fn fetch(&self) -> Result<Vec<FetchedBlob>> {
        let mut files = self.api.list_folder(&self.folder_id)?;
        sort_by_created(&mut files);
        info!("Found {} file(s) in folder {}", files.len(), self.folder_id);

        let mut blobs = Vec::with_capacity(files.len());
        for file in &files {
            match self.api.download(file) {
                Ok(text) => blobs.push(FetchedBlob {
                    name: file.name.clone(),
                    text,
                }),
                Err(e) => warn!("Error downloading {} ({}): {}", file.name, file.id, e),
            }
        }
        Ok(blobs)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
