//! Files API
//!
//! Uploads are multipart: `create` registers the file and returns one
//! presigned URL per part, the caller PUTs each chunk to its URL, then
//! `complete_upload` hands back the ETags so the object can be assembled.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::stream::Stream;
use serde::{Deserialize, Serialize};

use super::common::{resource_path, ListFilter};
use super::{PolarApi, PolarContext};
use crate::error::{PolarError, PolarResult};
use crate::pagination::{ListResource, PageParams};
use crate::query::{ListQuery, QueryParams};

const FILES_PATH: &str = "/v1/files/";

/// Default size of one upload part.
pub const DEFAULT_CHUNK_SIZE: u64 = 10 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileService {
    Downloadable,
    ProductMedia,
    OrganizationAvatar,
}

impl fmt::Display for FileService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FileService::Downloadable => "downloadable",
            FileService::ProductMedia => "product_media",
            FileService::OrganizationAvatar => "organization_avatar",
        })
    }
}

#[non_exhaustive]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct File {
    pub id: String,
    #[serde(default)]
    pub organization_id: String,
    pub name: String,
    #[serde(default)]
    pub path: String,
    pub mime_type: String,
    pub size: u64,
    #[serde(default)]
    pub size_readable: String,
    pub service: FileService,
    #[serde(default)]
    pub is_uploaded: bool,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub checksum_etag: Option<String>,
    #[serde(default)]
    pub checksum_sha256_base64: Option<String>,
    #[serde(default)]
    pub checksum_sha256_hex: Option<String>,
    #[serde(default)]
    pub last_modified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    /// Public URL, only set for product media and avatars
    #[serde(default)]
    pub public_url: Option<String>,
}

/// Byte range `[chunk_start, chunk_end)` of one part.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FileUploadPart {
    pub number: u32,
    pub chunk_start: u64,
    pub chunk_end: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum_sha256_base64: Option<String>,
}

impl FileUploadPart {
    pub fn new(number: u32, chunk_start: u64, chunk_end: u64) -> Self {
        Self {
            number,
            chunk_start,
            chunk_end,
            checksum_sha256_base64: None,
        }
    }

    /// Split `size` bytes into parts of at most `chunk_size`, numbered from 1.
    pub fn split(size: u64, chunk_size: u64) -> Vec<FileUploadPart> {
        if size == 0 || chunk_size == 0 {
            return vec![FileUploadPart::new(1, 0, size)];
        }
        (0..size)
            .step_by(chunk_size as usize)
            .zip(1u32..)
            .map(|(start, number)| {
                FileUploadPart::new(number, start, (start + chunk_size).min(size))
            })
            .collect()
    }

    /// Zero for a reversed range.
    pub fn len(&self) -> u64 {
        self.chunk_end.saturating_sub(self.chunk_start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A part with the presigned URL to upload it to.
#[non_exhaustive]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PresignedPart {
    #[serde(flatten)]
    pub part: FileUploadPart,
    pub url: String,
    pub expires_at: DateTime<Utc>,
    /// Headers that must accompany the PUT
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

#[non_exhaustive]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UploadSession {
    pub id: String,
    pub path: String,
    #[serde(default)]
    pub parts: Vec<PresignedPart>,
}

/// A freshly registered file and its upload session.
#[non_exhaustive]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FileUpload {
    #[serde(flatten)]
    pub file: File,
    pub upload: UploadSession,
}

#[derive(Debug, Clone, Serialize)]
struct UploadParts<'a> {
    parts: &'a [FileUploadPart],
}

#[non_exhaustive]
#[derive(Debug, Clone, Serialize)]
pub struct FileCreate {
    pub name: String,
    pub mime_type: String,
    pub size: u64,
    pub service: FileService,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksum_sha256_base64: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip)]
    pub parts: Vec<FileUploadPart>,
}

impl FileCreate {
    /// Parts are split with [`DEFAULT_CHUNK_SIZE`] unless overridden.
    pub fn new(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        size: u64,
        service: FileService,
    ) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            size,
            service,
            organization_id: None,
            checksum_sha256_base64: None,
            version: None,
            parts: FileUploadPart::split(size, DEFAULT_CHUNK_SIZE),
        }
    }

    pub fn organization_id(mut self, id: impl Into<String>) -> Self {
        self.organization_id = Some(id.into());
        self
    }

    pub fn checksum_sha256_base64(mut self, checksum: impl Into<String>) -> Self {
        self.checksum_sha256_base64 = Some(checksum.into());
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn parts(mut self, parts: Vec<FileUploadPart>) -> Self {
        self.parts = parts;
        self
    }

    /// Parts must be numbered `1..=n` and tile `[0, size)` without gaps or
    /// overlaps.
    fn validate(&self) -> PolarResult<()> {
        let invalid = |msg: String| Err(PolarError::invalid("upload.parts", msg));

        if self.parts.is_empty() {
            return invalid("at least one part is required".to_string());
        }

        let mut numbers: Vec<u32> = self.parts.iter().map(|p| p.number).collect();
        numbers.sort_unstable();
        if numbers.iter().zip(1u32..).any(|(number, expected)| *number != expected) {
            return invalid(format!(
                "part numbers must run from 1 to {}",
                self.parts.len()
            ));
        }

        let mut parts: Vec<&FileUploadPart> = self.parts.iter().collect();
        parts.sort_by_key(|p| (p.chunk_start, p.number));

        let mut offset = 0u64;
        for part in parts {
            if part.chunk_end < part.chunk_start {
                return invalid(format!("part {} ends before it starts", part.number));
            }
            if part.chunk_start < offset {
                return invalid(format!("part {} overlaps the previous part", part.number));
            }
            if part.chunk_start > offset {
                return invalid(format!(
                    "gap of {} bytes before part {}",
                    part.chunk_start - offset,
                    part.number
                ));
            }
            offset = part.chunk_end;
        }

        if offset != self.size {
            return invalid(format!(
                "parts cover {offset} bytes, file size is {}",
                self.size
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct FileCreateBody<'a> {
    #[serde(flatten)]
    file: &'a FileCreate,
    upload: UploadParts<'a>,
}

/// ETag returned by storage for an uploaded part.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletedPart {
    pub number: u32,
    pub checksum_etag: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksum_sha256_base64: Option<String>,
}

impl CompletedPart {
    pub fn new(number: u32, checksum_etag: impl Into<String>) -> Self {
        Self {
            number,
            checksum_etag: checksum_etag.into(),
            checksum_sha256_base64: None,
        }
    }
}

#[non_exhaustive]
#[derive(Debug, Clone, Serialize)]
pub struct FileUploadCompleted {
    /// Upload session id
    pub id: String,
    pub path: String,
    pub parts: Vec<CompletedPart>,
}

impl FileUploadCompleted {
    pub fn new(upload: &UploadSession, parts: Vec<CompletedPart>) -> Self {
        Self {
            id: upload.id.clone(),
            path: upload.path.clone(),
            parts,
        }
    }
}

#[non_exhaustive]
#[derive(Debug, Clone, Default, Serialize)]
pub struct FileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl FileUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct FileListQuery {
    filter: ListFilter,
    ids: Vec<String>,
}

impl FileListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn organization_id(mut self, id: impl Into<String>) -> Self {
        self.filter.organization_ids.push(id.into());
        self
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.ids.push(id.into());
        self
    }
}

impl ListQuery for FileListQuery {
    fn to_query(&self) -> PolarResult<Vec<(String, String)>> {
        let mut params = QueryParams::new();
        self.filter.apply(&mut params);
        params.push_all("ids", &self.ids);
        Ok(params.into_pairs())
    }
}

#[derive(Debug, Clone)]
pub struct FilesApi {
    context: Arc<PolarContext>,
}

impl FilesApi {
    pub fn new(context: Arc<PolarContext>) -> Self {
        Self { context }
    }

    /// Register a file and open its upload session.
    ///
    /// # Errors
    /// `PolarError::Validation` without a request when the parts do not add
    /// up to the declared size.
    pub async fn create(&self, request: &FileCreate) -> PolarResult<FileUpload> {
        request.validate()?;
        let body = FileCreateBody {
            file: request,
            upload: UploadParts {
                parts: &request.parts,
            },
        };
        self.context.client.post(FILES_PATH, &body).await
    }

    pub async fn list(
        &self,
        query: &FileListQuery,
        page: PageParams,
    ) -> PolarResult<ListResource<File>> {
        self.context.list(FILES_PATH, query, page).await
    }

    pub fn list_all(
        &self,
        query: &FileListQuery,
    ) -> impl Stream<Item = PolarResult<File>> + Send + 'static {
        self.context.list_all(self.api_name(), FILES_PATH, query)
    }

    pub async fn complete_upload(
        &self,
        id: &str,
        request: &FileUploadCompleted,
    ) -> PolarResult<File> {
        let path = format!("{}/uploaded", resource_path(FILES_PATH, id)?);
        self.context.client.post(&path, request).await
    }

    pub async fn update(&self, id: &str, request: &FileUpdate) -> PolarResult<File> {
        self.context
            .client
            .patch(&resource_path(FILES_PATH, id)?, request)
            .await
    }

    pub async fn delete(&self, id: &str) -> PolarResult<()> {
        self.context
            .client
            .delete_no_content(&resource_path(FILES_PATH, id)?)
            .await
    }
}

impl PolarApi for FilesApi {
    fn context(&self) -> &PolarContext {
        &self.context
    }

    fn api_name(&self) -> &'static str {
        "files"
    }
}
