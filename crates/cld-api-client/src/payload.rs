//! Upload payload sources.
//!
//! Local files are streamed from disk in chunks, so large files are never
//! loaded into memory. Progress is counted as chunks are handed to the
//! HTTP body.

use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use cld_core::Result;
use futures::{stream, StreamExt};
use reqwest::multipart::Part;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;

use crate::operation::ProgressReporter;

const BYTES_CHUNK_SIZE: usize = 64 * 1024;
const DEFAULT_FILE_NAME: &str = "file";

/// What to upload.
#[derive(Debug, Clone)]
pub enum Payload {
    /// A local file, streamed from disk.
    File(PathBuf),
    /// In-memory data.
    Bytes { data: Bytes, file_name: Option<String> },
    /// A remote `http(s)://`, `s3://` or data URI the service fetches itself.
    Url(String),
}

impl Payload {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Payload::File(path.into())
    }

    pub fn bytes(data: impl Into<Bytes>) -> Self {
        Payload::Bytes {
            data: data.into(),
            file_name: None,
        }
    }

    pub fn bytes_named(data: impl Into<Bytes>, file_name: impl Into<String>) -> Self {
        Payload::Bytes {
            data: data.into(),
            file_name: Some(file_name.into()),
        }
    }

    pub fn url(url: impl Into<String>) -> Self {
        Payload::Url(url.into())
    }

    /// Size in bytes of the data that will be streamed. `Url` payloads send no file data.
    pub(crate) async fn len(&self) -> Result<u64> {
        match self {
            Payload::File(path) => Ok(tokio::fs::metadata(path).await?.len()),
            Payload::Bytes { data, .. } => Ok(data.len() as u64),
            Payload::Url(_) => Ok(0),
        }
    }

    /// The `file` form field for this payload.
    pub(crate) async fn into_field(self, reporter: ProgressReporter) -> Result<FileField> {
        match self {
            Payload::File(path) => {
                let len = tokio::fs::metadata(&path).await?.len();
                let part = file_range_part(&path, 0, len, reporter).await?;
                Ok(FileField::Part(part))
            }
            Payload::Bytes { data, file_name } => {
                let len = data.len() as u64;
                let chunks: Vec<Bytes> = if data.is_empty() {
                    Vec::new()
                } else {
                    data.chunks(BYTES_CHUNK_SIZE)
                        .map(|c| data.slice_ref(c))
                        .collect()
                };
                let counted = stream::iter(chunks).map(move |chunk| {
                    reporter.advance(chunk.len() as u64);
                    Ok::<Bytes, std::io::Error>(chunk)
                });
                let body = reqwest::Body::wrap_stream(counted);
                let part = Part::stream_with_length(body, len)
                    .file_name(file_name.unwrap_or_else(|| DEFAULT_FILE_NAME.to_string()));
                Ok(FileField::Part(part))
            }
            Payload::Url(url) => Ok(FileField::Text(url)),
        }
    }
}

/// A payload rendered as the `file` form field.
pub(crate) enum FileField {
    Part(Part),
    Text(String),
}

/// Stream `len` bytes of `path` starting at `offset` as a multipart part.
pub(crate) async fn file_range_part(
    path: &Path,
    offset: u64,
    len: u64,
    reporter: ProgressReporter,
) -> Result<Part> {
    let mut file = tokio::fs::File::open(path).await?;
    if offset > 0 {
        file.seek(SeekFrom::Start(offset)).await?;
    }
    let counted = ReaderStream::new(file.take(len)).map(move |chunk| {
        if let Ok(bytes) = &chunk {
            reporter.advance(bytes.len() as u64);
        }
        chunk
    });

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(DEFAULT_FILE_NAME)
        .to_string();

    Ok(Part::stream_with_length(reqwest::Body::wrap_stream(counted), len).file_name(file_name))
}
