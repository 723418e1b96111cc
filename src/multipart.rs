//! `multipart/form-data` request bodies.
//!
//! Layout, for each part in order (metadata first):
//! ```text
//! --<boundary>\r\n
//! Content-Disposition: form-data; name="<name>"[; filename="<filename>"]\r\n
//! Content-Type: <content type>\r\n
//! \r\n
//! <data>\r\n
//! ```
//! followed by `--<boundary>--\r\n`.

use crate::id::generate_boundary;

pub const APPLICATION_JSON: &str = "application/json";
pub const APPLICATION_OCTET_STREAM: &str = "application/octet-stream";
pub const TEXT_PLAIN: &str = "text/plain";

/// Name of the JSON metadata part.
pub const METADATA_PART: &str = "metadata";

/// Attempts at drawing a boundary absent from every payload.
const MAX_BOUNDARY_ATTEMPTS: usize = 16;

#[derive(Debug, thiserror::Error)]
pub enum MultipartError {
    #[error("failed to encode metadata: {0}")]
    Metadata(#[from] serde_json::Error),
    #[error("boundary '{0}' occurs inside a part payload")]
    BoundaryCollision(String),
    #[error("invalid boundary '{0}': must be 1-70 characters without whitespace")]
    InvalidBoundary(String),
}

/// One binary section of a multipart body.
#[derive(Debug, Clone)]
pub struct Part {
    pub name: String,
    pub filename: Option<String>,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl Part {
    pub fn file(
        name: impl Into<String>,
        filename: impl Into<String>,
        content_type: impl Into<String>,
        data: Vec<u8>,
    ) -> Self {
        Self {
            name: name.into(),
            filename: Some(filename.into()),
            content_type: content_type.into(),
            data,
        }
    }

    fn json(name: &str, data: Vec<u8>) -> Self {
        Self {
            name: name.to_string(),
            filename: None,
            content_type: APPLICATION_JSON.to_string(),
            data,
        }
    }
}

/// An encoded body with the `Content-Type` header value that announces its boundary.
#[derive(Debug, Clone)]
pub struct MultipartBody {
    pub body: Vec<u8>,
    pub content_type: String,
    pub part_count: usize,
}

/// Encode `metadata` as the first part, then `parts` in order, under a fresh boundary.
pub fn build_multipart(
    metadata: &serde_json::Value,
    parts: Vec<Part>,
) -> Result<MultipartBody, MultipartError> {
    let parts = with_metadata(metadata, parts)?;

    let mut last = String::new();
    for _ in 0..MAX_BOUNDARY_ATTEMPTS {
        let boundary = generate_boundary();
        match encode(&parts, &boundary) {
            Err(MultipartError::BoundaryCollision(b)) => last = b,
            result => return result,
        }
    }
    Err(MultipartError::BoundaryCollision(last))
}

/// Same as [`build_multipart`] with a caller-chosen boundary.
pub fn build_multipart_with_boundary(
    metadata: &serde_json::Value,
    parts: Vec<Part>,
    boundary: &str,
) -> Result<MultipartBody, MultipartError> {
    let parts = with_metadata(metadata, parts)?;
    encode(&parts, boundary)
}

fn with_metadata(
    metadata: &serde_json::Value,
    parts: Vec<Part>,
) -> Result<Vec<Part>, MultipartError> {
    let mut all = Vec::with_capacity(parts.len() + 1);
    all.push(Part::json(METADATA_PART, serde_json::to_vec(metadata)?));
    all.extend(parts);
    Ok(all)
}

fn encode(parts: &[Part], boundary: &str) -> Result<MultipartBody, MultipartError> {
    if boundary.is_empty()
        || boundary.len() > 70
        || boundary.chars().any(|c| c.is_whitespace() || c == '"')
    {
        return Err(MultipartError::InvalidBoundary(boundary.to_string()));
    }

    if parts.iter().any(|p| contains(&p.data, boundary.as_bytes())) {
        return Err(MultipartError::BoundaryCollision(boundary.to_string()));
    }

    let payload_size: usize = parts.iter().map(|p| p.data.len() + 256).sum();
    let mut body = Vec::with_capacity(payload_size + boundary.len() + 8);

    for part in parts {
        body.extend_from_slice(b"--");
        body.extend_from_slice(boundary.as_bytes());
        body.extend_from_slice(b"\r\n");

        body.extend_from_slice(b"Content-Disposition: form-data; name=\"");
        body.extend_from_slice(escape_quoted(&part.name).as_bytes());
        body.push(b'"');
        if let Some(filename) = &part.filename {
            body.extend_from_slice(b"; filename=\"");
            body.extend_from_slice(escape_quoted(filename).as_bytes());
            body.push(b'"');
        }
        body.extend_from_slice(b"\r\n");

        body.extend_from_slice(b"Content-Type: ");
        body.extend_from_slice(part.content_type.as_bytes());
        body.extend_from_slice(b"\r\n\r\n");

        body.extend_from_slice(&part.data);
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(b"--");
    body.extend_from_slice(boundary.as_bytes());
    body.extend_from_slice(b"--\r\n");

    Ok(MultipartBody {
        body,
        content_type: format!("multipart/form-data; boundary={}", boundary),
        part_count: parts.len(),
    })
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

// Percent-encode the characters that would end or break a quoted header parameter.
fn escape_quoted(value: &str) -> String {
    value
        .replace('"', "%22")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}
