//! Minimal `multipart/form-data` encoder for the single-file inference upload.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use bytes::{BufMut, Bytes, BytesMut};

/// A file part of a multipart form.
#[derive(Debug, Clone, Copy)]
pub struct FilePart<'a> {
    pub field: &'a str,
    pub filename: &'a str,
    pub content_type: &'a str,
    pub data: &'a [u8],
}

/// A boundary string unlikely to collide with binary file content.
pub fn boundary() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    format!("inferwatch-{nanos:032x}")
}

/// The `Content-Type` header value for a body encoded with `boundary`.
pub fn content_type(boundary: &str) -> String {
    format!("multipart/form-data; boundary={boundary}")
}

/// Encode a form consisting of exactly one file part.
pub fn encode(boundary: &str, part: FilePart<'_>) -> Bytes {
    let mut buf = BytesMut::with_capacity(part.data.len() + 256);
    buf.put_slice(format!("--{boundary}\r\n").as_bytes());
    buf.put_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            escape_quotes(part.field),
            escape_quotes(part.filename)
        )
        .as_bytes(),
    );
    buf.put_slice(format!("Content-Type: {}\r\n\r\n", part.content_type).as_bytes());
    buf.put_slice(part.data);
    buf.put_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    buf.freeze()
}

/// Content type for an upload, from its file extension.
pub fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        _ => "application/octet-stream",
    }
}

fn escape_quotes(s: &str) -> String {
    s.replace('"', "%22")
}
