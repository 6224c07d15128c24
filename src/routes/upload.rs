use axum::http::HeaderMap;
use bytes::Bytes;

use crate::forms::attachments::FileMeta;

const FALLBACK_MIME: &str = "application/octet-stream";

/// Read the file parts of a multipart body. Contents are only measured;
/// the sheet stores file names, not bytes.
pub async fn parse_files(headers: &HeaderMap, body: Bytes) -> Result<Vec<FileMeta>, String> {
    let boundary = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .and_then(|ct| multer::parse_boundary(ct).ok())
        .ok_or_else(|| "Missing multipart boundary".to_string())?;

    let stream = futures_util::stream::once(async { Ok::<_, std::io::Error>(body) });
    let mut multipart = multer::Multipart::new(stream, boundary);

    let mut files = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| format!("Multipart error: {e}"))?
    {
        let Some(name) = field.file_name().map(|s| s.to_string()) else {
            continue;
        };
        let mime_type = field
            .content_type()
            .map(|m| m.essence_str().to_string())
            .unwrap_or_else(|| FALLBACK_MIME.to_string());
        let size = field
            .bytes()
            .await
            .map_err(|e| format!("Field read error: {e}"))?
            .len() as u64;

        files.push(FileMeta {
            name,
            size,
            mime_type,
        });
    }

    if files.is_empty() {
        return Err("No files in upload".to_string());
    }

    Ok(files)
}
