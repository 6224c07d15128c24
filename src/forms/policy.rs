//! Attachment rules shared by the draft orchestrator and the gateway.

use super::FormKind;
use super::attachments::FileMeta;

pub const ALLOWED_MIME_TYPES: &[&str] = &[
    "application/pdf",
    "image/png",
    "image/jpeg",
    "image/jpg",
    "image/gif",
    "image/webp",
    "text/plain",
    "text/markdown",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
];

pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

pub const MISSING_ATTACHMENT: &str = "Please provide at least one file or link";

pub fn check_file(file: &FileMeta) -> Result<(), String> {
    let mime = file.mime_type.to_ascii_lowercase();
    if !ALLOWED_MIME_TYPES.contains(&mime.as_str()) {
        return Err(format!(
            "File \"{}\" type {} is not allowed. Please upload PDF, images, or text documents only.",
            file.name, file.mime_type
        ));
    }

    if file.size > MAX_FILE_SIZE {
        return Err(format!("File \"{}\" is larger than 10MB", file.name));
    }

    Ok(())
}

/// Pitches need supporting material: at least one file or one link.
pub fn check_attachments(kind: FormKind, files: usize, links: usize) -> Result<(), &'static str> {
    if kind.requires_attachment() && files == 0 && links == 0 {
        return Err(MISSING_ATTACHMENT);
    }
    Ok(())
}
