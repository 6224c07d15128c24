use serde::{Deserialize, Serialize};

/// Stable handle for one uploaded file within a draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttachmentId(pub u64);

/// What we keep of an uploaded file. Only the name ends up in the sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMeta {
    pub name: String,
    pub size: u64,
    pub mime_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileAttachment {
    pub id: AttachmentId,
    #[serde(flatten)]
    pub meta: FileMeta,
}

/// Files (in upload order) and links collected across a draft's steps.
#[derive(Debug, Clone, Default)]
pub struct AttachmentCollector {
    files: Vec<FileAttachment>,
    links: Vec<String>,
    next_id: u64,
}

impl AttachmentCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn files(&self) -> &[FileAttachment] {
        &self.files
    }

    pub fn links(&self) -> &[String] {
        &self.links
    }

    /// Append files in the given order. No validation happens here.
    pub fn add_files(&mut self, new_files: Vec<FileMeta>) -> Vec<AttachmentId> {
        let mut ids = Vec::with_capacity(new_files.len());
        for meta in new_files {
            let id = AttachmentId(self.next_id);
            self.next_id += 1;
            self.files.push(FileAttachment { id, meta });
            ids.push(id);
        }
        ids
    }

    /// Remove the one file with this id. Returns false if it isn't present.
    pub fn remove_file(&mut self, id: AttachmentId) -> bool {
        match self.files.iter().position(|file| file.id == id) {
            Some(index) => {
                self.files.remove(index);
                true
            }
            None => false,
        }
    }

    /// Add a trimmed link unless it is empty or already collected.
    pub fn add_link(&mut self, url: &str) -> bool {
        let url = url.trim();
        if url.is_empty() || self.links.iter().any(|link| link == url) {
            return false;
        }
        self.links.push(url.to_string());
        true
    }

    pub fn remove_link(&mut self, url: &str) -> bool {
        let before = self.links.len();
        self.links.retain(|link| link != url);
        self.links.len() != before
    }

    pub fn file_metas(&self) -> Vec<FileMeta> {
        self.files.iter().map(|file| file.meta.clone()).collect()
    }
}
