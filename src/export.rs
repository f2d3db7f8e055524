use anyhow::{Context, Result};
use std::{fs, path::{Path, PathBuf}};
use tracing::debug;

pub const EXPORT_FILE_NAME: &str = "new_post.txt";
pub const EXPORT_MIME: &str = "text/plain";

/// A download as the user receives it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Export {
    pub file_name: &'static str,
    pub mime: &'static str,
    pub data: Vec<u8>,
}

impl Export {
    pub fn new_post(text: &str) -> Self {
        Export {
            file_name: EXPORT_FILE_NAME,
            mime: EXPORT_MIME,
            data: text.as_bytes().to_vec(),
        }
    }

    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir).with_context(|| format!("create {:?}", dir))?;
        let path = dir.join(self.file_name);
        fs::write(&path, &self.data).with_context(|| format!("write {:?}", path))?;
        debug!("Wrote {} ({} bytes, {})", path.display(), self.data.len(), self.mime);
        Ok(path)
    }
}
