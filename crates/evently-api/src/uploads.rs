use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::info;

/// 5 MB limit for profile pictures.
pub const MAX_UPLOAD_SIZE: usize = 5 * 1024 * 1024;

/// URL prefix under which [`UploadDir`] contents are served.
pub const UPLOADS_URL_PREFIX: &str = "/uploads";

/// Local directory receiving uploaded files.
pub struct UploadDir {
    dir: PathBuf,
}

impl UploadDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `bytes` under a timestamp-prefixed name and return its public path,
    /// e.g. `/uploads/1760000000000-avatar.png`.
    pub async fn save(&self, original_name: &str, bytes: &[u8]) -> anyhow::Result<String> {
        let name = stored_name(original_name, chrono::Utc::now().timestamp_millis());

        fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(&name);
        fs::write(&path, bytes).await?;

        info!("Stored upload {} ({} bytes)", path.display(), bytes.len());
        Ok(format!("{UPLOADS_URL_PREFIX}/{name}"))
    }
}

/// `<millis>-<name>`, keeping only the last path component of `original` and
/// replacing anything outside `[A-Za-z0-9._-]`.
pub fn stored_name(original: &str, millis: i64) -> String {
    let base = original.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    let cleaned = if cleaned.is_empty() { "upload" } else { cleaned };
    format!("{millis}-{cleaned}")
}
