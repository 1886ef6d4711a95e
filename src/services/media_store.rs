use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use chrono::Utc;
use rand::Rng;
use uuid::Uuid;

/// Local disk layout for uploads: `{root}/{media id}/{stored name}`.
#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
    public_base: String,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>, app_url: &str) -> Self {
        Self {
            root: root.into(),
            public_base: format!("{}/uploads", app_url.trim_end_matches('/')),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `{field}-{unix millis}-{9 random digits}{.ext}`. Only `[A-Za-z0-9_-]`
    /// survives from `field` so the name can never leave the media directory.
    pub fn stored_name(field: &str, original_name: &str, mime_type: &str) -> String {
        let field: String = field.chars().filter(|c| is_name_char(*c)).collect();
        let field = if field.is_empty() { "file" } else { field.as_str() };
        let millis = Utc::now().timestamp_millis();
        let random: u32 = rand::thread_rng().gen_range(0..1_000_000_000);
        let ext = extension_for(original_name, mime_type)
            .map(|ext| format!(".{ext}"))
            .unwrap_or_default();
        format!("{field}-{millis}-{random:09}{ext}")
    }

    pub fn relative_path(media_id: Uuid, stored_name: &str) -> String {
        format!("{media_id}/{stored_name}")
    }

    pub fn url_for(&self, file_name: &str) -> String {
        format!("{}/{}", self.public_base, file_name)
    }

    pub async fn write(&self, media_id: Uuid, stored_name: &str, bytes: &[u8]) -> std::io::Result<()> {
        let dir = self.root.join(media_id.to_string());
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(dir.join(stored_name), bytes).await
    }

    /// Removes a media directory; a directory that is already gone is fine.
    pub async fn remove_dir(&self, media_id: Uuid) -> std::io::Result<()> {
        match tokio::fs::remove_dir_all(self.root.join(media_id.to_string())).await {
            Err(err) if err.kind() != ErrorKind::NotFound => Err(err),
            _ => Ok(()),
        }
    }

    /// Best effort: failures are logged, never returned.
    pub async fn remove_dirs(&self, media_ids: &[Uuid]) {
        for media_id in media_ids {
            if let Err(err) = self.remove_dir(*media_id).await {
                tracing::warn!(%media_id, error = %err, "failed to remove media directory");
            }
        }
    }
}

pub fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

fn extension_for(original_name: &str, mime_type: &str) -> Option<String> {
    let from_name = Path::new(original_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(str::to_ascii_lowercase);
    from_name.or_else(|| {
        mime_guess::get_mime_extensions_str(mime_type)
            .and_then(|exts| exts.first())
            .map(|ext| ext.to_string())
    })
}
