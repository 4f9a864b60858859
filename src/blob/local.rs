use std::path::{Component, Path, PathBuf};

use rocket::tokio;
use rocket::tokio::io::AsyncWriteExt;
use serde::{Deserialize, Serialize};

use super::{object_path_from_url, object_url, BlobStore, StoredObject, CACHE_CONTROL};

const CHUNK: usize = 64 * 1024;
const META_DIR: &str = ".meta";

/// Filesystem bucket. Objects live at `{root}/{path}`, their metadata in
/// `{root}/.meta/{path}.json`, and are served by the `/o/` route.
pub struct LocalBlobStore {
    root: PathBuf,
    public_base: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectMeta {
    content_type: String,
    cache_control: String,
}

impl LocalBlobStore {
    pub fn new(root: &str, public_base: &str) -> Self {
        LocalBlobStore {
            root: PathBuf::from(root),
            public_base: public_base.trim_end_matches('/').to_string(),
        }
    }

    /// Map an object path onto the bucket directory. Absolute paths and
    /// parent-directory segments are refused.
    fn resolve(&self, path: &str) -> Result<PathBuf, String> {
        let rel = Path::new(path);
        if path.is_empty() || path.starts_with(META_DIR) {
            return Err(format!("Invalid object path: {}", path));
        }
        for c in rel.components() {
            match c {
                Component::Normal(_) => {}
                _ => return Err(format!("Invalid object path: {}", path)),
            }
        }
        Ok(self.root.join(rel))
    }

    fn meta_path(&self, path: &str) -> PathBuf {
        self.root.join(META_DIR).join(format!("{}.json", path))
    }
}

#[rocket::async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(
        &self,
        path: &str,
        data: &[u8],
        content_type: &str,
        on_progress: &(dyn Fn(u64) + Send + Sync),
    ) -> Result<(), String> {
        let dest = self.resolve(path)?;
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| e.to_string())?;
        }

        let mut file = tokio::fs::File::create(&dest)
            .await
            .map_err(|e| e.to_string())?;
        let mut written: u64 = 0;
        on_progress(0);
        for chunk in data.chunks(CHUNK) {
            file.write_all(chunk).await.map_err(|e| e.to_string())?;
            written += chunk.len() as u64;
            on_progress(written);
        }
        file.flush().await.map_err(|e| e.to_string())?;

        let meta = ObjectMeta {
            content_type: content_type.to_string(),
            cache_control: CACHE_CONTROL.to_string(),
        };
        let meta_path = self.meta_path(path);
        if let Some(parent) = meta_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| e.to_string())?;
        }
        let raw = serde_json::to_vec(&meta).map_err(|e| e.to_string())?;
        tokio::fs::write(&meta_path, raw)
            .await
            .map_err(|e| e.to_string())?;
        Ok(())
    }

    async fn download_url(&self, path: &str) -> Result<String, String> {
        let full = self.resolve(path)?;
        match tokio::fs::metadata(&full).await {
            Ok(m) if m.is_file() => Ok(object_url(&self.public_base, path)),
            _ => Err(format!("Object not found: {}", path)),
        }
    }

    async fn delete_by_url(&self, url: &str) -> Result<(), String> {
        let path = object_path_from_url(url)
            .ok_or_else(|| format!("Not a storage URL: {}", url))?;
        self.delete_by_path(&path).await
    }

    async fn delete_by_path(&self, path: &str) -> Result<(), String> {
        let full = self.resolve(path)?;
        tokio::fs::remove_file(&full).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => format!("Object not found: {}", path),
            _ => e.to_string(),
        })?;
        let _ = tokio::fs::remove_file(self.meta_path(path)).await;
        Ok(())
    }

    async fn list(&self, folder: &str) -> Result<Vec<String>, String> {
        let folder = folder.trim_matches('/');
        let dir = self.resolve(folder)?;
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(e) => e,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.to_string()),
        };

        let mut paths = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| e.to_string())? {
            let is_file = entry
                .file_type()
                .await
                .map(|t| t.is_file())
                .unwrap_or(false);
            if !is_file {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with('.') {
                continue;
            }
            paths.push(format!("{}/{}", folder, name));
        }
        paths.sort();
        Ok(paths)
    }

    async fn get(&self, path: &str) -> Result<Option<StoredObject>, String> {
        let full = self.resolve(path)?;
        let data = match tokio::fs::read(&full).await {
            Ok(d) => d,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.to_string()),
        };
        let content_type = match tokio::fs::read(self.meta_path(path)).await {
            Ok(raw) => serde_json::from_slice::<ObjectMeta>(&raw)
                .map(|m| m.content_type)
                .unwrap_or_else(|_| super::sniff_content_type(&data, None)),
            Err(_) => super::sniff_content_type(&data, None),
        };
        Ok(Some(StoredObject { data, content_type }))
    }
}
