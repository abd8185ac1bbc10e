use crate::ai::mime;
use crate::{Error, Result};
use chrono::Utc;
use image::ImageFormat;
use std::io::{Cursor, ErrorKind};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

const TEMP_SUFFIX: &str = ".tmp";

/// Directory-backed store for generated PNGs.
#[derive(Debug, Clone)]
pub struct ImageStore {
    dir: PathBuf,
}

impl ImageStore {
    /// Open the store, creating `dir` if it does not exist yet.
    pub fn new(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persist image bytes as PNG and return the new file name.
    ///
    /// The file is written to a temporary sibling and renamed into place, so
    /// a reader never sees a partially written image under its final name.
    pub async fn save(&self, image_data: &[u8]) -> Result<String> {
        let png = to_png(image_data).await?;

        let filename = new_filename();
        let final_path = self.dir.join(&filename);
        let temp_path = self.dir.join(format!(".{}{}", filename, TEMP_SUFFIX));

        tokio::fs::write(&temp_path, &png).await?;
        if let Err(e) = tokio::fs::rename(&temp_path, &final_path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        info!("Saved image {} ({} bytes)", final_path.display(), png.len());
        Ok(filename)
    }

    /// Read a stored image; `None` when it does not exist.
    ///
    /// Only bare file names are looked up. Anything that could resolve
    /// outside the store directory, or a hidden temporary file, is treated as
    /// absent.
    pub async fn load(&self, filename: &str) -> Result<Option<Vec<u8>>> {
        let Some(path) = self.path_for(filename) else {
            debug!("Rejected image name {:?}", filename);
            return Ok(None);
        };

        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Resolve `filename` inside the store, if it is a plain file name.
    pub fn path_for(&self, filename: &str) -> Option<PathBuf> {
        if filename.is_empty() || filename.starts_with('.') || filename.contains('\\') {
            return None;
        }

        let mut components = Path::new(filename).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(name)), None) => Some(self.dir.join(name)),
            _ => None,
        }
    }
}

fn new_filename() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("image_{}_{}.png", Utc::now().timestamp_millis(), &suffix[..8])
}

/// Pass PNG through untouched; re-encode anything else `image` can decode.
async fn to_png(image_data: &[u8]) -> Result<Vec<u8>> {
    if mime::is_png(image_data) {
        return Ok(image_data.to_vec());
    }

    let image_data = image_data.to_vec();
    tokio::task::spawn_blocking(move || -> Result<Vec<u8>> {
        let img = image::load_from_memory(&image_data)?;
        let mut png = Vec::new();
        img.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
        Ok(png)
    })
    .await
    .map_err(|e| Error::Invariant(format!("Image encoding task join error: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::mock::TINY_PNG;
    use tempfile::TempDir;

    fn create_test_jpeg() -> Vec<u8> {
        let img = image::RgbImage::from_pixel(10, 10, image::Rgb([255, 0, 0]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Jpeg)
            .unwrap();
        bytes
    }

    fn test_store() -> (TempDir, ImageStore) {
        let dir = TempDir::new().unwrap();
        let store = ImageStore::new(&dir.path().join("images")).unwrap();
        (dir, store)
    }

    #[test]
    fn test_new_creates_directory() {
        let (dir, _store) = test_store();
        assert!(dir.path().join("images").is_dir());
    }

    #[tokio::test]
    async fn test_save_png_roundtrip() {
        let (_dir, store) = test_store();

        let filename = store.save(TINY_PNG).await.unwrap();
        assert!(filename.starts_with("image_"));
        assert!(filename.ends_with(".png"));

        let loaded = store.load(&filename).await.unwrap().unwrap();
        assert_eq!(loaded, TINY_PNG);
    }

    #[tokio::test]
    async fn test_save_converts_jpeg_to_png() {
        let (_dir, store) = test_store();

        let filename = store.save(&create_test_jpeg()).await.unwrap();
        let loaded = store.load(&filename).await.unwrap().unwrap();
        assert!(mime::is_png(&loaded));

        let decoded = image::load_from_memory(&loaded).unwrap();
        assert_eq!(decoded.width(), 10);
        assert_eq!(decoded.height(), 10);
    }

    #[tokio::test]
    async fn test_save_rejects_undecodable_bytes() {
        let (_dir, store) = test_store();
        let err = store.save(b"definitely not an image").await.unwrap_err();
        assert!(matches!(err, Error::Image(_)));
    }

    #[tokio::test]
    async fn test_unique_filenames_and_no_temp_files_left() {
        let (_dir, store) = test_store();

        let first = store.save(TINY_PNG).await.unwrap();
        let second = store.save(TINY_PNG).await.unwrap();
        assert_ne!(first, second);

        let leftovers: Vec<_> = std::fs::read_dir(store.dir())
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().ends_with(TEMP_SUFFIX))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn test_load_missing_returns_none() {
        let (_dir, store) = test_store();
        assert!(store.load("image_0_00000000.png").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_load_rejects_paths_outside_store() {
        let (dir, store) = test_store();
        std::fs::write(dir.path().join("secret.txt"), b"secret").unwrap();

        assert!(store.load("../secret.txt").await.unwrap().is_none());
        assert!(store.load("nested/secret.txt").await.unwrap().is_none());
        assert!(store.load("..").await.unwrap().is_none());
        assert!(store.load(".hidden.png.tmp").await.unwrap().is_none());
        assert!(store.load("").await.unwrap().is_none());
    }

    #[test]
    fn test_path_for_plain_name() {
        let (_dir, store) = test_store();
        let path = store.path_for("image_1_abcdef01.png").unwrap();
        assert_eq!(path, store.dir().join("image_1_abcdef01.png"));
    }
}
