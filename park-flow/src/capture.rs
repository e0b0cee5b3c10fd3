use std::path::Path;

use crate::error::{ParkError, Result};
use crate::models::Photo;

/// Content type for an image file, judged by its extension.
pub fn image_content_type(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "heic" => "image/heic",
        "heif" => "image/heif",
        _ => return None,
    };
    Some(mime)
}

/// Load an image from disk as a [`Photo`]. Only image files are accepted.
pub async fn photo_from_path(path: impl AsRef<Path>) -> Result<Photo> {
    let path = path.as_ref();
    let content_type = image_content_type(path)
        .ok_or_else(|| ParkError::Capture(format!("{} is not an image file", path.display())))?;

    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| ParkError::Capture(format!("cannot read {}: {e}", path.display())))?;
    if bytes.is_empty() {
        return Err(ParkError::Capture(format!("{} is empty", path.display())));
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "photo".to_string());

    Ok(Photo::new(file_name, content_type, bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognises_image_extensions() {
        assert_eq!(image_content_type(Path::new("car.JPG")), Some("image/jpeg"));
        assert_eq!(image_content_type(Path::new("spot.png")), Some("image/png"));
        assert_eq!(image_content_type(Path::new("notes.txt")), None);
        assert_eq!(image_content_type(Path::new("noext")), None);
    }

    #[tokio::test]
    async fn reads_photo_from_disk() {
        let path = std::env::temp_dir().join(format!("park-flow-{}.jpg", uuid::Uuid::new_v4()));
        tokio::fs::write(&path, b"\xFF\xD8\xFFfake").await.unwrap();

        let photo = photo_from_path(&path).await.unwrap();
        assert_eq!(photo.content_type, "image/jpeg");
        assert_eq!(photo.len(), 7);

        tokio::fs::remove_file(&path).await.unwrap();
    }

    #[tokio::test]
    async fn rejects_non_images() {
        let err = photo_from_path("/tmp/whatever.txt").await.unwrap_err();
        assert!(matches!(err, ParkError::Capture(_)));
    }
}
