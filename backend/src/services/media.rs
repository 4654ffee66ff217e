//! Product image storage on the local filesystem

use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::error::{AppError, AppResult};

const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif"];

/// Lower-cased image extension of an uploaded file name, if allowed
pub fn image_extension(file_name: &str) -> Option<String> {
    let ext = Path::new(file_name).extension()?.to_str()?.to_ascii_lowercase();
    ALLOWED_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

/// Store an uploaded image under `media_dir/products/` and return the
/// public path served under `/media`.
pub async fn store_product_image(
    media_dir: &str,
    file_name: &str,
    bytes: &[u8],
) -> AppResult<String> {
    let ext = image_extension(file_name).ok_or_else(|| AppError::Validation {
        field: "image".to_string(),
        message: format!("Unsupported image type, use one of: {}", ALLOWED_EXTENSIONS.join(", ")),
        message_pt: "Formato de imagem não suportado".to_string(),
    })?;

    let dir = PathBuf::from(media_dir).join("products");
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| AppError::StorageError(e.to_string()))?;

    let stored_name = format!("{}.{}", Uuid::new_v4(), ext);
    tokio::fs::write(dir.join(&stored_name), bytes)
        .await
        .map_err(|e| AppError::StorageError(e.to_string()))?;

    Ok(format!("products/{}", stored_name))
}

/// Best-effort removal of a previously stored image
pub async fn remove_product_image(media_dir: &str, relative_path: &str) {
    if relative_path.contains("..") {
        return;
    }
    let path = PathBuf::from(media_dir).join(relative_path);
    if let Err(e) = tokio::fs::remove_file(&path).await {
        tracing::warn!(path = %path.display(), "Could not remove old image: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_extension() {
        assert_eq!(image_extension("photo.JPG"), Some("jpg".to_string()));
        assert_eq!(image_extension("photo.webp"), Some("webp".to_string()));
        assert_eq!(image_extension("script.sh"), None);
        assert_eq!(image_extension("noext"), None);
    }

    #[test]
    fn test_store_and_remove_image() {
        let dir = std::env::temp_dir().join(format!("storefront-media-{}", Uuid::new_v4()));
        let dir_str = dir.to_string_lossy().to_string();

        let stored = tokio_test::block_on(store_product_image(&dir_str, "cake.png", b"png"))
            .unwrap();
        assert!(stored.starts_with("products/"));
        assert!(stored.ends_with(".png"));
        assert!(dir.join(&stored).exists());

        tokio_test::block_on(remove_product_image(&dir_str, &stored));
        assert!(!dir.join(&stored).exists());
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn test_rejects_unknown_type() {
        let result = tokio_test::block_on(store_product_image("/tmp", "doc.pdf", b"%PDF"));
        assert!(matches!(result, Err(AppError::Validation { .. })));
    }
}
