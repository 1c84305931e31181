//! Image file reading and decoding shared by the preview and result paths.

use std::path::Path;

const PREVIEW_MAX_DIMENSION: u32 = 512;
const RESULT_MAX_DIMENSION: u32 = 1024;

/// Decoded RGBA pixels ready to become an egui texture.
#[derive(Debug, Clone)]
pub struct PreviewImage {
    pub width: usize,
    pub height: usize,
    pub rgba: Vec<u8>,
}

/// A card as received from the backend plus its decoded pixels.
pub struct GeneratedCard {
    pub bytes: Vec<u8>,
    pub image: PreviewImage,
}

pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            matches!(
                ext.to_ascii_lowercase().as_str(),
                "png" | "jpg" | "jpeg" | "gif" | "webp" | "bmp"
            )
        })
        .unwrap_or(false)
}

pub fn decode_image(bytes: &[u8], max_dimension: u32) -> Result<PreviewImage, String> {
    let dynamic = image::load_from_memory(bytes).map_err(|err| err.to_string())?;
    let resized = if dynamic.width() > max_dimension || dynamic.height() > max_dimension {
        dynamic.thumbnail(max_dimension, max_dimension).to_rgba8()
    } else {
        dynamic.to_rgba8()
    };
    let width = resized.width() as usize;
    let height = resized.height() as usize;
    Ok(PreviewImage {
        width,
        height,
        rgba: resized.into_raw(),
    })
}

pub async fn load_preview(path: &Path) -> Result<PreviewImage, String> {
    let bytes = tokio::fs::read(path).await.map_err(|err| err.to_string())?;
    tokio::task::spawn_blocking(move || decode_image(&bytes, PREVIEW_MAX_DIMENSION))
        .await
        .map_err(|err| err.to_string())?
}

pub async fn decode_card(bytes: Vec<u8>) -> Result<GeneratedCard, String> {
    tokio::task::spawn_blocking(move || {
        let image = decode_image(&bytes, RESULT_MAX_DIMENSION)?;
        Ok(GeneratedCard { bytes, image })
    })
    .await
    .map_err(|err| err.to_string())?
}
