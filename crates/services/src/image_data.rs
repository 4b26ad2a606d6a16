//! Helpers for image references stored as `data:` URIs.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ImageDataError {
    #[error("image reference is not a base64 data URI")]
    NotADataUri,

    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("image could not be decoded: {0}")]
    Decode(#[from] image::ImageError),

    #[error("failed to write image: {0}")]
    Io(#[from] std::io::Error),
}

/// Decoded `data:` URI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

pub fn decode_data_uri(uri: &str) -> Result<DataUri, ImageDataError> {
    let rest = uri.strip_prefix("data:").ok_or(ImageDataError::NotADataUri)?;
    let (header, payload) = rest.split_once(',').ok_or(ImageDataError::NotADataUri)?;
    let mime_type = header
        .strip_suffix(";base64")
        .ok_or(ImageDataError::NotADataUri)?;
    let bytes = BASE64.decode(payload.trim())?;
    Ok(DataUri {
        mime_type: mime_type.to_string(),
        bytes,
    })
}

/// Fails when the reference would not render: not a data URI, bad base64, or
/// bytes the decoder rejects.
pub fn check_renderable(uri: &str) -> Result<(), ImageDataError> {
    let data = decode_data_uri(uri)?;
    image::load_from_memory(&data.bytes)?;
    Ok(())
}

/// Write the image to `dir/file_name`, returning the full path
pub fn export_to(uri: &str, dir: &Path, file_name: &str) -> Result<PathBuf, ImageDataError> {
    let data = decode_data_uri(uri)?;
    std::fs::create_dir_all(dir)?;
    let path = dir.join(file_name);
    std::fs::write(&path, &data.bytes)?;
    Ok(path)
}

#[cfg(test)]
pub(crate) fn png_data_uri() -> String {
    let img = image::DynamicImage::ImageRgb8(image::RgbImage::new(2, 2));
    let mut bytes = Vec::new();
    img.write_to(
        &mut std::io::Cursor::new(&mut bytes),
        image::ImageOutputFormat::Png,
    )
    .unwrap();
    format!("data:image/png;base64,{}", BASE64.encode(bytes))
}
