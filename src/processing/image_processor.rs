use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{DynamicImage, GrayImage, ImageFormat};
use log::{debug, info};
use std::io::Cursor;
use std::path::Path;
use tempfile::NamedTempFile;

use crate::models::SourceImage;
use crate::utils::ScanError;

/// Media types accepted by the file picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Jpeg,
    Jpg, // non-standard alias some browsers report
    Png,
}

impl MediaType {
    /// Matches a declared media type against the allow-list. Parameters such as
    /// `; charset=...` are ignored.
    pub fn parse(declared: &str) -> Result<Self, ScanError> {
        let essence = declared
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match essence.as_str() {
            "image/jpeg" => Ok(MediaType::Jpeg),
            "image/jpg" => Ok(MediaType::Jpg),
            "image/png" => Ok(MediaType::Png),
            _ => Err(ScanError::UnsupportedMediaType(declared.trim().to_string())),
        }
    }

    pub fn image_format(&self) -> ImageFormat {
        match self {
            MediaType::Jpeg | MediaType::Jpg => ImageFormat::Jpeg,
            MediaType::Png => ImageFormat::Png,
        }
    }

    /// Best guess of the media type a browser would declare for a file name.
    pub fn guess_from_extension(path: &Path) -> &'static str {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "jpeg" => "image/jpeg",
            "jpg" => "image/jpg",
            "png" => "image/png",
            "gif" => "image/gif",
            "webp" => "image/webp",
            "bmp" => "image/bmp",
            "tif" | "tiff" => "image/tiff",
            "pdf" => "application/pdf",
            _ => "application/octet-stream",
        }
    }
}

/// A file blob with the media type its origin declared for it.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub name: Option<String>,
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn new(media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        ImageUpload {
            name: None,
            media_type: media_type.into(),
            bytes,
        }
    }

    /// Reads a file, declaring its media type from the extension the way a
    /// file picker does.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ScanError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        Ok(ImageUpload {
            name: path.file_name().map(|n| n.to_string_lossy().into_owned()),
            media_type: MediaType::guess_from_extension(path).to_string(),
            bytes,
        })
    }

    /// Parses `data:<media type>;base64,<payload>` as produced by browser file readers.
    pub fn from_data_url(url: &str) -> Result<Self, ScanError> {
        let rest = url
            .trim()
            .strip_prefix("data:")
            .ok_or_else(|| ScanError::ImageDecode("Not a data URL".to_string()))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| ScanError::ImageDecode("Data URL has no payload".to_string()))?;
        let media_type = header
            .strip_suffix(";base64")
            .ok_or_else(|| ScanError::ImageDecode("Data URL is not base64 encoded".to_string()))?;
        let bytes = STANDARD
            .decode(payload.trim())
            .map_err(|e| ScanError::ImageDecode(format!("Invalid base64 payload: {}", e)))?;
        Ok(ImageUpload::new(media_type, bytes))
    }
}

/// Acquisition and encoding helpers around the `image` crate.
pub struct ImageProcessor;

impl ImageProcessor {
    /// Validates the declared media type and decodes the blob into a raster image.
    pub fn decode(upload: &ImageUpload) -> Result<SourceImage, ScanError> {
        let media_type = MediaType::parse(&upload.media_type)?;
        let image = image::load_from_memory_with_format(&upload.bytes, media_type.image_format())
            .map_err(|e| ScanError::ImageDecode(format!("Failed to decode image: {}", e)))?;

        info!(
            "Decoded {} ({}x{}, {})",
            upload.name.as_deref().unwrap_or("upload"),
            image.width(),
            image.height(),
            upload.media_type
        );
        Ok(SourceImage::new(image.to_rgba8()))
    }

    pub fn encode_png(image: DynamicImage) -> Result<Vec<u8>, ScanError> {
        let mut buffer = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .map_err(|e| ScanError::ImageEncode(format!("Failed to encode image: {}", e)))?;
        Ok(buffer)
    }

    /// Writes a grayscale image to a local temporary PNG that lives as long as
    /// the returned handle.
    pub fn save_to_temp_file(image: &GrayImage) -> Result<NamedTempFile, ScanError> {
        let temp_file = tempfile::Builder::new().suffix(".png").tempfile()?;
        image
            .save_with_format(temp_file.path(), ImageFormat::Png)
            .map_err(|e| ScanError::ImageEncode(format!("Failed to write temp image: {}", e)))?;
        debug!("Wrote temp image {:?}", temp_file.path());
        Ok(temp_file)
    }
}
