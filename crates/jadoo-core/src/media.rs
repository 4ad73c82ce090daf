//! Image media type inference.
//!
//! The description model only accepts JPEG and PNG. The type is inferred
//! from the URL path extension when possible (no download needed), and from
//! magic bytes once the image has been fetched.

use std::fmt;

/// Media type of an image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageMediaType {
    Jpeg,
    Png,
    /// Any other recognised image type, carried as its MIME string.
    Other(String),
}

impl ImageMediaType {
    /// Build from a MIME string such as `image/jpeg`.
    pub fn from_mime(mime: &str) -> Self {
        match mime.to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" | "image/pjpeg" => Self::Jpeg,
            "image/png" => Self::Png,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn mime_type(&self) -> &str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Other(mime) => mime,
        }
    }

    /// JPEG and PNG are accepted by the description stage.
    pub fn is_supported(&self) -> bool {
        matches!(self, Self::Jpeg | Self::Png)
    }
}

impl fmt::Display for ImageMediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime_type())
    }
}

/// Infer the media type from the extension of the URL path.
///
/// Query string and fragment are ignored, so signed storage URLs
/// (`.../car.jpg?token=...`) resolve correctly. Returns `None` when the path
/// has no recognised image extension.
pub fn media_type_from_url(url: &str) -> Option<ImageMediaType> {
    let without_fragment = url.split('#').next().unwrap_or(url);
    let without_query = without_fragment
        .split('?')
        .next()
        .unwrap_or(without_fragment);

    // Skip scheme and authority so a bare host like `example.com` is not
    // mistaken for a file name.
    let path = match without_query.split_once("://") {
        Some((_, rest)) => rest.split_once('/').map(|(_, p)| p)?,
        None => without_query,
    };

    let file_name = path.rsplit('/').next()?;
    let (_, ext) = file_name.rsplit_once('.')?;
    mime_from_extension(ext).map(ImageMediaType::from_mime)
}

/// Detect the media type of downloaded bytes via magic numbers.
pub fn detect_image_type(data: &[u8]) -> Option<ImageMediaType> {
    let kind = infer::get(data)?;
    if kind.matcher_type() != infer::MatcherType::Image {
        return None;
    }
    Some(ImageMediaType::from_mime(kind.mime_type()))
}

fn mime_from_extension(ext: &str) -> Option<&'static str> {
    match ext.to_lowercase().as_str() {
        "jpg" | "jpeg" | "jpe" | "jfif" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "bmp" => Some("image/bmp"),
        "tif" | "tiff" => Some("image/tiff"),
        "heic" => Some("image/heic"),
        "heif" => Some("image/heif"),
        "avif" => Some("image/avif"),
        "svg" => Some("image/svg+xml"),
        "ico" => Some("image/x-icon"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
    const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0, 0x10, b'J', b'F', b'I', b'F'];
    const GIF_MAGIC: &[u8] = b"GIF89a\x01\x00\x01\x00";

    #[test]
    fn test_media_type_from_url_extension() {
        assert_eq!(
            media_type_from_url("https://x/car.jpg"),
            Some(ImageMediaType::Jpeg)
        );
        assert_eq!(
            media_type_from_url("https://cdn.example.com/a/b/photo.PNG"),
            Some(ImageMediaType::Png)
        );
        assert_eq!(
            media_type_from_url("https://x/anim.gif"),
            Some(ImageMediaType::Other("image/gif".to_string()))
        );
    }

    #[test]
    fn test_media_type_ignores_query_and_fragment() {
        assert_eq!(
            media_type_from_url(
                "https://proj.supabase.co/storage/v1/object/sign/image-store/000000015440.jpg?token=abc.def"
            ),
            Some(ImageMediaType::Jpeg)
        );
        assert_eq!(
            media_type_from_url("https://x/pic.png#section"),
            Some(ImageMediaType::Png)
        );
    }

    #[test]
    fn test_media_type_unknown_extension() {
        assert_eq!(media_type_from_url("https://x/download.php?id=3"), None);
        assert_eq!(media_type_from_url("https://x/images/12345"), None);
        assert_eq!(media_type_from_url("https://example.com"), None);
        assert_eq!(media_type_from_url("https://example.com/"), None);
    }

    #[test]
    fn test_media_type_relative_path() {
        assert_eq!(
            media_type_from_url("image-store/cat.jpeg"),
            Some(ImageMediaType::Jpeg)
        );
    }

    #[test]
    fn test_detect_image_type_magic_bytes() {
        assert_eq!(detect_image_type(PNG_MAGIC), Some(ImageMediaType::Png));
        assert_eq!(detect_image_type(JPEG_MAGIC), Some(ImageMediaType::Jpeg));
        assert_eq!(
            detect_image_type(GIF_MAGIC),
            Some(ImageMediaType::Other("image/gif".to_string()))
        );
        assert_eq!(detect_image_type(b"plain text, not an image"), None);
        assert_eq!(detect_image_type(&[]), None);
    }

    #[test]
    fn test_supported_types() {
        assert!(ImageMediaType::Jpeg.is_supported());
        assert!(ImageMediaType::Png.is_supported());
        assert!(!ImageMediaType::from_mime("image/webp").is_supported());
        assert_eq!(ImageMediaType::from_mime("IMAGE/JPG"), ImageMediaType::Jpeg);
        assert_eq!(ImageMediaType::Png.to_string(), "image/png");
    }
}
