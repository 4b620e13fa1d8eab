//! Attachment classification by file extension.

use std::path::Path;

/// Broad category of an attached file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Audio,
    Video,
    /// Plain text or source code that can be inlined into the prompt.
    Text,
    Other,
}

impl MediaKind {
    /// Classify a file by its extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "png" | "jpeg" | "jpg" | "webp" | "gif" | "heic" | "heif" => MediaKind::Image,
            "wav" | "mp3" | "flac" | "aac" | "m4a" | "ogg" | "opus" => MediaKind::Audio,
            "mp4" | "mpeg" | "mov" | "avi" | "flv" | "mpg" | "webm" | "wmv" | "3gp" | "3gpp" => {
                MediaKind::Video
            }
            "txt" | "md" | "csv" | "tsv" | "json" | "jsonl" | "xml" | "html" | "htm" | "py"
            | "rs" | "js" | "ts" | "java" | "c" | "cpp" | "h" | "sh" | "yaml" | "yml" | "toml"
            | "sql" => MediaKind::Text,
            _ => MediaKind::Other,
        }
    }

    /// Classify a file by name.
    pub fn from_file_name(name: &str) -> Self {
        Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(Self::from_extension)
            .unwrap_or(MediaKind::Other)
    }
}

/// MIME type for an image file name, used to build `data:` URLs.
pub fn image_mime_type(name: &str) -> &'static str {
    let ext = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "heic" => "image/heic",
        "heif" => "image/heif",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert_eq!(MediaKind::from_file_name("chess.PNG"), MediaKind::Image);
        assert_eq!(MediaKind::from_file_name("recipe.mp3"), MediaKind::Audio);
        assert_eq!(MediaKind::from_file_name("clip.mov"), MediaKind::Video);
        assert_eq!(MediaKind::from_file_name("code.py"), MediaKind::Text);
        assert_eq!(MediaKind::from_file_name("sales.xlsx"), MediaKind::Other);
        assert_eq!(MediaKind::from_file_name("README"), MediaKind::Other);
    }

    #[test]
    fn test_image_mime_type() {
        assert_eq!(image_mime_type("a.jpg"), "image/jpeg");
        assert_eq!(image_mime_type("a.PNG"), "image/png");
        assert_eq!(image_mime_type("a.bin"), "application/octet-stream");
    }
}
