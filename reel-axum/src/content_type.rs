use reel_blob::BlobObject;

/// Fallback for arbitrary files
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Fallback on the video entry point so players pick a sensible demuxer
pub const VIDEO_MP4: &str = "video/mp4";

/// Infer a MIME type from the filename extension
pub fn from_extension(filename: &str) -> Option<&'static str> {
    let (_, ext) = filename.rsplit_once('.')?;
    let mime = match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "avif" => "image/avif",
        "svg" => "image/svg+xml",
        "mp4" | "m4v" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "mkv" => "video/x-matroska",
        "ogv" => "video/ogg",
        "vtt" => "text/vtt",
        _ => return None,
    };
    Some(mime)
}

/// Stored metadata, then the filename extension, then `fallback`.
pub fn resolve_content_type(object: &BlobObject, fallback: &'static str) -> String {
    if let Some(stored) = object.content_type.as_deref().map(str::trim) {
        if !stored.is_empty() {
            return stored.to_string();
        }
    }

    object
        .filename
        .as_deref()
        .and_then(from_extension)
        .unwrap_or(fallback)
        .to_string()
}
