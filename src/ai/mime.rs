/// Identify an image format from its magic number.
pub fn sniff_image_mime(bytes: &[u8]) -> Option<&'static str> {
    match bytes {
        [0x89, 0x50, 0x4E, 0x47, ..] => Some("image/png"),
        [0xFF, 0xD8, 0xFF, ..] => Some("image/jpeg"),
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => Some("image/webp"),
        [0x47, 0x49, 0x46, 0x38, ..] => Some("image/gif"),
        _ => None,
    }
}

/// Content type to serve stored bytes with; PNG is what the store writes.
pub fn content_type_for(bytes: &[u8]) -> &'static str {
    sniff_image_mime(bytes).unwrap_or_else(|| {
        tracing::warn!(
            "Unrecognized image format (first 4 bytes: {:02X?}), serving as image/png",
            &bytes[..bytes.len().min(4)]
        );
        "image/png"
    })
}

pub fn is_png(bytes: &[u8]) -> bool {
    sniff_image_mime(bytes) == Some("image/png")
}
