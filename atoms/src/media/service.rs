use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use image::ImageFormat;

use super::model::StoredImage;
use crate::error::ApiError;

const UPLOAD_PREFIX: &str = "uploads/";

/// Only PNG and JPEG are accepted; the format is sniffed from the bytes,
/// not trusted from the filename.
pub fn sniff_content_type(bytes: &[u8]) -> Result<&'static str, ApiError> {
    match image::guess_format(bytes) {
        Ok(ImageFormat::Png) => Ok("image/png"),
        Ok(ImageFormat::Jpeg) => Ok("image/jpeg"),
        _ => Err(ApiError::bad_request("Only .jpeg .jpg and .png formats are allowed")),
    }
}

/// Keep the original name readable but safe as an S3 key and URL segment.
pub fn sanitize_file_name(raw: &str) -> String {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or(raw);
    let cleaned: String = base
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '-' })
        .collect();
    let cleaned = cleaned.trim_matches('.').to_string();
    if cleaned.is_empty() {
        "image".to_string()
    } else {
        cleaned
    }
}

/// `{unix-millis}-{name}`. Two uploads with the same name in the same
/// millisecond collide; the later one wins.
pub fn upload_name(millis: i64, raw_file_name: &str) -> String {
    format!("{}-{}", millis, sanitize_file_name(raw_file_name))
}

pub async fn store_image(
    s3_client: &S3Client,
    bucket: &str,
    name: &str,
    content_type: &str,
    bytes: Vec<u8>,
) -> Result<(), ApiError> {
    s3_client
        .put_object()
        .bucket(bucket)
        .key(format!("{}{}", UPLOAD_PREFIX, name))
        .content_type(content_type)
        .body(ByteStream::from(bytes))
        .send()
        .await
        .map_err(|e| ApiError::storage("put_object", e))?;
    Ok(())
}

pub async fn fetch_image(s3_client: &S3Client, bucket: &str, name: &str) -> Result<StoredImage, ApiError> {
    let resp = s3_client
        .get_object()
        .bucket(bucket)
        .key(format!("{}{}", UPLOAD_PREFIX, name))
        .send()
        .await
        .map_err(|e| {
            if e.as_service_error().map(|se| se.is_no_such_key()).unwrap_or(false) {
                ApiError::not_found("Image not found")
            } else {
                ApiError::storage("get_object", e)
            }
        })?;

    let content_type = resp
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();
    let bytes = resp
        .body
        .collect()
        .await
        .map_err(|e| ApiError::internal("Server Error", e))?
        .into_bytes()
        .to_vec();

    Ok(StoredImage { content_type, bytes })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
    const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0, 0x10, b'J', b'F', b'I', b'F'];

    #[test]
    fn only_png_and_jpeg_pass() {
        assert_eq!(sniff_content_type(PNG_MAGIC).unwrap(), "image/png");
        assert_eq!(sniff_content_type(JPEG_MAGIC).unwrap(), "image/jpeg");
        assert!(sniff_content_type(b"GIF89a......").is_err());
        assert!(sniff_content_type(b"%PDF-1.7").is_err());
        assert!(sniff_content_type(b"").is_err());
    }

    #[test]
    fn file_names_are_sanitized() {
        assert_eq!(sanitize_file_name("me.png"), "me.png");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\pics\\my photo.jpg"), "my-photo.jpg");
        assert_eq!(sanitize_file_name(".."), "image");
    }

    #[test]
    fn upload_names_are_prefixed_with_time() {
        assert_eq!(upload_name(1700000000000, "avatar.png"), "1700000000000-avatar.png");
    }
}
