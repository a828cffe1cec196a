use aws_sdk_s3::Client as S3Client;
use lambda_http::{http::StatusCode, Body, Response};

use super::model::UploadedImage;
use super::service::{fetch_image, sniff_content_type, store_image, upload_name};
use crate::error::ApiError;
use crate::http::{json_response, HandlerResult};

/// POST /api/auth/upload-image
///
/// The body is the raw image; `file_name` comes from the `X-File-Name` header.
pub async fn upload_image_handler(
    s3_client: &S3Client,
    bucket: &str,
    public_base_url: &str,
    file_name: Option<&str>,
    body: &[u8],
) -> HandlerResult {
    if body.is_empty() {
        return Err(ApiError::bad_request("No file uploaded"));
    }
    let content_type = sniff_content_type(body)?;
    let name = upload_name(
        chrono::Utc::now().timestamp_millis(),
        file_name.unwrap_or("image"),
    );

    store_image(s3_client, bucket, &name, content_type, body.to_vec()).await?;
    tracing::info!("Stored upload {} ({} bytes)", name, body.len());

    let image_url = format!("{}/uploads/{}", public_base_url.trim_end_matches('/'), name);
    json_response(StatusCode::OK, &UploadedImage { image_url })
}

/// GET /uploads/{name}
pub async fn serve_image_handler(s3_client: &S3Client, bucket: &str, name: &str) -> HandlerResult {
    let image = fetch_image(s3_client, bucket, name).await?;
    Ok(Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", image.content_type)
        .header("Cache-Control", "public, max-age=86400")
        .body(Body::Binary(image.bytes))?)
}
