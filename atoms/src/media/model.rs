use serde::Serialize;

/// Response to a profile image upload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedImage {
    pub image_url: String,
}

/// Bytes read back from the upload bucket.
#[derive(Debug)]
pub struct StoredImage {
    pub content_type: String,
    pub bytes: Vec<u8>,
}
