//! Response types for the upload and administrative endpoints.
//!
//! Fields the service may omit are optional. Unknown fields are ignored.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Result of `upload`, `explicit` and `rename`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UploadResult {
    pub public_id: String,
    #[serde(default)]
    pub version: Option<u64>,
    #[serde(default)]
    pub signature: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub resource_type: Option<String>,
    #[serde(default, rename = "type")]
    pub delivery_type: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub bytes: Option<u64>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub secure_url: Option<String>,
    #[serde(default)]
    pub etag: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub original_filename: Option<String>,
    #[serde(default)]
    pub delete_token: Option<String>,
    #[serde(default)]
    pub eager: Vec<EagerResult>,
    #[serde(default)]
    pub context: Option<serde_json::Value>,
    #[serde(default)]
    pub placeholder: Option<bool>,
}

pub type ExplicitResult = UploadResult;
pub type RenameResult = UploadResult;

/// A derived version generated eagerly.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EagerResult {
    #[serde(default)]
    pub transformation: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub secure_url: Option<String>,
}

/// `destroy` result: `"ok"` or `"not found"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DestroyResult {
    pub result: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteByTokenResult {
    pub result: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagResult {
    #[serde(default)]
    pub public_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplodeResult {
    pub status: String,
    #[serde(default)]
    pub batch_id: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SpriteImageInfo {
    pub width: u32,
    pub height: u32,
    pub x: u32,
    pub y: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpriteResult {
    pub public_id: String,
    #[serde(default)]
    pub version: Option<u64>,
    #[serde(default)]
    pub css_url: Option<String>,
    #[serde(default)]
    pub secure_css_url: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub json_url: Option<String>,
    #[serde(default)]
    pub image_infos: HashMap<String, SpriteImageInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultiResult {
    pub public_id: String,
    #[serde(default)]
    pub version: Option<u64>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub secure_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextResult {
    pub width: u32,
    pub height: u32,
}

/// `{"error": {"message": "..."}}`
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_result_parses_service_response() {
        let body = r#"{
            "public_id": "sample",
            "version": 1312461204,
            "signature": "abcdefgc024acceb1c5baa8dca46797137fa5ae0c3",
            "width": 864,
            "height": 576,
            "format": "jpg",
            "resource_type": "image",
            "type": "upload",
            "created_at": "2017-08-11T12:24:32Z",
            "bytes": 120253,
            "tags": ["summer"],
            "url": "http://res.cloudinary.com/demo/image/upload/v1312461204/sample.jpg",
            "secure_url": "https://res.cloudinary.com/demo/image/upload/v1312461204/sample.jpg",
            "eager": [{"transformation": "w_50", "width": 50, "height": 33}],
            "unknown_field": {"ignored": true}
        }"#;
        let result: UploadResult = serde_json::from_str(body).unwrap();
        assert_eq!(result.public_id, "sample");
        assert_eq!(result.version, Some(1312461204));
        assert_eq!(result.delivery_type.as_deref(), Some("upload"));
        assert_eq!(result.tags, vec!["summer"]);
        assert_eq!(result.eager[0].transformation.as_deref(), Some("w_50"));
        assert!(result.delete_token.is_none());
    }

    #[test]
    fn test_sprite_result() {
        let body = r#"{
            "public_id": "sprite_logo",
            "version": 1,
            "css_url": "http://res.cloudinary.com/demo/image/sprite/v1/logo.css",
            "image_infos": {"logo1": {"width": 10, "height": 20, "x": 0, "y": 0}}
        }"#;
        let result: SpriteResult = serde_json::from_str(body).unwrap();
        assert_eq!(result.image_infos["logo1"].height, 20);
    }

    #[test]
    fn test_error_envelope() {
        let body = r#"{"error": {"message": "Invalid Signature", "http_code": 401}}"#;
        let envelope: ErrorEnvelope = serde_json::from_str(body).unwrap();
        assert_eq!(envelope.error.message, "Invalid Signature");
    }
}
