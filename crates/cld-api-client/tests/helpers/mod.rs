#![allow(dead_code)]

use cld_api_client::ApiClient;
use cld_core::Configuration;
use mockito::Matcher;

pub const CLOUD: &str = "demo";
pub const API_KEY: &str = "1234";
pub const API_SECRET: &str = "abcd";

/// Client with credentials pointed at the mock server.
pub fn signed_client(server: &mockito::ServerGuard) -> ApiClient {
    signed_client_at(&server.url())
}

/// Client with credentials pointed at `upload_prefix`.
pub fn signed_client_at(upload_prefix: &str) -> ApiClient {
    ApiClient::new(
        Configuration::new(CLOUD)
            .with_credentials(API_KEY, API_SECRET)
            .with_upload_prefix(upload_prefix),
    )
    .unwrap()
}

/// Client with a cloud name only.
pub fn anonymous_client(server: &mockito::ServerGuard) -> ApiClient {
    ApiClient::new(Configuration::new(CLOUD).with_upload_prefix(server.url())).unwrap()
}

pub fn client_with(server: &mockito::ServerGuard, config: Configuration) -> ApiClient {
    ApiClient::new(config.with_upload_prefix(server.url())).unwrap()
}

/// Matches a multipart text field `name` with exactly `value`.
pub fn form_field(name: &str, value: &str) -> Matcher {
    Matcher::Regex(format!(
        "name=\"{}\"\r\n\r\n{}\r\n",
        regex::escape(name),
        regex::escape(value)
    ))
}

/// Matches the presence of a multipart field, whatever its value.
pub fn has_field(name: &str) -> Matcher {
    Matcher::Regex(format!("name=\"{}\"", regex::escape(name)))
}

pub fn upload_response(public_id: &str) -> String {
    serde_json::json!({
        "public_id": public_id,
        "version": 1312461204,
        "width": 1,
        "height": 1,
        "format": "png",
        "resource_type": "image",
        "type": "upload",
        "bytes": 25,
        "url": format!("http://res.cloudinary.com/demo/image/upload/v1312461204/{}.png", public_id),
        "secure_url": format!("https://res.cloudinary.com/demo/image/upload/v1312461204/{}.png", public_id),
    })
    .to_string()
}
