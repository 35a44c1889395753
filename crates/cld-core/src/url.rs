//! Delivery URL builder.
//!
//! Combines the configuration (host selection), a compiled transformation and
//! the asset identifier into a delivery URL:
//! `https://<host>/<cloud>/<resource_type>/<type>/<signature>/<transformation>/<version>/<public_id>.<format>`.
//! Empty segments are dropped. Building a URL is pure and performs no I/O.

use std::sync::OnceLock;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use regex::Regex;

use crate::config::Configuration;
use crate::error::{CloudinaryError, Result};
use crate::signature;
use crate::transformation::{Transformation, TransformationChain};

const SHARED_CDN: &str = "res.cloudinary.com";
const OLD_AKAMAI_SHARED_CDN: &str = "cloudinary-a.akamaihd.net";

/// Characters escaped in public ids and text captions.
const SMART_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'!')
    .add(b'"')
    .add(b'#')
    .add(b'$')
    .add(b'%')
    .add(b'&')
    .add(b'\'')
    .add(b'(')
    .add(b')')
    .add(b'*')
    .add(b'+')
    .add(b',')
    .add(b';')
    .add(b'=')
    .add(b'?')
    .add(b'@')
    .add(b'[')
    .add(b']');

/// Percent-escape the characters that would break a delivery URL path.
/// `/` and `:` are kept so folders and fetch URLs stay readable.
pub fn smart_encode(value: &str) -> String {
    utf8_percent_encode(value, SMART_ENCODE_SET).to_string()
}

/// Builder for delivery URLs. Defaults to `image/upload`.
#[derive(Debug, Clone)]
pub struct UrlBuilder<'a> {
    config: &'a Configuration,
    resource_type: String,
    delivery_type: String,
    format: Option<String>,
    version: Option<String>,
    transformation: TransformationChain,
    suffix: Option<String>,
    use_root_path: bool,
    shorten: bool,
    sign_url: bool,
    force_version: bool,
}

impl<'a> UrlBuilder<'a> {
    pub fn new(config: &'a Configuration) -> Self {
        Self {
            config,
            resource_type: "image".to_string(),
            delivery_type: "upload".to_string(),
            format: None,
            version: None,
            transformation: TransformationChain::new(),
            suffix: None,
            use_root_path: false,
            shorten: false,
            sign_url: false,
            force_version: true,
        }
    }

    pub fn resource_type(mut self, resource_type: &str) -> Self {
        self.resource_type = resource_type.to_string();
        self
    }

    /// `upload`, `private`, `authenticated`, `fetch`, ...
    pub fn delivery_type(mut self, delivery_type: &str) -> Self {
        self.delivery_type = delivery_type.to_string();
        self
    }

    pub fn format(mut self, format: &str) -> Self {
        self.format = if format.is_empty() {
            None
        } else {
            Some(format.to_string())
        };
        self
    }

    pub fn version(mut self, version: impl ToString) -> Self {
        self.version = Some(version.to_string());
        self
    }

    pub fn transformation(mut self, transformation: impl Into<TransformationChain>) -> Self {
        self.transformation = transformation.into();
        self
    }

    /// An already compiled transformation segment, used verbatim.
    pub fn transformation_segment(self, segment: &str) -> Self {
        self.transformation(Transformation::new().raw_transformation(segment))
    }

    /// SEO suffix appended to the public id. Private CDN only.
    pub fn suffix(mut self, suffix: &str) -> Self {
        self.suffix = Some(suffix.to_string());
        self
    }

    pub fn use_root_path(mut self, use_root_path: bool) -> Self {
        self.use_root_path = use_root_path;
        self
    }

    pub fn shorten(mut self, shorten: bool) -> Self {
        self.shorten = shorten;
        self
    }

    pub fn sign_url(mut self, sign_url: bool) -> Self {
        self.sign_url = sign_url;
        self
    }

    /// Add `v1` to ids in folders when no version is given. On by default.
    pub fn force_version(mut self, force_version: bool) -> Self {
        self.force_version = force_version;
        self
    }

    pub fn build(&self, public_id: &str) -> Result<String> {
        self.config.validate()?;
        if public_id.is_empty() {
            return Err(CloudinaryError::invalid("public_id must not be empty"));
        }
        let secret = if self.sign_url {
            Some(self.config.api_secret().ok_or_else(|| {
                CloudinaryError::config("Must supply api_secret for signing urls")
            })?)
        } else {
            None
        };

        let mut source = public_id.to_string();
        let mut resource_type = self.resource_type.clone();
        let mut delivery_type = self.delivery_type.clone();
        let mut version = self.version.clone().unwrap_or_default();
        let mut format = self.format.clone();

        if let Some(preloaded) = Preloaded::parse(public_id) {
            resource_type = preloaded.resource_type.to_string();
            delivery_type = preloaded.delivery_type.to_string();
            version = preloaded.version.to_string();
            source = preloaded.public_id.to_string();
        }

        let mut chain = self.transformation.clone();
        if delivery_type == "fetch" {
            if let Some(fetch_format) = format.take() {
                chain = with_fetch_format(chain, &fetch_format);
            }
        }
        let transformation = chain.compile()?;

        let absolute = is_absolute_url(&source);
        if version.is_empty() && self.force_version && source.contains('/') && !absolute && !is_versioned(&source) {
            version = "1".to_string();
        }
        if !version.is_empty() {
            version = format!("v{}", version);
        }

        let mut to_sign = String::new();
        if !transformation.is_empty() {
            to_sign.push_str(&transformation);
            to_sign.push('/');
        }

        if absolute {
            source = smart_encode(&source);
            to_sign.push_str(&source);
        } else {
            source = smart_encode(&percent_decode_str(&source).decode_utf8_lossy());
            to_sign.push_str(&source);

            if let Some(suffix) = self.suffix.as_deref().filter(|s| !s.is_empty()) {
                if suffix.contains('.') || suffix.contains('/') {
                    return Err(CloudinaryError::invalid("URL suffix must not contain '.' or '/'"));
                }
                source = format!("{}/{}", source, suffix);
            }
            if let Some(format) = format.as_deref() {
                source = format!("{}.{}", source, format);
                to_sign.push('.');
                to_sign.push_str(format);
            }
        }

        let prefix = self.host_prefix(&source);
        let path_type = self.resource_path(&resource_type, &delivery_type)?;

        let signature = match secret {
            Some(secret) => format!(
                "s--{}--",
                signature::url_signature(&to_sign, secret, self.config.long_url_signature())
            ),
            None => String::new(),
        };

        let url = [
            prefix.as_str(),
            path_type.as_str(),
            signature.as_str(),
            transformation.as_str(),
            version.as_str(),
            source.as_str(),
        ]
        .join("/");
        let url = collapse_slashes(&url);

        tracing::debug!(public_id = %public_id, url = %url, "Built delivery URL");
        Ok(url)
    }

    fn host_prefix(&self, source: &str) -> String {
        let config = self.config;
        let mut prefix = if config.secure() {
            let mut distribution = match config
                .secure_distribution()
                .filter(|d| !d.is_empty() && *d != OLD_AKAMAI_SHARED_CDN)
            {
                Some(d) => d.to_string(),
                None if config.private_cdn() => format!("{}-{}", config.cloud_name(), SHARED_CDN),
                None => SHARED_CDN.to_string(),
            };
            let shard = config
                .secure_cdn_subdomain()
                .unwrap_or(!config.private_cdn() && config.cdn_subdomain());
            if shard {
                let sharded = format!("res-{}.cloudinary.com", shard_index(source));
                distribution = distribution.replace(SHARED_CDN, &sharded);
            }
            format!("https://{}", distribution)
        } else if let Some(cname) = config.cname() {
            if config.cdn_subdomain() {
                format!("http://a{}.{}", shard_index(source), cname)
            } else {
                format!("http://{}", cname)
            }
        } else {
            let mut host = String::from("http://");
            if config.private_cdn() {
                host.push_str(config.cloud_name());
                host.push('-');
            }
            host.push_str("res");
            if config.cdn_subdomain() {
                host.push_str(&format!("-{}", shard_index(source)));
            }
            host.push_str(".cloudinary.com");
            host
        };

        if !config.private_cdn() {
            prefix.push('/');
            prefix.push_str(config.cloud_name());
        }
        prefix
    }

    fn resource_path(&self, resource_type: &str, delivery_type: &str) -> Result<String> {
        let has_suffix = self.suffix.as_deref().is_some_and(|s| !s.is_empty());
        if has_suffix && !self.config.private_cdn() {
            return Err(CloudinaryError::invalid("URL suffix is only supported with a private CDN"));
        }

        let mut path = format!("{}/{}", resource_type, delivery_type);
        if has_suffix {
            path = match path.as_str() {
                "image/upload" => "images".to_string(),
                "image/private" => "private_images".to_string(),
                "raw/upload" => "files".to_string(),
                _ => {
                    return Err(CloudinaryError::invalid(
                        "URL suffix is only supported for image/upload, image/private and raw/upload",
                    ))
                }
            };
        }

        if self.use_root_path {
            if path == "image/upload" || path == "images" {
                path.clear();
            } else {
                return Err(CloudinaryError::invalid("Root path is only supported for image/upload"));
            }
        }

        if self.shorten && path == "image/upload" {
            path = "iu".to_string();
        }
        Ok(path)
    }
}

/// Build a delivery URL for one asset with an already compiled transformation segment.
pub fn build_url(
    config: &Configuration,
    public_id: &str,
    resource_type: &str,
    delivery_type: &str,
    format: &str,
    transformation_segment: &str,
) -> Result<String> {
    UrlBuilder::new(config)
        .resource_type(resource_type)
        .delivery_type(delivery_type)
        .format(format)
        .transformation_segment(transformation_segment)
        .build(public_id)
}

/// `<resource_type>/<type>/v<version>/<public_id>[#signature]`, as returned by
/// the upload widget and some API responses.
struct Preloaded<'s> {
    resource_type: &'s str,
    delivery_type: &'s str,
    version: &'s str,
    public_id: &'s str,
}

impl<'s> Preloaded<'s> {
    fn parse(value: &'s str) -> Option<Self> {
        let caps = preloaded_pattern().captures(value)?;
        Some(Self {
            resource_type: caps.get(1)?.as_str(),
            delivery_type: caps.get(2)?.as_str(),
            version: caps.get(3)?.as_str(),
            public_id: caps.get(4)?.as_str(),
        })
    }
}

static PRELOADED: OnceLock<Regex> = OnceLock::new();
static VERSIONED: OnceLock<Regex> = OnceLock::new();
static ABSOLUTE_URL: OnceLock<Regex> = OnceLock::new();
static REPEATED_SLASHES: OnceLock<Regex> = OnceLock::new();

fn preloaded_pattern() -> &'static Regex {
    PRELOADED.get_or_init(|| {
        Regex::new(r"(?i)^([^/]+)/([^/]+)/v([0-9]+)/([^#]+)(#[0-9a-f]+)?$")
            .expect("constant preloaded pattern")
    })
}

fn with_fetch_format(chain: TransformationChain, fetch_format: &str) -> TransformationChain {
    let mut sets = chain.sets().to_vec();
    match sets.pop() {
        Some(last) => sets.push(last.fetch_format(fetch_format)),
        None => sets.push(Transformation::new().fetch_format(fetch_format)),
    }
    TransformationChain::from(sets)
}

fn is_absolute_url(value: &str) -> bool {
    ABSOLUTE_URL
        .get_or_init(|| Regex::new(r"(?i)^https?:/.*").expect("constant url pattern"))
        .is_match(value)
}

/// Already starts with `v<digits>/`.
fn is_versioned(value: &str) -> bool {
    VERSIONED
        .get_or_init(|| Regex::new(r"^v[0-9]+/.*").expect("constant version pattern"))
        .is_match(value)
}

/// Deterministic CDN shard in `1..=5`.
fn shard_index(source: &str) -> u32 {
    crc32fast::hash(source.as_bytes()) % 5 + 1
}

/// Collapse repeated `/`, except directly after a `:` (scheme separators).
fn collapse_slashes(url: &str) -> String {
    REPEATED_SLASHES
        .get_or_init(|| Regex::new(r"([^:])/+").expect("constant slash pattern"))
        .replace_all(url, "$1/")
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demo() -> Configuration {
        Configuration::new("demo")
    }

    fn signing_config() -> Configuration {
        Configuration::from_url("cloudinary://a:b@test123").unwrap()
    }

    // ========================================================================
    // Basic assembly
    // ========================================================================

    #[test]
    fn test_build_url_basic() {
        let url = build_url(&demo(), "sample", "image", "upload", "jpg", "").unwrap();
        assert_eq!(url, "https://res.cloudinary.com/demo/image/upload/sample.jpg");
    }

    #[test]
    fn test_no_trailing_dot_without_format() {
        let url = UrlBuilder::new(&demo()).build("sample").unwrap();
        assert_eq!(url, "https://res.cloudinary.com/demo/image/upload/sample");
    }

    #[test]
    fn test_with_transformation_and_version() {
        let url = UrlBuilder::new(&demo())
            .transformation(Transformation::new().width(100).height(200).crop("fill"))
            .version(1315060076)
            .format("png")
            .build("sample")
            .unwrap();
        assert_eq!(
            url,
            "https://res.cloudinary.com/demo/image/upload/c_fill,h_200,w_100/v1315060076/sample.png"
        );
    }

    #[test]
    fn test_video_resource_type() {
        let url = UrlBuilder::new(&demo()).resource_type("video").format("mp4").build("dog").unwrap();
        assert_eq!(url, "https://res.cloudinary.com/demo/video/upload/dog.mp4");
    }

    #[test]
    fn test_empty_public_id_is_invalid() {
        let err = UrlBuilder::new(&demo()).build("").unwrap_err();
        assert!(matches!(err, CloudinaryError::InvalidArgument(_)));
    }

    #[test]
    fn test_missing_cloud_name_is_configuration_error() {
        let config = Configuration::new("");
        let err = UrlBuilder::new(&config).build("sample").unwrap_err();
        assert!(matches!(err, CloudinaryError::Configuration(_)));
    }

    #[test]
    fn test_folder_gets_default_version() {
        let url = UrlBuilder::new(&demo()).build("folder/test").unwrap();
        assert_eq!(url, "https://res.cloudinary.com/demo/image/upload/v1/folder/test");
        let url = UrlBuilder::new(&demo()).build("v1234/folder/test").unwrap();
        assert_eq!(url, "https://res.cloudinary.com/demo/image/upload/v1234/folder/test");
        let url = UrlBuilder::new(&demo()).force_version(false).build("folder/test").unwrap();
        assert_eq!(url, "https://res.cloudinary.com/demo/image/upload/folder/test");
    }

    #[test]
    fn test_preloaded_identifier() {
        let url = UrlBuilder::new(&demo()).build("raw/private/v123456/document.docx").unwrap();
        assert_eq!(url, "https://res.cloudinary.com/demo/raw/private/v123456/document.docx");
        let url = UrlBuilder::new(&demo()).build("image/upload/v1/img.jpg#0123abcd").unwrap();
        assert_eq!(url, "https://res.cloudinary.com/demo/image/upload/v1/img.jpg");
    }

    #[test]
    fn test_preloaded_identifier_is_case_insensitive() {
        let url = UrlBuilder::new(&demo()).build("image/upload/V123/sample").unwrap();
        assert_eq!(url, "https://res.cloudinary.com/demo/image/upload/v123/sample");
        let url = UrlBuilder::new(&demo()).build("image/upload/v1/img.jpg#0123ABCD").unwrap();
        assert_eq!(url, "https://res.cloudinary.com/demo/image/upload/v1/img.jpg");
        assert!(Preloaded::parse("image/upload/vx/img.jpg").is_none());
        assert!(Preloaded::parse("image/upload/v1/img.jpg#zz").is_none());
    }

    #[test]
    fn test_url_shape_checks() {
        assert!(is_absolute_url("HTTPS://example.com/a.png"));
        assert!(is_absolute_url("http:/example.com"));
        assert!(!is_absolute_url("ftp://example.com"));
        assert!(is_versioned("v12/folder/test"));
        assert!(!is_versioned("V12/folder/test"));
        assert!(!is_versioned("v/folder"));
    }

    // ========================================================================
    // Encoding and fetch
    // ========================================================================

    #[test]
    fn test_smart_encode() {
        assert_eq!(smart_encode("a b"), "a%20b");
        assert_eq!(smart_encode("a+b"), "a%2Bb");
        assert_eq!(smart_encode("a??b"), "a%3F%3Fb");
        assert_eq!(smart_encode("folder/name:1"), "folder/name:1");
    }

    #[test]
    fn test_public_id_escaping_is_stable() {
        let url = UrlBuilder::new(&demo()).build("a%20b").unwrap();
        assert_eq!(url, "https://res.cloudinary.com/demo/image/upload/a%20b");
        let url = UrlBuilder::new(&demo()).build("a b").unwrap();
        assert_eq!(url, "https://res.cloudinary.com/demo/image/upload/a%20b");
    }

    #[test]
    fn test_fetch_url() {
        let url = UrlBuilder::new(&demo())
            .delivery_type("fetch")
            .format("jpg")
            .build("http://blah.com/hello?a=b")
            .unwrap();
        assert_eq!(
            url,
            "https://res.cloudinary.com/demo/image/fetch/f_jpg/http://blah.com/hello%3Fa%3Db"
        );
    }

    #[test]
    fn test_fetch_format_joins_last_set() {
        let url = UrlBuilder::new(&demo())
            .delivery_type("fetch")
            .format("png")
            .transformation(Transformation::new().width(100))
            .build("https://example.com/cat.jpg")
            .unwrap();
        assert_eq!(
            url,
            "https://res.cloudinary.com/demo/image/fetch/f_png,w_100/https://example.com/cat.jpg"
        );
    }

    // ========================================================================
    // Host selection
    // ========================================================================

    #[test]
    fn test_insecure_shared_host() {
        let config = demo().with_secure(false);
        let url = UrlBuilder::new(&config).build("test").unwrap();
        assert_eq!(url, "http://res.cloudinary.com/demo/image/upload/test");
    }

    #[test]
    fn test_cdn_subdomain_sharding() {
        let config = demo().with_secure(false).with_cdn_subdomain(true);
        let url = UrlBuilder::new(&config).build("test").unwrap();
        assert_eq!(url, "http://res-2.cloudinary.com/demo/image/upload/test");

        let config = demo().with_cdn_subdomain(true);
        let url = UrlBuilder::new(&config).build("test").unwrap();
        assert_eq!(url, "https://res-2.cloudinary.com/demo/image/upload/test");

        let config = demo().with_cdn_subdomain(true).with_secure_cdn_subdomain(false);
        let url = UrlBuilder::new(&config).build("test").unwrap();
        assert_eq!(url, "https://res.cloudinary.com/demo/image/upload/test");
    }

    #[test]
    fn test_cname() {
        let config = demo().with_secure(false).with_cname("hello.com");
        let url = UrlBuilder::new(&config).build("test").unwrap();
        assert_eq!(url, "http://hello.com/demo/image/upload/test");

        let config = config.with_cdn_subdomain(true);
        let url = UrlBuilder::new(&config).build("test").unwrap();
        assert_eq!(url, "http://a2.hello.com/demo/image/upload/test");
    }

    #[test]
    fn test_private_cdn() {
        let config = demo().with_private_cdn(true);
        let url = UrlBuilder::new(&config).build("test").unwrap();
        assert_eq!(url, "https://demo-res.cloudinary.com/image/upload/test");

        let config = demo().with_private_cdn(true).with_secure(false);
        let url = UrlBuilder::new(&config).build("test").unwrap();
        assert_eq!(url, "http://demo-res.cloudinary.com/image/upload/test");
    }

    #[test]
    fn test_secure_distribution() {
        let config = Configuration::from_url("cloudinary://a:b@demo/something.else.com").unwrap();
        let url = UrlBuilder::new(&config).build("test").unwrap();
        assert_eq!(url, "https://something.else.com/image/upload/test");

        let config = demo().with_secure_distribution(OLD_AKAMAI_SHARED_CDN);
        let url = UrlBuilder::new(&config).build("test").unwrap();
        assert_eq!(url, "https://res.cloudinary.com/demo/image/upload/test");
    }

    // ========================================================================
    // Path options
    // ========================================================================

    #[test]
    fn test_suffix() {
        let config = demo().with_private_cdn(true);
        let url = UrlBuilder::new(&config).suffix("hello").build("test").unwrap();
        assert_eq!(url, "https://demo-res.cloudinary.com/images/test/hello");

        let url = UrlBuilder::new(&config)
            .resource_type("raw")
            .suffix("hello")
            .build("test")
            .unwrap();
        assert_eq!(url, "https://demo-res.cloudinary.com/files/test/hello");
    }

    #[test]
    fn test_suffix_rules() {
        let err = UrlBuilder::new(&demo()).suffix("hello").build("test").unwrap_err();
        assert!(matches!(err, CloudinaryError::InvalidArgument(_)));

        let config = demo().with_private_cdn(true);
        assert!(UrlBuilder::new(&config).suffix("hello.world").build("test").is_err());
        assert!(UrlBuilder::new(&config)
            .resource_type("video")
            .suffix("hello")
            .build("test")
            .is_err());
    }

    #[test]
    fn test_root_path_and_shorten() {
        let config = demo().with_private_cdn(true);
        let url = UrlBuilder::new(&config).use_root_path(true).build("test").unwrap();
        assert_eq!(url, "https://demo-res.cloudinary.com/test");

        let url = UrlBuilder::new(&demo()).shorten(true).build("test").unwrap();
        assert_eq!(url, "https://res.cloudinary.com/demo/iu/test");

        assert!(UrlBuilder::new(&demo())
            .resource_type("raw")
            .use_root_path(true)
            .build("test")
            .is_err());
    }

    // ========================================================================
    // Signed URLs
    // ========================================================================

    #[test]
    fn test_signed_url() {
        let config = signing_config();
        let url = UrlBuilder::new(&config)
            .transformation(Transformation::new().width(10).height(20).crop("crop"))
            .version(1234)
            .sign_url(true)
            .build("image.jpg")
            .unwrap();
        assert_eq!(
            url,
            "https://res.cloudinary.com/test123/image/upload/s--Ai4Znfl3--/c_crop,h_20,w_10/v1234/image.jpg"
        );
    }

    #[test]
    fn test_signed_url_requires_secret() {
        let err = UrlBuilder::new(&demo()).sign_url(true).build("sample").unwrap_err();
        assert!(matches!(err, CloudinaryError::Configuration(_)));
    }

    #[test]
    fn test_collapse_slashes() {
        assert_eq!(collapse_slashes("https://a.com//b///c"), "https://a.com/b/c");
        assert_eq!(collapse_slashes("x/http://y"), "x/http://y");
        assert_eq!(collapse_slashes("a////b/"), "a/b/");
    }
}
