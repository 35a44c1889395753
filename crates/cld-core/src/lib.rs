//! Core of the Cloudinary client: account configuration, the transformation
//! compiler, delivery URL building and request signing.
//!
//! Everything here is synchronous and performs no network I/O. The upload
//! engine lives in `cld-api-client`.

pub mod config;
pub mod error;
pub mod params;
pub mod signature;
pub mod transformation;
pub mod url;

pub use config::Configuration;
pub use error::{CloudinaryError, ErrorMetadata, LogLevel, Result};
pub use params::{
    Action, ActionParams, DeleteByTokenParams, DestroyParams, ExplicitParams, ExplodeParams,
    Params, RenameParams, RequestValue, SigningMode, SpriteParams, TagCommand, TagsParams,
    TextParams, UploadParams,
};
pub use signature::{sign, sign_request, ExternalSignature};
pub use transformation::{
    compile, Expression, Layer, LayerSpec, ParamValue, TextLayer, Transformation,
    TransformationChain, TransformationKey, Variable,
};
pub use url::{build_url, UrlBuilder};

/// Version reported in the `User-Agent` header.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
