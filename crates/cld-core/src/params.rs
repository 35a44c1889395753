//! Request parameters for upload and administrative API calls.
//!
//! [`Params`] is the flat name/value map that gets signed and sent as form
//! fields. The typed builders below render into it; each names its API action,
//! resource type and signing mode through [`ActionParams`].

use std::collections::BTreeMap;
use std::fmt;

use crate::error::{CloudinaryError, Result};
use crate::transformation::TransformationChain;

/// A request parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestValue {
    Text(String),
    /// Sent as repeated `name[]` fields, signed joined with `,`.
    List(Vec<String>),
}

impl RequestValue {
    /// Form used in the string to sign. `None` for empty values.
    pub fn to_signable(&self) -> Option<String> {
        match self {
            RequestValue::Text(s) if s.is_empty() => None,
            RequestValue::Text(s) => Some(s.clone()),
            RequestValue::List(items) => {
                let items: Vec<&str> = items
                    .iter()
                    .map(String::as_str)
                    .filter(|i| !i.is_empty())
                    .collect();
                if items.is_empty() {
                    None
                } else {
                    Some(items.join(","))
                }
            }
        }
    }
}

impl From<&str> for RequestValue {
    fn from(v: &str) -> Self {
        RequestValue::Text(v.to_string())
    }
}

impl From<String> for RequestValue {
    fn from(v: String) -> Self {
        RequestValue::Text(v)
    }
}

impl From<bool> for RequestValue {
    fn from(v: bool) -> Self {
        RequestValue::Text(v.to_string())
    }
}

impl From<i64> for RequestValue {
    fn from(v: i64) -> Self {
        RequestValue::Text(v.to_string())
    }
}

impl From<u32> for RequestValue {
    fn from(v: u32) -> Self {
        RequestValue::Text(v.to_string())
    }
}

impl From<Vec<String>> for RequestValue {
    fn from(v: Vec<String>) -> Self {
        RequestValue::List(v)
    }
}

/// Flat, key-sorted parameter map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(BTreeMap<String, RequestValue>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl Into<RequestValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<RequestValue>) {
        self.0.insert(key.to_string(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<RequestValue> {
        self.0.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&RequestValue> {
        self.0.get(key)
    }

    /// Text value of `key`, if set.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.0.get(key) {
            Some(RequestValue::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RequestValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Merge `other` into `self`; keys in `other` win.
    pub fn extend(&mut self, other: Params) {
        self.0.extend(other.0);
    }

    /// Non-empty values as form fields, lists expanded to `name[]`.
    pub fn to_form_fields(&self) -> Vec<(String, String)> {
        let mut fields = Vec::with_capacity(self.0.len());
        for (key, value) in &self.0 {
            match value {
                RequestValue::Text(s) if s.is_empty() => {}
                RequestValue::Text(s) => fields.push((key.clone(), s.clone())),
                RequestValue::List(items) => {
                    let name = format!("{}[]", key);
                    for item in items.iter().filter(|i| !i.is_empty()) {
                        fields.push((name.clone(), item.clone()));
                    }
                }
            }
        }
        fields
    }
}

impl<K: AsRef<str>, V: Into<RequestValue>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Params::new();
        for (k, v) in iter {
            params.insert(k.as_ref(), v);
        }
        params
    }
}

/// API actions, the last path segment of the endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Upload,
    Explicit,
    Rename,
    Destroy,
    Tags,
    Explode,
    Sprite,
    Multi,
    Text,
    DeleteByToken,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Action::Upload => "upload",
            Action::Explicit => "explicit",
            Action::Rename => "rename",
            Action::Destroy => "destroy",
            Action::Tags => "tags",
            Action::Explode => "explode",
            Action::Sprite => "sprite",
            Action::Multi => "multi",
            Action::Text => "text",
            Action::DeleteByToken => "delete_by_token",
        }
    }

    /// Whether the endpoint path includes a resource type segment.
    pub fn has_resource_type(self) -> bool {
        !matches!(self, Action::DeleteByToken)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a request is authorized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SigningMode {
    /// `timestamp`, `api_key` and `signature` are added.
    Signed,
    /// Authorized by an upload preset configured on the account.
    Unsigned { upload_preset: String },
    /// Authorized by a token carried in the parameters.
    Token,
}

/// A typed parameter set for one API action.
pub trait ActionParams {
    fn action(&self) -> Action;

    fn resource_type(&self) -> &str {
        "image"
    }

    fn signing_mode(&self) -> SigningMode {
        SigningMode::Signed
    }

    fn into_params(self) -> Result<Params>;
}

const DEFAULT_RESOURCE_TYPE: &str = "image";

fn compile_optional(chain: Option<TransformationChain>) -> Result<Option<String>> {
    match chain {
        Some(chain) => {
            let compiled = chain.compile()?;
            Ok(if compiled.is_empty() { None } else { Some(compiled) })
        }
        None => Ok(None),
    }
}

fn compile_eager(eager: Vec<TransformationChain>) -> Result<Option<String>> {
    let mut compiled = Vec::with_capacity(eager.len());
    for chain in eager {
        let segment = chain.compile()?;
        if !segment.is_empty() {
            compiled.push(segment);
        }
    }
    Ok(if compiled.is_empty() {
        None
    } else {
        Some(compiled.join("|"))
    })
}

fn context_string<I, K, V>(context: I) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    context
        .into_iter()
        .map(|(k, v)| {
            let value = v.as_ref().replace('=', "\\=").replace('|', "\\|");
            format!("{}={}", k.as_ref(), value)
        })
        .collect::<Vec<_>>()
        .join("|")
}

// ============================================================================
// Upload
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct UploadParams {
    params: Params,
    resource_type: Option<String>,
    transformation: Option<TransformationChain>,
    eager: Vec<TransformationChain>,
    unsigned_preset: Option<String>,
}

impl UploadParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unsigned upload authorized by `upload_preset`.
    pub fn unsigned(upload_preset: &str) -> Self {
        Self {
            unsigned_preset: Some(upload_preset.to_string()),
            ..Self::default()
        }
    }

    /// Switch these parameters to an unsigned upload authorized by `upload_preset`.
    pub fn unsigned_preset(mut self, upload_preset: &str) -> Self {
        self.unsigned_preset = Some(upload_preset.to_string());
        self
    }

    fn set(mut self, key: &str, value: impl Into<RequestValue>) -> Self {
        self.params.insert(key, value);
        self
    }

    pub fn public_id(self, public_id: &str) -> Self {
        self.set("public_id", public_id)
    }

    pub fn folder(self, folder: &str) -> Self {
        self.set("folder", folder)
    }

    pub fn use_filename(self, use_filename: bool) -> Self {
        self.set("use_filename", use_filename)
    }

    pub fn unique_filename(self, unique_filename: bool) -> Self {
        self.set("unique_filename", unique_filename)
    }

    pub fn overwrite(self, overwrite: bool) -> Self {
        self.set("overwrite", overwrite)
    }

    pub fn invalidate(self, invalidate: bool) -> Self {
        self.set("invalidate", invalidate)
    }

    /// `image`, `video`, `raw` or `auto`. Selects the endpoint, not sent as a field.
    pub fn resource_type(mut self, resource_type: &str) -> Self {
        self.resource_type = Some(resource_type.to_string());
        self
    }

    /// Delivery type (`upload`, `private`, `authenticated`).
    pub fn delivery_type(self, delivery_type: &str) -> Self {
        self.set("type", delivery_type)
    }

    pub fn tags<I, S>(self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = tags
            .into_iter()
            .map(|t| t.as_ref().to_string())
            .collect::<Vec<_>>()
            .join(",");
        self.set("tags", joined)
    }

    /// Key/value metadata, sent as `k=v|k=v` with `=` and `|` escaped in values.
    pub fn context<I, K, V>(self, context: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.set("context", context_string(context))
    }

    /// Incoming transformation applied before storing.
    pub fn transformation(mut self, transformation: impl Into<TransformationChain>) -> Self {
        self.transformation = Some(transformation.into());
        self
    }

    /// Derived version generated at upload time. Call repeatedly for several.
    pub fn eager(mut self, transformation: impl Into<TransformationChain>) -> Self {
        self.eager.push(transformation.into());
        self
    }

    pub fn format(self, format: &str) -> Self {
        self.set("format", format)
    }

    pub fn notification_url(self, url: &str) -> Self {
        self.set("notification_url", url)
    }

    pub fn callback(self, url: &str) -> Self {
        self.set("callback", url)
    }

    pub fn upload_preset(self, preset: &str) -> Self {
        self.set("upload_preset", preset)
    }

    pub fn return_delete_token(self, value: bool) -> Self {
        self.set("return_delete_token", value)
    }

    pub fn backup(self, backup: bool) -> Self {
        self.set("backup", backup)
    }

    pub fn moderation(self, moderation: &str) -> Self {
        self.set("moderation", moderation)
    }

    pub fn raw_convert(self, raw_convert: &str) -> Self {
        self.set("raw_convert", raw_convert)
    }

    pub fn categorization(self, categorization: &str) -> Self {
        self.set("categorization", categorization)
    }

    /// Confidence threshold in `0.0..=1.0`.
    pub fn auto_tagging(self, threshold: f64) -> Self {
        self.set("auto_tagging", threshold.to_string())
    }

    /// Extra HTTP headers for delivered assets, one `Name: value` per line.
    pub fn headers<I, K, V>(self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let joined = headers
            .into_iter()
            .map(|(k, v)| format!("{}: {}", k.as_ref(), v.as_ref()))
            .collect::<Vec<_>>()
            .join("\n");
        self.set("headers", joined)
    }

    pub fn faces(self, faces: bool) -> Self {
        self.set("faces", faces)
    }

    pub fn colors(self, colors: bool) -> Self {
        self.set("colors", colors)
    }

    pub fn image_metadata(self, image_metadata: bool) -> Self {
        self.set("image_metadata", image_metadata)
    }

    pub fn phash(self, phash: bool) -> Self {
        self.set("phash", phash)
    }

    /// Any parameter without a dedicated setter.
    pub fn param(self, key: &str, value: impl Into<RequestValue>) -> Self {
        self.set(key, value)
    }
}

impl ActionParams for UploadParams {
    fn action(&self) -> Action {
        Action::Upload
    }

    fn resource_type(&self) -> &str {
        self.resource_type.as_deref().unwrap_or(DEFAULT_RESOURCE_TYPE)
    }

    fn signing_mode(&self) -> SigningMode {
        match &self.unsigned_preset {
            Some(preset) => SigningMode::Unsigned {
                upload_preset: preset.clone(),
            },
            None => SigningMode::Signed,
        }
    }

    fn into_params(self) -> Result<Params> {
        let mut params = self.params;
        if let Some(t) = compile_optional(self.transformation)? {
            params.insert("transformation", t);
        }
        if let Some(eager) = compile_eager(self.eager)? {
            params.insert("eager", eager);
        }
        Ok(params)
    }
}

// ============================================================================
// Administrative actions
// ============================================================================

#[derive(Debug, Clone)]
pub struct RenameParams {
    params: Params,
    resource_type: Option<String>,
}

impl RenameParams {
    pub fn new(from_public_id: &str, to_public_id: &str) -> Self {
        Self {
            params: Params::new()
                .with("from_public_id", from_public_id)
                .with("to_public_id", to_public_id),
            resource_type: None,
        }
    }

    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.params.insert("overwrite", overwrite);
        self
    }

    pub fn invalidate(mut self, invalidate: bool) -> Self {
        self.params.insert("invalidate", invalidate);
        self
    }

    pub fn delivery_type(mut self, delivery_type: &str) -> Self {
        self.params.insert("type", delivery_type);
        self
    }

    pub fn to_delivery_type(mut self, delivery_type: &str) -> Self {
        self.params.insert("to_type", delivery_type);
        self
    }

    pub fn resource_type(mut self, resource_type: &str) -> Self {
        self.resource_type = Some(resource_type.to_string());
        self
    }
}

impl ActionParams for RenameParams {
    fn action(&self) -> Action {
        Action::Rename
    }

    fn resource_type(&self) -> &str {
        self.resource_type.as_deref().unwrap_or(DEFAULT_RESOURCE_TYPE)
    }

    fn into_params(self) -> Result<Params> {
        for key in ["from_public_id", "to_public_id"] {
            if self.params.get_str(key).map_or(true, str::is_empty) {
                return Err(CloudinaryError::invalid(format!("{} must not be empty", key)));
            }
        }
        Ok(self.params)
    }
}

#[derive(Debug, Clone)]
pub struct DestroyParams {
    params: Params,
    resource_type: Option<String>,
}

impl DestroyParams {
    pub fn new(public_id: &str) -> Self {
        Self {
            params: Params::new().with("public_id", public_id),
            resource_type: None,
        }
    }

    pub fn delivery_type(mut self, delivery_type: &str) -> Self {
        self.params.insert("type", delivery_type);
        self
    }

    pub fn invalidate(mut self, invalidate: bool) -> Self {
        self.params.insert("invalidate", invalidate);
        self
    }

    pub fn resource_type(mut self, resource_type: &str) -> Self {
        self.resource_type = Some(resource_type.to_string());
        self
    }
}

impl ActionParams for DestroyParams {
    fn action(&self) -> Action {
        Action::Destroy
    }

    fn resource_type(&self) -> &str {
        self.resource_type.as_deref().unwrap_or(DEFAULT_RESOURCE_TYPE)
    }

    fn into_params(self) -> Result<Params> {
        if self.params.get_str("public_id").map_or(true, str::is_empty) {
            return Err(CloudinaryError::invalid("public_id must not be empty"));
        }
        Ok(self.params)
    }
}

/// Tag mutation applied to a set of assets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagCommand {
    Add,
    Remove,
    Replace,
    RemoveAll,
}

impl TagCommand {
    pub fn as_str(self) -> &'static str {
        match self {
            TagCommand::Add => "add",
            TagCommand::Remove => "remove",
            TagCommand::Replace => "replace",
            TagCommand::RemoveAll => "remove_all",
        }
    }
}

#[derive(Debug, Clone)]
pub struct TagsParams {
    command: TagCommand,
    tag: Option<String>,
    public_ids: Vec<String>,
    delivery_type: Option<String>,
    resource_type: Option<String>,
}

impl TagsParams {
    pub fn new<I, S>(command: TagCommand, tag: &str, public_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            command,
            tag: Some(tag.to_string()),
            public_ids: public_ids.into_iter().map(Into::into).collect(),
            delivery_type: None,
            resource_type: None,
        }
    }

    pub fn add<I, S>(tag: &str, public_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(TagCommand::Add, tag, public_ids)
    }

    pub fn remove<I, S>(tag: &str, public_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(TagCommand::Remove, tag, public_ids)
    }

    pub fn replace<I, S>(tag: &str, public_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(TagCommand::Replace, tag, public_ids)
    }

    pub fn remove_all<I, S>(public_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tag: None,
            ..Self::new(TagCommand::RemoveAll, "", public_ids)
        }
    }

    pub fn delivery_type(mut self, delivery_type: &str) -> Self {
        self.delivery_type = Some(delivery_type.to_string());
        self
    }

    pub fn resource_type(mut self, resource_type: &str) -> Self {
        self.resource_type = Some(resource_type.to_string());
        self
    }
}

impl ActionParams for TagsParams {
    fn action(&self) -> Action {
        Action::Tags
    }

    fn resource_type(&self) -> &str {
        self.resource_type.as_deref().unwrap_or(DEFAULT_RESOURCE_TYPE)
    }

    fn into_params(self) -> Result<Params> {
        if self.public_ids.is_empty() {
            return Err(CloudinaryError::invalid("tags requires at least one public_id"));
        }
        if self.command != TagCommand::RemoveAll && self.tag.as_deref().map_or(true, str::is_empty) {
            return Err(CloudinaryError::invalid("tag must not be empty"));
        }
        let mut params = Params::new()
            .with("command", self.command.as_str())
            .with("public_ids", self.public_ids);
        if let Some(tag) = self.tag.filter(|t| !t.is_empty()) {
            params.insert("tag", tag);
        }
        if let Some(delivery_type) = self.delivery_type {
            params.insert("type", delivery_type);
        }
        Ok(params)
    }
}

#[derive(Debug, Clone)]
pub struct ExplicitParams {
    params: Params,
    resource_type: Option<String>,
    eager: Vec<TransformationChain>,
}

impl ExplicitParams {
    pub fn new(public_id: &str) -> Self {
        Self {
            params: Params::new().with("public_id", public_id),
            resource_type: None,
            eager: Vec::new(),
        }
    }

    pub fn delivery_type(mut self, delivery_type: &str) -> Self {
        self.params.insert("type", delivery_type);
        self
    }

    pub fn eager(mut self, transformation: impl Into<TransformationChain>) -> Self {
        self.eager.push(transformation.into());
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = tags
            .into_iter()
            .map(|t| t.as_ref().to_string())
            .collect::<Vec<_>>()
            .join(",");
        self.params.insert("tags", joined);
        self
    }

    pub fn context<I, K, V>(mut self, context: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.params.insert("context", context_string(context));
        self
    }

    pub fn invalidate(mut self, invalidate: bool) -> Self {
        self.params.insert("invalidate", invalidate);
        self
    }

    pub fn resource_type(mut self, resource_type: &str) -> Self {
        self.resource_type = Some(resource_type.to_string());
        self
    }

    pub fn param(mut self, key: &str, value: impl Into<RequestValue>) -> Self {
        self.params.insert(key, value);
        self
    }
}

impl ActionParams for ExplicitParams {
    fn action(&self) -> Action {
        Action::Explicit
    }

    fn resource_type(&self) -> &str {
        self.resource_type.as_deref().unwrap_or(DEFAULT_RESOURCE_TYPE)
    }

    fn into_params(self) -> Result<Params> {
        let mut params = self.params;
        if params.get_str("public_id").map_or(true, str::is_empty) {
            return Err(CloudinaryError::invalid("public_id must not be empty"));
        }
        if let Some(eager) = compile_eager(self.eager)? {
            params.insert("eager", eager);
        }
        Ok(params)
    }
}

#[derive(Debug, Clone)]
pub struct ExplodeParams {
    public_id: String,
    transformation: TransformationChain,
    delivery_type: Option<String>,
    notification_url: Option<String>,
}

impl ExplodeParams {
    /// The transformation must include `pg_all` (e.g. `Transformation::new().page("all")`).
    pub fn new(public_id: &str, transformation: impl Into<TransformationChain>) -> Self {
        Self {
            public_id: public_id.to_string(),
            transformation: transformation.into(),
            delivery_type: None,
            notification_url: None,
        }
    }

    pub fn delivery_type(mut self, delivery_type: &str) -> Self {
        self.delivery_type = Some(delivery_type.to_string());
        self
    }

    pub fn notification_url(mut self, url: &str) -> Self {
        self.notification_url = Some(url.to_string());
        self
    }
}

impl ActionParams for ExplodeParams {
    fn action(&self) -> Action {
        Action::Explode
    }

    fn into_params(self) -> Result<Params> {
        if self.public_id.is_empty() {
            return Err(CloudinaryError::invalid("public_id must not be empty"));
        }
        let mut params = Params::new()
            .with("public_id", self.public_id)
            .with("transformation", self.transformation.compile()?);
        if let Some(t) = self.delivery_type {
            params.insert("type", t);
        }
        if let Some(url) = self.notification_url {
            params.insert("notification_url", url);
        }
        Ok(params)
    }
}

/// Parameters for combining all images with a tag, as a sprite or a multi-page file.
#[derive(Debug, Clone)]
pub struct SpriteParams {
    action: Action,
    params: Params,
    transformation: Option<TransformationChain>,
}

impl SpriteParams {
    /// Sprite sheet plus CSS of all images tagged `tag`.
    pub fn sprite(tag: &str) -> Self {
        Self {
            action: Action::Sprite,
            params: Params::new().with("tag", tag),
            transformation: None,
        }
    }

    /// Animated GIF, video or PDF built from all images tagged `tag`.
    pub fn multi(tag: &str) -> Self {
        Self {
            action: Action::Multi,
            ..Self::sprite(tag)
        }
    }

    pub fn transformation(mut self, transformation: impl Into<TransformationChain>) -> Self {
        self.transformation = Some(transformation.into());
        self
    }

    pub fn format(mut self, format: &str) -> Self {
        self.params.insert("format", format);
        self
    }

    pub fn notification_url(mut self, url: &str) -> Self {
        self.params.insert("notification_url", url);
        self
    }

    pub fn run_async(mut self, run_async: bool) -> Self {
        self.params.insert("async", run_async);
        self
    }
}

impl ActionParams for SpriteParams {
    fn action(&self) -> Action {
        self.action
    }

    fn into_params(self) -> Result<Params> {
        let mut params = self.params;
        if params.get_str("tag").map_or(true, str::is_empty) {
            return Err(CloudinaryError::invalid("tag must not be empty"));
        }
        if let Some(t) = compile_optional(self.transformation)? {
            params.insert("transformation", t);
        }
        Ok(params)
    }
}

/// Render a text string as an image stored on the service.
#[derive(Debug, Clone)]
pub struct TextParams {
    params: Params,
}

impl TextParams {
    pub fn new(text: &str) -> Self {
        Self {
            params: Params::new().with("text", text),
        }
    }

    fn set(mut self, key: &str, value: impl Into<RequestValue>) -> Self {
        self.params.insert(key, value);
        self
    }

    pub fn public_id(self, public_id: &str) -> Self {
        self.set("public_id", public_id)
    }

    pub fn font_family(self, family: &str) -> Self {
        self.set("font_family", family)
    }

    pub fn font_size(self, size: u32) -> Self {
        self.set("font_size", size)
    }

    pub fn font_color(self, color: &str) -> Self {
        self.set("font_color", color)
    }

    pub fn font_weight(self, weight: &str) -> Self {
        self.set("font_weight", weight)
    }

    pub fn font_style(self, style: &str) -> Self {
        self.set("font_style", style)
    }

    pub fn background(self, color: &str) -> Self {
        self.set("background", color)
    }

    pub fn opacity(self, opacity: u32) -> Self {
        self.set("opacity", opacity)
    }

    pub fn text_decoration(self, decoration: &str) -> Self {
        self.set("text_decoration", decoration)
    }
}

impl ActionParams for TextParams {
    fn action(&self) -> Action {
        Action::Text
    }

    fn into_params(self) -> Result<Params> {
        if self.params.get_str("text").map_or(true, str::is_empty) {
            return Err(CloudinaryError::invalid("text must not be empty"));
        }
        Ok(self.params)
    }
}

/// Delete an asset with the token returned by an upload made with
/// `return_delete_token`. Needs no credentials.
#[derive(Debug, Clone)]
pub struct DeleteByTokenParams {
    token: String,
}

impl DeleteByTokenParams {
    pub fn new(token: &str) -> Self {
        Self {
            token: token.to_string(),
        }
    }
}

impl ActionParams for DeleteByTokenParams {
    fn action(&self) -> Action {
        Action::DeleteByToken
    }

    fn signing_mode(&self) -> SigningMode {
        SigningMode::Token
    }

    fn into_params(self) -> Result<Params> {
        if self.token.is_empty() {
            return Err(CloudinaryError::invalid("token must not be empty"));
        }
        Ok(Params::new().with("token", self.token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transformation::Transformation;

    #[test]
    fn test_upload_params_render() {
        let params = UploadParams::new()
            .public_id("sample")
            .tags(["a", "b"])
            .context([("caption", "x=y"), ("alt", "cat")])
            .overwrite(true)
            .transformation(Transformation::new().width(100).crop("limit"))
            .eager(Transformation::new().width(50))
            .eager(Transformation::new().angle(90).chain(Transformation::new().effect("sepia")))
            .into_params()
            .unwrap();

        assert_eq!(params.get_str("public_id"), Some("sample"));
        assert_eq!(params.get_str("tags"), Some("a,b"));
        assert_eq!(params.get_str("context"), Some("caption=x\\=y|alt=cat"));
        assert_eq!(params.get_str("overwrite"), Some("true"));
        assert_eq!(params.get_str("transformation"), Some("c_limit,w_100"));
        assert_eq!(params.get_str("eager"), Some("w_50|a_90/e_sepia"));
    }

    #[test]
    fn test_upload_resource_type_and_signing_mode() {
        let params = UploadParams::new().resource_type("video");
        assert_eq!(ActionParams::resource_type(&params), "video");
        assert_eq!(params.signing_mode(), SigningMode::Signed);

        let params = UploadParams::unsigned("preset1");
        assert_eq!(ActionParams::resource_type(&params), "image");
        assert_eq!(
            params.signing_mode(),
            SigningMode::Unsigned {
                upload_preset: "preset1".to_string()
            }
        );
    }

    #[test]
    fn test_to_form_fields_expands_lists() {
        let params = Params::new()
            .with("command", "add")
            .with("public_ids", vec!["a".to_string(), "b".to_string()])
            .with("empty", "");
        assert_eq!(
            params.to_form_fields(),
            vec![
                ("command".to_string(), "add".to_string()),
                ("public_ids[]".to_string(), "a".to_string()),
                ("public_ids[]".to_string(), "b".to_string()),
            ]
        );
    }

    #[test]
    fn test_tags_params() {
        let params = TagsParams::add("summer", ["a", "b"]).into_params().unwrap();
        assert_eq!(params.get_str("command"), Some("add"));
        assert_eq!(params.get_str("tag"), Some("summer"));
        assert_eq!(
            params.get("public_ids"),
            Some(&RequestValue::List(vec!["a".to_string(), "b".to_string()]))
        );

        assert!(TagsParams::add("", ["a"]).into_params().is_err());
        assert!(TagsParams::add("x", Vec::<String>::new()).into_params().is_err());
        let params = TagsParams::remove_all(["a"]).into_params().unwrap();
        assert_eq!(params.get_str("command"), Some("remove_all"));
        assert!(!params.contains_key("tag"));
    }

    #[test]
    fn test_rename_and_destroy_validate_ids() {
        assert!(RenameParams::new("a", "").into_params().is_err());
        let params = RenameParams::new("a", "b").overwrite(true).into_params().unwrap();
        assert_eq!(params.get_str("to_public_id"), Some("b"));
        assert!(DestroyParams::new("").into_params().is_err());
        assert_eq!(ActionParams::resource_type(&DestroyParams::new("x").resource_type("raw")), "raw");
    }

    #[test]
    fn test_sprite_and_multi() {
        let sprite = SpriteParams::sprite("logo").transformation(Transformation::new().width(20));
        assert_eq!(sprite.action(), Action::Sprite);
        let params = sprite.into_params().unwrap();
        assert_eq!(params.get_str("transformation"), Some("w_20"));

        let multi = SpriteParams::multi("logo").format("gif");
        assert_eq!(multi.action(), Action::Multi);
        assert_eq!(multi.into_params().unwrap().get_str("format"), Some("gif"));
    }

    #[test]
    fn test_explode_compiles_transformation() {
        let params = ExplodeParams::new("multipage", Transformation::new().page("all"))
            .into_params()
            .unwrap();
        assert_eq!(params.get_str("transformation"), Some("pg_all"));
    }

    #[test]
    fn test_delete_by_token() {
        let params = DeleteByTokenParams::new("abc");
        assert_eq!(params.signing_mode(), SigningMode::Token);
        assert!(!params.action().has_resource_type());
        assert_eq!(params.into_params().unwrap().get_str("token"), Some("abc"));
    }

    #[test]
    fn test_signable_values() {
        assert_eq!(RequestValue::from("").to_signable(), None);
        assert_eq!(RequestValue::List(vec![]).to_signable(), None);
        assert_eq!(
            RequestValue::List(vec!["a".into(), "".into(), "b".into()]).to_signable().as_deref(),
            Some("a,b")
        );
    }
}
