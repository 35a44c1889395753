//! Transformation builder and compiler.
//!
//! A [`Transformation`] is one parameter set (`c_fill,h_200,w_100`); a
//! [`TransformationChain`] is an ordered list of sets joined with `/`. Both are
//! immutable values built with consuming setters:
//!
//! ```
//! use cld_core::Transformation;
//!
//! let chain = Transformation::new()
//!     .width(100)
//!     .crop("fill")
//!     .chain(Transformation::new().angle(45));
//! assert_eq!(chain.compile().unwrap(), "c_fill,w_100/a_45");
//! ```
//!
//! Sets can be made conditional with [`Transformation::if_condition`] and
//! [`Transformation::if_else`]; [`TransformationChain::end_if`] closes the
//! branch. Variables defined in a set are emitted before its other keys.

pub mod expression;
pub mod key;
pub mod layer;
pub mod value;

use std::collections::BTreeMap;

use base64::{engine::general_purpose::URL_SAFE, Engine as _};

use crate::error::Result;

pub use expression::{Expression, Variable};
pub use key::TransformationKey;
pub use layer::{Layer, LayerSpec, TextLayer};
pub use value::ParamValue;

use value::normalize_color;

/// One transformation parameter set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transformation {
    params: BTreeMap<TransformationKey, ParamValue>,
    custom: BTreeMap<String, ParamValue>,
    raw: Option<ParamValue>,
    condition: Option<IfClause>,
    variables: Vec<Variable>,
    named_variables: BTreeMap<String, Variable>,
}

/// The `if_` key of a set.
#[derive(Debug, Clone, PartialEq)]
enum IfClause {
    When(Expression),
    Else,
    End,
}

impl Transformation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set any key by long name or short code. Names the compiler does not
    /// model are emitted as `name_value` after the known keys.
    pub fn param(mut self, name: &str, value: impl Into<ParamValue>) -> Self {
        match TransformationKey::lookup(name) {
            Some(key) => {
                self.params.insert(key, value.into());
            }
            None if name == "raw_transformation" => {
                self.raw = Some(value.into());
            }
            None => {
                self.custom.insert(name.to_string(), value.into());
            }
        }
        self
    }

    fn set(mut self, key: TransformationKey, value: impl Into<ParamValue>) -> Self {
        self.params.insert(key, value.into());
        self
    }

    // ========================================================================
    // Dimensions and cropping
    // ========================================================================

    /// Pixels (`100`), a fraction of the original (`0.5`) or `auto`.
    pub fn width(self, width: impl Into<ParamValue>) -> Self {
        self.set(TransformationKey::Width, width)
    }

    pub fn height(self, height: impl Into<ParamValue>) -> Self {
        self.set(TransformationKey::Height, height)
    }

    pub fn crop(self, mode: &str) -> Self {
        self.set(TransformationKey::Crop, mode)
    }

    pub fn gravity(self, gravity: &str) -> Self {
        self.set(TransformationKey::Gravity, gravity)
    }

    pub fn x(self, x: impl Into<ParamValue>) -> Self {
        self.set(TransformationKey::X, x)
    }

    pub fn y(self, y: impl Into<ParamValue>) -> Self {
        self.set(TransformationKey::Y, y)
    }

    pub fn zoom(self, zoom: impl Into<ParamValue>) -> Self {
        self.set(TransformationKey::Zoom, zoom)
    }

    /// Decimal (`1.5`) or string (`16:9`) aspect ratio.
    pub fn aspect_ratio(self, ratio: impl Into<ParamValue>) -> Self {
        self.set(TransformationKey::AspectRatio, ratio)
    }

    pub fn aspect_ratio_of(self, numerator: u32, denominator: u32) -> Self {
        self.set(
            TransformationKey::AspectRatio,
            ParamValue::ratio(numerator, denominator),
        )
    }

    pub fn dpr(self, dpr: impl Into<ParamValue>) -> Self {
        self.set(TransformationKey::Dpr, dpr)
    }

    // ========================================================================
    // Appearance
    // ========================================================================

    pub fn angle(self, angle: impl Into<ParamValue>) -> Self {
        self.set(TransformationKey::Angle, angle)
    }

    /// Several rotation modes, e.g. `["auto_right", "hflip"]`.
    pub fn angles<I, V>(self, angles: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<ParamValue>,
    {
        self.set(TransformationKey::Angle, ParamValue::sequence(angles))
    }

    pub fn effect(self, name: &str) -> Self {
        self.set(TransformationKey::Effect, name)
    }

    pub fn effect_with(self, name: &str, param: impl Into<ParamValue>) -> Self {
        self.set(
            TransformationKey::Effect,
            ParamValue::Compound(vec![name.into(), param.into()]),
        )
    }

    pub fn quality(self, quality: impl Into<ParamValue>) -> Self {
        self.set(TransformationKey::Quality, quality)
    }

    pub fn radius(self, radius: impl Into<ParamValue>) -> Self {
        self.set(TransformationKey::Radius, radius)
    }

    pub fn opacity(self, opacity: impl Into<ParamValue>) -> Self {
        self.set(TransformationKey::Opacity, opacity)
    }

    /// Solid border, e.g. `border(4, "#ff0000")` -> `bo_4px_solid_rgb:ff0000`.
    pub fn border(self, width: u32, color: &str) -> Self {
        let value = format!("{}px_solid_{}", width, normalize_color(color));
        self.set(TransformationKey::Border, value)
    }

    pub fn border_raw(self, border: &str) -> Self {
        self.set(TransformationKey::Border, border)
    }

    pub fn background(self, color: &str) -> Self {
        self.set(TransformationKey::Background, normalize_color(color))
    }

    pub fn color(self, color: &str) -> Self {
        self.set(TransformationKey::Color, normalize_color(color))
    }

    pub fn color_space(self, color_space: &str) -> Self {
        self.set(TransformationKey::ColorSpace, color_space)
    }

    pub fn default_image(self, public_id: &str) -> Self {
        self.set(TransformationKey::DefaultImage, public_id)
    }

    pub fn fetch_format(self, format: &str) -> Self {
        self.set(TransformationKey::FetchFormat, format)
    }

    pub fn flag(self, flag: &str) -> Self {
        self.set(TransformationKey::Flags, flag)
    }

    pub fn flags<I, V>(self, flags: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<ParamValue>,
    {
        self.set(TransformationKey::Flags, ParamValue::sequence(flags))
    }

    pub fn density(self, dpi: impl Into<ParamValue>) -> Self {
        self.set(TransformationKey::Density, dpi)
    }

    pub fn page(self, page: impl Into<ParamValue>) -> Self {
        self.set(TransformationKey::Page, page)
    }

    pub fn delay(self, delay: impl Into<ParamValue>) -> Self {
        self.set(TransformationKey::Delay, delay)
    }

    pub fn prefix(self, prefix: &str) -> Self {
        self.set(TransformationKey::Prefix, prefix)
    }

    // ========================================================================
    // Layers
    // ========================================================================

    /// An asset id (`"logo"`), a [`Layer`] or a [`TextLayer`].
    pub fn overlay(self, layer: impl Into<ParamValue>) -> Self {
        self.set(TransformationKey::Overlay, layer)
    }

    pub fn underlay(self, layer: impl Into<ParamValue>) -> Self {
        self.set(TransformationKey::Underlay, layer)
    }

    // ========================================================================
    // Named presets and custom functions
    // ========================================================================

    /// Reference a named transformation defined on the account. A set holding a
    /// named reference renders only that reference.
    pub fn named(self, name: &str) -> Self {
        self.set(TransformationKey::Named, name)
    }

    pub fn named_all<I, V>(self, names: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<ParamValue>,
    {
        self.set(TransformationKey::Named, ParamValue::sequence(names))
    }

    pub fn custom_function_wasm(self, public_id: &str) -> Self {
        self.set(TransformationKey::CustomFunction, format!("wasm:{}", public_id))
    }

    pub fn custom_function_remote(self, url: &str) -> Self {
        let encoded = URL_SAFE.encode(url.as_bytes());
        self.set(TransformationKey::CustomFunction, format!("remote:{}", encoded))
    }

    /// Appended verbatim after the other parameters of this set.
    pub fn raw_transformation(mut self, raw: &str) -> Self {
        self.raw = if raw.is_empty() {
            None
        } else {
            Some(ParamValue::from(raw))
        };
        self
    }

    // ========================================================================
    // Conditions and variables
    // ========================================================================

    /// Apply this set only when `condition` holds, e.g. `"w < 200"`. An empty
    /// condition is ignored.
    pub fn if_condition(mut self, condition: impl Into<Expression>) -> Self {
        let condition = condition.into();
        if !condition.is_empty() {
            self.condition = Some(IfClause::When(condition));
        }
        self
    }

    /// Apply this set when the preceding condition did not hold.
    pub fn if_else(mut self) -> Self {
        self.condition = Some(IfClause::Else);
        self
    }

    /// Define one variable. Variables set this way are emitted after those
    /// given to [`Transformation::variables`], sorted by name.
    pub fn variable(mut self, variable: Variable) -> Self {
        self.named_variables
            .insert(variable.name().to_string(), variable);
        self
    }

    /// Define variables, emitted first and in the order given.
    pub fn variables<I>(mut self, variables: I) -> Self
    where
        I: IntoIterator<Item = Variable>,
    {
        self.variables = variables.into_iter().collect();
        self
    }

    // ========================================================================
    // Audio and video
    // ========================================================================

    pub fn audio_codec(self, codec: &str) -> Self {
        self.set(TransformationKey::AudioCodec, codec)
    }

    pub fn audio_frequency(self, frequency: impl Into<ParamValue>) -> Self {
        self.set(TransformationKey::AudioFrequency, frequency)
    }

    pub fn bit_rate(self, bits_per_second: impl Into<ParamValue>) -> Self {
        self.set(TransformationKey::BitRate, bits_per_second)
    }

    pub fn bit_rate_kb(self, kilobits: u32) -> Self {
        self.set(
            TransformationKey::BitRate,
            ParamValue::Suffixed(kilobits as f64, "k"),
        )
    }

    /// `codec[:profile[:level]]`
    pub fn video_codec(self, codec: &str, profile: Option<&str>, level: Option<&str>) -> Self {
        let mut parts: Vec<ParamValue> = vec![codec.into()];
        if let Some(profile) = profile {
            parts.push(profile.into());
            if let Some(level) = level {
                parts.push(level.into());
            }
        }
        self.set(TransformationKey::VideoCodec, ParamValue::Compound(parts))
    }

    /// Number of frames to sample.
    pub fn video_sampling(self, frames: u32) -> Self {
        self.set(TransformationKey::VideoSampling, frames)
    }

    /// One frame every `seconds`.
    pub fn video_sampling_every(self, seconds: f64) -> Self {
        self.set(
            TransformationKey::VideoSampling,
            ParamValue::Suffixed(seconds, "s"),
        )
    }

    pub fn keyframe_interval(self, interval: impl Into<ParamValue>) -> Self {
        self.set(TransformationKey::KeyframeInterval, interval)
    }

    pub fn fps(self, fps: impl Into<ParamValue>) -> Self {
        self.set(TransformationKey::Fps, fps)
    }

    pub fn fps_range(self, min: Option<f64>, max: Option<f64>) -> Self {
        self.set(TransformationKey::Fps, ParamValue::Range(min, max))
    }

    /// Seconds (`2.5`) or a percentage (`ParamValue::percent(30)`).
    pub fn start_offset(self, offset: impl Into<ParamValue>) -> Self {
        self.set(TransformationKey::StartOffset, offset)
    }

    pub fn end_offset(self, offset: impl Into<ParamValue>) -> Self {
        self.set(TransformationKey::EndOffset, offset)
    }

    pub fn duration(self, duration: impl Into<ParamValue>) -> Self {
        self.set(TransformationKey::Duration, duration)
    }

    // ========================================================================
    // Accessors and compilation
    // ========================================================================

    pub fn get(&self, key: TransformationKey) -> Option<&ParamValue> {
        self.params.get(&key)
    }

    pub fn is_empty(&self) -> bool {
        self.condition.is_none() && self.is_unconditional_empty()
    }

    fn is_unconditional_empty(&self) -> bool {
        self.params.is_empty()
            && self.custom.is_empty()
            && self.raw.is_none()
            && self.variables.is_empty()
            && self.named_variables.is_empty()
    }

    fn clause_only(clause: IfClause) -> Self {
        Self {
            condition: Some(clause),
            ..Self::default()
        }
    }

    /// Start a chain with this set followed by `next`.
    pub fn chain(self, next: Transformation) -> TransformationChain {
        TransformationChain::from(self).then(next)
    }

    /// Compile this set on its own.
    pub fn compile(&self) -> Result<String> {
        compile_set(self)
    }
}

/// Ordered sequence of parameter sets, applied left to right.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransformationChain {
    sets: Vec<Transformation>,
}

impl TransformationChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(mut self, next: Transformation) -> Self {
        self.sets.push(next);
        self
    }

    pub fn sets(&self) -> &[Transformation] {
        &self.sets
    }

    pub fn is_empty(&self) -> bool {
        self.sets.iter().all(Transformation::is_empty)
    }

    pub fn compile(&self) -> Result<String> {
        compile(self)
    }

    /// Close the innermost open `if` with an `if_end` set.
    ///
    /// Walking back from the end, the branch sets (`if_else`, then the
    /// opening `if_`) have their clause moved into a set of its own, so the
    /// condition wraps whole sets: `if_w_lt_200/c_fill,w_80/if_else/c_fit/if_end`.
    /// A chain without any condition is returned unchanged.
    pub fn end_if(mut self) -> Self {
        if self.sets.iter().all(|set| set.condition.is_none()) {
            return self;
        }

        let mut index = self.sets.len();
        while index > 0 {
            index -= 1;
            let clause = match &self.sets[index].condition {
                None => continue,
                Some(IfClause::End) => break,
                Some(clause) => clause.clone(),
            };
            let opening = matches!(clause, IfClause::When(_));
            if !self.sets[index].is_unconditional_empty() {
                self.sets[index].condition = None;
                self.sets.insert(index, Transformation::clause_only(clause));
            }
            if opening {
                break;
            }
        }

        self.sets.push(Transformation::clause_only(IfClause::End));
        self
    }
}

impl From<Transformation> for TransformationChain {
    fn from(set: Transformation) -> Self {
        Self { sets: vec![set] }
    }
}

impl From<Vec<Transformation>> for TransformationChain {
    fn from(sets: Vec<Transformation>) -> Self {
        Self { sets }
    }
}

impl FromIterator<Transformation> for TransformationChain {
    fn from_iter<I: IntoIterator<Item = Transformation>>(iter: I) -> Self {
        Self {
            sets: iter.into_iter().collect(),
        }
    }
}

/// Compile a chain into one URL path segment. Sets that render empty are
/// skipped so the result never contains empty `/` segments.
pub fn compile(chain: &TransformationChain) -> Result<String> {
    let mut segments = Vec::with_capacity(chain.sets.len());
    for set in &chain.sets {
        let segment = compile_set(set)?;
        if !segment.is_empty() {
            segments.push(segment);
        }
    }
    Ok(segments.join("/"))
}

fn compile_set(set: &Transformation) -> Result<String> {
    let mut tokens = Vec::with_capacity(
        set.params.len() + set.custom.len() + set.variables.len() + set.named_variables.len() + 2,
    );
    match &set.condition {
        Some(IfClause::When(condition)) => {
            if let Some(condition) = condition.render()? {
                tokens.push(format!("if_{}", condition));
            }
        }
        Some(IfClause::Else) => tokens.push("if_else".to_string()),
        Some(IfClause::End) => tokens.push("if_end".to_string()),
        None => {}
    }

    if let Some(named) = set.params.get(&TransformationKey::Named) {
        if let Some(token) = named.normalize()? {
            tokens.push(format!("{}_{}", TransformationKey::Named.code(), token));
            return Ok(tokens.join(","));
        }
    }

    for variable in set.variables.iter().chain(set.named_variables.values()) {
        if let Some(token) = variable.render()? {
            tokens.push(token);
        }
    }
    for (key, value) in &set.params {
        if let Some(token) = value.normalize()? {
            tokens.push(format!("{}_{}", key.code(), token));
        }
    }
    for (name, value) in &set.custom {
        if let Some(token) = value.normalize()? {
            tokens.push(format!("{}_{}", name, token));
        }
    }
    if let Some(raw) = &set.raw {
        if let Some(raw) = raw.normalize()? {
            tokens.push(raw);
        }
    }
    Ok(tokens.join(","))
}
