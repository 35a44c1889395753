//! Known transformation keys and the fixed order they are emitted in.

/// Variants are declared in emission order (alphabetical by short code), and
/// the derived `Ord` relies on that. Keep new keys sorted by `code()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TransformationKey {
    Angle,
    AudioCodec,
    AudioFrequency,
    AspectRatio,
    Background,
    Border,
    BitRate,
    Crop,
    Color,
    ColorSpace,
    DefaultImage,
    Delay,
    Density,
    Dpr,
    Duration,
    Effect,
    EndOffset,
    FetchFormat,
    Flags,
    CustomFunction,
    Fps,
    Gravity,
    Height,
    KeyframeInterval,
    Overlay,
    Opacity,
    Prefix,
    Page,
    Quality,
    Radius,
    StartOffset,
    Named,
    Underlay,
    VideoCodec,
    VideoSampling,
    Width,
    X,
    Y,
    Zoom,
}

impl TransformationKey {
    pub const ALL: [TransformationKey; 39] = [
        TransformationKey::Angle,
        TransformationKey::AudioCodec,
        TransformationKey::AudioFrequency,
        TransformationKey::AspectRatio,
        TransformationKey::Background,
        TransformationKey::Border,
        TransformationKey::BitRate,
        TransformationKey::Crop,
        TransformationKey::Color,
        TransformationKey::ColorSpace,
        TransformationKey::DefaultImage,
        TransformationKey::Delay,
        TransformationKey::Density,
        TransformationKey::Dpr,
        TransformationKey::Duration,
        TransformationKey::Effect,
        TransformationKey::EndOffset,
        TransformationKey::FetchFormat,
        TransformationKey::Flags,
        TransformationKey::CustomFunction,
        TransformationKey::Fps,
        TransformationKey::Gravity,
        TransformationKey::Height,
        TransformationKey::KeyframeInterval,
        TransformationKey::Overlay,
        TransformationKey::Opacity,
        TransformationKey::Prefix,
        TransformationKey::Page,
        TransformationKey::Quality,
        TransformationKey::Radius,
        TransformationKey::StartOffset,
        TransformationKey::Named,
        TransformationKey::Underlay,
        TransformationKey::VideoCodec,
        TransformationKey::VideoSampling,
        TransformationKey::Width,
        TransformationKey::X,
        TransformationKey::Y,
        TransformationKey::Zoom,
    ];

    /// Short code used in delivery URLs.
    pub fn code(self) -> &'static str {
        match self {
            TransformationKey::Angle => "a",
            TransformationKey::AudioCodec => "ac",
            TransformationKey::AudioFrequency => "af",
            TransformationKey::AspectRatio => "ar",
            TransformationKey::Background => "b",
            TransformationKey::Border => "bo",
            TransformationKey::BitRate => "br",
            TransformationKey::Crop => "c",
            TransformationKey::Color => "co",
            TransformationKey::ColorSpace => "cs",
            TransformationKey::DefaultImage => "d",
            TransformationKey::Delay => "dl",
            TransformationKey::Density => "dn",
            TransformationKey::Dpr => "dpr",
            TransformationKey::Duration => "du",
            TransformationKey::Effect => "e",
            TransformationKey::EndOffset => "eo",
            TransformationKey::FetchFormat => "f",
            TransformationKey::Flags => "fl",
            TransformationKey::CustomFunction => "fn",
            TransformationKey::Fps => "fps",
            TransformationKey::Gravity => "g",
            TransformationKey::Height => "h",
            TransformationKey::KeyframeInterval => "ki",
            TransformationKey::Overlay => "l",
            TransformationKey::Opacity => "o",
            TransformationKey::Prefix => "p",
            TransformationKey::Page => "pg",
            TransformationKey::Quality => "q",
            TransformationKey::Radius => "r",
            TransformationKey::StartOffset => "so",
            TransformationKey::Named => "t",
            TransformationKey::Underlay => "u",
            TransformationKey::VideoCodec => "vc",
            TransformationKey::VideoSampling => "vs",
            TransformationKey::Width => "w",
            TransformationKey::X => "x",
            TransformationKey::Y => "y",
            TransformationKey::Zoom => "z",
        }
    }

    /// Long parameter name, as used in upload parameters and option maps.
    pub fn name(self) -> &'static str {
        match self {
            TransformationKey::Angle => "angle",
            TransformationKey::AudioCodec => "audio_codec",
            TransformationKey::AudioFrequency => "audio_frequency",
            TransformationKey::AspectRatio => "aspect_ratio",
            TransformationKey::Background => "background",
            TransformationKey::Border => "border",
            TransformationKey::BitRate => "bit_rate",
            TransformationKey::Crop => "crop",
            TransformationKey::Color => "color",
            TransformationKey::ColorSpace => "color_space",
            TransformationKey::DefaultImage => "default_image",
            TransformationKey::Delay => "delay",
            TransformationKey::Density => "density",
            TransformationKey::Dpr => "dpr",
            TransformationKey::Duration => "duration",
            TransformationKey::Effect => "effect",
            TransformationKey::EndOffset => "end_offset",
            TransformationKey::FetchFormat => "fetch_format",
            TransformationKey::Flags => "flags",
            TransformationKey::CustomFunction => "custom_function",
            TransformationKey::Fps => "fps",
            TransformationKey::Gravity => "gravity",
            TransformationKey::Height => "height",
            TransformationKey::KeyframeInterval => "keyframe_interval",
            TransformationKey::Overlay => "overlay",
            TransformationKey::Opacity => "opacity",
            TransformationKey::Prefix => "prefix",
            TransformationKey::Page => "page",
            TransformationKey::Quality => "quality",
            TransformationKey::Radius => "radius",
            TransformationKey::StartOffset => "start_offset",
            TransformationKey::Named => "transformation",
            TransformationKey::Underlay => "underlay",
            TransformationKey::VideoCodec => "video_codec",
            TransformationKey::VideoSampling => "video_sampling",
            TransformationKey::Width => "width",
            TransformationKey::X => "x",
            TransformationKey::Y => "y",
            TransformationKey::Zoom => "zoom",
        }
    }

    /// Look up a key by long name or short code.
    pub fn lookup(name: &str) -> Option<TransformationKey> {
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.name() == name || k.code() == name)
    }
}
