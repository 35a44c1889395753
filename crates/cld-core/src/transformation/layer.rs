//! Overlay and underlay layer values.

use crate::error::{CloudinaryError, Result};
use crate::url::smart_encode;

/// An uploaded asset used as an overlay or underlay.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Layer {
    public_id: Option<String>,
    format: Option<String>,
    resource_type: Option<String>,
    delivery_type: Option<String>,
}

impl Layer {
    pub fn new(public_id: impl Into<String>) -> Self {
        Self {
            public_id: Some(public_id.into()),
            ..Default::default()
        }
    }

    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn resource_type(mut self, resource_type: impl Into<String>) -> Self {
        self.resource_type = Some(resource_type.into());
        self
    }

    pub fn delivery_type(mut self, delivery_type: impl Into<String>) -> Self {
        self.delivery_type = Some(delivery_type.into());
        self
    }

    /// `[resource_type:][type:]public_id[.format]`, folders separated by `:`.
    pub fn render(&self) -> Result<String> {
        let public_id = self
            .public_id
            .as_deref()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| CloudinaryError::invalid("Must supply public_id for non-text layer"))?;

        let mut components = Vec::with_capacity(3);
        if let Some(rt) = self.resource_type.as_deref().filter(|rt| *rt != "image") {
            components.push(rt.to_string());
        }
        if let Some(t) = self.delivery_type.as_deref().filter(|t| *t != "upload") {
            components.push(t.to_string());
        }
        let id = match self.format.as_deref().filter(|f| !f.is_empty()) {
            Some(format) => format!("{}.{}", public_id, format),
            None => public_id.to_string(),
        };
        components.push(id.replace('/', ":"));
        Ok(components.join(":"))
    }
}

/// A text caption rendered by the service.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextLayer {
    text: Option<String>,
    public_id: Option<String>,
    font_family: Option<String>,
    font_size: Option<String>,
    font_weight: Option<String>,
    font_style: Option<String>,
    text_decoration: Option<String>,
    text_align: Option<String>,
    stroke: Option<String>,
    letter_spacing: Option<String>,
    line_spacing: Option<String>,
}

impl TextLayer {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    /// Text stored on the service under a public id (created via the `text` action).
    pub fn from_public_id(public_id: impl Into<String>) -> Self {
        Self {
            public_id: Some(public_id.into()),
            ..Default::default()
        }
    }

    pub fn font_family(mut self, family: impl Into<String>) -> Self {
        self.font_family = Some(family.into());
        self
    }

    pub fn font_size(mut self, size: u32) -> Self {
        self.font_size = Some(size.to_string());
        self
    }

    pub fn font_weight(mut self, weight: impl Into<String>) -> Self {
        self.font_weight = Some(weight.into());
        self
    }

    pub fn font_style(mut self, style: impl Into<String>) -> Self {
        self.font_style = Some(style.into());
        self
    }

    pub fn text_decoration(mut self, decoration: impl Into<String>) -> Self {
        self.text_decoration = Some(decoration.into());
        self
    }

    pub fn text_align(mut self, align: impl Into<String>) -> Self {
        self.text_align = Some(align.into());
        self
    }

    pub fn stroke(mut self, stroke: impl Into<String>) -> Self {
        self.stroke = Some(stroke.into());
        self
    }

    pub fn letter_spacing(mut self, spacing: f64) -> Self {
        self.letter_spacing = Some(spacing.to_string());
        self
    }

    pub fn line_spacing(mut self, spacing: f64) -> Self {
        self.line_spacing = Some(spacing.to_string());
        self
    }

    pub fn render(&self) -> Result<String> {
        let text = self.text.as_deref().filter(|t| !t.is_empty());
        let public_id = self.public_id.as_deref().filter(|p| !p.is_empty());
        if text.is_none() && public_id.is_none() {
            return Err(CloudinaryError::invalid("Must supply either text or public_id for text layer"));
        }

        let mut components = vec!["text".to_string()];

        let style = self.style_token()?;
        if !style.is_empty() {
            components.push(style);
        }
        if let Some(public_id) = public_id {
            components.push(public_id.replace('/', ":"));
        }
        if let Some(text) = text {
            // Commas and slashes are double escaped so the service does not
            // read them as transformation separators
            let encoded = smart_encode(text)
                .replace("%2C", "%252C")
                .replace('/', "%252F");
            components.push(encoded);
        }
        Ok(components.join(":"))
    }

    fn style_token(&self) -> Result<String> {
        let mut mandatory = Vec::with_capacity(2);
        if let Some(family) = &self.font_family {
            mandatory.push(family.clone());
        }
        if let Some(size) = &self.font_size {
            mandatory.push(size.clone());
        }

        let mut optional = Vec::new();
        let skip_default = |value: &Option<String>, default: &str| {
            value.as_deref().filter(|v| !v.is_empty() && *v != default).map(str::to_string)
        };
        optional.extend(skip_default(&self.font_weight, "normal"));
        optional.extend(skip_default(&self.font_style, "normal"));
        optional.extend(skip_default(&self.text_decoration, "none"));
        optional.extend(skip_default(&self.stroke, "none"));
        optional.extend(skip_default(&self.text_align, ""));
        if let Some(spacing) = self.letter_spacing.as_deref().filter(|s| !s.is_empty()) {
            optional.push(format!("letter_spacing_{}", spacing));
        }
        if let Some(spacing) = self.line_spacing.as_deref().filter(|s| !s.is_empty()) {
            optional.push(format!("line_spacing_{}", spacing));
        }

        if !optional.is_empty() && mandatory.len() < 2 {
            return Err(CloudinaryError::invalid(
                "Must supply font_family and font_size for text layer styling",
            ));
        }
        mandatory.extend(optional);
        Ok(mandatory.join("_"))
    }
}

/// Either kind of layer, as stored in a transformation parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum LayerSpec {
    Asset(Layer),
    Text(TextLayer),
}

impl LayerSpec {
    pub fn render(&self) -> Result<String> {
        match self {
            LayerSpec::Asset(layer) => layer.render(),
            LayerSpec::Text(layer) => layer.render(),
        }
    }
}

impl From<Layer> for LayerSpec {
    fn from(layer: Layer) -> Self {
        LayerSpec::Asset(layer)
    }
}

impl From<TextLayer> for LayerSpec {
    fn from(layer: TextLayer) -> Self {
        LayerSpec::Text(layer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_layer() {
        assert_eq!(Layer::new("logo").render().unwrap(), "logo");
        assert_eq!(Layer::new("brand/logo").format("png").render().unwrap(), "brand:logo.png");
    }

    #[test]
    fn test_layer_with_resource_and_delivery_type() {
        let layer = Layer::new("intro").resource_type("video").delivery_type("private");
        assert_eq!(layer.render().unwrap(), "video:private:intro");
        let layer = Layer::new("logo").resource_type("image").delivery_type("upload");
        assert_eq!(layer.render().unwrap(), "logo");
    }

    #[test]
    fn test_layer_requires_public_id() {
        assert!(Layer::default().render().is_err());
    }

    #[test]
    fn test_text_layer() {
        let layer = TextLayer::new("Hello World").font_family("Arial").font_size(18);
        assert_eq!(layer.render().unwrap(), "text:Arial_18:Hello%20World");
    }

    #[test]
    fn test_text_layer_styles_skip_defaults() {
        let layer = TextLayer::new("Hi")
            .font_family("Arial")
            .font_size(18)
            .font_weight("bold")
            .font_style("normal")
            .text_decoration("underline")
            .letter_spacing(4.0);
        assert_eq!(
            layer.render().unwrap(),
            "text:Arial_18_bold_underline_letter_spacing_4:Hi"
        );
    }

    #[test]
    fn test_text_layer_double_escapes_separators() {
        let layer = TextLayer::new("a,b/c").font_family("Arial").font_size(12);
        assert_eq!(layer.render().unwrap(), "text:Arial_12:a%252Cb%252Fc");
    }

    #[test]
    fn test_text_layer_from_public_id() {
        let layer = TextLayer::from_public_id("captions/sample");
        assert_eq!(layer.render().unwrap(), "text:captions:sample");
    }

    #[test]
    fn test_text_layer_style_without_font_is_invalid() {
        let layer = TextLayer::new("Hi").font_weight("bold");
        assert!(matches!(layer.render(), Err(CloudinaryError::InvalidArgument(_))));
    }

    #[test]
    fn test_text_layer_requires_content() {
        assert!(TextLayer::default().font_family("Arial").font_size(12).render().is_err());
    }
}
