//! Render target abstractions and the CSS values written into them.
//!
//! Targets are opaque property bags: the animator reads and writes style
//! properties by name and never assumes anything else about the host. The
//! in-memory [`StyleBag`] and [`TextBlock`] implementations back the command
//! line demo and the tests.

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

use crate::{mapping::VisualFrame, scene::Placement};

/// Style properties the animator may touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StyleProperty {
    Transform,
    Filter,
    Color,
    TextShadow,
    BackgroundColor,
}

impl StyleProperty {
    pub const ALL: [StyleProperty; 5] = [
        StyleProperty::Transform,
        StyleProperty::Filter,
        StyleProperty::Color,
        StyleProperty::TextShadow,
        StyleProperty::BackgroundColor,
    ];

    pub fn css_name(self) -> &'static str {
        match self {
            StyleProperty::Transform => "transform",
            StyleProperty::Filter => "filter",
            StyleProperty::Color => "color",
            StyleProperty::TextShadow => "text-shadow",
            StyleProperty::BackgroundColor => "background-color",
        }
    }
}

/// Mutable visual-style surface of a host element.
pub trait RenderTarget {
    fn style(&self, property: StyleProperty) -> Option<&str>;

    /// Sets or, with `None`, clears a property.
    fn set_style(&mut self, property: StyleProperty, value: Option<String>);
}

/// Text element that can be decomposed into per-character glyph children.
pub trait TextTarget: RenderTarget {
    /// Visible text: the glyph characters while decomposed, the plain content otherwise.
    fn text_content(&self) -> String;

    /// Replaces the element's content with plain text, dropping any glyphs.
    fn set_text_content(&mut self, text: &str);

    fn append_glyph(&mut self, glyph: GlyphElement);

    fn glyphs(&self) -> &[GlyphElement];

    fn glyphs_mut(&mut self) -> &mut [GlyphElement];
}

/// Plain property map implementing [`RenderTarget`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleBag {
    properties: BTreeMap<StyleProperty, String>,
}

impl StyleBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, property: StyleProperty, value: impl Into<String>) -> Self {
        self.properties.insert(property, value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Inline declaration block, e.g. `transform: scale(1); color: red`.
    pub fn to_css(&self) -> String {
        self.properties
            .iter()
            .map(|(property, value)| format!("{}: {value}", property.css_name()))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

impl RenderTarget for StyleBag {
    fn style(&self, property: StyleProperty) -> Option<&str> {
        self.properties.get(&property).map(String::as_str)
    }

    fn set_style(&mut self, property: StyleProperty, value: Option<String>) {
        match value {
            Some(value) => {
                self.properties.insert(property, value);
            }
            None => {
                self.properties.remove(&property);
            }
        }
    }
}

/// One character of a decomposed text target.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphElement {
    pub character: char,
    pub index: usize,
    pub placement: Placement,
    pub style: StyleBag,
}

/// In-memory text element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextBlock {
    style: StyleBag,
    content: String,
    glyphs: Vec<GlyphElement>,
}

impl TextBlock {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            style: StyleBag::default(),
            content: content.into(),
            glyphs: Vec::new(),
        }
    }
}

impl RenderTarget for TextBlock {
    fn style(&self, property: StyleProperty) -> Option<&str> {
        self.style.style(property)
    }

    fn set_style(&mut self, property: StyleProperty, value: Option<String>) {
        self.style.set_style(property, value);
    }
}

impl TextTarget for TextBlock {
    fn text_content(&self) -> String {
        if self.glyphs.is_empty() {
            self.content.clone()
        } else {
            self.glyphs.iter().map(|glyph| glyph.character).collect()
        }
    }

    fn set_text_content(&mut self, text: &str) {
        self.glyphs.clear();
        self.content = text.to_string();
    }

    fn append_glyph(&mut self, glyph: GlyphElement) {
        // Children replace the plain text node.
        self.content.clear();
        self.glyphs.push(glyph);
    }

    fn glyphs(&self) -> &[GlyphElement] {
        &self.glyphs
    }

    fn glyphs_mut(&mut self) -> &mut [GlyphElement] {
        &mut self.glyphs
    }
}

/// The four render targets driven by a disco session.
pub struct TargetSet {
    image: Box<dyn RenderTarget>,
    container: Box<dyn RenderTarget>,
    text: Box<dyn TextTarget>,
    background: Box<dyn RenderTarget>,
}

impl TargetSet {
    pub fn new(
        image: impl RenderTarget + 'static,
        container: impl RenderTarget + 'static,
        text: impl TextTarget + 'static,
        background: impl RenderTarget + 'static,
    ) -> Self {
        Self {
            image: Box::new(image),
            container: Box::new(container),
            text: Box::new(text),
            background: Box::new(background),
        }
    }

    /// In-memory page with unstyled elements and the given body background.
    pub fn page(text: &str, background: &str) -> Self {
        Self::new(
            StyleBag::new(),
            StyleBag::new(),
            TextBlock::new(text),
            StyleBag::new().with(StyleProperty::BackgroundColor, background),
        )
    }

    pub fn image(&self) -> &dyn RenderTarget {
        self.image.as_ref()
    }

    pub fn container(&self) -> &dyn RenderTarget {
        self.container.as_ref()
    }

    pub fn text(&self) -> &dyn TextTarget {
        self.text.as_ref()
    }

    pub fn text_mut(&mut self) -> &mut dyn TextTarget {
        self.text.as_mut()
    }

    pub fn background(&self) -> &dyn RenderTarget {
        self.background.as_ref()
    }

    /// Writes one computed frame into the targets.
    pub fn apply(&mut self, frame: &VisualFrame) {
        self.image
            .set_style(StyleProperty::Transform, Some(frame.image.transform.to_string()));
        self.image
            .set_style(StyleProperty::Filter, Some(frame.image.filter.to_string()));
        self.container
            .set_style(StyleProperty::Transform, Some(frame.container.to_string()));
        self.background
            .set_style(StyleProperty::BackgroundColor, Some(frame.background.to_string()));

        for (glyph, params) in self.text.glyphs_mut().iter_mut().zip(&frame.glyphs) {
            let style = &mut glyph.style;
            style.set_style(StyleProperty::Transform, Some(params.transform.to_string()));
            style.set_style(StyleProperty::Color, Some(params.color.to_string()));
            style.set_style(StyleProperty::TextShadow, Some(params.glow.to_string()));
            style.set_style(StyleProperty::Filter, Some(params.filter.to_string()));
        }
    }
}

impl fmt::Debug for TargetSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetSet")
            .field("text", &self.text.text_content())
            .field("glyphs", &self.text.glyphs().len())
            .finish()
    }
}

/// Pre-session values of every style property plus the original text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleSnapshot {
    image: PropertySnapshot,
    container: PropertySnapshot,
    text: PropertySnapshot,
    background: PropertySnapshot,
    text_content: String,
}

type PropertySnapshot = Vec<(StyleProperty, Option<String>)>;

impl StyleSnapshot {
    pub fn capture(targets: &TargetSet) -> Self {
        Self {
            image: capture(targets.image()),
            container: capture(targets.container()),
            text: capture(targets.text()),
            background: capture(targets.background()),
            text_content: targets.text().text_content(),
        }
    }

    pub fn text_content(&self) -> &str {
        &self.text_content
    }

    /// Puts every captured value back verbatim and drops glyph children.
    pub fn restore(&self, targets: &mut TargetSet) {
        restore(targets.image.as_mut(), &self.image);
        restore(targets.container.as_mut(), &self.container);
        restore(targets.background.as_mut(), &self.background);

        let text = targets.text.as_mut();
        text.set_text_content(&self.text_content);
        for (property, value) in &self.text {
            text.set_style(*property, value.clone());
        }
    }
}

fn capture<T: RenderTarget + ?Sized>(target: &T) -> PropertySnapshot {
    StyleProperty::ALL
        .iter()
        .map(|property| (*property, target.style(*property).map(str::to_string)))
        .collect()
}

fn restore(target: &mut dyn RenderTarget, snapshot: &PropertySnapshot) {
    for (property, value) in snapshot {
        target.set_style(*property, value.clone());
    }
}

/// Number formatted for CSS: rounded to three decimals, no trailing zeros.
#[derive(Debug, Clone, Copy)]
struct Num(f64);

impl fmt::Display for Num {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rounded = (self.0 * 1000.0).round() / 1000.0;
        if rounded == 0.0 || !rounded.is_finite() {
            f.write_str("0")
        } else {
            write!(f, "{rounded}")
        }
    }
}

/// 2D transform applied in the order scale, rotate, translateY, translateX, skew.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub scale: f64,
    pub rotate_deg: f64,
    pub translate_x_px: f64,
    pub translate_y_px: f64,
    pub skew_deg: Option<(f64, f64)>,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        scale: 1.0,
        rotate_deg: 0.0,
        translate_x_px: 0.0,
        translate_y_px: 0.0,
        skew_deg: None,
    };
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "scale({}) rotate({}deg) translateY({}px) translateX({}px)",
            Num(self.scale),
            Num(self.rotate_deg),
            Num(self.translate_y_px),
            Num(self.translate_x_px)
        )?;
        if let Some((x, y)) = self.skew_deg {
            write!(f, " skew({}deg, {}deg)", Num(x), Num(y))?;
        }
        Ok(())
    }
}

/// CSS filter chain; absent stages are omitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub hue_rotate_deg: Option<f64>,
    pub saturate: Option<f64>,
    pub brightness: Option<f64>,
    pub contrast: Option<f64>,
    pub blur_px: Option<f64>,
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stages = [
            self.hue_rotate_deg.map(|v| format!("hue-rotate({}deg)", Num(v))),
            self.saturate.map(|v| format!("saturate({})", Num(v))),
            self.brightness.map(|v| format!("brightness({})", Num(v))),
            self.contrast.map(|v| format!("contrast({})", Num(v))),
            self.blur_px.map(|v| format!("blur({}px)", Num(v))),
        ];
        let stages: Vec<String> = stages.into_iter().flatten().collect();
        if stages.is_empty() {
            f.write_str("none")
        } else {
            f.write_str(&stages.join(" "))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hsl {
    /// Degrees in `[0, 360)`.
    pub hue: f64,
    pub saturation: f64,
    pub lightness: f64,
}

impl Hsl {
    pub fn new(hue: f64, saturation: f64, lightness: f64) -> Self {
        Self {
            hue: hue.rem_euclid(360.0),
            saturation,
            lightness,
        }
    }
}

impl fmt::Display for Hsl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hsl({}, {}%, {}%)",
            Num(self.hue),
            Num(self.saturation),
            Num(self.lightness)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GlowLayer {
    pub blur_px: f64,
    pub color: Hsl,
}

/// Layered `text-shadow` glow, innermost first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextShadow {
    pub layers: Vec<GlowLayer>,
}

impl fmt::Display for TextShadow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.layers.is_empty() {
            return f.write_str("none");
        }
        let layers: Vec<String> = self
            .layers
            .iter()
            .map(|layer| format!("0 0 {}px {}", Num(layer.blur_px), layer.color))
            .collect();
        f.write_str(&layers.join(", "))
    }
}
