use std::fmt;

use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::render::{GlyphElement, StyleBag, StyleProperty, TextTarget, Transform};

/// CSS length used for glyph placement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Length {
    Px(f64),
    Percent(f64),
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Length::Px(value) => write!(f, "{value}px"),
            Length::Percent(value) => write!(f, "{value}%"),
        }
    }
}

/// Absolute position and size of one glyph, fixed for the whole session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub left: Length,
    pub top: Length,
    pub font_size_rem: f64,
    pub width_px: Option<f64>,
    pub z_index: i32,
    /// Transform the glyph starts with before the first tick.
    pub initial_transform: Transform,
}

/// Strategy assigning an initial placement to glyph `index` of `count`.
pub trait GlyphLayout {
    fn place(&self, index: usize, count: usize, rng: &mut StdRng) -> Placement;
}

/// Built-in layout policies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LayoutPolicy {
    /// Fixed pixel step from a left origin, vertically centred.
    EvenlySpaced {
        origin_px: f64,
        step_px: f64,
        width_px: f64,
        font_size_rem: f64,
    },
    /// One percentage column per glyph with random offset and height.
    PercentScatter {
        font_size_rem: f64,
        top_min: f64,
        top_max: f64,
    },
    /// Columns across the whole viewport, random height and starting transform.
    ViewportScatter {
        font_size_rem: f64,
        max_rotation_deg: f64,
        min_scale: f64,
        max_scale: f64,
    },
}

impl Default for LayoutPolicy {
    fn default() -> Self {
        LayoutPolicy::EvenlySpaced {
            origin_px: 75.0,
            step_px: 50.0,
            width_px: 60.0,
            font_size_rem: 3.5,
        }
    }
}

impl LayoutPolicy {
    pub fn percent_scatter() -> Self {
        LayoutPolicy::PercentScatter {
            font_size_rem: 3.0,
            top_min: 30.0,
            top_max: 70.0,
        }
    }

    pub fn viewport_scatter() -> Self {
        LayoutPolicy::ViewportScatter {
            font_size_rem: 4.0,
            max_rotation_deg: 180.0,
            min_scale: 0.5,
            max_scale: 1.5,
        }
    }
}

impl GlyphLayout for LayoutPolicy {
    fn place(&self, index: usize, count: usize, rng: &mut StdRng) -> Placement {
        let z_index = 10 + index as i32;
        match *self {
            LayoutPolicy::EvenlySpaced {
                origin_px,
                step_px,
                width_px,
                font_size_rem,
            } => Placement {
                left: Length::Px(origin_px + index as f64 * step_px),
                top: Length::Percent(50.0),
                font_size_rem,
                width_px: Some(width_px),
                z_index,
                initial_transform: Transform::IDENTITY,
            },
            LayoutPolicy::PercentScatter {
                font_size_rem,
                top_min,
                top_max,
            } => Placement {
                left: Length::Percent(column_percent(index, count, 10.0, 80.0, rng)),
                top: Length::Percent(random_between(rng, top_min, top_max)),
                font_size_rem,
                width_px: None,
                z_index,
                initial_transform: Transform::IDENTITY,
            },
            LayoutPolicy::ViewportScatter {
                font_size_rem,
                max_rotation_deg,
                min_scale,
                max_scale,
            } => Placement {
                left: Length::Percent(column_percent(index, count, 0.0, 95.0, rng)),
                top: Length::Percent(random_between(rng, 5.0, 90.0)),
                font_size_rem,
                width_px: None,
                z_index,
                initial_transform: Transform {
                    scale: random_between(rng, min_scale, max_scale),
                    rotate_deg: random_between(rng, -max_rotation_deg, max_rotation_deg),
                    ..Transform::IDENTITY
                },
            },
        }
    }
}

/// Left edge inside glyph `index`'s column, so columns never overlap.
fn column_percent(index: usize, count: usize, start: f64, span: f64, rng: &mut StdRng) -> f64 {
    let column = span / count.max(1) as f64;
    let jitter = random_between(rng, 0.1, 0.9);
    start + (index as f64 + jitter) * column
}

fn random_between(rng: &mut StdRng, low: f64, high: f64) -> f64 {
    if high > low {
        rng.random_range(low..high)
    } else {
        low
    }
}

/// Builds the layout RNG, reproducible when a seed is given.
pub fn layout_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_rng(&mut rand::rng()),
    }
}

/// Splits the target's text into one positioned glyph per character.
///
/// Returns the original text so the caller can restore it later.
pub fn decompose_text(
    target: &mut dyn TextTarget,
    layout: &dyn GlyphLayout,
    rng: &mut StdRng,
) -> String {
    let original = target.text_content();
    let count = original.chars().count();
    target.set_text_content("");

    for (index, character) in original.chars().enumerate() {
        let placement = layout.place(index, count, rng);
        let style = StyleBag::new().with(
            StyleProperty::Transform,
            placement.initial_transform.to_string(),
        );
        target.append_glyph(GlyphElement {
            character,
            index,
            placement,
            style,
        });
    }

    original
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{RenderTarget, TextBlock};

    fn positions(text: &TextBlock) -> Vec<(String, String)> {
        text.glyphs()
            .iter()
            .map(|glyph| {
                (
                    glyph.placement.left.to_string(),
                    glyph.placement.top.to_string(),
                )
            })
            .collect()
    }

    fn assert_distinct(text: &TextBlock) {
        let positions = positions(text);
        for (i, a) in positions.iter().enumerate() {
            for b in &positions[i + 1..] {
                assert_ne!(a, b, "glyphs share a position");
            }
        }
    }

    #[test]
    fn evenly_spaced_matches_fixed_offsets() {
        let mut text = TextBlock::new("DISCO");
        let mut rng = layout_rng(Some(1));
        let original = decompose_text(&mut text, &LayoutPolicy::default(), &mut rng);

        assert_eq!(original, "DISCO");
        assert_eq!(text.glyphs().len(), 5);
        let third = &text.glyphs()[2];
        assert_eq!(third.character, 'S');
        assert_eq!(third.placement.left, Length::Px(175.0));
        assert_eq!(third.placement.top, Length::Percent(50.0));
        assert_eq!(third.placement.z_index, 12);
        assert_eq!(third.placement.width_px, Some(60.0));
        assert_eq!(
            third.style.style(StyleProperty::Transform),
            Some("scale(1) rotate(0deg) translateY(0px) translateX(0px)")
        );
        assert_distinct(&text);
    }

    #[test]
    fn scatter_policies_keep_glyphs_apart() {
        for policy in [LayoutPolicy::percent_scatter(), LayoutPolicy::viewport_scatter()] {
            let mut text = TextBlock::new("party time!");
            let mut rng = layout_rng(Some(42));
            decompose_text(&mut text, &policy, &mut rng);

            assert_eq!(text.glyphs().len(), "party time!".chars().count());
            assert_eq!(text.text_content(), "party time!");
            assert_distinct(&text);
        }
    }

    #[test]
    fn seeded_layouts_are_reproducible() {
        let policy = LayoutPolicy::viewport_scatter();
        let mut first = TextBlock::new("abc");
        let mut second = TextBlock::new("abc");
        decompose_text(&mut first, &policy, &mut layout_rng(Some(7)));
        decompose_text(&mut second, &policy, &mut layout_rng(Some(7)));
        assert_eq!(first, second);
    }

    #[test]
    fn viewport_scatter_randomises_initial_transform() {
        let policy = LayoutPolicy::viewport_scatter();
        let mut rng = layout_rng(Some(3));
        let placement = policy.place(0, 4, &mut rng);
        let transform = placement.initial_transform;
        assert!((0.5..1.5).contains(&transform.scale));
        assert!(transform.rotate_deg.abs() <= 180.0);
        match placement.left {
            Length::Percent(left) => assert!((0.0..95.0 / 4.0).contains(&left)),
            Length::Px(_) => panic!("expected a percentage"),
        }
    }

    #[test]
    fn counts_characters_not_bytes() {
        let mut text = TextBlock::new("né🪩");
        decompose_text(&mut text, &LayoutPolicy::default(), &mut layout_rng(None));
        assert_eq!(text.glyphs().len(), 3);
        assert_eq!(text.glyphs()[2].character, '🪩');
    }
}
