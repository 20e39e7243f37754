//! Beat-to-visual formulas.
//!
//! [`compute_frame`] is a pure function of the profile, the beat, the
//! playback time and the glyph count. Nothing carries over between frames.

use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

use crate::{
    render::{Filter, GlowLayer, Hsl, TextShadow, Transform},
    BeatRecord,
};

/// Coefficients for the image (mustache) target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageCoefficients {
    pub scale_base: f64,
    pub scale_gain: f64,
    /// Extra scale oscillating at the beat's tempo.
    pub tempo_pulse: f64,
    pub rotation_gain: f64,
    pub rotation_wobble: f64,
    pub lift: f64,
    pub bounce: f64,
    pub sway: f64,
    pub wave: f64,
    pub skew_x: f64,
    pub skew_y: f64,
    pub hue_wobble: f64,
    pub saturate_base: f64,
    pub saturate_gain: f64,
    pub brightness_base: f64,
    pub brightness_gain: f64,
    pub contrast_gain: f64,
    pub blur_gain: f64,
}

/// Coefficients for each text glyph; `*_step` terms grow with the glyph index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlyphCoefficients {
    pub intensity_base: f64,
    pub intensity_step: f64,
    pub energy_base: f64,
    pub energy_step: f64,
    /// Seconds of phase offset between neighbouring glyphs.
    pub phase_step: f64,
    pub wave: f64,
    pub bounce: f64,
    pub sway: f64,
    pub spin: f64,
    pub pulse: f64,
    pub scale_base: f64,
    pub scale_gain: f64,
    pub hue_step: f64,
    pub hue_speed: f64,
    pub glow_radii: [f64; 3],
    pub glow_gains: [f64; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerCoefficients {
    pub scale_base: f64,
    pub scale_rhythm: f64,
    pub scale_wobble: f64,
    pub rotation_rhythm: f64,
    pub rotation_wobble: f64,
    pub sway_x: f64,
    pub sway_y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackgroundCoefficients {
    pub hue_gain: f64,
    pub hue_speed: f64,
    pub saturation_base: f64,
    pub saturation_gain: f64,
    pub lightness_base: f64,
    pub lightness_gain: f64,
}

/// Complete set of animation constants for one intensity level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntensityProfile {
    /// Shared colour rotation driven by beat intensity.
    pub color_gain: f64,
    pub image: ImageCoefficients,
    pub glyph: GlyphCoefficients,
    pub container: ContainerCoefficients,
    pub background: BackgroundCoefficients,
}

impl Default for IntensityProfile {
    fn default() -> Self {
        Self::moderate()
    }
}

impl IntensityProfile {
    pub fn moderate() -> Self {
        Self {
            color_gain: 200.0,
            image: ImageCoefficients {
                scale_base: 0.8,
                scale_gain: 1.2,
                tempo_pulse: 0.0,
                rotation_gain: 180.0,
                rotation_wobble: 90.0,
                lift: 80.0,
                bounce: 30.0,
                sway: 60.0,
                wave: 40.0,
                skew_x: 15.0,
                skew_y: 10.0,
                hue_wobble: 90.0,
                saturate_base: 1.5,
                saturate_gain: 2.0,
                brightness_base: 0.8,
                brightness_gain: 0.8,
                contrast_gain: 0.5,
                blur_gain: 0.5,
            },
            glyph: GlyphCoefficients {
                intensity_base: 0.4,
                intensity_step: 0.05,
                energy_base: 0.5,
                energy_step: 0.03,
                phase_step: 0.3,
                wave: 25.0,
                bounce: 20.0,
                sway: 30.0,
                spin: 20.0,
                pulse: 0.3,
                scale_base: 0.9,
                scale_gain: 0.4,
                hue_step: 45.0,
                hue_speed: 60.0,
                glow_radii: [15.0, 25.0, 35.0],
                glow_gains: [25.0, 35.0, 45.0],
            },
            container: ContainerCoefficients {
                scale_base: 0.9,
                scale_rhythm: 0.02,
                scale_wobble: 0.1,
                rotation_rhythm: 0.3,
                rotation_wobble: 15.0,
                sway_x: 20.0,
                sway_y: 15.0,
            },
            background: BackgroundCoefficients {
                hue_gain: 180.0,
                hue_speed: 50.0,
                saturation_base: 50.0,
                saturation_gain: 20.0,
                lightness_base: 40.0,
                lightness_gain: 15.0,
            },
        }
    }

    /// Scales every movement amplitude by `factor`, leaving bases and colours.
    pub fn with_amplitude(mut self, factor: f64) -> Self {
        let image = &mut self.image;
        image.scale_gain *= factor;
        image.rotation_gain *= factor;
        image.rotation_wobble *= factor;
        image.lift *= factor;
        image.bounce *= factor;
        image.sway *= factor;
        image.wave *= factor;
        image.skew_x *= factor;
        image.skew_y *= factor;

        let glyph = &mut self.glyph;
        glyph.wave *= factor;
        glyph.bounce *= factor;
        glyph.sway *= factor;
        glyph.spin *= factor;
        glyph.pulse *= factor;

        let container = &mut self.container;
        container.scale_wobble *= factor;
        container.rotation_wobble *= factor;
        container.sway_x *= factor;
        container.sway_y *= factor;
        self
    }

    pub fn with_tempo_pulse(mut self, pulse: f64) -> Self {
        self.image.tempo_pulse = pulse;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageParams {
    pub transform: Transform,
    pub filter: Filter,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlyphParams {
    pub transform: Transform,
    pub color: Hsl,
    pub glow: TextShadow,
    pub filter: Filter,
}

/// Everything one tick writes into the render targets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisualFrame {
    pub time: f64,
    pub beat_time: f64,
    pub image: ImageParams,
    pub container: Transform,
    pub background: Hsl,
    pub glyphs: Vec<GlyphParams>,
}

pub fn compute_frame(
    profile: &IntensityProfile,
    beat: &BeatRecord,
    time: f64,
    glyph_count: usize,
) -> VisualFrame {
    VisualFrame {
        time,
        beat_time: beat.time,
        image: image_params(profile, beat, time),
        container: container_transform(&profile.container, beat, time),
        background: background_color(&profile.background, beat, time),
        glyphs: (0..glyph_count)
            .map(|index| glyph_params(profile, beat, time, index))
            .collect(),
    }
}

pub fn image_params(profile: &IntensityProfile, beat: &BeatRecord, t: f64) -> ImageParams {
    let c = &profile.image;
    let i = beat.intensity;
    let tempo = c.tempo_pulse * (TAU * t * beat.bpm / 60.0).sin();

    let transform = Transform {
        scale: c.scale_base + i * c.scale_gain + tempo,
        rotate_deg: i * c.rotation_gain + (t * 10.0).sin() * c.rotation_wobble,
        translate_y_px: -i * c.lift + (t * 12.0).cos() * i * c.bounce,
        translate_x_px: (t * 10.0).sin() * i * c.sway + (t * 8.0).sin() * i * c.wave,
        skew_deg: Some((
            (t * 15.0).sin() * i * c.skew_x,
            (t * 18.0).cos() * i * c.skew_y,
        )),
    };
    let filter = Filter {
        hue_rotate_deg: Some(i * profile.color_gain + (t * 20.0).sin() * c.hue_wobble),
        saturate: Some(c.saturate_base + i * c.saturate_gain),
        brightness: Some(c.brightness_base + i * c.brightness_gain),
        contrast: Some(1.0 + i * c.contrast_gain),
        blur_px: Some(i * c.blur_gain),
    };

    ImageParams { transform, filter }
}

pub fn glyph_params(
    profile: &IntensityProfile,
    beat: &BeatRecord,
    t: f64,
    index: usize,
) -> GlyphParams {
    let c = &profile.glyph;
    let k = index as f64;
    let li = beat.intensity * (c.intensity_base + k * c.intensity_step);
    let le = beat.energy * (c.energy_base + k * c.energy_step);
    let phase = t + k * c.phase_step;

    let wave = (phase * 4.0).sin() * li * c.wave;
    let bounce = (phase * 6.0).cos() * le * c.bounce;
    let sway = (phase * 3.0).sin() * li * c.sway;
    let spin = (phase * 5.0).cos() * li * c.spin;
    let pulse = (phase * 8.0).sin() * li * c.pulse;

    let hue = beat.intensity * profile.color_gain + k * c.hue_step + t * c.hue_speed;
    let glow = TextShadow {
        layers: [(0.0, 80.0), (120.0, 60.0), (240.0, 40.0)]
            .iter()
            .enumerate()
            .map(|(layer, (shift, lightness))| GlowLayer {
                blur_px: c.glow_radii[layer] + li * c.glow_gains[layer],
                color: Hsl::new(hue + shift, 100.0, *lightness),
            })
            .collect(),
    };

    GlyphParams {
        transform: Transform {
            scale: c.scale_base + li * c.scale_gain + pulse,
            rotate_deg: spin,
            translate_x_px: sway,
            translate_y_px: wave + bounce,
            skew_deg: None,
        },
        color: Hsl::new(hue, 70.0 + li * 20.0, 40.0 + le * 25.0),
        glow,
        filter: Filter {
            hue_rotate_deg: Some(li * 180.0),
            saturate: Some(1.2 + li * 1.5),
            brightness: Some(0.7 + le * 0.8),
            contrast: None,
            blur_px: None,
        },
    }
}

pub fn container_transform(c: &ContainerCoefficients, beat: &BeatRecord, t: f64) -> Transform {
    let i = beat.intensity;
    let rs = beat.rhythm_speed;
    Transform {
        scale: c.scale_base + rs * c.scale_rhythm + (t * 4.0).sin() * c.scale_wobble,
        rotate_deg: rs * c.rotation_rhythm + (t * 6.0).cos() * c.rotation_wobble,
        translate_x_px: (t * 3.0).sin() * i * c.sway_x,
        translate_y_px: (t * 4.0).cos() * i * c.sway_y,
        skew_deg: None,
    }
}

pub fn background_color(c: &BackgroundCoefficients, beat: &BeatRecord, t: f64) -> Hsl {
    let i = beat.intensity;
    Hsl::new(
        i * c.hue_gain + t * c.hue_speed,
        c.saturation_base + i * c.saturation_gain,
        c.lightness_base + i * c.lightness_gain,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn beat() -> BeatRecord {
        BeatRecord::new(1.0, 0.5, 0.4, 120.0, 2.0)
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn frames_are_pure() {
        let profile = IntensityProfile::moderate().with_tempo_pulse(0.2);
        let first = compute_frame(&profile, &beat(), 1.37, 6);
        let second = compute_frame(&profile, &beat(), 1.37, 6);
        assert_eq!(first, second);
        assert_eq!(first.glyphs.len(), 6);
        assert_eq!(first.beat_time, 1.0);
    }

    #[test]
    fn moderate_image_at_time_zero() {
        let params = image_params(&IntensityProfile::moderate(), &beat(), 0.0);
        let transform = params.transform;
        assert!(close(transform.scale, 1.4));
        assert!(close(transform.rotate_deg, 90.0));
        // -0.5 * 80 + cos(0) * 0.5 * 30
        assert!(close(transform.translate_y_px, -25.0));
        assert!(close(transform.translate_x_px, 0.0));
        let (skew_x, skew_y) = transform.skew_deg.unwrap();
        assert!(close(skew_x, 0.0));
        assert!(close(skew_y, 5.0));

        let filter = params.filter;
        assert!(close(filter.hue_rotate_deg.unwrap(), 100.0));
        assert!(close(filter.saturate.unwrap(), 2.5));
        assert!(close(filter.brightness.unwrap(), 1.2));
        assert!(close(filter.contrast.unwrap(), 1.25));
        assert!(close(filter.blur_px.unwrap(), 0.25));
    }

    #[test]
    fn neighbouring_glyphs_move_out_of_phase() {
        let profile = IntensityProfile::moderate();
        let a = glyph_params(&profile, &beat(), 2.0, 0);
        let b = glyph_params(&profile, &beat(), 2.0, 1);
        assert_ne!(a.transform, b.transform);
        assert!(close(b.color.hue - a.color.hue, 45.0));
        assert_eq!(a.glow.layers.len(), 3);
        assert!(a.glow.layers[0].blur_px < a.glow.layers[2].blur_px);
        assert!(close(a.glow.layers[1].color.hue, (a.color.hue + 120.0) % 360.0));
    }

    #[test]
    fn container_follows_rhythm_speed() {
        let c = IntensityProfile::moderate().container;
        let transform = container_transform(&c, &beat(), 0.0);
        assert!(close(transform.scale, 0.94));
        assert!(close(transform.rotate_deg, 15.6));
        assert!(close(transform.translate_y_px, 7.5));
    }

    #[test]
    fn background_hue_advances_with_time() {
        let c = IntensityProfile::moderate().background;
        let color = background_color(&c, &beat(), 0.0);
        assert!(close(color.hue, 90.0));
        assert!(close(color.saturation, 60.0));
        assert!(close(color.lightness, 47.5));

        let later = background_color(&c, &beat(), 6.0);
        assert!(close(later.hue, 30.0));
    }

    #[test]
    fn amplitude_scaling_leaves_bases_alone() {
        let wild = IntensityProfile::moderate().with_amplitude(2.0);
        assert_eq!(wild.image.scale_base, 0.8);
        assert_eq!(wild.image.lift, 160.0);
        assert_eq!(wild.glyph.hue_step, 45.0);
        assert_eq!(wild.container.sway_x, 40.0);

        let still = IntensityProfile::moderate().with_amplitude(0.0);
        let frame = image_params(&still, &beat(), 3.0);
        assert!(close(frame.transform.translate_x_px, 0.0));
        assert!(close(frame.transform.scale, 0.8));
    }
}
