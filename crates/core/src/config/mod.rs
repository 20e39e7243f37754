use std::{fmt, fs, path::Path, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{scene::LayoutPolicy, AnimatorError, IntensityProfile, Result};

/// Named combinations of intensity profile and glyph layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    Gentle,
    #[default]
    Moderate,
    Intense,
    Frenzy,
}

impl Preset {
    pub const ALL: [Preset; 4] = [Preset::Gentle, Preset::Moderate, Preset::Intense, Preset::Frenzy];

    pub fn name(self) -> &'static str {
        match self {
            Preset::Gentle => "gentle",
            Preset::Moderate => "moderate",
            Preset::Intense => "intense",
            Preset::Frenzy => "frenzy",
        }
    }

    pub fn profile(self) -> IntensityProfile {
        match self {
            Preset::Gentle => IntensityProfile::moderate().with_amplitude(0.5),
            Preset::Moderate => IntensityProfile::moderate(),
            Preset::Intense => IntensityProfile::moderate()
                .with_amplitude(1.6)
                .with_tempo_pulse(0.1),
            Preset::Frenzy => IntensityProfile::moderate()
                .with_amplitude(2.5)
                .with_tempo_pulse(0.25),
        }
    }

    pub fn layout(self) -> LayoutPolicy {
        match self {
            Preset::Gentle | Preset::Moderate => LayoutPolicy::default(),
            Preset::Intense => LayoutPolicy::percent_scatter(),
            Preset::Frenzy => LayoutPolicy::viewport_scatter(),
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Preset {
    type Err = AnimatorError;

    fn from_str(value: &str) -> Result<Self> {
        Preset::ALL
            .into_iter()
            .find(|preset| preset.name().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| AnimatorError::UnknownPreset(value.to_string()))
    }
}

/// Top-level configuration for a disco session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimatorConfig {
    pub profile: IntensityProfile,
    pub layout: LayoutPolicy,
    /// Fixes the glyph layout randomness when set.
    pub layout_seed: Option<u64>,
    /// Page background used when building fresh in-memory targets.
    pub default_background: String,
    /// Skip visual updates while the timing map reports silence.
    pub rest_during_silence: bool,
}

impl Default for AnimatorConfig {
    fn default() -> Self {
        Self::from_preset(Preset::default())
    }
}

impl AnimatorConfig {
    pub fn from_preset(preset: Preset) -> Self {
        Self {
            profile: preset.profile(),
            layout: preset.layout(),
            layout_seed: None,
            default_background: "white".to_string(),
            rest_during_silence: false,
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
