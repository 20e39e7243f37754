use std::{fs, path::Path, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{AnimatorError, BeatRecord, Result, TimingSequence};

/// Direction of a detected tempo change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TempoChangeKind {
    Start,
    Increase,
    Decrease,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TempoChange {
    pub time: f64,
    pub bpm: f64,
    /// Difference from the previous tempo, zero for the first entry.
    #[serde(default)]
    pub change: f64,
    #[serde(rename = "type")]
    pub kind: TempoChangeKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyPeak {
    pub time: f64,
    pub energy: f64,
}

/// Stretch of near-silent audio, bounds inclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SilentPeriod {
    pub start: f64,
    pub end: f64,
    pub duration: f64,
    #[serde(default, alias = "avgEnergy")]
    pub avg_energy: f64,
}

impl SilentPeriod {
    pub fn contains(&self, time: f64) -> bool {
        time >= self.start && time <= self.end
    }
}

/// Summary statistics emitted alongside the beat list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisStats {
    pub duration: f64,
    pub total_beats: usize,
    pub average_bpm: f64,
    pub tempo_changes: usize,
    pub energy_peaks: usize,
    pub silent_periods: usize,
    pub rhythm_consistency: f64,
    pub mean_interval: f64,
    pub energy_range: [f64; 2],
    pub silence_threshold: f64,
}

/// Combined view of the track at one instant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AudioState<'a> {
    pub beat: &'a BeatRecord,
    pub tempo_change: Option<&'a TempoChange>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SilenceInfo<'a> {
    pub period: &'a SilentPeriod,
    pub time_in_silence: f64,
}

/// Offline analysis output for a single track (`audio_analysis.json`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisDocument {
    pub beats: TimingSequence,
    #[serde(default)]
    pub tempo_changes: Vec<TempoChange>,
    #[serde(default)]
    pub energy_peaks: Vec<EnergyPeak>,
    #[serde(default)]
    pub silent_periods: Vec<SilentPeriod>,
    #[serde(default)]
    pub stats: AnalysisStats,
}

impl AnalysisDocument {
    /// Reads and validates a timing map from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)?;
        let document: Self = raw.parse()?;
        tracing::debug!(
            path = %path.display(),
            beats = document.beats.len(),
            silences = document.silent_periods.len(),
            "loaded timing map"
        );
        Ok(document)
    }

    /// Beat, tempo change and silence lookups at `time`.
    ///
    /// Returns `None` only when the document holds no beats.
    pub fn audio_state(&self, time: f64) -> Option<AudioState<'_>> {
        let beat = self.beats.nearest(time)?;
        Some(AudioState {
            beat,
            tempo_change: self.tempo_at(time),
        })
    }

    /// Latest tempo change at or before `time`, falling back to the first.
    pub fn tempo_at(&self, time: f64) -> Option<&TempoChange> {
        let mut current = self.tempo_changes.first();
        for change in &self.tempo_changes {
            if change.time <= time {
                current = Some(change);
            } else {
                break;
            }
        }
        current
    }

    pub fn silence_at(&self, time: f64) -> Option<SilenceInfo<'_>> {
        silence_at(&self.silent_periods, time)
    }

    pub fn is_silent(&self, time: f64) -> bool {
        self.silence_at(time).is_some()
    }
}

impl FromStr for AnalysisDocument {
    type Err = AnimatorError;

    fn from_str(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

pub(crate) fn silence_at(periods: &[SilentPeriod], time: f64) -> Option<SilenceInfo<'_>> {
    periods
        .iter()
        .find(|period| period.contains(time))
        .map(|period| SilenceInfo {
            period,
            time_in_silence: time - period.start,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "beats": [
            { "time": 0.0, "intensity": 0.2, "type": "weak", "bpm": 120.0, "rhythm_speed": 2.0, "energy": 0.5, "interval": 0.5 },
            { "time": 0.5, "intensity": 0.9, "type": "strong", "bpm": 120.0, "rhythm_speed": 2.0, "energy": 0.7, "interval": 0.5 },
            { "time": 4.0, "intensity": 0.6, "type": "weak", "bpm": 96.0, "rhythm_speed": 0.29, "energy": 0.5, "interval": 3.5 }
        ],
        "tempo_changes": [
            { "time": 0.0, "bpm": 120.0, "change": 0.0, "type": "start" },
            { "time": 3.0, "bpm": 96.0, "change": -24.0, "type": "decrease" }
        ],
        "energy_peaks": [ { "time": 0.5, "energy": 0.7 } ],
        "silent_periods": [ { "start": 1.0, "end": 2.5, "duration": 1.5, "avg_energy": 0.001 } ],
        "stats": {
            "duration": 5.0, "total_beats": 3, "average_bpm": 36.0, "tempo_changes": 2,
            "energy_peaks": 1, "silent_periods": 1, "rhythm_consistency": 0.4,
            "mean_interval": 2.0, "energy_range": [0.0, 0.7], "silence_threshold": 0.004
        }
    }"#;

    #[test]
    fn parses_full_document() {
        let document: AnalysisDocument = SAMPLE.parse().unwrap();
        assert_eq!(document.beats.len(), 3);
        assert_eq!(document.tempo_changes[1].kind, TempoChangeKind::Decrease);
        assert_eq!(document.stats.total_beats, 3);
        assert_eq!(document.stats.energy_range, [0.0, 0.7]);
    }

    #[test]
    fn beats_alone_are_enough() {
        let document: AnalysisDocument = r#"{ "beats": [] }"#.parse().unwrap();
        assert!(document.beats.is_empty());
        assert!(document.audio_state(1.0).is_none());
        assert!(document.tempo_at(1.0).is_none());
    }

    #[test]
    fn rejects_unordered_beats() {
        let raw = r#"{ "beats": [
            { "time": 2.0, "intensity": 0.2, "bpm": 1.0, "rhythm_speed": 1.0, "energy": 0.1 },
            { "time": 1.0, "intensity": 0.2, "bpm": 1.0, "rhythm_speed": 1.0, "energy": 0.1 }
        ] }"#;
        let err = raw.parse::<AnalysisDocument>().unwrap_err();
        assert!(matches!(err, AnimatorError::Json(_)));
    }

    #[test]
    fn audio_state_tracks_tempo_changes() {
        let document: AnalysisDocument = SAMPLE.parse().unwrap();

        let early = document.audio_state(0.4).unwrap();
        assert_eq!(early.beat.time, 0.5);
        assert_eq!(early.tempo_change.unwrap().bpm, 120.0);

        let late = document.audio_state(3.2).unwrap();
        assert_eq!(late.beat.time, 4.0);
        assert_eq!(late.tempo_change.unwrap().kind, TempoChangeKind::Decrease);
    }

    #[test]
    fn reports_time_spent_in_silence() {
        let document: AnalysisDocument = SAMPLE.parse().unwrap();
        let info = document.silence_at(1.75).unwrap();
        assert_eq!(info.period.end, 2.5);
        assert!((info.time_in_silence - 0.75).abs() < 1e-9);

        assert!(document.is_silent(2.5));
        assert!(!document.is_silent(2.6));
        assert!(!document.is_silent(0.2));
    }

    #[test]
    fn load_reports_missing_files() {
        let err = AnalysisDocument::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, AnimatorError::Io(_)));
    }
}
