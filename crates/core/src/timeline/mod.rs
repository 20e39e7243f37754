use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::{AnimatorError, Result};

/// Strength class the analysis tool assigns to each beat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BeatKind {
    Strong,
    #[default]
    Weak,
}

/// Audio-analysis attributes describing the music at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeatRecord {
    /// Seconds from the start of the track.
    pub time: f64,
    /// Onset strength normalised to `[0, 1]`.
    pub intensity: f64,
    /// Signal energy near the beat, nominally `[0, 1]`.
    pub energy: f64,
    pub bpm: f64,
    /// Beats per second derived from the preceding inter-beat interval.
    pub rhythm_speed: f64,
    #[serde(default, rename = "type")]
    pub kind: BeatKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<f64>,
}

impl BeatRecord {
    pub fn new(time: f64, intensity: f64, energy: f64, bpm: f64, rhythm_speed: f64) -> Self {
        Self {
            time,
            intensity,
            energy,
            bpm,
            rhythm_speed,
            kind: if intensity > 0.6 {
                BeatKind::Strong
            } else {
                BeatKind::Weak
            },
            interval: None,
        }
    }
}

/// Returns the record whose `time` is closest to `time`.
///
/// The scan is linear and keeps the first record on ties, so for a sorted
/// sequence the earlier beat wins. `None` is returned only for an empty slice.
pub fn find_nearest_beat(time: f64, beats: &[BeatRecord]) -> Option<&BeatRecord> {
    let mut nearest = None;
    let mut min_distance = f64::INFINITY;

    for beat in beats {
        let distance = (beat.time - time).abs();
        if distance < min_distance || nearest.is_none() {
            min_distance = distance;
            nearest = Some(beat);
        }
    }

    nearest
}

/// Time-ordered, read-only list of beats for one track.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<BeatRecord>", into = "Vec<BeatRecord>")]
pub struct TimingSequence {
    beats: Vec<BeatRecord>,
}

impl TimingSequence {
    /// Validates that every value is finite and times never decrease.
    pub fn new(beats: Vec<BeatRecord>) -> Result<Self> {
        for (index, beat) in beats.iter().enumerate() {
            let fields = [
                ("time", beat.time),
                ("intensity", beat.intensity),
                ("energy", beat.energy),
                ("bpm", beat.bpm),
                ("rhythm_speed", beat.rhythm_speed),
            ];
            if let Some((name, value)) = fields.iter().find(|(_, value)| !value.is_finite()) {
                return Err(AnimatorError::timing(format!(
                    "beat {index} has non-finite {name} ({value})"
                )));
            }
        }

        if let Some(index) = beats
            .windows(2)
            .position(|pair| pair[1].time < pair[0].time)
        {
            return Err(AnimatorError::timing(format!(
                "beat {} at {}s comes before beat {index} at {}s",
                index + 1,
                beats[index + 1].time,
                beats[index].time
            )));
        }

        Ok(Self { beats })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn beats(&self) -> &[BeatRecord] {
        &self.beats
    }

    pub fn len(&self) -> usize {
        self.beats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.beats.is_empty()
    }

    pub fn nearest(&self, time: f64) -> Option<&BeatRecord> {
        find_nearest_beat(time, &self.beats)
    }

    /// Time of the last beat, or zero for an empty sequence.
    pub fn duration_hint(&self) -> f64 {
        self.beats.last().map(|beat| beat.time).unwrap_or(0.0)
    }
}

impl TryFrom<Vec<BeatRecord>> for TimingSequence {
    type Error = AnimatorError;

    fn try_from(value: Vec<BeatRecord>) -> Result<Self> {
        Self::new(value)
    }
}

impl From<TimingSequence> for Vec<BeatRecord> {
    fn from(value: TimingSequence) -> Self {
        value.beats
    }
}

/// Monotonic playback position in seconds.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct PlaybackClock {
    pub time_seconds: f64,
}

impl PlaybackClock {
    pub fn reset(&mut self) {
        self.time_seconds = 0.0;
    }

    pub fn seek(&mut self, seconds: f64) {
        self.time_seconds = seconds.max(0.0);
    }

    pub fn advance(&mut self, delta: f64) {
        self.time_seconds = (self.time_seconds + delta).max(0.0);
    }
}

/// Opaque token identifying one requested frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(u64);

impl FrameHandle {
    pub fn id(self) -> u64 {
        self.0
    }
}

/// Display-synchronised callback source driving the animation loop.
///
/// Implementations hand out a fresh handle per request. `cancel_frame` must
/// take effect before it returns: a cancelled handle is never delivered.
pub trait FrameScheduler {
    fn request_frame(&mut self) -> FrameHandle;
    fn cancel_frame(&mut self, handle: FrameHandle);
}

/// Scheduler pumped explicitly by the host, one frame at a time.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    next_id: u64,
    pending: VecDeque<FrameHandle>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes and returns the oldest pending frame.
    pub fn next_frame(&mut self) -> Option<FrameHandle> {
        self.pending.pop_front()
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&mut self) -> FrameHandle {
        self.next_id += 1;
        let handle = FrameHandle(self.next_id);
        self.pending.push_back(handle);
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        self.pending.retain(|pending| *pending != handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn beat(time: f64, intensity: f64) -> BeatRecord {
        BeatRecord::new(time, intensity, 0.5, 120.0, 2.0)
    }

    #[test]
    fn nearest_beat_minimises_distance() {
        let beats = vec![beat(0.0, 0.2), beat(1.0, 0.9)];
        let nearest = find_nearest_beat(0.6, &beats).unwrap();
        assert_eq!(nearest.time, 1.0);
        assert_eq!(nearest.intensity, 0.9);

        let nearest = find_nearest_beat(0.3, &beats).unwrap();
        assert_eq!(nearest.time, 0.0);
    }

    #[test]
    fn ties_resolve_to_the_earlier_beat() {
        let beats = vec![beat(0.0, 0.1), beat(1.0, 0.2), beat(2.0, 0.3)];
        let nearest = find_nearest_beat(1.5, &beats).unwrap();
        assert_eq!(nearest.time, 1.0);

        let duplicates = vec![beat(1.0, 0.4), beat(1.0, 0.8)];
        assert_eq!(find_nearest_beat(1.0, &duplicates).unwrap().intensity, 0.4);
    }

    #[test]
    fn empty_sequence_has_no_nearest_beat() {
        for time in [-1.0, 0.0, 3.5, 1e9] {
            assert!(find_nearest_beat(time, &[]).is_none());
        }
        assert!(TimingSequence::empty().nearest(2.0).is_none());
    }

    #[test]
    fn queries_outside_the_track_clamp_to_the_ends() {
        let sequence = TimingSequence::new(vec![beat(0.5, 0.1), beat(2.0, 0.7)]).unwrap();
        assert_eq!(sequence.nearest(-4.0).unwrap().time, 0.5);
        assert_eq!(sequence.nearest(90.0).unwrap().time, 2.0);
        assert_eq!(sequence.duration_hint(), 2.0);
    }

    #[test]
    fn rejects_unordered_or_non_finite_beats() {
        let err = TimingSequence::new(vec![beat(1.0, 0.1), beat(0.5, 0.1)]).unwrap_err();
        assert!(matches!(err, AnimatorError::InvalidTimingMap(_)));

        let err = TimingSequence::new(vec![beat(f64::NAN, 0.1)]).unwrap_err();
        assert!(format!("{err}").contains("time"));
    }

    #[test]
    fn deserialises_analysis_beats() {
        let json = r#"[
            { "time": 0.25, "intensity": 0.8, "type": "strong", "bpm": 128.0,
              "rhythm_speed": 2.1, "energy": 0.4, "interval": 0.47 },
            { "time": 0.75, "intensity": 0.3, "bpm": 128.0, "rhythm_speed": 2.0, "energy": 0.5 }
        ]"#;
        let sequence: TimingSequence = serde_json::from_str(json).unwrap();
        assert_eq!(sequence.len(), 2);
        assert_eq!(sequence.beats()[0].kind, BeatKind::Strong);
        assert_eq!(sequence.beats()[0].interval, Some(0.47));
        assert_eq!(sequence.beats()[1].kind, BeatKind::Weak);

        let unordered = r#"[
            { "time": 2.0, "intensity": 0.8, "bpm": 1.0, "rhythm_speed": 1.0, "energy": 0.4 },
            { "time": 1.0, "intensity": 0.8, "bpm": 1.0, "rhythm_speed": 1.0, "energy": 0.4 }
        ]"#;
        assert!(serde_json::from_str::<TimingSequence>(unordered).is_err());
    }

    #[test]
    fn cancelled_frames_are_never_delivered() {
        let mut scheduler = ManualScheduler::new();
        let first = scheduler.request_frame();
        let second = scheduler.request_frame();
        assert_ne!(first, second);

        scheduler.cancel_frame(first);
        assert_eq!(scheduler.pending(), 1);
        assert_eq!(scheduler.next_frame(), Some(second));
        assert_eq!(scheduler.next_frame(), None);
    }

    #[test]
    fn clock_never_goes_negative() {
        let mut clock = PlaybackClock::default();
        clock.advance(1.5);
        clock.advance(-4.0);
        assert_eq!(clock.time_seconds, 0.0);
        clock.seek(3.0);
        clock.reset();
        assert_eq!(clock.time_seconds, 0.0);
    }
}
