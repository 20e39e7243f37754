use crate::PlaybackClock;

/// Media playback collaborator that owns the audio position.
///
/// The animator reads [`MediaPlayer::position`] every frame and only seeks,
/// plays or pauses at session boundaries.
pub trait MediaPlayer {
    fn play(&mut self);
    fn pause(&mut self);
    fn set_position(&mut self, seconds: f64);
    fn position(&self) -> f64;
    fn is_playing(&self) -> bool;
}

/// Player whose position is a [`PlaybackClock`] advanced by the host.
#[derive(Debug, Clone, Default)]
pub struct ClockPlayer {
    clock: PlaybackClock,
    playing: bool,
    duration: Option<f64>,
}

impl ClockPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stops at `seconds` like a finite track.
    pub fn with_duration(seconds: f64) -> Self {
        Self {
            duration: Some(seconds.max(0.0)),
            ..Self::default()
        }
    }

    pub fn duration(&self) -> Option<f64> {
        self.duration
    }

    /// Moves the clock forward while playing; reaching the end pauses.
    pub fn advance(&mut self, delta: f64) {
        if !self.playing {
            return;
        }

        self.clock.advance(delta);
        if let Some(end) = self.duration {
            if self.clock.time_seconds >= end {
                self.clock.seek(end);
                self.playing = false;
                tracing::debug!(end, "playback reached the end of the track");
            }
        }
    }
}

impl MediaPlayer for ClockPlayer {
    fn play(&mut self) {
        self.playing = true;
    }

    fn pause(&mut self) {
        self.playing = false;
    }

    fn set_position(&mut self, seconds: f64) {
        let seconds = match self.duration {
            Some(end) => seconds.min(end),
            None => seconds,
        };
        self.clock.seek(seconds);
    }

    fn position(&self) -> f64 {
        self.clock.time_seconds
    }

    fn is_playing(&self) -> bool {
        self.playing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_advances_while_playing() {
        let mut player = ClockPlayer::new();
        player.advance(1.0);
        assert_eq!(player.position(), 0.0);

        player.play();
        player.advance(0.25);
        player.advance(0.25);
        assert_eq!(player.position(), 0.5);

        player.pause();
        player.advance(3.0);
        assert_eq!(player.position(), 0.5);
    }

    #[test]
    fn stops_at_the_end_of_the_track() {
        let mut player = ClockPlayer::with_duration(1.0);
        player.play();
        player.advance(0.75);
        player.advance(0.75);
        assert_eq!(player.position(), 1.0);
        assert!(!player.is_playing());

        player.set_position(5.0);
        assert_eq!(player.position(), 1.0);
        player.set_position(0.0);
        assert_eq!(player.position(), 0.0);
    }
}
