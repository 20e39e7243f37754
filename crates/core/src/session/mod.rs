//! Disco session state machine.
//!
//! [`DiscoController`] owns the collaborators and at most one running
//! session. Frames arrive through [`DiscoController::on_frame`] with the
//! handle the scheduler issued; any handle other than the single pending one
//! is ignored, so nothing reaches the targets after [`DiscoController::stop`]
//! returns.

use crate::{
    analysis::{silence_at, AnalysisDocument, SilentPeriod},
    mapping::compute_frame,
    render::{StyleSnapshot, TargetSet, TextTarget},
    scene::{decompose_text, layout_rng},
    AnimatorConfig, AnimatorError, FrameHandle, FrameScheduler, ManualScheduler, MediaPlayer,
    Result, TimingSequence,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Running,
}

impl SessionState {
    /// Label of the toggle button in this state.
    pub fn button_label(self) -> &'static str {
        match self {
            SessionState::Idle => "🪩",
            SessionState::Running => "🛑",
        }
    }
}

/// What a single frame did to the targets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameOutcome {
    /// Styles were updated from the beat at `beat_time`.
    Applied { beat_time: f64 },
    /// The timing sequence is empty.
    NoBeat,
    /// Playback is inside a silent period and resting is enabled.
    Silent,
    /// Stale or unexpected frame; nothing was touched.
    Ignored,
}

#[derive(Debug)]
struct Session {
    pending: Option<FrameHandle>,
    snapshot: StyleSnapshot,
    frames: u64,
}

#[derive(Debug)]
pub struct DiscoController<P, S = ManualScheduler> {
    config: AnimatorConfig,
    timing: TimingSequence,
    silences: Vec<SilentPeriod>,
    player: P,
    scheduler: S,
    targets: TargetSet,
    session: Option<Session>,
}

impl<P: MediaPlayer, S: FrameScheduler> DiscoController<P, S> {
    pub fn new(
        config: AnimatorConfig,
        timing: TimingSequence,
        player: P,
        scheduler: S,
        targets: TargetSet,
    ) -> Self {
        Self {
            config,
            timing,
            silences: Vec::new(),
            player,
            scheduler,
            targets,
            session: None,
        }
    }

    /// Builds a controller from a full timing map, keeping its silent periods.
    pub fn from_document(
        config: AnimatorConfig,
        document: AnalysisDocument,
        player: P,
        scheduler: S,
        targets: TargetSet,
    ) -> Self {
        Self::new(config, document.beats, player, scheduler, targets)
            .with_silences(document.silent_periods)
    }

    pub fn with_silences(mut self, silences: Vec<SilentPeriod>) -> Self {
        self.silences = silences;
        self
    }

    pub fn state(&self) -> SessionState {
        if self.session.is_some() {
            SessionState::Running
        } else {
            SessionState::Idle
        }
    }

    pub fn is_running(&self) -> bool {
        self.session.is_some()
    }

    pub fn config(&self) -> &AnimatorConfig {
        &self.config
    }

    pub fn timing(&self) -> &TimingSequence {
        &self.timing
    }

    pub fn targets(&self) -> &TargetSet {
        &self.targets
    }

    pub fn player(&self) -> &P {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut P {
        &mut self.player
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    /// Frames delivered to the running session so far.
    pub fn frames_rendered(&self) -> u64 {
        self.session.as_ref().map(|session| session.frames).unwrap_or(0)
    }

    /// `Idle -> Running`. Rejected with [`AnimatorError::AlreadyRunning`]
    /// while a session exists; the running session is left untouched.
    pub fn start(&mut self) -> Result<()> {
        if self.session.is_some() {
            tracing::warn!("ignoring start request: session already running");
            return Err(AnimatorError::AlreadyRunning);
        }

        let snapshot = StyleSnapshot::capture(&self.targets);

        self.player.set_position(0.0);
        self.player.play();

        let mut rng = layout_rng(self.config.layout_seed);
        decompose_text(self.targets.text_mut(), &self.config.layout, &mut rng);

        let pending = self.scheduler.request_frame();
        tracing::debug!(
            glyphs = self.targets.text().glyphs().len(),
            beats = self.timing.len(),
            frame = pending.id(),
            "disco session started"
        );

        self.session = Some(Session {
            pending: Some(pending),
            snapshot,
            frames: 0,
        });
        Ok(())
    }

    /// `Running -> Idle`. Returns `false` when there was nothing to stop.
    pub fn stop(&mut self) -> bool {
        let Some(session) = self.session.take() else {
            return false;
        };

        if let Some(pending) = session.pending {
            self.scheduler.cancel_frame(pending);
        }
        self.player.pause();
        self.player.set_position(0.0);
        session.snapshot.restore(&mut self.targets);

        tracing::debug!(frames = session.frames, "disco session stopped");
        true
    }

    /// Starts when idle, stops when running, and returns the new state.
    pub fn toggle(&mut self) -> Result<SessionState> {
        if self.is_running() {
            self.stop();
        } else {
            self.start()?;
        }
        Ok(self.state())
    }

    /// Delivers a scheduled frame: ticks at the player's position and
    /// requests the next frame.
    pub fn on_frame(&mut self, handle: FrameHandle) -> FrameOutcome {
        match &self.session {
            Some(session) if session.pending == Some(handle) => {}
            _ => {
                tracing::trace!(frame = handle.id(), "ignoring stale frame");
                return FrameOutcome::Ignored;
            }
        }

        let time = self.player.position();
        let outcome = self.tick(time);
        let next = self.scheduler.request_frame();
        if let Some(session) = self.session.as_mut() {
            session.pending = Some(next);
            session.frames += 1;
        }
        outcome
    }

    /// Applies the visuals for `time` to the targets of the running session.
    pub fn tick(&mut self, time: f64) -> FrameOutcome {
        if self.session.is_none() {
            return FrameOutcome::Ignored;
        }

        if self.config.rest_during_silence && silence_at(&self.silences, time).is_some() {
            tracing::trace!(time, "resting during silence");
            return FrameOutcome::Silent;
        }

        let Some(beat) = self.timing.nearest(time) else {
            return FrameOutcome::NoBeat;
        };

        let glyph_count = self.targets.text().glyphs().len();
        let frame = compute_frame(&self.config.profile, beat, time, glyph_count);
        self.targets.apply(&frame);

        tracing::trace!(time, beat_time = beat.time, "frame applied");
        FrameOutcome::Applied {
            beat_time: beat.time,
        }
    }
}

impl<P: MediaPlayer> DiscoController<P, ManualScheduler> {
    /// Delivers the oldest pending frame, if any.
    pub fn pump(&mut self) -> Option<FrameOutcome> {
        let handle = self.scheduler.next_frame()?;
        Some(self.on_frame(handle))
    }
}
