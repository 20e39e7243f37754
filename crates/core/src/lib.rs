//! Core library for the Beat Animator disco mode.
//!
//! A disco session plays a track and, once per display frame, looks up the
//! beat nearest to the playback position and turns its attributes into CSS
//! transforms, filters and colours for four render targets: an image, a text
//! block split into glyphs, its container and the page background. Stopping
//! the session puts every target back exactly as it was.

pub mod analysis;
pub mod audio;
pub mod config;
pub mod error;
pub mod mapping;
pub mod render;
pub mod scene;
pub mod session;
pub mod timeline;

pub use analysis::{AnalysisDocument, AnalysisStats, AudioState, SilenceInfo, SilentPeriod, TempoChange};
pub use audio::{ClockPlayer, MediaPlayer};
pub use config::{AnimatorConfig, Preset};
pub use error::{AnimatorError, Result};
pub use mapping::{compute_frame, IntensityProfile, VisualFrame};
pub use render::{RenderTarget, StyleBag, StyleProperty, StyleSnapshot, TargetSet, TextBlock, TextTarget};
pub use scene::{GlyphLayout, LayoutPolicy};
pub use session::{DiscoController, FrameOutcome, SessionState};
pub use timeline::{
    find_nearest_beat, BeatKind, BeatRecord, FrameHandle, FrameScheduler, ManualScheduler,
    PlaybackClock, TimingSequence,
};
