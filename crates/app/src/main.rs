use std::{path::PathBuf, thread, time::Duration};

use beat_animator_core::{
    AnalysisDocument, AnimatorConfig, ClockPlayer, DiscoController, FrameOutcome,
    ManualScheduler, MediaPlayer, Preset, RenderTarget, StyleProperty, TargetSet, TextTarget,
};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

fn main() -> beat_animator_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Play(args) => run_play(args),
        Commands::Inspect { timing, at } => run_inspect(&timing, at),
        Commands::Preset { preset, output } => run_preset(preset, output.as_ref()),
    }
}

fn run_play(args: PlayArgs) -> beat_animator_core::Result<()> {
    let document = AnalysisDocument::load(&args.timing)?;
    let mut config = match &args.config {
        Some(path) => AnimatorConfig::load(path)?,
        None => AnimatorConfig::from_preset(args.preset),
    };
    if args.seed.is_some() {
        config.layout_seed = args.seed;
    }
    config.rest_during_silence |= args.rest_during_silence;

    let track_length = if document.stats.duration > 0.0 {
        document.stats.duration
    } else {
        document.beats.duration_hint()
    };
    let player = if track_length > 0.0 {
        ClockPlayer::with_duration(track_length)
    } else {
        ClockPlayer::new()
    };
    let targets = TargetSet::page(&args.text, &config.default_background);

    tracing::info!(
        timing = %args.timing.display(),
        beats = document.beats.len(),
        track_length,
        fps = args.fps,
        "starting disco session"
    );

    let mut controller =
        DiscoController::from_document(config, document, player, ManualScheduler::new(), targets);
    controller.start()?;

    let frame_seconds = 1.0 / f64::from(args.fps);
    let frames = (args.seconds * f64::from(args.fps)).ceil() as u64;
    let mut applied = 0_u64;

    for _ in 0..frames {
        if args.realtime {
            thread::sleep(Duration::from_secs_f64(frame_seconds));
        }
        controller.player_mut().advance(frame_seconds);
        match controller.pump() {
            Some(FrameOutcome::Applied { .. }) => applied += 1,
            Some(_) => {}
            None => break,
        }
        if !controller.player().is_playing() {
            tracing::info!("track finished");
            break;
        }
    }

    tracing::info!(
        frames = controller.frames_rendered(),
        applied,
        position = controller.player().position(),
        "rendering finished"
    );
    print_targets(controller.targets());

    controller.stop();
    let restored = controller.targets();
    tracing::info!(
        text = %restored.text().text_content(),
        background = restored.background().style(StyleProperty::BackgroundColor).unwrap_or("none"),
        "disco session stopped, page restored"
    );
    Ok(())
}

fn print_targets(targets: &TargetSet) {
    let styles = [
        ("image", targets.image()),
        ("container", targets.container()),
        ("background", targets.background()),
    ];
    for (name, target) in styles {
        let declarations: Vec<String> = StyleProperty::ALL
            .iter()
            .filter_map(|property| {
                target
                    .style(*property)
                    .map(|value| format!("{}: {value}", property.css_name()))
            })
            .collect();
        println!("{name} {{ {} }}", declarations.join("; "));
    }
    for glyph in targets.text().glyphs() {
        println!(
            "glyph {} {:?} at ({}, {}) {{ {} }}",
            glyph.index,
            glyph.character,
            glyph.placement.left,
            glyph.placement.top,
            glyph.style.to_css()
        );
    }
}

fn run_inspect(timing: &PathBuf, at: Option<f64>) -> beat_animator_core::Result<()> {
    let document = AnalysisDocument::load(timing)?;
    println!("{}", serde_json::to_string_pretty(&document.stats)?);

    if let Some(time) = at {
        match document.audio_state(time) {
            Some(state) => println!("{}", serde_json::to_string_pretty(&state)?),
            None => tracing::warn!(time, "timing map has no beats"),
        }
        match document.silence_at(time) {
            Some(silence) => println!("{}", serde_json::to_string_pretty(&silence)?),
            None => tracing::info!(time, "not in a silent period"),
        }
    }
    Ok(())
}

fn run_preset(preset: Preset, output: Option<&PathBuf>) -> beat_animator_core::Result<()> {
    let json = AnimatorConfig::from_preset(preset).to_json()?;
    match output {
        Some(path) => {
            std::fs::write(path, json)?;
            tracing::info!(%preset, path = %path.display(), "wrote preset config");
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Beat-synchronised disco mode animator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a disco session against an in-memory page and print the final styles.
    Play(PlayArgs),
    /// Print timing map statistics and, optionally, the audio state at a time.
    Inspect {
        /// Timing map produced by the offline analysis (audio_analysis.json).
        #[arg(short, long)]
        timing: PathBuf,
        /// Playback position in seconds to query.
        #[arg(long)]
        at: Option<f64>,
    },
    /// Print or save the configuration of a built-in preset.
    Preset {
        /// gentle, moderate, intense or frenzy.
        preset: Preset,
        /// Write the configuration here instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct PlayArgs {
    /// Timing map produced by the offline analysis (audio_analysis.json).
    #[arg(short, long)]
    timing: PathBuf,
    /// Built-in animation preset.
    #[arg(short, long, default_value = "moderate", conflicts_with = "config")]
    preset: Preset,
    /// JSON configuration file overriding the preset.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Text decomposed into animated glyphs.
    #[arg(long, default_value = "DISCO")]
    text: String,
    /// Seconds of playback to simulate.
    #[arg(short, long, default_value_t = 5.0)]
    seconds: f64,
    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u32).range(1..))]
    fps: u32,
    /// Fix the glyph layout randomness.
    #[arg(long)]
    seed: Option<u64>,
    /// Skip visual updates during silent periods of the track.
    #[arg(long)]
    rest_during_silence: bool,
    /// Sleep between frames instead of simulating as fast as possible.
    #[arg(long)]
    realtime: bool,
}
