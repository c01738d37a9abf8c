//! particle-morph - run a particle morph scene in a window or render it to a PNG.
//!
//! Usage:
//!   particle-morph [--preset <name>] [--config <file.json>] [--count <n>]
//!   particle-morph --snapshot out.png [--frames 240] [--size 1280x720]

use clap::{ArgAction, Parser};
use log::LevelFilter;
use particle_morph::{Engine, EngineBuilder, EngineConfig, EngineError, FrameClock, Preset};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "particle-morph")]
#[command(about = "Pseudo-3D particle scenes that morph between shapes")]
struct Args {
    /// Built-in scene to run
    #[arg(long, default_value = "hero-globe")]
    preset: String,

    /// Load the scene from a JSON config instead of a preset
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the particle count
    #[arg(long)]
    count: Option<usize>,

    /// Print the resolved config as JSON and exit
    #[arg(long)]
    dump_config: bool,

    /// Render headless for a number of frames and save a PNG
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Frames to simulate before a snapshot
    #[arg(long, default_value_t = 240)]
    frames: u32,

    /// Snapshot size in logical pixels
    #[arg(long, default_value = "1280x720", value_parser = parse_size)]
    size: (f32, f32),

    /// Snapshot device-pixel ratio
    #[arg(long, default_value_t = 1.0)]
    pixel_ratio: f32,

    /// List built-in presets and exit
    #[arg(long)]
    list_presets: bool,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn parse_size(s: &str) -> Result<(f32, f32), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{}'", s))?;
    let w: f32 = w.trim().parse().map_err(|_| format!("bad width '{}'", w))?;
    let h: f32 = h.trim().parse().map_err(|_| format!("bad height '{}'", h))?;
    if !(w > 0.0 && h > 0.0) {
        return Err("size must be positive".into());
    }
    Ok((w, h))
}

fn log_level(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn resolve_config(args: &Args) -> Result<EngineConfig, EngineError> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => match Preset::from_name(&args.preset) {
            Some(preset) => preset.config(),
            None => {
                log::warn!("unknown preset '{}', using hero-globe", args.preset);
                Preset::HeroGlobe.config()
            }
        },
    };
    if let Some(count) = args.count {
        config.particle_count = count;
    }
    Ok(config)
}

fn snapshot(engine: &mut Engine, args: &Args, path: &Path) -> Result<(), EngineError> {
    let (width, height) = args.size;
    let mut clock = FrameClock::fixed(1.0 / 60.0);
    engine.start();
    engine.on_resize(width, height, args.pixel_ratio);
    for _ in 0..args.frames.max(1) {
        engine.tick(clock.tick());
    }
    engine.save_snapshot(path)?;
    log::info!("wrote {} after {} frames", path.display(), clock.frame());
    Ok(())
}

fn main() -> Result<(), EngineError> {
    let args = Args::parse();
    env_logger::Builder::new()
        .filter_level(log_level(args.verbose))
        .parse_default_env()
        .init();

    if args.list_presets {
        for preset in Preset::all() {
            println!("{:<18} {}", preset.name(), preset.description());
        }
        return Ok(());
    }

    let config = resolve_config(&args)?;

    if args.dump_config {
        println!("{}", config.to_json()?);
        return Ok(());
    }

    let mut engine = EngineBuilder::from_config(config).build()?;

    match &args.snapshot {
        Some(path) => snapshot(&mut engine, &args, path),
        None => Ok(engine.run()?),
    }
}
