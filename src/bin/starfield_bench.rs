use std::ops::ControlFlow;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::Parser;
use warp_starfield::canvas::Canvas;
use warp_starfield::input::WheelInput;
use warp_starfield::scheduler::{drive, ManualScheduler};
use warp_starfield::starfield::Starfield;

const DEFAULT_SEED: u64 = 0x57A2_F1E1;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "starfield_bench",
    version,
    about = "Headless starfield frame timing (optionally saves the last frame as PNG)"
)]
pub(crate) struct Cli {
    #[arg(long, default_value_t = 600)]
    pub(crate) frames: u64,

    #[arg(long, default_value_t = 320)]
    pub(crate) width: usize,

    #[arg(long, default_value_t = 180)]
    pub(crate) height: usize,

    #[arg(long, default_value_t = DEFAULT_SEED)]
    pub(crate) seed: u64,

    /// Wheel notches applied before the first frame (positive = faster).
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    pub(crate) wheel: i32,

    #[arg(long, value_name = "PNG")]
    pub(crate) snapshot: Option<PathBuf>,
}

pub(crate) fn validate_args(args: &Cli) -> Result<()> {
    if args.width == 0 {
        bail!("--width must be >= 1");
    }
    if args.height == 0 {
        bail!("--height must be >= 1");
    }
    if args.frames == 0 {
        bail!("--frames must be >= 1");
    }
    Ok(())
}

pub(crate) fn percentile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let idx = ((sorted.len() as f64 - 1.0) * q.clamp(0.0, 1.0)).round() as usize;
    sorted[idx.min(sorted.len() - 1)]
}

fn main() -> Result<()> {
    let args = Cli::parse();
    validate_args(&args)?;

    let mut canvas = Canvas::new(args.width, args.height);
    let mut field = Starfield::new(args.width, args.height, fastrand::Rng::with_seed(args.seed));
    let notch = WheelInput::Lines(args.wheel.signum()).delta();
    for _ in 0..args.wheel.unsigned_abs() {
        field.apply_wheel(notch);
    }

    let mut frame_ms = Vec::with_capacity(args.frames as usize);
    let mut segments = 0usize;
    let mut resets = 0usize;
    let mut scheduler = ManualScheduler::new(args.frames);
    let frames = drive(&mut scheduler, |_tick| {
        let start = Instant::now();
        let stats = field.advance_frame(&mut canvas);
        frame_ms.push(start.elapsed().as_secs_f64() * 1000.0);
        segments += stats.segments;
        resets += stats.resets;
        Ok(ControlFlow::Continue(()))
    })?;

    let mut sorted = frame_ms.clone();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mean = sorted.iter().sum::<f64>() / sorted.len().max(1) as f64;

    println!("frames:   {}", frames);
    println!("size:     {}x{}", args.width, args.height);
    println!("speed:    {:.2}", field.speed());
    println!(
        "ms/frame: mean {:.3} | p50 {:.3} | p95 {:.3} | max {:.3}",
        mean,
        percentile(&sorted, 0.5),
        percentile(&sorted, 0.95),
        percentile(&sorted, 1.0),
    );
    println!("segments: {} ({:.1}/frame)", segments, segments as f64 / frames.max(1) as f64);
    println!("resets:   {} ({:.1}/frame)", resets, resets as f64 / frames.max(1) as f64);

    if let Some(path) = &args.snapshot {
        canvas.save_png(path).context("snapshot")?;
        println!("snapshot: {}", path.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_defaults_are_stable() {
        let args = Cli::parse_from(["starfield_bench"]);
        assert_eq!(args.frames, 600);
        assert_eq!((args.width, args.height), (320, 180));
        assert_eq!(args.seed, DEFAULT_SEED);
        assert_eq!(args.wheel, 0);
        assert!(args.snapshot.is_none());
        assert!(validate_args(&args).is_ok());
    }

    #[test]
    fn snapshot_takes_a_png_path() {
        let args = Cli::parse_from(["starfield_bench", "--snapshot", "last.png"]);
        assert_eq!(args.snapshot.as_deref(), Some(std::path::Path::new("last.png")));
    }

    #[test]
    fn negative_wheel_and_zero_size() {
        let args = Cli::parse_from(["starfield_bench", "--wheel", "-3", "--width", "0"]);
        assert_eq!(args.wheel, -3);
        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn percentile_uses_stable_rounding() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(percentile(&sorted, 0.0), 1.0);
        assert_eq!(percentile(&sorted, 0.5), 3.0);
        assert_eq!(percentile(&sorted, 2.0), 4.0);
        assert_eq!(percentile(&[], 0.95), 0.0);
    }
}
