use std::ops::ControlFlow;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTick {
    pub index: u64,
    /// Seconds since the previous tick.
    pub dt: f32,
}

/// Host "call me before the next repaint" primitive.
pub trait FrameScheduler {
    /// Blocks until the next frame is due. `None` once the host has torn the loop down.
    fn next_frame(&mut self) -> Option<FrameTick>;
}

/// Timer fallback: sleeps out whatever is left of each frame budget.
pub struct PacedScheduler {
    budget: Duration,
    last: Option<Instant>,
    index: u64,
}

impl PacedScheduler {
    pub fn new(fps: u32) -> Self {
        Self {
            budget: Duration::from_nanos(1_000_000_000 / fps.max(1) as u64),
            last: None,
            index: 0,
        }
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }
}

impl FrameScheduler for PacedScheduler {
    fn next_frame(&mut self) -> Option<FrameTick> {
        let now = match self.last {
            None => Instant::now(),
            Some(last) => {
                let elapsed = last.elapsed();
                if elapsed < self.budget {
                    std::thread::sleep(self.budget - elapsed);
                }
                Instant::now()
            }
        };
        let dt = self
            .last
            .map(|last| now.duration_since(last).as_secs_f32())
            .unwrap_or(0.0);
        self.last = Some(now);

        let tick = FrameTick {
            index: self.index,
            dt,
        };
        self.index += 1;
        Some(tick)
    }
}

/// Yields a fixed number of ticks without sleeping.
pub struct ManualScheduler {
    remaining: u64,
    index: u64,
    dt: f32,
}

impl ManualScheduler {
    pub fn new(frames: u64) -> Self {
        Self {
            remaining: frames,
            index: 0,
            dt: 1.0 / 60.0,
        }
    }

    pub fn with_dt(mut self, dt: f32) -> Self {
        self.dt = dt;
        self
    }
}

impl FrameScheduler for ManualScheduler {
    fn next_frame(&mut self) -> Option<FrameTick> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let tick = FrameTick {
            index: self.index,
            dt: self.dt,
        };
        self.index += 1;
        Some(tick)
    }
}

/// Runs `frame` once per tick until the scheduler ends or the callback breaks.
/// Returns the number of frames that ran.
pub fn drive<S, F>(scheduler: &mut S, mut frame: F) -> anyhow::Result<u64>
where
    S: FrameScheduler + ?Sized,
    F: FnMut(FrameTick) -> anyhow::Result<ControlFlow<()>>,
{
    let mut frames = 0u64;
    while let Some(tick) = scheduler.next_frame() {
        frames += 1;
        if frame(tick)?.is_break() {
            break;
        }
    }
    Ok(frames)
}
