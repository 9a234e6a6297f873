use crate::canvas::{Canvas, Surface};
use crate::config::Config;
use crate::input::{translate, Action};
use crate::render::{make_renderer, Frame};
use crate::scheduler::{drive, PacedScheduler};
use crate::starfield::{FrameStats, Starfield};
use crate::terminal::TerminalGuard;
use anyhow::Context;
use crossterm::event;
use std::io::BufWriter;
use std::ops::ControlFlow;
use std::time::Duration;

/// Terminal cells split between the star raster and the HUD.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub term_cols: u16,
    pub term_rows: u16,
    pub visual_rows: u16,
    pub hud_rows: u16,
    pub pixel_width: usize,
    pub pixel_height: usize,
}

impl Layout {
    pub fn new(size: (u16, u16), cell: (usize, usize), show_hud: bool) -> Self {
        let (cols, rows) = size;
        let hud_rows = if show_hud && rows > 1 { 1 } else { 0 };
        let visual_rows = rows.saturating_sub(hud_rows).max(1);
        Self {
            term_cols: cols,
            term_rows: rows,
            visual_rows,
            hud_rows,
            pixel_width: (cols as usize).saturating_mul(cell.0),
            pixel_height: (visual_rows as usize).saturating_mul(cell.1),
        }
    }
}

pub fn check_terminal_size(size: (u16, u16)) -> anyhow::Result<()> {
    if size.0 < 4 || size.1 < 2 {
        return Err(anyhow::anyhow!(
            "terminal too small (need at least 4x2, got {}x{})",
            size.0,
            size.1
        ));
    }
    Ok(())
}

pub fn run(cfg: Config) -> anyhow::Result<()> {
    let _term = TerminalGuard::new()?;
    let mut out = BufWriter::new(TerminalGuard::stdout());

    let mut renderer = make_renderer(cfg.renderer);
    let cell = renderer.cell_size();

    let mut size = crossterm::terminal::size().context("get terminal size")?;
    check_terminal_size(size)?;

    let mut show_hud = cfg.hud;
    let mut show_help = false;
    let mut layout = Layout::new(size, cell, show_hud);

    let mut canvas = Canvas::new(layout.pixel_width, layout.pixel_height);
    let mut field = Starfield::new(layout.pixel_width, layout.pixel_height, cfg.rng());
    tracing::info!(
        renderer = renderer.name(),
        fps = cfg.fps,
        cols = size.0,
        rows = size.1,
        width = layout.pixel_width,
        height = layout.pixel_height,
        seed = ?cfg.seed,
        "starfield started"
    );

    let mut scheduler = PacedScheduler::new(cfg.fps);
    let mut fps = FpsMeter::default();

    let frames = drive(&mut scheduler, |tick| {
        let mut relayout = false;

        // Drain input without blocking; the scheduler owns the pacing.
        while event::poll(Duration::from_millis(0)).context("poll input")? {
            let ev = event::read().context("read input")?;
            match translate(&ev, cell.0, cell.1) {
                Action::Quit => return Ok(ControlFlow::Break(())),
                Action::Pointer { x, y } => field.move_pointer(x, y),
                Action::Wheel(delta) => field.apply_wheel(delta),
                Action::Resize { cols, rows } => {
                    size = (cols, rows);
                    relayout = true;
                }
                Action::ToggleHud => {
                    show_hud = !show_hud;
                    relayout = true;
                }
                Action::ToggleHelp => show_help = !show_help,
                Action::None => {}
            }
        }

        // Resize events can be missed in some terminals.
        let polled = crossterm::terminal::size().context("get terminal size")?;
        if polled != size {
            size = polled;
            relayout = true;
        }

        if relayout {
            let next = Layout::new(size, cell, show_hud);
            if next != layout {
                layout = next;
                canvas.resize(layout.pixel_width, layout.pixel_height);
                field.resize(layout.pixel_width, layout.pixel_height);
                tracing::info!(
                    cols = size.0,
                    rows = size.1,
                    width = layout.pixel_width,
                    height = layout.pixel_height,
                    "viewport resized"
                );
            }
        }

        let stats = field.advance_frame(&mut canvas);
        fps.update(tick.dt);

        let hud = if layout.hud_rows > 0 {
            build_hud(&field, stats, fps.fps(), renderer.name())
        } else {
            String::new()
        };
        let frame = Frame {
            term_cols: layout.term_cols,
            term_rows: layout.term_rows,
            visual_rows: layout.visual_rows,
            pixel_width: canvas.width(),
            pixel_height: canvas.height(),
            pixels_rgba: canvas.pixels(),
            hud: &hud,
            hud_rows: layout.hud_rows,
            overlay: show_help.then_some(HELP_TEXT),
            sync_updates: cfg.sync_updates,
        };
        renderer.render(&frame, &mut out)?;

        Ok(ControlFlow::Continue(()))
    })?;

    tracing::info!(frames, "starfield stopped");
    Ok(())
}

pub fn build_hud(field: &Starfield, stats: FrameStats, fps: f32, renderer: &str) -> String {
    let (px, py) = field.pointer();
    format!(
        "Speed: {:.2} | Sat: {:>3}% | Stars: {} | Drawn: {} | Resets: {} | Origin: {:.0},{:.0} | FPS: {:>4.1} | {} | wheel/up/down speed, i HUD, ? help, q quit",
        field.speed(),
        field.saturation(),
        field.stars().len(),
        stats.segments,
        stats.resets,
        px,
        py,
        fps,
        renderer,
    )
}

const HELP_TEXT: &str = "Warp Starfield\n\
mouse move  steer the vanishing point\n\
wheel / up / down / + / -  speed\n\
i  show/hide HUD\n\
? / h / F1  toggle this help\n\
q / esc / ctrl-c  quit";

/// Exponential moving average of tick rate.
#[derive(Default)]
struct FpsMeter {
    ema_dt: f32,
}

impl FpsMeter {
    fn update(&mut self, dt: f32) {
        if dt <= 0.0 {
            return;
        }
        self.ema_dt = if self.ema_dt == 0.0 {
            dt
        } else {
            self.ema_dt * 0.9 + dt * 0.1
        };
    }

    fn fps(&self) -> f32 {
        if self.ema_dt > 0.0 { 1.0 / self.ema_dt } else { 0.0 }
    }
}
