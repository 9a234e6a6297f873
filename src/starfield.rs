//! Mouse-steered warp starfield.
//!
//! A fixed pool of stars recedes from a vanishing point that follows the
//! pointer. Each frame fades the previous one (trails), projects every star
//! with a perspective divide and strokes the segment between its previous and
//! current projection. Stars that pass the camera or leave the viewport are
//! recycled in place.

use crate::canvas::{Hsl, Surface};

pub const WARP_DEPTH: f64 = 12.0;
pub const UNITS_COUNT: usize = 500;
pub const MIN_SPEED: f64 = 0.01;
pub const MAX_SPEED: f64 = 0.5;
pub const COLOR_CYCLE_STEP: f64 = 0.01;
pub const TRAIL_ALPHA: f64 = 0.25;
pub const WHEEL_STEP_DIVISOR: f64 = 25.0;
pub const LIGHTNESS: f64 = 80.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Star {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Projection from the previous frame; `None` right after a reset.
    pub prev: Option<(f64, f64)>,
}

impl Star {
    pub fn px(&self) -> f64 {
        self.prev.map(|(x, _)| x).unwrap_or(0.0)
    }

    pub fn py(&self) -> f64 {
        self.prev.map(|(_, y)| y).unwrap_or(0.0)
    }

    pub fn project(&self) -> (f64, f64) {
        (self.x / self.z, self.y / self.z)
    }

    /// Closer stars (smaller `z`) draw thicker.
    pub fn stroke_width(&self) -> f64 {
        (1.0 / self.z + 1.0) * 2.0
    }
}

pub fn reset_star(star: &mut Star, width: f64, height: f64, rng: &mut fastrand::Rng) {
    star.x = (rng.f64() - 0.5) * width * WARP_DEPTH;
    star.y = (rng.f64() - 0.5) * height * WARP_DEPTH;
    star.z = WARP_DEPTH;
    star.prev = None;
}

/// Saturation percent for a given speed, `floor(speed * 500)` capped to `[0, 100]`.
pub fn saturation_for(speed: f64) -> f64 {
    (speed * 500.0).floor().clamp(0.0, 100.0)
}

pub fn hue_for(color_cycle: f64, index: usize) -> f64 {
    (color_cycle * index as f64) % 360.0
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub segments: usize,
    pub resets: usize,
}

pub struct Starfield {
    stars: Vec<Star>,
    pointer_x: f64,
    pointer_y: f64,
    speed: f64,
    color_cycle: f64,
    width: f64,
    height: f64,
    rng: fastrand::Rng,
}

impl Starfield {
    pub fn new(width: usize, height: usize, rng: fastrand::Rng) -> Self {
        Self::with_units(width, height, UNITS_COUNT, rng)
    }

    pub fn with_units(width: usize, height: usize, units: usize, mut rng: fastrand::Rng) -> Self {
        let w = width as f64;
        let h = height as f64;
        let mut stars = Vec::with_capacity(units);
        for _ in 0..units {
            let mut star = Star {
                x: 0.0,
                y: 0.0,
                z: WARP_DEPTH,
                prev: None,
            };
            reset_star(&mut star, w, h, &mut rng);
            stars.push(star);
        }

        Self {
            stars,
            pointer_x: w / 2.0,
            pointer_y: h / 2.0,
            speed: MIN_SPEED,
            color_cycle: 0.0,
            width: w,
            height: h,
            rng,
        }
    }

    pub fn stars(&self) -> &[Star] {
        &self.stars
    }

    pub fn stars_mut(&mut self) -> &mut [Star] {
        &mut self.stars
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn pointer(&self) -> (f64, f64) {
        (self.pointer_x, self.pointer_y)
    }

    pub fn color_cycle(&self) -> f64 {
        self.color_cycle
    }

    pub fn viewport(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    pub fn saturation(&self) -> f64 {
        saturation_for(self.speed)
    }

    pub fn hue_for(&self, index: usize) -> f64 {
        hue_for(self.color_cycle, index)
    }

    pub fn move_pointer(&mut self, x: f64, y: f64) {
        self.pointer_x = x;
        self.pointer_y = y;
    }

    /// One normalised wheel tick changes speed by `1/25`.
    pub fn apply_wheel(&mut self, delta: f64) {
        if !delta.is_finite() {
            return;
        }
        self.speed = (self.speed + delta / WHEEL_STEP_DIVISOR).clamp(MIN_SPEED, MAX_SPEED);
    }

    /// New bounds apply to resets from now on; stars in flight keep their position.
    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width as f64;
        self.height = height as f64;
    }

    pub fn reset(&mut self, index: usize) {
        if let Some(star) = self.stars.get_mut(index) {
            reset_star(star, self.width, self.height, &mut self.rng);
        }
    }

    /// The vanishing point. `(pointer - w/2) + w/2` reduces to the pointer itself.
    pub fn origin(&self) -> (f64, f64) {
        (self.pointer_x, self.pointer_y)
    }

    pub fn advance_frame(&mut self, surface: &mut dyn Surface) -> FrameStats {
        let mut stats = FrameStats::default();

        let (surface_w, surface_h) = (surface.width() as f64, surface.height() as f64);
        surface.set_global_alpha(TRAIL_ALPHA);
        surface.fill_rect(0.0, 0.0, surface_w, surface_h, (0, 0, 0));

        let (cx, cy) = self.origin();
        let sat = self.saturation();
        let speed = self.speed;
        let cycle = self.color_cycle;

        for (i, star) in self.stars.iter_mut().enumerate() {
            let (sx, sy) = star.project();

            if let Some((px, py)) = star.prev {
                surface.set_stroke_color(Hsl::new(hue_for(cycle, i), sat, LIGHTNESS));
                surface.set_line_width(star.stroke_width());
                surface.stroke_line(sx + cx, sy + cy, px + cx, py + cy);
                stats.segments += 1;
            }

            star.prev = Some((sx, sy));
            star.z -= speed;

            // Only the positive side is bounds-checked.
            if star.z < speed || sx > self.width || sy > self.height {
                reset_star(star, self.width, self.height, &mut self.rng);
                stats.resets += 1;
            }
        }

        self.color_cycle += COLOR_CYCLE_STEP;
        tracing::trace!(segments = stats.segments, resets = stats.resets, "frame advanced");
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn saturation_floors_and_caps() {
        assert_eq!(saturation_for(0.01), 5.0);
        assert_eq!(saturation_for(0.0199), 9.0);
        assert_eq!(saturation_for(0.2), 100.0);
        assert_eq!(saturation_for(0.5), 100.0);
        assert_eq!(saturation_for(-1.0), 0.0);
    }

    #[test]
    fn stroke_width_grows_as_depth_shrinks() {
        let far = Star { x: 0.0, y: 0.0, z: 12.0, prev: None };
        let near = Star { x: 0.0, y: 0.0, z: 0.5, prev: None };
        assert!((far.stroke_width() - (1.0 / 12.0 + 1.0) * 2.0).abs() < 1e-12);
        assert_eq!(near.stroke_width(), 6.0);
    }

    #[test]
    fn px_py_report_zero_without_previous_point() {
        let s = Star { x: 1.0, y: 2.0, z: 3.0, prev: None };
        assert_eq!((s.px(), s.py()), (0.0, 0.0));
        let s = Star { prev: Some((4.0, -5.0)), ..s };
        assert_eq!((s.px(), s.py()), (4.0, -5.0));
    }
}
