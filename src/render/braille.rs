use crate::render::{
    frame_begin, frame_end, luma_u8, rgb_at, write_bg_rgb, write_fg_rgb, Frame, Renderer,
};
use std::io::Write;

/// 2x4 dots per cell. Star trails are thin, so this is the sharpest text mode.
pub struct BrailleRenderer {
    last_fg: Option<(u8, u8, u8)>,
    last_bg: Option<(u8, u8, u8)>,
}

impl BrailleRenderer {
    pub fn new() -> Self {
        Self {
            last_fg: None,
            last_bg: None,
        }
    }
}

impl Default for BrailleRenderer {
    fn default() -> Self {
        Self::new()
    }
}

// Dot bit for (dy * 2 + dx).
const DOT_BITS: [u8; 8] = [0x01, 0x08, 0x02, 0x10, 0x04, 0x20, 0x40, 0x80];

#[derive(Default)]
struct Acc {
    r: u32,
    g: u32,
    b: u32,
    n: u32,
}

impl Acc {
    fn add(&mut self, (r, g, b): (u8, u8, u8)) {
        self.r += r as u32;
        self.g += g as u32;
        self.b += b as u32;
        self.n += 1;
    }

    fn mean(&self) -> Option<(u8, u8, u8)> {
        (self.n > 0).then(|| {
            (
                (self.r / self.n) as u8,
                (self.g / self.n) as u8,
                (self.b / self.n) as u8,
            )
        })
    }
}

impl Renderer for BrailleRenderer {
    fn name(&self) -> &'static str {
        "braille"
    }

    fn cell_size(&self) -> (usize, usize) {
        (2, 4)
    }

    fn render(&mut self, frame: &Frame<'_>, out: &mut dyn Write) -> anyhow::Result<()> {
        let Some((cols, visual_rows, w, _h)) = frame_begin(frame, 2, 4, out)? else {
            return Ok(());
        };
        self.last_fg = None;
        self.last_bg = None;

        for row in 0..visual_rows {
            for col in 0..cols {
                let mut rgb = [(0u8, 0u8, 0u8); 8];
                let mut lum = [0u8; 8];
                for dy in 0..4usize {
                    for dx in 0..2usize {
                        let i = dy * 2 + dx;
                        rgb[i] = rgb_at(frame.pixels_rgba, w, col * 2 + dx, row * 4 + dy);
                        lum[i] = luma_u8(rgb[i].0, rgb[i].1, rgb[i].2);
                    }
                }

                let min_l = lum.iter().copied().min().unwrap_or(0) as u16;
                let max_l = lum.iter().copied().max().unwrap_or(0) as u16;
                let thr = (min_l + max_l) / 2;

                let mut bits = 0u8;
                let mut on = Acc::default();
                let mut off = Acc::default();
                for i in 0..8usize {
                    if lum[i] as u16 > thr {
                        bits |= DOT_BITS[i];
                        on.add(rgb[i]);
                    } else {
                        off.add(rgb[i]);
                    }
                }

                let bgc = off.mean().unwrap_or((0, 0, 0));
                let (fgc, ch) = if bits == 0 {
                    (bgc, ' ')
                } else {
                    let fgc = on.mean().unwrap_or(bgc);
                    (fgc, char::from_u32(0x2800 + bits as u32).unwrap_or(' '))
                };

                if self.last_fg != Some(fgc) {
                    write_fg_rgb(out, fgc.0, fgc.1, fgc.2)?;
                    self.last_fg = Some(fgc);
                }
                if self.last_bg != Some(bgc) {
                    write_bg_rgb(out, bgc.0, bgc.1, bgc.2)?;
                    self.last_bg = Some(bgc);
                }
                write!(out, "{ch}")?;
            }
            out.write_all(b"\r\n")?;
        }

        frame_end(frame, cols, visual_rows, out)
    }
}
