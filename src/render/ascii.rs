use crate::render::{frame_begin, frame_end, luma_u8, rgb_at, write_fg_rgb, Frame, Renderer};
use std::io::Write;

pub struct AsciiRenderer {
    last_fg: Option<(u8, u8, u8)>,
}

impl AsciiRenderer {
    pub fn new() -> Self {
        Self { last_fg: None }
    }
}

impl Default for AsciiRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for AsciiRenderer {
    fn name(&self) -> &'static str {
        "ascii"
    }

    fn cell_size(&self) -> (usize, usize) {
        (1, 1)
    }

    fn render(&mut self, frame: &Frame<'_>, out: &mut dyn Write) -> anyhow::Result<()> {
        let Some((cols, visual_rows, w, _h)) = frame_begin(frame, 1, 1, out)? else {
            return Ok(());
        };
        self.last_fg = None;

        // Dark -> bright.
        const RAMP: &[u8] = b" .,:-=+*#%@";

        for y in 0..visual_rows {
            for x in 0..cols {
                let fg = rgb_at(frame.pixels_rgba, w, x, y);
                let l = luma_u8(fg.0, fg.1, fg.2) as usize;
                let ch = RAMP[l * (RAMP.len() - 1) / 255];

                if self.last_fg != Some(fg) {
                    write_fg_rgb(out, fg.0, fg.1, fg.2)?;
                    self.last_fg = Some(fg);
                }
                out.write_all(&[ch])?;
            }
            out.write_all(b"\r\n")?;
        }

        frame_end(frame, cols, visual_rows, out)
    }
}
