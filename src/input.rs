use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEventKind};

/// Wheel payloads as different hosts deliver them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WheelInput {
    /// Legacy line-detail shape: three units per notch, positive scrolls down.
    Detail(f64),
    /// Legacy wheel-delta shape: 120 units per notch, positive scrolls up.
    WheelDelta(f64),
    /// Already one unit per notch, positive scrolls up.
    Lines(i32),
}

impl WheelInput {
    /// Signed delta per notch, positive meaning "faster".
    pub fn delta(self) -> f64 {
        match self {
            Self::Detail(d) => -d / 3.0,
            Self::WheelDelta(d) => d / 120.0,
            Self::Lines(n) => n as f64,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    Pointer { x: f64, y: f64 },
    Wheel(f64),
    Resize { cols: u16, rows: u16 },
    ToggleHud,
    ToggleHelp,
    Quit,
    None,
}

/// Maps a terminal event onto the starfield's inputs. `cell_w`/`cell_h` are
/// raster pixels per terminal cell; pointer positions land on the cell centre.
pub fn translate(event: &Event, cell_w: usize, cell_h: usize) -> Action {
    match event {
        Event::Mouse(m) => match m.kind {
            MouseEventKind::Moved | MouseEventKind::Drag(_) => Action::Pointer {
                x: cell_center(m.column, cell_w),
                y: cell_center(m.row, cell_h),
            },
            MouseEventKind::ScrollUp => Action::Wheel(WheelInput::Lines(1).delta()),
            MouseEventKind::ScrollDown => Action::Wheel(WheelInput::Lines(-1).delta()),
            _ => Action::None,
        },
        Event::Key(k) => translate_key(k),
        Event::Resize(cols, rows) => Action::Resize {
            cols: *cols,
            rows: *rows,
        },
        _ => Action::None,
    }
}

fn translate_key(k: &KeyEvent) -> Action {
    if k.kind == KeyEventKind::Release {
        return Action::None;
    }
    if k.modifiers.contains(KeyModifiers::CONTROL) && matches!(k.code, KeyCode::Char('c')) {
        return Action::Quit;
    }

    match k.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => Action::Quit,
        KeyCode::Up | KeyCode::Char('+') | KeyCode::Char('=') => Action::Wheel(1.0),
        KeyCode::Down | KeyCode::Char('-') | KeyCode::Char('_') => Action::Wheel(-1.0),
        KeyCode::Char('i') | KeyCode::Char('I') => Action::ToggleHud,
        KeyCode::Char('?') | KeyCode::Char('h') | KeyCode::Char('H') | KeyCode::F(1) => {
            Action::ToggleHelp
        }
        _ => Action::None,
    }
}

#[inline]
fn cell_center(cell: u16, per_cell: usize) -> f64 {
    let per_cell = per_cell.max(1) as f64;
    cell as f64 * per_cell + per_cell * 0.5
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_center_scales_by_cell_size() {
        assert_eq!(cell_center(0, 1), 0.5);
        assert_eq!(cell_center(3, 2), 7.0);
        assert_eq!(cell_center(2, 4), 10.0);
        assert_eq!(cell_center(5, 0), 5.5);
    }
}
