// Drawing buffer: ordered log of line/fill events plus the undo boundary stack.

use serde::{Deserialize, Serialize};

pub const MIN_BRUSH: f32 = 8.0;
pub const MAX_BRUSH: f32 = 32.0;

/// Gap, in milliseconds, after which a new draw event starts a fresh segment.
pub const SEGMENT_GAP_MS: u128 = 150;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RgbColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Line {
    pub from_x: f32,
    pub from_y: f32,
    pub to_x: f32,
    pub to_y: f32,
    pub color: RgbColor,
    pub line_width: f32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Fill {
    pub x: f32,
    pub y: f32,
    pub color: RgbColor,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum DrawEvent {
    Line(Line),
    Fill(Fill),
}

/// Ordered drawing log plus the stack of segment-boundary indices used by undo.
#[derive(Debug, Default)]
pub struct DrawingBuffer {
    events: Vec<DrawEvent>,
    boundaries: Vec<usize>,
    last_event_at: Option<std::time::Instant>,
}

impl DrawingBuffer {
    pub fn events(&self) -> &[DrawEvent] {
        &self.events
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
        self.boundaries.clear();
        self.last_event_at = None;
    }

    /// Appends a clamped line, pushing a new segment boundary if the gap since
    /// the last event exceeds `SEGMENT_GAP_MS` or the previous event was a fill.
    pub fn push_line(&mut self, mut line: Line) {
        line.line_width = line.line_width.clamp(MIN_BRUSH, MAX_BRUSH);

        let now = std::time::Instant::now();
        let prev_was_fill = matches!(self.events.last(), Some(DrawEvent::Fill(_)));
        let gap_exceeded = match self.last_event_at {
            Some(last) => now.duration_since(last).as_millis() > SEGMENT_GAP_MS,
            None => true,
        };
        if prev_was_fill || gap_exceeded {
            self.boundaries.push(self.events.len());
        }

        self.events.push(DrawEvent::Line(line));
        self.last_event_at = Some(now);
    }

    /// Appends a fill, always starting a new segment boundary first.
    pub fn push_fill(&mut self, fill: Fill) {
        self.boundaries.push(self.events.len());
        self.events.push(DrawEvent::Fill(fill));
        self.last_event_at = Some(std::time::Instant::now());
    }

    /// Pops the last segment boundary and truncates the buffer to it.
    /// No-op if the buffer or boundary stack is empty.
    pub fn undo(&mut self) -> bool {
        if self.events.is_empty() || self.boundaries.is_empty() {
            return false;
        }
        if let Some(boundary) = self.boundaries.pop()
            && boundary < self.events.len() {
                self.events.truncate(boundary);
            }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn color() -> RgbColor {
        RgbColor { r: 0, g: 0, b: 0 }
    }

    fn line() -> Line {
        Line {
            from_x: 0.0,
            from_y: 0.0,
            to_x: 1.0,
            to_y: 1.0,
            color: color(),
            line_width: 100.0,
        }
    }

    #[test]
    fn clamps_line_width() {
        let mut buf = DrawingBuffer::default();
        buf.push_line(line());
        match &buf.events()[0] {
            DrawEvent::Line(l) => assert_eq!(l.line_width, MAX_BRUSH),
            _ => panic!("expected line"),
        }

        let mut buf = DrawingBuffer::default();
        let mut l = line();
        l.line_width = 2.0;
        buf.push_line(l);
        match &buf.events()[0] {
            DrawEvent::Line(l) => assert_eq!(l.line_width, MIN_BRUSH),
            _ => panic!("expected line"),
        }
    }

    #[test]
    fn undo_restores_prior_boundary() {
        let mut buf = DrawingBuffer::default();
        buf.push_fill(Fill {
            x: 0.0,
            y: 0.0,
            color: color(),
        });
        buf.push_fill(Fill {
            x: 1.0,
            y: 1.0,
            color: color(),
        });
        assert_eq!(buf.events().len(), 2);
        assert!(buf.undo());
        assert_eq!(buf.events().len(), 1);
        assert!(buf.undo());
        assert_eq!(buf.events().len(), 0);
        assert!(!buf.undo());
    }

    #[test]
    fn fill_always_starts_new_segment() {
        let mut buf = DrawingBuffer::default();
        buf.push_fill(Fill {
            x: 0.0,
            y: 0.0,
            color: color(),
        });
        buf.push_line(line());
        assert!(buf.undo());
        // Undoing the line segment should leave just the fill.
        assert_eq!(buf.events().len(), 1);
    }
}
