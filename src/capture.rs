use std::mem;

use crate::{
    pen::PenSettings,
    stroke::{Millis, Point, Stroke},
};

/// Turns pointer presses, moves and releases into committed strokes.
#[derive(Debug, Default)]
pub struct InputCapture {
    drawing: bool,
    current: Vec<Point>,
}

impl InputCapture {
    /// The in-progress path, empty while the pointer is up.
    pub fn current_path(&self) -> &[Point] {
        &self.current
    }

    pub fn press(&mut self, pos: Point) {
        self.drawing = true;
        self.current.clear();
        self.current.push(pos);
    }

    pub fn move_to(&mut self, pos: Point) {
        if self.drawing {
            self.current.push(pos);
        }
    }

    /// Ends the gesture. Returns the stroke to commit, if any points were captured.
    ///
    /// The stroke is stamped with `now` and a copy of the pen settings, so later changes to the
    /// pen don't affect it.
    pub fn release(&mut self, now: Millis, pen: &PenSettings) -> Option<Stroke> {
        self.drawing = false;
        let path = mem::take(&mut self.current);
        if path.is_empty() {
            return None;
        }
        Some(Stroke::new(path, now, pen.color, pen.width))
    }

    pub fn cancel(&mut self) {
        self.drawing = false;
        self.current.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{color::Rgb, math::vec2, pen::Width};

    #[test]
    fn press_moves_release_commits_one_stroke() {
        let pen = PenSettings::default();
        let mut cap = InputCapture::default();
        cap.press(vec2(0.0, 0.0));
        for i in 1..=3 {
            cap.move_to(vec2(i as f32, 0.0));
        }
        assert!(cap.drawing);
        assert_eq!(cap.current_path().len(), 4);

        let stroke = cap.release(Millis(42), &pen).unwrap();
        assert_eq!(stroke.path().len(), 4);
        assert_eq!(stroke.timestamp(), Millis(42));
        assert!(!cap.drawing);
        assert!(cap.current_path().is_empty());
    }

    #[test]
    fn click_commits_single_point_stroke() {
        let mut cap = InputCapture::default();
        cap.press(vec2(5.0, 5.0));
        let stroke = cap.release(Millis(0), &PenSettings::default()).unwrap();
        assert_eq!(stroke.path(), &[vec2(5.0, 5.0)]);
    }

    #[test]
    fn moves_without_press_are_ignored() {
        let mut cap = InputCapture::default();
        cap.move_to(vec2(1.0, 1.0));
        assert!(cap.current_path().is_empty());
        assert!(cap.release(Millis(0), &PenSettings::default()).is_none());
    }

    #[test]
    fn stroke_snapshots_pen_settings() {
        let mut pen = PenSettings {
            width: Width::new(10),
            color: Rgb::new(0, 255, 0),
        };
        let mut cap = InputCapture::default();
        cap.press(vec2(0.0, 0.0));
        cap.move_to(vec2(1.0, 1.0));
        let stroke = cap.release(Millis(0), &pen).unwrap();

        pen.width = Width::new(2);
        pen.color = Rgb::WHITE;
        assert_eq!(stroke.width().get(), 10);
        assert_eq!(stroke.color(), Rgb::new(0, 255, 0));
    }

    #[test]
    fn cancel_discards_gesture() {
        let mut cap = InputCapture::default();
        cap.press(vec2(0.0, 0.0));
        cap.move_to(vec2(3.0, 3.0));
        cap.cancel();
        assert!(cap.release(Millis(0), &PenSettings::default()).is_none());
    }
}
