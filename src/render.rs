use std::time::Instant;

use crate::{
    canvas::Canvas,
    glow::GlowStyle,
    pen::PenSettings,
    stroke::{Millis, Point, StrokeList},
};

/// Everything needed to paint one frame, borrowed read-only from the overlay.
pub struct Frame<'a> {
    pub strokes: &'a StrokeList,
    pub pen: &'a PenSettings,
    pub current_path: &'a [Point],
    pub style: &'a GlowStyle,
    pub fade: Millis,
}

impl Frame<'_> {
    /// Blanks `canvas` and redraws all visible strokes as of `now`.
    ///
    /// Fully faded strokes are skipped but stay in the list. The in-progress path is drawn on top
    /// at full opacity once it has more than one point.
    pub fn render(&self, canvas: &mut impl Canvas, now: Millis) {
        canvas.clear();

        for stroke in self.strokes.iter() {
            let opacity = stroke.opacity(now, self.fade);
            if opacity > 0.0 {
                self.style
                    .draw(canvas, stroke.path(), opacity, stroke.color(), stroke.width());
            }
        }

        if self.current_path.len() > 1 {
            self.style.draw(
                canvas,
                self.current_path,
                1.0,
                self.pen.color,
                self.pen.width,
            );
        }
    }
}

/// Something that can be asked to run the render callback once more, on the next frame.
pub trait FrameScheduler {
    fn request_frame(&self);
}

/// Handle to the self-rescheduling render loop.
///
/// The loop keeps requesting frames for as long as the handle exists; [`FrameTask::stop`]
/// consumes it, so a stopped loop cannot be ticked again.
pub struct FrameTask<S: FrameScheduler> {
    scheduler: S,
}

impl<S: FrameScheduler> FrameTask<S> {
    pub fn start(scheduler: S) -> Self {
        log::debug!("starting render loop");
        scheduler.request_frame();
        Self { scheduler }
    }

    /// Called after every rendered frame. Reschedules unconditionally.
    pub fn tick(&self) {
        self.scheduler.request_frame();
    }

    pub fn stop(self) -> S {
        log::debug!("render loop stopped");
        self.scheduler
    }
}

/// Monotonic clock stamping strokes and driving the fade.
#[derive(Debug, Clone, Copy)]
pub struct Clock {
    epoch: Instant,
}

impl Clock {
    pub fn start() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }

    pub fn now(&self) -> Millis {
        Millis(self.epoch.elapsed().as_millis() as u64)
    }
}
