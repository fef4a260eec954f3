use crate::{
    canvas::Canvas,
    capture::InputCapture,
    cmd::Cmd,
    config::Config,
    glow::GlowStyle,
    guard::{Activation, InjectionGuard},
    math::Vec2f,
    panel::ControlPanel,
    pen::PenSettings,
    render::Frame,
    stroke::{Millis, StrokeList},
};

/// What the host has to do after a command was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response {
    /// Nothing beyond the regular next frame.
    Continue,
    /// The surface has to be blanked right away instead of on the next frame.
    Blank,
    /// The overlay shut down. The host should stop the render loop and remove the surface.
    Exited,
    /// The overlay is inactive and dropped the command.
    Ignored,
}

/// State of one active annotation overlay: pen, strokes, input capture and control panel.
pub struct Overlay {
    activation: Option<Activation>,
    pen: PenSettings,
    strokes: StrokeList,
    capture: InputCapture,
    panel: ControlPanel,
    style: GlowStyle,
    fade: Millis,
    prune_faded: bool,
}

impl Overlay {
    /// Creates the overlay, unless `guard` says another one is already active.
    pub fn inject(guard: &InjectionGuard, config: &Config, viewport: Vec2f) -> Option<Self> {
        let Some(activation) = guard.try_activate() else {
            log::warn!("overlay is already active, not injecting another one");
            return None;
        };
        log::info!(
            "overlay injected (pen {} {}, fade {}ms)",
            config.pen.width,
            config.pen.color,
            config.fade_ms,
        );
        Some(Self {
            activation: Some(activation),
            pen: config.pen,
            strokes: StrokeList::default(),
            capture: InputCapture::default(),
            panel: ControlPanel::new(config.panel.swatches.clone(), viewport, config.pen.color),
            style: config.glow_style(),
            fade: config.fade(),
            prune_faded: config.prune_faded,
        })
    }

    pub fn is_active(&self) -> bool {
        self.activation.is_some()
    }

    pub fn resize(&mut self, viewport: Vec2f) {
        self.panel.resize(viewport);
    }

    pub fn handle(&mut self, cmd: Cmd, now: Millis) -> Response {
        if !self.is_active() {
            return Response::Ignored;
        }

        match cmd {
            Cmd::PointerDown { position } => {
                if self.panel.contains(position) {
                    return match self.panel.press(position) {
                        Some(cmd) => self.handle(cmd, now),
                        None => Response::Continue,
                    };
                }
                self.capture.press(position);
            }
            Cmd::PointerMove { position } => match self.panel.pointer_moved(position) {
                Some(cmd) => return self.handle(cmd, now),
                None => self.capture.move_to(position),
            },
            Cmd::PointerUp => {
                self.panel.release();
                if let Some(stroke) = self.capture.release(now, &self.pen) {
                    log::trace!("committing stroke with {} points", stroke.path().len());
                    self.strokes.push(stroke);
                }
            }
            Cmd::SetWidth { width } => self.set_pen(PenSettings { width, ..self.pen }),
            Cmd::StepWidth { delta } => self.set_pen(PenSettings {
                width: self.pen.width.step(delta),
                ..self.pen
            }),
            Cmd::SetColor { color } => self.set_pen(PenSettings { color, ..self.pen }),
            Cmd::NextColor => {
                if let Some(color) = self.panel.next_color(self.pen.color) {
                    self.set_pen(PenSettings { color, ..self.pen });
                }
            }
            Cmd::Clear => {
                log::info!("clearing {} strokes", self.strokes.len());
                self.strokes.clear();
                return Response::Blank;
            }
            Cmd::Exit => {
                self.exit();
                return Response::Exited;
            }
        }
        Response::Continue
    }

    fn set_pen(&mut self, pen: PenSettings) {
        if pen != self.pen {
            log::debug!("pen set to {} {}", pen.width, pen.color);
            self.panel.show_color(pen.color);
            self.pen = pen;
        }
    }

    /// Paints the current state. An inactive overlay paints nothing.
    pub fn render(&mut self, canvas: &mut impl Canvas, now: Millis) {
        if !self.is_active() {
            canvas.clear();
            return;
        }

        if self.prune_faded && !self.strokes.is_empty() {
            let pruned = self.strokes.prune_faded(now, self.fade);
            if pruned > 0 {
                log::trace!("pruned {pruned} faded strokes");
            }
        }

        Frame {
            strokes: &self.strokes,
            pen: &self.pen,
            current_path: self.capture.current_path(),
            style: &self.style,
            fade: self.fade,
        }
        .render(canvas, now);
        self.panel.draw(canvas, &self.pen);
    }

    /// Tears the overlay down and gives up its activation, so a new overlay can be injected.
    ///
    /// Commands handled after this are ignored. The app leaves its event loop once the overlay
    /// exits, so drawing again means launching the program again.
    pub fn exit(&mut self) {
        let Some(activation) = self.activation.take() else {
            return;
        };
        self.capture.cancel();
        self.panel.release();
        self.strokes.clear();
        activation.release();
        log::info!("overlay exited");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        canvas::recording::{Op, RecordingCanvas},
        color::Rgb,
        math::vec2,
        pen::Width,
    };

    fn inject(guard: &InjectionGuard) -> Overlay {
        Overlay::inject(guard, &Config::default(), vec2(1920.0, 1080.0)).unwrap()
    }

    fn draw(overlay: &mut Overlay, points: &[Vec2f], now: Millis) {
        let (first, rest) = points.split_first().unwrap();
        overlay.handle(Cmd::PointerDown { position: *first }, now);
        for &position in rest {
            overlay.handle(Cmd::PointerMove { position }, now);
        }
        overlay.handle(Cmd::PointerUp, now);
    }

    /// Counts glow passes in `color`, ignoring the panel's own strokes.
    fn glow_count(canvas: &RecordingCanvas, color: Rgb) -> usize {
        canvas
            .strokes()
            .filter(|(_, s)| s.blur >= 20.0 && s.color.0[..3] == color.with_alpha(1.0).0[..3])
            .count()
    }

    #[test]
    fn width_and_color_are_stamped_on_new_strokes() {
        let guard = InjectionGuard::default();
        let mut overlay = inject(&guard);
        overlay.handle(Cmd::SetWidth { width: Width::new(10) }, Millis(0));
        overlay.handle(Cmd::SetColor { color: "#00ff00".parse().unwrap() }, Millis(0));

        let points: Vec<_> = (0..5).map(|i| vec2(100.0 + i as f32 * 10.0, 500.0)).collect();
        draw(&mut overlay, &points, Millis(1000));

        assert_eq!(overlay.strokes.len(), 1);
        let stroke = overlay.strokes.iter().next().unwrap();
        assert_eq!(stroke.width().get(), 10);
        assert_eq!(stroke.color(), Rgb::new(0, 255, 0));
        assert_eq!(stroke.path().len(), 5);

        // later pen changes leave the stroke alone
        overlay.handle(Cmd::StepWidth { delta: 3 }, Millis(1100));
        overlay.handle(Cmd::NextColor, Millis(1100));
        assert_eq!(overlay.pen.width.get(), 13);
        assert_ne!(overlay.pen.color, Rgb::new(0, 255, 0));

        let mut canvas = RecordingCanvas::default();
        overlay.render(&mut canvas, Millis(1250));
        let glow: Vec<_> = canvas
            .strokes()
            .filter(|(_, s)| s.blur >= 20.0)
            .map(|(_, s)| *s)
            .collect();
        assert_eq!(glow.len(), 4);
        assert!(glow.iter().all(|s| s.color == Rgb::new(0, 255, 0).with_alpha(0.5)));
        assert_eq!(glow[0].width, 15.0);

        // faded, but still kept
        let mut canvas = RecordingCanvas::default();
        overlay.render(&mut canvas, Millis(1600));
        assert_eq!(glow_count(&canvas, Rgb::new(0, 255, 0)), 0);
        assert_eq!(overlay.strokes.len(), 1);
    }

    #[test]
    fn click_commits_single_point_stroke() {
        let guard = InjectionGuard::default();
        let mut overlay = inject(&guard);
        draw(&mut overlay, &[vec2(10.0, 10.0)], Millis(0));
        assert_eq!(overlay.strokes.len(), 1);
        assert_eq!(overlay.strokes.iter().next().unwrap().path().len(), 1);
    }

    #[test]
    fn presses_on_the_panel_do_not_draw() {
        let guard = InjectionGuard::default();
        let mut overlay = inject(&guard);
        let corner = overlay.panel.bounds().min + vec2(2.0, 2.0);
        draw(&mut overlay, &[corner, corner + vec2(1.0, 1.0)], Millis(0));
        assert!(overlay.strokes.is_empty());
    }

    #[test]
    fn clear_empties_list_and_blanks() {
        let guard = InjectionGuard::default();
        let mut overlay = inject(&guard);
        draw(&mut overlay, &[vec2(1.0, 1.0), vec2(2.0, 2.0)], Millis(0));
        draw(&mut overlay, &[vec2(5.0, 5.0)], Millis(0));
        assert_eq!(overlay.strokes.len(), 2);

        assert_eq!(overlay.handle(Cmd::Clear, Millis(10)), Response::Blank);
        assert!(overlay.strokes.is_empty());

        let mut canvas = RecordingCanvas::default();
        overlay.render(&mut canvas, Millis(10));
        assert_eq!(glow_count(&canvas, Rgb::RED), 0);
    }

    #[test]
    fn in_progress_path_uses_current_pen() {
        let guard = InjectionGuard::default();
        let mut overlay = inject(&guard);
        overlay.handle(Cmd::PointerDown { position: vec2(1.0, 1.0) }, Millis(0));
        overlay.handle(Cmd::PointerMove { position: vec2(9.0, 9.0) }, Millis(0));

        let mut canvas = RecordingCanvas::default();
        overlay.render(&mut canvas, Millis(5000));
        assert_eq!(glow_count(&canvas, Rgb::RED), 4);
        assert!(overlay.strokes.is_empty());
    }

    #[test]
    fn pruning_drops_faded_strokes() {
        let guard = InjectionGuard::default();
        let config = Config {
            prune_faded: true,
            ..Config::default()
        };
        let mut overlay = Overlay::inject(&guard, &config, vec2(800.0, 600.0)).unwrap();
        draw(&mut overlay, &[vec2(1.0, 1.0)], Millis(0));
        overlay.render(&mut RecordingCanvas::default(), Millis(100));
        assert_eq!(overlay.strokes.len(), 1);
        overlay.render(&mut RecordingCanvas::default(), Millis(500));
        assert!(overlay.strokes.is_empty());
    }

    #[test]
    fn exit_detaches_and_allows_reinjection() {
        let guard = InjectionGuard::default();
        let mut overlay = inject(&guard);
        assert!(Overlay::inject(&guard, &Config::default(), vec2(1.0, 1.0)).is_none());

        assert_eq!(overlay.handle(Cmd::Exit, Millis(0)), Response::Exited);
        assert!(!overlay.is_active());
        assert!(!guard.is_active());

        assert_eq!(
            overlay.handle(Cmd::PointerDown { position: vec2(1.0, 1.0) }, Millis(0)),
            Response::Ignored
        );
        overlay.handle(Cmd::PointerUp, Millis(0));
        assert!(overlay.strokes.is_empty());

        let mut canvas = RecordingCanvas::default();
        overlay.render(&mut canvas, Millis(0));
        assert_eq!(canvas.ops, [Op::Clear]);

        let again = inject(&guard);
        assert!(again.is_active());
    }

    #[test]
    fn exit_button_tears_down() {
        let guard = InjectionGuard::default();
        let mut overlay = inject(&guard);
        let position = overlay.panel.exit_button().center();
        assert_eq!(
            overlay.handle(Cmd::PointerDown { position }, Millis(0)),
            Response::Exited
        );
        assert!(!guard.is_active());
    }
}
