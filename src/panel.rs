//! The settings panel in the top-right corner of the overlay.

use palette::Hsv;

use crate::{
    canvas::{Canvas, LineStyle},
    cmd::Cmd,
    color::{Rgb, Rgba},
    math::{vec2, Rect, Vec2f},
    pen::{PenSettings, Width},
};

const MARGIN: f32 = 20.0;
const PADDING: f32 = 12.0;
const PANEL_WIDTH: f32 = 200.0;
const CORNER_RADIUS: f32 = 12.0;
const ROW_GAP: f32 = 10.0;

const SLIDER_WIDTH: f32 = 130.0;
const SLIDER_HEIGHT: f32 = 20.0;
const TRACK_THICKNESS: f32 = 4.0;
const KNOB_SIZE: f32 = 14.0;

const PICKER_THICKNESS: f32 = 8.0;
const PICKER_ROW_GAP: f32 = 2.0;
/// Number of solid pieces a picker track's gradient is drawn with.
const GRADIENT_STEPS: usize = 12;

const SWATCH_SIZE: f32 = 18.0;
const SWATCH_GAP: f32 = 4.0;

const BUTTON_HEIGHT: f32 = 28.0;
const CLEAR_WIDTH: f32 = 80.0;
const EXIT_WIDTH: f32 = 60.0;
const BUTTON_GAP: f32 = 6.0;

const BACKGROUND: Rgba = Rgba([30.0 / 255.0, 30.0 / 255.0, 30.0 / 255.0, 0.9]);
const TRACK: Rgb = Rgb::new(0x88, 0x88, 0x88);
const CLEAR: Rgb = Rgb::new(0xff, 0x44, 0x44);
const CLEAR_HOVER: Rgb = Rgb::new(0xdd, 0x22, 0x22);
const EXIT: Rgb = Rgb::new(0x44, 0x44, 0x44);
const EXIT_HOVER: Rgb = Rgb::new(0x22, 0x22, 0x22);

pub const DEFAULT_SWATCHES: [Rgb; 8] = [
    Rgb::new(0xff, 0x00, 0x00),
    Rgb::new(0xff, 0x88, 0x00),
    Rgb::new(0xff, 0xff, 0x00),
    Rgb::new(0x00, 0xff, 0x00),
    Rgb::new(0x00, 0xff, 0xff),
    Rgb::new(0x00, 0x88, 0xff),
    Rgb::new(0xff, 0x00, 0xff),
    Rgb::new(0xff, 0xff, 0xff),
];

/// A component of the color picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Channel {
    Hue,
    Saturation,
    Value,
}

impl Channel {
    const ALL: [Channel; 3] = [Channel::Hue, Channel::Saturation, Channel::Value];

    /// Where `hsv` puts this channel's knob.
    fn fraction(self, hsv: &Hsv) -> f32 {
        match self {
            Channel::Hue => hsv.hue.into_positive_degrees() / 360.0,
            Channel::Saturation => hsv.saturation,
            Channel::Value => hsv.value,
        }
    }

    /// `hsv` with this channel set to `t`.
    fn set(self, hsv: &Hsv, t: f32) -> Hsv {
        let mut hsv = *hsv;
        match self {
            Channel::Hue => hsv.hue = (t * 360.0).into(),
            Channel::Saturation => hsv.saturation = t,
            Channel::Value => hsv.value = t,
        }
        hsv
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slider {
    Width,
    Picker(Channel),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Widget {
    Slider(Slider),
    Swatch(usize),
    Clear,
    Exit,
}

#[derive(Debug, Clone)]
struct Layout {
    frame: Rect,
    /// Hit area of the width slider; the track runs along its vertical center.
    width: Rect,
    preview: Vec2f,
    /// Hit areas of the hue, saturation and value sliders.
    picker: [Rect; 3],
    swatches: Vec<Rect>,
    clear: Rect,
    exit: Rect,
}

impl Layout {
    fn new(viewport: Vec2f, swatch_count: usize) -> Self {
        let origin = vec2(viewport.x - MARGIN - PANEL_WIDTH, MARGIN);
        let inner = origin + vec2(PADDING, PADDING);
        let inner_width = PANEL_WIDTH - 2.0 * PADDING;

        let width = Rect::from_origin_size(inner, vec2(SLIDER_WIDTH, SLIDER_HEIGHT));
        let preview = vec2(
            origin.x + PANEL_WIDTH - PADDING - SLIDER_HEIGHT * 0.5,
            width.center().y,
        );

        let picker = [0, 1, 2].map(|row| {
            let top = width.max.y + ROW_GAP + row as f32 * (SLIDER_HEIGHT + PICKER_ROW_GAP);
            Rect::from_origin_size(vec2(inner.x, top), vec2(inner_width, SLIDER_HEIGHT))
        });

        let per_row = (((inner_width + SWATCH_GAP) / (SWATCH_SIZE + SWATCH_GAP)) as usize).max(1);
        let swatch_top = picker[2].max.y + ROW_GAP;
        let swatches: Vec<_> = (0..swatch_count)
            .map(|i| {
                let (row, col) = (i / per_row, i % per_row);
                let step = SWATCH_SIZE + SWATCH_GAP;
                Rect::from_origin_size(
                    vec2(inner.x + col as f32 * step, swatch_top + row as f32 * step),
                    vec2(SWATCH_SIZE, SWATCH_SIZE),
                )
            })
            .collect();
        let rows = swatch_count.div_ceil(per_row);
        let swatch_bottom = swatch_top + rows as f32 * (SWATCH_SIZE + SWATCH_GAP) - SWATCH_GAP;

        let button_top = swatch_bottom.max(picker[2].max.y) + ROW_GAP;
        let clear = Rect::from_origin_size(
            vec2(inner.x, button_top),
            vec2(CLEAR_WIDTH, BUTTON_HEIGHT),
        );
        let exit = Rect::from_origin_size(
            vec2(clear.max.x + BUTTON_GAP, button_top),
            vec2(EXIT_WIDTH, BUTTON_HEIGHT),
        );

        let frame = Rect {
            min: origin,
            max: vec2(origin.x + PANEL_WIDTH, exit.max.y + PADDING),
        };

        Self {
            frame,
            width,
            preview,
            picker,
            swatches,
            clear,
            exit,
        }
    }

    fn slider(&self, slider: Slider) -> Rect {
        match slider {
            Slider::Width => self.width,
            Slider::Picker(channel) => self.picker[channel as usize],
        }
    }

    fn track_ends(&self, slider: Slider) -> (Vec2f, Vec2f) {
        let rect = self.slider(slider);
        let y = rect.center().y;
        let inset = KNOB_SIZE * 0.5;
        (vec2(rect.min.x + inset, y), vec2(rect.max.x - inset, y))
    }

    /// Position along `slider`'s track under `x`, from 0 to 1.
    fn fraction_at(&self, slider: Slider, x: f32) -> f32 {
        let (start, end) = self.track_ends(slider);
        ((x - start.x) / (end.x - start.x)).clamp(0.0, 1.0)
    }

    fn knob_at(&self, slider: Slider, t: f32) -> Vec2f {
        let (start, end) = self.track_ends(slider);
        vec2(start.x + t * (end.x - start.x), start.y)
    }

    fn width_at(&self, x: f32) -> Width {
        let t = self.fraction_at(Slider::Width, x);
        let (lo, hi) = (Width::MIN.px(), Width::MAX.px());
        Width::new((lo + t * (hi - lo)).round() as u32)
    }

    fn width_knob(&self, width: Width) -> Vec2f {
        let (lo, hi) = (Width::MIN.px(), Width::MAX.px());
        self.knob_at(Slider::Width, (width.px() - lo) / (hi - lo))
    }

    fn widget_at(&self, p: Vec2f) -> Option<Widget> {
        if self.width.contains(p) {
            return Some(Widget::Slider(Slider::Width));
        }
        let channel = Channel::ALL
            .into_iter()
            .find(|&c| self.picker[c as usize].contains(p));
        if let Some(channel) = channel {
            return Some(Widget::Slider(Slider::Picker(channel)));
        }
        if let Some(i) = self.swatches.iter().position(|r| r.contains(p)) {
            return Some(Widget::Swatch(i));
        }
        if self.clear.contains(p) {
            return Some(Widget::Clear);
        }
        if self.exit.contains(p) {
            return Some(Widget::Exit);
        }
        None
    }
}

pub struct ControlPanel {
    swatches: Vec<Rgb>,
    layout: Layout,
    dragging: Option<Slider>,
    hover: Option<Widget>,
    /// Picker state. Kept apart from the pen color so the hue survives grays and black.
    picked: Hsv,
}

impl ControlPanel {
    pub fn new(swatches: Vec<Rgb>, viewport: Vec2f, color: Rgb) -> Self {
        let layout = Layout::new(viewport, swatches.len());
        Self {
            swatches,
            layout,
            dragging: None,
            hover: None,
            picked: color.to_hsv(),
        }
    }

    /// Re-anchors the panel after the viewport changed size.
    pub fn resize(&mut self, viewport: Vec2f) {
        self.layout = Layout::new(viewport, self.swatches.len());
    }

    pub fn bounds(&self) -> Rect {
        self.layout.frame
    }

    #[cfg(test)]
    pub(crate) fn exit_button(&self) -> Rect {
        self.layout.exit
    }

    pub fn contains(&self, p: Vec2f) -> bool {
        self.bounds().contains(p)
    }

    /// Moves the picker to `color` after the pen color was set some other way.
    pub fn show_color(&mut self, color: Rgb) {
        if Rgb::from_hsv(self.picked) != color {
            self.picked = color.to_hsv();
        }
    }

    /// Handles a pointer press at `p`, which must lie inside the panel.
    pub fn press(&mut self, p: Vec2f) -> Option<Cmd> {
        match self.layout.widget_at(p)? {
            Widget::Slider(slider) => {
                self.dragging = Some(slider);
                Some(self.slide(slider, p.x))
            }
            Widget::Swatch(i) => Some(Cmd::SetColor {
                color: self.swatches[i],
            }),
            Widget::Clear => Some(Cmd::Clear),
            Widget::Exit => Some(Cmd::Exit),
        }
    }

    /// Tracks pointer movement; yields a new width or color while a slider is being dragged.
    pub fn pointer_moved(&mut self, p: Vec2f) -> Option<Cmd> {
        self.hover = self.layout.widget_at(p);
        let slider = self.dragging?;
        Some(self.slide(slider, p.x))
    }

    fn slide(&mut self, slider: Slider, x: f32) -> Cmd {
        match slider {
            Slider::Width => Cmd::SetWidth {
                width: self.layout.width_at(x),
            },
            Slider::Picker(channel) => {
                let t = self.layout.fraction_at(slider, x);
                self.picked = channel.set(&self.picked, t);
                Cmd::SetColor {
                    color: Rgb::from_hsv(self.picked),
                }
            }
        }
    }

    /// Ends a slider drag. Returns whether one was in progress.
    pub fn release(&mut self) -> bool {
        self.dragging.take().is_some()
    }

    /// The swatch following `current`, wrapping around. Falls back to the first swatch.
    pub fn next_color(&self, current: Rgb) -> Option<Rgb> {
        let next = match self.swatches.iter().position(|&c| c == current) {
            Some(i) => (i + 1) % self.swatches.len(),
            None => 0,
        };
        self.swatches.get(next).copied()
    }

    pub fn draw(&self, canvas: &mut impl Canvas, pen: &PenSettings) {
        let l = &self.layout;
        canvas.fill_rect(l.frame, CORNER_RADIUS, BACKGROUND);

        let line = |width: f32, color: Rgb| LineStyle {
            width,
            blur: 0.0,
            color: color.with_alpha(1.0),
        };
        let knob_style = line(KNOB_SIZE, Rgb::WHITE);

        // width slider
        let (start, end) = l.track_ends(Slider::Width);
        let knob = l.width_knob(pen.width);
        canvas.stroke(&[start, end], &line(TRACK_THICKNESS, TRACK));
        canvas.stroke(&[start, knob], &line(TRACK_THICKNESS, pen.color));
        canvas.stroke(&[knob, knob], &knob_style);
        canvas.stroke(
            &[l.preview, l.preview],
            &LineStyle {
                width: pen.width.px(),
                blur: 6.0,
                color: pen.color.with_alpha(1.0),
            },
        );

        // hue, saturation and value sliders, each over a gradient of what it would pick
        for channel in Channel::ALL {
            let slider = Slider::Picker(channel);
            for i in 0..GRADIENT_STEPS {
                let (t0, t1) = (
                    i as f32 / GRADIENT_STEPS as f32,
                    (i + 1) as f32 / GRADIENT_STEPS as f32,
                );
                let mut hsv = channel.set(&self.picked, (t0 + t1) * 0.5);
                if channel == Channel::Hue {
                    hsv.saturation = 1.0;
                    hsv.value = 1.0;
                }
                canvas.stroke(
                    &[l.knob_at(slider, t0), l.knob_at(slider, t1)],
                    &line(PICKER_THICKNESS, Rgb::from_hsv(hsv)),
                );
            }
            let knob = l.knob_at(slider, channel.fraction(&self.picked));
            canvas.stroke(&[knob, knob], &knob_style);
            canvas.stroke(&[knob, knob], &line(KNOB_SIZE - 4.0, Rgb::from_hsv(self.picked)));
        }

        for (rect, &color) in l.swatches.iter().zip(&self.swatches) {
            if color == pen.color {
                canvas.fill_rect(rect.inflate(2.0), 8.0, Rgb::WHITE.with_alpha(1.0));
            }
            canvas.fill_rect(*rect, 6.0, color.with_alpha(1.0));
        }

        let button = |widget, normal: Rgb, hover: Rgb| {
            if self.hover == Some(widget) {
                hover.with_alpha(1.0)
            } else {
                normal.with_alpha(1.0)
            }
        };
        let icon = line(2.0, Rgb::WHITE);

        canvas.fill_rect(l.clear, 6.0, button(Widget::Clear, CLEAR, CLEAR_HOVER));
        // a short sweep stroke
        let c = l.clear.center();
        canvas.stroke(&[c + vec2(-12.0, 5.0), c + vec2(12.0, -5.0)], &icon);

        canvas.fill_rect(l.exit, 6.0, button(Widget::Exit, EXIT, EXIT_HOVER));
        let c = l.exit.center();
        canvas.stroke(&[c + vec2(-6.0, -6.0), c + vec2(6.0, 6.0)], &icon);
        canvas.stroke(&[c + vec2(-6.0, 6.0), c + vec2(6.0, -6.0)], &icon);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::recording::{Op, RecordingCanvas};

    fn panel() -> ControlPanel {
        ControlPanel::new(DEFAULT_SWATCHES.to_vec(), vec2(1920.0, 1080.0), Rgb::RED)
    }

    /// Where to press to pick `t` on a color channel.
    fn picker_at(p: &ControlPanel, channel: Channel, t: f32) -> Vec2f {
        p.layout.knob_at(Slider::Picker(channel), t)
    }

    fn picked(cmd: Option<Cmd>) -> Rgb {
        match cmd {
            Some(Cmd::SetColor { color }) => color,
            other => panic!("expected a color, got {other:?}"),
        }
    }

    #[test]
    fn anchored_top_right() {
        let p = panel();
        let b = p.bounds();
        assert_eq!(b.max.x, 1900.0);
        assert_eq!(b.min.y, 20.0);
        assert!(p.contains(b.center()));
        assert!(!p.contains(vec2(500.0, 500.0)));
    }

    #[test]
    fn slider_maps_to_width_range() {
        let mut p = panel();
        let (start, end) = p.layout.track_ends(Slider::Width);
        assert_eq!(
            p.press(start),
            Some(Cmd::SetWidth { width: Width::MIN })
        );
        assert_eq!(p.dragging, Some(Slider::Width));
        assert_eq!(
            p.pointer_moved(end),
            Some(Cmd::SetWidth { width: Width::MAX })
        );
        // dragging past the track clamps
        assert_eq!(
            p.pointer_moved(end + vec2(300.0, 200.0)),
            Some(Cmd::SetWidth { width: Width::MAX })
        );
        assert!(p.release());
        assert_eq!(p.pointer_moved(start), None);
    }

    #[test]
    fn knob_sits_where_press_lands() {
        let p = panel();
        for px in Width::RANGE {
            let width = Width::new(px);
            assert_eq!(p.layout.width_at(p.layout.width_knob(width).x), width);
        }
    }

    #[test]
    fn picker_reaches_colors_outside_the_swatches() {
        let mut p = panel();
        let dark_red = picked(p.press(picker_at(&p, Channel::Value, 0.6)));
        assert_eq!(dark_red, Rgb::new(153, 0, 0));
        assert!(!DEFAULT_SWATCHES.contains(&dark_red));
        assert!(p.release());

        let green = picked(p.press(picker_at(&p, Channel::Hue, 1.0 / 3.0)));
        assert_eq!(green, Rgb::new(0, 153, 0));
    }

    #[test]
    fn dragging_the_picker_emits_colors() {
        let mut p = panel();
        p.press(picker_at(&p, Channel::Saturation, 1.0));
        let white = picked(p.pointer_moved(picker_at(&p, Channel::Saturation, 0.0)));
        assert_eq!(white, Rgb::WHITE);
        // dragging off the track keeps controlling the same channel
        let still_white = picked(p.pointer_moved(vec2(0.0, 0.0)));
        assert_eq!(still_white, Rgb::WHITE);
        p.release();

        // the hue is remembered while the color is gray
        p.press(picker_at(&p, Channel::Hue, 2.0 / 3.0));
        p.release();
        let blue = picked(p.press(picker_at(&p, Channel::Saturation, 1.0)));
        assert_eq!(blue, Rgb::new(0, 0, 255));
    }

    #[test]
    fn picker_follows_other_color_changes() {
        let mut p = panel();
        p.show_color(Rgb::new(0, 255, 255));
        let knob = picker_at(&p, Channel::Hue, p.picked.hue.into_positive_degrees() / 360.0);
        assert_eq!(picked(p.press(knob)), Rgb::new(0, 255, 255));
    }

    #[test]
    fn buttons_and_swatches_emit_commands() {
        let mut p = panel();
        let swatch = p.layout.swatches[3].center();
        assert_eq!(
            p.press(swatch),
            Some(Cmd::SetColor {
                color: Rgb::new(0, 255, 0)
            })
        );
        assert_eq!(p.press(p.layout.clear.center()), Some(Cmd::Clear));
        assert_eq!(p.press(p.layout.exit.center()), Some(Cmd::Exit));
        // padding around the widgets does nothing
        assert_eq!(p.press(p.bounds().min + vec2(2.0, 2.0)), None);
        assert_eq!(p.dragging, None);
    }

    #[test]
    fn widgets_fit_inside_frame() {
        let p = ControlPanel::new(vec![Rgb::RED; 20], vec2(800.0, 600.0), Rgb::RED);
        let rects = p.layout.picker.iter().chain(&p.layout.swatches);
        for r in rects {
            assert!(p.contains(r.min) && p.contains(r.max - vec2(0.5, 0.5)));
        }
        assert!(p.layout.swatches[0].min.y > p.layout.picker[2].max.y);
        assert!(p.layout.clear.min.y > p.layout.swatches[19].max.y);
    }

    #[test]
    fn next_color_wraps() {
        let p = panel();
        assert_eq!(p.next_color(Rgb::RED), Some(DEFAULT_SWATCHES[1]));
        assert_eq!(p.next_color(Rgb::WHITE), Some(DEFAULT_SWATCHES[0]));
        assert_eq!(p.next_color(Rgb::new(1, 2, 3)), Some(DEFAULT_SWATCHES[0]));
    }

    #[test]
    fn draws_background_first_and_rings_selected_swatch() {
        let p = panel();
        let mut canvas = RecordingCanvas::default();
        p.draw(&mut canvas, &PenSettings::default());
        assert!(matches!(canvas.ops[0], Op::FillRect(r, _, c) if r == p.bounds() && c == BACKGROUND));
        let rings = canvas
            .ops
            .iter()
            .filter(|op| matches!(op, Op::FillRect(r, _, _) if *r == p.layout.swatches[0].inflate(2.0)))
            .count();
        assert_eq!(rings, 1);
    }
}
