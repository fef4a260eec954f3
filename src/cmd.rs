use crate::{color::Rgb, math::Vec2f, pen::Width};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cmd {
    PointerDown {
        /// Pointer position in window pixels.
        position: Vec2f,
    },
    PointerMove {
        position: Vec2f,
    },
    PointerUp,

    SetWidth {
        width: Width,
    },
    /// Nudges the pen width by a number of steps.
    StepWidth {
        delta: i32,
    },
    SetColor {
        color: Rgb,
    },
    /// Selects the panel swatch after the current one.
    NextColor,

    /// Discards every committed stroke and blanks the surface.
    Clear,
    Exit,
}
