//! Translates window input events into [`Cmd`]s.

use winit::{
    event::{ElementState, MouseButton},
    keyboard::{self, NamedKey as WinitNamedKey},
};

use crate::{
    cmd::Cmd,
    config::{Config, Key, NamedKey},
    math::{vec2, Vec2f},
};

/// Pointer state tracked between window events.
///
/// Button events don't carry a position, so the last cursor position is remembered.
#[derive(Debug, Default)]
pub struct Pointer {
    position: Vec2f,
}

impl Pointer {
    pub fn moved(&mut self, x: f64, y: f64) -> Cmd {
        self.position = vec2(x as f32, y as f32);
        Cmd::PointerMove {
            position: self.position,
        }
    }

    /// Only the primary button draws.
    pub fn button(&self, state: ElementState, button: MouseButton) -> Option<Cmd> {
        if button != MouseButton::Left {
            return None;
        }
        Some(match state {
            ElementState::Pressed => Cmd::PointerDown {
                position: self.position,
            },
            ElementState::Released => Cmd::PointerUp,
        })
    }
}

/// Maps a pressed key to its configured command.
pub fn key_cmd(config: &Config, key: &keyboard::Key) -> Option<Cmd> {
    config.binding(&translate_key(key)?)
}

fn translate_key(key: &keyboard::Key) -> Option<Key> {
    match key {
        keyboard::Key::Named(named) => {
            let named = match named {
                WinitNamedKey::Escape => NamedKey::Escape,
                WinitNamedKey::Delete => NamedKey::Delete,
                WinitNamedKey::Backspace => NamedKey::Backspace,
                WinitNamedKey::Enter => NamedKey::Enter,
                WinitNamedKey::Tab => NamedKey::Tab,
                WinitNamedKey::Space => NamedKey::Space,
                _ => return None,
            };
            Some(Key::Named(named))
        }
        keyboard::Key::Character(s) => {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Some(Key::char(c)),
                _ => None,
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn left_button_uses_last_position() {
        let mut pointer = Pointer::default();
        assert_eq!(
            pointer.moved(12.5, 30.0),
            Cmd::PointerMove {
                position: vec2(12.5, 30.0)
            }
        );
        assert_eq!(
            pointer.button(ElementState::Pressed, MouseButton::Left),
            Some(Cmd::PointerDown {
                position: vec2(12.5, 30.0)
            })
        );
        assert_eq!(
            pointer.button(ElementState::Released, MouseButton::Left),
            Some(Cmd::PointerUp)
        );
        assert_eq!(
            pointer.button(ElementState::Pressed, MouseButton::Right),
            None
        );
    }

    #[test]
    fn keys_map_through_bindings() {
        let config = Config::default();
        assert_eq!(
            key_cmd(&config, &keyboard::Key::Named(WinitNamedKey::Escape)),
            Some(Cmd::Exit)
        );
        assert_eq!(
            key_cmd(&config, &keyboard::Key::Character("C".into())),
            Some(Cmd::NextColor)
        );
        assert_eq!(
            key_cmd(&config, &keyboard::Key::Character("]".into())),
            Some(Cmd::StepWidth { delta: 1 })
        );
        assert_eq!(
            key_cmd(&config, &keyboard::Key::Named(WinitNamedKey::F1)),
            None
        );
    }
}
