use std::{collections::HashMap, fs, path::Path};

use anyhow::{bail, Context};
use serde::{de::Visitor, Deserialize};

use crate::{
    cmd::Cmd,
    color::Rgb,
    glow::{GlowLayer, GlowStyle, DEFAULT_LAYERS, DEFAULT_TOLERANCE},
    panel::DEFAULT_SWATCHES,
    pen::PenSettings,
    stroke::{Millis, FADE_DURATION},
};

#[derive(Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Name of the monitor to cover. Defaults to the primary monitor.
    pub monitor: Option<String>,
    /// Time for a committed stroke to fade out, in milliseconds.
    pub fade_ms: u64,
    /// Whether fully faded strokes are dropped from memory.
    pub prune_faded: bool,
    pub pen: PenSettings,
    pub glow: Vec<GlowLayer>,
    /// How closely smoothed strokes follow their curves, in pixels.
    pub flatten_tolerance: f32,
    pub panel: Panel,
    pub keys: HashMap<Key, CommandVerb>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            monitor: None,
            fade_ms: FADE_DURATION.0,
            prune_faded: false,
            pen: PenSettings::default(),
            glow: DEFAULT_LAYERS.to_vec(),
            flatten_tolerance: DEFAULT_TOLERANCE,
            panel: Panel::default(),
            keys: default_keys(),
        }
    }
}

impl Config {
    pub fn load<A: AsRef<Path>>(path: A) -> anyhow::Result<Self> {
        Self::load_impl(path.as_ref())
    }

    fn load_impl(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file `{}`", path.display()))?;
        let config = Self::parse(&contents)
            .with_context(|| format!("invalid config file `{}`", path.display()))?;
        Ok(config)
    }

    pub fn parse(contents: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.fade_ms == 0 {
            bail!("`fade_ms` must be greater than 0");
        }
        for (i, layer) in self.glow.iter().enumerate() {
            if !(layer.extra_width >= 0.0 && layer.blur >= 0.0) {
                bail!(
                    "[[glow]] layer {i} must have non-negative `extra_width` and `blur` (found {} and {})",
                    layer.extra_width,
                    layer.blur,
                );
            }
        }
        if !(self.flatten_tolerance > 0.0) {
            bail!(
                "`flatten_tolerance` must be greater than 0 (found {})",
                self.flatten_tolerance,
            );
        }
        if self.panel.swatches.is_empty() {
            bail!("`panel.swatches` must list at least one color");
        }
        Ok(())
    }

    pub fn fade(&self) -> Millis {
        Millis(self.fade_ms)
    }

    pub fn glow_style(&self) -> GlowStyle {
        GlowStyle {
            layers: self.glow.clone(),
            tolerance: self.flatten_tolerance,
            ..GlowStyle::default()
        }
    }

    /// Returns the command bound to `key`, if any.
    pub fn binding(&self, key: &Key) -> Option<Cmd> {
        self.keys.get(key).map(|verb| verb.to_cmd())
    }
}

#[derive(Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Panel {
    pub swatches: Vec<Rgb>,
}

impl Default for Panel {
    fn default() -> Self {
        Self {
            swatches: DEFAULT_SWATCHES.to_vec(),
        }
    }
}

/// A keyboard key, as written in the `[keys]` table.
///
/// Either one of a few named keys (`Escape`, `Delete`, ...) or a single character. Characters
/// are matched case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Named(NamedKey),
    Char(char),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedKey {
    Escape,
    Delete,
    Backspace,
    Enter,
    Tab,
    Space,
}

impl Key {
    pub fn char(c: char) -> Self {
        Key::Char(c.to_ascii_lowercase())
    }

    fn parse(s: &str) -> Option<Self> {
        let named = match s {
            "Escape" => NamedKey::Escape,
            "Delete" => NamedKey::Delete,
            "Backspace" => NamedKey::Backspace,
            "Enter" => NamedKey::Enter,
            "Tab" => NamedKey::Tab,
            "Space" => NamedKey::Space,
            _ => {
                let mut chars = s.chars();
                return match (chars.next(), chars.next()) {
                    (Some(c), None) if !c.is_whitespace() => Some(Key::char(c)),
                    _ => None,
                };
            }
        };
        Some(Key::Named(named))
    }
}

impl<'a> Deserialize<'a> for Key {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'a>,
    {
        struct FromStrVisitor;

        impl<'de> Visitor<'de> for FromStrVisitor {
            type Value = Key;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str("key name or single character")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Key::parse(v).ok_or_else(|| E::custom(format_args!("invalid key name '{v}'")))
            }
        }

        deserializer.deserialize_str(FromStrVisitor)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum CommandVerb {
    #[serde(rename = "CLEAR")]
    Clear,
    #[serde(rename = "EXIT")]
    Exit,
    #[serde(rename = "WIDTH_UP")]
    WidthUp,
    #[serde(rename = "WIDTH_DOWN")]
    WidthDown,
    #[serde(rename = "NEXT_COLOR")]
    NextColor,
}

impl CommandVerb {
    fn to_cmd(self) -> Cmd {
        match self {
            CommandVerb::Clear => Cmd::Clear,
            CommandVerb::Exit => Cmd::Exit,
            CommandVerb::WidthUp => Cmd::StepWidth { delta: 1 },
            CommandVerb::WidthDown => Cmd::StepWidth { delta: -1 },
            CommandVerb::NextColor => Cmd::NextColor,
        }
    }
}

fn default_keys() -> HashMap<Key, CommandVerb> {
    HashMap::from([
        (Key::Named(NamedKey::Escape), CommandVerb::Exit),
        (Key::Named(NamedKey::Delete), CommandVerb::Clear),
        (Key::char(']'), CommandVerb::WidthUp),
        (Key::char('['), CommandVerb::WidthDown),
        (Key::char('c'), CommandVerb::NextColor),
    ])
}
