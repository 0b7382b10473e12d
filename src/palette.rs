//! Emotion → color table.
//!
//! The table is built once and handed to the renderer by reference; nothing
//! mutates it afterwards. Labels missing from the table resolve to the
//! fallback color.

use std::fmt;

use once_cell::sync::Lazy;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ViewError;

/// An sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb` or `rrggbb`.
    pub fn parse_hex(s: &str) -> Result<Self, ViewError> {
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ViewError::Config(format!("invalid color `{s}`, expected #rrggbb")));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map_err(|e| ViewError::Config(format!("invalid color `{s}`: {e}")))
        };
        Ok(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Rgb {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Rgb::parse_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Neutral grey used for any label not in the table.
pub const FALLBACK_COLOR: Rgb = Rgb::new(0x9e, 0x9e, 0x9e);

/// Labels produced by the backend's classifier, plus its two sentinel labels.
const STANDARD_COLORS: &[(&str, Rgb)] = &[
    ("admiration", Rgb::new(0xff, 0xb3, 0x00)),
    ("amusement", Rgb::new(0xff, 0xd5, 0x4f)),
    ("anger", Rgb::new(0xe5, 0x39, 0x35)),
    ("annoyance", Rgb::new(0xef, 0x6c, 0x00)),
    ("approval", Rgb::new(0x7c, 0xb3, 0x42)),
    ("caring", Rgb::new(0xf4, 0x8f, 0xb1)),
    ("confusion", Rgb::new(0x8d, 0x6e, 0x63)),
    ("curiosity", Rgb::new(0x26, 0xc6, 0xda)),
    ("desire", Rgb::new(0xd8, 0x1b, 0x60)),
    ("disappointment", Rgb::new(0x78, 0x90, 0x9c)),
    ("disapproval", Rgb::new(0xa1, 0x88, 0x7f)),
    ("disgust", Rgb::new(0x55, 0x8b, 0x2f)),
    ("embarrassment", Rgb::new(0xff, 0x8a, 0x65)),
    ("excitement", Rgb::new(0xff, 0x70, 0x43)),
    ("fear", Rgb::new(0x5e, 0x35, 0xb1)),
    ("gratitude", Rgb::new(0x43, 0xa0, 0x47)),
    ("grief", Rgb::new(0x37, 0x47, 0x4f)),
    ("joy", Rgb::new(0xfd, 0xd8, 0x35)),
    ("love", Rgb::new(0xec, 0x40, 0x7a)),
    ("nervousness", Rgb::new(0x95, 0x75, 0xcd)),
    ("optimism", Rgb::new(0x66, 0xbb, 0x6a)),
    ("pride", Rgb::new(0xab, 0x47, 0xbc)),
    ("realization", Rgb::new(0x29, 0xb6, 0xf6)),
    ("relief", Rgb::new(0x4d, 0xb6, 0xac)),
    ("remorse", Rgb::new(0x6d, 0x4c, 0x41)),
    ("sadness", Rgb::new(0x1e, 0x88, 0xe5)),
    ("surprise", Rgb::new(0x00, 0xac, 0xc1)),
    ("neutral", Rgb::new(0xb0, 0xbe, 0xc5)),
    ("uncertain", Rgb::new(0xcf, 0xd8, 0xdc)),
    ("error", Rgb::new(0x42, 0x42, 0x42)),
];

static STANDARD: Lazy<EmotionPalette> = Lazy::new(|| EmotionPalette {
    colors: STANDARD_COLORS
        .iter()
        .map(|(label, color)| ((*label).to_string(), *color))
        .collect(),
    fallback: FALLBACK_COLOR,
});

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmotionPalette {
    #[serde(serialize_with = "serialize_colors")]
    colors: Vec<(String, Rgb)>,
    fallback: Rgb,
}

fn serialize_colors<S: Serializer>(colors: &[(String, Rgb)], serializer: S) -> Result<S::Ok, S::Error> {
    use serde::ser::SerializeMap;
    let mut map = serializer.serialize_map(Some(colors.len()))?;
    for (label, color) in colors {
        map.serialize_entry(label, color)?;
    }
    map.end()
}

impl Default for EmotionPalette {
    fn default() -> Self {
        Self::standard().clone()
    }
}

impl EmotionPalette {
    /// The built-in table.
    pub fn standard() -> &'static EmotionPalette {
        &STANDARD
    }

    /// A palette with exactly these entries.
    pub fn from_entries<I, S>(entries: I, fallback: Rgb) -> Self
    where
        I: IntoIterator<Item = (S, Rgb)>,
        S: Into<String>,
    {
        let mut palette = Self { colors: Vec::new(), fallback };
        for (label, color) in entries {
            palette.set(label.into(), color);
        }
        palette
    }

    /// A copy of this palette with `overrides` replacing or adding entries.
    pub fn with_overrides<I, S>(&self, overrides: I, fallback: Option<Rgb>) -> Self
    where
        I: IntoIterator<Item = (S, Rgb)>,
        S: Into<String>,
    {
        let mut palette = self.clone();
        for (label, color) in overrides {
            palette.set(label.into(), color);
        }
        if let Some(fb) = fallback {
            palette.fallback = fb;
        }
        palette
    }

    fn set(&mut self, label: String, color: Rgb) {
        match self.colors.iter_mut().find(|(l, _)| *l == label) {
            Some(slot) => slot.1 = color,
            None => self.colors.push((label, color)),
        }
    }

    /// Color for `label`; unknown labels get the fallback.
    pub fn color_for(&self, label: &str) -> Rgb {
        self.lookup(label).unwrap_or(self.fallback)
    }

    pub fn lookup(&self, label: &str) -> Option<Rgb> {
        self.colors.iter().find(|(l, _)| l == label).map(|(_, c)| *c)
    }

    pub fn fallback(&self) -> Rgb {
        self.fallback
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}
