use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// An opaque sRGB color normalized to 8 bits per channel.
///
/// This is the canonical color currency of the engine: every observed value
/// (`#rgb`, `#rrggbb`, `rgb(...)`, `rgba(...)` computed forms) is normalized
/// into an `Rgb` before it enters a report or a mapping, and every `Rgb`
/// renders back out as a lowercase 6-digit hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Failed to interpret a string as a color.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("not a color value: {0:?}")]
pub struct ParseColorError(pub String);

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse a CSS color value.
    ///
    /// Accepts `#rgb`, `#rrggbb`, and the `rgb()`/`rgba()` computed forms
    /// (both comma- and space-separated). Returns `None` for anything else,
    /// including `transparent` and fully transparent `rgba()` values —
    /// invisible colors never participate in extraction or remapping.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if let Some(hex) = value.strip_prefix('#') {
            return Self::parse_hex(hex);
        }
        let lower = value.to_ascii_lowercase();
        if lower == "transparent" {
            return None;
        }
        let body = lower
            .strip_prefix("rgba(")
            .or_else(|| lower.strip_prefix("rgb("))?
            .strip_suffix(')')?;
        let parts: Vec<&str> = body
            .split([',', ' ', '/'])
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();
        if parts.len() < 3 {
            return None;
        }
        let channel = |s: &str| -> Option<u8> {
            let v: f64 = s.parse().ok()?;
            if !(0.0..=255.0).contains(&v) {
                return None;
            }
            Some(v.round() as u8)
        };
        if let Some(alpha) = parts.get(3) {
            let a: f64 = alpha.strip_suffix('%').unwrap_or(alpha).parse().ok()?;
            if a == 0.0 {
                return None;
            }
        }
        Some(Self::new(
            channel(parts[0])?,
            channel(parts[1])?,
            channel(parts[2])?,
        ))
    }

    fn parse_hex(hex: &str) -> Option<Self> {
        match hex.len() {
            3 => {
                let digit = |i: usize| u8::from_str_radix(&hex[i..=i], 16).ok();
                let (r, g, b) = (digit(0)?, digit(1)?, digit(2)?);
                Some(Self::new(r * 17, g * 17, b * 17))
            }
            6 => {
                let pair = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
                Some(Self::new(pair(0)?, pair(2)?, pair(4)?))
            }
            _ => None,
        }
    }

    /// Perceptual brightness, 0.0 (black) to 255.0 (white).
    ///
    /// The classic luma weighting: `0.299R + 0.587G + 0.114B`.
    pub fn brightness(&self) -> f64 {
        0.299 * f64::from(self.r) + 0.587 * f64::from(self.g) + 0.114 * f64::from(self.b)
    }

    /// Squared Euclidean distance in RGB space.
    pub fn distance_sq(&self, other: &Rgb) -> u32 {
        let dr = i32::from(self.r) - i32::from(other.r);
        let dg = i32::from(self.g) - i32::from(other.g);
        let db = i32::from(self.b) - i32::from(other.b);
        (dr * dr + dg * dg + db * db) as u32
    }
}

impl std::fmt::Display for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for Rgb {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| ParseColorError(s.to_owned()))
    }
}

// Serde as the normalized hex string, so mappings serialize as
// `{"#112233": "#aabbcc"}` rather than nested channel objects.

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Rgb {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// The persistent source→replacement color assignment.
///
/// Accumulates across extraction and remap runs: merging is additive and
/// key-wise (a new assignment overwrites only its own source key), and the
/// map is cleared only by an explicit reset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColorMapping {
    entries: BTreeMap<Rgb, Rgb>,
}

impl ColorMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replacement color for `source`, if one is assigned.
    pub fn target(&self, source: Rgb) -> Option<Rgb> {
        self.entries.get(&source).copied()
    }

    pub fn insert(&mut self, source: Rgb, target: Rgb) {
        self.entries.insert(source, target);
    }

    /// Merge a batch of assignments, overwriting per key. Assignments for
    /// sources not in the batch survive untouched.
    pub fn merge(&mut self, pairs: impl IntoIterator<Item = (Rgb, Rgb)>) {
        for (source, target) in pairs {
            self.entries.insert(source, target);
        }
    }

    /// Drop every assignment. Only an explicit user reset calls this.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Rgb, Rgb)> + '_ {
        self.entries.iter().map(|(s, t)| (*s, *t))
    }
}
