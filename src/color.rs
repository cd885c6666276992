use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::GaugeError;

/// Color representation for gauge elements
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::new(0x00, 0x00, 0x00);
    pub const WHITE: Color = Color::new(0xff, 0xff, 0xff);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const fn as_tuple(self) -> (u8, u8, u8) {
        (self.r, self.g, self.b)
    }
}

impl FromStr for Color {
    type Err = GaugeError;

    /// Parses `#rgb` or `#rrggbb` (the `#` is optional).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || GaugeError::InvalidColor {
            value: s.to_string(),
        };
        let hex = s.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|_| invalid())
        };
        match hex.len() {
            3 => {
                let (r, g, b) = (channel(0..1)?, channel(1..2)?, channel(2..3)?);
                Ok(Color::new(r * 0x11, g * 0x11, b * 0x11))
            }
            6 => Ok(Color::new(channel(0..2)?, channel(2..4)?, channel(4..6)?)),
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Ordered percent-threshold to color table.
///
/// A band starts just above its threshold and runs up to the next one; the
/// last band is open-ended.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorBands {
    bands: BTreeMap<u32, Color>,
}

impl ColorBands {
    /// Builds the table, requiring a band at threshold 0.
    pub fn new(bands: BTreeMap<u32, Color>) -> Result<Self, GaugeError> {
        if !bands.contains_key(&0) {
            return Err(GaugeError::MissingBaseBand);
        }
        Ok(Self { bands })
    }

    /// A table with a single band starting at 0.
    pub fn with_base(color: Color) -> Self {
        Self {
            bands: BTreeMap::from([(0, color)]),
        }
    }

    /// Adds (or replaces) the band starting above `threshold`.
    pub fn band(mut self, threshold: u32, color: Color) -> Self {
        self.bands.insert(threshold, color);
        self
    }

    /// Parses a threshold table whose colors are hex strings.
    pub fn parse<'a, I>(entries: I) -> Result<Self, GaugeError>
    where
        I: IntoIterator<Item = (u32, &'a str)>,
    {
        let bands = entries
            .into_iter()
            .map(|(threshold, hex)| Ok((threshold, hex.parse::<Color>()?)))
            .collect::<Result<BTreeMap<_, _>, GaugeError>>()?;
        Self::new(bands)
    }

    /// Color of the greatest threshold strictly below `percent`, or
    /// `default` when no threshold is below it.
    ///
    /// Hitting a threshold exactly does not enter its band: 60 with bands at
    /// 0 and 60 still picks the 0 band.
    pub fn select(&self, percent: u32, default: Color) -> Color {
        self.bands
            .range(..percent)
            .next_back()
            .map(|(_, color)| *color)
            .unwrap_or(default)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, Color)> + '_ {
        self.bands.iter().map(|(t, c)| (*t, *c))
    }
}
