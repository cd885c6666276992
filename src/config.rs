use std::collections::BTreeMap;
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use bon::Builder;
use serde::de::{self, Unexpected};
use serde::{Deserialize, Deserializer};

use crate::color::{Color, ColorBands};
use crate::error::{GaugeError, Result};

/// Inset applied to the configured arc radius before stroking.
pub const ARC_INSET: f64 = 2.0;

/// Distance between the inner edge of the arc and the default tick radius.
pub const TICK_INSET: f64 = 14.0;

/// Cap used for the cover and progress arcs; `lineCap` only styles ticks.
pub const ARC_CAP: LineCap = LineCap::Round;

// ============================================================================
// STYLE TYPES
// ============================================================================

/// Shape used at the ends of stroked arcs and tick marks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineCap {
    Butt,
    #[default]
    Round,
    Square,
}

/// A parsed CSS font shorthand; only the pixel size and family are kept.
#[derive(Debug, Clone, PartialEq)]
pub struct CssFont {
    pub size_px: f32,
    pub family: String,
}

impl FromStr for CssFont {
    type Err = GaugeError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || GaugeError::InvalidFont {
            value: s.to_string(),
        };
        let tokens: Vec<&str> = s.split_whitespace().collect();
        // "bold 18px/1.2 sans-serif": the size token may carry a line height.
        let (index, size_px) = tokens
            .iter()
            .enumerate()
            .find_map(|(i, token)| {
                let size = token.split('/').next()?.strip_suffix("px")?;
                size.parse::<f32>().ok().map(|size| (i, size))
            })
            .ok_or_else(invalid)?;
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(invalid());
        }
        Ok(Self {
            size_px,
            family: tokens[index + 1..].join(" "),
        })
    }
}

impl fmt::Display for CssFont {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}px {}", self.size_px, self.family)
    }
}

/// Configuration for the main arc
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArcStyle {
    pub radius: f64,
    pub line_width: f64,
}

/// Configuration for tick marks along the arc
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickMarkStyle {
    pub number: u32,
    pub width: f64,
    pub height: f64,
    /// Outer tick radius; `None` or `0` places ticks inside the arc.
    #[serde(default, deserialize_with = "radius_override")]
    pub radius: Option<f64>,
    /// Added to every gap to absorb the division error over many ticks.
    pub fixed: f64,
}

/// Accepts a number, `null` or `""` (no override) for `tickMark.radius`.
fn radius_override<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Radius {
        Px(f64),
        Text(String),
    }

    match Option::<Radius>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Radius::Px(radius)) => Ok(Some(radius)),
        Some(Radius::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(Radius::Text(text)) => Err(de::Error::invalid_value(
            Unexpected::Str(&text),
            &"a radius in px, null or an empty string",
        )),
    }
}

impl Default for TickMarkStyle {
    fn default() -> Self {
        Self {
            number: 20,
            width: 2.0,
            height: 2.0,
            radius: None,
            fixed: 0.005,
        }
    }
}

// ============================================================================
// USER OPTIONS (PARTIAL)
// ============================================================================

/// User overrides. Every key is optional and replaces the default wholesale.
///
/// Nested objects (`arc`, `tickMark`, `color`) are not merged field by field:
/// supplying one means supplying all of it.
#[derive(Debug, Clone, Default, Builder, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GaugeOptions {
    pub cx: Option<f64>,
    pub cy: Option<f64>,
    #[serde(alias = "startAngel")]
    pub start_angle: Option<f64>,
    #[serde(alias = "endAngel")]
    pub end_angle: Option<f64>,
    pub arc: Option<ArcStyle>,
    pub show_tick_mark: Option<bool>,
    pub tick_mark: Option<TickMarkStyle>,
    pub color: Option<BTreeMap<u32, String>>,
    pub show_percent: Option<bool>,
    #[builder(into)]
    pub percent_font: Option<String>,
    pub percent_offset_top: Option<f64>,
    #[builder(into)]
    pub label: Option<String>,
    #[builder(into)]
    pub label_font: Option<String>,
    pub label_offset_top: Option<f64>,
    #[builder(into)]
    pub default_color: Option<String>,
    pub line_cap: Option<LineCap>,
}

impl GaugeOptions {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

// ============================================================================
// RESOLVED CONFIGURATION
// ============================================================================

/// Fully resolved gauge configuration. Never mutated after [`GaugeConfig::resolve`].
#[derive(Debug, Clone, PartialEq)]
pub struct GaugeConfig {
    pub cx: f64,
    pub cy: f64,
    pub start_angle: f64,
    pub end_angle: f64,
    pub arc: ArcStyle,
    pub show_tick_mark: bool,
    pub tick_mark: TickMarkStyle,
    pub color: ColorBands,
    pub show_percent: bool,
    pub percent_font: CssFont,
    pub percent_offset_top: f64,
    pub label: String,
    pub label_font: CssFont,
    pub label_offset_top: f64,
    pub default_color: Color,
    pub line_cap: LineCap,
}

impl GaugeConfig {
    /// Defaults for a surface of the given size: centered, a full circle
    /// starting at twelve o'clock, three color bands.
    pub fn defaults(width: f64, height: f64) -> Self {
        Self {
            cx: width / 2.0,
            cy: height / 2.0,
            start_angle: -PI / 2.0,
            end_angle: PI * 3.0 / 2.0,
            arc: ArcStyle {
                radius: height / 2.0,
                line_width: 12.0,
            },
            show_tick_mark: false,
            tick_mark: TickMarkStyle::default(),
            color: ColorBands::with_base(Color::new(0xfc, 0x39, 0x1e))
                .band(60, Color::new(0xfd, 0xa0, 0x29))
                .band(80, Color::new(0x4c, 0xa3, 0xfc)),
            show_percent: true,
            percent_font: CssFont {
                size_px: 36.0,
                family: "Arial".to_string(),
            },
            percent_offset_top: -10.0,
            label: String::new(),
            label_font: CssFont {
                size_px: 18.0,
                family: "Arial".to_string(),
            },
            label_offset_top: 30.0,
            default_color: Color::new(0xe5, 0xe5, 0xe5),
            line_cap: LineCap::Round,
        }
    }

    /// Shallow-merges `options` over `defaults` into a new, validated config.
    pub fn resolve(defaults: &GaugeConfig, options: &GaugeOptions) -> Result<Self> {
        let color = match &options.color {
            Some(map) => ColorBands::parse(map.iter().map(|(t, hex)| (*t, hex.as_str())))?,
            None => defaults.color.clone(),
        };
        let font = |value: &Option<String>, default: &CssFont| -> Result<CssFont> {
            value
                .as_deref()
                .map(str::parse::<CssFont>)
                .transpose()
                .map(|font| font.unwrap_or_else(|| default.clone()))
        };

        let config = Self {
            cx: options.cx.unwrap_or(defaults.cx),
            cy: options.cy.unwrap_or(defaults.cy),
            start_angle: options.start_angle.unwrap_or(defaults.start_angle),
            end_angle: options.end_angle.unwrap_or(defaults.end_angle),
            arc: options.arc.unwrap_or(defaults.arc),
            show_tick_mark: options.show_tick_mark.unwrap_or(defaults.show_tick_mark),
            tick_mark: options.tick_mark.unwrap_or(defaults.tick_mark),
            color,
            show_percent: options.show_percent.unwrap_or(defaults.show_percent),
            percent_font: font(&options.percent_font, &defaults.percent_font)?,
            percent_offset_top: options
                .percent_offset_top
                .unwrap_or(defaults.percent_offset_top),
            label: options
                .label
                .clone()
                .unwrap_or_else(|| defaults.label.clone()),
            label_font: font(&options.label_font, &defaults.label_font)?,
            label_offset_top: options.label_offset_top.unwrap_or(defaults.label_offset_top),
            default_color: match &options.default_color {
                Some(hex) => hex.parse()?,
                None => defaults.default_color,
            },
            line_cap: options.line_cap.unwrap_or(defaults.line_cap),
        };
        config.validate()?;
        Ok(config)
    }

    /// Rejects geometry that would draw garbage.
    pub fn validate(&self) -> Result<()> {
        let finite = |field: &'static str, value: f64| {
            if value.is_finite() {
                Ok(())
            } else {
                Err(GaugeError::InvalidGeometry { field, value })
            }
        };
        let non_negative = |field: &'static str, value: f64| {
            finite(field, value)?;
            if value < 0.0 {
                return Err(GaugeError::InvalidGeometry { field, value });
            }
            Ok(())
        };

        finite("cx", self.cx)?;
        finite("cy", self.cy)?;
        finite("startAngle", self.start_angle)?;
        finite("endAngle", self.end_angle)?;
        finite("percentOffsetTop", self.percent_offset_top)?;
        finite("labelOffsetTop", self.label_offset_top)?;
        non_negative("arc.radius", self.arc.radius)?;
        non_negative("arc.lineWidth", self.arc.line_width)?;
        non_negative(
            "arc.radius - 2 - arc.lineWidth",
            self.arc.radius - ARC_INSET - self.arc.line_width,
        )?;

        if self.show_tick_mark {
            if self.tick_mark.number == 0 {
                return Err(GaugeError::NoTickMarks);
            }
            non_negative("tickMark.width", self.tick_mark.width)?;
            non_negative("tickMark.height", self.tick_mark.height)?;
            finite("tickMark.fixed", self.tick_mark.fixed)?;
            non_negative("tickMark.radius", self.tick_radius())?;
        }
        Ok(())
    }

    /// Angular span covered by 0..=100%.
    pub fn sweep(&self) -> f64 {
        (self.end_angle - self.start_angle).abs()
    }

    /// Radius handed to the arc drawer (which subtracts the line width itself).
    pub fn arc_radius(&self) -> f64 {
        self.arc.radius - ARC_INSET
    }

    /// Outer tick radius. A zero override counts as unset.
    pub fn tick_radius(&self) -> f64 {
        match self.tick_mark.radius {
            Some(radius) if radius != 0.0 => radius,
            _ => self.arc.radius - self.arc.line_width - TICK_INSET,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> GaugeConfig {
        GaugeConfig::defaults(300.0, 300.0)
    }

    #[test]
    fn defaults_follow_surface_size() {
        let config = GaugeConfig::defaults(400.0, 200.0);
        assert_eq!((config.cx, config.cy), (200.0, 100.0));
        assert_eq!(config.arc.radius, 100.0);
        assert!((config.sweep() - 2.0 * PI).abs() < 1e-12);
        assert_eq!(config.tick_radius(), 100.0 - 12.0 - 14.0);
        assert_eq!(config.arc_radius(), 98.0);
    }

    #[test]
    fn empty_options_resolve_to_defaults() {
        let resolved = GaugeConfig::resolve(&defaults(), &GaugeOptions::default()).unwrap();
        assert_eq!(resolved, defaults());
    }

    #[test]
    fn resolve_leaves_defaults_untouched() {
        let defaults = defaults();
        let options = GaugeOptions::builder().label("CPU").cx(10.0).build();
        let resolved = GaugeConfig::resolve(&defaults, &options).unwrap();
        assert_eq!(resolved.label, "CPU");
        assert_eq!(resolved.cx, 10.0);
        assert_eq!(defaults.label, "");
        assert_eq!(defaults.cx, 150.0);
    }

    #[test]
    fn nested_objects_replace_wholesale() {
        let options = GaugeOptions::from_json(
            r##"{ "color": { "50": "#000000", "0": "#ffffff" }, "arc": { "radius": 80, "lineWidth": 4 } }"##,
        )
        .unwrap();
        let resolved = GaugeConfig::resolve(&defaults(), &options).unwrap();
        let bands: Vec<_> = resolved.color.iter().collect();
        assert_eq!(bands, vec![(0, Color::WHITE), (50, Color::BLACK)]);
        assert_eq!(resolved.arc, ArcStyle { radius: 80.0, line_width: 4.0 });
    }

    #[test]
    fn partial_nested_object_is_rejected() {
        let err = GaugeOptions::from_json(r#"{ "tickMark": { "number": 10 } }"#);
        assert!(err.is_err());
    }

    #[test]
    fn json_keys_match_option_names() {
        let options = GaugeOptions::from_json(
            r##"{
                "startAngel": 0.5,
                "endAngle": 2.5,
                "showTickMark": true,
                "tickMark": { "number": 10, "width": 3, "height": 6, "fixed": 0 },
                "showPercent": false,
                "percentFont": "bold 40px Helvetica Neue",
                "labelOffsetTop": 12,
                "defaultColor": "#ccc",
                "lineCap": "butt"
            }"##,
        )
        .unwrap();
        let resolved = GaugeConfig::resolve(&defaults(), &options).unwrap();
        assert_eq!(resolved.start_angle, 0.5);
        assert_eq!(resolved.end_angle, 2.5);
        assert!(resolved.show_tick_mark);
        assert_eq!(resolved.tick_mark.number, 10);
        assert_eq!(resolved.tick_mark.radius, None);
        assert!(!resolved.show_percent);
        assert_eq!(resolved.percent_font.size_px, 40.0);
        assert_eq!(resolved.percent_font.family, "Helvetica Neue");
        assert_eq!(resolved.label_offset_top, 12.0);
        assert_eq!(resolved.default_color, Color::new(0xcc, 0xcc, 0xcc));
        assert_eq!(resolved.line_cap, LineCap::Butt);
    }

    #[test]
    fn zero_tick_radius_falls_back_to_default() {
        let mut config = defaults();
        config.tick_mark.radius = Some(0.0);
        assert_eq!(config.tick_radius(), 150.0 - 12.0 - 14.0);
        config.tick_mark.radius = Some(90.0);
        assert_eq!(config.tick_radius(), 90.0);
    }

    #[test]
    fn tick_radius_accepts_empty_string_and_null() {
        for radius in [r#""""#, "null", "0"] {
            let json = format!(
                r#"{{ "tickMark": {{ "number": 20, "width": 2, "height": 2, "radius": {radius}, "fixed": 0.005 }} }}"#
            );
            let options = GaugeOptions::from_json(&json).unwrap();
            let resolved = GaugeConfig::resolve(&defaults(), &options).unwrap();
            assert_eq!(resolved.tick_radius(), 124.0, "radius {radius}");
        }

        let options = GaugeOptions::from_json(
            r#"{ "tickMark": { "number": 20, "width": 2, "height": 2, "radius": 100, "fixed": 0 } }"#,
        )
        .unwrap();
        assert_eq!(options.tick_mark.unwrap().radius, Some(100.0));

        let bad = GaugeOptions::from_json(
            r#"{ "tickMark": { "number": 20, "width": 2, "height": 2, "radius": "big", "fixed": 0 } }"#,
        );
        assert!(bad.is_err());
    }

    #[test]
    fn parses_font_shorthand() {
        let font: CssFont = "italic 18px/1.5 sans-serif".parse().unwrap();
        assert_eq!(font.size_px, 18.0);
        assert_eq!(font.family, "sans-serif");
        assert!("Arial".parse::<CssFont>().is_err());
        assert!("0px Arial".parse::<CssFont>().is_err());
    }

    #[test]
    fn rejects_bad_colors_and_fonts() {
        let options = GaugeOptions::builder().default_color("grey").build();
        assert_eq!(
            GaugeConfig::resolve(&defaults(), &options),
            Err(GaugeError::InvalidColor {
                value: "grey".to_string()
            })
        );

        let options = GaugeOptions::builder().label_font("large").build();
        assert!(matches!(
            GaugeConfig::resolve(&defaults(), &options),
            Err(GaugeError::InvalidFont { .. })
        ));
    }

    #[test]
    fn rejects_bands_without_zero() {
        let options = GaugeOptions::builder()
            .color(BTreeMap::from([(20, "#000".to_string())]))
            .build();
        assert_eq!(
            GaugeConfig::resolve(&defaults(), &options),
            Err(GaugeError::MissingBaseBand)
        );
    }

    #[test]
    fn rejects_degenerate_geometry() {
        let options = GaugeOptions::builder()
            .arc(ArcStyle {
                radius: -5.0,
                line_width: 12.0,
            })
            .build();
        assert!(matches!(
            GaugeConfig::resolve(&defaults(), &options),
            Err(GaugeError::InvalidGeometry {
                field: "arc.radius",
                ..
            })
        ));

        let options = GaugeOptions::builder()
            .arc(ArcStyle {
                radius: 10.0,
                line_width: 12.0,
            })
            .build();
        assert!(matches!(
            GaugeConfig::resolve(&defaults(), &options),
            Err(GaugeError::InvalidGeometry { .. })
        ));

        let options = GaugeOptions::builder().start_angle(f64::NAN).build();
        assert!(GaugeConfig::resolve(&defaults(), &options).is_err());
    }

    #[test]
    fn tick_count_checked_only_when_shown() {
        let no_ticks = TickMarkStyle {
            number: 0,
            ..TickMarkStyle::default()
        };
        let hidden = GaugeOptions::builder().tick_mark(no_ticks).build();
        assert!(GaugeConfig::resolve(&defaults(), &hidden).is_ok());

        let shown = GaugeOptions::builder()
            .tick_mark(no_ticks)
            .show_tick_mark(true)
            .build();
        assert_eq!(
            GaugeConfig::resolve(&defaults(), &shown),
            Err(GaugeError::NoTickMarks)
        );
    }
}
