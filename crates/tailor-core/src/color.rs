//! HSLA color string handling.
//!
//! Treatments store colors as `hsla(h,s%,l%,a)` strings and the engine
//! passes them through to the page untouched. Parsing only happens at the
//! edges: settings validation and the UI's color preview.

use std::fmt;
use std::str::FromStr;

/// A color parsed from an `hsla()` string.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsla {
    pub hue: f64,
    /// Saturation percentage, 0-100.
    pub saturation: f64,
    /// Lightness percentage, 0-100.
    pub lightness: f64,
    pub alpha: f64,
}

/// Error returned when a string is not an `hsla()` color.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("not a valid hsla() color: {0:?}")]
pub struct ParseHslaError(pub String);

impl FromStr for Hsla {
    type Err = ParseHslaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let compact: String = s.chars().filter(|c| !c.is_whitespace()).collect();

        let body = compact
            .strip_prefix("hsla(")
            .and_then(|rest| rest.strip_suffix(')'))
            .ok_or_else(|| ParseHslaError(s.to_string()))?;

        let mut parts = body.split(',');
        let hue = parse_number(parts.next(), s)?;
        let saturation = parse_percent(parts.next(), s)?;
        let lightness = parse_percent(parts.next(), s)?;
        let alpha = parse_number(parts.next(), s)?;

        if parts.next().is_some() {
            return Err(ParseHslaError(s.to_string()));
        }

        Ok(Self {
            hue,
            saturation,
            lightness,
            alpha,
        })
    }
}

impl fmt::Display for Hsla {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hsla({},{}%,{}%,{})",
            self.hue, self.saturation, self.lightness, self.alpha
        )
    }
}

fn parse_number(part: Option<&str>, original: &str) -> Result<f64, ParseHslaError> {
    part.and_then(|value| value.parse::<f64>().ok())
        .filter(|value| value.is_finite() && *value >= 0.0)
        .ok_or_else(|| ParseHslaError(original.to_string()))
}

fn parse_percent(part: Option<&str>, original: &str) -> Result<f64, ParseHslaError> {
    let trimmed = part
        .and_then(|value| value.strip_suffix('%'))
        .ok_or_else(|| ParseHslaError(original.to_string()))?;
    parse_number(Some(trimmed), original)
}
