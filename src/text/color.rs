use std::{fmt, str::FromStr};

use crate::foundation::error::{BehindTextError, BehindTextResult};

/// Straight-alpha sRGB color with components in `[0, 1]`.
///
/// Parsed from CSS-style strings: `#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa`, `rgb()`, `rgba()`,
/// `hsl()` and `hsla()`. Serialized back as hex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Color {
    pub const WHITE: Self = Self::rgba(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Self = Self::rgba(0.0, 0.0, 0.0, 1.0);

    pub const fn rgba(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    pub fn parse(s: &str) -> BehindTextResult<Self> {
        let s = s.trim();
        let lower = s.to_ascii_lowercase();
        if let Some(hex) = s.strip_prefix('#') {
            return parse_hex(hex);
        }
        if let Some(args) =
            functional_args(&lower, "rgba").or_else(|| functional_args(&lower, "rgb"))
        {
            return parse_rgb_args(args);
        }
        if let Some(args) =
            functional_args(&lower, "hsla").or_else(|| functional_args(&lower, "hsl"))
        {
            return parse_hsl_args(args);
        }
        Err(BehindTextError::validation(format!(
            "unrecognized color \"{s}\""
        )))
    }

    /// Straight RGBA8.
    pub fn to_rgba8(self) -> [u8; 4] {
        fn to_u8(x: f64) -> u8 {
            (x.clamp(0.0, 1.0) * 255.0).round() as u8
        }
        [to_u8(self.r), to_u8(self.g), to_u8(self.b), to_u8(self.a)]
    }

    /// `#rrggbb`, ignoring alpha. Used for SVG paint where opacity is emitted separately.
    pub fn to_hex_rgb(self) -> String {
        let [r, g, b, _] = self.to_rgba8();
        format!("#{r:02x}{g:02x}{b:02x}")
    }

    pub fn alpha(self) -> f64 {
        self.a.clamp(0.0, 1.0)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b, a] = self.to_rgba8();
        if a == 255 {
            write!(f, "#{r:02x}{g:02x}{b:02x}")
        } else {
            write!(f, "#{r:02x}{g:02x}{b:02x}{a:02x}")
        }
    }
}

impl FromStr for Color {
    type Err = BehindTextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl serde::Serialize for Color {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for Color {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(|e| serde::de::Error::custom(e.status()))
    }
}

fn functional_args<'a>(s: &'a str, name: &str) -> Option<&'a str> {
    s.strip_prefix(name)?
        .trim_start()
        .strip_prefix('(')?
        .strip_suffix(')')
}

fn parse_hex(s: &str) -> BehindTextResult<Color> {
    fn nibble(c: u8) -> BehindTextResult<u8> {
        let c = c as char;
        let Some(d) = c.to_digit(16) else {
            return Err(BehindTextError::validation(format!(
                "invalid hex digit '{c}'"
            )));
        };
        Ok(d as u8)
    }

    let bytes = s.as_bytes();
    let channels: Vec<u8> = match bytes.len() {
        3 | 4 => bytes
            .iter()
            .map(|&c| nibble(c).map(|n| n * 17))
            .collect::<BehindTextResult<_>>()?,
        6 | 8 => bytes
            .chunks_exact(2)
            .map(|p| Ok(nibble(p[0])? * 16 + nibble(p[1])?))
            .collect::<BehindTextResult<_>>()?,
        _ => {
            return Err(BehindTextError::validation(
                "hex color must be #rgb, #rgba, #rrggbb or #rrggbbaa",
            ));
        }
    };
    let a = channels.get(3).copied().unwrap_or(255);
    Ok(Color::rgba(
        f64::from(channels[0]) / 255.0,
        f64::from(channels[1]) / 255.0,
        f64::from(channels[2]) / 255.0,
        f64::from(a) / 255.0,
    ))
}

fn split_args(args: &str) -> Vec<&str> {
    args.split([',', ' ', '/'])
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}

fn number(part: &str) -> BehindTextResult<f64> {
    let v: f64 = part
        .parse()
        .map_err(|_| BehindTextError::validation(format!("invalid color component \"{part}\"")))?;
    if !v.is_finite() {
        return Err(BehindTextError::validation(
            "color components must be finite",
        ));
    }
    Ok(v)
}

/// Alpha as a 0..1 number or a percentage.
fn alpha_component(part: Option<&&str>) -> BehindTextResult<f64> {
    match part {
        None => Ok(1.0),
        Some(p) => match p.strip_suffix('%') {
            Some(pct) => Ok(number(pct)? / 100.0),
            None => number(p),
        },
    }
}

fn parse_rgb_args(args: &str) -> BehindTextResult<Color> {
    let parts = split_args(args);
    if !(3..=4).contains(&parts.len()) {
        return Err(BehindTextError::validation(
            "rgb() expects 3 or 4 components",
        ));
    }
    let channel = |p: &str| -> BehindTextResult<f64> {
        match p.strip_suffix('%') {
            Some(pct) => Ok(number(pct)? / 100.0),
            None => Ok(number(p)? / 255.0),
        }
    };
    Ok(Color::rgba(
        channel(parts[0])?.clamp(0.0, 1.0),
        channel(parts[1])?.clamp(0.0, 1.0),
        channel(parts[2])?.clamp(0.0, 1.0),
        alpha_component(parts.get(3))?.clamp(0.0, 1.0),
    ))
}

fn parse_hsl_args(args: &str) -> BehindTextResult<Color> {
    let parts = split_args(args);
    if !(3..=4).contains(&parts.len()) {
        return Err(BehindTextError::validation(
            "hsl() expects 3 or 4 components",
        ));
    }
    let h = number(parts[0].trim_end_matches("deg"))?;
    let pct = |p: &str| -> BehindTextResult<f64> {
        Ok(number(p.trim_end_matches('%'))? / 100.0)
    };
    Ok(hsla_to_rgba(
        h,
        pct(parts[1])?,
        pct(parts[2])?,
        alpha_component(parts.get(3))?.clamp(0.0, 1.0),
    ))
}

fn hsla_to_rgba(h: f64, s: f64, l: f64, a: f64) -> Color {
    let h = (h % 360.0 + 360.0) % 360.0 / 360.0;
    let s = s.clamp(0.0, 1.0);
    let l = l.clamp(0.0, 1.0);

    if s == 0.0 {
        return Color::rgba(l, l, l, a);
    }

    fn hue_to_rgb(p: f64, q: f64, mut t: f64) -> f64 {
        if t < 0.0 {
            t += 1.0;
        }
        if t > 1.0 {
            t -= 1.0;
        }
        if t < 1.0 / 6.0 {
            return p + (q - p) * 6.0 * t;
        }
        if t < 1.0 / 2.0 {
            return q;
        }
        if t < 2.0 / 3.0 {
            return p + (q - p) * (2.0 / 3.0 - t) * 6.0;
        }
        p
    }

    let q = if l < 0.5 {
        l * (1.0 + s)
    } else {
        l + s - l * s
    };
    let p = 2.0 * l - q;

    Color::rgba(
        hue_to_rgb(p, q, h + 1.0 / 3.0),
        hue_to_rgb(p, q, h),
        hue_to_rgb(p, q, h - 1.0 / 3.0),
        a,
    )
}

#[cfg(test)]
#[path = "../../tests/unit/text/color.rs"]
mod tests;
