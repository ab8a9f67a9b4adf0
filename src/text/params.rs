use crate::{
    foundation::error::{BehindTextError, BehindTextResult},
    text::color::Color,
};

pub const ENV_DEFAULT_TEXT: &str = "BEHIND_TEXT_DEFAULT_TEXT";
pub const ENV_DEFAULT_FONT_SIZE: &str = "BEHIND_TEXT_DEFAULT_FONT_SIZE";
pub const ENV_DEFAULT_FONT_COLOR: &str = "BEHIND_TEXT_DEFAULT_FONT_COLOR";

/// Everything that controls the text layer and the depth cut for one render.
///
/// Sizes and offsets are expressed at the 1000 px reference width and scaled to the target
/// canvas at render time. Positions are percentages of the canvas; angles are degrees.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TextOverlayParams {
    pub text: String,

    pub font_family: String,
    pub font_size: f32,
    pub font_weight: u16,
    pub letter_spacing: f32,

    pub color: Color,
    pub use_gradient: bool,
    pub gradient_start_color: Color,
    pub gradient_end_color: Color,

    pub position_x: f32,
    pub position_y: f32,
    pub rotation: f32,
    pub skew_x: f32,
    pub skew_y: f32,

    /// 0–255; depth above `threshold / 255` is treated as foreground.
    pub depth_threshold: f32,

    pub opacity: f32,
    pub shadow_enabled: bool,
    pub shadow_color: Color,
    pub shadow_blur: f32,
    pub shadow_offset_x: f32,
    pub shadow_offset_y: f32,
    pub stroke_enabled: bool,
    pub stroke_color: Color,
    pub stroke_width: f32,
}

impl Default for TextOverlayParams {
    fn default() -> Self {
        Self {
            text: "YOUR TEXT".to_owned(),
            font_family: "Anton".to_owned(),
            font_size: 120.0,
            font_weight: 400,
            letter_spacing: 0.0,
            color: Color::WHITE,
            use_gradient: false,
            gradient_start_color: Color::WHITE,
            gradient_end_color: Color::rgba(0.0, 168.0 / 255.0, 1.0, 1.0),
            position_x: 50.0,
            position_y: 50.0,
            rotation: 0.0,
            skew_x: 0.0,
            skew_y: 0.0,
            depth_threshold: 128.0,
            opacity: 1.0,
            shadow_enabled: false,
            shadow_color: Color::BLACK,
            shadow_blur: 10.0,
            shadow_offset_x: 0.0,
            shadow_offset_y: 4.0,
            stroke_enabled: false,
            stroke_color: Color::BLACK,
            stroke_width: 2.0,
        }
    }
}

/// Drop shadow in reference units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShadowParams {
    pub color: Color,
    pub blur: f32,
    pub offset_x: f32,
    pub offset_y: f32,
}

/// Outline in reference units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StrokeParams {
    pub color: Color,
    pub width: f32,
}

impl TextOverlayParams {
    /// Defaults, with text, font size and color taken from the process environment when set.
    pub fn from_env() -> Self {
        Self::with_default_overrides(|key| std::env::var(key).ok())
    }

    /// Defaults with overrides resolved through `lookup` (keys are the `ENV_DEFAULT_*` names).
    ///
    /// Unparseable values are ignored with a warning.
    pub fn with_default_overrides(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut params = Self::default();
        if let Some(text) = lookup(ENV_DEFAULT_TEXT).filter(|t| !t.is_empty()) {
            params.text = text;
        }
        if let Some(raw) = lookup(ENV_DEFAULT_FONT_SIZE) {
            match raw.trim().parse::<f32>() {
                Ok(v) if v.is_finite() && v > 0.0 => params.font_size = v,
                _ => tracing::warn!(
                    key = ENV_DEFAULT_FONT_SIZE,
                    value = raw.as_str(),
                    "ignoring invalid default"
                ),
            }
        }
        if let Some(raw) = lookup(ENV_DEFAULT_FONT_COLOR) {
            match Color::parse(&raw) {
                Ok(c) => params.color = c,
                Err(_) => tracing::warn!(
                    key = ENV_DEFAULT_FONT_COLOR,
                    value = raw.as_str(),
                    "ignoring invalid default"
                ),
            }
        }
        params
    }

    pub fn shadow(&self) -> Option<ShadowParams> {
        self.shadow_enabled.then_some(ShadowParams {
            color: self.shadow_color,
            blur: self.shadow_blur,
            offset_x: self.shadow_offset_x,
            offset_y: self.shadow_offset_y,
        })
    }

    pub fn stroke(&self) -> Option<StrokeParams> {
        (self.stroke_enabled && self.stroke_width > 0.0).then_some(StrokeParams {
            color: self.stroke_color,
            width: self.stroke_width,
        })
    }

    /// Reject out-of-range or non-finite values.
    pub fn validate(&self) -> BehindTextResult<()> {
        fn finite(name: &str, v: f32) -> BehindTextResult<()> {
            if v.is_finite() {
                Ok(())
            } else {
                Err(BehindTextError::validation(format!(
                    "{name} must be finite"
                )))
            }
        }
        fn in_range(name: &str, v: f32, lo: f32, hi: f32) -> BehindTextResult<()> {
            finite(name, v)?;
            if (lo..=hi).contains(&v) {
                Ok(())
            } else {
                Err(BehindTextError::validation(format!(
                    "{name} must be in [{lo}, {hi}], got {v}"
                )))
            }
        }

        if self.font_family.trim().is_empty() {
            return Err(BehindTextError::validation("fontFamily must not be empty"));
        }
        finite("fontSize", self.font_size)?;
        if self.font_size <= 0.0 {
            return Err(BehindTextError::validation("fontSize must be > 0"));
        }
        if !(1..=1000).contains(&self.font_weight) {
            return Err(BehindTextError::validation(format!(
                "fontWeight must be in [1, 1000], got {}",
                self.font_weight
            )));
        }
        finite("letterSpacing", self.letter_spacing)?;
        in_range("positionX", self.position_x, 0.0, 100.0)?;
        in_range("positionY", self.position_y, 0.0, 100.0)?;
        finite("rotation", self.rotation)?;
        // tan() diverges at +-90 degrees.
        in_range("skewX", self.skew_x, -89.0, 89.0)?;
        in_range("skewY", self.skew_y, -89.0, 89.0)?;
        in_range("depthThreshold", self.depth_threshold, 0.0, 255.0)?;
        in_range("opacity", self.opacity, 0.0, 1.0)?;
        in_range("shadowBlur", self.shadow_blur, 0.0, f32::MAX)?;
        finite("shadowOffsetX", self.shadow_offset_x)?;
        finite("shadowOffsetY", self.shadow_offset_y)?;
        in_range("strokeWidth", self.stroke_width, 0.0, f32::MAX)?;
        Ok(())
    }
}

/// Partial update of [`TextOverlayParams`]. Absent fields leave the target untouched.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct TextOverlayPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub letter_spacing: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_gradient: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gradient_start_color: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gradient_end_color: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position_x: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position_y: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skew_x: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skew_y: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depth_threshold: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shadow_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shadow_color: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shadow_blur: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shadow_offset_x: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shadow_offset_y: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke_color: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f32>,
}

impl TextOverlayPatch {
    /// Copy every present field onto `params`.
    pub fn apply(&self, params: &mut TextOverlayParams) {
        macro_rules! take {
            ($($field:ident),* $(,)?) => {
                $(
                    if let Some(v) = &self.$field {
                        params.$field = v.clone();
                    }
                )*
            };
        }
        take!(
            text,
            font_family,
            font_size,
            font_weight,
            letter_spacing,
            color,
            use_gradient,
            gradient_start_color,
            gradient_end_color,
            position_x,
            position_y,
            rotation,
            skew_x,
            skew_y,
            depth_threshold,
            opacity,
            shadow_enabled,
            shadow_color,
            shadow_blur,
            shadow_offset_x,
            shadow_offset_y,
            stroke_enabled,
            stroke_color,
            stroke_width,
        );
    }

    /// Parse a single `key=value` assignment (camelCase key) into a one-field patch.
    ///
    /// The value is read as JSON when possible (`true`, `42`, `"x"`), otherwise as a bare
    /// string, so `text=HELLO` and `fontSize=90` both work.
    pub fn parse_assignment(s: &str) -> BehindTextResult<Self> {
        let Some((key, raw)) = s.split_once('=') else {
            return Err(BehindTextError::validation(format!(
                "expected key=value, got \"{s}\""
            )));
        };
        let key = key.trim();
        if key.is_empty() {
            return Err(BehindTextError::validation("empty key in assignment"));
        }
        let single = |value: serde_json::Value| {
            let mut obj = serde_json::Map::new();
            obj.insert(key.to_owned(), value);
            serde_json::from_value::<Self>(serde_json::Value::Object(obj))
        };

        let as_string = serde_json::Value::String(raw.to_owned());
        match serde_json::from_str::<serde_json::Value>(raw) {
            Ok(v) if !v.is_object() && !v.is_array() && !v.is_string() => {
                single(v).or_else(|_| single(as_string))
            }
            _ => single(as_string),
        }
        .map_err(|e| BehindTextError::serde(format!("{key}: {e}")))
    }

    /// Merge `other` over `self`; fields present in `other` win.
    pub fn merge(mut self, other: &TextOverlayPatch) -> Self {
        macro_rules! over {
            ($($field:ident),* $(,)?) => {
                $(
                    if other.$field.is_some() {
                        self.$field = other.$field.clone();
                    }
                )*
            };
        }
        over!(
            text,
            font_family,
            font_size,
            font_weight,
            letter_spacing,
            color,
            use_gradient,
            gradient_start_color,
            gradient_end_color,
            position_x,
            position_y,
            rotation,
            skew_x,
            skew_y,
            depth_threshold,
            opacity,
            shadow_enabled,
            shadow_color,
            shadow_blur,
            shadow_offset_x,
            shadow_offset_y,
            stroke_enabled,
            stroke_color,
            stroke_width,
        );
        self
    }
}

#[cfg(test)]
#[path = "../../tests/unit/text/params.rs"]
mod tests;
