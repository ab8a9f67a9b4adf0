//! SVG documents for the text and watermark layers.
//!
//! Layers are emitted as full-canvas SVG so rasterization is a single resvg pass with no
//! placement math outside this module.

use std::fmt::Write as _;

use crate::{
    foundation::core::{Affine, Canvas, Vec2},
    text::{color::Color, params::TextOverlayParams},
};

/// Nominal canvas width that all text sizes and offsets are authored against.
pub const REFERENCE_WIDTH: f64 = 1000.0;

pub const WATERMARK_TEXT: &str = "BehindTheText";

/// Scale from reference units to target pixels.
pub fn render_scale(canvas: Canvas, reference_width: f64) -> f64 {
    f64::from(canvas.width) / reference_width
}

/// Anchor transform for the text: translate to the position, rotate, then skew.
pub fn text_transform(params: &TextOverlayParams, canvas: Canvas) -> Affine {
    let x = f64::from(params.position_x) / 100.0 * f64::from(canvas.width);
    let y = f64::from(params.position_y) / 100.0 * f64::from(canvas.height);
    let angle = f64::from(params.rotation).to_radians();
    let mut xf = Affine::translate(Vec2::new(x, y)) * Affine::rotate(angle);
    if params.skew_x != 0.0 || params.skew_y != 0.0 {
        let tan_x = f64::from(params.skew_x).to_radians().tan();
        let tan_y = f64::from(params.skew_y).to_radians().tan();
        xf *= Affine::new([1.0, tan_y, tan_x, 1.0, 0.0, 0.0]);
    }
    xf
}

/// Full-canvas SVG holding the styled text, centered on its anchor.
///
/// The drop shadow filter sits on an untransformed outer group so shadow offsets stay in canvas
/// space regardless of rotation. The stroke is drawn first, beneath the fill.
pub fn text_layer_svg(params: &TextOverlayParams, canvas: Canvas, scale: f64) -> String {
    let (w, h) = (canvas.width, canvas.height);
    let mut defs = String::new();
    let mut svg = String::with_capacity(1024);

    let fill = if params.use_gradient {
        let _ = write!(
            defs,
            r#"<linearGradient id="text-fill" x1="0" y1="0" x2="1" y2="0">{}{}</linearGradient>"#,
            gradient_stop(0.0, params.gradient_start_color),
            gradient_stop(1.0, params.gradient_end_color),
        );
        r#"fill="url(#text-fill)""#.to_owned()
    } else {
        paint_attrs("fill", params.color)
    };

    let shadow = params.shadow();
    if let Some(s) = shadow {
        let _ = write!(
            defs,
            r#"<filter id="text-shadow" filterUnits="userSpaceOnUse" x="0" y="0" width="{w}" height="{h}"><feDropShadow dx="{}" dy="{}" stdDeviation="{}" flood-color="{}" flood-opacity="{}"/></filter>"#,
            f64::from(s.offset_x) * scale,
            f64::from(s.offset_y) * scale,
            f64::from(s.blur) * scale / 2.0,
            s.color.to_hex_rgb(),
            s.color.alpha(),
        );
    }

    let font = format!(
        r#"font-family="'{}', Impact, sans-serif" font-size="{}" font-weight="{}" letter-spacing="{}" text-anchor="middle" dominant-baseline="central" xml:space="preserve""#,
        escape_xml(&params.font_family),
        f64::from(params.font_size) * scale,
        params.font_weight,
        f64::from(params.letter_spacing) * scale,
    );
    let text = escape_xml(&params.text);
    let [a, b, c, d, e, f] = text_transform(params, canvas).as_coeffs();

    let _ = write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}"><defs>{defs}</defs>"#
    );
    let _ = write!(svg, r#"<g opacity="{}""#, params.opacity.clamp(0.0, 1.0));
    if shadow.is_some() {
        svg.push_str(r#" filter="url(#text-shadow)""#);
    }
    let _ = write!(svg, r#"><g transform="matrix({a} {b} {c} {d} {e} {f})">"#);
    if let Some(s) = params.stroke() {
        let _ = write!(
            svg,
            r#"<text {font} fill="none" {} stroke-width="{}" stroke-linejoin="round">{text}</text>"#,
            paint_attrs("stroke", s.color),
            f64::from(s.width) * scale,
        );
    }
    let _ = write!(svg, r#"<text {font} {fill}>{text}</text></g></g></svg>"#);
    svg
}

/// Watermark font size and corner padding for a canvas width.
pub fn watermark_metrics(width: u32) -> (u32, u32) {
    let font_size = ((f64::from(width) * 0.018).round() as u32).max(14);
    let padding = (f64::from(font_size) * 0.8).round() as u32;
    (font_size, padding)
}

/// Full-canvas SVG with a semi-transparent label in the bottom-right corner.
pub fn watermark_svg(label: &str, canvas: Canvas) -> String {
    let (w, h) = (canvas.width, canvas.height);
    let (font_size, padding) = watermark_metrics(w);
    let x = i64::from(w) - i64::from(padding);
    let y = i64::from(h) - i64::from(padding);
    format!(
        concat!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            r#"<defs><filter id="wm-shadow" x="-20%" y="-20%" width="140%" height="140%">"#,
            r#"<feDropShadow dx="0" dy="1" stdDeviation="{std}" flood-color="black" flood-opacity="0.5"/>"#,
            r#"</filter></defs>"#,
            r#"<text x="{x}" y="{y}" font-family="Inter, 'Segoe UI', system-ui, sans-serif" font-size="{fs}" font-weight="600" "#,
            r#"text-anchor="end" fill="white" opacity="0.6" filter="url(#wm-shadow)">{label}</text></svg>"#,
        ),
        w = w,
        h = h,
        std = f64::from(font_size) * 0.15,
        x = x,
        y = y,
        fs = font_size,
        label = escape_xml(label),
    )
}

fn paint_attrs(kind: &str, color: Color) -> String {
    format!(
        r#"{kind}="{}" {kind}-opacity="{}""#,
        color.to_hex_rgb(),
        color.alpha()
    )
}

fn gradient_stop(offset: f64, color: Color) -> String {
    format!(
        r#"<stop offset="{offset}" stop-color="{}" stop-opacity="{}"/>"#,
        color.to_hex_rgb(),
        color.alpha()
    )
}

/// Escape markup characters and drop characters XML 1.0 cannot carry.
pub(crate) fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '\t' | '\n' | '\r' => out.push(ch),
            c if c < '\u{20}' || c == '\u{fffe}' || c == '\u{ffff}' => {}
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/text/svg.rs"]
mod tests;
