// SPDX-License-Identifier: PMPL-1.0-or-later
//! Color contrast math - WCAG 1.4.3 Contrast (Minimum)
//!
//! Parses CSS color values and computes relative luminance and contrast
//! ratios with the WCAG 2.x formula.
//! - 4.5:1 for normal text
//! - 3:1 for large text (>= 18px, or >= 14px and bold)

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Contrast required for normal-size text
pub const NORMAL_TEXT_RATIO: f64 = 4.5;
/// Contrast required for large text
pub const LARGE_TEXT_RATIO: f64 = 3.0;

/// An opaque sRGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb { r: 255, g: 255, b: 255 };
    pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };

    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Relative luminance of this color
    pub fn luminance(&self) -> f64 {
        relative_luminance(self.r, self.g, self.b)
    }

    /// Lowercase `#rrggbb`
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl std::fmt::Display for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "rgb({}, {}, {})", self.r, self.g, self.b)
    }
}

fn rgb_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^rgba?\(\s*(\d{1,3})\s*[,\s]\s*(\d{1,3})\s*[,\s]\s*(\d{1,3})\s*(?:[,/]\s*([\d.]+%?)\s*)?\)$")
            .expect("valid regex")
    })
}

/// Parse a CSS hex color (#rgb, #rrggbb)
pub fn parse_hex_color(hex: &str) -> Option<Rgb> {
    let hex = hex.trim_start_matches('#');
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    match hex.len() {
        3 => {
            let r = u8::from_str_radix(&hex[0..1].repeat(2), 16).ok()?;
            let g = u8::from_str_radix(&hex[1..2].repeat(2), 16).ok()?;
            let b = u8::from_str_radix(&hex[2..3].repeat(2), 16).ok()?;
            Some(Rgb::new(r, g, b))
        }
        6 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some(Rgb::new(r, g, b))
        }
        _ => None,
    }
}

/// Parse an rgb() or rgba() color. A zero alpha means "no color".
pub fn parse_rgb_color(value: &str) -> Option<Rgb> {
    let caps = rgb_regex().captures(value)?;
    let channel = |i: usize| -> Option<u8> {
        let v: u16 = caps[i].parse().ok()?;
        u8::try_from(v.min(255)).ok()
    };
    if let Some(alpha) = caps.get(4) {
        let raw = alpha.as_str();
        let alpha_value: f64 = match raw.strip_suffix('%') {
            Some(pct) => pct.parse::<f64>().ok()? / 100.0,
            None => raw.parse().ok()?,
        };
        if alpha_value <= 0.0 {
            return None;
        }
    }
    Some(Rgb::new(channel(1)?, channel(2)?, channel(3)?))
}

/// Parse a named CSS color
pub fn parse_named_color(name: &str) -> Option<Rgb> {
    let (r, g, b) = match name {
        "white" => (255, 255, 255),
        "black" => (0, 0, 0),
        "red" => (255, 0, 0),
        "green" => (0, 128, 0),
        "blue" => (0, 0, 255),
        "yellow" => (255, 255, 0),
        "gray" | "grey" => (128, 128, 128),
        "silver" => (192, 192, 192),
        "maroon" => (128, 0, 0),
        "olive" => (128, 128, 0),
        "lime" => (0, 255, 0),
        "aqua" | "cyan" => (0, 255, 255),
        "teal" => (0, 128, 128),
        "navy" => (0, 0, 128),
        "fuchsia" | "magenta" => (255, 0, 255),
        "purple" => (128, 0, 128),
        "orange" => (255, 165, 0),
        _ => return None,
    };
    Some(Rgb::new(r, g, b))
}

/// Parse any CSS color value.
///
/// `transparent`, fully transparent `rgba()` and unrecognized values yield
/// `None`, meaning the color cannot be determined.
pub fn parse_color(value: &str) -> Option<Rgb> {
    let trimmed = value.trim().trim_end_matches("!important").trim().to_lowercase();
    if trimmed.is_empty() || trimmed == "transparent" || trimmed == "inherit" || trimmed == "initial" {
        return None;
    }
    if trimmed.starts_with('#') {
        parse_hex_color(&trimmed)
    } else if trimmed.starts_with("rgb") {
        parse_rgb_color(&trimmed)
    } else {
        parse_named_color(&trimmed)
    }
}

/// Gamma-correct one sRGB channel normalized to [0, 1]
fn linearize(channel: f64) -> f64 {
    if channel <= 0.03928 {
        channel / 12.92
    } else {
        ((channel + 0.055) / 1.055).powf(2.4)
    }
}

/// Calculate relative luminance per WCAG 2.x
/// <https://www.w3.org/TR/WCAG21/#dfn-relative-luminance>
pub fn relative_luminance(r: u8, g: u8, b: u8) -> f64 {
    let [r, g, b] = [r, g, b].map(|c| linearize(c as f64 / 255.0));
    0.2126 * r + 0.7152 * g + 0.0722 * b
}

/// Calculate contrast ratio between two colors.
/// Returns a ratio in [1.0, 21.0].
pub fn contrast_ratio(fg: Rgb, bg: Rgb) -> f64 {
    let l1 = fg.luminance();
    let l2 = bg.luminance();
    let (lighter, darker) = if l1 > l2 { (l1, l2) } else { (l2, l1) };
    (lighter + 0.05) / (darker + 0.05)
}

/// Whether text counts as "large" for contrast purposes
pub fn is_large_text(font_size_px: f64, font_weight: u16) -> bool {
    font_size_px >= 18.0 || (font_size_px >= 14.0 && font_weight >= 700)
}

/// Minimum contrast for text of the given size and weight
pub fn required_ratio(font_size_px: f64, font_weight: u16) -> f64 {
    if is_large_text(font_size_px, font_weight) {
        LARGE_TEXT_RATIO
    } else {
        NORMAL_TEXT_RATIO
    }
}

/// Parse a CSS font-weight into its numeric value
pub fn parse_font_weight(value: &str) -> u16 {
    match value.trim().to_lowercase().as_str() {
        "bold" | "bolder" => 700,
        "lighter" => 300,
        "normal" | "" => 400,
        other => other.parse::<f64>().map(|w| w.clamp(1.0, 1000.0) as u16).unwrap_or(400),
    }
}

/// Result of checking one foreground/background pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContrastEvaluation {
    pub ratio: f64,
    pub required: f64,
    pub large_text: bool,
    pub passes: bool,
}

/// Evaluate a text color pair against the WCAG AA threshold
pub fn evaluate_contrast(fg: Rgb, bg: Rgb, font_size_px: f64, font_weight: u16) -> ContrastEvaluation {
    let ratio = contrast_ratio(fg, bg);
    let large_text = is_large_text(font_size_px, font_weight);
    let required = required_ratio(font_size_px, font_weight);
    ContrastEvaluation {
        ratio,
        required,
        large_text,
        passes: ratio >= required,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#fff"), Some(Rgb::WHITE));
        assert_eq!(parse_hex_color("#000"), Some(Rgb::BLACK));
        assert_eq!(parse_hex_color("#ff0000"), Some(Rgb::new(255, 0, 0)));
        assert_eq!(parse_hex_color("#zzzzzz"), None);
        assert_eq!(parse_hex_color("#abcd"), None);
    }

    #[test]
    fn test_parse_rgb_color() {
        assert_eq!(parse_rgb_color("rgb(255, 0, 0)"), Some(Rgb::new(255, 0, 0)));
        assert_eq!(parse_rgb_color("rgba(0, 128, 0, 0.5)"), Some(Rgb::new(0, 128, 0)));
        assert_eq!(parse_rgb_color("rgb(10 20 30)"), Some(Rgb::new(10, 20, 30)));
    }

    #[test]
    fn test_transparent_is_undetermined() {
        assert_eq!(parse_color("transparent"), None);
        assert_eq!(parse_color("rgba(0, 0, 0, 0)"), None);
        assert_eq!(parse_color("rgba(0,0,0,0)"), None);
        assert_eq!(parse_color("currentColor"), None);
    }

    #[test]
    fn test_parse_color_dispatch() {
        assert_eq!(parse_color("  #FFF "), Some(Rgb::WHITE));
        assert_eq!(parse_color("Navy"), Some(Rgb::new(0, 0, 128)));
        assert_eq!(parse_color("#333 !important"), Some(Rgb::new(0x33, 0x33, 0x33)));
    }

    #[test]
    fn test_contrast_ratio_black_white() {
        let ratio = contrast_ratio(Rgb::BLACK, Rgb::WHITE);
        assert!((ratio - 21.0).abs() < 1e-9, "Black on white should be 21:1, got {:.4}", ratio);
    }

    #[test]
    fn test_contrast_ratio_same_color() {
        for c in [Rgb::BLACK, Rgb::WHITE, Rgb::new(128, 64, 200), Rgb::new(3, 250, 17)] {
            let ratio = contrast_ratio(c, c);
            assert!((ratio - 1.0).abs() < 1e-12, "Same color should be 1:1, got {:.4}", ratio);
        }
    }

    #[test]
    fn test_contrast_ratio_bounds_and_order() {
        let samples = [0u8, 17, 64, 119, 128, 200, 255];
        for &a in &samples {
            for &b in &samples {
                let fg = Rgb::new(a, b, a);
                let bg = Rgb::new(b, a, b);
                let ratio = contrast_ratio(fg, bg);
                assert!((1.0..=21.0).contains(&ratio));
                assert!((ratio - contrast_ratio(bg, fg)).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_relative_luminance() {
        assert!((relative_luminance(255, 255, 255) - 1.0).abs() < 1e-9);
        assert!(relative_luminance(0, 0, 0).abs() < 1e-12);
        // channel value 10/255 sits below the 0.03928 knee
        let l = relative_luminance(10, 10, 10);
        assert!((l - (10.0 / 255.0) / 12.92).abs() < 1e-12);
    }

    #[test]
    fn test_large_text_thresholds() {
        assert_eq!(required_ratio(18.0, 400), LARGE_TEXT_RATIO);
        assert_eq!(required_ratio(14.0, 700), LARGE_TEXT_RATIO);
        assert_eq!(required_ratio(14.0, 600), NORMAL_TEXT_RATIO);
        assert_eq!(required_ratio(16.0, 400), NORMAL_TEXT_RATIO);
    }

    #[test]
    fn test_evaluate_contrast_gray_on_white() {
        // #777777 on white is just under 4.5:1
        let eval = evaluate_contrast(Rgb::new(0x77, 0x77, 0x77), Rgb::WHITE, 16.0, 400);
        assert!(!eval.passes);
        assert!(eval.ratio > 4.0 && eval.ratio < 4.5);
        let large = evaluate_contrast(Rgb::new(0x77, 0x77, 0x77), Rgb::WHITE, 24.0, 400);
        assert!(large.passes);
    }

    #[test]
    fn test_parse_font_weight() {
        assert_eq!(parse_font_weight("bold"), 700);
        assert_eq!(parse_font_weight("600"), 600);
        assert_eq!(parse_font_weight("normal"), 400);
        assert_eq!(parse_font_weight("weird"), 400);
    }
}
