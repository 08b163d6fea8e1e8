//! Utility functions for static export: colors, locale mapping, tick formatting.

use anyhow::{Result, anyhow};
use num_format::{Locale, ToFormattedString};
use plotters::prelude::*;

use super::text::estimate_text_width_px;

/// Resolve a `#rrggbb` hex string or one of the few named colors the charts use.
pub fn parse_color(s: &str) -> Result<RGBColor> {
    match s.to_ascii_lowercase().as_str() {
        "black" => return Ok(BLACK),
        "white" => return Ok(WHITE),
        "red" => return Ok(RGBColor(255, 0, 0)),
        _ => {}
    }
    let hex = s
        .strip_prefix('#')
        .filter(|h| h.len() == 6)
        .ok_or_else(|| anyhow!("unsupported color `{s}`"))?;
    let channel = |i: usize| {
        u8::from_str_radix(&hex[i..i + 2], 16).map_err(|e| anyhow!("bad color `{s}`: {e}"))
    };
    Ok(RGBColor(channel(0)?, channel(2)?, channel(4)?))
}

/// Map a user-provided locale tag to a `num_format::Locale`.
///
/// Supported tags (case-insensitive): `en`, `us`, `en_US`, `de`, `de_DE`, `german`,
/// `fr`, `es`, `it`, `pt`, `nl`. Defaults to English.
pub fn map_locale(tag: &str) -> &'static Locale {
    match tag.to_lowercase().as_str() {
        "de" | "de_de" | "german" => &Locale::de,
        "fr" | "fr_fr" => &Locale::fr,
        "es" | "es_es" => &Locale::es,
        "it" | "it_it" => &Locale::it,
        "pt" | "pt_pt" | "pt_br" => &Locale::pt,
        "nl" | "nl_nl" => &Locale::nl,
        _ => &Locale::en, // default
    }
}

/// Tick label: whole numbers of 1000 and above get thousands separators,
/// smaller magnitudes get fewer decimals the larger they are.
pub fn format_tick(v: f64, locale: &Locale) -> String {
    let a = v.abs();
    if a >= 1000.0 && (v - v.round()).abs() < 1e-9 {
        return (v.round() as i64).to_formatted_string(locale);
    }
    let prec = if a >= 100.0 {
        0
    } else if a >= 10.0 {
        1
    } else {
        2
    };
    format!("{:.*}", prec, v)
}

/// Tight left label area width (pixels) for Y tick labels sampled across the range.
pub fn compute_left_label_area_px(
    ymin: f64,
    ymax: f64,
    ticks: usize,
    font_px: u32,
    locale: &Locale,
) -> u32 {
    let mut max_px = 0u32;
    for i in 0..=ticks {
        let t = if ticks == 0 {
            0.0
        } else {
            i as f64 / ticks as f64
        };
        let v = ymin + (ymax - ymin) * t;
        max_px = max_px.max(estimate_text_width_px(&format_tick(v, locale), font_px));
    }
    max_px.saturating_add(18).clamp(48, 140)
}

/// Pad a data extent so marks do not touch the frame; a flat extent is widened by one.
pub fn padded(lo: f64, hi: f64, frac: f64) -> (f64, f64) {
    if (hi - lo).abs() < f64::EPSILON {
        return (lo - 1.0, hi + 1.0);
    }
    let pad = (hi - lo) * frac;
    (lo - pad, hi + pad)
}

/// Pixel size such as `"8pt"` or `"10pt"` -> 8 / 10; unknown sizes fall back to `default`.
pub fn font_px(size: Option<&str>, default: u32) -> u32 {
    size.and_then(|s| s.trim_end_matches("pt").trim_end_matches("px").parse::<f64>().ok())
        .map(|pt| pt.round() as u32)
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_and_named_colors() {
        assert_eq!(parse_color("#3182bd").unwrap(), RGBColor(0x31, 0x82, 0xbd));
        assert_eq!(parse_color("white").unwrap(), WHITE);
        assert!(parse_color("#12").is_err());
        assert!(parse_color("teal").is_err());
    }

    #[test]
    fn ticks_use_locale_separators() {
        assert_eq!(format_tick(30000.0, map_locale("en")), "30,000");
        assert_eq!(format_tick(30000.0, map_locale("de")), "30.000");
        assert_eq!(format_tick(12.34, map_locale("en")), "12.3");
        assert_eq!(format_tick(0.5, map_locale("en")), "0.50");
    }

    #[test]
    fn font_sizes_parse() {
        assert_eq!(font_px(Some("8pt"), 12), 8);
        assert_eq!(font_px(Some("0pt"), 12), 0);
        assert_eq!(font_px(None, 12), 12);
    }
}
