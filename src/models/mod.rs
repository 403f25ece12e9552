pub mod api;

use chrono::{DateTime, FixedOffset};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

pub const FALLBACK_COLOR: &str = "FFFFFF";

lazy_static! {
    static ref HEX_COLOR: Regex = Regex::new(r"^[0-9A-Fa-f]{6}$").unwrap();
}

/// Snapshot of one election at the provider's latest status.
#[derive(Debug, Clone, PartialEq)]
pub struct ElectionResult {
    pub election_id: String,
    pub stage: String,
    pub timestamp: DateTime<FixedOffset>,
    pub parties: Vec<PartyResult>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PartyResult {
    pub name: String,
    pub percentage: f64,
    pub seats: Option<u32>,
    pub color: String,
}

impl PartyResult {
    pub fn new(name: impl Into<String>, percentage: f64, seats: Option<u32>, color: &str) -> Self {
        Self {
            name: name.into(),
            percentage,
            seats,
            color: normalize_color(color),
        }
    }
}

impl ElectionResult {
    /// Parties ordered by descending vote share. Ties keep provider order, NaN goes last.
    pub fn ranked_parties(&self) -> Vec<&PartyResult> {
        let mut ranked: Vec<&PartyResult> = self.parties.iter().collect();
        ranked.sort_by(|a, b| match (a.percentage.is_nan(), b.percentage.is_nan()) {
            (true, true) => std::cmp::Ordering::Equal,
            (true, false) => std::cmp::Ordering::Greater,
            (false, true) => std::cmp::Ordering::Less,
            (false, false) => b
                .percentage
                .partial_cmp(&a.percentage)
                .unwrap_or(std::cmp::Ordering::Equal),
        });
        ranked
    }
}

// Strips a leading '#' and upper-cases; anything that is not six hex digits becomes white
pub fn normalize_color(raw: &str) -> String {
    let trimmed = raw.trim().trim_start_matches('#');
    if HEX_COLOR.is_match(trimmed) {
        trimmed.to_ascii_uppercase()
    } else {
        FALLBACK_COLOR.to_string()
    }
}

/// One colored run of text on the display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextFragment {
    #[serde(rename = "t")]
    pub text: String,
    #[serde(rename = "c")]
    pub color: String,
}

impl TextFragment {
    pub fn new(text: impl Into<String>, color: &str) -> Self {
        Self {
            text: text.into(),
            color: color.to_string(),
        }
    }

    pub fn glyphs(&self) -> usize {
        self.text.chars().count()
    }
}

/// Filled rectangle, serialized as `{"df": [x, y, w, h, color]}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrawRect {
    #[serde(rename = "df")]
    pub rect: (u32, u32, u32, u32, String),
}

impl DrawRect {
    pub fn new(x: u32, y: u32, width: u32, height: u32, color: &str) -> Self {
        Self {
            rect: (x, y, width, height, color.to_string()),
        }
    }

    pub fn x(&self) -> u32 {
        self.rect.0
    }

    pub fn y(&self) -> u32 {
        self.rect.1
    }

    pub fn width(&self) -> u32 {
        self.rect.2
    }

    pub fn height(&self) -> u32 {
        self.rect.3
    }
}

/// One page of content for the pixel display, in the firmware's custom-app schema.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct DisplayFrame {
    pub text: Vec<TextFragment>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub draw: Vec<DrawRect>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(rename = "textOffset", skip_serializing_if = "Option::is_none")]
    pub text_offset: Option<u32>,
}

impl DisplayFrame {
    pub fn plain_text(&self) -> String {
        self.text.iter().map(|f| f.text.as_str()).collect()
    }

    pub fn glyphs(&self) -> usize {
        self.text.iter().map(TextFragment::glyphs).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_colors() {
        assert_eq!(normalize_color("#e3000f"), "E3000F");
        assert_eq!(normalize_color("009EE0"), "009EE0");
        assert_eq!(normalize_color(""), FALLBACK_COLOR);
        assert_eq!(normalize_color("blue"), FALLBACK_COLOR);
    }

    #[test]
    fn ranks_by_share_with_nan_last() {
        let result = ElectionResult {
            election_id: "e".to_string(),
            stage: "live".to_string(),
            timestamp: DateTime::parse_from_rfc3339("2025-02-23T18:00:00+01:00").unwrap(),
            parties: vec![
                PartyResult::new("B", 12.0, None, "000000"),
                PartyResult::new("X", f64::NAN, None, "000000"),
                PartyResult::new("A", 30.0, None, "000000"),
                PartyResult::new("C", 12.0, None, "000000"),
            ],
        };
        let names: Vec<&str> = result.ranked_parties().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C", "X"]);
    }

    #[test]
    fn frame_serializes_to_custom_app_schema() {
        let frame = DisplayFrame {
            text: vec![TextFragment::new("18:00 ", "FFFFFF")],
            draw: vec![DrawRect::new(0, 0, 20, 8, "000000")],
            duration: None,
            icon: None,
            text_offset: Some(8),
        };
        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "text": [{"t": "18:00 ", "c": "FFFFFF"}],
                "draw": [{"df": [0, 0, 20, 8, "000000"]}],
                "textOffset": 8
            })
        );
    }
}
