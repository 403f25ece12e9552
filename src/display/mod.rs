pub mod chart;
pub mod text;

use crate::config::{DisplayConfig, FrameMode};
use crate::models::{DisplayFrame, ElectionResult, PartyResult, TextFragment};
use chrono::{Local, TimeZone};

pub const WHITE: &str = "FFFFFF";
pub const NO_DATA_COLOR: &str = "FF0000";

/// Pixel layout of the 8x32 matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geometry {
    pub width: u32,
    pub height: u32,
    /// Left part of the matrix used by the bar chart
    pub chart_width: u32,
    /// Horizontal advance of one glyph, spacing included
    pub glyph_width: u32,
    /// Where the scrolling summary text starts
    pub text_offset: u32,
    /// Upper bound for text that scrolls across the matrix
    pub max_scroll_glyphs: usize,
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            width: 32,
            height: 8,
            chart_width: 20,
            glyph_width: 4,
            text_offset: 8,
            max_scroll_glyphs: 64,
        }
    }
}

impl Geometry {
    /// Glyphs that fit without scrolling.
    pub fn static_glyphs(&self) -> usize {
        (self.width / self.glyph_width.max(1)) as usize
    }
}

/// Turns election results into display frames.
#[derive(Debug, Clone)]
pub struct Formatter<Tz: TimeZone = Local> {
    geometry: Geometry,
    settings: DisplayConfig,
    tz: Tz,
}

impl Formatter<Local> {
    pub fn new(settings: DisplayConfig) -> Self {
        Self::with_timezone(settings, Geometry::default(), Local)
    }
}

impl<Tz: TimeZone> Formatter<Tz>
where
    Tz::Offset: std::fmt::Display,
{
    pub fn with_timezone(settings: DisplayConfig, geometry: Geometry, tz: Tz) -> Self {
        Self {
            geometry,
            settings,
            tz,
        }
    }

    pub fn format(&self, result: &ElectionResult) -> Vec<DisplayFrame> {
        let ranked = result.ranked_parties();
        if ranked.is_empty() {
            return vec![no_data_frame()];
        }

        match self.settings.mode {
            FrameMode::Summary => vec![self.summary_frame(result, &ranked)],
            FrameMode::Parties => ranked
                .iter()
                .take(self.settings.max_parties.max(1))
                .map(|party| self.party_frame(party))
                .collect(),
        }
    }

    fn summary_frame(&self, result: &ElectionResult, ranked: &[&PartyResult]) -> DisplayFrame {
        let clock = result
            .timestamp
            .with_timezone(&self.tz)
            .format("%H:%M")
            .to_string();

        let mut fragments = vec![TextFragment::new(format!("{} ", clock), WHITE)];
        fragments.extend(
            ranked
                .iter()
                .map(|party| TextFragment::new(format!("{} ", party.name), &party.color)),
        );

        DisplayFrame {
            text: text::fit_fragments(fragments, self.geometry.max_scroll_glyphs),
            draw: chart::bar_chart(ranked, self.settings.threshold, &self.geometry),
            duration: Some(self.settings.frame_duration),
            icon: None,
            text_offset: Some(self.geometry.text_offset),
        }
    }

    fn party_frame(&self, party: &PartyResult) -> DisplayFrame {
        DisplayFrame {
            text: text::party_line(party, self.geometry.static_glyphs()),
            draw: Vec::new(),
            duration: Some(self.settings.frame_duration),
            icon: None,
            text_offset: None,
        }
    }
}

/// Shown when the provider has nothing to report yet.
pub fn no_data_frame() -> DisplayFrame {
    DisplayFrame {
        text: vec![TextFragment::new("No data", NO_DATA_COLOR)],
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, FixedOffset, Utc};

    fn settings(mode: FrameMode) -> DisplayConfig {
        DisplayConfig {
            mode,
            threshold: 5.0,
            max_parties: 6,
            frame_duration: 10,
        }
    }

    fn formatter(mode: FrameMode) -> Formatter<Utc> {
        Formatter::with_timezone(settings(mode), Geometry::default(), Utc)
    }

    fn election(parties: Vec<PartyResult>) -> ElectionResult {
        ElectionResult {
            election_id: "btw25".to_string(),
            stage: "live".to_string(),
            timestamp: DateTime::<FixedOffset>::parse_from_rfc3339("2025-02-23T18:07:00+01:00")
                .unwrap(),
            parties,
        }
    }

    fn sample() -> ElectionResult {
        election(vec![
            PartyResult::new("B", 30.1, Some(80), "E3000F"),
            PartyResult::new("A", 45.2, Some(120), "000000"),
        ])
    }

    fn many_parties(n: usize) -> ElectionResult {
        election(
            (0..n)
                .map(|i| {
                    PartyResult::new(
                        format!("PARTY{}", i),
                        (i as f64 * 7.3) % 41.0,
                        Some(i as u32 * 11),
                        "00FF00",
                    )
                })
                .collect(),
        )
    }

    #[test]
    fn party_frames_follow_vote_share() {
        let frames = formatter(FrameMode::Parties).format(&sample());
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].plain_text(), "A45% 120");
        assert_eq!(frames[1].plain_text(), "B 30% 80");
        assert_eq!(frames[0].text[0], TextFragment::new("A", "000000"));
        assert_eq!(frames[0].text[1], TextFragment::new("45% 120", WHITE));
        assert_eq!(frames[0].duration, Some(10));
        assert!(frames.iter().all(|f| f.glyphs() <= 8));
    }

    #[test]
    fn party_frames_are_capped_and_sorted() {
        let result = many_parties(12);
        let frames = formatter(FrameMode::Parties).format(&result);
        assert_eq!(frames.len(), 6);

        let shares: Vec<f64> = result.ranked_parties().iter().map(|p| p.percentage).collect();
        assert!(shares.windows(2).all(|w| w[0] >= w[1]));
        for (frame, party) in frames.iter().zip(result.ranked_parties()) {
            assert!(frame.plain_text().contains(&format!("{}%", text::rounded_percent(party.percentage))));
        }
    }

    #[test]
    fn summary_frame_matches_original_packet() {
        let frames = formatter(FrameMode::Summary).format(&sample());
        assert_eq!(frames.len(), 1);
        let frame = &frames[0];

        assert_eq!(frame.text_offset, Some(8));
        assert_eq!(frame.plain_text(), "17:07 A B ");
        assert_eq!(frame.text[1].color, "000000");
        assert_eq!(frame.text[2].color, "E3000F");
        // background, then bar and indicator per party
        assert_eq!(frame.draw.len(), 5);
    }

    #[test]
    fn frames_stay_inside_the_matrix() {
        let geometry = Geometry::default();
        for n in [1, 3, 8, 9, 20] {
            for mode in [FrameMode::Summary, FrameMode::Parties] {
                for frame in formatter(mode).format(&many_parties(n)) {
                    for rect in &frame.draw {
                        assert!(rect.x() + rect.width() <= geometry.width);
                        assert!(rect.y() + rect.height() <= geometry.height);
                    }
                    let budget = match mode {
                        FrameMode::Summary => geometry.max_scroll_glyphs,
                        FrameMode::Parties => geometry.static_glyphs(),
                    };
                    assert!(frame.glyphs() <= budget, "{:?}", frame);
                }
            }
        }
    }

    #[test]
    fn formatting_is_deterministic() {
        let result = many_parties(7);
        for mode in [FrameMode::Summary, FrameMode::Parties] {
            let f = formatter(mode);
            assert_eq!(f.format(&result), f.format(&result));
        }
    }

    #[test]
    fn empty_result_shows_no_data() {
        let frames = formatter(FrameMode::Summary).format(&election(Vec::new()));
        assert_eq!(frames, vec![no_data_frame()]);
        assert_eq!(
            serde_json::to_value(&frames[0]).unwrap(),
            serde_json::json!({"text": [{"t": "No data", "c": "FF0000"}]})
        );
    }
}
