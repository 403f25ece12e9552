use super::WHITE;
use crate::models::{PartyResult, TextFragment};

/// Whole-number share, rounded half away from zero.
pub fn rounded_percent(percentage: f64) -> i64 {
    if percentage.is_finite() {
        percentage.round() as i64
    } else {
        0
    }
}

fn truncate(s: &str, glyphs: usize) -> String {
    s.chars().take(glyphs).collect()
}

/// `NAME PCT% SEATS` squeezed into `budget` glyphs.
///
/// The name gives way first. When not even one name glyph fits, the space
/// after the name goes (name and numbers differ in color), then the seats,
/// and a bare percentage is the last resort.
pub fn party_line(party: &PartyResult, budget: usize) -> Vec<TextFragment> {
    let name = party.name.trim();
    let share = format!("{}%", rounded_percent(party.percentage));

    let mut tails = Vec::with_capacity(3);
    if let Some(seats) = party.seats {
        tails.push(format!(" {} {}", share, seats));
        tails.push(format!("{} {}", share, seats));
    }
    tails.push(format!(" {}", share));

    for tail in &tails {
        if name.is_empty() {
            let bare = tail.trim_start();
            if bare.chars().count() <= budget {
                return vec![TextFragment::new(bare, WHITE)];
            }
            continue;
        }
        let tail_glyphs = tail.chars().count();
        if tail_glyphs < budget {
            return vec![
                TextFragment::new(truncate(name, budget - tail_glyphs), &party.color),
                TextFragment::new(tail.as_str(), WHITE),
            ];
        }
    }

    vec![TextFragment::new(truncate(&share, budget), WHITE)]
}

/// Keeps leading fragments while they fit `budget` glyphs.
///
/// Fragments are dropped whole; only a lone first fragment is cut.
pub fn fit_fragments(fragments: Vec<TextFragment>, budget: usize) -> Vec<TextFragment> {
    let mut used = 0;
    let mut kept = Vec::with_capacity(fragments.len());
    for fragment in fragments {
        let glyphs = fragment.glyphs();
        if used + glyphs <= budget {
            used += glyphs;
            kept.push(fragment);
        } else {
            if kept.is_empty() {
                kept.push(TextFragment::new(truncate(&fragment.text, budget), &fragment.color));
            }
            break;
        }
    }
    kept
}
