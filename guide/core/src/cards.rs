//! Dream Card View Models
//!
//! Turns backend dream records into surface-agnostic card view models:
//! expansion state keyed by record id, symbol bars sorted by score, and the
//! formatted metric strings a renderer draws verbatim. Keeping this out of
//! the surface means the sort/clamp/fallback rules are testable without a
//! terminal.

use std::collections::HashMap;

use crate::dream::{
    capitalize, date_label, fmt_score, DreamRecord, TraumaLevel, PLACEHOLDER,
};
use crate::interpretation::{parse_blocks, InterpretationBlock};

/// Key identifying a card: the record id, or the position for records
/// without one
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CardKey {
    /// Backend record id
    Id(i64),
    /// Positional fallback
    Index(usize),
}

impl CardKey {
    /// Key for a record at a given list position
    #[must_use]
    pub fn for_record(record: &DreamRecord, index: usize) -> Self {
        match record.id {
            Some(id) => Self::Id(id),
            None => Self::Index(index),
        }
    }
}

/// Per-card expansion state
///
/// Each card's expanded flag is independent; toggling one never affects
/// another.
#[derive(Clone, Debug, Default)]
pub struct CardList {
    expanded: HashMap<CardKey, bool>,
}

impl CardList {
    /// Create with all cards collapsed
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle a card's expansion
    pub fn toggle(&mut self, key: CardKey) {
        let entry = self.expanded.entry(key).or_insert(false);
        *entry = !*entry;
    }

    /// Whether a card is expanded
    #[must_use]
    pub fn is_expanded(&self, key: CardKey) -> bool {
        self.expanded.get(&key).copied().unwrap_or(false)
    }
}

/// One symbol row: name, raw score, and bar width percent
#[derive(Clone, Debug, PartialEq)]
pub struct SymbolBar {
    /// Symbol name
    pub name: String,
    /// Formatted score (3 decimals)
    pub score_label: String,
    /// Bar width in percent, clamped to `[0, 100]`
    pub width_pct: f64,
}

/// Build symbol bars sorted by descending score
///
/// Ties break by name so rendering is deterministic. Bar width is
/// `min(score * 100, 100)`, clamped below at 0 for malformed scores.
#[must_use]
pub fn symbol_bars(symbols: &HashMap<String, f64>) -> Vec<SymbolBar> {
    let mut entries: Vec<(&str, f64)> = symbols
        .iter()
        .map(|(name, score)| (name.as_str(), *score))
        .collect();
    entries.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(b.0))
    });

    entries
        .into_iter()
        .map(|(name, score)| SymbolBar {
            name: name.to_string(),
            score_label: fmt_score(Some(score)),
            width_pct: (score * 100.0).clamp(0.0, 100.0),
        })
        .collect()
}

/// A fully formatted dream card, ready to draw
#[derive(Clone, Debug)]
pub struct DreamCard {
    /// Expansion key
    pub key: CardKey,
    /// Header title, numbered newest-first ("Dream #3")
    pub heading: String,
    /// Record title, placeholder when absent
    pub title: String,
    /// Formatted record date
    pub date: String,
    /// Capitalized mood badge ("unknown" records show the placeholder)
    pub mood_badge: String,
    /// Overall confidence, 3 decimals or placeholder
    pub overall_confidence: String,
    /// Symbol confidence, 3 decimals or placeholder
    pub symbol_confidence: String,
    /// Trauma score, 3 decimals or placeholder
    pub trauma_score: String,
    /// Trauma badge, when the record has a score
    pub trauma_level: Option<TraumaLevel>,
    /// Capitalized trajectory labels, in narrative order
    pub trajectory: Vec<String>,
    /// Shift intensity, 3 decimals or placeholder
    pub shift_intensity: String,
    /// Arc description, when present
    pub arc_description: Option<String>,
    /// Dream narrative text
    pub content: String,
    /// Parsed interpretation blocks
    pub interpretation: Vec<InterpretationBlock>,
    /// Footer line ("Analysis vX")
    pub footer: String,
    /// Symbol rows, sorted by descending score
    pub symbols: Vec<SymbolBar>,
}

/// Build cards for an ordered record list (newest first)
#[must_use]
pub fn build_cards(dreams: &[DreamRecord]) -> Vec<DreamCard> {
    let total = dreams.len();
    dreams
        .iter()
        .enumerate()
        .map(|(i, record)| build_card(record, i, total))
        .collect()
}

fn build_card(record: &DreamRecord, index: usize, total: usize) -> DreamCard {
    let arc = record.emotional_arc.as_ref();
    let confidence = record.confidence.as_ref();

    DreamCard {
        key: CardKey::for_record(record, index),
        heading: format!("Dream #{}", total - index),
        title: record
            .title
            .clone()
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| PLACEHOLDER.to_string()),
        date: date_label(record.date.as_deref()),
        mood_badge: capitalize(record.mood.as_deref()),
        overall_confidence: fmt_score(confidence.and_then(|c| c.overall)),
        symbol_confidence: fmt_score(confidence.and_then(|c| c.symbol)),
        trauma_score: fmt_score(record.trauma_score),
        trauma_level: record.trauma_level(),
        trajectory: arc
            .map(|a| {
                a.trajectory
                    .iter()
                    .map(|label| capitalize(Some(label)))
                    .collect()
            })
            .unwrap_or_default(),
        shift_intensity: fmt_score(arc.and_then(|a| a.shift_intensity)),
        arc_description: arc.and_then(|a| a.description.clone()),
        content: record.content.clone().unwrap_or_default(),
        interpretation: record
            .interpretation
            .as_deref()
            .map(parse_blocks)
            .unwrap_or_default(),
        footer: format!(
            "Analysis v{}",
            record.analysis_version.as_deref().unwrap_or(PLACEHOLDER)
        ),
        symbols: symbol_bars(&record.symbols),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn symbols(entries: &[(&str, f64)]) -> HashMap<String, f64> {
        entries
            .iter()
            .map(|(name, score)| (name.to_string(), *score))
            .collect()
    }

    #[test]
    fn test_symbols_sorted_descending() {
        let bars = symbol_bars(&symbols(&[("a", 0.2), ("b", 0.9), ("c", 0.5)]));
        let names: Vec<_> = bars.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["b", "c", "a"]);
    }

    #[test]
    fn test_bar_width_clamped() {
        let bars = symbol_bars(&symbols(&[("flood", 1.7), ("void", -0.2), ("door", 0.4)]));
        let widths: Vec<_> = bars.iter().map(|b| (b.name.as_str(), b.width_pct)).collect();
        assert_eq!(widths, vec![("flood", 100.0), ("door", 40.0), ("void", 0.0)]);
    }

    #[test]
    fn test_expansion_is_per_card() {
        let mut list = CardList::new();
        list.toggle(CardKey::Id(1));
        assert!(list.is_expanded(CardKey::Id(1)));
        assert!(!list.is_expanded(CardKey::Id(2)));

        list.toggle(CardKey::Id(1));
        assert!(!list.is_expanded(CardKey::Id(1)));
    }

    #[test]
    fn test_key_falls_back_to_index() {
        let with_id = DreamRecord {
            id: Some(9),
            ..Default::default()
        };
        let without_id = DreamRecord::default();
        assert_eq!(CardKey::for_record(&with_id, 4), CardKey::Id(9));
        assert_eq!(CardKey::for_record(&without_id, 4), CardKey::Index(4));
    }

    #[test]
    fn test_cards_numbered_newest_first() {
        let dreams = vec![
            DreamRecord {
                id: Some(10),
                ..Default::default()
            },
            DreamRecord {
                id: Some(9),
                ..Default::default()
            },
            DreamRecord {
                id: Some(8),
                ..Default::default()
            },
        ];
        let cards = build_cards(&dreams);
        let headings: Vec<_> = cards.iter().map(|c| c.heading.as_str()).collect();
        assert_eq!(headings, vec!["Dream #3", "Dream #2", "Dream #1"]);
    }

    #[test]
    fn test_missing_fields_render_placeholders() {
        let cards = build_cards(&[DreamRecord::default()]);
        let card = &cards[0];
        assert_eq!(card.mood_badge, PLACEHOLDER);
        assert_eq!(card.overall_confidence, PLACEHOLDER);
        assert_eq!(card.trauma_score, PLACEHOLDER);
        assert!(card.trauma_level.is_none());
        assert_eq!(card.footer, format!("Analysis v{PLACEHOLDER}"));
        assert!(card.interpretation.is_empty());
    }

    #[test]
    fn test_trajectory_capitalized() {
        let record = DreamRecord {
            emotional_arc: Some(crate::dream::EmotionalArc {
                trajectory: vec!["calm".to_string(), "fear".to_string(), "relief".to_string()],
                shift_intensity: Some(0.42),
                description: Some("builds then settles".to_string()),
            }),
            ..Default::default()
        };
        let cards = build_cards(&[record]);
        assert_eq!(cards[0].trajectory, vec!["Calm", "Fear", "Relief"]);
        assert_eq!(cards[0].shift_intensity, "0.420");
    }
}
