//! Analyzed Dream Records
//!
//! Backend-shaped dream records and the display helpers the card renderer
//! uses. Records are read-only to this layer; every analysis field is
//! optional and missing values render as an em-dash placeholder.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Placeholder shown for missing or non-numeric values
pub const PLACEHOLDER: &str = "\u{2014}";

/// Trauma score at or above which the signal is considered elevated
pub const TRAUMA_ELEVATED_THRESHOLD: f64 = 15.0;

/// Emotional arc of a dream narrative
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EmotionalArc {
    /// Ordered emotion labels showing how mood evolves through the dream
    pub trajectory: Vec<String>,
    /// Magnitude of the mood shift
    pub shift_intensity: Option<f64>,
    /// Free-form description of the arc
    pub description: Option<String>,
}

/// Analysis confidence, both components in `[0, 1]`
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Confidence {
    /// Confidence in the overall analysis
    pub overall: Option<f64>,
    /// Confidence in the symbol extraction
    pub symbol: Option<f64>,
}

/// An analyzed dream as returned by the backend
///
/// Deserialization is lenient: unknown fields are ignored and absent fields
/// default, so older analysis versions still render.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DreamRecord {
    /// Backend record id
    pub id: Option<i64>,
    /// Dream title
    pub title: Option<String>,
    /// Dream narrative text
    pub content: Option<String>,
    /// ISO-8601 date the dream was recorded
    pub date: Option<String>,
    /// Dominant emotion label
    pub mood: Option<String>,
    /// Detected symbols and their scores (unordered)
    pub symbols: HashMap<String, f64>,
    /// Emotional arc
    pub emotional_arc: Option<EmotionalArc>,
    /// Analysis confidence
    pub confidence: Option<Confidence>,
    /// Trauma signal score
    pub trauma_score: Option<f64>,
    /// Free-form interpretation text
    pub interpretation: Option<String>,
    /// Analyzer version that produced this record
    pub analysis_version: Option<String>,
}

impl DreamRecord {
    /// Trauma level for this record, if it has a score
    pub fn trauma_level(&self) -> Option<TraumaLevel> {
        self.trauma_score.map(trauma_level)
    }
}

/// Trauma signal classification
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TraumaLevel {
    /// Below the elevated threshold
    Low,
    /// At or above the threshold (boundary inclusive)
    Elevated,
}

impl TraumaLevel {
    /// Badge label
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Elevated => "Elevated",
        }
    }
}

/// Classify a trauma score
#[must_use]
pub fn trauma_level(score: f64) -> TraumaLevel {
    if score >= TRAUMA_ELEVATED_THRESHOLD {
        TraumaLevel::Elevated
    } else {
        TraumaLevel::Low
    }
}

/// Format a score to 3 decimal places, or the placeholder when absent
#[must_use]
pub fn fmt_score(value: Option<f64>) -> String {
    match value {
        Some(n) if n.is_finite() => format!("{n:.3}"),
        _ => PLACEHOLDER.to_string(),
    }
}

/// Capitalize a label (first character uppercased), placeholder when absent
/// or empty
#[must_use]
pub fn capitalize(label: Option<&str>) -> String {
    match label {
        Some(s) if !s.is_empty() => {
            let mut chars = s.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => PLACEHOLDER.to_string(),
            }
        }
        _ => PLACEHOLDER.to_string(),
    }
}

/// Human-readable date label for a record date
///
/// Parses RFC 3339 or plain `YYYY-MM-DD`; falls back to the raw string, or
/// the placeholder when absent.
#[must_use]
pub fn date_label(date: Option<&str>) -> String {
    let Some(raw) = date else {
        return PLACEHOLDER.to_string();
    };

    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(raw) {
        return dt.format("%b %-d, %Y").to_string();
    }
    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return dt.format("%b %-d, %Y").to_string();
    }
    if let Ok(d) = chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return d.format("%b %-d, %Y").to_string();
    }
    raw.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_trauma_boundary_inclusive() {
        assert_eq!(trauma_level(14.0), TraumaLevel::Low);
        assert_eq!(trauma_level(15.0), TraumaLevel::Elevated);
        assert_eq!(trauma_level(14.999), TraumaLevel::Low);
        assert_eq!(trauma_level(100.0), TraumaLevel::Elevated);
    }

    #[test]
    fn test_fmt_score() {
        assert_eq!(fmt_score(Some(0.5)), "0.500");
        assert_eq!(fmt_score(Some(0.12345)), "0.123");
        assert_eq!(fmt_score(None), PLACEHOLDER);
        assert_eq!(fmt_score(Some(f64::NAN)), PLACEHOLDER);
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize(Some("fear")), "Fear");
        assert_eq!(capitalize(Some("Fear")), "Fear");
        assert_eq!(capitalize(Some("")), PLACEHOLDER);
        assert_eq!(capitalize(None), PLACEHOLDER);
    }

    #[test]
    fn test_date_label() {
        assert_eq!(date_label(Some("2024-03-05")), "Mar 5, 2024");
        assert_eq!(date_label(Some("2024-03-05T08:30:00")), "Mar 5, 2024");
        assert_eq!(date_label(None), PLACEHOLDER);
        assert_eq!(date_label(Some("last night")), "last night");
    }

    #[test]
    fn test_record_deserializes_leniently() {
        let record: DreamRecord = serde_json::from_str(
            r#"{
                "id": 3,
                "title": "Flight",
                "mood": "joy",
                "symbols": {"sky": 0.8},
                "trauma_score": 2.5,
                "unexpected_field": true
            }"#,
        )
        .unwrap();

        assert_eq!(record.id, Some(3));
        assert_eq!(record.symbols.get("sky"), Some(&0.8));
        assert_eq!(record.trauma_level(), Some(TraumaLevel::Low));
        assert!(record.confidence.is_none());
        assert!(record.interpretation.is_none());
    }
}
