//! Composite RFM score token and the ordered segment threshold table

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::error::RfmError;
use super::scoring::RfmScores;

pub const CHAMPIONS: &str = "Champions";
pub const LOYAL: &str = "Loyal";
pub const POTENTIAL: &str = "Potential";
pub const OTHERS: &str = "Others";

/// Fixed-width composite of the recency, frequency and monetary scores.
///
/// Every component is a single digit `1..=9`, so tuple order and the
/// lexicographic order of the string form (`"432"`) always agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CompositeScore([u8; 3]);

impl CompositeScore {
    /// Build from three scores, each `1..=9`
    pub fn new(recency: u8, frequency: u8, monetary: u8) -> Option<Self> {
        let digits = [recency, frequency, monetary];
        digits
            .iter()
            .all(|d| (1..=9).contains(d))
            .then_some(Self(digits))
    }

    /// Scores from `score_customers` are always in `1..=9`
    pub fn from_scores(scores: &RfmScores) -> Self {
        debug_assert!(
            [scores.recency, scores.frequency, scores.monetary]
                .iter()
                .all(|d| (1..=9).contains(d)),
            "score out of single-digit range: {:?}",
            scores
        );
        Self([scores.recency, scores.frequency, scores.monetary])
    }

    /// `(recency, frequency, monetary)`
    pub fn components(&self) -> (u8, u8, u8) {
        (self.0[0], self.0[1], self.0[2])
    }

    /// Numeric reading of the token, e.g. 432
    pub fn value(&self) -> u16 {
        self.0.iter().fold(0u16, |acc, &d| acc * 10 + d as u16)
    }
}

impl fmt::Display for CompositeScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.0[0], self.0[1], self.0[2])
    }
}

impl FromStr for CompositeScore {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits: Vec<u8> = s
            .chars()
            .map(|c| c.to_digit(10).map(|d| d as u8))
            .collect::<Option<_>>()
            .ok_or_else(|| format!("Composite score '{}' must contain only digits", s))?;

        match digits.as_slice() {
            &[r, f, m] => CompositeScore::new(r, f, m)
                .ok_or_else(|| format!("Composite score '{}' digits must be between 1 and 9", s)),
            _ => Err(format!("Composite score '{}' must have exactly 3 digits", s)),
        }
    }
}

impl Serialize for CompositeScore {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CompositeScore {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// One row of the threshold table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentRule {
    /// Inclusive lower bound on the composite score
    pub min_score: CompositeScore,
    pub segment: String,
}

impl SegmentRule {
    pub fn new(min_score: CompositeScore, segment: impl Into<String>) -> Self {
        Self {
            min_score,
            segment: segment.into(),
        }
    }
}

#[derive(Deserialize)]
struct RawSegmentTable {
    rules: Vec<SegmentRule>,
    fallback: String,
}

/// Ordered threshold table, evaluated top-down with first match winning.
/// Scores matching no rule get the fallback label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawSegmentTable")]
pub struct SegmentTable {
    rules: Vec<SegmentRule>,
    fallback: String,
}

impl TryFrom<RawSegmentTable> for SegmentTable {
    type Error = String;

    // Bare reason; `from_json_str` adds the error prefix
    fn try_from(raw: RawSegmentTable) -> Result<Self, Self::Error> {
        SegmentTable::new(raw.rules, raw.fallback).map_err(|e| match e {
            RfmError::InvalidRuleTable(reason) => reason,
            other => other.to_string(),
        })
    }
}

impl Default for SegmentTable {
    fn default() -> Self {
        let rule = |r, f, m, label: &str| SegmentRule {
            min_score: CompositeScore([r, f, m]),
            segment: label.to_string(),
        };
        Self {
            rules: vec![
                rule(4, 4, 4, CHAMPIONS),
                rule(3, 4, 4, LOYAL),
                rule(2, 4, 4, POTENTIAL),
            ],
            fallback: OTHERS.to_string(),
        }
    }
}

impl SegmentTable {
    /// Build a validated table.
    ///
    /// Labels must be non-empty and unique (fallback included) and thresholds
    /// strictly descending, since a rule below an equal-or-lower threshold
    /// could never match.
    pub fn new(rules: Vec<SegmentRule>, fallback: impl Into<String>) -> Result<Self, RfmError> {
        let fallback = fallback.into();

        let mut seen = HashSet::new();
        for label in rules.iter().map(|r| r.segment.as_str()).chain([fallback.as_str()]) {
            if label.trim().is_empty() {
                return Err(RfmError::InvalidRuleTable(
                    "segment labels must not be empty".to_string(),
                ));
            }
            if !seen.insert(label) {
                return Err(RfmError::InvalidRuleTable(format!(
                    "duplicate segment label '{}'",
                    label
                )));
            }
        }

        if let Some(pair) = rules.windows(2).find(|w| w[0].min_score <= w[1].min_score) {
            return Err(RfmError::InvalidRuleTable(format!(
                "thresholds must be strictly descending: '{}' ({}) is followed by '{}' ({})",
                pair[0].segment, pair[0].min_score, pair[1].segment, pair[1].min_score
            )));
        }

        Ok(Self { rules, fallback })
    }

    /// Parse and validate a table from JSON:
    /// `{"rules": [{"min_score": "444", "segment": "Champions"}, ...], "fallback": "Others"}`
    pub fn from_json_str(json: &str) -> Result<Self, RfmError> {
        serde_json::from_str(json).map_err(|e| RfmError::InvalidRuleTable(e.to_string()))
    }

    pub fn rules(&self) -> &[SegmentRule] {
        &self.rules
    }

    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    /// Segment label for a composite score
    pub fn classify(&self, score: &CompositeScore) -> &str {
        self.rules
            .iter()
            .find(|rule| *score >= rule.min_score)
            .map(|rule| rule.segment.as_str())
            .unwrap_or(self.fallback.as_str())
    }

    /// Rule labels in table order, then the fallback
    pub fn labels(&self) -> Vec<&str> {
        self.rules
            .iter()
            .map(|r| r.segment.as_str())
            .chain(std::iter::once(self.fallback.as_str()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(s: &str) -> CompositeScore {
        s.parse().unwrap()
    }

    #[test]
    fn test_composite_display_and_value() {
        let c = CompositeScore::new(4, 3, 2).unwrap();
        assert_eq!(c.to_string(), "432");
        assert_eq!(c.value(), 432);
        assert_eq!(c.components(), (4, 3, 2));
    }

    #[test]
    fn test_composite_rejects_out_of_range() {
        assert!(CompositeScore::new(0, 1, 1).is_none());
        assert!(CompositeScore::new(1, 10, 1).is_none());
        assert!("12".parse::<CompositeScore>().is_err());
        assert!("1234".parse::<CompositeScore>().is_err());
        assert!("1a3".parse::<CompositeScore>().is_err());
        assert!("103".parse::<CompositeScore>().is_err());
    }

    #[test]
    fn test_default_table_classification() {
        let table = SegmentTable::default();
        assert_eq!(table.classify(&score("444")), CHAMPIONS);
        assert_eq!(table.classify(&score("443")), LOYAL);
        assert_eq!(table.classify(&score("344")), LOYAL);
        assert_eq!(table.classify(&score("411")), LOYAL);
        assert_eq!(table.classify(&score("343")), POTENTIAL);
        assert_eq!(table.classify(&score("244")), POTENTIAL);
        assert_eq!(table.classify(&score("243")), OTHERS);
        assert_eq!(table.classify(&score("111")), OTHERS);
    }

    #[test]
    fn test_labels_order() {
        assert_eq!(
            SegmentTable::default().labels(),
            vec![CHAMPIONS, LOYAL, POTENTIAL, OTHERS]
        );
    }

    #[test]
    fn test_rejects_non_descending_thresholds() {
        let rules = vec![
            SegmentRule::new(score("344"), "Loyal"),
            SegmentRule::new(score("444"), "Champions"),
        ];
        let err = SegmentTable::new(rules, "Others").unwrap_err();
        assert!(err.to_string().contains("strictly descending"));
    }

    #[test]
    fn test_rejects_duplicate_labels() {
        let rules = vec![SegmentRule::new(score("444"), "Others")];
        let err = SegmentTable::new(rules, "Others").unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_json_round_trip_of_default_table() {
        let table = SegmentTable::default();
        let json = serde_json::to_string(&table).unwrap();
        assert!(json.contains("\"min_score\":\"444\""));
        assert_eq!(SegmentTable::from_json_str(&json).unwrap(), table);
    }

    #[test]
    fn test_json_validation_applies() {
        let json = r#"{"rules": [{"min_score": "111", "segment": "A"}, {"min_score": "222", "segment": "B"}], "fallback": "C"}"#;
        assert!(matches!(
            SegmentTable::from_json_str(json),
            Err(RfmError::InvalidRuleTable(_))
        ));

        let bad_score = r#"{"rules": [{"min_score": "4444", "segment": "A"}], "fallback": "C"}"#;
        assert!(SegmentTable::from_json_str(bad_score).is_err());
    }

    #[test]
    fn test_empty_rule_list_maps_everything_to_fallback() {
        let table = SegmentTable::new(Vec::new(), "Everyone").unwrap();
        assert_eq!(table.classify(&score("999")), "Everyone");
    }
}
