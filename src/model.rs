//! Analysis Result schema.
//!
//! The backend response is parsed into typed structs at the boundary and
//! rejected with [`ViewError::Malformed`] when it does not fit, so the
//! renderer never sees missing fields.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ViewError;

/// One analyzed message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub text: String,
    pub emotion: String,
    /// Classifier confidence, conventionally in [0, 1].
    pub score: f64,
}

/// Emotion label → count, in the order the backend listed them.
///
/// That order drives the tag summary, pie slices and bars, so it is kept
/// exactly as received instead of being re-sorted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmotionDistribution(Vec<(String, u64)>);

impl EmotionDistribution {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a label; returns `false` (and changes nothing) if it is already present.
    pub fn insert(&mut self, emotion: impl Into<String>, count: u64) -> bool {
        let emotion = emotion.into();
        if self.get(&emotion).is_some() {
            return false;
        }
        self.0.push((emotion, count));
        true
    }

    pub fn get(&self, emotion: &str) -> Option<u64> {
        self.0.iter().find(|(e, _)| e == emotion).map(|(_, c)| *c)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.0.iter().map(|(e, c)| (e.as_str(), *c))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn total(&self) -> u64 {
        self.0.iter().map(|(_, c)| c).sum()
    }
}

impl<S: Into<String>> FromIterator<(S, u64)> for EmotionDistribution {
    fn from_iter<I: IntoIterator<Item = (S, u64)>>(iter: I) -> Self {
        let mut dist = EmotionDistribution::new();
        for (e, c) in iter {
            dist.insert(e, c);
        }
        dist
    }
}

impl Serialize for EmotionDistribution {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (e, c) in &self.0 {
            map.serialize_entry(e, c)?;
        }
        map.end()
    }
}

struct DistributionVisitor;

impl<'de> Visitor<'de> for DistributionVisitor {
    type Value = EmotionDistribution;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an object mapping emotion labels to non-negative integer counts")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut dist = EmotionDistribution(Vec::with_capacity(access.size_hint().unwrap_or(0)));
        while let Some((emotion, count)) = access.next_entry::<String, u64>()? {
            if dist.get(&emotion).is_some() {
                return Err(serde::de::Error::custom(format!(
                    "duplicate emotion label `{emotion}`"
                )));
            }
            dist.0.push((emotion, count));
        }
        Ok(dist)
    }
}

impl<'de> Deserialize<'de> for EmotionDistribution {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(DistributionVisitor)
    }
}

/// The structured response from the classification backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub emotional_trend: String,
    pub emotion_distribution: EmotionDistribution,
    pub timeline: Vec<TimelineEntry>,
    /// Longer narrative summary, when the backend provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_time_ms: Option<f64>,
}

impl AnalysisResult {
    /// Parse and validate a response body for a request of `expected_len` messages.
    pub fn from_slice(bytes: &[u8], expected_len: usize) -> Result<Self, ViewError> {
        let result: AnalysisResult =
            serde_json::from_slice(bytes).map_err(|e| ViewError::Malformed(e.to_string()))?;
        result.validate(expected_len)?;
        Ok(result)
    }

    /// Check the invariants serde cannot express.
    pub fn validate(&self, expected_len: usize) -> Result<(), ViewError> {
        if self.timeline.len() != expected_len {
            return Err(ViewError::Malformed(format!(
                "timeline has {} entries for {} messages",
                self.timeline.len(),
                expected_len
            )));
        }
        if let Some((i, entry)) = self
            .timeline
            .iter()
            .enumerate()
            .find(|(_, e)| !e.score.is_finite())
        {
            return Err(ViewError::Malformed(format!(
                "timeline entry {} has non-finite score {}",
                i + 1,
                entry.score
            )));
        }
        Ok(())
    }

    /// Mean intensity across the timeline, `None` when empty.
    pub fn mean_score(&self) -> Option<f64> {
        if self.timeline.is_empty() {
            return None;
        }
        let sum: f64 = self.timeline.iter().map(|e| e.score).sum();
        Some(sum / self.timeline.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "emotional_trend": "improving",
        "emotion_distribution": {"sadness": 1, "joy": 1},
        "timeline": [
            {"text": "I am happy", "emotion": "joy", "score": 0.9},
            {"text": "I am sad", "emotion": "sadness", "score": 0.3}
        ]
    }"#;

    #[test]
    fn test_parse_sample() {
        let r = AnalysisResult::from_slice(SAMPLE.as_bytes(), 2).expect("valid");
        assert_eq!(r.emotional_trend, "improving");
        assert_eq!(r.timeline.len(), 2);
        assert_eq!(r.timeline[1].emotion, "sadness");
        assert!(r.summary.is_none());
    }

    #[test]
    fn test_distribution_keeps_key_order() {
        let r = AnalysisResult::from_slice(SAMPLE.as_bytes(), 2).expect("valid");
        let keys: Vec<&str> = r.emotion_distribution.iter().map(|(e, _)| e).collect();
        assert_eq!(keys, vec!["sadness", "joy"]);
    }

    #[test]
    fn test_distribution_duplicate_key_rejected() {
        let json = r#"{"joy": 1, "joy": 2}"#;
        assert!(serde_json::from_str::<EmotionDistribution>(json).is_err());
    }

    #[test]
    fn test_distribution_negative_count_rejected() {
        let json = r#"{"joy": -1}"#;
        assert!(serde_json::from_str::<EmotionDistribution>(json).is_err());
    }

    #[test]
    fn test_distribution_serializes_in_order() {
        let dist: EmotionDistribution = vec![("b", 2u64), ("a", 1u64)].into_iter().collect();
        assert_eq!(serde_json::to_string(&dist).expect("ser"), r#"{"b":2,"a":1}"#);
    }

    #[test]
    fn test_distribution_insert_duplicate_ignored() {
        let mut d = EmotionDistribution::new();
        assert!(d.insert("joy", 1));
        assert!(!d.insert("joy", 5));
        assert_eq!(d.get("joy"), Some(1));
        assert_eq!(d.total(), 1);
    }

    #[test]
    fn test_missing_field_is_malformed() {
        let json = r#"{"emotional_trend": "x", "timeline": []}"#;
        let err = AnalysisResult::from_slice(json.as_bytes(), 0).unwrap_err();
        assert_eq!(err.kind(), "malformed");
        assert!(err.to_string().contains("emotion_distribution"));
    }

    #[test]
    fn test_not_json_is_malformed() {
        let err = AnalysisResult::from_slice(b"<html>oops</html>", 0).unwrap_err();
        assert_eq!(err.kind(), "malformed");
    }

    #[test]
    fn test_timeline_length_mismatch() {
        let err = AnalysisResult::from_slice(SAMPLE.as_bytes(), 3).unwrap_err();
        assert!(err.to_string().contains("2 entries for 3 messages"));
    }

    #[test]
    fn test_optional_backend_fields() {
        let json = r#"{
            "emotional_trend": "Not enough messages to determine an emotional trend.",
            "emotion_distribution": {"neutral": 1},
            "timeline": [{"text": "ok", "emotion": "neutral", "score": 0.71}],
            "summary": "The dominant emotion is neutral.",
            "processing_time_ms": 12.5
        }"#;
        let r = AnalysisResult::from_slice(json.as_bytes(), 1).expect("valid");
        assert_eq!(r.summary.as_deref(), Some("The dominant emotion is neutral."));
        assert_eq!(r.processing_time_ms, Some(12.5));
    }

    #[test]
    fn test_mean_score() {
        let r = AnalysisResult::from_slice(SAMPLE.as_bytes(), 2).expect("valid");
        let mean = r.mean_score().expect("non-empty");
        assert!((mean - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_non_finite_score_rejected() {
        let mut r = AnalysisResult::from_slice(SAMPLE.as_bytes(), 2).expect("valid");
        r.timeline[0].score = f64::NAN;
        assert_eq!(r.validate(2).unwrap_err().kind(), "malformed");
    }
}
